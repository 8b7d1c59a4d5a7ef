use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use forcegraph::config::LayoutConfig;
use forcegraph::driver::{LayoutDriver, TokioScheduler};
use forcegraph::graph_types::{GraphData, LayoutOutput};
use forcegraph::io::{read_document, write_document};
use forcegraph::layout::{DEFAULT_MAX_TICKS, build_simulation, run_layout};

/// Force-directed graph layout.
#[derive(Parser)]
#[command(name = "forcegraph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a layout to completion as fast as possible
    Layout {
        /// Input graph (.json, .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// Layout configuration (.yaml, .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file for the final layout; printed as JSON when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of dimensions to lay out in
        #[arg(
            short,
            long,
            default_value = "2",
            value_parser = clap::value_parser!(u8).range(2..=3)
        )]
        dimensions: u8,

        /// Stop after this many ticks even if not settled
        #[arg(short, long)]
        ticks: Option<usize>,
    },
    /// Tick the layout on a timer, logging progress until it settles
    Animate {
        /// Input graph (.json, .yaml)
        #[arg(short, long)]
        input: PathBuf,

        /// Layout configuration (.yaml, .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file for the final layout; printed as JSON when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Milliseconds between ticks
        #[arg(long, default_value = "16")]
        interval_ms: u64,
    },
}

fn load(input: &Path, config: Option<&Path>) -> anyhow::Result<(GraphData, LayoutConfig)> {
    let graph: GraphData = read_document(input)?;
    let config = match config {
        Some(path) => LayoutConfig::from_path(path)?,
        None => LayoutConfig::default(),
    };
    Ok((graph, config))
}

fn emit(layout: &LayoutOutput, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            write_document(path, layout)?;
            println!(
                "Laid out {} nodes in {} ticks, written to {}",
                layout.nodes.len(),
                layout.ticks,
                path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(layout)?),
    }
    Ok(())
}

fn layout(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    dimensions: u8,
    ticks: Option<usize>,
) -> anyhow::Result<()> {
    let (graph, config) = load(input, config)?;
    let layout = match dimensions {
        3 => run_layout::<3>(&graph, &config, ticks)?,
        _ => run_layout::<2>(&graph, &config, ticks)?,
    };
    emit(&layout, output)
}

async fn animate(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    interval: Duration,
) -> anyhow::Result<()> {
    let (graph, config) = load(input, config)?;
    let max_ticks = config.simulation.max_ticks.unwrap_or(DEFAULT_MAX_TICKS);
    let driver = LayoutDriver::new(build_simulation::<2>(&graph, &config)?);
    let scheduler = TokioScheduler::current()
        .ok_or_else(|| anyhow::anyhow!("animate needs a tokio runtime"))?;

    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let limiter = driver.clone();
    if max_ticks > 0 {
        driver.start(&scheduler, interval, None, move |sim| {
            let tick = counter.fetch_add(1, Ordering::SeqCst) + 1;
            info!(tick, alpha = sim.alpha(), "tick");
            if tick >= max_ticks {
                limiter.stop();
            }
        });
    }

    let mut poll = tokio::time::interval(interval);
    while driver.is_running() {
        poll.tick().await;
    }

    let ran = ticks.load(Ordering::SeqCst);
    let layout = driver.with_simulation(|sim| LayoutOutput::from_simulation(sim, ran));
    emit(&layout, output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout {
            input,
            config,
            output,
            dimensions,
            ticks,
        } => {
            layout(
                &input,
                config.as_deref(),
                output.as_deref(),
                dimensions,
                ticks,
            )?;
        }
        Commands::Animate {
            input,
            config,
            output,
            interval_ms,
        } => {
            animate(
                &input,
                config.as_deref(),
                output.as_deref(),
                Duration::from_millis(interval_ms),
            )
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_layout_subcommand() {
        let cli = Cli::try_parse_from([
            "forcegraph",
            "layout",
            "--input",
            "graph.json",
            "--config",
            "layout.yaml",
            "--dimensions",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Layout {
                input,
                config,
                output,
                dimensions,
                ticks,
            } => {
                assert_eq!(input, PathBuf::from("graph.json"));
                assert_eq!(config, Some(PathBuf::from("layout.yaml")));
                assert!(output.is_none());
                assert_eq!(dimensions, 3);
                assert!(ticks.is_none());
            }
            _ => panic!("Expected Layout command"),
        }
    }

    #[test]
    fn cli_layout_defaults_to_2d() {
        let cli = Cli::try_parse_from(["forcegraph", "layout", "-i", "g.json"]).unwrap();
        match cli.command {
            Commands::Layout { dimensions, .. } => assert_eq!(dimensions, 2),
            _ => panic!("Expected Layout command"),
        }
    }

    #[test]
    fn cli_rejects_unsupported_dimensions() {
        let result = Cli::try_parse_from(["forcegraph", "layout", "-i", "g.json", "-d", "4"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_animate_subcommand() {
        let cli = Cli::try_parse_from([
            "forcegraph",
            "animate",
            "--input",
            "graph.json",
            "--interval-ms",
            "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Animate {
                input, interval_ms, ..
            } => {
                assert_eq!(input, PathBuf::from("graph.json"));
                assert_eq!(interval_ms, 5);
            }
            _ => panic!("Expected Animate command"),
        }
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["forcegraph"]).is_err());
    }
}
