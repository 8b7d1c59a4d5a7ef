//! Headless layout runs
//!
//! Turns a [`GraphData`] and a [`LayoutConfig`] into a ready simulation and
//! runs it to completion.

use tracing::{debug, info};

use crate::config::LayoutConfig;
use crate::graph_types::{GraphData, LayoutOutput, to_vector};
use crate::io::ConfigResult;
use crate::simulation::{KineticState, Simulation, phyllotaxis, resolve_edges};

/// Tick limit for runs that would otherwise never settle (nonzero alpha target)
pub const DEFAULT_MAX_TICKS: usize = 10_000;

/// Starting state of every node: its given position (pinned if `fixed`), or
/// the default spiral position
fn initial_states<const D: usize>(graph: &GraphData) -> ConfigResult<Vec<KineticState<D>>> {
    let mut states = Vec::with_capacity(graph.nodes.len());
    for (index, node) in graph.nodes.iter().enumerate() {
        let position = match &node.position {
            Some(components) => to_vector(components)?,
            None => phyllotaxis(index),
        };
        states.push(if node.fixed {
            KineticState::pinned(position)
        } else {
            KineticState::at(position)
        });
    }
    Ok(states)
}

/// Build a simulation over `graph` with the forces named in `config`
pub fn build_simulation<const D: usize>(
    graph: &GraphData,
    config: &LayoutConfig,
) -> ConfigResult<Simulation<String, D>> {
    let ids: Vec<String> = graph.ids().cloned().collect();
    let links = resolve_edges(&ids, graph.edges())?;
    let states = initial_states::<D>(graph)?;

    let mut simulation = config
        .simulation
        .builder()
        .build_with(ids, |index, _| states[index])?;
    for force in config.build_forces::<D>(&links)? {
        simulation.add_force(force)?;
    }

    debug!(
        nodes = simulation.len(),
        links = links.len(),
        forces = simulation.forces().len(),
        "layout ready"
    );
    Ok(simulation)
}

/// Tick until the simulation settles or `max_ticks` is reached.
/// Returns the number of ticks run.
pub fn run_to_convergence<const D: usize>(
    simulation: &mut Simulation<String, D>,
    max_ticks: usize,
) -> usize {
    let mut ticks = 0;
    while ticks < max_ticks && !simulation.is_settled() {
        simulation.tick(1);
        ticks += 1;
    }
    ticks
}

/// Lay out `graph` in `D` dimensions.
///
/// `ticks` overrides the configured tick limit.
pub fn run_layout<const D: usize>(
    graph: &GraphData,
    config: &LayoutConfig,
    ticks: Option<usize>,
) -> ConfigResult<LayoutOutput> {
    let mut simulation = build_simulation::<D>(graph, config)?;
    let max_ticks = ticks
        .or(config.simulation.max_ticks)
        .unwrap_or(DEFAULT_MAX_TICKS);

    let ran = run_to_convergence(&mut simulation, max_ticks);
    info!(
        ticks = ran,
        alpha = simulation.alpha(),
        settled = simulation.is_settled(),
        "layout finished"
    );
    Ok(LayoutOutput::from_simulation(&simulation, ran))
}
