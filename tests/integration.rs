use std::fs;
use std::process::Command;

use forcegraph::graph_types::LayoutOutput;
use tempfile::tempdir;

fn forcegraph() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_forcegraph"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[test]
fn lays_out_miserables_excerpt() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("layout.json");

    let status = forcegraph()
        .args(["layout", "--input", "tests/fixtures/miserables.json", "--output"])
        .arg(&output)
        .status()
        .expect("Failed to execute forcegraph");
    assert!(status.success(), "forcegraph exited with error");

    let layout: LayoutOutput = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(layout.dimensions, 2);
    assert_eq!(layout.nodes.len(), 16);
    assert!(layout.alpha < 0.001, "layout did not settle");

    for node in &layout.nodes {
        assert_eq!(node.position.len(), 2);
        assert!(node.position.iter().all(|c| c.is_finite()), "{} diverged", node.id);
    }

    // leaves hang off their hub, not off each other
    let myriel = &layout.node("Myriel").unwrap().position;
    let napoleon = &layout.node("Napoleon").unwrap().position;
    let gervais = &layout.node("Gervais").unwrap().position;
    assert!(distance(myriel, napoleon) < distance(napoleon, gervais));
}

#[test]
fn layout_with_yaml_config_in_3d() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("layout.yaml");

    let status = forcegraph()
        .args([
            "layout",
            "-i",
            "tests/fixtures/miserables.json",
            "-c",
            "tests/fixtures/layout.yaml",
            "-d",
            "3",
            "-o",
        ])
        .arg(&output)
        .status()
        .expect("Failed to execute forcegraph");
    assert!(status.success());

    let layout: LayoutOutput = serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(layout.dimensions, 3);
    assert!(layout.ticks <= 400);
    assert!(layout.nodes.iter().all(|n| n.position.len() == 3));
}

#[test]
fn tick_limit_from_command_line() {
    let out = forcegraph()
        .args(["layout", "-i", "tests/fixtures/miserables.json", "--ticks", "5"])
        .output()
        .expect("Failed to execute forcegraph");
    assert!(out.status.success());

    let layout: LayoutOutput = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(layout.ticks, 5);
    assert!(layout.alpha > 0.8);
}

#[test]
fn unknown_link_endpoint_fails() {
    let out = forcegraph()
        .args(["layout", "-i", "tests/fixtures/broken_links.json"])
        .output()
        .expect("Failed to execute forcegraph");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("nobody"), "unexpected error: {stderr}");
}

#[test]
fn animate_runs_until_settled() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("fast.json");
    fs::write(
        &config,
        r#"{
            "simulation": {"alpha_min": 0.3},
            "forces": [{"type": "many_body"}, {"type": "center"}]
        }"#,
    )
    .unwrap();
    let output = dir.path().join("layout.json");

    let status = forcegraph()
        .args(["animate", "-i", "tests/fixtures/miserables.json", "--interval-ms", "1", "-c"])
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .status()
        .expect("Failed to execute forcegraph");
    assert!(status.success());

    let layout: LayoutOutput = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(layout.alpha < 0.3);
    assert!(layout.ticks > 0);
}

#[test]
fn animate_stops_at_tick_limit() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("limited.yaml");
    fs::write(&config, "simulation:\n  alpha_min: 0.000001\n  max_ticks: 3\n").unwrap();
    let output = dir.path().join("layout.json");

    let status = forcegraph()
        .args(["animate", "-i", "tests/fixtures/miserables.json", "--interval-ms", "1", "-c"])
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .status()
        .expect("Failed to execute forcegraph");
    assert!(status.success());

    let layout: LayoutOutput = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(layout.ticks, 3);
    assert!(layout.alpha > 0.8);
}
