use std::{fs, path::Path, process::Command};

use tempfile::TempDir;

fn arena(config: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_brawl-arena"));
    let _ = command.arg("--config").arg(config).env("RUST_LOG", "warn");
    command
}

fn workspace() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("arena.toml");
    let maps = dir.path().join("maps");
    fs::write(
        &config,
        format!(
            "[storage]\nuser_dir = {:?}\n\n[match]\ncountdown_step_ms = 100\nround_pause_ms = 100\ntrophy_pause_ms = 100\nelimination_interval_ms = 100\n",
            maps.display().to_string()
        ),
    )
    .expect("write settings");
    (dir, config)
}

fn stdout(command: &mut Command) -> String {
    let output = command.output().expect("run brawl-arena");
    assert!(
        output.status.success(),
        "brawl-arena failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "brawl-arena"])
        .status()
        .expect("failed to invoke cargo check for the brawl-arena binary");

    assert!(status.success(), "cargo check --bin brawl-arena should succeed");
}

#[test]
fn scaffolded_maps_are_listed_and_validate() {
    let (dir, config) = workspace();
    let _ = stdout(arena(&config).arg("scaffold"));

    let listing = stdout(arena(&config).arg("list"));
    for name in ["canyon", "lobby", "rooftops", "trophy"] {
        assert!(listing.contains(name), "missing {name} in {listing}");
        assert!(dir.path().join("maps").join(format!("{name}.map")).exists());
    }

    let report = stdout(arena(&config).args(["validate", "canyon"]));
    assert!(report.starts_with("canyon:"));
}

#[test]
fn exported_map_imports_under_a_new_name() {
    let (_dir, config) = workspace();
    let _ = stdout(arena(&config).args(["scaffold", "--only", "rooftops"]));

    let share = stdout(arena(&config).args(["export", "rooftops"]));
    let share = share.trim();
    assert!(share.starts_with("arena:v1:"));

    let _ = stdout(arena(&config).args(["import", share, "copy"]));
    let original = stdout(arena(&config).args(["show", "rooftops"]));
    let copy = stdout(arena(&config).args(["show", "copy"]));
    assert_eq!(
        original.lines().skip(1).collect::<Vec<_>>(),
        copy.lines().skip(1).collect::<Vec<_>>()
    );
}

#[test]
fn missing_map_fails_validation() {
    let (_dir, config) = workspace();
    let output = arena(&config)
        .args(["validate", "nowhere"])
        .output()
        .expect("run brawl-arena");
    assert!(!output.status.success());
}

#[test]
fn simulated_match_reaches_the_ranking() {
    let (_dir, config) = workspace();
    let _ = stdout(arena(&config).arg("scaffold"));

    let transcript = stdout(arena(&config).args(["simulate", "--players", "3", "--seed", "7"]));
    assert!(transcript.contains("round started"));
    assert!(transcript.contains("trophy ceremony"));
    assert!(transcript.contains("match finished"));
    assert!(transcript.contains(" 1. player "));
}
