use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "fogline"])
        .status()
        .expect("failed to invoke cargo check for fogline CLI binary");

    assert!(status.success(), "cargo check --bin fogline should succeed");
}

#[test]
fn cli_runs_builtin_scenario() {
    let output = Command::new(env!("CARGO_BIN_EXE_fogline"))
        .args(["--frames", "2", "--export"])
        .output()
        .expect("failed to run fogline binary");

    assert!(output.status.success(), "fogline exited with {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("frame 0:"), "{stdout}");
    assert!(stdout.contains("frame 1:"), "{stdout}");
    let exported = stdout.lines().last().unwrap_or_default();
    assert!(exported.starts_with("fogline:v1:16x10:"), "{stdout}");

    let resumed = Command::new(env!("CARGO_BIN_EXE_fogline"))
        .args(["--frames", "0", "--import", exported])
        .output()
        .expect("failed to run fogline binary");
    assert!(
        resumed.status.success(),
        "{}",
        String::from_utf8_lossy(&resumed.stderr)
    );
}
