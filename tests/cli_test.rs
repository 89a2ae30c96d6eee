use std::process::Command;

fn memofill() -> Command {
    Command::new(env!("CARGO_BIN_EXE_memofill"))
}

#[test]
fn test_default_targets() {
    let output = memofill()
        .args(["--parallelism", "2"])
        .output()
        .expect("Failed to execute memofill binary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Binary failed to run. stderr: {}", stderr);

    assert!(stdout.contains("fibonacci(8) = 21 (7 newly computed"), "stdout: {}", stdout);
    assert!(stdout.contains("fibonacci(21) = 10946 (13 newly computed"), "stdout: {}", stdout);
    assert!(stdout.contains("fibonacci(4) = 3 (0 newly computed"), "stdout: {}", stdout);
    assert!(stdout.contains("Cache holds 22 entries, contiguous through index 21"));
}

#[test]
fn test_failures_are_reported_and_run_continues() {
    let output = memofill()
        .args(["-p", "3", "--", "-1", "6"])
        .output()
        .expect("Failed to execute memofill binary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(stderr.contains("fibonacci(-1) with parallelism 3 failed"), "stderr: {}", stderr);
    assert!(stdout.contains("fibonacci(6) = 8"), "stdout: {}", stdout);
}

#[test]
fn test_json_output() {
    let output = memofill()
        .args(["--json", "--sequence", "lucas", "-p", "1", "5"])
        .output()
        .expect("Failed to execute memofill binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("one JSON line");
    let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(parsed["target"], 5);
    assert_eq!(parsed["value"], 11);
    assert_eq!(parsed["stats"]["newly_computed"], 4);
}
