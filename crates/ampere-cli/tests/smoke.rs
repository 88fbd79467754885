use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ampere-cli"))
        .args(args)
        .env("RUST_LOG", "off")
        .env_remove("AMPERE_TOKEN")
        .env_remove("AMPERE_API_ORIGIN")
        .env_remove("AMPERE_API_BASE_PATH")
        .output()
        .expect("cli should launch")
}

#[test]
fn help_lists_resource_commands() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["stations", "session", "feed"] {
        assert!(stdout.contains(command), "missing {command} in:\n{stdout}");
    }
}

#[test]
fn invalid_origin_is_rejected_before_any_call() {
    let output = run_cli(&["--origin", "not a url", "stations", "list"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: --origin not a url"), "stderr:\n{stderr}");
}

#[test]
fn unreachable_backend_reports_transport_failure() {
    let output = run_cli(&["--origin", "http://127.0.0.1:9", "stations", "get", "s1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: transport failure"), "stderr:\n{stderr}");
}
