use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

fn options_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn help_lists_scenarios() {
    let output = Command::cargo_bin("lifecycle-e2e")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["create", "destroy", "import", "import-hub", "detach", "metrics"] {
        assert!(stdout.contains(subcommand), "missing '{}'", subcommand);
    }
}

#[test]
fn missing_options_file() {
    let mut cmd = Command::cargo_bin("lifecycle-e2e").unwrap();
    cmd.args(&["--options", "/does/not/exist.yaml", "detach"]);
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unable to load options"));
}

#[test]
fn hub_base_domain_is_required() {
    let file = options_file("options:\n  hub:\n    name: hub-1\n");
    let mut cmd = Command::cargo_bin("lifecycle-e2e").unwrap();
    cmd.args(&["--options", file.path().to_str().unwrap(), "metrics"]);
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("hub.baseDomain"));
}

#[test]
fn subcommand_is_required() {
    let file = options_file("options:\n  hub:\n    baseDomain: example.com\n");
    let mut cmd = Command::cargo_bin("lifecycle-e2e").unwrap();
    cmd.args(&["--options", file.path().to_str().unwrap()]);
    cmd.assert().failure();
}

#[test]
fn create_defaults_to_public_clouds() {
    let output = Command::cargo_bin("lifecycle-e2e")
        .unwrap()
        .args(&["create", "--help"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--cloud-providers"));
    assert!(stdout.contains("baremetal"), "{}", stdout);
}
