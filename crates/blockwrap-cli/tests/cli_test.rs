use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn blockwrap() -> assert_cmd::Command {
    cargo_bin_cmd!("blockwrap")
}

const CONFIG: &str = r#"
docker:
  input:
    base_image: myimg:1.0
    exposed_port: 8080
    type: changeDetectionAOI
    routes:
      process: /api/process
      healthcheck: /api/healthcheck
    command: null
    resolution: 0.5
  output:
    tag: myimg-up42:1.0
manifest:
  name: my-block
  display_name: My Block
  type: processing
  tags: [change]
  description: Detects changes.
  parameters:
    threshold: {type: number, default: 0.5}
  machine: large
  input_capabilities:
    raster: {up42_standard: {format: GTiff}}
  output_capabilities:
    vector: {up42_standard: {format: GeoJSON}}
"#;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.yml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Point blockwrap at `binary` instead of the real docker CLI.
fn use_docker_binary(dir: &Path, binary: &Path) {
    std::fs::write(
        dir.join("blockwrap.toml"),
        format!("[docker]\nbinary = \"{}\"\n", binary.display()),
    )
    .unwrap();
}

/// Stand-in docker CLI answering the commands the packaging pipeline issues.
#[cfg(unix)]
fn fake_docker(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = r#"#!/bin/sh
case "$1" in
  image)
    case "$2" in
      inspect) echo '{"Cmd":["python3","app.py"],"Entrypoint":null,"WorkingDir":"/app","ExposedPorts":{"8080/tcp":{}},"Env":["PATH=/usr/bin"]}' ;;
      rm) exit 0 ;;
    esac ;;
  run) printf 'NAME="Ubuntu"\nID=ubuntu\nID_LIKE=debian\n' ;;
  build) echo "building $3" ;;
  version|info) echo 27.1.1 ;;
  *) echo "unexpected: $*" >&2; exit 1 ;;
esac
"#;
    let path = dir.join("fake-docker");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// ── Help / Version ──

#[test]
fn shows_help() {
    blockwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package inference Docker images"));
}

#[test]
fn shows_version() {
    blockwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("blockwrap"));
}

#[test]
fn package_requires_both_paths() {
    blockwrap()
        .args(["package", "config.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DESTINATION"));
}

// ── Package: failures before the write stage ──

#[test]
fn missing_config_fails_without_output() {
    let tmp = TempDir::new().unwrap();

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "absent.yml", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"))
        .stderr(predicate::str::contains("config file not found"));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn schema_violations_are_reported_together() {
    let tmp = TempDir::new().unwrap();
    let config = CONFIG
        .replace("  type: processing\n", "")
        .replace("exposed_port: 8080", "exposed_port: 0");
    write_config(tmp.path(), &config);

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "config.yml", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("schema violation"))
        .stderr(predicate::str::contains("`manifest.type` is required"))
        .stderr(predicate::str::contains("docker.input.exposed_port"));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn malformed_yaml_fails() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), "docker: [unclosed\n");

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "config.yml", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid YAML"));
}

#[test]
fn unsupported_base_family_fails_before_introspection() {
    let tmp = TempDir::new().unwrap();
    let config = CONFIG.replace("command: null", "command: null\n    base_family: alpine");
    write_config(tmp.path(), &config);
    use_docker_binary(tmp.path(), &tmp.path().join("no-docker-here"));

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "config.yml", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template selection failed"))
        .stderr(predicate::str::contains("unsupported base image family \"alpine\""));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn unavailable_runtime_names_introspection_stage() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), CONFIG);
    use_docker_binary(tmp.path(), &tmp.path().join("no-docker-here"));

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "config.yml", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("image introspection failed"));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn invalid_settings_file_fails() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), CONFIG);
    std::fs::write(tmp.path().join("blockwrap.toml"), "[docker\n").unwrap();

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "config.yml", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("blockwrap.toml"));
}

// ── Package: full pipeline against a stand-in docker CLI ──

#[cfg(unix)]
#[test]
fn package_writes_complete_build_context() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), CONFIG);
    let docker = fake_docker(tmp.path());
    use_docker_binary(tmp.path(), &docker);

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "config.yml", "nested/out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Packaged myimg:1.0"));

    let out = tmp.path().join("nested/out");
    let dockerfile = std::fs::read_to_string(out.join("Dockerfile")).unwrap();
    assert!(dockerfile.contains("FROM myimg:1.0\n"));
    assert!(dockerfile.contains(r#"ARG RUN_COMMAND="python3 app.py""#));
    assert!(dockerfile.contains(r#"ARG PORT="8080""#));
    assert!(dockerfile.contains(r#"ARG RESOLUTION="0.5""#));
    assert!(dockerfile.contains(r#"ARG TYPE="changeDetectionAOI""#));
    assert!(dockerfile.contains(r#"ARG WORKDIR="/app""#));
    assert!(dockerfile.contains("apt-get"));

    let manifest: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(out.join("UP42Manifest.json")).unwrap())
            .unwrap();
    let keys: Vec<&str> = manifest.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        [
            "name",
            "display_name",
            "type",
            "tags",
            "description",
            "parameters",
            "machine",
            "input_capabilities",
            "output_capabilities",
        ]
    );
    assert_eq!(manifest["machine"]["type"], "large");

    assert!(out.join("run_command.sh").exists());
    assert!(out.join("run.py").exists());
}

#[cfg(unix)]
#[test]
fn package_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), CONFIG);
    let docker = fake_docker(tmp.path());
    use_docker_binary(tmp.path(), &docker);

    let run = || {
        blockwrap()
            .current_dir(tmp.path())
            .args(["package", "config.yml", "out"])
            .assert()
            .success();
        std::fs::read(tmp.path().join("out/Dockerfile")).unwrap()
    };

    assert_eq!(run(), run());
}

#[cfg(unix)]
#[test]
fn package_with_build_invokes_docker_build() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), CONFIG);
    let docker = fake_docker(tmp.path());
    use_docker_binary(tmp.path(), &docker);

    blockwrap()
        .current_dir(tmp.path())
        .args(["package", "config.yml", "out", "--build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Built image myimg-up42:1.0"));
}

// ── Doctor ──

#[cfg(unix)]
#[test]
fn doctor_passes_with_working_docker() {
    let tmp = TempDir::new().unwrap();
    let docker = fake_docker(tmp.path());
    use_docker_binary(tmp.path(), &docker);

    blockwrap()
        .current_dir(tmp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] docker CLI"))
        .stdout(predicate::str::contains("[OK] docker daemon"));
}

#[test]
fn doctor_fails_without_docker() {
    let tmp = TempDir::new().unwrap();
    use_docker_binary(tmp.path(), &tmp.path().join("no-docker-here"));

    blockwrap()
        .current_dir(tmp.path())
        .arg("doctor")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[NG] docker CLI"))
        .stderr(predicate::str::contains("some checks failed"));
}
