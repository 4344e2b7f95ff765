//! CLI integration tests for the beckn-usecase binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("beckn-usecase"));
    cmd.env_remove("BECKN_HOST_MAPPING_URL")
        .env_remove("BECKN_HTTP_TIMEOUT_SECS");
    cmd
}

// Helper to create a temp input file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "context": {
            "type": "object",
            "properties": {
                "domain": { "type": "string", "const": "mobility" },
                "version": { "type": "string" }
            }
        },
        "message": {
            "type": "object",
            "properties": {
                "intent": { "type": "string" },
                "dynamic_value": { "type": "string" }
            }
        }
    }
}"#;

const STATIC_YAML: &str = r#"
context.version: "1.0.0"
message.intent: "search"
"#;

mod template_command {
    use super::*;

    #[test]
    fn prints_compiled_template() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);

        cmd()
            .args(["template", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""domain":"mobility""#))
            .stdout(predicate::str::contains(r#""version":{"type":"string"}"#));
    }

    #[test]
    fn writes_to_output_file() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let output = dir.path().join("template.json");

        cmd()
            .args([
                "template",
                schema.to_str().unwrap(),
                "--pretty",
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let written = fs::read_to_string(&output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["context"]["domain"], "mobility");
        assert!(written.contains('\n'));
    }

    #[test]
    fn missing_schema_exits_3() {
        cmd()
            .args(["template", "/nonexistent/schema.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", "{ not json");

        cmd()
            .args(["template", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }
}

mod resolve_command {
    use super::*;

    #[test]
    fn static_values_and_set_produce_valid_usecase() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let values = write_temp_file(&dir, "static.yaml", STATIC_YAML);

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                values.to_str().unwrap(),
                "--set",
                "message.dynamic_value=from the command line",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""version":"1.0.0""#))
            .stdout(predicate::str::contains(
                r#""dynamic_value":"from the command line""#,
            ));
    }

    #[test]
    fn unresolved_leaf_exits_1() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let values = write_temp_file(&dir, "static.yaml", STATIC_YAML);

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                values.to_str().unwrap(),
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Validation failed"))
            .stderr(predicate::str::contains("/message/dynamic_value"));
    }

    #[test]
    fn json_output_reports_errors_and_document() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let values = write_temp_file(&dir, "static.yaml", STATIC_YAML);

        let output = cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                values.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .code(1)
            .get_output()
            .stdout
            .clone();

        let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(report["valid"], false);
        assert_eq!(report["errors"][0]["pointer"], "/message/dynamic_value");
        assert_eq!(
            report["document"]["message"]["dynamic_value"],
            serde_json::json!({"type": "string"})
        );
    }

    #[test]
    fn later_set_wins() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let values = write_temp_file(&dir, "static.yaml", STATIC_YAML);

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                values.to_str().unwrap(),
                "--set",
                "message.dynamic_value=first",
                "--set",
                "message.dynamic_value=second",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""dynamic_value":"second""#));
    }

    #[test]
    fn resolvers_file_entries_are_applied() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let values = write_temp_file(&dir, "static.yaml", STATIC_YAML);
        let resolvers = write_temp_file(
            &dir,
            "resolvers.yaml",
            "message.dynamic_value: \"from file\"\n",
        );

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                values.to_str().unwrap(),
                "--resolvers",
                resolvers.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""dynamic_value":"from file""#));
    }

    #[test]
    fn resolvers_file_with_wrong_shape_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let resolvers = write_temp_file(&dir, "resolvers.yaml", "message.intent: 42\n");

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--resolvers",
                resolvers.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must be a URI"));
    }

    #[test]
    fn malformed_set_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);

        cmd()
            .args(["resolve", schema.to_str().unwrap(), "--set", "no-equals-sign"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("expects PATH=VALUE"));
    }

    #[test]
    fn fetch_reads_value_from_uri() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/value")
            .with_status(200)
            .with_body("dynamic api value")
            .create();

        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let values = write_temp_file(&dir, "static.yaml", STATIC_YAML);

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                values.to_str().unwrap(),
                "--fetch",
                &format!("message.dynamic_value={}/value", server.url()),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#""dynamic_value":"dynamic api value""#,
            ));
        mock.assert();
    }

    #[test]
    fn failed_fetch_exits_3() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/value").with_status(404).create();

        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--fetch",
                &format!("message.dynamic_value={}/value", server.url()),
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("HTTP 404"));
    }

    #[test]
    fn missing_static_file_exits_3() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                "/nonexistent/static.yaml",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Error loading static values"));
    }

    #[test]
    fn non_mapping_static_file_exits_2() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", SCHEMA);
        let values = write_temp_file(&dir, "static.yaml", "- just\n- a list\n");

        cmd()
            .args([
                "resolve",
                schema.to_str().unwrap(),
                "--static",
                values.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must be a mapping"));
    }
}

mod deeplink_commands {
    use super::*;

    #[test]
    fn host_prints_mapped_host() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/mapping.json")
            .with_body(r#"{"resolver.beckn.org": "https://mapped.host"}"#)
            .create();

        cmd()
            .args([
                "host",
                "resolver.beckn.org",
                "--mapping-url",
                &format!("{}/mapping.json", server.url()),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://mapped.host"));
    }

    #[test]
    fn unknown_host_exits_3() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/mapping.json")
            .with_body(r#"{"resolver.beckn.org": "https://mapped.host"}"#)
            .create();

        cmd()
            .args(["host", "other.resolver"])
            .env("BECKN_HOST_MAPPING_URL", format!("{}/mapping.json", server.url()))
            .assert()
            .code(3)
            .stderr(predicate::str::contains("resolver host not found"));
    }

    #[test]
    fn fetch_prints_usecase() {
        let mut server = mockito::Server::new();
        let mapping = format!(r#"{{"resolver.beckn.org": "{}/usecases"}}"#, server.url());
        server.mock("GET", "/mapping.json").with_body(mapping).create();
        server
            .mock("GET", "/usecases/1234")
            .with_body(r#"{"type": "object"}"#)
            .create();

        cmd()
            .args([
                "fetch",
                "beckn://resolver.beckn.org/1234",
                "--mapping-url",
                &format!("{}/mapping.json", server.url()),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"{"type":"object"}"#));
    }

    #[test]
    fn invalid_deeplink_exits_2() {
        cmd()
            .args(["fetch", "beckn://resolver-only"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid deeplink format"));
    }

    #[test]
    fn resolve_accepts_deeplink_schema() {
        let mut server = mockito::Server::new();
        let mapping = format!(r#"{{"resolver.beckn.org": "{}/usecases"}}"#, server.url());
        server.mock("GET", "/mapping.json").with_body(mapping).create();
        server
            .mock("GET", "/usecases/ride")
            .with_body(SCHEMA)
            .create();

        let dir = TempDir::new().unwrap();
        let values = write_temp_file(&dir, "static.yaml", STATIC_YAML);

        cmd()
            .args([
                "resolve",
                "beckn://resolver.beckn.org/ride",
                "--static",
                values.to_str().unwrap(),
                "--set",
                "message.dynamic_value=x",
                "--mapping-url",
                &format!("{}/mapping.json", server.url()),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""domain":"mobility""#));
    }
}

mod help {
    use super::*;

    #[test]
    fn lists_subcommands() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("template"))
            .stdout(predicate::str::contains("resolve"))
            .stdout(predicate::str::contains("fetch"))
            .stdout(predicate::str::contains("host"));
    }
}
