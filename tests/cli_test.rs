//! CLI integration tests for the oas-enrich binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("oas-enrich"))
}

// Helper to create a temp document file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const DOC_WITH_ORPHAN: &str = r##"{
    "openapi": "3.0.3",
    "paths": {
        "/todos": {
            "get": {
                "responses": {
                    "200": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Todo" }
                            }
                        }
                    }
                }
            }
        }
    },
    "components": {
        "schemas": {
            "Todo": { "type": "object" },
            "Orphan": { "type": "object" }
        }
    }
}"##;

const DOC_ALL_REACHABLE: &str = r##"{
    "paths": {
        "/todos": {
            "get": {
                "responses": {
                    "200": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Todo" }
                            }
                        }
                    }
                }
            }
        }
    },
    "components": {
        "schemas": {
            "Todo": { "type": "object" }
        }
    }
}"##;

mod prune_command {
    use super::*;

    #[test]
    fn removes_unreachable_components() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_WITH_ORPHAN);

        cmd()
            .args(["prune", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Todo"))
            .stdout(predicate::str::contains("Orphan").not());
    }

    #[test]
    fn writes_to_output_file() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_WITH_ORPHAN);
        let out = dir.path().join("pruned.json");

        cmd()
            .args([
                "prune",
                doc.to_str().unwrap(),
                "--output",
                out.to_str().unwrap(),
            ])
            .assert()
            .success();

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("Todo"));
        assert!(!written.contains("Orphan"));
    }

    #[test]
    fn pretty_prints_when_asked() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_ALL_REACHABLE);

        cmd()
            .args(["prune", doc.to_str().unwrap(), "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn dry_run_lists_without_writing() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_WITH_ORPHAN);

        cmd()
            .args(["prune", doc.to_str().unwrap(), "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("would remove: Orphan"))
            .stdout(predicate::str::contains("1 of 2 components unreachable"));

        // The input file is untouched.
        let content = fs::read_to_string(&doc).unwrap();
        assert!(content.contains("Orphan"));
    }

    #[test]
    fn preserves_top_level_metadata() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_WITH_ORPHAN);

        cmd()
            .args(["prune", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""openapi":"3.0.3""#));
    }
}

mod check_command {
    use super::*;

    #[test]
    fn all_reachable_passes() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_ALL_REACHABLE);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("All components reachable"));
    }

    #[test]
    fn unreachable_components_fail_with_listing() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_WITH_ORPHAN);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("unreachable: Orphan"))
            .stdout(predicate::str::contains("1 unreachable component(s)"));
    }

    #[test]
    fn quiet_suppresses_listing() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_WITH_ORPHAN);

        cmd()
            .args(["check", doc.to_str().unwrap(), "--quiet"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("unreachable: Orphan").not())
            .stdout(predicate::str::contains("1 unreachable component(s)"));
    }

    #[test]
    fn json_output_for_automation() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", DOC_WITH_ORPHAN);

        cmd()
            .args(["check", doc.to_str().unwrap(), "--json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""unreachable":["Orphan"]"#))
            .stdout(predicate::str::contains(r#""count":1"#));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn missing_file_exits_3() {
        cmd()
            .args(["prune", "/nonexistent/doc.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_exits_2() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", "not valid json");

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid document"));
    }
}
