//! Integration tests for ledger-index

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the user's config and ledger directory
    fn ledger_index(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("ledger-index");
        cmd.env("LEDGER_INDEX_CONFIG", dir.path().join("config.toml"))
            .env("LEDGER_INDEX_DIR", dir.path().join("ledgers"));
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        ledger_index(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ledger index file cache"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        ledger_index(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ledger-index"));
    }

    #[test]
    fn create_then_inspect() {
        let dir = TempDir::new().unwrap();

        ledger_index(&dir)
            .args(["create", "42", "--master-key", "secret", "--fenced"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ledger 42 index ready"));

        ledger_index(&dir)
            .args(["inspect", "42", "--format", "json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"master_key\": \"736563726574\"")
                    .and(predicate::str::contains("\"fenced\": true"))
                    .and(predicate::str::contains("\"header_version\": 1")),
            );
    }

    #[test]
    fn inspect_missing_ledger() {
        let dir = TempDir::new().unwrap();
        ledger_index(&dir)
            .args(["inspect", "5"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No ledger 5"));
    }

    #[test]
    fn deleted_ledger_stays_deleted() {
        let dir = TempDir::new().unwrap();

        ledger_index(&dir)
            .args(["create", "8", "--master-key", "k"])
            .assert()
            .success();

        ledger_index(&dir)
            .args(["delete", "8"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted ledger 8"));

        ledger_index(&dir)
            .args(["inspect", "8"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("has been deleted"));

        ledger_index(&dir)
            .args(["create", "8", "--master-key", "k"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("has been deleted"));
    }

    #[test]
    fn stress_retires_every_generation() {
        let dir = TempDir::new().unwrap();
        ledger_index(&dir)
            .args(["stress", "--ops", "200", "--workers", "8", "--format", "json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"violations\": 0")
                    .and(predicate::str::contains("\"eviction_failures\": 0")),
            );
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        ledger_index(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_set_then_show() {
        let dir = TempDir::new().unwrap();

        ledger_index(&dir)
            .args(["config", "set", "storage.lock_stripes", "8"])
            .assert()
            .success();

        ledger_index(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("[storage]")
                    .and(predicate::str::contains("lock_stripes = 8")),
            );
    }

    #[test]
    fn config_set_rejects_invalid_version() {
        let dir = TempDir::new().unwrap();
        ledger_index(&dir)
            .args(["config", "set", "storage.header_version", "4"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("header_version"));
    }
}
