//! Integration tests for the miniature CLI

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn miniature() -> Command {
        cargo_bin_cmd!("miniature")
    }

    #[test]
    fn help_displays() {
        miniature()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("git-backed package loader"));
    }

    #[test]
    fn version_displays() {
        miniature()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("miniature"));
    }

    #[test]
    fn load_requires_repo_argument() {
        miniature().arg("load").assert().failure();
    }

    #[test]
    fn load_unreachable_repo_fails() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .args(["load", temp.path().join("no-such-repo").to_str().unwrap()])
            .current_dir(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load repository"));
    }

    #[test]
    fn load_from_file_missing_manifest() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .args(["load-from-file", "missing.json"])
            .current_dir(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Manifest not found"));
    }

    #[test]
    fn publish_without_manifest_fails() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .arg("publish")
            .current_dir(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to publish package"));
    }

    #[test]
    fn tag_package_without_manifest_fails() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .arg("tag-package")
            .current_dir(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Manifest not found"))
            .stderr(predicate::str::contains("pkg.json"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached repositories"));
    }

    #[test]
    fn cache_list_json_empty() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{}"));
    }

    #[test]
    fn cache_remove_uncached_url_succeeds() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .args(["cache", "remove", "https://example.com/never-cached"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed"));
    }

    #[test]
    fn cache_clear_with_yes() {
        let temp = TempDir::new().unwrap();
        miniature()
            .args(["--cache-dir"])
            .arg(temp.path().join("cache"))
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));
    }

    #[test]
    fn invalid_config_file_fails() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "not = [valid").unwrap();

        miniature()
            .args(["--config"])
            .arg(&config)
            .args(["cache", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
