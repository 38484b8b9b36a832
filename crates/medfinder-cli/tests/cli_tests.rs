//! Integration tests for the medfinder binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PAGES: &[(&str, &str)] = &[
    (
        "lysosomale_speicher/gaucher_typ1.html",
        "<html><head><title>Morbus Gaucher</title></head><body>\
         <h2>Therapie</h2><p>Enzymersatztherapie mit Imiglucerase ist etabliert.</p></body></html>",
    ),
    (
        "aminosaeuren/phenylketonurie.html",
        "<html><head><title>Phenylketonurie</title>\
         <meta name=\"description\" content=\"Grundlagen der PKU\"></head>\
         <body><p>Die Phenylketonurie (PKU) ist eine Aminosäurestörung.</p></body></html>",
    ),
];

struct Env {
    site: TempDir,
    state: TempDir,
}

impl Env {
    fn new() -> Self {
        let site = TempDir::new().unwrap();
        for (path, body) in PAGES {
            let full = site.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, body).unwrap();
        }
        Self {
            site,
            state: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.state.path().join("store.sqlite")
    }

    fn cmd(&self) -> Command {
        self.cmd_with_db(&self.db())
    }

    fn cmd_with_db(&self, db: &Path) -> Command {
        let mut cmd = Command::cargo_bin("medfinder").unwrap();
        cmd.env("MEDFINDER_DB", db)
            .env("XDG_CONFIG_HOME", self.state.path().join("config"))
            .env_remove("RUST_LOG")
            .arg("--source")
            .arg(self.site.path());
        cmd
    }

    fn synced() -> Self {
        let env = Self::new();
        env.cmd().arg("sync").assert().success();
        env
    }
}

#[test]
fn test_sync_reports_modules() {
    let env = Env::new();
    env.cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Modules:         2"))
        .stdout(predicate::str::contains("Indexed:         2"));
}

#[test]
fn test_search_finds_module() {
    let env = Env::synced();
    env.cmd()
        .args(["search", "imiglucerase"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Morbus Gaucher"))
        .stdout(predicate::str::contains("[Imiglucerase]"));
}

#[test]
fn test_search_json_output() {
    let env = Env::synced();
    let output = env
        .cmd()
        .args(["--format", "json", "search", "PKU"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let hits: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["moduleId"], "aminosaeuren_phenylketonurie_html");
    assert_eq!(hits[0]["category"], "aminosaeuren");
}

#[test]
fn test_search_category_filter() {
    let env = Env::synced();
    env.cmd()
        .args(["search", "phenylketonurie", "--category", "lysosomale_speicher"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_search_unknown_category_is_invalid_input() {
    let env = Env::synced();
    env.cmd()
        .args(["search", "pku", "--category", "kardiologie"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown category"));
}

#[test]
fn test_search_requires_query() {
    let env = Env::new();
    env.cmd().arg("search").assert().failure();
}

#[test]
fn test_find_searches_registry() {
    let env = Env::synced();
    env.cmd()
        .args(["find", "gaucher"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lysosomale_speicher/gaucher_typ1.html"));
}

#[test]
fn test_ls_categories_and_modules() {
    let env = Env::synced();
    env.cmd()
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("lysosomale_speicher"))
        .stdout(predicate::str::contains("mitochondriopathien"));

    env.cmd()
        .args(["ls", "aminosaeuren"])
        .assert()
        .success()
        .stdout(predicate::str::contains("aminosaeuren/phenylketonurie.html"))
        .stdout(predicate::str::contains("Grundlagen der PKU"));
}

#[test]
fn test_status_json() {
    let env = Env::synced();
    let output = env
        .cmd()
        .args(["--format", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["modules"], 2);
    assert_eq!(status["indexed"], 2);
    assert_eq!(status["storeType"], "sqlite");
    assert_eq!(status["storeAvailable"], true);
}

#[test]
fn test_export_import_into_fresh_store() {
    let env = Env::synced();
    let backup = env.state.path().join("backup.json");
    env.cmd()
        .arg("export")
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 modules"));

    let fresh = env.state.path().join("fresh.sqlite");
    env.cmd_with_db(&fresh)
        .arg("import")
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 added"));

    env.cmd_with_db(&fresh)
        .args(["search", "gaucher"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Morbus Gaucher"));
}

#[test]
fn test_import_rejects_foreign_file() {
    let env = Env::new();
    let bogus = env.state.path().join("bogus.json");
    fs::write(&bogus, r#"{"type": "something-else", "version": 1}"#).unwrap();

    env.cmd()
        .arg("import")
        .arg(&bogus)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid backup"));
}

#[test]
fn test_watch_single_run() {
    let env = Env::new();
    env.cmd()
        .args(["watch", "--runs", "1", "--interval", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed 1 syncs: 2 modules, 2 indexed"));
}
