//! End-to-end tests for the autobot command
//!
//! Each test gets its own directory with a configuration file, a snapshot
//! path and a local export directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const EXPORT: &str = "ESStatistikListeModtag-20240101-040000.xml";

fn record(ident: u64, reg_nr: &str, vin: &str) -> String {
    format!(
        r#"<Statistik>
  <KoeretoejIdent>{ident}</KoeretoejIdent>
  <KoeretoejArtNummer>1</KoeretoejArtNummer>
  <RegistreringNummerNummer>{reg_nr}</RegistreringNummerNummer>
  <KoeretoejOplysningGrundStruktur>
    <KoeretoejOplysningFoersteRegistreringDato>2016-02-29T00:00:00</KoeretoejOplysningFoersteRegistreringDato>
    <KoeretoejOplysningStelNummer>{vin}</KoeretoejOplysningStelNummer>
    <KoeretoejBetegnelseStruktur>
      <KoeretoejMaerkeTypeNavn>KIA</KoeretoejMaerkeTypeNavn>
      <Model>
        <KoeretoejModelTypeNavn>Rio</KoeretoejModelTypeNavn>
      </Model>
    </KoeretoejBetegnelseStruktur>
    <KoeretoejMotorStruktur>
      <DrivkraftTypeStruktur>
        <DrivkraftTypeNavn>Diesel</DrivkraftTypeNavn>
      </DrivkraftTypeStruktur>
    </KoeretoejMotorStruktur>
  </KoeretoejOplysningGrundStruktur>
</Statistik>
"#
    )
}

/// Workspace with a config pointing at a local export directory
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let exports = dir.path().join("exports");
        std::fs::create_dir_all(&exports).unwrap();

        let config = format!(
            r#"
[store]
path = '{store}'

[providers.mirror]
kind = "local"
dir = '{exports}'
file_ext = "xml"
"#,
            store = dir.path().join("vehicles.json").display(),
            exports = exports.display(),
        );
        std::fs::write(dir.path().join("autobot.toml"), config).unwrap();

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write_export(&self, name: &str, records: &[String]) {
        let body = format!("<Liste>\n{}</Liste>\n", records.concat());
        std::fs::write(self.path().join("exports").join(name), body).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("autobot").unwrap();
        cmd.current_dir(self.path())
            .env_remove("AUTOBOT_CONFIG")
            .env("LOG_LEVEL", "error")
            .arg("--config")
            .arg(self.path().join("autobot.toml"));
        cmd
    }
}

fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("nested").join("autobot.toml")
}

#[test]
fn test_version() {
    Command::cargo_bin("autobot")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("autobot "));
}

#[test]
fn test_init_writes_template_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_path(&dir);

    Command::cargo_bin("autobot")
        .unwrap()
        .arg("init")
        .arg(&path)
        .assert()
        .success();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[providers.dmr]"));

    Command::cargo_bin("autobot")
        .unwrap()
        .arg("init")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CONFIG_ERROR"));
}

#[test]
fn test_lookup_needs_a_key() {
    Command::cargo_bin("autobot")
        .unwrap()
        .arg("lookup")
        .assert()
        .failure();
}

#[test]
fn test_sync_lookup_disable_and_clear() {
    let ws = Workspace::new();
    ws.write_export(
        EXPORT,
        &[
            record(1, "AB12345", "KNADN512AB6000001"),
            record(2, "CD67890", "KNADN512AB6000002"),
        ],
    );

    ws.cmd()
        .args(["sync", "-p", "mirror"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced").and(predicate::str::contains("Stored:    2")));

    ws.cmd()
        .args(["sync", "-p", "mirror"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No new data"));

    let output = ws
        .cmd()
        .args(["lookup", "--regnr", "ab12345"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("RegNr: AB12345"));
    assert!(stdout.contains("Brand: KIA"));
    let hash = stdout
        .lines()
        .next()
        .and_then(|line| line.strip_prefix('#'))
        .and_then(|line| line.split_whitespace().next())
        .unwrap()
        .to_string();

    ws.cmd().args(["disable", "--hash", &hash]).assert().success();
    ws.cmd()
        .args(["lookup", "--regnr", "AB12345"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("NOT_FOUND"));
    ws.cmd()
        .args(["lookup", "--regnr", "AB12345", "--disabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(Disabled)"));
    ws.cmd().args(["enable", "--hash", &hash]).assert().success();
    ws.cmd()
        .args(["lookup", "--vin", "KNADN512AB6000001"])
        .assert()
        .success();

    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Vehicles:     2")
                .and(predicate::str::contains(EXPORT)),
        );

    ws.cmd().arg("clear").assert().success();
    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vehicles:     0").and(predicate::str::contains("never")));
}

#[test]
fn test_unknown_provider() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["sync", "-p", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("UNKNOWN_PROVIDER").and(predicate::str::contains("mirror")));
}

#[test]
fn test_failed_sync_exits_non_zero() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["sync", "-p", "mirror"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("NOT_FOUND"));

    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("History size: 1"));
}

#[test]
fn test_bad_hash_is_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["enable", "--hash", "xyz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HASH_ERROR"));
}

#[test]
fn test_query_prints_csv() {
    let ws = Workspace::new();
    ws.write_export(
        EXPORT,
        &[
            record(2, "CD67890", "KNADN512AB6000002"),
            record(1, "AB12345", "KNADN512AB6000001"),
        ],
    );
    ws.cmd().args(["sync", "-p", "mirror"]).assert().success();

    let output = ws.cmd().args(["query", "--limit", "1"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "hash,country,regnr,vin,brand,model,fuel_type,first_reg_date,status"
    );
    assert!(lines[1].ends_with(",DK,AB12345,KNADN512AB6000001,KIA,Rio,Diesel,2016-02-29,Active"));

    ws.cmd()
        .arg("query")
        .assert()
        .success()
        .stdout(predicate::str::contains("CD67890").and(predicate::str::contains("AB12345")));
}
