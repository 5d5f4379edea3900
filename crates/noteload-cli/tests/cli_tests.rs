//! End-to-end tests of the `noteload` binary
//!
//! Each test seeds a SQLite catalog in a temp directory, runs the binary
//! against it and checks the exit contract, the artifacts and the stored
//! rows.

use assert_cmd::Command;
use noteload_sqlite::{SqliteConfig, SqlitePool};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INPUT: &str = "MGI:12345\tSome allele note text\n\
                     MGI:99999\tNobody has this id\n\
                     MGI:23456\tline one\\nline two\n";

struct Fixture {
    dir: TempDir,
    db: PathBuf,
    input: PathBuf,
    password: PathBuf,
    config: PathBuf,
}

impl Fixture {
    fn new(input: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("mgd.db");
        let pool = SqlitePool::new(SqliteConfig::new(&db)).unwrap();
        pool.with_connection(|conn| {
            conn.execute_batch(
                r#"
                INSERT INTO MGI_Type VALUES (11, 'Allele');
                INSERT INTO MGI_User VALUES (1001, 'loader');
                INSERT INTO MGI_NoteType VALUES (1020, 11, 'Molecular', 0);
                INSERT INTO ACC_Accession (accID, prefixPart, _LogicalDB_key, _Object_key, _MGIType_key, preferred) VALUES
                    ('MGI:12345', 'MGI:', 1, 42, 11, 1),
                    ('MGI:23456', 'MGI:', 1, 43, 11, 1);
                "#,
            )?;
            Ok(())
        })
        .unwrap();
        drop(pool);

        let input_path = dir.path().join("notes.txt");
        fs::write(&input_path, input).unwrap();
        let password = dir.path().join("password");
        fs::write(&password, "secret\n").unwrap();
        let config = dir.path().join("noteload.toml");
        fs::write(&config, "").unwrap();

        Self {
            dir,
            db,
            input: input_path,
            password,
            config,
        }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn command(&self, mode: &str) -> Command {
        self.command_for(mode, "Molecular")
    }

    fn command_for(&self, mode: &str, note_type: &str) -> Command {
        let mut cmd = Command::cargo_bin("noteload").unwrap();
        cmd.env_remove("NOTELOAD_CONFIG")
            .env_remove("NOTELOAD_PASSWORD")
            .env_remove("RUST_LOG")
            .arg("-S")
            .arg("DEV")
            .arg("-D")
            .arg(&self.db)
            .arg("-U")
            .arg("loader")
            .arg("-P")
            .arg(&self.password)
            .arg("-M")
            .arg(mode)
            .arg("-I")
            .arg(&self.input)
            .arg("-O")
            .arg("Allele")
            .arg("-T")
            .arg(note_type)
            .arg("--config")
            .arg(&self.config)
            .arg("--output-dir")
            .arg(self.out());
        cmd
    }

    fn artifact(&self, suffix: &str) -> PathBuf {
        self.out().join(format!("notes.txt.{suffix}"))
    }

    fn count(&self, sql: &str) -> i64 {
        let pool = SqlitePool::new(SqliteConfig::new(&self.db)).unwrap();
        pool.with_connection(|conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
            .unwrap()
    }
}

fn last_line(path: &Path) -> String {
    let text = fs::read_to_string(path).unwrap();
    text.trim_end().lines().last().unwrap_or_default().to_string()
}

#[test]
fn help_succeeds() {
    Command::cargo_bin("noteload")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--input-file"));
}

#[test]
fn missing_arguments_exit_one() {
    Command::cargo_bin("noteload")
        .unwrap()
        .args(["-S", "DEV"])
        .assert()
        .code(1);
}

#[test]
fn preview_writes_artifacts_and_stores_nothing() {
    let fx = Fixture::new(INPUT);

    fx.command("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 notes"));

    let notes = fs::read_to_string(fx.artifact("MGI_Note.bcp")).unwrap();
    assert_eq!(notes.lines().count(), 2);
    assert!(notes.starts_with("1\t42\t11\t1020\t1001\t1001\t"));
    assert_eq!(fs::read_to_string(fx.artifact("sql")).unwrap().lines().count(), 2);

    let errors = fs::read_to_string(fx.artifact("error")).unwrap();
    assert!(errors.contains("Invalid Accession ID: MGI:99999"));

    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_Note"), 0);
}

#[test]
fn load_persists_notes_and_chunks() {
    let fx = Fixture::new(INPUT);

    fx.command("load").assert().success();

    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_Note"), 2);
    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_NoteChunk"), 2);
    assert!(last_line(&fx.artifact("diagnostics")).starts_with("End Date/Time"));
}

#[test]
fn load_twice_replaces_the_note_type() {
    let fx = Fixture::new(INPUT);

    fx.command("load").assert().success();
    fx.command("load").assert().success();

    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_Note"), 2);
    assert_eq!(fx.count("SELECT MIN(_Note_key) FROM MGI_Note"), 3);
}

#[test]
fn incremental_replaces_only_named_objects() {
    let fx = Fixture::new(INPUT);
    fx.command("load").assert().success();

    fs::write(&fx.input, "MGI:12345\treplacement text\n").unwrap();
    fx.command("incremental").assert().success();

    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_Note"), 2);
    assert_eq!(
        fx.count("SELECT COUNT(*) FROM MGI_Note WHERE _Object_key = 42"),
        1
    );
    assert_eq!(
        fx.count("SELECT COUNT(*) FROM MGI_NoteChunk c JOIN MGI_Note n USING (_Note_key) WHERE n._Object_key = 42 AND c.note = 'replacement text'"),
        1
    );
}

#[test]
fn unknown_note_type_exits_one_and_closes_the_logs() {
    let fx = Fixture::new(INPUT);

    fx.command_for("load", "GO Text")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GO Text"));

    assert!(last_line(&fx.artifact("diagnostics")).starts_with("End Date/Time"));
    assert!(last_line(&fx.artifact("error")).starts_with("End Date/Time"));
    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_Note"), 0);
}

#[test]
fn unknown_mode_exits_one() {
    let fx = Fixture::new(INPUT);

    fx.command("reload").assert().code(1);

    let diagnostics = fs::read_to_string(fx.artifact("diagnostics")).unwrap();
    assert!(diagnostics.contains("Mode: reload"));
    assert!(diagnostics.contains("FATAL"));
}

#[test]
fn strict_flag_fails_on_unresolved_identifiers() {
    let fx = Fixture::new(INPUT);
    fx.command("load").assert().success();

    fx.command("load").arg("--strict").assert().code(1);

    // Stored notes survive the failed run
    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_Note"), 2);
    let errors = fs::read_to_string(fx.artifact("error")).unwrap();
    assert!(errors.contains("Invalid Accession ID: MGI:99999"));
}

#[test]
fn missing_input_file_leaves_stored_notes() {
    let fx = Fixture::new(INPUT);
    fx.command("load").assert().success();
    fs::remove_file(&fx.input).unwrap();

    fx.command("load").assert().code(1);

    assert_eq!(fx.count("SELECT COUNT(*) FROM MGI_Note"), 2);
}

#[test]
fn missing_password_file_exits_one() {
    let fx = Fixture::new(INPUT);
    fs::remove_file(&fx.password).unwrap();

    fx.command("preview")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("password"));
}

#[test]
fn json_summary_on_stdout() {
    let fx = Fixture::new(INPUT);

    fx.command("preview")
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"notes_built\": 2"))
        .stdout(predicate::str::contains("\"skipped_unresolved\": 1"));
}
