use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `cmdtree` invocation isolated from the user's config, colors off.
fn cmdtree(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cmdtree").unwrap();
    cmd.env("CMDTREE_CONFIG_DIR", config_dir.path())
        .env_remove("CMDTREE_LOG")
        .arg("--color")
        .arg("never");
    cmd
}

#[test]
fn hello_greets() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .arg("hello")
        .assert()
        .success()
        .stdout("Hello, World!\n");

    cmdtree(&dir)
        .args(["hello", "-n", "Ada", "--count", "2", "--shout"])
        .assert()
        .success()
        .stdout("HELLO, ADA!\n  (1/2)\nHELLO, ADA!\n  (2/2)\n");
}

#[test]
fn version_and_help() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(format!("cmdtree {}\n", env!("CARGO_PKG_VERSION")));

    cmdtree(&dir)
        .args(["hello", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: cmdtree hello [OPTIONS]"))
        .stdout(predicate::str::contains("-c, --count <INTEGER>"))
        .stdout(predicate::str::contains("[default: 1]"));
}

#[test]
fn bare_root_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("requires a subcommand"))
        .stderr(predicate::str::contains("hello"));
}

#[test]
fn out_of_range_value_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .args(["hello", "--count", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("out of range"))
        .stderr(predicate::str::contains("Try 'cmdtree hello --help'"));
}

#[test]
fn dangerous_needs_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .arg("dangerous")
        .write_stdin("n\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Performing").not())
        .stderr(predicate::str::contains("Aborted!"));

    cmdtree(&dir)
        .args(["dangerous", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Operation completed safely!"));
}

#[test]
fn files_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();

    cmdtree(&dir)
        .current_dir(work.path())
        .args(["files", "create-file", "note.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("File created: note.txt"));
    assert_eq!(
        std::fs::read_to_string(work.path().join("note.txt")).unwrap(),
        "Hello from cmdtree!"
    );

    cmdtree(&dir)
        .current_dir(work.path())
        .args(["files", "append-to-file", "note.txt", "second line"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added: second line"));
    assert_eq!(
        std::fs::read_to_string(work.path().join("note.txt")).unwrap(),
        "Hello from cmdtree!\nsecond line"
    );

    cmdtree(&dir)
        .current_dir(work.path())
        .args(["files", "cat", "note.txt"])
        .assert()
        .success()
        .stdout("File: note.txt\nContent: Hello from cmdtree!\nsecond line\n");

    cmdtree(&dir)
        .current_dir(work.path())
        .args(["files", "read-file", "missing.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not read missing.txt"));
}

#[test]
fn calc_and_text_groups() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .args(["calc", "add", "2", "-3.5"])
        .assert()
        .success()
        .stdout("2 + -3.5 = -1.5\n");

    cmdtree(&dir)
        .args(["calc", "divide", "1", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("division by zero"));

    cmdtree(&dir)
        .args(["text", "upper", "hello world"])
        .assert()
        .success()
        .stdout("Original: hello world\nUpper: HELLO WORLD\n");

    cmdtree(&dir)
        .args(["text", "count-words", "one two  three"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Word count: 3"));
}

#[test]
fn process_items_splits_and_repeats() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .args(["process", "-i", "a,b", "--item", "c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing 3 items..."))
        .stdout(predicate::str::contains("[3/3] Completed: c"));
}

#[test]
fn show_info_formats() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .args(["info", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"Library\": \"cmdtree\""));

    cmdtree(&dir)
        .args(["show-info", "--format", "xml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("choose from json, csv, table"));
}

#[test]
fn config_file_sets_the_default_format() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("cmdtree.json"),
        r#"{ "default_format": "csv" }"#,
    )
    .unwrap();
    cmdtree(&dir)
        .arg("show-info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Library,cmdtree"));
}

#[test]
fn missing_arguments_prompt_only_when_interactive() {
    let dir = tempfile::tempdir().unwrap();
    cmdtree(&dir)
        .args(["create-user", "-e", "ada@example.com"])
        .write_stdin("ada\n")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Username\s+ada\n").unwrap())
        .stdout(predicate::str::is_match(r"Email\s+ada@example\.com\n").unwrap())
        .stdout(predicate::str::contains("User created successfully!"));

    // Email is optional: only the username is asked for.
    cmdtree(&dir)
        .arg("create-user")
        .write_stdin("grace\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Email address").not())
        .stdout(predicate::str::is_match(r"Email\s+Not provided\n").unwrap());

    std::fs::write(
        dir.path().join("cmdtree.json"),
        r#"{ "interactive": false }"#,
    )
    .unwrap();
    cmdtree(&dir)
        .arg("create-user")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing argument 'username'"));
}

#[test]
fn broken_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cmdtree.json"), "{ not json").unwrap();
    cmdtree(&dir)
        .arg("hello")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Config error"));
}
