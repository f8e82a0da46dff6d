use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn memora(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("memora").expect("binary builds");
    cmd.env("MEMORA_DATABASE_PATH", dir.path().join("memora.db"));
    cmd
}

/// Pull the first full UUID out of (possibly ANSI-colored) output.
fn extract_uuid(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    text.split(|c: char| !(c.is_ascii_hexdigit() || c == '-'))
        .find(|token| token.len() == 36)
        .expect("output contains a task id")
        .to_string()
}

#[test]
fn add_then_list_shows_the_task() {
    let dir = TempDir::new().unwrap();

    memora(&dir)
        .args(["add", "Water the plants", "--due", "tomorrow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Water the plants"));

    memora(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Water the plants"));
}

#[test]
fn completing_a_task_moves_it_out_of_the_default_listing() {
    let dir = TempDir::new().unwrap();

    let output = memora(&dir)
        .args(["add", "Ship the release"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = extract_uuid(&output);

    memora(&dir)
        .args(["do", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed"));

    memora(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ship the release").not());

    memora(&dir)
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ship the release"));
}

#[test]
fn empty_title_is_rejected() {
    let dir = TempDir::new().unwrap();
    memora(&dir)
        .args(["add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn unknown_id_is_a_clean_error() {
    let dir = TempDir::new().unwrap();
    memora(&dir)
        .args(["do", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No task found"));
}

#[test]
fn unparseable_due_date_is_rejected() {
    let dir = TempDir::new().unwrap();
    memora(&dir)
        .args(["add", "Task", "--due", "whenever I feel like it"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse"));
}

#[test]
fn inbox_capture_and_listing() {
    let dir = TempDir::new().unwrap();

    memora(&dir)
        .args(["inbox", "add", "call the dentist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Captured"));

    memora(&dir)
        .args(["inbox", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("call the dentist"));
}

#[test]
fn search_finds_open_tasks() {
    let dir = TempDir::new().unwrap();

    memora(&dir)
        .args(["add", "Buy groceries", "--description", "milk and eggs"])
        .assert()
        .success();

    memora(&dir)
        .args(["search", "groceries"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy groceries"));

    memora(&dir)
        .args(["search", "eggs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy groceries"));
}

#[test]
fn custom_reminders_appear_in_the_pending_list() {
    let dir = TempDir::new().unwrap();

    memora(&dir)
        .args(["remind", "custom", "Stand up", "in 2 hours", "--body", "stretch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stand up"));

    memora(&dir)
        .args(["remind", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stand up"))
        .stdout(predicate::str::contains("pending"));
}
