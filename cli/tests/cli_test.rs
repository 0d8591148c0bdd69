use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn genero(args: &[&str], dir: &Path) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("genero")?;
    cmd.current_dir(dir).args(args).env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn check_clean_module_succeeds() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("ok.4gl"),
        "main\n  define x int\n  let x = length(\"abc\")\n  display x\nend main\n",
    )?;

    genero(&["check", "ok.4gl"], dir.path())?
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn check_reports_unresolved_names_with_positions() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("bad.4gl"), "main\n  define x int\n  let x = nope\nend main\n")?;

    genero(&["check", "bad.4gl"], dir.path())?
        .assert()
        .failure()
        .stdout(predicate::str::contains("bad.4gl:3:"))
        .stdout(predicate::str::contains("error: No definition found for nope."));
    Ok(())
}

#[test]
fn check_json_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("bad.4gl"), "main\n  call missing_fn(1)\nend main\n")?;

    genero(&["check", "--json", "bad.4gl"], dir.path())?
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"message\": \"Function missing_fn not found.\""))
        .stdout(predicate::str::contains("\"line\": 2"));
    Ok(())
}

#[test]
fn check_loads_globals_includes() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("inc"))?;
    fs::write(
        dir.path().join("inc").join("common.4gl"),
        "globals\n  define g_count int\nend globals\n",
    )?;
    fs::write(
        dir.path().join("app.4gl"),
        "globals \"common.4gl\"\nmain\n  let g_count = 1\nend main\n",
    )?;

    genero(&["check", "app.4gl"], dir.path())?
        .assert()
        .failure()
        .stdout(predicate::str::contains("No definition found for g_count."));

    genero(&["check", "-I", "inc", "app.4gl"], dir.path())?
        .assert()
        .success();

    fs::write(dir.path().join("genero.toml"), "[project]\nincludePaths = [\"inc\"]\n")?;
    genero(&["check", "app.4gl"], dir.path())?.assert().success();
    Ok(())
}

#[test]
fn config_skips_argument_validation() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = "function two(a, b)\n  define a, b int\nend function\nmain\n  call two(1)\nend main\n";
    fs::write(dir.path().join("calls.4gl"), source)?;

    genero(&["check", "calls.4gl"], dir.path())?
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unexpected number of parameters (1) found"));

    let config = dir.path().join("settings.toml");
    fs::write(&config, "[analysis]\nskipValidationFunctions = [\"two\"]\n")?;
    genero(&["--config", config.to_str().unwrap_or_default(), "check", "calls.4gl"], dir.path())?
        .assert()
        .success();
    Ok(())
}

#[test]
fn broken_config_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.4gl"), "main\nend main\n")?;
    fs::write(dir.path().join("genero.toml"), "[parser\n")?;

    genero(&["check", "a.4gl"], dir.path())?
        .assert()
        .failure()
        .stderr(predicate::str::contains("genero.toml"));
    Ok(())
}

#[test]
fn missing_file_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    genero(&["tokens", "absent.4gl"], dir.path())?
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
    Ok(())
}

#[test]
fn tokens_lists_kinds_and_spans() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("t.4gl"), "let x = 1 -- note\n")?;

    genero(&["tokens", "t.4gl"], dir.path())?
        .assert()
        .success()
        .stdout(predicate::str::contains("0..3\tKeyword\tLet\t\"let\""))
        .stdout(predicate::str::contains("note").not());

    genero(&["tokens", "--verbatim", "t.4gl"], dir.path())?
        .assert()
        .success()
        .stdout(predicate::str::contains("-- note"));
    Ok(())
}

#[test]
fn outline_prints_nested_blocks() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("o.4gl"),
        "main\n  if true then\n    display 1\n  end if\nend main\n",
    )?;

    genero(&["outline", "o.4gl"], dir.path())?
        .assert()
        .success()
        .stdout(predicate::str::contains("main 1-5"))
        .stdout(predicate::str::contains("  if 2-4"));
    Ok(())
}

#[test]
fn complete_lists_record_fields() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = "define r record\n  id int,\n  name string\nend record\nmain\n  let r.\nend main\n";
    fs::write(dir.path().join("c.4gl"), source)?;
    let offset = source.find("r.\n").map(|i| i + 2).unwrap_or_default().to_string();

    genero(&["complete", "c.4gl", "--offset", &offset], dir.path())?
        .assert()
        .success()
        .stdout(predicate::str::contains("id\t"))
        .stdout(predicate::str::contains("name\t"))
        .stdout(predicate::str::contains("let").not());

    genero(&["complete", "c.4gl", "--offset", &offset, "--json"], dir.path())?
        .assert()
        .success()
        .stdout(predicate::str::contains("\"documentation\": \"(record field) id int\""));
    Ok(())
}

#[test]
fn complete_rejects_offset_past_end() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("c.4gl"), "main\nend main\n")?;

    genero(&["complete", "c.4gl", "--offset", "999"], dir.path())?
        .assert()
        .failure()
        .stderr(predicate::str::contains("past the end"));
    Ok(())
}
