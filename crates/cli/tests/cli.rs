use assert_cmd::Command;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf-cli").unwrap();
    cmd.env_remove("BOOKSHELF_ENV")
        .env("BOOKSHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn help_lists_subcommands() {
    let output = cli().arg("--help").assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("migrate"));
    assert!(text.contains("seed"));
    assert!(text.contains("config"));
}

#[test]
fn config_prints_resolved_settings() {
    let output = cli()
        .env("BOOKSHELF__SERVER__PORT", "9123")
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let settings: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(settings["server"]["port"], 9123);
    assert_eq!(settings["environment"], "local");
}

#[test]
fn seed_is_idempotent_against_a_database_file() {
    let dir = std::env::temp_dir().join(format!("bookshelf-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let url = format!("sqlite://{}", dir.join("seed.db").display());

    let first = cli()
        .args(["--database-url", &url, "seed"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8(first).unwrap().contains("added 3 type(s) and 5 genre(s)"));

    let second = cli()
        .args(["--database-url", &url, "seed"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8(second).unwrap().contains("added 0 type(s) and 0 genre(s)"));

    std::fs::remove_dir_all(&dir).ok();
}
