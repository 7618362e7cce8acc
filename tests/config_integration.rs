use std::path::PathBuf;

use markwright::component::MatchMode;
use markwright::config::{
    ConfigFlags, clear_config_flags, load_config_flags, parse_flag_tokens, save_config_flags,
};

fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(ToString::to_string).collect()
}

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".markwrightrc");
    let content = r"
# comment
--read-only

--placeholder Start the contract here

--log-file=edit.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.read_only);
    assert_eq!(flags.placeholder.as_deref(), Some("Start the contract here"));
    assert_eq!(flags.log_file, Some(PathBuf::from("edit.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".markwrightrc");
    std::fs::write(&path, "--all-hotkeys\n--placeholder file text\n--log-file file.log\n").unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_flags = parse_flag_tokens(&args(&[
        "markwright",
        "--placeholder",
        "cli text",
        "--no-system-clipboard",
    ]));

    let effective = file_flags.union(&cli_flags);
    assert!(effective.all_hotkeys, "file flags should remain enabled");
    assert!(effective.no_system_clipboard, "cli flags should be applied");
    assert_eq!(
        effective.placeholder.as_deref(),
        Some("cli text"),
        "cli should override placeholder"
    );
    assert_eq!(
        effective.log_file,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
    assert_eq!(effective.match_mode(), MatchMode::AllMatches);
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let flags = parse_flag_tokens(&args(&[
        "markwright",
        "--placeholder=Write...",
        "--log-file=debug.log",
    ]));
    assert_eq!(flags.placeholder.as_deref(), Some("Write..."));
    assert_eq!(flags.log_file, Some(PathBuf::from("debug.log")));
}

#[test]
fn test_value_flags_at_end_of_args_are_ignored() {
    let flags = parse_flag_tokens(&args(&["markwright", "notes.md", "--placeholder"]));
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_saved_defaults_survive_a_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    let cli = parse_flag_tokens(&args(&["markwright", "--read-only", "--all-hotkeys", "a.md"]));
    save_config_flags(&path, &cli).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# markwright defaults"));
    assert_eq!(load_config_flags(&path).unwrap(), cli);

    clear_config_flags(&path).unwrap();
    clear_config_flags(&path).unwrap();
    assert!(!path.exists());
}
