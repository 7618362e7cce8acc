//! Saved command-line defaults.
//!
//! A `.markwrightrc` file holds one flag per line, exactly as it would be
//! typed on the command line. The global file lives in the platform config
//! directory; a `.markwrightrc` in the working directory overrides it, and
//! flags given on the command line override both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::component::MatchMode;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub read_only: bool,
    pub all_hotkeys: bool,
    pub no_system_clipboard: bool,
    pub placeholder: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: switches add up, values from `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            read_only: self.read_only || other.read_only,
            all_hotkeys: self.all_hotkeys || other.all_hotkeys,
            no_system_clipboard: self.no_system_clipboard || other.no_system_clipboard,
            placeholder: other
                .placeholder
                .clone()
                .or_else(|| self.placeholder.clone()),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }

    pub const fn match_mode(&self) -> MatchMode {
        if self.all_hotkeys {
            MatchMode::AllMatches
        } else {
            MatchMode::FirstMatch
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("markwright").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("markwright")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("markwright").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("markwright")
                .join("config");
        }
    }

    PathBuf::from(".markwrightrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".markwrightrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    // A flag and its value share a line; the value may contain spaces.
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| match line.split_once(char::is_whitespace) {
            Some((flag, value)) => vec![flag.to_string(), value.trim().to_string()],
            None => vec![line.to_string()],
        })
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# markwright defaults (saved with --save)".to_string()];
    if flags.read_only {
        lines.push("--read-only".to_string());
    }
    if flags.all_hotkeys {
        lines.push("--all-hotkeys".to_string());
    }
    if flags.no_system_clipboard {
        lines.push("--no-system-clipboard".to_string());
    }
    if let Some(placeholder) = &flags.placeholder {
        lines.push(format!("--placeholder {placeholder}"));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list; anything else is skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--read-only" => flags.read_only = true,
            "--all-hotkeys" => flags.all_hotkeys = true,
            "--no-system-clipboard" => flags.no_system_clipboard = true,
            "--placeholder" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.placeholder = Some(next.clone());
                    i += 1;
                }
            }
            "--log-file" => {
                if let Some(next) = tokens.get(i + 1) {
                    flags.log_file = Some(PathBuf::from(next));
                    i += 1;
                }
            }
            _ => {
                if let Some(value) = token.strip_prefix("--placeholder=") {
                    flags.placeholder = Some(value.to_string());
                } else if let Some(value) = token.strip_prefix("--log-file=") {
                    flags.log_file = Some(PathBuf::from(value));
                }
            }
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "markwright",
            "--read-only",
            "--placeholder",
            "Say something",
            "--log-file=edit.log",
            "--bogus",
            "notes.md",
        ]));
        assert!(flags.read_only);
        assert!(!flags.all_hotkeys);
        assert_eq!(flags.placeholder.as_deref(), Some("Say something"));
        assert_eq!(flags.log_file, Some(PathBuf::from("edit.log")));
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            all_hotkeys: true,
            placeholder: Some("from file".into()),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            read_only: true,
            placeholder: Some("from cli".into()),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.read_only);
        assert!(merged.all_hotkeys);
        assert_eq!(merged.placeholder.as_deref(), Some("from cli"));
        assert_eq!(merged.match_mode(), MatchMode::AllMatches);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".markwrightrc");
        let flags = ConfigFlags {
            read_only: true,
            all_hotkeys: true,
            no_system_clipboard: true,
            placeholder: Some("Type here, please".into()),
            log_file: Some(PathBuf::from("edit.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
