//! System file schema
//!
//! A system file is TOML. The optional `[settings]` table tunes where and how
//! things run; every other key is a declaration. Per-user declarations nest
//! under `[[users]]` as `[users.state]`, with the same schema minus settings.
//!
//! ```toml
//! packages = ["base", "linux", "git"]
//! services = ["sshd"]
//!
//! [[users]]
//! name = "alice"
//! groups = ["wheel"]
//!
//! [users.state]
//! aur = ["paru"]
//! ```

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Settings
// ============================================================================

/// Run settings (`[settings]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// AUR source cache; defaults to `$XDG_CACHE_HOME/archform/aur`
    pub aur_cache: Option<String>,
    /// AUR base URL
    pub aur_url: String,
    /// Console that autologin applies to
    pub autologin_tty: String,
    /// Root under which getty drop-ins are written
    pub unit_dropin_root: PathBuf,
    /// Wrapper used to escalate privileged commands
    pub escalation: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aur_cache: None,
            aur_url: pacmankit::AUR_BASE_URL.to_string(),
            autologin_tty: "tty1".to_string(),
            unit_dropin_root: PathBuf::from("/etc/systemd/system"),
            escalation: declarative::DEFAULT_ESCALATION.to_string(),
        }
    }
}

impl Settings {
    /// Resolved AUR cache directory
    pub fn aur_cache_dir(&self) -> Result<PathBuf> {
        match &self.aur_cache {
            Some(dir) => Ok(paths::expand(dir)),
            None => paths::aur_cache_dir(),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// Every declaration kind, as data
///
/// List fields are `Option` so that an explicitly empty list (`packages = []`)
/// reaches the declaration call and is rejected there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Declarations {
    pub packages: Option<Vec<String>>,
    pub aur: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    pub timers: Option<Vec<String>>,
    pub mkdir: Option<Vec<String>>,
    pub firewall: Option<Vec<String>>,
    pub locale: Option<String>,
    pub hostname: Option<String>,
    pub keyboard: Option<KeyboardDecl>,
    pub timedate: Option<TimedateDecl>,
    pub files: Vec<FileDecl>,
    pub symlinks: Vec<SymlinkDecl>,
    pub copies: Vec<CopyDecl>,
    pub replacements: Vec<ReplaceDecl>,
    pub git: Vec<GitDecl>,
    pub github: Vec<GithubDecl>,
    pub users: Vec<UserDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyboardDecl {
    pub keymap: Option<String>,
    pub layout: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub options: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimedateDecl {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_ntp")]
    pub ntp: bool,
}

impl Default for TimedateDecl {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            ntp: default_ntp(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

const fn default_ntp() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDecl {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymlinkDecl {
    pub target: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyDecl {
    pub src: String,
    pub dest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceDecl {
    pub file: String,
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitDecl {
    pub from: String,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubDecl {
    /// `owner/repo`
    pub repo: String,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserDecl {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub autologin: bool,
    /// Declarations converged inside the user's own process
    #[serde(default)]
    pub state: Declarations,
}

impl Declarations {
    /// Whether nothing at all is declared
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// System file
// ============================================================================

/// A parsed system file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemFile {
    pub settings: Settings,
    pub declarations: Declarations,
}

impl SystemFile {
    /// Load and parse a system file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid system file {}", path.display()))
    }

    /// Parse system file content
    pub fn parse(content: &str) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(content)?;

        let settings = match table.remove("settings") {
            Some(value) => value.try_into().context("Invalid [settings] table")?,
            None => Settings::default(),
        };
        let declarations = toml::Value::Table(table).try_into()?;

        Ok(Self {
            settings,
            declarations,
        })
    }
}

/// Resolve the system file path (`--config`/`ARCHFORM_CONFIG` or default)
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => paths::config_file(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
packages = ["base", "git"]
services = ["sshd"]
hostname = "box"

[settings]
autologin_tty = "tty2"

[timedate]
timezone = "Europe/Berlin"

[[files]]
path = "/etc/motd"
content = "hello\n"

[[users]]
name = "alice"
groups = ["wheel", "video"]
autologin = true

[users.state]
aur = ["paru"]
timers = ["backup"]
"#;

    #[test]
    fn test_parse_sample() {
        let file = SystemFile::parse(SAMPLE).unwrap();
        assert_eq!(file.settings.autologin_tty, "tty2");
        assert_eq!(file.settings.aur_url, "https://aur.archlinux.org");

        let decl = &file.declarations;
        assert_eq!(decl.packages.as_deref(), Some(&["base".to_string(), "git".to_string()][..]));
        assert_eq!(decl.hostname.as_deref(), Some("box"));
        let timedate = decl.timedate.as_ref().unwrap();
        assert_eq!(timedate.timezone, "Europe/Berlin");
        assert!(timedate.ntp);

        let alice = &decl.users[0];
        assert_eq!(alice.groups, vec!["wheel", "video"]);
        assert!(alice.autologin);
        assert_eq!(alice.state.aur.as_deref(), Some(&["paru".to_string()][..]));
    }

    #[test]
    fn test_defaults() {
        let file = SystemFile::parse("").unwrap();
        assert!(file.declarations.is_empty());
        assert_eq!(file.settings, Settings::default());
        assert_eq!(TimedateDecl::default().timezone, "UTC");
    }

    #[test]
    fn test_explicit_empty_list_is_kept() {
        let file = SystemFile::parse("packages = []").unwrap();
        assert_eq!(file.declarations.packages, Some(Vec::new()));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(SystemFile::parse("pakages = [\"git\"]").is_err());
        assert!(SystemFile::parse("[settings]\nbogus = 1").is_err());
    }

    #[test]
    fn test_settings_not_allowed_in_user_state() {
        let content = "[[users]]\nname = \"a\"\n[users.state.settings]\naur_url = \"x\"\n";
        assert!(SystemFile::parse(content).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = SystemFile::load(Path::new("/nonexistent/archform/system.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_aur_cache_override() {
        let settings = Settings {
            aur_cache: Some("/var/cache/aur".into()),
            ..Settings::default()
        };
        assert_eq!(settings.aur_cache_dir().unwrap(), PathBuf::from("/var/cache/aur"));
    }

    #[test]
    fn test_declarations_json_round_trip_for_child() {
        let file = SystemFile::parse(SAMPLE).unwrap();
        let nested = &file.declarations.users[0].state;
        let json = serde_json::to_string(nested).unwrap();
        let back: Declarations = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, nested);
    }

    #[test]
    fn test_resolve_path_explicit() {
        let path = resolve_path(Some(Path::new("/tmp/x.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.toml"));
    }
}
