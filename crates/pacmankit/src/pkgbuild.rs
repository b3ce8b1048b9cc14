//! Readers for PKGBUILD files and `pacman -Qi` output.

use crate::error::{Error, Result};
use std::path::Path;

/// The `pkgver=` value of a PKGBUILD, with surrounding quotes removed.
pub fn parse_pkgver(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|l| l.trim_start().strip_prefix("pkgver="))
        .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
}

/// Read the `pkgver=` value from the PKGBUILD inside `dir`.
pub fn read_pkgver(dir: &Path) -> Result<String> {
    let path = dir.join("PKGBUILD");
    let content = std::fs::read_to_string(&path)?;
    parse_pkgver(&content).ok_or(Error::MissingPkgver { path })
}

/// A `Key : value` field of `pacman -Qi` output.
pub fn parse_info_field(info: &str, field: &str) -> Option<String> {
    info.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == field).then(|| value.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKGBUILD: &str = r#"# Maintainer: someone
pkgname=paru
pkgver="2.0.3"
pkgrel=1
arch=('x86_64')
"#;

    const INFO: &str = "Name            : paru
Version         : 2.0.3-1
Description     : Feature packed AUR helper
Build Date      : Mon 01 Jan 2024 10:00:00 AM UTC
";

    #[test]
    fn test_parse_pkgver() {
        assert_eq!(parse_pkgver(PKGBUILD), Some("2.0.3".to_string()));
        assert_eq!(parse_pkgver("pkgver='1.0'\n"), Some("1.0".to_string()));
        assert_eq!(parse_pkgver("pkgname=x\n"), None);
    }

    #[test]
    fn test_read_pkgver_missing_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKGBUILD"), "pkgname=x\n").unwrap();
        let err = read_pkgver(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingPkgver { .. }));
    }

    #[test]
    fn test_read_pkgver() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKGBUILD"), PKGBUILD).unwrap();
        assert_eq!(read_pkgver(dir.path()).unwrap(), "2.0.3");
    }

    #[test]
    fn test_parse_info_field() {
        assert_eq!(parse_info_field(INFO, "Version"), Some("2.0.3-1".to_string()));
        // Values may themselves contain colons
        assert_eq!(
            parse_info_field(INFO, "Build Date"),
            Some("Mon 01 Jan 2024 10:00:00 AM UTC".to_string())
        );
        assert_eq!(parse_info_field(INFO, "Licenses"), None);
    }
}
