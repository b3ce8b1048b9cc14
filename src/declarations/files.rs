//! `file`, `symlink`, `copy`, `replace` and `mkdir`
//!
//! Filesystem steps act as the current identity. Paths are expanded (`~`
//! and environment variables) when declared, so nested user declarations
//! expand against the user's own environment inside its child process.

use super::path_ok;
use crate::paths;
use crate::state::{
    CopyDeclaration, FileDeclaration, Replacement, State, SymlinkDeclaration,
};
use crate::ui;
use anyhow::{Context, Result, bail};
use declarative::DeclarationError;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

impl State {
    /// Declare a file's content; a later declaration of the same path wins
    pub fn file(&mut self, path: &str, content: &str) -> Result<(), DeclarationError> {
        path_ok("file", path)?;
        let path = paths::expand(path);

        let files = &mut self.desired_mut().files;
        match files.iter_mut().find(|f| f.path == path) {
            Some(existing) => content.clone_into(&mut existing.content),
            None => files.push(FileDeclaration {
                path,
                content: content.to_string(),
            }),
        }

        self.on_configure("file", |desired, _| {
            for file in &desired.files {
                write_file(file)?;
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare a symbolic link at `link` pointing to `target`
    pub fn symlink(&mut self, target: &str, link: &str) -> Result<(), DeclarationError> {
        path_ok("symlink", target)?;
        path_ok("symlink", link)?;
        let decl = SymlinkDeclaration {
            target: paths::expand(target),
            link: paths::expand(link),
        };
        let symlinks = &mut self.desired_mut().symlinks;
        if !symlinks.contains(&decl) {
            symlinks.push(decl);
        }

        self.on_configure("symlink", |desired, _| {
            for link in &desired.symlinks {
                ensure_symlink(link)?;
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare a recursive copy; `src/.` copies the contents of `src`
    pub fn copy(&mut self, src: &str, dest: &str) -> Result<(), DeclarationError> {
        path_ok("copy", src)?;
        path_ok("copy", dest)?;
        self.desired_mut().copies.push(CopyDeclaration {
            src: paths::expand(src).to_string_lossy().into_owned(),
            dest: paths::expand(dest),
        });

        self.on_configure("copy", |desired, _| {
            for copy in &desired.copies {
                let dest = copy.dest.display().to_string();
                ui::announce("Copying", &[("src", (&copy.src).into()), ("dest", (&dest).into())]);
                copy_item(copy)?;
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare a regex substitution applied to every match in `file`
    pub fn replace(
        &mut self,
        file: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<(), DeclarationError> {
        path_ok("replace", file)?;
        let compiled = Regex::new(pattern).map_err(|e| DeclarationError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.desired_mut().replacements.push(Replacement {
            file: paths::expand(file),
            pattern: compiled,
            replacement: replacement.to_string(),
        });

        self.on_configure("replace", |desired, _| {
            for replacement in &desired.replacements {
                apply_replacement(replacement)?;
            }
            Ok(())
        });
        Ok(())
    }

    /// Declare directories that must exist
    pub fn mkdir<I, S>(&mut self, items: I) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(DeclarationError::Empty { kind: "mkdir" });
        }
        for item in &items {
            path_ok("mkdir", item)?;
        }
        let directories = &mut self.desired_mut().directories;
        for dir in items.iter().map(|p| paths::expand(p)) {
            if !directories.contains(&dir) {
                directories.push(dir);
            }
        }

        self.on_prepare("mkdir", |desired, _| {
            for dir in &desired.directories {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            Ok(())
        });
        Ok(())
    }
}

// ============================================================================
// Step bodies
// ============================================================================

/// Write one file, creating parents; a missing parent is logged and skipped
///
/// Any other failure (permissions, a parent that is not a directory) stops
/// the run.
fn write_file(file: &FileDeclaration) -> Result<()> {
    let written = file
        .path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(&file.path, &file.content));

    match written {
        Ok(()) => {
            log::debug!("Wrote {}", file.path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            ui::warn(&format!("Can't write file {}: {e}", file.path.display()));
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to write {}", file.path.display())),
    }
}

fn ensure_symlink(decl: &SymlinkDeclaration) -> Result<()> {
    if decl.target.is_dir() {
        bail!(
            "Can't link directories: {} -> {}",
            decl.link.display(),
            decl.target.display()
        );
    }

    if fs::read_link(&decl.link).is_ok_and(|current| current == decl.target) {
        log::debug!("{} already links to {}", decl.link.display(), decl.target.display());
        return Ok(());
    }

    let target = decl.target.display().to_string();
    let link = decl.link.display().to_string();
    ui::announce("Linking", &[("target", (&target).into()), ("link", (&link).into())]);

    if let Some(parent) = decl.link.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if fs::symlink_metadata(&decl.link).is_ok() {
        fs::remove_file(&decl.link)
            .with_context(|| format!("Failed to replace {}", decl.link.display()))?;
    }
    make_symlink(&decl.target, &decl.link)
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("Failed to link {} -> {}", link.display(), target.display()))
}

#[cfg(not(unix))]
fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    bail!("Symlinks are only supported on unix: {} -> {}", link.display(), target.display())
}

/// Resolve source and destination the way `cp -r` does
fn copy_paths(decl: &CopyDeclaration) -> (PathBuf, PathBuf) {
    if let Some(src) = decl.src.strip_suffix("/.") {
        return (PathBuf::from(src), decl.dest.clone());
    }
    let src = PathBuf::from(&decl.src);
    let dest = match src.file_name() {
        Some(name) if decl.dest.is_dir() => decl.dest.join(name),
        _ => decl.dest.clone(),
    };
    (src, dest)
}

fn copy_item(decl: &CopyDeclaration) -> Result<()> {
    let (src, dest) = copy_paths(decl);

    if !src.is_dir() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(&src, &dest)
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
        return Ok(());
    }

    for entry in WalkDir::new(&src) {
        let entry = entry.with_context(|| format!("Failed to read {}", src.display()))?;
        let rel = entry.path().strip_prefix(&src)?;
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if file_type.is_symlink() {
            let link_target = fs::read_link(entry.path())?;
            if fs::symlink_metadata(&target).is_ok() {
                fs::remove_file(&target)?;
            }
            make_symlink(&link_target, &target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

fn apply_replacement(replacement: &Replacement) -> Result<()> {
    let input = fs::read_to_string(&replacement.file)
        .with_context(|| format!("Failed to read {}", replacement.file.display()))?;
    let output = replacement
        .pattern
        .replace_all(&input, replacement.replacement.as_str());

    if output == input {
        log::debug!("{} unchanged", replacement.file.display());
        return Ok(());
    }

    fs::write(&replacement.file, output.as_ref())
        .with_context(|| format!("Failed to write {}", replacement.file.display()))
}
