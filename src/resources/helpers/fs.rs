//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Suffix appended to a conflicting destination when it is moved aside.
pub const BACKUP_SUFFIX: &str = ".before-dotstate";

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Whether anything (including a dangling symlink) exists at `path`.
#[must_use]
pub fn exists_no_follow(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Expand a leading `~` against `home` and resolve relative paths against it.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use dotstate::resources::helpers::fs::expand_home;
///
/// let home = Path::new("/home/me");
/// assert_eq!(expand_home("~/.zshrc", home), home.join(".zshrc"));
/// assert_eq!(expand_home("~", home), home);
/// assert_eq!(expand_home(".config/nvim", home), home.join(".config/nvim"));
/// assert_eq!(expand_home("/etc/hosts", home), Path::new("/etc/hosts"));
/// ```
#[must_use]
pub fn expand_home(dest: &str, home: &Path) -> PathBuf {
    if dest == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = dest
        .strip_prefix("~/")
        .or_else(|| dest.strip_prefix("~\\"))
    {
        return home.join(rest);
    }
    let path = Path::new(dest);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}

/// First free backup path for `dest`: `<dest>.before-dotstate`, then
/// `<dest>.before-dotstate.1`, `.2`, and so on.
#[must_use]
pub fn backup_path(dest: &Path) -> PathBuf {
    let mut base = dest.as_os_str().to_os_string();
    base.push(BACKUP_SUFFIX);
    let base = PathBuf::from(base);
    if !exists_no_follow(&base) {
        return base;
    }
    (1u32..)
        .map(|n| {
            let mut candidate = base.as_os_str().to_os_string();
            candidate.push(format!(".{n}"));
            PathBuf::from(candidate)
        })
        .find(|candidate| !exists_no_follow(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ensure_parent_dir_creates_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c/file");
        ensure_parent_dir(&target).unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[test]
    fn backup_path_first_choice() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(".zshrc");
        assert_eq!(backup_path(&dest), dir.path().join(".zshrc.before-dotstate"));
    }

    #[test]
    fn backup_path_numbers_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(".zshrc");
        std::fs::write(dir.path().join(".zshrc.before-dotstate"), "old").unwrap();
        std::fs::write(dir.path().join(".zshrc.before-dotstate.1"), "older").unwrap();
        assert_eq!(
            backup_path(&dest),
            dir.path().join(".zshrc.before-dotstate.2")
        );
    }

    #[cfg(unix)]
    #[test]
    fn exists_no_follow_sees_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("missing"), &link).unwrap();
        assert!(!link.exists());
        assert!(exists_no_follow(&link));
    }
}
