//! Symlink resource and the [`Linker`] that applies link tables.
use anyhow::{Context as _, Result, bail};
use std::path::{Path, PathBuf};

use super::helpers::fs::{backup_path, ensure_parent_dir, exists_no_follow, expand_home};
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A symlink resource that can be checked, applied, and removed.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    /// Create the link.  Never replaces an existing target; conflicts must be
    /// moved aside first.
    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.target)?;
        create_symlink(&self.source, &self.target)
            .with_context(|| format!("create link: {}", self.target.display()))?;
        Ok(ResourceChange::Applied)
    }

    /// Remove the link, but only if it still points at `source`.
    fn remove(&self) -> Result<ResourceChange> {
        match std::fs::read_link(&self.target) {
            Ok(existing) if paths_equal(&existing, &self.source) => {
                remove_symlink(&self.target)?;
                Ok(ResourceChange::Applied)
            }
            Ok(existing) => Ok(ResourceChange::Skipped {
                reason: format!("points to {}", existing.display()),
            }),
            Err(_) if exists_no_follow(&self.target) => Ok(ResourceChange::Skipped {
                reason: "not a symlink".to_string(),
            }),
            Err(_) => Ok(ResourceChange::AlreadyCorrect),
        }
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        std::fs::read_link(&self.target).map_or_else(
            |_| {
                if self.target.is_dir() {
                    Ok(ResourceState::Incorrect {
                        current: "target is a directory".to_string(),
                    })
                } else if exists_no_follow(&self.target) {
                    Ok(ResourceState::Incorrect {
                        current: "target is a regular file".to_string(),
                    })
                } else {
                    Ok(ResourceState::Missing)
                }
            },
            |existing| {
                if paths_equal(&existing, &self.source) {
                    Ok(ResourceState::Correct)
                } else {
                    Ok(ResourceState::Incorrect {
                        current: format!("points to {}", existing.display()),
                    })
                }
            },
        )
    }
}

/// What [`Linker::ensure`] did (or, for [`Linker::plan`], would do).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link did not exist and was created.
    Created,
    /// The link already pointed at the source.
    AlreadyCorrect,
    /// Something else occupied the destination; it was moved to the given
    /// backup path and the link created.
    ReplacedAfterBackup(PathBuf),
}

impl LinkOutcome {
    /// Whether the file system changed (or would change).
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::AlreadyCorrect)
    }
}

/// Applies link-table entries: repository-relative sources linked into the
/// home directory.
#[derive(Debug, Clone)]
pub struct Linker {
    root: PathBuf,
    home: PathBuf,
    backup: bool,
}

impl Linker {
    /// Create a linker resolving sources against `root` and destinations
    /// against `home`.  With `backup`, conflicting destinations are moved
    /// aside instead of refused.
    #[must_use]
    pub const fn new(root: PathBuf, home: PathBuf, backup: bool) -> Self {
        Self { root, home, backup }
    }

    /// Absolute source path for a link-table key.
    #[must_use]
    pub fn source_path(&self, source: &str) -> PathBuf {
        self.root.join(source)
    }

    /// Absolute destination path for a link-table value.
    #[must_use]
    pub fn dest_path(&self, dest: &str) -> PathBuf {
        expand_home(dest, &self.home)
    }

    fn resource(&self, source: &str, dest: &str) -> SymlinkResource {
        SymlinkResource::new(self.source_path(source), self.dest_path(dest))
    }

    /// Decide what [`ensure`](Self::ensure) would do, without touching the
    /// file system.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing, the destination conflicts
    /// and backups are disabled, or the destination cannot be inspected.
    pub fn plan(&self, source: &str, dest: &str) -> Result<LinkOutcome> {
        let link = self.resource(source, dest);
        match link.current_state()? {
            ResourceState::Invalid { reason } => bail!(reason),
            ResourceState::Correct => Ok(LinkOutcome::AlreadyCorrect),
            ResourceState::Missing => Ok(LinkOutcome::Created),
            ResourceState::Incorrect { current } => {
                if self.backup {
                    Ok(LinkOutcome::ReplacedAfterBackup(backup_path(&link.target)))
                } else {
                    bail!(
                        "{} already exists ({current}); rerun with --backup to move it aside",
                        link.target.display()
                    )
                }
            }
        }
    }

    /// Make `dest` a symlink to `source`.
    ///
    /// Parent directories are always created.  A conflicting destination is
    /// renamed to its backup path when backups are enabled and left
    /// untouched otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`plan`](Self::plan), or
    /// if the backup rename or link creation fails.
    pub fn ensure(&self, source: &str, dest: &str) -> Result<LinkOutcome> {
        let link = self.resource(source, dest);
        let outcome = self.plan(source, dest)?;
        match &outcome {
            LinkOutcome::AlreadyCorrect => {}
            LinkOutcome::Created => {
                link.apply()?;
            }
            LinkOutcome::ReplacedAfterBackup(backup) => {
                std::fs::rename(&link.target, backup).with_context(|| {
                    format!(
                        "back up {} to {}",
                        link.target.display(),
                        backup.display()
                    )
                })?;
                link.apply()?;
            }
        }
        Ok(outcome)
    }

    /// Remove `dest` if it is still a symlink to `source`.
    ///
    /// Returns `true` if a link was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the link exists but cannot be removed.
    pub fn remove(&self, source: &str, dest: &str) -> Result<bool> {
        Ok(self.resource(source, dest).remove()? == ResourceChange::Applied)
    }
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        let result = if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.with_context(|| {
            format!(
                "creating symlink {} -> {} (requires developer mode or admin)",
                link.display(),
                target.display()
            )
        })?;
    }

    Ok(())
}

/// Remove a symlink, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not `remove_file`).
fn remove_symlink(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    if is_dir_like(&meta) {
        std::fs::remove_dir(path)
            .with_context(|| format!("removing directory link: {}", path.display()))?;
    } else {
        std::fs::remove_file(path).with_context(|| format!("removing link: {}", path.display()))?;
    }
    Ok(())
}

/// Check if metadata represents a directory-like entry.
/// On Windows, `symlink_metadata().is_dir()` returns `false` for directory symlinks,
/// so we check the raw `FILE_ATTRIBUTE_DIRECTORY` bit instead.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        home: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("repo");
        let home = dir.path().join("home");
        fs::create_dir_all(root.join("zsh")).unwrap();
        fs::create_dir_all(&home).unwrap();
        fs::write(root.join("zsh/.zshrc"), "# zshrc").unwrap();
        Fixture {
            _dir: dir,
            root,
            home,
        }
    }

    impl Fixture {
        fn linker(&self, backup: bool) -> Linker {
            Linker::new(self.root.clone(), self.home.clone(), backup)
        }
    }

    #[test]
    fn paths_equal_works() {
        assert!(paths_equal(Path::new("/tmp/test"), Path::new("/tmp/test")));
        assert!(!paths_equal(Path::new("/tmp/test"), Path::new("/tmp/other")));
    }

    #[test]
    fn description_mentions_both_ends() {
        let r = SymlinkResource::new(PathBuf::from("/source"), PathBuf::from("/target"));
        assert_eq!(r.description(), "/target -> /source");
    }

    #[test]
    fn invalid_when_source_missing() {
        let f = fixture();
        let r = SymlinkResource::new(f.root.join("nope"), f.home.join("x"));
        assert!(matches!(
            r.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
    }

    #[test]
    fn ensure_creates_link_and_parents() {
        let f = fixture();
        let outcome = f.linker(false).ensure("zsh/.zshrc", "~/.config/zsh/.zshrc").unwrap();
        assert_eq!(outcome, LinkOutcome::Created);
        let dest = f.home.join(".config/zsh/.zshrc");
        assert_eq!(fs::read_link(&dest).unwrap(), f.root.join("zsh/.zshrc"));
    }

    #[test]
    fn ensure_is_idempotent() {
        let f = fixture();
        let linker = f.linker(false);
        linker.ensure("zsh/.zshrc", "~/.zshrc").unwrap();
        assert_eq!(
            linker.ensure("zsh/.zshrc", "~/.zshrc").unwrap(),
            LinkOutcome::AlreadyCorrect
        );
    }

    #[test]
    fn relative_destination_resolves_against_home() {
        let f = fixture();
        f.linker(false).ensure("zsh/.zshrc", ".zshrc").unwrap();
        assert!(f.home.join(".zshrc").symlink_metadata().is_ok());
    }

    #[test]
    fn conflict_without_backup_is_refused_untouched() {
        let f = fixture();
        let dest = f.home.join(".zshrc");
        fs::write(&dest, "mine").unwrap();
        let err = f.linker(false).ensure("zsh/.zshrc", "~/.zshrc").unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");
        assert_eq!(fs::read_to_string(&dest).unwrap(), "mine");
        assert!(fs::read_link(&dest).is_err());
    }

    #[test]
    fn conflict_with_backup_moves_file_aside() {
        let f = fixture();
        let dest = f.home.join(".zshrc");
        fs::write(&dest, "mine").unwrap();
        let outcome = f.linker(true).ensure("zsh/.zshrc", "~/.zshrc").unwrap();
        let backup = f.home.join(".zshrc.before-dotstate");
        assert_eq!(outcome, LinkOutcome::ReplacedAfterBackup(backup.clone()));
        assert_eq!(fs::read_to_string(backup).unwrap(), "mine");
        assert_eq!(fs::read_link(&dest).unwrap(), f.root.join("zsh/.zshrc"));
    }

    #[test]
    fn second_backup_is_numbered() {
        let f = fixture();
        let dest = f.home.join(".zshrc");
        fs::write(f.home.join(".zshrc.before-dotstate"), "first").unwrap();
        fs::write(&dest, "second").unwrap();
        let outcome = f.linker(true).ensure("zsh/.zshrc", "~/.zshrc").unwrap();
        assert_eq!(
            outcome,
            LinkOutcome::ReplacedAfterBackup(f.home.join(".zshrc.before-dotstate.1"))
        );
    }

    #[test]
    fn wrong_symlink_is_a_conflict() {
        let f = fixture();
        let dest = f.home.join(".zshrc");
        std::os::unix::fs::symlink("/somewhere/else", &dest).unwrap();
        assert!(f.linker(false).ensure("zsh/.zshrc", "~/.zshrc").is_err());
        assert!(matches!(
            f.linker(true).ensure("zsh/.zshrc", "~/.zshrc").unwrap(),
            LinkOutcome::ReplacedAfterBackup(_)
        ));
    }

    #[test]
    fn missing_source_is_an_error() {
        let f = fixture();
        let err = f.linker(true).ensure("zsh/missing", "~/.missing").unwrap_err();
        assert!(err.to_string().contains("source does not exist"), "{err}");
        assert!(!exists_no_follow(&f.home.join(".missing")));
    }

    #[test]
    fn plan_does_not_touch_file_system() {
        let f = fixture();
        let dest = f.home.join(".zshrc");
        fs::write(&dest, "mine").unwrap();
        let outcome = f.linker(true).plan("zsh/.zshrc", "~/.zshrc").unwrap();
        assert!(outcome.changed());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "mine");
        assert!(!f.home.join(".zshrc.before-dotstate").exists());
    }

    #[test]
    fn remove_only_removes_our_link() {
        let f = fixture();
        let linker = f.linker(false);
        linker.ensure("zsh/.zshrc", "~/.zshrc").unwrap();
        assert!(linker.remove("zsh/.zshrc", "~/.zshrc").unwrap());
        assert!(!exists_no_follow(&f.home.join(".zshrc")));
        assert!(!linker.remove("zsh/.zshrc", "~/.zshrc").unwrap());

        fs::write(f.home.join(".zshrc"), "user file").unwrap();
        assert!(!linker.remove("zsh/.zshrc", "~/.zshrc").unwrap());
        assert_eq!(
            fs::read_to_string(f.home.join(".zshrc")).unwrap(),
            "user file"
        );
    }

    #[test]
    fn real_directory_at_destination_is_backed_up() {
        let f = fixture();
        fs::create_dir_all(f.home.join(".zshrc/inner")).unwrap();
        let outcome = f.linker(true).ensure("zsh/.zshrc", "~/.zshrc").unwrap();
        assert!(matches!(outcome, LinkOutcome::ReplacedAfterBackup(_)));
        assert!(f.home.join(".zshrc.before-dotstate/inner").is_dir());
    }
}
