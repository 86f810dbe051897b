//! Host environment probing: operating system and package-manager availability.
use std::collections::BTreeMap;
use std::fmt;

use crate::exec::Executor;

/// Detected (or configured) operating system, in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Os {
    /// macOS.
    Darwin,
    /// Any Linux distribution.
    Linux,
    /// Windows.
    Windows,
    /// Anything else, carried as the lowercased raw value.
    Other(String),
}

/// Distribution names that all mean "linux" in an `os` filter.
const LINUX_ALIASES: &[&str] = &[
    "linux", "ubuntu", "debian", "arch", "fedora", "centos", "rhel", "alpine", "manjaro",
    "opensuse", "nixos", "gentoo", "mint", "pop",
];

/// macOS spellings accepted in an `os` filter.
const DARWIN_ALIASES: &[&str] = &["darwin", "mac", "macos", "osx"];

/// Windows spellings accepted in an `os` filter.
const WINDOWS_ALIASES: &[&str] = &["windows", "win"];

impl Os {
    /// Normalize a user-facing OS tag (`mac`, `ubuntu`, …) or host value.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotstate::platform::Os;
    ///
    /// assert_eq!(Os::normalize("osx"), Os::Darwin);
    /// assert_eq!(Os::normalize("Ubuntu"), Os::Linux);
    /// assert_eq!(Os::normalize("freebsd"), Os::Other("freebsd".into()));
    /// ```
    #[must_use]
    pub fn normalize(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        if DARWIN_ALIASES.contains(&tag.as_str()) {
            Self::Darwin
        } else if LINUX_ALIASES.contains(&tag.as_str()) {
            Self::Linux
        } else if WINDOWS_ALIASES.contains(&tag.as_str()) {
            Self::Windows
        } else {
            Self::Other(tag)
        }
    }

    /// Whether `tag` is one of the OS tags accepted in configuration.
    #[must_use]
    pub fn is_known_tag(tag: &str) -> bool {
        !matches!(Self::normalize(tag), Self::Other(_))
    }

    /// All OS tags accepted in configuration, for error messages.
    #[must_use]
    pub fn known_tags() -> Vec<&'static str> {
        DARWIN_ALIASES
            .iter()
            .chain(LINUX_ALIASES)
            .chain(WINDOWS_ALIASES)
            .copied()
            .collect()
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Normalized host operating system.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            os: Os::normalize(std::env::consts::OS),
        }
    }

    /// Create a platform with an explicit OS (tests, simulated runs).
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Whether the host is macOS.
    #[must_use]
    pub fn is_darwin(&self) -> bool {
        self.os == Os::Darwin
    }

    /// Whether a component restricted to `tags` applies to this host.
    ///
    /// An empty tag list means "every OS".
    #[must_use]
    pub fn allows(&self, tags: &[String]) -> bool {
        tags.is_empty() || tags.iter().any(|t| Os::normalize(t) == self.os)
    }
}

/// A chosen `(manager, command)` pair from an install or uninstall table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Package manager (executable) name, e.g. `brew`.
    pub manager: String,
    /// Shell command to run.
    pub command: String,
}

/// Pick the first entry of `table` whose manager is on PATH.
///
/// `BTreeMap` iteration is sorted by manager name, so the choice is the same
/// on every run for the same host.  `None` means nothing can be run here.
#[must_use]
pub fn first_available(
    table: &BTreeMap<String, String>,
    executor: &dyn Executor,
) -> Option<Selection> {
    table
        .iter()
        .find(|(manager, _)| executor.which(manager))
        .map(|(manager, command)| Selection {
            manager: manager.clone(),
            command: command.clone(),
        })
}

/// Like [`first_available`], but try `preferred` first when it is present
/// and available.
#[must_use]
pub fn preferred_or_first_available(
    table: &BTreeMap<String, String>,
    preferred: &str,
    executor: &dyn Executor,
) -> Option<Selection> {
    table
        .get_key_value(preferred)
        .filter(|(manager, _)| executor.which(manager))
        .map(|(manager, command)| Selection {
            manager: manager.clone(),
            command: command.clone(),
        })
        .or_else(|| first_available(table, executor))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::MockExecutor;

    fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn mock_with_path(available: &'static [&'static str]) -> MockExecutor {
        let mut mock = MockExecutor::new();
        mock.expect_which()
            .returning(move |program| available.contains(&program));
        mock
    }

    #[test]
    fn normalize_mac_aliases() {
        for tag in ["mac", "macos", "osx", "darwin", "MacOS"] {
            assert_eq!(Os::normalize(tag), Os::Darwin, "{tag}");
        }
    }

    #[test]
    fn normalize_distro_names_to_linux() {
        for tag in ["linux", "ubuntu", "arch", "Fedora"] {
            assert_eq!(Os::normalize(tag), Os::Linux, "{tag}");
        }
    }

    #[test]
    fn normalize_unknown_keeps_raw_value() {
        assert_eq!(Os::normalize("FreeBSD"), Os::Other("freebsd".to_string()));
        assert!(!Os::is_known_tag("amiga"));
        assert!(Os::is_known_tag("osx"));
    }

    #[test]
    fn detect_matches_host() {
        let p = Platform::detect();
        if cfg!(target_os = "linux") {
            assert_eq!(p.os, Os::Linux);
        } else if cfg!(target_os = "macos") {
            assert_eq!(p.os, Os::Darwin);
        }
    }

    #[test]
    fn allows_empty_filter() {
        assert!(Platform::new(Os::Linux).allows(&[]));
    }

    #[test]
    fn allows_compares_normalized_forms() {
        let linux = Platform::new(Os::Linux);
        assert!(!linux.allows(&["mac".to_string()]));
        assert!(linux.allows(&["mac".to_string(), "ubuntu".to_string()]));
        let mac = Platform::new(Os::Darwin);
        assert!(mac.allows(&["osx".to_string()]));
    }

    #[test]
    fn os_display() {
        assert_eq!(Os::Darwin.to_string(), "darwin");
        assert_eq!(Os::Linux.to_string(), "linux");
        assert_eq!(Os::Other("plan9".to_string()).to_string(), "plan9");
    }

    #[test]
    fn first_available_iterates_sorted_keys() {
        let install = table(&[("port", "port install rg"), ("brew", "brew install rg")]);
        let mock = mock_with_path(&["brew", "port"]);
        let sel = first_available(&install, &mock).unwrap();
        assert_eq!(sel.manager, "brew");
        assert_eq!(sel.command, "brew install rg");
    }

    #[test]
    fn first_available_skips_missing_managers() {
        let install = table(&[("apt", "apt install rg"), ("brew", "brew install rg")]);
        let mock = mock_with_path(&["brew"]);
        assert_eq!(first_available(&install, &mock).unwrap().manager, "brew");
    }

    #[test]
    fn first_available_none_when_nothing_on_path() {
        let install = table(&[("apt", "apt install rg")]);
        let mock = mock_with_path(&[]);
        assert!(first_available(&install, &mock).is_none());
    }

    #[test]
    fn preferred_manager_wins_when_available() {
        let uninstall = table(&[("apt", "apt remove rg"), ("brew", "brew uninstall rg")]);
        let mock = mock_with_path(&["apt", "brew"]);
        let sel = preferred_or_first_available(&uninstall, "brew", &mock).unwrap();
        assert_eq!(sel.manager, "brew");
    }

    #[test]
    fn preferred_manager_falls_back_when_missing() {
        let uninstall = table(&[("apt", "apt remove rg"), ("brew", "brew uninstall rg")]);
        let mock = mock_with_path(&["apt"]);
        let sel = preferred_or_first_available(&uninstall, "brew", &mock).unwrap();
        assert_eq!(sel.manager, "apt");
    }
}
