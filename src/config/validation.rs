//! Configuration checks: fatal problems collected together, plus
//! non-fatal warnings about files missing on disk.
use std::path::Path;

use super::Config;
use super::model::Component;
use crate::platform::Os;

/// A validation warning detected during configuration loading.
///
/// Warnings never stop a run; fatal problems are returned by [`problems`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Component identity (`<profile>.<component>`).
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Warning about `item`.
    #[must_use]
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Collect every fatal schema problem in `config`.
///
/// An empty vector means the configuration is usable.
#[must_use]
pub fn problems(config: &Config) -> Vec<String> {
    let mut problems = Vec::new();

    if config.profiles.is_empty() {
        problems.push("no profiles defined".to_string());
    }

    for profile in config.profiles.values() {
        if profile.name.contains('.') {
            problems.push(format!("profile name '{}' must not contain '.'", profile.name));
        }
        let components = profile.components();
        if components.is_empty() {
            problems.push(format!("profile '{}' has no components", profile.name));
        }
        for (name, component) in components {
            component_problems(&format!("{}.{name}", profile.name), component, &mut problems);
        }
    }

    problems
}

fn component_problems(id: &str, component: &Component, problems: &mut Vec<String>) {
    if !component.has_actions() {
        problems.push(format!(
            "component '{id}' has no actions (install, uninstall, link or defaults)"
        ));
    }

    for tag in &component.os {
        if !Os::is_known_tag(tag) {
            problems.push(format!(
                "component '{id}' has unknown os tag '{tag}' (expected one of: {})",
                Os::known_tags().join(", ")
            ));
        }
    }

    for (table, entries) in [
        ("install", &component.install),
        ("uninstall", &component.uninstall),
    ] {
        for (manager, command) in entries {
            if command.trim().is_empty() {
                problems.push(format!(
                    "component '{id}' has an empty {table} command for '{manager}'"
                ));
            }
        }
    }

    for (hook, command) in [
        ("postInstall", &component.post_install),
        ("postLink", &component.post_link),
    ] {
        if command.as_deref().is_some_and(|c| c.trim().is_empty()) {
            problems.push(format!("component '{id}' has an empty {hook} command"));
        }
    }

    for (source, dest) in &component.link {
        if Path::new(source).is_absolute() || source.starts_with('/') {
            problems.push(format!(
                "component '{id}' link source '{source}' must be relative to the repository root"
            ));
        }
        if dest.trim().is_empty() {
            problems.push(format!(
                "component '{id}' link source '{source}' has an empty destination"
            ));
        }
    }
}

/// Collect non-fatal warnings: files referenced by the config that are
/// missing on disk.
#[must_use]
pub fn warnings(config: &Config) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for profile in config.profiles.values() {
        for (name, component) in profile.components() {
            let id = format!("{}.{name}", profile.name);
            for source in component.link.keys() {
                let path = config.root.join(source);
                if !path.exists() {
                    warnings.push(ValidationWarning::new(
                        &id,
                        format!("link source does not exist: {}", path.display()),
                    ));
                }
            }
            for (domain, file) in &component.defaults {
                let path = config.root.join(file);
                if !path.exists() {
                    warnings.push(ValidationWarning::new(
                        &id,
                        format!(
                            "preferences file for '{domain}' does not exist: {}",
                            path.display()
                        ),
                    ));
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(src: &str, root: &Path) -> Config {
        Config::parse(src, root, &root.join("dotstate.toml")).unwrap()
    }

    fn problems_of(src: &str) -> Vec<String> {
        let root = PathBuf::from("/repo");
        let config = Config::parse(src, &root, &root.join("dotstate.toml"))
            .map(|c| problems(&c));
        match config {
            Ok(p) => p,
            Err(crate::error::ConfigError::Invalid { problems, .. }) => problems,
            Err(e) => vec![e.to_string()],
        }
    }

    #[test]
    fn valid_config_has_no_problems() {
        let p = problems_of(
            r#"
            [profiles."*".git]
            link = { "git/.gitconfig" = "~/.gitconfig" }
            "#,
        );
        assert!(p.is_empty(), "{p:?}");
    }

    #[test]
    fn empty_document_reports_no_profiles() {
        let p = problems_of("");
        assert_eq!(p, ["no profiles defined"]);
    }

    #[test]
    fn empty_profile_is_reported() {
        let p = problems_of(
            r#"
            [profiles."*".git]
            link = { "a" = "~/a" }
            [profiles.work]
            "#,
        );
        assert_eq!(p, ["profile 'work' has no components"]);
    }

    #[test]
    fn all_problems_are_collected() {
        let p = problems_of(
            r#"
            [profiles.dev.rg]
            install = { brew = "" }
            os = ["amiga"]
            postLink = " "
            [profiles.dev.vim]
            link = { "/abs/vimrc" = "~/.vimrc" }
            [profiles.dev.none]
            install = {}
            "#,
        );
        assert_eq!(p.len(), 5, "{p:?}");
        assert!(p.iter().any(|m| m.contains("unknown os tag 'amiga'")));
        assert!(p.iter().any(|m| m.contains("empty install command for 'brew'")));
        assert!(p.iter().any(|m| m.contains("empty postLink command")));
        assert!(p.iter().any(|m| m.contains("must be relative")));
        assert!(p.iter().any(|m| m.contains("'dev.none' has no actions")));
    }

    #[test]
    fn missing_link_source_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("git")).unwrap();
        std::fs::write(dir.path().join("git/.gitconfig"), "").unwrap();
        let c = config(
            r#"
            [profiles."*".git]
            link = { "git/.gitconfig" = "~/.gitconfig", "git/missing" = "~/.missing" }
            "#,
            dir.path(),
        );
        let w = warnings(&c);
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].item, "*.git");
        assert!(w[0].message.contains("git/missing"));
    }
}
