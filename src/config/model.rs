//! Declarative model: profiles, the component/container node tree, and
//! component definitions.
use serde::Deserialize;
use std::collections::BTreeMap;

/// Keys whose presence makes a table a [`Component`] rather than a container.
pub const ACTION_KEYS: &[&str] = &["install", "uninstall", "link", "defaults"];

/// A single installable/linkable unit.
///
/// Every command table is a `BTreeMap` so alternatives are always iterated
/// in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Component {
    /// Package manager → install command.
    #[serde(default)]
    pub install: BTreeMap<String, String>,
    /// Package manager → uninstall command.
    #[serde(default)]
    pub uninstall: BTreeMap<String, String>,
    /// Repository-relative source → destination (may start with `~`).
    #[serde(default)]
    pub link: BTreeMap<String, String>,
    /// Runs after a successful install.
    #[serde(default)]
    pub post_install: Option<String>,
    /// Runs after a link was created or replaced.
    #[serde(default)]
    pub post_link: Option<String>,
    /// OS tags this component applies to; empty means every OS.
    #[serde(default)]
    pub os: Vec<String>,
    /// macOS preference domain → preferences file (repository-relative).
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

impl Component {
    /// Whether the component declares at least one non-empty action table.
    #[must_use]
    pub fn has_actions(&self) -> bool {
        !(self.install.is_empty()
            && self.uninstall.is_empty()
            && self.link.is_empty()
            && self.defaults.is_empty())
    }
}

/// A node of a profile tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A leaf carrying actions.
    Component(Component),
    /// A grouping table, expanded recursively.
    Container(BTreeMap<String, Self>),
}

impl Node {
    /// Classify `table` found at dotted `path`.
    ///
    /// A table is a component iff it has one of [`ACTION_KEYS`]; everything
    /// else is a container whose values must themselves be tables.
    ///
    /// # Errors
    ///
    /// Returns a diagnostic if a component has unknown or mistyped fields, or
    /// a container holds a non-table value.
    pub fn from_table(path: &str, table: toml::Table) -> Result<Self, String> {
        if ACTION_KEYS.iter().any(|k| table.contains_key(*k)) {
            toml::Value::Table(table)
                .try_into::<Component>()
                .map(Self::Component)
                .map_err(|e| format!("component '{path}': {}", e.message()))
        } else {
            parse_nodes(path, table).map(Self::Container)
        }
    }
}

/// Parse every entry of `table` as a child node of `path`.
///
/// # Errors
///
/// Returns the first diagnostic produced by [`Node::from_table`].
pub fn parse_nodes(path: &str, table: toml::Table) -> Result<BTreeMap<String, Node>, String> {
    table
        .into_iter()
        .map(|(key, value)| {
            let child = format!("{path}.{key}");
            let toml::Value::Table(inner) = value else {
                return Err(format!(
                    "'{child}' is not a table; a component needs one of: {}",
                    ACTION_KEYS.join(", ")
                ));
            };
            Node::from_table(&child, inner).map(|node| (key, node))
        })
        .collect()
}

/// A named profile: a tree of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile name (`"*"` is always active).
    pub name: String,
    /// Top-level nodes.
    pub nodes: BTreeMap<String, Node>,
}

impl Profile {
    /// Every component with its dotted path, in lexicographic path order.
    #[must_use]
    pub fn components(&self) -> Vec<(String, &Component)> {
        let mut out = Vec::new();
        collect(&self.nodes, None, &mut out);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Look up a component by dotted path, walking the tree one segment at
    /// a time.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Component> {
        find_in(&self.nodes, name)
    }
}

/// Resolve `path` below `nodes`.  Keys may themselves contain `.`, so every
/// key that is a prefix of `path` at a segment boundary is tried.
fn find_in<'a>(nodes: &'a BTreeMap<String, Node>, path: &str) -> Option<&'a Component> {
    if let Some(Node::Component(c)) = nodes.get(path) {
        return Some(c);
    }
    nodes.iter().find_map(|(key, node)| match node {
        Node::Container(children) => path
            .strip_prefix(key.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(|rest| find_in(children, rest)),
        Node::Component(_) => None,
    })
}

fn collect<'a>(
    nodes: &'a BTreeMap<String, Node>,
    prefix: Option<&str>,
    out: &mut Vec<(String, &'a Component)>,
) {
    for (key, node) in nodes {
        let path = prefix.map_or_else(|| key.clone(), |p| format!("{p}.{key}"));
        match node {
            Node::Component(c) => out.push((path, c)),
            Node::Container(children) => collect(children, Some(&path), out),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn table_with_install_is_component() {
        let node = Node::from_table(
            "dev.rg",
            table(r#"install = { brew = "brew install ripgrep" }"#),
        )
        .unwrap();
        let Node::Component(c) = node else {
            panic!("expected component");
        };
        assert_eq!(c.install["brew"], "brew install ripgrep");
    }

    #[test]
    fn camel_case_hooks_deserialize() {
        let node = Node::from_table(
            "dev.zsh",
            table(
                r#"
                link = { "zsh/.zshrc" = "~/.zshrc" }
                postLink = "exec zsh -l -c true"
                postInstall = "chsh -s /bin/zsh"
                "#,
            ),
        )
        .unwrap();
        let Node::Component(c) = node else {
            panic!("expected component");
        };
        assert_eq!(c.post_link.as_deref(), Some("exec zsh -l -c true"));
        assert_eq!(c.post_install.as_deref(), Some("chsh -s /bin/zsh"));
    }

    #[test]
    fn table_without_action_keys_is_container() {
        let node = Node::from_table(
            "dev.tools",
            table(
                r#"
                [rg]
                install = { brew = "brew install ripgrep" }
                [fd]
                install = { brew = "brew install fd" }
                "#,
            ),
        )
        .unwrap();
        let Node::Container(children) = node else {
            panic!("expected container");
        };
        assert_eq!(children.keys().collect::<Vec<_>>(), ["fd", "rg"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Node::from_table(
            "dev.rg",
            table(r#"install = { brew = "x" }
            instal = "typo""#),
        )
        .unwrap_err();
        assert!(err.contains("dev.rg"), "{err}");
        assert!(err.contains("instal"), "{err}");
    }

    #[test]
    fn scalar_in_container_is_rejected() {
        let err = Node::from_table("dev.tools", table(r#"postInstall = "echo""#)).unwrap_err();
        assert!(err.contains("dev.tools.postInstall"), "{err}");
    }

    #[test]
    fn components_are_sorted_by_dotted_path() {
        let nodes = parse_nodes(
            "dev",
            table(
                r#"
                [a.b]
                link = { "x" = "~/x" }
                [a-c]
                link = { "y" = "~/y" }
                [z]
                link = { "z" = "~/z" }
                "#,
            ),
        )
        .unwrap();
        let profile = Profile {
            name: "dev".to_string(),
            nodes,
        };
        let names: Vec<String> = profile.components().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a-c", "a.b", "z"]);
        assert!(profile.find("a.b").is_some());
        assert!(profile.find("a").is_none());
    }

    #[test]
    fn find_walks_nested_groups() {
        let nodes = parse_nodes(
            "dev",
            table(
                r#"
                [tools.search.rg]
                install = { brew = "brew install ripgrep" }
                [tools.fd]
                install = { brew = "brew install fd" }
                ["k8s.io".kubectl]
                install = { brew = "brew install kubectl" }
                "#,
            ),
        )
        .unwrap();
        let profile = Profile {
            name: "dev".to_string(),
            nodes,
        };
        assert_eq!(
            profile.find("tools.search.rg").unwrap().install["brew"],
            "brew install ripgrep"
        );
        assert!(profile.find("tools.fd").is_some());
        assert!(profile.find("k8s.io.kubectl").is_some());
        assert!(profile.find("tools").is_none());
        assert!(profile.find("tools.search").is_none());
        assert!(profile.find("tools.rg").is_none());
        assert!(profile.find("tools.fd.extra").is_none());
    }

    #[test]
    fn has_actions_false_for_empty_tables() {
        let c = Component {
            install: BTreeMap::new(),
            ..Component::default()
        };
        assert!(!c.has_actions());
    }
}
