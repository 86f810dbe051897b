//! Profile resolution: expand requested profiles into an ordered,
//! deduplicated component list.
use std::collections::BTreeMap;

use super::matcher::{self, MatchKind};
use super::model::Component;
use super::{BASE_PROFILE, Config};
use crate::error::ConfigError;
use crate::platform::{Os, Platform};

/// A component selected for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedComponent {
    /// Profile that contributed the component.
    pub profile: String,
    /// Dotted path within the profile.
    pub name: String,
    /// The definition.
    pub component: Component,
}

impl ResolvedComponent {
    /// Persistent identity: `<profile>.<name>`.
    #[must_use]
    pub fn identity(&self) -> String {
        identity(&self.profile, &self.name)
    }
}

/// Build a component identity from its parts.
#[must_use]
pub fn identity(profile: &str, name: &str) -> String {
    format!("{profile}.{name}")
}

/// A component dropped because an earlier profile already provided the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadowed {
    /// Dotted component name shared by both profiles.
    pub name: String,
    /// Profile whose definition was dropped.
    pub profile: String,
    /// Profile whose definition was kept.
    pub kept_from: String,
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Components in deterministic order.
    pub components: Vec<ResolvedComponent>,
    /// Fuzzy terms that matched nothing.
    pub unmatched_terms: Vec<String>,
    /// Duplicates dropped by first-seen-wins deduplication.
    pub shadowed: Vec<Shadowed>,
}

impl Resolution {
    /// Identities of every resolved component.
    #[must_use]
    pub fn identities(&self) -> Vec<String> {
        self.components.iter().map(ResolvedComponent::identity).collect()
    }
}

/// Profiles visited for `requested`: `"*"` first (when defined), then the
/// requested names in order with repeats removed.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownProfile`] for a requested name that is not
/// defined.
pub fn profile_order(config: &Config, requested: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut order: Vec<String> = Vec::new();
    if config.has_profile(BASE_PROFILE) {
        order.push(BASE_PROFILE.to_string());
    }
    for name in requested {
        if name == BASE_PROFILE || order.contains(name) {
            continue;
        }
        if !config.has_profile(name) {
            return Err(ConfigError::UnknownProfile {
                name: name.clone(),
                available: config.profile_names().join(", "),
            });
        }
        order.push(name.clone());
    }
    Ok(order)
}

/// Resolve `requested` profiles into the components to converge on `os`.
///
/// When `fuzzy_terms` is non-empty only components whose name matches at
/// least one term are kept.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownProfile`] for an undefined requested profile.
pub fn resolve(
    config: &Config,
    requested: &[String],
    fuzzy_terms: &[String],
    os: &Os,
) -> Result<Resolution, ConfigError> {
    let platform = Platform::new(os.clone());
    let mut resolution = Resolution::default();
    let mut seen: BTreeMap<String, String> = BTreeMap::new();

    for profile_name in profile_order(config, requested)? {
        let Some(profile) = config.profiles.get(&profile_name) else {
            continue;
        };
        for (name, component) in profile.components() {
            if !platform.allows(&component.os) {
                continue;
            }
            if let Some(kept_from) = seen.get(&name) {
                resolution.shadowed.push(Shadowed {
                    name,
                    profile: profile_name.clone(),
                    kept_from: kept_from.clone(),
                });
                continue;
            }
            seen.insert(name.clone(), profile_name.clone());
            resolution.components.push(ResolvedComponent {
                profile: profile_name.clone(),
                name,
                component: component.clone(),
            });
        }
    }

    if !fuzzy_terms.is_empty() {
        let mut matched = vec![false; fuzzy_terms.len()];
        resolution.components.retain(|rc| {
            let hits: Vec<(usize, MatchKind)> = fuzzy_terms
                .iter()
                .enumerate()
                .filter_map(|(i, term)| matcher::match_kind(&rc.name, term).map(|k| (i, k)))
                .collect();
            for (i, _) in &hits {
                if let Some(flag) = matched.get_mut(*i) {
                    *flag = true;
                }
            }
            !hits.is_empty()
        });
        resolution.unmatched_terms = fuzzy_terms
            .iter()
            .zip(matched)
            .filter(|(_, hit)| !hit)
            .map(|(term, _)| term.clone())
            .collect();
    }

    Ok(resolution)
}
