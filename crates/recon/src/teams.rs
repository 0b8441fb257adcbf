//! Team label canonicalization for the secondary dataset.
//!
//! A raw label is reduced to its first comma-separated segment (players who
//! moved clubs mid-season are listed with their full history), then mapped
//! through an exact-match, case-sensitive alias table. Unknown labels pass
//! through unchanged.

use std::collections::BTreeMap;

use log::debug;

use crate::config::TeamsConfig;
use crate::model::Dataset;

/// Long/alternate names mapped to the primary dataset's short names.
pub const BUILTIN_TEAM_ALIASES: &[(&str, &str)] = &[
    ("Manchester United", "Man Utd"),
    ("Manchester City", "Man City"),
    ("Newcastle United", "Newcastle"),
    ("Sheffield United", "Sheffield Utd"),
    ("Tottenham", "Spurs"),
    ("Wolverhampton Wanderers", "Wolves"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamNormalizer {
    aliases: BTreeMap<String, String>,
}

impl Default for TeamNormalizer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TeamNormalizer {
    /// Normalizer with only the built-in alias table.
    pub fn builtin() -> Self {
        Self::from_aliases(
            BUILTIN_TEAM_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string())),
        )
    }

    pub fn from_aliases<I>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            aliases: aliases.into_iter().collect(),
        }
    }

    /// Built-in table (unless disabled) overlaid with configured entries.
    pub fn from_config(config: &TeamsConfig) -> Self {
        let mut normalizer = if config.builtin_aliases {
            Self::builtin()
        } else {
            Self::from_aliases(std::iter::empty())
        };
        for (from, to) in &config.aliases {
            normalizer.aliases.insert(from.clone(), to.clone());
        }
        normalizer
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Canonical form of one raw label.
    ///
    /// Idempotent as long as no alias target is itself an alias key.
    pub fn canonical(&self, raw: &str) -> String {
        let first = raw.split(',').next().unwrap_or(raw).trim();
        match self.aliases.get(first) {
            Some(short) => short.clone(),
            None => first.to_string(),
        }
    }

    /// Return a copy of `dataset` with every team label canonicalized.
    pub fn normalize(&self, dataset: &Dataset) -> Dataset {
        let mut normalized = dataset.clone();
        let mut changed = 0usize;
        for record in &mut normalized.records {
            let canonical = self.canonical(&record.team);
            if canonical != record.team {
                changed += 1;
                record.team = canonical;
            }
        }
        debug!(
            "dataset '{}': canonicalized {changed} of {} team label(s)",
            normalized.label,
            normalized.records.len()
        );
        normalized
    }
}
