use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::error::ReconError;
use crate::similarity::MAX_SCORE;
use crate::teams::TeamNormalizer;

/// Composite score a candidate must strictly exceed to be accepted.
pub const DEFAULT_THRESHOLD: u32 = 260;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Exclude secondary records from later candidate sets once claimed.
    #[serde(default)]
    pub one_to_one: bool,
    #[serde(default)]
    pub teams: TeamsConfig,
    pub primary: DatasetConfig,
    pub secondary: DatasetConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TeamsConfig {
    /// Start from the built-in alias table.
    #[serde(default = "default_true")]
    pub builtin_aliases: bool,
    /// Extra entries; override built-ins with the same key.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            builtin_aliases: true,
            aliases: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub file: String,
    #[serde(default)]
    pub format: DataFormat,
    pub columns: ColumnMapping,
    /// Columns left out of the carried performance fields.
    #[serde(default)]
    pub drop: Vec<String>,
    /// Stable-sort records by name after loading.
    #[serde(default)]
    pub sort_by_name: bool,
    #[serde(default)]
    pub derived: Vec<DerivedColumn>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    #[default]
    Csv,
    Json,
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub name: Option<String>,
    /// Columns joined with a single space to form the name
    /// (e.g. `first_name` + `second_name`).
    #[serde(default)]
    pub name_parts: Option<Vec<String>>,
    pub team: String,
}

impl ColumnMapping {
    /// Source columns that make up the name.
    pub fn name_sources(&self) -> Vec<&str> {
        match (&self.name, &self.name_parts) {
            (Some(name), _) => vec![name.as_str()],
            (None, Some(parts)) => parts.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }
}

/// `column = numerator / denominator * scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct DerivedColumn {
    pub column: String,
    pub numerator: String,
    pub denominator: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub matches_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        if self.threshold > MAX_SCORE {
            return Err(ReconError::ConfigValidation(format!(
                "threshold must be at most {MAX_SCORE}, got {}",
                self.threshold
            )));
        }

        self.validate_teams()?;
        validate_dataset("primary", &self.primary)?;
        validate_dataset("secondary", &self.secondary)?;

        Ok(())
    }

    fn validate_teams(&self) -> Result<(), ReconError> {
        for (from, to) in &self.teams.aliases {
            if from.trim().is_empty() || to.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "team alias '{from}' -> '{to}': both sides must be non-empty"
                )));
            }
            if from.contains(',') {
                return Err(ReconError::ConfigValidation(format!(
                    "team alias '{from}': keys cannot contain ',' (labels are split on it)"
                )));
            }
            if to.contains(',') || to.trim() != to {
                return Err(ReconError::ConfigValidation(format!(
                    "team alias '{from}' -> '{to}': target must be trimmed and contain no ','"
                )));
            }
        }

        // A target that is also a key would make normalization non-idempotent.
        let effective = TeamNormalizer::from_config(&self.teams);
        let aliases = effective.aliases();
        for (from, to) in aliases {
            if from != to && aliases.contains_key(to) {
                return Err(ReconError::ConfigValidation(format!(
                    "team alias '{from}' -> '{to}': target is itself an alias key"
                )));
            }
        }

        Ok(())
    }
}

fn validate_dataset(label: &str, dataset: &DatasetConfig) -> Result<(), ReconError> {
    if dataset.file.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!("{label}: file must not be empty")));
    }

    let cols = &dataset.columns;
    match (&cols.name, &cols.name_parts) {
        (Some(_), Some(_)) => {
            return Err(ReconError::ConfigValidation(format!(
                "{label}: set either columns.name or columns.name_parts, not both"
            )));
        }
        (None, None) => {
            return Err(ReconError::ConfigValidation(format!(
                "{label}: columns.name or columns.name_parts is required"
            )));
        }
        _ => {}
    }
    let sources = cols.name_sources();
    if sources.is_empty() || sources.iter().any(|c| c.trim().is_empty()) {
        return Err(ReconError::ConfigValidation(format!(
            "{label}: name column(s) must not be empty"
        )));
    }
    if cols.team.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "{label}: columns.team must not be empty"
        )));
    }

    let mut seen = HashSet::new();
    for derived in &dataset.derived {
        if derived.column.trim().is_empty() {
            return Err(ReconError::ConfigValidation(format!(
                "{label}: derived column name must not be empty"
            )));
        }
        if derived.column == "name" || derived.column == "team" {
            return Err(ReconError::ConfigValidation(format!(
                "{label}: derived column '{}' collides with a join key",
                derived.column
            )));
        }
        if !seen.insert(derived.column.as_str()) {
            return Err(ReconError::ConfigValidation(format!(
                "{label}: derived column '{}' defined twice",
                derived.column
            )));
        }
        if !derived.scale.is_finite() {
            return Err(ReconError::ConfigValidation(format!(
                "{label}: derived column '{}' has a non-finite scale",
                derived.column
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "EPL 2019/20"

[primary]
file = "fpl.csv"
[primary.columns]
name = "player_name"
team = "team"

[secondary]
file = "understat.json"
format = "json"
drop = ["id", "time", "position"]
[secondary.columns]
name = "player_name"
team = "team_title"
"#;

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = ReconConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "EPL 2019/20");
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert!(!config.one_to_one);
        assert!(config.teams.builtin_aliases);
        assert!(config.teams.aliases.is_empty());
        assert_eq!(config.primary.format, DataFormat::Csv);
        assert_eq!(config.secondary.format, DataFormat::Json);
        assert_eq!(config.secondary.drop, vec!["id", "time", "position"]);
        assert!(config.output.json.is_none());
    }

    #[test]
    fn parse_full() {
        let input = r#"
name = "Full"
threshold = 300
one_to_one = true

[teams]
builtin_aliases = false
[teams.aliases]
"Leicester City" = "Leicester"

[primary]
file = "elements.json"
format = "json"
sort_by_name = true
drop = ["id"]
[primary.columns]
name_parts = ["first_name", "second_name"]
team = "team"
[[primary.derived]]
column = "value_minutes"
numerator = "value_season"
denominator = "minutes"
scale = 100.0

[secondary]
file = "understat.csv"
[secondary.columns]
name = "player_name"
team = "team_title"

[output]
json = "out/merged.json"
csv = "out/merged.csv"
matches_csv = "out/matches.csv"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.threshold, 300);
        assert!(config.one_to_one);
        assert!(!config.teams.builtin_aliases);
        assert_eq!(config.teams.aliases["Leicester City"], "Leicester");
        assert_eq!(
            config.primary.columns.name_sources(),
            vec!["first_name", "second_name"]
        );
        assert!(config.primary.sort_by_name);
        let derived = &config.primary.derived[0];
        assert_eq!(derived.column, "value_minutes");
        assert_eq!(derived.scale, 100.0);
        assert_eq!(config.output.matches_csv.as_deref(), Some("out/matches.csv"));
    }

    #[test]
    fn reject_threshold_above_max() {
        let input = MINIMAL.replace("name = \"EPL 2019/20\"", "name = \"x\"\nthreshold = 401");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("threshold must be at most 400"));
    }

    #[test]
    fn reject_name_and_name_parts_together() {
        let input = MINIMAL.replacen(
            "name = \"player_name\"\nteam = \"team\"",
            "name = \"player_name\"\nname_parts = [\"a\", \"b\"]\nteam = \"team\"",
            1,
        );
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn reject_missing_name_mapping() {
        let input = MINIMAL.replacen("name = \"player_name\"\nteam = \"team\"", "team = \"team\"", 1);
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("primary: columns.name or columns.name_parts is required"));
    }

    #[test]
    fn reject_chained_alias() {
        let input = format!(
            "{MINIMAL}\n[teams.aliases]\n\"Spurs FC\" = \"Tottenham\"\n"
        );
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("target is itself an alias key"));
    }

    #[test]
    fn reject_unknown_format() {
        let input = MINIMAL.replace("format = \"json\"", "format = \"xlsx\"");
        assert!(ReconConfig::from_toml(&input).is_err());
    }

    #[test]
    fn reject_derived_key_collision() {
        let input = format!(
            "{MINIMAL}\n[[primary.derived]]\ncolumn = \"team\"\nnumerator = \"a\"\ndenominator = \"b\"\n"
        );
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("collides with a join key"));
    }
}
