use serde::{Deserialize, Serialize};

use crate::error::ReconError;

pub const DEFAULT_THRESHOLD: f64 = 85.0;

// ---------------------------------------------------------------------------
// Matching config (engine-facing)
// ---------------------------------------------------------------------------

/// What the engine needs to stitch two datasets together.
///
/// Built through [`ReconConfig::new`] or deserialized and then
/// [`validate`](ReconConfig::validate)d; the reconciler refuses an invalid one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    /// Column joined exactly by the key pass. `None` skips the key pass.
    #[serde(default)]
    pub key: Option<String>,
    /// Columns compared by the fuzzy pass, in order.
    #[serde(default)]
    pub fuzzy_fields: Vec<String>,
    /// Minimum average similarity (inclusive) for a fuzzy pair.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub orphan_label: OrphanLabel,
    #[serde(default)]
    pub null_keys: NullKeys,
    #[serde(default)]
    pub key_order: KeyOrder,
}

/// How the key pass labels a row that found no partner but has a non-null key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanLabel {
    /// One-sided rows are `Unknown`; only joined rows are `KeyMatch`.
    #[default]
    Unmatched,
    /// Any row with a non-null key is `KeyMatch`, joined or not.
    KeyPresence,
}

/// Whether a null key on the left joins a null key on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullKeys {
    /// Null joins null, as a dataframe outer merge does. Such rows stay `Unknown`.
    #[default]
    Match,
    /// Null never joins anything (SQL semantics); each null-key row comes through one-sided.
    Never,
}

/// Row order of the key pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    /// Left rows in order, each followed by its partners; then right-only rows.
    #[default]
    Input,
    /// Stable sort by key: numbers ascending, then text, then null.
    Sorted,
}

/// Everything the key pass needs besides the key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOptions {
    pub orphan_label: OrphanLabel,
    pub null_keys: NullKeys,
    pub order: KeyOrder,
}

impl From<OrphanLabel> for KeyOptions {
    fn from(orphan_label: OrphanLabel) -> Self {
        Self {
            orphan_label,
            ..Self::default()
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            key: None,
            fuzzy_fields: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            orphan_label: OrphanLabel::default(),
            null_keys: NullKeys::default(),
            key_order: KeyOrder::default(),
        }
    }
}

impl ReconConfig {
    pub fn new<S: Into<String>>(
        key: Option<&str>,
        fuzzy_fields: impl IntoIterator<Item = S>,
        threshold: f64,
    ) -> Result<Self, ReconError> {
        let config = Self {
            key: key.map(str::to_string),
            fuzzy_fields: fuzzy_fields.into_iter().map(Into::into).collect(),
            threshold,
            orphan_label: OrphanLabel::default(),
            null_keys: NullKeys::default(),
            key_order: KeyOrder::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_orphan_label(mut self, orphan_label: OrphanLabel) -> Self {
        self.orphan_label = orphan_label;
        self
    }

    pub fn with_null_keys(mut self, null_keys: NullKeys) -> Self {
        self.null_keys = null_keys;
        self
    }

    pub fn with_key_order(mut self, key_order: KeyOrder) -> Self {
        self.key_order = key_order;
        self
    }

    pub fn key_options(&self) -> KeyOptions {
        KeyOptions {
            orphan_label: self.orphan_label,
            null_keys: self.null_keys,
            order: self.key_order,
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        validate_threshold(self.threshold)?;

        if let Some(key) = &self.key {
            if key.is_empty() {
                return Err(ReconError::ConfigValidation("key must not be empty".into()));
            }
        }

        for (i, field) in self.fuzzy_fields.iter().enumerate() {
            if field.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "fuzzy field names must not be empty".into(),
                ));
            }
            if self.fuzzy_fields[..i].contains(field) {
                return Err(ReconError::ConfigValidation(format!(
                    "fuzzy field '{field}' listed more than once"
                )));
            }
        }

        Ok(())
    }
}

pub fn validate_threshold(threshold: f64) -> Result<(), ReconError> {
    if threshold.is_nan() || !(0.0..=100.0).contains(&threshold) {
        return Err(ReconError::InvalidThreshold(threshold));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Run config (file-facing)
// ---------------------------------------------------------------------------

/// A `.patchwork.toml` run description: two CSV sources, matching rules, outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchworkConfig {
    pub name: String,
    pub left: SourceConfig,
    pub right: SourceConfig,
    #[serde(default)]
    pub matching: ReconConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub file: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl SourceConfig {
    /// The delimiter as the single byte the CSV reader wants.
    pub fn delimiter_byte(&self) -> Result<u8, ReconError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ReconError::ConfigValidation(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PatchworkConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PatchworkConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        for (side, source) in [("left", &self.left), ("right", &self.right)] {
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{side}.file must not be empty"
                )));
            }
            source.delimiter_byte()?;
        }

        self.matching.validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Customer merge"

[left]
file = "crm.csv"

[right]
file = "billing.csv"
delimiter = ";"

[matching]
key = "id"
fuzzy_fields = ["name", "city"]
threshold = 80
"#;

    #[test]
    fn parse_valid() {
        let config = PatchworkConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Customer merge");
        assert_eq!(config.left.file, "crm.csv");
        assert_eq!(config.left.delimiter, ',');
        assert_eq!(config.right.delimiter_byte().unwrap(), b';');
        assert_eq!(config.matching.key.as_deref(), Some("id"));
        assert_eq!(config.matching.fuzzy_fields, vec!["name", "city"]);
        assert_eq!(config.matching.threshold, 80.0);
        assert_eq!(config.matching.orphan_label, OrphanLabel::Unmatched);
        assert!(config.output.csv.is_none());
    }

    #[test]
    fn matching_defaults() {
        let input = r#"
name = "Defaults"
[left]
file = "a.csv"
[right]
file = "b.csv"
"#;
        let config = PatchworkConfig::from_toml(input).unwrap();
        assert_eq!(config.matching, ReconConfig::default());
        assert_eq!(config.matching.threshold, 85.0);
        assert!(config.matching.key.is_none());
        assert!(config.matching.fuzzy_fields.is_empty());
    }

    #[test]
    fn parse_orphan_label_and_output() {
        let input = format!(
            r#"{VALID}orphan_label = "key_presence"

[output]
csv = "quilt.csv"
json = "quilt.json"
"#
        );
        let config = PatchworkConfig::from_toml(&input).unwrap();
        assert_eq!(config.matching.orphan_label, OrphanLabel::KeyPresence);
        assert_eq!(config.output.csv.as_deref(), Some("quilt.csv"));
        assert_eq!(config.output.json.as_deref(), Some("quilt.json"));
    }

    #[test]
    fn parse_key_pass_options() {
        let input = format!("{VALID}null_keys = \"never\"\nkey_order = \"sorted\"\n");
        let config = PatchworkConfig::from_toml(&input).unwrap();
        assert_eq!(config.matching.null_keys, NullKeys::Never);
        assert_eq!(config.matching.key_order, KeyOrder::Sorted);
        assert_eq!(
            config.matching.key_options(),
            KeyOptions {
                orphan_label: OrphanLabel::Unmatched,
                null_keys: NullKeys::Never,
                order: KeyOrder::Sorted,
            }
        );
    }

    #[test]
    fn key_pass_defaults_follow_outer_merge() {
        let options = ReconConfig::default().key_options();
        assert_eq!(options.null_keys, NullKeys::Match);
        assert_eq!(options.order, KeyOrder::Input);
        assert_eq!(KeyOptions::from(OrphanLabel::KeyPresence).orphan_label, OrphanLabel::KeyPresence);
    }

    #[test]
    fn reject_threshold_out_of_range() {
        let input = VALID.replace("threshold = 80", "threshold = 101");
        let err = PatchworkConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::InvalidThreshold(t) if t == 101.0));
    }

    #[test]
    fn reject_non_numeric_threshold() {
        let input = VALID.replace("threshold = 80", "threshold = \"high\"");
        let err = PatchworkConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_field() {
        let input = VALID.replace("threshold = 80", "treshold = 80");
        assert!(PatchworkConfig::from_toml(&input).is_err());
    }

    #[test]
    fn reject_duplicate_fuzzy_field() {
        let input = VALID.replace(r#"["name", "city"]"#, r#"["name", "name"]"#);
        let err = PatchworkConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("'name' listed more than once"));
    }

    #[test]
    fn reject_empty_name() {
        let input = VALID.replace("Customer merge", " ");
        let err = PatchworkConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn reject_non_ascii_delimiter() {
        let input = VALID.replace(r#"delimiter = ";""#, r#"delimiter = "§""#);
        let err = PatchworkConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("single ASCII character"));
    }

    #[test]
    fn new_validates_eagerly() {
        assert!(ReconConfig::new(Some("id"), ["name"], 85.0).is_ok());
        assert!(ReconConfig::new(None, Vec::<String>::new(), 0.0).is_ok());
        assert!(ReconConfig::new(None, Vec::<String>::new(), 100.0).is_ok());
        assert!(matches!(
            ReconConfig::new(None, Vec::<String>::new(), -0.5),
            Err(ReconError::InvalidThreshold(_))
        ));
        assert!(matches!(
            ReconConfig::new(None, Vec::<String>::new(), f64::NAN),
            Err(ReconError::InvalidThreshold(_))
        ));
        assert!(ReconConfig::new(Some(""), ["name"], 85.0).is_err());
    }
}
