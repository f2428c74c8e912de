use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Generated columns
// ---------------------------------------------------------------------------

pub const MARRIAGE_TYPE: &str = "marriage_type";
pub const FUZZY_SCORE: &str = "fuzzy_score";
pub const PATCH_ID: &str = "patch_id";

/// Columns the engine writes itself; inputs may not carry them.
pub const RESERVED_COLUMNS: [&str; 3] = [MARRIAGE_TYPE, FUZZY_SCORE, PATCH_ID];

/// Text a null value takes when it is compared by the fuzzy matcher.
pub const NULL_PLACEHOLDER: &str = "nan";

static NULL_VALUE: Value = Value::Null;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Rendering used for CSV cells. Null is the empty cell.
    pub fn to_cell(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Float(f) if f.is_nan() => Cow::Borrowed(""),
            _ => self.to_match_text(),
        }
    }

    /// Rendering compared by the fuzzy matcher. Null becomes [`NULL_PLACEHOLDER`].
    pub fn to_match_text(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(NULL_PLACEHOLDER),
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(format_float(*f)),
            Self::Text(s) => Cow::Borrowed(s),
        }
    }

    /// Normalized join key. `None` for null, so null keys never join.
    /// Integral floats join with the equal integer.
    pub fn join_key(&self) -> Option<JoinKey> {
        match self {
            Self::Null => None,
            Self::Int(i) => Some(JoinKey::Int(*i)),
            Self::Float(f) if f.is_nan() => None,
            Self::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Some(JoinKey::Int(*f as i64))
            }
            Self::Float(f) => Some(JoinKey::Float(f.to_bits())),
            Self::Text(s) => Some(JoinKey::Text(s.clone())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cell())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Integral floats keep a trailing `.0` so `1.0` and `1` stay distinguishable as text.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        NULL_PLACEHOLDER.to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Hashable form of a [`Value`] used by the key pass.
///
/// [`Value::join_key`] never yields `Null`; the key pass uses it when null keys join each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Int(i64),
    Float(u64),
    Text(String),
    Null,
}

impl JoinKey {
    fn rank(&self) -> u8 {
        match self {
            Self::Int(_) | Self::Float(_) => 0,
            Self::Text(_) => 1,
            Self::Null => 2,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Float(bits) => f64::from_bits(*bits),
            _ => f64::NAN,
        }
    }

    /// Sorted key order: numbers ascending, then text, then null last.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ if self.rank() == 0 && other.rank() == 0 => self.as_f64().total_cmp(&other.as_f64()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// A row maps column name to value. A missing entry reads as null.
pub type Row = BTreeMap<String, Value>;

/// Ordered columns plus ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// A dataset with the given columns and no rows.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build from positional records; each record lines up with `columns`.
    pub fn from_records<S, R, V>(columns: impl IntoIterator<Item = S>, records: R) -> Self
    where
        S: Into<String>,
        R: IntoIterator<Item = Vec<V>>,
        V: Into<Value>,
    {
        let mut dataset = Self::new(columns);
        for record in records {
            let row: Row = dataset
                .columns
                .iter()
                .cloned()
                .zip(record.into_iter().map(Into::into))
                .collect();
            dataset.rows.push(row);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Value at (`row`, `column`); null when the row has no such entry.
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.rows.get(row).map_or(&NULL_VALUE, |r| cell(r, column))
    }

    /// All values of one column, in row order.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |r| cell(r, name))
    }

    /// Append `name` unless it is already a column.
    pub(crate) fn ensure_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }
}

/// Read a cell, treating a missing entry as null.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&NULL_VALUE)
}

// ---------------------------------------------------------------------------
// Sides + namespacing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Output column name for `column` coming from `side`: `name` → `name_left`.
pub fn namespace(column: &str, side: Side) -> String {
    format!("{column}_{}", side.suffix())
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarriageType {
    KeyMatch,
    FuzzyMatch,
    Unknown,
}

impl MarriageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyMatch => "KeyMatch",
            Self::FuzzyMatch => "FuzzyMatch",
            Self::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "KeyMatch" => Some(Self::KeyMatch),
            "FuzzyMatch" => Some(Self::FuzzyMatch),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Marriage type recorded on a quilt row, if any.
    pub fn of_row(row: &Row) -> Option<Self> {
        cell(row, MARRIAGE_TYPE).as_str().and_then(Self::from_label)
    }
}

impl fmt::Display for MarriageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MarriageType> for Value {
    fn from(m: MarriageType) -> Self {
        Value::Text(m.as_str().to_string())
    }
}

// ---------------------------------------------------------------------------
// Run input + output
// ---------------------------------------------------------------------------

/// Pre-loaded left and right datasets.
pub struct ReconInput {
    pub left: Dataset,
    pub right: Dataset,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuiltSummary {
    pub left_rows: usize,
    pub right_rows: usize,
    pub total_rows: usize,
    pub key_matches: usize,
    pub fuzzy_matches: usize,
    pub unknown: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_fuzzy_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: QuiltSummary,
    pub quilt: Dataset,
}

impl ReconResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
