use std::collections::{HashMap, HashSet};

use crate::config::{KeyOptions, KeyOrder, NullKeys, OrphanLabel};
use crate::error::ReconError;
use crate::model::{
    cell, namespace, Dataset, JoinKey, MarriageType, Row, Side, Value, FUZZY_SCORE, MARRIAGE_TYPE,
    RESERVED_COLUMNS,
};
use crate::similarity::Similarity;

// ---------------------------------------------------------------------------
// Key pass
// ---------------------------------------------------------------------------

/// Full outer join of `left` and `right` on `key`.
///
/// No key means no key pass: the result is an empty dataset with no columns.
/// Duplicate keys fan out. Null keys join each other unless
/// [`NullKeys::Never`] says otherwise; a null-key row is always `Unknown`.
pub fn match_by_key(
    left: &Dataset,
    right: &Dataset,
    key: Option<&str>,
    options: KeyOptions,
) -> Result<Dataset, ReconError> {
    let Some(key) = key else {
        return Ok(Dataset::default());
    };

    require_columns(left, Side::Left, [key])?;
    require_columns(right, Side::Right, [key])?;
    reject_reserved(left, Side::Left)?;
    reject_reserved(right, Side::Right)?;

    let layout = JoinLayout::new(left, right, key)?;
    let lookup = |row: &Row| lookup_key(cell(row, key), options.null_keys);

    let mut right_index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
    for (ri, row) in right.rows.iter().enumerate() {
        if let Some(k) = lookup(row) {
            right_index.entry(k).or_default().push(ri);
        }
    }

    // (sort key, row) so the sorted order can be applied after the join.
    let mut joined: Vec<(JoinKey, Row)> = Vec::with_capacity(left.len().max(right.len()));
    let mut right_joined = vec![false; right.rows.len()];

    for left_row in &left.rows {
        let sort_key = cell(left_row, key).join_key().unwrap_or(JoinKey::Null);
        let partners = lookup(left_row)
            .and_then(|k| right_index.get(&k))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if partners.is_empty() {
            joined.push((sort_key, layout.combine(Some(left_row), None, options.orphan_label)));
            continue;
        }
        for &ri in partners {
            right_joined[ri] = true;
            let row = layout.combine(Some(left_row), Some(&right.rows[ri]), options.orphan_label);
            joined.push((sort_key.clone(), row));
        }
    }

    for (ri, right_row) in right.rows.iter().enumerate() {
        if !right_joined[ri] {
            let sort_key = cell(right_row, key).join_key().unwrap_or(JoinKey::Null);
            joined.push((sort_key, layout.combine(None, Some(right_row), options.orphan_label)));
        }
    }

    if options.order == KeyOrder::Sorted {
        joined.sort_by(|(a, _), (b, _)| a.sort_cmp(b));
    }

    let mut out = Dataset::new(layout.columns.clone());
    out.rows = joined.into_iter().map(|(_, row)| row).collect();

    log::debug!(
        "key pass on '{key}': {} left x {} right -> {} rows",
        left.len(),
        right.len(),
        out.len()
    );

    Ok(out)
}

/// Key used to find partners. `None` means the row cannot join.
fn lookup_key(value: &Value, null_keys: NullKeys) -> Option<JoinKey> {
    match (value.join_key(), null_keys) {
        (Some(k), _) => Some(k),
        (None, NullKeys::Match) => Some(JoinKey::Null),
        (None, NullKeys::Never) => None,
    }
}

/// Column naming for the key pass: the key once, clashing columns suffixed.
struct JoinLayout<'a> {
    key: &'a str,
    /// (input column, output column) per side, key excluded.
    left_map: Vec<(&'a str, String)>,
    right_map: Vec<(&'a str, String)>,
    columns: Vec<String>,
}

impl<'a> JoinLayout<'a> {
    fn new(left: &'a Dataset, right: &'a Dataset, key: &'a str) -> Result<Self, ReconError> {
        let left_cols: HashSet<&str> = left.columns.iter().map(String::as_str).collect();
        let right_cols: HashSet<&str> = right.columns.iter().map(String::as_str).collect();

        let name_for = |col: &str, side: Side| {
            if left_cols.contains(col) && right_cols.contains(col) {
                namespace(col, side)
            } else {
                col.to_string()
            }
        };

        let mut columns = Vec::new();
        let mut left_map = Vec::new();
        for col in &left.columns {
            if col == key {
                columns.push(key.to_string());
            } else {
                let out = name_for(col, Side::Left);
                columns.push(out.clone());
                left_map.push((col.as_str(), out));
            }
        }

        let mut right_map = Vec::new();
        for col in right.columns.iter().filter(|c| *c != key) {
            let out = name_for(col, Side::Right);
            columns.push(out.clone());
            right_map.push((col.as_str(), out));
        }

        columns.push(MARRIAGE_TYPE.to_string());

        // `name` suffixed to `name_right` can land on an input's own `name_right`.
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ReconError::ColumnCollision(dup.clone()));
        }

        Ok(Self {
            key,
            left_map,
            right_map,
            columns,
        })
    }

    fn combine(&self, left: Option<&Row>, right: Option<&Row>, orphan_label: OrphanLabel) -> Row {
        let mut row = Row::new();

        let key_value = left
            .or(right)
            .map(|r| cell(r, self.key).clone())
            .unwrap_or_default();

        for (src, dst) in &self.left_map {
            row.insert(dst.clone(), left.map(|r| cell(r, src).clone()).unwrap_or_default());
        }
        for (src, dst) in &self.right_map {
            row.insert(dst.clone(), right.map(|r| cell(r, src).clone()).unwrap_or_default());
        }

        let marriage = if key_value.is_null() {
            MarriageType::Unknown
        } else {
            match (orphan_label, left.is_some() && right.is_some()) {
                (_, true) | (OrphanLabel::KeyPresence, false) => MarriageType::KeyMatch,
                (OrphanLabel::Unmatched, false) => MarriageType::Unknown,
            }
        };

        row.insert(self.key.to_string(), key_value);
        row.insert(MARRIAGE_TYPE.to_string(), marriage.into());
        row
    }
}

// ---------------------------------------------------------------------------
// Fuzzy pass
// ---------------------------------------------------------------------------

/// Best right-hand partner found for one left row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub right_index: usize,
    pub score: f64,
}

/// Finds the best right row for a left row.
///
/// The exhaustive scan is the reference; a blocking or indexed search must
/// return the same candidate for the same inputs. `right_index` must index
/// into `right.rows`; the fuzzy pass fails with
/// [`ReconError::InvalidCandidate`] otherwise.
pub trait CandidateSearch {
    fn best_candidate(&self, left_row: &Row, right: &Dataset, fields: &[String])
        -> Option<Candidate>;
}

/// Scores every right row; first row with the highest average wins.
pub struct ExhaustiveScan<'s, S: ?Sized> {
    scorer: &'s S,
}

impl<'s, S: Similarity + ?Sized> ExhaustiveScan<'s, S> {
    pub fn new(scorer: &'s S) -> Self {
        Self { scorer }
    }
}

impl<S: Similarity + ?Sized> CandidateSearch for ExhaustiveScan<'_, S> {
    fn best_candidate(
        &self,
        left_row: &Row,
        right: &Dataset,
        fields: &[String],
    ) -> Option<Candidate> {
        right
            .rows
            .iter()
            .enumerate()
            .fold(None, |best: Option<Candidate>, (right_index, right_row)| {
                let score = pair_score(self.scorer, left_row, right_row, fields);
                match best {
                    Some(b) if score <= b.score => Some(b),
                    _ => Some(Candidate { right_index, score }),
                }
            })
    }
}

/// Mean per-field similarity of two rows; 0 when there are no fields.
pub fn pair_score<S: Similarity + ?Sized>(
    scorer: &S,
    left_row: &Row,
    right_row: &Row,
    fields: &[String],
) -> f64 {
    if fields.is_empty() {
        return 0.0;
    }
    let total: f64 = fields
        .iter()
        .map(|f| {
            scorer.score(
                &cell(left_row, f).to_match_text(),
                &cell(right_row, f).to_match_text(),
            )
        })
        .sum();
    total / fields.len() as f64
}

/// Acceptance policy: inclusive threshold.
pub fn accept(candidate: Option<Candidate>, threshold: f64) -> Option<Candidate> {
    candidate.filter(|c| c.score >= threshold)
}

/// Fuzzy pass with the exhaustive scan.
pub fn match_by_fuzzy<S: Similarity + ?Sized>(
    left: &Dataset,
    right: &Dataset,
    fuzzy_fields: &[String],
    threshold: f64,
    scorer: &S,
) -> Result<Dataset, ReconError> {
    match_by_fuzzy_with(left, right, fuzzy_fields, threshold, &ExhaustiveScan::new(scorer))
}

/// Fuzzy pass over any candidate search.
///
/// Each left row keeps its best right row if the average score reaches
/// `threshold`; otherwise it contributes nothing.
pub fn match_by_fuzzy_with<C: CandidateSearch + ?Sized>(
    left: &Dataset,
    right: &Dataset,
    fuzzy_fields: &[String],
    threshold: f64,
    search: &C,
) -> Result<Dataset, ReconError> {
    crate::config::validate_threshold(threshold)?;
    require_columns(left, Side::Left, fuzzy_fields.iter().map(String::as_str))?;
    require_columns(right, Side::Right, fuzzy_fields.iter().map(String::as_str))?;

    let mut columns: Vec<String> = left
        .columns
        .iter()
        .map(|c| namespace(c, Side::Left))
        .chain(right.columns.iter().map(|c| namespace(c, Side::Right)))
        .collect();
    columns.push(FUZZY_SCORE.to_string());
    columns.push(MARRIAGE_TYPE.to_string());

    let mut out = Dataset::new(columns);

    for left_row in &left.rows {
        let best = search.best_candidate(left_row, right, fuzzy_fields);
        let Some(candidate) = accept(best, threshold) else {
            continue;
        };
        let right_row = right
            .rows
            .get(candidate.right_index)
            .ok_or(ReconError::InvalidCandidate {
                index: candidate.right_index,
                rows: right.len(),
            })?;

        let mut row = Row::new();
        for col in &left.columns {
            row.insert(namespace(col, Side::Left), cell(left_row, col).clone());
        }
        for col in &right.columns {
            row.insert(namespace(col, Side::Right), cell(right_row, col).clone());
        }
        row.insert(FUZZY_SCORE.to_string(), Value::Float(candidate.score));
        row.insert(MARRIAGE_TYPE.to_string(), MarriageType::FuzzyMatch.into());
        out.rows.push(row);
    }

    log::debug!(
        "fuzzy pass on {:?} (threshold {threshold}): {} of {} left rows accepted",
        fuzzy_fields,
        out.len(),
        left.len()
    );

    Ok(out)
}

// ---------------------------------------------------------------------------
// Column checks
// ---------------------------------------------------------------------------

pub(crate) fn require_columns<'c>(
    dataset: &Dataset,
    side: Side,
    columns: impl IntoIterator<Item = &'c str>,
) -> Result<(), ReconError> {
    for column in columns {
        if !dataset.has_column(column) {
            return Err(ReconError::MissingColumn {
                side,
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn reject_reserved(dataset: &Dataset, side: Side) -> Result<(), ReconError> {
    match dataset
        .columns
        .iter()
        .find(|c| RESERVED_COLUMNS.contains(&c.as_str()))
    {
        Some(column) => Err(ReconError::ReservedColumn {
            side,
            column: column.clone(),
        }),
        None => Ok(()),
    }
}
