use crate::model::{cell, Dataset, MarriageType, QuiltSummary, FUZZY_SCORE};

/// Compute summary statistics from an assembled quilt.
pub fn compute_summary(left_rows: usize, right_rows: usize, quilt: &Dataset) -> QuiltSummary {
    let mut key_matches = 0;
    let mut fuzzy_matches = 0;
    let mut unknown = 0;
    let mut score_total = 0.0;

    for row in &quilt.rows {
        match MarriageType::of_row(row) {
            Some(MarriageType::KeyMatch) => key_matches += 1,
            Some(MarriageType::FuzzyMatch) => {
                fuzzy_matches += 1;
                score_total += cell(row, FUZZY_SCORE).as_f64().unwrap_or(0.0);
            }
            Some(MarriageType::Unknown) | None => unknown += 1,
        }
    }

    let mean_fuzzy_score = (fuzzy_matches > 0).then(|| score_total / fuzzy_matches as f64);

    QuiltSummary {
        left_rows,
        right_rows,
        total_rows: quilt.len(),
        key_matches,
        fuzzy_matches,
        unknown,
        mean_fuzzy_score,
    }
}
