use crate::config::{PatchworkConfig, ReconConfig};
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::{self, require_columns};
use crate::model::{Dataset, ReconInput, ReconMeta, ReconResult, Row, Side, Value, PATCH_ID};
use crate::similarity::{IndelRatio, Similarity};

/// Reconciles one left/right pair under one validated config.
///
/// Holds private copies of both datasets; the caller's originals are never touched.
#[derive(Debug, Clone)]
pub struct Reconciler<S = IndelRatio> {
    left: Dataset,
    right: Dataset,
    config: ReconConfig,
    scorer: S,
}

impl Reconciler {
    pub fn new(left: &Dataset, right: &Dataset, config: ReconConfig) -> Result<Self, ReconError> {
        Self::with_scorer(left, right, config, IndelRatio)
    }
}

impl<S: Similarity> Reconciler<S> {
    /// Validate `config` against both datasets and copy them in.
    pub fn with_scorer(
        left: &Dataset,
        right: &Dataset,
        config: ReconConfig,
        scorer: S,
    ) -> Result<Self, ReconError> {
        config.validate()?;

        if let Some(key) = config.key.as_deref() {
            require_columns(left, Side::Left, [key])?;
            require_columns(right, Side::Right, [key])?;
            matcher::reject_reserved(left, Side::Left)?;
            matcher::reject_reserved(right, Side::Right)?;
        }
        let fields = config.fuzzy_fields.iter().map(String::as_str);
        require_columns(left, Side::Left, fields.clone())?;
        require_columns(right, Side::Right, fields)?;

        Ok(Self {
            left: left.clone(),
            right: right.clone(),
            config,
            scorer,
        })
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    pub fn left(&self) -> &Dataset {
        &self.left
    }

    pub fn right(&self) -> &Dataset {
        &self.right
    }

    pub fn match_by_key(&self) -> Result<Dataset, ReconError> {
        matcher::match_by_key(
            &self.left,
            &self.right,
            self.config.key.as_deref(),
            self.config.key_options(),
        )
    }

    pub fn match_by_fuzzy(&self) -> Result<Dataset, ReconError> {
        matcher::match_by_fuzzy(
            &self.left,
            &self.right,
            &self.config.fuzzy_fields,
            self.config.threshold,
            &self.scorer,
        )
    }

    /// Key pass, then fuzzy pass, stitched into one quilt.
    pub fn reconcile(&self) -> Result<Dataset, ReconError> {
        let key_pass = self.match_by_key()?;
        let fuzzy_pass = self.match_by_fuzzy()?;
        log::info!(
            "stitching quilt: {} key-pass rows, {} fuzzy-pass rows",
            key_pass.len(),
            fuzzy_pass.len()
        );
        Ok(assemble(key_pass, fuzzy_pass))
    }

    /// Same as [`reconcile`](Self::reconcile).
    pub fn patchwork(&self) -> Result<Dataset, ReconError> {
        self.reconcile()
    }
}

/// One-shot reconcile with the default scorer.
pub fn reconcile(left: &Dataset, right: &Dataset, config: ReconConfig) -> Result<Dataset, ReconError> {
    Reconciler::new(left, right, config)?.reconcile()
}

/// Concatenate key-pass rows then fuzzy-pass rows and number them.
///
/// Columns are the union of both passes plus `patch_id`; a row lacking a
/// column holds null there. `patch_id` runs 1..=n in row order.
pub fn assemble(key_pass: Dataset, fuzzy_pass: Dataset) -> Dataset {
    let mut quilt = Dataset::new(key_pass.columns.iter().cloned());
    for column in &fuzzy_pass.columns {
        quilt.ensure_column(column);
    }
    quilt.ensure_column(PATCH_ID);

    let rows = key_pass.rows.into_iter().chain(fuzzy_pass.rows);
    for (i, mut row) in rows.enumerate() {
        for column in &quilt.columns {
            if !row.contains_key(column) {
                row.insert(column.clone(), Value::Null);
            }
        }
        row.insert(PATCH_ID.to_string(), Value::Int(i as i64 + 1));
        quilt.rows.push(row);
    }

    quilt
}

/// Run reconciliation per config. Returns the quilt + summary.
pub fn run(config: &PatchworkConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let reconciler = Reconciler::new(&input.left, &input.right, config.matching.clone())?;
    let quilt = reconciler.reconcile()?;
    let summary = compute_summary(input.left.len(), input.right.len(), &quilt);

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        quilt,
    })
}

/// The quilt row carrying `patch_id`, if any.
pub fn patch(quilt: &Dataset, patch_id: i64) -> Option<&Row> {
    let index = usize::try_from(patch_id.checked_sub(1)?).ok()?;
    quilt
        .rows
        .get(index)
        .filter(|row| row.get(PATCH_ID) == Some(&Value::Int(patch_id)))
}
