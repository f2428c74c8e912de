//! `patchwork run | validate | stitch`: file loading, output, and the human summary.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use patchwork_recon::config::{OutputConfig, SourceConfig};
use patchwork_recon::csv_io::{load_csv_file, write_csv_dataset, write_csv_file};
use patchwork_recon::{
    Dataset, KeyOrder, NullKeys, OrphanLabel, PatchworkConfig, ReconConfig, ReconError, ReconInput, ReconResult,
};

use crate::exit_codes::{recon_exit_code, EXIT_INVALID_CONFIG, EXIT_RUNTIME};
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrphanLabelArg {
    /// One-sided rows are Unknown
    Unmatched,
    /// Any row with a non-null key is KeyMatch
    KeyPresence,
}

impl From<OrphanLabelArg> for OrphanLabel {
    fn from(arg: OrphanLabelArg) -> Self {
        match arg {
            OrphanLabelArg::Unmatched => OrphanLabel::Unmatched,
            OrphanLabelArg::KeyPresence => OrphanLabel::KeyPresence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NullKeysArg {
    /// Null keys join each other
    Match,
    /// Null keys never join
    Never,
}

impl From<NullKeysArg> for NullKeys {
    fn from(arg: NullKeysArg) -> Self {
        match arg {
            NullKeysArg::Match => NullKeys::Match,
            NullKeysArg::Never => NullKeys::Never,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyOrderArg {
    /// Left rows in input order, then right-only rows
    Input,
    /// Sorted by key
    Sorted,
}

impl From<KeyOrderArg> for KeyOrder {
    fn from(arg: KeyOrderArg) -> Self {
        match arg {
            KeyOrderArg::Input => KeyOrder::Input,
            KeyOrderArg::Sorted => KeyOrder::Sorted,
        }
    }
}

pub struct StitchArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    pub key: Option<String>,
    pub fuzzy: Vec<String>,
    pub threshold: f64,
    pub orphan_label: OrphanLabelArg,
    pub null_keys: NullKeysArg,
    pub key_order: KeyOrderArg,
    pub delimiter: char,
    pub csv: Option<PathBuf>,
    pub json: bool,
}

fn recon_err(err: ReconError) -> CliError {
    let code = recon_exit_code(&err);
    let cli_err = CliError::new(code, err.to_string());
    match err {
        ReconError::MissingColumn { .. } => {
            cli_err.with_hint("check the key and fuzzy_fields names against the CSV headers")
        }
        ReconError::ColumnCollision(_) => {
            cli_err.with_hint("rename the input column so the _left/_right suffixes stay unique")
        }
        ReconError::ReservedColumn { .. } => {
            cli_err.with_hint("rename the column; marriage_type, fuzzy_score and patch_id are written by patchwork")
        }
        _ => cli_err,
    }
}

fn load_config(config_path: &Path) -> Result<PatchworkConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_RUNTIME, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    PatchworkConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn load_source(base: &Path, source: &SourceConfig) -> Result<Dataset, CliError> {
    let path = base.join(&source.file);
    let delimiter = source.delimiter_byte().map_err(recon_err)?;
    tracing::debug!("loading {}", path.display());
    load_csv_file(&path, delimiter).map_err(recon_err)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "config '{}' is valid: key={}, fuzzy_fields=[{}], threshold={}",
        config.name,
        config.matching.key.as_deref().unwrap_or("(none)"),
        config.matching.fuzzy_fields.join(", "),
        config.matching.threshold,
    );
    Ok(())
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    csv_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = base_dir(&config_path);

    let input = ReconInput {
        left: load_source(base, &config.left)?,
        right: load_source(base, &config.right)?,
    };

    let result = patchwork_recon::run(&config, &input).map_err(recon_err)?;

    // Flags win over [output]; config paths resolve against the config's directory.
    let json_path = output_file.or_else(|| config.output.json.as_ref().map(|p| base.join(p)));
    let csv_path = csv_file.or_else(|| config.output.csv.as_ref().map(|p| base.join(p)));

    emit(&result, json_output, json_path.as_deref(), csv_path.as_deref())
}

pub fn cmd_stitch(args: StitchArgs) -> Result<(), CliError> {
    let matching = ReconConfig::new(args.key.as_deref(), args.fuzzy, args.threshold)
        .map_err(recon_err)?
        .with_orphan_label(args.orphan_label.into())
        .with_null_keys(args.null_keys.into())
        .with_key_order(args.key_order.into());

    let source = |path: &Path| SourceConfig {
        file: path.to_string_lossy().into_owned(),
        delimiter: args.delimiter,
    };
    let config = PatchworkConfig {
        name: "stitch".to_string(),
        left: source(&args.left),
        right: source(&args.right),
        matching,
        output: OutputConfig::default(),
    };
    config.validate().map_err(recon_err)?;

    let cwd = Path::new(".");
    let input = ReconInput {
        left: load_source(cwd, &config.left)?,
        right: load_source(cwd, &config.right)?,
    };

    let result = patchwork_recon::run(&config, &input).map_err(recon_err)?;
    emit(&result, args.json, None, args.csv.as_deref())
}

/// Write files, then stdout: JSON with `--json`, else the quilt CSV when no CSV file was asked for.
fn emit(
    result: &ReconResult,
    json_output: bool,
    json_path: Option<&Path>,
    csv_path: Option<&Path>,
) -> Result<(), CliError> {
    let json_str = if json_output || json_path.is_some() {
        Some(result.to_json_pretty().map_err(|e| {
            CliError::new(EXIT_RUNTIME, format!("JSON serialization error: {e}"))
        })?)
    } else {
        None
    };

    if let (Some(path), Some(json)) = (json_path, &json_str) {
        std::fs::write(path, json).map_err(|e| {
            CliError::new(EXIT_RUNTIME, format!("cannot write {}: {e}", path.display()))
        })?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(path) = csv_path {
        write_csv_file(path, &result.quilt).map_err(recon_err)?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        if let Some(json) = &json_str {
            println!("{json}");
        }
    } else if csv_path.is_none() {
        let csv = write_csv_dataset(&result.quilt).map_err(recon_err)?;
        print!("{csv}");
    }

    print_summary(result);
    Ok(())
}

fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{}: {} patches from {} left + {} right rows: {} key matches, {} fuzzy matches, {} unknown",
        result.meta.config_name,
        s.total_rows,
        s.left_rows,
        s.right_rows,
        s.key_matches,
        s.fuzzy_matches,
        s.unknown,
    );
    if let Some(mean) = s.mean_fuzzy_score {
        eprintln!("mean fuzzy score: {mean:.1}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orphan_label_arg_converts() {
        assert_eq!(OrphanLabel::from(OrphanLabelArg::Unmatched), OrphanLabel::Unmatched);
        assert_eq!(OrphanLabel::from(OrphanLabelArg::KeyPresence), OrphanLabel::KeyPresence);
        assert_eq!(NullKeys::from(NullKeysArg::Never), NullKeys::Never);
        assert_eq!(KeyOrder::from(KeyOrderArg::Sorted), KeyOrder::Sorted);
    }

    #[test]
    fn missing_column_gets_hint() {
        let err = recon_err(ReconError::MissingColumn {
            side: patchwork_recon::Side::Left,
            column: "email".into(),
        });
        assert_eq!(err.code, EXIT_INVALID_CONFIG);
        assert!(err.message.contains("email"));
        assert!(err.hint.is_some());
    }

    #[test]
    fn config_dir_is_base() {
        assert_eq!(base_dir(Path::new("cfg/run.patchwork.toml")), Path::new("cfg"));
    }
}
