//! harmonize CLI - global color harmonization of an image collection.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use common::log_setup::{setup_logging, LogTarget};
use harmonize::{
    parse_describers, ConfigError, GeometricModel, HarmonizeConfig, Harmonizer, SelectionMethod,
    ViewId, DEFAULT_DESCRIBER, MIN_PAIR_MATCHES,
};

#[derive(Debug, Parser)]
#[command(name = "harmonize")]
#[command(about = "Fit per-camera gain/offset corrections so overlapping images agree in color")]
#[command(version)]
struct Cli {
    /// Scene description file listing the views.
    #[arg(short = 'i', long)]
    input_file: PathBuf,

    /// Directory holding matches.<model>.json and the feature files.
    #[arg(short = 'm', long)]
    matches_dir: PathBuf,

    /// Comma-separated describer types to use.
    #[arg(short = 'd', long, default_value = DEFAULT_DESCRIBER)]
    describer_methods: String,

    /// Output directory.
    #[arg(short = 'o', long)]
    out_dir: PathBuf,

    /// full-frame, matched-points or segment (also 0, 1, 2).
    #[arg(short = 's', long)]
    selection_method: Option<String>,

    /// View fixed to the identity correction.
    #[arg(short = 'r', long)]
    reference_view: Option<ViewId>,

    /// Geometric model of the matches: f, e or h.
    #[arg(short = 'g', long, default_value = "f")]
    geometric_model: String,

    /// Minimum matches for a pair to count as overlapping.
    #[arg(long, default_value_t = MIN_PAIR_MATCHES)]
    min_pair_matches: usize,

    /// Disc radius in pixels for matched-points selection.
    #[arg(long, default_value_t = 10)]
    point_radius: u32,

    /// Half-width in pixels for segment selection.
    #[arg(long, default_value_t = 2)]
    segment_half_width: u32,

    /// Log filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write daily-rolling log files here.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn to_config(&self) -> Result<HarmonizeConfig, ConfigError> {
        let selection_method = SelectionMethod::resolve(self.selection_method.as_deref())?;
        let reference_view = self
            .reference_view
            .ok_or(ConfigError::MissingReferenceView)?;
        let geometric_model = GeometricModel::parse(&self.geometric_model)?;
        let describers = parse_describers(&self.describer_methods)?;

        let mut config = HarmonizeConfig::new(
            &self.input_file,
            &self.matches_dir,
            &self.out_dir,
            selection_method,
            reference_view,
        )
        .with_geometric_model(geometric_model)
        .with_describers(describers)
        .with_min_pair_matches(self.min_pair_matches);
        config.point_radius = self.point_radius;
        config.segment_half_width = self.segment_half_width;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let target = LogTarget {
        dir: cli.log_dir.as_deref(),
        ..Default::default()
    };
    if let Err(err) = setup_logging(&cli.log_level, target) {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.to_config().context("Invalid arguments")?;
    let harmonizer = Harmonizer::new(config)?;
    let report = harmonizer
        .run()
        .context("Color harmonization failed")?;

    tracing::info!(
        images = report.cameras.len(),
        dir = %report.images_dir.display(),
        "Done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["harmonize", "-i", "sfm.json", "-m", "matches", "-o", "out"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_full_arguments() {
        let cli = parse(&["-s", "segment", "-r", "4", "-g", "h", "-d", "SIFT,AKAZE"]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.selection_method, SelectionMethod::Segment);
        assert_eq!(config.reference_view, 4);
        assert_eq!(config.geometric_model, GeometricModel::Homography);
        assert_eq!(config.describers, vec!["SIFT", "AKAZE"]);
        assert_eq!(config.min_pair_matches, MIN_PAIR_MATCHES);
        assert_eq!(config.out_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_numeric_selection_method() {
        let config = parse(&["-s", "1", "-r", "0"]).to_config().unwrap();
        assert_eq!(config.selection_method, SelectionMethod::MatchedPoints);
        assert_eq!(config.describers, vec![DEFAULT_DESCRIBER]);
    }

    #[test]
    fn test_missing_selection_method() {
        let err = parse(&["-r", "0"]).to_config().unwrap_err();
        assert_eq!(err, ConfigError::MissingSelectionMethod);
    }

    #[test]
    fn test_unknown_selection_method() {
        let err = parse(&["-s", "7", "-r", "0"]).to_config().unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedSelectionMethod("7".to_string()));
    }

    #[test]
    fn test_missing_reference_view() {
        let err = parse(&["-s", "full-frame"]).to_config().unwrap_err();
        assert_eq!(err, ConfigError::MissingReferenceView);
    }

    #[test]
    fn test_zero_radius_rejected() {
        let err = parse(&["-s", "0", "-r", "0", "--point-radius", "0"])
            .to_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveSize { .. }));
    }

    #[test]
    fn test_required_paths() {
        assert!(Cli::try_parse_from(["harmonize", "-i", "sfm.json"]).is_err());
    }
}
