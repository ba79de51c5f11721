use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use mask2roi::{ConfigFile, Mask2RoiError, OptionName, OptionValue, RoiSet};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Mask2Roi(#[from] Mask2RoiError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Boundary masks were not computed")]
    MissingBoundaries,
}

/// Output encoding for the extracted ROIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Polygons, warnings and the resolved configuration
    #[default]
    Json,
    /// A FeatureCollection with one polygon feature per ROI
    Geojson,
}

/// Parse a `NAME=VALUE` option as given on the command line
pub fn parse_option(s: &str) -> Result<(String, OptionValue), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing option name in '{s}'"));
    }
    let value = value
        .parse::<OptionValue>()
        .unwrap_or_else(|never| match never {});
    Ok((name.to_string(), value))
}

/// Options from the config file first, command-line options after (and so winning)
pub fn collect_overrides(
    config: Option<&Path>,
    options: &[(String, OptionValue)],
) -> Result<Vec<(String, OptionValue)>, CliError> {
    let mut overrides = match config {
        Some(path) => ConfigFile::from_file(path)?.overrides(),
        None => Vec::new(),
    };
    overrides.extend(options.iter().cloned());
    Ok(overrides)
}

/// Render the ROI set in the requested format
pub fn render(rois: &RoiSet, format: OutputFormat) -> Result<String, CliError> {
    let text = match format {
        OutputFormat::Json => rois.to_json_string()?,
        OutputFormat::Geojson => rois.to_geojson_string()?,
    };
    Ok(text)
}

/// Write every boundary mask as `roi_<n>.png` into `dir`
pub fn write_boundary_masks(rois: &RoiSet, dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let masks = rois.boundary_masks.as_ref().ok_or(CliError::MissingBoundaries)?;
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(masks.len());
    for (i, mask) in masks.iter().enumerate() {
        let path = dir.join(format!("roi_{:03}.png", i + 1));
        mask.as_image().save(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// One line per recognised option, for `mask2roi options`
#[derive(Debug, Clone, Serialize)]
pub struct OptionHelp {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn option_help() -> Vec<OptionHelp> {
    OptionName::all()
        .map(|option| OptionHelp {
            name: option.into(),
            description: option.description(),
        })
        .collect()
}
