use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Mask2RoiError {
    #[error("Mask is empty: it must have at least one row and one column")]
    EmptyMask,

    #[error("Mask rows have inconsistent lengths: row {row} has {actual} columns, expected {expected}")]
    RaggedMask {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Mask is not binary: pixel ({x}, {y}) has value {value}")]
    NonBinaryMask { x: u32, y: u32, value: u8 },

    #[error("Unrecognized option '{key}' (with a value of type {value_type})")]
    UnknownOption { key: String, value_type: &'static str },

    #[error("Invalid value for option '{key}': expected {expected}, got {actual}")]
    InvalidOptionValue {
        key: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("Too many regions requested: {requested} exceeds the {limit} pixels of the mask")]
    TooManyRegions { requested: usize, limit: usize },

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, Mask2RoiError>;

/// Non-fatal diagnostics reported alongside a complete result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Warning {
    /// `Connectivity` was neither 4 nor 8; 4 was used instead.
    ConnectivityFallback { requested: i64 },
    /// More regions were found than requested; the extra ones were dropped.
    RegionsTruncated { found: usize, requested: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectivityFallback { requested } => write!(
                f,
                "connectivity must be 4 or 8, got {requested}; falling back to 4"
            ),
            Self::RegionsTruncated { found, requested } => write!(
                f,
                "more regions than requested ({found} found, {requested} requested); output truncated"
            ),
        }
    }
}
