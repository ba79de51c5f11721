use std::{convert::Infallible, fmt, num::NonZeroUsize, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames};
use tracing::warn;

use crate::error::{Mask2RoiError, Result, Warning};

/// Pixel adjacency rule used for labelling, filtering and boundary extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Connectivity {
    /// Edge-adjacent neighbours only.
    Four,
    /// Edge- and corner-adjacent neighbours.
    #[default]
    Eight,
}

impl Connectivity {
    /// Neighbour offsets `(dx, dy)` for this connectivity.
    pub fn offsets(self) -> &'static [(i64, i64)] {
        const FOUR: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
        const EIGHT: [(i64, i64); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        match self {
            Self::Four => &FOUR,
            Self::Eight => &EIGHT,
        }
    }
}

impl From<Connectivity> for u8 {
    fn from(connectivity: Connectivity) -> Self {
        match connectivity {
            Connectivity::Four => 4,
            Connectivity::Eight => 8,
        }
    }
}

impl TryFrom<u8> for Connectivity {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            other => Err(format!("connectivity must be 4 or 8, got {other}")),
        }
    }
}

impl From<Connectivity> for imageproc::region_labelling::Connectivity {
    fn from(connectivity: Connectivity) -> Self {
        match connectivity {
            Connectivity::Four => Self::Four,
            Connectivity::Eight => Self::Eight,
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Resolved per-invocation settings for the region pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Configuration {
    /// Number of regions to emit, 0 means every region found.
    pub region_count: usize,
    /// Adjacency rule, 4 or 8.
    #[schemars(with = "u8")]
    pub connectivity: Connectivity,
    /// Fill interior holes before labelling.
    pub fill_holes: bool,
    /// Keep every n-th vertex of each traced outline.
    pub decimation_stride: NonZeroUsize,
    /// Round output coordinates to whole pixels.
    pub round_output: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            region_count: 0,
            connectivity: Connectivity::Eight,
            fill_holes: true,
            decimation_stride: NonZeroUsize::MIN.saturating_add(1),
            round_output: false,
        }
    }
}

/// The option names accepted by [`Configuration::resolve`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum OptionName {
    #[strum(serialize = "NumROIs")]
    NumRois,
    Connectivity,
    FillHoles,
    ScaleNumVertices,
    RoundOutput,
}

impl OptionName {
    /// All recognised option names, in declaration order.
    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Iterate over every option, in declaration order.
    pub fn all() -> impl Iterator<Item = OptionName> {
        <Self as IntoEnumIterator>::iter()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NumRois => "Number of regions to return (0 = all regions)",
            Self::Connectivity => "Pixel connectivity, 4 or 8 (other values fall back to 4)",
            Self::FillHoles => "Fill interior holes before labelling",
            Self::ScaleNumVertices => "Keep every n-th boundary vertex (n >= 1)",
            Self::RoundOutput => "Round output coordinates",
        }
    }
}

/// A loosely typed option value, as it arrives from a caller, a config file or the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
        }
    }

    /// Integer view of the value; integral floats count as integers.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Int(value) => Some(value),
            Self::Float(value)
                if value.is_finite()
                    && value.fract() == 0.0
                    && value >= i64::MIN as f64
                    && value <= i64::MAX as f64 =>
            {
                Some(value as i64)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{value}'"),
        }
    }
}

impl FromStr for OptionValue {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return Ok(Self::Bool(true));
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Ok(Self::Bool(false));
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Ok(Self::Int(value));
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return Ok(Self::Float(value));
        }
        Ok(Self::Text(trimmed.to_string()))
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Configuration {
    /// Get the JSON schema for the resolved configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Configuration)
    }

    /// Resolve name/value overrides against the defaults.
    ///
    /// Option names are matched case-insensitively and later entries win over
    /// earlier ones. An unknown name or a value of the wrong type is fatal; a
    /// connectivity other than 4 or 8 only produces a [`Warning`] and falls
    /// back to 4.
    pub fn resolve<K: AsRef<str>>(overrides: &[(K, OptionValue)]) -> Result<(Self, Vec<Warning>)> {
        let mut configuration = Self::default();
        let mut warnings = Vec::new();

        for (key, value) in overrides {
            let key = key.as_ref();
            let name = OptionName::from_str(key).map_err(|_| Mask2RoiError::UnknownOption {
                key: key.to_string(),
                value_type: value.type_name(),
            })?;

            match name {
                OptionName::NumRois => {
                    configuration.region_count = value
                        .as_integer()
                        .and_then(|count| usize::try_from(count).ok())
                        .ok_or_else(|| invalid(name, "a non-negative integer", value))?;
                }
                OptionName::Connectivity => {
                    let requested = value
                        .as_integer()
                        .ok_or_else(|| invalid(name, "an integer (4 or 8)", value))?;
                    configuration.connectivity = match requested {
                        4 => Connectivity::Four,
                        8 => Connectivity::Eight,
                        _ => {
                            let warning = Warning::ConnectivityFallback { requested };
                            warn!("{warning}");
                            warnings.push(warning);
                            Connectivity::Four
                        }
                    };
                }
                OptionName::FillHoles => {
                    configuration.fill_holes = value
                        .as_bool()
                        .ok_or_else(|| invalid(name, "a boolean", value))?;
                }
                OptionName::ScaleNumVertices => {
                    configuration.decimation_stride = value
                        .as_integer()
                        .and_then(|stride| usize::try_from(stride).ok())
                        .and_then(NonZeroUsize::new)
                        .ok_or_else(|| invalid(name, "a positive integer", value))?;
                }
                OptionName::RoundOutput => {
                    configuration.round_output = value
                        .as_bool()
                        .ok_or_else(|| invalid(name, "a boolean", value))?;
                }
            }
        }

        Ok((configuration, warnings))
    }
}

fn invalid(name: OptionName, expected: &'static str, value: &OptionValue) -> Mask2RoiError {
    Mask2RoiError::InvalidOptionValue {
        key: name.into(),
        expected,
        actual: format!("{value} ({})", value.type_name()),
    }
}
