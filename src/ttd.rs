//! Drift time-to-distance converters.
//!
//! Each wire plane names its converter in configuration (`ttd.converter`) and
//! supplies a flat parameter list (`ttd.param`). The name is resolved once,
//! when the configuration is loaded, against a fixed registry of factories;
//! there is no lookup during event processing.
//!
//! Times are in seconds, distances in metres.

use serde::{Deserialize, Serialize};

/// Converter selection as it appears in a plane's configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TtdConfig {
    pub converter: String,
    #[serde(default)]
    pub params: Vec<f64>,
}

/// Closed set of drift time-to-distance models.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TtdConverter {
    /// `d = v·t`
    Linear { drift_velocity: f64 },
    /// `d = dmax·tanh(v·t / dmax)`; linear near the wire, saturating at the cell edge.
    Tanh { drift_velocity: f64, max_distance: f64 },
}

/// Reasons a converter cannot be built from configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum TtdError {
    UnknownConverter { name: String },
    WrongParameterCount { name: &'static str, expected: usize, found: usize },
    InvalidParameter { name: &'static str, value: f64 },
}

impl std::fmt::Display for TtdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TtdError::UnknownConverter { name } => {
                let known: Vec<&str> = REGISTRY.iter().map(|(n, _)| *n).collect();
                write!(
                    f,
                    "drift time-to-distance converter \"{name}\" not available (known: {})",
                    known.join(", ")
                )
            }
            TtdError::WrongParameterCount {
                name,
                expected,
                found,
            } => write!(
                f,
                "converter \"{name}\" expects {expected} parameters, got {found}"
            ),
            TtdError::InvalidParameter { name, value } => {
                write!(f, "converter \"{name}\": invalid parameter value {value}")
            }
        }
    }
}

impl std::error::Error for TtdError {}

type Factory = fn(&[f64]) -> Result<TtdConverter, TtdError>;

const REGISTRY: &[(&str, Factory)] = &[("linear", make_linear), ("tanh", make_tanh)];

fn expect_params(name: &'static str, params: &[f64], expected: usize) -> Result<(), TtdError> {
    if params.len() != expected {
        return Err(TtdError::WrongParameterCount {
            name,
            expected,
            found: params.len(),
        });
    }
    if let Some(&bad) = params.iter().find(|v| !v.is_finite() || **v <= 0.0) {
        return Err(TtdError::InvalidParameter { name, value: bad });
    }
    Ok(())
}

fn make_linear(params: &[f64]) -> Result<TtdConverter, TtdError> {
    expect_params("linear", params, 1)?;
    Ok(TtdConverter::Linear {
        drift_velocity: params[0],
    })
}

fn make_tanh(params: &[f64]) -> Result<TtdConverter, TtdError> {
    expect_params("tanh", params, 2)?;
    Ok(TtdConverter::Tanh {
        drift_velocity: params[0],
        max_distance: params[1],
    })
}

impl TtdConverter {
    /// Resolves a converter by (case-insensitive) name. A `TTD` suffix, as in
    /// `LinearTTD`, is accepted.
    pub fn from_config(config: &TtdConfig) -> Result<Self, TtdError> {
        let lowered = config.converter.trim().to_ascii_lowercase();
        let key = lowered.strip_suffix("ttd").unwrap_or(&lowered);
        REGISTRY
            .iter()
            .find(|(name, _)| *name == key)
            .ok_or_else(|| TtdError::UnknownConverter {
                name: config.converter.clone(),
            })
            .and_then(|(_, factory)| factory(&config.params))
    }

    /// Drift distance for a drift time. Negative times map to zero distance.
    pub fn convert(&self, time: f64) -> f64 {
        let t = time.max(0.0);
        match *self {
            TtdConverter::Linear { drift_velocity } => drift_velocity * t,
            TtdConverter::Tanh {
                drift_velocity,
                max_distance,
            } => max_distance * (drift_velocity * t / max_distance).tanh(),
        }
    }
}

impl Default for TtdConverter {
    fn default() -> Self {
        TtdConverter::Linear {
            drift_velocity: 5.0e4,
        }
    }
}
