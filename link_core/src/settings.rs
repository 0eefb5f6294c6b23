//! Transfer settings and the per-run context.
//!
//! Settings have built-in defaults and may be overridden from environment
//! variables. The context is passed explicitly into every orchestration
//! call; there is no ambient "current document".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::ResolutionPolicy;
use crate::geometry::{FALLBACK_DEPTH_M, FALLBACK_WIDTH_M, WALL_EDGE_TOLERANCE};
use crate::units::Meters;

/// Default coincidence tolerance for conflict detection (m)
pub const DEFAULT_TOLERANCE_M: f64 = 0.001;

/// Tunable parameters of a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Coincidence tolerance for duplicate/conflict detection (m)
    pub tolerance: f64,
    /// Elevation tolerance for a wall's bottom edge (m)
    pub wall_edge_tolerance: f64,
    /// Beam/column width when the section lookup is unavailable (m)
    pub fallback_width: f64,
    /// Beam/column depth when the section lookup is unavailable (m)
    pub fallback_depth: f64,
    /// Policy applied to duplicates and conflicts unless the caller decides per element
    pub conflict_policy: ResolutionPolicy,
}

impl Default for TransferSettings {
    fn default() -> Self {
        TransferSettings {
            tolerance: DEFAULT_TOLERANCE_M,
            wall_edge_tolerance: WALL_EDGE_TOLERANCE,
            fallback_width: FALLBACK_WIDTH_M,
            fallback_depth: FALLBACK_DEPTH_M,
            conflict_policy: ResolutionPolicy::default(),
        }
    }
}

impl TransferSettings {
    /// Defaults overlaid with `STRUCTLINK_*` environment variables.
    ///
    /// - `STRUCTLINK_TOLERANCE_M`
    /// - `STRUCTLINK_FALLBACK_WIDTH_M`
    /// - `STRUCTLINK_FALLBACK_DEPTH_M`
    /// - `STRUCTLINK_CONFLICT_POLICY` (`create_both`, `replace`, `skip`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TransferSettings::from_env`] with a custom variable source.
    /// Unparsable or non-positive values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = TransferSettings::default();
        let length = |key: &str, default: f64| -> f64 {
            match lookup(key).map(|v| v.trim().parse::<f64>()) {
                Some(Ok(value)) if value.is_finite() && value > 0.0 => value,
                Some(_) => {
                    tracing::warn!(variable = key, default, "Ignoring invalid setting");
                    default
                }
                None => default,
            }
        };

        let policy = lookup("STRUCTLINK_CONFLICT_POLICY").map(|v| v.parse::<ResolutionPolicy>());
        let conflict_policy = match policy {
            Some(Ok(policy)) => policy,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid conflict policy");
                defaults.conflict_policy
            }
            None => defaults.conflict_policy,
        };

        TransferSettings {
            tolerance: length("STRUCTLINK_TOLERANCE_M", defaults.tolerance),
            wall_edge_tolerance: defaults.wall_edge_tolerance,
            fallback_width: length("STRUCTLINK_FALLBACK_WIDTH_M", defaults.fallback_width),
            fallback_depth: length("STRUCTLINK_FALLBACK_DEPTH_M", defaults.fallback_depth),
            conflict_policy,
        }
    }

    pub fn fallback_width(&self) -> Meters {
        Meters(self.fallback_width)
    }

    pub fn fallback_depth(&self) -> Meters {
        Meters(self.fallback_depth)
    }
}

/// Explicit context for one extraction or import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferContext {
    /// Correlates log events of one run
    pub run_id: Uuid,
    pub started: DateTime<Utc>,
    pub settings: TransferSettings,
}

impl TransferContext {
    pub fn new(settings: TransferSettings) -> Self {
        TransferContext {
            run_id: Uuid::new_v4(),
            started: Utc::now(),
            settings,
        }
    }

    /// Override the default conflict policy (builder pattern)
    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.settings.conflict_policy = policy;
        self
    }
}

impl Default for TransferContext {
    fn default() -> Self {
        TransferContext::new(TransferSettings::default())
    }
}
