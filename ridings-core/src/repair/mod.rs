//! Ordered geometry repair.
//!
//! [`RepairChain::repair`] prepares a raw geometry once (multi-part coercion
//! and, when planned, reprojection) and then tries each [`RepairStrategy`] in
//! turn, stopping at the first valid result. The last validity reason is kept
//! as the failure payload when every strategy is exhausted.

use std::{borrow::Cow, fmt, time::Duration, time::Instant};

use geo::MultiPolygon;
use log::debug;
use thiserror::Error;

use crate::{RawGeometry, TransformPlan};

mod ops;
mod shape;

pub use ops::{GeoOps, GeometryOps, ReprojectError, Validity};
pub use shape::{Shape, ShapeError, parse_shape};

/// Default Douglas–Peucker tolerance in degrees of the target system.
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.001;

/// Tunables for the repair chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairSettings {
    /// Simplification tolerance in target units.
    pub tolerance: f64,
    /// Upper bound on the time spent repairing one feature.
    pub deadline: Option<Duration>,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            deadline: None,
        }
    }
}

impl RepairSettings {
    /// Replace the simplification tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Bound each feature's repair by `deadline`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Repair strategies in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairStrategy {
    /// Accept the prepared geometry as is.
    Direct,
    /// Fix self-intersections and degenerate rings.
    MakeValid,
    /// Simplify, then fix.
    Simplify,
}

impl RepairStrategy {
    /// Attempt order.
    pub const ORDER: [Self; 3] = [Self::Direct, Self::MakeValid, Self::Simplify];

    /// Short label used in logs and reports.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::MakeValid => "make-valid",
            Self::Simplify => "simplify",
        }
    }
}

impl fmt::Display for RepairStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Geometry that passed the validity predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidGeometry {
    geometry: MultiPolygon<f64>,
    strategy: RepairStrategy,
}

impl ValidGeometry {
    /// Validated multi-polygon.
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Strategy that produced the geometry.
    pub const fn strategy(&self) -> RepairStrategy {
        self.strategy
    }

    /// Consume the wrapper.
    pub fn into_geometry(self) -> MultiPolygon<f64> {
        self.geometry
    }
}

/// Why a feature's geometry could not be made valid.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RepairFailure {
    /// The raw geometry is not a usable polygon.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// Reprojection failed or left the valid coordinate range.
    #[error("reprojection failed: {0}")]
    Reprojection(#[from] ReprojectError),
    /// Every strategy produced an invalid geometry.
    #[error("geometry still invalid after all repair strategies: {reason}")]
    Exhausted {
        /// Validity reason from the last strategy; never empty.
        reason: String,
    },
    /// The repair deadline elapsed.
    #[error("repair deadline of {limit:?} exceeded at the {strategy} strategy")]
    TimedOut {
        /// Configured deadline.
        limit: Duration,
        /// Strategy about to run or just finished when the deadline was seen.
        strategy: RepairStrategy,
    },
}

impl RepairFailure {
    /// Human-readable reason.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Whether the failure came from the deadline.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Stable category used to group failures in summaries.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Shape(ShapeError::UnsupportedType { .. }) => "unsupported geometry",
            Self::Shape(ShapeError::Malformed { .. }) => "malformed geometry",
            Self::Reprojection(_) => "reprojection failed",
            Self::Exhausted { .. } => "repair exhausted",
            Self::TimedOut { .. } => "repair timed out",
        }
    }
}

/// Result of one strategy in a diagnostic run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    /// Strategy evaluated.
    pub strategy: RepairStrategy,
    /// Validity of its output.
    pub validity: Validity,
}

/// Everything known about a geometry's path through the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDiagnosis {
    /// Declared geometry type.
    pub geometry_type: String,
    /// Transform applied during preparation.
    pub plan: TransformPlan,
    /// Why preparation failed, if it did.
    pub preparation: Option<RepairFailure>,
    /// Per-strategy outcomes; empty when preparation failed.
    pub strategies: Vec<StrategyReport>,
}

impl GeometryDiagnosis {
    /// First strategy that produced a valid geometry.
    pub fn first_valid(&self) -> Option<RepairStrategy> {
        self.strategies
            .iter()
            .find(|report| report.validity.is_valid())
            .map(|report| report.strategy)
    }
}

/// Runs the ordered repair strategies.
///
/// # Examples
/// ```
/// use ridings_core::{
///     GeometryKind, RawGeometry, RepairChain, RepairSettings, RepairStrategy, TransformPlan,
/// };
/// use serde_json::json;
///
/// let raw = RawGeometry::new(
///     GeometryKind::Polygon,
///     json!([[[-75.7, 45.4], [-75.6, 45.4], [-75.6, 45.5], [-75.7, 45.5], [-75.7, 45.4]]]),
/// );
/// let valid = RepairChain::new(RepairSettings::default())
///     .repair(&raw, &TransformPlan::geographic())
///     .expect("square is valid");
/// assert_eq!(valid.strategy(), RepairStrategy::Direct);
/// assert_eq!(valid.geometry().0.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepairChain<O = GeoOps> {
    ops: O,
    settings: RepairSettings,
}

impl RepairChain<GeoOps> {
    /// Chain backed by [`GeoOps`].
    pub fn new(settings: RepairSettings) -> Self {
        Self::with_ops(GeoOps, settings)
    }
}

impl<O: GeometryOps> RepairChain<O> {
    /// Chain backed by custom geometry operations.
    pub fn with_ops(ops: O, settings: RepairSettings) -> Self {
        Self { ops, settings }
    }

    /// Active settings.
    pub fn settings(&self) -> &RepairSettings {
        &self.settings
    }

    /// Geometry operations in use.
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Coerce to multi-part and reproject when the plan asks for it.
    pub fn prepare(
        &self,
        raw: &RawGeometry,
        plan: &TransformPlan,
    ) -> Result<MultiPolygon<f64>, RepairFailure> {
        let multi = parse_shape(raw)?.into_multi();
        if !plan.needs_reprojection {
            return Ok(multi);
        }
        if plan.ambiguous {
            return Err(ReprojectError::AmbiguousSource {
                srid: plan.source_srid,
            }
            .into());
        }
        Ok(self
            .ops
            .reproject(&multi, plan.source_srid, plan.target_srid)?)
    }

    /// Produce a valid geometry or explain why none could be produced.
    pub fn repair(
        &self,
        raw: &RawGeometry,
        plan: &TransformPlan,
    ) -> Result<ValidGeometry, RepairFailure> {
        let started = Instant::now();
        let prepared = self.prepare(raw, plan)?;
        let mut last_reason = String::new();

        for strategy in RepairStrategy::ORDER {
            self.check_deadline(started, strategy)?;
            let candidate = self.attempt(strategy, &prepared);
            let validity = self.ops.validity(&candidate);
            self.check_deadline(started, strategy)?;
            match validity {
                Validity::Valid => {
                    debug!("geometry valid after {strategy} strategy");
                    return Ok(ValidGeometry {
                        geometry: candidate.into_owned(),
                        strategy,
                    });
                }
                Validity::Invalid { reason } => {
                    debug!("{strategy} strategy left geometry invalid: {reason}");
                    last_reason = reason;
                }
            }
        }

        Err(RepairFailure::Exhausted {
            reason: last_reason,
        })
    }

    /// Evaluate every strategy without stopping at the first valid one.
    pub fn diagnose(&self, raw: &RawGeometry, plan: &TransformPlan) -> GeometryDiagnosis {
        let geometry_type = raw.kind.as_str().to_owned();
        let prepared = match self.prepare(raw, plan) {
            Ok(prepared) => prepared,
            Err(failure) => {
                return GeometryDiagnosis {
                    geometry_type,
                    plan: *plan,
                    preparation: Some(failure),
                    strategies: Vec::new(),
                };
            }
        };
        let strategies = RepairStrategy::ORDER
            .into_iter()
            .map(|strategy| StrategyReport {
                strategy,
                validity: self.ops.validity(&self.attempt(strategy, &prepared)),
            })
            .collect();
        GeometryDiagnosis {
            geometry_type,
            plan: *plan,
            preparation: None,
            strategies,
        }
    }

    fn attempt<'a>(
        &self,
        strategy: RepairStrategy,
        prepared: &'a MultiPolygon<f64>,
    ) -> Cow<'a, MultiPolygon<f64>> {
        match strategy {
            RepairStrategy::Direct => Cow::Borrowed(prepared),
            RepairStrategy::MakeValid => Cow::Owned(self.ops.make_valid(prepared)),
            RepairStrategy::Simplify => {
                let simplified = self.ops.simplify(prepared, self.settings.tolerance);
                Cow::Owned(self.ops.make_valid(&simplified))
            }
        }
    }

    fn check_deadline(
        &self,
        started: Instant,
        strategy: RepairStrategy,
    ) -> Result<(), RepairFailure> {
        match self.settings.deadline {
            Some(limit) if started.elapsed() >= limit => {
                Err(RepairFailure::TimedOut { limit, strategy })
            }
            _ => Ok(()),
        }
    }
}
