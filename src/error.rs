//! Error types for orbit-life.

use thiserror::Error;

use crate::orbit::{OrbitId, Pattern};

/// Errors produced by the orbit table, rule sets, grids and engines.
#[derive(Debug, Error)]
pub enum Error {
    /// A raw value outside `0..512` was used as a neighborhood pattern.
    #[error("invalid pattern {0}: expected a value in 0..512")]
    InvalidPattern(u32),

    /// A grid was requested with a zero dimension.
    #[error("invalid grid dimensions {rows}x{cols}: both must be at least 1")]
    InvalidGridDimensions { rows: usize, cols: usize },

    /// Seeding density outside `0..=100`.
    #[error("invalid density {0}: expected a percentage in 0..=100")]
    InvalidDensity(u8),

    /// Unparseable engine configuration (CLI flag or environment override).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The rayon pool for the parallel engine could not be built.
    #[error("parallel backend unavailable: {0}")]
    ParallelBackendUnavailable(#[from] rayon::ThreadPoolBuildError),

    /// Per-orbit outputs do not cover the orbit table.
    #[error("expected {expected} orbit outputs, got {got}")]
    OutputCountMismatch { expected: usize, got: usize },

    /// A rule function disagreed with itself inside one orbit.
    #[error(
        "rule is not rotation invariant: pattern {pattern} differs from representative {representative} of orbit {orbit}"
    )]
    NonInvariantRule {
        orbit: OrbitId,
        pattern: Pattern,
        representative: Pattern,
    },

    #[error("invalid rulestring {0:?}")]
    InvalidRulestring(String),

    #[error("invalid rule descriptor: {0}")]
    InvalidDescriptor(String),

    /// A persisted orbit table failed validation.
    #[error("malformed orbit table: {0}")]
    MalformedOrbitTable(String),

    /// A run was interrupted; the grid still holds `generation` in full.
    #[error("run cancelled at generation {generation}")]
    Cancelled { generation: u64 },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
