//! Rotation-reduced 3x3 cellular automata.
//!
//! The 512 neighborhood patterns collapse to 140 orbits under quarter turns.
//! A rule is stored as one output bit per orbit and run over a grid by either
//! the sequential reference engine or the rayon-parallel engine, which must
//! produce identical generations.

pub mod engine;
pub mod error;
pub mod grid;
pub mod orbit;
pub mod rules;
pub mod simulation;

pub use engine::{Engine, Granularity, ParallelConfig, ParallelEngine, SequentialEngine};
pub use error::{Error, Result};
pub use grid::{Boundary, Grid};
pub use orbit::{Orbit, OrbitId, OrbitTable, Pattern};
pub use rules::{BirthSurvival, RuleSet};
pub use simulation::{RunMetadata, Simulation};
