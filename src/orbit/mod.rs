//! Symmetry reduction of 3x3 neighborhoods under quarter turns.

mod pattern;
mod persist;
mod table;

pub use pattern::{PATTERN_COUNT, Pattern};
pub use persist::{MemberRecord, OrbitDocument, OrbitRecord, OrbitSummary};
pub use table::{Orbit, OrbitId, OrbitTable};
