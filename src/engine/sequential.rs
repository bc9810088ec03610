//! Single-threaded reference engine.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{Engine, advance_row};
use crate::grid::Grid;
use crate::rules::RuleSet;

/// Row-major scan on the calling thread. The baseline every other engine
/// is checked against.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEngine;

impl Engine for SequentialEngine {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn try_step_into(
        &self,
        current: &Grid,
        next: &mut Grid,
        rules: &RuleSet,
        cancel: &AtomicBool,
    ) -> bool {
        next.reshape_like(current);
        let cols = current.cols();
        for (row, out) in next.cells_mut().chunks_mut(cols).enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            advance_row(current, rules, row, out);
        }
        true
    }
}
