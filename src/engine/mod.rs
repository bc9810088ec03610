//! Generation step engines.
//!
//! Every engine computes the same per-cell function: encode the 3x3
//! neighborhood from the current buffer, resolve it through the rule set,
//! write the bit into the next buffer. Engines differ only in how the cells
//! are scheduled, and must agree bit for bit.

mod parallel;
mod sequential;

use std::sync::atomic::AtomicBool;

use crate::grid::Grid;
use crate::rules::RuleSet;

pub use parallel::{Granularity, ParallelConfig, ParallelEngine};
pub use sequential::SequentialEngine;

pub trait Engine: Send + Sync {
    /// Short label for reports and run metadata.
    fn name(&self) -> &'static str;

    /// Compute the generation after `current` into `next`, checking `cancel`
    /// between units of work. Returns `false` if cancelled, in which case
    /// `next` holds a partial generation and must be discarded.
    ///
    /// `next` is reshaped to `current`'s dimensions and boundary first.
    fn try_step_into(
        &self,
        current: &Grid,
        next: &mut Grid,
        rules: &RuleSet,
        cancel: &AtomicBool,
    ) -> bool;

    fn step_into(&self, current: &Grid, next: &mut Grid, rules: &RuleSet) {
        let never = AtomicBool::new(false);
        let completed = self.try_step_into(current, next, rules, &never);
        debug_assert!(completed);
    }

    /// Next generation as a fresh grid; `current` is untouched.
    fn step(&self, current: &Grid, rules: &RuleSet) -> Grid {
        let mut next = current.clone();
        self.step_into(current, &mut next, rules);
        next
    }
}

/// Fill one row of the next generation.
#[inline]
fn advance_row(current: &Grid, rules: &RuleSet, row: usize, out: &mut [u8]) {
    for (col, cell) in out.iter_mut().enumerate() {
        *cell = u8::from(rules.apply(current.pattern_at(row, col)));
    }
}
