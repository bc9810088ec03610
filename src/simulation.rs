//! Double-buffered run driver.
//!
//! The current buffer always holds a complete generation. A step writes into
//! the spare buffer and only swaps it in once the engine reports the
//! generation finished, so interrupting a run never exposes partial state.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::grid::{Boundary, Grid};
use crate::rules::RuleSet;

/// What sharing and export consumers get about a run (never the buffers).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub engine: String,
    /// `RuleSet::descriptor` of the rule being run.
    pub rule: String,
    pub rows: usize,
    pub cols: usize,
    pub boundary: Boundary,
    pub generation: u64,
    pub population: usize,
}

pub struct Simulation<E: Engine> {
    engine: E,
    rules: RuleSet,
    current: Grid,
    next: Grid,
    generation: u64,
}

impl<E: Engine> Simulation<E> {
    pub fn new(engine: E, rules: RuleSet, grid: Grid) -> Self {
        let next = grid.clone();
        Self {
            engine,
            rules,
            current: grid,
            next,
            generation: 0,
        }
    }

    /// Advance one generation.
    pub fn step(&mut self) {
        self.engine.step_into(&self.current, &mut self.next, &self.rules);
        self.swap_buffers();
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Advance up to `n` generations, stopping early once `cancel` is set.
    ///
    /// Returns the generation reached. On cancellation the partial generation
    /// is dropped and `Error::Cancelled` carries the last complete one, which
    /// is what `grid()` still shows.
    pub fn run_cancellable(&mut self, n: u64, cancel: &AtomicBool) -> Result<u64> {
        for _ in 0..n {
            if cancel.load(Ordering::Relaxed)
                || !self
                    .engine
                    .try_step_into(&self.current, &mut self.next, &self.rules, cancel)
            {
                log::debug!("run cancelled at generation {}", self.generation);
                return Err(Error::Cancelled {
                    generation: self.generation,
                });
            }
            self.swap_buffers();
        }
        Ok(self.generation)
    }

    fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        self.generation += 1;
        log::trace!("{} generation {}", self.engine.name(), self.generation);
    }

    pub fn grid(&self) -> &Grid {
        &self.current
    }

    /// Edit the current generation between steps.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.current
    }

    pub fn into_grid(self) -> Grid {
        self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> usize {
        self.current.population()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn metadata(&self) -> RunMetadata {
        RunMetadata {
            engine: self.engine.name().to_string(),
            rule: self.rules.descriptor(),
            rows: self.current.rows(),
            cols: self.current.cols(),
            boundary: self.current.boundary(),
            generation: self.generation,
            population: self.population(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    use super::Simulation;
    use crate::engine::{Engine, SequentialEngine};
    use crate::error::Error;
    use crate::grid::{Boundary, Grid};
    use crate::orbit::OrbitTable;
    use crate::rules::{BirthSurvival, RuleSet};

    fn conway() -> RuleSet {
        RuleSet::from_birth_survival(Arc::new(OrbitTable::build()), BirthSurvival::conway())
    }

    fn glider(size: usize) -> Grid {
        let mut grid = Grid::new(size, size, Boundary::Toroidal).unwrap();
        for (r, c) in [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)] {
            grid.set(r, c, true);
        }
        grid
    }

    /// Sets the cancel flag partway through its `trigger`-th generation.
    struct CancelDuring {
        calls: AtomicU64,
        trigger: u64,
    }

    impl Engine for CancelDuring {
        fn name(&self) -> &'static str {
            "cancel-during"
        }

        fn try_step_into(
            &self,
            current: &Grid,
            next: &mut Grid,
            rules: &RuleSet,
            cancel: &AtomicBool,
        ) -> bool {
            if self.calls.fetch_add(1, Ordering::Relaxed) + 1 == self.trigger {
                next.fill(true);
                cancel.store(true, Ordering::Relaxed);
            }
            SequentialEngine.try_step_into(current, next, rules, cancel)
        }
    }

    #[test]
    fn glider_wraps_around_torus() {
        let start = glider(8);
        let mut sim = Simulation::new(SequentialEngine, conway(), start.clone());
        // One diagonal cell every 4 generations: 8 cells on an 8x8 torus.
        sim.step_n(32);
        assert_eq!(sim.generation(), 32);
        assert_eq!(sim.grid(), &start);
        assert_eq!(sim.population(), 5);
    }

    #[test]
    fn cancelled_generation_is_discarded() {
        let engine = CancelDuring {
            calls: AtomicU64::new(0),
            trigger: 3,
        };
        let mut sim = Simulation::new(engine, conway(), glider(10));
        let mut reference = Simulation::new(SequentialEngine, conway(), glider(10));
        reference.step_n(2);

        let cancel = AtomicBool::new(false);
        let err = sim.run_cancellable(10, &cancel).unwrap_err();
        assert!(matches!(err, Error::Cancelled { generation: 2 }));
        assert_eq!(sim.generation(), 2);
        assert_eq!(sim.grid(), reference.grid());
    }

    #[test]
    fn pre_set_cancel_runs_nothing() {
        let mut sim = Simulation::new(SequentialEngine, conway(), glider(6));
        let cancel = AtomicBool::new(true);
        assert!(sim.run_cancellable(5, &cancel).is_err());
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.grid(), &glider(6));

        cancel.store(false, Ordering::Relaxed);
        assert_eq!(sim.run_cancellable(5, &cancel).unwrap(), 5);
    }

    #[test]
    fn metadata_describes_run() {
        let rules = conway();
        let descriptor = rules.descriptor();
        let mut sim = Simulation::new(SequentialEngine, rules, glider(12));
        sim.step_n(3);
        let meta = sim.metadata();
        assert_eq!(meta.engine, "sequential");
        assert_eq!(meta.rule, descriptor);
        assert_eq!((meta.rows, meta.cols, meta.generation), (12, 12, 3));
        assert_eq!(meta.population, 5);

        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"boundary\":\"toroidal\""));
    }
}
