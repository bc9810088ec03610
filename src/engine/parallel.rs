//! Data-parallel engine on a dedicated rayon pool.
//!
//! Workers read only the frozen current buffer and each writes a disjoint
//! slice of the next buffer, so scheduling order cannot change the result.

use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use super::{Engine, advance_row};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::rules::RuleSet;

pub const THREADS_ENV: &str = "ORBIT_LIFE_THREADS";
pub const GRANULARITY_ENV: &str = "ORBIT_LIFE_GRANULARITY";

static PHYSICAL_CORES: OnceLock<usize> = OnceLock::new();

/// Size of one independent unit of work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Granularity {
    /// One unit per cell.
    Cell,
    /// One unit per grid row.
    #[default]
    Row,
    /// One unit per band of this many consecutive rows.
    Band(usize),
}

impl FromStr for Granularity {
    type Err = Error;

    /// `cell`, `row` or `band:N` with `N >= 1`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "cell" => Ok(Granularity::Cell),
            "row" => Ok(Granularity::Row),
            other => other
                .strip_prefix("band:")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n >= 1)
                .map(Granularity::Band)
                .ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "unknown granularity {other:?} (expected cell, row, or band:N)"
                    ))
                }),
        }
    }
}

#[inline]
fn physical_core_count() -> usize {
    *PHYSICAL_CORES.get_or_init(|| num_cpus::get_physical().max(1))
}

#[inline]
fn auto_pool_thread_count_for_physical(physical: usize) -> usize {
    let physical = physical.max(1);
    if physical <= 8 {
        physical
    } else {
        physical.div_ceil(2).max(6)
    }
}

/// Resolve the thread count from a config, falling back to auto-detect.
fn resolve_thread_count(config: &ParallelConfig) -> usize {
    let mut threads = config
        .thread_count
        .unwrap_or_else(|| auto_pool_thread_count_for_physical(physical_core_count()));
    if let Some(cap) = config.max_threads {
        threads = threads.min(cap);
    }
    threads.max(1)
}

/// Configuration for a parallel engine instance.
///
/// Use `ParallelConfig::default()` for auto-detected threads and row
/// granularity, or customise individual knobs via the builder methods.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Number of threads for the compute pool.
    /// `None` means auto-detect (physical cores, memory-bandwidth capped).
    pub thread_count: Option<usize>,
    /// Hard upper bound on threads regardless of auto-detection.
    pub max_threads: Option<usize>,
    pub granularity: Granularity,
}

impl ParallelConfig {
    /// Defaults overridden by `ORBIT_LIFE_THREADS` and `ORBIT_LIFE_GRANULARITY`
    /// when set and non-empty.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = env_value(THREADS_ENV) {
            let n = value
                .parse::<usize>()
                .map_err(|_| Error::InvalidConfig(format!("{THREADS_ENV}={value:?}")))?;
            config = config.thread_count(n);
        }
        if let Some(value) = env_value(GRANULARITY_ENV) {
            config = config.granularity(value.parse()?);
        }
        Ok(config)
    }

    /// Set an explicit thread count for the compute pool.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    /// Set a hard upper bound on threads.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = match granularity {
            Granularity::Band(rows) => Granularity::Band(rows.max(1)),
            other => other,
        };
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Owns its rayon pool; the pool's threads are joined when the engine drops.
pub struct ParallelEngine {
    pool: rayon::ThreadPool,
    granularity: Granularity,
}

impl ParallelEngine {
    /// Acquire the worker pool. Failure is reported as
    /// `ParallelBackendUnavailable` and never falls back silently.
    pub fn new(config: ParallelConfig) -> Result<Self> {
        // Normalises a zero-row band set through the public field.
        let granularity = config.granularity;
        let config = config.granularity(granularity);
        let threads = resolve_thread_count(&config);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("orbit-life-{i}"))
            .build()
            .inspect_err(|err| log::warn!("parallel engine unavailable: {err}"))?;
        log::debug!(
            "parallel engine ready: {threads} threads, {:?} granularity",
            config.granularity
        );
        Ok(Self {
            pool,
            granularity: config.granularity,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl Drop for ParallelEngine {
    fn drop(&mut self) {
        log::debug!("releasing parallel engine pool ({} threads)", self.threads());
    }
}

impl Engine for ParallelEngine {
    fn name(&self) -> &'static str {
        "parallel"
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
        let out = next.cells_mut();
        let check = || -> std::result::Result<(), ()> {
            if cancel.load(Ordering::Relaxed) {
                Err(())
            } else {
                Ok(())
            }
        };

        let result = self.pool.install(|| match self.granularity {
            Granularity::Cell => {
                out.par_iter_mut()
                    .enumerate()
                    .try_for_each(|(i, cell)| -> std::result::Result<(), ()> {
                        check()?;
                        *cell = u8::from(rules.apply(current.pattern_at(i / cols, i % cols)));
                        Ok(())
                    })
            }
            Granularity::Row => {
                out.par_chunks_mut(cols)
                    .enumerate()
                    .try_for_each(|(row, line)| -> std::result::Result<(), ()> {
                        check()?;
                        advance_row(current, rules, row, line);
                        Ok(())
                    })
            }
            Granularity::Band(band_rows) => {
                // A band never needs to be taller than the grid.
                let band_rows = band_rows.clamp(1, current.rows());
                out.par_chunks_mut(cols * band_rows)
                    .enumerate()
                    .try_for_each(|(band, lines)| -> std::result::Result<(), ()> {
                        for (k, line) in lines.chunks_mut(cols).enumerate() {
                            check()?;
                            advance_row(current, rules, band * band_rows + k, line);
                        }
                        Ok(())
                    })
            }
        });
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        Granularity, ParallelConfig, ParallelEngine, auto_pool_thread_count_for_physical,
        resolve_thread_count,
    };
    use crate::engine::{Engine, SequentialEngine};
    use crate::error::Error;
    use crate::grid::{Boundary, Grid};
    use crate::orbit::OrbitTable;
    use crate::rules::{BirthSurvival, RuleSet};

    #[test]
    fn auto_pool_thread_count_targets_bandwidth_sweet_spot() {
        assert_eq!(auto_pool_thread_count_for_physical(0), 1);
        assert_eq!(auto_pool_thread_count_for_physical(1), 1);
        assert_eq!(auto_pool_thread_count_for_physical(8), 8);
        assert_eq!(auto_pool_thread_count_for_physical(10), 6);
        assert_eq!(auto_pool_thread_count_for_physical(16), 8);
        assert_eq!(auto_pool_thread_count_for_physical(32), 16);
    }

    #[test]
    fn explicit_threads_respect_cap() {
        let config = ParallelConfig::default().thread_count(12).max_threads(3);
        assert_eq!(resolve_thread_count(&config), 3);
        let config = ParallelConfig::default().thread_count(0);
        assert_eq!(resolve_thread_count(&config), 1);
    }

    #[test]
    fn engine_reports_pool_size() {
        let engine = ParallelEngine::new(
            ParallelConfig::default()
                .thread_count(3)
                .granularity(Granularity::Band(0)),
        )
        .unwrap();
        assert_eq!(engine.threads(), 3);
        assert_eq!(engine.granularity(), Granularity::Band(1));
    }

    #[test]
    fn granularity_parses() {
        assert_eq!("cell".parse::<Granularity>().unwrap(), Granularity::Cell);
        assert_eq!(" Row ".parse::<Granularity>().unwrap(), Granularity::Row);
        assert_eq!("band:16".parse::<Granularity>().unwrap(), Granularity::Band(16));
        for bad in ["band:0", "band:", "tile", ""] {
            assert!(matches!(bad.parse::<Granularity>(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn band_taller_than_grid_steps_like_sequential() {
        let granularity = format!("band:{}", usize::MAX).parse::<Granularity>().unwrap();
        assert_eq!(granularity, Granularity::Band(usize::MAX));

        let rules =
            RuleSet::from_birth_survival(Arc::new(OrbitTable::build()), BirthSurvival::conway());
        let mut grid = Grid::new(4, 4, Boundary::Toroidal).unwrap();
        grid.seed_random(50, 7).unwrap();

        let engine =
            ParallelEngine::new(ParallelConfig::default().thread_count(2).granularity(granularity))
                .unwrap();
        assert_eq!(engine.step(&grid, &rules), SequentialEngine.step(&grid, &rules));
    }
}
