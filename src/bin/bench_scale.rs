//! Grid-size scaling for both engines and every parallel granularity.
//!
//! Use with `--release` for meaningful results.

use std::sync::Arc;
use std::time::Instant;

use orbit_life::{
    BirthSurvival, Boundary, Engine, Granularity, Grid, OrbitTable, ParallelConfig,
    ParallelEngine, RuleSet, SequentialEngine, Simulation,
};

fn bench<E: Engine>(engine: E, rules: &RuleSet, grid: &Grid, iterations: u64) -> (f64, usize) {
    let mut sim = Simulation::new(engine, rules.clone(), grid.clone());
    let start = Instant::now();
    sim.step_n(iterations);
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    (total_ms, sim.population())
}

fn main() {
    let rules =
        RuleSet::from_birth_survival(Arc::new(OrbitTable::build()), BirthSurvival::conway());
    let scales: &[(usize, u64)] = &[(128, 200), (512, 100), (1024, 50), (2048, 20)];
    let granularities = [Granularity::Cell, Granularity::Row, Granularity::Band(32)];

    println!(
        "{:<10} {:<12} {:>8} {:>12} {:>10}",
        "Grid", "Engine", "Iters", "Total(ms)", "Avg(ms)"
    );
    println!("{}", "-".repeat(56));

    for &(size, iters) in scales {
        let mut grid = Grid::new(size, size, Boundary::Toroidal).expect("non-zero grid size");
        grid.seed_random(42, 0x5EED_1234_ABCD_EF01).expect("valid density");

        let mut rows = vec![(
            "sequential".to_string(),
            bench(SequentialEngine, &rules, &grid, iters),
        )];
        for granularity in granularities {
            let config = ParallelConfig::default().granularity(granularity);
            match ParallelEngine::new(config) {
                Ok(engine) => {
                    rows.push((format!("{granularity:?}"), bench(engine, &rules, &grid, iters)))
                }
                Err(err) => println!("parallel {granularity:?} not run: {err}"),
            }
        }

        let reference_pop = rows[0].1.1;
        for (label, (total_ms, pop)) in rows {
            let flag = if pop == reference_pop { "" } else { " MISMATCH" };
            println!(
                "{:<10} {:<12} {:>8} {:>12.1} {:>10.4}{flag}",
                format!("{size}x{size}"),
                label,
                iters,
                total_ms,
                total_ms / iters as f64
            );
        }
    }
}
