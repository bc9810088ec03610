#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use orbit_life::{
    BirthSurvival, Boundary, Granularity, Grid, OrbitTable, ParallelConfig, ParallelEngine,
    RuleSet, SequentialEngine, Simulation,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BoundaryArg {
    Torus,
    Dead,
}

impl From<BoundaryArg> for Boundary {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::Torus => Boundary::Toroidal,
            BoundaryArg::Dead => Boundary::DeadBorder,
        }
    }
}

/// Run a rotation-reduced rule with both engines and check they agree.
#[derive(Debug, Parser)]
#[command(name = "orbit-life", version)]
struct Args {
    #[arg(long, default_value_t = 1024)]
    rows: usize,
    #[arg(long, default_value_t = 1024)]
    cols: usize,
    /// Live cell percentage for the random seed.
    #[arg(long, default_value_t = 42)]
    density: u8,
    #[arg(long, default_value_t = 0x5EED_1234_ABCD_EF01)]
    seed: u64,
    #[arg(long, default_value_t = 200)]
    generations: u64,
    #[arg(long, default_value_t = 50)]
    check_interval: u64,
    /// Birth/survival rulestring.
    #[arg(long, default_value = "B3/S23", conflicts_with = "majority")]
    rule: BirthSurvival,
    /// Use the 9-cell majority rule instead of a rulestring.
    #[arg(long)]
    majority: bool,
    #[arg(long, value_enum, default_value_t = BoundaryArg::Torus)]
    boundary: BoundaryArg,
    /// Worker threads (default: auto, or ORBIT_LIFE_THREADS).
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    max_threads: Option<usize>,
    /// cell, row, or band:N (default: row, or ORBIT_LIFE_GRANULARITY).
    #[arg(long)]
    granularity: Option<Granularity>,
    /// Write the orbit table document to this path and exit.
    #[arg(long)]
    export_orbits: Option<PathBuf>,
}

fn parallel_config(args: &Args) -> orbit_life::Result<ParallelConfig> {
    let mut config = ParallelConfig::from_env()?;
    if let Some(n) = args.threads {
        config = config.thread_count(n);
    }
    if let Some(n) = args.max_threads {
        config = config.max_threads(n);
    }
    if let Some(granularity) = args.granularity {
        config = config.granularity(granularity);
    }
    Ok(config)
}

/// How a run ended, mapped onto the process exit status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// Both engines agreed at every checkpoint, or the orbit table was exported.
    Matched,
    Mismatched,
    /// Only the sequential engine ran, so nothing was compared.
    ParallelUnavailable,
}

impl Outcome {
    fn code(self) -> u8 {
        match self {
            Outcome::Matched => 0,
            Outcome::Mismatched => 2,
            Outcome::ParallelUnavailable => 3,
        }
    }
}

fn run_checked(args: &Args, rules: RuleSet) -> orbit_life::Result<Outcome> {
    let mut grid = Grid::new(args.rows, args.cols, args.boundary.into())?;
    grid.seed_random(args.density, args.seed)?;

    let mut sequential = Simulation::new(SequentialEngine, rules.clone(), grid.clone());
    let engine = match ParallelEngine::new(parallel_config(args)?) {
        Ok(engine) => engine,
        Err(err) => {
            println!("Parallel engine not run: {err}");
            let start = Instant::now();
            sequential.step_n(args.generations);
            println!(
                "Sequential: {:.3} ms for {} generations, pop = {}",
                start.elapsed().as_secs_f64() * 1000.0,
                args.generations,
                sequential.population()
            );
            return Ok(Outcome::ParallelUnavailable);
        }
    };
    println!(
        "Parallel engine: {} threads, {:?} granularity",
        engine.threads(),
        engine.granularity()
    );
    let mut parallel = Simulation::new(engine, rules, grid);

    let interval = args.check_interval.max(1);
    let mut seq_total = Duration::ZERO;
    let mut par_total = Duration::ZERO;
    let mut all_match = true;
    let mut done = 0;

    while done < args.generations {
        let chunk = interval.min(args.generations - done);
        done += chunk;

        let start = Instant::now();
        sequential.step_n(chunk);
        let seq_phase = start.elapsed();

        let start = Instant::now();
        parallel.step_n(chunk);
        let par_phase = start.elapsed();

        seq_total += seq_phase;
        par_total += par_phase;

        let divergence = sequential.grid().first_difference(parallel.grid());
        let status = match divergence {
            None => "MATCH".to_string(),
            Some((r, c)) => {
                all_match = false;
                format!("MISMATCH at ({r},{c})")
            }
        };
        println!(
            "Generation {done}: sequential pop = {}, parallel pop = {} [{status}]",
            sequential.population(),
            parallel.population()
        );
        let seq_ms = seq_phase.as_secs_f64() * 1000.0;
        let par_ms = par_phase.as_secs_f64() * 1000.0;
        println!(
            "  sequential: {seq_ms:.3} ms, {:.6} ms/gen | parallel: {par_ms:.3} ms, {:.6} ms/gen",
            seq_ms / chunk as f64,
            par_ms / chunk as f64
        );
    }

    let seq_ms = seq_total.as_secs_f64() * 1000.0;
    let par_ms = par_total.as_secs_f64() * 1000.0;
    let generations = args.generations.max(1) as f64;
    println!("\n--- Summary ({} generations) ---", args.generations);
    println!("Sequential: {seq_ms:.3} ms total, {:.6} ms/gen", seq_ms / generations);
    println!("Parallel:   {par_ms:.3} ms total, {:.6} ms/gen", par_ms / generations);
    if par_ms > 0.0 {
        println!("Speedup (sequential / parallel): {:.2}x", seq_ms / par_ms);
    }
    println!("Rule descriptor: {}", parallel.metadata().rule);
    Ok(if all_match {
        Outcome::Matched
    } else {
        Outcome::Mismatched
    })
}

fn run(args: Args) -> orbit_life::Result<Outcome> {
    let table = Arc::new(OrbitTable::build());

    if let Some(path) = &args.export_orbits {
        table.write_json(path)?;
        println!("Wrote {} orbits to {}", table.orbit_count(), path.display());
        return Ok(Outcome::Matched);
    }

    let rules = if args.majority {
        RuleSet::from_rule_fn(table, orbit_life::rules::majority)
    } else {
        RuleSet::from_birth_survival(table, args.rule)
    };
    run_checked(&args, rules)
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
