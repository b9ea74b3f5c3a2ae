//! `evolimo-step` -- loads an IR (or compiles a built-in definition by name),
//! runs it headless for N steps, and prints per-state-var summary
//! statistics. Stands in for the external viewer during development: a
//! smoke-test driver, not a replacement for it.

use clap::Parser;
use evolimo_core::config::{init_tracing, CompilerConfig};
use evolimo_core::{compile, demos, ir_io};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Built-in definition name (mutually exclusive with --ir)
    #[arg(short, long)]
    definition: Option<String>,

    /// Path to a previously compiled `ir.json` (mutually exclusive with --definition)
    #[arg(long)]
    ir: Option<String>,

    /// Number of steps to run
    #[arg(short, long, default_value_t = 10)]
    steps: usize,

    /// RNG seed for initialization
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Fail on the first grid capacity overflow instead of counting it
    #[arg(long)]
    strict_capacity: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = CompilerConfig::load().unwrap_or_default();
    init_tracing(&config.logging);

    let ir = match (&args.definition, &args.ir) {
        (Some(_), Some(_)) => anyhow::bail!("pass only one of --definition / --ir"),
        (Some(name), None) => {
            let definition = demos::registry()
                .into_iter()
                .find(|(n, _)| n == name)
                .ok_or_else(|| anyhow::anyhow!("unknown definition: {name}"))?
                .1;
            compile(&definition)?
        }
        (None, Some(path)) => ir_io::load_ir(path)?,
        (None, None) => anyhow::bail!("pass --definition <name> or --ir <path>"),
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut driver = evolimo_core::Driver::new(ir, &mut rng).with_strict_capacity(args.strict_capacity);

    for _ in 0..args.steps {
        let outcome = driver.step()?;
        if outcome.grid_stats.dropped > 0 {
            info!(dropped = outcome.grid_stats.dropped, step = driver.step_count(), "grid capacity overflow");
        }
    }

    println!("ran {} step(s)", driver.step_count());
    for (name, column) in driver.snapshot() {
        let n = column.len() as f32;
        let mean = column.sum() / n;
        let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        println!("  {name}: mean={mean:.4} std={:.4}", variance.sqrt());
    }

    Ok(())
}
