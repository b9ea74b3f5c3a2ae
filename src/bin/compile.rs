//! `evolimo-compile` -- compiles every built-in definition into
//! `<output_dir>/<name>/ir.json` (+ `visual.json` when the definition carries
//! a visual mapping). Thin binary: all logic lives in the library.

use clap::Parser;
use evolimo_core::config::{init_tracing, CompilerConfig};
use evolimo_core::{compile, demos, ir_io};
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory to write `<name>/ir.json` into (overrides `evolimo.toml`)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Compile only this definition name instead of all of them
    #[arg(short, long)]
    name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = CompilerConfig::load().unwrap_or_default();
    init_tracing(&config.logging);

    if let Some(dir) = args.output_dir {
        config.output_dir = dir.into();
    }

    let mut failures = 0;
    for (def_name, definition) in demos::registry() {
        if args.name.as_deref().is_some_and(|n| n != def_name) {
            continue;
        }

        let visual_mapping = definition.visual_mapping.clone();
        match compile(&definition) {
            Ok(ir) => {
                let dir = config.output_dir.join(def_name);
                ir_io::save_ir(&ir, dir.join("ir.json"))?;
                if let Some(mapping) = &visual_mapping {
                    ir_io::save_visual_mapping(mapping, dir.join("visual.json"))?;
                }
                info!(definition = def_name, path = %dir.display(), "compiled");
            }
            Err(e) => {
                error!(definition = def_name, error = %e, "compile failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} definition(s) failed to compile");
    }
    Ok(())
}
