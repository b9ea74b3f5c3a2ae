//! `evolimo-inspect` -- pretty-prints a compiled IR's op list and summary
//! stats. The analogue of this lineage's `debug_ir` binary.

use clap::Parser;
use evolimo_core::config::{init_tracing, CompilerConfig};
use evolimo_core::ir_io;
use std::collections::HashMap;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a compiled `ir.json`
    ir: String,

    /// Print the full op list, not just the summary
    #[arg(long)]
    ops: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = CompilerConfig::load().unwrap_or_default();
    init_tracing(&config.logging);

    let ir = ir_io::load_ir(&args.ir)?;

    println!("constants: {:?}", ir.constants);
    println!("state_vars ({}): {:?}", ir.state_vars.len(), ir.state_vars);
    println!("groups:");
    for (name, group) in &ir.groups {
        println!("  {name}: activation={:?} params={:?}", group.activation, group.params);
    }
    println!("boundary_conditions:");
    for b in &ir.boundary_conditions {
        println!("  {} <- {:?} {:?}", b.target_state, b.kind, b.range);
    }
    if let Some(grid) = &ir.grid_config {
        println!("grid_config: {grid:?}");
    }

    let mut op_counts: HashMap<&'static str, usize> = HashMap::new();
    for op in &ir.operations {
        *op_counts.entry(op_kind_name(op.op)).or_default() += 1;
    }
    println!("operations: {} total", ir.operations.len());
    let mut counts: Vec<_> = op_counts.into_iter().collect();
    counts.sort_by_key(|(name, _)| *name);
    for (kind, count) in counts {
        println!("  {kind}: {count}");
    }

    if args.ops {
        println!("\nop list:");
        for op in &ir.operations {
            println!("  {op:?}");
        }
    }

    Ok(())
}

fn op_kind_name(op: evolimo_core::ir::OpKind) -> &'static str {
    use evolimo_core::ir::OpKind::*;
    match op {
        RefState => "ref_state",
        RefParam => "ref_param",
        RefAux => "ref_aux",
        Const => "const",
        Add => "add",
        Sub => "sub",
        Mul => "mul",
        Div => "div",
        Lt => "lt",
        Gt => "gt",
        Ge => "ge",
        Where => "where",
        Sqrt => "sqrt",
        Relu => "relu",
        Neg => "neg",
        Transpose => "transpose",
        Sum => "sum",
        Cat => "cat",
        Slice => "slice",
        GridScatter => "grid_scatter",
        Stencil => "stencil",
        GridGather => "grid_gather",
        Assign => "assign",
        KernelOutput => "kernel_output",
    }
}
