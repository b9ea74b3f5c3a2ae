//! JSON IR load/save
//!
//! The compiler writes one `ir.json` and one `visual.json` per definition
//! module into `<output_dir>/<name>/`; the runtime only ever reads `ir.json`
//! back. Neither side interprets `visual.json` beyond passing it through.

use crate::error::EvolimoResult;
use crate::ir::OutputIR;
use crate::visual::VisualMapping;
use std::path::Path;

pub fn save_ir(ir: &OutputIR, path: impl AsRef<Path>) -> EvolimoResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(ir)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_ir(path: impl AsRef<Path>) -> EvolimoResult<OutputIR> {
    let text = std::fs::read_to_string(path)?;
    let ir = serde_json::from_str(&text)?;
    Ok(ir)
}

pub fn save_visual_mapping(mapping: &VisualMapping, path: impl AsRef<Path>) -> EvolimoResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(mapping)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_visual_mapping(path: impl AsRef<Path>) -> EvolimoResult<VisualMapping> {
    let text = std::fs::read_to_string(path)?;
    let mapping = serde_json::from_str(&text)?;
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Constants, InitializationIR};
    use crate::distribution::Distribution;
    use std::collections::HashMap;

    #[test]
    fn round_trips_through_json() {
        let ir = OutputIR {
            state_vars: vec!["pos_x".to_string()],
            constants: Constants { n_agents: 4, gene_len: 2, hidden_len: 3 },
            grid_config: None,
            groups: HashMap::new(),
            boundary_conditions: vec![],
            initialization: InitializationIR {
                state: HashMap::from([("pos_x".to_string(), Distribution::Const { value: 0.0 })]),
                genes: Distribution::Const { value: 0.0 },
            },
            operations: vec![],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ir.json");
        save_ir(&ir, &path).unwrap();
        let loaded = load_ir(&path).unwrap();
        assert_eq!(ir, loaded);
    }
}
