use std::path::Path;

use anyhow::Context;
use bidgrid_core::NodeConfig;

pub fn run(node_id: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let toml = NodeConfig::scaffold(node_id)
        .to_toml_string()
        .context("failed to render config scaffold")?;

    match output {
        Some(path) => {
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            std::fs::write(path, toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("✓ Wrote {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}
