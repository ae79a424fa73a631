use anyhow::{Context, Result};
use std::path::Path;
use traitdyn_sim::simulation::{Regime, RunConfig};

pub fn write_template(regime: Regime, output: Option<&Path>) -> Result<()> {
    let json = RunConfig::template(regime)
        .to_json_pretty()
        .context("Failed to serialize template")?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Wrote {regime} template to {}", path.display());
            println!("\n💡 Edit it, then run 'traitdyn run -c {}'", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
