use anyhow::{Context, Result};
use envrunner_core::{EnvManager, VenvBuilder};
use std::path::Path;
use tracing::debug;

pub fn create_command(
    path: &Path,
    clear: bool,
    without_pip: bool,
    python: Option<&Path>,
) -> Result<()> {
    let mut builder = VenvBuilder::new();
    if without_pip {
        builder = builder.without_pip();
    }
    if let Some(python) = python {
        builder = builder.with_interpreter(python);
    }
    debug!("Creating environment with {:?}", builder);

    if EnvManager::open(Some(path)).environment().is_system_location() {
        anyhow::bail!(
            "Refusing to create an environment at {}: it is a system interpreter installation",
            path.display()
        );
    }

    let manager = EnvManager::new(Some(path), clear, Some(&builder))
        .with_context(|| format!("Failed to create environment at {}", path.display()))?;

    let env = manager.environment();
    let root = env.root().unwrap_or(path);
    println!("Created environment '{}' at {}", env.name(), root.display());
    Ok(())
}
