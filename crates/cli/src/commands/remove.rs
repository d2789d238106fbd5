use anyhow::{Context, Result};
use envrunner_core::EnvManager;
use std::path::Path;

pub fn remove_command(path: &Path) -> Result<()> {
    let manager = EnvManager::open(Some(path));
    if manager.environment().is_system_location() {
        anyhow::bail!(
            "Refusing to remove {}: it is a system interpreter installation",
            path.display()
        );
    }

    manager
        .remove()
        .with_context(|| format!("Failed to remove environment at {}", path.display()))?;
    println!("Removed environment at {}", path.display());
    Ok(())
}
