use anyhow::{Context, Result};
use envrunner_core::{EnvManager, InstallOptions};
use std::path::Path;
use std::sync::Arc;

use super::load_settings;
use crate::cli::PkgAction;

pub fn pkg_command(path: &Path, action: PkgAction) -> Result<()> {
    let settings = load_settings()?;
    let manager = Arc::new(EnvManager::open(Some(path)));
    let packages = manager
        .package_manager(&settings.runner)
        .with_context(|| format!("Failed to create runner '{}'", settings.runner))?;

    match action {
        PkgAction::Install {
            packages: names,
            pip_options,
        } => {
            let options = InstallOptions {
                pip_options,
                ..InstallOptions::default()
            };
            for name in &names {
                packages
                    .install(name, &options)
                    .with_context(|| format!("Failed to install {name}"))?;
                println!("Installed {name}");
            }
        }
        PkgAction::Uninstall { packages: names } => {
            for name in &names {
                packages
                    .uninstall(name)
                    .with_context(|| format!("Failed to uninstall {name}"))?;
                println!("Uninstalled {name}");
            }
        }
        PkgAction::List => {
            for name in packages.list_packages()? {
                println!("{name}");
            }
        }
        PkgAction::Check { package } => {
            if packages.is_installed(&package)? {
                println!("{package} is installed");
            } else {
                println!("{package} is not installed");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
