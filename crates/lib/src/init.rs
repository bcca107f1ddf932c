//! Initialize the configuration directory: create ~/.mogu, a default config,
//! and the runs directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with `{}` if missing.
/// - Creates the runs directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, b"{}")
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let (loaded, _) = config::load_config(Some(config_path.to_path_buf()))?;
    let runs_dir = config::resolve_runs_dir(&loaded);
    std::fs::create_dir_all(&runs_dir)
        .with_context(|| format!("creating runs directory {}", runs_dir.display()))?;
    log::info!("runs directory ready at {}", runs_dir.display());

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_config_file_and_runs_dir() {
        let dir = std::env::temp_dir().join(format!("mogu-init-test-{}", uuid::Uuid::new_v4()));
        let config_path = dir.join("config.json");
        // Point the runs dir inside the temp dir via a pre-written config.
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(
            &config_path,
            format!(r#"{{"runs": {{"directory": "{}"}}}}"#, dir.join("runs").display()),
        )
        .expect("write config");

        init_config_dir(&config_path).expect("init");

        assert!(config_path.exists());
        assert!(dir.join("runs").is_dir());
    }

    #[test]
    fn missing_config_gets_default_contents() {
        let dir = std::env::temp_dir().join(format!("mogu-init-test-{}", uuid::Uuid::new_v4()));
        let config_path = dir.join("sub").join("config.json");

        // Default runs dir resolves to the home directory; only check the
        // config file here.
        let _ = init_config_dir(&config_path);

        assert_eq!(
            std::fs::read_to_string(&config_path).expect("read config"),
            "{}"
        );
    }
}
