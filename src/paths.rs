use anyhow::{Context, Result};
use etcetera::app_strategy::{AppStrategy, AppStrategyArgs};
use std::fs;
use std::path::{Path, PathBuf};

// Choose the Strategy based on OS
// Windows -> AppData\Roaming\ytrecap
#[cfg(target_os = "windows")]
use etcetera::app_strategy::Windows as Strategy;

// Mac & Linux -> ~/.config/ytrecap
#[cfg(not(target_os = "windows"))]
use etcetera::app_strategy::Xdg as Strategy;

pub struct AppPaths {
    pub config_file: PathBuf,
    pub out_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub lock_file: PathBuf,
    pub urls_file: PathBuf,
    pub report_file: PathBuf,
}

impl AppPaths {
    /// Resolves the config location and the output tree. `out` replaces the
    /// platform data dir as the output root when given.
    pub fn init(out: Option<&Path>) -> Result<Self> {
        let args = AppStrategyArgs {
            top_level_domain: "com".to_string(),
            author: "ytrecap".to_string(),
            app_name: "ytrecap".to_string(),
        };

        let strategy =
            Strategy::new(args).map_err(|_| anyhow::anyhow!("Could not determine system paths"))?;

        let config_dir = strategy.config_dir();
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("failed to create config dir: {}", config_dir.display()))?;

        let out_dir = out.map(Path::to_path_buf).unwrap_or_else(|| strategy.data_dir());

        Self::with_out_dir(config_dir.join("config.json"), out_dir)
    }

    /// Lays out the output tree under `out_dir`, creating directories as needed.
    pub fn with_out_dir(config_file: PathBuf, out_dir: PathBuf) -> Result<Self> {
        let raw_dir = out_dir.join("raw");
        fs::create_dir_all(&raw_dir)
            .with_context(|| format!("failed to create raw data dir: {}", raw_dir.display()))?;

        let cache_dir = out_dir.join("cache");
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

        Ok(Self {
            config_file,
            lock_file: cache_dir.join(".lock"),
            urls_file: out_dir.join("urls.txt"),
            report_file: out_dir.join("report.html"),
            raw_dir,
            cache_dir,
            out_dir,
        })
    }
}
