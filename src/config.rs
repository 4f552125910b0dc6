use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::ramhog::RamHogParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ramhog_n: u32,
    pub ramhog_chunks_per_pad: u32,
    pub ramhog_iterations: u32,
    pub txinfo_db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        let params = RamHogParams::default();
        Self {
            ramhog_n: params.n,
            ramhog_chunks_per_pad: params.chunks_per_pad,
            ramhog_iterations: params.iterations,
            txinfo_db_path: "txinfo.sqlite".to_string(),
        }
    }
}

impl Config {
    pub fn ramhog_params(&self) -> RamHogParams {
        RamHogParams {
            n: self.ramhog_n,
            chunks_per_pad: self.ramhog_chunks_per_pad,
            iterations: self.ramhog_iterations,
        }
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ramhog-txinfo")
        .join("config.json")
}

pub fn load_config(path: &std::path::Path) -> Result<Config> {
    let data = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&data)?;
    Ok(config)
}

pub fn save_config(config: &Config, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data)?;
    Ok(())
}
