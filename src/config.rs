use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// 設定ディレクトリを上書きする環境変数。
pub const HOME_ENV: &str = "TIME_WEALTH_HOME";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// blobを保存するディレクトリ。
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    /// `config_dir/config.toml`を読み込む。存在しない場合は既定値で作成する。
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            let default_config = Self::default_with_dir(config_dir);
            default_config.save(config_dir)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir).context("Failed to create config directory")?;
        let config_path = config_dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// ログレベル。解釈できない値の場合は`Info`。
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    fn default_with_dir(config_dir: &Path) -> Self {
        Self {
            data_dir: config_dir.join("data"),
            log_level: "info".to_string(),
        }
    }
}

/// 設定ディレクトリを返す。
///
/// 優先順位は 引数 > 環境変数`TIME_WEALTH_HOME` > `~/.time-wealth`。
pub fn get_config_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".time-wealth"))
}
