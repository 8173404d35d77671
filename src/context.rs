use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;

use crate::config::Config;
use crate::storage::FileBlobStore;
use crate::store::Store;

/// 設定・ファイルストア・ストアをまとめたアプリケーションの文脈。
pub struct AppContext {
    pub config: Config,
    pub config_dir: PathBuf,
    pub store: Store<FileBlobStore>,
}

impl AppContext {
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config = Config::load(config_dir)?;
        Ok(Self::with_config(config, config_dir))
    }

    pub fn with_config(config: Config, config_dir: &Path) -> Self {
        info!("Loading data from {}", config.data_dir.display());
        let store = Store::load(FileBlobStore::new(&config.data_dir));

        Self {
            config,
            config_dir: config_dir.to_path_buf(),
            store,
        }
    }
}
