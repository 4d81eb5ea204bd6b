use crate::error::{Result, TracerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 接続先を上書きする環境変数
pub const HOST_ENV: &str = "TRACER_HOST";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// QRシンボルの一辺（px）
    pub qr_size: u32,
    /// ラベルの最大文字数（超えたら省略記号）
    pub label_max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;

        // 環境変数を優先
        if let Ok(host) = std::env::var(HOST_ENV) {
            if !host.trim().is_empty() {
                config.base_url = host;
            }
        }

        Ok(config)
    }

    /// ファイルから読む。壊れていれば既定値（`config --set-base-url` で上書きして直せる）
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default_config());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
                Ok(Self::default_config())
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| TracerError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("tracer"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            base_url: "http://localhost:9998/api".into(),
            timeout_seconds: 30,
            qr_size: 150,
            label_max_chars: 30,
        }
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TracerError::Config(format!("URLが不正です: {}", url)));
        }
        self.base_url = url;
        self.save()
    }
}
