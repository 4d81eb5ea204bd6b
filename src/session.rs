//! 認証セッション
//!
//! `link` で取得したトークンを保持し、認証付きAPI呼び出しに明示的に渡す。
//! - 初期化: link成功時に保存
//! - 破棄: unlink、またはAPIが401を返した時

use crate::config::Config;
use crate::error::{Result, TracerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// セッションファイルの場所を上書きする環境変数
pub const SESSION_FILE_ENV: &str = "TRACER_SESSION_FILE";

/// 認証済みセッション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// セッションの永続化先
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 既定の保存先（環境変数 > `~/.config/tracer/session.json`）
    pub fn default_location() -> Result<Self> {
        if let Ok(path) = std::env::var(SESSION_FILE_ENV) {
            if !path.trim().is_empty() {
                return Ok(Self::new(path));
            }
        }
        Ok(Self::new(Config::config_dir()?.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// セッションを読み込む。未リンクなら `NotLinked`
    pub fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            return Err(TracerError::NotLinked);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let session: Session = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable session file");
                return Err(TracerError::NotLinked);
            }
        };
        if session.token.trim().is_empty() {
            return Err(TracerError::NotLinked);
        }
        Ok(session)
    }

    pub fn is_linked(&self) -> bool {
        self.load().is_ok()
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// セッションを破棄する。削除したら `true`
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            tracing::info!(path = %self.path.display(), "session cleared");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
