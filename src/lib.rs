//! tracer: レンタル機器チェックイン用クライアント
//!
//! - `scanner`: スキャン → 分類 → 確認 → ログ書き込み
//! - `render` / `export`: QR画像の一括生成とZIP出力
//! - `api` / `session`: バックエンドRESTクライアントと認証トークン

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod render;
pub mod scanner;
pub mod session;
