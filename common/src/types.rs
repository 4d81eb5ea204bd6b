//! バックエンドAPIの型定義
//!
//! リクエストボディはラップせずフラットなJSONで送る。
//! - LinkRequest / LinkResponse: 端末リンク
//! - WriteRequest: 貸出・返却ログの書き込み
//! - LogEntry / RentalStatus: ダッシュボード表示

use serde::{Deserialize, Serialize};

/// `POST /link`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    pub token: String,
}

/// `POST /write`（studentはBase64）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub rental: String,
    pub student: String,
    pub date: String,
    pub time: String,
}

/// `POST /rentals/add`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalsAddRequest {
    pub rentals: Vec<String>,
}

/// `POST /rentals/remove`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalRemoveRequest {
    pub rental: String,
}

/// ログ1行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub id: i64,
    #[serde(alias = "device")]
    pub rental: String,
    pub action: String,
    pub student: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// レンタル品の貸出状態
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalStatus {
    pub id: i64,
    #[serde(alias = "device")]
    pub rental: String,
    pub status: String,
    pub renter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Vec<RentalStatus>,
}

/// 成功時の `{ "message": ... }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// 失敗時のボディ（`error` を優先し、なければ `message`）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    pub description: Option<String>,
}

impl ErrorBody {
    /// `error` → `message` → `description` の順で空でないものを返す
    pub fn best_message(&self) -> Option<&str> {
        [&self.error, &self.message, &self.description]
            .into_iter()
            .filter_map(|m| m.as_deref())
            .find(|m| !m.trim().is_empty())
    }
}

/// 改行区切りのレンタル名を整形（trim・空行除去・重複除去、順序維持）
pub fn parse_rental_names<'a, I>(inputs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    inputs
        .into_iter()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}
