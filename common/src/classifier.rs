//! スキャンペイロードの分類
//!
//! - レンタルID: `AB12-34` のような「英数字 + ハイフン + 数字」
//! - 学生: Base64化された名前
//!
//! どちらにも当てはまらないペイロードはカメラノイズとして捨てる。

use crate::codec::decode_student;
use regex::Regex;

lazy_static::lazy_static! {
    static ref RENTAL_RE: Regex = Regex::new(r"\b\w{1,6}\d{0,4}-\d+\b").unwrap();
    static ref BASE64_RE: Regex = Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").unwrap();
}

/// 分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// レンタル品の識別子
    RentalId(String),
    /// Base64化された学生名（デコード済み）
    StudentEncoded { raw: String, name: String },
}

/// スキャナから届くイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// デコード成功
    Decoded(String),
    /// フレーム内にコードがない（完全に無視する）
    NoCode,
    /// カメラ権限・デバイス不在などの致命的エラー
    Failed(String),
}

/// レンタルIDのパターンに一致するか
pub fn is_rental_id(payload: &str) -> bool {
    RENTAL_RE.is_match(payload)
}

/// Base64アルファベットのパターンに一致するか
pub fn is_base64_shaped(payload: &str) -> bool {
    BASE64_RE.is_match(payload)
}

/// ペイロードを分類する
///
/// レンタルIDを優先し、次にBase64を試す。
/// デコードできない、または空になるペイロードは `None`。
pub fn classify(payload: &str) -> Option<Classification> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    if is_rental_id(payload) {
        return Some(Classification::RentalId(payload.to_string()));
    }

    if !is_base64_shaped(payload) {
        tracing::debug!(payload, "payload matches no known pattern");
        return None;
    }

    match decode_student(payload) {
        Ok(name) if !name.trim().is_empty() => Some(Classification::StudentEncoded {
            raw: payload.to_string(),
            name,
        }),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(payload, error = %e, "discarding undecodable payload");
            None
        }
    }
}
