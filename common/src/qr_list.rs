//! QRコード生成リスト
//!
//! ラベルの順序付き・重複なしリスト。入力経路は3つ:
//! - 単体追加
//! - 貼り付け（1行1件）
//! - 連番生成（`base-N`）

use crate::codec::encode_student;
use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 連番生成で一度に作れる最大件数
pub const MAX_RANGE_ITEMS: u64 = 10_000;

/// エンコード方式（学生: Base64 / 機器: そのまま）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    #[default]
    Student,
    Device,
}

impl EncodingMode {
    pub fn encodes(&self) -> bool {
        matches!(self, EncodingMode::Student)
    }
}

impl std::str::FromStr for EncodingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" | "s" => Ok(EncodingMode::Student),
            "device" | "rental" | "d" => Ok(EncodingMode::Device),
            _ => Err(format!("Unknown mode: {}. Use student or device", s)),
        }
    }
}

impl std::fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingMode::Student => write!(f, "student"),
            EncodingMode::Device => write!(f, "device"),
        }
    }
}

/// QRコード1件
///
/// `data` は常に `(label, encoding)` から導出される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrItem {
    label: String,
    data: String,
    encoding: bool,
}

impl QrItem {
    pub fn new(label: impl Into<String>, encoding: bool) -> Self {
        let label = label.into();
        let data = if encoding {
            encode_student(&label)
        } else {
            label.clone()
        };
        Self { label, data, encoding }
    }

    /// 人が読むための元テキスト
    pub fn label(&self) -> &str {
        &self.label
    }

    /// QRシンボルに埋め込む値
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn encoding(&self) -> bool {
        self.encoding
    }
}

/// QRコード生成リスト
#[derive(Debug, Clone, Default)]
pub struct QrList {
    items: Vec<QrItem>,
    mode: EncodingMode,
}

impl QrList {
    pub fn new(mode: EncodingMode) -> Self {
        Self { items: Vec::new(), mode }
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// 以降に追加する項目のエンコード方式を切り替える（既存項目はそのまま）
    pub fn set_mode(&mut self, mode: EncodingMode) {
        self.mode = mode;
    }

    pub fn items(&self) -> &[QrItem] {
        &self.items
    }

    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.items.iter().any(|i| i.label == label)
    }

    /// 単体追加
    ///
    /// 追加されたら `true`、既に存在すれば `false`。
    pub fn add_manual(&mut self, input: &str) -> Result<bool, InputError> {
        let label = input.trim();
        if label.is_empty() {
            return Err(InputError::EmptyLabel);
        }
        if self.contains(label) {
            return Ok(false);
        }
        self.push(label.to_string());
        Ok(true)
    }

    /// 貼り付けテキストを取り込む（1行1件）
    ///
    /// 戻り値は追加件数。
    pub fn import_paste(&mut self, text: &str) -> Result<usize, InputError> {
        if text.trim().is_empty() {
            return Err(InputError::NothingToImport);
        }

        let mut existing: HashSet<&str> = self.items.iter().map(|i| i.label.as_str()).collect();
        let new_labels: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| existing.insert(*line))
            .map(str::to_string)
            .collect();

        if new_labels.is_empty() {
            return Err(InputError::AllEntriesExist);
        }

        let count = new_labels.len();
        for label in new_labels {
            self.push(label);
        }
        Ok(count)
    }

    /// 連番生成（`base-start` 〜 `base-end`、両端含む）
    ///
    /// 戻り値は追加件数。既存ラベルはスキップ。
    pub fn generate_range(&mut self, base: &str, start: i64, end: i64) -> Result<usize, InputError> {
        let labels = range_labels(base, start, end)?;
        let mut added = 0;
        for label in labels {
            if !self.contains(&label) {
                self.push(label);
                added += 1;
            }
        }
        Ok(added)
    }

    /// 位置指定で削除
    pub fn remove(&mut self, index: usize) -> Result<QrItem, InputError> {
        if index >= self.items.len() {
            return Err(InputError::NoSuchEntry(index));
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn push(&mut self, label: String) {
        self.items.push(QrItem::new(label, self.mode.encodes()));
    }
}

/// 連番ラベルを生成する
pub fn range_labels(base: &str, start: i64, end: i64) -> Result<Vec<String>, InputError> {
    let base = base.trim();
    if base.is_empty() {
        return Err(InputError::MissingBase);
    }
    if start < 0 || end < 0 {
        return Err(InputError::NegativeBound);
    }
    if end < start {
        return Err(InputError::StartAfterEnd);
    }
    if end == 0 {
        return Err(InputError::EndIsZero);
    }

    let count = (end - start) as u64 + 1;
    if count > MAX_RANGE_ITEMS {
        return Err(InputError::RangeTooLarge(count, MAX_RANGE_ITEMS));
    }

    Ok((start..=end).map(|n| format!("{}-{}", base, n)).collect())
}
