//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// 入力検証エラー
///
/// 画面上のインラインメッセージに相当する。操作は実行されない。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Label cannot be empty.")]
    EmptyLabel,

    #[error("Nothing to import.")]
    NothingToImport,

    #[error("All entries already exist.")]
    AllEntriesExist,

    #[error("No base provided.")]
    MissingBase,

    #[error("Numbers cannot be negative.")]
    NegativeBound,

    #[error("Start cannot be greater than end.")]
    StartAfterEnd,

    #[error("End cannot be 0.")]
    EndIsZero,

    #[error("Range too large: {0} entries (max {1}).")]
    RangeTooLarge(u64, u64),

    #[error("No entry at position {0}.")]
    NoSuchEntry(usize),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
