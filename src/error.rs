use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("No authentication token found. Please link this device with `tracer link <KEY>`.")]
    NotLinked,

    #[error("Session expired or invalid. Please link this device again with `tracer link <KEY>`.")]
    Unauthorized,

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("QRコード生成エラー: {0}")]
    QrEncode(String),

    #[error("画像生成エラー: {0}")]
    ImageEncode(String),

    #[error("ZIP生成エラー: {0}")]
    Zip(String),

    #[error("スキャナエラー: {0}")]
    Scanner(String),

    #[error("{0}")]
    Input(#[from] tracer_common::InputError),

    #[error(transparent)]
    Common(#[from] tracer_common::Error),
}

impl TracerError {
    /// 再リンクが必要なエラーか
    pub fn needs_relink(&self) -> bool {
        matches!(self, TracerError::NotLinked | TracerError::Unauthorized)
    }
}

impl From<reqwest::Error> for TracerError {
    fn from(e: reqwest::Error) -> Self {
        TracerError::Network(e.to_string())
    }
}

impl From<zip::result::ZipError> for TracerError {
    fn from(e: zip::result::ZipError) -> Self {
        TracerError::Zip(e.to_string())
    }
}

impl From<image::ImageError> for TracerError {
    fn from(e: image::ImageError) -> Self {
        TracerError::ImageEncode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TracerError>;
