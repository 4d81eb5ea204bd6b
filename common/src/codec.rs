//! 学生名のBase64コーデック
//!
//! 学生用QRコードには名前をBase64化した文字列を埋め込む。
//! スキャン時はその逆変換でUTF-8の表示名に戻す。

use crate::error::{Error, Result};
use base64::alphabet;
use base64::engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

/// パディングの有無を問わずデコードするエンジン
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 表示名をQR埋め込み用にエンコード
pub fn encode_student(name: &str) -> String {
    general_purpose::STANDARD.encode(name.as_bytes())
}

/// QRペイロードを表示名にデコード
pub fn decode_student(payload: &str) -> Result<String> {
    let bytes = LENIENT
        .decode(payload)
        .map_err(|e| Error::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Decode(e.to_string()))
}
