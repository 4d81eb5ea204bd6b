//! チェックインの状態遷移
//!
//! ```text
//! Idle ──rental──▶ PartialRental ──student──▶ Complete
//!   └───student──▶ PartialStudent ──rental──▶ Complete
//! Complete ──confirm / cancel──▶ Idle
//! ```
//!
//! 片側だけ埋まった状態で送信されることはない。

use crate::classifier::Classification;
use crate::codec::encode_student;

/// 確認待ちのチェックイン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheckIn {
    pub rental: String,
    pub student: String,
}

impl PendingCheckIn {
    /// 送信用にBase64化した学生名
    pub fn encoded_student(&self) -> String {
        encode_student(&self.student)
    }
}

/// チェックインセッションの状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckIn {
    #[default]
    Idle,
    PartialRental { rental: String },
    PartialStudent { student: String },
    Complete(PendingCheckIn),
}

impl CheckIn {
    pub fn new() -> Self {
        Self::Idle
    }

    /// 分類済みスキャンを反映する
    ///
    /// 同じ枠の再スキャンは上書き。`Complete` 中のスキャンは確認が終わるまで無視する。
    pub fn apply(&mut self, scan: Classification) {
        let current = std::mem::take(self);
        *self = match (current, scan) {
            (Self::Complete(pending), _) => {
                tracing::debug!("scan ignored while awaiting confirmation");
                Self::Complete(pending)
            }
            (Self::Idle | Self::PartialRental { .. }, Classification::RentalId(rental)) => {
                Self::PartialRental { rental }
            }
            (Self::Idle | Self::PartialStudent { .. }, Classification::StudentEncoded { name, .. }) => {
                Self::PartialStudent { student: name }
            }
            (Self::PartialRental { rental }, Classification::StudentEncoded { name, .. }) => {
                Self::Complete(PendingCheckIn { rental, student: name })
            }
            (Self::PartialStudent { student }, Classification::RentalId(rental)) => {
                Self::Complete(PendingCheckIn { rental, student })
            }
        };
    }

    /// 確認待ちのチェックイン（`Complete` の時のみ）
    pub fn pending(&self) -> Option<&PendingCheckIn> {
        match self {
            Self::Complete(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub fn rental(&self) -> Option<&str> {
        match self {
            Self::PartialRental { rental } => Some(rental),
            Self::Complete(p) => Some(&p.rental),
            _ => None,
        }
    }

    pub fn student(&self) -> Option<&str> {
        match self {
            Self::PartialStudent { student } => Some(student),
            Self::Complete(p) => Some(&p.student),
            _ => None,
        }
    }

    /// 確定: 送信対象を取り出して `Idle` に戻す
    ///
    /// 送信の成否に関わらず状態はここで空になる。
    pub fn confirm(&mut self) -> Option<PendingCheckIn> {
        match std::mem::take(self) {
            Self::Complete(pending) => Some(pending),
            other => {
                *self = other;
                None
            }
        }
    }

    /// 取消: 書き込みせずに `Idle` に戻す
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }
}
