//! チェックイン用スキャンセッション
//!
//! スキャンイベント → 分類 → 状態遷移 → 確認 → `POST /write` → リセット
//!
//! ## エラーの扱い
//! - 「コードなし」・読み取り崩れの行: 完全に無視
//! - 分類できないペイロード: debugログのみ
//! - 入力源の致命的エラー: 1回だけ表示してセッション終了
//! - 書き込み失敗: 表示・ログ出力し、状態はリセットしてスキャン続行（401のみ終了）

mod source;

pub use source::{LineSource, ScanSource};

use crate::api::ApiClient;
use crate::error::{Result, TracerError};
use crate::session::Session;
use chrono::{DateTime, Local};
use tracer_common::{classify, CheckIn, Classification, PendingCheckIn, ScanEvent, WriteRequest};

/// 確認ダイアログ
pub trait Confirm {
    fn confirm(&mut self, pending: &PendingCheckIn) -> bool;
}

/// 常に確定する（`--yes`）
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _pending: &PendingCheckIn) -> bool {
        true
    }
}

/// 端末で確認する
pub struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&mut self, pending: &PendingCheckIn) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(format!(
                "Confirm  rental: {}  student: {}",
                pending.rental, pending.student
            ))
            .default(true)
            .interact()
            .unwrap_or(false)
    }
}

/// ログの書き込み先
#[allow(async_fn_in_trait)]
pub trait CheckInWriter {
    async fn write(&self, entry: &WriteRequest) -> Result<String>;
}

/// バックエンドへの書き込み
pub struct BackendWriter<'a> {
    pub client: &'a ApiClient,
    pub session: &'a Session,
}

impl CheckInWriter for BackendWriter<'_> {
    async fn write(&self, entry: &WriteRequest) -> Result<String> {
        self.client.write(self.session, entry).await
    }
}

/// 送信用リクエストを組み立てる
pub fn build_write_request(pending: &PendingCheckIn, now: DateTime<Local>) -> WriteRequest {
    WriteRequest {
        rental: pending.rental.clone(),
        student: pending.encoded_student(),
        date: now.format("%m/%d/%Y").to_string(),
        time: now.format("%H:%M:%S").to_string(),
    }
}

/// セッション集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub submitted: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub ignored: usize,
}

/// スキャンセッション
///
/// 入力源はセッションが所有し、終了時（drop含む）に必ず停止する。
pub struct ScanSession<S: ScanSource> {
    source: Option<S>,
    state: CheckIn,
    summary: ScanSummary,
}

impl<S: ScanSource> ScanSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            state: CheckIn::new(),
            summary: ScanSummary::default(),
        }
    }

    pub fn state(&self) -> &CheckIn {
        &self.state
    }

    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// 入力源を停止して手放す
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
    }

    /// 1イベントを処理する。確定待ちになったら `true`
    pub fn handle_event(&mut self, event: ScanEvent) -> Result<bool> {
        match event {
            ScanEvent::NoCode => Ok(false),
            ScanEvent::Failed(message) => {
                self.stop();
                Err(TracerError::Scanner(message))
            }
            ScanEvent::Decoded(payload) => {
                match classify(&payload) {
                    Some(scan) => {
                        match &scan {
                            Classification::RentalId(id) => println!("  rental:  {}", id),
                            Classification::StudentEncoded { name, .. } => println!("  student: {}", name),
                        }
                        self.state.apply(scan);
                    }
                    None => {
                        self.summary.ignored += 1;
                        tracing::debug!(payload = %payload, "ignored scan payload");
                    }
                }
                Ok(self.state.is_complete())
            }
        }
    }

    /// 確定待ちのチェックインを確認・送信し、状態をリセットする
    ///
    /// 再リンクが必要なエラーだけは入力源を止めて呼び出し元に返す。
    pub async fn settle<C: Confirm, W: CheckInWriter>(&mut self, confirm: &mut C, writer: &W) -> Result<()> {
        let Some(pending) = self.state.pending().cloned() else {
            return Ok(());
        };

        if !confirm.confirm(&pending) {
            self.state.cancel();
            self.summary.cancelled += 1;
            println!("  cancelled");
            return Ok(());
        }

        // ここで状態は空になる（送信結果に関わらず）
        let Some(pending) = self.state.confirm() else {
            return Ok(());
        };
        let entry = build_write_request(&pending, Local::now());
        match writer.write(&entry).await {
            Ok(message) => {
                self.summary.submitted += 1;
                println!("✔ {} → {} {}", pending.rental, pending.student, message);
            }
            Err(e) => {
                self.summary.failed += 1;
                tracing::error!(rental = %pending.rental, error = %e, "check-in write failed");
                if e.needs_relink() {
                    self.stop();
                    return Err(e);
                }
                println!("✘ {}", e);
            }
        }
        Ok(())
    }

    /// 入力が尽きるまで処理する
    pub async fn run<C: Confirm, W: CheckInWriter>(&mut self, confirm: &mut C, writer: &W) -> Result<ScanSummary> {
        loop {
            let event = match self.source.as_mut().and_then(|s| s.next_event()) {
                Some(event) => event,
                None => break,
            };

            if self.handle_event(event)? {
                self.settle(confirm, writer).await?;
            }
        }
        self.stop();
        Ok(self.summary.clone())
    }
}

impl<S: ScanSource> Drop for ScanSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
