//! スキャン入力源
//!
//! カメラ/デコーダの代わりに、デコード済みテキストを1行1件で受け取る。
//! キーボード型のハードウェアスキャナや、ファイル・パイプからの入力を想定。

use std::io::BufRead;
use tracer_common::ScanEvent;

/// スキャン入力源
///
/// `stop` 後は再利用しない。
pub trait ScanSource {
    /// 次のイベント。入力が尽きたら `None`
    fn next_event(&mut self) -> Option<ScanEvent>;

    /// 入力源を解放する
    fn stop(&mut self);
}

/// 行単位の入力源（空行は「コードなし」フレーム扱い）
pub struct LineSource<R: BufRead> {
    reader: Option<R>,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader: Some(reader) }
    }

    pub fn is_stopped(&self) -> bool {
        self.reader.is_none()
    }
}

impl<R: BufRead> ScanSource for LineSource<R> {
    fn next_event(&mut self) -> Option<ScanEvent> {
        let reader = self.reader.as_mut()?;
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                // 読み取り崩れの行はノイズ扱い（行は消費済みなので続行できる）
                let Ok(line) = std::str::from_utf8(&buf) else {
                    tracing::debug!(bytes = buf.len(), "discarding garbled scan line");
                    return Some(ScanEvent::NoCode);
                };
                let payload = line.trim_end_matches(['\r', '\n']);
                if payload.trim().is_empty() {
                    Some(ScanEvent::NoCode)
                } else {
                    Some(ScanEvent::Decoded(payload.to_string()))
                }
            }
            Err(e) => Some(ScanEvent::Failed(e.to_string())),
        }
    }

    fn stop(&mut self) {
        if self.reader.take().is_some() {
            tracing::debug!("scan source stopped");
        }
    }
}
