use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracer_common::EncodingMode;

#[derive(Parser)]
#[command(name = "tracer")]
#[command(about = "レンタル機器チェックイン用クライアント（QRスキャン・QR一括生成）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ペアリングキーでこの端末をリンク
    Link {
        /// ペアリングキー
        #[arg(required = true)]
        key: String,
    },

    /// リンクを解除（保存済みトークンを削除）
    Unlink,

    /// QRスキャンでレンタル品と学生を紐付けてログを記録
    Scan {
        /// スキャン結果の入力ファイル（省略時は標準入力、1行1件）
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// 確認なしで送信
        #[arg(short, long)]
        yes: bool,
    },

    /// 貸出・返却ログを表示
    Logs,

    /// レンタル品の状態を表示
    Status,

    /// レンタル品の登録/削除
    Rentals {
        #[command(subcommand)]
        action: RentalAction,
    },

    /// ログをCSVで保存
    ExportLogs {
        /// 出力ファイル
        #[arg(short, long, default_value = "logs.csv")]
        output: PathBuf,
    },

    /// ログを全削除
    ClearLogs {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },

    /// QRコードを一括生成してZIPに出力
    Qr {
        /// ラベル（1件ずつ）
        labels: Vec<String>,

        /// 貼り付け用テキストファイル（1行1件、`-` で標準入力）
        #[arg(short, long)]
        paste: Option<PathBuf>,

        /// 連番生成のベース文字列（`BASE-N`）
        #[arg(long, requires_all = ["start", "end"])]
        range_base: Option<String>,

        /// 連番の開始
        #[arg(long, requires = "end", allow_negative_numbers = true)]
        start: Option<i64>,

        /// 連番の終了（含む）
        #[arg(long, requires = "start", allow_negative_numbers = true)]
        end: Option<i64>,

        /// エンコード方式 (student/device)
        #[arg(short, long, default_value = "student")]
        mode: EncodingMode,

        /// 出力ZIP（ディレクトリ指定時は tracer-qrcodes.zip）
        #[arg(short, long, default_value = "tracer-qrcodes.zip")]
        output: PathBuf,

        /// 個別PNGの出力先ディレクトリ
        #[arg(long)]
        images: Option<PathBuf>,
    },

    /// スキャン結果を分類して表示（オフライン）
    Decode {
        #[arg(required = true)]
        payload: String,
    },

    /// 設定を表示/編集
    Config {
        /// 接続先URLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum RentalAction {
    /// レンタル品を登録（引数と/またはファイル、1行1件）
    Add {
        names: Vec<String>,

        /// 名前一覧ファイル
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// レンタル品を削除
    Remove {
        #[arg(required = true)]
        name: String,
    },
}

/// 連番生成の指定を取り出す
///
/// 範囲だけ指定されてベースがない場合も空ベースで返し、検証側で `No base provided.` にする。
pub fn range_request(base: Option<String>, start: Option<i64>, end: Option<i64>) -> Option<(String, i64, i64)> {
    match (start, end) {
        (Some(start), Some(end)) => Some((base.unwrap_or_default(), start, end)),
        _ => None,
    }
}
