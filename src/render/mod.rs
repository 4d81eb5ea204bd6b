//! QR画像の生成
//!
//! 1件ごとに QRシンボル（正方形）+ 下部ラベル を1枚のPNGに合成し、
//! data URL として保持する。バッチは入力順に1件ずつ処理する。

pub mod font;

use crate::config::Config;
use crate::error::{Result, TracerError};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use indicatif::{ProgressBar, ProgressStyle};
use qrcode::{Color, QrCode};
use std::io::Cursor;
use tracer_common::QrItem;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// QRシンボル周囲の余白（モジュール数）
const QUIET_ZONE: usize = 1;
/// ラベル帯の高さ（px）
const LABEL_BAND: u32 = 19;
/// QR下端からラベル上端まで（px）
const LABEL_OFFSET: u32 = 6;
/// 省略記号付きで残す文字数の差分
const ELLIPSIS_RESERVE: usize = 3;

/// 描画設定
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub qr_size: u32,
    pub label_max_chars: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            qr_size: 150,
            label_max_chars: 30,
        }
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            qr_size: config.qr_size,
            label_max_chars: config.label_max_chars,
        }
    }
}

/// 描画済みQR画像
#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub label: String,
    pub data_url: String,
}

impl RenderedQr {
    /// data URL をPNGバイト列に戻す
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        decode_data_url(&self.data_url)
    }
}

/// 長いラベルを省略記号付きで切り詰める
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS_RESERVE);
    let mut out: String = label.chars().take(keep).collect();
    out.push('…');
    out
}

/// ラベルを設定上限とキャンバス幅の両方に収める
pub fn fit_label(label: &str, max_chars: usize, canvas_width: u32) -> String {
    truncate_label(label, max_chars.min(font::chars_fitting(canvas_width)))
}

/// QRシンボルを一辺 `size` px で描く
pub fn qr_symbol(data: &str, size: u32) -> Result<RgbImage> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| TracerError::QrEncode(e.to_string()))?;
    let width = code.width();
    let total = width + 2 * QUIET_ZONE;
    let size = size.max(total as u32);

    let mut img = RgbImage::from_pixel(size, size, WHITE);
    for py in 0..size {
        let my = (py as usize * total / size as usize).checked_sub(QUIET_ZONE);
        for px in 0..size {
            let mx = (px as usize * total / size as usize).checked_sub(QUIET_ZONE);
            if let (Some(x), Some(y)) = (mx, my) {
                if x < width && y < width && code[(x, y)] == Color::Dark {
                    img.put_pixel(px, py, BLACK);
                }
            }
        }
    }
    Ok(img)
}

/// 中央揃えで文字列を描く（キャンバス外ははみ出し分を切る）
fn draw_text_centered(img: &mut RgbImage, text: &str, center_x: u32, top: u32) {
    let width = font::text_width(text) as i64;
    let mut x = center_x as i64 - width / 2;
    for c in text.chars() {
        let glyph = font::glyph(c);
        for (col, bits) in glyph.iter().enumerate() {
            for row in 0..font::GLYPH_HEIGHT {
                if (bits >> row) & 1 == 0 {
                    continue;
                }
                let px = x + col as i64;
                let py = (top + row) as i64;
                if px >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                    img.put_pixel(px as u32, py as u32, BLACK);
                }
            }
        }
        x += font::ADVANCE as i64;
    }
}

/// QR + ラベルを合成したキャンバス
pub fn compose(item: &QrItem, options: &RenderOptions) -> Result<RgbImage> {
    let symbol = qr_symbol(item.data(), options.qr_size)?;
    let size = symbol.width();

    let mut canvas = RgbImage::from_pixel(size, size + LABEL_BAND, WHITE);
    image::imageops::replace(&mut canvas, &symbol, 0, 0);

    let label = fit_label(item.label(), options.label_max_chars, size);
    draw_text_centered(&mut canvas, &label, size / 2, size + LABEL_OFFSET);
    Ok(canvas)
}

pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

pub fn to_data_url(png: &[u8]) -> String {
    format!("{}{}", DATA_URL_PREFIX, general_purpose::STANDARD.encode(png))
}

/// data URL（`data:...;base64,XXXX`）の本体をデコードする
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let (_, payload) = data_url
        .split_once(',')
        .ok_or_else(|| TracerError::ImageEncode("data URLの形式が不正です".into()))?;
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| TracerError::ImageEncode(e.to_string()))
}

/// 1件を描画
pub fn render_item(item: &QrItem, options: &RenderOptions) -> Result<RenderedQr> {
    let canvas = compose(item, options)?;
    let png = encode_png(&canvas)?;
    Ok(RenderedQr {
        label: item.label().to_string(),
        data_url: to_data_url(&png),
    })
}

/// バッチ描画（入力順・逐次）
///
/// 失敗した項目は警告を出して飛ばし、残りは続行する。
pub fn render_batch(items: &[QrItem], options: &RenderOptions, show_progress: bool) -> Vec<RenderedQr> {
    let pb = if show_progress {
        let pb = ProgressBar::new(items.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("  {bar:30} {pos}/{len} {msg}") {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut rendered = Vec::with_capacity(items.len());
    for item in items {
        pb.set_message(item.label().to_string());
        match render_item(item, options) {
            Ok(r) => rendered.push(r),
            Err(e) => tracing::warn!(label = item.label(), error = %e, "skipping QR item"),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 30), "short");
        let exact = "x".repeat(30);
        assert_eq!(truncate_label(&exact, 30), exact);
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let cut = truncate_label(long, 30);
        assert_eq!(cut.chars().count(), 28);
        assert!(cut.ends_with('…'));
        assert!(cut.starts_with("abcdefghijklmnopqrstuvwxyz0"));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let label = "佐".repeat(31);
        let cut = truncate_label(&label, 30);
        assert_eq!(cut.chars().count(), 28);
    }

    #[test]
    fn test_fit_label_stays_inside_canvas() {
        let label = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123"; // 30文字
        let fitted = fit_label(label, 30, 150);
        assert!(fitted.ends_with('…'));
        assert!(font::text_width(&fitted) <= 150);

        // 収まるものはそのまま
        assert_eq!(fit_label("SF12-3", 30, 150), "SF12-3");
        // 設定上限の方が小さければそちらに従う
        assert_eq!(fit_label("abcdefghij", 8, 150), "abcde…");
    }

    #[test]
    fn test_long_label_leaves_edge_columns_blank() {
        let item = QrItem::new("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123", false);
        let canvas = compose(&item, &RenderOptions::default()).unwrap();
        for y in 150..150 + LABEL_BAND {
            assert_eq!(*canvas.get_pixel(0, y), WHITE);
        }
    }

    #[test]
    fn test_qr_symbol_size_and_finder() {
        let img = qr_symbol("SF12-3", 150).unwrap();
        assert_eq!(img.dimensions(), (150, 150));
        // 余白は白、左上のファインダパターン内は黒
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(12, 12), BLACK);
    }

    #[test]
    fn test_compose_dimensions() {
        let item = QrItem::new("Jane Doe", true);
        let canvas = compose(&item, &RenderOptions::default()).unwrap();
        assert_eq!(canvas.dimensions(), (150, 150 + LABEL_BAND));

        let band_has_ink = (150..150 + LABEL_BAND)
            .any(|y| (0..150).any(|x| *canvas.get_pixel(x, y) == BLACK));
        assert!(band_has_ink, "label was not drawn");
    }

    #[test]
    fn test_render_item_data_url() {
        let item = QrItem::new("CAM-1", false);
        let rendered = render_item(&item, &RenderOptions::default()).unwrap();
        assert!(rendered.data_url.starts_with(DATA_URL_PREFIX));
        let png = rendered.png_bytes().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_decode_data_url_rejects_garbage() {
        assert!(decode_data_url("no comma here").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_render_batch_skips_failures_and_keeps_order() {
        let too_long = "x".repeat(8000);
        let items = vec![
            QrItem::new("A-1", false),
            QrItem::new(too_long, false),
            QrItem::new("A-2", false),
        ];
        let rendered = render_batch(&items, &RenderOptions::default(), false);
        let labels: Vec<&str> = rendered.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["A-1", "A-2"]);
    }
}
