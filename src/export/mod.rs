//! QR画像の書き出し
//!
//! - ZIP一括: 1件1PNG、ファイル名はラベルを `[A-Za-z0-9_]` に置換したもの
//! - 単体: data URL をデコードして独立したPNGファイルにする

use crate::error::Result;
use crate::render::RenderedQr;
use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 既定のZIPファイル名
pub const ZIP_FILE_NAME: &str = "tracer-qrcodes.zip";

/// ラベルをファイル名に使える形にする（英数字以外は `_`）
pub fn sanitize_file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// 全件分のPNGファイル名を作る（衝突したら `_2`, `_3` ... を付ける）
pub fn png_file_names<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut used = HashSet::new();
    labels
        .into_iter()
        .map(|label| {
            let stem = sanitize_file_stem(label);
            let mut name = format!("{}.png", stem);
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{}_{}.png", stem, n);
                n += 1;
            }
            name
        })
        .collect()
}

fn write_archive<W: Write + Seek>(writer: W, images: &[RenderedQr]) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let names = png_file_names(images.iter().map(|i| i.label.as_str()));
    for (image, name) in images.iter().zip(names) {
        let png = image.png_bytes()?;
        zip.start_file(name, options)?;
        zip.write_all(&png)?;
    }

    Ok(zip.finish()?)
}

/// ZIPをメモリ上に作る
pub fn zip_bytes(images: &[RenderedQr]) -> Result<Vec<u8>> {
    let cursor = write_archive(Cursor::new(Vec::new()), images)?;
    Ok(cursor.into_inner())
}

/// ZIPファイルに書き出す
///
/// `output` がディレクトリ（または拡張子なし）なら `tracer-qrcodes.zip` をその中に作る。
pub fn write_zip(images: &[RenderedQr], output: &Path) -> Result<PathBuf> {
    let path = zip_output_path(output);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(&path)?;
    write_archive(file, images)?;
    tracing::info!(path = %path.display(), count = images.len(), "zip written");
    Ok(path)
}

fn zip_output_path(output: &Path) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(ZIP_FILE_NAME)
    } else {
        output.to_path_buf()
    }
}

/// 1枚を独立したPNGとして書き出す
pub fn write_image(image: &RenderedQr, dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, image.png_bytes()?)?;
    Ok(path)
}

/// 全件を個別PNGとして書き出す
pub fn write_images(images: &[RenderedQr], dir: &Path) -> Result<Vec<PathBuf>> {
    let names = png_file_names(images.iter().map(|i| i.label.as_str()));
    images
        .iter()
        .zip(names)
        .map(|(image, name)| write_image(image, dir, &name))
        .collect()
}
