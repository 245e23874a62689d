//! Preview and download of captured photos.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::compositor::EncodedImage;
use crate::error::{OptionExt, PhotoboothError, PhotoboothResult};

/// File name used for downloads.
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "captured-photo.png";

/// Give up looking for a free name after this many suffixes.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Data URI that can be used directly as an `<img>` source.
pub fn to_preview_source(image: &EncodedImage) -> String {
    format!(
        "data:{};base64,{}",
        EncodedImage::MIME_TYPE,
        BASE64.encode(&image.png)
    )
}

/// The user's download directory, or the working directory if unknown.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Save the PNG bytes as `filename` inside `dir`.
///
/// Existing files are never overwritten: like a browser download, a
/// ` (1)`, ` (2)`, … suffix is added before the extension. Returns the path
/// written.
pub fn to_download(image: &EncodedImage, dir: &Path, filename: &str) -> PhotoboothResult<PathBuf> {
    validate_filename(filename)?;
    std::fs::create_dir_all(dir)?;

    let (stem, extension) = split_filename(filename)?;
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = match (attempt, extension) {
            (0, _) => filename.to_string(),
            (n, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
            (n, None) => format!("{} ({})", stem, n),
        };
        let path = dir.join(&candidate);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                write_new_file(file, &path, &image.png)?;
                log::info!(
                    "[EXPORT] Saved {}x{} photo to {:?} ({} bytes)",
                    image.width,
                    image.height,
                    path,
                    image.png.len()
                );
                return Ok(path);
            },
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(PhotoboothError::Other(format!(
        "no free file name for '{}' in {:?}",
        filename, dir
    )))
}

/// Write `bytes` into a freshly created file, removing it if the write fails.
fn write_new_file<W: Write>(mut file: W, path: &Path, bytes: &[u8]) -> PhotoboothResult<()> {
    let written = file.write_all(bytes).and_then(|_| file.flush());
    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = std::fs::remove_file(path) {
            log::warn!("[EXPORT] Could not remove partial file {:?}: {}", path, remove_err);
        }
        return Err(e.into());
    }
    Ok(())
}

fn validate_filename(filename: &str) -> PhotoboothResult<()> {
    let path = Path::new(filename);
    let plain = !filename.trim().is_empty()
        && path.file_name().map(|n| n == path.as_os_str()).unwrap_or(false);
    if plain {
        Ok(())
    } else {
        Err(PhotoboothError::Other(format!(
            "invalid download file name: '{}'",
            filename
        )))
    }
}

/// Split into stem and optional extension; `photo.final.png` → (`photo.final`, `png`).
fn split_filename(filename: &str) -> PhotoboothResult<(&str, Option<&str>)> {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("download file name has no stem")?;
    Ok((stem, path.extension().and_then(|e| e.to_str())))
}
