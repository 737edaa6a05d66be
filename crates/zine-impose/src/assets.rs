//! Image sources and the asset provider
//!
//! Images reach the compositor either as a managed asset id (looked up
//! through an [`AssetProvider`]) or as an inline `src` string: a data URI,
//! a local file path, or an http(s) URL when the `remote-images` feature
//! is enabled. Every load is awaited before a sheet is rasterized.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use image::RgbaImage;

use crate::model::ImageProperties;
use crate::types::WarningKind;

/// Storage for user-uploaded image assets, keyed by integer id
pub trait AssetProvider: Sync {
    /// Raw file bytes for `id`, or `None` when nothing is stored under it
    fn get_asset(&self, id: u64) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

impl AssetProvider for HashMap<u64, Vec<u8>> {
    fn get_asset(&self, id: u64) -> impl Future<Output = Option<Vec<u8>>> + Send {
        std::future::ready(self.get(&id).cloned())
    }
}

/// Provider with no assets; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetProvider for NoAssets {
    fn get_asset(&self, _id: u64) -> impl Future<Output = Option<Vec<u8>>> + Send {
        std::future::ready(None)
    }
}

/// Assets stored as files in one directory, named `<id>` or `<id>.<ext>`
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    dir: PathBuf,
}

impl DirectoryAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AssetProvider for DirectoryAssets {
    fn get_asset(&self, id: u64) -> impl Future<Output = Option<Vec<u8>>> + Send {
        let dir = self.dir.clone();
        async move {
            let stem = id.to_string();
            if let Ok(bytes) = tokio::fs::read(dir.join(&stem)).await {
                return Some(bytes);
            }

            let mut entries = tokio::fs::read_dir(&dir).await.ok()?;
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.file_stem().and_then(|s| s.to_str()) == Some(stem.as_str()) {
                    match tokio::fs::read(&path).await {
                        Ok(bytes) => return Some(bytes),
                        Err(e) => log::debug!("asset {} unreadable at {:?}: {}", id, path, e),
                    }
                }
            }
            None
        }
    }
}

/// A decoded raster ready for drawing (straight RGBA)
pub type DecodedImage = Arc<RgbaImage>;

/// Where an inline image `src` points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    DataUri(&'a str),
    Remote(&'a str),
    File(PathBuf),
}

impl<'a> ImageSource<'a> {
    pub fn classify(src: &'a str) -> Self {
        let trimmed = src.trim();
        if trimmed.starts_with("data:") {
            ImageSource::DataUri(trimmed)
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ImageSource::Remote(trimmed)
        } else {
            let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
            ImageSource::File(PathBuf::from(path))
        }
    }
}

/// Load and decode the image an image element refers to.
///
/// `assetId` takes precedence over `src`. The error is the warning the
/// compositor reports for the element.
pub async fn load_image<A: AssetProvider>(
    props: &ImageProperties,
    assets: &A,
) -> Result<DecodedImage, WarningKind> {
    match props.asset_id {
        Some(asset_id) => {
            let bytes = assets
                .get_asset(asset_id)
                .await
                .ok_or(WarningKind::AssetNotFound { asset_id })?;
            decode_image(&bytes, None).map_err(|e| WarningKind::AssetLoadFailed {
                source: format!("asset {asset_id}"),
                reason: e.to_string(),
            })
        }
        None => load_image_src(&props.src).await,
    }
}

/// Load and decode an inline image source (data URI, file path or URL).
pub async fn load_image_src(src: &str) -> Result<DecodedImage, WarningKind> {
    let failed = |reason: String| WarningKind::AssetLoadFailed {
        source: source_label(src),
        reason,
    };

    if src.trim().is_empty() {
        return Err(failed("image has no source".to_string()));
    }

    let (bytes, mime) = match ImageSource::classify(src) {
        ImageSource::DataUri(uri) => {
            let (mime, data) =
                parse_data_uri(uri).ok_or_else(|| failed("malformed data URI".to_string()))?;
            (data, Some(mime))
        }
        ImageSource::File(path) => {
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| failed(e.to_string()))?;
            (data, None)
        }
        ImageSource::Remote(url) => (fetch_remote(url).await.map_err(failed)?, None),
    };

    decode_image(&bytes, mime.as_deref()).map_err(|e| failed(e.to_string()))
}

/// Decode PNG/JPEG/GIF/WebP bytes, using the MIME type as a hint when known.
pub fn decode_image(data: &[u8], mime: Option<&str>) -> image::ImageResult<DecodedImage> {
    let hinted = mime.and_then(|mime| {
        if mime.contains("png") {
            Some(image::ImageFormat::Png)
        } else if mime.contains("jpeg") || mime.contains("jpg") {
            Some(image::ImageFormat::Jpeg)
        } else if mime.contains("gif") {
            Some(image::ImageFormat::Gif)
        } else if mime.contains("webp") {
            Some(image::ImageFormat::WebP)
        } else {
            None
        }
    });

    let decoded = match hinted {
        Some(format) => image::load_from_memory_with_format(data, format)?,
        None => image::load_from_memory(data)?,
    };
    Ok(Arc::new(decoded.to_rgba8()))
}

/// Split a `data:` URI into its MIME type and payload bytes.
pub fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header
        .split(';')
        .next()
        .filter(|v| !v.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((mime, data))
}

/// Short form of a source for warnings; data URIs are not echoed whole.
fn source_label(src: &str) -> String {
    let src = src.trim();
    if src.starts_with("data:") {
        let header = src.split(',').next().unwrap_or("data:");
        format!("{header},...")
    } else {
        src.to_string()
    }
}

#[cfg(feature = "remote-images")]
async fn fetch_remote(url: &str) -> Result<Vec<u8>, String> {
    use std::io::Read;

    const MAX_REMOTE_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

    let url = url.to_string();
    let task = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, String> {
        let response = ureq::get(&url).call().map_err(|e| e.to_string())?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_REMOTE_IMAGE_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| e.to_string())?;
        Ok(bytes)
    });
    task.await.map_err(|e| e.to_string())?
}

#[cfg(not(feature = "remote-images"))]
async fn fetch_remote(_url: &str) -> Result<Vec<u8>, String> {
    Err("remote images require the `remote-images` feature".to_string())
}
