//! Overlay image loading and caching.
//!
//! Overlays are addressed by a relative identifier (e.g. `kana-frame.png`)
//! resolved against an asset directory, or registered in memory. Decoding
//! and scaling run on the blocking pool; results are cached per output size.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;
use image::RgbaImage;
use lru::LruCache;

use crate::error::{PhotoboothError, PhotoboothResult, ResultExt};

/// Number of scaled overlays kept in memory.
const OVERLAY_CACHE_CAPACITY: usize = 8;

type CacheKey = (String, u32, u32);

enum OverlaySource {
    Registered(Arc<RgbaImage>),
    File(PathBuf),
}

pub struct OverlayStore {
    root: PathBuf,
    registered: HashMap<String, Arc<RgbaImage>>,
    cache: LruCache<CacheKey, Arc<RgbaImage>>,
}

impl OverlayStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registered: HashMap::new(),
            cache: LruCache::new(
                NonZeroUsize::new(OVERLAY_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve `id` from memory instead of the asset directory.
    pub fn register(&mut self, id: impl Into<String>, image: RgbaImage) {
        let id = id.into();
        self.cache.clear();
        self.registered.insert(id, Arc::new(image));
    }

    /// Number of scaled overlays currently cached.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Resolve an identifier to a file under the asset directory.
    ///
    /// Identifiers must be relative and may not step outside the directory.
    pub fn resolve(&self, id: &str) -> PhotoboothResult<PathBuf> {
        let relative = Path::new(id);
        let well_formed = !id.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(PhotoboothError::InvalidAssetId(id.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Load `id` scaled to exactly `width`×`height`.
    ///
    /// Resolves only once the overlay is fully decoded; decode failures
    /// surface as `AssetLoad`.
    pub async fn load_scaled(
        &mut self,
        id: &str,
        width: u32,
        height: u32,
    ) -> PhotoboothResult<Arc<RgbaImage>> {
        let key: CacheKey = (id.to_string(), width, height);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit));
        }

        let source = match self.registered.get(id) {
            Some(image) => OverlaySource::Registered(Arc::clone(image)),
            None => OverlaySource::File(self.resolve(id)?),
        };

        let asset_id = id.to_string();
        let scaled =
            tokio::task::spawn_blocking(move || decode_and_scale(&asset_id, source, width, height))
                .await
                .with_context(|| format!("overlay decode task for '{}' failed", id))??;

        let scaled = Arc::new(scaled);
        self.cache.put(key, Arc::clone(&scaled));
        log::debug!("[OVERLAY] Loaded '{}' at {}x{}", id, width, height);
        Ok(scaled)
    }
}

fn decode_and_scale(
    id: &str,
    source: OverlaySource,
    width: u32,
    height: u32,
) -> PhotoboothResult<RgbaImage> {
    let overlay = match source {
        OverlaySource::Registered(overlay) => overlay,
        OverlaySource::File(path) => {
            let decoded = image::open(&path).map_err(|e| PhotoboothError::AssetLoad {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
            Arc::new(decoded.to_rgba8())
        },
    };

    if overlay.width() == 0 || overlay.height() == 0 {
        return Err(PhotoboothError::AssetLoad {
            id: id.to_string(),
            reason: "image has no pixels".to_string(),
        });
    }

    if overlay.dimensions() == (width, height) {
        Ok((*overlay).clone())
    } else {
        Ok(image::imageops::resize(
            &*overlay,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_resolve_rejects_escaping_ids() {
        let store = OverlayStore::new("/srv/frames");
        assert_eq!(
            store.resolve("kana-frame.png").unwrap(),
            PathBuf::from("/srv/frames/kana-frame.png")
        );
        assert!(store.resolve("seasonal/winter.png").is_ok());

        for bad in ["", "../secret.png", "/etc/passwd", "a/../../b.png", "./x.png"] {
            assert!(
                matches!(store.resolve(bad), Err(PhotoboothError::InvalidAssetId(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_registered_overlay_is_scaled_and_cached() {
        let mut store = OverlayStore::new("unused");
        store.register("frame.png", RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128])));

        let scaled = store.load_scaled("frame.png", 8, 6).await.unwrap();
        assert_eq!(scaled.dimensions(), (8, 6));
        assert_eq!(store.cached(), 1);

        let again = store.load_scaled("frame.png", 8, 6).await.unwrap();
        assert!(Arc::ptr_eq(&scaled, &again));
    }

    #[tokio::test]
    async fn test_loads_png_from_asset_dir() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(16, 9, Rgba([0, 0, 0, 0]))
            .save(dir.path().join("kana-frame.png"))
            .unwrap();

        let mut store = OverlayStore::new(dir.path());
        let overlay = store.load_scaled("kana-frame.png", 16, 9).await.unwrap();
        assert_eq!(overlay.dimensions(), (16, 9));
        assert!(overlay.pixels().all(|p| p.0[3] == 0));
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let mut store = OverlayStore::new(dir.path());

        assert!(matches!(
            store.load_scaled("missing.png", 8, 8).await,
            Err(PhotoboothError::AssetLoad { .. })
        ));
        assert!(matches!(
            store.load_scaled("broken.png", 8, 8).await,
            Err(PhotoboothError::AssetLoad { .. })
        ));
        assert_eq!(store.cached(), 0);
    }
}
