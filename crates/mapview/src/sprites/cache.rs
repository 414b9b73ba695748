use std::collections::HashMap;
use std::path::PathBuf;

use image::RgbaImage;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::sprite_tags::SpriteTag;

use super::atlas::{
    crop_from_atlas, AtlasFile, AtlasId, FsImageLoader, ImageLoader, ResourceError, SpriteSource,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteError {
    #[error("sprite tag '{tag}' is already registered")]
    DuplicateTag { tag: String },
    #[error("unknown sprite tag '{tag}'")]
    MissingSprite { tag: String },
    #[error("none of the required sprites [{}] could be loaded", .tags.join(", "))]
    MissingRequired { tags: Vec<String> },
    #[error("sprite tag '{tag}' is still referenced {ref_count} time(s) and cannot be re-registered")]
    TagInUse { tag: String, ref_count: u32 },
    #[error("sprite tag '{tag}' was released more often than it was acquired")]
    NotAcquired { tag: String },
    #[error("atlas #{0} is not registered")]
    UnknownAtlas(u32),
    #[error("failed to load atlas {path}: {source}")]
    Atlas {
        path: PathBuf,
        #[source]
        source: ResourceError,
    },
    #[error("failed to load sprite '{tag}': {source}")]
    Resource {
        tag: String,
        #[source]
        source: ResourceError,
    },
}

/// What to do when a tag is registered a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTagPolicy {
    /// Later registration wins, with a warning.
    #[default]
    Warn,
    /// Later registration wins silently.
    Allow,
    /// Registration fails with [`SpriteError::DuplicateTag`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    /// Bulk tileset load; decoded atlases stay resident until `finish_batch`.
    Loading,
    /// Interactive rendering; a lazily decoded atlas is dropped with its last live crop.
    Interactive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub live_sprites: usize,
    pub live_bytes: usize,
    pub live_atlases: usize,
    pub image_decodes: u64,
    pub crops: u64,
    pub frees: u64,
}

/// Metadata and (while referenced) pixels of one tag.
///
/// `pixels.is_some()` holds exactly when `ref_count > 0`.
#[derive(Debug)]
pub struct SpriteRecord {
    pub source: SpriteSource,
    pub hot_x: i32,
    pub hot_y: i32,
    ref_count: u32,
    pixels: Option<RgbaImage>,
    /// Crop cut while interactive; keeps its atlas decoded until released.
    pins_atlas: bool,
}

impl SpriteRecord {
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn is_resident(&self) -> bool {
        self.pixels.is_some()
    }
}

/// Reference-counted owner of every decoded sprite buffer.
pub struct SpriteCache<L = FsImageLoader> {
    loader: L,
    atlases: Vec<AtlasFile>,
    records: HashMap<SpriteTag, SpriteRecord>,
    duplicate_policy: DuplicateTagPolicy,
    phase: CachePhase,
    stats: CacheStats,
}

impl<L: ImageLoader> SpriteCache<L> {
    pub fn new(loader: L) -> Self {
        Self::with_policy(loader, DuplicateTagPolicy::default())
    }

    pub fn with_policy(loader: L, duplicate_policy: DuplicateTagPolicy) -> Self {
        Self {
            loader,
            atlases: Vec::new(),
            records: HashMap::new(),
            duplicate_policy,
            phase: CachePhase::Loading,
            stats: CacheStats::default(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn phase(&self) -> CachePhase {
        self.phase
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn add_atlas(&mut self, path: impl Into<PathBuf>) -> AtlasId {
        let id = AtlasId(self.atlases.len() as u32);
        self.atlases.push(AtlasFile::new(path.into()));
        id
    }

    pub fn atlas(&self, id: AtlasId) -> Option<&AtlasFile> {
        self.atlases.get(id.0 as usize)
    }

    pub fn register(
        &mut self,
        tag: SpriteTag,
        source: SpriteSource,
        hot_x: i32,
        hot_y: i32,
    ) -> Result<(), SpriteError> {
        if let SpriteSource::AtlasCrop { atlas, .. } = &source {
            if self.atlas(*atlas).is_none() {
                return Err(SpriteError::UnknownAtlas(atlas.0));
            }
        }
        if let Some(existing) = self.records.get(&tag) {
            if existing.ref_count > 0 {
                return Err(SpriteError::TagInUse {
                    tag: tag.to_string(),
                    ref_count: existing.ref_count,
                });
            }
            match self.duplicate_policy {
                DuplicateTagPolicy::Reject => {
                    return Err(SpriteError::DuplicateTag {
                        tag: tag.to_string(),
                    })
                }
                DuplicateTagPolicy::Warn => {
                    warn!(sprite_tag = %tag, "sprite_cache_duplicate_tag_replaced");
                }
                DuplicateTagPolicy::Allow => {
                    debug!(sprite_tag = %tag, "sprite_cache_duplicate_tag_replaced");
                }
            }
        }
        self.records.insert(
            tag,
            SpriteRecord {
                source,
                hot_x,
                hot_y,
                ref_count: 0,
                pixels: None,
                pins_atlas: false,
            },
        );
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.records.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &SpriteTag> {
        self.records.keys()
    }

    /// Registered tag handle for `tag`, sharing the cache's allocation.
    pub fn resolve_tag(&self, tag: &str) -> Option<SpriteTag> {
        self.records.get_key_value(tag).map(|(key, _)| key.clone())
    }

    pub fn ref_count(&self, tag: &str) -> Option<u32> {
        self.records.get(tag).map(SpriteRecord::ref_count)
    }

    pub fn is_resident(&self, tag: &str) -> bool {
        self.records.get(tag).is_some_and(SpriteRecord::is_resident)
    }

    pub fn hotspot(&self, tag: &str) -> Option<(i32, i32)> {
        self.records.get(tag).map(|record| (record.hot_x, record.hot_y))
    }

    pub fn record(&self, tag: &str) -> Option<&SpriteRecord> {
        self.records.get(tag)
    }

    /// Pixels of a tag that is already held; never decodes.
    pub fn peek(&self, tag: &str) -> Option<&RgbaImage> {
        self.records.get(tag).and_then(|record| record.pixels.as_ref())
    }

    pub fn acquire(&mut self, tag: &str) -> Result<&RgbaImage, SpriteError> {
        self.retain(tag)?;
        self.peek(tag).ok_or_else(|| SpriteError::MissingSprite {
            tag: tag.to_string(),
        })
    }

    /// Acquires the first tag in `tags` that resolves.
    ///
    /// When nothing resolves, a `required` lookup fails with
    /// [`SpriteError::MissingRequired`]; an optional one yields `Ok(None)`.
    pub fn acquire_first_available<T: AsRef<str>>(
        &mut self,
        tags: &[T],
        required: bool,
    ) -> Result<Option<(SpriteTag, &RgbaImage)>, SpriteError> {
        let mut found = None;
        for tag in tags {
            let tag = tag.as_ref();
            if !self.contains(tag) {
                continue;
            }
            match self.retain(tag) {
                Ok(()) => {
                    found = self.resolve_tag(tag);
                    break;
                }
                Err(error) => {
                    warn!(sprite_tag = tag, error = %error, "sprite_cache_candidate_failed");
                }
            }
        }

        match found {
            Some(tag) => {
                let pixels = self.peek(tag.as_str()).ok_or_else(|| SpriteError::MissingSprite {
                    tag: tag.to_string(),
                })?;
                Ok(Some((tag, pixels)))
            }
            None if required => Err(SpriteError::MissingRequired {
                tags: tags.iter().map(|tag| tag.as_ref().to_string()).collect(),
            }),
            None => {
                debug!(
                    candidates = tags.len(),
                    first = tags.first().map(|tag| tag.as_ref()).unwrap_or(""),
                    "sprite_cache_optional_sprite_absent"
                );
                Ok(None)
            }
        }
    }

    pub fn release(&mut self, tag: &str) -> Result<(), SpriteError> {
        let record = self
            .records
            .get_mut(tag)
            .ok_or_else(|| SpriteError::MissingSprite {
                tag: tag.to_string(),
            })?;
        if record.ref_count == 0 {
            return Err(SpriteError::NotAcquired {
                tag: tag.to_string(),
            });
        }
        record.ref_count -= 1;
        if record.ref_count > 0 {
            return Ok(());
        }

        if let Some(pixels) = record.pixels.take() {
            self.stats.live_sprites -= 1;
            self.stats.live_bytes -= pixels.as_raw().len();
            self.stats.frees += 1;
        }
        if std::mem::take(&mut record.pins_atlas) {
            if let SpriteSource::AtlasCrop { atlas, .. } = record.source {
                self.on_crop_freed(atlas);
            }
        }
        Ok(())
    }

    /// Decodes the atlas image if it is not resident yet.
    pub fn ensure_atlas(&mut self, id: AtlasId) -> Result<(), SpriteError> {
        let atlas = self
            .atlases
            .get_mut(id.0 as usize)
            .ok_or(SpriteError::UnknownAtlas(id.0))?;
        if atlas.big_image.is_some() {
            return Ok(());
        }
        let image = self
            .loader
            .load(&atlas.path)
            .map_err(|source| SpriteError::Atlas {
                path: atlas.path.clone(),
                source,
            })?;
        debug!(
            atlas = %atlas.path.display(),
            width = image.width(),
            height = image.height(),
            "sprite_cache_atlas_decoded"
        );
        atlas.big_image = Some(image);
        self.stats.image_decodes += 1;
        self.stats.live_atlases += 1;
        Ok(())
    }

    /// Ends the bulk load pass: drops every decoded atlas (crops own their pixels).
    ///
    /// Crops held from the load pass do not pin their atlas afterwards.
    pub fn finish_batch(&mut self) {
        let mut dropped = 0usize;
        for atlas in &mut self.atlases {
            atlas.live_crops = 0;
            if atlas.big_image.take().is_some() {
                dropped += 1;
            }
        }
        self.stats.live_atlases -= dropped;
        self.phase = CachePhase::Interactive;
        debug!(
            dropped_atlases = dropped,
            live_sprites = self.stats.live_sprites,
            live_bytes = self.stats.live_bytes,
            "sprite_cache_batch_finished"
        );
    }

    fn retain(&mut self, tag: &str) -> Result<(), SpriteError> {
        let record = self
            .records
            .get_mut(tag)
            .ok_or_else(|| SpriteError::MissingSprite {
                tag: tag.to_string(),
            })?;
        if record.ref_count > 0 {
            record.ref_count += 1;
            return Ok(());
        }

        let source = record.source.clone();
        let (pixels, pins_atlas) = self.load_pixels(tag, &source)?;
        let bytes = pixels.as_raw().len();
        let record = self
            .records
            .get_mut(tag)
            .ok_or_else(|| SpriteError::MissingSprite {
                tag: tag.to_string(),
            })?;
        record.pixels = Some(pixels);
        record.ref_count = 1;
        record.pins_atlas = pins_atlas;
        self.stats.live_sprites += 1;
        self.stats.live_bytes += bytes;
        Ok(())
    }

    /// Decoded pixels, and whether the crop now counts against its atlas.
    fn load_pixels(&mut self, tag: &str, source: &SpriteSource) -> Result<(RgbaImage, bool), SpriteError> {
        match source {
            SpriteSource::AtlasCrop { atlas, rect } => {
                self.ensure_atlas(*atlas)?;
                let atlas_file = self
                    .atlases
                    .get(atlas.0 as usize)
                    .ok_or(SpriteError::UnknownAtlas(atlas.0))?;
                let crop = match atlas_file.big_image.as_ref() {
                    Some(big_image) => crop_from_atlas(&atlas_file.path, big_image, *rect),
                    None => return Err(SpriteError::UnknownAtlas(atlas.0)),
                };
                let crop = match crop {
                    Ok(crop) => crop,
                    Err(source) => {
                        self.drop_idle_atlas(*atlas);
                        return Err(SpriteError::Resource {
                            tag: tag.to_string(),
                            source,
                        });
                    }
                };
                self.stats.crops += 1;
                let pins_atlas = self.phase == CachePhase::Interactive;
                if pins_atlas {
                    if let Some(atlas_file) = self.atlases.get_mut(atlas.0 as usize) {
                        atlas_file.live_crops += 1;
                    }
                }
                Ok((crop, pins_atlas))
            }
            SpriteSource::StandaloneFile { path } => {
                let image = self
                    .loader
                    .load(path)
                    .map_err(|source| SpriteError::Resource {
                        tag: tag.to_string(),
                        source,
                    })?;
                self.stats.image_decodes += 1;
                Ok((image, false))
            }
        }
    }

    fn on_crop_freed(&mut self, id: AtlasId) {
        if let Some(atlas) = self.atlases.get_mut(id.0 as usize) {
            atlas.live_crops = atlas.live_crops.saturating_sub(1);
        }
        self.drop_idle_atlas(id);
    }

    fn drop_idle_atlas(&mut self, id: AtlasId) {
        if self.phase != CachePhase::Interactive {
            return;
        }
        let Some(atlas) = self.atlases.get_mut(id.0 as usize) else {
            return;
        };
        if atlas.live_crops == 0 && atlas.big_image.take().is_some() {
            self.stats.live_atlases -= 1;
            debug!(atlas = %atlas.path.display(), "sprite_cache_idle_atlas_dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprites::atlas::PixelRect;
    use crate::test_support::MemoryLoader;

    fn tag(text: &str) -> SpriteTag {
        SpriteTag::new(text).expect("tag")
    }

    fn cache_with_atlas() -> (SpriteCache<MemoryLoader>, AtlasId) {
        let loader = MemoryLoader::default()
            .with_image("tiles.png", 64, 32)
            .with_image("unit.png", 10, 12);
        let mut cache = SpriteCache::new(loader);
        let atlas = cache.add_atlas("tiles.png");
        cache
            .register(
                tag("t.l0.grassland1"),
                SpriteSource::AtlasCrop {
                    atlas,
                    rect: PixelRect::new(0, 0, 32, 16),
                },
                0,
                0,
            )
            .expect("register");
        cache
            .register(
                tag("t.l0.desert1"),
                SpriteSource::AtlasCrop {
                    atlas,
                    rect: PixelRect::new(32, 16, 32, 16),
                },
                0,
                0,
            )
            .expect("register");
        cache
            .register(
                tag("u.settlers"),
                SpriteSource::StandaloneFile {
                    path: PathBuf::from("unit.png"),
                },
                3,
                4,
            )
            .expect("register");
        (cache, atlas)
    }

    #[test]
    fn acquire_returns_pixels_with_declared_crop_dimensions() {
        let (mut cache, _) = cache_with_atlas();
        let image = cache.acquire("t.l0.grassland1").expect("acquire");
        assert_eq!(image.dimensions(), (32, 16));
        let image = cache.acquire("u.settlers").expect("acquire");
        assert_eq!(image.dimensions(), (10, 12));
        assert_eq!(cache.hotspot("u.settlers"), Some((3, 4)));
    }

    #[test]
    fn release_to_zero_frees_only_that_sprite() {
        let (mut cache, _) = cache_with_atlas();
        cache.acquire("t.l0.grassland1").expect("acquire");
        cache.acquire("t.l0.desert1").expect("acquire");
        let before = cache.stats();
        assert_eq!(before.live_sprites, 2);
        assert_eq!(before.live_bytes, 2 * 32 * 16 * 4);

        cache.release("t.l0.grassland1").expect("release");
        let after = cache.stats();
        assert_eq!(after.live_sprites, 1);
        assert_eq!(after.live_bytes, 32 * 16 * 4);
        assert_eq!(after.frees, 1);
        assert!(!cache.is_resident("t.l0.grassland1"));
        assert!(cache.is_resident("t.l0.desert1"));
        assert_eq!(
            cache.peek("t.l0.desert1").map(RgbaImage::dimensions),
            Some((32, 16))
        );
    }

    #[test]
    fn paired_acquire_release_returns_to_zero_for_any_count() {
        for n in [1u32, 2, 5, 17] {
            let (mut cache, _) = cache_with_atlas();
            for _ in 0..n {
                cache.acquire("u.settlers").expect("acquire");
            }
            assert_eq!(cache.ref_count("u.settlers"), Some(n));
            for _ in 0..n {
                cache.release("u.settlers").expect("release");
            }
            assert_eq!(cache.ref_count("u.settlers"), Some(0));
            assert!(!cache.is_resident("u.settlers"));
            assert_eq!(cache.loader().load_count("unit.png"), 1);
        }
    }

    #[test]
    fn interleaved_pairs_are_order_independent() {
        let (mut cache, _) = cache_with_atlas();
        cache.acquire("u.settlers").expect("a");
        cache.acquire("t.l0.desert1").expect("b");
        cache.release("u.settlers").expect("a");
        cache.acquire("u.settlers").expect("a");
        cache.release("t.l0.desert1").expect("b");
        cache.release("u.settlers").expect("a");
        assert_eq!(cache.ref_count("u.settlers"), Some(0));
        assert_eq!(cache.ref_count("t.l0.desert1"), Some(0));
        assert_eq!(cache.stats().live_sprites, 0);
        assert_eq!(cache.stats().live_bytes, 0);
    }

    #[test]
    fn release_never_goes_below_zero() {
        let (mut cache, _) = cache_with_atlas();
        assert!(matches!(
            cache.release("u.settlers"),
            Err(SpriteError::NotAcquired { .. })
        ));
        assert_eq!(cache.ref_count("u.settlers"), Some(0));
        assert!(matches!(
            cache.release("nope"),
            Err(SpriteError::MissingSprite { .. })
        ));
    }

    #[test]
    fn unknown_tag_is_missing_sprite_error() {
        let (mut cache, _) = cache_with_atlas();
        assert!(matches!(
            cache.acquire("t.l0.ocean1"),
            Err(SpriteError::MissingSprite { .. })
        ));
    }

    #[test]
    fn duplicate_registration_defaults_to_last_writer_wins() {
        let (mut cache, atlas) = cache_with_atlas();
        cache
            .register(
                tag("t.l0.grassland1"),
                SpriteSource::AtlasCrop {
                    atlas,
                    rect: PixelRect::new(0, 0, 8, 8),
                },
                0,
                0,
            )
            .expect("replace");
        assert_eq!(
            cache.acquire("t.l0.grassland1").map(RgbaImage::dimensions),
            Ok((8, 8))
        );
    }

    #[test]
    fn strict_mode_rejects_duplicates() {
        let loader = MemoryLoader::default().with_image("a.png", 4, 4);
        let mut cache = SpriteCache::with_policy(loader, DuplicateTagPolicy::Reject);
        let source = SpriteSource::StandaloneFile {
            path: PathBuf::from("a.png"),
        };
        cache.register(tag("x"), source.clone(), 0, 0).expect("first");
        assert!(matches!(
            cache.register(tag("x"), source, 0, 0),
            Err(SpriteError::DuplicateTag { .. })
        ));
    }

    #[test]
    fn live_tag_cannot_be_rebound() {
        let (mut cache, _) = cache_with_atlas();
        cache.acquire("u.settlers").expect("acquire");
        let result = cache.register(
            tag("u.settlers"),
            SpriteSource::StandaloneFile {
                path: PathBuf::from("other.png"),
            },
            0,
            0,
        );
        assert!(matches!(result, Err(SpriteError::TagInUse { ref_count: 1, .. })));
    }

    #[test]
    fn aliases_of_one_crop_are_independent_records() {
        let (mut cache, atlas) = cache_with_atlas();
        let rect = PixelRect::new(0, 0, 32, 16);
        cache
            .register(tag("t.l0.plains1"), SpriteSource::AtlasCrop { atlas, rect }, 0, 0)
            .expect("alias");
        cache.acquire("t.l0.plains1").expect("alias");
        cache.acquire("t.l0.grassland1").expect("original");
        cache.release("t.l0.plains1").expect("alias");
        assert!(cache.is_resident("t.l0.grassland1"));
        assert!(!cache.is_resident("t.l0.plains1"));
    }

    #[test]
    fn first_available_picks_first_registered_candidate() {
        let (mut cache, _) = cache_with_atlas();
        let found = cache
            .acquire_first_available(&["u.missing", "u.settlers", "t.l0.desert1"], true)
            .expect("lookup")
            .map(|(tag, image)| (tag.to_string(), image.dimensions()));
        assert_eq!(found, Some(("u.settlers".to_string(), (10, 12))));
        assert_eq!(cache.ref_count("t.l0.desert1"), Some(0));
        assert_eq!(cache.ref_count("u.settlers"), Some(1));
    }

    #[test]
    fn first_available_distinguishes_required_from_optional() {
        let (mut cache, _) = cache_with_atlas();
        assert!(matches!(
            cache.acquire_first_available(&["a", "b"], true),
            Err(SpriteError::MissingRequired { tags }) if tags == vec!["a".to_string(), "b".to_string()]
        ));
        assert!(matches!(cache.acquire_first_available(&["a", "b"], false), Ok(None)));
    }

    #[test]
    fn first_available_skips_candidates_that_fail_to_decode() {
        let loader = MemoryLoader::default().with_image("ok.png", 2, 2);
        let mut cache = SpriteCache::new(loader);
        for (name, path) in [("broken", "gone.png"), ("fine", "ok.png")] {
            cache
                .register(
                    tag(name),
                    SpriteSource::StandaloneFile {
                        path: PathBuf::from(path),
                    },
                    0,
                    0,
                )
                .expect("register");
        }
        let found = cache
            .acquire_first_available(&["broken", "fine"], true)
            .expect("lookup")
            .map(|(tag, _)| tag.to_string());
        assert_eq!(found.as_deref(), Some("fine"));
        assert_eq!(cache.ref_count("broken"), Some(0));
    }

    #[test]
    fn atlas_decodes_once_per_batch_and_is_dropped_on_finish() {
        let (mut cache, atlas) = cache_with_atlas();
        cache.acquire("t.l0.grassland1").expect("a");
        cache.acquire("t.l0.desert1").expect("b");
        assert_eq!(cache.loader().load_count("tiles.png"), 1);
        assert!(cache.atlas(atlas).is_some_and(AtlasFile::is_resident));

        cache.ensure_atlas(atlas).expect("idempotent");
        assert_eq!(cache.loader().load_count("tiles.png"), 1);

        cache.finish_batch();
        assert_eq!(cache.phase(), CachePhase::Interactive);
        assert!(cache.atlas(atlas).is_some_and(|file| !file.is_resident()));
        assert_eq!(cache.stats().live_atlases, 0);
        assert_eq!(
            cache.peek("t.l0.desert1").map(RgbaImage::dimensions),
            Some((32, 16))
        );
    }

    #[test]
    fn interactive_lazy_crop_drops_atlas_with_last_crop() {
        let (mut cache, atlas) = cache_with_atlas();
        cache.finish_batch();

        cache.acquire("t.l0.grassland1").expect("lazy");
        assert!(cache.atlas(atlas).is_some_and(AtlasFile::is_resident));
        assert_eq!(cache.loader().load_count("tiles.png"), 1);

        cache.release("t.l0.grassland1").expect("release");
        assert!(cache.atlas(atlas).is_some_and(|file| !file.is_resident()));
        assert_eq!(cache.stats().live_atlases, 0);
    }

    #[test]
    fn crops_held_from_the_load_pass_do_not_pin_the_atlas() {
        let (mut cache, atlas) = cache_with_atlas();
        cache.acquire("t.l0.grassland1").expect("table sprite");
        cache.finish_batch();
        assert!(cache.atlas(atlas).is_some_and(|file| !file.is_resident()));

        for _ in 0..3 {
            cache.acquire("t.l0.desert1").expect("frame crop");
            assert!(cache.atlas(atlas).is_some_and(AtlasFile::is_resident));
            cache.release("t.l0.desert1").expect("release");
            assert!(cache.atlas(atlas).is_some_and(|file| !file.is_resident()));
        }
        assert_eq!(cache.stats().live_atlases, 0);
        assert!(cache.is_resident("t.l0.grassland1"));

        cache.release("t.l0.grassland1").expect("release table sprite");
        assert_eq!(cache.stats().live_atlases, 0);
        assert_eq!(cache.stats().live_sprites, 0);
    }

    #[test]
    fn crop_outside_atlas_is_resource_error() {
        let (mut cache, atlas) = cache_with_atlas();
        cache
            .register(
                tag("t.bad"),
                SpriteSource::AtlasCrop {
                    atlas,
                    rect: PixelRect::new(60, 0, 10, 10),
                },
                0,
                0,
            )
            .expect("register");
        assert!(matches!(
            cache.acquire("t.bad"),
            Err(SpriteError::Resource {
                source: ResourceError::CropOutOfBounds { .. },
                ..
            })
        ));
        assert_eq!(cache.ref_count("t.bad"), Some(0));
    }

    #[test]
    fn registering_crop_for_unknown_atlas_fails() {
        let mut cache = SpriteCache::new(MemoryLoader::default());
        let result = cache.register(
            tag("t.x"),
            SpriteSource::AtlasCrop {
                atlas: AtlasId(3),
                rect: PixelRect::new(0, 0, 1, 1),
            },
            0,
            0,
        );
        assert_eq!(result, Err(SpriteError::UnknownAtlas(3)));
    }
}
