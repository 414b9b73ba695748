use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geometry::GridGeometry;
use crate::layers::{
    CitySprites, DarknessSprites, ExtraSprites, GridSprites, LayerContext, LayerPipeline,
    OverlaySprites, SpriteBinder, TerrainSprites, UnitSprites,
};
use crate::options::RenderOptions;
use crate::sprite_tags::SpriteTag;
use crate::sprites::{
    Colorizer, FsImageLoader, ImageLoader, Rgb, SpriteCache, SpriteError, SpriteSource,
};
use crate::view::GameView;

use super::{ConfigError, DrawOffsets, TilesetConfig, TilesetDef};

/// Everything found while loading, fatal or not.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
#[error("tileset '{name}' failed to load with {} error(s){}", .report.errors.len(), first_error(.report))]
pub struct TilesetLoadError {
    pub name: String,
    pub report: LoadReport,
}

fn first_error(report: &LoadReport) -> String {
    report
        .errors
        .first()
        .map(|error| format!("; first: {error}"))
        .unwrap_or_default()
}

/// A loaded tileset: its sprite cache, layer tables and draw order.
///
/// Every sprite a layer table refers to stays acquired until the tileset is
/// unloaded or dropped.
pub struct Tileset<L: ImageLoader = FsImageLoader> {
    name: String,
    cache: SpriteCache<L>,
    config: TilesetConfig,
    pipeline: LayerPipeline,
    colorizer: Colorizer,
    held: Vec<SpriteTag>,
}

impl<L: ImageLoader> Tileset<L> {
    /// Registers every sprite, validates the definition and resolves every
    /// layer table. All problems are collected before failing.
    pub fn load(def: &TilesetDef, loader: L) -> Result<(Self, LoadReport), TilesetLoadError> {
        let mut report = LoadReport::default();
        let mut cache = SpriteCache::with_policy(loader, def.duplicate_policy);
        register_sprites(def, &mut cache, &mut report);

        let geometry = match build_geometry(def) {
            Ok(geometry) => geometry,
            Err(error) => {
                report.errors.push(error);
                return Err(TilesetLoadError {
                    name: def.name.clone(),
                    report,
                });
            }
        };
        let pipeline = match &def.layer_order {
            Some(order) => LayerPipeline::new(order).unwrap_or_else(|error| {
                report.errors.push(error.into());
                LayerPipeline::canonical()
            }),
            None => LayerPipeline::canonical(),
        };
        let offsets = DrawOffsets::from_def(def, &geometry);

        let mut binder = CacheBinder {
            cache: &mut cache,
            report: &mut report,
            held: Vec::new(),
        };
        let terrain = TerrainSprites::build(def, &geometry, offsets.full_tile, &mut binder);
        let darkness = DarknessSprites::build(def, &geometry, &mut binder);
        let extras = ExtraSprites::build(def, &geometry, &mut binder);
        let units = UnitSprites::build(&mut binder);
        let city = CitySprites::build(def, &mut binder);
        let grid = GridSprites::build(&geometry, &mut binder);
        let overlays = OverlaySprites::build(&mut binder);
        let held = binder.held;
        cache.finish_batch();

        let tileset = Self {
            name: def.name.clone(),
            cache,
            config: TilesetConfig {
                geometry,
                offsets,
                terrain,
                darkness,
                extras,
                units,
                city,
                grid,
                overlays,
            },
            pipeline,
            colorizer: Colorizer::new(),
            held,
        };

        if !report.errors.is_empty() {
            warn!(
                tileset = %def.name,
                errors = report.errors.len(),
                warnings = report.warnings.len(),
                "tileset_load_rejected"
            );
            drop(tileset);
            return Err(TilesetLoadError {
                name: def.name.clone(),
                report,
            });
        }

        let stats = tileset.cache.stats();
        info!(
            tileset = %tileset.name,
            sprites = tileset.held.len(),
            live_bytes = stats.live_bytes,
            image_decodes = stats.image_decodes,
            warnings = report.warnings.len(),
            "tileset_loaded"
        );
        Ok((tileset, report))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TilesetConfig {
        &self.config
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.config.geometry
    }

    pub fn pipeline(&self) -> &LayerPipeline {
        &self.pipeline
    }

    pub fn cache(&self) -> &SpriteCache<L> {
        &self.cache
    }

    pub fn colorizer(&self) -> &Colorizer {
        &self.colorizer
    }

    /// Number of sprites the layer tables hold.
    pub fn held_sprites(&self) -> usize {
        self.held.len()
    }

    pub fn layer_context<'a>(
        &'a self,
        view: &'a dyn GameView,
        options: &'a RenderOptions,
    ) -> LayerContext<'a> {
        LayerContext {
            config: &self.config,
            view,
            options,
        }
    }

    /// Terrains of a ruleset that this tileset cannot draw.
    pub fn check_terrains<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<ConfigError> {
        names
            .into_iter()
            .filter(|name| !self.config.terrain.contains(name))
            .map(|name| ConfigError::UnknownTerrain {
                name: name.to_string(),
            })
            .collect()
    }

    /// Acquires a sprite for one frame. Tinted sprites come from the
    /// colorizer, which only borrows its base, so they need no release.
    pub(crate) fn frame_sprite(
        &mut self,
        tag: &SpriteTag,
        tint: Option<Rgb>,
    ) -> Result<(&RgbaImage, (i32, i32)), SpriteError> {
        let hotspot = self.cache.hotspot(tag.as_str()).unwrap_or((0, 0));
        let pixels = match tint {
            Some(color) => self.colorizer.colorized(&mut self.cache, tag.as_str(), color)?,
            None => self.cache.acquire(tag.as_str())?,
        };
        Ok((pixels, hotspot))
    }

    /// Pixels and hotspot of a sprite the caller already holds.
    pub(crate) fn held_sprite(&self, tag: &SpriteTag) -> Option<(&RgbaImage, (i32, i32))> {
        let pixels = self.cache.peek(tag.as_str())?;
        Some((pixels, self.cache.hotspot(tag.as_str()).unwrap_or((0, 0))))
    }

    pub(crate) fn release_frame_sprite(&mut self, tag: &SpriteTag) {
        if let Err(error) = self.cache.release(tag.as_str()) {
            warn!(sprite_tag = %tag, error = %error, "tileset_frame_release_failed");
        }
    }

    /// Releases every sprite held by the layer tables.
    pub fn unload(&mut self) {
        if self.held.is_empty() {
            return;
        }
        let count = self.held.len();
        for tag in std::mem::take(&mut self.held) {
            if let Err(error) = self.cache.release(tag.as_str()) {
                warn!(sprite_tag = %tag, error = %error, "tileset_unload_release_failed");
            }
        }
        self.colorizer.clear();
        debug!(
            tileset = %self.name,
            released = count,
            live_sprites = self.cache.stats().live_sprites,
            "tileset_unloaded"
        );
    }
}

impl<L: ImageLoader> Drop for Tileset<L> {
    fn drop(&mut self) {
        self.unload();
    }
}

fn build_geometry(def: &TilesetDef) -> Result<GridGeometry, ConfigError> {
    let topology = def.topology;
    let geometry = match (&def.valid_dirs, &def.cardinal_dirs) {
        (None, None) => GridGeometry::new(topology, def.tile_width, def.tile_height, def.hex_side)?,
        (valid, cardinal) => {
            let valid = valid
                .clone()
                .unwrap_or_else(|| topology.default_valid_dirs().as_slice().to_vec());
            let cardinal = cardinal
                .clone()
                .unwrap_or_else(|| topology.default_cardinal_dirs().as_slice().to_vec());
            GridGeometry::with_dirs(
                topology,
                def.tile_width,
                def.tile_height,
                def.hex_side,
                valid,
                cardinal,
            )?
        }
    };
    Ok(geometry)
}

fn register_sprites<L: ImageLoader>(
    def: &TilesetDef,
    cache: &mut SpriteCache<L>,
    report: &mut LoadReport,
) {
    let mut register = |cache: &mut SpriteCache<L>, tags: &[String], source: SpriteSource, hot: (i32, i32)| {
        for raw in tags {
            let tag = match SpriteTag::new(raw) {
                Ok(tag) => tag,
                Err(tag_error) => {
                    report.errors.push(ConfigError::Tag {
                        tag: raw.clone(),
                        source: tag_error,
                    });
                    continue;
                }
            };
            if let Err(error) = cache.register(tag, source.clone(), hot.0, hot.1) {
                report.errors.push(error.into());
            }
        }
    };

    for atlas_def in &def.atlases {
        let atlas = cache.add_atlas(atlas_def.image.clone());
        for grid in &atlas_def.grids {
            for cell in &grid.cells {
                let rect = grid.layout.cell_rect(cell.row, cell.column);
                let source = SpriteSource::AtlasCrop { atlas, rect };
                register(&mut *cache, &cell.tags, source, (cell.hot_x, cell.hot_y));
            }
        }
        for sprite in &atlas_def.sprites {
            let source = SpriteSource::AtlasCrop {
                atlas,
                rect: sprite.rect,
            };
            register(&mut *cache, &sprite.tags, source, (sprite.hot_x, sprite.hot_y));
        }
    }
    for file in &def.files {
        let source = SpriteSource::StandaloneFile {
            path: file.path.clone(),
        };
        register(&mut *cache, &file.tags, source, (file.hot_x, file.hot_y));
    }
    debug!(
        tileset = %def.name,
        atlases = def.atlases.len(),
        sprites = cache.tags().count(),
        "tileset_sprites_registered"
    );
}

/// Acquires layer table sprites from the cache and records every problem.
struct CacheBinder<'a, L> {
    cache: &'a mut SpriteCache<L>,
    report: &'a mut LoadReport,
    held: Vec<SpriteTag>,
}

impl<L: ImageLoader> SpriteBinder for CacheBinder<'_, L> {
    fn bind(&mut self, candidates: &[String], required: bool) -> Option<SpriteTag> {
        match self.cache.acquire_first_available(candidates, required) {
            Ok(Some((tag, _))) => {
                self.held.push(tag.clone());
                Some(tag)
            }
            Ok(None) => None,
            Err(SpriteError::MissingRequired { tags }) => {
                self.report
                    .errors
                    .push(ConfigError::MissingRequiredSprite { tags });
                None
            }
            Err(error) => {
                self.report.errors.push(error.into());
                None
            }
        }
    }

    fn error(&mut self, error: ConfigError) {
        self.report.errors.push(error);
    }

    fn warn(&mut self, message: String) {
        warn!(warning = %message, "tileset_load_warning");
        self.report.warnings.push(message);
    }
}
