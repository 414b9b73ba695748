use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::geometry::{CanvasRect, Element, RectIterator};
use crate::layers::DrawnSprite;
use crate::options::RenderOptions;
use crate::sprite_tags::SpriteTag;
use crate::sprites::{FsImageLoader, ImageLoader, SpriteError};
use crate::tileset::{LoadReport, Tileset, TilesetDef, TilesetLoadError};
use crate::view::GameView;

use super::{BlitParams, DirtyRegion, OutputSurface, ScreenRect};

/// Counters for one `render` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub elements: usize,
    pub sprites_drawn: usize,
    /// Sprites that failed to resolve and were left out.
    pub sprites_skipped: usize,
}

impl FrameStats {
    fn absorb(&mut self, other: FrameStats) {
        self.elements += other.elements;
        self.sprites_drawn += other.sprites_drawn;
        self.sprites_skipped += other.sprites_skipped;
    }
}

/// Draws a map view through the active tileset onto an [`OutputSurface`].
///
/// `origin` is the map pixel shown at the top-left corner of the viewport and
/// `scale` the number of screen pixels per map pixel.
///
/// Sprites outside the tileset's tables are acquired on first draw and held
/// until a full-viewport render no longer draws them.
pub struct Renderer<L: ImageLoader = FsImageLoader> {
    tileset: Tileset<L>,
    options: RenderOptions,
    origin: (f64, f64),
    scale: f64,
    viewport_size: (u32, u32),
    dirty: DirtyRegion,
    warned_sprites: HashSet<SpriteTag>,
    warned_extent: bool,
    scratch: Vec<DrawnSprite>,
    /// Held sprite tags, flagged when drawn since the last full repaint.
    frame_sprites: HashMap<SpriteTag, bool>,
}

impl<L: ImageLoader> Renderer<L> {
    pub fn new(tileset: Tileset<L>, options: RenderOptions, viewport_size: (u32, u32)) -> Self {
        let mut renderer = Self {
            tileset,
            options,
            origin: (0.0, 0.0),
            scale: 1.0,
            viewport_size,
            dirty: DirtyRegion::default(),
            warned_sprites: HashSet::new(),
            warned_extent: false,
            scratch: Vec::new(),
            frame_sprites: HashMap::new(),
        };
        renderer.mark_all_dirty();
        renderer
    }

    pub fn tileset(&self) -> &Tileset<L> {
        &self.tileset
    }

    /// Loads `def` and swaps it in. On failure the current tileset stays active.
    pub fn load_tileset(&mut self, def: &TilesetDef, loader: L) -> Result<LoadReport, TilesetLoadError> {
        let (tileset, report) = Tileset::load(def, loader).map_err(|error| {
            warn!(
                tileset = %error.name,
                active = %self.tileset.name(),
                errors = error.report.errors.len(),
                "renderer_tileset_swap_rejected"
            );
            error
        })?;
        info!(
            previous = %self.tileset.name(),
            tileset = %tileset.name(),
            "renderer_tileset_swapped"
        );
        self.release_frame_sprites();
        self.tileset = tileset;
        self.warned_sprites.clear();
        self.warned_extent = false;
        self.mark_all_dirty();
        Ok(report)
    }

    /// Releases every sprite held between frames.
    pub fn release_frame_sprites(&mut self) {
        for tag in std::mem::take(&mut self.frame_sprites).into_keys() {
            self.tileset.release_frame_sprite(&tag);
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        if self.options != options {
            self.options = options;
            self.mark_all_dirty();
        }
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn set_origin(&mut self, origin: (f64, f64)) {
        self.origin = origin;
        self.mark_all_dirty();
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Non-positive and non-finite scales are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if !scale.is_finite() || scale <= 0.0 {
            debug!(scale, "renderer_scale_ignored");
            return;
        }
        self.scale = scale;
        self.mark_all_dirty();
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, viewport_size: (u32, u32)) {
        self.viewport_size = viewport_size;
        self.mark_all_dirty();
    }

    pub fn viewport_rect(&self) -> ScreenRect {
        ScreenRect::new(0, 0, self.viewport_size.0, self.viewport_size.1)
    }

    pub fn mark_dirty(&mut self, rect: ScreenRect) {
        if let Some(rect) = rect.intersect(&self.viewport_rect()) {
            self.dirty.add(rect);
        }
    }

    pub fn mark_all_dirty(&mut self) {
        let viewport = self.viewport_rect();
        self.dirty.add(viewport);
    }

    pub fn dirty(&self) -> &DirtyRegion {
        &self.dirty
    }

    pub fn take_dirty(&mut self) -> Vec<ScreenRect> {
        self.dirty.take()
    }

    pub fn screen_to_map_px(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        (
            self.origin.0 + screen_x / self.scale,
            self.origin.1 + screen_y / self.scale,
        )
    }

    pub fn map_to_screen_px(&self, map_x: f64, map_y: f64) -> (i32, i32) {
        (
            ((map_x - self.origin.0) * self.scale).floor() as i32,
            ((map_y - self.origin.1) * self.scale).floor() as i32,
        )
    }

    /// Repaints every pending dirty rectangle.
    pub fn render_dirty<S: OutputSurface + ?Sized>(&mut self, surface: &mut S, view: &dyn GameView) -> FrameStats {
        let mut stats = FrameStats::default();
        for rect in self.dirty.take() {
            stats.absorb(self.render(surface, view, rect));
        }
        stats
    }

    /// Clears `region` to the background colour and composites every element
    /// touching it, layer by layer in pipeline order.
    pub fn render<S: OutputSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        view: &dyn GameView,
        region: ScreenRect,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let (surface_w, surface_h) = surface.size();
        let Some(region) = region
            .intersect(&self.viewport_rect())
            .and_then(|region| region.intersect(&ScreenRect::new(0, 0, surface_w, surface_h)))
        else {
            return stats;
        };
        surface.clear_rect(region, self.options.background_color);

        let extent = view.extent();
        if extent.isometric != self.tileset.geometry().is_isometric() && !self.warned_extent {
            self.warned_extent = true;
            warn!(
                tileset = %self.tileset.name(),
                map_isometric = extent.isometric,
                tileset_isometric = self.tileset.geometry().is_isometric(),
                "renderer_map_tileset_projection_mismatch"
            );
        }

        let map_rect = self.map_rect_for(region);
        let elements = RectIterator::new(self.tileset.geometry(), extent, map_rect);
        let mut sprites = std::mem::take(&mut self.scratch);
        for element in elements {
            stats.elements += 1;
            sprites.clear();
            let ctx = self.tileset.layer_context(view, &self.options);
            self.tileset
                .pipeline()
                .render_element_into(&element, &ctx, &mut sprites);
            for sprite in &sprites {
                if self.draw_sprite(surface, &element, sprite, region) {
                    stats.sprites_drawn += 1;
                } else {
                    stats.sprites_skipped += 1;
                }
            }
        }
        self.scratch = sprites;

        if region == self.viewport_rect() {
            self.sweep_frame_sprites();
        }
        debug!(
            x = region.x,
            y = region.y,
            w = region.w,
            h = region.h,
            elements = stats.elements,
            drawn = stats.sprites_drawn,
            skipped = stats.sprites_skipped,
            "renderer_region_rendered"
        );
        stats
    }

    fn sweep_frame_sprites(&mut self) {
        let stale: Vec<SpriteTag> = self
            .frame_sprites
            .iter()
            .filter(|(_, drawn)| !**drawn)
            .map(|(tag, _)| tag.clone())
            .collect();
        for tag in stale {
            self.frame_sprites.remove(&tag);
            self.tileset.release_frame_sprite(&tag);
        }
        for drawn in self.frame_sprites.values_mut() {
            *drawn = false;
        }
    }

    /// Map pixel rectangle behind `region`, widened by a tile on every side
    /// so offset and tall sprites from neighbouring elements are included.
    fn map_rect_for(&self, region: ScreenRect) -> CanvasRect {
        let geometry = self.tileset.geometry();
        let (left, top) = self.screen_to_map_px(f64::from(region.x), f64::from(region.y));
        let (right, bottom) = self.screen_to_map_px(f64::from(region.right()), f64::from(region.bottom()));
        let margin_x = geometry.tile_width();
        let margin_y = geometry.tile_height() + self.tileset.config().offsets().full_tile.1.abs();
        let x0 = left.floor() as i32 - margin_x;
        let y0 = top.floor() as i32 - margin_y;
        let x1 = right.ceil() as i32 + margin_x;
        let y1 = bottom.ceil() as i32 + margin_y;
        CanvasRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Returns whether the sprite resolved.
    fn draw_sprite<S: OutputSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        element: &Element,
        sprite: &DrawnSprite,
        region: ScreenRect,
    ) -> bool {
        let origin = self.origin;
        let scale = self.scale;
        let held = sprite.tint.is_none() && self.frame_sprites.contains_key(&sprite.sprite);
        let resolved = if held {
            self.tileset
                .held_sprite(&sprite.sprite)
                .ok_or_else(|| SpriteError::MissingSprite {
                    tag: sprite.sprite.to_string(),
                })
        } else {
            self.tileset.frame_sprite(&sprite.sprite, sprite.tint)
        };
        let (image, (hot_x, hot_y)) = match resolved {
            Ok(resolved) => resolved,
            Err(error) => {
                if self.warned_sprites.insert(sprite.sprite.clone()) {
                    warn!(
                        sprite_tag = %sprite.sprite,
                        error = %error,
                        "renderer_sprite_unavailable_skipped"
                    );
                }
                return false;
            }
        };
        let map_x = element.canvas_x + sprite.offset_x - hot_x;
        let map_y = element.canvas_y + sprite.offset_y - hot_y;
        let params = BlitParams {
            x: ((f64::from(map_x) - origin.0) * scale).floor() as i32,
            y: ((f64::from(map_y) - origin.1) * scale).floor() as i32,
            scale,
            alpha: sprite.alpha,
            source: sprite.clip,
            clip: region,
        };
        surface.blit(image, &params);
        if sprite.tint.is_none() {
            self.frame_sprites.insert(sprite.sprite.clone(), true);
        }
        true
    }
}
