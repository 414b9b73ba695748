mod city;
mod darkness;
mod extras;
mod grid;
mod overlays;
mod pipeline;
mod terrain;
mod units;

use serde::{Deserialize, Serialize};

use crate::geometry::{Direction8, Element, GridGeometry, TilePos};
use crate::options::RenderOptions;
use crate::sprite_tags::SpriteTag;
use crate::sprites::{PixelRect, Rgb};
use crate::tileset::{ConfigError, TilesetConfig};
use crate::view::{GameView, MapTile, TileKnown};

pub use city::CitySprites;
pub use darkness::{DarknessSprites, DarknessStyle, FogStyle};
pub use extras::{ExtraSprites, ExtraStyle, RoadStyle};
pub use grid::GridSprites;
pub use overlays::OverlaySprites;
pub use pipeline::{InvalidLayerOrderError, LayerPipeline};
pub use terrain::{CellType, MatchStyle, TerrainSprites};
pub use units::UnitSprites;

/// Every layer, in the default draw order (back to front).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Background,
    Terrain1,
    Darkness,
    Terrain2,
    Terrain3,
    Water,
    Roads,
    Special1,
    Grid1,
    City,
    Special2,
    Fog,
    Units,
    Special3,
    BaseFlags,
    CitySize,
    Grid2,
    FocusUnit,
    Goto,
    WorkerTask,
    Editor,
    InfraWork,
}

impl LayerKind {
    pub const COUNT: usize = 22;

    pub const ALL: [LayerKind; LayerKind::COUNT] = [
        LayerKind::Background,
        LayerKind::Terrain1,
        LayerKind::Darkness,
        LayerKind::Terrain2,
        LayerKind::Terrain3,
        LayerKind::Water,
        LayerKind::Roads,
        LayerKind::Special1,
        LayerKind::Grid1,
        LayerKind::City,
        LayerKind::Special2,
        LayerKind::Fog,
        LayerKind::Units,
        LayerKind::Special3,
        LayerKind::BaseFlags,
        LayerKind::CitySize,
        LayerKind::Grid2,
        LayerKind::FocusUnit,
        LayerKind::Goto,
        LayerKind::WorkerTask,
        LayerKind::Editor,
        LayerKind::InfraWork,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One sprite a layer wants drawn for an element.
///
/// The offset is relative to the element's canvas position. `clip`, when set,
/// selects a sub-rectangle of the sprite; the offset then places that
/// sub-rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnSprite {
    pub sprite: SpriteTag,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Player colour to hue-shift the sprite into.
    pub tint: Option<Rgb>,
    pub alpha: u8,
    pub clip: Option<PixelRect>,
}

impl DrawnSprite {
    pub fn at(sprite: SpriteTag, (offset_x, offset_y): (i32, i32)) -> Self {
        Self {
            sprite,
            offset_x,
            offset_y,
            tint: None,
            alpha: u8::MAX,
            clip: None,
        }
    }

    pub fn tinted(mut self, color: Rgb) -> Self {
        self.tint = Some(color);
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    /// Draws only `clip` of the sprite, placed at the clip's own offset.
    pub fn clipped(mut self, clip: PixelRect) -> Self {
        self.offset_x += clip.x as i32;
        self.offset_y += clip.y as i32;
        self.clip = Some(clip);
        self
    }
}

/// Everything a layer may read while filling its sprite list.
#[derive(Clone, Copy)]
pub struct LayerContext<'a> {
    pub config: &'a TilesetConfig,
    pub view: &'a dyn GameView,
    pub options: &'a RenderOptions,
}

impl<'a> LayerContext<'a> {
    pub fn geometry(&self) -> &'a GridGeometry {
        &self.config.geometry
    }

    /// Tile data the viewer is allowed to draw (known or fogged).
    pub(crate) fn visible_tile(&self, pos: TilePos) -> Option<&'a MapTile> {
        if self.view.known(pos) == TileKnown::Unknown {
            return None;
        }
        self.view.tile(pos)
    }

    /// Neighbour tile as used for adjacency matching; unknown or off-map
    /// neighbours yield `None` so callers substitute the tile itself.
    pub(crate) fn adjacent_tile(&self, pos: TilePos, dir: Direction8) -> Option<&'a MapTile> {
        let next = self.view.extent().step(pos, dir)?;
        self.visible_tile(next)
    }
}

/// Resolves sprite names while a tileset loads.
pub(crate) trait SpriteBinder {
    /// Acquires the first candidate that is registered and decodes. A
    /// `required` lookup that finds nothing records a load error.
    fn bind(&mut self, candidates: &[String], required: bool) -> Option<SpriteTag>;
    fn error(&mut self, error: ConfigError);
    fn warn(&mut self, message: String);

    fn bind_one(&mut self, tag: String, required: bool) -> Option<SpriteTag> {
        self.bind(std::slice::from_ref(&tag), required)
    }
}

pub(crate) fn fill_layer(
    kind: LayerKind,
    element: &Element,
    ctx: &LayerContext<'_>,
    out: &mut Vec<DrawnSprite>,
) {
    match kind {
        LayerKind::Background => overlays::fill_background(element, ctx, out),
        LayerKind::Terrain1 => terrain::fill_terrain(0, element, ctx, out),
        LayerKind::Terrain2 => terrain::fill_terrain(1, element, ctx, out),
        LayerKind::Terrain3 => terrain::fill_terrain(2, element, ctx, out),
        LayerKind::Darkness => darkness::fill_darkness(element, ctx, out),
        LayerKind::Fog => darkness::fill_fog(element, ctx, out),
        LayerKind::Water => extras::fill_water(element, ctx, out),
        LayerKind::Roads => extras::fill_roads(element, ctx, out),
        LayerKind::Special1 => extras::fill_special(1, element, ctx, out),
        LayerKind::Special2 => extras::fill_special(2, element, ctx, out),
        LayerKind::Special3 => extras::fill_special(3, element, ctx, out),
        LayerKind::BaseFlags => extras::fill_base_flags(element, ctx, out),
        LayerKind::City => city::fill_city(element, ctx, out),
        LayerKind::CitySize => city::fill_city_size(element, ctx, out),
        LayerKind::Units => units::fill_units(element, ctx, out),
        LayerKind::FocusUnit => units::fill_focus_unit(element, ctx, out),
        LayerKind::Grid1 => {
            if ctx.geometry().is_isometric() {
                grid::fill_grid(element, ctx, out);
            }
        }
        LayerKind::Grid2 => {
            if !ctx.geometry().is_isometric() {
                grid::fill_grid(element, ctx, out);
            }
        }
        LayerKind::Goto => overlays::fill_goto(element, ctx, out),
        LayerKind::WorkerTask => overlays::fill_worker_task(element, ctx, out),
        LayerKind::Editor => overlays::fill_editor(element, ctx, out),
        LayerKind::InfraWork => overlays::fill_infra_work(element, ctx, out),
    }
}

/// Part of a tile facing each [`Direction4`](crate::geometry::Direction4)
/// neighbour in tile pixels, indexed N, S, E, W.
pub(crate) fn facing_parts(geometry: &GridGeometry) -> [PixelRect; 4] {
    let w = geometry.tile_width() as u32;
    let h = geometry.tile_height() as u32;
    if geometry.is_isometric() {
        [
            PixelRect::new(w / 2, 0, w / 2, h / 2),
            PixelRect::new(0, h / 2, w / 2, h / 2),
            PixelRect::new(w / 2, h / 2, w / 2, h / 2),
            PixelRect::new(0, 0, w / 2, h / 2),
        ]
    } else {
        [
            PixelRect::new(0, 0, w, h / 2),
            PixelRect::new(0, h / 2, w, h / 2),
            PixelRect::new(w / 2, 0, w / 2, h),
            PixelRect::new(0, 0, w / 2, h),
        ]
    }
}

/// Pushes the digit sprites of `value` (capped at 99), tens first.
pub(crate) fn push_digits(
    value: u32,
    ones: &[Option<SpriteTag>],
    tens: &[Option<SpriteTag>],
    offset: (i32, i32),
    out: &mut Vec<DrawnSprite>,
) {
    let value = value.min(99) as usize;
    if value >= 10 {
        if let Some(Some(tag)) = tens.get(value / 10) {
            out.push(DrawnSprite::at(tag.clone(), offset));
        }
    }
    if let Some(Some(tag)) = ones.get(value % 10) {
        out.push(DrawnSprite::at(tag.clone(), offset));
    }
}

/// Binds `{prefix}{digit}` and `{prefix}{digit}0` tables for [`push_digits`].
pub(crate) fn bind_digits(
    binder: &mut dyn SpriteBinder,
    prefix: &str,
) -> (Vec<Option<SpriteTag>>, Vec<Option<SpriteTag>>) {
    let ones = (0..10)
        .map(|digit| binder.bind_one(format!("{prefix}{digit}"), false))
        .collect();
    let tens = (0..10)
        .map(|digit| {
            if digit == 0 {
                None
            } else {
                binder.bind_one(format!("{prefix}{digit}0"), false)
            }
        })
        .collect();
    (ones, tens)
}

/// One candidate name per graphic stem, in preference order.
pub(crate) fn stem_names(graphics: &[&str], name: impl Fn(&str) -> String) -> Vec<String> {
    graphics.iter().map(|graphic| name(graphic)).collect()
}

/// Dynamic tag taken from game data (unit types, nation flags).
pub(crate) fn game_tag(text: &str) -> Option<SpriteTag> {
    SpriteTag::new(text).ok()
}
