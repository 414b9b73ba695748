mod def;
mod load;

use thiserror::Error;

use crate::geometry::{GeometryError, GridGeometry};
use crate::layers::{
    CitySprites, DarknessSprites, ExtraSprites, GridSprites, InvalidLayerOrderError,
    OverlaySprites, TerrainSprites, UnitSprites,
};
use crate::sprite_tags::SpriteTagError;
use crate::sprites::SpriteError;

pub use def::{
    AtlasDef, CityStyleDef, ExtraDef, FileSpriteDef, GridCellDef, GridSectionDef, OffsetsDef,
    RectSpriteDef, TerrainDef, TerrainLayerDef, TerrainLayerDrawingDef, TilesetDef,
    TilesetDefError,
};
pub use load::{LoadReport, Tileset, TilesetLoadError};

/// One problem found while loading a tileset.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    LayerOrder(#[from] InvalidLayerOrderError),
    #[error(transparent)]
    Sprite(#[from] SpriteError),
    #[error("invalid sprite tag '{tag}': {source}")]
    Tag {
        tag: String,
        #[source]
        source: SpriteTagError,
    },
    #[error("terrain '{terrain}' layer {layer} uses unknown matching group '{group}'")]
    UnknownMatchingGroup {
        terrain: String,
        layer: usize,
        group: String,
    },
    #[error("no tileset drawing for terrain '{name}'")]
    UnknownTerrain { name: String },
    #[error("none of the required sprites [{}] is available", .tags.join(", "))]
    MissingRequiredSprite { tags: Vec<String> },
    #[error("invalid value at {path}: {message}")]
    InvalidValue { path: String, message: String },
}

/// Pixel offsets of tile-relative sprites, tall-sprite alignment included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawOffsets {
    /// Aligns a full-tile sprite centred on the bottom of the tile.
    pub full_tile: (i32, i32),
    pub unit: (i32, i32),
    pub unit_flag: (i32, i32),
    pub city: (i32, i32),
    pub city_flag: (i32, i32),
    pub activity: (i32, i32),
    pub occupied: (i32, i32),
}

impl DrawOffsets {
    pub(crate) fn from_def(def: &TilesetDef, geometry: &GridGeometry) -> Self {
        let tile_width = geometry.tile_width();
        let tile_height = geometry.tile_height();
        let full_width = def.full_tile_width.unwrap_or(tile_width);
        let full_height = def.full_tile_height.unwrap_or(tile_height);
        let full_tile = ((tile_width - full_width) / 2, tile_height - full_height);
        let shifted = |x: i32, y: i32| (full_tile.0 + x, full_tile.1 + y);
        let offsets = &def.offsets;
        Self {
            full_tile,
            unit: shifted(offsets.unit_offset_x, offsets.unit_offset_y),
            unit_flag: shifted(offsets.unit_flag_offset_x, offsets.unit_flag_offset_y),
            city: shifted(offsets.city_offset_x, offsets.city_offset_y),
            city_flag: shifted(offsets.city_flag_offset_x, offsets.city_flag_offset_y),
            activity: shifted(offsets.activity_offset_x, offsets.activity_offset_y),
            occupied: shifted(offsets.occupied_offset_x, offsets.occupied_offset_y),
        }
    }
}

/// Everything the layers read from a loaded tileset.
#[derive(Debug, Clone)]
pub struct TilesetConfig {
    pub(crate) geometry: GridGeometry,
    pub(crate) offsets: DrawOffsets,
    pub(crate) terrain: TerrainSprites,
    pub(crate) darkness: DarknessSprites,
    pub(crate) extras: ExtraSprites,
    pub(crate) units: UnitSprites,
    pub(crate) city: CitySprites,
    pub(crate) grid: GridSprites,
    pub(crate) overlays: OverlaySprites,
}

impl TilesetConfig {
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn offsets(&self) -> &DrawOffsets {
        &self.offsets
    }

    pub fn terrain(&self) -> &TerrainSprites {
        &self.terrain
    }

    pub fn darkness(&self) -> &DarknessSprites {
        &self.darkness
    }

    pub fn extras(&self) -> &ExtraSprites {
        &self.extras
    }

    pub fn units(&self) -> &UnitSprites {
        &self.units
    }

    pub fn city(&self) -> &CitySprites {
        &self.city
    }
}
