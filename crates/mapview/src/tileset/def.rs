use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{Direction8, Topology};
use crate::layers::{CellType, DarknessStyle, ExtraStyle, FogStyle, LayerKind};
use crate::sprites::{AtlasGrid, DuplicateTagPolicy, PixelRect};

#[derive(Debug, Error)]
pub enum TilesetDefError {
    #[error("read tileset '{path}': {message}")]
    Read { path: PathBuf, message: String },
    #[error("parse tileset json{}: {message}", at_path(.path))]
    Parse { path: String, message: String },
}

fn at_path(path: &str) -> String {
    if path.is_empty() || path == "." {
        String::new()
    } else {
        format!(" at {path}")
    }
}

/// Parsed tileset description, before any validation or image loading.
#[derive(Debug, Clone, Deserialize)]
pub struct TilesetDef {
    pub name: String,
    pub topology: Topology,
    pub tile_width: i32,
    pub tile_height: i32,
    #[serde(default)]
    pub hex_side: i32,
    /// Size of tall sprites (units, cities); defaults to the tile size.
    #[serde(default)]
    pub full_tile_width: Option<i32>,
    #[serde(default)]
    pub full_tile_height: Option<i32>,
    #[serde(default)]
    pub valid_dirs: Option<Vec<Direction8>>,
    #[serde(default)]
    pub cardinal_dirs: Option<Vec<Direction8>>,
    #[serde(default)]
    pub layer_order: Option<Vec<LayerKind>>,
    #[serde(default)]
    pub duplicate_policy: DuplicateTagPolicy,
    #[serde(default)]
    pub offsets: OffsetsDef,
    #[serde(default)]
    pub atlases: Vec<AtlasDef>,
    #[serde(default)]
    pub files: Vec<FileSpriteDef>,
    /// Matching groups of each terrain layer.
    #[serde(default)]
    pub terrain_layers: Vec<TerrainLayerDef>,
    #[serde(default)]
    pub terrains: Vec<TerrainDef>,
    #[serde(default)]
    pub darkness_style: DarknessStyle,
    #[serde(default)]
    pub fog_style: FogStyle,
    #[serde(default)]
    pub extras: Vec<ExtraDef>,
    #[serde(default)]
    pub city_styles: Vec<CityStyleDef>,
}

impl TilesetDef {
    /// A tileset with geometry only; everything else empty or default.
    pub fn new(name: &str, topology: Topology, tile_width: i32, tile_height: i32) -> Self {
        Self {
            name: name.to_string(),
            topology,
            tile_width,
            tile_height,
            hex_side: 0,
            full_tile_width: None,
            full_tile_height: None,
            valid_dirs: None,
            cardinal_dirs: None,
            layer_order: None,
            duplicate_policy: DuplicateTagPolicy::default(),
            offsets: OffsetsDef::default(),
            atlases: Vec::new(),
            files: Vec::new(),
            terrain_layers: Vec::new(),
            terrains: Vec::new(),
            darkness_style: DarknessStyle::default(),
            fog_style: FogStyle::default(),
            extras: Vec::new(),
            city_styles: Vec::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TilesetDefError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            TilesetDefError::Parse {
                path: error.path().to_string(),
                message: error.into_inner().to_string(),
            }
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, TilesetDefError> {
        let raw = fs::read_to_string(path).map_err(|error| TilesetDefError::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        Self::from_json_str(&raw)
    }
}

/// Pixel offsets from the tileset; tall-sprite alignment is added on load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OffsetsDef {
    pub unit_offset_x: i32,
    pub unit_offset_y: i32,
    pub unit_flag_offset_x: i32,
    pub unit_flag_offset_y: i32,
    pub city_offset_x: i32,
    pub city_offset_y: i32,
    pub city_flag_offset_x: i32,
    pub city_flag_offset_y: i32,
    pub activity_offset_x: i32,
    pub activity_offset_y: i32,
    pub occupied_offset_x: i32,
    pub occupied_offset_y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtlasDef {
    pub image: PathBuf,
    #[serde(default)]
    pub grids: Vec<GridSectionDef>,
    #[serde(default)]
    pub sprites: Vec<RectSpriteDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridSectionDef {
    #[serde(flatten)]
    pub layout: AtlasGrid,
    pub cells: Vec<GridCellDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridCellDef {
    pub row: u32,
    pub column: u32,
    pub tags: Vec<String>,
    #[serde(default)]
    pub hot_x: i32,
    #[serde(default)]
    pub hot_y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RectSpriteDef {
    pub rect: PixelRect,
    pub tags: Vec<String>,
    #[serde(default)]
    pub hot_x: i32,
    #[serde(default)]
    pub hot_y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileSpriteDef {
    pub path: PathBuf,
    pub tags: Vec<String>,
    #[serde(default)]
    pub hot_x: i32,
    #[serde(default)]
    pub hot_y: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerrainLayerDef {
    #[serde(default)]
    pub match_groups: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerrainDef {
    pub name: String,
    /// Tag stem, as in `t.l0.{graphic}1`.
    pub graphic: String,
    #[serde(default)]
    pub graphic_alt: Option<String>,
    #[serde(default)]
    pub is_water: bool,
    /// Terrain layer whose pass also draws this terrain's blend overlays.
    #[serde(default)]
    pub blend_layer: Option<usize>,
    pub layers: Vec<TerrainLayerDrawingDef>,
}

impl TerrainDef {
    pub fn graphic_names(&self) -> Vec<&str> {
        std::iter::once(self.graphic.as_str())
            .chain(self.graphic_alt.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerrainLayerDrawingDef {
    #[serde(default)]
    pub sprite_type: CellType,
    #[serde(default)]
    pub match_group: Option<String>,
    #[serde(default)]
    pub matches_with: Vec<String>,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    /// Sprites are full-tile sized and bottom aligned.
    #[serde(default)]
    pub tall: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtraDef {
    pub name: String,
    pub graphic: String,
    #[serde(default)]
    pub graphic_alt: Option<String>,
    /// Tag drawn while a worker builds this extra.
    #[serde(default)]
    pub activity_graphic: Option<String>,
    pub style: ExtraStyle,
    /// Owner flag is drawn on tiles carrying this extra.
    #[serde(default)]
    pub show_flag: bool,
}

impl ExtraDef {
    pub fn graphic_names(&self) -> Vec<&str> {
        std::iter::once(self.graphic.as_str())
            .chain(self.graphic_alt.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityStyleDef {
    pub name: String,
    /// Tag stem, as in `{graphic}_city_{threshold}`.
    pub graphic: String,
    /// Ascending minimum city sizes, one sprite set per entry.
    pub thresholds: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::RoadStyle;
    use tempfile::TempDir;

    const TRIDENT_JSON: &str = r#"{
        "name": "trident",
        "topology": "square",
        "tile_width": 30,
        "tile_height": 30,
        "atlases": [{
            "image": "tiles.png",
            "grids": [{
                "dx": 30, "dy": 30, "pixel_border_x": 1, "pixel_border_y": 1,
                "cells": [ { "row": 0, "column": 0, "tags": ["t.l0.grassland1", "t.l0.plains1"] } ]
            }],
            "sprites": [ { "rect": { "x": 0, "y": 31, "w": 30, "h": 30 }, "tags": ["t.fog"] } ]
        }],
        "files": [ { "path": "units/settlers.png", "tags": ["u.settlers"], "hot_x": 2 } ],
        "terrain_layers": [ { "match_groups": ["land", "sea"] } ],
        "terrains": [
            { "name": "grassland", "graphic": "grassland", "layers": [ { "match_group": "land" } ] }
        ],
        "fog_style": "sprite",
        "extras": [ { "name": "road", "graphic": "road.road", "style": { "road": "all_separate" } } ]
    }"#;

    #[test]
    fn parses_a_complete_definition() {
        let def = TilesetDef::from_json_str(TRIDENT_JSON).expect("parse");
        assert_eq!(def.topology, Topology::Square);
        assert_eq!(def.atlases[0].grids[0].layout.pixel_border_x, 1);
        assert_eq!(def.atlases[0].grids[0].cells[0].tags.len(), 2);
        assert_eq!(def.files[0].hot_x, 2);
        assert_eq!(def.fog_style, FogStyle::Sprite);
        assert_eq!(def.darkness_style, DarknessStyle::None);
        assert_eq!(def.terrains[0].layers[0].sprite_type, CellType::Whole);
        assert_eq!(def.extras[0].style, ExtraStyle::Road(RoadStyle::AllSeparate));
        assert_eq!(def.terrains[0].graphic_names(), vec!["grassland"]);
    }

    #[test]
    fn parse_error_names_the_failing_field() {
        let raw = TRIDENT_JSON.replace("\"tile_height\": 30", "\"tile_height\": \"thirty\"");
        let error = TilesetDef::from_json_str(&raw).expect_err("bad height");
        assert!(error.to_string().contains("tile_height"), "{error}");
    }

    #[test]
    fn reads_definition_from_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("trident.json");
        std::fs::write(&path, TRIDENT_JSON).expect("write");
        let def = TilesetDef::from_json_file(&path).expect("read");
        assert_eq!(def.name, "trident");
        assert!(matches!(
            TilesetDef::from_json_file(&dir.path().join("nope.json")),
            Err(TilesetDefError::Read { .. })
        ));
    }
}
