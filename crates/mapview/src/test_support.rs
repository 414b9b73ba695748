use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::geometry::{Element, ElementKind, TilePos, Topology};
use crate::layers::{fill_layer, CellType, DrawnSprite, ExtraStyle, LayerKind};
use crate::options::RenderOptions;
use crate::sprites::{ImageLoader, ResourceError};
use crate::tileset::{
    ExtraDef, FileSpriteDef, TerrainDef, TerrainLayerDrawingDef, Tileset, TilesetDef,
    TilesetLoadError,
};
use crate::view::GameView;

/// File every [`sprite_def`] tag points at.
pub(crate) const SPRITE_PATH: &str = "sprite.png";

/// In-memory image source that counts how often each path is decoded.
#[derive(Debug, Default)]
pub(crate) struct MemoryLoader {
    images: HashMap<PathBuf, RgbaImage>,
    loads: HashMap<PathBuf, usize>,
}

impl MemoryLoader {
    pub(crate) fn with_image(self, path: &str, width: u32, height: u32) -> Self {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        self.with_pixels(path, image)
    }

    pub(crate) fn with_pixels(mut self, path: &str, image: RgbaImage) -> Self {
        self.images.insert(PathBuf::from(path), image);
        self
    }

    pub(crate) fn load_count(&self, path: &str) -> usize {
        self.loads.get(Path::new(path)).copied().unwrap_or(0)
    }
}

impl ImageLoader for MemoryLoader {
    fn load(&mut self, path: &Path) -> Result<RgbaImage, ResourceError> {
        *self.loads.entry(path.to_path_buf()).or_insert(0) += 1;
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::Open {
                path: path.to_path_buf(),
                reason: "not found".to_string(),
            })
    }
}

pub(crate) fn loader() -> MemoryLoader {
    MemoryLoader::default().with_image(SPRITE_PATH, 8, 8)
}

/// Tileset whose every tag is the same 8x8 file sprite. The grid lines a
/// topology requires are added when missing.
pub(crate) fn sprite_def(topology: Topology, width: i32, height: i32, tags: &[&str]) -> TilesetDef {
    let mut def = TilesetDef::new("test", topology, width, height);
    let mut tags: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
    let hex_line = match topology {
        Topology::Hex => Some("grid.main.lr"),
        Topology::IsoHex => Some("grid.main.ud"),
        Topology::Square | Topology::Isometric => None,
    };
    for required in ["grid.main.ns", "grid.main.we"].into_iter().chain(hex_line) {
        if !tags.iter().any(|tag| tag == required) {
            tags.push(required.to_string());
        }
    }
    def.files.push(FileSpriteDef {
        path: PathBuf::from(SPRITE_PATH),
        tags,
        hot_x: 0,
        hot_y: 0,
    });
    def
}

pub(crate) fn load_tileset(def: TilesetDef) -> Tileset<MemoryLoader> {
    match Tileset::load(&def, loader()) {
        Ok((tileset, _)) => tileset,
        Err(error) => panic!("tileset should load: {:#?}", error.report.errors),
    }
}

pub(crate) fn load_tileset_err(def: TilesetDef) -> TilesetLoadError {
    match Tileset::load(&def, loader()) {
        Ok(_) => panic!("tileset '{}' should not load", def.name),
        Err(error) => error,
    }
}

/// Terrain drawn from its own name, one drawing layer per cell type.
pub(crate) fn terrain(name: &str, cells: &[CellType]) -> TerrainDef {
    TerrainDef {
        name: name.to_string(),
        graphic: name.to_string(),
        graphic_alt: None,
        is_water: false,
        blend_layer: None,
        layers: cells
            .iter()
            .map(|cell| TerrainLayerDrawingDef {
                sprite_type: *cell,
                ..TerrainLayerDrawingDef::default()
            })
            .collect(),
    }
}

pub(crate) fn extra(name: &str, graphic: &str, style: ExtraStyle) -> ExtraDef {
    ExtraDef {
        name: name.to_string(),
        graphic: graphic.to_string(),
        graphic_alt: None,
        activity_graphic: None,
        style,
        show_flag: false,
    }
}

pub(crate) fn tile_element<L: ImageLoader>(tileset: &Tileset<L>, pos: TilePos) -> Element {
    let (canvas_x, canvas_y) = tileset.geometry().tile_canvas_pos(pos);
    Element {
        kind: ElementKind::Tile(pos),
        canvas_x,
        canvas_y,
    }
}

/// Sprites a single layer draws for `element`.
pub(crate) fn layer_sprites<L: ImageLoader>(
    tileset: &Tileset<L>,
    view: &dyn GameView,
    options: &RenderOptions,
    kind: LayerKind,
    element: &Element,
) -> Vec<DrawnSprite> {
    let ctx = tileset.layer_context(view, options);
    let mut out = Vec::new();
    fill_layer(kind, element, &ctx, &mut out);
    out
}
