use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Direction4, Direction8, Element, GridGeometry, TilePos};
use crate::sprite_tags::SpriteTag;
use crate::tileset::{ConfigError, TerrainDef, TilesetDef};

use super::{facing_parts, stem_names, DrawnSprite, LayerContext, SpriteBinder};

/// Terrain layers a tileset may define.
pub const MAX_TERRAIN_LAYERS: usize = 3;
const MAX_VARIANTS: usize = 16;
const BLEND_ALPHA: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// One sprite covering the whole tile.
    #[default]
    Whole,
    /// Four quarter cells, each chosen by the three neighbours at that corner.
    Corner,
    /// One cell per valid direction, chosen by the two neighbours beside it.
    HexCorner,
}

/// How a terrain layer looks at its neighbours, derived from the number of
/// matching groups it lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStyle {
    None,
    /// Matches only its own group.
    Same,
    /// Own group plus exactly one other.
    Pair,
    /// Three or more groups; neighbours index by group position.
    Full,
}

impl MatchStyle {
    /// `indices` holds the own group first, then the groups matched with.
    pub fn from_match_indices(indices: &[usize]) -> Self {
        match indices {
            [] | [_] => MatchStyle::None,
            [own, other] if own == other => MatchStyle::Same,
            [_, _] => MatchStyle::Pair,
            _ => MatchStyle::Full,
        }
    }
}

#[derive(Debug, Clone)]
struct TerrainLayerDrawing {
    cell_type: CellType,
    match_style: MatchStyle,
    match_index: Vec<usize>,
    offset: (i32, i32),
    variants: Vec<SpriteTag>,
    same: Vec<Option<SpriteTag>>,
    cells: Vec<Option<SpriteTag>>,
}

impl TerrainLayerDrawing {
    fn own_group(&self) -> Option<usize> {
        self.match_index.first().copied()
    }

    /// Digit base of one neighbour in corner indices.
    fn base(&self) -> usize {
        match self.match_style {
            MatchStyle::Full => self.match_index.len(),
            _ => 2,
        }
    }

    /// Digit 1 marks a matching neighbour: own group for `Same`, the
    /// matched group for `Pair`.
    fn neighbor_digit(&self, group: Option<usize>) -> usize {
        match self.match_style {
            MatchStyle::None => 0,
            MatchStyle::Same => usize::from(group == self.own_group()),
            MatchStyle::Pair => usize::from(group == self.match_index.get(1).copied()),
            MatchStyle::Full => group
                .and_then(|group| self.match_index.iter().position(|index| *index == group))
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
struct TerrainDrawing {
    is_water: bool,
    layers: Vec<TerrainLayerDrawing>,
    blend_layer: Option<usize>,
    blend: Option<SpriteTag>,
}

/// Per-terrain sprite tables for the three terrain layers.
#[derive(Debug, Clone, Default)]
pub struct TerrainSprites {
    drawings: HashMap<String, TerrainDrawing>,
}

impl TerrainSprites {
    pub fn contains(&self, terrain: &str) -> bool {
        self.drawings.contains_key(terrain)
    }

    pub fn is_water(&self, terrain: &str) -> bool {
        self.drawings.get(terrain).is_some_and(|drawing| drawing.is_water)
    }

    pub fn match_style(&self, terrain: &str, layer: usize) -> Option<MatchStyle> {
        self.drawings
            .get(terrain)
            .and_then(|drawing| drawing.layers.get(layer))
            .map(|layer| layer.match_style)
    }

    fn group_of(&self, terrain: &str, layer: usize) -> Option<usize> {
        self.drawings
            .get(terrain)
            .and_then(|drawing| drawing.layers.get(layer))
            .and_then(TerrainLayerDrawing::own_group)
    }

    pub(crate) fn build(
        def: &TilesetDef,
        geometry: &GridGeometry,
        full_tile_offset: (i32, i32),
        binder: &mut dyn SpriteBinder,
    ) -> Self {
        if def.terrain_layers.len() > MAX_TERRAIN_LAYERS {
            binder.error(ConfigError::InvalidValue {
                path: "terrain_layers".to_string(),
                message: format!(
                    "at most {MAX_TERRAIN_LAYERS} terrain layers are supported, got {}",
                    def.terrain_layers.len()
                ),
            });
        }

        let mut drawings = HashMap::new();
        for (index, terrain) in def.terrains.iter().enumerate() {
            let path = format!("terrains[{index}]");
            if drawings.contains_key(&terrain.name) {
                binder.error(ConfigError::InvalidValue {
                    path: format!("{path}.name"),
                    message: format!("terrain '{}' is defined twice", terrain.name),
                });
                continue;
            }
            if terrain.layers.is_empty() || terrain.layers.len() > MAX_TERRAIN_LAYERS {
                binder.error(ConfigError::InvalidValue {
                    path: format!("{path}.layers"),
                    message: format!(
                        "expected 1..={MAX_TERRAIN_LAYERS} layers, got {}",
                        terrain.layers.len()
                    ),
                });
                continue;
            }
            if let Some(drawing) =
                build_drawing(def, geometry, full_tile_offset, terrain, &path, binder)
            {
                drawings.insert(terrain.name.clone(), drawing);
            }
        }
        Self { drawings }
    }
}

fn build_drawing(
    def: &TilesetDef,
    geometry: &GridGeometry,
    full_tile_offset: (i32, i32),
    terrain: &TerrainDef,
    path: &str,
    binder: &mut dyn SpriteBinder,
) -> Option<TerrainDrawing> {
    let graphics = terrain.graphic_names();

    let mut layers = Vec::with_capacity(terrain.layers.len());
    let mut valid = true;
    for (l, layer) in terrain.layers.iter().enumerate() {
        let groups = def
            .terrain_layers
            .get(l)
            .map(|layer| layer.match_groups.as_slice())
            .unwrap_or(&[]);
        let names: Vec<&str> = match &layer.match_group {
            Some(group) => std::iter::once(group.as_str())
                .chain(layer.matches_with.iter().map(String::as_str))
                .collect(),
            None => {
                if !layer.matches_with.is_empty() {
                    valid = false;
                    binder.error(ConfigError::InvalidValue {
                        path: format!("{path}.layers[{l}].matches_with"),
                        message: "matches_with requires a match_group".to_string(),
                    });
                }
                Vec::new()
            }
        };
        let mut match_index = Vec::with_capacity(names.len());
        for group in names {
            match groups.iter().position(|name| name == group) {
                Some(position) => match_index.push(position),
                None => {
                    valid = false;
                    binder.error(ConfigError::UnknownMatchingGroup {
                        terrain: terrain.name.clone(),
                        layer: l,
                        group: group.to_string(),
                    });
                }
            }
        }

        let match_style = MatchStyle::from_match_indices(&match_index);
        let mut offset = (layer.offset_x, layer.offset_y);
        if layer.tall {
            offset.0 += full_tile_offset.0;
            offset.1 += full_tile_offset.1;
        }
        let mut drawing = TerrainLayerDrawing {
            cell_type: layer.sprite_type,
            match_style,
            match_index,
            offset,
            variants: Vec::new(),
            same: Vec::new(),
            cells: Vec::new(),
        };

        match layer.sprite_type {
            CellType::Whole => match match_style {
                MatchStyle::None => {
                    for variant in 1..=MAX_VARIANTS {
                        let required = variant == 1;
                        let names = stem_names(&graphics, |graphic| format!("t.l{l}.{graphic}{variant}"));
                        match binder.bind(&names, required) {
                            Some(tag) => drawing.variants.push(tag),
                            None => break,
                        }
                    }
                    valid &= !drawing.variants.is_empty();
                }
                MatchStyle::Same => {
                    let cardinal = geometry.cardinal_dirs();
                    for index in 0..(1usize << cardinal.len()) {
                        let suffix = cardinal.index_name(index);
                        let names = stem_names(&graphics, |graphic| format!("t.l{l}.{graphic}_{suffix}"));
                        drawing.same.push(binder.bind(&names, true));
                    }
                }
                MatchStyle::Pair | MatchStyle::Full => {
                    valid = false;
                    binder.error(ConfigError::InvalidValue {
                        path: format!("{path}.layers[{l}].matches_with"),
                        message: "whole sprites only support none or same matching".to_string(),
                    });
                }
            },
            CellType::Corner => {
                let base = drawing.base();
                let per_cell = base.pow(3);
                let mut missing = 0usize;
                for dir in Direction4::ALL {
                    for value in 0..per_cell {
                        if match_style == MatchStyle::None && value != 0 {
                            drawing.cells.push(None);
                            continue;
                        }
                        let (b0, b1, b2) = (value % base, (value / base) % base, value / (base * base));
                        let letter = dir.cell_letter();
                        let names =
                            stem_names(&graphics, |graphic| format!("t.l{l}.{graphic}_cell_{letter}{b0}{b1}{b2}"));
                        let tag = binder.bind(&names, false);
                        missing += usize::from(tag.is_none());
                        drawing.cells.push(tag);
                    }
                }
                if missing > 0 {
                    binder.warn(format!(
                        "terrain '{}' layer {l}: {missing} corner cell sprite(s) missing",
                        terrain.name
                    ));
                }
            }
            CellType::HexCorner => {
                if !geometry.topology().is_hex() {
                    valid = false;
                    binder.error(ConfigError::InvalidValue {
                        path: format!("{path}.layers[{l}].sprite_type"),
                        message: "hex_corner sprites need a hex topology".to_string(),
                    });
                } else {
                    let base = drawing.base();
                    let mut missing = 0usize;
                    for dir in geometry.valid_dirs().iter() {
                        for value in 0..base * base {
                            let (b0, b1) = (value % base, value / base);
                            let name = dir.tileset_name();
                            let names = stem_names(&graphics, |graphic| {
                                format!("t.l{l}.{graphic}_hcell_{name}{b0}{b1}")
                            });
                            let tag = binder.bind(&names, false);
                            missing += usize::from(tag.is_none());
                            drawing.cells.push(tag);
                        }
                    }
                    if missing > 0 {
                        binder.warn(format!(
                            "terrain '{}' layer {l}: {missing} hex cell sprite(s) missing",
                            terrain.name
                        ));
                    }
                }
            }
        }
        layers.push(drawing);
    }

    let mut blend = None;
    if let Some(blend_layer) = terrain.blend_layer {
        if blend_layer >= terrain.layers.len() {
            valid = false;
            binder.error(ConfigError::InvalidValue {
                path: format!("{path}.blend_layer"),
                message: format!(
                    "blend layer {blend_layer} exceeds the terrain's {} layer(s)",
                    terrain.layers.len()
                ),
            });
        } else {
            blend = binder.bind(&stem_names(&graphics, |graphic| format!("t.blend.{graphic}")), true);
            valid &= blend.is_some();
        }
    }

    valid.then_some(TerrainDrawing {
        is_water: terrain.is_water,
        layers,
        blend_layer: terrain.blend_layer,
        blend,
    })
}

fn corner_cell_offsets(geometry: &GridGeometry) -> [(i32, i32); 4] {
    let w = geometry.tile_width();
    let h = geometry.tile_height();
    if geometry.is_isometric() {
        [(w / 4, 0), (w / 4, h / 2), (w / 2, h / 4), (0, h / 4)]
    } else {
        [(0, 0), (w / 2, h / 2), (w / 2, 0), (0, h / 2)]
    }
}

/// Deterministic variant pick, stable per tile.
fn variant_index(tile_index: usize, count: usize) -> usize {
    const LARGE_PRIME: u64 = 10007;
    const SMALL_PRIME: u64 = 1009;
    (((tile_index as u64 * LARGE_PRIME) % SMALL_PRIME) as usize) % count
}

pub(crate) fn fill_terrain(
    layer: usize,
    element: &Element,
    ctx: &LayerContext<'_>,
    out: &mut Vec<DrawnSprite>,
) {
    if !ctx.options.draw_terrain {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    let Some(tile) = ctx.visible_tile(pos) else {
        return;
    };
    let sprites = &ctx.config.terrain;
    let Some(drawing) = sprites.drawings.get(&tile.terrain) else {
        return;
    };

    if let Some(cells) = drawing.layers.get(layer) {
        let own = cells.own_group();
        let neighbor_group = |dir: Direction8| -> Option<usize> {
            match ctx.adjacent_tile(pos, dir) {
                Some(neighbor) => sprites.group_of(&neighbor.terrain, layer),
                None => own,
            }
        };
        fill_cells(cells, pos, ctx, &neighbor_group, out);
    }

    if drawing.blend_layer == Some(layer) {
        let parts = facing_parts(ctx.geometry());
        for dir in Direction4::ALL {
            let Some(neighbor) = ctx.adjacent_tile(pos, dir.to_dir8()) else {
                continue;
            };
            if neighbor.terrain == tile.terrain {
                continue;
            }
            let Some(blend) = sprites
                .drawings
                .get(&neighbor.terrain)
                .and_then(|other| other.blend.as_ref())
            else {
                continue;
            };
            out.push(
                DrawnSprite::at(blend.clone(), (0, 0))
                    .clipped(parts[dir.index()])
                    .with_alpha(BLEND_ALPHA),
            );
        }
    }
}

fn fill_cells(
    cells: &TerrainLayerDrawing,
    pos: TilePos,
    ctx: &LayerContext<'_>,
    neighbor_group: &dyn Fn(Direction8) -> Option<usize>,
    out: &mut Vec<DrawnSprite>,
) {
    let geometry = ctx.geometry();
    let (ox, oy) = cells.offset;
    match cells.cell_type {
        CellType::Whole => match cells.match_style {
            MatchStyle::Same => {
                let own = cells.own_group();
                let index = geometry
                    .cardinal_dirs()
                    .iter()
                    .enumerate()
                    .filter(|(_, dir)| neighbor_group(*dir) == own)
                    .fold(0usize, |index, (bit, _)| index | (1 << bit));
                if let Some(Some(tag)) = cells.same.get(index) {
                    out.push(DrawnSprite::at(tag.clone(), (ox, oy)));
                }
            }
            _ => {
                if cells.variants.is_empty() {
                    return;
                }
                let tile_index = ctx.view.extent().index(pos).unwrap_or(0);
                let tag = &cells.variants[variant_index(tile_index, cells.variants.len())];
                out.push(DrawnSprite::at(tag.clone(), (ox, oy)));
            }
        },
        CellType::Corner => {
            let base = cells.base();
            let per_cell = base.pow(3);
            let offsets = corner_cell_offsets(geometry);
            for dir4 in Direction4::ALL {
                let dir = dir4.to_dir8().ccw();
                let digits = [dir.ccw(), dir, dir.cw()].map(|d| cells.neighbor_digit(neighbor_group(d)));
                let value = digits[0] + base * digits[1] + base * base * digits[2];
                let slot = dir4.index() * per_cell + value;
                if let Some(Some(tag)) = cells.cells.get(slot) {
                    let (cx, cy) = offsets[dir4.index()];
                    out.push(DrawnSprite::at(tag.clone(), (ox + cx, oy + cy)));
                }
            }
        }
        CellType::HexCorner => {
            let base = cells.base();
            let valid = geometry.valid_dirs().as_slice();
            for (position, dir) in valid.iter().enumerate() {
                let next = valid[(position + 1) % valid.len()];
                let value = cells.neighbor_digit(neighbor_group(*dir))
                    + base * cells.neighbor_digit(neighbor_group(next));
                if let Some(Some(tag)) = cells.cells.get(position * base * base + value) {
                    out.push(DrawnSprite::at(tag.clone(), (ox, oy)));
                }
            }
        }
    }
}
