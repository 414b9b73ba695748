use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::direction::{DirSet, Direction8};
use super::iter::{CellLayout, HEX_LAYOUT, ISO_HEX_LAYOUT, ISO_LAYOUT, SQUARE_LAYOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    Square,
    Isometric,
    Hex,
    IsoHex,
}

impl Topology {
    pub const fn is_isometric(self) -> bool {
        matches!(self, Topology::Isometric | Topology::IsoHex)
    }

    pub const fn is_hex(self) -> bool {
        matches!(self, Topology::Hex | Topology::IsoHex)
    }

    /// Directions a tile has neighbours in.
    pub fn default_valid_dirs(self) -> DirSet {
        match self {
            Topology::Square | Topology::Isometric => DirSet::from_predicate(|_| true),
            Topology::Hex => DirSet::from_predicate(|dir| {
                !matches!(dir, Direction8::NorthWest | Direction8::SouthEast)
            }),
            Topology::IsoHex => DirSet::from_predicate(|dir| {
                !matches!(dir, Direction8::NorthEast | Direction8::SouthWest)
            }),
        }
    }

    /// Directions that share a full edge with the tile.
    pub fn default_cardinal_dirs(self) -> DirSet {
        match self {
            Topology::Square | Topology::Isometric => DirSet::from_predicate(|dir| {
                matches!(
                    dir,
                    Direction8::North | Direction8::East | Direction8::South | Direction8::West
                )
            }),
            Topology::Hex | Topology::IsoHex => self.default_valid_dirs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("tile size must be positive (got {width}x{height})")]
    EmptyTile { width: i32, height: i32 },
    #[error("tile size {width}x{height} must be even in both dimensions")]
    OddTileSize { width: i32, height: i32 },
    #[error("isometric tile width {width} must be a multiple of 4")]
    IsoWidthNotQuarterable { width: i32 },
    #[error("hex side {hex_side} is only meaningful for hex topologies")]
    HexSideOnNonHex { hex_side: i32 },
    #[error("hex side {hex_side} must lie in 0..{limit}")]
    HexSideOutOfRange { hex_side: i32, limit: i32 },
    #[error("valid direction list must be clockwise from north without repeats")]
    DirectionsNotClockwise,
    #[error("valid direction count must be even (got {count})")]
    OddValidDirections { count: usize },
    #[error("cardinal direction {dir:?} is not a valid direction")]
    CardinalNotValid { dir: Direction8 },
    #[error("at least one cardinal direction is required")]
    NoCardinalDirections,
}

/// Tile shape and adjacency of one tileset.
///
/// Built once per tileset; the cell classification layout is picked here and
/// never re-dispatched per element.
#[derive(Debug, Clone)]
pub struct GridGeometry {
    topology: Topology,
    tile_width: i32,
    tile_height: i32,
    hex_side: i32,
    valid_dirs: DirSet,
    cardinal_dirs: DirSet,
    layout: &'static dyn CellLayout,
}

impl GridGeometry {
    pub fn new(
        topology: Topology,
        tile_width: i32,
        tile_height: i32,
        hex_side: i32,
    ) -> Result<Self, GeometryError> {
        Self::with_dirs(
            topology,
            tile_width,
            tile_height,
            hex_side,
            topology.default_valid_dirs().as_slice().to_vec(),
            topology.default_cardinal_dirs().as_slice().to_vec(),
        )
    }

    pub fn with_dirs(
        topology: Topology,
        tile_width: i32,
        tile_height: i32,
        hex_side: i32,
        valid_dirs: Vec<Direction8>,
        cardinal_dirs: Vec<Direction8>,
    ) -> Result<Self, GeometryError> {
        if tile_width <= 0 || tile_height <= 0 {
            return Err(GeometryError::EmptyTile {
                width: tile_width,
                height: tile_height,
            });
        }
        if tile_width % 2 != 0 || tile_height % 2 != 0 {
            return Err(GeometryError::OddTileSize {
                width: tile_width,
                height: tile_height,
            });
        }
        if topology.is_isometric() && tile_width % 4 != 0 {
            return Err(GeometryError::IsoWidthNotQuarterable { width: tile_width });
        }
        if hex_side != 0 && !topology.is_hex() {
            return Err(GeometryError::HexSideOnNonHex { hex_side });
        }
        let limit = if topology.is_isometric() {
            tile_width
        } else {
            tile_height
        };
        if hex_side < 0 || hex_side >= limit {
            return Err(GeometryError::HexSideOutOfRange { hex_side, limit });
        }

        let valid_dirs = DirSet::new(valid_dirs).ok_or(GeometryError::DirectionsNotClockwise)?;
        if valid_dirs.len() % 2 != 0 {
            return Err(GeometryError::OddValidDirections {
                count: valid_dirs.len(),
            });
        }
        let cardinal_dirs =
            DirSet::new(cardinal_dirs).ok_or(GeometryError::DirectionsNotClockwise)?;
        if cardinal_dirs.is_empty() {
            return Err(GeometryError::NoCardinalDirections);
        }
        if let Some(dir) = cardinal_dirs.iter().find(|dir| !valid_dirs.contains(*dir)) {
            return Err(GeometryError::CardinalNotValid { dir });
        }

        let layout: &'static dyn CellLayout = match topology {
            Topology::Square => &SQUARE_LAYOUT,
            Topology::Isometric => &ISO_LAYOUT,
            Topology::Hex if hex_side > 0 => &HEX_LAYOUT,
            Topology::Hex => &SQUARE_LAYOUT,
            Topology::IsoHex if hex_side > 0 => &ISO_HEX_LAYOUT,
            Topology::IsoHex => &ISO_LAYOUT,
        };

        Ok(Self {
            topology,
            tile_width,
            tile_height,
            hex_side,
            valid_dirs,
            cardinal_dirs,
            layout,
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn tile_width(&self) -> i32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> i32 {
        self.tile_height
    }

    pub fn is_isometric(&self) -> bool {
        self.topology.is_isometric()
    }

    /// Width of the flat hex side (iso-hex tilesets only).
    pub fn hex_width(&self) -> i32 {
        if self.topology == Topology::IsoHex {
            self.hex_side
        } else {
            0
        }
    }

    /// Height of the flat hex side (overhead hex tilesets only).
    pub fn hex_height(&self) -> i32 {
        if self.topology == Topology::Hex {
            self.hex_side
        } else {
            0
        }
    }

    pub fn valid_dirs(&self) -> &DirSet {
        &self.valid_dirs
    }

    pub fn cardinal_dirs(&self) -> &DirSet {
        &self.cardinal_dirs
    }

    pub fn is_valid_dir(&self, dir: Direction8) -> bool {
        self.valid_dirs.contains(dir)
    }

    pub fn is_cardinal_dir(&self, dir: Direction8) -> bool {
        self.cardinal_dirs.contains(dir)
    }

    pub(crate) fn layout(&self) -> &'static dyn CellLayout {
        self.layout
    }

    /// Canvas position of the tile's bounding box.
    pub fn tile_canvas_pos(&self, pos: TilePos) -> (i32, i32) {
        if self.is_isometric() {
            (
                (pos.x - pos.y) * self.tile_width / 2,
                (pos.x + pos.y) * self.tile_height / 2,
            )
        } else {
            (pos.x * self.tile_width, pos.y * self.tile_height)
        }
    }

    /// Canvas rectangle `(x, y, w, h)` covering every tile of `extent`.
    pub fn map_canvas_bounds(&self, extent: &MapExtent) -> (i32, i32, i32, i32) {
        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for pos in extent.positions() {
            let (x, y) = self.tile_canvas_pos(pos);
            let (right, bottom) = (x + self.tile_width, y + self.tile_height);
            bounds = Some(match bounds {
                None => (x, y, right, bottom),
                Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(right), b.max(bottom)),
            });
        }
        let (l, t, r, b) = bounds.unwrap_or((0, 0, 0, 0));
        (l, t, r - l, b - t)
    }
}

/// Tile address in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Bounds of the map in native (storage) coordinates.
///
/// Isometric maps store rows of tiles that are diagonal in map space; every
/// public method takes and returns map coordinates. Maps do not wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapExtent {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub isometric: bool,
}

impl MapExtent {
    pub const fn new(width: i32, height: i32, isometric: bool) -> Self {
        Self {
            width,
            height,
            isometric,
        }
    }

    pub fn map_to_native(&self, pos: TilePos) -> (i32, i32) {
        if self.isometric {
            let nat_y = pos.x + pos.y - self.width;
            let nat_x = (2 * pos.x - nat_y - nat_y.rem_euclid(2)).div_euclid(2);
            (nat_x, nat_y)
        } else {
            (pos.x, pos.y)
        }
    }

    pub fn native_to_map(&self, nat_x: i32, nat_y: i32) -> TilePos {
        if self.isometric {
            let map_x = (nat_y + nat_y.rem_euclid(2)).div_euclid(2) + nat_x;
            TilePos::new(map_x, nat_y - map_x + self.width)
        } else {
            TilePos::new(nat_x, nat_y)
        }
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        let (nat_x, nat_y) = self.map_to_native(pos);
        (0..self.width).contains(&nat_x) && (0..self.height).contains(&nat_y)
    }

    /// `Some(pos)` when the tile is on the map.
    pub fn normalize(&self, pos: TilePos) -> Option<TilePos> {
        self.contains(pos).then_some(pos)
    }

    pub fn step(&self, pos: TilePos, dir: Direction8) -> Option<TilePos> {
        let (dx, dy) = dir.vector();
        self.normalize(pos.offset(dx, dy))
    }

    /// Row-major index in native storage order.
    pub fn index(&self, pos: TilePos) -> Option<usize> {
        let (nat_x, nat_y) = self.map_to_native(pos);
        if (0..self.width).contains(&nat_x) && (0..self.height).contains(&nat_y) {
            Some((nat_y * self.width + nat_x) as usize)
        } else {
            None
        }
    }

    pub fn tile_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Every on-map tile in native storage order.
    pub fn positions(&self) -> impl Iterator<Item = TilePos> + '_ {
        (0..self.height)
            .flat_map(move |nat_y| (0..self.width).map(move |nat_x| self.native_to_map(nat_x, nat_y)))
    }
}
