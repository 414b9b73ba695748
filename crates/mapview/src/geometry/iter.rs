use std::fmt;

use super::grid::{GridGeometry, MapExtent, TilePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Horizontal edge between a tile and its northern/southern neighbour.
    NorthSouth,
    /// Vertical edge between a tile and its western/eastern neighbour.
    WestEast,
    /// Iso-hex flat side between an upper and a lower tile.
    UpDown,
    /// Overhead-hex flat side between a left and a right tile.
    LeftRight,
}

impl EdgeKind {
    /// Suffix used by grid and border sprite tags.
    pub const fn tag_suffix(self) -> &'static str {
        match self {
            EdgeKind::NorthSouth => "ns",
            EdgeKind::WestEast => "we",
            EdgeKind::UpDown => "ud",
            EdgeKind::LeftRight => "lr",
        }
    }

    /// Direction names of the two sides, in tile order.
    pub const fn side_names(self) -> [&'static str; 2] {
        match self {
            EdgeKind::NorthSouth => ["n", "s"],
            EdgeKind::WestEast => ["w", "e"],
            EdgeKind::UpDown => ["u", "d"],
            EdgeKind::LeftRight => ["l", "r"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub kind: EdgeKind,
    /// North or west tile first; collapsed hex corners keep corner order.
    pub tiles: [Option<TilePos>; 2],
}

/// Vertex shared by four tiles.
///
/// Square layouts list the tiles NW, NE, SE, SW; isometric layouts list the
/// tiles above, right of, below and left of the vertex on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub tiles: [Option<TilePos>; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Tile(TilePos),
    Edge(Edge),
    Corner(Corner),
    /// Hex corner collapsed into a flat side; carries both readings.
    CornerEdge { corner: Corner, edge: Edge },
}

/// One drawable position produced by [`RectIterator`], with the canvas
/// position of its tile-sized bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub canvas_x: i32,
    pub canvas_y: i32,
}

impl Element {
    pub fn tile(&self) -> Option<TilePos> {
        match self.kind {
            ElementKind::Tile(pos) => Some(pos),
            _ => None,
        }
    }

    pub fn edge(&self) -> Option<&Edge> {
        match &self.kind {
            ElementKind::Edge(edge) | ElementKind::CornerEdge { edge, .. } => Some(edge),
            _ => None,
        }
    }

    pub fn corner(&self) -> Option<&Corner> {
        match &self.kind {
            ElementKind::Corner(corner) | ElementKind::CornerEdge { corner, .. } => Some(corner),
            _ => None,
        }
    }
}

/// What a sub-tile grid cell is, before bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellKind {
    Tile,
    Edge(EdgeKind),
    Corner,
    CornerEdge(EdgeKind),
}

/// Topology-specific classification of sub-tile grid cells.
///
/// `neighbors` returns raw map positions; a tile uses slot 0, an edge slots 0
/// and 1, a corner all four.
pub(crate) trait CellLayout: fmt::Debug + Sync {
    /// Sub-cells per half tile (1 for square layouts, 2 for isometric).
    fn ratio(&self) -> i32;
    fn classify(&self, gx: i32, gy: i32) -> Option<CellKind>;
    fn neighbors(&self, gx: i32, gy: i32, kind: CellKind) -> [TilePos; 4];
}

#[derive(Debug)]
pub(crate) struct SquareLayout;
#[derive(Debug)]
pub(crate) struct IsoLayout;
#[derive(Debug)]
pub(crate) struct HexLayout;
#[derive(Debug)]
pub(crate) struct IsoHexLayout;

pub(crate) static SQUARE_LAYOUT: SquareLayout = SquareLayout;
pub(crate) static ISO_LAYOUT: IsoLayout = IsoLayout;
pub(crate) static HEX_LAYOUT: HexLayout = HexLayout;
pub(crate) static ISO_HEX_LAYOUT: IsoHexLayout = IsoHexLayout;

const ORIGIN: TilePos = TilePos::new(0, 0);

fn half(value: i32) -> i32 {
    value.div_euclid(2)
}

fn quarter(value: i32) -> i32 {
    value.div_euclid(4)
}

fn square_classify(gx: i32, gy: i32) -> CellKind {
    if (gx + gy).rem_euclid(2) == 0 {
        if gx.rem_euclid(2) == 0 {
            CellKind::Corner
        } else {
            CellKind::Tile
        }
    } else if gy.rem_euclid(2) == 0 {
        CellKind::Edge(EdgeKind::NorthSouth)
    } else {
        CellKind::Edge(EdgeKind::WestEast)
    }
}

fn square_neighbors(gx: i32, gy: i32, kind: CellKind) -> [TilePos; 4] {
    match kind {
        CellKind::Tile => [TilePos::new(half(gx - 1), half(gy - 1)), ORIGIN, ORIGIN, ORIGIN],
        CellKind::Edge(EdgeKind::NorthSouth) => [
            TilePos::new(half(gx - 1), half(gy) - 1),
            TilePos::new(half(gx - 1), half(gy)),
            ORIGIN,
            ORIGIN,
        ],
        CellKind::Edge(_) => [
            TilePos::new(half(gx) - 1, half(gy - 1)),
            TilePos::new(half(gx), half(gy - 1)),
            ORIGIN,
            ORIGIN,
        ],
        CellKind::Corner | CellKind::CornerEdge(_) => [
            TilePos::new(half(gx) - 1, half(gy) - 1),
            TilePos::new(half(gx), half(gy) - 1),
            TilePos::new(half(gx), half(gy)),
            TilePos::new(half(gx) - 1, half(gy)),
        ],
    }
}

fn iso_classify(gx: i32, gy: i32) -> Option<CellKind> {
    let sum = gx + gy;
    if sum.rem_euclid(2) != 0 {
        return None;
    }
    let on_vertex_row = gx.rem_euclid(2) == 0 && gy.rem_euclid(2) == 0;
    Some(match (on_vertex_row, sum.rem_euclid(4) == 0) {
        (true, true) => CellKind::Tile,
        (true, false) => CellKind::Corner,
        (false, true) => CellKind::Edge(EdgeKind::NorthSouth),
        (false, false) => CellKind::Edge(EdgeKind::WestEast),
    })
}

fn iso_neighbors(gx: i32, gy: i32, kind: CellKind) -> [TilePos; 4] {
    let sum = gx + gy;
    let diff = gy - gx;
    match kind {
        CellKind::Tile => [TilePos::new(quarter(sum) - 1, quarter(diff)), ORIGIN, ORIGIN, ORIGIN],
        CellKind::Edge(EdgeKind::NorthSouth) => [
            TilePos::new(quarter(sum - 4), quarter(diff - 2)),
            TilePos::new(quarter(sum - 4), quarter(diff + 2)),
            ORIGIN,
            ORIGIN,
        ],
        CellKind::Edge(_) => [
            TilePos::new(quarter(sum - 6), quarter(diff)),
            TilePos::new(quarter(sum - 2), quarter(diff)),
            ORIGIN,
            ORIGIN,
        ],
        CellKind::Corner | CellKind::CornerEdge(_) => [
            TilePos::new(quarter(sum - 6), quarter(diff - 2)),
            TilePos::new(quarter(sum - 2), quarter(diff - 2)),
            TilePos::new(quarter(sum - 2), quarter(diff + 2)),
            TilePos::new(quarter(sum - 6), quarter(diff + 2)),
        ],
    }
}

impl CellLayout for SquareLayout {
    fn ratio(&self) -> i32 {
        1
    }

    fn classify(&self, gx: i32, gy: i32) -> Option<CellKind> {
        Some(square_classify(gx, gy))
    }

    fn neighbors(&self, gx: i32, gy: i32, kind: CellKind) -> [TilePos; 4] {
        square_neighbors(gx, gy, kind)
    }
}

impl CellLayout for HexLayout {
    fn ratio(&self) -> i32 {
        1
    }

    fn classify(&self, gx: i32, gy: i32) -> Option<CellKind> {
        Some(match square_classify(gx, gy) {
            CellKind::Corner => CellKind::CornerEdge(EdgeKind::LeftRight),
            other => other,
        })
    }

    fn neighbors(&self, gx: i32, gy: i32, kind: CellKind) -> [TilePos; 4] {
        square_neighbors(gx, gy, kind)
    }
}

impl CellLayout for IsoLayout {
    fn ratio(&self) -> i32 {
        2
    }

    fn classify(&self, gx: i32, gy: i32) -> Option<CellKind> {
        iso_classify(gx, gy)
    }

    fn neighbors(&self, gx: i32, gy: i32, kind: CellKind) -> [TilePos; 4] {
        iso_neighbors(gx, gy, kind)
    }
}

impl CellLayout for IsoHexLayout {
    fn ratio(&self) -> i32 {
        2
    }

    fn classify(&self, gx: i32, gy: i32) -> Option<CellKind> {
        iso_classify(gx, gy).map(|kind| match kind {
            CellKind::Corner => CellKind::CornerEdge(EdgeKind::UpDown),
            other => other,
        })
    }

    fn neighbors(&self, gx: i32, gy: i32, kind: CellKind) -> [TilePos; 4] {
        iso_neighbors(gx, gy, kind)
    }
}

/// Canvas-space rectangle; width and height may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl CanvasRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Same area with non-negative width and height.
    pub fn normalized(self) -> Self {
        let (x, w) = if self.w < 0 {
            (self.x + self.w, -self.w)
        } else {
            (self.x, self.w)
        };
        let (y, h) = if self.h < 0 {
            (self.y + self.h, -self.h)
        } else {
            (self.y, self.h)
        };
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn intersects(&self, other: &CanvasRect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
    }
}

/// Lazy row-major walk over every tile, edge and corner whose bounding box may
/// touch a canvas rectangle.
///
/// Elements referring only to off-map tiles are skipped; every other element
/// in the rectangle is yielded exactly once.
#[derive(Debug, Clone)]
pub struct RectIterator {
    layout: &'static dyn CellLayout,
    extent: MapExtent,
    tile_width: i32,
    tile_height: i32,
    gx0: i32,
    gy0: i32,
    columns: i32,
    count: i64,
    next: i64,
}

impl RectIterator {
    pub fn new(geometry: &GridGeometry, extent: MapExtent, rect: CanvasRect) -> Self {
        let rect = rect.normalized();
        let layout = geometry.layout();
        let r1 = layout.ratio();
        let r2 = 2 * r1;
        let w = geometry.tile_width();
        let h = geometry.tile_height();

        let gx0 = (rect.x * r2).div_euclid(w) - r1 / 2;
        let gy0 = (rect.y * r2).div_euclid(h) - r1 / 2;
        let gx1 = ((rect.x + rect.w) * r2 + w - 1).div_euclid(w) + r1;
        let gy1 = ((rect.y + rect.h) * r2 + h - 1).div_euclid(h) + r1;

        let columns = (gx1 - gx0).max(0);
        let rows = (gy1 - gy0).max(0);
        let count = if rect.is_empty() {
            0
        } else {
            i64::from(columns) * i64::from(rows)
        };

        Self {
            layout,
            extent,
            tile_width: w,
            tile_height: h,
            gx0,
            gy0,
            columns,
            count,
            next: 0,
        }
    }

    /// Sub-tile grid window `(gx0, gy0, columns, rows)`.
    pub fn grid_window(&self) -> (i32, i32, i32, i32) {
        let rows = if self.columns == 0 {
            0
        } else {
            (self.count / i64::from(self.columns)) as i32
        };
        (self.gx0, self.gy0, self.columns, rows)
    }

    fn element_at(&self, gx: i32, gy: i32) -> Option<Element> {
        let kind = self.layout.classify(gx, gy)?;
        let raw = self.layout.neighbors(gx, gy, kind);
        let on_map = |pos: TilePos| self.extent.normalize(pos);

        let kind = match kind {
            CellKind::Tile => ElementKind::Tile(on_map(raw[0])?),
            CellKind::Edge(edge_kind) => {
                let tiles = [on_map(raw[0]), on_map(raw[1])];
                if tiles.iter().all(Option::is_none) {
                    return None;
                }
                ElementKind::Edge(Edge {
                    kind: edge_kind,
                    tiles,
                })
            }
            CellKind::Corner | CellKind::CornerEdge(_) => {
                let tiles = raw.map(on_map);
                if tiles.iter().all(Option::is_none) {
                    return None;
                }
                let corner = Corner { tiles };
                match kind {
                    CellKind::CornerEdge(edge_kind) => {
                        let pair = if edge_kind == EdgeKind::UpDown {
                            [tiles[0], tiles[2]]
                        } else {
                            [tiles[1], tiles[3]]
                        };
                        ElementKind::CornerEdge {
                            corner,
                            edge: Edge {
                                kind: edge_kind,
                                tiles: pair,
                            },
                        }
                    }
                    _ => ElementKind::Corner(corner),
                }
            }
        };

        let r2 = 2 * self.layout.ratio();
        Some(Element {
            kind,
            canvas_x: (gx * self.tile_width).div_euclid(r2) - self.tile_width / 2,
            canvas_y: (gy * self.tile_height).div_euclid(r2) - self.tile_height / 2,
        })
    }
}

impl Iterator for RectIterator {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        while self.next < self.count {
            let index = self.next;
            self.next += 1;
            let columns = i64::from(self.columns);
            let gx = self.gx0 + (index % columns) as i32;
            let gy = self.gy0 + (index / columns) as i32;
            if let Some(element) = self.element_at(gx, gy) {
                return Some(element);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::geometry::grid::Topology;

    fn collect(geometry: &GridGeometry, extent: MapExtent, rect: CanvasRect) -> Vec<Element> {
        RectIterator::new(geometry, extent, rect).collect()
    }

    fn square() -> GridGeometry {
        GridGeometry::new(Topology::Square, 30, 30, 0).expect("geometry")
    }

    #[test]
    fn single_square_tile_yields_one_tile_four_edges_four_corners() {
        let extent = MapExtent::new(2, 2, false);
        let elements = collect(&square(), extent, CanvasRect::new(0, 0, 30, 30));

        let tiles: Vec<_> = elements.iter().filter_map(Element::tile).collect();
        assert_eq!(tiles, vec![TilePos::new(0, 0)]);
        let edges = elements.iter().filter(|e| matches!(e.kind, ElementKind::Edge(_))).count();
        let corners = elements.iter().filter(|e| matches!(e.kind, ElementKind::Corner(_))).count();
        assert_eq!((edges, corners), (4, 4));

        let tile = elements.iter().find(|e| e.tile().is_some()).expect("tile");
        assert_eq!((tile.canvas_x, tile.canvas_y), (0, 0));

        let east_edge = elements
            .iter()
            .filter_map(Element::edge)
            .find(|edge| edge.kind == EdgeKind::WestEast && edge.tiles[0] == Some(TilePos::new(0, 0)))
            .expect("east edge");
        assert_eq!(east_edge.tiles[1], Some(TilePos::new(1, 0)));
    }

    #[test]
    fn rect_over_whole_map_yields_each_tile_once() {
        for (topology, w, h, iso) in [
            (Topology::Square, 30, 30, false),
            (Topology::Isometric, 64, 32, true),
            (Topology::Hex, 40, 48, false),
            (Topology::IsoHex, 64, 32, true),
        ] {
            let hex_side = if topology.is_hex() { 8 } else { 0 };
            let geometry = GridGeometry::new(topology, w, h, hex_side).expect("geometry");
            let extent = MapExtent::new(6, 7, iso);
            let (x, y, bw, bh) = geometry.map_canvas_bounds(&extent);
            let elements = collect(&geometry, extent, CanvasRect::new(x, y, bw, bh));

            let mut seen = HashSet::new();
            for pos in elements.iter().filter_map(Element::tile) {
                assert!(seen.insert(pos), "{topology:?} yielded {pos:?} twice");
                assert_eq!(
                    geometry.tile_canvas_pos(pos),
                    elements
                        .iter()
                        .find(|e| e.tile() == Some(pos))
                        .map(|e| (e.canvas_x, e.canvas_y))
                        .expect("tile"),
                );
            }
            assert_eq!(seen.len(), extent.tile_count(), "{topology:?}");
        }
    }

    /// Whether `rect` overlaps the drawn area of the tile at canvas `(x, y)`:
    /// the diamond for isometric layouts, the cell box otherwise.
    fn tile_touches(geometry: &GridGeometry, (x, y): (i32, i32), rect: CanvasRect) -> bool {
        let (w, h) = (geometry.tile_width(), geometry.tile_height());
        let (right, bottom) = (rect.x + rect.w, rect.y + rect.h);
        if !geometry.is_isometric() {
            return rect.x < x + w && x < right && rect.y < y + h && y < bottom;
        }
        // Twice the centre, so half-pixel centres stay integral.
        let (cx2, cy2) = (2 * x + w, 2 * y + h);
        let dx2 = (cx2.clamp(2 * rect.x, 2 * right) - cx2).abs();
        let dy2 = (cy2.clamp(2 * rect.y, 2 * bottom) - cy2).abs();
        dx2 * h + dy2 * w < w * h
    }

    #[test]
    fn any_rect_yields_touching_tiles_once_and_nothing_beyond_one_tile() {
        for (topology, w, h, hex_side) in [
            (Topology::Square, 30, 30, 0),
            (Topology::Isometric, 64, 32, 0),
            (Topology::Hex, 40, 48, 12),
            (Topology::IsoHex, 64, 32, 16),
        ] {
            let geometry = GridGeometry::new(topology, w, h, hex_side).expect("geometry");
            let extent = MapExtent::new(5, 6, topology.is_isometric());
            let (bx, by, bw, bh) = geometry.map_canvas_bounds(&extent);
            let sizes = [(1, 1), (7, 5), (w, h), (2 * w + 3, h + 7)];
            let step_x = (bw + 2 * w) / 9 + 1;
            let step_y = (bh + 2 * h) / 9 + 1;

            for (rw, rh) in sizes {
                for x in (bx - w..bx + bw + w).step_by(step_x as usize) {
                    for y in (by - h..by + bh + h).step_by(step_y as usize) {
                        let rect = CanvasRect::new(x, y, rw, rh);
                        let grown = CanvasRect::new(x - w, y - h, rw + 2 * w, rh + 2 * h);
                        let mut seen = HashSet::new();
                        for pos in collect(&geometry, extent, rect).iter().filter_map(Element::tile) {
                            assert!(seen.insert(pos), "{topology:?} {rect:?}: {pos:?} twice");
                            let (tx, ty) = geometry.tile_canvas_pos(pos);
                            let tile_box = CanvasRect::new(tx, ty, w, h);
                            assert!(
                                tile_box.intersects(&grown),
                                "{topology:?} {rect:?}: {pos:?} lies more than a tile away"
                            );
                        }
                        for pos in extent.positions() {
                            if tile_touches(&geometry, geometry.tile_canvas_pos(pos), rect) {
                                assert!(seen.contains(&pos), "{topology:?} {rect:?}: {pos:?} missing");
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn interior_tiles_are_referenced_by_expected_edge_and_corner_counts() {
        for (topology, iso) in [(Topology::Square, false), (Topology::Isometric, true)] {
            let (w, h) = if iso { (64, 32) } else { (30, 30) };
            let geometry = GridGeometry::new(topology, w, h, 0).expect("geometry");
            let extent = MapExtent::new(6, 8, iso);
            let (x, y, bw, bh) = geometry.map_canvas_bounds(&extent);
            let elements = collect(&geometry, extent, CanvasRect::new(x, y, bw, bh));

            let mut edge_refs: HashMap<TilePos, usize> = HashMap::new();
            let mut corner_refs: HashMap<TilePos, usize> = HashMap::new();
            for element in &elements {
                match &element.kind {
                    ElementKind::Edge(edge) => {
                        for pos in edge.tiles.iter().flatten() {
                            *edge_refs.entry(*pos).or_default() += 1;
                        }
                    }
                    ElementKind::Corner(corner) => {
                        for pos in corner.tiles.iter().flatten() {
                            *corner_refs.entry(*pos).or_default() += 1;
                        }
                    }
                    _ => {}
                }
            }

            let interior: Vec<TilePos> = extent
                .positions()
                .filter(|pos| {
                    crate::geometry::Direction8::ALL
                        .iter()
                        .all(|dir| extent.step(*pos, *dir).is_some())
                })
                .collect();
            assert!(!interior.is_empty());
            for pos in interior {
                assert_eq!(edge_refs.get(&pos), Some(&4), "{topology:?} {pos:?}");
                assert_eq!(corner_refs.get(&pos), Some(&4), "{topology:?} {pos:?}");
            }
        }
    }

    #[test]
    fn hex_corners_collapse_into_flat_sides() {
        let geometry = GridGeometry::new(Topology::Hex, 40, 48, 12).expect("hex");
        let extent = MapExtent::new(4, 4, false);
        let elements = collect(&geometry, extent, CanvasRect::new(0, 0, 160, 192));
        assert!(elements.iter().all(|e| !matches!(e.kind, ElementKind::Corner(_))));

        let collapsed = elements
            .iter()
            .find_map(|e| match e.kind {
                ElementKind::CornerEdge { corner, edge } => Some((corner, edge)),
                _ => None,
            })
            .expect("collapsed corner");
        assert_eq!(collapsed.1.kind, EdgeKind::LeftRight);
        assert_eq!(collapsed.1.tiles, [collapsed.0.tiles[1], collapsed.0.tiles[3]]);

        let iso_hex = GridGeometry::new(Topology::IsoHex, 64, 32, 16).expect("iso hex");
        let iso_extent = MapExtent::new(4, 4, true);
        let (x, y, w, h) = iso_hex.map_canvas_bounds(&iso_extent);
        let edge = collect(&iso_hex, iso_extent, CanvasRect::new(x, y, w, h))
            .into_iter()
            .find_map(|e| match e.kind {
                ElementKind::CornerEdge { corner, edge } => Some((corner, edge)),
                _ => None,
            })
            .expect("collapsed iso corner");
        assert_eq!(edge.1.kind, EdgeKind::UpDown);
        assert_eq!(edge.1.tiles, [edge.0.tiles[0], edge.0.tiles[2]]);
    }

    #[test]
    fn zero_hex_side_keeps_plain_corners() {
        let geometry = GridGeometry::new(Topology::Hex, 40, 48, 0).expect("hex");
        let elements = collect(&geometry, MapExtent::new(3, 3, false), CanvasRect::new(0, 0, 80, 96));
        assert!(elements.iter().any(|e| matches!(e.kind, ElementKind::Corner(_))));
        assert!(elements
            .iter()
            .all(|e| !matches!(e.kind, ElementKind::CornerEdge { .. })));
    }

    #[test]
    fn negative_extents_cover_the_same_area() {
        let extent = MapExtent::new(4, 4, false);
        let forward = collect(&square(), extent, CanvasRect::new(15, 15, 60, 45));
        let backward = collect(&square(), extent, CanvasRect::new(75, 60, -60, -45));
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_rect_and_off_map_rect_yield_nothing() {
        let extent = MapExtent::new(4, 4, false);
        assert_eq!(collect(&square(), extent, CanvasRect::new(10, 10, 0, 50)).len(), 0);
        assert_eq!(
            collect(&square(), extent, CanvasRect::new(-900, -900, 100, 100)).len(),
            0
        );
    }

    #[test]
    fn iteration_is_row_major() {
        let extent = MapExtent::new(3, 3, false);
        let tiles: Vec<_> = collect(&square(), extent, CanvasRect::new(0, 0, 90, 60))
            .iter()
            .filter_map(Element::tile)
            .collect();
        assert_eq!(
            tiles,
            vec![
                TilePos::new(0, 0),
                TilePos::new(1, 0),
                TilePos::new(2, 0),
                TilePos::new(0, 1),
                TilePos::new(1, 1),
                TilePos::new(2, 1),
            ]
        );
    }
}
