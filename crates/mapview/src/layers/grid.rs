use std::collections::HashMap;

use crate::geometry::{EdgeKind, Element, GridGeometry, TilePos, Topology};
use crate::sprite_tags::SpriteTag;
use crate::view::TileKnown;

use super::{DrawnSprite, LayerContext, SpriteBinder};

const EDGE_KINDS: [EdgeKind; 4] = [
    EdgeKind::NorthSouth,
    EdgeKind::WestEast,
    EdgeKind::UpDown,
    EdgeKind::LeftRight,
];

/// Grid line and border sprites, one per edge kind.
#[derive(Debug, Clone, Default)]
pub struct GridSprites {
    main: HashMap<EdgeKind, SpriteTag>,
    city: HashMap<EdgeKind, SpriteTag>,
    worked: HashMap<EdgeKind, SpriteTag>,
    selected: HashMap<EdgeKind, SpriteTag>,
    coastline: HashMap<EdgeKind, SpriteTag>,
    /// Keyed by side name (`n`, `s`, `w`, `e`, `u`, `d`, `l`, `r`).
    borders: HashMap<&'static str, SpriteTag>,
}

impl GridSprites {
    pub(crate) fn build(geometry: &GridGeometry, binder: &mut dyn SpriteBinder) -> Self {
        let hex_kind = match geometry.topology() {
            Topology::IsoHex => Some(EdgeKind::UpDown),
            Topology::Hex => Some(EdgeKind::LeftRight),
            Topology::Square | Topology::Isometric => None,
        };
        let mut sprites = Self::default();
        for kind in EDGE_KINDS {
            let suffix = kind.tag_suffix();
            let main_required = matches!(kind, EdgeKind::NorthSouth | EdgeKind::WestEast)
                || Some(kind) == hex_kind;
            let tables = [
                ("main", main_required, &mut sprites.main),
                ("city", false, &mut sprites.city),
                ("worked", false, &mut sprites.worked),
                ("selected", false, &mut sprites.selected),
                ("coastline", false, &mut sprites.coastline),
            ];
            for (name, required, table) in tables {
                if let Some(tag) = binder.bind_one(format!("grid.{name}.{suffix}"), required) {
                    table.insert(kind, tag);
                }
            }
            for side in kind.side_names() {
                if let Some(tag) = binder.bind_one(format!("grid.borders.{side}"), false) {
                    sprites.borders.insert(side, tag);
                }
            }
        }
        sprites
    }
}

pub(crate) fn fill_grid(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let Some(edge) = element.edge() else {
        return;
    };
    let sprites = &ctx.config.grid;
    let view = ctx.view;
    let known = edge
        .tiles
        .map(|tile| tile.is_some_and(|pos| view.known(pos) != TileKnown::Unknown));
    let visible = |index: usize| edge.tiles[index].filter(|_| known[index]);

    let line = if either(edge.tiles, |pos| view.is_highlighted(pos)) {
        sprites.selected.get(&edge.kind)
    } else if !ctx.options.draw_terrain && known[0] && known[1] && coast_between(edge.tiles, ctx) {
        sprites.coastline.get(&edge.kind)
    } else if ctx.options.draw_map_grid {
        if either(edge.tiles, |pos| view.is_worked(pos)) {
            sprites.worked.get(&edge.kind)
        } else if either(edge.tiles, |pos| view.in_city_radius(pos)) {
            sprites.city.get(&edge.kind)
        } else if known[0] || known[1] {
            sprites.main.get(&edge.kind)
        } else {
            None
        }
    } else {
        None
    };
    if let Some(tag) = line {
        out.push(DrawnSprite::at(tag.clone(), (0, 0)));
    }

    if !ctx.options.draw_borders {
        return;
    }
    let (Some(first), Some(second)) = (visible(0), visible(1)) else {
        return;
    };
    let owners = [first, second].map(|pos| view.tile(pos).and_then(|tile| tile.owner));
    if owners[0] == owners[1] {
        return;
    }
    for (side, owner) in edge.kind.side_names().into_iter().zip(owners) {
        let (Some(owner), Some(tag)) = (owner, sprites.borders.get(side)) else {
            continue;
        };
        let mut sprite = DrawnSprite::at(tag.clone(), (0, 0));
        if let Some(player) = view.player(owner) {
            sprite = sprite.tinted(player.color);
        }
        out.push(sprite);
    }
}

fn either(tiles: [Option<TilePos>; 2], test: impl Fn(TilePos) -> bool) -> bool {
    tiles.into_iter().flatten().any(test)
}

/// Exactly one side of the edge is water.
fn coast_between(tiles: [Option<TilePos>; 2], ctx: &LayerContext<'_>) -> bool {
    let water = tiles.map(|tile| {
        tile.and_then(|pos| ctx.view.tile(pos))
            .is_some_and(|tile| ctx.config.terrain.is_water(&tile.terrain))
    });
    water[0] != water[1]
}
