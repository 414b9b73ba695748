use serde::Deserialize;

use crate::geometry::{DirSet, Direction8, Element, GridGeometry};
use crate::sprite_tags::SpriteTag;
use crate::tileset::{ConfigError, ExtraDef, TilesetDef};
use crate::view::PlayerId;

use super::{game_tag, stem_names, DrawnSprite, LayerContext, SpriteBinder};

/// Which layer(s) an extra draws in and how its sprites are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraStyle {
    /// `{graphic}` in Special1.
    Single1,
    /// `{graphic}` in Special2.
    Single2,
    /// `{graphic}_bg`, `_mg` and `_fg` in Special1..3.
    ThreeLayer,
    /// Cardinal mask of neighbours with the same extra, in Special1.
    Cardinals,
    Road(RoadStyle),
    River,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadStyle {
    /// One sprite per connected direction.
    AllSeparate,
    /// Even and odd valid directions combined into one sprite each.
    ParityCombined,
    /// One sprite for the whole connection mask.
    AllCombined,
}

#[derive(Debug, Clone)]
enum ExtraArt {
    Single(Option<SpriteTag>),
    ThreeLayer([Option<SpriteTag>; 3]),
    Cardinals(Vec<Option<SpriteTag>>),
    AllSeparate {
        dirs: Vec<Option<SpriteTag>>,
        isolated: Option<SpriteTag>,
    },
    ParityCombined {
        even: Vec<Option<SpriteTag>>,
        odd: Vec<Option<SpriteTag>>,
        isolated: Option<SpriteTag>,
    },
    AllCombined(Vec<Option<SpriteTag>>),
    River {
        sides: Vec<Option<SpriteTag>>,
        outlets: Vec<Option<SpriteTag>>,
    },
}

#[derive(Debug, Clone)]
struct ExtraDrawing {
    name: String,
    style: ExtraStyle,
    show_flag: bool,
    activity: Option<SpriteTag>,
    art: ExtraArt,
}

/// Sprite tables of every extra (specials, roads, rivers, bases).
#[derive(Debug, Clone, Default)]
pub struct ExtraSprites {
    drawings: Vec<ExtraDrawing>,
}

impl ExtraSprites {
    pub fn contains(&self, name: &str) -> bool {
        self.drawings.iter().any(|drawing| drawing.name == name)
    }

    pub fn style(&self, name: &str) -> Option<ExtraStyle> {
        self.drawings
            .iter()
            .find(|drawing| drawing.name == name)
            .map(|drawing| drawing.style)
    }

    /// Sprite shown while the extra is being built.
    pub fn activity_sprite(&self, name: &str) -> Option<&SpriteTag> {
        self.drawings
            .iter()
            .find(|drawing| drawing.name == name)
            .and_then(|drawing| drawing.activity.as_ref())
    }

    pub(crate) fn build(
        def: &TilesetDef,
        geometry: &GridGeometry,
        binder: &mut dyn SpriteBinder,
    ) -> Self {
        let mut drawings: Vec<ExtraDrawing> = Vec::with_capacity(def.extras.len());
        for (index, extra) in def.extras.iter().enumerate() {
            if drawings.iter().any(|drawing| drawing.name == extra.name) {
                binder.error(ConfigError::InvalidValue {
                    path: format!("extras[{index}].name"),
                    message: format!("extra '{}' is defined twice", extra.name),
                });
                continue;
            }
            let activity = extra
                .activity_graphic
                .as_ref()
                .and_then(|tag| binder.bind_one(tag.clone(), false));
            drawings.push(ExtraDrawing {
                name: extra.name.clone(),
                style: extra.style,
                show_flag: extra.show_flag,
                activity,
                art: build_art(extra, geometry, binder),
            });
        }
        Self { drawings }
    }
}

fn build_art(extra: &ExtraDef, geometry: &GridGeometry, binder: &mut dyn SpriteBinder) -> ExtraArt {
    let graphics = extra.graphic_names();
    let mut bind = |suffix: &str, required: bool| {
        binder.bind(&stem_names(&graphics, |graphic| format!("{graphic}{suffix}")), required)
    };
    let cardinal = geometry.cardinal_dirs();
    let valid = geometry.valid_dirs();

    match extra.style {
        ExtraStyle::Single1 | ExtraStyle::Single2 => ExtraArt::Single(bind("", true)),
        ExtraStyle::ThreeLayer => {
            ExtraArt::ThreeLayer(["_bg", "_mg", "_fg"].map(|suffix| bind(suffix, false)))
        }
        ExtraStyle::Cardinals => ExtraArt::Cardinals(
            (0..1usize << cardinal.len())
                .map(|index| bind(&format!("_{}", cardinal.index_name(index)), true))
                .collect(),
        ),
        ExtraStyle::Road(RoadStyle::AllSeparate) => ExtraArt::AllSeparate {
            dirs: valid
                .iter()
                .map(|dir| bind(&format!("_{}", dir.tileset_name()), true))
                .collect(),
            isolated: bind("_isolated", true),
        },
        ExtraStyle::Road(RoadStyle::ParityCombined) => {
            let (even, odd) = parity_sets(valid);
            let even_tags = (0..1usize << even.len())
                .map(|index| bind(&format!("_c_{}", even.index_name(index)), index != 0))
                .collect();
            let odd_tags = (0..1usize << odd.len())
                .map(|index| {
                    if index == 0 {
                        None
                    } else {
                        bind(&format!("_d_{}", odd.index_name(index)), true)
                    }
                })
                .collect();
            ExtraArt::ParityCombined {
                even: even_tags,
                odd: odd_tags,
                isolated: bind("_isolated", true),
            }
        }
        ExtraStyle::Road(RoadStyle::AllCombined) => ExtraArt::AllCombined(
            (0..1usize << valid.len())
                .map(|index| bind(&format!("_{}", valid.index_name(index)), true))
                .collect(),
        ),
        ExtraStyle::River => ExtraArt::River {
            sides: (0..1usize << cardinal.len())
                .map(|index| bind(&format!("_s_{}", cardinal.index_name(index)), true))
                .collect(),
            outlets: cardinal
                .iter()
                .map(|dir| bind(&format!("_outlet_{}", dir.tileset_name()), true))
                .collect(),
        },
    }
}

/// Valid directions at even and odd positions of the clockwise ring.
fn parity_sets(valid: &DirSet) -> (DirSet, DirSet) {
    let at_parity = |parity: usize| {
        let dirs: Vec<Direction8> = valid
            .iter()
            .enumerate()
            .filter(|(position, _)| position % 2 == parity)
            .map(|(_, dir)| dir)
            .collect();
        DirSet::from_predicate(|dir| dirs.contains(&dir))
    };
    (at_parity(0), at_parity(1))
}

fn mask_over(dirs: &DirSet, connected: impl Fn(Direction8) -> bool) -> usize {
    dirs.iter()
        .enumerate()
        .filter(|(_, dir)| connected(*dir))
        .fold(0, |mask, (bit, _)| mask | (1 << bit))
}

fn push_tag(tag: Option<&Option<SpriteTag>>, out: &mut Vec<DrawnSprite>) {
    if let Some(Some(tag)) = tag {
        out.push(DrawnSprite::at(tag.clone(), (0, 0)));
    }
}

pub(crate) fn fill_special(
    layer: u8,
    element: &Element,
    ctx: &LayerContext<'_>,
    out: &mut Vec<DrawnSprite>,
) {
    if !ctx.options.draw_specials {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    let Some(tile) = ctx.visible_tile(pos) else {
        return;
    };
    for drawing in &ctx.config.extras.drawings {
        if !tile.has_extra(&drawing.name) {
            continue;
        }
        match (&drawing.art, drawing.style, layer) {
            (ExtraArt::Single(tag), ExtraStyle::Single1, 1)
            | (ExtraArt::Single(tag), ExtraStyle::Single2, 2) => push_tag(Some(tag), out),
            (ExtraArt::ThreeLayer(tags), _, layer) => {
                push_tag(tags.get(usize::from(layer).wrapping_sub(1)), out)
            }
            (ExtraArt::Cardinals(tags), _, 1) => {
                let mask = mask_over(ctx.geometry().cardinal_dirs(), |dir| {
                    ctx.adjacent_tile(pos, dir)
                        .is_some_and(|neighbor| neighbor.has_extra(&drawing.name))
                });
                push_tag(tags.get(mask), out);
            }
            _ => {}
        }
    }
}

pub(crate) fn fill_roads(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_roads {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    let Some(tile) = ctx.visible_tile(pos) else {
        return;
    };
    let valid = ctx.geometry().valid_dirs();
    for drawing in &ctx.config.extras.drawings {
        if !matches!(drawing.style, ExtraStyle::Road(_)) || !tile.has_extra(&drawing.name) {
            continue;
        }
        let connected = |dir: Direction8| {
            ctx.adjacent_tile(pos, dir)
                .is_some_and(|neighbor| neighbor.has_extra(&drawing.name))
        };
        match &drawing.art {
            ExtraArt::AllSeparate { dirs, isolated } => {
                let mut any = false;
                for (position, dir) in valid.iter().enumerate() {
                    if connected(dir) {
                        any = true;
                        push_tag(dirs.get(position), out);
                    }
                }
                if !any {
                    push_tag(Some(isolated), out);
                }
            }
            ExtraArt::ParityCombined { even, odd, isolated } => {
                let (even_dirs, odd_dirs) = parity_sets(valid);
                let even_mask = mask_over(&even_dirs, connected);
                let odd_mask = mask_over(&odd_dirs, connected);
                if even_mask != 0 || odd_mask == 0 {
                    push_tag(even.get(even_mask), out);
                }
                if odd_mask != 0 {
                    push_tag(odd.get(odd_mask), out);
                }
                if even_mask == 0 && odd_mask == 0 {
                    push_tag(Some(isolated), out);
                }
            }
            ExtraArt::AllCombined(combos) => push_tag(combos.get(mask_over(valid, connected)), out),
            _ => {}
        }
    }
}

pub(crate) fn fill_water(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_terrain {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    let Some(tile) = ctx.visible_tile(pos) else {
        return;
    };
    let terrain = &ctx.config.terrain;
    let cardinal = ctx.geometry().cardinal_dirs();
    let tile_is_water = terrain.is_water(&tile.terrain);
    for drawing in &ctx.config.extras.drawings {
        let ExtraArt::River { sides, outlets } = &drawing.art else {
            continue;
        };
        if tile_is_water {
            for (position, dir) in cardinal.iter().enumerate() {
                let river_next = ctx
                    .adjacent_tile(pos, dir)
                    .is_some_and(|neighbor| neighbor.has_extra(&drawing.name));
                if river_next {
                    push_tag(outlets.get(position), out);
                }
            }
        } else if tile.has_extra(&drawing.name) {
            let mask = mask_over(cardinal, |dir| {
                ctx.adjacent_tile(pos, dir).is_some_and(|neighbor| {
                    neighbor.has_extra(&drawing.name) || terrain.is_water(&neighbor.terrain)
                })
            });
            push_tag(sides.get(mask), out);
        }
    }
}

pub(crate) fn fill_base_flags(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let Some(pos) = element.tile() else {
        return;
    };
    let Some(tile) = ctx.visible_tile(pos) else {
        return;
    };
    let Some(owner) = tile.owner else {
        return;
    };
    let flagged = ctx
        .config
        .extras
        .drawings
        .iter()
        .any(|drawing| drawing.show_flag && tile.has_extra(&drawing.name));
    if flagged {
        push_flag(ctx, owner, ctx.config.offsets.city_flag, out);
    }
}

/// Owner's nation flag, skipped when the player or its tag is unusable.
pub(crate) fn push_flag(
    ctx: &LayerContext<'_>,
    owner: PlayerId,
    offset: (i32, i32),
    out: &mut Vec<DrawnSprite>,
) {
    if let Some(tag) = ctx.view.player(owner).and_then(|player| game_tag(&player.flag)) {
        out.push(DrawnSprite::at(tag, offset));
    }
}
