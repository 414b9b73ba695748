use serde::Deserialize;

use crate::geometry::{Direction4, Element, GridGeometry};
use crate::sprite_tags::SpriteTag;
use crate::tileset::{ConfigError, TilesetDef};
use crate::view::TileKnown;

use super::{facing_parts, DrawnSprite, LayerContext, SpriteBinder};

/// How the edge of the explored area is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DarknessStyle {
    #[default]
    None,
    /// One iso sprite, clipped to the side facing each unknown neighbour.
    IsoRect,
    /// One sprite per unknown cardinal neighbour.
    CardinalSingle,
    /// One sprite for the whole set of unknown cardinal neighbours.
    CardinalFull,
    /// Ternary unknown/fogged/known index over the four tiles of a corner.
    Corner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FogStyle {
    /// Fog is left to the embedding UI.
    #[default]
    Auto,
    /// `t.fog` over every fogged tile.
    Sprite,
    /// Fog is part of corner darkness.
    Darkness,
}

const CORNER_SPRITES: usize = 81;

#[derive(Debug, Clone, Default)]
pub struct DarknessSprites {
    style: DarknessStyle,
    fog_style: FogStyle,
    iso_rect: Option<SpriteTag>,
    /// Indexed by cardinal position (single) or cardinal bitmask (full).
    cardinal: Vec<Option<SpriteTag>>,
    corner: Vec<Option<SpriteTag>>,
    fog: Option<SpriteTag>,
}

impl DarknessSprites {
    pub fn style(&self) -> DarknessStyle {
        self.style
    }

    pub fn fog_style(&self) -> FogStyle {
        self.fog_style
    }

    pub(crate) fn build(
        def: &TilesetDef,
        geometry: &GridGeometry,
        binder: &mut dyn SpriteBinder,
    ) -> Self {
        let mut sprites = Self {
            style: def.darkness_style,
            fog_style: def.fog_style,
            ..Self::default()
        };

        let corner_style = def.darkness_style == DarknessStyle::Corner;
        if corner_style != (def.fog_style == FogStyle::Darkness) {
            binder.error(ConfigError::InvalidValue {
                path: "fog_style".to_string(),
                message: "corner darkness and darkness fog must be used together".to_string(),
            });
        }

        let cardinal = geometry.cardinal_dirs();
        match def.darkness_style {
            DarknessStyle::None => {}
            DarknessStyle::IsoRect => {
                if !geometry.is_isometric() {
                    binder.error(ConfigError::InvalidValue {
                        path: "darkness_style".to_string(),
                        message: "iso_rect darkness needs an isometric tileset".to_string(),
                    });
                }
                sprites.iso_rect = binder.bind_one("t.darkness".to_string(), true);
            }
            DarknessStyle::CardinalSingle => {
                sprites.cardinal = cardinal
                    .iter()
                    .map(|dir| binder.bind_one(format!("t.darkness_{}", dir.tileset_name()), true))
                    .collect();
            }
            DarknessStyle::CardinalFull => {
                // Index 0 has no unknown neighbour and is never drawn.
                sprites.cardinal.push(None);
                for index in 1..1usize << cardinal.len() {
                    let tag = format!("t.darkness_{}", cardinal.index_name(index));
                    sprites.cardinal.push(binder.bind_one(tag, true));
                }
            }
            DarknessStyle::Corner => {
                sprites.corner = (0..CORNER_SPRITES)
                    .map(|index| binder.bind_one(corner_fog_tag(index), false))
                    .collect();
                let missing = sprites.corner.iter().filter(|tag| tag.is_none()).count();
                if missing > 0 {
                    binder.warn(format!("{missing} corner fog sprite(s) missing"));
                }
            }
        }

        if def.fog_style == FogStyle::Sprite {
            sprites.fog = binder.bind_one("t.fog".to_string(), true);
        }
        sprites
    }
}

/// `t.fog_{a}_{b}_{c}_{d}` for a base-3 corner index, first tile least significant.
fn corner_fog_tag(index: usize) -> String {
    let mut tag = String::from("t.fog");
    let mut rest = index;
    for _ in 0..4 {
        tag.push('_');
        tag.push(match rest % 3 {
            0 => 'u',
            1 => 'f',
            _ => 'k',
        });
        rest /= 3;
    }
    tag
}

fn corner_value(known: Option<TileKnown>, draw_fog: bool) -> usize {
    match known {
        Some(TileKnown::Unknown) => 0,
        Some(TileKnown::Fogged) if !draw_fog => 2,
        Some(TileKnown::Fogged) | None => 1,
        Some(TileKnown::Known) => 2,
    }
}

pub(crate) fn fill_darkness(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let sprites = &ctx.config.darkness;
    if sprites.style == DarknessStyle::Corner {
        if let Some(corner) = element.corner() {
            let index = corner.tiles.iter().rev().fold(0usize, |index, tile| {
                let known = tile.map(|pos| ctx.view.known(pos));
                index * 3 + corner_value(known, ctx.options.draw_fog_of_war)
            });
            if let Some(Some(tag)) = sprites.corner.get(index) {
                out.push(DrawnSprite::at(tag.clone(), (0, 0)));
            }
        }
        return;
    }

    let Some(pos) = element.tile() else {
        return;
    };
    if ctx.view.known(pos) == TileKnown::Unknown {
        return;
    }
    let extent = ctx.view.extent();
    let unknown_toward = |dir| {
        extent
            .step(pos, dir)
            .is_some_and(|next| ctx.view.known(next) == TileKnown::Unknown)
    };

    match sprites.style {
        DarknessStyle::None | DarknessStyle::Corner => {}
        DarknessStyle::IsoRect => {
            let Some(tag) = &sprites.iso_rect else {
                return;
            };
            let parts = facing_parts(ctx.geometry());
            for dir in Direction4::ALL {
                if unknown_toward(dir.to_dir8()) {
                    out.push(DrawnSprite::at(tag.clone(), (0, 0)).clipped(parts[dir.index()]));
                }
            }
        }
        DarknessStyle::CardinalSingle => {
            for (position, dir) in ctx.geometry().cardinal_dirs().iter().enumerate() {
                if unknown_toward(dir) {
                    if let Some(Some(tag)) = sprites.cardinal.get(position) {
                        out.push(DrawnSprite::at(tag.clone(), (0, 0)));
                    }
                }
            }
        }
        DarknessStyle::CardinalFull => {
            let index = ctx
                .geometry()
                .cardinal_dirs()
                .iter()
                .enumerate()
                .filter(|(_, dir)| unknown_toward(*dir))
                .fold(0usize, |index, (bit, _)| index | (1 << bit));
            if let Some(Some(tag)) = sprites.cardinal.get(index) {
                out.push(DrawnSprite::at(tag.clone(), (0, 0)));
            }
        }
    }
}

pub(crate) fn fill_fog(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_fog_of_war {
        return;
    }
    let Some(tag) = &ctx.config.darkness.fog else {
        return;
    };
    if let Some(pos) = element.tile() {
        if ctx.view.known(pos) == TileKnown::Fogged {
            out.push(DrawnSprite::at(tag.clone(), (0, 0)));
        }
    }
}
