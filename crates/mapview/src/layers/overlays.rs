use crate::geometry::{Element, TilePos};
use crate::sprite_tags::SpriteTag;
use crate::view::TileKnown;

use super::{bind_digits, push_digits, DrawnSprite, LayerContext, SpriteBinder};

/// Backdrop, goto path and editor markers.
#[derive(Debug, Clone, Default)]
pub struct OverlaySprites {
    background_player: Option<SpriteTag>,
    background_graphic: Option<SpriteTag>,
    path_step: Option<SpriteTag>,
    path_turns_ones: Vec<Option<SpriteTag>>,
    path_turns_tens: Vec<Option<SpriteTag>>,
    editor_selected: Option<SpriteTag>,
}

impl OverlaySprites {
    pub(crate) fn build(binder: &mut dyn SpriteBinder) -> Self {
        let (path_turns_ones, path_turns_tens) = bind_digits(binder, "path.turns_");
        Self {
            background_player: binder.bind_one("background.player".to_string(), false),
            background_graphic: binder.bind_one("background.graphic".to_string(), false),
            path_step: binder.bind_one("path.step".to_string(), false),
            path_turns_ones,
            path_turns_tens,
            editor_selected: binder.bind_one("editor.selected".to_string(), false),
        }
    }
}

pub(crate) fn fill_background(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let Some(pos) = element.tile() else {
        return;
    };
    let sprites = &ctx.config.overlays;
    let known = ctx.view.known(pos);
    let colour_of = |owner| ctx.view.player(owner).map(|player| player.color);

    if ctx.options.solid_color_behind_units && ctx.options.draw_units && known == TileKnown::Known {
        let units = ctx.view.units(pos);
        let focus = ctx.view.focus_unit();
        let shown = units
            .iter()
            .find(|unit| Some(unit.id) == focus)
            .or_else(|| units.first());
        if let (Some(unit), Some(tag)) = (shown, &sprites.background_player) {
            let mut sprite = DrawnSprite::at(tag.clone(), (0, 0));
            if let Some(color) = colour_of(unit.owner) {
                sprite = sprite.tinted(color);
            }
            out.push(sprite);
            return;
        }
    }

    if ctx.options.draw_terrain || known == TileKnown::Unknown {
        return;
    }
    let owner = ctx
        .view
        .tile(pos)
        .and_then(|tile| tile.owner)
        .filter(|_| ctx.options.draw_borders);
    match (owner, &sprites.background_player, &sprites.background_graphic) {
        (Some(owner), Some(tag), _) => {
            let mut sprite = DrawnSprite::at(tag.clone(), (0, 0));
            if let Some(color) = colour_of(owner) {
                sprite = sprite.tinted(color);
            }
            out.push(sprite);
        }
        (_, _, Some(tag)) => out.push(DrawnSprite::at(tag.clone(), (0, 0))),
        _ => {}
    }
}

/// Tile under `element` when markers may be drawn on it; unknown tiles stay black.
fn marked_tile(element: &Element, ctx: &LayerContext<'_>) -> Option<TilePos> {
    element
        .tile()
        .filter(|pos| ctx.view.known(*pos) != TileKnown::Unknown)
}

pub(crate) fn fill_goto(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_goto {
        return;
    }
    let Some(pos) = marked_tile(element, ctx) else {
        return;
    };
    let Some(turns) = ctx.view.goto_turns(pos) else {
        return;
    };
    let sprites = &ctx.config.overlays;
    if let Some(tag) = &sprites.path_step {
        out.push(DrawnSprite::at(tag.clone(), (0, 0)));
    }
    push_digits(turns, &sprites.path_turns_ones, &sprites.path_turns_tens, (0, 0), out);
}

pub(crate) fn fill_worker_task(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let Some(pos) = marked_tile(element, ctx) else {
        return;
    };
    let task = ctx.view.worker_task(pos);
    if let Some(tag) = task.and_then(|activity| ctx.config.units.activity(activity)) {
        out.push(DrawnSprite::at(tag.clone(), ctx.config.offsets.activity));
    }
}

pub(crate) fn fill_editor(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let Some(pos) = marked_tile(element, ctx) else {
        return;
    };
    if !ctx.view.editor_selected(pos) {
        return;
    }
    if let Some(tag) = &ctx.config.overlays.editor_selected {
        out.push(DrawnSprite::at(tag.clone(), (0, 0)));
    }
}

pub(crate) fn fill_infra_work(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let Some(pos) = marked_tile(element, ctx) else {
        return;
    };
    let placing = ctx.view.placing_extra(pos);
    if let Some(tag) = placing.and_then(|extra| ctx.config.extras.activity_sprite(extra)) {
        out.push(DrawnSprite::at(tag.clone(), ctx.config.offsets.activity));
    }
}
