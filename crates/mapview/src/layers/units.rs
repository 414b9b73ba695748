use std::collections::HashMap;

use crate::geometry::Element;
use crate::sprite_tags::SpriteTag;
use crate::view::{Activity, TileKnown, UnitInfo};

use super::extras::push_flag;
use super::{game_tag, DrawnSprite, LayerContext, SpriteBinder};

const HP_STEPS: usize = 11;
const MAX_VETERAN_LEVELS: usize = 9;

#[derive(Debug, Clone, Default)]
pub struct UnitSprites {
    activities: HashMap<Activity, SpriteTag>,
    hp: Vec<Option<SpriteTag>>,
    veteran: Vec<SpriteTag>,
    stack: Option<SpriteTag>,
}

impl UnitSprites {
    pub fn veteran_levels(&self) -> usize {
        self.veteran.len()
    }

    pub(crate) fn activity(&self, activity: Activity) -> Option<&SpriteTag> {
        self.activities.get(&activity)
    }

    pub(crate) fn build(binder: &mut dyn SpriteBinder) -> Self {
        let activities = Activity::ALL
            .into_iter()
            .filter_map(|activity| {
                binder
                    .bind_one(format!("unit.{}", activity.tag_name()), false)
                    .map(|tag| (activity, tag))
            })
            .collect();
        let hp: Vec<_> = (0..HP_STEPS)
            .map(|step| binder.bind_one(format!("unit.hp_{}", step * 10), false))
            .collect();
        if hp.iter().any(Option::is_none) && hp.iter().any(Option::is_some) {
            binder.warn("unit hp bar is incomplete".to_string());
        }
        let mut veteran = Vec::new();
        for level in 1..=MAX_VETERAN_LEVELS {
            match binder.bind_one(format!("unit.vet_{level}"), false) {
                Some(tag) => veteran.push(tag),
                None => break,
            }
        }
        Self {
            activities,
            hp,
            veteran,
            stack: binder.bind_one("unit.stack".to_string(), false),
        }
    }
}

/// Hp bar step, `0..=10`.
fn hp_step(unit: &UnitInfo) -> Option<usize> {
    if unit.max_hp == 0 {
        return None;
    }
    let step = (HP_STEPS as u64 - 1) * u64::from(unit.hp) / u64::from(unit.max_hp);
    Some((step as usize).min(HP_STEPS - 1))
}

pub(crate) fn fill_units(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_units {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    if ctx.view.known(pos) != TileKnown::Known {
        return;
    }
    let units = ctx.view.units(pos);
    let focus = ctx.view.focus_unit();
    if units.iter().any(|unit| Some(unit.id) == focus) {
        return;
    }
    if let Some(top) = units.first() {
        push_unit(top, units.len() > 1, ctx, out);
    }
}

pub(crate) fn fill_focus_unit(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_focus_unit {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    let Some(focus) = ctx.view.focus_unit() else {
        return;
    };
    if ctx.view.known(pos) != TileKnown::Known {
        return;
    }
    let units = ctx.view.units(pos);
    if let Some(unit) = units.iter().find(|unit| unit.id == focus) {
        push_unit(unit, units.len() > 1, ctx, out);
    }
}

fn push_unit(unit: &UnitInfo, stacked: bool, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    let sprites = &ctx.config.units;
    let offsets = &ctx.config.offsets;
    if !ctx.options.solid_color_behind_units {
        push_flag(ctx, unit.owner, offsets.unit_flag, out);
    }
    if let Some(tag) = game_tag(&unit.type_tag) {
        out.push(DrawnSprite::at(tag, offsets.unit));
    }
    if let Some(tag) = unit.activity.and_then(|activity| sprites.activity(activity)) {
        out.push(DrawnSprite::at(tag.clone(), offsets.activity));
    }
    if let Some(Some(tag)) = hp_step(unit).and_then(|step| sprites.hp.get(step)) {
        out.push(DrawnSprite::at(tag.clone(), offsets.unit));
    }
    if unit.veteran > 0 {
        if let Some(tag) = sprites.veteran.get(usize::from(unit.veteran) - 1) {
            out.push(DrawnSprite::at(tag.clone(), offsets.unit));
        }
    }
    if stacked {
        if let Some(tag) = &sprites.stack {
            out.push(DrawnSprite::at(tag.clone(), offsets.unit));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MapExtent, TilePos, Topology};
    use crate::layers::LayerKind;
    use crate::options::RenderOptions;
    use crate::sprites::Rgb;
    use crate::test_support::{layer_sprites, load_tileset, sprite_def, tile_element};
    use crate::view::{MapSnapshot, PlayerId, PlayerInfo};

    fn unit(id: u32, hp: u32) -> UnitInfo {
        UnitInfo {
            id,
            owner: PlayerId(1),
            type_tag: "u.warriors".to_string(),
            hp,
            max_hp: 10,
            veteran: 0,
            activity: None,
        }
    }

    fn tags(sprites: &[DrawnSprite]) -> Vec<&str> {
        sprites.iter().map(|sprite| sprite.sprite.as_str()).collect()
    }

    fn unit_tileset() -> crate::tileset::Tileset<crate::test_support::MemoryLoader> {
        let mut def = sprite_def(
            Topology::Square,
            30,
            30,
            &[
                "u.warriors",
                "f.rome",
                "unit.fortified",
                "unit.hp_0",
                "unit.hp_50",
                "unit.hp_100",
                "unit.vet_1",
                "unit.vet_2",
                "unit.stack",
            ],
        );
        def.offsets.unit_offset_y = 2;
        def.offsets.activity_offset_x = 5;
        load_tileset(def)
    }

    fn view_with_player() -> MapSnapshot {
        let mut view = MapSnapshot::filled(MapExtent::new(2, 2, false), "grassland");
        view.add_player(
            PlayerId(1),
            PlayerInfo {
                color: Rgb::new(0, 0, 255),
                flag: "f.rome".to_string(),
            },
        );
        view
    }

    #[test]
    fn hp_step_is_clamped_to_the_bar() {
        assert_eq!(hp_step(&unit(1, 10)), Some(10));
        assert_eq!(hp_step(&unit(1, 5)), Some(5));
        assert_eq!(hp_step(&unit(1, 0)), Some(0));
        assert_eq!(hp_step(&unit(1, 25)), Some(10));
        assert_eq!(hp_step(&UnitInfo { max_hp: 0, ..unit(1, 3) }), None);
    }

    #[test]
    fn top_unit_composes_flag_type_activity_hp_veteran_and_stack() {
        let tileset = unit_tileset();
        let mut view = view_with_player();
        let pos = TilePos::new(0, 0);
        view.add_unit(
            pos,
            UnitInfo {
                veteran: 2,
                activity: Some(Activity::Fortified),
                ..unit(7, 5)
            },
        );
        view.add_unit(pos, unit(8, 10));

        let drawn = layer_sprites(
            &tileset,
            &view,
            &RenderOptions::default(),
            LayerKind::Units,
            &tile_element(&tileset, pos),
        );
        assert_eq!(
            tags(&drawn),
            vec!["f.rome", "u.warriors", "unit.fortified", "unit.hp_50", "unit.vet_2", "unit.stack"]
        );
        assert_eq!((drawn[1].offset_x, drawn[1].offset_y), (0, 2));
        assert_eq!((drawn[2].offset_x, drawn[2].offset_y), (5, 0));
    }

    #[test]
    fn focused_unit_moves_from_units_to_focus_layer() {
        let tileset = unit_tileset();
        let mut view = view_with_player();
        let pos = TilePos::new(1, 1);
        view.add_unit(pos, unit(3, 10));
        view.set_focus_unit(Some(3));
        let element = tile_element(&tileset, pos);
        let options = RenderOptions::default();

        assert!(layer_sprites(&tileset, &view, &options, LayerKind::Units, &element).is_empty());
        assert_eq!(
            tags(&layer_sprites(&tileset, &view, &options, LayerKind::FocusUnit, &element)),
            vec!["f.rome", "u.warriors", "unit.hp_100"]
        );
    }

    #[test]
    fn solid_backdrop_replaces_the_flag_and_fogged_tiles_hide_units() {
        let tileset = unit_tileset();
        let mut view = view_with_player();
        let pos = TilePos::new(0, 1);
        view.add_unit(pos, unit(4, 0));
        let element = tile_element(&tileset, pos);
        let solid = RenderOptions {
            solid_color_behind_units: true,
            ..RenderOptions::default()
        };
        assert_eq!(
            tags(&layer_sprites(&tileset, &view, &solid, LayerKind::Units, &element)),
            vec!["u.warriors", "unit.hp_0"]
        );

        view.set_known(pos, TileKnown::Fogged);
        assert!(layer_sprites(&tileset, &view, &solid, LayerKind::Units, &element).is_empty());
    }
}
