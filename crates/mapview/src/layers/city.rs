use crate::geometry::Element;
use crate::sprite_tags::SpriteTag;
use crate::tileset::{ConfigError, TilesetDef};
use crate::view::CityInfo;

use super::extras::push_flag;
use super::{bind_digits, push_digits, DrawnSprite, LayerContext, SpriteBinder};

#[derive(Debug, Clone)]
struct CityStyleSprites {
    name: String,
    thresholds: Vec<u32>,
    city: Vec<Option<SpriteTag>>,
    wall: Vec<Option<SpriteTag>>,
    occupied: Vec<Option<SpriteTag>>,
}

impl CityStyleSprites {
    /// Largest threshold not above `size`; the first one for smaller cities.
    fn size_index(&self, size: u32) -> usize {
        self.thresholds
            .iter()
            .rposition(|threshold| *threshold <= size)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CitySprites {
    styles: Vec<CityStyleSprites>,
    disorder: Option<SpriteTag>,
    size_ones: Vec<Option<SpriteTag>>,
    size_tens: Vec<Option<SpriteTag>>,
}

impl CitySprites {
    pub fn style_names(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|style| style.name.as_str())
    }

    fn style_for(&self, city: &CityInfo) -> Option<&CityStyleSprites> {
        self.styles
            .iter()
            .find(|style| style.name == city.style)
            .or_else(|| self.styles.first())
    }

    pub(crate) fn build(def: &TilesetDef, binder: &mut dyn SpriteBinder) -> Self {
        let mut styles = Vec::with_capacity(def.city_styles.len());
        for (index, style) in def.city_styles.iter().enumerate() {
            let ascending = style.thresholds.windows(2).all(|pair| pair[0] < pair[1]);
            if style.thresholds.is_empty() || !ascending {
                binder.error(ConfigError::InvalidValue {
                    path: format!("city_styles[{index}].thresholds"),
                    message: "thresholds must be a non-empty ascending list".to_string(),
                });
                continue;
            }
            let graphic = &style.graphic;
            let steps = 0..style.thresholds.len();
            styles.push(CityStyleSprites {
                name: style.name.clone(),
                thresholds: style.thresholds.clone(),
                city: steps
                    .clone()
                    .map(|step| binder.bind_one(format!("{graphic}_city_{step}"), true))
                    .collect(),
                wall: steps
                    .clone()
                    .map(|step| binder.bind_one(format!("{graphic}_wall_{step}"), false))
                    .collect(),
                occupied: steps
                    .map(|step| binder.bind_one(format!("{graphic}_occupied_{step}"), false))
                    .collect(),
            });
        }
        let (size_ones, size_tens) = bind_digits(binder, "city.size_");
        Self {
            styles,
            disorder: binder.bind_one("city.disorder".to_string(), false),
            size_ones,
            size_tens,
        }
    }
}

pub(crate) fn fill_city(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_cities {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    if ctx.visible_tile(pos).is_none() {
        return;
    }
    let Some(city) = ctx.view.city(pos) else {
        return;
    };
    let sprites = &ctx.config.city;
    let offsets = &ctx.config.offsets;

    push_flag(ctx, city.owner, offsets.city_flag, out);
    let Some(style) = sprites.style_for(city) else {
        return;
    };
    let step = style.size_index(city.size);
    let wall = if city.walls { style.wall[step].as_ref() } else { None };
    if let Some(tag) = wall.or(style.city[step].as_ref()) {
        out.push(DrawnSprite::at(tag.clone(), offsets.city));
    }
    if city.occupied {
        if let Some(tag) = &style.occupied[step] {
            out.push(DrawnSprite::at(tag.clone(), offsets.occupied));
        }
    }
    if city.disorder {
        if let Some(tag) = &sprites.disorder {
            out.push(DrawnSprite::at(tag.clone(), offsets.city));
        }
    }
}

pub(crate) fn fill_city_size(element: &Element, ctx: &LayerContext<'_>, out: &mut Vec<DrawnSprite>) {
    if !ctx.options.draw_cities || !ctx.options.draw_city_size {
        return;
    }
    let Some(pos) = element.tile() else {
        return;
    };
    if ctx.visible_tile(pos).is_none() {
        return;
    }
    if let Some(city) = ctx.view.city(pos) {
        let sprites = &ctx.config.city;
        push_digits(city.size, &sprites.size_ones, &sprites.size_tens, ctx.config.offsets.city, out);
    }
}
