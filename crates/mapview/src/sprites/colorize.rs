use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sprite_tags::SpriteTag;

use super::atlas::ImageLoader;
use super::cache::{SpriteCache, SpriteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_rgba(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hsv {
    h: f32,
    s: f32,
    v: f32,
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max <= f32::EPSILON { 0.0 } else { delta / max };
    Hsv { h, s, v: max }
}

fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let c = hsv.v * hsv.s;
    let h = hsv.h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = hsv.v - c;
    let to_byte = |channel: f32| ((channel + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}

/// Returns a copy of `base` whose chromatic pixels take the hue of `color`.
///
/// Saturation, value and alpha stay as drawn, so shading survives. Grey pixels
/// are left alone, and an achromatic `color` desaturates instead.
pub fn replace_hue(base: &RgbaImage, color: Rgb) -> RgbaImage {
    let target = rgb_to_hsv(color.r, color.g, color.b);
    let mut out = base.clone();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        if a == 0 {
            continue;
        }
        let hsv = rgb_to_hsv(r, g, b);
        if hsv.s <= f32::EPSILON {
            continue;
        }
        let replaced = if target.s <= f32::EPSILON {
            Hsv { s: 0.0, ..hsv }
        } else {
            Hsv { h: target.h, ..hsv }
        };
        let [nr, ng, nb] = hsv_to_rgb(replaced);
        *pixel = Rgba([nr, ng, nb, a]);
    }
    out
}

/// Per-(sprite, colour) cache of player-coloured variants.
#[derive(Debug, Default)]
pub struct Colorizer {
    variants: HashMap<SpriteTag, HashMap<Rgb, RgbaImage>>,
    derivations: u64,
}

impl Colorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, tag: &str, color: Rgb) -> Option<&RgbaImage> {
        self.variants.get(tag).and_then(|by_color| by_color.get(&color))
    }

    /// Returns the cached variant, deriving it from the base sprite on first use.
    pub fn colorized<L: ImageLoader>(
        &mut self,
        cache: &mut SpriteCache<L>,
        tag: &str,
        color: Rgb,
    ) -> Result<&RgbaImage, SpriteError> {
        let key = cache.resolve_tag(tag).ok_or_else(|| SpriteError::MissingSprite {
            tag: tag.to_string(),
        })?;
        let by_color = self.variants.entry(key).or_default();
        if !by_color.contains_key(&color) {
            let derived = replace_hue(cache.acquire(tag)?, color);
            cache.release(tag)?;
            debug!(sprite_tag = tag, r = color.r, g = color.g, b = color.b, "colorizer_variant_derived");
            by_color.insert(color, derived);
            self.derivations += 1;
        }
        by_color.get(&color).ok_or_else(|| SpriteError::MissingSprite {
            tag: tag.to_string(),
        })
    }

    /// Forgets every variant of `tag` (its base art changed).
    pub fn invalidate_tag(&mut self, tag: &str) {
        self.variants.remove(tag);
    }

    /// Forgets every variant drawn in `color` (a player's colour changed).
    pub fn invalidate_color(&mut self, color: Rgb) {
        for by_color in self.variants.values_mut() {
            by_color.remove(&color);
        }
        self.variants.retain(|_, by_color| !by_color.is_empty());
    }

    pub fn clear(&mut self) {
        self.variants.clear();
    }

    pub fn len(&self) -> usize {
        self.variants.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn derivations(&self) -> u64 {
        self.derivations
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::sprites::atlas::SpriteSource;
    use crate::test_support::MemoryLoader;

    fn shield_cache() -> SpriteCache<MemoryLoader> {
        let mut base = RgbaImage::new(2, 1);
        base.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        base.put_pixel(1, 0, Rgba([90, 90, 90, 128]));
        let loader = MemoryLoader::default().with_pixels("shield.png", base);
        let mut cache = SpriteCache::new(loader);
        cache
            .register(
                SpriteTag::new("f.shield").expect("tag"),
                SpriteSource::StandaloneFile {
                    path: PathBuf::from("shield.png"),
                },
                0,
                0,
            )
            .expect("register");
        cache
    }

    #[test]
    fn hue_is_replaced_and_grey_pixels_are_kept() {
        let mut base = RgbaImage::new(2, 1);
        base.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        base.put_pixel(1, 0, Rgba([90, 90, 90, 128]));

        let blue = replace_hue(&base, Rgb::new(0, 0, 255));
        assert_eq!(blue.get_pixel(0, 0), &Rgba([0, 0, 200, 255]));
        assert_eq!(blue.get_pixel(1, 0), &Rgba([90, 90, 90, 128]));
    }

    #[test]
    fn achromatic_target_desaturates() {
        let mut base = RgbaImage::new(1, 1);
        base.put_pixel(0, 0, Rgba([0, 200, 0, 255]));
        let grey = replace_hue(&base, Rgb::new(40, 40, 40));
        assert_eq!(grey.get_pixel(0, 0), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn hsv_round_trip_preserves_primary_and_mixed_colors() {
        for (r, g, b) in [(255, 0, 0), (12, 200, 99), (250, 250, 3), (1, 2, 3)] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(r, g, b)), [r, g, b]);
        }
    }

    #[test]
    fn variant_is_derived_once_per_color_and_base_is_released() {
        let mut cache = shield_cache();
        let mut colorizer = Colorizer::new();
        let green = Rgb::new(0, 255, 0);

        colorizer.colorized(&mut cache, "f.shield", green).expect("derive");
        colorizer.colorized(&mut cache, "f.shield", green).expect("cached");
        assert_eq!(colorizer.derivations(), 1);
        assert_eq!(cache.ref_count("f.shield"), Some(0));

        colorizer
            .colorized(&mut cache, "f.shield", Rgb::new(0, 0, 255))
            .expect("second color");
        assert_eq!(colorizer.derivations(), 2);
        assert_eq!(colorizer.len(), 2);
    }

    #[test]
    fn invalidation_forces_rederivation() {
        let mut cache = shield_cache();
        let mut colorizer = Colorizer::new();
        let red = Rgb::new(255, 0, 0);
        colorizer.colorized(&mut cache, "f.shield", red).expect("derive");

        colorizer.invalidate_color(red);
        assert!(colorizer.cached("f.shield", red).is_none());
        colorizer.colorized(&mut cache, "f.shield", red).expect("derive");
        colorizer.invalidate_tag("f.shield");
        assert!(colorizer.is_empty());
        assert_eq!(colorizer.derivations(), 2);
    }

    #[test]
    fn unknown_base_is_missing_sprite() {
        let mut cache = shield_cache();
        let mut colorizer = Colorizer::new();
        assert!(matches!(
            colorizer.colorized(&mut cache, "f.none", Rgb::new(1, 1, 1)),
            Err(SpriteError::MissingSprite { .. })
        ));
    }
}
