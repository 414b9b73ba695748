use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::sprites::Rgb;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("read options '{path}': {message}")]
    Read { path: String, message: String },
    #[error("parse options json at {path}: {message}")]
    Parse { path: String, message: String },
}

/// User-facing drawing toggles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub draw_terrain: bool,
    pub draw_fog_of_war: bool,
    pub draw_map_grid: bool,
    pub draw_borders: bool,
    pub draw_cities: bool,
    pub draw_city_size: bool,
    pub draw_units: bool,
    pub draw_focus_unit: bool,
    pub draw_specials: bool,
    pub draw_roads: bool,
    pub draw_goto: bool,
    /// Draw a solid owner-colour backdrop behind units instead of the flag.
    pub solid_color_behind_units: bool,
    pub background_color: Rgb,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            draw_terrain: true,
            draw_fog_of_war: true,
            draw_map_grid: false,
            draw_borders: true,
            draw_cities: true,
            draw_city_size: true,
            draw_units: true,
            draw_focus_unit: true,
            draw_specials: true,
            draw_roads: true,
            draw_goto: true,
            solid_color_behind_units: false,
            background_color: Rgb::new(0, 0, 0),
        }
    }
}

impl RenderOptions {
    pub fn from_json_str(raw: &str) -> Result<Self, OptionsError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| OptionsError::Parse {
            path: error.path().to_string(),
            message: error.into_inner().to_string(),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, OptionsError> {
        let raw = fs::read_to_string(path).map_err(|error| OptionsError::Read {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
        Self::from_json_str(&raw)
    }
}
