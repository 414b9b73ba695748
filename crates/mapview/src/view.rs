use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{MapExtent, TilePos};
use crate::sprites::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// What the viewing player knows about a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKnown {
    Unknown,
    /// Seen before, not currently visible.
    Fogged,
    #[default]
    Known,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTile {
    pub terrain: String,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(default)]
    pub owner: Option<PlayerId>,
    #[serde(default)]
    pub known: TileKnown,
}

impl MapTile {
    pub fn new(terrain: impl Into<String>) -> Self {
        Self {
            terrain: terrain.into(),
            extras: Vec::new(),
            owner: None,
            known: TileKnown::Known,
        }
    }

    pub fn has_extra(&self, extra: &str) -> bool {
        self.extras.iter().any(|name| name == extra)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Fortifying,
    Fortified,
    Sentry,
    Pillage,
    Goto,
    Explore,
    Transform,
    Irrigate,
    Mine,
    Road,
    Base,
}

impl Activity {
    pub const ALL: [Activity; 11] = [
        Activity::Fortifying,
        Activity::Fortified,
        Activity::Sentry,
        Activity::Pillage,
        Activity::Goto,
        Activity::Explore,
        Activity::Transform,
        Activity::Irrigate,
        Activity::Mine,
        Activity::Road,
        Activity::Base,
    ];

    pub const fn tag_name(self) -> &'static str {
        match self {
            Activity::Fortifying => "fortifying",
            Activity::Fortified => "fortified",
            Activity::Sentry => "sentry",
            Activity::Pillage => "pillage",
            Activity::Goto => "goto",
            Activity::Explore => "auto_explore",
            Activity::Transform => "transform",
            Activity::Irrigate => "irrigate",
            Activity::Mine => "mine",
            Activity::Road => "road",
            Activity::Base => "base",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub id: u32,
    pub owner: PlayerId,
    /// Graphic tag of the unit type, e.g. `u.settlers`.
    pub type_tag: String,
    pub hp: u32,
    pub max_hp: u32,
    #[serde(default)]
    pub veteran: u8,
    #[serde(default)]
    pub activity: Option<Activity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityInfo {
    pub id: u32,
    pub owner: PlayerId,
    pub size: u32,
    pub style: String,
    #[serde(default)]
    pub walls: bool,
    #[serde(default)]
    pub occupied: bool,
    #[serde(default)]
    pub disorder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub color: Rgb,
    /// Nation flag tag, e.g. `f.italy`.
    pub flag: String,
}

/// Read-only game state the layers consult while selecting sprites.
///
/// Positions are map coordinates; off-map positions answer "nothing".
pub trait GameView {
    fn extent(&self) -> MapExtent;
    fn tile(&self, pos: TilePos) -> Option<&MapTile>;
    fn known(&self, pos: TilePos) -> TileKnown;
    fn city(&self, pos: TilePos) -> Option<&CityInfo>;
    /// Units on the tile, top of the stack first.
    fn units(&self, pos: TilePos) -> &[UnitInfo];
    fn player(&self, id: PlayerId) -> Option<&PlayerInfo>;
    fn focus_unit(&self) -> Option<u32>;
    fn goto_turns(&self, pos: TilePos) -> Option<u32>;
    fn worker_task(&self, pos: TilePos) -> Option<Activity>;
    /// Extra the player is about to place on the tile.
    fn placing_extra(&self, pos: TilePos) -> Option<&str>;
    fn editor_selected(&self, pos: TilePos) -> bool;
    fn is_highlighted(&self, pos: TilePos) -> bool;
    fn in_city_radius(&self, pos: TilePos) -> bool;
    fn is_worked(&self, pos: TilePos) -> bool;
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("read map snapshot '{path}': {message}")]
    Read { path: PathBuf, message: String },
    #[error("parse map snapshot json{}: {message}", at_path(.path))]
    Parse { path: String, message: String },
    #[error("validation failed at {path}: {message}")]
    Invalid { path: String, message: String },
}

fn at_path(path: &str) -> String {
    if path.is_empty() || path == "." {
        String::new()
    } else {
        format!(" at {path}")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Placed<T> {
    pos: TilePos,
    #[serde(flatten)]
    value: T,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotData {
    extent: MapExtent,
    tiles: Vec<MapTile>,
    #[serde(default)]
    players: Vec<PlacedPlayer>,
    #[serde(default)]
    cities: Vec<Placed<CityInfo>>,
    #[serde(default)]
    units: Vec<Placed<UnitInfo>>,
    #[serde(default)]
    focus_unit: Option<u32>,
    #[serde(default)]
    goto_path: Vec<Placed<GotoStep>>,
    #[serde(default)]
    worked: Vec<TilePos>,
    #[serde(default)]
    highlighted: Vec<TilePos>,
    #[serde(default)]
    editor_selected: Vec<TilePos>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlacedPlayer {
    id: PlayerId,
    #[serde(flatten)]
    info: PlayerInfo,
}

#[derive(Debug, Clone, Deserialize)]
struct GotoStep {
    turns: u32,
}

/// City work radius, squared distance in map steps.
pub const CITY_RADIUS_SQ: i32 = 5;

/// Plain in-memory [`GameView`].
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    extent: MapExtent,
    tiles: Vec<MapTile>,
    players: HashMap<PlayerId, PlayerInfo>,
    cities: HashMap<TilePos, CityInfo>,
    units: HashMap<TilePos, Vec<UnitInfo>>,
    focus_unit: Option<u32>,
    goto_turns: HashMap<TilePos, u32>,
    worker_tasks: HashMap<TilePos, Activity>,
    placing: HashMap<TilePos, String>,
    worked: HashSet<TilePos>,
    highlighted: HashSet<TilePos>,
    editor_selected: HashSet<TilePos>,
}

impl MapSnapshot {
    /// Every tile starts as known `terrain`.
    pub fn filled(extent: MapExtent, terrain: &str) -> Self {
        Self {
            extent,
            tiles: vec![MapTile::new(terrain); extent.tile_count()],
            players: HashMap::new(),
            cities: HashMap::new(),
            units: HashMap::new(),
            focus_unit: None,
            goto_turns: HashMap::new(),
            worker_tasks: HashMap::new(),
            placing: HashMap::new(),
            worked: HashSet::new(),
            highlighted: HashSet::new(),
            editor_selected: HashSet::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SnapshotError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let data: SnapshotData = serde_path_to_error::deserialize(&mut deserializer).map_err(
            |error| SnapshotError::Parse {
                path: error.path().to_string(),
                message: error.into_inner().to_string(),
            },
        )?;
        Self::from_data(data)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|error| SnapshotError::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    fn from_data(data: SnapshotData) -> Result<Self, SnapshotError> {
        let extent = data.extent;
        if extent.width <= 0 || extent.height <= 0 {
            return Err(SnapshotError::Invalid {
                path: "extent".to_string(),
                message: format!("expected positive size, got {}x{}", extent.width, extent.height),
            });
        }
        if data.tiles.len() != extent.tile_count() {
            return Err(SnapshotError::Invalid {
                path: "tiles".to_string(),
                message: format!(
                    "expected {} tiles, got {}",
                    extent.tile_count(),
                    data.tiles.len()
                ),
            });
        }

        let mut snapshot = Self::filled(extent, "");
        snapshot.tiles = data.tiles;
        snapshot.focus_unit = data.focus_unit;
        for player in data.players {
            snapshot.players.insert(player.id, player.info);
        }

        let check = |path: String, pos: TilePos| {
            if extent.contains(pos) {
                Ok(pos)
            } else {
                Err(SnapshotError::Invalid {
                    path,
                    message: format!("tile ({}, {}) is off the map", pos.x, pos.y),
                })
            }
        };
        for (index, city) in data.cities.into_iter().enumerate() {
            let pos = check(format!("cities[{index}].pos"), city.pos)?;
            snapshot.cities.insert(pos, city.value);
        }
        for (index, unit) in data.units.into_iter().enumerate() {
            let pos = check(format!("units[{index}].pos"), unit.pos)?;
            snapshot.units.entry(pos).or_default().push(unit.value);
        }
        for (index, step) in data.goto_path.into_iter().enumerate() {
            let pos = check(format!("goto_path[{index}].pos"), step.pos)?;
            snapshot.goto_turns.insert(pos, step.value.turns);
        }
        for (index, pos) in data.worked.into_iter().enumerate() {
            snapshot.worked.insert(check(format!("worked[{index}]"), pos)?);
        }
        for (index, pos) in data.highlighted.into_iter().enumerate() {
            snapshot.highlighted.insert(check(format!("highlighted[{index}]"), pos)?);
        }
        for (index, pos) in data.editor_selected.into_iter().enumerate() {
            snapshot
                .editor_selected
                .insert(check(format!("editor_selected[{index}]"), pos)?);
        }
        Ok(snapshot)
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut MapTile> {
        let index = self.extent.index(pos)?;
        self.tiles.get_mut(index)
    }

    pub fn set_terrain(&mut self, pos: TilePos, terrain: &str) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.terrain = terrain.to_string();
        }
    }

    pub fn set_known(&mut self, pos: TilePos, known: TileKnown) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.known = known;
        }
    }

    pub fn add_extra(&mut self, pos: TilePos, extra: &str) {
        if let Some(tile) = self.tile_mut(pos) {
            if !tile.has_extra(extra) {
                tile.extras.push(extra.to_string());
            }
        }
    }

    pub fn set_owner(&mut self, pos: TilePos, owner: Option<PlayerId>) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.owner = owner;
        }
    }

    pub fn add_player(&mut self, id: PlayerId, info: PlayerInfo) {
        self.players.insert(id, info);
    }

    pub fn add_city(&mut self, pos: TilePos, city: CityInfo) {
        self.cities.insert(pos, city);
    }

    /// Pushes `unit` under the units already on the tile.
    pub fn add_unit(&mut self, pos: TilePos, unit: UnitInfo) {
        self.units.entry(pos).or_default().push(unit);
    }

    pub fn set_focus_unit(&mut self, id: Option<u32>) {
        self.focus_unit = id;
    }

    pub fn set_goto_turns(&mut self, pos: TilePos, turns: u32) {
        self.goto_turns.insert(pos, turns);
    }

    pub fn set_worker_task(&mut self, pos: TilePos, activity: Activity) {
        self.worker_tasks.insert(pos, activity);
    }

    pub fn set_placing_extra(&mut self, pos: TilePos, extra: &str) {
        self.placing.insert(pos, extra.to_string());
    }

    pub fn set_worked(&mut self, pos: TilePos) {
        self.worked.insert(pos);
    }

    pub fn set_highlighted(&mut self, pos: TilePos) {
        self.highlighted.insert(pos);
    }

    pub fn set_editor_selected(&mut self, pos: TilePos) {
        self.editor_selected.insert(pos);
    }
}

impl GameView for MapSnapshot {
    fn extent(&self) -> MapExtent {
        self.extent
    }

    fn tile(&self, pos: TilePos) -> Option<&MapTile> {
        self.extent.index(pos).and_then(|index| self.tiles.get(index))
    }

    fn known(&self, pos: TilePos) -> TileKnown {
        self.tile(pos).map_or(TileKnown::Unknown, |tile| tile.known)
    }

    fn city(&self, pos: TilePos) -> Option<&CityInfo> {
        self.cities.get(&pos)
    }

    fn units(&self, pos: TilePos) -> &[UnitInfo] {
        self.units.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    fn player(&self, id: PlayerId) -> Option<&PlayerInfo> {
        self.players.get(&id)
    }

    fn focus_unit(&self) -> Option<u32> {
        self.focus_unit
    }

    fn goto_turns(&self, pos: TilePos) -> Option<u32> {
        self.goto_turns.get(&pos).copied()
    }

    fn worker_task(&self, pos: TilePos) -> Option<Activity> {
        self.worker_tasks.get(&pos).copied()
    }

    fn placing_extra(&self, pos: TilePos) -> Option<&str> {
        self.placing.get(&pos).map(String::as_str)
    }

    fn editor_selected(&self, pos: TilePos) -> bool {
        self.editor_selected.contains(&pos)
    }

    fn is_highlighted(&self, pos: TilePos) -> bool {
        self.highlighted.contains(&pos)
    }

    fn in_city_radius(&self, pos: TilePos) -> bool {
        self.cities.keys().any(|city| {
            let (dx, dy) = (city.x - pos.x, city.y - pos.y);
            dx * dx + dy * dy <= CITY_RADIUS_SQ
        })
    }

    fn is_worked(&self, pos: TilePos) -> bool {
        self.worked.contains(&pos)
    }
}
