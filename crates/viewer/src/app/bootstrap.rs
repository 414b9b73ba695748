use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mapview::{
    FsImageLoader, GameView, MapExtent, MapSnapshot, OptionsError, RenderOptions, SnapshotError,
    Tileset, TilesetDef, TilesetDefError, TilesetLoadError, Topology,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) const TILESET_ENV_VAR: &str = "MAPVIEW_TILESET";
pub(crate) const MAP_ENV_VAR: &str = "MAPVIEW_MAP";
pub(crate) const OPTIONS_ENV_VAR: &str = "MAPVIEW_OPTIONS";

/// Side length of the map shown when no snapshot is given.
const DEFAULT_MAP_SIZE: i32 = 16;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error("{var} is not set; point it at a tileset json file")]
    MissingTileset { var: &'static str },
    #[error(transparent)]
    TilesetDef(#[from] TilesetDefError),
    #[error(transparent)]
    TilesetLoad(#[from] TilesetLoadError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error("tileset '{name}' draws no terrain, so there is nothing to fill a default map with")]
    NoTerrain { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ViewerPaths {
    pub(crate) tileset: PathBuf,
    pub(crate) map: Option<PathBuf>,
    pub(crate) options: Option<PathBuf>,
}

pub(crate) struct AppWiring {
    pub(crate) tileset: Tileset<FsImageLoader>,
    pub(crate) map: MapSnapshot,
    pub(crate) options: RenderOptions,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== mapview viewer startup ===");
    let paths = paths_from(|var| std::env::var_os(var))?;
    load_wiring(&paths)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Reads the viewer inputs; empty variables count as unset.
fn paths_from(lookup: impl Fn(&str) -> Option<OsString>) -> Result<ViewerPaths, BootstrapError> {
    let path = |var: &str| lookup(var).filter(|value| !value.is_empty()).map(PathBuf::from);
    let tileset = path(TILESET_ENV_VAR).ok_or(BootstrapError::MissingTileset {
        var: TILESET_ENV_VAR,
    })?;
    Ok(ViewerPaths {
        tileset,
        map: path(MAP_ENV_VAR),
        options: path(OPTIONS_ENV_VAR),
    })
}

fn load_wiring(paths: &ViewerPaths) -> Result<AppWiring, BootstrapError> {
    let def = TilesetDef::from_json_file(&paths.tileset)?;
    let options = match &paths.options {
        Some(path) => RenderOptions::from_json_file(path)?,
        None => RenderOptions::default(),
    };
    let map = match &paths.map {
        Some(path) => MapSnapshot::from_json_file(path)?,
        None => default_map(&def)?,
    };

    let image_root = paths.tileset.parent().unwrap_or(Path::new("."));
    let (tileset, report) = Tileset::load(&def, FsImageLoader::with_root(image_root))?;
    for warning in &report.warnings {
        warn!(tileset = %def.name, warning = %warning, "tileset_load_warning");
    }
    let map_source = paths
        .map
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<default>".to_string());
    info!(
        tileset = %def.name,
        tileset_path = %paths.tileset.display(),
        map = %map_source,
        warnings = report.warnings.len(),
        "viewer_inputs_loaded"
    );
    let unknown = tileset.check_terrains(map_terrains(&map).iter().map(String::as_str));
    for problem in &unknown {
        warn!(tileset = %def.name, problem = %problem, "map_terrain_not_drawable");
    }

    Ok(AppWiring {
        tileset,
        map,
        options,
    })
}

/// A square map of the tileset's first terrain, projected like the tileset.
fn default_map(def: &TilesetDef) -> Result<MapSnapshot, BootstrapError> {
    let terrain = def.terrains.first().ok_or_else(|| BootstrapError::NoTerrain {
        name: def.name.clone(),
    })?;
    let isometric = matches!(def.topology, Topology::Isometric | Topology::IsoHex);
    Ok(MapSnapshot::filled(
        MapExtent::new(DEFAULT_MAP_SIZE, DEFAULT_MAP_SIZE, isometric),
        &terrain.name,
    ))
}

fn map_terrains(map: &MapSnapshot) -> Vec<String> {
    let extent = map.extent();
    let mut names: Vec<String> = extent
        .positions()
        .filter_map(|pos| map.tile(pos).map(|tile| tile.terrain.clone()))
        .collect();
    names.sort();
    names.dedup();
    names
}
