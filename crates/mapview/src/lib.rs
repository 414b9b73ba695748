//! Tile map rendering: sprite cache, map geometry, layer pipeline and renderer.

pub mod geometry;
pub mod layers;
pub mod options;
pub mod render;
pub mod sprite_tags;
pub mod sprites;
pub mod tileset;
pub mod view;

#[cfg(test)]
mod test_support;

pub use geometry::{
    CanvasRect, Corner, DirSet, Direction4, Direction8, Edge, EdgeKind, Element, ElementKind,
    GeometryError, GridGeometry, MapExtent, RectIterator, TilePos, Topology,
};
pub use layers::{DrawnSprite, InvalidLayerOrderError, LayerContext, LayerKind, LayerPipeline};
pub use options::{OptionsError, RenderOptions};
pub use render::{
    BlitParams, DirtyRegion, FrameBuffer, FrameStats, OutputSurface, Renderer, ScreenRect,
};
pub use sprite_tags::{SpriteTag, SpriteTagError};
pub use sprites::{
    Colorizer, FsImageLoader, ImageLoader, PixelRect, ResourceError, Rgb, SpriteCache,
    SpriteError, SpriteSource,
};
pub use tileset::{ConfigError, LoadReport, Tileset, TilesetDef, TilesetDefError, TilesetLoadError};
pub use view::{
    Activity, CityInfo, GameView, MapSnapshot, MapTile, PlayerId, PlayerInfo, SnapshotError,
    TileKnown, UnitInfo,
};
