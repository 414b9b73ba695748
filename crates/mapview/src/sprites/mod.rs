mod atlas;
mod cache;
mod colorize;

pub use atlas::{
    AtlasFile, AtlasGrid, AtlasId, FsImageLoader, ImageLoader, PixelRect, ResourceError,
    SpriteSource,
};
pub use cache::{
    CachePhase, CacheStats, DuplicateTagPolicy, SpriteCache, SpriteError, SpriteRecord,
};
pub use colorize::{replace_hue, Colorizer, Rgb};
