mod direction;
mod grid;
mod iter;

pub use direction::{DirSet, Direction4, Direction8};
pub use grid::{GeometryError, GridGeometry, MapExtent, TilePos, Topology};
pub use iter::{CanvasRect, Corner, Edge, EdgeKind, Element, ElementKind, RectIterator};
