//! Coordinate grids, interpolation and inverse-mapping image warps.

pub mod grid;
pub mod interpolate;
pub mod resample;

pub use grid::{grid, grid_bounds, GridBounds, WarpedGrid};
pub use interpolate::{Channel, ChannelInterpolant};
pub use resample::{warp, WarpedImage};
