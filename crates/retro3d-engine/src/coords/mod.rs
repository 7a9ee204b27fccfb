//! Geometry types shared by the device and the driver seam.
//!
//! Pixel space: origin top-left, +X right, +Y down, integer pixels.
//! Clip space: the normalized volume a viewport maps onto its pixels.

mod rect;
mod viewport;

pub use rect::Rect;
pub use viewport::{ClipRect, ViewportDesc};
