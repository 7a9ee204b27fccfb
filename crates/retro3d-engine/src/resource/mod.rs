//! Application-owned resources created through a device or surface provider.
//!
//! [`Texture`] and [`Light`] borrow the driver of whatever created them and
//! release their handles on drop (or explicitly via `release`).

mod light;
mod loader;
mod staging;
mod texture;

pub use light::Light;
pub use loader::{MAX_TEXTURE_SIZE, MIN_TEXTURE_SIZE};
pub use texture::{MipLevel, Texture};
