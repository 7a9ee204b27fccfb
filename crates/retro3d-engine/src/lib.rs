//! Retro3D engine crate.
//!
//! A device and texture-resource layer over a fixed-function 3D subsystem:
//! devices and viewports, the begin/end scene protocol with its state baseline,
//! lights and materials, and uploads into texture mip chains.
//!
//! The subsystem itself sits behind [`driver::Driver`]; [`driver::SoftDriver`]
//! implements it in memory. Windowing is reached through
//! [`provider::SurfaceProvider`].
//!
//! ```no_run
//! use retro3d_engine::coords::ViewportDesc;
//! use retro3d_engine::provider::{OffscreenConfig, OffscreenProvider, SurfaceProvider};
//!
//! # fn main() -> retro3d_engine::Result<()> {
//! let provider = OffscreenProvider::new(OffscreenConfig::default())?;
//! let mut device = provider.create_device()?;
//! device.attach_viewport(ViewportDesc::full(640, 480))?;
//! device.begin_scene()?;
//! device.end_scene()?;
//! # Ok(())
//! # }
//! ```

pub mod coords;
pub mod device;
pub mod driver;
pub mod logging;
pub mod paint;
pub mod provider;
pub mod resource;

pub use device::{Device, Error, InputError, Result};
pub use paint::{Color, ColorValue, Material};
pub use provider::{FormatConfig, SurfaceProvider};
pub use resource::{Light, Texture};
