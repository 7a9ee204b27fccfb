//! Color and material value types.
//!
//! These are plain attribute bags. Conversion to driver descriptors happens at
//! the point of use (`Device::set_material`, `Light::update`, clears).

mod color;
mod material;

pub use color::{colorref, Color, ColorValue};
pub use material::Material;
