use super::error::{Error, InputError};

/// Transform slot written by `Device::set_transform`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum TransformKind {
    World = 1,
    View = 2,
    Projection = 3,
}

/// Row-major 4×4 matrix (`m[row * 4 + col]`).
///
/// The fixed-size array makes a short matrix unrepresentable; slices go
/// through [`TryFrom`], which rejects anything but exactly 16 floats.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix4(pub [f32; 16]);

impl Matrix4 {
    pub const IDENTITY: Matrix4 = Matrix4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[row * 4 + col]
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f32; 16]> for Matrix4 {
    fn from(m: [f32; 16]) -> Self {
        Matrix4(m)
    }
}

impl TryFrom<&[f32]> for Matrix4 {
    type Error = Error;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
        let m: [f32; 16] = values
            .try_into()
            .map_err(|_| InputError::TransformLength(values.len()))?;
        Ok(Matrix4(m))
    }
}
