/// Render-state slots. Discriminants are the driver's state keys.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum RenderState {
    ZEnable = 7,
    ZWriteEnable = 14,
    SrcBlend = 19,
    DestBlend = 20,
    CullMode = 22,
    DitherEnable = 26,
    AlphaBlendEnable = 27,
    FogEnable = 28,
    SpecularEnable = 29,
    ColorKeyEnable = 41,
    TextureFactor = 60,
}

/// Per-stage texture state slots.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum TextureStageState {
    ColorOp = 1,
    ColorArg1 = 2,
    ColorArg2 = 3,
    AlphaOp = 4,
    AlphaArg1 = 5,
    AlphaArg2 = 6,
    TexCoordIndex = 11,
    MagFilter = 16,
    MinFilter = 17,
    MipFilter = 18,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum CullMode {
    None = 1,
    Clockwise = 2,
    CounterClockwise = 3,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum Blend {
    Zero = 1,
    One = 2,
    SrcColor = 3,
    InvSrcColor = 4,
    SrcAlpha = 5,
    InvSrcAlpha = 6,
}

/// Texture-stage combine operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum TextureOp {
    Disable = 1,
    SelectArg1 = 2,
    SelectArg2 = 3,
    Modulate = 4,
    Modulate2x = 5,
    Modulate4x = 6,
    Add = 7,
    BlendDiffuseAlpha = 12,
}

/// Texture-stage combine argument.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum TextureArg {
    Diffuse = 0,
    Current = 1,
    Texture = 2,
    TFactor = 3,
    /// Modifier bit; combine with another argument through [`TextureArg::complement`].
    Complement = 0x10,
}

impl TextureArg {
    /// Raw value of `self` with the complement modifier set.
    #[inline]
    pub const fn complement(self) -> u32 {
        self as u32 | TextureArg::Complement as u32
    }
}

/// Filter values for the `MagFilter`/`MinFilter`/`MipFilter` stage states.
pub mod filter {
    pub const POINT: u32 = 1;
    pub const LINEAR: u32 = 2;
    /// Linear interpolation between mip levels (`MipFilter` only).
    pub const MIP_LINEAR: u32 = 3;
}

/// A value written to a state slot.
///
/// The driver stores every state as a 32-bit word. Float values are passed as
/// their IEEE-754 bit pattern ([`f32::to_bits`]), never rounded, because
/// float-typed states (fog density, depth bias, ...) are decoded by the driver
/// from the raw bits.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StateValue {
    U32(u32),
    F32(f32),
}

impl StateValue {
    /// The 32-bit word handed to the driver.
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            StateValue::U32(v) => v,
            StateValue::F32(v) => v.to_bits(),
        }
    }
}

impl From<u32> for StateValue {
    fn from(v: u32) -> Self {
        StateValue::U32(v)
    }
}

impl From<i32> for StateValue {
    fn from(v: i32) -> Self {
        StateValue::U32(v as u32)
    }
}

impl From<f32> for StateValue {
    fn from(v: f32) -> Self {
        StateValue::F32(v)
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        StateValue::U32(v as u32)
    }
}

macro_rules! state_value_from_enum {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for StateValue {
                fn from(v: $ty) -> Self {
                    StateValue::U32(v as u32)
                }
            }
        )*
    };
}

state_value_from_enum!(CullMode, Blend, TextureOp, TextureArg);

/// One state write of the scene baseline.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StateWrite {
    Render(RenderState, u32),
    Stage(u32, TextureStageState, u32),
}

/// States installed by every `begin_scene`, in issue order.
///
/// Per-object overrides are applied after this baseline, so the list is part
/// of the device contract.
pub const SCENE_BASELINE: [StateWrite; 14] = [
    StateWrite::Render(RenderState::CullMode, CullMode::Clockwise as u32),
    StateWrite::Render(RenderState::ZEnable, 1),
    StateWrite::Stage(0, TextureStageState::MipFilter, filter::MIP_LINEAR),
    StateWrite::Stage(0, TextureStageState::MinFilter, filter::LINEAR),
    StateWrite::Stage(0, TextureStageState::MagFilter, filter::LINEAR),
    StateWrite::Stage(1, TextureStageState::MipFilter, filter::MIP_LINEAR),
    StateWrite::Stage(1, TextureStageState::MinFilter, filter::LINEAR),
    StateWrite::Stage(1, TextureStageState::MagFilter, filter::LINEAR),
    StateWrite::Render(RenderState::AlphaBlendEnable, 1),
    StateWrite::Render(RenderState::SrcBlend, Blend::SrcAlpha as u32),
    StateWrite::Render(RenderState::DestBlend, Blend::InvSrcAlpha as u32),
    StateWrite::Render(RenderState::DitherEnable, 1),
    StateWrite::Render(RenderState::SpecularEnable, 1),
    StateWrite::Render(RenderState::ColorKeyEnable, 1),
];
