use bytemuck::{Pod, Zeroable};

/// Immediate-mode primitive topology.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum PrimitiveType {
    PointList = 1,
    LineList = 2,
    LineStrip = 3,
    TriangleList = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 6] = [
        PrimitiveType::PointList,
        PrimitiveType::LineList,
        PrimitiveType::LineStrip,
        PrimitiveType::TriangleList,
        PrimitiveType::TriangleStrip,
        PrimitiveType::TriangleFan,
    ];
}

/// Flexible-vertex-format descriptor bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexFormat(pub u32);

impl VertexFormat {
    pub const XYZ: u32 = 0x002;
    pub const NORMAL: u32 = 0x010;
    pub const DIFFUSE: u32 = 0x040;
    pub const TEX1: u32 = 0x100;

    /// Layout of [`Vertex`]: position, normal, diffuse color, one UV set.
    pub const STANDARD: VertexFormat =
        VertexFormat(Self::XYZ | Self::NORMAL | Self::DIFFUSE | Self::TEX1);
}

impl Default for VertexFormat {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// One vertex of the immediate-mode stream, laid out as [`VertexFormat::STANDARD`].
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub nx: f32,
    pub ny: f32,
    pub nz: f32,
    /// Packed diffuse color, see [`crate::paint::Color::packed`].
    pub diffuse: u32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    #[inline]
    pub const fn new(position: [f32; 3], normal: [f32; 3], diffuse: u32, uv: [f32; 2]) -> Self {
        Self {
            x: position[0],
            y: position[1],
            z: position[2],
            nx: normal[0],
            ny: normal[1],
            nz: normal[2],
            diffuse,
            u: uv[0],
            v: uv[1],
        }
    }
}
