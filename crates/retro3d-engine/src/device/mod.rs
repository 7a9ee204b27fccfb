//! The rendering device and its immediate-mode frame protocol.
//!
//! This module is responsible for:
//! - the [`Device`] context over a provider's render target
//! - viewports, materials, transforms and state writes on that context
//! - `begin`/`vertex`/`end` primitive batches inside a scene
//! - translating driver failures into [`Error`] via [`Guard`]

mod context;
mod error;
mod guard;
mod primitive;
mod state;
mod transform;
mod viewport;

pub use context::{Device, SceneState, MATERIAL_AMBIENT};
pub use error::{Error, FormatKind, InputError, Result};
pub use guard::Guard;
pub use primitive::{PrimitiveType, Vertex, VertexFormat};
pub use state::{
    filter, Blend, CullMode, RenderState, StateValue, StateWrite, TextureArg, TextureOp,
    TextureStageState, SCENE_BASELINE,
};
pub use transform::{Matrix4, TransformKind};
pub use viewport::Viewport;
