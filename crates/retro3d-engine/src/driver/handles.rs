//! Opaque driver object handles.
//!
//! Handles are plain copyable ids. Ownership lives in the engine wrappers
//! (`Device`, `Viewport`, `Texture`, `Light`), which release them exactly once.

macro_rules! driver_handle {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

driver_handle! {
    /// A surface: render target, depth buffer, texture level or staging buffer.
    SurfaceId;
    /// Texture interface derived from a surface, bindable to a texture stage.
    TextureViewId;
    /// A 3D rendering context created over a render-target surface.
    ContextId;
    ViewportId;
    MaterialId;
    /// Context-specific material token used by the `Material` light state.
    MaterialHandle;
    LightId;
}
