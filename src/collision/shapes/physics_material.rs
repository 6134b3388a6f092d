use std::sync::{Arc, OnceLock};

/// Packed `0xRRGGBBAA` color used by the debug renderer.
pub type Color = u32;

pub const DEFAULT_MATERIAL_COLOR: Color = 0x8080_80FF;

/// Surface properties shared between shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhysicsMaterial {
    pub debug_name: String,
    pub debug_color: Color,
}

impl PhysicsMaterial {
    #[must_use]
    pub fn new(debug_name: impl Into<String>, debug_color: Color) -> Self {
        Self {
            debug_name: debug_name.into(),
            debug_color,
        }
    }

    /// Material used by every shape that was not given one.
    pub fn default_material() -> &'static Arc<Self> {
        static DEFAULT: OnceLock<Arc<PhysicsMaterial>> = OnceLock::new();
        DEFAULT.get_or_init(|| Arc::new(Self::new("Default", DEFAULT_MATERIAL_COLOR)))
    }
}

/// Materials gathered by `save_material_state`, `None` stands for the default material.
pub type PhysicsMaterialList = Vec<Option<Arc<PhysicsMaterial>>>;
