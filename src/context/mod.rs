//! The graphics device and the per-thread context giving access to it.

pub use self::backend::{
    BufferHandle, BufferType, DrawMode, GraphicsBackend, ProgramHandle, RenderFlags, ShaderObject,
    ShaderStage, TextureHandle, UniformLocation, UniformValue,
};
pub use self::context::Context;
#[cfg(feature = "gles")]
pub use self::gles::GlesBackend;
pub use self::headless::{Command, HeadlessBackend};

mod backend;
mod context;
#[cfg(feature = "gles")]
mod gles;
mod headless;
