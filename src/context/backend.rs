//! The device interface materials and geometry talk to.

use std::fmt;

/// A programmable pipeline stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Per-vertex stage.
    Vertex,
    /// Per-fragment stage.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A compiled, not yet linked, shader stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShaderObject(pub u32);

/// A linked GPU program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Slot of an active uniform inside one program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// A GPU buffer object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// A 2D RGBA texture object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// The type of a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// A buffer containing vertex attributes.
    Array,
    /// A buffer containing indices.
    ElementArray,
}

/// How the vertices of an index list are assembled into primitives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DrawMode {
    /// Each vertex is drawn as a screen-space sized point sprite.
    Points,
    /// Independent line segments.
    Lines,
    /// Connected line segments.
    LineStrip,
    /// Connected line segments, closed.
    LineLoop,
    /// Independent triangles.
    #[default]
    Triangles,
    /// Triangle strip.
    TriangleStrip,
    /// Triangle fan.
    TriangleFan,
}

bitflags! {
    /// Fixed-function state toggled around a draw call.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        /// Alpha blending enabled, depth writes disabled.
        const TRANSPARENT = 1 << 0;
        /// Back-face culling disabled.
        const DOUBLE_SIDED = 1 << 1;
    }
}

/// A value written to a uniform. Matrices are column-major.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `int` or `sampler2D` unit.
    Int(i32),
    /// `bool`
    Bool(bool),
    /// `vec3`
    Vec3([f32; 3]),
    /// `vec4`
    Vec4([f32; 4]),
    /// `mat3`
    Mat3([f32; 9]),
    /// `mat4`
    Mat4([f32; 16]),
}

/// The graphics device.
///
/// All methods take `&self`; implementations keep their bookkeeping behind interior
/// mutability since everything runs on the render thread.
///
/// Uniform writes name the program they target. A backend whose API only writes to the
/// bound program must bind it around the write, so uploads issued before
/// [`use_program`](Self::use_program) are not lost.
pub trait GraphicsBackend {
    /// Compiles one stage. The error is the driver's info log.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderObject, String>;
    /// Links a vertex and a fragment stage. The error is the driver's info log.
    fn link_program(
        &self,
        vertex: ShaderObject,
        fragment: ShaderObject,
    ) -> Result<ProgramHandle, String>;
    /// Releases a shader stage.
    fn delete_shader(&self, shader: ShaderObject);
    /// Releases a program. Deleting the bound program unbinds it.
    fn delete_program(&self, program: ProgramHandle);
    /// Binds a program for subsequent draw calls.
    fn use_program(&self, program: Option<ProgramHandle>);
    /// Location of an active uniform, `None` when the program has no such active uniform.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    /// Location of an active vertex attribute.
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;
    /// Writes a uniform of `program`.
    fn set_uniform(&self, program: ProgramHandle, location: UniformLocation, value: UniformValue);
    /// Allocates a buffer initialised with `data`.
    fn create_buffer(&self, buf_type: BufferType, data: &[u8]) -> Result<BufferHandle, String>;
    /// Replaces the content of a buffer.
    fn update_buffer(&self, buffer: BufferHandle, buf_type: BufferType, data: &[u8]);
    /// Releases a buffer.
    fn delete_buffer(&self, buffer: BufferHandle);
    /// Allocates an RGBA8 texture of `width` x `height` texels.
    fn create_texture(
        &self,
        width: u32,
        height: u32,
        rgba: &[u8],
        repeat: bool,
    ) -> Result<TextureHandle, String>;
    /// Binds a texture to a texture unit.
    fn bind_texture(&self, unit: u32, texture: TextureHandle);
    /// Releases a texture.
    fn delete_texture(&self, texture: TextureHandle);
    /// Feeds the attribute at `location` from `buffer`, `components` floats per vertex.
    fn bind_attribute(&self, buffer: BufferHandle, location: u32, components: u32);
    /// Applies fixed-function state for the next draw.
    fn set_render_flags(&self, flags: RenderFlags);
    /// Draws `count` `u16` indices from `indices` with the bound program.
    fn draw_elements(&self, mode: DrawMode, indices: BufferHandle, count: u32);
}
