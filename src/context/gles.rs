//! [`GraphicsBackend`] over an OpenGL ES 2 context, through `glow`.

use super::{
    BufferHandle, BufferType, DrawMode, GraphicsBackend, ProgramHandle, RenderFlags, ShaderObject,
    ShaderStage, TextureHandle, UniformLocation, UniformValue,
};
use glow::HasContext;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

struct GlProgram {
    program: glow::Program,
    // Indexed by `UniformLocation`.
    uniforms: Vec<glow::UniformLocation>,
}

/// A backend driving a live GLES context.
///
/// `glow` objects are not plain integers on every platform, so they are kept in tables and
/// handed out as the crate's numeric handles.
pub struct GlesBackend {
    gl: glow::Context,
    next_id: Cell<u32>,
    current: Cell<Option<ProgramHandle>>,
    shaders: RefCell<HashMap<u32, glow::Shader>>,
    programs: RefCell<HashMap<u32, GlProgram>>,
    buffers: RefCell<HashMap<u32, glow::Buffer>>,
    textures: RefCell<HashMap<u32, glow::Texture>>,
}

impl GlesBackend {
    /// Wraps a context that is current on the calling thread.
    pub fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            next_id: Cell::new(0),
            current: Cell::new(None),
            shaders: RefCell::new(HashMap::new()),
            programs: RefCell::new(HashMap::new()),
            buffers: RefCell::new(HashMap::new()),
            textures: RefCell::new(HashMap::new()),
        }
    }

    /// The wrapped context.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn fresh_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn target(buf_type: BufferType) -> u32 {
        match buf_type {
            BufferType::Array => glow::ARRAY_BUFFER,
            BufferType::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

impl From<DrawMode> for u32 {
    fn from(mode: DrawMode) -> u32 {
        match mode {
            DrawMode::Points => glow::POINTS,
            DrawMode::Lines => glow::LINES,
            DrawMode::LineStrip => glow::LINE_STRIP,
            DrawMode::LineLoop => glow::LINE_LOOP,
            DrawMode::Triangles => glow::TRIANGLES,
            DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
            DrawMode::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

impl GraphicsBackend for GlesBackend {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderObject, String> {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };

        unsafe {
            let shader = self.gl.create_shader(shader_type)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }

            let id = self.fresh_id();
            let _ = self.shaders.borrow_mut().insert(id, shader);
            Ok(ShaderObject(id))
        }
    }

    fn link_program(
        &self,
        vertex: ShaderObject,
        fragment: ShaderObject,
    ) -> Result<ProgramHandle, String> {
        let shaders = self.shaders.borrow();
        let vs = *shaders
            .get(&vertex.0)
            .ok_or_else(|| format!("no shader object {}", vertex.0))?;
        let fs = *shaders
            .get(&fragment.0)
            .ok_or_else(|| format!("no shader object {}", fragment.0))?;

        unsafe {
            let program = self.gl.create_program()?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }

            let id = self.fresh_id();
            let _ = self.programs.borrow_mut().insert(
                id,
                GlProgram {
                    program,
                    uniforms: Vec::new(),
                },
            );
            Ok(ProgramHandle(id))
        }
    }

    fn delete_shader(&self, shader: ShaderObject) {
        if let Some(s) = self.shaders.borrow_mut().remove(&shader.0) {
            unsafe { self.gl.delete_shader(s) }
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        if let Some(p) = self.programs.borrow_mut().remove(&program.0) {
            unsafe { self.gl.delete_program(p.program) }
        }
        if self.current.get() == Some(program) {
            self.current.set(None);
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let programs = self.programs.borrow();
        let native = program.and_then(|p| programs.get(&p.0)).map(|p| p.program);
        unsafe { self.gl.use_program(native) }
        self.current.set(program.filter(|_| native.is_some()));
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut programs = self.programs.borrow_mut();
        let entry = programs.get_mut(&program.0)?;
        let location = unsafe { self.gl.get_uniform_location(entry.program, name) }?;
        entry.uniforms.push(location);
        Some(UniformLocation(entry.uniforms.len() as u32 - 1))
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let programs = self.programs.borrow();
        let entry = programs.get(&program.0)?;
        unsafe { self.gl.get_attrib_location(entry.program, name) }
    }

    fn set_uniform(&self, program: ProgramHandle, location: UniformLocation, value: UniformValue) {
        let programs = self.programs.borrow();
        let Some(entry) = programs.get(&program.0) else {
            log::warn!("uniform write to deleted program {}", program.0);
            return;
        };
        let Some(loc) = entry.uniforms.get(location.0 as usize) else {
            return;
        };
        let previous = self.current.get();
        let loc = Some(loc);

        unsafe {
            if previous != Some(program) {
                self.gl.use_program(Some(entry.program));
            }

            match value {
                UniformValue::Float(x) => self.gl.uniform_1_f32(loc, x),
                UniformValue::Int(x) => self.gl.uniform_1_i32(loc, x),
                UniformValue::Bool(x) => self.gl.uniform_1_i32(loc, x as i32),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32_slice(loc, &v),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32_slice(loc, &v),
                UniformValue::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(loc, false, &m),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(loc, false, &m),
            }

            if previous != Some(program) {
                let restore = previous.and_then(|p| programs.get(&p.0)).map(|p| p.program);
                self.gl.use_program(restore);
            }
        }
    }

    fn create_buffer(&self, buf_type: BufferType, data: &[u8]) -> Result<BufferHandle, String> {
        let target = Self::target(buf_type);
        unsafe {
            let buffer = self.gl.create_buffer()?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            let id = self.fresh_id();
            let _ = self.buffers.borrow_mut().insert(id, buffer);
            Ok(BufferHandle(id))
        }
    }

    fn update_buffer(&self, buffer: BufferHandle, buf_type: BufferType, data: &[u8]) {
        let target = Self::target(buf_type);
        if let Some(b) = self.buffers.borrow().get(&buffer.0) {
            unsafe {
                self.gl.bind_buffer(target, Some(*b));
                self.gl.buffer_data_u8_slice(target, data, glow::DYNAMIC_DRAW);
            }
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        if let Some(b) = self.buffers.borrow_mut().remove(&buffer.0) {
            unsafe { self.gl.delete_buffer(b) }
        }
    }

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        rgba: &[u8],
        repeat: bool,
    ) -> Result<TextureHandle, String> {
        let wrap = if repeat {
            glow::REPEAT
        } else {
            glow::CLAMP_TO_EDGE
        };

        unsafe {
            let texture = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(rgba)),
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap as i32);

            let id = self.fresh_id();
            let _ = self.textures.borrow_mut().insert(id, texture);
            Ok(TextureHandle(id))
        }
    }

    fn bind_texture(&self, unit: u32, texture: TextureHandle) {
        if let Some(t) = self.textures.borrow().get(&texture.0) {
            unsafe {
                self.gl.active_texture(glow::TEXTURE0 + unit);
                self.gl.bind_texture(glow::TEXTURE_2D, Some(*t));
            }
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        if let Some(t) = self.textures.borrow_mut().remove(&texture.0) {
            unsafe { self.gl.delete_texture(t) }
        }
    }

    fn bind_attribute(&self, buffer: BufferHandle, location: u32, components: u32) {
        if let Some(b) = self.buffers.borrow().get(&buffer.0) {
            unsafe {
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(*b));
                self.gl.enable_vertex_attrib_array(location);
                self.gl
                    .vertex_attrib_pointer_f32(location, components as i32, glow::FLOAT, false, 0, 0);
            }
        }
    }

    fn set_render_flags(&self, flags: RenderFlags) {
        unsafe {
            if flags.contains(RenderFlags::TRANSPARENT) {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
                self.gl.depth_mask(false);
            } else {
                self.gl.disable(glow::BLEND);
                self.gl.depth_mask(true);
            }

            if flags.contains(RenderFlags::DOUBLE_SIDED) {
                self.gl.disable(glow::CULL_FACE);
            } else {
                self.gl.enable(glow::CULL_FACE);
            }
        }
    }

    fn draw_elements(&self, mode: DrawMode, indices: BufferHandle, count: u32) {
        if let Some(b) = self.buffers.borrow().get(&indices.0) {
            unsafe {
                self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(*b));
                self.gl
                    .draw_elements(mode.into(), count as i32, glow::UNSIGNED_SHORT, 0);
            }
        }
    }
}
