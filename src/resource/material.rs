//! Trait implemented by materials.

use crate::context::UniformValue;
use crate::error::Result;
use crate::light::{Light, LightState};
use crate::resource::{ShaderProgram, Texture, UniformBinding};
use glamx::Mat4;
use std::rc::Rc;

/// Attribute name of vertex positions.
pub const POSITION_ATTRIBUTE: &str = "aPosition";
/// Attribute name of vertex normals.
pub const NORMAL_ATTRIBUTE: &str = "aNormal";
/// Attribute name of texture coordinates.
pub const TEXTURE_COORD_ATTRIBUTE: &str = "aTextureCoord";
/// Attribute name of vertex colors.
pub const COLOR_ATTRIBUTE: &str = "aColor";

/// Resolved locations of the standard vertex attributes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexAttributes {
    /// `aPosition`
    pub position: Option<u32>,
    /// `aNormal`
    pub normal: Option<u32>,
    /// `aTextureCoord`
    pub texture_coord: Option<u32>,
    /// `aColor`
    pub color: Option<u32>,
}

/// State and bindings shared by every material.
///
/// Concrete materials embed a `MaterialCore` and resolve their own uniforms on top of
/// the ones it manages: `uMVPMatrix`, `uMMatrix`, `uVMatrix`, `uTexture0` and
/// `uUseTexture`.
pub struct MaterialCore {
    program: Option<ShaderProgram>,
    attributes: VertexAttributes,
    mvp_matrix: UniformBinding,
    model_matrix: UniformBinding,
    view_matrix: UniformBinding,
    texture_sampler: UniformBinding,
    use_texture: UniformBinding,
    model: Mat4,
    light: Option<LightState>,
    texture: Option<Rc<Texture>>,
}

impl Default for MaterialCore {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialCore {
    /// A core without any program yet.
    pub fn new() -> Self {
        MaterialCore {
            program: None,
            attributes: VertexAttributes::default(),
            mvp_matrix: UniformBinding::absent("uMVPMatrix"),
            model_matrix: UniformBinding::absent("uMMatrix"),
            view_matrix: UniformBinding::absent("uVMatrix"),
            texture_sampler: UniformBinding::absent("uTexture0"),
            use_texture: UniformBinding::absent("uUseTexture"),
            model: Mat4::IDENTITY,
            light: None,
            texture: None,
        }
    }

    /// Replaces the program and resolves the shared bindings.
    ///
    /// The previous program is released before the new one is compiled. On error the
    /// core is left without a program.
    pub fn set_shaders(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<&ShaderProgram> {
        self.program = None;
        self.attributes = VertexAttributes::default();

        let program = ShaderProgram::compile_and_link(vertex_source, fragment_source)?;

        self.attributes = VertexAttributes {
            position: program.attribute(POSITION_ATTRIBUTE),
            normal: program.attribute(NORMAL_ATTRIBUTE),
            texture_coord: program.attribute(TEXTURE_COORD_ATTRIBUTE),
            color: program.attribute(COLOR_ATTRIBUTE),
        };
        self.mvp_matrix = program.optional_uniform("uMVPMatrix");
        self.model_matrix = program.optional_uniform("uMMatrix");
        self.view_matrix = program.optional_uniform("uVMatrix");
        self.texture_sampler = program.optional_uniform("uTexture0");
        self.use_texture = program.optional_uniform("uUseTexture");

        let program = self.program.insert(program);
        Ok(&*program)
    }

    /// Drops the program, e.g. after a variant failed to resolve a required binding.
    pub fn release(&mut self) {
        self.program = None;
        self.attributes = VertexAttributes::default();
    }

    /// The current program, if shaders were set successfully.
    #[inline]
    pub fn program(&self) -> Option<&ShaderProgram> {
        self.program.as_ref()
    }

    /// Standard attribute locations of the current program.
    #[inline]
    pub fn attributes(&self) -> VertexAttributes {
        self.attributes
    }

    /// Writes a uniform of the current program. A no-op without program or location.
    #[inline]
    pub fn set(&self, binding: &UniformBinding, value: UniformValue) {
        if let Some(program) = &self.program {
            program.set(binding, value);
        }
    }

    /// Activates the program and pushes the texture state.
    pub fn use_program(&self) {
        let Some(program) = &self.program else {
            log::warn!("use_program called on a material without shaders");
            return;
        };
        program.bind();

        let texture_bound = match &self.texture {
            Some(texture) => match texture.bind(0) {
                Ok(()) => true,
                Err(e) => {
                    log::error!("could not bind texture: {}", e);
                    false
                }
            },
            None => false,
        };

        if texture_bound {
            program.set(&self.texture_sampler, UniformValue::Int(0));
        }
        program.set(&self.use_texture, UniformValue::Bool(texture_bound));
    }

    /// Stores and uploads the model matrix.
    pub fn set_model_matrix(&mut self, model: &Mat4) {
        self.model = *model;
        self.set(&self.model_matrix, UniformValue::Mat4(model.to_cols_array()));
    }

    /// The last model matrix set.
    #[inline]
    pub fn model_matrix(&self) -> &Mat4 {
        &self.model
    }

    /// Uploads the model-view-projection matrix.
    pub fn set_mvp_matrix(&self, mvp: &Mat4) {
        self.set(&self.mvp_matrix, UniformValue::Mat4(mvp.to_cols_array()));
    }

    /// Uploads the view matrix.
    pub fn set_view_matrix(&self, view: &Mat4) {
        self.set(&self.view_matrix, UniformValue::Mat4(view.to_cols_array()));
    }

    /// Copies the light state.
    pub fn set_light_state(&mut self, state: LightState) {
        self.light = Some(state);
    }

    /// The last light state set.
    #[inline]
    pub fn light(&self) -> Option<&LightState> {
        self.light.as_ref()
    }

    /// Attaches or detaches the diffuse texture.
    pub fn set_texture(&mut self, texture: Option<Rc<Texture>>) {
        self.texture = texture;
    }

    /// The attached texture.
    #[inline]
    pub fn texture(&self) -> Option<&Rc<Texture>> {
        self.texture.as_ref()
    }
}

/// Trait implemented by materials.
///
/// An external renderer drives a material once per object and frame, in this order:
/// [`set_model_matrix`](Self::set_model_matrix), [`set_light`](Self::set_light) when the
/// light changed, [`use_program`](Self::use_program), then the draw call.
pub trait Material {
    /// Shared state.
    fn core(&self) -> &MaterialCore;

    /// Shared state, mutably.
    fn core_mut(&mut self) -> &mut MaterialCore;

    /// (Re)compiles the program and resolves every binding the material needs.
    ///
    /// The previous program is released first.
    fn set_shaders(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()>;

    /// Activates the program and pushes every owned parameter.
    fn use_program(&self) {
        self.core().use_program()
    }

    /// Stores and uploads the model matrix, deriving whatever else the material needs.
    fn set_model_matrix(&mut self, model: &Mat4) {
        self.core_mut().set_model_matrix(model)
    }

    /// Copies the light and uploads it immediately.
    fn set_light(&mut self, light: &Light) -> Result<()> {
        self.core_mut().set_light_state(light.state());
        Ok(())
    }

    /// Uploads the model-view-projection matrix.
    fn set_mvp_matrix(&mut self, mvp: &Mat4) {
        self.core().set_mvp_matrix(mvp)
    }

    /// Uploads the view matrix.
    fn set_view_matrix(&mut self, view: &Mat4) {
        self.core().set_view_matrix(view)
    }

    /// Attaches or detaches the diffuse texture. Takes effect at the next `use_program`.
    fn set_texture(&mut self, texture: Option<Rc<Texture>>) {
        self.core_mut().set_texture(texture)
    }

    /// Whether a texture is attached.
    fn uses_texture(&self) -> bool {
        self.core().texture().is_some()
    }
}
