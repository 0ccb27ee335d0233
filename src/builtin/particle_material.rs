use crate::context::UniformValue;
use crate::error::Result;
use crate::resource::{Material, MaterialCore, UniformBinding};

/// Vertex stage of the particle material.
pub static PARTICLE_VERTEX_SRC: &str = include_str!("particle.vert.glsl");

/// Fragment stage of the particle material.
pub static PARTICLE_FRAGMENT_SRC: &str = include_str!("particle.frag.glsl");

/// Point size of a fresh particle material, in pixels.
pub const DEFAULT_POINT_SIZE: f32 = 10.0;

/// An unlit material drawing point sprites of a configurable size.
///
/// Lights are accepted and ignored.
pub struct ParticleMaterial {
    core: MaterialCore,
    point_size_uniform: UniformBinding,
    point_size: f32,
}

impl ParticleMaterial {
    /// Creates a particle material with the built-in shaders.
    pub fn new() -> Result<ParticleMaterial> {
        let mut material = ParticleMaterial {
            core: MaterialCore::new(),
            point_size_uniform: UniformBinding::absent("uPointSize"),
            point_size: DEFAULT_POINT_SIZE,
        };
        material.set_shaders(PARTICLE_VERTEX_SRC, PARTICLE_FRAGMENT_SRC)?;
        Ok(material)
    }

    /// Sets the size of the sprites and uploads it right away.
    pub fn set_point_size(&mut self, point_size: f32) {
        self.point_size = point_size;
        self.core
            .set(&self.point_size_uniform, UniformValue::Float(point_size));
    }

    /// The size of the sprites.
    #[inline]
    pub fn point_size(&self) -> f32 {
        self.point_size
    }
}

impl Material for ParticleMaterial {
    fn core(&self) -> &MaterialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MaterialCore {
        &mut self.core
    }

    fn set_shaders(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()> {
        let program = self.core.set_shaders(vertex_source, fragment_source)?;
        self.point_size_uniform = program.optional_uniform("uPointSize");
        Ok(())
    }

    fn use_program(&self) {
        self.core.use_program();
        self.core
            .set(&self.point_size_uniform, UniformValue::Float(self.point_size));
    }
}
