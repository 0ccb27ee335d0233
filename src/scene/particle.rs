//! A single point sprite.

use crate::builtin::{ParticleMaterial, DEFAULT_POINT_SIZE};
use crate::context::DrawMode;
use crate::error::Result;
use crate::resource::Geometry;
use crate::scene::{Drawable, Object3d, RenderFrame};
use glamx::{Vec2, Vec3};
use std::ops::{Deref, DerefMut};

/// Parameters of a [`Particle`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParticleConfig {
    /// Sprite size in pixels.
    pub point_size: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        ParticleConfig {
            point_size: DEFAULT_POINT_SIZE,
        }
    }
}

/// A transparent point sprite made of a single vertex at the origin.
///
/// Move it with [`set_transform`](Object3d::set_transform); its size is pushed to the
/// shader before every draw.
pub struct Particle {
    object: Object3d<ParticleMaterial>,
    point_size: f32,
}

impl Particle {
    /// Creates a particle of the default size.
    pub fn new() -> Result<Particle> {
        Self::from_config(&ParticleConfig::default())
    }

    /// Creates a particle from a configuration.
    pub fn from_config(config: &ParticleConfig) -> Result<Particle> {
        let geometry = Geometry::new(
            vec![Vec3::ZERO],
            Some(vec![Vec3::Z]),
            Some(vec![Vec2::ZERO]),
            Some(vec![crate::color::WHITE]),
            vec![0],
        );

        let mut object = Object3d::new(geometry, ParticleMaterial::new()?);
        object.set_draw_mode(DrawMode::Points);
        object.set_transparent(true);

        Ok(Particle {
            object,
            point_size: config.point_size,
        })
    }

    /// Sets the sprite size, used from the next shader-parameter refresh on.
    pub fn set_point_size(&mut self, point_size: f32) {
        self.point_size = point_size;
    }

    /// The sprite size.
    #[inline]
    pub fn point_size(&self) -> f32 {
        self.point_size
    }
}

impl Deref for Particle {
    type Target = Object3d<ParticleMaterial>;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}

impl DerefMut for Particle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.object
    }
}

impl Drawable for Particle {
    fn refresh_shader_params(&mut self) {
        let point_size = self.point_size;
        self.object.material_mut().set_point_size(point_size);
    }

    fn render(&mut self, frame: &RenderFrame) -> Result<()> {
        if self.object.prepare(frame)? {
            self.refresh_shader_params();
            self.object.draw()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, HeadlessBackend, UniformValue};
    use std::rc::Rc;

    #[test]
    fn one_transparent_point() {
        Context::init(HeadlessBackend::new());
        let particle = Particle::new().unwrap();

        assert_eq!(particle.draw_mode(), DrawMode::Points);
        assert!(particle.is_transparent());
        assert_eq!(particle.geometry().num_vertices(), 1);
        assert_eq!(particle.geometry().indices().unwrap(), &[0]);
        assert_eq!(particle.point_size(), 10.0);
    }

    #[test]
    fn refresh_uploads_the_latest_size() {
        let backend = Rc::new(HeadlessBackend::new());
        Context::init_shared(backend.clone());

        let mut particle = Particle::new().unwrap();
        particle.set_point_size(25.0);
        backend.clear_commands();

        particle.refresh_shader_params();
        assert_eq!(
            backend.uniform_writes("uPointSize"),
            vec![UniformValue::Float(25.0)]
        );
    }
}
