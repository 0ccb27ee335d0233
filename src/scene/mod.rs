//! Drawable objects.

pub use self::object3d::{Drawable, Object3d, RenderFrame};
pub use self::particle::{Particle, ParticleConfig};

mod object3d;
mod particle;
