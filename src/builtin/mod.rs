//! Built-in materials and their shaders.

pub use self::particle_material::{
    ParticleMaterial, DEFAULT_POINT_SIZE, PARTICLE_FRAGMENT_SRC, PARTICLE_VERTEX_SRC,
};
pub use self::phong_material::{
    normal_matrix, try_normal_matrix, PhongConfig, PhongMaterial, NORMAL_MATRIX_UNIFORM,
    PHONG_FRAGMENT_SRC, PHONG_VERTEX_SRC,
};

mod particle_material;
mod phong_material;
pub mod phong_shading;
