//! GPU resources: programs, materials, geometry and textures.

pub use crate::resource::geometry::Geometry;
pub use crate::resource::gpu_vector::GPUVec;
pub use crate::resource::material::{Material, MaterialCore, VertexAttributes};
pub use crate::resource::shader_program::{ShaderProgram, UniformBinding};
pub use crate::resource::texture::{Texture, TextureSampler, TextureWrapping};
pub use crate::resource::vertex_index::VertexIndex;

mod geometry;
mod gpu_vector;
pub mod material;
mod shader_program;
mod texture;
pub mod vertex_index;
