//! Vertex data of a drawable.

use crate::color::Color;
use crate::context::{BufferHandle, BufferType, Context};
use crate::error::Result;
use crate::resource::gpu_vector::GPUVec;
use crate::resource::material::VertexAttributes;
use crate::resource::vertex_index::VertexIndex;
use glamx::{Vec2, Vec3};

/// Vertex positions, normals, texture coordinates and colors, plus an index list.
///
/// The per-vertex arrays are parallel: entry `i` of each describes vertex `i`. Data
/// stays on the RAM and is uploaded to the GPU the first time the geometry is bound.
pub struct Geometry {
    coords: GPUVec<Vec3>,
    normals: GPUVec<Vec3>,
    uvs: GPUVec<Vec2>,
    colors: GPUVec<[f32; 4]>,
    indices: GPUVec<VertexIndex>,
}

impl Geometry {
    /// Creates a geometry.
    ///
    /// Missing normals default to +Z, missing texture coordinates to the origin and
    /// missing colors to opaque white.
    ///
    /// # Panics
    /// Panics if a provided per-vertex array does not have one entry per position, or
    /// if an index is out of range.
    pub fn new(
        coords: Vec<Vec3>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
        colors: Option<Vec<Color>>,
        indices: Vec<VertexIndex>,
    ) -> Geometry {
        let n = coords.len();
        let normals = normals.unwrap_or_else(|| vec![Vec3::Z; n]);
        let uvs = uvs.unwrap_or_else(|| vec![Vec2::ZERO; n]);
        let colors: Vec<[f32; 4]> = match colors {
            Some(cs) => cs.into_iter().map(crate::color::to_array).collect(),
            None => vec![[1.0; 4]; n],
        };

        assert_eq!(normals.len(), n, "one normal per vertex is required");
        assert_eq!(uvs.len(), n, "one texture coordinate per vertex is required");
        assert_eq!(colors.len(), n, "one color per vertex is required");
        assert!(
            indices.iter().all(|i| (*i as usize) < n),
            "vertex index out of bounds"
        );

        Geometry {
            coords: GPUVec::new(coords, BufferType::Array),
            normals: GPUVec::new(normals, BufferType::Array),
            uvs: GPUVec::new(uvs, BufferType::Array),
            colors: GPUVec::new(colors, BufferType::Array),
            indices: GPUVec::new(indices, BufferType::ElementArray),
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.coords.len()
    }

    /// Number of indices, i.e. the count passed to the draw call.
    #[inline]
    pub fn num_indices(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Vertex positions, if on RAM.
    #[inline]
    pub fn coords(&self) -> Option<&[Vec3]> {
        self.coords.data().as_deref()
    }

    /// Mutable vertex positions. The positions are uploaded again at the next bind.
    pub fn coords_mut(&mut self) -> Option<&mut [Vec3]> {
        self.coords.data_mut().as_deref_mut()
    }

    /// Vertex normals, if on RAM.
    #[inline]
    pub fn normals(&self) -> Option<&[Vec3]> {
        self.normals.data().as_deref()
    }

    /// Texture coordinates, if on RAM.
    #[inline]
    pub fn uvs(&self) -> Option<&[Vec2]> {
        self.uvs.data().as_deref()
    }

    /// Vertex colors, if on RAM.
    pub fn colors(&self) -> Option<Vec<Color>> {
        self.colors
            .data()
            .as_ref()
            .map(|cs| cs.iter().map(|c| Color::new(c[0], c[1], c[2], c[3])).collect())
    }

    /// The index list, if on RAM.
    #[inline]
    pub fn indices(&self) -> Option<&[VertexIndex]> {
        self.indices.data().as_deref()
    }

    /// Uploads whatever changed and feeds the attributes the program reads.
    ///
    /// Returns the index buffer to draw from, `None` for an empty geometry.
    pub fn bind(&mut self, attributes: VertexAttributes) -> Result<Option<BufferHandle>> {
        let ctxt = Context::get();

        bind_attribute(&ctxt, &mut self.coords, attributes.position, 3)?;
        bind_attribute(&ctxt, &mut self.normals, attributes.normal, 3)?;
        bind_attribute(&ctxt, &mut self.uvs, attributes.texture_coord, 2)?;
        bind_attribute(&ctxt, &mut self.colors, attributes.color, 4)?;

        self.indices.ensure_on_gpu()
    }
}

fn bind_attribute<T: bytemuck::Pod>(
    ctxt: &Context,
    data: &mut GPUVec<T>,
    location: Option<u32>,
    components: u32,
) -> Result<()> {
    if let Some(location) = location {
        if let Some(buffer) = data.ensure_on_gpu()? {
            ctxt.bind_attribute(buffer, location, components);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Command, HeadlessBackend};
    use std::rc::Rc;

    fn triangle() -> Geometry {
        Geometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            None,
            None,
            Some(vec![crate::color::RED; 3]),
            vec![0, 1, 2],
        )
    }

    #[test]
    fn defaults_fill_missing_arrays() {
        let geometry = triangle();
        assert_eq!(geometry.num_vertices(), 3);
        assert_eq!(geometry.num_indices(), 3);
        assert_eq!(geometry.normals().unwrap(), &[Vec3::Z; 3]);
        assert_eq!(geometry.colors().unwrap()[1], crate::color::RED);
    }

    #[test]
    #[should_panic(expected = "vertex index out of bounds")]
    fn rejects_out_of_range_indices() {
        let _ = Geometry::new(vec![Vec3::ZERO], None, None, None, vec![0, 1]);
    }

    #[test]
    fn only_read_attributes_are_uploaded() {
        let backend = Rc::new(HeadlessBackend::new());
        Context::init_shared(backend.clone());

        let mut geometry = triangle();
        let attributes = VertexAttributes {
            position: Some(0),
            ..Default::default()
        };
        let indices = geometry.bind(attributes).unwrap();
        assert!(indices.is_some());
        // Positions and indices.
        assert_eq!(backend.live_buffers(), 2);

        // Nothing changed: binding again uploads nothing new.
        let _ = geometry.bind(attributes).unwrap();
        assert_eq!(backend.live_buffers(), 2);

        drop(geometry);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn edited_positions_are_uploaded_in_place() {
        let backend = Rc::new(HeadlessBackend::new());
        Context::init_shared(backend.clone());

        let mut geometry = triangle();
        let attributes = VertexAttributes {
            position: Some(0),
            ..Default::default()
        };
        let _ = geometry.bind(attributes).unwrap();
        backend.clear_commands();

        geometry.coords_mut().unwrap()[1] = Vec3::new(2.0, 0.0, 0.0);
        let _ = geometry.bind(attributes).unwrap();

        let updates = backend
            .commands()
            .into_iter()
            .filter(|c| matches!(c, Command::UpdateBuffer(..)))
            .count();
        assert_eq!(updates, 1);
        assert_eq!(backend.live_buffers(), 2);
        assert_eq!(geometry.coords().unwrap()[1], Vec3::new(2.0, 0.0, 0.0));
    }
}
