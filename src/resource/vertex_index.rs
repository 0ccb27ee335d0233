/// The type used for vertex indices. GLES 2 only guarantees 16-bit element indices.
pub type VertexIndex = u16;
