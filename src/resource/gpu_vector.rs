//! Wrapper for a GPU buffer object.

use crate::context::{BufferHandle, BufferType, Context};
use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};

/// A vector of elements that can be loaded to the GPU, on the RAM, or both.
pub struct GPUVec<T: Pod + Zeroable> {
    dirty: bool,
    len: usize,
    buf_type: BufferType,
    buffer: Option<(Context, BufferHandle)>,
    data: Option<Vec<T>>,
}

impl<T: Pod + Zeroable> GPUVec<T> {
    /// Creates a new `GPUVec` that is not yet uploaded to the GPU.
    pub fn new(data: Vec<T>, buf_type: BufferType) -> GPUVec<T> {
        GPUVec {
            dirty: true,
            len: data.len(),
            buf_type,
            buffer: None,
            data: Some(data),
        }
    }

    /// Is this vector empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The length of this vector.
    #[inline]
    pub fn len(&self) -> usize {
        match (self.dirty, &self.data) {
            (true, Some(d)) => d.len(),
            _ => self.len,
        }
    }

    /// Mutably accesses the vector if it is available on RAM.
    ///
    /// This method will mark this vector as `dirty`.
    #[inline]
    pub fn data_mut(&mut self) -> &mut Option<Vec<T>> {
        self.dirty = true;
        &mut self.data
    }

    /// Immutably accesses the vector if it is available on RAM.
    #[inline]
    pub fn data(&self) -> &Option<Vec<T>> {
        &self.data
    }

    /// Returns `true` if this vector is already uploaded to the GPU.
    #[inline]
    pub fn is_on_gpu(&self) -> bool {
        self.buffer.is_some()
    }

    /// Returns `true` if the cpu data and gpu data are out of sync.
    #[inline]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the buffer handle if it exists.
    #[inline]
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer.as_ref().map(|(_, b)| *b)
    }

    /// Loads the vector from the RAM to the GPU.
    ///
    /// If the vector is not available on RAM, is empty, or is already in sync, nothing
    /// will happen.
    pub fn load_to_gpu(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(ref data) = self.data {
            if data.is_empty() {
                return Ok(());
            }

            let bytes: &[u8] = bytemuck::cast_slice(data);
            self.len = data.len();

            match &self.buffer {
                Some((ctxt, buffer)) => ctxt.update_buffer(*buffer, self.buf_type, bytes),
                None => {
                    let ctxt = Context::get();
                    let buffer = ctxt
                        .create_buffer(self.buf_type, bytes)
                        .map_err(|log| Error::Resource { log })?;
                    self.buffer = Some((ctxt, buffer));
                }
            }
        }

        self.dirty = false;
        Ok(())
    }

    /// Ensures the buffer is on the GPU and returns its handle.
    ///
    /// Returns `None` if the data is empty.
    #[inline]
    pub fn ensure_on_gpu(&mut self) -> Result<Option<BufferHandle>> {
        self.load_to_gpu()?;
        Ok(self.buffer())
    }
}

impl<T: Pod + Zeroable> Drop for GPUVec<T> {
    fn drop(&mut self) {
        if let Some((ctxt, buffer)) = self.buffer.take() {
            ctxt.delete_buffer(buffer);
        }
    }
}
