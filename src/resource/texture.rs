//! Decoded textures, uploaded to the GPU on first use.

use crate::color::Color;
use crate::context::{Context, TextureHandle};
use crate::error::{Error, Result};
use glamx::Vec2;
use image::{DynamicImage, RgbaImage};
use std::cell::RefCell;
use std::rc::Rc;

/// Wrapping parameters for a texture.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureWrapping {
    /// Repeats the texture when a texture coordinate is out of bounds.
    #[default]
    Repeat,
    /// Repeats the nearest edge point texture color when a texture coordinate is out of bounds.
    ClampToEdge,
}

/// Anything a fragment stage can read a color from.
pub trait TextureSampler {
    /// The color at texture coordinate `uv`.
    fn sample(&self, uv: Vec2) -> Color;
}

/// A 2D RGBA texture.
///
/// The texels stay in RAM so the texture can be sampled on the CPU; the GPU copy is
/// created the first time the texture is bound and released on drop.
pub struct Texture {
    image: RgbaImage,
    wrapping: TextureWrapping,
    gpu: RefCell<Option<(Context, TextureHandle)>>,
}

impl Texture {
    /// Wraps decoded texels.
    pub fn new(image: RgbaImage, wrapping: TextureWrapping) -> Rc<Texture> {
        Rc::new(Texture {
            image,
            wrapping,
            gpu: RefCell::new(None),
        })
    }

    /// Converts any decoded image to RGBA8 and wraps it.
    pub fn from_image(image: DynamicImage, wrapping: TextureWrapping) -> Rc<Texture> {
        Self::new(image.to_rgba8(), wrapping)
    }

    /// A 1x1 texture of a single color.
    pub fn solid(color: Color) -> Rc<Texture> {
        let texel = [
            (color.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (color.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (color.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (color.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ];
        Self::new(
            RgbaImage::from_pixel(1, 1, image::Rgba(texel)),
            TextureWrapping::Repeat,
        )
    }

    /// Texture dimensions (width, height).
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// The texels.
    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The wrapping mode.
    #[inline]
    pub fn wrapping(&self) -> TextureWrapping {
        self.wrapping
    }

    /// Returns `true` if this texture is already uploaded to the GPU.
    #[inline]
    pub fn is_on_gpu(&self) -> bool {
        self.gpu.borrow().is_some()
    }

    /// Binds the texture to `unit`, uploading it first if needed.
    pub fn bind(&self, unit: u32) -> Result<()> {
        let mut gpu = self.gpu.borrow_mut();

        if gpu.is_none() {
            let ctxt = Context::get();
            let (width, height) = self.image.dimensions();
            let handle = ctxt
                .create_texture(
                    width,
                    height,
                    self.image.as_raw(),
                    self.wrapping == TextureWrapping::Repeat,
                )
                .map_err(|log| Error::Resource { log })?;
            *gpu = Some((ctxt, handle));
        }

        if let Some((ctxt, handle)) = gpu.as_ref() {
            ctxt.bind_texture(unit, *handle);
        }
        Ok(())
    }

    fn wrap(&self, coord: f32, extent: u32) -> u32 {
        let max = extent.saturating_sub(1);
        let t = match self.wrapping {
            TextureWrapping::Repeat => coord - coord.floor(),
            TextureWrapping::ClampToEdge => coord.clamp(0.0, 1.0),
        };
        ((t * extent as f32) as u32).min(max)
    }
}

impl TextureSampler for Texture {
    /// Nearest-texel lookup.
    fn sample(&self, uv: Vec2) -> Color {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return crate::color::TRANSPARENT;
        }
        let texel = self
            .image
            .get_pixel(self.wrap(uv.x, width), self.wrap(uv.y, height));
        let [r, g, b, a] = texel.0;
        Color::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some((ctxt, handle)) = self.gpu.get_mut().take() {
            ctxt.delete_texture(handle);
        }
    }
}
