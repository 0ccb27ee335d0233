//! Data structure of a drawable object.

use crate::context::{Context, DrawMode, RenderFlags};
use crate::error::Result;
use crate::light::Light;
use crate::resource::{Geometry, Material};
use glamx::Mat4;

/// Per-frame inputs shared by every object drawn in that frame.
#[derive(Copy, Clone, Debug)]
pub struct RenderFrame<'a> {
    /// World to eye transform.
    pub view: Mat4,
    /// Eye to clip transform.
    pub projection: Mat4,
    /// The scene light, if any.
    pub light: Option<&'a Light>,
}

impl<'a> RenderFrame<'a> {
    /// A frame with identity view and projection and no light.
    pub fn new() -> Self {
        RenderFrame {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            light: None,
        }
    }

    /// Sets the view matrix.
    pub fn with_view(mut self, view: Mat4) -> Self {
        self.view = view;
        self
    }

    /// Sets the projection matrix.
    pub fn with_projection(mut self, projection: Mat4) -> Self {
        self.projection = projection;
        self
    }

    /// Sets the light.
    pub fn with_light(mut self, light: &'a Light) -> Self {
        self.light = Some(light);
        self
    }
}

impl Default for RenderFrame<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Something the renderer can draw.
pub trait Drawable {
    /// Pushes object-specific shader parameters. Runs right before the draw call.
    fn refresh_shader_params(&mut self) {}

    /// Draws the object, running [`refresh_shader_params`](Self::refresh_shader_params)
    /// between `use_program` and the draw call.
    fn render(&mut self, frame: &RenderFrame) -> Result<()>;
}

/// A geometry drawn with a material.
pub struct Object3d<M: Material> {
    geometry: Geometry,
    material: M,
    draw_mode: DrawMode,
    flags: RenderFlags,
    transform: Mat4,
    visible: bool,
    last_light: Option<Light>,
}

impl<M: Material> Object3d<M> {
    /// Creates a visible, opaque object drawn as triangles at the origin.
    pub fn new(geometry: Geometry, material: M) -> Self {
        Object3d {
            geometry,
            material,
            draw_mode: DrawMode::Triangles,
            flags: RenderFlags::empty(),
            transform: Mat4::IDENTITY,
            visible: true,
            last_light: None,
        }
    }

    /// The geometry.
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The geometry, mutably.
    #[inline]
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    /// The material.
    #[inline]
    pub fn material(&self) -> &M {
        &self.material
    }

    /// The material, mutably.
    #[inline]
    pub fn material_mut(&mut self) -> &mut M {
        &mut self.material
    }

    /// Sets how indices are assembled into primitives.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
    }

    /// How indices are assembled into primitives.
    #[inline]
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Enables alpha blending.
    pub fn set_transparent(&mut self, transparent: bool) {
        self.flags.set(RenderFlags::TRANSPARENT, transparent);
    }

    /// Whether alpha blending is enabled.
    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(RenderFlags::TRANSPARENT)
    }

    /// Disables back-face culling.
    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.flags.set(RenderFlags::DOUBLE_SIDED, double_sided);
    }

    /// Whether back-face culling is disabled.
    #[inline]
    pub fn is_double_sided(&self) -> bool {
        self.flags.contains(RenderFlags::DOUBLE_SIDED)
    }

    /// Sets the model matrix.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// The model matrix.
    #[inline]
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Shows or hides the object.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether the object is drawn.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Pushes the per-frame state to the material and binds its program.
    ///
    /// The material sees, in order: the model matrix, the light (only when it differs
    /// from the one of the previous draw), the view matrix, `use_program` and the MVP
    /// matrix. Returns `false` when nothing must be drawn: the object is hidden, or its
    /// material has no program.
    pub fn prepare(&mut self, frame: &RenderFrame) -> Result<bool> {
        if !self.visible {
            return Ok(false);
        }

        if self.material.core().program().is_none() {
            log::warn!("skipping the draw of an object whose material has no program");
            return Ok(false);
        }

        self.material.set_model_matrix(&self.transform);

        if let Some(light) = frame.light {
            if self.last_light.as_ref() != Some(light) {
                self.material.set_light(light)?;
                self.last_light = Some(light.clone());
            }
        }

        self.material.set_view_matrix(&frame.view);
        self.material.use_program();
        self.material
            .set_mvp_matrix(&(frame.projection * frame.view * self.transform));

        Ok(true)
    }

    /// Binds the geometry and issues the draw call. Call after a successful
    /// [`prepare`](Self::prepare).
    pub fn draw(&mut self) -> Result<()> {
        let attributes = self.material.core().attributes();
        if let Some(indices) = self.geometry.bind(attributes)? {
            let ctxt = Context::get();
            ctxt.set_render_flags(self.flags);
            ctxt.draw_elements(self.draw_mode, indices, self.geometry.num_indices());
        }

        Ok(())
    }
}

impl<M: Material> Drawable for Object3d<M> {
    fn render(&mut self, frame: &RenderFrame) -> Result<()> {
        if self.prepare(frame)? {
            self.refresh_shader_params();
            self.draw()?;
        }
        Ok(())
    }
}
