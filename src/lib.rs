/*!
# wallgl

Materials, shader programs and primitives for live-wallpaper scenes on GLES-class
devices.

The crate covers what sits between a scene and the graphics driver:

* [`ShaderProgram`](resource::ShaderProgram) compiles and links a vertex/fragment pair and
  resolves uniform locations. Uniforms a shader can work without are optional: a missing
  one is logged and writing to it does nothing. A material may also declare a uniform as
  required, in which case its absence is an error.
* The [`Material`](resource::Material) trait is what a renderer drives once per object
  and frame: `set_model_matrix`, `set_light`, `use_program`, then the draw call.
* [`PhongMaterial`](builtin::PhongMaterial) implements per-fragment Blinn-Phong lighting
  and derives the normal matrix from every model matrix it is given.
* [`Particle`](scene::Particle) is a single transparent point sprite whose size is
  pushed to its [`ParticleMaterial`](builtin::ParticleMaterial) before each draw.

Everything goes through a [`GraphicsBackend`](context::GraphicsBackend) installed in
the thread's [`Context`](context::Context). The `gles` feature provides one over
`glow`; [`HeadlessBackend`](context::HeadlessBackend) runs without a GPU and records
every call.

```
use wallgl::prelude::*;

# fn main() -> wallgl::Result<()> {
Context::init(HeadlessBackend::new());

let sun = Light::directional(-Vec3::Z).with_position(Vec3::new(0.0, 0.0, 5.0));
let mut particle = Particle::new()?;
particle.set_point_size(25.0);

let frame = RenderFrame::new().with_light(&sun);
particle.render(&frame)?;
# Ok(())
# }
```
*/
#![allow(clippy::module_inception)]
#![allow(clippy::new_without_default)]

#[macro_use]
extern crate bitflags;
#[cfg(feature = "serde")]
extern crate serde;

pub use glamx;

pub mod builtin;
pub mod color;
pub mod context;
mod error;
pub mod light;
pub mod resource;
pub mod scene;

pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::builtin::*;
    pub use crate::color::*;
    pub use crate::context::*;
    pub use crate::error::{Error, Result};
    pub use crate::light::*;
    pub use crate::resource::*;
    pub use crate::scene::*;
    pub use glamx::{Mat3, Mat4, Quat, Vec2, Vec3};
    pub use std::rc::Rc;
}
