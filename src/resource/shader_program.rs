//! Compiled shader programs and their uniform bindings.

use crate::context::{Context, ProgramHandle, ShaderStage, UniformLocation, UniformValue};
use crate::error::{Error, Result};

/// A uniform name together with its resolved location.
///
/// The location is `None` when the program has no such active uniform, either because
/// the name is wrong or because the driver optimised the uniform away. Writing to an
/// absent binding does nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformBinding {
    name: &'static str,
    location: Option<UniformLocation>,
}

impl UniformBinding {
    /// A binding that resolves to nothing.
    pub const fn absent(name: &'static str) -> Self {
        UniformBinding {
            name,
            location: None,
        }
    }

    /// The uniform name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The resolved location, if any.
    #[inline]
    pub fn location(&self) -> Option<UniformLocation> {
        self.location
    }

    /// Whether the program has this uniform.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.location.is_some()
    }
}

/// A linked vertex/fragment program, exclusively owned.
///
/// The GPU program is deleted when this value is dropped.
pub struct ShaderProgram {
    ctxt: Context,
    handle: ProgramHandle,
}

impl ShaderProgram {
    /// Compiles both stages and links them.
    ///
    /// Intermediate shader objects are released whatever the outcome.
    pub fn compile_and_link(vertex_source: &str, fragment_source: &str) -> Result<ShaderProgram> {
        let ctxt = Context::get();

        log::trace!("compiling vertex shader");
        let vs = ctxt
            .compile_shader(ShaderStage::Vertex, vertex_source)
            .map_err(|log| Error::Compile {
                stage: ShaderStage::Vertex,
                log,
            })?;

        log::trace!("compiling fragment shader");
        let fs = match ctxt.compile_shader(ShaderStage::Fragment, fragment_source) {
            Ok(fs) => fs,
            Err(log) => {
                ctxt.delete_shader(vs);
                return Err(Error::Compile {
                    stage: ShaderStage::Fragment,
                    log,
                });
            }
        };

        let linked = ctxt.link_program(vs, fs);
        ctxt.delete_shader(vs);
        ctxt.delete_shader(fs);

        let handle = linked.map_err(|log| Error::Link { log })?;
        Ok(ShaderProgram { ctxt, handle })
    }

    /// The underlying program handle.
    #[inline]
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Looks a uniform up. Never fails: absence is part of the result.
    pub fn resolve_uniform(&self, name: &'static str) -> UniformBinding {
        UniformBinding {
            name,
            location: self.ctxt.uniform_location(self.handle, name),
        }
    }

    /// Looks up a uniform the shader can work without; absence is logged.
    pub fn optional_uniform(&self, name: &'static str) -> UniformBinding {
        let binding = self.resolve_uniform(name);
        if !binding.is_present() {
            log::debug!("Could not get uniform location for {}", name);
        }
        binding
    }

    /// Looks up a uniform the shader cannot render correctly without.
    pub fn required_uniform(&self, name: &'static str) -> Result<UniformBinding> {
        let binding = self.resolve_uniform(name);
        if binding.is_present() {
            Ok(binding)
        } else {
            Err(Error::MissingUniform {
                name: name.to_string(),
            })
        }
    }

    /// Location of a vertex attribute, absence is logged.
    pub fn attribute(&self, name: &str) -> Option<u32> {
        let location = self.ctxt.attribute_location(self.handle, name);
        if location.is_none() {
            log::debug!("Could not get attrib location for {}", name);
        }
        location
    }

    /// Writes a uniform. A no-op for absent bindings.
    #[inline]
    pub fn set(&self, binding: &UniformBinding, value: UniformValue) {
        if let Some(location) = binding.location {
            self.ctxt.set_uniform(self.handle, location, value);
        }
    }

    /// Makes this program the active one.
    #[inline]
    pub fn bind(&self) {
        self.ctxt.use_program(Some(self.handle));
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.ctxt.delete_program(self.handle);
    }
}
