//! Errors reported by shader programs and materials.

use crate::context::ShaderStage;
use thiserror::Error;

/// Result type used throughout wallgl.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while building or driving a material.
///
/// Recoverable conditions (an optional uniform the driver optimised away, a degenerate
/// model matrix on the fallback path) never surface here: they are logged and absorbed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A shader stage failed to compile.
    #[error("could not compile {stage} shader: {log}")]
    Compile {
        /// The stage that failed.
        stage: ShaderStage,
        /// The driver's info log.
        log: String,
    },
    /// The compiled stages could not be linked into a program.
    #[error("could not link program: {log}")]
    Link {
        /// The driver's info log.
        log: String,
    },
    /// A uniform the material cannot render without is not active in the program.
    #[error("could not get uniform location for {name}")]
    MissingUniform {
        /// Name of the uniform as written in the shader source.
        name: String,
    },
    /// The device refused to allocate a buffer or texture.
    #[error("could not allocate GPU resource: {log}")]
    Resource {
        /// The driver's message.
        log: String,
    },
    /// A light of an unsupported variant was handed to a material.
    #[error("expected a {expected} light, got a {found} light")]
    TypeMismatch {
        /// The variant the material supports.
        expected: &'static str,
        /// The variant it was given.
        found: &'static str,
    },
    /// The rotation/scale block of a model matrix is not invertible.
    #[error("model matrix is not invertible (determinant {determinant})")]
    DegenerateTransform {
        /// Determinant of the upper-left 3x3 block.
        determinant: f32,
    },
}
