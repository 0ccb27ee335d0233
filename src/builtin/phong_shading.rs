//! CPU evaluation of the Phong shaders.
//!
//! Mirrors `phong.vert.glsl` and `phong.frag.glsl` step by step so the lighting model can
//! be checked, or previewed, without a GPU.

use crate::builtin::PhongConfig;
use crate::color::Color;
use crate::light::LightState;
use crate::resource::TextureSampler;
use glamx::{Mat3, Mat4, Vec2, Vec3, Vec4Swizzles};

/// Uniform inputs of the vertex stage.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhongTransforms {
    /// `uMMatrix`
    pub model: Mat4,
    /// `uVMatrix`
    pub view: Mat4,
    /// `uNMatrix`
    pub normal: Mat3,
}

/// Per-vertex attributes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhongVertex {
    /// `aPosition`
    pub position: Vec3,
    /// `aNormal`
    pub normal: Vec3,
    /// `aTextureCoord`
    pub tex_coord: Vec2,
    /// `aColor`
    pub color: Color,
}

/// Outputs of the vertex stage, as seen by the fragment stage.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhongVaryings {
    /// Surface normal.
    pub normal: Vec3,
    /// Direction towards the light.
    pub light: Vec3,
    /// Direction towards the eye.
    pub eye: Vec3,
    /// Half vector between `light` and `eye`.
    pub half: Vec3,
    /// Texture coordinate.
    pub tex_coord: Vec2,
    /// Vertex color.
    pub color: Color,
}

impl PhongVaryings {
    /// Runs the vertex stage.
    pub fn from_vertex(
        vertex: &PhongVertex,
        transforms: &PhongTransforms,
        light: &LightState,
    ) -> PhongVaryings {
        let eye_position = (transforms.model * vertex.position.extend(1.0)).xyz();
        let light_position = if light.use_object_transform {
            (transforms.view * light.position.extend(1.0)).xyz()
        } else {
            light.position
        };

        let normal = (transforms.normal * vertex.normal).normalize_or_zero();
        let to_light = (light_position - eye_position).normalize_or_zero();
        let eye = -eye_position.normalize_or_zero();
        let half = (to_light + eye).normalize_or_zero();

        PhongVaryings {
            normal,
            light: to_light,
            eye,
            half,
            tex_coord: vertex.tex_coord,
            color: vertex.color,
        }
    }
}

/// The terms the fragment stage sums up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhongTerms {
    /// Diffuse factor `max(N.L, 0)`.
    pub kd: f32,
    /// Specular factor `max(N.H, 0)^shininess`.
    pub ks: f32,
    /// Ambient factor. Always zero.
    pub ka: f32,
    /// Ambient contribution.
    pub ambient: Color,
    /// Diffuse contribution.
    pub diffuse: Color,
    /// Specular contribution.
    pub specular: Color,
}

impl PhongTerms {
    /// `ambient + diffuse + specular`, unclamped.
    pub fn color(&self) -> Color {
        add(add(self.ambient, self.diffuse), self.specular)
    }
}

#[inline]
fn scale(c: Color, k: f32) -> Color {
    Color::new(c.r * k, c.g * k, c.b * k, c.a * k)
}

#[inline]
fn add(a: Color, b: Color) -> Color {
    Color::new(a.r + b.r, a.g + b.g, a.b + b.b, a.a + b.a)
}

/// Runs the fragment stage.
///
/// `texture` plays the role of `uTexture0`; its presence is `uUseTexture`. When it is
/// set the vertex color is not read, and when it is not the texture is never sampled.
pub fn shade(
    config: &PhongConfig,
    texture: Option<&dyn TextureSampler>,
    varyings: &PhongVaryings,
) -> PhongTerms {
    let n = varyings.normal.normalize_or_zero();
    let l = varyings.light.normalize_or_zero();
    let h = varyings.half.normalize_or_zero();

    let kd = n.dot(l).max(0.0);
    let ks = h.dot(n).max(0.0).powf(config.shininess);
    let ka = 0.0;

    let base = match texture {
        Some(sampler) => sampler.sample(varyings.tex_coord),
        None => varyings.color,
    };

    PhongTerms {
        kd,
        ks,
        ka,
        ambient: scale(config.ambient_color, ka),
        diffuse: scale(base, kd),
        specular: scale(config.specular_color, ks),
    }
}
