use crate::color::{self, Color};
use crate::context::UniformValue;
use crate::error::{Error, Result};
use crate::light::{Light, LightState};
use crate::resource::{Material, MaterialCore, UniformBinding};
use glamx::{Mat3, Mat4};

/// Vertex stage of the Phong material.
pub static PHONG_VERTEX_SRC: &str = include_str!("phong.vert.glsl");

/// Fragment stage of the Phong material.
pub static PHONG_FRAGMENT_SRC: &str = include_str!("phong.frag.glsl");

/// Name of the normal-matrix uniform. The Phong shaders cannot work without it.
pub const NORMAL_MATRIX_UNIFORM: &str = "uNMatrix";

/// Parameters of a [`PhongMaterial`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhongConfig {
    /// Color of the specular highlight.
    pub specular_color: Color,
    /// Ambient color. Uploaded, but the shading model weights it by zero.
    pub ambient_color: Color,
    /// Specular exponent.
    pub shininess: f32,
}

impl Default for PhongConfig {
    fn default() -> Self {
        PhongConfig {
            specular_color: color::WHITE,
            ambient_color: color::DIM_GRAY,
            shininess: 96.0,
        }
    }
}

/// Derives the normal matrix of a model matrix.
///
/// This is the transposed inverse of the upper-left 3x3 block, the transform that
/// keeps normals perpendicular to surfaces under non-uniform scale.
pub fn try_normal_matrix(model: &Mat4) -> Result<Mat3> {
    let block = Mat3::from_mat4(*model);
    let determinant = block.determinant();

    if determinant == 0.0 || !determinant.is_finite() {
        return Err(Error::DegenerateTransform { determinant });
    }

    let normal = block.inverse().transpose();
    if normal.is_finite() {
        Ok(normal)
    } else {
        Err(Error::DegenerateTransform { determinant })
    }
}

/// Same as [`try_normal_matrix`], falling back to the untouched 3x3 block (and logging
/// a warning) when that block cannot be inverted.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    match try_normal_matrix(model) {
        Ok(normal) => normal,
        Err(e) => {
            log::warn!("{}; normals are transformed by the model matrix instead", e);
            Mat3::from_mat4(*model)
        }
    }
}

/// Per-fragment Blinn-Phong lighting with a single directional light.
///
/// The diffuse term reads either the attached texture or the vertex colors, never both.
pub struct PhongMaterial {
    core: MaterialCore,
    light_pos: UniformBinding,
    normal_matrix: UniformBinding,
    use_object_transform: UniformBinding,
    specular_color_uniform: UniformBinding,
    ambient_color_uniform: UniformBinding,
    shininess_uniform: UniformBinding,
    normal: Mat3,
    specular_color: Color,
    ambient_color: Color,
    shininess: f32,
}

impl PhongMaterial {
    /// Creates a Phong material with a white highlight, a dim gray ambient color and a
    /// shininess of 96.
    pub fn new() -> Result<PhongMaterial> {
        Self::from_config(&PhongConfig::default())
    }

    /// Creates a Phong material with explicit parameters.
    pub fn with_params(
        specular_color: Color,
        ambient_color: Color,
        shininess: f32,
    ) -> Result<PhongMaterial> {
        Self::from_config(&PhongConfig {
            specular_color,
            ambient_color,
            shininess,
        })
    }

    /// Creates a Phong material from a configuration.
    pub fn from_config(config: &PhongConfig) -> Result<PhongMaterial> {
        let mut material = PhongMaterial {
            core: MaterialCore::new(),
            light_pos: UniformBinding::absent("uLightPos"),
            normal_matrix: UniformBinding::absent(NORMAL_MATRIX_UNIFORM),
            use_object_transform: UniformBinding::absent("uUseObjectTransform"),
            specular_color_uniform: UniformBinding::absent("uSpecularColor"),
            ambient_color_uniform: UniformBinding::absent("uAmbientColor"),
            shininess_uniform: UniformBinding::absent("uShininess"),
            normal: Mat3::IDENTITY,
            specular_color: config.specular_color,
            ambient_color: config.ambient_color,
            shininess: config.shininess,
        };
        material.set_shaders(PHONG_VERTEX_SRC, PHONG_FRAGMENT_SRC)?;
        Ok(material)
    }

    /// The current parameters.
    pub fn config(&self) -> PhongConfig {
        PhongConfig {
            specular_color: self.specular_color,
            ambient_color: self.ambient_color,
            shininess: self.shininess,
        }
    }

    /// Sets the color of the specular highlight.
    pub fn set_specular_color(&mut self, color: Color) {
        self.specular_color = color;
    }

    /// Sets the specular color from a packed `0xAARRGGBB` value.
    pub fn set_specular_argb(&mut self, argb: u32) {
        self.set_specular_color(color::from_argb(argb));
    }

    /// The color of the specular highlight.
    #[inline]
    pub fn specular_color(&self) -> Color {
        self.specular_color
    }

    /// Sets the ambient color.
    pub fn set_ambient_color(&mut self, color: Color) {
        self.ambient_color = color;
    }

    /// Sets the ambient color from a packed `0xAARRGGBB` value.
    pub fn set_ambient_argb(&mut self, argb: u32) {
        self.set_ambient_color(color::from_argb(argb));
    }

    /// The ambient color.
    #[inline]
    pub fn ambient_color(&self) -> Color {
        self.ambient_color
    }

    /// Sets the specular exponent.
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    /// The specular exponent.
    #[inline]
    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    /// The normal matrix derived from the last model matrix.
    #[inline]
    pub fn normal_matrix(&self) -> &Mat3 {
        &self.normal
    }

    fn upload_light(&self, state: LightState) {
        self.core
            .set(&self.light_pos, UniformValue::Vec3(state.position.to_array()));
        self.core.set(
            &self.use_object_transform,
            UniformValue::Bool(state.use_object_transform),
        );
    }
}

impl Material for PhongMaterial {
    fn core(&self) -> &MaterialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MaterialCore {
        &mut self.core
    }

    fn set_shaders(&mut self, vertex_source: &str, fragment_source: &str) -> Result<()> {
        let program = self.core.set_shaders(vertex_source, fragment_source)?;

        let light_pos = program.optional_uniform("uLightPos");
        let normal_matrix = program.required_uniform(NORMAL_MATRIX_UNIFORM);
        let use_object_transform = program.optional_uniform("uUseObjectTransform");
        let specular_color = program.optional_uniform("uSpecularColor");
        let ambient_color = program.optional_uniform("uAmbientColor");
        let shininess = program.optional_uniform("uShininess");

        let normal_matrix = match normal_matrix {
            Ok(binding) => binding,
            Err(e) => {
                self.core.release();
                return Err(e);
            }
        };

        self.light_pos = light_pos;
        self.normal_matrix = normal_matrix;
        self.use_object_transform = use_object_transform;
        self.specular_color_uniform = specular_color;
        self.ambient_color_uniform = ambient_color;
        self.shininess_uniform = shininess;

        // The renderer only calls `set_light` when the light changes.
        if let Some(state) = self.core.light().copied() {
            self.upload_light(state);
        }
        Ok(())
    }

    fn use_program(&self) {
        self.core.use_program();
        self.core.set(
            &self.specular_color_uniform,
            UniformValue::Vec4(color::to_array(self.specular_color)),
        );
        self.core.set(
            &self.ambient_color_uniform,
            UniformValue::Vec4(color::to_array(self.ambient_color)),
        );
        self.core
            .set(&self.shininess_uniform, UniformValue::Float(self.shininess));
    }

    fn set_model_matrix(&mut self, model: &Mat4) {
        self.core.set_model_matrix(model);
        self.normal = normal_matrix(model);
        self.core.set(
            &self.normal_matrix,
            UniformValue::Mat3(self.normal.to_cols_array()),
        );
    }

    fn set_light(&mut self, light: &Light) -> Result<()> {
        if !light.is_directional() {
            return Err(Error::TypeMismatch {
                expected: "directional",
                found: light.light_type.name(),
            });
        }

        let state = light.state();
        self.core.set_light_state(state);
        self.upload_light(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glamx::{Quat, Vec3};

    #[test]
    fn identity_gives_identity() {
        let n = try_normal_matrix(&Mat4::IDENTITY).unwrap();
        assert!(n.abs_diff_eq(Mat3::IDENTITY, 1.0e-6));
    }

    #[test]
    fn uniform_scale_is_inverted() {
        let n = try_normal_matrix(&Mat4::from_scale(Vec3::splat(4.0))).unwrap();
        assert!(n.abs_diff_eq(Mat3::from_diagonal(Vec3::splat(0.25)), 1.0e-6));
    }

    #[test]
    fn rotation_is_preserved() {
        let rot = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 0.7);
        let n = try_normal_matrix(&Mat4::from_quat(rot)).unwrap();
        assert!(n.abs_diff_eq(Mat3::from_quat(rot), 1.0e-5));
    }

    #[test]
    fn translation_is_ignored() {
        let model = Mat4::from_translation(Vec3::new(3.0, -2.0, 8.0));
        let n = try_normal_matrix(&model).unwrap();
        assert!(n.abs_diff_eq(Mat3::IDENTITY, 1.0e-6));
    }

    #[test]
    fn normals_stay_perpendicular_under_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(1.0, 5.0, 1.0))
            * Mat4::from_quat(Quat::from_rotation_z(0.4));
        let n = normal_matrix(&model);
        let block = Mat3::from_mat4(model);

        // A surface spanned by X and Z with normal Y.
        let tangent = block * Vec3::X;
        let normal = n * Vec3::Y;
        assert!(tangent.dot(normal).abs() < 1.0e-5);
    }

    #[test]
    fn degenerate_block_falls_back_to_the_block() {
        let model = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(matches!(
            try_normal_matrix(&model),
            Err(Error::DegenerateTransform { .. })
        ));
        assert_eq!(normal_matrix(&model), Mat3::from_mat4(model));
    }
}
