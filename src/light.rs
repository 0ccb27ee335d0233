//! Light sources handed to materials.
//!
//! Materials never keep a reference to a [`Light`]: they copy the parts they need into a
//! [`LightState`] when [`Material::set_light`](crate::resource::Material::set_light) is
//! called.

use glamx::Vec3;

/// The type of light source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightType {
    /// A point light that emits light equally in all directions from its position.
    Point {
        /// Maximum distance the light affects.
        attenuation_radius: f32,
    },

    /// A directional light with parallel rays, without attenuation falloff.
    Directional(Vec3),

    /// A spot light that emits a cone of light from its position.
    Spot {
        /// Inner cone angle in radians. Full intensity within this cone.
        inner_cone_angle: f32,
        /// Outer cone angle in radians. Light fades to zero at this angle.
        outer_cone_angle: f32,
        /// Maximum distance the light affects.
        attenuation_radius: f32,
    },
}

impl LightType {
    /// Short human-readable name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            LightType::Point { .. } => "point",
            LightType::Directional(_) => "directional",
            LightType::Spot { .. } => "spot",
        }
    }
}

impl Default for LightType {
    fn default() -> Self {
        LightType::Directional(-Vec3::Z)
    }
}

/// A light source.
///
/// # Examples
/// ```
/// # use wallgl::light::Light;
/// # use glamx::Vec3;
/// let sun = Light::directional(Vec3::new(0.0, -1.0, -1.0))
///     .with_position(Vec3::new(0.0, 10.0, 10.0))
///     .with_object_transform(true);
/// assert!(sun.should_use_object_transform());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Light {
    /// The type of light (point, directional, or spot).
    pub light_type: LightType,
    /// Position of the light, in world space unless `use_object_transform` is set.
    pub position: Vec3,
    /// Whether the position must go through the view matrix before shading.
    pub use_object_transform: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::default(),
            position: Vec3::new(0.0, 0.0, 1.0),
            use_object_transform: false,
        }
    }
}

impl Light {
    /// Creates a point light with the given attenuation radius.
    pub fn point(attenuation_radius: f32) -> Self {
        Self {
            light_type: LightType::Point { attenuation_radius },
            ..Default::default()
        }
    }

    /// Creates a directional light shining along `dir`.
    pub fn directional(dir: Vec3) -> Self {
        Self {
            light_type: LightType::Directional(dir),
            ..Default::default()
        }
    }

    /// Creates a spot light with the given cone angles and attenuation radius.
    pub fn spot(inner_cone_angle: f32, outer_cone_angle: f32, attenuation_radius: f32) -> Self {
        Self {
            light_type: LightType::Spot {
                inner_cone_angle,
                outer_cone_angle,
                attenuation_radius,
            },
            ..Default::default()
        }
    }

    /// Sets the light position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets whether the position is transformed by the view matrix in the shader.
    pub fn with_object_transform(mut self, enabled: bool) -> Self {
        self.use_object_transform = enabled;
        self
    }

    /// The light position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Whether the position must be transformed by the view matrix before use.
    #[inline]
    pub fn should_use_object_transform(&self) -> bool {
        self.use_object_transform
    }

    /// Returns `true` for directional lights.
    #[inline]
    pub fn is_directional(&self) -> bool {
        matches!(self.light_type, LightType::Directional(_))
    }

    /// Copies the shader-facing part of this light.
    pub fn state(&self) -> LightState {
        LightState {
            position: self.position,
            use_object_transform: self.use_object_transform,
        }
    }
}

/// The part of a [`Light`] a material keeps between frames.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightState {
    /// Light position.
    pub position: Vec3,
    /// Whether the shader applies the view matrix to `position`.
    pub use_object_transform: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_a_copy() {
        let mut light = Light::directional(-Vec3::Z).with_position(Vec3::X);
        let state = light.state();
        light.position = Vec3::Y;
        assert_eq!(state.position, Vec3::X);
        assert!(!state.use_object_transform);
    }

    #[test]
    fn variant_names() {
        assert_eq!(Light::point(1.0).light_type.name(), "point");
        assert_eq!(Light::spot(0.1, 0.2, 3.0).light_type.name(), "spot");
        assert!(Light::default().is_directional());
    }
}
