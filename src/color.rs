//! Color type and a handful of named constants.

pub use rgb::Rgba;

/// The color type used throughout wallgl. RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;

/// Black (0, 0, 0)
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// White (255, 255, 255)
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Red (255, 0, 0)
pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// Lime (0, 255, 0)
pub const LIME: Color = Color::new(0.0, 1.0, 0.0, 1.0);

/// Blue (0, 0, 255)
pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

/// Dim gray (51, 51, 51), the default ambient color of lit materials.
pub const DIM_GRAY: Color = Color::new(0.2, 0.2, 0.2, 1.0);

/// Fully transparent black.
pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

/// Converts a packed `0xAARRGGBB` color, as handed out by Android's `Color` helpers,
/// into a normalized [`Color`].
pub fn from_argb(argb: u32) -> Color {
    let channel = |shift: u32| ((argb >> shift) & 0xff) as f32 / 255.0;
    Color::new(channel(16), channel(8), channel(0), channel(24))
}

/// Flattens a color into the `vec4` layout expected by shader uniforms.
#[inline]
pub fn to_array(color: Color) -> [f32; 4] {
    [color.r, color.g, color.b, color.a]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_is_normalized() {
        let c = from_argb(0x80ff0000);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert_eq!(c.b, 0.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn opaque_white_from_argb() {
        assert_eq!(from_argb(0xffffffff), WHITE);
    }
}
