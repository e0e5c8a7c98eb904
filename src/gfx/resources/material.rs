//! Surface materials
//!
//! Plain PBR-style parameters attached to scene nodes. The renderer reads these
//! every frame, so changing a material on a node (floor styling, lights on/off)
//! takes effect without any GPU bookkeeping on the caller's side.

/// Material definition with PBR-style properties
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 0.0,
        }
    }
}

impl Material {
    /// Creates a new material with basic PBR properties
    ///
    /// # Arguments
    /// * `name` - Name of the material, usually taken from the MTL file
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Builds a material from a packed `0xRRGGBB` color.
    pub fn from_hex(name: &str, rgb: u32, metallic: f32, roughness: f32) -> Self {
        Self::new(name, hex_to_rgba(rgb), metallic, roughness)
    }

    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b, self.base_color[3]];
        self
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_emission(mut self, r: f32, g: f32, b: f32, intensity: f32) -> Self {
        self.emissive = [r, g, b];
        self.emissive_intensity = intensity.max(0.0);
        self
    }
}

/// Converts `0xRRGGBB` into an opaque linear RGBA color.
pub fn hex_to_rgba(rgb: u32) -> [f32; 4] {
    let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(hex_to_rgba(0xff0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hex_to_rgba(0x00ff00), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(hex_to_rgba(0xffffff), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_builder_clamps() {
        let m = Material::new("m", [1.0; 4], 2.0, -1.0).with_emission(1.0, 1.0, 1.0, -3.0);
        assert_eq!(m.metallic, 1.0);
        assert_eq!(m.roughness, 0.0);
        assert_eq!(m.emissive_intensity, 0.0);
    }
}
