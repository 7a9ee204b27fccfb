use crate::driver::MaterialDesc;

use super::ColorValue;

/// Surface reflectance parameters.
///
/// A plain value: it owns no driver resource. `Device::set_material` copies it
/// into the device's single material object.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Material {
    /// Diffuse reflectance; the only channel whose alpha is used.
    pub diffuse: ColorValue,
    pub ambient: ColorValue,
    pub specular: ColorValue,
    pub emissive: ColorValue,
    /// Specular exponent.
    pub power: f32,
}

impl Material {
    /// White diffuse/specular material with the given specular power.
    pub fn diffuse_white(power: f32) -> Self {
        Self {
            diffuse: ColorValue::new(1.0, 1.0, 1.0, 1.0),
            ambient: ColorValue::default(),
            specular: ColorValue::rgb(1.0, 1.0, 1.0),
            emissive: ColorValue::default(),
            power,
        }
    }

    /// Driver descriptor. Alpha is dropped from every channel except diffuse.
    pub fn to_desc(&self) -> MaterialDesc {
        let rgb = |c: ColorValue| ColorValue::rgb(c.r, c.g, c.b);
        MaterialDesc {
            diffuse: self.diffuse,
            ambient: rgb(self.ambient),
            specular: rgb(self.specular),
            emissive: rgb(self.emissive),
            power: self.power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_keeps_only_diffuse_alpha() {
        let m = Material {
            diffuse: ColorValue::new(0.1, 0.2, 0.3, 0.4),
            ambient: ColorValue::new(0.5, 0.5, 0.5, 0.9),
            specular: ColorValue::new(1.0, 1.0, 1.0, 1.0),
            emissive: ColorValue::new(0.0, 0.1, 0.0, 1.0),
            power: 50.0,
        };
        let d = m.to_desc();
        assert_eq!(d.diffuse.a, 0.4);
        assert_eq!(d.ambient.a, 0.0);
        assert_eq!(d.specular.a, 0.0);
        assert_eq!(d.emissive, ColorValue::rgb(0.0, 0.1, 0.0));
        assert_eq!(d.power, 50.0);
    }
}
