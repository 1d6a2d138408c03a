//! Flat material channel record.
//!
//! A [`Material`] is the encoded form of a host material: every channel is
//! optional, and the PBR extension is present only when at least one of its
//! values was supplied.

use crate::util::Vec4;

/// Default value for PBR fields that were not supplied.
pub const PBR_DEFAULT: f32 = 0.2;

/// Color channel shared by albedo and emissive.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorChannel {
    /// RGBA color.
    pub color: Option<Vec4>,
    /// Texture file name (basename).
    pub texture: Option<String>,
    /// Blend factor between color and texture.
    pub mix: f32,
}

impl ColorChannel {
    /// Create a channel.
    pub fn new(color: Option<Vec4>, texture: Option<&str>, mix: f32) -> Self {
        Self { color, texture: texture.map(str::to_string), mix }
    }

    /// Plain color channel with `mix = 1`.
    pub fn color(color: Vec4) -> Self {
        Self::new(Some(color), None, 1.0)
    }
}

impl Default for ColorChannel {
    fn default() -> Self {
        Self { color: None, texture: None, mix: 1.0 }
    }
}

/// Specular channel.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecularChannel {
    pub color: Option<Vec4>,
    pub texture: Option<String>,
    pub mix: f32,
    pub shininess: f32,
    pub intensity: f32,
}

impl SpecularChannel {
    /// Create a channel.
    pub fn new(
        color: Option<Vec4>,
        texture: Option<&str>,
        mix: f32,
        shininess: f32,
        intensity: f32,
    ) -> Self {
        Self {
            color,
            texture: texture.map(str::to_string),
            mix,
            shininess,
            intensity,
        }
    }
}

impl Default for SpecularChannel {
    fn default() -> Self {
        Self { color: None, texture: None, mix: 1.0, shininess: 1.0, intensity: 1.0 }
    }
}

/// Normal map channel.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalMapChannel {
    pub texture: Option<String>,
    pub intensity: f32,
}

impl NormalMapChannel {
    /// Create a channel.
    pub fn new(texture: Option<&str>, intensity: f32) -> Self {
        Self { texture: texture.map(str::to_string), intensity }
    }
}

impl Default for NormalMapChannel {
    fn default() -> Self {
        Self { texture: None, intensity: 1.0 }
    }
}

/// PBR extension settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PbrSettings {
    pub roughness: f32,
    pub fresnel_reflectance: f32,
    pub diffuse_fraction: f32,
}

impl PbrSettings {
    /// Create settings.
    pub fn new(roughness: f32, fresnel_reflectance: f32, diffuse_fraction: f32) -> Self {
        Self { roughness, fresnel_reflectance, diffuse_fraction }
    }

    /// Build settings from optional parts.
    ///
    /// Returns `None` when no part was supplied; missing parts fall back to [`PBR_DEFAULT`].
    pub fn from_parts(
        roughness: Option<f32>,
        fresnel_reflectance: Option<f32>,
        diffuse_fraction: Option<f32>,
    ) -> Option<Self> {
        if roughness.is_none() && fresnel_reflectance.is_none() && diffuse_fraction.is_none() {
            return None;
        }
        Some(Self {
            roughness: roughness.unwrap_or(PBR_DEFAULT),
            fresnel_reflectance: fresnel_reflectance.unwrap_or(PBR_DEFAULT),
            diffuse_fraction: diffuse_fraction.unwrap_or(PBR_DEFAULT),
        })
    }
}

/// Material component payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub albedo: Option<ColorChannel>,
    pub specular: Option<SpecularChannel>,
    pub emissive: Option<ColorChannel>,
    pub normal_map: Option<NormalMapChannel>,
    pub pbr: Option<PbrSettings>,
}

impl Material {
    /// Create an empty material.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback material used when a host material yields no albedo.
    pub fn fallback() -> Self {
        Self {
            albedo: Some(ColorChannel::new(Some(Vec4::new(0.7, 0.7, 0.7, 1.0)), None, 1.0)),
            specular: Some(SpecularChannel::new(Some(Vec4::ONE), None, 1.0, 0.3, 0.2)),
            ..Self::default()
        }
    }

    /// Set the albedo channel.
    pub fn with_albedo(mut self, channel: ColorChannel) -> Self {
        self.albedo = Some(channel);
        self
    }

    /// Set the specular channel.
    pub fn with_specular(mut self, channel: SpecularChannel) -> Self {
        self.specular = Some(channel);
        self
    }

    /// Set the emissive channel.
    pub fn with_emissive(mut self, channel: ColorChannel) -> Self {
        self.emissive = Some(channel);
        self
    }

    /// Set the normal map channel.
    pub fn with_normal_map(mut self, channel: NormalMapChannel) -> Self {
        self.normal_map = Some(channel);
        self
    }

    /// Set the PBR extension.
    pub fn with_pbr(mut self, pbr: PbrSettings) -> Self {
        self.pbr = Some(pbr);
        self
    }

    /// Texture names referenced by any channel.
    pub fn textures(&self) -> impl Iterator<Item = &str> {
        [
            self.albedo.as_ref().and_then(|c| c.texture.as_deref()),
            self.specular.as_ref().and_then(|c| c.texture.as_deref()),
            self.emissive.as_ref().and_then(|c| c.texture.as_deref()),
            self.normal_map.as_ref().and_then(|c| c.texture.as_deref()),
        ]
        .into_iter()
        .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbr_present_only_when_supplied() {
        assert_eq!(PbrSettings::from_parts(None, None, None), None);

        let pbr = PbrSettings::from_parts(Some(0.42), None, None).unwrap();
        assert_eq!(pbr.roughness, 0.42);
        assert_eq!(pbr.fresnel_reflectance, PBR_DEFAULT);
        assert_eq!(pbr.diffuse_fraction, PBR_DEFAULT);
    }

    #[test]
    fn test_fallback_values() {
        let m = Material::fallback();
        let albedo = m.albedo.unwrap();
        assert_eq!(albedo.color, Some(Vec4::new(0.7, 0.7, 0.7, 1.0)));
        assert_eq!(albedo.mix, 1.0);
        let spec = m.specular.unwrap();
        assert_eq!(spec.color, Some(Vec4::ONE));
        assert_eq!(spec.shininess, 0.3);
        assert_eq!(spec.intensity, 0.2);
        assert!(m.emissive.is_none());
        assert!(m.normal_map.is_none());
        assert!(m.pbr.is_none());
    }

    #[test]
    fn test_textures() {
        let m = Material::new()
            .with_albedo(ColorChannel::new(None, Some("diffuse.png"), 0.5))
            .with_normal_map(NormalMapChannel::new(Some("normal.png"), 0.9));
        let tex: Vec<&str> = m.textures().collect();
        assert_eq!(tex, vec!["diffuse.png", "normal.png"]);
    }
}
