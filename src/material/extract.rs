//! Material channel extraction from a shader node graph.
//!
//! Only the first node of each recognized kind contributes. A principled
//! node overrides albedo, specular and (when active) emissive values set by
//! earlier nodes and always supplies the PBR extension.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::util::Vec4;

use super::channels::{ColorChannel, Material, NormalMapChannel, PbrSettings, SpecularChannel};
use super::graph::{ColorInput, ShaderGraph, ShaderNode, ShaderNodeKind};

/// Normal-map strength is divided by this factor to obtain the channel intensity.
pub const NORMAL_MAP_STRENGTH_SCALE: f32 = 10.0;

/// Result of extracting one material.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedMaterial {
    pub material: Material,
    /// Absolute paths of all textures the material touched.
    pub textures: BTreeSet<PathBuf>,
    /// True when no albedo source was found and [`Material::fallback`] was used.
    pub is_fallback: bool,
}

/// Resolve a host texture path into `(absolute_path, basename)`.
///
/// A leading `//` marks a path relative to `base_dir` (the host document's directory).
pub fn resolve_texture_path(path: &str, base_dir: Option<&Path>) -> (PathBuf, String) {
    let relative = path.strip_prefix("//").unwrap_or(path);
    let full = match base_dir {
        Some(dir) => dir.join(relative),
        None => PathBuf::from(relative),
    };
    let basename = full
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (full, basename)
}

/// Specular shininess derived from roughness.
#[inline]
pub fn shininess_from_roughness(roughness: f32) -> f32 {
    (1.0 - roughness) * 200.0
}

/// Specular intensity derived from roughness.
#[inline]
pub fn intensity_from_roughness(roughness: f32) -> f32 {
    1.0 - (roughness + 0.2)
}

/// Walks a [`ShaderGraph`] and produces a flat [`Material`].
pub struct MaterialExtractor<'a> {
    base_dir: Option<&'a Path>,
    textures: BTreeSet<PathBuf>,
}

impl<'a> MaterialExtractor<'a> {
    /// Create an extractor resolving relative texture paths against `base_dir`.
    pub fn new(base_dir: Option<&'a Path>) -> Self {
        Self { base_dir, textures: BTreeSet::new() }
    }

    /// Record the linked texture of `input` and return its basename.
    fn texture_of(&mut self, input: &ColorInput) -> Option<String> {
        let link = input.link.as_ref()?;
        let (full, basename) = resolve_texture_path(&link.path, self.base_dir);
        self.textures.insert(full);
        Some(basename)
    }

    /// Extract channels from `graph`.
    pub fn extract(mut self, graph: &ShaderGraph) -> ExtractedMaterial {
        let mut albedo: Option<ColorChannel> = None;
        let mut specular: Option<SpecularChannel> = None;
        let mut emissive: Option<ColorChannel> = None;
        let mut normal_map: Option<NormalMapChannel> = None;
        let mut pbr: Option<PbrSettings> = None;

        // Mix nodes may be visited before or after the glossy node.
        let mut mix_intensity: Option<f32> = None;
        let mut has_principled = false;

        for node in &graph.nodes {
            match node {
                ShaderNode::Diffuse { color } if albedo.is_none() => {
                    let texture = self.texture_of(color);
                    albedo = Some(ColorChannel { color: Some(color.value), texture, mix: 1.0 });
                }
                ShaderNode::Glossy { color, roughness } if specular.is_none() => {
                    let texture = self.texture_of(color);
                    specular = Some(SpecularChannel {
                        color: Some(color.value),
                        texture,
                        mix: 1.0,
                        shininess: shininess_from_roughness(*roughness),
                        intensity: mix_intensity.unwrap_or_else(|| intensity_from_roughness(*roughness)),
                    });
                }
                ShaderNode::Emission { color } if emissive.is_none() => {
                    let texture = self.texture_of(color);
                    emissive = Some(ColorChannel { color: Some(color.value), texture, mix: 1.0 });
                }
                ShaderNode::Mix { factor, first_input } if mix_intensity.is_none() => {
                    let intensity = match first_input {
                        Some(ShaderNodeKind::Glossy) => 1.0 - factor,
                        Some(ShaderNodeKind::Diffuse) => *factor,
                        _ => 1.0,
                    };
                    mix_intensity = Some(intensity);
                    if let Some(spec) = specular.as_mut() {
                        spec.intensity = intensity;
                    }
                }
                ShaderNode::NormalMap { strength, color } if normal_map.is_none() => {
                    let texture = self.texture_of(color);
                    normal_map = Some(NormalMapChannel {
                        texture,
                        intensity: strength / NORMAL_MAP_STRENGTH_SCALE,
                    });
                }
                ShaderNode::Principled(p) if !has_principled => {
                    has_principled = true;

                    let texture = self.texture_of(&p.base_color);
                    albedo = Some(ColorChannel { color: Some(p.base_color.value), texture, mix: 1.0 });

                    // Keeps a texture picked up from an earlier glossy node.
                    let spec_texture = specular.as_ref().and_then(|s| s.texture.clone());
                    specular = Some(SpecularChannel {
                        color: Some(p.subsurface_color),
                        texture: spec_texture,
                        mix: 1.0,
                        shininess: shininess_from_roughness(p.roughness),
                        intensity: intensity_from_roughness(p.roughness),
                    });

                    if p.emission.link.is_some() || emits(p.emission.value) {
                        let texture = self.texture_of(&p.emission);
                        emissive = Some(ColorChannel { color: Some(p.emission.value), texture, mix: 1.0 });
                    }

                    pbr = Some(PbrSettings::new(p.roughness, p.specular, p.metallic));
                }
                other => tracing::trace!("skipping {:?} node", other.kind()),
            }
        }

        if albedo.is_none() {
            return ExtractedMaterial {
                material: Material::fallback(),
                textures: self.textures,
                is_fallback: true,
            };
        }

        ExtractedMaterial {
            material: Material { albedo, specular, emissive, normal_map, pbr },
            textures: self.textures,
            is_fallback: false,
        }
    }
}

/// Extract a material from `graph`.
pub fn extract_material(graph: &ShaderGraph, base_dir: Option<&Path>) -> ExtractedMaterial {
    MaterialExtractor::new(base_dir).extract(graph)
}

fn emits(color: Vec4) -> bool {
    color.x > 0.0 || color.y > 0.0 || color.z > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::graph::PrincipledBsdf;

    fn red() -> Vec4 {
        Vec4::new(1.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_unrecognized_graph_yields_fallback() {
        let graph = ShaderGraph::new(vec![
            ShaderNode::Other("TEX_COORD".into()),
            ShaderNode::Other("OUTPUT_MATERIAL".into()),
        ]);
        let out = extract_material(&graph, None);
        assert!(out.is_fallback);
        assert_eq!(out.material, Material::fallback());
        assert!(out.textures.is_empty());
    }

    #[test]
    fn test_repeated_kind_keeps_first() {
        let graph = ShaderGraph::default()
            .with_node(ShaderNode::Diffuse { color: ColorInput::value(red()) })
            .with_node(ShaderNode::Diffuse { color: ColorInput::value(Vec4::ONE) });
        assert!(graph.nodes.iter().all(|n| n.kind() == ShaderNodeKind::Diffuse));
        let out = extract_material(&graph, None);
        assert_eq!(out.material.albedo.and_then(|a| a.color), Some(red()));
    }

    #[test]
    fn test_glossy_without_albedo_still_falls_back() {
        let graph = ShaderGraph::new(vec![ShaderNode::Glossy {
            color: ColorInput::value(Vec4::ONE),
            roughness: 0.3,
        }]);
        let out = extract_material(&graph, None);
        assert!(out.is_fallback);
    }

    #[test]
    fn test_diffuse_and_glossy() {
        let graph = ShaderGraph::new(vec![
            ShaderNode::Diffuse { color: ColorInput::value(red()) },
            ShaderNode::Glossy { color: ColorInput::value(Vec4::ONE), roughness: 0.25 },
        ]);
        let m = extract_material(&graph, None).material;
        let albedo = m.albedo.unwrap();
        assert_eq!(albedo.color, Some(red()));
        assert_eq!(albedo.mix, 1.0);
        let spec = m.specular.unwrap();
        assert_eq!(spec.shininess, (1.0 - 0.25) * 200.0);
        assert_eq!(spec.intensity, 1.0 - (0.25 + 0.2));
        assert!(m.pbr.is_none());
    }

    #[test]
    fn test_only_first_node_of_kind_is_used() {
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
        let graph = ShaderGraph::new(vec![
            ShaderNode::Diffuse { color: ColorInput::value(red()) },
            ShaderNode::Diffuse { color: ColorInput::value(blue) },
        ]);
        let m = extract_material(&graph, None).material;
        assert_eq!(m.albedo.unwrap().color, Some(red()));
    }

    #[test]
    fn test_mix_overrides_glossy_intensity_in_any_order() {
        let glossy = ShaderNode::Glossy { color: ColorInput::value(Vec4::ONE), roughness: 0.1 };
        let diffuse = ShaderNode::Diffuse { color: ColorInput::value(red()) };
        let mix = ShaderNode::Mix { factor: 0.3, first_input: Some(ShaderNodeKind::Glossy) };

        let before = ShaderGraph::new(vec![mix.clone(), diffuse.clone(), glossy.clone()]);
        let after = ShaderGraph::new(vec![diffuse, glossy, mix]);

        for graph in [before, after] {
            let spec = extract_material(&graph, None).material.specular.unwrap();
            assert!((spec.intensity - 0.7).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mix_input_kinds() {
        let base = |first_input| {
            ShaderGraph::new(vec![
                ShaderNode::Diffuse { color: ColorInput::value(red()) },
                ShaderNode::Glossy { color: ColorInput::value(Vec4::ONE), roughness: 0.1 },
                ShaderNode::Mix { factor: 0.3, first_input },
            ])
        };
        let intensity = |g: &ShaderGraph| extract_material(g, None).material.specular.unwrap().intensity;
        assert!((intensity(&base(Some(ShaderNodeKind::Diffuse))) - 0.3).abs() < 1e-6);
        assert_eq!(intensity(&base(Some(ShaderNodeKind::Emission))), 1.0);
        assert_eq!(intensity(&base(None)), 1.0);
    }

    #[test]
    fn test_normal_map_strength_is_scaled_down_by_ten() {
        // The streaming writer divides strength by 10; an older export path
        // stored the raw strength. The scaled variant is the one emitted here.
        let graph = ShaderGraph::new(vec![
            ShaderNode::Diffuse { color: ColorInput::value(red()) },
            ShaderNode::NormalMap {
                strength: 5.0,
                color: ColorInput::textured(Vec4::ONE, "//tex/normal.png"),
            },
        ]);
        let out = extract_material(&graph, Some(Path::new("/scenes")));
        let nm = out.material.normal_map.unwrap();
        assert_eq!(nm.intensity, 0.5);
        assert_ne!(nm.intensity, 5.0);
        assert_eq!(nm.texture.as_deref(), Some("normal.png"));
        assert!(out.textures.contains(Path::new("/scenes/tex/normal.png")));
    }

    #[test]
    fn test_principled_overrides_and_sets_pbr() {
        let principled = PrincipledBsdf {
            base_color: ColorInput::textured(red(), "//albedo.png"),
            subsurface_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            metallic: 0.9,
            specular: 0.4,
            roughness: 0.3,
            emission: ColorInput::value(Vec4::new(0.0, 0.2, 0.0, 1.0)),
        };
        let graph = ShaderGraph::new(vec![
            ShaderNode::Diffuse { color: ColorInput::value(Vec4::ONE) },
            ShaderNode::Principled(principled),
        ]);
        let out = extract_material(&graph, Some(Path::new("/scenes")));
        assert!(!out.is_fallback);
        let m = out.material;

        let albedo = m.albedo.unwrap();
        assert_eq!(albedo.color, Some(red()));
        assert_eq!(albedo.texture.as_deref(), Some("albedo.png"));

        let spec = m.specular.unwrap();
        assert_eq!(spec.color, Some(Vec4::new(0.5, 0.5, 0.5, 1.0)));
        assert!((spec.shininess - 140.0).abs() < 1e-4);
        assert!((spec.intensity - 0.5).abs() < 1e-6);

        assert_eq!(m.emissive.unwrap().color, Some(Vec4::new(0.0, 0.2, 0.0, 1.0)));
        assert_eq!(m.pbr, Some(PbrSettings::new(0.3, 0.4, 0.9)));
        assert!(out.textures.contains(Path::new("/scenes/albedo.png")));
    }

    #[test]
    fn test_principled_black_emission_is_ignored() {
        let graph = ShaderGraph::new(vec![ShaderNode::Principled(PrincipledBsdf::default())]);
        let m = extract_material(&graph, None).material;
        assert!(m.emissive.is_none());
        assert!(m.pbr.is_some());
    }

    #[test]
    fn test_resolve_texture_path() {
        let (full, base) = resolve_texture_path("//wood.jpg", Some(Path::new("/proj")));
        assert_eq!(full, PathBuf::from("/proj/wood.jpg"));
        assert_eq!(base, "wood.jpg");

        let (full, base) = resolve_texture_path("/abs/stone.png", Some(Path::new("/proj")));
        assert_eq!(full, PathBuf::from("/abs/stone.png"));
        assert_eq!(base, "stone.png");

        let (full, _) = resolve_texture_path("rel/a.png", None);
        assert_eq!(full, PathBuf::from("rel/a.png"));
    }
}
