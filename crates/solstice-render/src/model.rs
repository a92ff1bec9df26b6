//! Scene models loaded from Wavefront OBJ/MTL files.
//!
//! The frame pipeline only sees the [`SceneModel`] capability: draw yourself,
//! expose your diffuse textures, accept a sampler override. [`ObjModel`] is
//! the one implementation; world, water, vehicle and both skyboxes are
//! instances of it.

use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};

use crate::buffer::{BufferAllocator, MeshBuffer, VertexPositionNormalUv};
use crate::texture::{self, GpuTexture, TextureError};

/// Errors from loading a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The OBJ file is missing or malformed.
    #[error("failed to load model {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// The OBJ file parsed but contains no triangles.
    #[error("model {path} contains no geometry")]
    Empty { path: PathBuf },

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Bind group slot for material data when a program asks for it.
pub const MATERIAL_GROUP: u32 = 2;

/// Draw and texture capabilities of a loaded model.
pub trait SceneModel {
    /// Name used in logs and GPU labels.
    fn label(&self) -> &str;

    /// Record draws for every mesh into `pass`.
    ///
    /// With `Some(group)` each mesh binds its material at that group index;
    /// depth-only programs pass `None`.
    fn render(&self, pass: &mut wgpu::RenderPass<'_>, material_group: Option<u32>);

    /// Number of materials declared by the model.
    fn material_count(&self) -> usize;

    /// Diffuse texture of material `index`, if it has one.
    fn diffuse_texture(&self, index: usize) -> Option<&wgpu::Texture>;

    /// Rebuild every material binding to sample through `sampler`.
    fn set_diffuse_sampler(&mut self, device: &wgpu::Device, sampler: &wgpu::Sampler);
}

/// Materials of `model` that carry a diffuse texture.
pub fn textured_material_count(model: &dyn SceneModel) -> usize {
    (0..model.material_count())
        .filter(|&index| model.diffuse_texture(index).is_some())
        .count()
}

/// Per-material constants.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// Diffuse color, alpha from the MTL dissolve value.
    pub diffuse_color: [f32; 4],
}

/// CPU-side material description read from the MTL file.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub diffuse_color: [f32; 4],
    /// Absolute path of the diffuse map.
    pub diffuse_texture: Option<PathBuf>,
}

/// CPU-side mesh: interleaved vertices, triangle indices and material slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<VertexPositionNormalUv>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

/// Parsed contents of an OBJ file and its material library.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

/// Parse an OBJ file into interleaved meshes.
///
/// A missing or broken material library is not fatal: meshes fall back to
/// the default white material.
pub fn read_obj(path: &Path) -> Result<ObjData, ModelError> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    };
    let (models, materials) =
        tobj::load_obj(path, &options).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let materials = match materials {
        Ok(materials) => materials
            .into_iter()
            .map(|material| material_data(material, base_dir))
            .collect(),
        Err(err) => {
            log::warn!("No materials for {}: {err}", path.display());
            Vec::new()
        }
    };

    let meshes: Vec<MeshData> = models
        .into_iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| MeshData {
            vertices: interleave(&model.mesh),
            indices: model.mesh.indices,
            material: model.mesh.material_id.filter(|&id| id < materials.len()),
            name: model.name,
        })
        .collect();

    if meshes.is_empty() {
        return Err(ModelError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(ObjData { meshes, materials })
}

fn material_data(material: tobj::Material, base_dir: &Path) -> MaterialData {
    let [r, g, b] = material.diffuse.unwrap_or([1.0; 3]);
    let alpha = material.dissolve.unwrap_or(1.0);
    MaterialData {
        name: material.name,
        diffuse_color: [r, g, b, alpha],
        diffuse_texture: material
            .diffuse_texture
            .filter(|name| !name.trim().is_empty())
            .map(|name| base_dir.join(name.trim())),
    }
}

/// Interleave a single-index tobj mesh. Missing normals default to +Y and
/// missing texture coordinates to zero; V is flipped to top-left origin.
fn interleave(mesh: &tobj::Mesh) -> Vec<VertexPositionNormalUv> {
    let vertex_count = mesh.positions.len() / 3;
    (0..vertex_count)
        .map(|i| {
            let position = [
                mesh.positions[3 * i],
                mesh.positions[3 * i + 1],
                mesh.positions[3 * i + 2],
            ];
            let normal = if mesh.normals.len() >= 3 * (i + 1) {
                [
                    mesh.normals[3 * i],
                    mesh.normals[3 * i + 1],
                    mesh.normals[3 * i + 2],
                ]
            } else {
                [0.0, 1.0, 0.0]
            };
            let uv = if mesh.texcoords.len() >= 2 * (i + 1) {
                [mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1]]
            } else {
                [0.0, 0.0]
            };
            VertexPositionNormalUv {
                position,
                normal,
                uv,
            }
        })
        .collect()
}

/// Shared GPU resources materials are built from.
pub struct MaterialResources<'a> {
    pub layout: &'a wgpu::BindGroupLayout,
    pub sampler: &'a wgpu::Sampler,
    /// Bound where a material has no diffuse map.
    pub fallback: &'a GpuTexture,
}

struct GpuMaterial {
    texture: Option<GpuTexture>,
    view: wgpu::TextureView,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct GpuMesh {
    buffer: MeshBuffer,
    /// Index into `materials`, where the last entry is the default material.
    material: usize,
}

/// A model loaded from an OBJ file and uploaded to the GPU.
pub struct ObjModel {
    label: String,
    meshes: Vec<GpuMesh>,
    materials: Vec<GpuMaterial>,
    layout: wgpu::BindGroupLayout,
}

impl ObjModel {
    /// Load an OBJ file, its materials and their diffuse textures.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        resources: &MaterialResources<'_>,
    ) -> Result<Self, ModelError> {
        let data = read_obj(path)?;
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let model = Self::upload(device, queue, &label, &data, resources)?;
        log::info!(
            "Loaded model '{}' ({} meshes, {} materials)",
            model.label,
            model.meshes.len(),
            model.material_count()
        );
        Ok(model)
    }

    /// Upload parsed OBJ data.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &ObjData,
        resources: &MaterialResources<'_>,
    ) -> Result<Self, ModelError> {
        let default_material = MaterialData {
            name: "default".to_string(),
            diffuse_color: [1.0; 4],
            diffuse_texture: None,
        };

        let mut materials = Vec::with_capacity(data.materials.len() + 1);
        for material in data.materials.iter().chain(std::iter::once(&default_material)) {
            let texture = material
                .diffuse_texture
                .as_deref()
                .map(|path| texture::load_texture(device, queue, path))
                .transpose()?;
            let view = texture
                .as_ref()
                .map_or_else(|| resources.fallback.view.clone(), |t| t.view.clone());
            let uniforms = BufferAllocator::new(device).create_uniform_buffer(
                &format!("{label}-{}-material", material.name),
                &MaterialUniforms {
                    diffuse_color: material.diffuse_color,
                },
            );
            let bind_group =
                material_bind_group(device, resources.layout, &uniforms, &view, resources.sampler);
            materials.push(GpuMaterial {
                texture,
                view,
                uniforms,
                bind_group,
            });
        }

        let default_index = materials.len() - 1;
        let allocator = BufferAllocator::new(device);
        let meshes = data
            .meshes
            .iter()
            .map(|mesh| GpuMesh {
                buffer: allocator.create_mesh(
                    &format!("{label}-{}", mesh.name),
                    &mesh.vertices,
                    &mesh.indices,
                ),
                material: mesh.material.unwrap_or(default_index),
            })
            .collect();

        Ok(Self {
            label: label.to_string(),
            meshes,
            materials,
            layout: resources.layout.clone(),
        })
    }
}

impl SceneModel for ObjModel {
    fn label(&self) -> &str {
        &self.label
    }

    fn render(&self, pass: &mut wgpu::RenderPass<'_>, material_group: Option<u32>) {
        for mesh in &self.meshes {
            if let Some(group) = material_group {
                pass.set_bind_group(group, &self.materials[mesh.material].bind_group, &[]);
            }
            mesh.buffer.bind(pass);
            mesh.buffer.draw(pass);
        }
    }

    fn material_count(&self) -> usize {
        // The trailing default material is not declared by the file.
        self.materials.len() - 1
    }

    fn diffuse_texture(&self, index: usize) -> Option<&wgpu::Texture> {
        if index >= self.material_count() {
            return None;
        }
        self.materials[index].texture.as_ref().map(|t| &t.texture)
    }

    fn set_diffuse_sampler(&mut self, device: &wgpu::Device, sampler: &wgpu::Sampler) {
        for material in &mut self.materials {
            material.bind_group = material_bind_group(
                device,
                &self.layout,
                &material.uniforms,
                &material.view,
                sampler,
            );
        }
    }
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material-bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
