//! Main scene pass: lit, shadowed geometry and the blended day/night skies.
//!
//! Objects are drawn in a fixed order: water, the shadow casters, the night
//! sky and finally the day sky faded in by the day alpha. Each object owns a
//! small uniform block (model matrix, reflectiveness, alpha, lit flag); the
//! camera, light and shadow lookups are shared in group 0.

use std::borrow::Cow;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::buffer::{BufferAllocator, VertexPositionNormalUv};
use crate::framebuffer::{
    COLOR_FORMAT, DEPTH_CLEAR_VALUE, DEPTH_COMPARE, DEPTH_FORMAT, FramebufferTarget,
};
use crate::model::{MATERIAL_GROUP, SceneModel, textured_material_count};
use crate::pass::RenderPassBuilder;
use crate::shader::{ProgramSource, ShaderProgram};
use crate::shadow::ShadowMap;
use crate::texture::GpuTexture;

/// Height of the water plane.
pub const WATER_LEVEL: f32 = -6.0;

/// Reflectiveness of the vehicle's paint.
pub const VEHICLE_REFLECTIVENESS: f32 = 0.5;

/// WGSL source for the scene program.
pub const SCENE_SHADER_SOURCE: &str = r#"
struct SceneUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    light_matrix: mat4x4<f32>,
    light_position: vec4<f32>,
    camera_position: vec4<f32>,
};

struct ObjectUniforms {
    model: mat4x4<f32>,
    reflectiveness: f32,
    alpha: f32,
    lit: f32,
    _pad: f32,
};

struct MaterialUniforms {
    diffuse_color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> scene: SceneUniforms;
@group(0) @binding(1) var shadow_map: texture_depth_2d;
@group(0) @binding(2) var shadow_sampler: sampler_comparison;
@group(0) @binding(3) var environment: texture_cube<f32>;
@group(0) @binding(4) var environment_sampler: sampler;

@group(1) @binding(0) var<uniform> object: ObjectUniforms;

@group(2) @binding(0) var<uniform> material: MaterialUniforms;
@group(2) @binding(1) var diffuse_texture: texture_2d<f32>;
@group(2) @binding(2) var diffuse_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) shadow_coord: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VertexOutput {
    let world = object.model * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    out.clip_position = scene.projection * scene.view * world;
    out.world_position = world.xyz;
    out.normal = (object.model * vec4<f32>(normal, 0.0)).xyz;
    out.uv = uv;
    out.shadow_coord = scene.light_matrix * world;
    return out;
}

// 1.0 when lit, 0.0 when occluded. Points outside the light frustum are lit.
fn shadow_visibility(coord: vec4<f32>) -> f32 {
    let projected = coord.xyz / coord.w;
    let visibility = textureSampleCompareLevel(shadow_map, shadow_sampler, projected.xy, projected.z);
    let outside = coord.w <= 0.0
        || any(projected.xy < vec2<f32>(0.0))
        || any(projected.xy > vec2<f32>(1.0))
        || projected.z > 1.0;
    return select(visibility, 1.0, outside);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(diffuse_texture, diffuse_sampler, in.uv) * material.diffuse_color;

    let n = normalize(in.normal);
    let to_light = normalize(scene.light_position.xyz - in.world_position);
    let diffuse = max(dot(n, to_light), 0.0);
    let lit_color = base.rgb * (0.25 + 0.75 * diffuse * shadow_visibility(in.shadow_coord));

    let view_dir = normalize(in.world_position - scene.camera_position.xyz);
    let reflected = textureSample(environment, environment_sampler, reflect(view_dir, n)).rgb;
    let shaded = mix(lit_color, reflected, object.reflectiveness);

    let color = select(shaded, base.rgb, object.lit < 0.5);
    return vec4<f32>(color, base.a * object.alpha);
}
"#;

pub fn program_source() -> ProgramSource {
    ProgramSource {
        name: "scene",
        source: Cow::Borrowed(SCENE_SHADER_SOURCE),
        vertex_entry: "vs_main",
        fragment_entry: Some("fs_main"),
    }
}

/// Camera and light state shared by every scene draw.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Bias · light projection · light view.
    pub light_matrix: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub camera_position: [f32; 4],
}

impl SceneUniforms {
    pub fn new(
        view: Mat4,
        projection: Mat4,
        light_matrix: Mat4,
        light_position: Vec3,
        camera_position: Vec3,
    ) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            light_matrix: light_matrix.to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
            camera_position: camera_position.extend(1.0).to_array(),
        }
    }
}

/// Per-object constants, also read by the shadow program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub reflectiveness: f32,
    pub alpha: f32,
    /// 1.0 for shaded objects, 0.0 for skies.
    pub lit: f32,
    pub _pad: f32,
}

/// The objects the scene pass draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectSlot {
    Water,
    World,
    Vehicle,
    NightSky,
    DaySky,
}

/// Draw order of the scene pass.
pub const SCENE_DRAW_ORDER: [ObjectSlot; 5] = [
    ObjectSlot::Water,
    ObjectSlot::World,
    ObjectSlot::Vehicle,
    ObjectSlot::NightSky,
    ObjectSlot::DaySky,
];

/// Objects rendered into the shadow map.
pub const SHADOW_CASTERS: [ObjectSlot; 2] = [ObjectSlot::World, ObjectSlot::Vehicle];

impl ObjectSlot {
    pub fn is_sky(self) -> bool {
        matches!(self, Self::NightSky | Self::DaySky)
    }

    fn index(self) -> usize {
        match self {
            Self::Water => 0,
            Self::World => 1,
            Self::Vehicle => 2,
            Self::NightSky => 3,
            Self::DaySky => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::World => "world",
            Self::Vehicle => "vehicle",
            Self::NightSky => "night-sky",
            Self::DaySky => "day-sky",
        }
    }
}

/// Uniform values of `slot` for a frame with the given day alpha.
pub fn object_uniforms(slot: ObjectSlot, day_alpha: f32) -> ObjectUniforms {
    let model = match slot {
        ObjectSlot::Water => Mat4::from_translation(Vec3::new(0.0, WATER_LEVEL, 0.0)),
        _ => Mat4::IDENTITY,
    };
    let reflectiveness = match slot {
        ObjectSlot::Vehicle => VEHICLE_REFLECTIVENESS,
        _ => 0.0,
    };
    let alpha = match slot {
        ObjectSlot::DaySky => day_alpha.clamp(0.0, 1.0),
        _ => 1.0,
    };
    ObjectUniforms {
        model: model.to_cols_array_2d(),
        reflectiveness,
        alpha,
        lit: if slot.is_sky() { 0.0 } else { 1.0 },
        _pad: 0.0,
    }
}

/// Layout of the per-object uniform group, shared with the shadow pipeline.
pub fn create_object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("object-bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<ObjectUniforms>() as u64),
            },
            count: None,
        }],
    })
}

/// Layout of a model material: diffuse color, diffuse map and its sampler.
pub fn create_material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("material-bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(16),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_globals_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene-globals-bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<SceneUniforms>() as u64),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::Cube,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

struct ObjectBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Pipelines and uniforms of the scene pass.
pub struct ScenePass {
    opaque_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    objects: Vec<ObjectBinding>,
}

impl ScenePass {
    pub fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        shadow_map: &ShadowMap,
        environment: &GpuTexture,
        environment_sampler: &wgpu::Sampler,
        object_layout: &wgpu::BindGroupLayout,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let globals_layout = create_globals_bind_group_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&globals_layout, object_layout, material_layout],
            immediate_size: 0,
        });

        let opaque_pipeline = create_scene_pipeline(
            device,
            program,
            &pipeline_layout,
            "scene-opaque-pipeline",
            true,
            wgpu::BlendState::REPLACE,
        );
        let sky_pipeline = create_scene_pipeline(
            device,
            program,
            &pipeline_layout,
            "scene-sky-pipeline",
            false,
            wgpu::BlendState::ALPHA_BLENDING,
        );

        let allocator = BufferAllocator::new(device);
        let globals_buffer = allocator.create_uniform_buffer(
            "scene-globals",
            &SceneUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, Vec3::ZERO),
        );
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-globals-bg"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow_map.comparison_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(environment_sampler),
                },
            ],
        });

        let objects = SCENE_DRAW_ORDER
            .iter()
            .map(|&slot| {
                let buffer = allocator.create_uniform_buffer(
                    &format!("{}-object-uniforms", slot.label()),
                    &object_uniforms(slot, 1.0),
                );
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(slot.label()),
                    layout: object_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                ObjectBinding { buffer, bind_group }
            })
            .collect();

        Self {
            opaque_pipeline,
            sky_pipeline,
            globals_buffer,
            globals_bind_group,
            objects,
        }
    }

    /// Upload this frame's shared and per-object uniforms.
    pub fn update(&self, queue: &wgpu::Queue, globals: &SceneUniforms, day_alpha: f32) {
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(globals));
        for slot in SCENE_DRAW_ORDER {
            let uniforms = object_uniforms(slot, day_alpha);
            queue.write_buffer(
                &self.objects[slot.index()].buffer,
                0,
                bytemuck::bytes_of(&uniforms),
            );
        }
    }

    /// Per-object bind group of `slot`.
    pub fn object_bind_group(&self, slot: ObjectSlot) -> &wgpu::BindGroup {
        &self.objects[slot.index()].bind_group
    }
}

fn create_scene_pipeline(
    device: &wgpu::Device,
    program: &ShaderProgram,
    layout: &wgpu::PipelineLayout,
    label: &str,
    depth_write: bool,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some(program.vertex_entry),
            buffers: &[VertexPositionNormalUv::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: program.fragment_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: VertexPositionNormalUv::primitive_state(),
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: DEPTH_COMPARE,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// The five models of the scene.
pub struct SceneModels {
    pub world: Box<dyn SceneModel>,
    pub water: Box<dyn SceneModel>,
    pub vehicle: Box<dyn SceneModel>,
    pub sky_day: Box<dyn SceneModel>,
    pub sky_night: Box<dyn SceneModel>,
}

impl SceneModels {
    pub fn get(&self, slot: ObjectSlot) -> &dyn SceneModel {
        match slot {
            ObjectSlot::Water => self.water.as_ref(),
            ObjectSlot::World => self.world.as_ref(),
            ObjectSlot::Vehicle => self.vehicle.as_ref(),
            ObjectSlot::NightSky => self.sky_night.as_ref(),
            ObjectSlot::DaySky => self.sky_day.as_ref(),
        }
    }

    /// Point every skybox material at `sampler`.
    pub fn set_sky_sampler(&mut self, device: &wgpu::Device, sampler: &wgpu::Sampler) {
        for sky in [&mut self.sky_day, &mut self.sky_night] {
            sky.set_diffuse_sampler(device, sampler);
            let textured = textured_material_count(&**sky);
            if textured == 0 {
                log::warn!("Skybox '{}' has no diffuse textures", sky.label());
            } else {
                log::debug!("Clamped {textured} skybox textures of '{}'", sky.label());
            }
        }
    }
}

/// Render the scene into `target`, cleared to `clear_color` and depth 1.0.
pub fn render_scene_pass(
    encoder: &mut wgpu::CommandEncoder,
    scene: &ScenePass,
    models: &SceneModels,
    target: &FramebufferTarget,
    clear_color: wgpu::Color,
) {
    let builder = RenderPassBuilder::new()
        .clear_color(clear_color)
        .depth(target.depth_view.clone(), DEPTH_CLEAR_VALUE)
        .label("scene-pass");
    let mut pass = builder.begin(encoder, Some(&target.color_view));
    pass.set_bind_group(0, &scene.globals_bind_group, &[]);

    for slot in SCENE_DRAW_ORDER {
        let pipeline = if slot.is_sky() {
            &scene.sky_pipeline
        } else {
            &scene.opaque_pipeline
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(1, scene.object_bind_group(slot), &[]);
        models.get(slot).render(&mut pass, Some(MATERIAL_GROUP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::create_test_device_queue;

    #[test]
    fn test_uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 224);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 80);
    }

    #[test]
    fn test_draw_order_ends_with_night_then_day_sky() {
        assert_eq!(SCENE_DRAW_ORDER[0], ObjectSlot::Water);
        assert_eq!(
            SCENE_DRAW_ORDER[3..],
            [ObjectSlot::NightSky, ObjectSlot::DaySky]
        );
        assert!(SHADOW_CASTERS.iter().all(|slot| !slot.is_sky()));
    }

    #[test]
    fn test_slot_indices_are_distinct() {
        let mut indices: Vec<usize> = SCENE_DRAW_ORDER.iter().map(|s| s.index()).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_water_is_lowered() {
        let uniforms = object_uniforms(ObjectSlot::Water, 1.0);
        let model = Mat4::from_cols_array_2d(&uniforms.model);
        let p = model.transform_point3(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Vec3::new(1.0, -4.0, 3.0));
    }

    #[test]
    fn test_only_vehicle_is_reflective() {
        for slot in SCENE_DRAW_ORDER {
            let expected = if slot == ObjectSlot::Vehicle { 0.5 } else { 0.0 };
            assert_eq!(object_uniforms(slot, 1.0).reflectiveness, expected);
        }
    }

    #[test]
    fn test_day_sky_alpha_follows_day_alpha() {
        assert_eq!(object_uniforms(ObjectSlot::DaySky, 0.25).alpha, 0.25);
        assert_eq!(object_uniforms(ObjectSlot::DaySky, 0.0).alpha, 0.0);
        assert_eq!(object_uniforms(ObjectSlot::NightSky, 0.0).alpha, 1.0);
        assert_eq!(object_uniforms(ObjectSlot::World, 0.0).alpha, 1.0);
    }

    #[test]
    fn test_skies_are_unlit() {
        assert_eq!(object_uniforms(ObjectSlot::DaySky, 1.0).lit, 0.0);
        assert_eq!(object_uniforms(ObjectSlot::NightSky, 1.0).lit, 0.0);
        assert_eq!(object_uniforms(ObjectSlot::World, 1.0).lit, 1.0);
    }

    #[test]
    fn test_scene_uniforms_store_points_with_w_one() {
        let uniforms = SceneUniforms::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::ZERO,
        );
        assert_eq!(uniforms.light_position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniforms.camera_position[3], 1.0);
    }

    #[test]
    fn test_layouts_create() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let _ = create_object_bind_group_layout(&device);
        let _ = create_material_bind_group_layout(&device);
        let _ = create_globals_bind_group_layout(&device);
    }
}
