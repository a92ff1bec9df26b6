//! Depth-only shadow map pass.
//!
//! Renders the shadow casters from the sun's point of view into a single
//! depth texture. The scene pass samples it through a comparison sampler for
//! hardware-filtered occlusion lookups.

use std::borrow::Cow;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::buffer::{BufferAllocator, VertexPositionNormalUv};
use crate::framebuffer::{DEPTH_CLEAR_VALUE, DEPTH_COMPARE, DEPTH_FORMAT, FramebufferError};
use crate::model::SceneModel;
use crate::pass::RenderPassBuilder;
use crate::shader::{ProgramSource, ShaderProgram};

/// Default shadow map edge length in texels.
pub const DEFAULT_SHADOW_MAP_RESOLUTION: u32 = 1024;

/// Polygon-offset equivalent used while rendering casters.
pub const SHADOW_DEPTH_BIAS: wgpu::DepthBiasState = wgpu::DepthBiasState {
    constant: 10,
    slope_scale: 2.5,
    clamp: 0.0,
};

/// WGSL source for the depth-only shadow program.
pub const SHADOW_SHADER_SOURCE: &str = r#"
struct ShadowUniforms {
    light_view_projection: mat4x4<f32>,
};

struct ObjectUniforms {
    model: mat4x4<f32>,
    reflectiveness: f32,
    alpha: f32,
    lit: f32,
    _pad: f32,
};

@group(0) @binding(0) var<uniform> light: ShadowUniforms;
@group(1) @binding(0) var<uniform> object: ObjectUniforms;

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return light.light_view_projection * object.model * vec4<f32>(position, 1.0);
}
"#;

pub fn program_source() -> ProgramSource {
    ProgramSource {
        name: "shadow",
        source: Cow::Borrowed(SHADOW_SHADER_SOURCE),
        vertex_entry: "vs_shadow",
        fragment_entry: None,
    }
}

/// Light transform uploaded once per frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadowUniforms {
    pub light_view_projection: [[f32; 4]; 4],
}

/// The shadow depth texture and the sampler the scene pass reads it with.
pub struct ShadowMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub comparison_sampler: wgpu::Sampler,
    resolution: u32,
}

impl ShadowMap {
    /// Create a square depth texture of `resolution` texels per side.
    pub fn new(device: &wgpu::Device, resolution: u32) -> Result<Self, FramebufferError> {
        let max = device.limits().max_texture_dimension_2d;
        if resolution == 0 {
            return Err(FramebufferError::ZeroExtent {
                label: "shadow-map".to_string(),
                width: resolution,
                height: resolution,
            });
        }
        if resolution > max {
            return Err(FramebufferError::ExceedsLimit {
                label: "shadow-map".to_string(),
                width: resolution,
                height: resolution,
                max,
            });
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow-map"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Linear filtering on a comparison sampler yields 2x2 PCF.
        let comparison_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow-comparison-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        log::info!("Created {resolution}x{resolution} shadow map");
        Ok(Self {
            texture,
            view,
            comparison_sampler,
            resolution,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

/// Depth-only pipeline for rendering the shadow map.
pub struct ShadowPipeline {
    pub pipeline: wgpu::RenderPipeline,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
}

impl ShadowPipeline {
    /// `object_layout` is the per-object uniform layout shared with the scene pass.
    pub fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        object_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let light_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shadow-light-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(64), // mat4x4<f32>
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-pipeline-layout"),
            bind_group_layouts: &[&light_bind_group_layout, object_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow-depth-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some(program.vertex_entry),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: VertexPositionNormalUv::primitive_state(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: DEPTH_COMPARE,
                stencil: wgpu::StencilState::default(),
                bias: SHADOW_DEPTH_BIAS,
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            multiview_mask: None,
            cache: None,
        });

        let light_buffer = BufferAllocator::new(device).create_uniform_buffer(
            "shadow-light-uniforms",
            &ShadowUniforms {
                light_view_projection: glam::Mat4::IDENTITY.to_cols_array_2d(),
            },
        );
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow-light-bg"),
            layout: &light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            light_buffer,
            light_bind_group,
        }
    }

    /// Upload this frame's light view-projection.
    pub fn update(&self, queue: &wgpu::Queue, light_view_projection: glam::Mat4) {
        let uniforms = ShadowUniforms {
            light_view_projection: light_view_projection.to_cols_array_2d(),
        };
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&uniforms));
    }
}

/// Render `casters` depth-only into the shadow map.
///
/// Each caster is drawn with its per-object bind group. The pass scope ends
/// before returning, so the next pass starts from a clean binding state.
pub fn render_shadow_pass(
    encoder: &mut wgpu::CommandEncoder,
    pipeline: &ShadowPipeline,
    shadow_map: &ShadowMap,
    casters: &[(&dyn SceneModel, &wgpu::BindGroup)],
) {
    let builder = RenderPassBuilder::new()
        .depth(shadow_map.view.clone(), DEPTH_CLEAR_VALUE)
        .label("shadow-pass");
    let mut pass = builder.begin(encoder, None);
    pass.set_pipeline(&pipeline.pipeline);
    pass.set_bind_group(0, &pipeline.light_bind_group, &[]);
    for (model, object_bind_group) in casters {
        pass.set_bind_group(1, *object_bind_group, &[]);
        model.render(&mut pass, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::create_test_device_queue;

    #[test]
    fn test_shadow_uniform_size() {
        assert_eq!(std::mem::size_of::<ShadowUniforms>(), 64);
    }

    #[test]
    fn test_depth_bias_matches_polygon_offset() {
        assert_eq!(SHADOW_DEPTH_BIAS.constant, 10);
        assert_eq!(SHADOW_DEPTH_BIAS.slope_scale, 2.5);
    }

    #[test]
    fn test_shadow_map_dimensions() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let shadow_map = ShadowMap::new(&device, 256).unwrap();
        assert_eq!(shadow_map.resolution(), 256);
        assert_eq!(shadow_map.texture.width(), 256);
        assert_eq!(shadow_map.texture.format(), DEPTH_FORMAT);
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        assert!(matches!(
            ShadowMap::new(&device, 0),
            Err(FramebufferError::ZeroExtent { .. })
        ));
    }
}
