//! Post-processing chain: cutoff, two-pass Gaussian blur and composite.
//!
//! Every stage draws the same full-screen quad and samples the previous
//! stage's color target. Only the composite stage renders to the surface.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::buffer::{BufferAllocator, FULLSCREEN_QUAD, QuadVertex};
use crate::frame::FramePass;
use crate::framebuffer::{COLOR_FORMAT, DEPTH_CLEAR_VALUE, DEPTH_FORMAT, FramebufferTarget};
use crate::pass::RenderPassBuilder;
use crate::shader::{ProgramSource, ShaderProgram};
use crate::texture;

/// Half of a normalized 9-tap Gaussian kernel, center tap first.
pub const GAUSSIAN_WEIGHTS: [f32; 5] = [0.22702703, 0.1945946, 0.12162162, 0.054054055, 0.016216216];

/// Clear color of the surface before compositing.
pub const COMPOSITE_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.6,
    g: 0.0,
    b: 0.0,
    a: 0.1,
};

const PRELUDE: &str = r#"
struct PostParams {
    texel_size: vec2<f32>,
    threshold: f32,
    blur_radius: f32,
    time: f32,
    distortion: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: PostParams;

struct QuadOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_quad(@location(0) position: vec2<f32>) -> QuadOutput {
    var out: QuadOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.uv = vec2<f32>(position.x * 0.5 + 0.5, 0.5 - position.y * 0.5);
    return out;
}
"#;

const SINGLE_SOURCE_BINDINGS: &str = r#"
@group(1) @binding(0) var source_texture: texture_2d<f32>;
@group(1) @binding(1) var source_sampler: sampler;
"#;

const CUTOFF_FRAGMENT: &str = r#"
@fragment
fn fs_cutoff(in: QuadOutput) -> @location(0) vec4<f32> {
    let color = textureSample(source_texture, source_sampler, in.uv);
    let luminance = dot(color.rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    return select(vec4<f32>(0.0, 0.0, 0.0, 1.0), vec4<f32>(color.rgb, 1.0), luminance > params.threshold);
}
"#;

const BLUR_FRAGMENT: &str = r#"
@fragment
fn fs_blur(in: QuadOutput) -> @location(0) vec4<f32> {
    var weights = BLUR_WEIGHTS;
    let texel_step = BLUR_DIRECTION * params.texel_size * params.blur_radius;
    var color = textureSampleLevel(source_texture, source_sampler, in.uv, 0.0).rgb * weights[0];
    for (var i = 1; i < BLUR_TAPS; i += 1) {
        let offset = texel_step * f32(i);
        color += textureSampleLevel(source_texture, source_sampler, in.uv + offset, 0.0).rgb * weights[i];
        color += textureSampleLevel(source_texture, source_sampler, in.uv - offset, 0.0).rgb * weights[i];
    }
    return vec4<f32>(color, 1.0);
}
"#;

const COMPOSITE_FRAGMENT: &str = r#"
@group(1) @binding(0) var scene_texture: texture_2d<f32>;
@group(1) @binding(1) var bloom_texture: texture_2d<f32>;
@group(1) @binding(2) var post_sampler: sampler;

@fragment
fn fs_composite(in: QuadOutput) -> @location(0) vec4<f32> {
    let wobble = vec2<f32>(
        sin(params.time + in.uv.y * 40.0),
        cos(params.time + in.uv.x * 40.0),
    ) * params.distortion;
    let scene = textureSample(scene_texture, post_sampler, in.uv + wobble).rgb;
    let bloom = textureSample(bloom_texture, post_sampler, in.uv).rgb;
    return vec4<f32>(scene + bloom, 1.0);
}
"#;

/// WGSL constants for the kernel in [`GAUSSIAN_WEIGHTS`].
fn blur_weight_constants() -> String {
    let taps = GAUSSIAN_WEIGHTS.len();
    let weights = GAUSSIAN_WEIGHTS
        .iter()
        .map(|w| format!("{w:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("const BLUR_TAPS: i32 = {taps};\nconst BLUR_WEIGHTS = array<f32, {taps}>({weights});\n")
}

fn blur_source(direction: [f32; 2]) -> String {
    format!(
        "{PRELUDE}{SINGLE_SOURCE_BINDINGS}\n{}const BLUR_DIRECTION: vec2<f32> = vec2<f32>({:.1}, {:.1});\n{BLUR_FRAGMENT}",
        blur_weight_constants(),
        direction[0],
        direction[1]
    )
}

pub fn cutoff_program_source() -> ProgramSource {
    ProgramSource {
        name: "cutoff",
        source: Cow::Owned(format!("{PRELUDE}{SINGLE_SOURCE_BINDINGS}{CUTOFF_FRAGMENT}")),
        vertex_entry: "vs_quad",
        fragment_entry: Some("fs_cutoff"),
    }
}

pub fn horizontal_blur_program_source() -> ProgramSource {
    ProgramSource {
        name: "horizontal_blur",
        source: Cow::Owned(blur_source([1.0, 0.0])),
        vertex_entry: "vs_quad",
        fragment_entry: Some("fs_blur"),
    }
}

pub fn vertical_blur_program_source() -> ProgramSource {
    ProgramSource {
        name: "vertical_blur",
        source: Cow::Owned(blur_source([0.0, 1.0])),
        vertex_entry: "vs_quad",
        fragment_entry: Some("fs_blur"),
    }
}

pub fn composite_program_source() -> ProgramSource {
    ProgramSource {
        name: "composite",
        source: Cow::Owned(format!("{PRELUDE}{COMPOSITE_FRAGMENT}")),
        vertex_entry: "vs_quad",
        fragment_entry: Some("fs_composite"),
    }
}

/// Constants shared by every post stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PostParams {
    pub texel_size: [f32; 2],
    pub threshold: f32,
    pub blur_radius: f32,
    pub time: f32,
    pub distortion: f32,
    pub _pad: [f32; 2],
}

/// Tunables of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostSettings {
    /// Luminance above which the cutoff stage keeps a pixel.
    pub cutoff_threshold: f32,
    /// Blur tap spacing in texels.
    pub blur_radius: f32,
    /// Amplitude of the composite UV wobble.
    pub distortion_strength: f32,
}

impl PostSettings {
    /// Parameters for a `width`×`height` target at `time` seconds.
    pub fn params(&self, width: u32, height: u32, time: f32) -> PostParams {
        PostParams {
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            threshold: self.cutoff_threshold,
            blur_radius: self.blur_radius,
            time,
            distortion: self.distortion_strength,
            _pad: [0.0; 2],
        }
    }
}

/// Stages of the chain in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostStage {
    Cutoff,
    HorizontalBlur,
    VerticalBlur,
    Composite,
}

pub const POST_STAGES: [PostStage; 4] = [
    PostStage::Cutoff,
    PostStage::HorizontalBlur,
    PostStage::VerticalBlur,
    PostStage::Composite,
];

impl PostStage {
    /// The post stage a frame pass runs, if any.
    pub fn for_pass(pass: FramePass) -> Option<Self> {
        match pass {
            FramePass::Cutoff => Some(Self::Cutoff),
            FramePass::HorizontalBlur => Some(Self::HorizontalBlur),
            FramePass::VerticalBlur => Some(Self::VerticalBlur),
            FramePass::Composite => Some(Self::Composite),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Self::Cutoff => "cutoff-pass",
            Self::HorizontalBlur => "horizontal-blur-pass",
            Self::VerticalBlur => "vertical-blur-pass",
            Self::Composite => "composite-pass",
        }
    }
}

/// Color attachments the chain reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostTarget {
    /// Color output of the scene pass.
    Scene,
    Cutoff,
    HorizontalBlur,
    VerticalBlur,
    Surface,
}

/// What a stage samples, in binding order, and where it draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageIo {
    pub sources: &'static [PostTarget],
    pub target: PostTarget,
}

/// Wiring of the chain.
pub fn stage_io(stage: PostStage) -> StageIo {
    match stage {
        PostStage::Cutoff => StageIo {
            sources: &[PostTarget::Scene],
            target: PostTarget::Cutoff,
        },
        PostStage::HorizontalBlur => StageIo {
            sources: &[PostTarget::Cutoff],
            target: PostTarget::HorizontalBlur,
        },
        PostStage::VerticalBlur => StageIo {
            sources: &[PostTarget::HorizontalBlur],
            target: PostTarget::VerticalBlur,
        },
        PostStage::Composite => StageIo {
            sources: &[PostTarget::Scene, PostTarget::VerticalBlur],
            target: PostTarget::Surface,
        },
    }
}

/// True when every offscreen stage samples exactly the previous stage's
/// output and the last stage samples the scene at slot 0 and the previous
/// output at slot 1, drawing to the surface.
pub fn is_linked_chain(chain: &[StageIo]) -> bool {
    let Some((last, offscreen)) = chain.split_last() else {
        return false;
    };
    let mut previous = PostTarget::Scene;
    for io in offscreen {
        if io.sources != [previous].as_slice()
            || matches!(io.target, PostTarget::Scene | PostTarget::Surface)
        {
            return false;
        }
        previous = io.target;
    }
    last.sources == [PostTarget::Scene, previous].as_slice() && last.target == PostTarget::Surface
}

/// Four-vertex triangle strip covering the viewport, created on first use.
#[derive(Default)]
pub struct FullscreenQuad {
    buffer: OnceCell<wgpu::Buffer>,
}

impl FullscreenQuad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self, device: &wgpu::Device) -> &wgpu::Buffer {
        self.buffer.get_or_init(|| {
            log::debug!("Creating full-screen quad vertex buffer");
            BufferAllocator::new(device)
                .create_vertex_buffer("fullscreen-quad", bytemuck::cast_slice(&FULLSCREEN_QUAD))
        })
    }

    pub fn is_created(&self) -> bool {
        self.buffer.get().is_some()
    }

    pub fn draw(&self, device: &wgpu::Device, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.buffer(device).slice(..));
        pass.draw(0..FULLSCREEN_QUAD.len() as u32, 0..1);
    }
}

/// Color views the chain reads from.
pub struct PostSources<'a> {
    pub scene: &'a wgpu::TextureView,
    pub cutoff: &'a wgpu::TextureView,
    pub horizontal_blur: &'a wgpu::TextureView,
    pub vertical_blur: &'a wgpu::TextureView,
}

impl PostSources<'_> {
    /// View of `target`; the surface cannot be sampled.
    fn view(&self, target: PostTarget) -> Option<&wgpu::TextureView> {
        match target {
            PostTarget::Scene => Some(self.scene),
            PostTarget::Cutoff => Some(self.cutoff),
            PostTarget::HorizontalBlur => Some(self.horizontal_blur),
            PostTarget::VerticalBlur => Some(self.vertical_blur),
            PostTarget::Surface => None,
        }
    }
}

/// Programs of the chain.
pub struct PostPrograms<'a> {
    pub cutoff: &'a ShaderProgram,
    pub horizontal_blur: &'a ShaderProgram,
    pub vertical_blur: &'a ShaderProgram,
    pub composite: &'a ShaderProgram,
}

impl PostPrograms<'_> {
    fn get(&self, stage: PostStage) -> &ShaderProgram {
        match stage {
            PostStage::Cutoff => self.cutoff,
            PostStage::HorizontalBlur => self.horizontal_blur,
            PostStage::VerticalBlur => self.vertical_blur,
            PostStage::Composite => self.composite,
        }
    }
}

struct StageResources {
    pipeline: wgpu::RenderPipeline,
    sources: wgpu::BindGroup,
}

/// Pipelines, bindings and the shared quad of the post chain.
pub struct PostChain {
    /// Indexed by [`PostStage`].
    stages: Vec<StageResources>,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    quad: FullscreenQuad,
    settings: PostSettings,
    extent: (u32, u32),
}

impl PostChain {
    /// `extent` is the size of the offscreen targets; `surface_format` is
    /// the format the composite stage writes.
    pub fn new(
        device: &wgpu::Device,
        programs: &PostPrograms<'_>,
        sources: &PostSources<'_>,
        surface_format: wgpu::TextureFormat,
        settings: PostSettings,
        extent: (u32, u32),
    ) -> Self {
        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("post-params-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<PostParams>() as u64),
                },
                count: None,
            }],
        });
        let single_layout = source_layout(device, "post-source-bgl", 1);
        let composite_layout = source_layout(device, "post-composite-bgl", 2);

        let single_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post-single-pipeline-layout"),
            bind_group_layouts: &[&params_layout, &single_layout],
            immediate_size: 0,
        });
        let composite_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("post-composite-pipeline-layout"),
                bind_group_layouts: &[&params_layout, &composite_layout],
                immediate_size: 0,
            });

        let offscreen_depth = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let params_buffer = BufferAllocator::new(device)
            .create_uniform_buffer("post-params", &settings.params(extent.0, extent.1, 0.0));
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post-params-bg"),
            layout: &params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        debug_assert!(is_linked_chain(&POST_STAGES.map(stage_io)));
        let sampler = texture::create_sampler(device, "post-sampler", wgpu::AddressMode::ClampToEdge);
        let stages = POST_STAGES
            .iter()
            .map(|&stage| {
                let io = stage_io(stage);
                let views: Vec<&wgpu::TextureView> =
                    io.sources.iter().filter_map(|&source| sources.view(source)).collect();
                let (bind_layout, pipeline_layout) = if views.len() == 1 {
                    (&single_layout, &single_pipeline_layout)
                } else {
                    (&composite_layout, &composite_pipeline_layout)
                };
                let (format, depth) = if io.target == PostTarget::Surface {
                    (surface_format, None)
                } else {
                    (COLOR_FORMAT, Some(offscreen_depth.clone()))
                };
                StageResources {
                    pipeline: create_fullscreen_pipeline(
                        device,
                        programs.get(stage),
                        pipeline_layout,
                        format,
                        depth,
                    ),
                    sources: source_bind_group(device, bind_layout, &views, &sampler),
                }
            })
            .collect();

        Self {
            stages,
            params_buffer,
            params_bind_group,
            quad: FullscreenQuad::new(),
            settings,
            extent,
        }
    }

    /// Upload the animation time for this frame.
    pub fn update(&self, queue: &wgpu::Queue, time: f32) {
        let params = self.settings.params(self.extent.0, self.extent.1, time);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }

    /// Run an offscreen stage into `target`, cleared to black and depth 1.0.
    pub fn render_offscreen(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        stage: PostStage,
        target: &FramebufferTarget,
    ) {
        let builder = RenderPassBuilder::new()
            .depth(target.depth_view.clone(), DEPTH_CLEAR_VALUE)
            .label(stage.label());
        let mut pass = builder.begin(encoder, Some(&target.color_view));
        self.draw(device, &mut pass, stage);
    }

    /// Record the draw of `stage` into an already open pass.
    pub fn draw(&self, device: &wgpu::Device, pass: &mut wgpu::RenderPass<'_>, stage: PostStage) {
        let resources = &self.stages[stage.index()];
        pass.set_pipeline(&resources.pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, &resources.sources, &[]);
        self.quad.draw(device, pass);
    }
}

/// `texture_count` sampled textures at bindings `0..n`, then one sampler.
fn source_layout(device: &wgpu::Device, label: &str, texture_count: u32) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..texture_count)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: texture_count,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    })
}

fn source_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    views: &[&wgpu::TextureView],
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let mut entries: Vec<wgpu::BindGroupEntry> = views
        .iter()
        .enumerate()
        .map(|(binding, view)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: wgpu::BindingResource::TextureView(view),
        })
        .collect();
    entries.push(wgpu::BindGroupEntry {
        binding: views.len() as u32,
        resource: wgpu::BindingResource::Sampler(sampler),
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("post-source-bg"),
        layout,
        entries: &entries,
    })
}

/// Pipeline drawing the full-screen quad with `program` into `format`.
///
/// Offscreen targets carry a depth attachment, so their pipelines need a
/// matching depth state; the surface pass has none.
pub fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    program: &ShaderProgram,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    depth_stencil: Option<wgpu::DepthStencilState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.name),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some(program.vertex_entry),
            buffers: &[QuadVertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: program.fragment_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::create_test_device_queue;
    use crate::shader::validate_program;

    #[test]
    fn test_gaussian_weights_are_normalized() {
        let total = GAUSSIAN_WEIGHTS[0] + 2.0 * GAUSSIAN_WEIGHTS[1..].iter().sum::<f32>();
        assert!((total - 1.0).abs() < 1e-4, "sum was {total}");
    }

    #[test]
    fn test_gaussian_weights_decrease() {
        assert!(GAUSSIAN_WEIGHTS.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_blur_shader_embeds_kernel() {
        let source = horizontal_blur_program_source().source;
        assert!(source.contains("const BLUR_TAPS: i32 = 5;"));
        for weight in GAUSSIAN_WEIGHTS {
            assert!(source.contains(&format!("{weight:?}")), "missing {weight}");
        }
        assert!(!BLUR_FRAGMENT.contains("0.2270"));
    }

    #[test]
    fn test_chain_samples_previous_stage() {
        let chain = POST_STAGES.map(stage_io);
        assert!(is_linked_chain(&chain));
        assert_eq!(chain[0].sources, [PostTarget::Scene].as_slice());
        assert_eq!(chain[1].sources, [PostTarget::Cutoff].as_slice());
        assert_eq!(chain[2].sources, [PostTarget::HorizontalBlur].as_slice());
        assert_eq!(
            chain[3].sources,
            [PostTarget::Scene, PostTarget::VerticalBlur].as_slice()
        );
        assert_eq!(chain[3].target, PostTarget::Surface);
    }

    #[test]
    fn test_miswired_chains_are_rejected() {
        let chain = POST_STAGES.map(stage_io);

        let mut swapped_blur = chain;
        swapped_blur[2].sources = &[PostTarget::Cutoff];
        assert!(!is_linked_chain(&swapped_blur));

        let mut swapped_composite = chain;
        swapped_composite[3].sources = &[PostTarget::VerticalBlur, PostTarget::Scene];
        assert!(!is_linked_chain(&swapped_composite));

        let mut reordered = chain;
        reordered.swap(1, 2);
        assert!(!is_linked_chain(&reordered));

        let mut offscreen_composite = chain;
        offscreen_composite[3].target = PostTarget::VerticalBlur;
        assert!(!is_linked_chain(&offscreen_composite));

        assert!(!is_linked_chain(&[]));
    }

    #[test]
    fn test_frame_passes_map_to_stages() {
        let stages: Vec<PostStage> = crate::frame::FRAME_SEQUENCE
            .iter()
            .filter_map(|&pass| PostStage::for_pass(pass))
            .collect();
        assert_eq!(stages, POST_STAGES);
        assert_eq!(PostStage::for_pass(FramePass::Shadow), None);
        assert_eq!(PostStage::for_pass(FramePass::Present), None);
    }

    #[test]
    fn test_composite_clear_color() {
        assert_eq!(
            COMPOSITE_CLEAR_COLOR,
            wgpu::Color {
                r: 0.6,
                g: 0.0,
                b: 0.0,
                a: 0.1,
            }
        );
    }

    #[test]
    fn test_params_size_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<PostParams>(), 32);
    }

    #[test]
    fn test_params_texel_size() {
        let settings = PostSettings {
            cutoff_threshold: 0.75,
            blur_radius: 1.0,
            distortion_strength: 0.004,
        };
        let params = settings.params(800, 512, 3.0);
        assert_eq!(params.texel_size, [1.0 / 800.0, 1.0 / 512.0]);
        assert_eq!(params.time, 3.0);
        assert_eq!(params.threshold, 0.75);
    }

    #[test]
    fn test_blur_programs_differ_only_in_direction() {
        let horizontal = horizontal_blur_program_source();
        let vertical = vertical_blur_program_source();
        assert!(horizontal.source.contains("vec2<f32>(1.0, 0.0)"));
        assert!(vertical.source.contains("vec2<f32>(0.0, 1.0)"));
        assert_eq!(horizontal.fragment_entry, vertical.fragment_entry);
    }

    #[test]
    fn test_post_programs_validate() {
        for source in [
            cutoff_program_source(),
            horizontal_blur_program_source(),
            vertical_blur_program_source(),
            composite_program_source(),
        ] {
            let module = validate_program(&source).unwrap();
            assert_eq!(module.entry_points.len(), 2, "{}", source.name);
        }
    }

    #[test]
    fn test_quad_buffer_created_lazily_once() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let quad = FullscreenQuad::new();
        assert!(!quad.is_created());
        let size = quad.buffer(&device).size();
        assert!(quad.is_created());
        assert_eq!(size, std::mem::size_of_val(&FULLSCREEN_QUAD) as u64);
        assert_eq!(quad.buffer(&device).size(), size);
    }
}
