//! The GPU frame backend.
//!
//! [`Renderer`] owns every GPU resource of the demo: targets, pipelines,
//! models and the encoder of the frame in flight. It executes the passes
//! named by [`FramePass`]; their order comes from [`run_frame`](crate::frame::run_frame).

use std::path::PathBuf;

use crate::error::InitError;
use crate::frame::{FrameBackend, FrameError, FrameInputs, FramePass};
use crate::framebuffer::FramebufferTarget;
use crate::gpu::{RenderContext, SurfaceError};
use crate::model::{MaterialResources, ObjModel, SceneModel};
use crate::pass::{FrameEncoder, RenderPassBuilder};
use crate::post::{
    COMPOSITE_CLEAR_COLOR, PostChain, PostPrograms, PostSettings, PostSources, PostStage,
    PostTarget, stage_io,
};
use crate::scene::{
    SHADOW_CASTERS, SceneModels, ScenePass, SceneUniforms, create_material_bind_group_layout,
    create_object_bind_group_layout, render_scene_pass,
};
use crate::shader::ShaderSet;
use crate::shadow::{DEFAULT_SHADOW_MAP_RESOLUTION, ShadowMap, ShadowPipeline, render_shadow_pass};
use crate::texture::{self, GpuTexture};

/// Tunables fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    pub shadow_map_resolution: u32,
    pub post: PostSettings,
    /// RGBA clear color of the scene target.
    pub scene_clear_color: [f32; 4],
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadow_map_resolution: DEFAULT_SHADOW_MAP_RESOLUTION,
            post: PostSettings {
                cutoff_threshold: 0.75,
                blur_radius: 1.0,
                distortion_strength: 0.004,
            },
            scene_clear_color: [0.2, 0.2, 0.8, 1.0],
        }
    }
}

/// Files loaded at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAssets {
    pub world: PathBuf,
    pub water: PathBuf,
    pub vehicle: PathBuf,
    pub sky_day: PathBuf,
    pub sky_night: PathBuf,
    /// Cube map faces in +X, −X, +Y, −Y, +Z, −Z order.
    pub cube_map: [PathBuf; 6],
}

/// Offscreen targets of the frame, all sized to the initial surface.
struct Targets {
    main: FramebufferTarget,
    cutoff: FramebufferTarget,
    horizontal_blur: FramebufferTarget,
    vertical_blur: FramebufferTarget,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self, InitError> {
        Ok(Self {
            main: FramebufferTarget::new(device, "main", width, height)?,
            cutoff: FramebufferTarget::new(device, "cutoff", width, height)?,
            horizontal_blur: FramebufferTarget::new(device, "horizontal-blur", width, height)?,
            vertical_blur: FramebufferTarget::new(device, "vertical-blur", width, height)?,
        })
    }

    /// Offscreen target behind `target`; the surface has none.
    fn get(&self, target: PostTarget) -> Option<&FramebufferTarget> {
        match target {
            PostTarget::Scene => Some(&self.main),
            PostTarget::Cutoff => Some(&self.cutoff),
            PostTarget::HorizontalBlur => Some(&self.horizontal_blur),
            PostTarget::VerticalBlur => Some(&self.vertical_blur),
            PostTarget::Surface => None,
        }
    }
}

pub struct Renderer {
    ctx: RenderContext,
    targets: Targets,
    shadow_map: ShadowMap,
    shadow_pipeline: ShadowPipeline,
    scene_pass: ScenePass,
    post: PostChain,
    models: SceneModels,
    frame: Option<FrameEncoder>,
    scene_clear_color: wgpu::Color,
}

impl Renderer {
    /// Compile programs, create targets and load every asset.
    ///
    /// Any failure is fatal; nothing is retried per frame.
    pub fn new(
        ctx: RenderContext,
        settings: &RendererSettings,
        assets: &SceneAssets,
    ) -> Result<Self, InitError> {
        let device = &ctx.device;
        let queue = &ctx.queue;

        let shaders = ShaderSet::compile(device)?;
        let (width, height) = ctx.size();
        let targets = Targets::new(device, width, height)?;
        let shadow_map = ShadowMap::new(device, settings.shadow_map_resolution)?;

        let object_layout = create_object_bind_group_layout(device);
        let material_layout = create_material_bind_group_layout(device);
        let white = texture::white_texture(device, queue)?;
        let repeat_sampler = texture::create_sampler(device, "diffuse-sampler", wgpu::AddressMode::Repeat);
        let clamp_sampler =
            texture::create_sampler(device, "clamp-sampler", wgpu::AddressMode::ClampToEdge);

        let resources = MaterialResources {
            layout: &material_layout,
            sampler: &repeat_sampler,
            fallback: &white,
        };
        let load = |path: &PathBuf| -> Result<Box<dyn SceneModel>, InitError> {
            Ok(Box::new(ObjModel::load(device, queue, path, &resources)?))
        };
        let mut models = SceneModels {
            world: load(&assets.world)?,
            water: load(&assets.water)?,
            vehicle: load(&assets.vehicle)?,
            sky_day: load(&assets.sky_day)?,
            sky_night: load(&assets.sky_night)?,
        };
        models.set_sky_sampler(device, &clamp_sampler);

        let environment: GpuTexture = texture::load_cube_map(device, queue, &assets.cube_map)?;

        let shadow_pipeline = ShadowPipeline::new(device, &shaders.shadow, &object_layout);
        let scene_pass = ScenePass::new(
            device,
            &shaders.scene,
            &shadow_map,
            &environment,
            &clamp_sampler,
            &object_layout,
            &material_layout,
        );
        let post = PostChain::new(
            device,
            &PostPrograms {
                cutoff: &shaders.cutoff,
                horizontal_blur: &shaders.horizontal_blur,
                vertical_blur: &shaders.vertical_blur,
                composite: &shaders.composite,
            },
            &PostSources {
                scene: &targets.main.color_view,
                cutoff: &targets.cutoff.color_view,
                horizontal_blur: &targets.horizontal_blur.color_view,
                vertical_blur: &targets.vertical_blur.color_view,
            },
            ctx.surface_format,
            settings.post,
            (width, height),
        );

        let [r, g, b, a] = settings.scene_clear_color.map(f64::from);
        log::info!(
            "Renderer ready ({}x{} targets)",
            targets.main.width(),
            targets.main.height()
        );
        Ok(Self {
            ctx,
            targets,
            shadow_map,
            shadow_pipeline,
            scene_pass,
            post,
            models,
            frame: None,
            scene_clear_color: wgpu::Color { r, g, b, a },
        })
    }

    fn encode_pass(&mut self, pass: FramePass) -> Result<(), FrameError> {
        let device = &self.ctx.device;
        match pass {
            FramePass::Shadow => {
                let casters: Vec<(&dyn SceneModel, &wgpu::BindGroup)> = SHADOW_CASTERS
                    .iter()
                    .map(|&slot| (self.models.get(slot), self.scene_pass.object_bind_group(slot)))
                    .collect();
                render_shadow_pass(
                    frame_encoder(&mut self.frame, pass)?,
                    &self.shadow_pipeline,
                    &self.shadow_map,
                    &casters,
                );
            }
            FramePass::Scene => render_scene_pass(
                frame_encoder(&mut self.frame, pass)?,
                &self.scene_pass,
                &self.models,
                &self.targets.main,
                self.scene_clear_color,
            ),
            FramePass::Cutoff | FramePass::HorizontalBlur | FramePass::VerticalBlur => {
                let stage = PostStage::for_pass(pass).ok_or(FrameError::MissingTarget(pass))?;
                let target = self
                    .targets
                    .get(stage_io(stage).target)
                    .ok_or(FrameError::MissingTarget(pass))?;
                self.post.render_offscreen(
                    device,
                    frame_encoder(&mut self.frame, pass)?,
                    stage,
                    target,
                );
            }
            FramePass::Composite => {
                let frame = self.frame.as_mut().ok_or(FrameError::NotStarted(pass))?;
                let builder = RenderPassBuilder::new()
                    .clear_color(COMPOSITE_CLEAR_COLOR)
                    .label("composite-pass");
                let mut surface_pass = frame
                    .begin_surface_pass(&builder)
                    .ok_or(FrameError::NotStarted(pass))?;
                self.post.draw(device, &mut surface_pass, PostStage::Composite);
            }
            FramePass::Present => {
                let frame = self.frame.take().ok_or(FrameError::NotStarted(pass))?;
                frame.submit();
            }
        }
        Ok(())
    }
}

/// Pop the validation scope opened around `pass` and log what it caught.
///
/// Encoder errors surface when the command buffer is finished, so they are
/// attributed to the `Present` pass.
fn pop_pass_error_scope(scope: wgpu::ErrorScopeGuard, pass: FramePass) -> Option<wgpu::Error> {
    let error = pollster::block_on(scope.pop())?;
    log::error!("GPU validation failed in {pass:?} pass: {error}");
    Some(error)
}

fn frame_encoder(
    frame: &mut Option<FrameEncoder>,
    pass: FramePass,
) -> Result<&mut wgpu::CommandEncoder, FrameError> {
    frame
        .as_mut()
        .and_then(FrameEncoder::encoder)
        .ok_or(FrameError::NotStarted(pass))
}

impl FrameBackend for Renderer {
    type Error = FrameError;

    fn begin_frame(&mut self, inputs: &FrameInputs) -> Result<bool, FrameError> {
        if self.frame.take().is_some() {
            log::warn!("Previous frame was never presented");
        }
        let surface_texture = match self.ctx.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out, skipping frame");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        };

        let queue = &self.ctx.queue;
        self.shadow_pipeline.update(queue, inputs.light_view_projection);
        self.scene_pass.update(
            queue,
            &SceneUniforms::new(
                inputs.view,
                inputs.projection,
                inputs.shadow_matrix,
                inputs.light_position,
                inputs.camera_position,
            ),
            inputs.day_alpha,
        );
        self.post.update(queue, inputs.elapsed);

        self.frame = Some(FrameEncoder::new(
            &self.ctx.device,
            self.ctx.queue.clone(),
            surface_texture,
        ));
        Ok(true)
    }

    fn execute(&mut self, pass: FramePass, _inputs: &FrameInputs) -> Result<(), FrameError> {
        let checked = cfg!(debug_assertions);
        let scope = checked.then(|| self.ctx.device.push_error_scope(wgpu::ErrorFilter::Validation));
        let result = self.encode_pass(pass);
        if let Some(scope) = scope {
            pop_pass_error_scope(scope, pass);
        }
        result
    }

    /// Reconfigure the surface. Offscreen targets keep their startup size.
    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::create_test_device_queue;

    #[test]
    fn test_default_settings() {
        let settings = RendererSettings::default();
        assert_eq!(settings.shadow_map_resolution, 1024);
        assert_eq!(settings.scene_clear_color, [0.2, 0.2, 0.8, 1.0]);
        assert_eq!(settings.post.cutoff_threshold, 0.75);
    }

    #[test]
    fn test_every_offscreen_post_pass_has_a_target() {
        for pass in [FramePass::Cutoff, FramePass::HorizontalBlur, FramePass::VerticalBlur] {
            let stage = PostStage::for_pass(pass).unwrap();
            assert_ne!(stage_io(stage).target, PostTarget::Surface, "{pass:?}");
        }
        assert_eq!(stage_io(PostStage::Composite).target, PostTarget::Surface);
    }

    #[test]
    fn test_pass_error_scope_reports_validation_errors() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        assert!(pop_pass_error_scope(scope, FramePass::Scene).is_none());

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let _invalid = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("read-write-mapped"),
            size: 16,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::MAP_WRITE,
            mapped_at_creation: false,
        });
        assert!(matches!(
            pop_pass_error_scope(scope, FramePass::Shadow),
            Some(wgpu::Error::Validation { .. })
        ));
    }

    #[test]
    fn test_encoder_requires_frame_in_flight() {
        let mut frame = None;
        assert!(matches!(
            frame_encoder(&mut frame, FramePass::Scene),
            Err(FrameError::NotStarted(FramePass::Scene))
        ));
    }
}
