//! Offscreen color + depth render targets.
//!
//! Uses standard depth: the near plane maps to 0.0 and the far plane to 1.0,
//! targets are cleared to [`DEPTH_CLEAR_VALUE`] and fragments pass with
//! [`DEPTH_COMPARE`].

/// Color format of every offscreen target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Depth format of offscreen targets and the shadow map.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth clear value: the far plane.
pub const DEPTH_CLEAR_VALUE: f32 = 1.0;

/// Closer fragments have smaller depth values.
pub const DEPTH_COMPARE: wgpu::CompareFunction = wgpu::CompareFunction::Less;

/// Reasons an offscreen target cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramebufferError {
    #[error("framebuffer '{label}' has zero extent ({width}x{height})")]
    ZeroExtent {
        label: String,
        width: u32,
        height: u32,
    },

    #[error("framebuffer '{label}' extent {width}x{height} exceeds the device limit of {max}")]
    ExceedsLimit {
        label: String,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error(
        "framebuffer '{label}' attachments differ in size: color {color:?}, depth {depth:?}"
    )]
    AttachmentMismatch {
        label: String,
        color: (u32, u32),
        depth: (u32, u32),
    },
}

/// Check that a color and depth attachment pair forms a complete target.
///
/// Both attachments must be non-empty, fit the device's 2D texture limit and
/// share the same size.
pub fn validate_attachments(
    label: &str,
    color: (u32, u32),
    depth: (u32, u32),
    max_dimension: u32,
) -> Result<(), FramebufferError> {
    for (width, height) in [color, depth] {
        if width == 0 || height == 0 {
            return Err(FramebufferError::ZeroExtent {
                label: label.to_string(),
                width,
                height,
            });
        }
        if width > max_dimension || height > max_dimension {
            return Err(FramebufferError::ExceedsLimit {
                label: label.to_string(),
                width,
                height,
                max: max_dimension,
            });
        }
    }
    if color != depth {
        return Err(FramebufferError::AttachmentMismatch {
            label: label.to_string(),
            color,
            depth,
        });
    }
    Ok(())
}

/// An offscreen color + depth target whose color output is sampled by a later
/// pass.
///
/// Created once at startup and never resized.
pub struct FramebufferTarget {
    label: String,
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_texture: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl FramebufferTarget {
    /// Create a complete target of the given size.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, FramebufferError> {
        let max_dimension = device.limits().max_texture_dimension_2d;
        validate_attachments(label, (width, height), (width, height), max_dimension)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label}-color")),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label}-depth")),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("Created framebuffer '{label}' ({width}x{height})");
        Ok(Self {
            label: label.to_string(),
            color_texture,
            color_view,
            depth_texture,
            depth_view,
            width,
            height,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
pub(crate) fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}
