//! Texture creation from decoded images: material textures, the environment
//! cube map and the 1×1 fallback used by untextured materials.

use std::path::{Path, PathBuf};

/// Format of material and cube-map textures. Image files are sRGB encoded.
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Errors that can occur during texture creation.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The image file is missing or could not be decoded.
    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Pixel data length doesn't match the expected size for the given dimensions and format.
    #[error(
        "texture data size ({actual}) does not match expected ({expected}) for {width}x{height} {format:?}"
    )]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },

    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// Cube faces must be square and share one size.
    #[error("cube map face {face} is {actual:?}, expected {expected:?}")]
    CubeFaceMismatch {
        face: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// A GPU texture with its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// Width and height in texels.
    pub dimensions: (u32, u32),
}

/// Decode an image file into tightly packed RGBA8 texels.
pub fn decode_rgba(path: &Path) -> Result<image::RgbaImage, TextureError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| TextureError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a 2D texture from an image file.
pub fn load_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: &Path,
) -> Result<GpuTexture, TextureError> {
    let rgba = decode_rgba(path)?;
    let label = path.display().to_string();
    let (width, height) = rgba.dimensions();
    create_texture(device, queue, &label, rgba.as_raw(), width, height)
}

/// Opaque white 1×1 texture, bound where a material has no diffuse map.
pub fn white_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<GpuTexture, TextureError> {
    create_texture(device, queue, "white-1x1", &[255; 4], 1, 1)
}

/// Create a 2D RGBA texture from raw pixel data.
pub fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<GpuTexture, TextureError> {
    validate_dimensions(width, height)?;
    validate_data_size(data, width, height, IMAGE_FORMAT)?;

    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: IMAGE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_layer(queue, &texture, 0, data, width, height);

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    log::debug!("Created texture '{label}' ({width}x{height})");
    Ok(GpuTexture {
        texture,
        view,
        dimensions: (width, height),
    })
}

/// Load six face images (+X, −X, +Y, −Y, +Z, −Z) into a cube texture.
pub fn load_cube_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    faces: &[PathBuf; 6],
) -> Result<GpuTexture, TextureError> {
    let images = faces
        .iter()
        .map(|path| decode_rgba(path))
        .collect::<Result<Vec<_>, _>>()?;
    let sizes: Vec<(u32, u32)> = images.iter().map(|img| img.dimensions()).collect();
    let (width, height) = validate_cube_faces(&sizes)?;

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("environment-cube-map"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: IMAGE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (layer, image) in images.iter().enumerate() {
        write_layer(queue, &texture, layer as u32, image.as_raw(), width, height);
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("environment-cube-view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    log::info!("Loaded environment cube map ({width}x{height} per face)");
    Ok(GpuTexture {
        texture,
        view,
        dimensions: (width, height),
    })
}

/// Linear-filtering sampler with the given wrap mode on all axes.
pub fn create_sampler(
    device: &wgpu::Device,
    label: &str,
    address_mode: wgpu::AddressMode,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

fn write_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    layer: u32,
    data: &[u8],
    width: u32,
    height: u32,
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row(width, IMAGE_FORMAT)),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// All six faces must be square, non-empty and the same size.
fn validate_cube_faces(sizes: &[(u32, u32)]) -> Result<(u32, u32), TextureError> {
    let Some(&first) = sizes.first() else {
        return Err(TextureError::ZeroDimensions {
            width: 0,
            height: 0,
        });
    };
    validate_dimensions(first.0, first.1)?;
    let expected = (first.0, first.0);
    for (face, &actual) in sizes.iter().enumerate() {
        if actual != expected {
            return Err(TextureError::CubeFaceMismatch {
                face,
                expected,
                actual,
            });
        }
    }
    Ok(expected)
}

/// Calculate the expected byte size for a texture.
fn expected_byte_size(width: u32, height: u32, format: wgpu::TextureFormat) -> usize {
    let bpp = format.block_copy_size(None).unwrap_or(4) as usize;
    width as usize * height as usize * bpp
}

/// Calculate bytes per row for a texture.
fn bytes_per_row(width: u32, format: wgpu::TextureFormat) -> u32 {
    let bpp = format.block_copy_size(None).unwrap_or(4);
    width * bpp
}

/// Validate that dimensions are non-zero.
fn validate_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    Ok(())
}

/// Validate that data size matches expected size.
fn validate_data_size(
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<(), TextureError> {
    let expected = expected_byte_size(width, height, format);
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
            format,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::create_test_device_queue;

    #[test]
    fn test_data_size_mismatch_returns_error() {
        let err = validate_data_size(&[0; 15], 2, 2, IMAGE_FORMAT).unwrap_err();
        assert!(matches!(
            err,
            TextureError::DataSizeMismatch {
                actual: 15,
                expected: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_dimensions_returns_error() {
        assert!(matches!(
            validate_dimensions(0, 4),
            Err(TextureError::ZeroDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_cube_faces_must_match() {
        let mut sizes = [(64, 64); 6];
        assert_eq!(validate_cube_faces(&sizes).unwrap(), (64, 64));
        sizes[4] = (32, 32);
        assert!(matches!(
            validate_cube_faces(&sizes),
            Err(TextureError::CubeFaceMismatch { face: 4, .. })
        ));
    }

    #[test]
    fn test_cube_faces_must_be_square() {
        let sizes = [(64, 32); 6];
        assert!(matches!(
            validate_cube_faces(&sizes),
            Err(TextureError::CubeFaceMismatch { face: 0, .. })
        ));
    }

    #[test]
    fn test_missing_image_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        let err = decode_rgba(&path).unwrap_err();
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn test_decode_written_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        let rgba = decode_rgba(&path).unwrap();
        assert_eq!(rgba.dimensions(), (3, 2));
        assert_eq!(rgba.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_white_texture_is_one_texel() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let white = white_texture(&device, &queue).unwrap();
        assert_eq!(white.dimensions, (1, 1));
    }

    #[test]
    fn test_cube_map_from_files() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let faces: [PathBuf; 6] = std::array::from_fn(|i| dir.path().join(format!("cube{i}.png")));
        for face in &faces {
            image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]))
                .save(face)
                .unwrap();
        }
        let cube = load_cube_map(&device, &queue, &faces).unwrap();
        assert_eq!(cube.dimensions, (4, 4));
        assert_eq!(cube.texture.depth_or_array_layers(), 6);
    }
}
