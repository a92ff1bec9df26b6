use thiserror::Error;

use crate::framebuffer::FramebufferError;
use crate::gpu::RenderContextError;
use crate::model::ModelError;
use crate::shader::ShaderError;
use crate::texture::TextureError;

/// Fatal errors raised while building the renderer.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("GPU initialization failed: {0}")]
    Context(#[from] RenderContextError),

    #[error("render target creation failed: {0}")]
    Framebuffer(#[from] FramebufferError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}
