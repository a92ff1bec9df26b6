//! wgpu rendering pipeline: shadow map, lit scene with day/night skies, and a
//! cutoff, blur and composite post chain sequenced once per frame.

pub mod buffer;
pub mod error;
pub mod frame;
pub mod framebuffer;
pub mod gpu;
pub mod model;
pub mod pass;
pub mod post;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod shadow;
pub mod texture;

pub use buffer::{BufferAllocator, MeshBuffer, QuadVertex, VertexPositionNormalUv};
pub use error::InitError;
pub use frame::{FRAME_SEQUENCE, FrameBackend, FrameError, FrameInputs, FramePass, run_frame};
pub use framebuffer::{FramebufferError, FramebufferTarget};
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use model::{ModelError, ObjModel, SceneModel, textured_material_count};
pub use pass::{FrameEncoder, RenderPassBuilder};
pub use post::{POST_STAGES, PostChain, PostSettings, PostStage, PostTarget, StageIo, stage_io};
pub use renderer::{Renderer, RendererSettings, SceneAssets};
pub use scene::{ObjectSlot, SCENE_DRAW_ORDER, SceneModels};
pub use shader::{ShaderError, ShaderProgram, ShaderSet};
pub use shadow::{ShadowMap, ShadowPipeline};
pub use texture::{GpuTexture, TextureError};
