mod buffers;
mod context;
mod render;

pub use buffers::CanvasBuffers;
pub use context::{GpuContext, GpuError};
pub use render::CanvasPipeline;
