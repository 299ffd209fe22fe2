use prime_spiral::canvas::TileCanvas;
use wgpu::{Buffer, BufferUsages, Device, Queue};

/// Canvas placement passed to the render shader (16 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CanvasParams {
    /// Edge of the square canvas in pixels
    pub canvas_size: u32,
    pub surface_width: u32,
    pub surface_height: u32,
    pub _padding: u32,
}

/// GPU copy of the tile canvas plus its placement uniform
pub struct CanvasBuffers {
    /// One packed RGBA u32 per canvas pixel
    pub pixels_buffer: Buffer,
    pub params_buffer: Buffer,
    canvas_size: u32,
}

fn create_pixels_buffer(device: &Device, canvas_size: u32) -> Buffer {
    let pixel_count = canvas_size as u64 * canvas_size as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("canvas-pixels-buffer"),
        // wgpu rejects zero-sized bindings
        size: (pixel_count * std::mem::size_of::<u32>() as u64).max(4),
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl CanvasBuffers {
    pub fn new(device: &Device, canvas_size: u32) -> Self {
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("canvas-params-buffer"),
            size: std::mem::size_of::<CanvasParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pixels_buffer: create_pixels_buffer(device, canvas_size),
            params_buffer,
            canvas_size,
        }
    }

    /// Copy the canvas to the GPU, growing or shrinking the buffer with it
    pub fn upload(&mut self, device: &Device, queue: &Queue, canvas: &TileCanvas) {
        if canvas.size() != self.canvas_size {
            log::debug!("Canvas resized {} -> {}", self.canvas_size, canvas.size());
            self.canvas_size = canvas.size();
            self.pixels_buffer = create_pixels_buffer(device, self.canvas_size);
        }
        if !canvas.pixels().is_empty() {
            queue.write_buffer(&self.pixels_buffer, 0, bytemuck::cast_slice(canvas.pixels()));
        }
    }

    /// Tell the shader where the canvas sits on a surface of the given size
    pub fn update_params(&self, queue: &Queue, surface_size: (u32, u32)) {
        let params = CanvasParams {
            canvas_size: self.canvas_size,
            surface_width: surface_size.0,
            surface_height: surface_size.1,
            _padding: 0,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }
}
