use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use prime_spiral::canvas::TileCanvas;
use prime_spiral::config::{
    CANVAS_WIDTH_STEP, FRAME_BUDGET, MAX_CANVAS_WIDTH, MIN_CANVAS_WIDTH, MIN_TILE_SIZE,
    WINDOW_SIZE,
};
use prime_spiral::pass::PassSlot;
use prime_spiral::rule::{PrimeRule, RuleOptions};
use prime_spiral::stepper::{PassState, Step, SteppingLoop, TimeBudget};
use prime_spiral::PassParams;

use crate::gpu::{CanvasBuffers, CanvasPipeline, GpuContext, GpuError};

/// Upper bound for the iteration control; far past the point of diminishing returns
const MAX_ITERATIONS: u32 = 200;

/// Everything that needs a live window
struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    buffers: CanvasBuffers,
    pipeline: CanvasPipeline,
}

impl Graphics {
    fn new(window: Arc<Window>, canvas: &TileCanvas) -> Result<Self, GpuError> {
        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;

        let buffers = CanvasBuffers::new(&gpu.device, canvas.size());
        let pipeline = CanvasPipeline::new(&gpu.device, gpu.format());

        Ok(Self {
            window,
            gpu,
            buffers,
            pipeline,
        })
    }

    /// Upload the canvas if it changed and present one frame
    fn present(&mut self, canvas: &mut TileCanvas) {
        let gpu = &self.gpu;
        if canvas.take_dirty() {
            self.buffers.upload(&gpu.device, &gpu.queue, canvas);
        }
        self.buffers.update_params(&gpu.queue, gpu.surface_size());

        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let bind_group = self.pipeline.create_bind_group(
            &gpu.device,
            &self.buffers.pixels_buffer,
            &self.buffers.params_buffer,
        );
        self.pipeline.draw(&mut encoder, &view, &bind_group);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Application state: the canvas, the active pass and the controls that shape it
pub struct App {
    graphics: Option<Graphics>,
    canvas: TileCanvas,
    slot: PassSlot,
    pass: Option<SteppingLoop<PrimeRule>>,
    params: PassParams,
    options: RuleOptions,
    /// Last index the colour rule saw; survives across passes like the on-screen readout
    biggest_prime: u64,
    fps_counter: FpsCounter,
    last_fps: f64,
}

impl App {
    pub fn new() -> Self {
        let params = PassParams::default();
        let options = RuleOptions {
            iterations: params.iterations,
            ..RuleOptions::default()
        };
        Self {
            graphics: None,
            canvas: TileCanvas::new(params.width.round() as u32),
            slot: PassSlot::new(),
            pass: None,
            params,
            options,
            biggest_prime: 2,
            fps_counter: FpsCounter::new(),
            last_fps: 0.0,
        }
    }

    /// Clear the canvas and start a pass that supersedes whatever was running
    fn restart_pass(&mut self) {
        self.options.iterations = self.params.iterations;
        self.canvas.reset(self.params.width.round() as u32);

        let token = self.slot.begin();
        let rule = PrimeRule::from_entropy(self.options);
        match SteppingLoop::start(self.params, rule, token) {
            Ok(pass) => {
                log::info!(
                    "Drawing {} cells: canvas {} tile {} iterations {}{}",
                    pass.num_cells(),
                    self.params.width,
                    self.params.tile_size,
                    self.params.iterations,
                    if self.options.show_random { " (random)" } else { "" }
                );
                self.pass = Some(pass);
            }
            Err(e) => {
                log::warn!("Not starting pass: {}", e);
                self.pass = None;
            }
        }
        self.refresh_title();
        self.request_redraw();
    }

    /// Swap in new parameters if they are usable, then restart
    fn apply_params(&mut self, params: PassParams) {
        if params == self.params {
            return;
        }
        if let Err(e) = params.validate() {
            log::warn!("Ignoring parameter change: {}", e);
            return;
        }
        self.params = params;
        self.restart_pass();
    }

    /// Spend this frame's time slice on the active pass
    fn advance_pass(&mut self) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };

        let mut budget = TimeBudget::new(FRAME_BUDGET);
        let step = pass.resume(&mut self.canvas, &mut budget);
        if let Some(index) = pass.rule().largest_marked() {
            self.biggest_prime = index;
        }

        match step {
            Step::Done => {
                log::info!(
                    "Spiral complete: {} cells, biggest prime seen {}",
                    pass.num_cells(),
                    self.biggest_prime
                );
            }
            Step::Superseded => log::debug!("Dropping superseded pass"),
            Step::Yield | Step::Continue => {}
        }

        if pass.state().is_terminal() {
            self.pass = None;
            self.refresh_title();
        }
    }

    fn refresh_title(&self) {
        let Some(graphics) = &self.graphics else {
            return;
        };
        let progress = match &self.pass {
            Some(pass) if pass.state() != PassState::Completed => {
                format!("{:.0}%", pass.progress() * 100.0)
            }
            _ => "done".to_string(),
        };
        graphics.window.set_title(&format!(
            "Prime Spiral - k={} tile={} canvas={} - {} - biggest prime seen: {} - {:.0} FPS",
            self.params.iterations,
            self.params.tile_size,
            self.params.width,
            progress,
            self.biggest_prime,
            self.last_fps
        ));
    }

    fn request_redraw(&self) {
        if let Some(graphics) = &self.graphics {
            graphics.window.request_redraw();
        }
    }

    fn render(&mut self) {
        self.advance_pass();

        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };
        graphics.present(&mut self.canvas);

        if let Some(fps) = self.fps_counter.tick() {
            self.last_fps = fps;
            self.refresh_title();
        }
        // Keep frames coming only while there is work left
        if self.pass.is_some() {
            self.request_redraw();
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        let mut params = self.params;
        match key_code {
            // Iterations (Up/Down)
            KeyCode::ArrowUp => {
                params.iterations = (params.iterations + 1).min(MAX_ITERATIONS);
            }
            KeyCode::ArrowDown => {
                params.iterations = params.iterations.saturating_sub(1).max(1);
            }

            // Tile size ([ / ])
            KeyCode::BracketLeft => {
                params.tile_size = (params.tile_size / 2.0).max(MIN_TILE_SIZE);
            }
            KeyCode::BracketRight => {
                params.tile_size = (params.tile_size * 2.0).min(params.width.max(MIN_TILE_SIZE));
            }

            // Canvas size (- / =)
            KeyCode::Minus => {
                params.width = (params.width - CANVAS_WIDTH_STEP).max(MIN_CANVAS_WIDTH);
            }
            KeyCode::Equal => {
                params.width = (params.width + CANVAS_WIDTH_STEP).min(MAX_CANVAS_WIDTH);
            }

            KeyCode::Space => {
                self.options.show_random = !self.options.show_random;
                log::info!("Random mode: {}", if self.options.show_random { "ON" } else { "OFF" });
                self.restart_pass();
                return;
            }
            KeyCode::KeyF => {
                self.options.false_primes_only = !self.options.false_primes_only;
                log::info!(
                    "False primes only: {}",
                    if self.options.false_primes_only { "ON" } else { "OFF" }
                );
                self.restart_pass();
                return;
            }
            KeyCode::KeyH => {
                self.options.highlight_false_primes = !self.options.highlight_false_primes;
                log::info!(
                    "Highlight false primes: {}",
                    if self.options.highlight_false_primes { "ON" } else { "OFF" }
                );
                self.restart_pass();
                return;
            }
            KeyCode::KeyR => {
                log::info!("Redrawing spiral");
                self.restart_pass();
                return;
            }

            _ => return,
        }
        self.apply_params(params);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }

        log::info!("Initializing prime spiral viewer...");

        let window_attrs = Window::default_attributes()
            .with_title("Prime Spiral - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match Graphics::new(window, &self.canvas) {
            Ok(graphics) => self.graphics = Some(graphics),
            Err(e) => {
                log::error!("GPU initialization failed: {}", e);
                event_loop.exit();
                return;
            }
        }

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Up/Down: Miller-Rabin iterations");
        log::info!("  [/]: Tile size");
        log::info!("  -/=: Canvas size");
        log::info!("  Space: Toggle random mode");
        log::info!("  F: Toggle false primes only");
        log::info!("  H: Toggle false prime highlighting");
        log::info!("  R: Redraw");
        log::info!("  Escape: Quit");

        self.restart_pass();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                self.slot.cancel();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            self.slot.cancel();
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(graphics) = &mut self.graphics {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    graphics.gpu.resize(new_size);
                    graphics.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }
}

/// Frame rate sampled once per second
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}
