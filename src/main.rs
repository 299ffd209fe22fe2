mod app;
mod gpu;

use winit::event_loop::{ControlFlow, EventLoop};

use app::App;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;
    // Frames are requested only while a pass still has cells left
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    log::info!("Goodbye");
    Ok(())
}
