use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use control_protocol::ControlMessage;
use graph_model::PresentMode;
use graph_renderer::SurfaceSize;
use presentscope::LoopRenderer;
use presentscope::config::{AppConfig, Cli};
use presentscope::gpu::create_renderer;
use presentscope::keymap::message_for_key;
use render_loop::RenderLoop;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

/// How often the UI thread checks whether the render thread has died.
const RENDER_LOOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    surface_size: Option<SurfaceSize>,
    render_loop: Option<RenderLoop>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            surface_size: None,
            render_loop: None,
            failure: None,
        }
    }

    fn window_id(&self) -> Option<WindowId> {
        self.window.as_ref().map(|w| w.id())
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Arc::new(
            event_loop
                .create_window(
                    WindowAttributes::default()
                        .with_title(self.config.window.title.clone())
                        .with_inner_size(PhysicalSize::new(
                            self.config.window.width,
                            self.config.window.height,
                        )),
                )
                .context("create window")?,
        );

        let size = window.inner_size();
        let surface_size = SurfaceSize::new(size.width, size.height);
        let renderer = pollster::block_on(create_renderer(
            window.clone(),
            self.config.graph_settings(),
            surface_size.clone(),
        ))
        .context("initialize renderer")?;
        let render_loop = RenderLoop::start(
            LoopRenderer(renderer),
            self.config.presentation_config(),
        )
        .context("start render loop")?;

        self.window = Some(window);
        self.surface_size = Some(surface_size);
        self.render_loop = Some(render_loop);
        Ok(())
    }

    fn post(&self, message: ControlMessage) {
        if let Some(render_loop) = &self.render_loop {
            render_loop.post_message(message);
        }
    }

    /// Stops the render loop, keeping its error for the exit status.
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(render_loop) = self.render_loop.take() {
            match render_loop.stop() {
                Ok(summary) => log::info!(
                    "[presentscope] {} frames, {} control messages",
                    summary.frames_rendered,
                    summary.messages_applied
                ),
                Err(error) => self.fail(anyhow!(error).context("render loop failed")),
            }
        }
        event_loop.exit();
    }

    fn fail(&mut self, error: anyhow::Error) {
        log::error!("[presentscope] {error:#}");
        self.failure.get_or_insert(error);
    }

    fn finish(self) -> Result<()> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(error) = self.start(event_loop) {
            self.fail(error);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window_id() != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shut_down(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(surface_size) = &self.surface_size {
                    surface_size.store(size.width, size.height);
                }
                self.post(ControlMessage::ResizeSurface {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let Some(message) = message_for_key(&event.logical_key) {
                    self.post(message);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self
            .render_loop
            .as_ref()
            .is_some_and(|render_loop| render_loop.is_finished())
        {
            self.shut_down(event_loop);
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            Instant::now() + RENDER_LOOP_CHECK_INTERVAL,
        ));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.resolve().context("load configuration")?;
    log::info!(
        "[presentscope] ring {} slots, window {}, p/v/t/s toggle, =/- zoom",
        config.graph.capacity,
        config.graph.initial_window
    );
    if config.presentation.present_mode == PresentMode::Scheduled {
        log::info!(
            "[presentscope] scheduled presents: latencies exclude waiting for the previous frame's present"
        );
    }

    let event_loop = EventLoop::new().context("create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("run event loop")?;
    app.finish()
}
