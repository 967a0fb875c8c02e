//! Windowed host that feeds device events to the session and drives frames

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::core::Time;
use crate::core::app::App;
use crate::input::{GamepadBackend, InputEvent};

/// Window configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("poolvr"),
            width: 1280,
            height: 720,
        }
    }
}

impl EngineConfig {
    /// Set the window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set window dimensions
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Owns the window, the gamepad backend and the session.
pub struct Engine {
    config: EngineConfig,
    app: App,
    gamepads: Box<dyn GamepadBackend>,
    window: Option<Arc<Window>>,
    time: Time,
}

impl Engine {
    pub fn new(config: EngineConfig, app: App, gamepads: Box<dyn GamepadBackend>) -> Self {
        Self {
            config,
            app,
            gamepads,
            window: None,
            time: Time::new(),
        }
    }

    /// Run until the window closes
    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::info!("Starting {}", self.config.title);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        Ok(())
    }

    /// The session being driven
    pub fn app(&self) -> &App {
        &self.app
    }
}

impl ApplicationHandler for Engine {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));

        match event_loop.create_window(window_attrs) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        }

        self.app.start();
        self.time = Time::new();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.app.input_queue().push(InputEvent::Key {
                        key,
                        pressed: event.state.is_pressed(),
                    });
                }
            }

            WindowEvent::Focused(false) => {
                self.app.input_queue().push(InputEvent::FocusLost);
            }

            WindowEvent::RedrawRequested => {
                self.time.update();
                self.app.frame(self.time.delta_seconds());

                if self.time.frame() % 600 == 0 {
                    log::debug!(
                        "frame {} at {:.1}s",
                        self.time.frame(),
                        self.time.elapsed_seconds()
                    );
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let queue = self.app.input_queue();
        self.gamepads.poll(&mut |event| queue.push(event));

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
