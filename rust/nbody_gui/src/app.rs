use std::{collections::VecDeque, num::NonZeroU32, sync::Arc, time::Instant};

use anyhow::anyhow;
use rand::{rngs::SmallRng, SeedableRng};
use softbuffer::{Context, Surface};
use tracing::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

use self::overlay::WHITE;
use crate::{
    backend::CpuBackend,
    config::ViewerConfig,
    input::{InputEvent, Key, Modifiers, MouseButton},
    state::ViewerState,
};

pub mod overlay;

const TITLE: &str = "N-body";
const OVERLAY_POS: (usize, usize) = (10, 10);

#[derive(Debug)]
pub struct App {
    pub config: ViewerConfig,
    pub state: Option<AppState>,
    /// Set when the loop had to stop because of a failure.
    pub error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            state: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:?}");
        self.error = Some(err);
        self.state = None;
        event_loop.exit();
    }
}

pub struct AppState {
    pub window: Arc<Window>,
    pub surface: Surface<Arc<Window>, Arc<Window>>,

    pub backend: CpuBackend,
    pub viewer: ViewerState,

    /// Input received since the last frame, applied after presenting.
    pub pending: VecDeque<InputEvent>,
    pub modifiers: Modifiers,

    last_report: Instant,
    frame_count: u64,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("window", &self.window)
            .field("viewer", &self.viewer)
            .field("pending", &self.pending)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        event_loop: &ActiveEventLoop,
        config: &ViewerConfig,
    ) -> anyhow::Result<Self> {
        let window: Arc<Window> = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title(TITLE)
                    .with_inner_size(PhysicalSize::new(
                        config.width,
                        config.height,
                    )),
            )
            .map_err(|err| anyhow!("failed to create window: {err}"))?
            .into();
        let context = Context::new(window.clone()).map_err(|err| {
            anyhow!("failed to create softbuffer context: {err}")
        })?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| anyhow!("failed to create surface: {err}"))?;

        let mut viewer = ViewerState::new(config, SmallRng::from_entropy());
        let PhysicalSize { width, height } = window.inner_size();
        viewer.resize(width, height);

        let mut state = Self {
            window,
            surface,

            backend: CpuBackend,
            viewer,

            pending: VecDeque::new(),
            modifiers: Modifiers::default(),

            last_report: Instant::now(),
            frame_count: 0,
        };
        state.on_resize()?;

        Ok(state)
    }

    pub fn on_resize(&mut self) -> anyhow::Result<()> {
        let PhysicalSize { width, height } = self.window.inner_size();
        self.viewer.resize(width, height);

        // minimized, keep the old buffer until there is something to show
        let (Some(width), Some(height)) =
            (NonZeroU32::new(width), NonZeroU32::new(height))
        else {
            return Ok(());
        };
        self.surface
            .resize(width, height)
            .map_err(|err| anyhow!("failed to resize surface: {err}"))
    }

    /// One iteration of the viewer loop.
    pub fn frame(&mut self) -> anyhow::Result<()> {
        let (width, height) = self.viewer.display;
        if width == 0 || height == 0 {
            return Ok(());
        }

        self.viewer.tick_clock();

        let start = Instant::now();
        let pixels = self.viewer.advance(&self.backend);
        let step_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = Instant::now();
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|err| anyhow!("failed to get draw buffer: {err}"))?;
        let len = buffer.len().min(pixels.len());
        buffer[..len].copy_from_slice(&pixels[..len]);
        let blit_ms = start.elapsed().as_secs_f64() * 1000.0;

        let line = overlay::status_line(
            step_ms,
            blit_ms,
            self.viewer.particles.len(),
            &self.viewer.time_step,
        );
        overlay::draw_text(
            &mut buffer,
            (width as usize, height as usize),
            OVERLAY_POS,
            &line,
            WHITE,
        );
        buffer
            .present()
            .map_err(|err| anyhow!("failed to present frame: {err}"))?;

        while let Some(event) = self.pending.pop_front() {
            self.viewer.apply_event(event);
        }
        self.viewer.update_attractor();

        self.update_fps_counter();
        Ok(())
    }

    fn update_fps_counter(&mut self) {
        self.frame_count += 1;
        let elapsed = self.last_report.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            let fps = self.frame_count as f64 / elapsed;
            info!(
                "fps: {fps:.2}, frametime: {:.2}ms, N: {}, curtime: {:.3}",
                1000.0 / fps,
                self.viewer.particles.len(),
                self.viewer.curtime,
            );
            self.frame_count = 0;
            self.last_report = Instant::now();
        }
    }

    fn queue(&mut self, event: WindowEvent) {
        let input = match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = Modifiers::from_winit(modifiers.state());
                return;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let Some(key) = Key::from_winit(&event.logical_key) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => InputEvent::KeyDown {
                        key,
                        modifiers: self.modifiers,
                    },
                    ElementState::Released => InputEvent::KeyUp { key },
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = MouseButton::from_winit(button) else {
                    return;
                };
                match state {
                    ElementState::Pressed => InputEvent::MouseDown { button },
                    ElementState::Released => InputEvent::MouseUp { button },
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                }
            }
            WindowEvent::CursorLeft { .. } => InputEvent::CursorLeft,
            _ => return,
        };
        self.pending.push_back(input);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match AppState::new(event_loop, &self.config) {
            Ok(state) => {
                info!(
                    "window ready, {} bodies",
                    state.viewer.particles.len()
                );
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("WindowEvent::CloseRequested");
                self.state = None;
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                if let Err(err) = state.on_resize() {
                    self.fail(event_loop, err);
                    return;
                }
                state.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = state.frame() {
                    self.fail(event_loop, err);
                    return;
                }
                state.window.request_redraw();
            }
            event => state.queue(event),
        }
    }
}
