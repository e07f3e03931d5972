use cgmath::{vec3, Vector3};
use rand::rngs::SmallRng;
use tracing::info;

use crate::{
    backend::{Backend, RenderParams, StepParams},
    config::ViewerConfig,
    input::{InputEvent, Key, MouseButton},
    particles::{self, Generator, ParticleSet},
    view::{Camera, Viewport},
};

/// Movement keys held with the precision modifier fire this many times.
pub const PRECISION_REPEATS: usize = 5;
pub const CLOCK_TICK: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStep {
    current: f32,
    /// Restored when unpausing.
    default: f32,
}

impl TimeStep {
    pub const INCREMENT: f32 = 0.01;

    pub fn new(default: f32) -> Self {
        Self {
            current: default,
            default,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn is_paused(&self) -> bool {
        self.current == 0.0
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.current = self.default;
        } else {
            self.default = self.current;
            self.current = 0.0;
        }
    }

    pub fn increase(&mut self) {
        self.current += Self::INCREMENT;
    }

    pub fn decrease(&mut self) {
        self.current -= Self::INCREMENT;
    }
}

/// Heavy body following the cursor while the secondary button is held.
/// Parked in the corner of the viewport with a negligible mass otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    pub position: Vector3<f32>,
    pub mass: f32,
    pub active: bool,
}

impl Attractor {
    pub const ACTIVE_MASS: f32 = 10000.0;
    pub const PARKED_MASS: f32 = 0.0001;

    pub fn parked(viewport: &Viewport) -> Self {
        Self {
            position: vec3(viewport.x_br, viewport.y_br, 0.0),
            mass: Self::PARKED_MASS,
            active: false,
        }
    }

    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            mass: Self::ACTIVE_MASS,
            active: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerState {
    pub particles: ParticleSet,
    pub attractor: Attractor,
    pub camera: Camera,
    pub viewport: Viewport,
    pub time_step: TimeStep,
    /// Secondary mouse button held.
    pub mass_active: bool,
    pub cursor: Option<(f32, f32)>,
    pub display: (u32, u32),
    pub curtime: f64,

    particle_count: usize,
    epsilon: f32,
    steps_per_call: u32,
    max_mass: f32,
    rng: SmallRng,
}

impl ViewerState {
    pub fn new(config: &ViewerConfig, mut rng: SmallRng) -> Self {
        let display = (config.width, config.height);
        let viewport = Viewport::centered(display);
        let particles = Generator::Cluster.generate(
            &mut rng,
            config.particles,
            display_f32(display),
        );

        Self {
            particles,
            attractor: Attractor::parked(&viewport),
            camera: Camera::default(),
            viewport,
            time_step: TimeStep::new(config.time_step),
            mass_active: false,
            cursor: None,
            display,
            curtime: 0.0,

            particle_count: config.particles,
            epsilon: config.epsilon,
            steps_per_call: config.steps_per_call,
            max_mass: config.max_mass,
            rng,
        }
    }

    pub fn step_params(&self) -> StepParams {
        StepParams {
            steps: self.steps_per_call,
            epsilon: self.epsilon,
            time_step: self.time_step.current(),
        }
    }

    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            viewport: self.viewport,
            width: self.display.0,
            height: self.display.1,
            camera: self.camera,
            max_mass: self.max_mass,
        }
    }

    /// Runs one simulation step on `backend` and renders the result.
    pub fn advance(&mut self, backend: &impl Backend) -> Vec<u32> {
        let params = self.step_params();
        backend.step(&mut self.particles, &self.attractor, params);
        backend.render(&self.particles, &self.attractor, &self.render_params())
    }

    pub fn tick_clock(&mut self) {
        self.curtime += CLOCK_TICK;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.display = (width, height);
    }

    pub fn reseed(&mut self, generator: Generator) {
        self.particles = generator.generate(
            &mut self.rng,
            self.particle_count,
            display_f32(self.display),
        );
        info!("reseeded {} bodies with {generator:?}", self.particles.len());
    }

    pub fn reset_view(&mut self) {
        self.camera = Camera::default();
        self.viewport = Viewport::centered(self.display);
        info!("view reset");
    }

    pub fn cursor_world(&self) -> Option<Vector3<f32>> {
        self.cursor.map(|cursor| {
            self.viewport
                .screen_to_world(cursor, self.display, &self.camera)
        })
    }

    pub fn inject_blob(&mut self) {
        let Some(center) = self.cursor_world() else {
            return;
        };
        let mut blob =
            particles::blob(&mut self.rng, center, display_f32(self.display));
        self.particles.append(&mut blob);
        info!(
            "injected blob at ({:.1}, {:.1}, {:.1}), N={}",
            center.x,
            center.y,
            center.z,
            self.particles.len()
        );
    }

    /// Called once per frame after the input queue is drained.
    pub fn update_attractor(&mut self) {
        self.attractor = match self.cursor_world() {
            Some(position) if self.mass_active => Attractor::at(position),
            _ => Attractor::parked(&self.viewport),
        };
    }

    pub fn apply_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown { key, modifiers } => {
                let repeats = if modifiers.precision {
                    PRECISION_REPEATS
                } else {
                    1
                };
                for _ in 0..repeats {
                    self.apply_movement(key, modifiers.rotate);
                }

                match key {
                    Key::Char('c') => {
                        self.particle_count = 1;
                        self.reseed(Generator::Cluster);
                    }
                    Key::Char('r') => self.reseed(Generator::Cluster),
                    Key::Char('o') => self.reseed(Generator::Orbit),
                    Key::Char('d') => self.reseed(Generator::Donut),
                    Key::Char('q') => self.time_step.decrease(),
                    Key::Char('w') => self.time_step.increase(),
                    _ => {}
                }
            }
            InputEvent::KeyUp { key } => match key {
                Key::Space => {
                    self.time_step.toggle_pause();
                    info!(
                        "paused: {}, time step: {}",
                        self.time_step.is_paused(),
                        self.time_step.current()
                    );
                }
                Key::Home => self.reset_view(),
                _ => {}
            },
            InputEvent::MouseDown { button } => match button {
                MouseButton::Primary => self.inject_blob(),
                MouseButton::Secondary => self.mass_active = true,
            },
            InputEvent::MouseUp { button } => {
                if button == MouseButton::Secondary {
                    self.mass_active = false;
                }
            }
            InputEvent::CursorMoved { x, y } => self.cursor = Some((x, y)),
            InputEvent::CursorLeft => self.cursor = None,
        }
    }

    fn apply_movement(&mut self, key: Key, rotate: bool) {
        let step = Camera::ROTATION_STEP;
        match key {
            Key::Right if rotate => self.camera.y_rotation += step,
            Key::Left if rotate => self.camera.y_rotation -= step,
            Key::Up if rotate => self.camera.x_rotation += step,
            Key::Down if rotate => self.camera.x_rotation -= step,
            Key::Right => self.viewport.pan(1.0, 0.0),
            Key::Left => self.viewport.pan(-1.0, 0.0),
            Key::Up => self.viewport.pan(0.0, -1.0),
            Key::Down => self.viewport.pan(0.0, 1.0),
            Key::Char('+') => self.viewport.zoom_in(),
            Key::Char('-') => self.viewport.zoom_out(),
            _ => {}
        }
    }
}

fn display_f32((width, height): (u32, u32)) -> (f32, f32) {
    (width as f32, height as f32)
}
