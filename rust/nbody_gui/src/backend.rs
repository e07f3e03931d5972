use std::iter::once;

use cgmath::{InnerSpace, Matrix3, Vector3, Zero};
use rayon::prelude::*;

use crate::{
    particles::ParticleSet,
    state::Attractor,
    view::{Camera, Viewport},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub steps: u32,
    pub epsilon: f32,
    pub time_step: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
    pub camera: Camera,
    pub max_mass: f32,
}

/// Simulation and rasterization used by the viewer loop.
pub trait Backend {
    /// Advances every body `params.steps` times. The attractor pulls on the
    /// bodies but isn't moved. A zero time step leaves positions and
    /// velocities untouched.
    fn step(
        &self,
        particles: &mut ParticleSet,
        attractor: &Attractor,
        params: StepParams,
    );

    /// Returns a `width * height` row-major 0RGB buffer.
    fn render(
        &self,
        particles: &ParticleSet,
        attractor: &Attractor,
        params: &RenderParams,
    ) -> Vec<u32>;
}

/// All-pairs softened gravity, parallel over bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    fn plot(
        params: &RenderParams,
        rotation: &Matrix3<f32>,
        position: Vector3<f32>,
        mass: f32,
    ) -> Option<(usize, u32)> {
        let RenderParams {
            viewport,
            width,
            height,
            max_mass,
            ..
        } = *params;
        let rotated = *rotation * position;
        if !viewport.contains(rotated.x, rotated.y) {
            return None;
        }

        let (span_x, span_y) = viewport.span();
        let x = (rotated.x - viewport.x_ul) / span_x;
        let y = (rotated.y - viewport.y_ul) / span_y;
        let px = (width as f32 * x) as usize;
        let py = (height as f32 * y) as usize;
        if px >= width as usize || py >= height as usize {
            return None;
        }

        Some((py * width as usize + px, grey(mass, max_mass)))
    }
}

fn grey(mass: f32, max_mass: f32) -> u32 {
    let intensity = if mass >= max_mass {
        255
    } else {
        (128.0 + mass / max_mass * 128.0).clamp(0.0, 255.0) as u32
    };
    (intensity << 16) | (intensity << 8) | intensity
}

impl Backend for CpuBackend {
    fn step(
        &self,
        particles: &mut ParticleSet,
        attractor: &Attractor,
        StepParams {
            steps,
            epsilon,
            time_step,
        }: StepParams,
    ) {
        let epsilon2 = epsilon * epsilon;
        for _ in 0..steps {
            let sources = particles
                .positions()
                .iter()
                .copied()
                .zip(particles.masses().iter().copied())
                .chain(once((attractor.position, attractor.mass)))
                .collect::<Vec<_>>();

            let (positions, velocities, accelerations) =
                particles.kinematics_mut();

            accelerations
                .par_iter_mut()
                .zip(positions.par_iter())
                .for_each(|(acc, &pos)| {
                    *acc = sources.iter().fold(
                        Vector3::zero(),
                        |sum, &(other, mass)| {
                            let r = other - pos;
                            let inv_dist =
                                1.0 / (r.magnitude2() + epsilon2).sqrt();
                            sum + r * (mass * inv_dist * inv_dist * inv_dist)
                        },
                    );
                });

            positions
                .par_iter_mut()
                .zip(velocities.par_iter_mut())
                .zip(accelerations.par_iter())
                .for_each(|((pos, vel), &acc)| {
                    *pos += *vel * time_step;
                    *vel += acc * time_step;
                });
        }
    }

    fn render(
        &self,
        particles: &ParticleSet,
        attractor: &Attractor,
        params: &RenderParams,
    ) -> Vec<u32> {
        let rotation = params.camera.matrix();
        let mut frame =
            vec![0_u32; params.width as usize * params.height as usize];

        let plotted = particles
            .positions()
            .par_iter()
            .zip(particles.masses().par_iter())
            .filter_map(|(&pos, &mass)| {
                Self::plot(params, &rotation, pos, mass)
            })
            .collect::<Vec<_>>();

        let attractor = attractor
            .active
            .then(|| {
                Self::plot(
                    params,
                    &rotation,
                    attractor.position,
                    attractor.mass,
                )
            })
            .flatten();

        for (idx, color) in plotted.into_iter().chain(attractor) {
            frame[idx] = color;
        }

        frame
    }
}
