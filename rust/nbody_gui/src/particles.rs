use std::f32::consts::{FRAC_PI_2, TAU};

use cgmath::{vec3, Vector3, Zero};
use rand::Rng;
use rand_distr::StandardNormal;

pub const BLOB_SIZE: usize = 100;

/// Bodies stored as index aligned parallel arrays. Only the methods here can
/// change the number of bodies, so all arrays always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSet {
    positions: Vec<Vector3<f32>>,
    masses: Vec<f32>,
    velocities: Vec<Vector3<f32>>,
    accelerations: Vec<Vector3<f32>>,
}

impl ParticleSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            masses: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            accelerations: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        debug_assert!(self.is_aligned());
        self.positions.len()
    }

    #[allow(unused)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_aligned(&self) -> bool {
        let len = self.positions.len();
        self.masses.len() == len
            && self.velocities.len() == len
            && self.accelerations.len() == len
    }

    pub fn push(
        &mut self,
        position: Vector3<f32>,
        mass: f32,
        velocity: Vector3<f32>,
    ) {
        self.positions.push(position);
        self.masses.push(mass);
        self.velocities.push(velocity);
        self.accelerations.push(Vector3::zero());
    }

    pub fn append(&mut self, other: &mut ParticleSet) {
        self.positions.append(&mut other.positions);
        self.masses.append(&mut other.masses);
        self.velocities.append(&mut other.velocities);
        self.accelerations.append(&mut other.accelerations);
    }

    #[allow(unused)]
    pub fn clear(&mut self) {
        self.positions.clear();
        self.masses.clear();
        self.velocities.clear();
        self.accelerations.clear();
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        &self.positions
    }

    pub fn masses(&self) -> &[f32] {
        &self.masses
    }

    #[allow(unused)]
    pub fn velocities(&self) -> &[Vector3<f32>] {
        &self.velocities
    }

    #[allow(unused)]
    pub fn accelerations(&self) -> &[Vector3<f32>] {
        &self.accelerations
    }

    /// (positions, velocities, accelerations) for the integrator. Slices,
    /// so the length can't change through them.
    pub fn kinematics_mut(
        &mut self,
    ) -> (
        &mut [Vector3<f32>],
        &mut [Vector3<f32>],
        &mut [Vector3<f32>],
    ) {
        (
            &mut self.positions,
            &mut self.velocities,
            &mut self.accelerations,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    Cluster,
    Orbit,
    Donut,
}

impl Generator {
    pub fn generate(
        self,
        rng: &mut impl Rng,
        count: usize,
        (width, height): (f32, f32),
    ) -> ParticleSet {
        let mut set = ParticleSet::with_capacity(count);
        for _ in 0..count {
            let (position, velocity) = match self {
                Generator::Cluster => (
                    vec3(
                        normal(rng, width / 5.0),
                        normal(rng, height / 5.0),
                        normal(rng, height / 5.0),
                    ),
                    Vector3::zero(),
                ),
                Generator::Orbit => {
                    let x = normal(rng, width / 10.0);
                    (
                        vec3(
                            x,
                            normal(rng, height / 200.0) * (x / 100.0),
                            normal(rng, height / 200.0) * (x / 10.0),
                        ),
                        vec3(0.0, x / width * 10.0, 0.0),
                    )
                }
                Generator::Donut => {
                    let side = width.min(height);
                    let angle = rng.gen::<f32>() * TAU;
                    let offset = normal(rng, 1.0);
                    let radius = offset * side / 10.0 + side / 2.0;
                    let spin = 2.0 * offset.abs();
                    (
                        vec3(
                            radius * angle.sin(),
                            radius * angle.cos(),
                            rng.gen::<f32>() * width / 10.0,
                        ),
                        vec3(
                            (angle - FRAC_PI_2).sin() * spin,
                            (angle - FRAC_PI_2).cos() * spin,
                            0.0,
                        ),
                    )
                }
            };
            set.push(position, rng.gen(), velocity);
        }
        set
    }
}

/// A small ball of resting bodies around `center`.
pub fn blob(
    rng: &mut impl Rng,
    center: Vector3<f32>,
    (width, height): (f32, f32),
) -> ParticleSet {
    let max_len = width.min(height) / 100.0;
    let mut set = ParticleSet::with_capacity(BLOB_SIZE);
    for _ in 0..BLOB_SIZE {
        let angle = rng.gen::<f32>() * TAU;
        let z_angle = rng.gen::<f32>() * TAU;
        let len = rng.gen::<f32>() * max_len;
        let offset =
            vec3(len * angle.cos(), len * angle.sin(), len * z_angle.sin());
        set.push(center + offset, rng.gen(), Vector3::zero());
    }
    set
}

fn normal(rng: &mut impl Rng, scale: f32) -> f32 {
    rng.sample::<f32, _>(StandardNormal) * scale
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    const SIZE: (f32, f32) = (800.0, 600.0);

    #[test]
    fn generators_produce_requested_count() {
        let mut rng = SmallRng::seed_from_u64(0);
        for generator in
            [Generator::Cluster, Generator::Orbit, Generator::Donut]
        {
            for count in [0, 1, 257] {
                let set = generator.generate(&mut rng, count, SIZE);
                assert_eq!(set.len(), count);
                assert!(set.is_aligned());
                assert_eq!(set.masses().len(), count);
                assert_eq!(set.velocities().len(), count);
                assert_eq!(set.accelerations().len(), count);
                assert!(set.masses().iter().all(|m| (0.0..1.0).contains(m)));
                assert!(set
                    .accelerations()
                    .iter()
                    .all(|a| *a == Vector3::zero()));
            }
        }
    }

    #[test]
    fn cluster_is_at_rest() {
        let mut rng = SmallRng::seed_from_u64(1);
        let set = Generator::Cluster.generate(&mut rng, 100, SIZE);
        assert!(set.velocities().iter().all(|v| *v == Vector3::zero()));
    }

    #[test]
    fn orbit_velocity_follows_x() {
        let mut rng = SmallRng::seed_from_u64(2);
        let set = Generator::Orbit.generate(&mut rng, 100, SIZE);
        for (pos, vel) in set.positions().iter().zip(set.velocities()) {
            assert_eq!(vel.y, pos.x / SIZE.0 * 10.0);
            assert_eq!(vel.x, 0.0);
            assert_eq!(vel.z, 0.0);
        }
    }

    #[test]
    fn donut_spins_tangentially() {
        let mut rng = SmallRng::seed_from_u64(3);
        let set = Generator::Donut.generate(&mut rng, 100, SIZE);
        for (pos, vel) in set.positions().iter().zip(set.velocities()) {
            assert!((0.0..SIZE.0 / 10.0).contains(&pos.z));
            let radial = vec3(pos.x, pos.y, 0.0);
            assert!(radial.dot(*vel).abs() <= 1e-3 * radial.magnitude().max(1.0));
        }
    }

    #[test]
    fn blob_appends_exactly() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut set = Generator::Cluster.generate(&mut rng, 10, SIZE);
        let center = vec3(100.0, -50.0, 3.0);
        let mut blob = blob(&mut rng, center, SIZE);
        assert_eq!(blob.len(), BLOB_SIZE);
        for pos in blob.positions() {
            assert!((pos - center).magnitude() <= SIZE.1 / 100.0 * 1.5);
        }

        set.append(&mut blob);
        assert_eq!(set.len(), 10 + BLOB_SIZE);
        assert!(set.is_aligned());
        assert!(blob.is_empty());
    }

    #[test]
    fn clear_keeps_alignment() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut set = Generator::Donut.generate(&mut rng, 10, SIZE);
        set.clear();
        assert!(set.is_empty());
        assert!(set.is_aligned());
    }
}
