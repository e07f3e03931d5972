use std::{env, str::FromStr};

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    /// Bodies created by each generator.
    pub particles: usize,
    /// Softening length of the gravity kernel.
    pub epsilon: f32,
    pub time_step: f32,
    pub steps_per_call: u32,
    /// Mass rendered at full brightness.
    pub max_mass: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            particles: 5000,
            epsilon: 50.0,
            time_step: 0.1,
            steps_per_call: 1,
            max_mass: 1.0,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        fn read<T>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
            target: &mut T,
        ) -> anyhow::Result<()>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            if let Some(value) = lookup(key) {
                *target = value.trim().parse().with_context(|| {
                    format!("invalid value for {key}: {value:?}")
                })?;
            }
            Ok(())
        }

        let mut config = Self::default();
        read(&lookup, "NBODY_WIDTH", &mut config.width)?;
        read(&lookup, "NBODY_HEIGHT", &mut config.height)?;
        read(&lookup, "NBODY_PARTICLES", &mut config.particles)?;
        read(&lookup, "NBODY_EPSILON", &mut config.epsilon)?;
        read(&lookup, "NBODY_TIME_STEP", &mut config.time_step)?;
        read(&lookup, "NBODY_STEPS_PER_CALL", &mut config.steps_per_call)?;
        read(&lookup, "NBODY_MAX_MASS", &mut config.max_mass)?;

        if config.width == 0 || config.height == 0 {
            anyhow::bail!(
                "window size must not be zero, got {}x{}",
                config.width,
                config.height
            );
        }

        Ok(config)
    }
}
