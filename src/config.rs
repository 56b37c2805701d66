use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{Result, SimError};

pub const SIM_HZ: f32 = 60.0;
pub const RENDER_HZ: f32 = 30.0;
pub const MAX_SIM_HZ: f32 = 10_000.0;
pub const MIN_RENDER_HZ: f32 = 1.0;
pub const MAX_RENDER_HZ: f32 = 1_000.0;
pub const DT: f32 = 1.0 / SIM_HZ;
pub const MAX_FRAME_DT: f32 = 0.25;

pub const POPULATION: usize = 6;
pub const BODY_MASS: f32 = 1.0;
pub const SPAWN_HEIGHT: f32 = -1.0;
pub const LAUNCH_SPEED: f32 = 5.0;
pub const LAUNCH_SPEED_MIN: f32 = 3.0;
pub const LAUNCH_SPEED_MAX: f32 = 7.0;

pub const GRAVITY: f32 = 9.8;

pub const COLLISION_RADIUS: f32 = 0.2;

pub const ARENA_HALF_WIDTH: f32 = 2.79;
pub const ARENA_HALF_HEIGHT: f32 = 2.0;

// Backdrop, world units.
pub const VIEW_HALF_WIDTH: f32 = 3.0;
pub const VIEW_HALF_HEIGHT: f32 = 2.0;
pub const WALL_INNER_X: f32 = 2.9;
pub const SUN_CENTER: (f32, f32) = (2.0, 1.5);
pub const SUN_RADIUS: f32 = 0.25;

pub const FAST_SPEED: f32 = 6.0;

/// How `reset()` picks each body's upward launch speed.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Every body gets `launch_speed`.
    #[default]
    Fixed,
    /// Uniform in `[launch_speed_min, launch_speed_max)`, seeded from `seed`.
    Random,
}

/// Runtime tunables. Every field is optional in the YAML file; anything
/// missing takes the reference value from the constants above.
///
/// ```yaml
/// population: 6
/// gravity: 9.8
/// collision_radius: 0.2
/// arena_half_width: 2.79
/// arena_half_height: 2.0
/// launch: random
/// seed: 7
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub population: usize,
    pub body_mass: f32,
    pub spawn_height: f32,
    pub launch: LaunchMode,
    pub launch_speed: f32,
    pub launch_speed_min: f32,
    pub launch_speed_max: f32,
    pub seed: u64,
    pub gravity: f32,
    pub collision_radius: f32,
    pub arena_half_width: f32,
    pub arena_half_height: f32,
    pub sim_hz: f32,
    pub render_hz: f32,
    pub max_frame_dt: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            population: POPULATION,
            body_mass: BODY_MASS,
            spawn_height: SPAWN_HEIGHT,
            launch: LaunchMode::Fixed,
            launch_speed: LAUNCH_SPEED,
            launch_speed_min: LAUNCH_SPEED_MIN,
            launch_speed_max: LAUNCH_SPEED_MAX,
            seed: 0,
            gravity: GRAVITY,
            collision_radius: COLLISION_RADIUS,
            arena_half_width: ARENA_HALF_WIDTH,
            arena_half_height: ARENA_HALF_HEIGHT,
            sim_hz: SIM_HZ,
            render_hz: RENDER_HZ,
            max_frame_dt: MAX_FRAME_DT,
        }
    }
}

impl SimConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(invalid("population must be at least 1"));
        }
        if !(self.body_mass.is_finite() && self.body_mass > 0.0) {
            return Err(invalid("body_mass must be positive and finite"));
        }
        if !(self.arena_half_width.is_finite() && self.arena_half_width > 0.0) {
            return Err(invalid("arena_half_width must be positive and finite"));
        }
        if !(self.arena_half_height.is_finite() && self.arena_half_height > 0.0) {
            return Err(invalid("arena_half_height must be positive and finite"));
        }
        if !(self.collision_radius.is_finite() && self.collision_radius >= 0.0) {
            return Err(invalid("collision_radius must be finite and not negative"));
        }
        if !self.gravity.is_finite() || !self.spawn_height.is_finite() {
            return Err(invalid("gravity and spawn_height must be finite"));
        }
        if !(self.sim_hz > 0.0 && self.sim_hz <= MAX_SIM_HZ) {
            return Err(invalid("sim_hz must be in (0, 10000]"));
        }
        if !(self.render_hz >= MIN_RENDER_HZ && self.render_hz <= MAX_RENDER_HZ) {
            return Err(invalid("render_hz must be in [1, 1000]"));
        }
        if !(self.max_frame_dt.is_finite() && self.max_frame_dt > 0.0) {
            return Err(invalid("max_frame_dt must be positive and finite"));
        }
        match self.launch {
            LaunchMode::Fixed if !self.launch_speed.is_finite() => {
                Err(invalid("launch_speed must be finite"))
            }
            LaunchMode::Random
                if !(self.launch_speed_min.is_finite()
                    && self.launch_speed_max.is_finite()
                    && self.launch_speed_min < self.launch_speed_max) =>
            {
                Err(invalid(
                    "launch_speed_min must be below launch_speed_max for random launch",
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn step_dt(&self) -> f32 {
        1.0 / self.sim_hz
    }

    /// Integer centring offset: body `i` spawns at `x = i - offset`.
    ///
    /// Odd populations match `i - floor(N / 2)`, and N = 6 matches the
    /// reference layout (-2..=3). Other even populations sit one unit further
    /// right than `i - floor(N / 2)` would place them, e.g. N = 4 spans -1..=2.
    pub fn spawn_offset(&self) -> usize {
        self.population.saturating_sub(1) / 2
    }
}

fn invalid(msg: &str) -> SimError {
    SimError::InvalidConfig(msg.to_string())
}
