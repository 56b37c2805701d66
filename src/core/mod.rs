use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{LaunchMode, SimConfig},
    error::{Result, SimError},
    types::{accumulate, Body, SimStats, Vec3},
};

/// Owns the body population and advances it one step at a time.
///
/// The driver calls [`Simulation::advance`] once per tick and reads
/// [`Simulation::bodies`] to render. Nothing else holds on to the bodies.
pub struct Simulation {
    config: SimConfig,
    bodies: Vec<Body>,
    rng: StdRng,
    steps: u64,
    sim_time: f32,
    collisions_last_step: usize,
    collisions_total: u64,
}

impl Simulation {
    /// Builds a simulation and populates it with [`Simulation::reset`].
    ///
    /// `config` is expected to have passed [`SimConfig::validate`].
    pub fn new(config: SimConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let mut sim = Self {
            bodies: Vec::with_capacity(config.population),
            config,
            rng,
            steps: 0,
            sim_time: 0.0,
            collisions_last_step: 0,
            collisions_total: 0,
        };
        sim.reset();
        sim
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Discards every body and respawns the startup layout.
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.steps = 0;
        self.sim_time = 0.0;
        self.collisions_last_step = 0;
        self.collisions_total = 0;

        let offset = self.config.spawn_offset() as f32;
        let height = self.config.spawn_height;
        let gravity = self.gravity();
        for i in 0..self.config.population {
            let launch_speed = self.launch_speed();
            self.bodies.push(Body {
                position: Vec3::new(i as f32 - offset, height, 0.0),
                velocity: Vec3::new(0.0, launch_speed, 0.0),
                acceleration: gravity,
                mass: self.config.body_mass,
            });
        }
    }

    /// One physics step. `dt` must be finite and non-negative; nothing here
    /// checks it, so NaN or infinite input poisons every later step.
    /// Use [`Simulation::try_advance`] when the caller cannot guarantee it.
    pub fn advance(&mut self, dt: f32) {
        let gravity = self.gravity();
        let mut collisions = 0;

        for i in 0..self.bodies.len() {
            collisions += self.resolve_collisions_for(i);

            let body = &mut self.bodies[i];
            body.acceleration = gravity;
            integrate(body, dt);
            self.wrap(i);
        }

        self.steps += 1;
        self.sim_time += dt;
        self.collisions_last_step = collisions;
        self.collisions_total += collisions as u64;
    }

    /// Same as [`Simulation::advance`] but refuses negative or non-finite `dt`
    /// without touching any state.
    pub fn try_advance(&mut self, dt: f32) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidInput { dt });
        }
        self.advance(dt);
        Ok(())
    }

    pub fn stats(&self) -> SimStats {
        let mut stats = SimStats {
            body_count: self.bodies.len(),
            steps: self.steps,
            sim_time: self.sim_time,
            collisions_last_step: self.collisions_last_step,
            collisions_total: self.collisions_total,
            ..SimStats::default()
        };
        for body in &self.bodies {
            stats.momentum = stats.momentum + body.velocity.xy() * body.mass;
            stats.kinetic_energy += body.kinetic_energy();
        }
        stats
    }

    fn gravity(&self) -> Vec3 {
        Vec3::new(0.0, -self.config.gravity, 0.0)
    }

    fn launch_speed(&mut self) -> f32 {
        match self.config.launch {
            LaunchMode::Fixed => self.config.launch_speed,
            LaunchMode::Random => self
                .rng
                .gen_range(self.config.launch_speed_min..self.config.launch_speed_max),
        }
    }

    /// Scans pairs `(i, j)` with `j > i` in ascending order and resolves each
    /// touching pair immediately, so later pairs see the updated velocities.
    fn resolve_collisions_for(&mut self, i: usize) -> usize {
        let radius = self.config.collision_radius;
        let mut count = 0;
        for j in (i + 1)..self.bodies.len() {
            let (left, right) = self.bodies.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            let dist = (a.position.xy() - b.position.xy()).length();
            if dist < radius {
                resolve_pair(a, b);
                count += 1;
            }
        }
        count
    }

    fn wrap(&mut self, i: usize) {
        let half_w = self.config.arena_half_width;
        let half_h = self.config.arena_half_height;
        let pos = &mut self.bodies[i].position;

        if pos.y < -half_h {
            pos.y = half_h;
        } else if pos.y > half_h {
            pos.y = -half_h;
        }

        if pos.x < -half_w {
            pos.x = half_w;
        } else if pos.x > half_w {
            pos.x = -half_w;
        }
    }
}

/// Two-body impulse exchange in the plane.
///
/// The normal is half the separation vector, not a unit vector, so the
/// impulse shrinks as the bodies get closer. Both bodies leave with `z = 0`.
pub fn resolve_pair(a: &mut Body, b: &mut Body) {
    let n = (b.position.xy() - a.position.xy()) * 0.5;
    let va = a.velocity.xy();
    let vb = b.velocity.xy();
    let p = 2.0 * (va.dot(n) - vb.dot(n)) / (a.mass + b.mass);

    a.velocity = Vec3::from_xy(va - n * (p * a.mass));
    b.velocity = Vec3::from_xy(vb + n * (p * b.mass));
}

/// Trapezoidal step: position advances with the mean of the velocity before
/// and after applying this step's acceleration.
pub fn integrate(body: &mut Body, dt: f32) {
    let v_before = body.velocity;
    accumulate(&mut body.velocity, body.acceleration, dt);
    let v_after = body.velocity;
    let v_avg = (v_after + v_before) * 0.5;
    accumulate(&mut body.position, v_avg, dt);
}
