use std::io::Write;

use anyhow::Result;

use crate::{core::Simulation, ui::status_line};

/// Steps the simulation `steps` times with a fixed `dt`, then writes one
/// `index x y vx vy` row per body followed by the status line.
pub fn run(sim: &mut Simulation, steps: u64, dt: f32, out: &mut impl Write) -> Result<()> {
    for _ in 0..steps {
        sim.try_advance(dt)?;
    }

    for (i, body) in sim.bodies().iter().enumerate() {
        writeln!(
            out,
            "{i} {:.6} {:.6} {:.6} {:.6}",
            body.position.x, body.position.y, body.velocity.x, body.velocity.y
        )?;
    }
    writeln!(out, "{}", status_line(&sim.stats()))?;
    Ok(())
}
