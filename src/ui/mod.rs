use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::Result;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use crate::{
    config,
    core::Simulation,
    render,
    types::{ColorId, SimStats},
};

type Backend = CrosstermBackend<io::Stdout>;

const MAX_STEPS_PER_FRAME: u32 = 4096;

pub fn run(sim: Simulation) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = main_loop(&mut terminal, sim);
    shutdown_terminal(&mut terminal)?;
    result
}

fn main_loop(terminal: &mut Terminal<Backend>, mut sim: Simulation) -> Result<()> {
    let step_dt = sim.config().step_dt();
    let max_frame_dt = sim.config().max_frame_dt;
    let render_interval = Duration::try_from_secs_f32(1.0 / sim.config().render_hz)?;

    let mut ui_state = UiState::new();
    let mut clock = FrameClock::new(step_dt, max_frame_dt);
    let mut last_tick = Instant::now();
    let mut last_render = Instant::now();
    let mut sim_counter = 0_u32;
    let mut render_counter = 0_u32;
    let mut last_fps_sample = Instant::now();
    let mut sim_fps = 0.0_f32;
    let mut render_fps = 0.0_f32;

    loop {
        let now = Instant::now();
        let elapsed = (now - last_tick).as_secs_f32();
        last_tick = now;

        if !ui_state.paused {
            for _ in 0..clock.feed(elapsed) {
                sim.advance(step_dt);
                sim_counter += 1;
            }
        }

        while event::poll(Duration::from_millis(0))? {
            if let CrosstermEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') => {
                        sim.reset();
                        clock.clear();
                    }
                    KeyCode::Char('p') => {
                        ui_state.paused = !ui_state.paused;
                        clock.clear();
                    }
                    _ => {}
                }
            }
        }

        if last_render.elapsed() >= render_interval {
            let stats = sim.stats();
            if last_fps_sample.elapsed() >= Duration::from_secs(1) {
                let secs = last_fps_sample.elapsed().as_secs_f32();
                sim_fps = sim_counter as f32 / secs;
                render_fps = render_counter as f32 / secs;
                sim_counter = 0;
                render_counter = 0;
                last_fps_sample = Instant::now();
            }
            terminal.draw(|frame| {
                let size = frame.size();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(size);

                let header = Paragraph::new(format!(
                    "{} | sim fps: {:.1} | render fps: {:.1}",
                    status_line(&stats),
                    sim_fps,
                    render_fps
                ))
                .block(Block::default().borders(Borders::ALL).title("gravbox"));
                frame.render_widget(header, chunks[0]);

                let area = Block::default().borders(Borders::ALL).inner(chunks[1]);
                let viewport = render::Viewport {
                    width: area.width,
                    height: area.height,
                };
                let camera = render::Camera::fit(
                    viewport,
                    config::VIEW_HALF_WIDTH,
                    config::VIEW_HALF_HEIGHT,
                );
                render::draw(sim.bodies(), &camera, viewport, &mut ui_state.framebuf);

                let framebuf = &ui_state.framebuf;
                let lines: Vec<Line> = (0..framebuf.height())
                    .map(|y| {
                        let spans: Vec<Span> = (0..framebuf.width())
                            .map(|x| {
                                let cell = framebuf.get(x, y);
                                Span::styled(
                                    cell.ch.to_string(),
                                    Style::default().fg(color_for(cell.color)),
                                )
                            })
                            .collect();
                        Line::from(spans)
                    })
                    .collect();

                let title = if ui_state.paused { "Arena (paused)" } else { "Arena" };
                let arena = Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title(title));
                frame.render_widget(arena, chunks[1]);

                let footer = Paragraph::new("Space: reset | p: pause | q: quit")
                    .block(Block::default().borders(Borders::ALL).title("Controls"));
                frame.render_widget(footer, chunks[2]);
            })?;

            last_render = Instant::now();
            render_counter += 1;
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn shutdown_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn status_line(stats: &SimStats) -> String {
    format!(
        "bodies: {} | steps: {} | t: {:.2}s | hits: {} ({} total) | p: ({:.2}, {:.2}) | ke: {:.2}",
        stats.body_count,
        stats.steps,
        stats.sim_time,
        stats.collisions_last_step,
        stats.collisions_total,
        stats.momentum.x,
        stats.momentum.y,
        stats.kinetic_energy
    )
}

/// Turns wall-clock frame time into a whole number of fixed steps.
///
/// Each frame is clamped to `max_frame_dt` so a stalled terminal does not
/// hand the simulation one huge step or a burst of catch-up steps. At most
/// `MAX_STEPS_PER_FRAME` steps are released per call; any backlog past that
/// is dropped.
#[derive(Debug)]
pub struct FrameClock {
    step_dt: f32,
    max_frame_dt: f32,
    accumulator: f32,
}

impl FrameClock {
    pub fn new(step_dt: f32, max_frame_dt: f32) -> Self {
        Self {
            step_dt,
            max_frame_dt,
            accumulator: 0.0,
        }
    }

    /// Adds `elapsed` seconds and returns how many steps are now due.
    pub fn feed(&mut self, elapsed: f32) -> u32 {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        if !(self.step_dt.is_finite() && self.step_dt > 0.0) {
            return 0;
        }
        self.accumulator += elapsed.min(self.max_frame_dt);

        let due = (self.accumulator / self.step_dt).floor();
        if due >= MAX_STEPS_PER_FRAME as f32 {
            self.accumulator = 0.0;
            return MAX_STEPS_PER_FRAME;
        }
        let steps = due as u32;
        self.accumulator = (self.accumulator - steps as f32 * self.step_dt).max(0.0);
        steps
    }

    pub fn clear(&mut self) {
        self.accumulator = 0.0;
    }
}

struct UiState {
    framebuf: render::FrameBuffer,
    paused: bool,
}

impl UiState {
    fn new() -> Self {
        Self {
            framebuf: render::FrameBuffer::new(0, 0),
            paused: false,
        }
    }
}

fn color_for(color: ColorId) -> Color {
    match color {
        ColorId::White => Color::White,
        ColorId::Cyan => Color::Cyan,
        ColorId::Yellow => Color::Yellow,
        ColorId::Red => Color::Red,
        ColorId::Gray => Color::DarkGray,
    }
}
