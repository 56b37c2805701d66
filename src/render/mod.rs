use crate::{
    config,
    types::{Body, ColorId, Vec2},
};

const BACKDROP_PRIORITY: f32 = 0.0;
const SUN_PRIORITY: f32 = 1.0;
const BODY_PRIORITY: f32 = 10.0;

/// Maps world units to terminal cells. World y points up, screen y down.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec2,
    pub zoom: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            zoom: Vec2::new(1.0, 1.0),
        }
    }
}

impl Camera {
    /// Centres the camera on the origin and scales each axis so that
    /// `±half_width` by `±half_height` spans the viewport edge to edge.
    /// A one-cell axis still gets a half-cell extent so the zoom never hits 0.
    pub fn fit(viewport: Viewport, half_width: f32, half_height: f32) -> Self {
        let (px_w, px_h) = viewport.half_extent();
        let (px_w, px_h) = (px_w.max(0.5), px_h.max(0.5));
        Self {
            pos: Vec2::ZERO,
            zoom: Vec2::new(px_w / half_width, px_h / half_height),
        }
    }

    pub fn to_screen(&self, world: Vec2, viewport: Viewport) -> (i32, i32) {
        let (px_w, px_h) = viewport.half_extent();
        let sx = ((world.x - self.pos.x) * self.zoom.x + px_w).round() as i32;
        let sy = (px_h - (world.y - self.pos.y) * self.zoom.y).round() as i32;
        (sx, sy)
    }

    pub fn to_world(&self, sx: u16, sy: u16, viewport: Viewport) -> Vec2 {
        let (px_w, px_h) = viewport.half_extent();
        Vec2::new(
            (sx as f32 - px_w) / self.zoom.x + self.pos.x,
            (px_h - sy as f32) / self.zoom.y + self.pos.y,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    fn half_extent(self) -> (f32, f32) {
        (
            self.width.saturating_sub(1) as f32 / 2.0,
            self.height.saturating_sub(1) as f32 / 2.0,
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderCell {
    pub ch: char,
    pub priority: f32,
    pub color: ColorId,
}

impl RenderCell {
    const BLANK: RenderCell = RenderCell {
        ch: ' ',
        priority: f32::NEG_INFINITY,
        color: ColorId::White,
    };
}

#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(len, RenderCell::BLANK);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(RenderCell::BLANK);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    /// Writes the cell unless something with a higher priority is already there.
    fn set(&mut self, x: i32, y: i32, ch: char, priority: f32, color: ColorId) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if priority >= cell.priority {
            cell.priority = priority;
            cell.ch = ch;
            cell.color = color;
        }
    }
}

/// Draws the arena backdrop and every body into `frame`.
pub fn draw(bodies: &[Body], camera: &Camera, viewport: Viewport, frame: &mut FrameBuffer) {
    if frame.width() != viewport.width || frame.height() != viewport.height {
        frame.resize(viewport.width, viewport.height);
    } else {
        frame.clear();
    }

    draw_backdrop(camera, viewport, frame);

    for body in bodies {
        let (sx, sy) = camera.to_screen(body.position.xy(), viewport);
        frame.set(
            sx,
            sy,
            'o',
            BODY_PRIORITY + body.speed(),
            body_color(body),
        );
    }
}

fn draw_backdrop(camera: &Camera, viewport: Viewport, frame: &mut FrameBuffer) {
    let sun = Vec2::new(config::SUN_CENTER.0, config::SUN_CENTER.1);
    let sun_radius_sq = config::SUN_RADIUS * config::SUN_RADIUS;

    for sy in 0..viewport.height {
        for sx in 0..viewport.width {
            let world = camera.to_world(sx, sy, viewport);
            if world.x.abs() >= config::WALL_INNER_X {
                frame.set(sx as i32, sy as i32, '█', BACKDROP_PRIORITY, ColorId::Gray);
            } else if (world - sun).length_sq() <= sun_radius_sq {
                frame.set(sx as i32, sy as i32, '*', SUN_PRIORITY, ColorId::Yellow);
            }
        }
    }

    // Too small to cover a cell centre at low zoom; always mark the middle.
    let (sx, sy) = camera.to_screen(sun, viewport);
    frame.set(sx, sy, '*', SUN_PRIORITY, ColorId::Yellow);
}

fn body_color(body: &Body) -> ColorId {
    let speed = body.speed();
    if speed >= config::FAST_SPEED {
        ColorId::Red
    } else if speed >= config::FAST_SPEED * 0.5 {
        ColorId::Yellow
    } else if body.velocity.y < 0.0 {
        ColorId::Cyan
    } else {
        ColorId::White
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    // Half extents of 30 x 10 cells: 10 cells per unit across, 5 per unit up.
    const VIEWPORT: Viewport = Viewport {
        width: 61,
        height: 21,
    };

    fn fitted() -> Camera {
        Camera::fit(VIEWPORT, config::VIEW_HALF_WIDTH, config::VIEW_HALF_HEIGHT)
    }

    fn body_at(x: f32, y: f32, vy: f32) -> Body {
        Body {
            position: Vec3::new(x, y, 0.0),
            velocity: Vec3::new(0.0, vy, 0.0),
            ..Body::default()
        }
    }

    mod camera {
        use super::*;

        #[test]
        fn default_camera_at_origin() {
            let camera = Camera::default();
            assert_eq!(camera.pos, Vec2::ZERO);
            assert_eq!(camera.zoom, Vec2::new(1.0, 1.0));
        }

        #[test]
        fn fit_scales_each_axis() {
            let camera = fitted();
            assert_eq!(camera.zoom, Vec2::new(10.0, 5.0));
        }

        #[test]
        fn single_cell_viewport_keeps_finite_zoom() {
            let viewport = Viewport {
                width: 1,
                height: 1,
            };
            let camera = Camera::fit(viewport, config::VIEW_HALF_WIDTH, config::VIEW_HALF_HEIGHT);
            assert!(camera.zoom.x > 0.0 && camera.zoom.y > 0.0);

            let world = camera.to_world(0, 0, viewport);
            assert!(world.x.is_finite() && world.y.is_finite());
            assert_eq!(camera.to_screen(Vec2::ZERO, viewport), (0, 0));

            let mut frame = FrameBuffer::new(0, 0);
            draw(&[body_at(0.0, 0.0, 0.0)], &camera, viewport, &mut frame);
            assert_eq!(frame.get(0, 0).ch, 'o');
        }

        #[test]
        fn origin_maps_to_centre() {
            assert_eq!(fitted().to_screen(Vec2::ZERO, VIEWPORT), (30, 10));
        }

        #[test]
        fn world_y_points_up() {
            let camera = fitted();
            assert_eq!(camera.to_screen(Vec2::new(0.0, 2.0), VIEWPORT), (30, 0));
            assert_eq!(camera.to_screen(Vec2::new(0.0, -2.0), VIEWPORT), (30, 20));
            assert_eq!(camera.to_screen(Vec2::new(-3.0, 0.0), VIEWPORT), (0, 10));
        }

        #[test]
        fn to_world_inverts_to_screen() {
            let camera = fitted();
            let world = camera.to_world(40, 5, VIEWPORT);
            assert_eq!(camera.to_screen(world, VIEWPORT), (40, 5));
            assert!((world.x - 1.0).abs() < 1e-5);
            assert!((world.y - 1.0).abs() < 1e-5);
        }
    }

    mod framebuffer {
        use super::*;

        #[test]
        fn creates_with_correct_dimensions() {
            let fb = FrameBuffer::new(80, 24);
            assert_eq!(fb.width(), 80);
            assert_eq!(fb.height(), 24);
        }

        #[test]
        fn resize_clears_cells() {
            let mut fb = FrameBuffer::new(10, 10);
            fb.set(1, 1, 'A', 1.0, ColorId::Cyan);
            fb.resize(20, 15);
            assert_eq!(fb.width(), 20);
            assert_eq!(fb.get(1, 1).ch, ' ');
        }

        #[test]
        fn higher_priority_wins() {
            let mut fb = FrameBuffer::new(10, 10);
            fb.set(5, 5, 'A', 10.0, ColorId::Cyan);
            fb.set(5, 5, 'B', 5.0, ColorId::Red);
            assert_eq!(fb.get(5, 5).ch, 'A');
            fb.set(5, 5, 'C', 11.0, ColorId::Red);
            assert_eq!(fb.get(5, 5).ch, 'C');
            assert_eq!(fb.get(5, 5).color, ColorId::Red);
        }

        #[test]
        fn out_of_bounds_is_ignored() {
            let mut fb = FrameBuffer::new(10, 10);
            fb.set(100, 100, 'X', 10.0, ColorId::Cyan);
            fb.set(-1, 3, 'X', 10.0, ColorId::Cyan);
        }
    }

    mod draw_fn {
        use super::*;

        #[test]
        fn walls_fill_outer_columns() {
            let mut frame = FrameBuffer::new(0, 0);
            draw(&[], &fitted(), VIEWPORT, &mut frame);

            for y in 0..VIEWPORT.height {
                assert_eq!(frame.get(0, y).ch, '█');
                assert_eq!(frame.get(60, y).ch, '█');
                assert_eq!(frame.get(30, y).ch, ' ');
            }
        }

        #[test]
        fn sun_is_drawn_at_its_centre() {
            let mut frame = FrameBuffer::new(0, 0);
            draw(&[], &fitted(), VIEWPORT, &mut frame);

            // (2, 1.5) lands on (50, 2.5), which rounds to row 3.
            let (sx, sy) = fitted().to_screen(Vec2::new(2.0, 1.5), VIEWPORT);
            let cell = frame.get(sx as u16, sy as u16);
            assert_eq!(cell.ch, '*');
            assert_eq!(cell.color, ColorId::Yellow);
        }

        #[test]
        fn body_is_drawn_at_its_position() {
            let mut frame = FrameBuffer::new(0, 0);
            draw(&[body_at(1.0, -1.0, 0.0)], &fitted(), VIEWPORT, &mut frame);
            assert_eq!(frame.get(40, 15).ch, 'o');
        }

        #[test]
        fn body_draws_over_wall() {
            let mut frame = FrameBuffer::new(0, 0);
            draw(&[body_at(-3.0, 0.0, 0.0)], &fitted(), VIEWPORT, &mut frame);
            assert_eq!(frame.get(0, 10).ch, 'o');
        }

        #[test]
        fn faster_body_wins_shared_cell() {
            let slow = body_at(0.0, 0.0, 1.0);
            let fast = body_at(0.01, 0.0, 8.0);
            let mut frame = FrameBuffer::new(0, 0);
            draw(&[fast, slow], &fitted(), VIEWPORT, &mut frame);
            assert_eq!(frame.get(30, 10).color, ColorId::Red);
        }

        #[test]
        fn empty_viewport_does_not_panic() {
            let mut frame = FrameBuffer::new(5, 5);
            let viewport = Viewport {
                width: 0,
                height: 0,
            };
            draw(&[body_at(0.0, 0.0, 0.0)], &Camera::default(), viewport, &mut frame);
            assert_eq!(frame.width(), 0);
        }
    }

    mod body_color_fn {
        use super::*;

        #[test]
        fn picks_tier_by_speed_and_direction() {
            assert_eq!(body_color(&body_at(0.0, 0.0, 7.0)), ColorId::Red);
            assert_eq!(body_color(&body_at(0.0, 0.0, 4.0)), ColorId::Yellow);
            assert_eq!(body_color(&body_at(0.0, 0.0, -1.0)), ColorId::Cyan);
            assert_eq!(body_color(&body_at(0.0, 0.0, 1.0)), ColorId::White);
        }
    }
}
