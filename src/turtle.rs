//! The turtle's geometric state and its append-only line-segment recorder.

use std::f64::consts::PI;

/// One recorded pen-down movement. Segments are never removed except by
/// `clearscreen`, which empties the whole sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: String,
    pub size: f64,
}

/// The turtle: position, heading, pen state, and everything it has drawn.
///
/// `heading` is measured clockwise from the positive Y-axis (0 = up) and is
/// always normalized into `[0, 360)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Turtle {
    x: f64,
    y: f64,
    heading: f64,
    pen_down: bool,
    pen_color: String,
    pen_size: f64,
    visible: bool,
    lines: Vec<LineSegment>,
}

impl Default for Turtle {
    fn default() -> Self {
        Self::new()
    }
}

impl Turtle {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            pen_down: true,
            pen_color: "black".to_string(),
            pen_size: 1.0,
            visible: true,
            lines: Vec::new(),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn pen_is_down(&self) -> bool {
        self.pen_down
    }

    pub fn pen_color(&self) -> &str {
        &self.pen_color
    }

    pub fn pen_size(&self) -> f64 {
        self.pen_size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn lines(&self) -> &[LineSegment] {
        &self.lines
    }

    fn move_to(&mut self, nx: f64, ny: f64) {
        if self.pen_down {
            self.lines.push(LineSegment {
                x1: self.x,
                y1: self.y,
                x2: nx,
                y2: ny,
                color: self.pen_color.clone(),
                size: self.pen_size,
            });
        }
        self.x = nx;
        self.y = ny;
    }

    pub fn forward(&mut self, distance: f64) {
        let theta = self.heading.to_radians();
        let nx = self.x + distance * theta.sin();
        let ny = self.y + distance * theta.cos();
        self.move_to(nx, ny);
    }

    pub fn back(&mut self, distance: f64) {
        self.forward(-distance);
    }

    pub fn right(&mut self, degrees: f64) {
        self.heading = normalize_heading(self.heading + degrees);
    }

    pub fn left(&mut self, degrees: f64) {
        self.heading = normalize_heading(self.heading - degrees);
    }

    pub fn set_xy(&mut self, x: f64, y: f64) {
        self.move_to(x, y);
    }

    pub fn set_x(&mut self, x: f64) {
        let y = self.y;
        self.move_to(x, y);
    }

    pub fn set_y(&mut self, y: f64) {
        let x = self.x;
        self.move_to(x, y);
    }

    pub fn set_heading(&mut self, degrees: f64) {
        self.heading = normalize_heading(degrees);
    }

    pub fn home(&mut self) {
        self.move_to(0.0, 0.0);
        self.heading = 0.0;
    }

    /// Approximates a circle of radius `r` as 36 equal-arc-length chords,
    /// turning 10 degrees right between each.
    pub fn circle(&mut self, r: f64) {
        const STEPS: i64 = 36;
        let step_turn = 360.0 / STEPS as f64;
        let step_len = r * step_turn.to_radians();
        for _ in 0..STEPS {
            self.forward(step_len);
            self.right(step_turn);
        }
    }

    /// Approximates an arc subtending `angle` degrees of radius `r` as
    /// `max(1, round(|angle| / 10))` equal-arc-length chords.
    pub fn arc(&mut self, angle: f64, r: f64) {
        let steps = (angle.abs() / 10.0).round().max(1.0) as i64;
        let step_turn = angle / steps as f64;
        let step_len = r * step_turn.abs().to_radians();
        for _ in 0..steps {
            self.forward(step_len);
            self.right(step_turn);
        }
    }

    pub fn clear_screen(&mut self) {
        self.lines.clear();
        self.x = 0.0;
        self.y = 0.0;
        self.heading = 0.0;
    }

    pub fn pen_up(&mut self) {
        self.pen_down = false;
    }

    pub fn pen_down(&mut self) {
        self.pen_down = true;
    }

    pub fn set_pen_color(&mut self, color: String) {
        self.pen_color = color;
    }

    pub fn set_pen_size(&mut self, size: f64) {
        self.pen_size = size;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }
}

fn normalize_heading(h: f64) -> f64 {
    let h = h % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_stays_in_range() {
        let mut t = Turtle::new();
        t.right(450.0);
        assert!(t.heading() >= 0.0 && t.heading() < 360.0);
        t.left(900.0);
        assert!(t.heading() >= 0.0 && t.heading() < 360.0);
    }

    #[test]
    fn forward_then_home_returns_to_origin() {
        let mut t = Turtle::new();
        t.forward(100.0);
        t.right(37.0);
        t.home();
        assert_eq!((t.x(), t.y(), t.heading()), (0.0, 0.0, 0.0));
    }

    #[test]
    fn pen_up_records_no_segment() {
        let mut t = Turtle::new();
        t.pen_up();
        t.forward(100.0);
        assert!(t.lines().is_empty());
        t.pen_down();
        t.forward(50.0);
        assert_eq!(t.lines().len(), 1);
    }

    #[test]
    fn clearscreen_is_idempotent() {
        let mut t = Turtle::new();
        t.forward(10.0);
        t.clear_screen();
        let after_one = t.clone();
        t.clear_screen();
        assert_eq!(t, after_one);
    }

    #[test]
    fn square_via_repeat_closes() {
        let mut t = Turtle::new();
        for _ in 0..4 {
            t.forward(100.0);
            t.right(90.0);
        }
        assert_eq!(t.lines().len(), 4);
        assert!((t.x()).abs() < 1e-9 && (t.y()).abs() < 1e-9);
    }

    #[test]
    fn circle_uses_arc_length_chords() {
        let mut t = Turtle::new();
        t.circle(10.0);
        assert_eq!(t.lines().len(), 36);
        // After a full turn the turtle faces its original heading again.
        assert!(t.heading().abs() < 1e-9);
    }
}
