use hermes_routing::{
    profile::RouteProfile,
    turn::{RoundaboutState, Turn},
};
use image::{ImageBuffer, Rgba, RgbaImage};

pub const MIN_DIAGRAM_SIZE: u32 = 12;

// Layout in a unit square with y pointing down; the traveller arrives from the bottom.
const CENTER: (f64, f64) = (0.5, 0.5);
const ENTRY_START: (f64, f64) = (0.5, 0.95);
const ARM_LENGTH: f64 = 0.45;
const ROUNDABOUT_RADIUS: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (f64, f64),
    pub radius: f64,
}

/// Vector form of a turn diagram in a unit square: the lines to stroke and,
/// for a roundabout, the circle between them.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDiagram {
    pub lines: Vec<[(f64, f64); 2]>,
    pub circle: Option<Circle>,
}

fn arm_end(from: (f64, f64), angle: f64, length: f64) -> (f64, f64) {
    let radians = angle.to_radians();
    (from.0 + length * radians.sin(), from.1 - length * radians.cos())
}

impl TurnDiagram {
    /// A line bending at the junction, or two lines joined by a circle when
    /// the turn involves a roundabout and the profile keeps to one-way rules.
    pub fn for_turn(turn: &Turn, profile: &RouteProfile) -> TurnDiagram {
        // Negative angles turn left, which is anticlockwise on screen.
        let exit_angle = turn.angle;

        if turn.roundabout_state != RoundaboutState::None && profile.vehicle.obeys_one_way() {
            let entry_end = (CENTER.0, CENTER.1 + ROUNDABOUT_RADIUS);
            let exit_start = arm_end(CENTER, exit_angle, ROUNDABOUT_RADIUS);
            let exit_end = arm_end(CENTER, exit_angle, ARM_LENGTH);

            return TurnDiagram {
                lines: vec![[ENTRY_START, entry_end], [exit_start, exit_end]],
                circle: Some(Circle {
                    center: CENTER,
                    radius: ROUNDABOUT_RADIUS,
                }),
            };
        }

        TurnDiagram {
            lines: vec![[ENTRY_START, CENTER], [CENTER, arm_end(CENTER, exit_angle, ARM_LENGTH)]],
            circle: None,
        }
    }

    /// Distance from `point` to the nearest stroke, in unit-square units.
    fn distance_to(&self, point: (f64, f64)) -> f64 {
        let lines = self
            .lines
            .iter()
            .map(|[start, end]| distance_to_line(point, *start, *end));
        let circle = self.circle.iter().map(|circle| {
            let dx = point.0 - circle.center.0;
            let dy = point.1 - circle.center.1;
            ((dx * dx + dy * dy).sqrt() - circle.radius).abs()
        });

        lines.chain(circle).fold(f64::INFINITY, f64::min)
    }

    /// Rasterizes the diagram into a square image, at least 12 pixels wide,
    /// with antialiased strokes in `color` on a transparent background.
    pub fn render(&self, size: u32, color: Rgba<u8>) -> RgbaImage {
        let size = size.max(MIN_DIAGRAM_SIZE);
        let scale = size as f64;
        let half_width = (scale / 8.0).max(1.5) / 2.0;
        let Rgba([r, g, b, a]) = color;

        ImageBuffer::from_fn(size, size, |x, y| {
            let center = ((x as f64 + 0.5) / scale, (y as f64 + 0.5) / scale);
            let distance = self.distance_to(center) * scale;
            let coverage = (half_width - distance + 0.5).clamp(0.0, 1.0);
            if coverage > 0.0 {
                Rgba([r, g, b, (a as f64 * coverage).round() as u8])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }
}

fn distance_to_line(point: (f64, f64), start: (f64, f64), end: (f64, f64)) -> f64 {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length_squared = dx * dx + dy * dy;
    let t = if length_squared > 0.0 {
        (((point.0 - start.0) * dx + (point.1 - start.1) * dy) / length_squared).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (px, py) = (start.0 + t * dx - point.0, start.1 + t * dy - point.1);
    (px * px + py * py).sqrt()
}

/// Draws `turn` as a `size` by `size` image.
pub fn turn_diagram(turn: &Turn, profile: &RouteProfile, size: u32, color: Rgba<u8>) -> RgbaImage {
    TurnDiagram::for_turn(turn, profile).render(size, color)
}
