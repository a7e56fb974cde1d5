use serde::{Deserialize, Serialize};

/// A 2D point or direction in arena coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` degrees from the +x axis.
    pub fn unit_from_angle(angle: f32) -> Self {
        Vec2::new(1.0, 0.0).rotate(angle)
    }

    pub fn add(self, other: Vec2) -> Self {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Self {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, factor: f32) -> Self {
        Vec2::new(factor * self.x, factor * self.y)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Rotate by `angle` degrees around the origin.
    pub fn rotate(self, angle: f32) -> Self {
        let rad = angle.to_radians();
        let (sin, cos) = rad.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotate by `angle` degrees around `pivot`.
    pub fn rotate_around(self, pivot: Vec2, angle: f32) -> Self {
        self.sub(pivot).rotate(angle).add(pivot)
    }
}

/// Whether segments (p0, p1) and (p2, p3) intersect.
pub fn segments_intersect(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> bool {
    let s1 = p1.sub(p0);
    let s2 = p3.sub(p2);

    let denom = -s2.x * s1.y + s1.x * s2.y;
    if denom.abs() < 1e-8 {
        return false; // parallel or degenerate
    }

    let s = (-s1.y * (p0.x - p2.x) + s1.x * (p0.y - p2.y)) / denom;
    let t = (s2.x * (p0.y - p2.y) - s2.y * (p0.x - p2.x)) / denom;

    (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t)
}

/// Whether `p` lies inside the axis-aligned rectangle at `origin` with the
/// given width and height (edges inclusive).
pub fn point_in_rect(p: Vec2, origin: Vec2, width: f32, height: f32) -> bool {
    p.x >= origin.x && p.x <= origin.x + width && p.y >= origin.y && p.y <= origin.y + height
}

/// Whether `p` lies inside the triangle (a, b, c).
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    fn edge_sign(p: Vec2, v0: Vec2, v1: Vec2) -> f32 {
        (p.x - v1.x) * (v0.y - v1.y) - (v0.x - v1.x) * (p.y - v1.y)
    }

    let d1 = edge_sign(p, a, b);
    let d2 = edge_sign(p, b, c);
    let d3 = edge_sign(p, c, a);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
