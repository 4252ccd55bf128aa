//! Small value types for normalized screen space and particle space.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const CENTER: Vec2 = Vec2 { x: 0.5, y: 0.5 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        Vec2::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }

    pub fn clamp(self, lo: f32, hi: f32) -> Vec2 {
        Vec2::new(self.x.clamp(lo, hi), self.y.clamp(lo, hi))
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Particle-space vector. `z` is depth (larger is further away).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn lerp(self, to: Vec3, t: f32) -> Vec3 {
        Vec3::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.z + (to.z - self.z) * t,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Size2 {
    pub width: f32,
    pub height: f32,
}

impl Size2 {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, k: f32) -> Size2 {
        Size2::new(self.width * k, self.height * k)
    }

    pub fn lerp(self, to: Size2, t: f32) -> Size2 {
        Size2::new(
            self.width + (to.width - self.width) * t,
            self.height + (to.height - self.height) * t,
        )
    }
}

/// Rectangle addressed by its centre, the way cards are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub center: Vec2,
    pub size: Size2,
}

impl Rect {
    pub const fn new(center: Vec2, size: Size2) -> Self {
        Self { center, size }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.size.width * 0.5
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.size.height * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left()
            && p.x <= self.left() + self.size.width
            && p.y >= self.top()
            && p.y <= self.top() + self.size.height
    }

    /// Pixel rectangle `(x, y, w, h)` for a viewport of `vw`×`vh`.
    pub fn to_pixels(&self, vw: f32, vh: f32) -> (f32, f32, f32, f32) {
        (
            self.left() * vw,
            self.top() * vh,
            self.size.width * vw,
            self.size.height * vh,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_follow_center() {
        let r = Rect::new(Vec2::new(0.5, 0.5), Size2::new(0.4, 0.2));
        assert!((r.left() - 0.3).abs() < 1e-6);
        assert!((r.top() - 0.4).abs() < 1e-6);
        assert!(r.contains(Vec2::new(0.69, 0.59)));
        assert!(!r.contains(Vec2::new(0.71, 0.5)));
        let (x, y, w, h) = r.to_pixels(1000.0, 500.0);
        assert!((x - 300.0).abs() < 1e-3 && (y - 200.0).abs() < 1e-3);
        assert!((w - 400.0).abs() < 1e-3 && (h - 100.0).abs() < 1e-3);
    }

    #[test]
    fn vector_ops() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, 6.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(2.0, 4.0));
        assert_eq!(-(b - a), Vec2::new(-2.0, -4.0));
        assert!((Vec3::new(3.0, 4.0, 0.0).length() - 5.0).abs() < 1e-6);
    }
}
