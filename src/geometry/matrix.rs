// SPDX-License-Identifier: GPL-3.0-only

//! 2D affine transform applied to the preview surface
//!
//! Row-major 2x3 matrix in view pixel coordinates (y axis pointing down):
//!
//! ```text
//! x' = sx * x + kx * y + tx
//! y' = ky * x + sy * y + ty
//! ```
//!
//! Operations are "post" operations: each one is applied after the
//! transform accumulated so far.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub sx: f32,
    pub kx: f32,
    pub tx: f32,
    pub ky: f32,
    pub sy: f32,
    pub ty: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        sx: 1.0,
        kx: 0.0,
        tx: 0.0,
        ky: 0.0,
        sy: 1.0,
        ty: 0.0,
    };

    /// Transform that collapses everything to the origin (nothing is rendered)
    pub fn scale_to_zero() -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.post_scale(0.0, 0.0, 0.0, 0.0);
        matrix
    }

    /// Apply `other` after this transform
    pub fn post_concat(&mut self, other: &Matrix) {
        let m = *self;
        self.sx = other.sx * m.sx + other.kx * m.ky;
        self.kx = other.sx * m.kx + other.kx * m.sy;
        self.tx = other.sx * m.tx + other.kx * m.ty + other.tx;
        self.ky = other.ky * m.sx + other.sy * m.ky;
        self.sy = other.ky * m.kx + other.sy * m.sy;
        self.ty = other.ky * m.tx + other.sy * m.ty + other.ty;
    }

    /// Scale around the pivot point `(px, py)`
    pub fn post_scale(&mut self, sx: f32, sy: f32, px: f32, py: f32) {
        let scale = Matrix {
            sx,
            kx: 0.0,
            tx: px - sx * px,
            ky: 0.0,
            sy,
            ty: py - sy * py,
        };
        self.post_concat(&scale);
    }

    /// Rotate clockwise (on screen) by `degrees` around the pivot point `(px, py)`
    pub fn post_rotate(&mut self, degrees: f32, px: f32, py: f32) {
        let (sin, cos) = sin_cos_degrees(degrees);
        let rotate = Matrix {
            sx: cos,
            kx: -sin,
            tx: px - cos * px + sin * py,
            ky: sin,
            sy: cos,
            ty: py - sin * px - cos * py,
        };
        self.post_concat(&rotate);
    }

    /// Translate by `(dx, dy)`
    pub fn post_translate(&mut self, dx: f32, dy: f32) {
        self.tx += dx;
        self.ty += dy;
    }

    /// Map a point through the transform
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.sx * x + self.kx * y + self.tx,
            self.ky * x + self.sy * y + self.ty,
        )
    }

    /// True when the transform maps the plane onto a point or line
    pub fn is_degenerate(&self) -> bool {
        (self.sx * self.sy - self.kx * self.ky).abs() < f32::EPSILON
    }

    /// Element-wise comparison with tolerance
    pub fn approx_eq(&self, other: &Matrix, epsilon: f32) -> bool {
        [
            (self.sx, other.sx),
            (self.kx, other.kx),
            (self.tx, other.tx),
            (self.ky, other.ky),
            (self.sy, other.sy),
            (self.ty, other.ty),
        ]
        .iter()
        .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Values in row-major order `[sx, kx, tx, ky, sy, ty]`
    pub fn values(&self) -> [f32; 6] {
        [self.sx, self.kx, self.tx, self.ky, self.sy, self.ty]
    }
}

/// Exact sine/cosine for right angles, so 90° steps leave no float residue
fn sin_cos_degrees(degrees: f32) -> (f32, f32) {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        (0.0, 1.0)
    } else if normalized == 90.0 {
        (1.0, 0.0)
    } else if normalized == 180.0 {
        (0.0, -1.0)
    } else if normalized == 270.0 {
        (-1.0, 0.0)
    } else {
        normalized.to_radians().sin_cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_around_pivot_keeps_pivot() {
        let mut m = Matrix::IDENTITY;
        m.post_scale(2.0, 3.0, 50.0, 40.0);
        assert_eq!(m.map_point(50.0, 40.0), (50.0, 40.0));
        assert_eq!(m.map_point(60.0, 40.0), (70.0, 40.0));
    }

    #[test]
    fn test_rotate_is_clockwise_on_screen() {
        let mut m = Matrix::IDENTITY;
        m.post_rotate(90.0, 0.0, 0.0);
        // right becomes down
        assert_eq!(m.map_point(1.0, 0.0), (0.0, 1.0));
    }

    #[test]
    fn test_rotate_around_center() {
        let mut m = Matrix::IDENTITY;
        m.post_rotate(180.0, 50.0, 50.0);
        assert_eq!(m.map_point(0.0, 0.0), (100.0, 100.0));
    }

    #[test]
    fn test_operations_compose_in_order() {
        let mut m = Matrix::IDENTITY;
        m.post_scale(2.0, 2.0, 0.0, 0.0);
        m.post_translate(10.0, 0.0);
        assert_eq!(m.map_point(1.0, 1.0), (12.0, 2.0));
    }

    #[test]
    fn test_scale_to_zero_is_degenerate() {
        assert!(Matrix::scale_to_zero().is_degenerate());
        assert!(!Matrix::IDENTITY.is_degenerate());
    }
}
