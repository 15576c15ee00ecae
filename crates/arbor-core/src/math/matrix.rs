// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the `Mat4` type and associated operations.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::{Vec3, Vec4, EPSILON};
use std::ops::Mul;

/// A 4x4 column-major matrix used for 3D affine and projective transformations.
///
/// The layout is plain-old-data (`#[repr(C)]`, sixteen `f32`), so columns of
/// matrices can be copied to and from byte buffers with `bytemuck`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[3]` holds the translation of an affine transform.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// A 4x4 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec4::ZERO; 4],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a translation matrix.
    #[inline]
    pub const fn from_translation(v: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::from_vec3(v, 1.0))
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub const fn from_scale(scale: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(scale.x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, scale.y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, scale.z, 0.0),
            Vec4::W,
        )
    }

    /// Creates a matrix for a rotation of `angle` radians around the X-axis.
    #[inline]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::X,
            Vec4::new(0.0, c, s, 0.0),
            Vec4::new(0.0, -s, c, 0.0),
            Vec4::W,
        )
    }

    /// Creates a matrix for a rotation of `angle` radians around the Y-axis.
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(c, 0.0, -s, 0.0),
            Vec4::Y,
            Vec4::new(s, 0.0, c, 0.0),
            Vec4::W,
        )
    }

    /// Creates a matrix for a rotation of `angle` radians around the Z-axis.
    #[inline]
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(c, s, 0.0, 0.0),
            Vec4::new(-s, c, 0.0, 0.0),
            Vec4::Z,
            Vec4::W,
        )
    }

    /// Returns the translation part of an affine matrix.
    #[inline]
    pub const fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn row(&self, index: usize) -> Vec4 {
        let pick = |c: Vec4| c.to_array()[index];
        Vec4::new(
            pick(self.cols[0]),
            pick(self.cols[1]),
            pick(self.cols[2]),
            pick(self.cols[3]),
        )
    }

    /// Returns the transpose of the matrix.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2), self.row(3))
    }

    /// Computes the determinant of the matrix.
    pub fn determinant(&self) -> f32 {
        let (cofactors, _) = self.adjugate();
        self.cols[0].dot(cofactors)
    }

    /// Computes the inverse of the matrix.
    ///
    /// Returns `None` when the determinant is smaller than [`EPSILON`] in
    /// magnitude, or not finite.
    pub fn inverse(&self) -> Option<Self> {
        let (cofactors, adjugate) = self.adjugate();
        let det = self.cols[0].dot(cofactors);
        if !det.is_finite() || det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Self::from_cols(
            adjugate.cols[0] * inv_det,
            adjugate.cols[1] * inv_det,
            adjugate.cols[2] * inv_det,
            adjugate.cols[3] * inv_det,
        ))
    }

    /// Returns `true` if every element is within `epsilon` of `other`.
    pub fn approx_eq_eps(&self, other: &Self, epsilon: f32) -> bool {
        self.cols.iter().zip(other.cols.iter()).all(|(a, b)| {
            a.to_array()
                .iter()
                .zip(b.to_array().iter())
                .all(|(x, y)| (x - y).abs() < epsilon)
        })
    }

    /// Returns `true` if every element is within [`EPSILON`] of `other`.
    #[inline]
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.approx_eq_eps(other, EPSILON)
    }

    /// Computes the adjugate from 2x2 minors.
    ///
    /// Returns the cofactors of the first column (for the determinant) alongside
    /// the adjugate matrix itself.
    fn adjugate(&self) -> (Vec4, Self) {
        let [m00, m01, m02, m03] = self.cols[0].to_array();
        let [m10, m11, m12, m13] = self.cols[1].to_array();
        let [m20, m21, m22, m23] = self.cols[2].to_array();
        let [m30, m31, m32, m33] = self.cols[3].to_array();

        let c00 = m22 * m33 - m32 * m23;
        let c02 = m12 * m33 - m32 * m13;
        let c03 = m12 * m23 - m22 * m13;
        let c04 = m21 * m33 - m31 * m23;
        let c06 = m11 * m33 - m31 * m13;
        let c07 = m11 * m23 - m21 * m13;
        let c08 = m21 * m32 - m31 * m22;
        let c10 = m11 * m32 - m31 * m12;
        let c11 = m11 * m22 - m21 * m12;
        let c12 = m20 * m33 - m30 * m23;
        let c14 = m10 * m33 - m30 * m13;
        let c15 = m10 * m23 - m20 * m13;
        let c16 = m20 * m32 - m30 * m22;
        let c18 = m10 * m32 - m30 * m12;
        let c19 = m10 * m22 - m20 * m12;
        let c20 = m20 * m31 - m30 * m21;
        let c22 = m10 * m31 - m30 * m11;
        let c23 = m10 * m21 - m20 * m11;

        let fac0 = Vec4::new(c00, c00, c02, c03);
        let fac1 = Vec4::new(c04, c04, c06, c07);
        let fac2 = Vec4::new(c08, c08, c10, c11);
        let fac3 = Vec4::new(c12, c12, c14, c15);
        let fac4 = Vec4::new(c16, c16, c18, c19);
        let fac5 = Vec4::new(c20, c20, c22, c23);

        let v0 = Vec4::new(m10, m00, m00, m00);
        let v1 = Vec4::new(m11, m01, m01, m01);
        let v2 = Vec4::new(m12, m02, m02, m02);
        let v3 = Vec4::new(m13, m03, m03, m03);

        let sign_a = Vec4::new(1.0, -1.0, 1.0, -1.0);
        let sign_b = Vec4::new(-1.0, 1.0, -1.0, 1.0);

        let inv0 = (v1 * fac0 - v2 * fac1 + v3 * fac2) * sign_a;
        let inv1 = (v0 * fac0 - v2 * fac3 + v3 * fac4) * sign_b;
        let inv2 = (v0 * fac1 - v1 * fac3 + v3 * fac5) * sign_a;
        let inv3 = (v0 * fac2 - v1 * fac4 + v2 * fac5) * sign_b;

        let cofactors = Vec4::new(inv0.x, inv1.x, inv2.x, inv3.x);
        (cofactors, Self::from_cols(inv0, inv1, inv2, inv3))
    }
}

impl Default for Mat4 {
    /// Returns the 4x4 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Composes two matrices: `(a * b) * v == a * (b * v)`.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    /// Transforms a `Vec4` by this matrix.
    #[inline]
    fn mul(self, rhs: Vec4) -> Vec4 {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}
