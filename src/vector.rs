//! Fixed-size N-dimensional vectors
//!
//! `Vector<2>` and `Vector<3>` are the common cases, but every operation is
//! generic over the dimension so the spatial tree and forces work unchanged
//! for any `D`.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::lcg::Lcg;

/// An N-dimensional vector of `f64` components
#[derive(Clone, Copy, PartialEq)]
pub struct Vector<const D: usize>(pub [f64; D]);

/// 2D vector
pub type Vector2 = Vector<2>;

/// 3D vector
pub type Vector3 = Vector<3>;

impl<const D: usize> Vector<D> {
    /// The zero vector
    pub const ZERO: Self = Self([0.0; D]);

    /// Create a vector from its components
    pub const fn new(components: [f64; D]) -> Self {
        Self(components)
    }

    /// Build a vector by evaluating `f` for every axis
    pub fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        Self(std::array::from_fn(f))
    }

    /// Components as a fixed-size array
    pub fn as_array(&self) -> &[f64; D] {
        &self.0
    }

    /// Number of components
    pub const fn dimensions() -> usize {
        D
    }

    pub fn length_squared(&self) -> f64 {
        self.0.iter().map(|c| c * c).sum()
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(&self, to: &Self) -> f64 {
        (*self - *to).length_squared()
    }

    pub fn distance(&self, to: &Self) -> f64 {
        self.distance_squared(to).sqrt()
    }

    /// Replace every exactly-zero component with a tiny pseudo-random offset.
    ///
    /// Non-zero components are left as they are, so a vector that already has
    /// a direction keeps it. After jiggling the vector is never the zero vector
    /// (for `D > 0`), which keeps divisions by its length well defined.
    pub fn jiggled(&self, rng: &mut Lcg) -> Self {
        let mut out = *self;
        for c in out.0.iter_mut() {
            if *c == 0.0 {
                *c = rng.jiggle();
            }
        }
        out
    }

    /// True when every component is finite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl<const D: usize> Default for Vector<D> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const D: usize> fmt::Debug for Vector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<const D: usize> From<[f64; D]> for Vector<D> {
    fn from(components: [f64; D]) -> Self {
        Self(components)
    }
}

impl<const D: usize> Add for Vector<D> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_fn(|i| self.0[i] + rhs.0[i])
    }
}

impl<const D: usize> Sub for Vector<D> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_fn(|i| self.0[i] - rhs.0[i])
    }
}

impl<const D: usize> Neg for Vector<D> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_fn(|i| -self.0[i])
    }
}

impl<const D: usize> Mul<f64> for Vector<D> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::from_fn(|i| self.0[i] * rhs)
    }
}

impl<const D: usize> Div<f64> for Vector<D> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::from_fn(|i| self.0[i] / rhs)
    }
}

impl<const D: usize> AddAssign for Vector<D> {
    fn add_assign(&mut self, rhs: Self) {
        for (c, r) in self.0.iter_mut().zip(rhs.0) {
            *c += r;
        }
    }
}

impl<const D: usize> SubAssign for Vector<D> {
    fn sub_assign(&mut self, rhs: Self) {
        for (c, r) in self.0.iter_mut().zip(rhs.0) {
            *c -= r;
        }
    }
}

impl<const D: usize> MulAssign<f64> for Vector<D> {
    fn mul_assign(&mut self, rhs: f64) {
        for c in self.0.iter_mut() {
            *c *= rhs;
        }
    }
}

impl<const D: usize> Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl<const D: usize> IndexMut<usize> for Vector<D> {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }
}

// serde only implements arrays up to a fixed length, so vectors go through
// a plain sequence of components.
impl<const D: usize> Serialize for Vector<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(D))?;
        for c in &self.0 {
            seq.serialize_element(c)?;
        }
        seq.end()
    }
}

struct VectorVisitor<const D: usize>;

impl<'de, const D: usize> Visitor<'de> for VectorVisitor<D> {
    type Value = Vector<D>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a sequence of {D} numbers")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut out = [0.0; D];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(D + 1, &self));
        }
        Ok(Vector(out))
    }
}

impl<'de, const D: usize> Deserialize<'de> for Vector<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        deserializer.deserialize_seq(VectorVisitor::<D>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_component_wise() {
        let a = Vector2::new([1.0, 2.0]);
        let b = Vector2::new([3.0, -1.0]);

        assert_eq!(a + b, Vector2::new([4.0, 1.0]));
        assert_eq!(a - b, Vector2::new([-2.0, 3.0]));
        assert_eq!(a * 2.0, Vector2::new([2.0, 4.0]));
        assert_eq!(b / 2.0, Vector2::new([1.5, -0.5]));
        assert_eq!(-a, Vector2::new([-1.0, -2.0]));
    }

    #[test]
    fn assign_operators() {
        let mut v = Vector3::new([1.0, 1.0, 1.0]);
        v += Vector3::new([1.0, 2.0, 3.0]);
        assert_eq!(v, Vector3::new([2.0, 3.0, 4.0]));
        v -= Vector3::new([2.0, 2.0, 2.0]);
        assert_eq!(v, Vector3::new([0.0, 1.0, 2.0]));
        v *= 0.5;
        assert_eq!(v, Vector3::new([0.0, 0.5, 1.0]));
    }

    #[test]
    fn lengths_and_distances() {
        let v = Vector2::new([3.0, 4.0]);
        assert_eq!(v.length_squared(), 25.0);
        assert_eq!(v.length(), 5.0);

        let origin = Vector2::ZERO;
        assert_eq!(origin.distance(&v), 5.0);
        assert_eq!(origin.distance_squared(&v), 25.0);
    }

    #[test]
    fn index_access() {
        let mut v = Vector::<4>::new([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v[3], 4.0);
        v[0] = 10.0;
        assert_eq!(v[0], 10.0);
        assert_eq!(Vector::<4>::dimensions(), 4);
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds_panics() {
        let v = Vector2::ZERO;
        let _ = v[2];
    }

    #[test]
    fn jiggle_only_touches_zero_components() {
        let mut rng = Lcg::default();
        let v = Vector3::new([1.5, 0.0, -2.0]).jiggled(&mut rng);

        assert_eq!(v[0], 1.5);
        assert_eq!(v[2], -2.0);
        assert!(v[1] != 0.0);
        assert!(v[1].abs() < 1e-6);
    }

    #[test]
    fn jiggled_zero_vector_has_length() {
        let mut rng = Lcg::default();
        let v = Vector2::ZERO.jiggled(&mut rng);
        assert!(v.length() > 0.0);
        assert!(v.length() < 1e-6);
    }

    #[test]
    fn serializes_as_sequence() {
        let v = Vector3::new([1.0, -2.5, 0.0]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[1.0,-2.5,0.0]");

        let back: Vector3 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(serde_json::from_str::<Vector2>("[1.0]").is_err());
        assert!(serde_json::from_str::<Vector2>("[1.0, 2.0, 3.0]").is_err());
    }
}
