//! Axis-aligned boxes and their 2^D-way subdivision

use crate::vector::Vector;

/// An axis-aligned box in D dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<const D: usize> {
    /// Minimum corner
    pub min: Vector<D>,
    /// Maximum corner
    pub max: Vector<D>,
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: Vector<D>, max: Vector<D>) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` for an empty slice
    pub fn covering(points: &[Vector<D>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(
            Self::new(*first, *first),
            |bounds, p| Self {
                min: Vector::from_fn(|k| bounds.min[k].min(p[k])),
                max: Vector::from_fn(|k| bounds.max[k].max(p[k])),
            },
        ))
    }

    /// Grow the box by `margin` on every side
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            min: Vector::from_fn(|k| self.min[k] - margin),
            max: Vector::from_fn(|k| self.max[k] + margin),
        }
    }

    pub fn center(&self) -> Vector<D> {
        Vector::from_fn(|k| (self.min[k] + self.max[k]) / 2.0)
    }

    /// Characteristic size: the longest side
    pub fn size(&self) -> f64 {
        (0..D)
            .map(|k| self.max[k] - self.min[k])
            .fold(0.0, f64::max)
    }

    pub fn contains(&self, point: &Vector<D>) -> bool {
        (0..D).all(|k| self.min[k] <= point[k] && point[k] <= self.max[k])
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Vector::from_fn(|k| self.min[k].min(other.min[k])),
            max: Vector::from_fn(|k| self.max[k].max(other.max[k])),
        }
    }

    /// Which of the 2^D children a point falls into.
    ///
    /// Bit `k` is set when the point lies in the upper half along axis `k`.
    /// A point exactly on the midpoint goes to the upper half.
    pub fn orthant(&self, point: &Vector<D>) -> usize {
        let center = self.center();
        (0..D).fold(0, |acc, k| acc | (usize::from(point[k] >= center[k]) << k))
    }

    /// Sub-box for the given orthant (see [`BoundingBox::orthant`])
    pub fn child(&self, orthant: usize) -> Self {
        let center = self.center();
        let upper = |k: usize| orthant & (1 << k) != 0;
        Self {
            min: Vector::from_fn(|k| if upper(k) { center[k] } else { self.min[k] }),
            max: Vector::from_fn(|k| if upper(k) { self.max[k] } else { center[k] }),
        }
    }
}
