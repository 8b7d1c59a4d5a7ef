//! Per-subtree aggregates carried by the spatial tree

use crate::vector::Vector;

/// A summary value folded bottom-up through the tree.
///
/// The tree does not interpret the value. It only needs an identity, a way to
/// fold one value into another, and a representative position for
/// Barnes-Hut distance checks.
pub trait Delegate<const D: usize>: Clone {
    /// Aggregate of an empty subtree
    fn empty() -> Self;

    /// Fold `other` into `self`
    fn combine(&mut self, other: &Self);

    /// Representative position of the subtree
    fn centroid(&self) -> Vector<D>;
}

/// Accumulated strength and strength-weighted centroid.
///
/// The centroid is weighted by the absolute strength, so clusters that mix
/// repulsive and attractive members still get a position inside their box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassCentroid<const D: usize> {
    /// Signed sum of member strengths
    pub strength: f64,
    /// Sum of absolute member strengths
    pub weight: f64,
    /// Sum of position * |strength|
    pub weighted_sum: Vector<D>,
    /// Number of members
    pub count: usize,
    /// Unweighted sum of member positions
    pub position_sum: Vector<D>,
}

impl<const D: usize> MassCentroid<D> {
    /// Aggregate for a single point
    pub fn point(strength: f64, position: Vector<D>) -> Self {
        Self {
            strength,
            weight: strength.abs(),
            weighted_sum: position * strength.abs(),
            count: 1,
            position_sum: position,
        }
    }
}

impl<const D: usize> Delegate<D> for MassCentroid<D> {
    fn empty() -> Self {
        Self {
            strength: 0.0,
            weight: 0.0,
            weighted_sum: Vector::ZERO,
            count: 0,
            position_sum: Vector::ZERO,
        }
    }

    fn combine(&mut self, other: &Self) {
        self.strength += other.strength;
        self.weight += other.weight;
        self.weighted_sum += other.weighted_sum;
        self.count += other.count;
        self.position_sum += other.position_sum;
    }

    fn centroid(&self) -> Vector<D> {
        if self.weight > 0.0 {
            self.weighted_sum / self.weight
        } else if self.count > 0 {
            self.position_sum / self.count as f64
        } else {
            Vector::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector2;

    #[test]
    fn combine_weights_centroid() {
        let mut agg = MassCentroid::point(-1.0, Vector2::new([0.0, 0.0]));
        agg.combine(&MassCentroid::point(-3.0, Vector2::new([4.0, 0.0])));

        assert_eq!(agg.strength, -4.0);
        assert_eq!(agg.count, 2);
        assert_eq!(agg.centroid(), Vector2::new([3.0, 0.0]));
    }

    #[test]
    fn zero_strength_falls_back_to_mean() {
        let mut agg = MassCentroid::point(0.0, Vector2::new([0.0, 2.0]));
        agg.combine(&MassCentroid::point(0.0, Vector2::new([2.0, 0.0])));
        assert_eq!(agg.centroid(), Vector2::new([1.0, 1.0]));
    }

    #[test]
    fn empty_is_identity() {
        let point = MassCentroid::point(-2.0, Vector2::new([1.0, 1.0]));
        let mut agg = MassCentroid::empty();
        agg.combine(&point);
        assert_eq!(agg, point);
    }
}
