use crate::{Axis, Point};
use serde::{Deserialize, Serialize};

/// An axis-aligned hyper-rectangle: the ordered product of `D` half-open
/// `Axis` intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    axes: Vec<Axis>,
}

impl Bound {
    pub fn new(axes: Vec<Axis>) -> Bound {
        assert!(!axes.is_empty(), "a bound needs at least one dimension");
        Bound { axes }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    #[inline]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// `2^D`, the number of children a subdivision produces.
    #[inline]
    pub fn child_count(&self) -> usize {
        1usize << self.dim()
    }

    /// A bound is empty when any axis has zero size: it cannot be
    /// subdivided any further (its children would be identical to itself).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.axes.iter().any(Axis::is_empty)
    }

    /// `origin_i <= p_i < to_i` for every dimension. Dimension mismatch is
    /// simply "not contained", not an error.
    pub fn is_within(&self, p: &Point) -> bool {
        if p.dim() != self.dim() {
            return false;
        }
        self.axes
            .iter()
            .zip(p.coords())
            .all(|(axis, &v)| axis.contains(v))
    }

    /// Half-open intersection test, axis by axis. Dimension mismatch means
    /// no intersection is possible.
    pub fn is_intersection(&self, other: &Bound) -> bool {
        if self.dim() != other.dim() {
            return false;
        }
        self.axes
            .iter()
            .zip(&other.axes)
            .all(|(a, b)| a.intersects(b))
    }

    /// Splits every axis at its midpoint, producing `2^D` child bounds.
    /// Child index `k` selects, per dimension `i`, the upper half of axis
    /// `i` iff bit `i` of `k` is set. Index order matches the bit-encoding
    /// used by `QuadNode`'s child id array.
    pub fn child_bounds(&self) -> Vec<Bound> {
        (0..self.child_count())
            .map(|k| {
                let axes = self
                    .axes
                    .iter()
                    .enumerate()
                    .map(|(i, axis)| {
                        if (k >> i) & 1 == 1 {
                            axis.upper_half()
                        } else {
                            axis.lower_half()
                        }
                    })
                    .collect();
                Bound::new(axes)
            })
            .collect()
    }

    /// The unique child index containing `p`, if any.
    pub fn child_index_for(&self, p: &Point) -> Option<usize> {
        self.child_bounds()
            .iter()
            .position(|child| child.is_within(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(lo: f64, hi: f64) -> Bound {
        Bound::new(vec![Axis::new(lo, hi), Axis::new(lo, hi)])
    }

    #[test]
    fn child_count_is_power_of_two() {
        let b = square(0.0, 10.0);
        assert_eq!(b.child_count(), 4);
        assert_eq!(b.child_bounds().len(), 4);
    }

    #[test]
    fn children_partition_the_bound() {
        let b = square(0.0, 10.0);
        let children = b.child_bounds();
        // every corner-ish sample point lands in exactly one child
        let samples = [
            Point::from([1.0, 1.0]),
            Point::from([9.0, 1.0]),
            Point::from([1.0, 9.0]),
            Point::from([9.0, 9.0]),
            Point::from([5.0, 5.0]),
        ];
        for p in &samples {
            let hits = children.iter().filter(|c| c.is_within(p)).count();
            assert_eq!(hits, 1, "{:?} should land in exactly one child", p);
        }
    }

    #[test]
    fn intersection_is_half_open() {
        let a = square(0.0, 10.0);
        let b = Bound::new(vec![Axis::new(10.0, 20.0), Axis::new(0.0, 10.0)]);
        // touching at x=10 on a half-open axis: no intersection
        assert!(!a.is_intersection(&b));
        let c = Bound::new(vec![Axis::new(9.999, 20.0), Axis::new(0.0, 10.0)]);
        assert!(a.is_intersection(&c));
    }

    #[test]
    fn dimension_mismatch_is_not_within_and_not_intersecting() {
        let a = square(0.0, 10.0);
        let b = Bound::new(vec![Axis::new(0.0, 10.0)]);
        assert!(!a.is_intersection(&b));
        assert!(!a.is_within(&Point::from([1.0])));
    }

    #[test]
    fn empty_bound_cannot_subdivide_meaningfully() {
        let b = Bound::new(vec![Axis::new(5.0, 5.0), Axis::new(0.0, 10.0)]);
        assert!(b.is_empty());
        // children still computed but degenerate on the empty axis
        for child in b.child_bounds() {
            assert!(child.is_empty());
        }
    }

    proptest! {
        #[test]
        fn every_point_in_bound_lands_in_exactly_one_nonempty_child(
            lo in -100.0f64..100.0, span in 0.1f64..100.0,
            x in 0.0f64..1.0, y in 0.0f64..1.0,
        ) {
            let hi = lo + span;
            let b = square(lo, hi);
            let p = Point::from([lo + x * span, lo + y * span]);
            prop_assume!(b.is_within(&p));
            let hits = b.child_bounds().iter().filter(|c| c.is_within(&p)).count();
            prop_assert_eq!(hits, 1);
        }
    }
}
