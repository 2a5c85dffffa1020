use serde::{Deserialize, Serialize};

/// An ordered sequence of `D` real-valued coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    coords: Vec<f64>,
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Point {
        Point { coords }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    #[inline]
    pub fn get(&self, axis: usize) -> f64 {
        self.coords[axis]
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Point {
        Point::new(coords)
    }
}

impl<const N: usize> From<[f64; N]> for Point {
    fn from(coords: [f64; N]) -> Point {
        Point::new(coords.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_componentwise() {
        let a = Point::new(vec![1.0, 2.0]);
        let b = Point::from([1.0, 2.0]);
        assert_eq!(a, b);
        assert_ne!(a, Point::new(vec![1.0, 2.0, 3.0]));
        assert_ne!(a, Point::new(vec![1.0, 2.1]));
    }
}
