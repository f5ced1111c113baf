use crate::features::FeatureVector;

/// L1 (Manhattan) Distance
/// Sums the absolute per-feature differences, left to right.
#[inline]
pub fn manhattan_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_manhattan_basics() {
        let origin = [0.0; 6];
        assert_relative_eq!(manhattan_distance(&origin, &origin), 0.0);
        assert_relative_eq!(manhattan_distance(&origin, &[1.0; 6]), 6.0);
        assert_relative_eq!(
            manhattan_distance(&[1.0, -2.0, 0.5, 0.0, 0.0, 3.0], &[0.0, 2.0, 0.0, 0.0, 1.0, 0.0]),
            1.0 + 4.0 + 0.5 + 0.0 + 1.0 + 3.0
        );
    }

    #[test]
    fn test_manhattan_is_symmetric() {
        let a = [0.3, 0.1, 0.9, 0.4, 0.2, 0.7];
        let b = [0.5, 0.6, 0.1, 0.0, 0.8, 0.3];
        assert_eq!(manhattan_distance(&a, &b), manhattan_distance(&b, &a));
    }
}
