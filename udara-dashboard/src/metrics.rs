use udara_core::{Category, FeatureVector, Pollutant, N_FEATURES};

/// Aggregates over a labeled set of readings, as shown on every dashboard page.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub rows: usize,
    /// Only categories that occur, in severity order.
    pub counts: Vec<(Category, usize)>,
    /// Per-category pollutant means, same order as `counts`.
    pub means: Vec<(Category, FeatureVector)>,
    /// Pearson correlation of each pollutant with the numeric label.
    pub correlations: [Option<f64>; N_FEATURES],
}

impl CategorySummary {
    pub fn from_rows(features: &[FeatureVector], labels: &[Category]) -> Self {
        let rows = features.len().min(labels.len());
        let features = &features[..rows];
        let labels = &labels[..rows];

        let mut counts = Vec::new();
        let mut means = Vec::new();
        for category in Category::ALL {
            let mut sum = [0.0; N_FEATURES];
            let mut n = 0usize;
            for (v, _) in features.iter().zip(labels).filter(|(_, c)| **c == category) {
                for (acc, x) in sum.iter_mut().zip(v) {
                    *acc += x;
                }
                n += 1;
            }
            if n > 0 {
                counts.push((category, n));
                means.push((category, sum.map(|s| s / n as f64)));
            }
        }

        let numeric: Vec<f64> = labels.iter().map(|c| f64::from(c.label())).collect();
        let mut correlations = [None; N_FEATURES];
        for p in Pollutant::ALL {
            let column: Vec<f64> = features.iter().map(|v| v[p.index()]).collect();
            correlations[p.index()] = pearson(&column, &numeric);
        }

        Self { rows, counts, means, correlations }
    }

    pub fn count(&self, category: Category) -> usize {
        self.counts.iter().find(|(c, _)| *c == category).map_or(0, |(_, n)| *n)
    }

    /// Plain-text rendering for non-interactive runs.
    pub fn render(&self) -> String {
        let mut out = format!("Rows: {}\n\nCategory counts:\n", self.rows);
        for (category, n) in &self.counts {
            out.push_str(&format!("  {:<20} {}\n", category.localized(), n));
        }

        out.push_str("\nMeans per category:\n  category            ");
        for p in Pollutant::ALL {
            out.push_str(&format!("{:>9}", p.column()));
        }
        out.push('\n');
        for (category, mean) in &self.means {
            out.push_str(&format!("  {:<20}", category.localized()));
            for v in mean {
                out.push_str(&format!("{:>9.2}", v));
            }
            out.push('\n');
        }

        out.push_str("\nCorrelation with label:\n");
        for p in Pollutant::ALL {
            let r = self.correlations[p.index()].map_or_else(|| "n/a".to_string(), |r| format!("{:.3}", r));
            out.push_str(&format!("  {:<6} {}\n", p.column(), r));
        }
        out
    }
}

/// Sample Pearson coefficient. `None` below two points or when either
/// series is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pearson_perfect_and_inverse() {
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0);
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0]), None);
    }

    #[test]
    fn test_summary_counts_in_severity_order() {
        let features = vec![[10.0; 6], [200.0; 6], [20.0; 6], [40.0; 6]];
        let labels = vec![Category::Good, Category::VeryUnhealthy, Category::Good, Category::Moderate];
        let s = CategorySummary::from_rows(&features, &labels);

        assert_eq!(s.rows, 4);
        assert_eq!(
            s.counts,
            vec![(Category::Good, 2), (Category::Moderate, 1), (Category::VeryUnhealthy, 1)]
        );
        assert_eq!(s.count(Category::Unhealthy), 0);
        assert_eq!(s.means[0], (Category::Good, [15.0; 6]));
        assert!(s.correlations.iter().all(|r| r.unwrap() > 0.9));
    }

    #[test]
    fn test_single_class_has_no_correlation() {
        let s = CategorySummary::from_rows(&[[1.0; 6], [2.0; 6]], &[Category::Good, Category::Good]);
        assert!(s.correlations.iter().all(Option::is_none));
        assert!(s.render().contains("n/a"));
    }

    #[test]
    fn test_empty_summary() {
        let s = CategorySummary::from_rows(&[], &[]);
        assert_eq!(s.rows, 0);
        assert!(s.counts.is_empty());
    }
}
