use crate::category::Category;
use crate::config::DEFAULT_NEIGHBORS;
use crate::dataset::{DatasetSource, ReferenceDataset};
use crate::error::ModelError;
use crate::features::FeatureVector;
use crate::model::distance::manhattan_distance;
use crate::model::Classifier;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row of the reference dataset.
    pub index: usize,
    pub distance: f64,
    pub category: Category,
}

/// Brute-force Manhattan k-Nearest-Neighbor classifier.
///
/// Every query is compared against every reference point. Neighbors are
/// ranked with a stable sort, so equal distances keep dataset order, and the
/// vote picks the first label reaching the highest count in neighbor order.
/// With two neighbors that disagree, the nearer one wins.
#[derive(Debug, Clone)]
pub struct ManhattanKnn {
    dataset: ReferenceDataset,
    k: usize,
}

impl ManhattanKnn {
    pub fn new(dataset: ReferenceDataset, k: usize) -> Result<Self, ModelError> {
        if k == 0 {
            return Err(ModelError::data_load("neighbor count must be at least 1"));
        }
        info!("Initializing Manhattan KNN (Reference rows: {}, k: {})", dataset.len(), k);
        Ok(Self { dataset, k })
    }

    /// Loads the reference tables once and keeps them for the classifier's lifetime.
    pub fn from_source(source: &dyn DatasetSource, k: usize) -> Result<Self, ModelError> {
        let dataset = source.load()?;
        info!("Loaded {} ({} rows)", source.describe(), dataset.len());
        Self::new(dataset, k)
    }

    pub fn with_default_k(dataset: ReferenceDataset) -> Result<Self, ModelError> {
        Self::new(dataset, DEFAULT_NEIGHBORS)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn dataset(&self) -> &ReferenceDataset {
        &self.dataset
    }

    /// The `k` closest reference rows, nearest first.
    pub fn nearest(&self, query: &FeatureVector) -> Vec<Neighbor> {
        let labels = self.dataset.labels();
        let mut ranked: Vec<(f64, usize)> = self
            .dataset
            .points()
            .iter()
            .enumerate()
            .map(|(j, point)| (manhattan_distance(query, point), j))
            .collect();

        // sort_by is stable; NaN distances land after every finite one
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        ranked.truncate(self.k);

        ranked
            .into_iter()
            .map(|(distance, index)| Neighbor { index, distance, category: labels[index] })
            .collect()
    }

    pub fn predict_one(&self, query: &FeatureVector) -> Category {
        let neighbors = self.nearest(query);
        // ReferenceDataset is never empty and k >= 1, so neighbors[0] exists
        vote_from(neighbors[0].category, neighbors[1..].iter().map(|n| n.category))
    }
}

/// Counts `first` and then `rest` in arrival order and returns the first
/// label with the highest count.
pub fn vote_from<I>(first: Category, rest: I) -> Category
where
    I: IntoIterator<Item = Category>,
{
    let mut tally: Vec<(Category, usize)> = vec![(first, 1)];
    for vote in rest {
        match tally.iter_mut().find(|(c, _)| *c == vote) {
            Some((_, count)) => *count += 1,
            None => tally.push((vote, 1)),
        }
    }

    let (mut best, mut top) = tally[0];
    for &(category, count) in &tally[1..] {
        if count > top {
            best = category;
            top = count;
        }
    }
    best
}

/// `vote_from` over a whole ballot. `None` only for an empty ballot.
pub fn majority_vote<I>(votes: I) -> Option<Category>
where
    I: IntoIterator<Item = Category>,
{
    let mut votes = votes.into_iter();
    let first = votes.next()?;
    Some(vote_from(first, votes))
}

impl Classifier for ManhattanKnn {
    fn predict(&self, queries: &[FeatureVector]) -> Result<Vec<Category>, ModelError> {
        Ok(queries.iter().map(|q| self.predict_one(q)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(points: Vec<FeatureVector>, labels: Vec<Category>) -> ReferenceDataset {
        ReferenceDataset::new(points, labels).unwrap()
    }

    #[test]
    fn test_majority_vote_prefers_first_seen_on_tie() {
        use crate::category::Category::*;
        assert_eq!(majority_vote([Moderate, Good]), Some(Moderate));
        assert_eq!(majority_vote([Good, Moderate]), Some(Good));
        assert_eq!(majority_vote([Unhealthy, Good, Good]), Some(Good));
        assert_eq!(majority_vote([VeryUnhealthy, Good, Good, VeryUnhealthy]), Some(VeryUnhealthy));
        assert_eq!(majority_vote(Vec::new()), None);
    }

    #[test]
    fn test_vote_from_counts_the_seed() {
        use crate::category::Category::*;
        assert_eq!(vote_from(Good, []), Good);
        assert_eq!(vote_from(Unhealthy, [Moderate]), Unhealthy);
        assert_eq!(vote_from(Unhealthy, [Moderate, Moderate]), Moderate);
        assert_eq!(vote_from(Good, [Moderate, Good]), Good);
    }

    #[test]
    fn test_two_of_two_nearest_agree() {
        let ds = dataset(
            vec![[0.0; 6], [0.1; 6], [0.9; 6]],
            vec![Category::Unhealthy, Category::Unhealthy, Category::Good],
        );
        let knn = ManhattanKnn::with_default_k(ds).unwrap();
        assert_eq!(knn.predict_one(&[0.05; 6]), Category::Unhealthy);
        assert_eq!(knn.predict_one(&[0.2; 6]), Category::Unhealthy);
    }

    #[test]
    fn test_disagreeing_pair_resolves_to_nearest() {
        let ds = dataset(vec![[0.0; 6], [1.0; 6]], vec![Category::Good, Category::Moderate]);
        let knn = ManhattanKnn::with_default_k(ds).unwrap();
        assert_eq!(knn.predict_one(&[0.1; 6]), Category::Good);
        assert_eq!(knn.predict_one(&[0.9; 6]), Category::Moderate);
    }

    #[test]
    fn test_equal_distances_keep_dataset_order() {
        // Rows 1 and 2 are both at distance 0.2 from the query; row 0 is far.
        let ds = dataset(
            vec![[5.0; 6], [0.2, 0.0, 0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0, 0.0, 0.2]],
            vec![Category::Good, Category::VeryUnhealthy, Category::Moderate],
        );
        let knn = ManhattanKnn::new(ds, 1).unwrap();
        let n = knn.nearest(&[0.0; 6]);
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].index, 1);
        assert_eq!(knn.predict_one(&[0.0; 6]), Category::VeryUnhealthy);
    }

    #[test]
    fn test_k_larger_than_dataset_uses_everything() {
        let ds = dataset(vec![[0.0; 6]], vec![Category::Moderate]);
        let knn = ManhattanKnn::new(ds, 5).unwrap();
        assert_eq!(knn.nearest(&[3.0; 6]).len(), 1);
        assert_eq!(knn.predict_one(&[3.0; 6]), Category::Moderate);
    }

    #[test]
    fn test_nan_query_still_classified() {
        let ds = dataset(vec![[0.0; 6], [1.0; 6]], vec![Category::Good, Category::Unhealthy]);
        let knn = ManhattanKnn::with_default_k(ds).unwrap();
        let mut q = [0.1; 6];
        q[2] = f64::NAN;
        // Both distances are NaN, so dataset order decides.
        assert_eq!(knn.predict_one(&q), Category::Good);
    }

    #[test]
    fn test_zero_k_rejected() {
        let ds = dataset(vec![[0.0; 6]], vec![Category::Good]);
        assert!(ManhattanKnn::new(ds, 0).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let ds = dataset(vec![[0.0; 6]], vec![Category::Good]);
        let knn = ManhattanKnn::with_default_k(ds).unwrap();
        assert!(knn.predict(&[]).unwrap().is_empty());
    }
}
