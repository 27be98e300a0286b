use ndarray::{s, Array1, Array2, ArrayView1};
use whosaid_core::ClassifierError;

/// A labeled training set for one pairwise comparison. Labels are
/// strictly provenance: every row from the first user is 0.0, every row
/// from the second is 1.0, regardless of how either side was ordered
/// when loaded.
pub struct TrainingSet {
    pub features: Array2<f32>,
    pub labels: Array1<f32>,
}

impl TrainingSet {
    /// Stack `a_vectors` above `b_vectors` into one feature matrix. All
    /// vectors must share one width; a disagreement means the embedding
    /// provider drifted between ingests.
    pub fn assemble(
        a_vectors: &[Vec<f32>],
        b_vectors: &[Vec<f32>],
    ) -> Result<Self, ClassifierError> {
        let dims = a_vectors
            .first()
            .or_else(|| b_vectors.first())
            .map(Vec::len)
            .unwrap_or(0);
        let rows = a_vectors.len() + b_vectors.len();

        let mut features = Array2::<f32>::zeros((rows, dims));
        for (i, vector) in a_vectors.iter().chain(b_vectors).enumerate() {
            if vector.len() != dims {
                return Err(ClassifierError::DimensionMismatch {
                    expected: dims,
                    actual: vector.len(),
                });
            }
            features.row_mut(i).assign(&ArrayView1::from(vector.as_slice()));
        }

        let mut labels = Array1::<f32>::zeros(rows);
        labels.slice_mut(s![a_vectors.len()..]).fill(1.0);

        Ok(Self { features, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f32]) -> Vec<f32> {
        values.to_vec()
    }

    #[test]
    fn labels_count_matches_provenance() {
        let a = vec![v(&[1.0, 0.0]), v(&[0.9, 0.1]), v(&[0.8, 0.2])];
        let b = vec![v(&[0.0, 1.0]), v(&[0.1, 0.9])];
        let set = TrainingSet::assemble(&a, &b).unwrap();

        assert_eq!(set.features.nrows(), 5);
        assert_eq!(set.features.ncols(), 2);
        assert_eq!(set.labels.iter().filter(|&&l| l == 0.0).count(), 3);
        assert_eq!(set.labels.iter().filter(|&&l| l == 1.0).count(), 2);
        // A's rows come first, in load order.
        assert_eq!(set.features.row(0).to_vec(), vec![1.0, 0.0]);
        assert_eq!(set.features.row(3).to_vec(), vec![0.0, 1.0]);
        assert_eq!(set.labels.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn ragged_widths_are_rejected() {
        let a = vec![v(&[1.0, 0.0])];
        let b = vec![v(&[0.0, 1.0, 0.5])];
        assert!(matches!(
            TrainingSet::assemble(&a, &b),
            Err(ClassifierError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn ragged_widths_within_one_user_are_rejected() {
        let a = vec![v(&[1.0, 0.0]), v(&[1.0])];
        let b = vec![v(&[0.0, 1.0])];
        assert!(TrainingSet::assemble(&a, &b).is_err());
    }
}
