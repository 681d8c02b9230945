use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use super::PredictionError;

/// Collects per-record outcomes of one batch, keyed by 0-based input position.
pub struct ResultAggregator<T> {
    batch_size: usize,
    entries: BTreeMap<usize, T>,
    failures: BTreeMap<usize, PredictionError>,
}

impl<T> ResultAggregator<T> {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            entries: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, position: usize, output: T) {
        self.entries.insert(position, output);
    }

    pub fn record_failure(&mut self, error: PredictionError) {
        self.failures.insert(error.position(), error);
    }

    /// Finish the batch. A non-empty batch in which every record failed is a
    /// failed batch and yields its first failure.
    pub fn finish(mut self) -> Result<Predictions<T>, PredictionError> {
        if self.entries.is_empty() {
            if let Some((_, first)) = self.failures.pop_first() {
                return Err(first);
            }
        }
        Ok(Predictions {
            batch_size: self.batch_size,
            entries: self.entries,
            failures: self.failures,
        })
    }
}

/// Results of one batch in submission order.
///
/// Serializes as a JSON object keyed by position (`"0"`, `"1"`, ...) with
/// `null` for positions that have no result.
#[derive(Debug)]
pub struct Predictions<T> {
    batch_size: usize,
    entries: BTreeMap<usize, T>,
    failures: BTreeMap<usize, PredictionError>,
}

impl<T> Predictions<T> {
    /// Number of submitted records.
    pub fn len(&self) -> usize {
        self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.batch_size == 0
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.entries.get(&position)
    }

    /// Successful results in position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries.iter().map(|(position, output)| (*position, output))
    }

    pub fn success_count(&self) -> usize {
        self.entries.len()
    }

    pub fn failures(&self) -> &BTreeMap<usize, PredictionError> {
        &self.failures
    }

    /// True when every submitted position has a result.
    pub fn is_complete(&self) -> bool {
        self.entries.len() == self.batch_size
    }
}

impl<T: Serialize> Serialize for Predictions<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.batch_size))?;
        for position in 0..self.batch_size {
            map.serialize_entry(&position.to_string(), &self.entries.get(&position))?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn missing(position: usize) -> PredictionError {
        PredictionError::MissingDependency {
            position,
            field: "grade",
        }
    }

    #[test]
    fn test_positions_follow_insertion_order() {
        let mut aggregator = ResultAggregator::new(3);
        aggregator.record(0, "a");
        aggregator.record(1, "b");
        aggregator.record(2, "c");
        let predictions = aggregator.finish().unwrap();

        assert!(predictions.is_complete());
        let positions: Vec<usize> = predictions.iter().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(
            serde_json::to_value(&predictions).unwrap(),
            json!({ "0": "a", "1": "b", "2": "c" })
        );
    }

    #[test]
    fn test_failed_positions_serialize_as_null() {
        let mut aggregator = ResultAggregator::new(2);
        aggregator.record(0, 4.5);
        aggregator.record_failure(missing(1));
        let predictions = aggregator.finish().unwrap();

        assert!(!predictions.is_complete());
        assert_eq!(predictions.failures().len(), 1);
        assert_eq!(
            serde_json::to_value(&predictions).unwrap(),
            json!({ "0": 4.5, "1": null })
        );
    }

    #[test]
    fn test_all_failed_batch_is_an_error() {
        let mut aggregator: ResultAggregator<f64> = ResultAggregator::new(2);
        aggregator.record_failure(missing(1));
        aggregator.record_failure(missing(0));
        let err = aggregator.finish().unwrap_err();
        assert_eq!(err.position(), 0);
    }

    #[test]
    fn test_empty_batch_is_empty_object() {
        let predictions = ResultAggregator::<f64>::new(0).finish().unwrap();
        assert!(predictions.is_empty());
        assert_eq!(serde_json::to_value(&predictions).unwrap(), json!({}));
    }
}
