//! Fixed-size batching over an ordered record sequence

use std::iter::Enumerate;
use std::slice::Chunks;

use crate::error::ConfigError;
use crate::record::Record;

/// One submission unit: a borrowed, ordered slice of the source sequence.
///
/// `index` is the batch's 0-based position in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a, T = Record> {
    pub index: usize,
    pub records: &'a [T],
}

impl<T> Batch<'_, T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Batch<'_, Record> {
    /// JSON array request body.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self.records)
    }
}

/// Splits sequences into batches of `size` (the last may be shorter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    size: usize,
}

impl Batcher {
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::BatchSize(size));
        }
        Ok(Self { size })
    }

    /// Lazy batch sequence. Each call starts again from the first item.
    pub fn batches<'a, T>(&self, items: &'a [T]) -> Batches<'a, T> {
        Batches {
            inner: items.chunks(self.size).enumerate(),
        }
    }

    /// Number of batches `len` items split into.
    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.size)
    }
}

/// Iterator returned by [`Batcher::batches`].
#[derive(Debug, Clone)]
pub struct Batches<'a, T> {
    inner: Enumerate<Chunks<'a, T>>,
}

impl<'a, T> Iterator for Batches<'a, T> {
    type Item = Batch<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(index, records)| Batch { index, records })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Batches<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_config_error() {
        assert_eq!(Batcher::new(0), Err(ConfigError::BatchSize(0)));
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let batcher = Batcher::new(100).unwrap();
        let items: [u32; 0] = [];
        assert_eq!(batcher.batches(&items).count(), 0);
        assert_eq!(batcher.batch_count(0), 0);
    }

    #[test]
    fn partitions_without_gaps_or_overlap() {
        for n in 0..40usize {
            let items: Vec<usize> = (0..n).collect();
            for size in 1..12usize {
                let batcher = Batcher::new(size).unwrap();
                let batches: Vec<_> = batcher.batches(&items).collect();

                assert_eq!(batches.len(), n.div_ceil(size), "n={n} size={size}");
                assert_eq!(batcher.batch_count(n), batches.len());

                for (i, b) in batches.iter().enumerate() {
                    assert_eq!(b.index, i);
                    if i + 1 < batches.len() {
                        assert_eq!(b.len(), size);
                    } else {
                        let expect = if n % size == 0 { size } else { n % size };
                        assert_eq!(b.len(), expect, "last batch n={n} size={size}");
                    }
                }

                let joined: Vec<usize> = batches.iter().flat_map(|b| b.records).copied().collect();
                assert_eq!(joined, items);
            }
        }
    }

    #[test]
    fn restartable() {
        let batcher = Batcher::new(2).unwrap();
        let items = [1, 2, 3];
        let first: Vec<_> = batcher.batches(&items).collect();
        let second: Vec<_> = batcher.batches(&items).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn exact_size() {
        let batcher = Batcher::new(100).unwrap();
        let items = vec![0u8; 250];
        let mut it = batcher.batches(&items);
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
    }

    #[test]
    fn batch_json_is_array_of_objects() {
        let records = vec![
            Record::from_pairs([("id", "1")]),
            Record::from_pairs([("id", "2")]),
        ];
        let batch = Batcher::new(10).unwrap().batches(&records).next().unwrap();
        let body = batch.to_json().unwrap();
        assert_eq!(body, br#"[{"id":"1"},{"id":"2"}]"#);
    }
}
