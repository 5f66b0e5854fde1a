use std::ops::{Bound, RangeBounds};

use crate::error::Result;

/// Abstract storage engine interface (byte-level operations)
///
/// Different from store::Store which operates on tables and rows.
pub trait Engine {
    type ScanIterator<'a>: Iterator<Item = Result<(Vec<u8>, Vec<u8>)>>
    where
        Self: 'a;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;
    fn get(&mut self, key: Vec<u8>) -> Result<Option<Vec<u8>>>;
    fn delete(&mut self, key: Vec<u8>) -> Result<()>;
    fn scan(&mut self, range: impl RangeBounds<Vec<u8>>) -> Self::ScanIterator<'_>;

    /// Prefix scan using lexicographic ordering
    ///
    /// Converts prefix scan to range scan by incrementing the last byte.
    /// For example, prefix "apple" becomes range ["apple", "applf").
    fn scan_prefix(&mut self, prefix: Vec<u8>) -> Self::ScanIterator<'_> {
        let start = Bound::Included(prefix.clone());
        let mut bound_prefix = prefix;
        if let Some(last) = bound_prefix.iter_mut().last() {
            *last += 1;
        };
        let end = Bound::Excluded(bound_prefix);
        self.scan((start, end))
    }
}
