//! Accepted strokes, ordered by the darkness left after each one.
//!
//! Because greedy selection only ever lowers the residual darkness, key
//! order is also acceptance order, and a threshold cut is a prefix of
//! the collection. Equal darkness values are told apart by an insertion
//! sequence number so no record ever replaces another.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::shape::Stroke;

/// Ordering key: ascending negated darkness, then insertion order.
#[derive(Debug, Clone, Copy)]
pub struct StrokeKey {
    sort_key: f32,
    sequence: u64,
}

impl StrokeKey {
    /// The negated darkness this stroke was recorded with.
    #[must_use]
    pub const fn sort_key(self) -> f32 {
        self.sort_key
    }

    /// Residual darkness at the time the stroke was accepted.
    #[must_use]
    pub fn darkness(self) -> f32 {
        -self.sort_key
    }
}

impl PartialEq for StrokeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StrokeKey {}

impl PartialOrd for StrokeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrokeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key
            .total_cmp(&other.sort_key)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// One accepted stroke.
#[derive(Debug, Clone)]
pub struct StrokeRecord<A> {
    /// Geometry in residue space.
    pub shape: Stroke,
    /// Factory state for continuing from this stroke.
    pub attachment: A,
}

/// Accepted strokes in key order.
#[derive(Debug, Clone)]
pub struct StrokeSet<A> {
    records: BTreeMap<StrokeKey, StrokeRecord<A>>,
    next_sequence: u64,
}

impl<A> Default for StrokeSet<A> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_sequence: 0,
        }
    }
}

impl<A> StrokeSet<A> {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stroke accepted with residual `darkness`.
    pub fn insert(&mut self, darkness: f32, record: StrokeRecord<A>) -> StrokeKey {
        let key = StrokeKey {
            sort_key: -darkness,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.records.insert(key, record);
        key
    }

    /// Drop every stroke. Sequence numbers keep counting up.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of accepted strokes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no stroke has been accepted since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The weakest stroke, which is also the most recently accepted.
    #[must_use]
    pub fn last(&self) -> Option<(StrokeKey, &StrokeRecord<A>)> {
        self.records.last_key_value().map(|(k, r)| (*k, r))
    }

    /// Darkness of the weakest stroke.
    #[must_use]
    pub fn last_darkness(&self) -> Option<f32> {
        self.last().map(|(k, _)| k.darkness())
    }

    /// All strokes, darkest first.
    pub fn iter(&self) -> impl Iterator<Item = (StrokeKey, &StrokeRecord<A>)> {
        self.records.iter().map(|(k, r)| (*k, r))
    }

    /// Strokes whose darkness is strictly above `threshold`, darkest
    /// first. Iteration stops at the first stroke at or below the
    /// threshold; key order guarantees every later one is weaker.
    pub fn above(&self, threshold: f32) -> impl Iterator<Item = &StrokeRecord<A>> {
        self.records
            .iter()
            .take_while(move |(k, _)| k.darkness() > threshold)
            .map(|(_, r)| r)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::curve::PointsCurve;
    use crate::shape::SingleCurve;
    use crate::types::Point;

    fn record(tag: u32) -> StrokeRecord<u32> {
        StrokeRecord {
            shape: Arc::new(SingleCurve(PointsCurve::line(
                Point::new(0.0, 0.0),
                Point::new(1.0, 1.0),
            ))),
            attachment: tag,
        }
    }

    #[test]
    fn iteration_is_descending_darkness() {
        let mut set = StrokeSet::new();
        set.insert(0.4, record(1));
        set.insert(0.9, record(2));
        set.insert(0.1, record(3));
        let keys: Vec<StrokeKey> = set.iter().map(|(k, _)| k).collect();
        for pair in keys.windows(2) {
            assert!(pair[0].sort_key() <= pair[1].sort_key());
        }
        let tags: Vec<u32> = set.iter().map(|(_, r)| r.attachment).collect();
        assert_eq!(tags, vec![2, 1, 3]);
    }

    #[test]
    fn equal_darkness_keeps_both_in_insertion_order() {
        let mut set = StrokeSet::new();
        set.insert(0.5, record(1));
        set.insert(0.5, record(2));
        set.insert(0.5, record(3));
        assert_eq!(set.len(), 3);
        let tags: Vec<u32> = set.iter().map(|(_, r)| r.attachment).collect();
        assert_eq!(tags, vec![1, 2, 3]);
        assert_eq!(set.last().unwrap().1.attachment, 3);
    }

    #[test]
    fn last_is_weakest() {
        let mut set = StrokeSet::new();
        assert!(set.last_darkness().is_none());
        set.insert(0.8, record(1));
        set.insert(0.3, record(2));
        assert!((set.last_darkness().unwrap() - 0.3).abs() < f32::EPSILON);
        assert_eq!(set.last().unwrap().1.attachment, 2);
    }

    #[test]
    fn above_threshold_is_strict_prefix() {
        let mut set = StrokeSet::new();
        for (i, d) in [0.9, 0.7, 0.5, 0.5, 0.2].into_iter().enumerate() {
            set.insert(d, record(u32::try_from(i).unwrap()));
        }
        let tags: Vec<u32> = set.above(0.5).map(|r| r.attachment).collect();
        assert_eq!(tags, vec![0, 1]);
        assert_eq!(set.above(0.0).count(), 5);
        assert_eq!(set.above(1.0).count(), 0);
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = StrokeSet::new();
        set.insert(0.5, record(1));
        set.clear();
        assert!(set.is_empty());
    }
}
