//! # Outstanding Votes
//!
//! Consumers pin a domain to a minimum voltage by voting for one of its
//! levels. Votes are kept as a priority list, highest voltage first, and are
//! keyed by the voltage value itself rather than by level index. That makes
//! them fragile across a table rewrite: a vote keyed at an old nominal stops
//! matching anything once the nominal changes, and the floor it granted is
//! silently lost. [`VoteList::rekey`] moves every such vote to the new value
//! of the same level.
//!
//! ```text
//!   old table      new table       votes before      votes after
//!   [0] 800000     [0] 800000      gpu  @ 1000000    gpu  @ 1200000
//!   [1] 900000 ──▶ [1] 1100000     dss  @  900000    dss  @ 1100000
//!   [2] 1000000    [2] 1200000     misc @  850000    misc @  850000
//! ```

extern crate alloc;
use alloc::vec::Vec;

use customvoltage_hal::MicroVolt;

/// An active request pinning a domain to at least `volt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    /// Requesting consumer
    pub consumer: &'static str,
    /// Requested voltage; the key of the vote
    pub volt: MicroVolt,
}

/// Priority list of votes, highest voltage first, FIFO among equal keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteList {
    votes: Vec<Vote>,
}

impl VoteList {
    /// Create an empty list
    pub const fn new() -> Self {
        Self { votes: Vec::new() }
    }

    /// Add or replace the vote of `consumer`, returning the previous key
    pub fn add(&mut self, consumer: &'static str, volt: MicroVolt) -> Option<MicroVolt> {
        let previous = self.remove(consumer);
        let pos = self
            .votes
            .iter()
            .position(|v| v.volt < volt)
            .unwrap_or(self.votes.len());
        self.votes.insert(pos, Vote { consumer, volt });
        previous
    }

    /// Drop the vote of `consumer`
    pub fn remove(&mut self, consumer: &'static str) -> Option<MicroVolt> {
        let pos = self.votes.iter().position(|v| v.consumer == consumer)?;
        Some(self.votes.remove(pos).volt)
    }

    /// The winning vote
    pub fn highest(&self) -> Option<Vote> {
        self.votes.first().copied()
    }

    /// Votes in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Vote> {
        self.votes.iter()
    }

    /// Number of votes
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Move votes from old level values to new ones
    ///
    /// `old` and `new` are the nominal values of the same levels before and
    /// after the rewrite. Each vote is matched against `old` in table order
    /// and the first equal level wins. Votes matching nothing keep their key.
    /// Returns the number of votes that matched a level.
    pub fn rekey(&mut self, old: &[MicroVolt], new: &[MicroVolt]) -> usize {
        let mut matched = 0;

        for vote in self.votes.iter_mut() {
            let level = old.iter().position(|&v| v == vote.volt);
            if let Some(&volt) = level.and_then(|i| new.get(i)) {
                vote.volt = volt;
                matched += 1;
            }
        }

        // A non-monotonic new table can reorder keys; sort is stable.
        self.votes.sort_by(|a, b| b.volt.cmp(&a.volt));

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn consumers(list: &VoteList) -> Vec<&'static str> {
        list.iter().map(|v| v.consumer).collect()
    }

    #[test]
    fn test_priority_order() {
        let mut list = VoteList::new();
        list.add("dss", MicroVolt(900_000));
        list.add("gpu", MicroVolt(1_000_000));
        list.add("misc", MicroVolt(900_000));

        assert_eq!(consumers(&list), vec!["gpu", "dss", "misc"]);
        assert_eq!(list.highest().map(|v| v.consumer), Some("gpu"));
    }

    #[test]
    fn test_replace_vote() {
        let mut list = VoteList::new();
        list.add("gpu", MicroVolt(900_000));
        let previous = list.add("gpu", MicroVolt(1_000_000));

        assert_eq!(previous, Some(MicroVolt(900_000)));
        assert_eq!(list.len(), 1);
        assert_eq!(list.remove("gpu"), Some(MicroVolt(1_000_000)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_rekey_follows_level() {
        let old = [MicroVolt(800_000), MicroVolt(900_000), MicroVolt(1_000_000)];
        let new = [MicroVolt(800_000), MicroVolt(1_100_000), MicroVolt(1_200_000)];

        let mut list = VoteList::new();
        list.add("gpu", MicroVolt(1_000_000));
        list.add("dss", MicroVolt(900_000));
        list.add("misc", MicroVolt(850_000));

        assert_eq!(list.rekey(&old, &new), 2);

        let keys: Vec<_> = list.iter().map(|v| (v.consumer, v.volt)).collect();
        assert_eq!(
            keys,
            vec![
                ("gpu", MicroVolt(1_200_000)),
                ("dss", MicroVolt(1_100_000)),
                ("misc", MicroVolt(850_000)),
            ]
        );
    }

    #[test]
    fn test_rekey_keeps_list_sorted() {
        let old = [MicroVolt(800_000), MicroVolt(900_000)];
        let new = [MicroVolt(950_000), MicroVolt(900_000)];

        let mut list = VoteList::new();
        list.add("hi", MicroVolt(900_000));
        list.add("lo", MicroVolt(800_000));
        list.rekey(&old, &new);

        assert_eq!(consumers(&list), vec!["lo", "hi"]);
        assert_eq!(list.highest().map(|v| v.volt), Some(MicroVolt(950_000)));
    }

    #[test]
    fn test_rekey_duplicate_levels_first_match() {
        let old = [MicroVolt(900_000), MicroVolt(900_000)];
        let new = [MicroVolt(910_000), MicroVolt(920_000)];

        let mut list = VoteList::new();
        list.add("gpu", MicroVolt(900_000));
        list.rekey(&old, &new);

        assert_eq!(list.highest().map(|v| v.volt), Some(MicroVolt(910_000)));
    }
}
