//! Tie-aware ranking.
//!
//! Ranks follow competition ranking (`1, 1, 3, 4, 4, 6`): equal scores share a
//! rank, and the next distinct score is ranked by its position in the sequence.
//! The same function ranks windows read from the store and from the cache, so a
//! fixed input always produces the same ranks regardless of its source.

pub mod types;


pub use types::{RankedEntry, ScoredMember};

/// Ranks a window of members that is already sorted by score, highest first.
///
/// `offset` is the zero-based position of the first member in the full ordering,
/// so the first element is ranked `offset + 1`. Ties are only resolved within the
/// window: a tie group that starts on an earlier page is not carried over.
///
/// # Preconditions
///
/// `window` must be sorted by score descending. Both adapters return sorted data;
/// unsorted input is not detected and yields meaningless ranks.
pub fn rank_window<I>(window: I, offset: u64) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = ScoredMember>,
{
    let iter = window.into_iter();
    let mut entries = Vec::with_capacity(iter.size_hint().0);
    let mut current_rank = offset + 1;
    let mut previous_score: Option<i32> = None;

    for (index, member) in iter.enumerate() {
        if let Some(previous) = previous_score
            && previous != member.score
        {
            current_rank = offset + index as u64 + 1;
        }
        previous_score = Some(member.score);

        entries.push(RankedEntry {
            rank: current_rank,
            username: member.username,
            score: member.score,
        });
    }

    entries
}

/// Converts "number of members with a strictly higher score" into a rank.
#[inline]
pub fn rank_from_higher_count(higher: u64) -> u64 {
    higher + 1
}

/// Zero-based position of the first member on `page` (1-based).
#[inline]
pub fn window_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}
