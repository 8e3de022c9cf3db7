use tracing::info;

use crate::constants::SHORTLIST_KEEP_RATIO;

use super::types::{MatchCandidate, ShortlistResult};

/// How many of `total` ranked candidates survive: `max(1, floor(total * 0.4))`, or 0 when empty.
pub fn shortlist_size(total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let keep = (total as f64 * SHORTLIST_KEEP_RATIO).floor() as usize;
    keep.clamp(1, total)
}

/// Keeps the top 40% of an already ranked list.
pub fn shortlist(mut ranked: Vec<MatchCandidate>) -> ShortlistResult {
    let total = ranked.len();
    let keep = shortlist_size(total);
    ranked.truncate(keep);

    let result = ShortlistResult {
        kept: ranked,
        eliminated_count: total - keep,
    };

    info!(
        total,
        kept = result.kept.len(),
        eliminated = result.eliminated_count,
        "Shortlist applied"
    );

    result
}
