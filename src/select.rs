// src/select.rs
//! Global top-N over the ranked pool. No per-source quota: a strong source may fill every slot.

use crate::ranking::ScoredItem;

/// Keep the first `top_n` items of an already-ranked list.
pub fn select(mut ranked: Vec<ScoredItem>, top_n: usize) -> Vec<ScoredItem> {
    ranked.truncate(top_n);
    ranked
}
