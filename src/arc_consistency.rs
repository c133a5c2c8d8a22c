//! This module contains a crossword-specific implementation of the AC-3 algorithm for establishing
//! and maintaining arc consistency. For our purposes, a directed arc (x, y) is consistent when
//! every word left in x's domain has at least one word in y's domain with the same letter in the
//! cell where the two slots cross.
//!
//! Rather than comparing every pair of words, each slot's domain keeps a count of how many of its
//! remaining words have each glyph in each cell (see `util.rs`). A word in x is supported by y
//! exactly when y's count for that word's crossing glyph is nonzero.

use log::trace;
use std::collections::{HashSet, VecDeque};

use crate::domain_store::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;

/// A directed constraint: revising `(x, y)` narrows x's domain to words supported by y.
pub type DirectedArc = (SlotId, SlotId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were revised.
    pub revisions: usize,

    /// How many words were removed across all domains.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`, identifying the slot whose domain was
/// wiped out. Any eliminations made before the wipeout are left in place, so callers that want to
/// recover should restore a checkpoint taken beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
    pub revisions: usize,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make slot `x` arc-consistent with slot `y` by removing every word from x's domain that has no
/// compatible word in y's domain. A word too short to reach the crossing cell can't be compatible
/// with anything. Returns true iff x's domain shrank; if the slots don't cross, nothing happens.
pub fn revise(config: &GridConfig, domains: &mut DomainStore, x: SlotId, y: SlotId) -> bool {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return false;
    };

    let unsupported: Vec<WordId> = domains
        .words(x)
        .filter(|&word_id| {
            config.word_list.words[word_id]
                .glyph_at(x_cell)
                .map_or(true, |glyph| domains.glyph_count(y, y_cell, glyph) == 0)
        })
        .collect();

    for &word_id in &unsupported {
        domains.eliminate(config, x, word_id);
    }

    !unsupported.is_empty()
}

/// Build the starting queue of arcs: (x, y) for each slot x in `slot_ids` (or every slot, if
/// `None`) and each slot y crossing it.
#[must_use]
pub fn initial_arcs(config: &GridConfig, slot_ids: Option<&[SlotId]>) -> Vec<DirectedArc> {
    let slot_ids: Vec<SlotId> = slot_ids.map_or_else(
        || (0..config.slot_configs.len()).collect(),
        <[SlotId]>::to_vec,
    );

    slot_ids
        .into_iter()
        .flat_map(|x| config.neighbors(x).map(move |y| (x, y)))
        .collect()
}

/// Run AC-3 over the grid, starting from the arcs leaving `slot_ids` (or from every arc, if
/// `None`). Whenever revising (x, y) shrinks x's domain, every arc (z, x) with z != y is queued
/// again, since words in z may have lost their only support in x. Stops with a failure as soon as
/// any domain is emptied.
pub fn establish_arc_consistency(
    config: &GridConfig,
    domains: &mut DomainStore,
    slot_ids: Option<&[SlotId]>,
) -> ArcConsistencyResult {
    let mut queue: VecDeque<DirectedArc> = VecDeque::new();
    let mut queued: HashSet<DirectedArc> = HashSet::new();

    for arc in initial_arcs(config, slot_ids) {
        if queued.insert(arc) {
            queue.push_back(arc);
        }
    }

    let mut success = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));

        let option_count = domains.len(x);
        success.revisions += 1;

        if !revise(config, domains, x, y) {
            continue;
        }

        success.eliminations += option_count - domains.len(x);

        if domains.is_empty(x) {
            trace!(
                "Domain of slot {} wiped out by slot {}",
                config.slot_configs[x].slot_key(),
                config.slot_configs[y].slot_key(),
            );
            return Err(ArcConsistencyFailure {
                slot_id: x,
                revisions: success.revisions,
            });
        }

        for z in config.neighbors(x) {
            if z != y && queued.insert((z, x)) {
                queue.push_back((z, x));
            }
        }
    }

    Ok(success)
}
