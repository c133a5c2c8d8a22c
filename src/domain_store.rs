//! This module holds the mutable state of a fill attempt: the set of words still considered
//! possible for each slot. Every elimination made after node consistency is recorded on a trail,
//! so a search frame can take a `Checkpoint` before trying a value and later roll the store back
//! to exactly the state it saw.

use std::fmt;
use std::fmt::{Debug, Formatter};

use crate::grid_config::{GridConfig, SlotId};
use crate::types::{GlyphId, WordId};
use crate::util::{build_glyph_counts_by_cell, GlyphCountsByCell};
use crate::CHECK_INVARIANTS;

/// The live domain of a single slot.
#[derive(Clone)]
pub struct SlotDomain {
    /// Properties duplicated from `SlotConfig` for convenience.
    id: SlotId,
    length: usize,

    /// Every word this slot could ever hold. This starts out as the whole vocabulary and is
    /// narrowed once by node consistency; after that, removals are tracked in `eliminations`.
    options: Vec<WordId>,

    /// Record of which words have been eliminated from this slot, indexed by `WordId`.
    eliminations: Vec<bool>,

    /// To enable us to quickly check crossing slots, we maintain a count of the number of
    /// instances of each glyph in each cell in our remaining options.
    glyph_counts_by_cell: GlyphCountsByCell,

    /// How many entries of `options` are still available.
    remaining_option_count: usize,
}

impl Debug for SlotDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotDomain")
            .field("id", &self.id)
            .field("length", &self.length)
            .field("remaining_option_count", &self.remaining_option_count)
            .finish()
    }
}

impl SlotDomain {
    fn add_elimination(&mut self, config: &GridConfig, word_id: WordId) {
        if CHECK_INVARIANTS && self.eliminations[word_id] {
            panic!("Eliminating word {word_id} from slot {} twice?", self.id);
        }

        self.eliminations[word_id] = true;
        self.remaining_option_count -= 1;

        let word = &config.word_list.words[word_id];
        for (cell_idx, &glyph) in word.glyphs.iter().take(self.length).enumerate() {
            self.glyph_counts_by_cell[cell_idx][glyph] -= 1;
        }
    }

    fn remove_elimination(&mut self, config: &GridConfig, word_id: WordId) {
        if CHECK_INVARIANTS && !self.eliminations[word_id] {
            panic!("Restoring word {word_id} to slot {} twice?", self.id);
        }

        self.eliminations[word_id] = false;
        self.remaining_option_count += 1;

        let word = &config.word_list.words[word_id];
        for (cell_idx, &glyph) in word.glyphs.iter().take(self.length).enumerate() {
            self.glyph_counts_by_cell[cell_idx][glyph] += 1;
        }
    }
}

/// A position in the elimination trail, returned by `DomainStore::checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

/// The current domain of every slot in a grid.
#[derive(Debug, Clone)]
pub struct DomainStore {
    domains: Vec<SlotDomain>,

    /// Every elimination made since node consistency, in order.
    trail: Vec<(SlotId, WordId)>,
}

impl DomainStore {
    /// Create a store in which every slot's domain is the whole vocabulary.
    #[must_use]
    pub fn new(config: &GridConfig) -> DomainStore {
        let word_count = config.word_list.words.len();
        let all_words: Vec<WordId> = (0..word_count).collect();

        let domains = config
            .slot_configs
            .iter()
            .map(|slot_config| SlotDomain {
                id: slot_config.id,
                length: slot_config.length,
                glyph_counts_by_cell: build_glyph_counts_by_cell(
                    config.word_list,
                    slot_config.length,
                    &all_words,
                ),
                options: all_words.clone(),
                eliminations: vec![false; word_count],
                remaining_option_count: word_count,
            })
            .collect();

        DomainStore {
            domains,
            trail: vec![],
        }
    }

    /// Remove every word whose length differs from its slot's length. This is a one-time filter
    /// that has to happen before any checkpoint is taken, since it isn't recorded on the trail.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig) {
        if CHECK_INVARIANTS && !self.trail.is_empty() {
            panic!("Enforcing node consistency after eliminations were recorded?");
        }

        for domain in &mut self.domains {
            let length = domain.length;
            let eliminations = &domain.eliminations;
            domain.options.retain(|&word_id| {
                !eliminations[word_id] && config.word_list.words[word_id].len() == length
            });

            domain.eliminations.fill(true);
            for &word_id in &domain.options {
                domain.eliminations[word_id] = false;
            }
            domain.remaining_option_count = domain.options.len();
            domain.glyph_counts_by_cell =
                build_glyph_counts_by_cell(config.word_list, length, &domain.options);
        }
    }

    /// Remove a word from a slot's domain, recording the removal so it can be undone.
    pub fn eliminate(&mut self, config: &GridConfig, slot_id: SlotId, word_id: WordId) {
        self.domains[slot_id].add_elimination(config, word_id);
        self.trail.push((slot_id, word_id));
    }

    /// Reduce a slot's domain to the single given word. Returns false (without changing
    /// anything) if the word isn't currently in the domain.
    pub fn restrict_to(&mut self, config: &GridConfig, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.contains(slot_id, word_id) {
            return false;
        }

        let others: Vec<WordId> = self
            .words(slot_id)
            .filter(|&other_id| other_id != word_id)
            .collect();
        for other_id in others {
            self.eliminate(config, slot_id, other_id);
        }

        true
    }

    /// Mark the current state so that it can be restored later.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.trail.len())
    }

    /// Undo every elimination made since the given checkpoint, newest first.
    pub fn restore(&mut self, config: &GridConfig, checkpoint: Checkpoint) {
        if CHECK_INVARIANTS && checkpoint.0 > self.trail.len() {
            panic!("Restoring to a checkpoint that was already unwound?");
        }

        let start = checkpoint.0.min(self.trail.len());
        for (slot_id, word_id) in self.trail.drain(start..).rev() {
            self.domains[slot_id].remove_elimination(config, word_id);
        }
    }

    /// The number of eliminations recorded since node consistency.
    #[must_use]
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        let domain = &self.domains[slot_id];
        word_id < domain.eliminations.len() && !domain.eliminations[word_id]
    }

    /// The number of words left in a slot's domain.
    #[must_use]
    pub fn len(&self, slot_id: SlotId) -> usize {
        self.domains[slot_id].remaining_option_count
    }

    #[must_use]
    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.len(slot_id) == 0
    }

    /// The first slot whose domain has been wiped out, if any.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        (0..self.domains.len()).find(|&slot_id| self.is_empty(slot_id))
    }

    /// Iterate over the words left in a slot's domain, in vocabulary order.
    pub fn words(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        let domain = &self.domains[slot_id];
        domain
            .options
            .iter()
            .copied()
            .filter(move |&word_id| !domain.eliminations[word_id])
    }

    /// How many words left in a slot's domain have the given glyph in the given cell?
    #[must_use]
    pub fn glyph_count(&self, slot_id: SlotId, cell_idx: usize, glyph: GlyphId) -> u32 {
        self.domains[slot_id]
            .glyph_counts_by_cell
            .get(cell_idx)
            .and_then(|counts| counts.get(glyph))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain_store::DomainStore;
    use crate::grid_config::tests::{generate_config, slot_id_for};

    #[test]
    fn test_node_consistency_filters_by_length() {
        let config = generate_config(
            "
            ____
            ",
            &["WORD", "GAME", "CAT", "HORSES"],
        );
        let config_ref = config.to_config_ref();
        let mut domains = DomainStore::new(&config_ref);

        assert_eq!(domains.len(0), 4);

        domains.enforce_node_consistency(&config_ref);

        let words: Vec<&str> = domains
            .words(0)
            .map(|word_id| config.word_list.words[word_id].normalized_string.as_str())
            .collect();
        assert_eq!(words, vec!["WORD", "GAME"]);
        assert_eq!(domains.len(0), 2);
        assert!(!domains.contains(0, config.word_list.word_id("cat").unwrap()));
        assert_eq!(domains.trail_len(), 0);
    }

    #[test]
    fn test_node_consistency_can_empty_a_domain() {
        let config = generate_config(
            "
            _____
            ",
            &["WORD", "GAME"],
        );
        let config_ref = config.to_config_ref();
        let mut domains = DomainStore::new(&config_ref);
        domains.enforce_node_consistency(&config_ref);

        assert!(domains.is_empty(0));
        assert_eq!(domains.first_empty_slot(), Some(0));
    }

    #[test]
    fn test_restore_is_exact() {
        let config = generate_config(
            "
            ___
            _##
            _##
            ",
            &["CAT", "COT", "CAR", "ARC", "TAR"],
        );
        let config_ref = config.to_config_ref();
        let across = slot_id_for(&config, "0,0,across,3");
        let down = slot_id_for(&config, "0,0,down,3");
        let word_list = &config.word_list;
        let c = word_list.glyph_id_by_char[&'C'];

        let mut domains = DomainStore::new(&config_ref);
        domains.enforce_node_consistency(&config_ref);
        let before = domains.clone();
        let before_words: Vec<_> = domains.words(across).collect();
        let before_count = domains.glyph_count(across, 0, c);

        let checkpoint = domains.checkpoint();
        domains.eliminate(&config_ref, down, word_list.word_id("TAR").unwrap());
        assert!(domains.restrict_to(&config_ref, across, word_list.word_id("COT").unwrap()));
        assert_eq!(domains.len(across), 1);
        assert_eq!(domains.glyph_count(across, 0, c), 1);

        let nested = domains.checkpoint();
        domains.eliminate(&config_ref, down, word_list.word_id("CAT").unwrap());
        assert_eq!(domains.len(down), 3);
        domains.restore(&config_ref, nested);
        assert_eq!(domains.len(down), 4);

        domains.restore(&config_ref, checkpoint);

        assert_eq!(domains.words(across).collect::<Vec<_>>(), before_words);
        assert_eq!(domains.glyph_count(across, 0, c), before_count);
        for slot_id in 0..domains.slot_count() {
            assert_eq!(domains.len(slot_id), before.len(slot_id));
            assert_eq!(
                domains.words(slot_id).collect::<Vec<_>>(),
                before.words(slot_id).collect::<Vec<_>>()
            );
        }
        assert_eq!(domains.trail_len(), 0);
    }

    #[test]
    fn test_restrict_to_missing_word_is_a_no_op() {
        let config = generate_config(
            "
            ___
            ",
            &["CAT", "DOG", "HORSE"],
        );
        let config_ref = config.to_config_ref();
        let mut domains = DomainStore::new(&config_ref);
        domains.enforce_node_consistency(&config_ref);

        let horse = config.word_list.word_id("HORSE").unwrap();
        assert!(!domains.restrict_to(&config_ref, 0, horse));
        assert_eq!(domains.len(0), 2);
    }
}
