use std::fmt;

use crate::grid_config::SlotId;
use crate::types::WordId;

/// A struct recording a single slot assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial or complete mapping from slots to words, indexed by `SlotId`. The search engine
/// builds and unwinds this stack-style as it explores.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
}

impl Assignment {
    /// An empty assignment for a grid with the given number of slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
        }
    }

    /// Build an assignment from a list of choices.
    #[must_use]
    pub fn from_choices(slot_count: usize, choices: &[Choice]) -> Assignment {
        let mut assignment = Assignment::new(slot_count);
        for choice in choices {
            assignment.assign(choice.slot_id, choice.word_id);
        }
        assignment
    }

    /// Assign a word to a slot, returning whatever was previously assigned.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        self.words[slot_id].replace(word_id)
    }

    /// Remove a slot from the assignment, returning the word it held.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id].take()
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    #[must_use]
    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    /// The number of slots in the grid this assignment belongs to.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.words.len()
    }

    /// The number of slots that currently hold a word.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.words.iter().flatten().count()
    }

    /// Iterate over `(slot_id, word_id)` pairs for every assigned slot.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// Iterate over the ids of slots that don't hold a word yet.
    pub fn unassigned_slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, word_id)| word_id.is_none())
            .map(|(slot_id, _)| slot_id)
    }

    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.iter()
            .map(|(slot_id, word_id)| Choice { slot_id, word_id })
            .collect()
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
