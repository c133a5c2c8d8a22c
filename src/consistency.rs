use std::collections::HashMap;
use std::fmt;

use crate::assignment::Assignment;
use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;

/// The first rule broken by an assignment, as found by `find_violation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyViolation {
    /// The word's length differs from the slot's.
    LengthMismatch { slot_id: SlotId, word_id: WordId },

    /// Two crossing slots disagree about the letter in their shared cell.
    CrossingMismatch {
        slot_id: SlotId,
        other_slot_id: SlotId,
    },

    /// The same word is assigned to two different slots.
    DuplicateWord {
        slot_id: SlotId,
        other_slot_id: SlotId,
        word_id: WordId,
    },
}

impl fmt::Display for ConsistencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyViolation::LengthMismatch { slot_id, word_id } => {
                write!(f, "word {word_id} doesn't fit slot {slot_id}")
            }
            ConsistencyViolation::CrossingMismatch {
                slot_id,
                other_slot_id,
            } => write!(f, "slots {slot_id} and {other_slot_id} disagree where they cross"),
            ConsistencyViolation::DuplicateWord {
                slot_id,
                other_slot_id,
                word_id,
            } => write!(
                f,
                "word {word_id} is used by both slot {other_slot_id} and slot {slot_id}"
            ),
        }
    }
}

/// Check an assignment (which may be partial) against every constraint that applies to the slots
/// it covers, returning the first violation found.
#[must_use]
pub fn find_violation(config: &GridConfig, assignment: &Assignment) -> Option<ConsistencyViolation> {
    let mut slot_by_word: HashMap<WordId, SlotId> = HashMap::with_capacity(assignment.slot_count());

    for (slot_id, word_id) in assignment.iter() {
        let slot_config = &config.slot_configs[slot_id];
        let word = &config.word_list.words[word_id];

        if word.len() != slot_config.length {
            return Some(ConsistencyViolation::LengthMismatch { slot_id, word_id });
        }

        if let Some(&other_slot_id) = slot_by_word.get(&word_id) {
            return Some(ConsistencyViolation::DuplicateWord {
                slot_id,
                other_slot_id,
                word_id,
            });
        }
        slot_by_word.insert(word_id, slot_id);

        for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
            let Some(crossing) = crossing else {
                continue;
            };
            let Some(other_word_id) = assignment.get(crossing.other_slot_id) else {
                continue;
            };

            let other_word = &config.word_list.words[other_word_id];
            if word.glyph_at(cell_idx) != other_word.glyph_at(crossing.other_slot_cell) {
                return Some(ConsistencyViolation::CrossingMismatch {
                    slot_id,
                    other_slot_id: crossing.other_slot_id,
                });
            }
        }
    }

    None
}

/// Do the words in this assignment fit their slots, agree wherever they cross, and appear at most
/// once each?
#[must_use]
pub fn is_consistent(config: &GridConfig, assignment: &Assignment) -> bool {
    find_violation(config, assignment).is_none()
}

/// Does every slot in the grid hold a non-empty word?
#[must_use]
pub fn is_complete(config: &GridConfig, assignment: &Assignment) -> bool {
    (0..config.slot_configs.len()).all(|slot_id| {
        assignment
            .get(slot_id)
            .map_or(false, |word_id| !config.word_list.words[word_id].is_empty())
    })
}

#[cfg(test)]
mod tests {
    use crate::assignment::{Assignment, Choice};
    use crate::consistency::{find_violation, is_complete, is_consistent, ConsistencyViolation};
    use crate::grid_config::tests::{generate_config, slot_id_for};

    #[test]
    fn test_crossing_mismatch() {
        let config = generate_config(
            "
            ___
            #_#
            #_#
            ",
            &["CAT", "DOG", "ARC"],
        );
        let config_ref = config.to_config_ref();
        let word_id = |word: &str| config.word_list.word_id(word).unwrap();
        let across = slot_id_for(&config, "0,0,across,3");
        let down = slot_id_for(&config, "0,1,down,3");

        let mut assignment = Assignment::new(2);
        assignment.assign(across, word_id("CAT"));
        assert!(is_consistent(&config_ref, &assignment));
        assert!(!is_complete(&config_ref, &assignment));

        assignment.assign(down, word_id("DOG"));
        assert!(matches!(
            find_violation(&config_ref, &assignment),
            Some(ConsistencyViolation::CrossingMismatch { .. })
        ));
        assert!(is_complete(&config_ref, &assignment));

        assignment.assign(down, word_id("ARC"));
        assert!(is_consistent(&config_ref, &assignment));
        assert!(is_complete(&config_ref, &assignment));

        // Checking doesn't change anything, so rechecking gives the same answer.
        let copy = assignment.clone();
        assert!(is_consistent(&config_ref, &assignment));
        assert_eq!(assignment, copy);
    }

    #[test]
    fn test_length_mismatch() {
        let config = generate_config(
            "
            ____
            ",
            &["WORD", "CAT"],
        );
        let config_ref = config.to_config_ref();

        let mut assignment = Assignment::new(1);
        assignment.assign(0, config.word_list.word_id("CAT").unwrap());

        assert_eq!(
            find_violation(&config_ref, &assignment),
            Some(ConsistencyViolation::LengthMismatch {
                slot_id: 0,
                word_id: 1
            })
        );
    }

    #[test]
    fn test_duplicate_word_is_rejected_even_without_crossing() {
        // The two slots don't cross, and the only word that fits both is "TOY".
        let config = generate_config(
            "
            ___
            ###
            ___
            ",
            &["TOY"],
        );
        let config_ref = config.to_config_ref();
        let toy = config.word_list.word_id("TOY").unwrap();

        let assignment = Assignment::from_choices(
            2,
            &[
                Choice {
                    slot_id: 0,
                    word_id: toy,
                },
                Choice {
                    slot_id: 1,
                    word_id: toy,
                },
            ],
        );

        assert!(is_complete(&config_ref, &assignment));
        assert_eq!(
            find_violation(&config_ref, &assignment),
            Some(ConsistencyViolation::DuplicateWord {
                slot_id: 1,
                other_slot_id: 0,
                word_id: toy,
            })
        );
    }

    #[test]
    fn test_empty_assignment_is_consistent() {
        let config = generate_config(
            "
            __
            ",
            &["AB"],
        );
        let config_ref = config.to_config_ref();

        assert!(is_consistent(&config_ref, &Assignment::new(1)));
        assert!(!is_complete(&config_ref, &Assignment::new(1)));
    }
}
