//! Variable and value ordering for the backtracking search. Everything here only reads the domain
//! store, so scores for one slot can't be skewed by changes made while scoring another.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::assignment::Assignment;
use crate::domain_store::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;

/// The unassigned slots tied for best under the minimum-remaining-values heuristic, with ties
/// narrowed to the slots crossing the most other slots. Empty if every slot is assigned.
#[must_use]
pub fn best_unassigned_slots(
    config: &GridConfig,
    domains: &DomainStore,
    assignment: &Assignment,
) -> Vec<SlotId> {
    let unassigned: Vec<SlotId> = assignment.unassigned_slot_ids().collect();

    let Some(min_option_count) = unassigned.iter().map(|&slot_id| domains.len(slot_id)).min()
    else {
        return vec![];
    };

    let most_constrained: Vec<SlotId> = unassigned
        .into_iter()
        .filter(|&slot_id| domains.len(slot_id) == min_option_count)
        .collect();

    let max_degree = most_constrained
        .iter()
        .map(|&slot_id| config.degree(slot_id))
        .max()
        .unwrap_or(0);

    most_constrained
        .into_iter()
        .filter(|&slot_id| config.degree(slot_id) == max_degree)
        .collect()
}

/// Choose the next slot to fill: one of `best_unassigned_slots`, picked at random.
pub fn select_unassigned_variable<R: Rng + ?Sized>(
    config: &GridConfig,
    domains: &DomainStore,
    assignment: &Assignment,
    rng: &mut R,
) -> Option<SlotId> {
    best_unassigned_slots(config, domains, assignment)
        .choose(rng)
        .copied()
}

/// How many words would putting `word_id` in `slot_id` rule out of the domains of the unassigned
/// slots crossing it?
#[must_use]
pub fn count_ruled_out(
    config: &GridConfig,
    domains: &DomainStore,
    slot_id: SlotId,
    word_id: WordId,
    assignment: &Assignment,
) -> usize {
    let word = &config.word_list.words[word_id];

    config.slot_configs[slot_id]
        .crossings
        .iter()
        .enumerate()
        .filter_map(|(cell_idx, crossing)| crossing.as_ref().map(|crossing| (cell_idx, crossing)))
        .filter(|(_, crossing)| !assignment.is_assigned(crossing.other_slot_id))
        .map(|(cell_idx, crossing)| {
            let matching = word.glyph_at(cell_idx).map_or(0, |glyph| {
                domains.glyph_count(crossing.other_slot_id, crossing.other_slot_cell, glyph) as usize
            });
            domains.len(crossing.other_slot_id).saturating_sub(matching)
        })
        .sum()
}

/// The words in a slot's domain, ordered so that the ones ruling out the fewest options for
/// crossing slots come first. Ties keep their domain order.
#[must_use]
pub fn order_domain_values(
    config: &GridConfig,
    domains: &DomainStore,
    slot_id: SlotId,
    assignment: &Assignment,
) -> Vec<WordId> {
    let mut values: Vec<WordId> = domains.words(slot_id).collect();
    values.sort_by_cached_key(|&word_id| {
        count_ruled_out(config, domains, slot_id, word_id, assignment)
    });
    values
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use crate::assignment::Assignment;
    use crate::domain_store::DomainStore;
    use crate::grid_config::load_grid_config;
    use crate::grid_config::tests::{generate_config, slot_id_for};
    use crate::heuristics::{
        best_unassigned_slots, count_ruled_out, order_domain_values, select_unassigned_variable,
    };
    use crate::word_list::tests::resource_path;
    use crate::word_list::WordList;

    #[test]
    fn test_mrv_with_degree_tie_break() {
        let word_list = WordList::from_file(resource_path("words0.txt")).unwrap();
        let config = load_grid_config(word_list, resource_path("structure0.txt")).unwrap();
        let config_ref = config.to_config_ref();
        let mut domains = DomainStore::new(&config_ref);
        domains.enforce_node_consistency(&config_ref);

        let across_top = slot_id_for(&config, "0,1,across,3");
        let down_left = slot_id_for(&config, "0,1,down,5");
        let across_bottom = slot_id_for(&config, "4,1,across,4");
        let down_right = slot_id_for(&config, "1,4,down,4");

        // Three slots have three options each; of those, two cross two other slots.
        assert_eq!(domains.len(across_top), 4);
        let mut best = best_unassigned_slots(&config_ref, &domains, &Assignment::new(4));
        best.sort_unstable();
        let mut expected = vec![down_left, across_bottom];
        expected.sort_unstable();
        assert_eq!(best, expected);

        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..20 {
            let selected =
                select_unassigned_variable(&config_ref, &domains, &Assignment::new(4), &mut rng)
                    .unwrap();
            assert!(expected.contains(&selected));
        }

        // Assigned slots are never candidates.
        let mut assignment = Assignment::new(4);
        assignment.assign(down_left, config.word_list.word_id("SEVEN").unwrap());
        assignment.assign(across_bottom, config.word_list.word_id("NINE").unwrap());
        assert_eq!(
            best_unassigned_slots(&config_ref, &domains, &assignment),
            vec![down_right]
        );

        assignment.assign(down_right, config.word_list.word_id("FIVE").unwrap());
        assignment.assign(across_top, config.word_list.word_id("SIX").unwrap());
        assert!(best_unassigned_slots(&config_ref, &domains, &assignment).is_empty());
        assert_eq!(
            select_unassigned_variable(&config_ref, &domains, &assignment, &mut rng),
            None
        );
    }

    #[test]
    fn test_least_constraining_value_first() {
        let config = generate_config(
            "
            ___
            #_#
            #_#
            ",
            &["CAT", "DOG", "ARC", "ACE", "ODE"],
        );
        let config_ref = config.to_config_ref();
        let across = slot_id_for(&config, "0,0,across,3");
        let down = slot_id_for(&config, "0,1,down,3");
        let word_id = |word: &str| config.word_list.word_id(word).unwrap();
        let mut domains = DomainStore::new(&config_ref);
        domains.enforce_node_consistency(&config_ref);
        let assignment = Assignment::new(2);

        // CAT's middle letter starts two down words; ARC's starts none.
        assert_eq!(
            count_ruled_out(&config_ref, &domains, across, word_id("CAT"), &assignment),
            3
        );
        assert_eq!(
            count_ruled_out(&config_ref, &domains, across, word_id("ARC"), &assignment),
            5
        );

        let ordered: Vec<&str> = order_domain_values(&config_ref, &domains, across, &assignment)
            .into_iter()
            .map(|word_id| config.word_list.words[word_id].normalized_string.as_str())
            .collect();
        assert_eq!(ordered, vec!["CAT", "DOG", "ACE", "ODE", "ARC"]);

        // Once the crossing slot is assigned, nothing is ruled out and domain order is kept.
        let mut assignment = Assignment::new(2);
        assignment.assign(down, word_id("ACE"));
        assert_eq!(
            count_ruled_out(&config_ref, &domains, across, word_id("ARC"), &assignment),
            0
        );
        assert_eq!(
            order_domain_values(&config_ref, &domains, across, &assignment),
            domains.words(across).collect::<Vec<_>>()
        );
    }
}
