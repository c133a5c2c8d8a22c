//! This module implements grid-filling using recursive backtracking search. Before searching we
//! make every domain node-consistent and arc-consistent; during the search, every tentative
//! choice is propagated with AC-3 over the slots that are still unassigned, so dead ends show up
//! as soon as some crossing slot runs out of options.
//!
//! Each search frame takes a checkpoint of the domain store before trying a value and restores it
//! afterward, so sibling branches always start from the same domains.

use log::{debug, info, trace};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::arc_consistency::{establish_arc_consistency, ArcConsistencyFailure};
use crate::assignment::Assignment;
use crate::consistency::{find_violation, is_complete, is_consistent};
use crate::domain_store::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::heuristics::{order_domain_values, select_unassigned_variable};
use crate::types::WordId;
use crate::CHECK_INVARIANTS;

/// How many states should we visit between checks of the deadline and abort flag?
pub const INTERRUPT_FREQUENCY: usize = 10;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: usize,
    pub backtracks: usize,
    pub revisions: usize,
    pub eliminations: usize,
    pub total_time: Duration,
    pub initial_arc_consistency_time: Duration,
    pub choice_arc_consistency_time: Duration,
}

/// Caller-supplied limits and tuning for a fill attempt.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Give up with `FillFailure::Timeout` once this much time has passed.
    pub timeout: Option<Duration>,

    /// Give up with `FillFailure::ExceededBacktrackLimit` after this many backtracks.
    pub max_backtracks: Option<usize>,

    /// Seed for breaking ties between equally-ranked slots.
    pub rng_seed: u64,
}

/// A struct representing the results of a successful fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// The whole search space was explored without finding a fill.
    NoSolution,
    Timeout,
    Abort,
    ExceededBacktrackLimit(usize),
}

impl fmt::Display for FillFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillFailure::NoSolution => write!(f, "No solution."),
            FillFailure::Timeout => write!(f, "Timed out before finding a fill"),
            FillFailure::Abort => write!(f, "Fill was aborted"),
            FillFailure::ExceededBacktrackLimit(backtracks) => {
                write!(f, "Gave up after {backtracks} backtracks")
            }
        }
    }
}

impl std::error::Error for FillFailure {}

/// Build the domain store for a fill attempt: every slot starts with the whole vocabulary, is
/// narrowed to words of the right length, and then made arc-consistent. Fails if any slot is left
/// without options, in which case there's no point searching.
fn prepare_domains(
    config: &GridConfig,
    statistics: &mut Statistics,
) -> Result<DomainStore, FillFailure> {
    let mut domains = DomainStore::new(config);
    domains.enforce_node_consistency(config);

    let start = Instant::now();
    let result = establish_arc_consistency(config, &mut domains, None);
    statistics.initial_arc_consistency_time = start.elapsed();

    match result {
        Ok(success) => {
            statistics.revisions += success.revisions;
            statistics.eliminations += success.eliminations;
        }
        Err(ArcConsistencyFailure { slot_id, revisions }) => {
            statistics.revisions += revisions;
            debug!(
                "Initial arc consistency wiped out slot {}",
                config.slot_configs[slot_id].slot_key()
            );
            return Err(FillFailure::NoSolution);
        }
    }

    // A slot with no crossings never takes part in AC-3, so it can still be empty here.
    if let Some(slot_id) = domains.first_empty_slot() {
        debug!(
            "Slot {} has no words of the right length",
            config.slot_configs[slot_id].slot_key()
        );
        return Err(FillFailure::NoSolution);
    }

    Ok(domains)
}

/// The state of a single fill attempt.
struct Search<'a> {
    config: &'a GridConfig<'a>,
    domains: DomainStore,
    assignment: Assignment,
    rng: SmallRng,
    statistics: Statistics,
    deadline: Option<Instant>,
    max_backtracks: Option<usize>,
}

impl<'a> Search<'a> {
    fn check_interrupts(&self) -> Result<(), FillFailure> {
        if self.statistics.states % INTERRUPT_FREQUENCY != 0 {
            return Ok(());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::Timeout);
            }
        }
        if let Some(abort) = self.config.abort {
            if abort.load(Ordering::Relaxed) {
                return Err(FillFailure::Abort);
            }
        }
        Ok(())
    }

    fn is_solved(&self) -> bool {
        is_complete(self.config, &self.assignment) && is_consistent(self.config, &self.assignment)
    }

    /// Propagate the implications of having just assigned `word_id` to `slot_id`: the slot's
    /// domain becomes that single word, no other unassigned slot may reuse it, and the remaining
    /// slots are made arc-consistent. Returns false if some domain was wiped out; the caller is
    /// responsible for restoring its checkpoint either way once the branch is abandoned.
    fn propagate_choice(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        let start = Instant::now();
        let config = self.config;

        let restricted = self.domains.restrict_to(config, slot_id, word_id);
        if CHECK_INVARIANTS && !restricted {
            panic!(
                "Trying word {word_id} in slot {slot_id}, but it isn't in the slot's domain?"
            );
        }

        let unassigned: Vec<SlotId> = self.assignment.unassigned_slot_ids().collect();

        for &other_slot_id in &unassigned {
            if self.domains.contains(other_slot_id, word_id) {
                self.domains.eliminate(config, other_slot_id, word_id);
                if self.domains.is_empty(other_slot_id) {
                    trace!(
                        "Slot {} has no options left once {} is used",
                        config.slot_configs[other_slot_id].slot_key(),
                        config.word_list.words[word_id].normalized_string,
                    );
                    self.statistics.choice_arc_consistency_time += start.elapsed();
                    return false;
                }
            }
        }

        let result = establish_arc_consistency(config, &mut self.domains, Some(&unassigned));
        self.statistics.choice_arc_consistency_time += start.elapsed();

        match result {
            Ok(success) => {
                self.statistics.revisions += success.revisions;
                self.statistics.eliminations += success.eliminations;
                true
            }
            Err(failure) => {
                self.statistics.revisions += failure.revisions;
                false
            }
        }
    }

    /// Try to extend the current assignment to a complete one. Returns `Ok(true)` with the
    /// solution left in `self.assignment`, or `Ok(false)` with the assignment and domains exactly
    /// as they were on entry.
    fn backtrack(&mut self) -> Result<bool, FillFailure> {
        self.check_interrupts()?;
        self.statistics.states += 1;

        if self.is_solved() {
            return Ok(true);
        }

        let Some(slot_id) = select_unassigned_variable(
            self.config,
            &self.domains,
            &self.assignment,
            &mut self.rng,
        ) else {
            return Ok(false);
        };

        let config = self.config;
        for word_id in order_domain_values(config, &self.domains, slot_id, &self.assignment) {
            let checkpoint = self.domains.checkpoint();
            self.assignment.assign(slot_id, word_id);

            trace!(
                "Trying {} in slot {}",
                config.word_list.words[word_id].normalized_string,
                config.slot_configs[slot_id].slot_key(),
            );

            if is_consistent(config, &self.assignment)
                && self.propagate_choice(slot_id, word_id)
                && (self.is_solved() || self.backtrack()?)
            {
                return Ok(true);
            }

            self.assignment.unassign(slot_id);
            self.domains.restore(config, checkpoint);
            self.statistics.backtracks += 1;

            if let Some(max_backtracks) = self.max_backtracks {
                if self.statistics.backtracks > max_backtracks {
                    return Err(FillFailure::ExceededBacktrackLimit(
                        self.statistics.backtracks,
                    ));
                }
            }
        }

        Ok(false)
    }
}

/// Run a fill attempt, recording what it did in `statistics` whether or not it succeeds. When no
/// search is needed to rule the grid out, `statistics.states` is left at zero.
fn fill_with_statistics(
    config: &GridConfig,
    options: &FillOptions,
    statistics: &mut Statistics,
) -> Result<Assignment, FillFailure> {
    let start = Instant::now();
    let deadline = options.timeout.map(|timeout| start + timeout);

    let domains = prepare_domains(config, statistics)?;

    let mut search = Search {
        config,
        domains,
        assignment: Assignment::new(config.slot_configs.len()),
        rng: SmallRng::seed_from_u64(options.rng_seed),
        statistics: std::mem::take(statistics),
        deadline,
        max_backtracks: options.max_backtracks,
    };

    let result = search.backtrack();
    search.statistics.total_time = start.elapsed();
    *statistics = search.statistics;

    if !result? {
        info!(
            "No solution after {} states and {} backtracks",
            statistics.states, statistics.backtracks
        );
        return Err(FillFailure::NoSolution);
    }

    Ok(search.assignment)
}

/// Search for a valid fill for the given grid. Exhausting the search space is reported as
/// `FillFailure::NoSolution`; the other failures mean the search was cut short by one of the
/// limits in `options` or by the config's abort flag, and say nothing about whether a fill exists.
pub fn find_fill(config: &GridConfig, options: &FillOptions) -> Result<FillSuccess, FillFailure> {
    debug!(
        "Filling {}x{} grid with {} slots from {} words",
        config.width,
        config.height,
        config.slot_configs.len(),
        config.word_list.words.len(),
    );

    let mut statistics = Statistics::default();
    let assignment = fill_with_statistics(config, options, &mut statistics)?;

    if CHECK_INVARIANTS {
        if let Some(violation) = find_violation(config, &assignment) {
            panic!("Search returned an inconsistent fill: {violation}");
        }
        if !is_complete(config, &assignment) {
            panic!("Search returned an incomplete fill");
        }
    }

    info!("Found fill: {:?}", statistics);

    Ok(FillSuccess {
        statistics,
        assignment,
    })
}
