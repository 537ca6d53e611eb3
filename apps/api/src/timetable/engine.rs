//! Scheduler Engine — deterministic backtracking search over the week grid.
//!
//! Subjects are placed in descending scarcity order (sessions needed divided
//! by slots their faculty can still use), each block into the best-ranked
//! candidate slot. A dead end undoes the most recent placement and retries
//! the next candidate. The search carries no randomness: identical inputs
//! always produce the identical timetable.
//!
//! Termination is guaranteed twice over — a backtrack budget and a
//! wall-clock deadline — and either expiry surfaces as `Infeasible` with the
//! subjects that could not be fully placed, never a silently partial result.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::grid::{Slot, DAYS_PER_WEEK, SLOTS_PER_WEEK};
use crate::models::timetable::Session;
use crate::timetable::constraints::{ConstraintSet, SubjectDemand};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Search limits, sourced from the service Config.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub max_backtracks: u64,
    pub timeout: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_backtracks: 10_000,
            timeout: Duration::from_secs(2),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Search-internal types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    /// Two contiguous periods on one day, both flagged as lab sessions.
    LabDouble,
    Single,
}

impl BlockKind {
    fn sessions(self) -> usize {
        match self {
            BlockKind::LabDouble => 2,
            BlockKind::Single => 1,
        }
    }
}

/// One unit of placement work: a block of a particular demand.
#[derive(Debug, Clone, Copy)]
struct Block {
    demand: usize,
    kind: BlockKind,
}

/// A concrete slot choice for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Single(Slot),
    LabDouble(Slot, Slot),
}

impl Placement {
    fn slots(self) -> [Option<Slot>; 2] {
        match self {
            Placement::Single(s) => [Some(s), None],
            Placement::LabDouble(a, b) => [Some(a), Some(b)],
        }
    }

    fn start(self) -> Slot {
        match self {
            Placement::Single(s) | Placement::LabDouble(s, _) => s,
        }
    }
}

/// One level of the search stack: the ranked candidates for a block and
/// which of them is currently applied.
struct Frame {
    candidates: Vec<Placement>,
    next: usize,
    chosen: Option<Placement>,
}

struct Search<'a> {
    constraints: &'a ConstraintSet,
    /// Demands re-sorted into placement priority order.
    demands: Vec<SubjectDemand>,
    /// Flattened work list: per demand, the lab double first, then singles.
    blocks: Vec<Block>,
    /// Grid occupancy by chronological slot ordinal (one cohort, so at most
    /// one subject per slot).
    slot_owner: [Option<usize>; SLOTS_PER_WEEK],
    /// Per faculty id, slots already taken — seeded with cross-timetable
    /// blocks, updated as placements are applied and undone.
    faculty_busy: Vec<[bool; SLOTS_PER_WEEK]>,
    /// Faculty id per demand.
    faculty_of: Vec<usize>,
    /// Sessions per day per demand, for the per-day cap and spreading.
    day_load: Vec<[u32; DAYS_PER_WEEK]>,
    backtracks: u64,
}

impl<'a> Search<'a> {
    fn new(constraints: &'a ConstraintSet) -> Self {
        let demands = order_demands(constraints);

        // Intern faculty names so busy-tracking is an array index away.
        let mut faculty_ids: BTreeMap<&str, usize> = BTreeMap::new();
        for demand in &demands {
            let next_id = faculty_ids.len();
            faculty_ids.entry(demand.faculty.as_str()).or_insert(next_id);
        }
        let mut faculty_busy = vec![[false; SLOTS_PER_WEEK]; faculty_ids.len()];
        for (faculty, slots) in &constraints.blocked {
            if let Some(&id) = faculty_ids.get(faculty.as_str()) {
                for slot in slots {
                    faculty_busy[id][slot.ordinal()] = true;
                }
            }
        }
        let faculty_of = demands
            .iter()
            .map(|d| faculty_ids[d.faculty.as_str()])
            .collect();

        let mut blocks = Vec::new();
        for (i, demand) in demands.iter().enumerate() {
            for _ in 0..demand.lab_blocks {
                blocks.push(Block {
                    demand: i,
                    kind: BlockKind::LabDouble,
                });
            }
            for _ in 0..demand.single_sessions {
                blocks.push(Block {
                    demand: i,
                    kind: BlockKind::Single,
                });
            }
        }

        let day_load = vec![[0u32; DAYS_PER_WEEK]; demands.len()];
        Search {
            constraints,
            demands,
            blocks,
            slot_owner: [None; SLOTS_PER_WEEK],
            faculty_busy,
            faculty_of,
            day_load,
            backtracks: 0,
        }
    }

    fn slot_usable(&self, demand: usize, slot: Slot) -> bool {
        self.slot_owner[slot.ordinal()].is_none()
            && !self.faculty_busy[self.faculty_of[demand]][slot.ordinal()]
    }

    /// Ranked candidates for a block: preference hits descending, existing
    /// same-subject load on the day ascending, then chronological order.
    fn candidates(&self, block_idx: usize) -> Vec<Placement> {
        let block = self.blocks[block_idx];
        let demand = &self.demands[block.demand];
        let preferred = self.constraints.preferred.get(&demand.faculty);
        let pref_score =
            |slot: Slot| -> u32 { preferred.map_or(0, |p| p.score(slot)) };
        let cap = self.constraints.max_sessions_per_day;

        let mut ranked: Vec<(Reverse<u32>, u32, usize, Placement)> = Vec::new();
        match block.kind {
            BlockKind::Single => {
                for slot in Slot::all() {
                    if !self.slot_usable(block.demand, slot) {
                        continue;
                    }
                    let load = self.day_load[block.demand][slot.day.index()];
                    if load + 1 > cap {
                        continue;
                    }
                    ranked.push((
                        Reverse(pref_score(slot)),
                        load,
                        slot.ordinal(),
                        Placement::Single(slot),
                    ));
                }
            }
            BlockKind::LabDouble => {
                for slot in Slot::all() {
                    let Some(second) = slot.next_in_day() else {
                        continue;
                    };
                    if !self.slot_usable(block.demand, slot)
                        || !self.slot_usable(block.demand, second)
                    {
                        continue;
                    }
                    let load = self.day_load[block.demand][slot.day.index()];
                    if load + 2 > cap {
                        continue;
                    }
                    ranked.push((
                        Reverse(pref_score(slot) + pref_score(second)),
                        load,
                        slot.ordinal(),
                        Placement::LabDouble(slot, second),
                    ));
                }
            }
        }

        ranked.sort_by_key(|&(pref, load, ordinal, _)| (pref, load, ordinal));
        ranked.into_iter().map(|(_, _, _, p)| p).collect()
    }

    fn apply(&mut self, block_idx: usize, placement: Placement) {
        let demand = self.blocks[block_idx].demand;
        for slot in placement.slots().into_iter().flatten() {
            self.slot_owner[slot.ordinal()] = Some(demand);
            self.faculty_busy[self.faculty_of[demand]][slot.ordinal()] = true;
            self.day_load[demand][slot.day.index()] += 1;
        }
    }

    fn undo(&mut self, block_idx: usize, placement: Placement) {
        let demand = self.blocks[block_idx].demand;
        for slot in placement.slots().into_iter().flatten() {
            self.slot_owner[slot.ordinal()] = None;
            self.faculty_busy[self.faculty_of[demand]][slot.ordinal()] = false;
            self.day_load[demand][slot.day.index()] -= 1;
        }
    }

    /// Final session list for a completed search, chronological order.
    fn collect_sessions(&self, frames: &[Frame]) -> Vec<Session> {
        let mut sessions = Vec::new();
        for (block, frame) in self.blocks.iter().zip(frames) {
            let Some(placement) = frame.chosen else {
                continue;
            };
            let demand = &self.demands[block.demand];
            let is_lab = block.kind == BlockKind::LabDouble;
            for slot in placement.slots().into_iter().flatten() {
                sessions.push(Session {
                    subject_code: demand.code.clone(),
                    faculty_name: demand.faculty.clone(),
                    slot,
                    is_lab_block: is_lab,
                });
            }
        }
        sessions.sort_by(|a, b| {
            a.slot
                .cmp(&b.slot)
                .then_with(|| a.subject_code.cmp(&b.subject_code))
        });
        sessions
    }

    /// Builds the Infeasible diagnostic from whatever is still applied.
    fn infeasible(&self, frames: &[Frame]) -> AppError {
        let mut placed = vec![0usize; self.demands.len()];
        for (block, frame) in self.blocks.iter().zip(frames) {
            if frame.chosen.is_some() {
                placed[block.demand] += block.kind.sessions();
            }
        }
        let mut unplaced: Vec<String> = self
            .demands
            .iter()
            .enumerate()
            .filter(|(i, d)| placed[*i] < d.total_sessions)
            .map(|(_, d)| d.code.clone())
            .collect();
        unplaced.sort();
        AppError::Infeasible {
            unplaced,
            placed_sessions: placed.iter().sum(),
        }
    }
}

/// Placement priority: descending scarcity (sessions needed over slots the
/// faculty can still use), then lab subjects, then larger weekly hours, then
/// code — a total order, so the search is deterministic.
fn order_demands(constraints: &ConstraintSet) -> Vec<SubjectDemand> {
    let feasible = |d: &SubjectDemand| -> usize {
        let blocked = constraints
            .blocked
            .get(&d.faculty)
            .map_or(0, |slots| slots.len());
        SLOTS_PER_WEEK - blocked.min(SLOTS_PER_WEEK)
    };

    let mut demands = constraints.demands.clone();
    demands.sort_by(|a, b| {
        // a is scarcer than b iff a.total / feasible(a) > b.total / feasible(b);
        // cross-multiplied to stay in integers.
        let lhs = a.total_sessions * feasible(b);
        let rhs = b.total_sessions * feasible(a);
        rhs.cmp(&lhs)
            .then_with(|| b.lab_blocks.cmp(&a.lab_blocks))
            .then_with(|| b.total_sessions.cmp(&a.total_sessions))
            .then_with(|| a.code.cmp(&b.code))
    });
    demands
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Runs the backtracking search and returns the full session list, or
/// `Infeasible` when the budget or deadline runs out first. Never returns a
/// partial placement as success.
pub fn solve(constraints: &ConstraintSet, config: &SolverConfig) -> Result<Vec<Session>, AppError> {
    let started = Instant::now();
    let deadline = started + config.timeout;

    let mut search = Search::new(constraints);
    let total_blocks = search.blocks.len();
    if total_blocks == 0 {
        return Ok(Vec::new());
    }

    let mut frames: Vec<Frame> = vec![Frame {
        candidates: search.candidates(0),
        next: 0,
        chosen: None,
    }];

    loop {
        let depth = frames.len() - 1;
        let Some(frame) = frames.last_mut() else {
            break;
        };

        // Returning to this frame after a dead end below: retract its
        // current choice before trying the next candidate.
        if let Some(placement) = frame.chosen.take() {
            search.undo(depth, placement);
        }

        if frame.next < frame.candidates.len() {
            let placement = frame.candidates[frame.next];
            frame.next += 1;
            frame.chosen = Some(placement);
            search.apply(depth, placement);
            tracing::trace!(
                block = depth,
                slot = %placement.start(),
                "placed block"
            );

            if frames.len() == total_blocks {
                let sessions = search.collect_sessions(&frames);
                info!(
                    sessions = sessions.len(),
                    backtracks = search.backtracks,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "timetable search succeeded"
                );
                return Ok(sessions);
            }

            let next_candidates = search.candidates(frames.len());
            frames.push(Frame {
                candidates: next_candidates,
                next: 0,
                chosen: None,
            });
        } else {
            // Dead end: discard this frame and retry the previous block.
            frames.pop();
            if frames.is_empty() {
                break;
            }
            search.backtracks += 1;
            if search.backtracks > config.max_backtracks {
                warn!(
                    backtracks = search.backtracks,
                    "backtrack budget exhausted"
                );
                return Err(search.infeasible(&frames));
            }
            if Instant::now() >= deadline {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "search deadline exceeded"
                );
                return Err(search.infeasible(&frames));
            }
        }
    }

    // Search space exhausted with nothing on the stack.
    warn!("search space exhausted without a full placement");
    Err(search.infeasible(&[]))
}
