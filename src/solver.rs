use crate::data::{
    ConfigurationError, ConstraintKind, OverflowRoom, PlacedSession, PlacementFailure,
    SchedulingInput, SchedulingOutput, SessionKind,
};
use crate::grid::{self, Point, Room, TimeGrid, room_catalog};
use crate::occupancy::OccupancyTracker;
use crate::sessions::{Session, derive_sessions, validate};
use itertools::Itertools;
use log::{debug, info, trace};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

/// Tunable knobs of the engine. The defaults mirror the production
/// configuration; none of the weights is business law.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Tutorials take two rooms, with the cohort split across them.
    pub dual_room_tutorials: bool,
    /// Allow a dual-room tutorial to fall back to two single-room halves at
    /// different points when no same-point pair is feasible.
    pub split_tutorial_fallback: bool,
    /// A room must seat at least this share of the session's attendees.
    pub capacity_ratio: f64,
    /// Per-room share for dual-room tutorials.
    pub split_capacity_ratio: f64,
    /// Soft cap on sessions per program per day.
    pub daily_session_cap: u32,
    pub weights: SoftWeights,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            dual_room_tutorials: false,
            split_tutorial_fallback: true,
            capacity_ratio: 0.5,
            split_capacity_ratio: 0.25,
            daily_session_cap: 3,
            weights: SoftWeights::default(),
        }
    }
}

/// Weights of the soft-constraint components. Costs are summed; bonuses are
/// subtracted. Lower total is better.
#[derive(Debug, Clone)]
pub struct SoftWeights {
    pub daily_overload: f64,
    pub gap: f64,
    pub early_lecture: f64,
    pub room_consistency: f64,
    pub continuity: f64,
    pub split_tutorial: f64,
}

impl Default for SoftWeights {
    fn default() -> Self {
        SoftWeights {
            daily_overload: 15.0,
            gap: 5.0,
            early_lecture: 100.0,
            room_consistency: 8.0,
            continuity: 2.0,
            split_tutorial: 10.0,
        }
    }
}

struct Candidate {
    point: Point,
    rooms: Vec<String>,
    cost: f64,
}

/// Runs the full pipeline: validation, session derivation, and the greedy
/// single-pass placement. Committed sessions satisfy every hard constraint;
/// sessions with no feasible candidate are reported in the output rather
/// than aborting the run.
pub fn solve(
    input: &SchedulingInput,
    config: &SolverConfig,
) -> Result<SchedulingOutput, ConfigurationError> {
    let start_time = Instant::now();

    let problems = validate(input);
    if !problems.is_empty() {
        return Err(ConfigurationError { problems });
    }

    let mut sessions = derive_sessions(input, config);
    // The deriver emits course-major order already; the stable sort pins the
    // (course, kind) key and preserves occurrence/group order within it.
    sessions.sort_by_key(|s| (s.course_idx, s.kind));

    let grid = TimeGrid::new(input.metadata.weeks);
    let rooms = room_catalog();
    let unavailable = resolve_unavailability(input);

    info!(
        "Scheduling {} sessions over {} points and {} rooms...",
        sessions.len(),
        grid.point_count(),
        rooms.len()
    );

    let mut tracker = OccupancyTracker::new();
    let mut placed: Vec<PlacedSession> = Vec::new();
    let mut failures: Vec<PlacementFailure> = Vec::new();
    let mut total_cost = 0.0;

    for session in &sessions {
        let mut fail_counts: BTreeMap<ConstraintKind, u32> = BTreeMap::new();

        let best = best_candidate(
            session,
            session.rooms_required as usize,
            false,
            &grid,
            &rooms,
            &unavailable,
            &tracker,
            config,
            &mut fail_counts,
        );

        if let Some(candidate) = best {
            trace!(
                "placed {} at week {} day {} slot {} in {:?} (cost {:.1})",
                session.label(),
                candidate.point.week,
                candidate.point.weekday,
                candidate.point.slot,
                candidate.rooms,
                candidate.cost
            );
            tracker.commit(session, candidate.point, &candidate.rooms);
            total_cost += candidate.cost;
            placed.push(to_placed(session, candidate, None));
            continue;
        }

        if session.rooms_required == 2 && config.split_tutorial_fallback {
            if let Some(entry) = place_split_tutorial(
                session,
                &grid,
                &rooms,
                &unavailable,
                &mut tracker,
                config,
                &mut fail_counts,
                &mut total_cost,
            ) {
                placed.push(entry);
                continue;
            }
        }

        let constraint = dominant_failure(&fail_counts);
        debug!("no feasible placement for {}: {}", session.label(), constraint);
        failures.push(PlacementFailure {
            course: session.course.clone(),
            kind: session.kind,
            seq: session.seq,
            group: session.group,
            constraint,
            attempted_points: grid.point_count(),
        });
    }

    info!(
        "Placed {}/{} sessions in {:.2?}",
        placed.len(),
        sessions.len(),
        start_time.elapsed()
    );

    Ok(SchedulingOutput {
        metadata: input.metadata.clone(),
        placed,
        failures,
        score: total_cost,
    })
}

/// Hard-constraint predicate over one candidate placement. Pure with respect
/// to the tracker; checks run cheapest-first and short-circuit on the first
/// violation.
pub fn check_feasible(
    session: &Session,
    point: Point,
    candidate_rooms: &[&Room],
    tracker: &OccupancyTracker,
    unavailable: &HashMap<String, HashSet<(u8, u8)>>,
    config: &SolverConfig,
) -> Result<(), ConstraintKind> {
    let idx = point.index();

    if unavailable
        .get(&session.teacher)
        .is_some_and(|slots| slots.contains(&(point.weekday, point.slot)))
    {
        return Err(ConstraintKind::TeacherUnavailable);
    }
    if tracker.teacher_at(&session.teacher, idx) {
        return Err(ConstraintKind::TeacherBusy);
    }

    for program in &session.programs {
        if tracker.program_at(program, idx) {
            return Err(ConstraintKind::ProgramBusy);
        }
    }

    let ratio = if session.rooms_required == 2 {
        config.split_capacity_ratio
    } else {
        config.capacity_ratio
    };
    let required = (f64::from(session.attendees) * ratio).ceil() as u32;
    for room in candidate_rooms {
        if session.needs_large_hall && !room.large_hall {
            return Err(ConstraintKind::LargeHallRequired);
        }
        if room.capacity < required {
            return Err(ConstraintKind::RoomTooSmall);
        }
        if tracker.room_at(&room.id, idx) {
            return Err(ConstraintKind::RoomBusy);
        }
    }

    if session.theory_before_practical && session.kind != SessionKind::Lecture {
        match tracker.last_lecture(&session.course) {
            Some(lecture_point) if point > lecture_point => {}
            _ => return Err(ConstraintKind::PracticalTooEarly),
        }
    }

    Ok(())
}

/// Soft cost of an already-feasible candidate; lower is better. Never
/// rejects, only ranks.
pub fn score_candidate(
    session: &Session,
    point: Point,
    candidate_rooms: &[&Room],
    tracker: &OccupancyTracker,
    config: &SolverConfig,
) -> f64 {
    let weights = &config.weights;
    let mut cost = 0.0;

    for program in &session.programs {
        let slots = tracker.program_day_slots(program, point);
        let booked = slots.iter().filter(|b| **b).count() as u32;

        if booked + 1 > config.daily_session_cap {
            cost += weights.daily_overload * f64::from(booked + 1 - config.daily_session_cap);
        }

        let nearest = slots
            .iter()
            .enumerate()
            .filter(|(_, booked)| **booked)
            .map(|(slot, _)| (slot as i32 - i32::from(point.slot)).abs())
            .min();
        if let Some(distance) = nearest {
            if distance > 1 {
                cost += weights.gap * f64::from(distance - 1);
            }
        }

        let base = point.index() - u32::from(point.slot);
        for adjacent in [i32::from(point.slot) - 1, i32::from(point.slot) + 1] {
            if (0..grid::SLOTS_PER_DAY as i32).contains(&adjacent) {
                let adjacent_idx = base + adjacent as u32;
                if tracker.course_at(&session.course, adjacent_idx)
                    && tracker.program_at(program, adjacent_idx)
                {
                    cost -= weights.continuity;
                }
            }
        }
    }

    if session.kind == SessionKind::Lecture && point.slot == 0 {
        cost += weights.early_lecture;
    }

    if let Some(last) = tracker.last_room(&session.course) {
        if candidate_rooms.iter().any(|room| room.id == last) {
            cost -= weights.room_consistency;
        }
    }

    cost
}

/// Enumerates every (point, room combination) candidate for the session,
/// scores all feasible ones, and returns the minimum-cost candidate. Strict
/// `<` keeps the earliest point and lowest room ids on ties. Infeasible
/// points tally the violated constraint, once per kind per point, into
/// `fail_counts`.
#[allow(clippy::too_many_arguments)]
fn best_candidate(
    session: &Session,
    room_count: usize,
    split: bool,
    grid: &TimeGrid,
    rooms: &[Room],
    unavailable: &HashMap<String, HashSet<(u8, u8)>>,
    tracker: &OccupancyTracker,
    config: &SolverConfig,
    fail_counts: &mut BTreeMap<ConstraintKind, u32>,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for point in grid.points() {
        let mut seen: HashSet<ConstraintKind> = HashSet::new();

        let combinations: Vec<Vec<&Room>> = if room_count == 1 {
            rooms.iter().map(|room| vec![room]).collect()
        } else {
            rooms.iter().combinations(room_count).collect()
        };

        for combination in combinations {
            match check_feasible(session, point, &combination, tracker, unavailable, config) {
                Ok(()) => {
                    let mut cost = score_candidate(session, point, &combination, tracker, config);
                    if split {
                        cost += config.weights.split_tutorial;
                    }
                    if best.as_ref().is_none_or(|b| cost < b.cost) {
                        best = Some(Candidate {
                            point,
                            rooms: combination.iter().map(|room| room.id.clone()).collect(),
                            cost,
                        });
                    }
                }
                Err(kind) => {
                    if seen.insert(kind) {
                        *fail_counts.entry(kind).or_insert(0) += 1;
                    }
                }
            }
        }
    }

    best
}

/// Fallback for a dual-room tutorial with no feasible same-point pair: two
/// single-room halves at distinct points, committed atomically. The program
/// grid makes the second half land on a different point than the first.
#[allow(clippy::too_many_arguments)]
fn place_split_tutorial(
    session: &Session,
    grid: &TimeGrid,
    rooms: &[Room],
    unavailable: &HashMap<String, HashSet<(u8, u8)>>,
    tracker: &mut OccupancyTracker,
    config: &SolverConfig,
    fail_counts: &mut BTreeMap<ConstraintKind, u32>,
    total_cost: &mut f64,
) -> Option<PlacedSession> {
    let first = best_candidate(
        session,
        1,
        true,
        grid,
        rooms,
        unavailable,
        tracker,
        config,
        fail_counts,
    )?;

    let previous_room = tracker.last_room(&session.course).map(str::to_string);
    tracker.commit(session, first.point, &first.rooms);

    let second = best_candidate(
        session,
        1,
        true,
        grid,
        rooms,
        unavailable,
        tracker,
        config,
        fail_counts,
    );

    match second {
        Some(second) => {
            trace!(
                "placed {} split across week {} day {} slot {} and week {} day {} slot {}",
                session.label(),
                first.point.week,
                first.point.weekday,
                first.point.slot,
                second.point.week,
                second.point.weekday,
                second.point.slot
            );
            tracker.commit(session, second.point, &second.rooms);
            *total_cost += first.cost + second.cost;
            let overflow = OverflowRoom {
                point: second.point,
                room: second.rooms[0].clone(),
            };
            Some(to_placed(session, first, Some(overflow)))
        }
        None => {
            tracker.release(session, first.point, &first.rooms);
            tracker.restore_last_room(&session.course, previous_room);
            None
        }
    }
}

fn to_placed(
    session: &Session,
    candidate: Candidate,
    overflow: Option<OverflowRoom>,
) -> PlacedSession {
    PlacedSession {
        course: session.course.clone(),
        kind: session.kind,
        seq: session.seq,
        group: session.group,
        programs: session.programs.clone(),
        teacher: session.teacher.clone(),
        point: candidate.point,
        rooms: candidate.rooms,
        overflow,
    }
}

/// The constraint violated at the most attempted points, the best-effort
/// explanation reported for an unplaceable session.
fn dominant_failure(fail_counts: &BTreeMap<ConstraintKind, u32>) -> ConstraintKind {
    let mut dominant = ConstraintKind::RoomBusy;
    let mut dominant_count = 0;
    for (kind, count) in fail_counts {
        if *count > dominant_count {
            dominant = *kind;
            dominant_count = *count;
        }
    }
    dominant
}

/// Resolves the input's `"Weekday-HH:MM"` strings into per-teacher
/// (weekday, slot) sets. Validation has already rejected malformed entries.
fn resolve_unavailability(input: &SchedulingInput) -> HashMap<String, HashSet<(u8, u8)>> {
    let mut map = HashMap::new();
    for (name, teacher) in &input.teachers {
        let slots: HashSet<(u8, u8)> = teacher
            .unavailable
            .iter()
            .filter_map(|spec| grid::parse_unavailable(spec))
            .collect();
        if !slots.is_empty() {
            map.insert(name.clone(), slots);
        }
    }
    map
}
