//! Timetable constraints.
//!
//! Every constraint works on resolved [`Placement`]s, so it applies to both
//! framings. Each one has a full check used to verify finished timetables
//! and an incremental check that only examines the latest binding.

use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::csp::{Assignment, Constraint};

use super::curriculum::{DayId, GroupId, SlotId, SubjectId, TeacherId};
use super::types::{Framing, Placement, TimetableValue, TimetableVar};

type TimetableAssignment = Assignment<TimetableVar, TimetableValue>;
pub(crate) type BoxedConstraint = Box<dyn Constraint<TimetableVar, TimetableValue>>;

/// A recognised timetable constraint.
///
/// A problem installs an ordered list of these; they are checked in that
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintKind {
    /// A teacher teaches at most one lesson per (day, timeslot).
    TeacherConflict,
    /// A group attends at most one lesson per (day, timeslot).
    GroupExclusivity,
    /// A group gets at most its required hours of each subject.
    SubjectFrequency,
    /// The unassigned variables of a group can still cover every missing
    /// hour; on a complete timetable, hours are met exactly.
    ExactHours,
    /// A teacher with a `max_load` teaches at most that many lessons.
    TeacherLoad,
    /// Neither a teacher nor a (group, subject) pair occupies more than
    /// `max_run` consecutive timeslots of one day.
    ConsecutiveLimit { max_run: usize },
}

impl ConstraintKind {
    /// The three constraints every timetable needs.
    pub fn required() -> Vec<ConstraintKind> {
        vec![
            ConstraintKind::TeacherConflict,
            ConstraintKind::GroupExclusivity,
            ConstraintKind::SubjectFrequency,
        ]
    }

    /// The required constraints plus what the framing needs to enforce
    /// exact weekly hours.
    pub fn defaults(framing: Framing) -> Vec<ConstraintKind> {
        let mut kinds = Self::required();
        if framing == Framing::BySlot {
            kinds.push(ConstraintKind::ExactHours);
        }
        kinds
    }

    /// Short name, also used as the installed constraint's name.
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::TeacherConflict => "teacher-conflict",
            ConstraintKind::GroupExclusivity => "group-exclusivity",
            ConstraintKind::SubjectFrequency => "subject-frequency",
            ConstraintKind::ExactHours => "exact-hours",
            ConstraintKind::TeacherLoad => "teacher-load",
            ConstraintKind::ConsecutiveLimit { .. } => "consecutive-limit",
        }
    }
}

/// Curriculum facts the constraints need, precomputed per problem.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConstraintContext {
    /// Required weekly hours per (group, subject).
    pub(crate) hours: HashMap<(GroupId, SubjectId), u32>,
    /// Number of variables belonging to each group.
    pub(crate) capacity: HashMap<GroupId, usize>,
    /// Weekly load limit per teacher, where one is set.
    pub(crate) loads: HashMap<TeacherId, u32>,
}

impl ConstraintContext {
    pub(crate) fn build(&self, kind: ConstraintKind) -> BoxedConstraint {
        match kind {
            ConstraintKind::TeacherConflict => Box::new(TeacherConflict),
            ConstraintKind::GroupExclusivity => Box::new(GroupExclusivity),
            ConstraintKind::SubjectFrequency => Box::new(SubjectFrequency {
                hours: self.hours.clone(),
            }),
            ConstraintKind::ExactHours => Box::new(ExactHours {
                hours: self.hours.clone(),
                capacity: self.capacity.clone(),
            }),
            ConstraintKind::TeacherLoad => Box::new(TeacherLoad {
                loads: self.loads.clone(),
            }),
            ConstraintKind::ConsecutiveLimit { max_run } => Box::new(ConsecutiveLimit { max_run }),
        }
    }
}

fn latest_placement(assignment: &TimetableAssignment) -> Option<Placement> {
    assignment
        .last()
        .and_then(|(var, value)| Placement::resolve(var, value))
}

fn earlier_placements(assignment: &TimetableAssignment) -> impl Iterator<Item = Placement> + '_ {
    assignment
        .iter_before_last()
        .filter_map(|(var, value)| Placement::resolve(var, value))
}

fn placements(assignment: &TimetableAssignment) -> impl Iterator<Item = Placement> + '_ {
    assignment
        .iter()
        .filter_map(|(var, value)| Placement::resolve(var, value))
}

// ---- Teacher conflict ----

struct TeacherConflict;

impl Constraint<TimetableVar, TimetableValue> for TeacherConflict {
    fn name(&self) -> &str {
        ConstraintKind::TeacherConflict.name()
    }

    fn is_satisfied(&self, assignment: &TimetableAssignment) -> bool {
        let mut busy: HashSet<(TeacherId, DayId, SlotId)> = HashSet::new();
        placements(assignment).all(|p| busy.insert((p.teacher, p.day, p.timeslot)))
    }

    fn accepts_latest(&self, assignment: &TimetableAssignment) -> bool {
        let Some(p) = latest_placement(assignment) else {
            return true;
        };
        !earlier_placements(assignment).any(|q| q.teacher == p.teacher && q.same_time(&p))
    }
}

// ---- Group exclusivity ----

struct GroupExclusivity;

impl Constraint<TimetableVar, TimetableValue> for GroupExclusivity {
    fn name(&self) -> &str {
        ConstraintKind::GroupExclusivity.name()
    }

    fn is_satisfied(&self, assignment: &TimetableAssignment) -> bool {
        let mut busy: HashSet<(GroupId, DayId, SlotId)> = HashSet::new();
        placements(assignment).all(|p| busy.insert((p.group, p.day, p.timeslot)))
    }

    fn accepts_latest(&self, assignment: &TimetableAssignment) -> bool {
        let Some(p) = latest_placement(assignment) else {
            return true;
        };
        !earlier_placements(assignment).any(|q| q.group == p.group && q.same_time(&p))
    }
}

// ---- Subject frequency (at most) ----

struct SubjectFrequency {
    hours: HashMap<(GroupId, SubjectId), u32>,
}

impl SubjectFrequency {
    fn limit(&self, group: GroupId, subject: SubjectId) -> usize {
        self.hours.get(&(group, subject)).copied().unwrap_or(0) as usize
    }
}

impl Constraint<TimetableVar, TimetableValue> for SubjectFrequency {
    fn name(&self) -> &str {
        ConstraintKind::SubjectFrequency.name()
    }

    fn is_satisfied(&self, assignment: &TimetableAssignment) -> bool {
        let mut counts: HashMap<(GroupId, SubjectId), usize> = HashMap::new();
        for p in placements(assignment) {
            *counts.entry((p.group, p.subject)).or_default() += 1;
        }
        counts
            .into_iter()
            .all(|((group, subject), n)| n <= self.limit(group, subject))
    }

    fn accepts_latest(&self, assignment: &TimetableAssignment) -> bool {
        let Some(p) = latest_placement(assignment) else {
            return true;
        };
        let count = placements(assignment)
            .filter(|q| q.group == p.group && q.subject == p.subject)
            .count();
        count <= self.limit(p.group, p.subject)
    }
}

// ---- Exact hours (lower bound feasibility) ----

struct ExactHours {
    hours: HashMap<(GroupId, SubjectId), u32>,
    capacity: HashMap<GroupId, usize>,
}

impl ExactHours {
    /// Whether the group's unbound variables can still cover its missing
    /// hours.
    fn coverable(&self, assignment: &TimetableAssignment, group: GroupId) -> bool {
        let mut bound = 0usize;
        let mut counts: HashMap<SubjectId, u32> = HashMap::new();
        for (var, value) in assignment.iter() {
            if var.group() != group {
                continue;
            }
            bound += 1;
            if let Some(p) = Placement::resolve(var, value) {
                *counts.entry(p.subject).or_default() += 1;
            }
        }
        let remaining = self.capacity.get(&group).copied().unwrap_or(0).saturating_sub(bound);
        let missing: u64 = self
            .hours
            .iter()
            .filter(|((g, _), _)| *g == group)
            .map(|((_, s), &h)| u64::from(h.saturating_sub(counts.get(s).copied().unwrap_or(0))))
            .sum();
        missing <= remaining as u64
    }
}

impl Constraint<TimetableVar, TimetableValue> for ExactHours {
    fn name(&self) -> &str {
        ConstraintKind::ExactHours.name()
    }

    fn is_satisfied(&self, assignment: &TimetableAssignment) -> bool {
        self.capacity.keys().all(|&g| self.coverable(assignment, g))
    }

    fn accepts_latest(&self, assignment: &TimetableAssignment) -> bool {
        match assignment.last() {
            Some((var, _)) => self.coverable(assignment, var.group()),
            None => true,
        }
    }
}

// ---- Teacher load ----

struct TeacherLoad {
    loads: HashMap<TeacherId, u32>,
}

impl Constraint<TimetableVar, TimetableValue> for TeacherLoad {
    fn name(&self) -> &str {
        ConstraintKind::TeacherLoad.name()
    }

    fn is_satisfied(&self, assignment: &TimetableAssignment) -> bool {
        let mut counts: HashMap<TeacherId, u32> = HashMap::new();
        for p in placements(assignment) {
            *counts.entry(p.teacher).or_default() += 1;
        }
        counts
            .iter()
            .all(|(t, &n)| self.loads.get(t).is_none_or(|&max| n <= max))
    }

    fn accepts_latest(&self, assignment: &TimetableAssignment) -> bool {
        let Some(p) = latest_placement(assignment) else {
            return true;
        };
        let Some(&max) = self.loads.get(&p.teacher) else {
            return true;
        };
        let count = placements(assignment).filter(|q| q.teacher == p.teacher).count();
        count as u64 <= u64::from(max)
    }
}

// ---- Consecutive limit ----

struct ConsecutiveLimit {
    max_run: usize,
}

impl ConsecutiveLimit {
    /// Length of the run of occupied timeslots through `slot`.
    fn run_through(occupied: &HashSet<usize>, slot: usize) -> usize {
        let below = (0..slot).rev().take_while(|s| occupied.contains(s)).count();
        let above = (slot + 1..).take_while(|s| occupied.contains(s)).count();
        below + 1 + above
    }

    fn within_limit(&self, assignment: &TimetableAssignment, p: &Placement) -> bool {
        let same_day = placements(assignment).filter(|q| q.day == p.day);
        let mut teacher_slots = HashSet::new();
        let mut subject_slots = HashSet::new();
        for q in same_day {
            if q.teacher == p.teacher {
                teacher_slots.insert(q.timeslot.0);
            }
            if q.group == p.group && q.subject == p.subject {
                subject_slots.insert(q.timeslot.0);
            }
        }
        Self::run_through(&teacher_slots, p.timeslot.0) <= self.max_run
            && Self::run_through(&subject_slots, p.timeslot.0) <= self.max_run
    }
}

impl Constraint<TimetableVar, TimetableValue> for ConsecutiveLimit {
    fn name(&self) -> &str {
        ConstraintKind::ConsecutiveLimit { max_run: self.max_run }.name()
    }

    fn is_satisfied(&self, assignment: &TimetableAssignment) -> bool {
        placements(assignment).all(|p| self.within_limit(assignment, &p))
    }

    fn accepts_latest(&self, assignment: &TimetableAssignment) -> bool {
        match latest_placement(assignment) {
            Some(p) => self.within_limit(assignment, &p),
            None => true,
        }
    }
}
