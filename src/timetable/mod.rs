//! University timetable construction on top of the [`csp`](crate::csp) engine.
//!
//! A [`Curriculum`] lists subjects, teachers, groups with their weekly
//! hours, and the week grid. [`TimetableProblem`] casts it as a CSP under
//! one of two [`Framing`]s and a chosen list of [`ConstraintKind`]s, then
//! solves it into a [`Timetable`].
//!
//! # Framings
//!
//! - [`Framing::ByLesson`]: one variable per required lesson, valued with
//!   (day, timeslot, teacher). Hours are met by construction.
//! - [`Framing::BySlot`]: one variable per group cell, valued with
//!   (subject, teacher) or free. Add [`ConstraintKind::ExactHours`] so that
//!   a week of free cells is not accepted.

mod constraints;
mod curriculum;
mod problem;
mod report;
mod types;

pub use constraints::ConstraintKind;
pub use curriculum::{
    Curriculum, CurriculumError, DayId, Group, GroupId, Requirement, SlotId, Subject, SubjectId,
    Teacher, TeacherId, Week,
};
pub use problem::{TimetableError, TimetableOutcome, TimetableProblem, TimetableSolution};
pub use report::{GroupSchedule, SlotEntry, Timetable};
pub use types::{Framing, Placement, TimetableValue, TimetableVar};
