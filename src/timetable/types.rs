//! Timetable variables and values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::curriculum::{DayId, GroupId, SlotId, SubjectId, TeacherId};

/// How a timetable is cast as a CSP.
///
/// Both framings describe the same timetables; they differ in which
/// dimensions are fixed by the variable and which are chosen by the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Framing {
    /// One variable per required lesson (group, subject, occurrence),
    /// valued with a (day, timeslot, teacher).
    #[default]
    ByLesson,
    /// One variable per (group, day, timeslot), valued with a
    /// (subject, teacher) or left free.
    BySlot,
}

/// A schedulable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimetableVar {
    /// The `occurrence`-th weekly lesson of `subject` for `group`.
    Lesson {
        group: GroupId,
        subject: SubjectId,
        occurrence: u32,
    },
    /// A group's (day, timeslot) cell.
    Slot {
        group: GroupId,
        day: DayId,
        timeslot: SlotId,
    },
}

impl TimetableVar {
    /// The group this variable belongs to.
    pub fn group(&self) -> GroupId {
        match *self {
            TimetableVar::Lesson { group, .. } | TimetableVar::Slot { group, .. } => group,
        }
    }
}

/// A candidate value: the dimensions the variable leaves open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimetableValue {
    /// For [`TimetableVar::Lesson`]: when and by whom.
    Meeting {
        day: DayId,
        timeslot: SlotId,
        teacher: TeacherId,
    },
    /// For [`TimetableVar::Slot`]: what and by whom.
    Class {
        subject: SubjectId,
        teacher: TeacherId,
    },
    /// For [`TimetableVar::Slot`]: no lesson in this cell.
    Free,
}

/// A fully resolved lesson: who teaches what to whom, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub group: GroupId,
    pub day: DayId,
    pub timeslot: SlotId,
    pub subject: SubjectId,
    pub teacher: TeacherId,
}

impl Placement {
    /// Resolves a binding into a lesson.
    ///
    /// Returns `None` for free cells and for value shapes that do not belong
    /// to the variable's framing.
    pub fn resolve(var: &TimetableVar, value: &TimetableValue) -> Option<Placement> {
        match (*var, *value) {
            (
                TimetableVar::Lesson { group, subject, .. },
                TimetableValue::Meeting {
                    day,
                    timeslot,
                    teacher,
                },
            )
            | (
                TimetableVar::Slot {
                    group,
                    day,
                    timeslot,
                },
                TimetableValue::Class { subject, teacher },
            ) => Some(Placement {
                group,
                day,
                timeslot,
                subject,
                teacher,
            }),
            _ => None,
        }
    }

    /// Whether both lessons happen in the same (day, timeslot).
    pub fn same_time(&self, other: &Placement) -> bool {
        self.day == other.day && self.timeslot == other.timeslot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_both_framings() {
        let lesson = TimetableVar::Lesson {
            group: GroupId(1),
            subject: SubjectId(2),
            occurrence: 0,
        };
        let meeting = TimetableValue::Meeting {
            day: DayId(3),
            timeslot: SlotId(1),
            teacher: TeacherId(4),
        };
        let slot = TimetableVar::Slot {
            group: GroupId(1),
            day: DayId(3),
            timeslot: SlotId(1),
        };
        let class = TimetableValue::Class {
            subject: SubjectId(2),
            teacher: TeacherId(4),
        };

        let a = Placement::resolve(&lesson, &meeting).unwrap();
        let b = Placement::resolve(&slot, &class).unwrap();
        assert_eq!(a, b);
        assert!(a.same_time(&b));
        assert_eq!(lesson.group(), GroupId(1));
        assert_eq!(slot.group(), GroupId(1));
    }

    #[test]
    fn test_resolve_free_and_mismatched() {
        let slot = TimetableVar::Slot {
            group: GroupId(0),
            day: DayId(0),
            timeslot: SlotId(0),
        };
        assert_eq!(Placement::resolve(&slot, &TimetableValue::Free), None);

        let meeting = TimetableValue::Meeting {
            day: DayId(0),
            timeslot: SlotId(0),
            teacher: TeacherId(0),
        };
        assert_eq!(Placement::resolve(&slot, &meeting), None);
    }
}
