//! Readable view of a solved timetable.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::csp::Assignment;

use super::curriculum::{Curriculum, DayId, GroupId, SlotId};
use super::types::{Placement, TimetableValue, TimetableVar};

/// What happens in one group's (day, timeslot) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SlotEntry {
    Class { subject: String, teacher: String },
    Free,
}

impl fmt::Display for SlotEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotEntry::Class { subject, teacher } => write!(f, "{subject} ({teacher})"),
            SlotEntry::Free => f.write_str("free"),
        }
    }
}

/// One group's week, indexed `[day][timeslot]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupSchedule {
    pub group: String,
    pub days: Vec<Vec<SlotEntry>>,
}

impl GroupSchedule {
    /// All cells, day-major.
    pub fn entries(&self) -> impl Iterator<Item = &SlotEntry> {
        self.days.iter().flatten()
    }

    /// Number of non-free cells.
    pub fn lesson_count(&self) -> usize {
        self.entries().filter(|e| **e != SlotEntry::Free).count()
    }
}

/// A timetable laid out group → day → timeslot in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timetable {
    pub days: Vec<String>,
    pub timeslots: Vec<String>,
    pub groups: Vec<GroupSchedule>,
}

impl Timetable {
    /// Lays out the placements of `assignment`; unplaced cells are free.
    ///
    /// The assignment is expected to be a verified solution. Should two
    /// placements share a cell, the later binding wins.
    pub fn from_assignment(
        curriculum: &Curriculum,
        assignment: &Assignment<TimetableVar, TimetableValue>,
    ) -> Self {
        let week = &curriculum.week;
        let mut groups: Vec<GroupSchedule> = curriculum
            .groups
            .iter()
            .map(|g| GroupSchedule {
                group: g.name.clone(),
                days: vec![vec![SlotEntry::Free; week.timeslots.len()]; week.days.len()],
            })
            .collect();

        for p in assignment
            .iter()
            .filter_map(|(var, value)| Placement::resolve(var, value))
        {
            let cell = groups
                .get_mut(p.group.0)
                .and_then(|g| g.days.get_mut(p.day.0))
                .and_then(|d| d.get_mut(p.timeslot.0));
            if let Some(cell) = cell {
                *cell = SlotEntry::Class {
                    subject: curriculum.subject(p.subject).name.clone(),
                    teacher: curriculum.teacher(p.teacher).name.clone(),
                };
            }
        }

        Self {
            days: week.days.clone(),
            timeslots: week.timeslots.clone(),
            groups,
        }
    }

    /// Schedule of the group named `name`.
    pub fn group(&self, name: &str) -> Option<&GroupSchedule> {
        self.groups.iter().find(|g| g.group == name)
    }

    pub fn entry(&self, group: GroupId, day: DayId, timeslot: SlotId) -> Option<&SlotEntry> {
        self.groups.get(group.0)?.days.get(day.0)?.get(timeslot.0)
    }
}

impl fmt::Display for Timetable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, schedule) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", schedule.group)?;
            for (day, cells) in self.days.iter().zip(&schedule.days) {
                writeln!(f, "  {day}")?;
                for (slot, entry) in self.timeslots.iter().zip(cells) {
                    writeln!(f, "    {slot}: {entry}")?;
                }
            }
        }
        Ok(())
    }
}
