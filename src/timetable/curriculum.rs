//! Curriculum: subjects, teachers, groups and the teaching week.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a subject in [`Curriculum::subjects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(pub usize);

/// Index of a teacher in [`Curriculum::teachers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeacherId(pub usize);

/// Index of a group in [`Curriculum::groups`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

/// Index of a day in [`Week::days`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayId(pub usize);

/// Index of a timeslot in [`Week::timeslots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// A subject, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Subject {
    pub name: String,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A teacher and the subjects they are qualified to teach.
///
/// Equality and hashing use the name only.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Teacher {
    pub name: String,
    /// Names of subjects this teacher can teach.
    pub subjects: Vec<String>,
    /// Maximum lessons per week, if limited.
    pub max_load: Option<u32>,
}

impl Teacher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subjects: Vec::new(),
            max_load: None,
        }
    }

    /// Adds a subject this teacher can teach.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }

    /// Caps the teacher's weekly load.
    pub fn with_max_load(mut self, lessons: u32) -> Self {
        self.max_load = Some(lessons);
        self
    }

    /// Whether this teacher can teach `subject`.
    pub fn can_teach(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

impl PartialEq for Teacher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Teacher {}

impl Hash for Teacher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Weekly hours a group needs for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Requirement {
    pub subject: String,
    pub hours: u32,
}

/// A student group and its weekly curriculum.
///
/// Equality and hashing use the name only.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group {
    pub name: String,
    /// Subjects in declaration order, each with its weekly hours.
    pub requirements: Vec<Requirement>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
        }
    }

    /// Requires `hours` lessons of `subject` per week.
    pub fn with_requirement(mut self, subject: impl Into<String>, hours: u32) -> Self {
        self.requirements.push(Requirement {
            subject: subject.into(),
            hours,
        });
        self
    }

    /// Total weekly lessons.
    pub fn total_hours(&self) -> u32 {
        self.requirements.iter().map(|r| r.hours).sum()
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Group {}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// The teaching week: ordered days, each with the same ordered timeslots.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Week {
    pub days: Vec<String>,
    pub timeslots: Vec<String>,
}

impl Week {
    pub fn new<D, T>(days: D, timeslots: T) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            days: days.into_iter().map(Into::into).collect(),
            timeslots: timeslots.into_iter().map(Into::into).collect(),
        }
    }

    /// A week with the given days and `slots` timeslots labelled `0..slots`.
    pub fn numbered<D>(days: D, slots: usize) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self::new(days, (0..slots).map(|i| i.to_string()))
    }

    /// Number of (day, timeslot) pairs.
    pub fn slot_count(&self) -> usize {
        self.days.len() * self.timeslots.len()
    }

    /// Every (day, timeslot) pair, day-major.
    pub fn slots(&self) -> impl Iterator<Item = (DayId, SlotId)> + '_ {
        (0..self.days.len())
            .flat_map(move |d| (0..self.timeslots.len()).map(move |t| (DayId(d), SlotId(t))))
    }
}

/// A curriculum problem statement that cannot be turned into a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurriculumError {
    #[error("subject '{0}' is declared more than once")]
    DuplicateSubject(String),

    #[error("teacher '{0}' is declared more than once")]
    DuplicateTeacher(String),

    #[error("group '{0}' is declared more than once")]
    DuplicateGroup(String),

    #[error("'{owner}' refers to unknown subject '{subject}'")]
    UnknownSubject { owner: String, subject: String },

    #[error("group '{group}' lists subject '{subject}' more than once")]
    DuplicateRequirement { group: String, subject: String },

    #[error("group '{group}' requires zero hours of '{subject}'")]
    ZeroHours { group: String, subject: String },

    #[error("the week has no timeslots")]
    EmptyWeek,

    #[error("group '{group}' needs '{subject}' but no teacher can teach it")]
    NoQualifiedTeacher { group: String, subject: String },
}

/// Everything the timetable solver needs to know about a school.
///
/// Built once and read-only afterwards.
///
/// # Examples
///
/// ```
/// use u_timetable::timetable::{Curriculum, Group, Teacher, Week};
///
/// let curriculum = Curriculum::new(Week::numbered(["Mon", "Tue"], 2))
///     .with_subject("Algebra")
///     .with_teacher(Teacher::new("Ada").with_subject("Algebra"))
///     .with_group(Group::new("G1").with_requirement("Algebra", 3));
/// assert!(curriculum.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Curriculum {
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub groups: Vec<Group>,
    pub week: Week,
}

impl Curriculum {
    /// An empty curriculum over `week`.
    pub fn new(week: Week) -> Self {
        Self {
            subjects: Vec::new(),
            teachers: Vec::new(),
            groups: Vec::new(),
            week,
        }
    }

    /// Declares a subject.
    pub fn with_subject(mut self, name: impl Into<String>) -> Self {
        self.subjects.push(Subject::new(name));
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Adds a group.
    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// Id of the subject named `name`.
    pub fn subject_id(&self, name: &str) -> Option<SubjectId> {
        self.subjects.iter().position(|s| s.name == name).map(SubjectId)
    }

    /// Id of the group named `name`.
    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| g.name == name).map(GroupId)
    }

    /// Id of the teacher named `name`.
    pub fn teacher_id(&self, name: &str) -> Option<TeacherId> {
        self.teachers.iter().position(|t| t.name == name).map(TeacherId)
    }

    /// The subject with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this curriculum.
    pub fn subject(&self, id: SubjectId) -> &Subject {
        &self.subjects[id.0]
    }

    /// The teacher with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this curriculum.
    pub fn teacher(&self, id: TeacherId) -> &Teacher {
        &self.teachers[id.0]
    }

    /// The group with id `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this curriculum.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    /// Teachers able to teach `subject`, in declaration order.
    pub fn qualified_teachers(&self, subject: SubjectId) -> Vec<TeacherId> {
        let name = &self.subject(subject).name;
        self.teachers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.can_teach(name))
            .map(|(i, _)| TeacherId(i))
            .collect()
    }

    /// The first requirement, in group then declaration order, that no
    /// teacher is qualified for.
    pub fn unteachable(&self) -> Option<(&Group, &Requirement)> {
        self.groups
            .iter()
            .flat_map(|g| g.requirements.iter().map(move |r| (g, r)))
            .find(|(_, r)| !self.teachers.iter().any(|t| t.can_teach(&r.subject)))
    }

    /// Checks names, references and hour counts.
    ///
    /// A subject nobody can teach is not an error here; solving reports it
    /// before any search step (see [`Curriculum::unteachable`]).
    pub fn validate(&self) -> Result<(), CurriculumError> {
        if self.week.slot_count() == 0 {
            return Err(CurriculumError::EmptyWeek);
        }

        let mut subjects = HashSet::new();
        for subject in &self.subjects {
            if !subjects.insert(subject.name.as_str()) {
                return Err(CurriculumError::DuplicateSubject(subject.name.clone()));
            }
        }

        let mut teachers = HashSet::new();
        for teacher in &self.teachers {
            if !teachers.insert(teacher.name.as_str()) {
                return Err(CurriculumError::DuplicateTeacher(teacher.name.clone()));
            }
            if let Some(unknown) = teacher.subjects.iter().find(|s| !subjects.contains(s.as_str())) {
                return Err(CurriculumError::UnknownSubject {
                    owner: teacher.name.clone(),
                    subject: unknown.clone(),
                });
            }
        }

        let mut groups = HashSet::new();
        for group in &self.groups {
            if !groups.insert(group.name.as_str()) {
                return Err(CurriculumError::DuplicateGroup(group.name.clone()));
            }
            let mut listed = HashSet::new();
            for req in &group.requirements {
                if !subjects.contains(req.subject.as_str()) {
                    return Err(CurriculumError::UnknownSubject {
                        owner: group.name.clone(),
                        subject: req.subject.clone(),
                    });
                }
                if !listed.insert(req.subject.as_str()) {
                    return Err(CurriculumError::DuplicateRequirement {
                        group: group.name.clone(),
                        subject: req.subject.clone(),
                    });
                }
                if req.hours == 0 {
                    return Err(CurriculumError::ZeroHours {
                        group: group.name.clone(),
                        subject: req.subject.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Curriculum {
        Curriculum::new(Week::numbered(["Mon", "Tue"], 2))
            .with_subject("Algebra")
            .with_subject("English")
            .with_teacher(Teacher::new("Ada").with_subject("Algebra"))
            .with_teacher(Teacher::new("Bob").with_subject("English").with_subject("Algebra"))
            .with_group(Group::new("G1").with_requirement("Algebra", 2).with_requirement("English", 1))
    }

    #[test]
    fn test_lookup_and_qualification() {
        let c = sample();
        assert!(c.validate().is_ok());
        let algebra = c.subject_id("Algebra").unwrap();
        let english = c.subject_id("English").unwrap();
        assert_eq!(c.qualified_teachers(algebra), vec![TeacherId(0), TeacherId(1)]);
        assert_eq!(c.qualified_teachers(english), vec![TeacherId(1)]);
        assert_eq!(c.group_id("G1"), Some(GroupId(0)));
        assert_eq!(c.teacher_id("Bob"), Some(TeacherId(1)));
        assert_eq!(c.group(GroupId(0)).total_hours(), 3);
    }

    #[test]
    fn test_week_slots_day_major() {
        let week = Week::numbered(["Mon", "Tue"], 3);
        assert_eq!(week.slot_count(), 6);
        let slots: Vec<_> = week.slots().collect();
        assert_eq!(slots[0], (DayId(0), SlotId(0)));
        assert_eq!(slots[3], (DayId(1), SlotId(0)));
        assert_eq!(week.timeslots, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_identity_by_name() {
        let a = Teacher::new("Ada").with_subject("Algebra");
        let b = Teacher::new("Ada").with_max_load(3);
        assert_eq!(a, b);
        let set: HashSet<Group> = [Group::new("G1"), Group::new("G1").with_requirement("X", 1)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
        assert_eq!(Subject::new("Algebra"), Subject::new("Algebra"));
    }

    #[test]
    fn test_validation_errors() {
        let dup = sample().with_subject("Algebra");
        assert_eq!(dup.validate(), Err(CurriculumError::DuplicateSubject("Algebra".into())));

        let unknown = sample().with_teacher(Teacher::new("Cy").with_subject("Chemistry"));
        assert!(matches!(unknown.validate(), Err(CurriculumError::UnknownSubject { .. })));

        let zero = sample().with_group(Group::new("G2").with_requirement("English", 0));
        assert!(matches!(zero.validate(), Err(CurriculumError::ZeroHours { .. })));

        let twice = sample().with_group(
            Group::new("G2").with_requirement("English", 1).with_requirement("English", 1),
        );
        assert!(matches!(twice.validate(), Err(CurriculumError::DuplicateRequirement { .. })));

        // More hours than the week holds is a search failure, not a
        // validation error.
        let over = sample().with_group(Group::new("G2").with_requirement("English", 5));
        assert!(over.validate().is_ok());

        let mut empty = sample();
        empty.week = Week::numbered(["Mon"], 0);
        assert_eq!(empty.validate(), Err(CurriculumError::EmptyWeek));
    }

    #[test]
    fn test_unteachable_requirement() {
        assert!(sample().unteachable().is_none());

        let c = sample()
            .with_subject("Latin")
            .with_subject("Greek")
            .with_group(Group::new("G2").with_requirement("English", 1).with_requirement("Latin", 1))
            .with_group(Group::new("G3").with_requirement("Greek", 1));
        let (group, req) = c.unteachable().unwrap();
        assert_eq!(group.name, "G2");
        assert_eq!(req.subject, "Latin");
    }

    #[test]
    fn test_error_display() {
        let e = CurriculumError::UnknownSubject {
            owner: "G1".into(),
            subject: "Latin".into(),
        };
        assert_eq!(e.to_string(), "'G1' refers to unknown subject 'Latin'");
    }
}
