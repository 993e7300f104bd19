//! Turns a [`Curriculum`] into a CSP and solves it.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;

use crate::csp::{Assignment, CspConfig, CspError, CspModel, CspRunner, SearchStats, SearchStatus};

use super::constraints::{ConstraintContext, ConstraintKind};
use super::curriculum::{Curriculum, CurriculumError, GroupId, SubjectId, TeacherId};
use super::report::Timetable;
use super::types::{Framing, TimetableValue, TimetableVar};

/// Anything that stops a curriculum from being solved.
///
/// An exhausted or cancelled search is not an error; see
/// [`TimetableOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableError {
    #[error(transparent)]
    Curriculum(#[from] CurriculumError),

    #[error(transparent)]
    Csp(#[from] CspError<TimetableVar>),
}

/// A solved timetable.
#[derive(Debug, Clone)]
pub struct TimetableSolution {
    /// Readable view of the solution.
    pub timetable: Timetable,
    /// The raw complete assignment.
    pub assignment: Assignment<TimetableVar, TimetableValue>,
    /// Search counters.
    pub stats: SearchStats,
}

/// How solving a timetable ended.
#[derive(Debug, Clone)]
pub enum TimetableOutcome {
    /// A complete timetable satisfying every installed constraint.
    Solved(TimetableSolution),
    /// The search tree was exhausted.
    NoSolution(SearchStats),
    /// A node limit, time limit or cancel flag stopped the search.
    Cancelled(SearchStats),
}

impl TimetableOutcome {
    /// Whether a timetable was found.
    pub fn is_solved(&self) -> bool {
        matches!(self, TimetableOutcome::Solved(_))
    }

    /// The timetable, if one was found.
    pub fn solution(&self) -> Option<&TimetableSolution> {
        match self {
            TimetableOutcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    /// Search counters, whatever the outcome.
    pub fn stats(&self) -> SearchStats {
        match self {
            TimetableOutcome::Solved(solution) => solution.stats,
            TimetableOutcome::NoSolution(stats) | TimetableOutcome::Cancelled(stats) => *stats,
        }
    }
}

/// A curriculum cast as a CSP under one framing and constraint set.
///
/// # Examples
///
/// ```
/// use u_timetable::csp::CspConfig;
/// use u_timetable::timetable::{
///     ConstraintKind, Curriculum, Framing, Group, Teacher, TimetableProblem, Week,
/// };
///
/// let curriculum = Curriculum::new(Week::numbered(["Mon"], 2))
///     .with_subject("Algebra")
///     .with_teacher(Teacher::new("Ada").with_subject("Algebra"))
///     .with_group(Group::new("A").with_requirement("Algebra", 1))
///     .with_group(Group::new("B").with_requirement("Algebra", 1));
///
/// let problem =
///     TimetableProblem::new(curriculum, Framing::ByLesson, &ConstraintKind::required()).unwrap();
/// let outcome = problem.solve(&CspConfig::default()).unwrap();
/// assert!(outcome.is_solved());
/// ```
pub struct TimetableProblem {
    curriculum: Curriculum,
    framing: Framing,
    constraints: Vec<ConstraintKind>,
    model: CspModel<TimetableVar, TimetableValue>,
}

impl TimetableProblem {
    /// Validates the curriculum and builds variables, domains and the
    /// constraints in the given order.
    ///
    /// Variables with empty domains are allowed here; solving reports the
    /// first one as [`CspError::EmptyDomain`] before any search step.
    pub fn new(
        curriculum: Curriculum,
        framing: Framing,
        constraints: &[ConstraintKind],
    ) -> Result<Self, CurriculumError> {
        curriculum.validate()?;

        let mut model = CspModel::new(match framing {
            Framing::ByLesson => "timetable-by-lesson",
            Framing::BySlot => "timetable-by-slot",
        });
        let mut context = ConstraintContext::default();

        for g in 0..curriculum.groups.len() {
            let group_id = GroupId(g);
            let requirements = requirements(&curriculum, group_id);
            for &(subject, hours) in &requirements {
                context.hours.insert((group_id, subject), hours);
            }

            let before = model.variable_count();
            match framing {
                Framing::ByLesson => add_lessons(&mut model, &curriculum, group_id, &requirements),
                Framing::BySlot => add_slots(&mut model, &curriculum, group_id, &requirements),
            }
            context
                .capacity
                .insert(group_id, model.variable_count() - before);
        }

        for (t, teacher) in curriculum.teachers.iter().enumerate() {
            if let Some(max) = teacher.max_load {
                context.loads.insert(TeacherId(t), max);
            }
        }

        for &kind in constraints {
            model.add_boxed_constraint(context.build(kind));
        }

        debug!(
            "Built {} with {} variables and {} constraints",
            model.name,
            model.variable_count(),
            model.constraint_count()
        );

        Ok(Self {
            curriculum,
            framing,
            constraints: constraints.to_vec(),
            model,
        })
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// The installed constraints, in evaluation order.
    pub fn constraints(&self) -> &[ConstraintKind] {
        &self.constraints
    }

    /// The underlying CSP model.
    pub fn model(&self) -> &CspModel<TimetableVar, TimetableValue> {
        &self.model
    }

    /// Human-readable name of a variable, e.g. `TK-41 / Algebra #2` or
    /// `TK-41 / Monday 3`.
    ///
    /// Returns `None` if `var` refers to ids outside this curriculum.
    pub fn describe(&self, var: &TimetableVar) -> Option<String> {
        let c = &self.curriculum;
        match *var {
            TimetableVar::Lesson {
                group,
                subject,
                occurrence,
            } => {
                let group = c.groups.get(group.0)?;
                let subject = c.subjects.get(subject.0)?;
                Some(format!(
                    "{} / {} #{}",
                    group.name,
                    subject.name,
                    occurrence + 1
                ))
            }
            TimetableVar::Slot {
                group,
                day,
                timeslot,
            } => {
                let group = c.groups.get(group.0)?;
                let day = c.week.days.get(day.0)?;
                let timeslot = c.week.timeslots.get(timeslot.0)?;
                Some(format!("{} / {} {}", group.name, day, timeslot))
            }
        }
    }

    /// Solves the problem.
    pub fn solve(&self, config: &CspConfig) -> Result<TimetableOutcome, TimetableError> {
        self.solve_with_cancel(config, None)
    }

    /// Solves the problem, stopping early once `cancel` is set.
    ///
    /// A required subject nobody can teach fails before any search step:
    /// as [`CspError::EmptyDomain`] of its first lesson under
    /// [`Framing::ByLesson`], and as [`CurriculumError::NoQualifiedTeacher`]
    /// under [`Framing::BySlot`], where every cell can still be left free.
    pub fn solve_with_cancel(
        &self,
        config: &CspConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<TimetableOutcome, TimetableError> {
        config
            .validate()
            .map_err(CspError::<TimetableVar>::InvalidConfig)?;
        self.model.validate()?;
        if let Some((group, req)) = self.curriculum.unteachable() {
            return Err(CurriculumError::NoQualifiedTeacher {
                group: group.name.clone(),
                subject: req.subject.clone(),
            }
            .into());
        }

        let result = CspRunner::run_with_cancel(&self.model, config, cancel)?;
        let stats = result.stats;

        let outcome = match (result.status, result.assignment) {
            (SearchStatus::Solved, Some(assignment)) => {
                let timetable = Timetable::from_assignment(&self.curriculum, &assignment);
                TimetableOutcome::Solved(TimetableSolution {
                    timetable,
                    assignment,
                    stats,
                })
            }
            (SearchStatus::Cancelled, _) => TimetableOutcome::Cancelled(stats),
            _ => TimetableOutcome::NoSolution(stats),
        };

        info!(
            "{}: {} after {} nodes, {} backtracks, {} ms",
            self.model.name,
            match outcome {
                TimetableOutcome::Solved(_) => "solved",
                TimetableOutcome::NoSolution(_) => "no solution",
                TimetableOutcome::Cancelled(_) => "cancelled",
            },
            stats.nodes,
            stats.backtracks,
            stats.elapsed_ms
        );
        Ok(outcome)
    }
}

/// A group's (subject, hours) requirements, resolved to ids.
fn requirements(curriculum: &Curriculum, group: GroupId) -> Vec<(SubjectId, u32)> {
    curriculum
        .group(group)
        .requirements
        .iter()
        .filter_map(|r| curriculum.subject_id(&r.subject).map(|s| (s, r.hours)))
        .collect()
}

fn add_lessons(
    model: &mut CspModel<TimetableVar, TimetableValue>,
    curriculum: &Curriculum,
    group: GroupId,
    requirements: &[(SubjectId, u32)],
) {
    for &(subject, hours) in requirements {
        let teachers = curriculum.qualified_teachers(subject);
        let domain: Vec<TimetableValue> = curriculum
            .week
            .slots()
            .flat_map(|(day, timeslot)| {
                teachers.iter().map(move |&teacher| TimetableValue::Meeting {
                    day,
                    timeslot,
                    teacher,
                })
            })
            .collect();

        for occurrence in 0..hours {
            model.add_variable(
                TimetableVar::Lesson {
                    group,
                    subject,
                    occurrence,
                },
                domain.clone(),
            );
        }
    }
}

fn add_slots(
    model: &mut CspModel<TimetableVar, TimetableValue>,
    curriculum: &Curriculum,
    group: GroupId,
    requirements: &[(SubjectId, u32)],
) {
    let mut domain: Vec<TimetableValue> = requirements
        .iter()
        .flat_map(|&(subject, _)| {
            curriculum
                .qualified_teachers(subject)
                .into_iter()
                .map(move |teacher| TimetableValue::Class { subject, teacher })
        })
        .collect();
    domain.push(TimetableValue::Free);

    for (day, timeslot) in curriculum.week.slots() {
        model.add_variable(
            TimetableVar::Slot {
                group,
                day,
                timeslot,
            },
            domain.clone(),
        );
    }
}
