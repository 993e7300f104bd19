//! Builds a week for three university groups and prints it.
//!
//! Run with `RUST_LOG=debug` to see search statistics.

use std::process::ExitCode;

use log::{error, info};
use u_timetable::csp::{CspConfig, SearchMode};
use u_timetable::timetable::{
    ConstraintKind, Curriculum, Framing, Group, Teacher, TimetableError, TimetableOutcome,
    TimetableProblem, Week,
};

fn curriculum() -> Curriculum {
    let week = Week::new(
        ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
        ["0", "1", "2", "3"],
    );

    Curriculum::new(week)
        .with_subject("Discrete Mathematics")
        .with_subject("Computer Architecture")
        .with_subject("Operating Systems")
        .with_subject("Programming")
        .with_subject("English")
        .with_subject("Mathematical Analysis")
        .with_subject("Algebra and Geometry")
        .with_subject("Physical Education")
        .with_teacher(
            Teacher::new("Камаз Павлович")
                .with_subject("Discrete Mathematics")
                .with_subject("Mathematical Analysis"),
        )
        .with_teacher(Teacher::new("Макар Бьорнович").with_subject("Computer Architecture"))
        .with_teacher(
            Teacher::new("Монстр Хайнєкен")
                .with_subject("Operating Systems")
                .with_subject("Algebra and Geometry"),
        )
        .with_teacher(Teacher::new("Замир Безрусні").with_subject("Programming"))
        .with_teacher(Teacher::new("Володимир Тарануха").with_subject("Programming"))
        .with_teacher(Teacher::new("Красовська І.В.").with_subject("English"))
        .with_teacher(Teacher::new("Василь Неміров").with_subject("Physical Education"))
        .with_group(
            Group::new("TK-41")
                .with_requirement("Programming", 4)
                .with_requirement("Operating Systems", 2)
                .with_requirement("English", 1)
                .with_requirement("Mathematical Analysis", 1)
                .with_requirement("Algebra and Geometry", 1),
        )
        .with_group(
            Group::new("MI-2")
                .with_requirement("Programming", 2)
                .with_requirement("English", 1)
                .with_requirement("Mathematical Analysis", 3)
                .with_requirement("Algebra and Geometry", 3)
                .with_requirement("Physical Education", 1),
        )
        .with_group(
            Group::new("ТТП-42")
                .with_requirement("Programming", 2)
                .with_requirement("English", 1)
                .with_requirement("Mathematical Analysis", 3)
                .with_requirement("Algebra and Geometry", 3)
                .with_requirement("Physical Education", 1),
        )
}

fn solve(framing: Framing, config: &CspConfig) -> Result<(), TimetableError> {
    let mut constraints = ConstraintKind::defaults(framing);
    constraints.push(ConstraintKind::ConsecutiveLimit { max_run: 2 });

    let problem = TimetableProblem::new(curriculum(), framing, &constraints)?;
    match problem.solve(config)? {
        TimetableOutcome::Solved(solution) => {
            println!("== {framing:?} ==");
            println!("{}", solution.timetable);
            let stats = solution.stats;
            println!(
                "nodes: {}, backtracks: {}, rejections: {}, checks: {}, {} ms\n",
                stats.nodes,
                stats.backtracks,
                stats.rejections,
                stats.constraint_checks,
                stats.elapsed_ms
            );
        }
        TimetableOutcome::NoSolution(stats) => {
            println!("{framing:?}: no timetable exists ({} nodes)", stats.nodes);
        }
        TimetableOutcome::Cancelled(stats) => {
            println!("{framing:?}: gave up after {} nodes", stats.nodes);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let config = CspConfig::default()
        .with_mode(SearchMode::Iterative)
        .with_time_limit_ms(30_000);
    info!("Solving with {config:?}");

    for framing in [Framing::ByLesson, Framing::BySlot] {
        if let Err(e) = solve(framing, &config) {
            error!("{framing:?}: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
