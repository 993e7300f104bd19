//! JavaScript entry point.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::csp::{CspConfig, SearchStats, SearchStatus};
use crate::timetable::{ConstraintKind, Curriculum, Framing, Timetable, TimetableOutcome, TimetableProblem};

#[derive(Deserialize)]
struct SolveRequest {
    curriculum: Curriculum,
    #[serde(default)]
    framing: Framing,
    /// Defaults to [`ConstraintKind::defaults`] for the framing.
    #[serde(default)]
    constraints: Option<Vec<ConstraintKind>>,
    #[serde(default)]
    config: CspConfig,
}

#[derive(Serialize)]
struct SolveResponse {
    status: SearchStatus,
    timetable: Option<Timetable>,
    stats: SearchStats,
}

/// Solves a timetable described by a plain JS object:
///
/// ```js
/// solve_timetable({
///   curriculum: { subjects: [...], teachers: [...], groups: [...], week: {...} },
///   framing: "ByLesson",        // optional
///   constraints: [...],         // optional
///   config: { ... },            // optional
/// })
/// ```
///
/// Returns `{ status, timetable, stats }`; `timetable` is `null` unless the
/// status is `"Solved"`. Invalid input throws.
#[wasm_bindgen]
pub fn solve_timetable(request: JsValue) -> Result<JsValue, JsError> {
    let request: SolveRequest = serde_wasm_bindgen::from_value(request)?;
    let constraints = request
        .constraints
        .unwrap_or_else(|| ConstraintKind::defaults(request.framing));

    let problem = TimetableProblem::new(request.curriculum, request.framing, &constraints)?;
    let outcome = problem.solve(&request.config)?;

    let response = match outcome {
        TimetableOutcome::Solved(solution) => SolveResponse {
            status: SearchStatus::Solved,
            timetable: Some(solution.timetable),
            stats: solution.stats,
        },
        TimetableOutcome::NoSolution(stats) => SolveResponse {
            status: SearchStatus::NoSolution,
            timetable: None,
            stats,
        },
        TimetableOutcome::Cancelled(stats) => SolveResponse {
            status: SearchStatus::Cancelled,
            timetable: None,
            stats,
        },
    };
    Ok(serde_wasm_bindgen::to_value(&response)?)
}
