//! Criterion benchmarks for the backtracking engine.
//!
//! N-queens measures raw engine and heuristic overhead; the school
//! timetable measures the timetable constraints under both framings.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_timetable::csp::{
    Assignment, Constraint, CspConfig, CspModel, CspRunner, ValueOrdering, VariableOrdering,
};
use u_timetable::timetable::{
    ConstraintKind, Curriculum, Framing, Group, Teacher, TimetableProblem, Week,
};

// ===========================================================================
// N-queens: variable = column, value = row
// ===========================================================================

fn attacks((c1, r1): (usize, usize), (c2, r2): (usize, usize)) -> bool {
    r1 == r2 || c1.abs_diff(c2) == r1.abs_diff(r2)
}

/// No two placed queens share a row or a diagonal.
struct NoAttack;

impl Constraint<usize, usize> for NoAttack {
    fn name(&self) -> &str {
        "no-attack"
    }

    fn is_satisfied(&self, a: &Assignment<usize, usize>) -> bool {
        let placed: Vec<(usize, usize)> = a.iter().map(|(&c, &r)| (c, r)).collect();
        placed
            .iter()
            .enumerate()
            .all(|(i, &p)| placed[i + 1..].iter().all(|&q| !attacks(p, q)))
    }

    fn accepts_latest(&self, a: &Assignment<usize, usize>) -> bool {
        let Some((&c, &r)) = a.last() else {
            return true;
        };
        a.iter_before_last().all(|(&c2, &r2)| !attacks((c, r), (c2, r2)))
    }
}

fn queens(n: usize) -> CspModel<usize, usize> {
    let mut model = CspModel::new(format!("{n}-queens"));
    for col in 0..n {
        model.add_variable(col, (0..n).collect());
    }
    model.add_constraint(NoAttack);
    model
}

fn bench_queens(c: &mut Criterion) {
    let mut group = c.benchmark_group("queens");
    group.sample_size(10);

    let plain = CspConfig::default()
        .with_variable_ordering(VariableOrdering::InputOrder)
        .with_value_ordering(ValueOrdering::DomainOrder);
    let configs = [("input_order", plain), ("mrv_lcv", CspConfig::default())];

    for n in [8, 16] {
        let model = queens(n);
        for (name, config) in &configs {
            // The full all-pairs check must accept what the incremental one built
            let solved = CspRunner::run(&model, config).unwrap();
            let board = solved.assignment.expect("n-queens is solvable for n >= 4");
            assert!(model.verify(&board).is_ok(), "{name}: {n}-queens");

            group.bench_with_input(BenchmarkId::new(*name, n), &model, |b, m| {
                b.iter(|| black_box(CspRunner::run(m, config)))
            });
        }
    }
    group.finish();
}

// ===========================================================================
// School timetable
// ===========================================================================

fn school(groups: usize) -> Curriculum {
    let mut c = Curriculum::new(Week::numbered(["Mon", "Tue", "Wed", "Thu", "Fri"], 4))
        .with_subject("Programming")
        .with_subject("English")
        .with_subject("Analysis")
        .with_subject("Algebra")
        .with_teacher(Teacher::new("P1").with_subject("Programming"))
        .with_teacher(Teacher::new("P2").with_subject("Programming"))
        .with_teacher(Teacher::new("E").with_subject("English"))
        .with_teacher(Teacher::new("M1").with_subject("Analysis").with_subject("Algebra"))
        .with_teacher(Teacher::new("M2").with_subject("Algebra"));
    for g in 0..groups {
        c = c.with_group(
            Group::new(format!("G{g}"))
                .with_requirement("Programming", 3)
                .with_requirement("English", 1)
                .with_requirement("Analysis", 2)
                .with_requirement("Algebra", 2),
        );
    }
    c
}

fn bench_school(c: &mut Criterion) {
    let mut group = c.benchmark_group("school");
    group.sample_size(10);

    for framing in [Framing::ByLesson, Framing::BySlot] {
        let problem =
            TimetableProblem::new(school(3), framing, &ConstraintKind::defaults(framing))
                .expect("valid curriculum");
        group.bench_function(format!("{framing:?}"), |b| {
            b.iter(|| black_box(problem.solve(&CspConfig::default())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_queens, bench_school);
criterion_main!(benches);
