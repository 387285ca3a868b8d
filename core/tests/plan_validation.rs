mod common;

use calcflow_core::error::{ErrorCode, ExecutorError};
use calcflow_core::executor::{EdgeKind, ExecutionPlan, VariableTable};
use calcflow_core::expr::ParseError;
use pretty_assertions::assert_eq;

use common::table;

#[test]
fn every_edge_points_to_an_earlier_wave() {
    let plan = ExecutionPlan::build(
        &[
            "i = 0",
            "j = ++i",
            "x = i++ + 5",
            "y = (5 + 3) * 10",
            "i += y",
            "z = i++ + j",
            "w = x + y + z",
        ],
        &VariableTable::new(),
    )
    .unwrap();

    let wave_of = plan.wave_of();
    for edge in plan.graph.edges() {
        assert!(wave_of[edge.to] < wave_of[edge.from], "{edge:?}");
    }

    let mut seen: Vec<usize> = plan.linear_order().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..plan.len()).collect::<Vec<_>>());
}

#[test]
fn increments_serialise_writers_of_the_same_variable() {
    let plan =
        ExecutionPlan::build(&["i = 0", "j = ++i", "k = i++"], &VariableTable::new()).unwrap();
    assert_eq!(plan.waves, vec![vec![0], vec![1], vec![2]]);
    assert!(plan
        .graph
        .edges()
        .iter()
        .any(|e| e.from == 2 && e.to == 1 && e.kind == EdgeKind::Data && e.variable == "i"));
}

#[test]
fn readers_of_initial_values_run_before_the_overwrite() {
    let plan =
        ExecutionPlan::build(&["y = x * 2", "x = 7", "z = x"], &table(&[("x", 1)])).unwrap();
    assert_eq!(plan.waves, vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn cycle_disappears_when_a_variable_is_initialised() {
    let sources = ["x = y + 1", "y = x + 1"];
    let err = ExecutionPlan::build(&sources, &VariableTable::new()).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::CircularDependency);

    let plan = ExecutionPlan::build(&sources, &table(&[("y", 1)])).unwrap();
    assert_eq!(plan.waves, vec![vec![0], vec![1]]);
}

#[test]
fn parse_errors_carry_the_expression_index() {
    let err = ExecutionPlan::build(&["x = 1", "= 2"], &VariableTable::new()).unwrap_err();
    match err {
        ExecutorError::Parse {
            index,
            expression,
            source,
        } => {
            assert_eq!(index, 1);
            assert_eq!(expression, "= 2");
            assert_eq!(source, ParseError::MissingTarget);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn deeply_nested_expression_is_a_parse_error() {
    for n in [2_000, 10_000, 30_000] {
        let sources = vec![
            "y = 1".to_string(),
            format!("x = {}1{}", "(".repeat(n), ")".repeat(n)),
        ];
        let err = ExecutionPlan::build(sources.as_slice(), &VariableTable::new()).unwrap_err();
        assert!(
            matches!(
                err,
                ExecutorError::Parse {
                    index: 1,
                    source: ParseError::TooDeep { .. },
                    ..
                }
            ),
            "depth {n}: {err:?}"
        );
        assert_eq!(err.error_code(), ErrorCode::ParseError);
    }
}
