//! Chunking and parameter-ordering behaviour of the batch compositor

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::*;

use batch_insert::{
    batch_insert, BatchInserter, EntityRow, Error, Record, Result, Row, TableMeta, TableRegistry,
    Value,
};

/// Executor stub that records every call and reports a fixed count per call
#[derive(Default)]
struct Recorder {
    calls: Vec<(String, Vec<Value>)>,
}

impl Recorder {
    fn executor(&mut self) -> impl FnMut(&str, &[Value]) -> Result<u64> + '_ {
        move |sql: &str, params: &[Value]| {
            self.calls.push((sql.to_string(), params.to_vec()));
            // Distinct per call so the sum is meaningful
            Ok(10 + self.calls.len() as u64)
        }
    }
}

fn value_groups(sql: &str) -> usize {
    sql.matches("(?").count()
}

fn rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Record::new()
                .with("id", i as i64)
                .with("name", format!("user-{}", i))
                .with("active", i % 2 == 0)
                .into()
        })
        .collect()
}

#[rstest]
#[case(5, 2, vec![2, 2, 1])]
#[case(6, 3, vec![3, 3])]
#[case(1, 10, vec![1])]
#[case(7, 1, vec![1, 1, 1, 1, 1, 1, 1])]
#[case(10, 4, vec![4, 4, 2])]
#[case(3, usize::MAX, vec![3])]
#[case(3, usize::MAX / 4, vec![3])]
fn test_chunk_sizes(#[case] n: usize, #[case] chunk_size: usize, #[case] expected: Vec<usize>) {
    let mut recorder = Recorder::default();
    let input = rows(n);

    let total = batch_insert("users", &input, chunk_size, &TableRegistry::new(), &mut recorder.executor())
        .unwrap()
        .unwrap();

    let groups: Vec<usize> = recorder.calls.iter().map(|(sql, _)| value_groups(sql)).collect();
    assert_eq!(groups, expected);
    assert_eq!(recorder.calls.len(), n.div_ceil(chunk_size));

    let expected_total: u64 = (1..=recorder.calls.len() as u64).map(|k| 10 + k).sum();
    assert_eq!(total, expected_total);
}

#[test]
fn test_params_follow_placeholders_row_major() {
    let mut recorder = Recorder::default();
    let input = rows(5);

    batch_insert("users", &input, 2, &TableRegistry::new(), &mut recorder.executor()).unwrap();

    let mut flattened = Vec::new();
    for (sql, params) in &recorder.calls {
        assert_eq!(params.len(), value_groups(sql) * 3);
        assert_eq!(sql.matches('?').count(), params.len());
        flattened.extend(params.iter().cloned());
    }

    let expected: Vec<Value> = (0..5)
        .flat_map(|i| {
            vec![
                Value::Int(i),
                Value::Text(format!("user-{}", i)),
                Value::Bool(i % 2 == 0),
            ]
        })
        .collect();
    assert_eq!(flattened, expected);
}

#[test]
fn test_column_order_stable_across_chunks() {
    let mut recorder = Recorder::default();
    let input = rows(5);

    batch_insert("users", &input, 2, &TableRegistry::new(), &mut recorder.executor()).unwrap();

    let prefix = "INSERT INTO `users` (`id`, `name`, `active`) VALUES ";
    for (sql, _) in &recorder.calls {
        assert!(sql.starts_with(prefix), "unexpected statement {}", sql);
    }
    assert_eq!(
        recorder.calls[0].0,
        format!("{}(?, ?, ?), (?, ?, ?)", prefix)
    );
    assert_eq!(recorder.calls[2].0, format!("{}(?, ?, ?)", prefix));
}

#[test]
fn test_empty_input_never_calls_executor() {
    let mut recorder = Recorder::default();

    let result = batch_insert("users", &[], 3, &TableRegistry::new(), &mut recorder.executor()).unwrap();

    assert_eq!(result, None);
    assert!(recorder.calls.is_empty());
}

#[test]
fn test_zero_affected_is_distinct_from_empty() {
    let mut executor = |_: &str, _: &[Value]| -> Result<u64> { Ok(0) };

    let result = batch_insert("users", &rows(2), 5, &TableRegistry::new(), &mut executor).unwrap();
    assert_eq!(result, Some(0));
}

#[test]
fn test_entity_non_columns_are_excluded() {
    let mut registry = TableRegistry::new();
    registry
        .register("Account", TableMeta::new("accounts", ["id", "email"]))
        .unwrap();
    let inserter = BatchInserter::new(Arc::new(registry), 10);

    let input: Vec<Row> = (0..3)
        .map(|i| {
            EntityRow::new("Account")
                .with("id", i)
                .with("email", format!("a{}@example.com", i))
                .with("login_count", 99)
                .into()
        })
        .collect();

    let mut recorder = Recorder::default();
    inserter.insert(None, &input, &mut recorder.executor()).unwrap();

    let (sql, params) = &recorder.calls[0];
    assert_eq!(
        sql,
        "INSERT INTO `accounts` (`id`, `email`) VALUES (?, ?), (?, ?), (?, ?)"
    );
    assert_eq!(params.len(), 6);
    assert!(!params.contains(&Value::Int(99)));
}

#[test]
fn test_unsupported_shape_fails_before_any_flush() {
    let mut recorder = Recorder::default();

    let err = Row::try_from(serde_json::json!("not a row")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedRowShape(_)));

    let registry = TableRegistry::new();
    let orphan: Vec<Row> = vec![EntityRow::new("Ghost").with("id", 1).into()];
    let err = BatchInserter::new(Arc::new(registry), 2)
        .insert(None, &orphan, &mut recorder.executor())
        .unwrap_err();

    assert!(matches!(err, Error::UnknownEntity(_)));
    assert!(recorder.calls.is_empty());
}

#[test]
fn test_mismatched_rows_fail_before_any_flush() {
    let mut recorder = Recorder::default();
    let mut input = rows(4);
    input.push(EntityRow::new("Account").with("id", 1).into());

    let err = batch_insert("users", &input, 2, &TableRegistry::new(), &mut recorder.executor()).unwrap_err();

    assert!(matches!(err, Error::RowShapeMismatch { row: 4, .. }));
    assert!(recorder.calls.is_empty());
}

#[test]
fn test_failure_stops_remaining_chunks() {
    let mut calls = 0;
    let mut executor = |_: &str, _: &[Value]| -> Result<u64> {
        calls += 1;
        Err(Error::DatabaseError("table is read only".to_string()))
    };

    let err = batch_insert("users", &rows(6), 2, &TableRegistry::new(), &mut executor).unwrap_err();

    assert!(matches!(err, Error::ExecutionFailure { chunk: 0, .. }));
    assert_eq!(calls, 1);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unavailable_executor_surfaces_unwrapped() {
    let input = rows(3);
    let mut calls = 0;
    let mut executor = |_: &str, _: &[Value]| -> Result<u64> {
        calls += 1;
        Err(Error::ExecutorUnavailable("mysql connection pool is closed".to_string()))
    };

    let err = batch_insert("users", &input, 2, &TableRegistry::new(), &mut executor).unwrap_err();

    assert!(matches!(err, Error::ExecutorUnavailable(_)));
    assert_eq!(calls, 1);
}
