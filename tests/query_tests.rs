//! Tests for the query engine
//!
//! These tests cover every condition operator, negation, ordering, limits,
//! result shaping, and the equivalence of indexed and scanned execution.

use std::path::PathBuf;

use tabula::{
    Condition, Direction, Engine, IndexAction, IndexKind, Operator, Query, Record, TabulaError,
    PK_COLUMN,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("query.tdb");
    (temp_dir, path)
}

fn seeded_engine(path: &PathBuf) -> Engine {
    let engine = Engine::open_path(path).unwrap();
    engine
        .put(
            b"p1",
            Record::new()
                .with("name", "Jeff")
                .with("age", "46")
                .with("langs", "en fr"),
        )
        .unwrap();
    engine
        .put(
            b"p2",
            Record::new()
                .with("name", "John")
                .with("age", "30")
                .with("langs", "en de"),
        )
        .unwrap();
    engine
        .put(
            b"p3",
            Record::new().with("name", "Mary").with("age", "25"),
        )
        .unwrap();
    engine
}

fn cond(column: &str, op: Operator, operand: &str) -> Condition {
    Condition::new(column, op, operand).unwrap()
}

fn search_keys(engine: &Engine, query: &Query) -> Vec<String> {
    engine
        .search(query)
        .unwrap()
        .into_keys()
        .into_iter()
        .map(|k| String::from_utf8(k).unwrap())
        .collect()
}

// =============================================================================
// String Operators
// =============================================================================

#[test]
fn test_eq() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::Eq, "Jeff"));
    assert_eq!(search_keys(&engine, &query), vec!["p1"]);
}

#[test]
fn test_contains() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::Contains, "oh"));
    assert_eq!(search_keys(&engine, &query), vec!["p2"]);
}

#[test]
fn test_begins_with() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::BeginsWith, "J"));
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p2"]);
}

#[test]
fn test_ends_with() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::EndsWith, "n"));
    assert_eq!(search_keys(&engine, &query), vec!["p2"]);
}

#[test]
fn test_all_tokens() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("langs", Operator::AllTokens, "en fr"));
    assert_eq!(search_keys(&engine, &query), vec!["p1"]);
}

#[test]
fn test_any_token() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("langs", Operator::AnyToken, "fr de"));
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p2"]);
}

#[test]
fn test_eq_any_token() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::EqAnyToken, "Mary Jeff"));
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p3"]);
}

#[test]
fn test_regex() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::Regex, "^J.+f$"));
    assert_eq!(search_keys(&engine, &query), vec!["p1"]);
}

// =============================================================================
// Number Operators
// =============================================================================

#[test]
fn test_num_comparisons() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let eq = Query::new().condition(cond("age", Operator::NumEq, "30"));
    assert_eq!(search_keys(&engine, &eq), vec!["p2"]);

    let gt = Query::new().condition(cond("age", Operator::NumGt, "30"));
    assert_eq!(search_keys(&engine, &gt), vec!["p1"]);

    let ge = Query::new().condition(cond("age", Operator::NumGe, "30"));
    assert_eq!(search_keys(&engine, &ge), vec!["p1", "p2"]);

    let lt = Query::new().condition(cond("age", Operator::NumLt, "30"));
    assert_eq!(search_keys(&engine, &lt), vec!["p3"]);

    let le = Query::new().condition(cond("age", Operator::NumLe, "30"));
    assert_eq!(search_keys(&engine, &le), vec!["p2", "p3"]);
}

#[test]
fn test_num_between_normalizes_bounds() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("age", Operator::NumBetween, "46 25"));
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p2", "p3"]);
}

#[test]
fn test_num_any_of() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("age", Operator::NumAnyOf, "25 46 99"));
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p3"]);
}

#[test]
fn test_numeric_against_unparsable_value() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);
    engine.put(b"p4", Record::new().with("age", "unknown")).unwrap();

    // Unparsable fails every numeric comparison.
    let query = Query::new().condition(cond("age", Operator::NumGe, "0"));
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p2", "p3"]);

    // And therefore matches the negation.
    let negated = Query::new().condition(cond("age", Operator::NumGe, "0").negate());
    assert_eq!(search_keys(&engine, &negated), vec!["p4"]);
}

// =============================================================================
// Negation and Missing Columns
// =============================================================================

#[test]
fn test_negated_eq() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::Eq, "Jeff").negate());
    assert_eq!(search_keys(&engine, &query), vec!["p2", "p3"]);
}

#[test]
fn test_missing_column_fails_then_negation_matches() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    // Only p1 and p2 carry a langs column.
    let present = Query::new().condition(cond("langs", Operator::Contains, ""));
    assert_eq!(search_keys(&engine, &present), vec!["p1", "p2"]);

    let absent = Query::new().condition(cond("langs", Operator::Contains, "").negate());
    assert_eq!(search_keys(&engine, &absent), vec!["p3"]);
}

#[test]
fn test_condition_on_primary_key_sentinel() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("", Operator::BeginsWith, "p"));
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p2", "p3"]);
}

// =============================================================================
// Multiple Conditions
// =============================================================================

#[test]
fn test_conditions_intersect() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new()
        .condition(cond("name", Operator::BeginsWith, "J"))
        .condition(cond("age", Operator::NumLt, "40"));
    assert_eq!(search_keys(&engine, &query), vec!["p2"]);
}

#[test]
fn test_no_conditions_matches_everything() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new();
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p2", "p3"]);
}

// =============================================================================
// Ordering and Limit
// =============================================================================

#[test]
fn test_numeric_descending_with_limit() {
    let (_temp, path) = setup_temp_table();
    let engine = Engine::open_path(&path).unwrap();
    engine.put(b"a", Record::new().with("n", "30")).unwrap();
    engine.put(b"b", Record::new().with("n", "10")).unwrap();
    engine.put(b"c", Record::new().with("n", "20")).unwrap();
    engine.put(b"d", Record::new().with("n", "40")).unwrap();

    let query = Query::new()
        .order_by("n", Direction::NumericDesc)
        .limit(3);
    assert_eq!(search_keys(&engine, &query), vec!["d", "a", "c"]);
}

#[test]
fn test_lexical_ascending() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().order_by("name", Direction::LexicalAsc);
    assert_eq!(search_keys(&engine, &query), vec!["p1", "p2", "p3"]);

    let query = Query::new().order_by("name", Direction::LexicalDesc);
    assert_eq!(search_keys(&engine, &query), vec!["p3", "p2", "p1"]);
}

#[test]
fn test_order_ties_break_by_primary_key() {
    let (_temp, path) = setup_temp_table();
    let engine = Engine::open_path(&path).unwrap();
    engine.put(b"z", Record::new().with("n", "1")).unwrap();
    engine.put(b"a", Record::new().with("n", "1")).unwrap();
    engine.put(b"m", Record::new().with("n", "1")).unwrap();

    let query = Query::new().order_by("n", Direction::NumericAsc);
    assert_eq!(search_keys(&engine, &query), vec!["a", "m", "z"]);

    // Descending reverses values, not the tie-break.
    let query = Query::new().order_by("n", Direction::NumericDesc);
    assert_eq!(search_keys(&engine, &query), vec!["a", "m", "z"]);
}

#[test]
fn test_missing_sort_value_sorts_smallest() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    // p3 has no langs column.
    let query = Query::new().order_by("langs", Direction::LexicalAsc);
    assert_eq!(search_keys(&engine, &query), vec!["p3", "p2", "p1"]);
}

#[test]
fn test_limit_zero_is_empty() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().limit(0);
    let results = engine.search(&query).unwrap();
    assert!(results.is_empty());
}

// =============================================================================
// Index Equivalence
// =============================================================================

#[test]
fn test_indexed_and_scanned_results_agree() {
    let (_temp, path) = setup_temp_table();
    let engine = Engine::open_path(&path).unwrap();
    for i in 0..50 {
        let record = Record::new()
            .with("name", format!("user{:02}", i))
            .with("score", format!("{}", i * 3 % 17));
        engine.put(format!("k{:02}", i).as_bytes(), record).unwrap();
    }

    let queries = vec![
        Query::new().condition(cond("name", Operator::Eq, "user07")),
        Query::new().condition(cond("name", Operator::BeginsWith, "user1")),
        Query::new().condition(cond("score", Operator::NumEq, "4")),
        Query::new().condition(cond("score", Operator::NumBetween, "3 9")),
        Query::new()
            .condition(cond("score", Operator::NumGe, "10"))
            .order_by("score", Direction::NumericDesc)
            .limit(5),
    ];

    let scanned: Vec<_> = queries.iter().map(|q| search_keys(&engine, q)).collect();

    engine.set_index(b"name", IndexKind::Lexical, IndexAction::Add).unwrap();
    engine.set_index(b"score", IndexKind::Decimal, IndexAction::Add).unwrap();

    let indexed: Vec<_> = queries.iter().map(|q| search_keys(&engine, q)).collect();
    assert_eq!(scanned, indexed);
}

#[test]
fn test_index_stays_consistent_after_mutations() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);
    engine.set_index(b"name", IndexKind::Lexical, IndexAction::Add).unwrap();

    engine.put(b"p4", Record::new().with("name", "Jeff")).unwrap();
    engine.delete(b"p1").unwrap();
    engine.put(b"p2", Record::new().with("name", "Jeff")).unwrap();

    let query = Query::new().condition(cond("name", Operator::Eq, "Jeff"));
    assert_eq!(search_keys(&engine, &query), vec!["p2", "p4"]);
}

// =============================================================================
// Result Shaping
// =============================================================================

#[test]
fn test_rows_carry_records() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new().condition(cond("name", Operator::Eq, "Jeff"));
    let rows: Vec<_> = engine.search(&query).unwrap().collect();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pk, b"p1");
    let record = rows[0].record.as_ref().unwrap();
    assert_eq!(record.get(b"age"), Some(&b"46"[..]));
}

#[test]
fn test_keys_only_skips_fetch() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new()
        .condition(cond("name", Operator::Eq, "Jeff"))
        .keys_only();
    let rows: Vec<_> = engine.search(&query).unwrap().collect();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pk, b"p1");
    assert!(rows[0].record.is_none());
}

#[test]
fn test_include_pk_prepends_sentinel_column() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let query = Query::new()
        .condition(cond("name", Operator::Eq, "Jeff"))
        .include_pk();
    let rows: Vec<_> = engine.search(&query).unwrap().collect();

    let record = rows[0].record.as_ref().unwrap();
    assert_eq!(record.get(PK_COLUMN), Some(&b"p1"[..]));
    assert_eq!(record.iter().next().unwrap().0, PK_COLUMN);
}

#[test]
fn test_row_for_vanished_record_is_none() {
    let (_temp, path) = setup_temp_table();
    let engine = seeded_engine(&path);

    let results = engine.search(&Query::new()).unwrap();
    engine.delete(b"p2").unwrap();

    let rows: Vec<_> = results.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].record.is_some());
    assert!(rows[1].record.is_none());
    assert!(rows[2].record.is_some());
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_invalid_conditions_rejected() {
    assert!(matches!(
        Condition::new("age", Operator::NumEq, "abc"),
        Err(TabulaError::InvalidQuery(_))
    ));
    assert!(matches!(
        Condition::new("age", Operator::NumBetween, "1 2 3"),
        Err(TabulaError::InvalidQuery(_))
    ));
    assert!(matches!(
        Condition::new("age", Operator::NumAnyOf, ""),
        Err(TabulaError::InvalidQuery(_))
    ));
    assert!(matches!(
        Condition::new("name", Operator::Regex, "["),
        Err(TabulaError::InvalidQuery(_))
    ));
}
