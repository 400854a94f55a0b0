use super::people;
use crate::analyser::dataset::{Column, ColumnData, Dataset};
use crate::analyser::logic::*;
use crate::error::{DataSummaryError, Result};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn test_skip_removes_rows_with_nulls_in_targets() -> Result<()> {
    let ds = Dataset::new(vec![
        Column::integer("a", vec![Some(1), None, Some(3), Some(4)]),
        Column::text("b", vec![Some("x"), Some("y"), None, Some("z")]),
    ])?;

    let only_a = impute(&ds, ImputeStrategy::Skip, Some(names(&["a"]).as_slice()))?;
    assert_eq!(only_a.dataset.row_count(), 3);
    assert_eq!(only_a.rows_removed, 1);
    assert_eq!(only_a.dataset.column("a").unwrap().null_count(), 0);
    assert_eq!(only_a.dataset.column("b").unwrap().null_count(), 1, "untargeted nulls stay");

    let all = impute(&ds, ImputeStrategy::Skip, None)?;
    assert_eq!(all.dataset.row_count(), 2);
    assert_eq!(all.dataset.null_count(), 0);
    assert_eq!(ds.row_count(), 4, "input untouched");
    Ok(())
}

#[test]
fn test_fill_mean_integer_stays_integer() -> Result<()> {
    let ds = Dataset::new(vec![Column::integer("n", vec![Some(1), None, Some(3)])])?;
    let out = impute(&ds, ImputeStrategy::FillMean, None)?;
    assert_eq!(
        out.dataset.column("n").unwrap().data(),
        &ColumnData::Integer(vec![Some(1), Some(2), Some(3)])
    );
    assert!(out.unresolved_columns.is_empty());
    Ok(())
}

#[test]
fn test_fill_mean_fractional_promotes_to_float() -> Result<()> {
    let ds = Dataset::new(vec![Column::integer("n", vec![Some(1), None, Some(2)])])?;
    let out = impute(&ds, ImputeStrategy::FillMean, None)?;
    assert_eq!(
        out.dataset.column("n").unwrap().data(),
        &ColumnData::Float(vec![Some(1.0), Some(1.5), Some(2.0)])
    );
    Ok(())
}

#[test]
fn test_fill_median_and_text_fallback() -> Result<()> {
    let ds = Dataset::new(vec![
        Column::float("x", vec![Some(1.0), Some(10.0), None, Some(2.0)]),
        Column::text("t", vec![Some("b"), None, Some("a"), Some("a")]),
    ])?;
    let out = impute(&ds, ImputeStrategy::FillMedian, None)?;
    assert_eq!(
        out.dataset.column("x").unwrap().data(),
        &ColumnData::Float(vec![Some(1.0), Some(10.0), Some(2.0), Some(2.0)])
    );
    assert_eq!(
        out.dataset.column("t").unwrap().data(),
        &ColumnData::Text(vec![
            Some("b".to_owned()),
            Some("a".to_owned()),
            Some("a".to_owned()),
            Some("a".to_owned())
        ]),
        "non-numeric columns fall back to the mode"
    );
    Ok(())
}

#[test]
fn test_fill_mode_scenario() -> Result<()> {
    let out = impute(&people(), ImputeStrategy::FillMode, Some(names(&["age"]).as_slice()))?;
    assert_eq!(
        out.dataset.column("age").unwrap().data(),
        &ColumnData::Integer(vec![Some(25), Some(30), Some(25)]),
        "tie between 25 and 30 goes to the first seen"
    );
    Ok(())
}

#[test]
fn test_forward_and_backward_fill() -> Result<()> {
    let ds = Dataset::new(vec![Column::integer(
        "n",
        vec![None, Some(1), None, Some(3), None],
    )])?;

    let forward = impute(&ds, ImputeStrategy::ForwardFill, None)?;
    assert_eq!(
        forward.dataset.column("n").unwrap().data(),
        &ColumnData::Integer(vec![None, Some(1), Some(1), Some(3), Some(3)]),
        "leading null survives"
    );

    let backward = impute(&ds, ImputeStrategy::BackwardFill, None)?;
    assert_eq!(
        backward.dataset.column("n").unwrap().data(),
        &ColumnData::Integer(vec![Some(1), Some(1), Some(3), Some(3), None]),
        "trailing null survives"
    );
    Ok(())
}

#[test]
fn test_all_null_column_is_reported_not_fatal() -> Result<()> {
    let ds = Dataset::new(vec![
        Column::float("empty", vec![None, None]),
        Column::integer("n", vec![Some(4), None]),
    ])?;
    let out = impute(&ds, ImputeStrategy::FillMean, None)?;
    assert_eq!(out.unresolved_columns, vec!["empty".to_owned()]);
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("fill_mean"), "warning names the strategy");
    assert_eq!(out.dataset.column("empty").unwrap().null_count(), 2);
    assert_eq!(out.dataset.column("n").unwrap().null_count(), 0, "others still filled");
    Ok(())
}

#[test]
fn test_unknown_columns_rejected() {
    let err = impute(&people(), ImputeStrategy::Skip, Some(names(&["x", "age", "y"]).as_slice())).unwrap_err();
    match err {
        DataSummaryError::ColumnsNotFound { missing } => assert_eq!(missing, names(&["x", "y"])),
        other => panic!("expected ColumnsNotFound, got {other:?}"),
    }
}

#[test]
fn test_strategy_parsing() {
    assert_eq!("fill_mean".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::FillMean);
    assert_eq!(" Forward_Fill ".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::ForwardFill);
    let err = "interpolate".parse::<ImputeStrategy>().unwrap_err();
    assert!(matches!(err, DataSummaryError::UnknownStrategy(ref s) if s == "interpolate"));
}
