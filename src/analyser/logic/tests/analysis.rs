use super::{approx, people};
use crate::analyser::dataset::{Column, DataType, Dataset, Value};
use crate::analyser::logic::profiling;
use crate::analyser::logic::*;
use crate::error::{DataSummaryError, Result};

#[test]
fn test_numeric_stats_basic() -> Result<()> {
    let col = Column::float("x", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), None]);
    let stats = profiling::numeric_stats(&col);

    assert_eq!(stats.count, 4);
    assert_eq!(stats.missing, 1);
    assert!((stats.percent_missing - 20.0).abs() < 1e-9, "1 of 5 missing");
    assert!(approx(stats.mean, 2.5), "mean was {:?}", stats.mean);
    assert!(approx(stats.median, 2.5), "median was {:?}", stats.median);
    assert!(approx(stats.percentile_25, 1.75), "linear interpolation q1");
    assert!(approx(stats.percentile_75, 3.25), "linear interpolation q3");
    assert!(approx(stats.min, 1.0) && approx(stats.max, 4.0), "min/max");
    // Sample std of 1..4 is sqrt(5/3).
    assert!(approx(stats.std, (5.0_f64 / 3.0).sqrt()), "std was {:?}", stats.std);
    Ok(())
}

#[test]
fn test_numeric_stats_single_value_has_no_std() {
    let col = Column::integer("x", vec![Some(7), None]);
    let stats = profiling::numeric_stats(&col);
    assert!(stats.std.is_none(), "std needs two values");
    assert!(approx(stats.median, 7.0), "median of one value");
}

#[test]
fn test_numeric_stats_all_null() {
    let col = Column::float("x", vec![None, None]);
    let stats = profiling::numeric_stats(&col);
    assert_eq!(stats.count, 0);
    assert!(stats.mean.is_none() && stats.min.is_none(), "no aggregates");
    assert!((stats.percent_missing - 100.0).abs() < 1e-9, "fully missing");
}

#[test]
fn test_summary_scenario() -> Result<()> {
    let report = summarize(&people(), &SummaryOptions::everything())?;

    assert_eq!(report.row_count, 3);
    assert_eq!(report.column_count, 2);
    let age = report.numeric("age").expect("age is numeric");
    assert!(approx(age.mean, 27.5), "mean of 25 and 30");

    let dept = report.categorical("dept").expect("dept is categorical");
    assert_eq!(dept.most_common_value, Some(Value::Text("A".to_owned())));
    assert_eq!(dept.most_common_count, 2);
    assert_eq!(dept.unique_count, 2);
    assert_eq!(dept.data_type, DataType::Text);

    let quality = report.data_quality.as_ref().expect("quality requested");
    assert_eq!(quality[0].data_quality, QualityRating::Fair);
    assert_eq!(quality[1].data_quality, QualityRating::Excellent);

    // Only one numeric column.
    assert!(report.correlation_matrix.as_ref().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_summary_optional_sections_omitted() -> Result<()> {
    let report = summarize(&people(), &SummaryOptions::default())?;
    assert!(report.categorical_summary.is_none());
    assert!(report.correlation_matrix.is_none());
    assert!(report.data_quality.is_none());
    assert_eq!(report.numeric_summary.len(), 1);
    Ok(())
}

#[test]
fn test_summary_column_filter() -> Result<()> {
    let options = SummaryOptions {
        columns: Some(vec!["dept".to_owned()]),
        include_categorical: true,
        ..SummaryOptions::default()
    };
    let report = summarize(&people(), &options)?;
    assert_eq!(report.column_count, 1);
    assert!(report.numeric_summary.is_empty());

    let options = SummaryOptions {
        columns: Some(vec!["age".to_owned(), "salary".to_owned()]),
        ..SummaryOptions::default()
    };
    match summarize(&people(), &options) {
        Err(DataSummaryError::ColumnsNotFound { missing }) => {
            assert_eq!(missing, vec!["salary".to_owned()]);
        }
        other => panic!("expected ColumnsNotFound, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_boolean_is_categorical() -> Result<()> {
    let ds = Dataset::new(vec![Column::boolean(
        "flag",
        vec![Some(true), Some(false), Some(true)],
    )])?;
    let report = summarize(&ds, &SummaryOptions::everything())?;
    assert!(report.numeric_summary.is_empty());
    let flag = report.categorical("flag").unwrap();
    assert_eq!(flag.most_common_value, Some(Value::Boolean(true)));
    assert_eq!(flag.data_type, DataType::Boolean);
    Ok(())
}

#[test]
fn test_mode_tie_breaks_on_first_seen() {
    let col = Column::text("c", vec![Some("y"), Some("x"), Some("x"), Some("y")]);
    assert_eq!(profiling::mode(&col), Some(Value::Text("y".to_owned())));

    let top = profiling::top_values(&Column::integer("n", vec![Some(1), Some(2), Some(2)]), 10);
    assert_eq!(top, vec![(Value::Integer(2), 2), (Value::Integer(1), 1)]);
}

#[test]
fn test_describe_column() -> Result<()> {
    let meta = describe_column(&people(), "age", 5)?;
    assert_eq!(meta.column_name, "age");
    assert_eq!(meta.null_count, 1);
    assert_eq!(meta.non_null_count, 2);
    assert!((meta.null_percentage - 33.33).abs() < 1e-9, "rounded to 2 dp");
    assert!((meta.unique_percentage - 66.67).abs() < 1e-9, "2 unique of 3");
    assert_eq!(
        meta.sample_values,
        vec![Value::Integer(25), Value::Integer(30)]
    );
    assert!(matches!(meta.detail, ColumnDetail::Numeric(_)));

    let dept = describe_column(&people(), "dept", 1)?;
    assert_eq!(dept.sample_values.len(), 1);
    match dept.detail {
        ColumnDetail::Categorical {
            most_common_count,
            value_counts,
            ..
        } => {
            assert_eq!(most_common_count, 2);
            assert_eq!(value_counts.len(), 2);
        }
        ColumnDetail::Numeric(_) => panic!("dept is text"),
    }
    Ok(())
}

#[test]
fn test_describe_column_not_found_lists_available() {
    let err = describe_column(&people(), "salary", 5).unwrap_err();
    assert!(err.is_not_found(), "should be a not-found error");
    assert_eq!(
        err.to_string(),
        "Column 'salary' not found in dataset. Available columns: age, dept"
    );
}

#[test]
fn test_describe_columns_covers_all() {
    let all = describe_columns(&people(), 5);
    let names: Vec<&str> = all.iter().map(|m| m.column_name.as_str()).collect();
    assert_eq!(names, vec!["age", "dept"]);
}

#[test]
fn test_correlation_symmetric_with_unit_diagonal() -> Result<()> {
    let ds = Dataset::new(vec![
        Column::float("a", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        Column::integer("b", vec![Some(2), Some(4), Some(6), Some(9)]),
        Column::float("c", vec![Some(4.0), Some(3.0), None, Some(1.0)]),
        Column::text("t", vec![Some("x"), Some("y"), Some("z"), Some("w")]),
    ])?;
    let m = correlate(&ds, None)?;

    assert_eq!(m.columns, vec!["a", "b", "c"]);
    for i in 0..m.columns.len() {
        assert_eq!(m.data[i][i], Some(1.0), "diagonal must be 1");
        for j in 0..m.columns.len() {
            assert_eq!(m.data[i][j], m.data[j][i], "matrix must be symmetric");
        }
    }
    // Pairwise-complete: row 2 is dropped only for pairs involving c.
    assert!(approx(m.get("a", "c"), -1.0), "a/c perfectly anti-correlated");
    assert!(m.get("a", "b").unwrap() > 0.98, "a/b strongly correlated");
    Ok(())
}

#[test]
fn test_correlation_undefined_cases() -> Result<()> {
    let ds = Dataset::new(vec![
        Column::float("flat", vec![Some(1.0), Some(1.0), Some(1.0)]),
        Column::float("x", vec![Some(1.0), Some(2.0), Some(3.0)]),
        Column::float("sparse", vec![Some(1.0), None, None]),
    ])?;
    let m = correlation_matrix(&ds);
    assert_eq!(m.get("flat", "x"), None, "zero variance");
    assert_eq!(m.get("sparse", "x"), None, "fewer than two pairs");
    assert_eq!(m.get("flat", "flat"), Some(1.0));

    let single = correlate(&people(), None)?;
    assert!(single.is_empty(), "one numeric column gives an empty matrix");

    let err = correlate(&ds, Some(&["nope".to_owned()][..])).unwrap_err();
    assert!(matches!(err, DataSummaryError::ColumnsNotFound { .. }));
    Ok(())
}

#[test]
fn test_dataset_overview() {
    let overview = dataset_overview(&people(), 2);
    assert_eq!(overview.row_count, 3);
    assert_eq!(overview.sample_rows.len(), 2);
    assert_eq!(overview.sample_rows[0][1], Some(Value::Text("A".to_owned())));
    assert_eq!(overview.columns[0].null_count, 1);
    assert!(overview.memory.total_bytes > 0, "memory estimate");
}
