use super::types::{ColumnQuality, MissingPattern, QualityRating};
use crate::analyser::dataset::{Dataset, percent};

/// Rating bands: excellent < 5 %, good < 20 %, fair < 50 %, poor otherwise.
pub fn quality_rating(percent_missing: f64) -> QualityRating {
    if percent_missing < 5.0 {
        QualityRating::Excellent
    } else if percent_missing < 20.0 {
        QualityRating::Good
    } else if percent_missing < 50.0 {
        QualityRating::Fair
    } else {
        QualityRating::Poor
    }
}

/// Pattern bands: low < 20 %, moderate 20–50 % inclusive, high > 50 %.
pub fn missing_pattern(percent_missing: f64) -> MissingPattern {
    if percent_missing < 20.0 {
        MissingPattern::LowMissing
    } else if percent_missing <= 50.0 {
        MissingPattern::ModerateMissing
    } else {
        MissingPattern::HighMissing
    }
}

pub fn data_quality_metrics(dataset: &Dataset) -> Vec<ColumnQuality> {
    dataset
        .columns()
        .iter()
        .map(|col| {
            let missing_values = col.null_count();
            let percent_missing = percent(missing_values, col.len());
            ColumnQuality {
                name: col.name().to_owned(),
                total_values: col.len(),
                missing_values,
                percent_missing,
                data_quality: quality_rating(percent_missing),
            }
        })
        .collect()
}
