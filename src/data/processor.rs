//! Data Processor Module
//! Joins the daily and hourly tables, reconciles colliding names and derives totals.

use crate::config::WeekdayPolicy;
use crate::data::columns::*;
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Join key '{key}' missing from the {side} table")]
    MissingJoinKey { key: String, side: &'static str },
}

/// Suffix applied to daily-side collisions before the join.
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix applied to hourly-side collisions before the join.
pub const RIGHT_SUFFIX: &str = "_y";

/// Keys shared by the daily and hourly tables.
pub const JOIN_KEYS: [&str; 6] = ["dteday", "season", "yr", "mnth", "workingday", "holiday"];

const LEFT_ROW: &str = "__left_row";
const RIGHT_ROW: &str = "__right_row";

const ALIASES: [(&str, &str); 4] = [
    ("dteday", DATE),
    ("yr", YEAR),
    ("mnth", MONTH),
    ("hr", HOUR),
];

/// Handles the table transformations of the pipeline.
pub struct DataProcessor;

impl DataProcessor {
    /// Left outer join of `left` with `right` on `keys`.
    ///
    /// Non-key columns present on both sides are suffixed `_x` (left) and
    /// `_y` (right). Every left row appears at least once; right rows without
    /// a matching key are dropped.
    pub fn merge(
        left: &DataFrame,
        right: &DataFrame,
        keys: &[&str],
    ) -> Result<DataFrame, ProcessorError> {
        for key in keys {
            for (side, df) in [("left", left), ("right", right)] {
                if df.column(key).is_err() {
                    return Err(ProcessorError::MissingJoinKey {
                        key: key.to_string(),
                        side,
                    });
                }
            }
        }

        let key_set: HashSet<&str> = keys.iter().copied().collect();
        let right_names: HashSet<&str> = right.get_column_names().iter().map(|s| s.as_str()).collect();
        let collisions: Vec<String> = left
            .get_column_names()
            .iter()
            .map(|s| s.as_str())
            .filter(|name| !key_set.contains(name) && right_names.contains(name))
            .map(str::to_string)
            .collect();

        let suffixed = |suffix: &str| -> Vec<String> {
            collisions.iter().map(|name| format!("{name}{suffix}")).collect()
        };
        let left = left
            .clone()
            .lazy()
            .rename(&collisions, suffixed(LEFT_SUFFIX), true);
        let right = right
            .clone()
            .lazy()
            .rename(&collisions, suffixed(RIGHT_SUFFIX), true);
        debug!(?collisions, "suffixed colliding columns");

        // Row indices restore left order (then hourly order) after the join.
        // Null keys match each other, as missing values do in the source tables.
        let on: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
        let mut args = JoinArgs::new(JoinType::Left);
        args.join_nulls = true;
        let merged = left
            .with_row_index(LEFT_ROW, None)
            .join(
                right.with_row_index(RIGHT_ROW, None),
                on.clone(),
                on,
                args,
            )
            .sort([LEFT_ROW, RIGHT_ROW], SortMultipleOptions::default())
            .collect()?
            .drop(LEFT_ROW)?
            .drop(RIGHT_ROW)?;

        Ok(merged)
    }

    /// New name for a column produced by [`merge`](Self::merge), if it needs one.
    pub fn reconciled_name(name: &str) -> Option<String> {
        if let Some(stem) = name.strip_suffix(LEFT_SUFFIX) {
            return Some(format!("{stem}_day"));
        }
        if let Some(stem) = name.strip_suffix(RIGHT_SUFFIX) {
            return Some(format!("{stem}_hour"));
        }
        ALIASES
            .iter()
            .find(|(from, _)| *from == name)
            .map(|(_, to)| to.to_string())
    }

    /// Rename suffixed collisions to day/hour names and raw names to readable ones.
    ///
    /// Renaming only touches source names, so a second pass is a no-op.
    pub fn reconcile(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        let (old, new): (Vec<String>, Vec<String>) = df
            .get_column_names()
            .iter()
            .filter_map(|name| Self::reconciled_name(name).map(|new| (name.to_string(), new)))
            .unzip();

        debug!(renamed = old.len(), "reconciled column names");
        // Renamed lazily so the frame's schema follows the new names.
        Ok(df.lazy().rename(old, new, true).collect()?)
    }

    /// Add the row-wise totals and averages. Nulls propagate.
    pub fn derive(df: DataFrame, policy: WeekdayPolicy) -> Result<DataFrame, ProcessorError> {
        let mut exprs = vec![
            (col(CNT_DAY) + col(CNT_HOUR)).alias(TOTAL_RENTALS),
            (col(CASUAL_DAY) + col(CASUAL_HOUR)).alias(TOTAL_CASUAL),
            (col(REGISTERED_DAY) + col(REGISTERED_HOUR)).alias(TOTAL_REGISTERED),
            Self::mean_of(WINDSPEED_DAY, WINDSPEED_HOUR).alias(WINDSPEED),
            Self::mean_of(HUM_DAY, HUM_HOUR).alias(HUM),
            Self::mean_of(TEMP_DAY, TEMP_HOUR).alias(TEMP),
        ];

        match policy {
            WeekdayPolicy::Sum => {
                exprs.push((col(WEEKDAY_DAY) + col(WEEKDAY_HOUR)).alias(TOTAL_WEEKDAY))
            }
            WeekdayPolicy::DayCode => exprs.push(col(WEEKDAY_DAY).alias(TOTAL_WEEKDAY)),
            WeekdayPolicy::Omit => {}
        }

        Ok(df.lazy().with_columns(exprs).collect()?)
    }

    fn mean_of(day: &str, hour: &str) -> Expr {
        (col(day).cast(DataType::Float64) + col(hour).cast(DataType::Float64)) / lit(2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily() -> DataFrame {
        df!(
            "instant" => [1i64, 2],
            "dteday" => ["2011-01-01", "2011-01-02"],
            "season" => [1i64, 1],
            "yr" => [0i64, 0],
            "mnth" => [1i64, 1],
            "holiday" => [0i64, 0],
            "weekday" => [6i64, 0],
            "workingday" => [0i64, 0],
            "weathersit" => [2i64, 2],
            "temp" => [0.344, 0.363],
            "atemp" => [0.364, 0.354],
            "hum" => [0.806, 0.696],
            "windspeed" => [0.160, 0.249],
            "casual" => [20i64, 131],
            "registered" => [80i64, 670],
            "cnt" => [100i64, 801]
        )
        .unwrap()
    }

    fn hourly() -> DataFrame {
        df!(
            "instant" => [1i64, 2, 99],
            "dteday" => ["2011-01-01", "2011-01-01", "2011-05-05"],
            "season" => [1i64, 1, 2],
            "yr" => [0i64, 0, 0],
            "mnth" => [1i64, 1, 5],
            "holiday" => [0i64, 0, 0],
            "weekday" => [6i64, 6, 4],
            "workingday" => [0i64, 0, 1],
            "weathersit" => [1i64, 1, 1],
            "hr" => [0i64, 1, 8],
            "temp" => [0.24, 0.22, 0.5],
            "atemp" => [0.2879, 0.2727, 0.5],
            "hum" => [0.81, 0.80, 0.5],
            "windspeed" => [0.0, 0.1, 0.2],
            "casual" => [3i64, 8, 1],
            "registered" => [2i64, 2, 1],
            "cnt" => [5i64, 10, 2]
        )
        .unwrap()
    }

    fn prepared() -> DataFrame {
        let merged = DataProcessor::merge(&daily(), &hourly(), &JOIN_KEYS).unwrap();
        let reconciled = DataProcessor::reconcile(merged).unwrap();
        DataProcessor::derive(reconciled, WeekdayPolicy::Sum).unwrap()
    }

    #[test]
    fn merge_is_left_join_with_suffixes() {
        let merged = DataProcessor::merge(&daily(), &hourly(), &JOIN_KEYS).unwrap();
        // two hourly matches for day 1, none for day 2, unmatched hourly row dropped
        assert_eq!(merged.height(), 3);
        for name in ["cnt_x", "cnt_y", "temp_x", "temp_y", "weekday_x", "weekday_y", "hr"] {
            assert!(merged.column(name).is_ok(), "missing {name}");
        }
        assert!(merged.column("workingday_x").is_err());
    }

    #[test]
    fn merge_requires_join_keys() {
        let hourly = hourly().drop("season").unwrap();
        let err = DataProcessor::merge(&daily(), &hourly, &JOIN_KEYS).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingJoinKey { side: "right", .. }));
    }

    #[test]
    fn reconciled_names() {
        assert_eq!(DataProcessor::reconciled_name("temp_x").as_deref(), Some("temp_day"));
        assert_eq!(DataProcessor::reconciled_name("cnt_y").as_deref(), Some("cnt_hour"));
        assert_eq!(DataProcessor::reconciled_name("dteday").as_deref(), Some("date"));
        assert_eq!(DataProcessor::reconciled_name("hr").as_deref(), Some("hour"));
        assert_eq!(DataProcessor::reconciled_name("season"), None);
    }

    #[test]
    fn reconcile_twice_is_noop() {
        let merged = DataProcessor::merge(&daily(), &hourly(), &JOIN_KEYS).unwrap();
        let once = DataProcessor::reconcile(merged).unwrap();
        let twice = DataProcessor::reconcile(once.clone()).unwrap();
        assert!(once.equals_missing(&twice));
        assert_eq!(once.get_column_names(), twice.get_column_names());
        assert!(once
            .get_column_names()
            .iter()
            .all(|n| !n.ends_with(LEFT_SUFFIX) && !n.ends_with(RIGHT_SUFFIX)));
    }

    #[test]
    fn totals_add_day_and_hour_counts() {
        let df = prepared();
        let totals: Vec<Option<i64>> = df.column(TOTAL_RENTALS).unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(totals, vec![Some(105), Some(110), None]);

        let casual: Vec<Option<i64>> = df.column(TOTAL_CASUAL).unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(casual, vec![Some(23), Some(28), None]);

        let registered: Vec<Option<i64>> =
            df.column(TOTAL_REGISTERED).unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(registered, vec![Some(82), Some(82), None]);
    }

    #[test]
    fn reconciled_names_are_visible_to_lazy_queries() {
        let merged = DataProcessor::merge(&daily(), &hourly(), &JOIN_KEYS).unwrap();
        let reconciled = DataProcessor::reconcile(merged).unwrap();
        let selected = reconciled
            .lazy()
            .select([col(CNT_DAY), col(CNT_HOUR), col(DATE), col(HOUR)])
            .collect()
            .unwrap();
        let names: Vec<&str> = selected.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec![CNT_DAY, CNT_HOUR, DATE, HOUR]);
        assert_eq!(selected.height(), 3);
    }

    #[test]
    fn merge_renames_frames_with_cached_schema() {
        let left = daily();
        let right = hourly();
        // touching the schema caches it on the frame
        assert!(left.schema().contains("cnt"));
        assert!(right.schema().contains("cnt"));
        let merged = DataProcessor::merge(&left, &right, &JOIN_KEYS).unwrap();
        let cnt = merged.lazy().select([col("cnt_x"), col("cnt_y")]).collect().unwrap();
        assert_eq!(cnt.height(), 3);
    }

    #[test]
    fn null_keys_match_each_other() {
        let left = df!(
            "dteday" => [Some("2011-01-01"), None],
            "cnt" => [1i64, 2]
        )
        .unwrap();
        let right = df!(
            "dteday" => [None, Some("2011-01-01")],
            "cnt" => [20i64, 10]
        )
        .unwrap();
        let merged = DataProcessor::merge(&left, &right, &["dteday"]).unwrap();
        let hour: Vec<Option<i64>> = merged.column("cnt_y").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(hour, vec![Some(10), Some(20)]);
    }

    #[test]
    fn unmatched_day_has_null_hour_fields() {
        let df = prepared();
        let last = df.height() - 1;
        for name in [CNT_HOUR, HOUR, TEMP_HOUR, WEEKDAY_HOUR] {
            assert!(df.column(name).unwrap().get(last).unwrap().is_null(), "{name}");
        }
        assert!(!df.column(CNT_DAY).unwrap().get(last).unwrap().is_null());
    }

    #[test]
    fn averages_day_and_hour_values() {
        let df = prepared();
        let wind = df.column(WINDSPEED).unwrap().f64().unwrap();
        let day = df.column(WINDSPEED_DAY).unwrap().f64().unwrap();
        let hour = df.column(WINDSPEED_HOUR).unwrap().f64().unwrap();
        for i in 0..df.height() {
            match (wind.get(i), day.get(i), hour.get(i)) {
                (Some(w), Some(d), Some(h)) => assert!((w - (d + h) / 2.0).abs() < 1e-12),
                (w, _, _) => assert!(w.is_none()),
            }
        }
    }

    #[test]
    fn weekday_policies() {
        let merged = DataProcessor::merge(&daily(), &hourly(), &JOIN_KEYS).unwrap();
        let reconciled = DataProcessor::reconcile(merged).unwrap();

        let summed = DataProcessor::derive(reconciled.clone(), WeekdayPolicy::Sum).unwrap();
        assert_eq!(summed.column(TOTAL_WEEKDAY).unwrap().i64().unwrap().get(0), Some(12));

        let day_code = DataProcessor::derive(reconciled.clone(), WeekdayPolicy::DayCode).unwrap();
        assert_eq!(day_code.column(TOTAL_WEEKDAY).unwrap().i64().unwrap().get(0), Some(6));
        assert_eq!(day_code.column(TOTAL_WEEKDAY).unwrap().i64().unwrap().get(2), Some(0));

        let omitted = DataProcessor::derive(reconciled, WeekdayPolicy::Omit).unwrap();
        assert!(omitted.column(TOTAL_WEEKDAY).is_err());
    }
}
