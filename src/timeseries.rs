//! Date-indexed series and frames
//!
//! `DailyFrame` is the aligned date×symbol matrix the pipeline passes
//! between stages: ascending unique dates, one column per symbol, and
//! `NaN` for cells where a symbol has no observation yet. Aggregations
//! skip `NaN` cells so a symbol does not pollute totals before its
//! first priced date.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A single symbol's date→value series, ascending and unique by construction
pub type DailySeries = BTreeMap<NaiveDate, f64>;

/// Aligned date×symbol value matrix
#[derive(Debug, Clone)]
pub struct DailyFrame {
    index: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl DailyFrame {
    /// Outer-join per-symbol series on date
    ///
    /// Cells a symbol has no observation for are `NaN`; call
    /// `forward_fill` to repeat last known values.
    pub fn from_series(series: &BTreeMap<String, DailySeries>) -> Self {
        let mut dates: Vec<NaiveDate> = series
            .values()
            .flat_map(|s| s.keys().copied())
            .collect();
        dates.sort();
        dates.dedup();

        let columns = series
            .iter()
            .map(|(symbol, s)| {
                let values = dates
                    .iter()
                    .map(|d| s.get(d).copied().unwrap_or(f64::NAN))
                    .collect();
                (symbol.clone(), values)
            })
            .collect();

        Self {
            index: dates,
            columns,
        }
    }

    /// All-zero frame over the given index and symbols
    pub fn zeroed(index: Vec<NaiveDate>, symbols: &[String]) -> Self {
        let columns = symbols
            .iter()
            .map(|s| (s.clone(), vec![0.0; index.len()]))
            .collect();
        Self { index, columns }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.index.last().copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(|v| v.as_slice())
    }

    pub fn column_mut(&mut self, symbol: &str) -> Option<&mut [f64]> {
        self.columns.get_mut(symbol).map(|v| v.as_mut_slice())
    }

    /// Value at (date, symbol); `None` for absent cells
    pub fn get(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        let row = self.index.binary_search(&date).ok()?;
        let v = *self.columns.get(symbol)?.get(row)?;
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Position of the first index date on or after `date`
    pub fn first_row_at_or_after(&self, date: NaiveDate) -> Option<usize> {
        let row = self.index.partition_point(|d| *d < date);
        if row < self.index.len() {
            Some(row)
        } else {
            None
        }
    }

    /// Row total, skipping absent cells
    pub fn row_sum(&self, row: usize) -> f64 {
        self.columns
            .values()
            .filter_map(|col| col.get(row))
            .filter(|v| !v.is_nan())
            .sum()
    }

    /// Repeat each symbol's last known value forward
    ///
    /// Gaps before a symbol's first observation stay absent.
    pub fn forward_fill(&mut self) {
        for col in self.columns.values_mut() {
            let mut last = f64::NAN;
            for v in col.iter_mut() {
                if v.is_nan() {
                    *v = last;
                } else {
                    last = *v;
                }
            }
        }
    }
}
