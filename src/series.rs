use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Bar;

/// Daily closes for one contract, ordered oldest -> newest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl PriceSeries {
    /// Builds the series from broker bars. Bars may arrive in any order; a
    /// repeated date keeps the last bar seen.
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut points: Vec<(NaiveDate, Option<f64>)> = bars
            .iter()
            .map(|b| (b.date, b.close.is_finite().then_some(b.close)))
            .collect();
        points.sort_by_key(|(date, _)| *date);
        let mut deduped: Vec<(NaiveDate, Option<f64>)> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.0 == p.0 => *last = p,
                _ => deduped.push(p),
            }
        }
        Self { points: deduped }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    pub fn missing(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_none()).count()
    }

    /// Forward-fill, then zero-fill whatever leads the first observation.
    pub fn filled(&self) -> Vec<f64> {
        let mut last = None;
        self.points
            .iter()
            .map(|(_, v)| {
                if v.is_some() {
                    last = *v;
                }
                last.unwrap_or(0.0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn sorts_and_fills() {
        let bars = vec![
            bar(5, 72.0),
            bar(2, f64::NAN),
            bar(3, 70.0),
            bar(4, f64::NAN),
        ];
        let s = PriceSeries::from_bars(&bars);
        assert_eq!(s.len(), 4);
        assert_eq!(s.missing(), 2);
        assert_eq!(s.first_date(), NaiveDate::from_ymd_opt(2026, 3, 2));
        assert_eq!(s.filled(), vec![0.0, 70.0, 70.0, 72.0]);
    }

    #[test]
    fn duplicate_dates_keep_latest_bar() {
        let s = PriceSeries::from_bars(&[bar(2, 1.0), bar(2, 2.0), bar(3, 3.0)]);
        assert_eq!(s.filled(), vec![2.0, 3.0]);
    }
}
