//! Replays a signal over a sequence of dates.
//!
//! Each date is evaluated independently and only sees bars up to itself, so
//! the table has no look-ahead beyond what the broker returns for that date.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::info;

use crate::error::Result;
use crate::strategy::Signal;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub contract: String,
    pub expiry: NaiveDate,
    pub value: Option<f64>,
    pub last_close: f64,
}

/// Signal values indexed by date, in evaluation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalTable {
    pub signal: String,
    pub rows: Vec<SignalRow>,
}

impl SignalTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&SignalRow> {
        self.rows.iter().find(|r| r.date == date)
    }

    /// Dates on which the active contract changed from the previous row.
    pub fn roll_dates(&self) -> Vec<NaiveDate> {
        self.rows
            .windows(2)
            .filter(|w| w[0].contract != w[1].contract)
            .map(|w| w[1].date)
            .collect()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("date,contract,expiry,value,last_close\n");
        for r in &self.rows {
            let value = r.value.map(|v| v.to_string()).unwrap_or_default();
            let _ = writeln!(out, "{},{},{},{},{}", r.date, r.contract, r.expiry, value, r.last_close);
        }
        out
    }
}

/// Evaluate `signal` once per date, in the order given.
pub async fn simulate<S, I>(signal: &S, dates: I) -> Result<SignalTable>
where
    S: Signal + ?Sized,
    I: IntoIterator<Item = NaiveDate>,
{
    let mut table = SignalTable {
        signal: signal.name().to_string(),
        rows: Vec::new(),
    };
    for date in dates {
        let reading = signal.evaluate(date).await?;
        table.rows.push(SignalRow {
            date: reading.date,
            contract: reading.contract.local_symbol,
            expiry: reading.contract.expiry,
            value: reading.value,
            last_close: reading.last_close,
        });
    }
    info!(signal = %table.signal, rows = table.len(), rolls = table.roll_dates().len(), "simulation done");
    Ok(table)
}

/// Monday-to-Friday dates in `[start, end]`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut d = start;
    while d <= end {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}
