//! Dates and timestamps written as fixed-width text, parsed with chrono `strftime` formats.
//!
//! The field is exactly `width` bytes; the whole slice must match `format`
//! (for example `"%d/%m/%y %H:%M:%S"` with width 17).

use crate::transition::{TestFailure, TestResult};
use chrono::{NaiveDate, NaiveDateTime};

fn field(b: &[u8], width: usize) -> Result<&str, TestFailure> {
    if b.len() < width {
        return Err(TestFailure::Incomplete);
    }
    std::str::from_utf8(&b[..width]).map_err(|_| TestFailure::no_match("date field is not UTF-8"))
}

pub fn date<O, S>(format: impl Into<String>, width: usize, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, NaiveDate) + Send + Sync,
{
    let format = format.into();
    move |b: &[u8], out: &mut O| {
        let s = field(b, width)?;
        let d = NaiveDate::parse_from_str(s, &format)
            .map_err(|e| TestFailure::no_match(format!("date '{}': {}", s, e)))?;
        set(out, d);
        Ok(width)
    }
}

pub fn datetime<O, S>(format: impl Into<String>, width: usize, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, NaiveDateTime) + Send + Sync,
{
    let format = format.into();
    move |b: &[u8], out: &mut O| {
        let s = field(b, width)?;
        let t = NaiveDateTime::parse_from_str(s, &format)
            .map_err(|e| TestFailure::no_match(format!("timestamp '{}': {}", s, e)))?;
        set(out, t);
        Ok(width)
    }
}
