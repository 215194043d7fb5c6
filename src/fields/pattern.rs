//! Regular expression fields over raw bytes.
//!
//! A match consumes everything up to its end, including any bytes before it. A window
//! without a match is a plain mismatch, even if more data might produce one.

use crate::transition::{TestFailure, TestResult};
use regex::bytes::Regex;

/// Leftmost match of `re`; stores the matched bytes.
pub fn find<O, S>(re: Regex, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, Vec<u8>) + Send + Sync,
{
    move |b: &[u8], out: &mut O| match re.find(b) {
        Some(m) => {
            set(out, m.as_bytes().to_vec());
            Ok(m.end())
        }
        None => Err(TestFailure::no_match("regex no match")),
    }
}

/// Leftmost match of `re`; stores the whole match followed by every capture group
/// (groups that did not participate are empty).
pub fn captures<O, S>(re: Regex, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, Vec<Vec<u8>>) + Send + Sync,
{
    move |b: &[u8], out: &mut O| match re.captures(b) {
        Some(caps) => {
            let end = caps.get(0).map_or(0, |m| m.end());
            let groups = caps
                .iter()
                .map(|g| g.map(|m| m.as_bytes().to_vec()).unwrap_or_default())
                .collect();
            set(out, groups);
            Ok(end)
        }
        None => Err(TestFailure::no_match("regex no match")),
    }
}
