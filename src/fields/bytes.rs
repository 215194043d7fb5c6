//! Byte-level fields: skipping, single bytes, literals and raw runs.

use crate::transition::{TestFailure, TestResult};

/// Start-of-text control byte.
pub const STX: u8 = 0x02;
/// End-of-text control byte.
pub const ETX: u8 = 0x03;

/// Consume `n` bytes of anything.
pub fn skip<O>(n: usize) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync {
    move |b: &[u8], _: &mut O| {
        if b.len() < n {
            return Err(TestFailure::Incomplete);
        }
        Ok(n)
    }
}

/// Match a single given byte.
pub fn byte<O>(expected: u8) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync {
    move |b: &[u8], _: &mut O| match b.first() {
        None => Err(TestFailure::Incomplete),
        Some(&x) if x == expected => Ok(1),
        Some(&x) => Err(TestFailure::no_match(format!("expected {:02X}, got {:02X}", expected, x))),
    }
}

pub fn stx<O>() -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync {
    byte(STX)
}

pub fn etx<O>() -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync {
    byte(ETX)
}

/// Match an exact byte sequence at the start of the window.
///
/// While the window is a proper prefix of the literal the answer is
/// [`TestFailure::Incomplete`].
pub fn literal<O>(expected: impl Into<Vec<u8>>) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync {
    let expected = expected.into();
    move |b: &[u8], _: &mut O| {
        let n = b.len().min(expected.len());
        if b[..n] != expected[..n] {
            return Err(TestFailure::no_match("literal mismatch"));
        }
        if n < expected.len() {
            return Err(TestFailure::Incomplete);
        }
        Ok(expected.len())
    }
}

/// Matches without consuming anything.
pub fn epsilon<O>() -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync {
    |_: &[u8], _: &mut O| Ok(0)
}

/// Take exactly `n` raw bytes.
pub fn take<O, S>(n: usize, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, Vec<u8>) + Send + Sync,
{
    move |b: &[u8], out: &mut O| {
        if b.len() < n {
            return Err(TestFailure::Incomplete);
        }
        set(out, b[..n].to_vec());
        Ok(n)
    }
}

/// Take raw bytes whose count was decoded earlier into the record.
pub fn take_len<O, L, S>(len: L, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    L: Fn(&O) -> usize + Send + Sync,
    S: Fn(&mut O, Vec<u8>) + Send + Sync,
{
    move |b: &[u8], out: &mut O| {
        let n = len(out);
        if b.len() < n {
            return Err(TestFailure::Incomplete);
        }
        set(out, b[..n].to_vec());
        Ok(n)
    }
}
