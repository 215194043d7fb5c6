//! String fields. Bytes are decoded as UTF-8, replacing invalid sequences.

use crate::fields::numbers::Endianness;
use crate::transition::{TestFailure, TestResult};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

fn text(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

/// String whose byte length was decoded earlier into the record.
pub fn fixed_len<O, L, S>(len: L, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    L: Fn(&O) -> usize + Send + Sync,
    S: Fn(&mut O, String) + Send + Sync,
{
    move |b: &[u8], out: &mut O| {
        let n = len(out);
        if b.len() < n {
            return Err(TestFailure::Incomplete);
        }
        set(out, text(&b[..n]));
        Ok(n)
    }
}

/// String up to `delimiter`; the delimiter is consumed, not stored.
pub fn delimited<O, S>(delimiter: u8, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, String) + Send + Sync,
{
    move |b: &[u8], out: &mut O| match b.iter().position(|&x| x == delimiter) {
        Some(p) => {
            set(out, text(&b[..p]));
            Ok(p + 1)
        }
        None => Err(TestFailure::Incomplete),
    }
}

/// Like [`delimited`], but gives up once `max_len` bytes have arrived without a delimiter.
pub fn delimited_max_len<O, S>(delimiter: u8, max_len: usize, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, String) + Send + Sync,
{
    move |b: &[u8], out: &mut O| match b.iter().position(|&x| x == delimiter) {
        Some(p) => {
            set(out, text(&b[..p]));
            Ok(p + 1)
        }
        None if b.len() < max_len => Err(TestFailure::Incomplete),
        None => Err(TestFailure::no_match(format!("no delimiter {:02X} in data", delimiter))),
    }
}

/// String up to the first 0x00.
pub fn null_terminated<O, S>(set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, String) + Send + Sync,
{
    delimited(0x00, set)
}

/// String preceded by its byte length as a `width`-byte unsigned integer.
///
/// # Panics
///
/// When `width` is outside 1..=8.
pub fn length_prefixed<O, S>(width: usize, order: Endianness, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, String) + Send + Sync,
{
    assert!((1..=8).contains(&width), "length prefix width must be 1..=8, got {}", width);
    move |b: &[u8], out: &mut O| {
        if b.len() < width {
            return Err(TestFailure::Incomplete);
        }
        let len = match order {
            Endianness::Big => BigEndian::read_uint(b, width),
            Endianness::Little => LittleEndian::read_uint(b, width),
        };
        let Ok(len) = usize::try_from(len) else {
            return Err(TestFailure::no_match(format!("length {} too large", len)));
        };
        let rest = &b[width..];
        if rest.len() < len {
            return Err(TestFailure::Incomplete);
        }
        set(out, text(&rest[..len]));
        Ok(width + len)
    }
}
