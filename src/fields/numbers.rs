//! Fixed-width numbers with a chosen byte order.

use crate::transition::{TestFailure, TestResult};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order for multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

/// Unsigned integer of `width` bytes (1..=8).
///
/// # Panics
///
/// When `width` is outside 1..=8.
pub fn uint<O, S>(width: usize, order: Endianness, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, u64) + Send + Sync,
{
    assert!((1..=8).contains(&width), "uint width must be 1..=8, got {}", width);
    move |b: &[u8], out: &mut O| {
        if b.len() < width {
            return Err(TestFailure::Incomplete);
        }
        let v = match order {
            Endianness::Big => BigEndian::read_uint(b, width),
            Endianness::Little => LittleEndian::read_uint(b, width),
        };
        set(out, v);
        Ok(width)
    }
}

pub fn u8<O, S>(set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, u8) + Send + Sync,
{
    move |b: &[u8], out: &mut O| match b.first() {
        Some(&x) => {
            set(out, x);
            Ok(1)
        }
        None => Err(TestFailure::Incomplete),
    }
}

pub fn i8<O, S>(set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
where
    S: Fn(&mut O, i8) + Send + Sync,
{
    move |b: &[u8], out: &mut O| match b.first() {
        Some(&x) => {
            set(out, x as i8);
            Ok(1)
        }
        None => Err(TestFailure::Incomplete),
    }
}

macro_rules! fixed_width {
    ($name:ident, $ty:ty, $width:expr, $read:ident) => {
        pub fn $name<O, S>(order: Endianness, set: S) -> impl Fn(&[u8], &mut O) -> TestResult + Send + Sync
        where
            S: Fn(&mut O, $ty) + Send + Sync,
        {
            move |b: &[u8], out: &mut O| {
                if b.len() < $width {
                    return Err(TestFailure::Incomplete);
                }
                let v = match order {
                    Endianness::Big => BigEndian::$read(b),
                    Endianness::Little => LittleEndian::$read(b),
                };
                set(out, v);
                Ok($width)
            }
        }
    };
}

fixed_width!(u16, u16, 2, read_u16);
fixed_width!(i16, i16, 2, read_i16);
fixed_width!(u32, u32, 4, read_u32);
fixed_width!(i32, i32, 4, read_i32);
fixed_width!(u64, u64, 8, read_u64);
fixed_width!(i64, i64, 8, read_i64);
fixed_width!(f32, f32, 4, read_f32);
fixed_width!(f64, f64, 8, read_f64);
