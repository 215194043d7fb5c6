//! Field decoders: ready-made transition tests for common protocol fields.
//!
//! Every decoder is generic over the output record `O`. Decoders that produce a value take
//! a *setter* `Fn(&mut O, T)` that stores it; decoders whose extent depends on an earlier
//! field take a *getter* `Fn(&O) -> usize`. With [`Record`](crate::value::Record) outputs use
//! [`value::set`](crate::value::set) and [`value::length_of`](crate::value::length_of).
//!
//! | Module | Fields |
//! |--------|--------|
//! | [`bytes`] | skip, single byte, STX/ETX, literals, raw byte runs |
//! | [`numbers`] | fixed-width integers and floats, either byte order |
//! | [`strings`] | fixed, delimited, null-terminated, length-prefixed strings |
//! | [`pattern`] | regular expression matches |
//! | [`date`] | dates and timestamps in a fixed-width text layout |

pub mod bytes;
pub mod date;
pub mod numbers;
pub mod pattern;
pub mod strings;

pub use bytes::{byte, epsilon, etx, literal, skip, stx, take, take_len};
pub use numbers::Endianness;
pub use strings::{delimited, delimited_max_len, fixed_len, length_prefixed, null_terminated};
