//! Decode every record in one complete buffer (a datagram, a file read whole).
//!
//! Records are decoded back to back with the one-shot evaluator. Where nothing matches,
//! bytes are skipped (`resync_skip_bytes`, at least one) and the skipped span is reported,
//! so a frame with corrupt stretches still yields every well-formed record.

use crate::evaluate::evaluate;
use crate::machine::{Machine, MachineError};

/// Result of decoding a frame: the records found and the byte ranges skipped between them.
#[derive(Debug)]
pub struct FrameDecodeResult<O> {
    pub records: Vec<DecodedRecord<O>>,
    /// Merged ranges of bytes that did not start a record.
    pub skipped: Vec<SkippedRange>,
    /// Bytes left unexamined because a record matched without consuming anything.
    pub trailing: usize,
}

#[derive(Debug)]
pub struct DecodedRecord<O> {
    pub value: O,
    pub byte_range: (usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRange {
    pub byte_range: (usize, usize),
    /// Failure at the first skipped byte.
    pub reason: String,
}

/// Decode all records in `bytes`.
///
/// Configuration errors (unknown state, empty state, non-termination, overrun) abort the
/// frame; unmatched data does not.
pub fn decode_records<O: Default>(
    machine: &Machine<O>,
    bytes: &[u8],
) -> Result<FrameDecodeResult<O>, MachineError> {
    let step = machine.options().resync_skip_bytes.max(1);
    let mut records = Vec::new();
    let mut skipped: Vec<SkippedRange> = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let mut value = O::default();
        match evaluate(machine, &bytes[offset..], &mut value) {
            Ok(0) => break,
            Ok(consumed) => {
                records.push(DecodedRecord {
                    value,
                    byte_range: (offset, offset + consumed),
                });
                offset += consumed;
            }
            Err(e @ MachineError::NoMatchingTransition(_)) => {
                let end = (offset + step).min(bytes.len());
                match skipped.last_mut() {
                    Some(last) if last.byte_range.1 == offset => last.byte_range.1 = end,
                    _ => skipped.push(SkippedRange {
                        byte_range: (offset, end),
                        reason: e.to_string(),
                    }),
                }
                offset = end;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(FrameDecodeResult {
        records,
        skipped,
        trailing: bytes.len() - offset,
    })
}
