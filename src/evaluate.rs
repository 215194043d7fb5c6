//! One-shot evaluation of a machine against a fully available buffer.

use crate::diagnostics::diag;
use crate::engine::{Halt, Run};
use crate::machine::{Machine, MachineError};

/// Run `machine` once over `bytes` from its initial state, writing decoded fields into `out`.
///
/// Returns the number of bytes consumed up to the terminal marker, which may be less than
/// `bytes.len()`; trailing bytes are left unexamined. No more data can ever arrive, so a
/// transition asking for more bytes counts as not matching and a state where nothing
/// matches ends with [`MachineError::NoMatchingTransition`].
pub fn evaluate<O>(machine: &Machine<O>, bytes: &[u8], out: &mut O) -> Result<usize, MachineError> {
    let mut run = Run::new(machine);
    let result = match run.pass(machine, bytes, out, false) {
        Ok((consumed, Halt::Accepted)) => Ok(consumed),
        Ok((_, Halt::Soft | Halt::Hard)) => {
            Err(MachineError::NoMatchingTransition(run.state().to_string()))
        }
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        diag!(machine.diagnostics(), "{}", e);
    }
    result
}
