//! Scanner fuzz target: feed arbitrary bytes, in arbitrary chunk sizes, to a machine with
//! length-driven fields and resync. Must not panic; every session ends with an error value.
//! The first byte picks the chunk size. The one-shot frame decoder runs on the same bytes.
//! Build with: cargo fuzz run scanner_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use bytefsm::fields::{length_prefixed, null_terminated, numbers, skip, stx, take_len, Endianness};
#[cfg(fuzzing)]
use bytefsm::value::{length_of, set};
#[cfg(fuzzing)]
use bytefsm::{decode_records, ChunkedReader, Machine, Record, State};
#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fn machine() -> Machine<Record> {
    Machine::builder("Start")
        .state("Start", State::new().on(stx(), "Kind").on(skip(1), "Start"))
        .state(
            "Kind",
            State::new()
                .on(bytefsm::fields::byte(b'S'), "Str")
                .on(bytefsm::fields::byte(b'B'), "Len")
                .on(bytefsm::fields::byte(b'N'), "Text"),
        )
        .state("Str", State::new().accept(length_prefixed(2, Endianness::Little, set("str"))))
        .state("Len", State::new().on(numbers::u16(Endianness::Big, set("len")), "Raw"))
        .state("Raw", State::new().accept(take_len(length_of("len"), set("raw"))))
        .state("Text", State::new().accept(null_terminated(set("text"))))
        .resync_skip_bytes(1)
        .non_termination_bound(1_000)
        .build()
}

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let machine = machine();
    let chunk = usize::from(first % 32) + 1;
    let mut scanner = machine.scanner(ChunkedReader::new(rest, chunk));
    while scanner.next_record() {}
    assert!(scanner.last_error().is_some());
    let _ = decode_records(&machine, rest);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run scanner_fuzz");
}
