//! Integration tests: one-shot evaluation, machine errors, frame decoding and diagnostics.

use bytefsm::fields::pattern;
use bytefsm::fields::{date, epsilon, literal, null_terminated, numbers, skip, stx, Endianness};
use bytefsm::value::{length_of, set};
use bytefsm::{
    decode_records, evaluate, Machine, MachineError, MemorySink, Record, State, TestFailure, TestResult, Value,
};
use chrono::{NaiveDate, NaiveDateTime};
use regex::bytes::Regex;
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq)]
struct Text {
    text: String,
}

fn stx_text_machine() -> Machine<Text> {
    Machine::builder("Start")
        .state("Start", State::new().on(stx(), "Text").on(skip(1), "Start"))
        .state(
            "Text",
            State::new().accept(null_terminated(|r: &mut Text, s| r.text = s)),
        )
        .build()
}

#[test]
fn test_decode_simple() {
    let machine = stx_text_machine();
    let mut out = Text::default();
    let n = machine
        .parse(&[0x02, b'H', b'e', b'l', b'l', b'o', 0x00], &mut out)
        .expect("parse");
    assert_eq!(n, 7);
    assert_eq!(out.text, "Hello");
}

#[test]
fn test_decode_literal_then_text() {
    let machine: Machine<Text> = Machine::builder("Start")
        .state("Start", State::new().on(stx(), "OneTwoThree").on(skip(1), "Start"))
        .state("OneTwoThree", State::new().on(literal([0x01u8, 0x02, 0x03]), "Text"))
        .state(
            "Text",
            State::new().accept(null_terminated(|r: &mut Text, s| r.text = s)),
        )
        .build();
    let mut out = Text::default();
    let n = evaluate(
        &machine,
        &[0x02, 0x01, 0x02, 0x03, b'H', b'e', b'l', b'l', b'o', 0x00],
        &mut out,
    )
    .expect("evaluate");
    assert_eq!(n, 10);
    assert_eq!(out.text, "Hello");
}

#[test]
fn test_leading_noise_is_skipped_by_transition() {
    let machine = stx_text_machine();
    let mut out = Text::default();
    let n = machine
        .parse(&[0xff, 0xfe, 0x02, b'O', b'K', 0x00], &mut out)
        .expect("parse");
    assert_eq!(n, 6);
    assert_eq!(out.text, "OK");
}

#[test]
fn test_trailing_bytes_are_not_examined() {
    let machine = stx_text_machine();
    let mut out = Text::default();
    let n = machine
        .parse(&[0x02, b'A', 0x00, 0x02, b'B'], &mut out)
        .expect("parse");
    assert_eq!(n, 3);
    assert_eq!(out.text, "A");
}

#[derive(Debug, Default)]
struct DatedText {
    date_match: Vec<Vec<u8>>,
    text: String,
}

#[test]
fn test_decode_regex_date_then_text() {
    let re = Regex::new("([0-9]{2})/([0-9]{2})/([0-9]{2,4})").expect("regex");
    let machine: Machine<DatedText> = Machine::builder("Start")
        .state("Start", State::new().on(bytefsm::fields::byte(0x0A), "Date").on(skip(1), "Start"))
        .state(
            "Date",
            State::new().on(pattern::captures(re, |r: &mut DatedText, m| r.date_match = m), "Text"),
        )
        .state(
            "Text",
            State::new().accept(null_terminated(|r: &mut DatedText, s| r.text = s)),
        )
        .build();
    let mut input = b"X\n08/05/2021 Hello!".to_vec();
    input.push(0x00);
    let mut out = DatedText::default();
    let n = machine.parse(&input, &mut out).expect("parse");
    assert_eq!(n, 20);
    assert_eq!(out.date_match.len(), 4);
    assert_eq!(out.date_match[0], b"08/05/2021");
    assert_eq!(out.date_match[3], b"2021");
    assert_eq!(out.text, " Hello!");
}

#[derive(Debug, Default)]
struct LenText {
    len: u64,
    text: String,
}

#[test]
fn test_decode_variable_len_string() {
    let machine: Machine<LenText> = Machine::builder("Start")
        .state("Start", State::new().on(stx(), "TextLen").on(skip(1), "Start"))
        .state(
            "TextLen",
            State::new().on(numbers::uint(2, Endianness::Big, |r: &mut LenText, v| r.len = v), "Text"),
        )
        .state(
            "Text",
            State::new().accept(bytefsm::fields::fixed_len(
                |r: &LenText| r.len as usize,
                |r: &mut LenText, s| r.text = s,
            )),
        )
        .build();
    let mut out = LenText::default();
    let n = machine
        .parse(&[0x02, 0x00, 0x05, b'H', b'e', b'l', b'l', b'o'], &mut out)
        .expect("parse");
    assert_eq!(n, 8);
    assert_eq!(out.len, 5);
    assert_eq!(out.text, "Hello");
}

#[test]
fn test_decode_date() {
    let machine: Machine<Option<NaiveDateTime>> = Machine::builder("Start")
        .state(
            "Start",
            State::new().accept(date::datetime("%d/%m/%y %H:%M:%S", 17, |r: &mut Option<NaiveDateTime>, t| {
                *r = Some(t)
            })),
        )
        .build();
    let mut out = None;
    let n = machine.parse(b"09/05/21 13:57:30", &mut out).expect("parse");
    assert_eq!(n, 17);
    let expect = NaiveDate::from_ymd_opt(2021, 5, 9)
        .and_then(|d| d.and_hms_opt(13, 57, 30))
        .expect("valid date");
    assert_eq!(out, Some(expect));
}

#[test]
fn test_record_output_with_keyed_slots() {
    let machine: Machine<Record> = Machine::builder("Start")
        .state("Start", State::new().on(stx(), "Len"))
        .state("Len", State::new().on(numbers::u8(set("len")), "Text"))
        .state(
            "Text",
            State::new().accept(bytefsm::fields::fixed_len(length_of("len"), set("text"))),
        )
        .build();
    let mut out = Record::new();
    let n = machine
        .parse(&[0x02, 0x03, b'a', b'b', b'c', 0xff], &mut out)
        .expect("parse");
    assert_eq!(n, 5);
    assert_eq!(out.get("len"), Some(&Value::U8(3)));
    assert_eq!(out.str("text"), Some("abc"));
}

// ==================== Errors ====================

#[test]
fn test_no_initial_state() {
    let machine: Machine<()> = Machine::builder("Missing")
        .state("Start", State::new().accept(skip(1)))
        .build();
    let err = machine.parse(&[0x00], &mut ()).unwrap_err();
    assert_eq!(err, MachineError::NoInitialState("Missing".to_string()));
}

#[test]
fn test_no_transitions() {
    let machine: Machine<()> = Machine::builder("Start")
        .state("Start", State::new().on(skip(1), "Empty"))
        .state("Empty", State::new())
        .build();
    let err = machine.parse(&[0x00], &mut ()).unwrap_err();
    assert_eq!(err, MachineError::NoTransitions("Empty".to_string()));
}

#[test]
fn test_undefined_state_only_fails_when_taken() {
    // Built without complaint; the bad target is reached only after an 'x'.
    let machine: Machine<()> = Machine::builder("Start")
        .state(
            "Start",
            State::new()
                .on(literal(*b"x"), "Nowhere")
                .accept(literal(*b"ok")),
        )
        .build();
    assert_eq!(machine.parse(b"ok", &mut ()), Ok(2));
    let err = machine.parse(b"x", &mut ()).unwrap_err();
    assert_eq!(err, MachineError::NoSuchState("Nowhere".to_string()));
}

#[test]
fn test_no_matching_transition_includes_incomplete() {
    let machine = stx_text_machine();
    let mut out = Text::default();
    // Text never terminated: the null-terminated test wants more data, which never comes.
    let err = machine.parse(&[0x02, b'H', b'i'], &mut out).unwrap_err();
    assert_eq!(err, MachineError::NoMatchingTransition("Text".to_string()));
}

#[test]
fn test_zero_consumption_cycle_is_infinite_loop() {
    let machine: Machine<()> = Machine::builder("A")
        .state("A", State::new().on(epsilon(), "B"))
        .state("B", State::new().on(epsilon(), "A"))
        .non_termination_bound(100)
        .build();
    let err = machine.parse(&[0x00, 0x01], &mut ()).unwrap_err();
    assert!(matches!(err, MachineError::InfiniteLoop(_)), "got {:?}", err);
}

#[test]
fn test_consuming_loop_does_not_trip_bound() {
    let machine: Machine<()> = Machine::builder("Start")
        .state("Start", State::new().on(stx(), "End").on(skip(1), "Start"))
        .state("End", State::new().accept(epsilon()))
        .non_termination_bound(10)
        .build();
    let mut input = vec![0xffu8; 1000];
    input.push(0x02);
    assert_eq!(machine.parse(&input, &mut ()), Ok(1001));
}

#[test]
fn test_overrun_is_reported() {
    let machine: Machine<()> = Machine::builder("Start")
        .state("Start", State::new().accept(|_: &[u8], _: &mut ()| -> TestResult { Ok(10) }))
        .build();
    let err = machine.parse(&[1, 2, 3], &mut ()).unwrap_err();
    assert_eq!(
        err,
        MachineError::Overrun {
            state: "Start".to_string(),
            index: 0,
            claimed: 10,
            available: 3,
        }
    );
}

#[test]
fn test_first_match_wins_in_list_order() {
    let machine: Machine<String> = Machine::builder("Start")
        .state(
            "Start",
            State::new()
                .accept(|b: &[u8], out: &mut String| -> TestResult {
                    if b.starts_with(b"ab") {
                        *out = "first".to_string();
                        Ok(1)
                    } else {
                        Err(TestFailure::no_match("not ab"))
                    }
                })
                .accept(|_: &[u8], out: &mut String| -> TestResult {
                    *out = "second".to_string();
                    Ok(2)
                }),
        )
        .build();
    let mut out = String::new();
    assert_eq!(machine.parse(b"abc", &mut out), Ok(1));
    assert_eq!(out, "first");
    assert_eq!(machine.parse(b"xyz", &mut out), Ok(2));
    assert_eq!(out, "second");
}

// ==================== Frame ====================

#[test]
fn test_decode_records_skips_noise() {
    let machine: Machine<Text> = Machine::builder("Start")
        .state("Start", State::new().on(stx(), "Text"))
        .state(
            "Text",
            State::new().accept(null_terminated(|r: &mut Text, s| r.text = s)),
        )
        .build();
    let bytes = [
        0x02, b'a', 0x00, 0xff, 0xff, 0x02, b'b', 0x00, 0xee, 0x02, b'c',
    ];
    let result = decode_records(&machine, &bytes).expect("decode");
    let texts: Vec<&str> = result.records.iter().map(|r| r.value.text.as_str()).collect();
    assert_eq!(texts, ["a", "b"]);
    assert_eq!(result.records[0].byte_range, (0, 3));
    assert_eq!(result.records[1].byte_range, (5, 8));
    let ranges: Vec<_> = result.skipped.iter().map(|s| s.byte_range).collect();
    assert_eq!(ranges, [(3, 5), (8, 11)]);
    assert_eq!(result.trailing, 0);
}

#[test]
fn test_decode_records_aborts_on_configuration_error() {
    let machine: Machine<()> = Machine::builder("Start")
        .state("Start", State::new().on(stx(), "Gone"))
        .build();
    let err = decode_records(&machine, &[0x02, 0x00]).unwrap_err();
    assert_eq!(err, MachineError::NoSuchState("Gone".to_string()));
}

// ==================== Diagnostics ====================

#[test]
fn test_diagnostics_trace_states_and_success() {
    let sink = Arc::new(MemorySink::new());
    let machine: Machine<Text> = Machine::builder("Start")
        .state("Start", State::new().on(stx(), "Text").on(skip(1), "Start"))
        .state(
            "Text",
            State::new().accept(null_terminated(|r: &mut Text, s| r.text = s)),
        )
        .diagnostics(sink.clone())
        .build();
    let mut out = Text::default();
    machine
        .parse(&[0x02, b'H', b'i', 0x00], &mut out)
        .expect("parse");
    let lines = sink.lines();
    assert!(lines.iter().any(|l| l.contains("entered state 'Start' at position 0")));
    assert!(lines.iter().any(|l| l.contains("entered state 'Text' at position 1")));
    assert!(lines.iter().any(|l| l.contains("SUCCESS: used 4 bytes")));
}
