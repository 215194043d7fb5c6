//! Text formatting for decoded records and raw bytes.

use crate::value::{Record, Value};
use std::io::{self, Write};

/// Space-separated lowercase hex, e.g. `02 48 65`.
pub fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

/// One value on one line. Byte strings that are printable ASCII are quoted, others hex.
pub fn format_value(v: &Value) -> String {
    match v {
        Value::U8(x) => x.to_string(),
        Value::U16(x) => x.to_string(),
        Value::U32(x) => x.to_string(),
        Value::U64(x) => x.to_string(),
        Value::I8(x) => x.to_string(),
        Value::I16(x) => x.to_string(),
        Value::I32(x) => x.to_string(),
        Value::I64(x) => x.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Double(x) => x.to_string(),
        Value::Str(s) => format!("{:?}", s),
        Value::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) if s.chars().all(|c| !c.is_control()) => format!("{:?}", s),
            _ => format!("hex({})", hex_string(b)),
        },
        Value::Date(d) => d.to_string(),
        Value::DateTime(t) => t.to_string(),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

/// `name=value` pairs in field-name order.
pub fn record_summary_line(record: &Record) -> String {
    record
        .iter()
        .map(|(k, v)| format!("{}={}", k, format_value(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex dump, 16 bytes per line, each line prefixed with its offset.
pub fn write_hex_with_offset(w: &mut dyn Write, base: usize, bytes: &[u8]) -> io::Result<()> {
    for (i, chunk) in bytes.chunks(16).enumerate() {
        writeln!(w, "    {:04x}: {}", base + i * 16, hex_string(chunk))?;
    }
    Ok(())
}
