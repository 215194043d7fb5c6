//! Scan a byte stream with one of the built-in record framings and print each record.
//!
//! Usage:
//!   fsm_scan [OPTIONS] [FILE]
//!   fsm_scan [OPTIONS] < stream.bin
//!
//! Options:
//!   --framing F    stx-text (STX, null-terminated text; default), stx-len (STX, u8 length,
//!                  text), lines (newline-terminated text)
//!   --resync N     on unmatched bytes, skip N bytes and retry (default 0 = wait for more data)
//!   --chunk N      feed the scanner at most N bytes per read
//!   --pcap         FILE is a pcap/pcapng capture; scan the concatenated UDP payloads
//!   --verbose, -v  trace the state machine on stderr (filter with RUST_LOG)

use anyhow::{bail, Context};
use bytefsm::dump::{record_summary_line, write_hex_with_offset};
use bytefsm::fields::numbers;
use bytefsm::fields::{delimited, fixed_len, null_terminated, skip, stx};
use bytefsm::lint::{lint, Severity};
use bytefsm::value::{length_of, set};
use bytefsm::{ChunkedReader, Machine, Options, Record, ScanError, State, TracingSink};
use pcap_parser::pcap::LegacyPcapReader;
use pcap_parser::pcapng::Block as PcapNgBlock;
use pcap_parser::pcapng::PcapNGReader;
use pcap_parser::traits::{PcapNGPacketBlock, PcapReaderIterator};
use pcap_parser::{Linktype, PcapBlockOwned, PcapError};
use std::cell::Cell;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Framing {
    StxText,
    StxLen,
    Lines,
}

impl FromStr for Framing {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stx-text" => Ok(Framing::StxText),
            "stx-len" => Ok(Framing::StxLen),
            "lines" => Ok(Framing::Lines),
            other => bail!("unknown framing '{}' (expected stx-text, stx-len or lines)", other),
        }
    }
}

impl Framing {
    fn machine(self, options: Options) -> Machine<Record> {
        let builder = Machine::builder("Start").options(options);
        match self {
            Framing::StxText => builder
                .state("Start", State::new().on(stx(), "Text").on(skip(1), "Start"))
                .state("Text", State::new().accept(null_terminated(set("text")))),
            Framing::StxLen => builder
                .state("Start", State::new().on(stx(), "Len"))
                .state("Len", State::new().on(numbers::u8(set("len")), "Text"))
                .state("Text", State::new().accept(fixed_len(length_of("len"), set("text")))),
            Framing::Lines => builder.state("Start", State::new().accept(delimited(b'\n', set("line")))),
        }
        .build()
    }
}

fn take_flag(args: &mut Vec<String>, names: &[&str]) -> bool {
    match args.iter().position(|a| names.contains(&a.as_str())) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}

fn take_value(args: &mut Vec<String>, name: &str) -> anyhow::Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    args.remove(pos);
    if pos >= args.len() {
        bail!("{} needs a value", name);
    }
    Ok(Some(args.remove(pos)))
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = take_flag(&mut args, &["--verbose", "-v"]);
    let pcap = take_flag(&mut args, &["--pcap"]);
    let framing: Framing = match take_value(&mut args, "--framing")? {
        Some(s) => s.parse()?,
        None => Framing::StxText,
    };
    let resync: usize = match take_value(&mut args, "--resync")? {
        Some(s) => s.parse().context("--resync")?,
        None => 0,
    };
    let chunk: Option<usize> = take_value(&mut args, "--chunk")?
        .map(|s| s.parse().context("--chunk"))
        .transpose()?;
    let input: Option<PathBuf> = args.into_iter().next().map(PathBuf::from);

    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bytefsm=debug")),
            )
            .with_writer(io::stderr)
            .init();
    }

    let mut options = Options::default().resync_skip_bytes(resync);
    if verbose {
        options = options.diagnostics(Arc::new(TracingSink));
    }
    let machine = framing.machine(options);
    for m in lint(&machine) {
        let severity = match m.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("{}: state '{}': {}", severity, m.state, m.message);
    }

    let stats = Rc::new(PcapStats::default());
    let source: Box<dyn Read> = match (&input, pcap) {
        (Some(path), true) => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            Box::new(UdpPayloads::open(file, stats.clone())?)
        }
        (Some(path), false) => {
            Box::new(File::open(path).with_context(|| format!("open {}", path.display()))?)
        }
        (None, true) => bail!("--pcap needs a capture file"),
        (None, false) => Box::new(io::stdin().lock()),
    };
    let source: Box<dyn Read> = match chunk {
        Some(n) => Box::new(ChunkedReader::new(source, n)),
        None => source,
    };

    let mut scanner = machine.scanner(source);
    let mut count = 0u64;
    while scanner.next_record() {
        count += 1;
        println!("{:>6} @{:<8} {}", count, scanner.offset(), record_summary_line(scanner.record()));
    }

    eprintln!("input:   {}", input.as_ref().map_or("<stdin>".to_string(), |p| p.display().to_string()));
    eprintln!("framing: {:?}", framing);
    if pcap {
        eprintln!("packets: {}", stats.packets.get());
        eprintln!("udp payloads: {}", stats.payloads.get());
    }
    eprintln!("records: {}", count);
    eprintln!("bytes consumed: {}", scanner.offset());

    match scanner.last_error() {
        Some(ScanError::EndOfInput) | None => Ok(()),
        Some(e @ ScanError::Truncated { .. }) => {
            eprintln!("note: {}", e);
            write_hex_with_offset(&mut io::stderr(), scanner.offset() as usize, scanner.buffered())?;
            Ok(())
        }
        Some(e) => bail!("scan failed after {} records: {}", count, e),
    }
}

#[derive(Default)]
struct PcapStats {
    packets: Cell<u64>,
    payloads: Cell<u64>,
}

/// The UDP payloads of a capture, concatenated into one byte stream.
struct UdpPayloads {
    reader: Box<dyn PcapReaderIterator>,
    legacy_linktype: Linktype,
    if_linktypes: Vec<Linktype>,
    pending: Vec<u8>,
    pos: usize,
    stats: Rc<PcapStats>,
}

impl UdpPayloads {
    fn open(mut file: File, stats: Rc<PcapStats>) -> anyhow::Result<Self> {
        use std::io::{Seek, SeekFrom};
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).context("read capture magic")?;
        file.seek(SeekFrom::Start(0))?;
        let reader: Box<dyn PcapReaderIterator> = if magic == [0x0a, 0x0d, 0x0d, 0x0a] {
            Box::new(PcapNGReader::new(1 << 20, file).map_err(|e| anyhow::anyhow!("pcapng: {:?}", e))?)
        } else {
            Box::new(LegacyPcapReader::new(1 << 20, file).map_err(|e| anyhow::anyhow!("pcap: {:?}", e))?)
        };
        Ok(UdpPayloads {
            reader,
            legacy_linktype: Linktype(1),
            if_linktypes: Vec::new(),
            pending: Vec::new(),
            pos: 0,
            stats,
        })
    }

    /// Load the next UDP payload into `pending`; false at end of capture.
    fn next_payload(&mut self) -> io::Result<bool> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let pending = &mut self.pending;
                    let found = match block {
                        PcapBlockOwned::LegacyHeader(h) => {
                            self.legacy_linktype = h.network;
                            false
                        }
                        PcapBlockOwned::Legacy(b) => {
                            self.stats.packets.set(self.stats.packets.get() + 1);
                            stash(pending, udp_payload(self.legacy_linktype, b.data))
                        }
                        PcapBlockOwned::NG(PcapNgBlock::InterfaceDescription(idb)) => {
                            self.if_linktypes.push(idb.linktype);
                            false
                        }
                        PcapBlockOwned::NG(PcapNgBlock::EnhancedPacket(epb)) => {
                            self.stats.packets.set(self.stats.packets.get() + 1);
                            let lt = self.if_linktypes.get(epb.if_id as usize).copied().unwrap_or(Linktype(1));
                            stash(pending, udp_payload(lt, epb.packet_data()))
                        }
                        PcapBlockOwned::NG(PcapNgBlock::SimplePacket(spb)) => {
                            self.stats.packets.set(self.stats.packets.get() + 1);
                            let lt = self.if_linktypes.first().copied().unwrap_or(Linktype(1));
                            stash(pending, udp_payload(lt, spb.packet_data()))
                        }
                        PcapBlockOwned::NG(_) => false,
                    };
                    self.reader.consume(offset);
                    if found {
                        self.pos = 0;
                        self.stats.payloads.set(self.stats.payloads.get() + 1);
                        return Ok(true);
                    }
                }
                Err(PcapError::Eof) => return Ok(false),
                Err(PcapError::Incomplete(_)) => {
                    self.reader
                        .refill()
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("pcap refill error: {:?}", e)))?;
                }
                Err(e) => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, format!("pcap read error: {:?}", e)))
                }
            }
        }
    }
}

impl Read for UdpPayloads {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.pending.len() {
            if !self.next_payload()? {
                return Ok(0);
            }
        }
        let n = out.len().min(self.pending.len() - self.pos);
        out[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Copy `payload`, if any, into `pending`.
fn stash(pending: &mut Vec<u8>, payload: Option<&[u8]>) -> bool {
    match payload {
        Some(p) => {
            pending.clear();
            pending.extend_from_slice(p);
            true
        }
        None => false,
    }
}

/// UDP payload of a captured IPv4 frame, bounded by the IP and UDP length fields so
/// Ethernet padding is left out.
fn udp_payload(linktype: Linktype, frame: &[u8]) -> Option<&[u8]> {
    let l3 = match linktype.0 {
        1 => ethernet_ipv4(frame)?,
        101 => frame,
        113 if frame.len() >= 16 && frame[14..16] == [0x08, 0x00] => &frame[16..],
        _ => return None,
    };
    if l3.len() < 20 || l3[0] >> 4 != 4 {
        return None;
    }
    let ihl = (l3[0] & 0x0f) as usize * 4;
    let total = u16::from_be_bytes([l3[2], l3[3]]) as usize;
    if ihl < 20 || total < ihl + 8 || l3[9] != 17 {
        return None;
    }
    let ip = l3.get(..total.min(l3.len()))?;
    let udp = ip.get(ihl..)?;
    if udp.len() < 8 {
        return None;
    }
    let udp_len = u16::from_be_bytes([udp[4], udp[5]]) as usize;
    if udp_len < 8 || udp.len() < udp_len {
        return None;
    }
    Some(&udp[8..udp_len])
}

/// Network layer of an Ethernet frame carrying IPv4, skipping 802.1Q/802.1ad tags.
fn ethernet_ipv4(frame: &[u8]) -> Option<&[u8]> {
    let mut off = 12usize;
    loop {
        let ethertype = u16::from_be_bytes([*frame.get(off)?, *frame.get(off + 1)?]);
        off += 2;
        match ethertype {
            0x8100 | 0x88a8 => off += 2,
            0x0800 => return frame.get(off..),
            _ => return None,
        }
    }
}
