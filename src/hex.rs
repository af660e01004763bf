//! Intel HEX output.
//!
//! An external-collaborator concern relative to the core translation
//! pipeline (spec.md §1): it only reformats the encoder's finished byte
//! buffer, never participates in assembly itself. Emitted only when
//! `--hex-offset` is given (SPEC_FULL.md §6.2), alongside the primary flat
//! binary, at `<output>.hex`.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const BYTES_PER_RECORD: usize = 16;

const RECORD_DATA: u8 = 0x00;
const RECORD_EOF: u8 = 0x01;
const RECORD_EXTENDED_LINEAR_ADDRESS: u8 = 0x04;

/// Writes `bytes` as Intel HEX records to `path`, with the image's first
/// byte placed at `load_offset`. One 16-byte data record per line, an
/// Extended Linear Address record whenever the upper 16 bits of the address
/// change, and a trailing EOF record.
pub fn write_file(path: &Path, bytes: &[u8], load_offset: u32) -> io::Result<()> {
    let file = File::create(path)?;
    write(file, bytes, load_offset)
}

pub fn write<W: Write>(mut out: W, bytes: &[u8], load_offset: u32) -> io::Result<()> {
    // Addresses below 0x10000 never need an Extended Linear Address record,
    // so this starts at the implicit upper half (0) rather than `None` —
    // otherwise every file would open with a redundant ELA(0x0000) record.
    let mut current_upper = 0u16;

    for (offset_in_image, chunk) in bytes.chunks(BYTES_PER_RECORD).enumerate() {
        let addr = load_offset.wrapping_add((offset_in_image * BYTES_PER_RECORD) as u32);
        let upper = (addr >> 16) as u16;
        if upper != current_upper {
            write_record(&mut out, RECORD_EXTENDED_LINEAR_ADDRESS, 0, &upper.to_be_bytes())?;
            current_upper = upper;
        }
        write_record(&mut out, RECORD_DATA, (addr & 0xFFFF) as u16, chunk)?;
    }

    write_record(&mut out, RECORD_EOF, 0, &[])
}

fn write_record<W: Write>(out: &mut W, record_type: u8, address: u16, data: &[u8]) -> io::Result<()> {
    let mut line = String::with_capacity(11 + data.len() * 2);
    line.push(':');
    line.push_str(&format!("{:02X}", data.len()));
    line.push_str(&format!("{:04X}", address));
    line.push_str(&format!("{:02X}", record_type));
    for byte in data {
        line.push_str(&format!("{:02X}", byte));
    }
    line.push_str(&format!("{:02X}", checksum(data.len() as u8, address, record_type, data)));
    writeln!(out, "{line}")
}

fn checksum(byte_count: u8, address: u16, record_type: u8, data: &[u8]) -> u8 {
    let mut sum = byte_count as u32
        + ((address >> 8) as u32)
        + ((address & 0xFF) as u32)
        + record_type as u32;
    for byte in data {
        sum += *byte as u32;
    }
    (0u8).wrapping_sub(sum as u8)
}
