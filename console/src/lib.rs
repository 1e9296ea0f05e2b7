//! # Wedge Console - Packet Table Rendering
//!
//! Renders interposed bus traffic as an operator-facing table, one row per
//! transaction, with decoded request and response fields inset between the
//! raw hex rows:
//!
//! ```text
//! /-------------------|--------|-------------------------------------------------\
//! |     Direction     |  reg   | data                                            |
//! |-------------------|--------|-------------------------------------------------|
//! | Host > MITM       | DATA   | 05 00 C1 00 00 00 22 00 00 00 14
//! |-------------------|--------|--------------------------------
//! |  REQUEST          |        | PcrExtend (0x00000014)
//! |                   |        | PCR Index: 1
//! ```
//!
//! Rendering is display-only: it consumes decoded views from the codec and
//! never feeds anything back into the engine. The sink is any
//! [`core::fmt::Write`] implementor, so the same printer drives a serial
//! console, a host stdout, or an in-memory test buffer.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

use core::fmt::{self, Write};
use wedge_core::{Direction, Mode, Register};
use wedge_proto::{
    ordinal, parse_command, parse_response_body, RequestBody, ResponseBody, HEADER_LEN,
};

const TABLE_TOP: &str =
    "/-------------------|--------|-------------------------------------------------\\";
const TABLE_HEAD: &str =
    "|     Direction     |  reg   | data                                            |";
const ROW_SEP: &str =
    "|-------------------|--------|-------------------------------------------------|";
const SHORT_RULE: &str = "|-------------------|--------|--------------------------------";
const CONTINUATION: &str = "|                   |        |";

/// Bytes shown per hex row before wrapping onto a continuation line.
const HEX_PER_ROW: usize = 16;

const fn direction_cell(direction: Direction) -> &'static str {
    match direction {
        Direction::HostToInterposer => "Host > MITM      ",
        Direction::InterposerToTpm => "       MITM > TPM",
        Direction::TpmToInterposer => "       MITM < TPM",
        Direction::InterposerToHost => "Host < MITM      ",
    }
}

/// Table renderer over an arbitrary character sink.
#[derive(Debug)]
pub struct PacketPrinter<W> {
    out: W,
}

impl<W: Write> PacketPrinter<W> {
    /// Wrap a sink.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the sink, consuming the printer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the table header once at startup.
    pub fn banner(&mut self) -> fmt::Result {
        writeln!(self.out, "{}", TABLE_TOP)?;
        writeln!(self.out, "{}", TABLE_HEAD)?;
        writeln!(self.out, "{}", ROW_SEP)
    }

    /// Print a separator between transaction groups.
    pub fn row_sep(&mut self) -> fmt::Result {
        writeln!(self.out, "{}", ROW_SEP)
    }

    /// One write-leg transaction: direction, register, raw bytes.
    pub fn bus_write(
        &mut self,
        direction: Direction,
        register: Register,
        payload: &[u8],
    ) -> fmt::Result {
        write!(
            self.out,
            "| {} | {:<6} |",
            direction_cell(direction),
            register.name()
        )?;
        self.hex_data(payload)
    }

    /// One read-leg transaction. Reads carry no register byte, so the
    /// register cell stays blank.
    pub fn bus_read(&mut self, direction: Direction, payload: &[u8]) -> fmt::Result {
        write!(
            self.out,
            "| {} | {:<6} |",
            direction_cell(direction),
            Register::None.name()
        )?;
        self.hex_data(payload)
    }

    /// Decode and render a fully assembled command.
    ///
    /// A buffer too short for a header renders as an unknown request rather
    /// than failing; the bytes themselves were already shown raw.
    pub fn request(&mut self, command: &[u8]) -> fmt::Result {
        let (ord, body) = match parse_command(command) {
            Some(parsed) => (parsed.header.ordinal, parsed.body),
            None => (0, RequestBody::Unsupported),
        };

        writeln!(self.out, "{}", SHORT_RULE)?;
        self.ordinal_line("REQUEST", ord)?;
        match body {
            RequestBody::PcrRead { pcr_index } => {
                self.field_line(format_args!("PCR Index: {}", pcr_index))?;
            }
            RequestBody::PcrExtend { pcr_index, digest } => {
                self.field_line(format_args!("PCR Index: {}", pcr_index))?;
                self.labelled_hex("In Digest:", digest)?;
            }
            RequestBody::GetRandom { num_bytes } => {
                self.field_line(format_args!("Num Bytes: {}", num_bytes))?;
            }
            RequestBody::Osap {
                entity_type,
                entity_value,
                nonce_odd,
            } => {
                self.field_line(format_args!("Entity Type: {}", entity_type))?;
                self.field_line(format_args!("Entity Value: {}", entity_value))?;
                self.labelled_hex("Nonce Odd OSAP:", nonce_odd)?;
            }
            RequestBody::SetOperatorAuth { auth } => {
                self.labelled_hex("Operator Auth Digest:", auth)?;
            }
            RequestBody::GetCapability { cap_area, sub_cap } => {
                self.field_line(format_args!("Cap Area: {}", cap_area))?;
                if sub_cap.is_empty() {
                    self.field_line(format_args!("Sub Cap: n/a"))?;
                } else {
                    self.field_line(format_args!("Sub Cap Size: {}", sub_cap.len()))?;
                    self.labelled_hex("Sub Cap Data:", sub_cap)?;
                }
            }
            RequestBody::Startup { startup_type } => {
                self.field_line(format_args!("Startup Type: {}", startup_type))?;
            }
            RequestBody::ReadPubek { anti_replay } => {
                self.labelled_hex("Anti Replay:", anti_replay)?;
            }
            RequestBody::Empty => self.field_line(format_args!("No args."))?,
            RequestBody::Truncated => self.field_line(format_args!("Truncated body."))?,
            RequestBody::Unsupported => {
                self.field_line(format_args!("Not supported yet..."))?;
            }
        }
        writeln!(self.out, "{}", SHORT_RULE)
    }

    /// Decode and render a response body read.
    ///
    /// `ordinal` is the provoking request's ordinal from the session model.
    /// Responses come off the FIFO header first; the 10-byte header read was
    /// already shown as a raw hex row, so it renders nothing here.
    pub fn response_body(&mut self, ordinal: u32, body: &[u8]) -> fmt::Result {
        if body.len() == HEADER_LEN {
            return Ok(());
        }

        writeln!(self.out, "{}", SHORT_RULE)?;
        self.ordinal_line("RESPONSE", ordinal)?;
        match parse_response_body(ordinal, body) {
            ResponseBody::PcrRead { digest } | ResponseBody::PcrExtend { digest } => {
                self.labelled_hex("Out Digest:", digest)?;
            }
            ResponseBody::GetRandom { size, bytes } => {
                self.field_line(format_args!("Random Bytes Size: {}", size))?;
                self.labelled_hex("Random Bytes:", bytes)?;
            }
            ResponseBody::Osap {
                handle,
                nonce_even,
                nonce_even_osap,
            } => {
                self.field_line(format_args!("Auth Handle: {}", handle))?;
                self.labelled_hex("Nonce Even:", nonce_even)?;
                self.labelled_hex("Nonce Even OSAP:", nonce_even_osap)?;
            }
            ResponseBody::Oiap { handle, nonce_even } => {
                self.field_line(format_args!("Auth Handle: {}", handle))?;
                self.labelled_hex("Nonce Even:", nonce_even)?;
            }
            ResponseBody::GetCapability { data } => {
                self.field_line(format_args!("Resp Size: {}", data.len()))?;
                self.labelled_hex("Resp:", data)?;
            }
            ResponseBody::Empty => self.field_line(format_args!("No args."))?,
            ResponseBody::Truncated => self.field_line(format_args!("Truncated body."))?,
            ResponseBody::Unsupported => {
                self.field_line(format_args!("Not supported yet..."))?;
            }
        }
        writeln!(self.out, "{}", SHORT_RULE)
    }

    /// Announce an operator-driven mode change.
    pub fn mode_switch(&mut self, from: Mode, to: Mode) -> fmt::Result {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "[*] Switching state from '{}' to '{}' mode.",
            from, to
        )?;
        writeln!(self.out)
    }

    fn ordinal_line(&mut self, kind: &str, ord: u32) -> fmt::Result {
        writeln!(
            self.out,
            "| {:>8}          |        | {} ({:#010X})",
            kind,
            ordinal::name_of(ord),
            ord
        )
    }

    fn field_line(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        write!(self.out, "{} ", CONTINUATION)?;
        self.out.write_fmt(args)?;
        writeln!(self.out)
    }

    fn labelled_hex(&mut self, label: &str, bytes: &[u8]) -> fmt::Result {
        writeln!(self.out, "{} {}", CONTINUATION, label)?;
        write!(self.out, "{}", CONTINUATION)?;
        self.hex_data(bytes)
    }

    /// Append hex bytes to the current row, wrapping onto continuation
    /// lines every [`HEX_PER_ROW`] bytes.
    fn hex_data(&mut self, bytes: &[u8]) -> fmt::Result {
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 && i % HEX_PER_ROW == 0 {
                writeln!(self.out)?;
                write!(self.out, "{}", CONTINUATION)?;
            }
            write!(self.out, " {:02X}", byte)?;
        }
        writeln!(self.out)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;
    use wedge_proto::{CommandBuffer, Ordinal, DIGEST_LEN};

    fn printer() -> PacketPrinter<String<4096>> {
        PacketPrinter::new(String::new())
    }

    #[test]
    fn test_banner_geometry() {
        let mut pp = printer();
        pp.banner().unwrap();
        let out = pp.into_inner();
        for line in out.lines() {
            assert_eq!(line.len(), 80, "uneven banner line: {:?}", line);
        }
    }

    #[test]
    fn test_bus_write_row() {
        let mut pp = printer();
        pp.bus_write(Direction::HostToInterposer, Register::Status, &[0x01, 0x20])
            .unwrap();
        assert_eq!(
            pp.into_inner().as_str(),
            "| Host > MITM       | STS    | 01 20\n"
        );
    }

    #[test]
    fn test_bus_read_row_has_blank_register() {
        let mut pp = printer();
        pp.bus_read(Direction::TpmToInterposer, &[0x90]).unwrap();
        assert_eq!(
            pp.into_inner().as_str(),
            "|        MITM < TPM |        | 90\n"
        );
    }

    #[test]
    fn test_hex_wraps_every_sixteen_bytes() {
        let mut data = [0u8; 20];
        for (i, b) in data.iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut pp = printer();
        pp.bus_read(Direction::InterposerToHost, &data).unwrap();
        let out = pp.into_inner();

        let mut lines = out.lines();
        let first = lines.next().unwrap();
        let second = lines.next().unwrap();
        assert!(first.ends_with(" 0E 0F"));
        assert!(second.starts_with(CONTINUATION));
        assert!(second.ends_with(" 10 11 12 13"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_request_extend_fields() {
        let mut cmd = CommandBuffer::new();
        cmd.build_pcr_extend(1, &[0xAB; DIGEST_LEN]).unwrap();

        let mut pp = printer();
        pp.request(cmd.as_slice()).unwrap();
        let out = pp.into_inner();

        assert!(out.contains("| PcrExtend (0x00000014)"));
        assert!(out.contains("| PCR Index: 1\n"));
        assert!(out.contains("| In Digest:\n"));
        assert!(out.contains(" AB AB AB AB AB AB AB AB AB AB AB AB AB AB AB AB\n"));
    }

    #[test]
    fn test_request_without_header_is_unknown() {
        let mut pp = printer();
        pp.request(&[0x00, 0xC1]).unwrap();
        let out = pp.into_inner();
        assert!(out.contains("| Unknown (0x00000000)"));
        assert!(out.contains("| Not supported yet...\n"));
    }

    #[test]
    fn test_response_header_read_renders_nothing() {
        let mut pp = printer();
        pp.response_body(Ordinal::PcrExtend.as_u32(), &[0u8; HEADER_LEN])
            .unwrap();
        assert!(pp.into_inner().is_empty());
    }

    #[test]
    fn test_response_extend_digest() {
        let mut pp = printer();
        pp.response_body(Ordinal::PcrExtend.as_u32(), &[0x5C; DIGEST_LEN])
            .unwrap();
        let out = pp.into_inner();
        assert!(out.contains("| RESPONSE          |        | PcrExtend (0x00000014)"));
        assert!(out.contains("| Out Digest:\n"));
        assert!(out.contains(" 5C 5C 5C 5C"));
    }

    #[test]
    fn test_response_get_random() {
        let mut body = [0u8; 12];
        body[0..4].copy_from_slice(&8u32.to_be_bytes());
        body[4..].fill(0x42);

        let mut pp = printer();
        pp.response_body(Ordinal::GetRandom.as_u32(), &body).unwrap();
        let out = pp.into_inner();
        assert!(out.contains("| Random Bytes Size: 8\n"));
        assert!(out.contains(" 42 42 42 42 42 42 42 42\n"));
    }

    #[test]
    fn test_mode_switch_announcement() {
        let mut pp = printer();
        pp.mode_switch(Mode::Passthrough, Mode::SpoofPcrExtend).unwrap();
        assert_eq!(
            pp.into_inner().as_str(),
            "\n[*] Switching state from 'Passthrough' to 'Spoof PCR Extend' mode.\n\n"
        );
    }
}
