//! # Wedge Demo - Host-Side Interposer Walkthrough
//!
//! Drives the interception engine with the same TIS transactions a host
//! driver puts on the bus, against a small mock TPM, and renders the packet
//! tables an operator would watch on the serial console.
//!
//! The walkthrough runs one PCR-Extend exchange twice: first in passthrough,
//! then with the digest spoofed in transit. On the second pass the host-side
//! rows and the decoded request still show the original digest while the
//! forwarded bytes and the TPM's resulting PCR value diverge.
//!
//! ```text
//! RUST_LOG=debug cargo run -p wedge-demo
//! ```

use std::fmt;
use std::io::{self, Write as _};

use log::debug;
use wedge_console::PacketPrinter;
use wedge_core::{Direction, Interposer, Register, TpmSts};
use wedge_proto::{
    parse_command, tag, CommandBuffer, RequestBody, ResponseHeader, DIGEST_LEN, HEADER_LEN,
};

// TIS register addresses as a host driver writes them.
const REG_STATUS: u8 = 0x01;
const REG_BURST: u8 = 0x02;
const REG_FIFO: u8 = 0x05;

// =============================================================================
// Mock TPM
// =============================================================================

/// Stand-in for the downstream TPM chip.
///
/// Honours just enough of the TIS FIFO protocol to run the walkthrough:
/// command bytes accumulate until the go bit executes them, and the response
/// reads back through the FIFO in whatever chunks the host asks for. PCR
/// state folds extend digests with XOR instead of SHA-1; the bus traffic is
/// what matters here, not the hash.
struct MockTpm {
    pcr: [u8; DIGEST_LEN],
    command: Vec<u8>,
    response: Vec<u8>,
    cursor: usize,
    register: Register,
}

impl MockTpm {
    fn new() -> Self {
        Self {
            pcr: [0; DIGEST_LEN],
            command: Vec::new(),
            response: Vec::new(),
            cursor: 0,
            register: Register::None,
        }
    }

    /// Accept a forwarded write transaction.
    fn handle_write(&mut self, payload: &[u8]) {
        let Some(&first) = payload.first() else {
            return;
        };
        self.register = Register::from_wire(first);
        match self.register {
            Register::DataFifo => self.command.extend_from_slice(&payload[1..]),
            Register::Status if payload.len() == 2 && payload[1] == TpmSts::TPM_GO.bits() => {
                self.execute();
            }
            _ => {}
        }
    }

    /// Produce `len` bytes for a read of the last addressed register.
    fn handle_read(&mut self, len: usize) -> Vec<u8> {
        match self.register {
            Register::Status => vec![(TpmSts::STS_VALID | TpmSts::DATA_AVAIL).bits()],
            Register::BurstCount => {
                let avail = (self.response.len() - self.cursor) as u32;
                // Least significant byte first on the wire.
                vec![avail as u8, (avail >> 8) as u8, (avail >> 16) as u8]
            }
            Register::DataFifo => {
                let end = (self.cursor + len).min(self.response.len());
                let chunk = self.response[self.cursor..end].to_vec();
                self.cursor = end;
                chunk
            }
            _ => vec![0; len],
        }
    }

    fn execute(&mut self) {
        if let Some(parsed) = parse_command(&self.command) {
            if let RequestBody::PcrExtend { digest, .. } = parsed.body {
                // XOR fold in place of SHA-1; enough to make tampering visible.
                for (slot, byte) in self.pcr.iter_mut().zip(digest) {
                    *slot ^= byte;
                }
            }
        }
        debug!(
            "mock TPM executed a {} byte command; PCR bank now {:02x?}",
            self.command.len(),
            self.pcr
        );

        let header = ResponseHeader {
            tag: tag::RSP_COMMAND,
            len: (HEADER_LEN + DIGEST_LEN) as u32,
            code: 0,
        };
        self.response.clear();
        self.response.extend_from_slice(&header.encode());
        self.response.extend_from_slice(&self.pcr);
        self.command.clear();
        self.cursor = 0;
    }
}

// =============================================================================
// Console Sink
// =============================================================================

/// Points the table renderer at process stdout.
struct ConsoleSink;

impl fmt::Write for ConsoleSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        io::stdout().write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

// =============================================================================
// Bus Replay
// =============================================================================

/// Replay one write transaction across both bus legs.
///
/// The engine sees the host leg first and may rewrite the fragment in place;
/// the forwarded leg then carries whatever survived. The printed rows keep
/// that split: the host row shows the bytes as written, the TPM row shows
/// the bytes as delivered.
fn write_leg<W: fmt::Write>(
    wedge: &mut Interposer,
    printer: &mut PacketPrinter<W>,
    tpm: &mut MockTpm,
    payload: &[u8],
) -> fmt::Result {
    let register = Register::from_wire(payload[0]);

    let mut up = payload.to_vec();
    wedge.on_host_write(Direction::HostToInterposer, &mut up);
    printer.bus_write(Direction::HostToInterposer, register, payload)?;

    let mut down = up.clone();
    wedge.on_host_write(Direction::InterposerToTpm, &mut down);
    tpm.handle_write(&down);
    printer.bus_write(Direction::InterposerToTpm, register, &down)
}

/// Replay one read transaction: ask the engine how many bytes the host
/// wants, pull them from the TPM, and relay them upstream.
fn read_leg<W: fmt::Write>(
    wedge: &mut Interposer,
    printer: &mut PacketPrinter<W>,
    tpm: &mut MockTpm,
) -> fmt::Result {
    let wants = wedge.next_read_size();
    let data = tpm.handle_read(wants);

    wedge.on_tpm_read(Direction::TpmToInterposer, &data);
    printer.bus_read(Direction::TpmToInterposer, &data)?;

    if wedge.session().last_register_written() == Register::DataFifo {
        printer.response_body(wedge.last_ordinal(), &data)?;
    }

    wedge.on_tpm_read(Direction::InterposerToHost, &data);
    printer.bus_read(Direction::InterposerToHost, &data)
}

/// Drive one complete PCR-Extend exchange over the interposed bus.
fn run_extend<W: fmt::Write>(
    wedge: &mut Interposer,
    printer: &mut PacketPrinter<W>,
    tpm: &mut MockTpm,
    pcr_index: u32,
    digest: &[u8; DIGEST_LEN],
) -> fmt::Result {
    let mut cmd = CommandBuffer::new();
    cmd.build_pcr_extend(pcr_index, digest)
        .expect("extend fits the builder");
    let wire = cmd.as_slice();

    // The host pushes the command through the FIFO in two bursts, header
    // first.
    let mut fragment = vec![REG_FIFO];
    fragment.extend_from_slice(&wire[..HEADER_LEN]);
    write_leg(wedge, printer, tpm, &fragment)?;

    let mut fragment = vec![REG_FIFO];
    fragment.extend_from_slice(&wire[HEADER_LEN..]);
    write_leg(wedge, printer, tpm, &fragment)?;

    // Go bit. The assembled command prints here because the forwarded go
    // clears the engine's mirror of it.
    let go = [REG_STATUS, TpmSts::TPM_GO.bits()];
    let mut up = go.to_vec();
    wedge.on_host_write(Direction::HostToInterposer, &mut up);
    printer.bus_write(Direction::HostToInterposer, Register::Status, &go)?;
    printer.request(wedge.buffered_command())?;

    let mut down = up.clone();
    wedge.on_host_write(Direction::InterposerToTpm, &mut down);
    tpm.handle_write(&down);
    printer.bus_write(Direction::InterposerToTpm, Register::Status, &down)?;

    // Poll status, then drain the response: header, burst count, body.
    write_leg(wedge, printer, tpm, &[REG_STATUS])?;
    read_leg(wedge, printer, tpm)?;

    write_leg(wedge, printer, tpm, &[REG_FIFO])?;
    read_leg(wedge, printer, tpm)?;

    write_leg(wedge, printer, tpm, &[REG_BURST])?;
    read_leg(wedge, printer, tpm)?;

    write_leg(wedge, printer, tpm, &[REG_FIFO])?;
    read_leg(wedge, printer, tpm)?;

    printer.row_sep()
}

// =============================================================================
// Entry Point
// =============================================================================

fn main() -> fmt::Result {
    env_logger::init();

    let mut wedge = Interposer::new();
    let mut tpm = MockTpm::new();
    let mut printer = PacketPrinter::new(ConsoleSink);

    // The measurement a host would extend into PCR 1.
    let mut digest = [0u8; DIGEST_LEN];
    for (i, byte) in digest.iter_mut().enumerate() {
        *byte = i as u8;
    }

    printer.banner()?;
    run_extend(&mut wedge, &mut printer, &mut tpm, 1, &digest)?;

    // Same traffic again with the extend spoof armed. The forwarded digest
    // now reads 0xAA while the host-side rows keep the original bytes.
    let from = wedge.mode();
    let to = wedge.advance_mode();
    printer.mode_switch(from, to)?;

    run_extend(&mut wedge, &mut printer, &mut tpm, 1, &digest)?;

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
