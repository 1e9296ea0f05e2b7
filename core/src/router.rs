//! Bus register router: the top-level entry points the bus driver calls
//! once per completed transaction.
//!
//! The router classifies each transaction by direction and register, then
//! drives the FIFO mirror, the session model, and the tamper engine. All
//! state lives inside [`Interposer`]; the embedder constructs one per
//! interposed bus and threads it through its transaction callbacks.
//!
//! Handlers run to completion inside the driver's callback context, so no
//! locking is layered on top. Every path is bounded by the payload length.

use crate::bus::{Direction, Register, TpmSts};
use crate::fifo::CommandFifo;
use crate::session::SessionState;
use crate::tamper::{self, Mode};
use core::ops::Range;
use log::{debug, info, warn};
use wedge_proto::{ordinal, CommandHeader};

/// Status write payload length that can carry the go bit.
const GO_WRITE_LEN: usize = 2;

/// The complete interception engine for one interposed bus.
#[derive(Debug, Clone)]
pub struct Interposer {
    fifo: CommandFifo,
    session: SessionState,
    mode: Mode,
}

impl Interposer {
    /// A fresh engine in passthrough mode with nothing buffered.
    pub const fn new() -> Self {
        Self {
            fifo: CommandFifo::new(),
            session: SessionState::new(),
            mode: Mode::Passthrough,
        }
    }

    /// Handle a write-leg transaction.
    ///
    /// `payload` is the full transaction: register-address byte first, data
    /// bytes after it. On the host-to-interposer leg the data bytes may be
    /// rewritten in place before the embedder forwards them; the returned
    /// range (absolute offsets into the buffered command) reports what was
    /// overwritten.
    pub fn on_host_write(
        &mut self,
        direction: Direction,
        payload: &mut [u8],
    ) -> Option<Range<usize>> {
        let Some(&addr) = payload.first() else {
            warn!("write leg delivered with empty payload");
            return None;
        };
        let register = Register::from_wire(addr);

        let mut spoofed = None;
        match direction {
            Direction::HostToInterposer => match register {
                Register::Status => {
                    if payload.len() == GO_WRITE_LEN && payload[1] == TpmSts::TPM_GO.bits() {
                        self.execute_buffered();
                    }
                }
                Register::DataFifo => {
                    spoofed = self.buffer_fragment(&mut payload[1..]);
                }
                _ => {}
            },
            Direction::InterposerToTpm => {
                // Forwarded go: the buffered command is on the wire now and
                // the mirror can be dropped.
                if register == Register::Status
                    && payload.len() == GO_WRITE_LEN
                    && payload[1] == TpmSts::TPM_GO.bits()
                {
                    debug!("command forwarded, dropping {} mirrored bytes", self.fifo.len());
                    self.fifo.clear();
                }
            }
            Direction::TpmToInterposer | Direction::InterposerToHost => {
                debug!("read leg delivered to the write handler, ignoring");
                return None;
            }
        }

        self.session.record_register_write(register);
        spoofed
    }

    /// Handle a read-leg transaction.
    ///
    /// Read legs carry no register byte; their meaning comes from the most
    /// recent write. Only burst count reads change engine state. The last
    /// written register is deliberately left alone here.
    pub fn on_tpm_read(&mut self, direction: Direction, payload: &[u8]) {
        match direction {
            Direction::TpmToInterposer => {
                if self.session.last_register_written() == Register::BurstCount {
                    self.session.record_burst_count(payload);
                }
            }
            Direction::InterposerToHost => {}
            Direction::HostToInterposer | Direction::InterposerToTpm => {
                debug!("write leg delivered to the read handler, ignoring");
            }
        }
    }

    /// Size the next TPM read. See [`SessionState::predict_next_read_size`].
    pub fn next_read_size(&mut self) -> usize {
        self.session.predict_next_read_size()
    }

    /// Advance the interception mode to the next in the cycle.
    pub fn advance_mode(&mut self) -> Mode {
        let from = self.mode;
        self.mode = self.mode.next();
        info!("switching from '{}' to '{}' mode", from, self.mode);
        self.mode
    }

    /// The currently active interception mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The command bytes buffered so far, as sent by the host.
    ///
    /// Tampering rewrites only the forwarded copies; the mirror keeps what
    /// the host originally wrote.
    pub fn buffered_command(&self) -> &[u8] {
        self.fifo.as_slice()
    }

    /// Ordinal of the command most recently sent for execution.
    pub fn last_ordinal(&self) -> u32 {
        self.session.last_ordinal()
    }

    /// Read-only view of the session model.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// The host signalled go: decode the buffered command and note its
    /// ordinal so the response can be interpreted later.
    fn execute_buffered(&mut self) {
        match CommandHeader::parse(self.fifo.as_slice()) {
            Some(header) => {
                debug!(
                    "executing {} ({:#010x}), {} byte command",
                    ordinal::name_of(header.ordinal),
                    header.ordinal,
                    self.fifo.len()
                );
                self.session.record_executed_ordinal(header.ordinal);
            }
            None => {
                // Protocol violation by the host; relay it anyway and track
                // the response as an unknown command's.
                warn!(
                    "go signalled with only {} bytes buffered, no header to decode",
                    self.fifo.len()
                );
                self.session.record_executed_ordinal(0);
            }
        }
    }

    /// Mirror a data FIFO fragment and maybe rewrite it in place.
    fn buffer_fragment(&mut self, fragment: &mut [u8]) -> Option<Range<usize>> {
        if fragment.is_empty() {
            debug!("data FIFO write carried no payload bytes");
            return None;
        }
        // A refused append means the mirror no longer tracks the wire, so
        // tampering could corrupt unrelated bytes. Relay untouched instead.
        if self.fifo.append(fragment).is_err() {
            return None;
        }
        let spoofed = tamper::mutate(self.mode, self.fifo.as_slice(), fragment);
        if let Some(range) = &spoofed {
            info!(
                "spoofed bytes [{}..{}) of the in-flight command",
                range.start, range.end
            );
        }
        spoofed
    }
}

impl Default for Interposer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
