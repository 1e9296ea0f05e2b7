//! # Wedge Core - Bus Interception Engine
//!
//! This crate implements the stateful engine that sits between a host and a
//! discrete TPM on a TIS-over-I2C bus, observing every transaction and
//! optionally rewriting command payloads in flight.
//!
//! ## Design Philosophy
//!
//! The engine is designed to be:
//! - **Transparent**: In passthrough mode every byte is relayed untouched
//! - **Stateful**: Register writes, burst counts, and command ordinals are
//!   tracked across transactions so fragmented traffic stays coherent
//! - **Hostless**: No allocation, no platform services; the embedding bus
//!   driver owns the buffers and the timing
//!
//! ## Bus Position
//!
//! ```text
//!            write legs ->                      -> write legs
//!   +------+              +--------------+              +-----+
//!   | Host | ===========> | Wedge engine | ===========> | TPM |
//!   |      | <=========== |  (this crate)| <=========== |     |
//!   +------+              +--------------+              +-----+
//!            <- read legs                      <- read legs
//! ```
//!
//! Each of the four bus legs is reported to the [`Interposer`] as it happens;
//! the engine updates its session model and, on host-to-interposer FIFO
//! writes, may tamper with the outgoing fragment before the embedder relays
//! it to the TPM.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod fifo;
pub mod router;
pub mod session;
pub mod tamper;


pub use bus::{Direction, Register, TpmSts};
pub use fifo::{CommandFifo, FifoError, FIFO_CAPACITY};
pub use router::Interposer;
pub use session::{ReadPhase, SessionState};
pub use tamper::Mode;
