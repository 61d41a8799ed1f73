//! A reliable-delivery layer on top of an unreliable, unordered datagram transport like UDP. It
//!  guarantees gap-free, in-order delivery of application messages despite packet loss.
//!
//! ## Design goals
//!
//! * The abstraction is sending / receiving *messages*, i.e. defined-length chunks of data as
//!   opposed to streams of bytes
//! * The engine is transport agnostic and does no I/O at all: the application feeds packets it
//!   received into the engine and puts the engine's packets on the wire
//!   * there is no notion of wall-clock time either - the application passes logical 'ticks'
//!      on each call to `update`
//! * Small messages are combined into a single packet, delaying the send operation for a
//!   configurable number of ticks
//! * Messages are delivered to the application strictly in the order they were sent. The only
//!   gaps are messages the sender reports as lost, and each of those is reported as an error
//! * There are no per-packet acks: the receiver requests the messages it is missing, and the
//!   sender replays them from a send history
//!   * messages are retained in the send history for a configurable number of ticks. A request
//!      for a message that expired is answered with a MISSING notice, and the receiver skips
//!      the message, reporting an error in its place
//!   * gaps are only detected when a later message arrives, i.e. the loss of the last message
//!      in a burst goes undetected until the sender sends the next message
//! * explicitly *not* in scope: flow control / congestion control, encryption, connection
//!   handshake
//!
//! ## Packet format
//!
//! A packet is a sequence of records without any packet-level header. Each packet's size is
//!  bounded by the configured packet capacity (512 bytes by default), except for a packet carrying
//!  a single data record that is too big on its own. See [record] for the details.
//!
//! ## Sequence numbers
//!
//! Messages are numbered sequentially per direction, starting with 0. The engine uses 64-bit ids
//!  internally but only sends the lowest 16 bits, reconstructing the rest on the receiving side
//!  (see [sequence_window]).
//!
//! ## Send cycle
//!
//! Every `send_interval` ticks, `update` produces a batch of packets containing
//! * a REQUEST for every message id that is missing in the inbound sequence
//! * replies to the peer's REQUESTs since the previous cycle, either the DATA from the send
//!   history or a MISSING notice
//! * DATA for all messages that were registered for sending since the previous cycle
//!
//! If there is nothing to send, the batch consists of a single IGNORE record which serves as a
//!  keep-alive.

pub mod config;
pub mod message;
pub mod message_id;
pub mod message_store;
pub mod packet_assembler;
pub mod packet_buf;
pub mod record;
pub mod recovery;
pub mod sequence_window;
pub mod session;
pub mod stats;
pub mod util;

pub use config::RudpConfig;
pub use message_id::MessageId;
pub use packet_buf::PacketBuf;
pub use session::{CorruptStream, RudpSession};
pub use stats::SessionStats;


#[cfg(test)]
mod test {
    use tracing::Level;

    #[ctor::ctor]
    fn init_test_logging() {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .try_init()
            .ok();
    }
}
