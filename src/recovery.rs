//! One send cycle's worth of outgoing records. The cycle has three steps which always run in
//!  this order:
//!
//! 1. Request all messages that are missing from the inbound sequence
//! 2. Answer the peer's re-send requests, either by replaying a message from the send history or
//!     by telling the peer that the message is gone for good
//! 3. Send all fresh messages, moving them to the history
//!
//! Requests go first so that they make it into the first packet of a batch: if there is a lot
//!  of fresh data and the batch is split across many packets, the peer should learn about its
//!  gaps as early as possible.

use std::collections::BTreeSet;
use tracing::trace;
use crate::message_id::MessageId;
use crate::message_store::MessageStore;
use crate::packet_assembler::PacketAssembler;
use crate::packet_buf::PacketBuf;
use crate::record::Record;
use crate::stats::SessionStats;
use crate::util::safe_converter::SafeCast;

/// Runs a send cycle and returns the packets it produced. The resend requests are consumed.
pub fn run_send_cycle(
    store: &mut MessageStore,
    resend_requests: &mut BTreeSet<MessageId>,
    tick: u64,
    packet_capacity: usize,
    stats: &mut SessionStats,
) -> Vec<PacketBuf> {
    let mut assembler = PacketAssembler::new(packet_capacity);

    request_missing(store, &mut assembler, stats);
    reply_to_requests(store, resend_requests, &mut assembler, stats);
    send_fresh(store, tick, &mut assembler, stats);

    let packets = assembler.finish();
    let num_packets: u64 = packets.len().safe_cast();
    stats.packets_sent += num_packets;
    packets
}

fn request_missing(store: &MessageStore, assembler: &mut PacketAssembler, stats: &mut SessionStats) {
    for id in store.missing_ids() {
        trace!("requesting missing message #{}", id);
        assembler.push(&Record::Request(id.to_wire()));
        stats.requests_sent += 1;
    }
}

/// Both the requested ids and the history are in ascending order, so this is a merge: the
///  history cursor only ever moves forward.
fn reply_to_requests(
    store: &MessageStore,
    resend_requests: &mut BTreeSet<MessageId>,
    assembler: &mut PacketAssembler,
    stats: &mut SessionStats,
) {
    let mut history = store.history().peekable();

    for &requested in resend_requests.iter() {
        while history.next_if(|m| m.id < requested).is_some() {}

        match history.peek() {
            Some(message) if message.id == requested => {
                trace!("re-sending message #{} on request", requested);
                assembler.push(&Record::Data {
                    id: requested.to_wire(),
                    payload: &message.data,
                });
                stats.messages_resent += 1;
            }
            _ => {
                trace!("requested message #{} is not in the send history - replying MISSING", requested);
                assembler.push(&Record::Missing(requested.to_wire()));
                stats.missing_sent += 1;
            }
        }
    }

    resend_requests.clear();
}

fn send_fresh(store: &mut MessageStore, tick: u64, assembler: &mut PacketAssembler, stats: &mut SessionStats) {
    for message in store.move_to_history(tick) {
        assembler.push(&Record::Data {
            id: message.id.to_wire(),
            payload: &message.data,
        });
        stats.messages_sent += 1;
    }
}
