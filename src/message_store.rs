use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, trace};
use crate::message::{Message, Payload};
use crate::message_id::MessageId;
use crate::sequence_window::{extend_wire_id, SequenceWindow};

/// All message-level state of a session: the send side's outbound queue and history, and the
///  receive side's buffer and window.
///
/// NB: The send and receive directions have independent id spaces. Ids in the inbound buffer
///      and the window are assigned by the peer, ids in the outbound queue and history are
///      assigned here.
#[derive(Debug, Default)]
pub struct MessageStore {
    next_send_id: MessageId,

    /// messages registered for sending, in send order, that were not put on the wire yet
    outbound: VecDeque<Message>,

    /// Messages that were sent, in ascending id order (which is also ascending tick order). They
    ///  are retained for re-sending on request until they expire.
    history: VecDeque<Message>,

    /// Received messages that were not dispatched yet, and placeholders for messages that are
    ///  known to exist. All keys are at or above the window's low-water mark.
    inbound: BTreeMap<MessageId, Payload>,
    window: SequenceWindow,
}

impl MessageStore {
    pub fn new() -> MessageStore {
        MessageStore::default()
    }

    pub fn window(&self) -> &SequenceWindow {
        &self.window
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    pub fn history(&self) -> impl Iterator<Item = &Message> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn inbound(&self) -> impl Iterator<Item = (&MessageId, &Payload)> {
        self.inbound.iter()
    }

    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Extends a wire id that refers to the send direction, i.e. an id that was assigned by this
    ///  store. The reference point is the most recently assigned id.
    pub fn extend_send_id(&self, wire_id: u16) -> Option<MessageId> {
        let reference = self.next_send_id.checked_minus(1)
            .unwrap_or(MessageId::ZERO);
        extend_wire_id(reference, wire_id)
    }

    pub fn enqueue_outbound(&mut self, data: Vec<u8>, tick: u64) -> MessageId {
        let id = self.next_send_id;
        self.next_send_id = id.next();

        trace!("enqueueing message #{} with length {}", id, data.len());
        self.outbound.push_back(Message { id, tick, data });
        id
    }

    /// Moves all outbound messages to the history, stamping them with the send tick, and returns
    ///  the moved messages in send order.
    pub fn move_to_history(&mut self, tick: u64) -> impl Iterator<Item = &Message> {
        let num_moved = self.outbound.len();
        while let Some(mut message) = self.outbound.pop_front() {
            message.tick = tick;
            self.history.push_back(message);
        }
        self.history.range(self.history.len() - num_moved..)
    }

    pub fn insert_inbound(&mut self, id: MessageId, payload: Payload) {
        if self.window.is_below_window(id) {
            debug!("received message #{} which is below the window's low-water mark #{} - ignoring", id, self.window.recv_id_min());
            return;
        }

        match self.inbound.entry(id) {
            Entry::Vacant(e) => {
                trace!("inserting message #{} (known: {})", id, payload.is_known());
                e.insert(payload);
            }
            Entry::Occupied(mut e) => {
                match (e.get(), &payload) {
                    (Payload::Unknown, Payload::Known(_)) => {
                        trace!("replacing placeholder #{} with actual message", id);
                        e.insert(payload);
                    }
                    _ => {
                        debug!("message #{} is already in the receive buffer - ignoring", id);
                    }
                }
            }
        }

        self.window.observe(id);
    }

    pub fn mark_missing(&mut self, id: MessageId) {
        self.insert_inbound(id, Payload::Unknown);
    }

    /// Removes and returns the message at the window's low-water mark if it was received.
    ///  Returns `None` if that message is missing or only known as a placeholder.
    pub fn next_deliverable(&mut self) -> Option<Message> {
        let head = self.inbound.first_entry()?;
        if *head.key() != self.window.recv_id_min() || !head.get().is_known() {
            return None;
        }

        let id = *head.key();
        let data = match head.remove() {
            Payload::Known(data) => data,
            Payload::Unknown => unreachable!("checked above"),
        };
        self.window.advance();

        trace!("delivering message #{} with length {}", id, data.len());
        Some(Message { id, tick: 0, data })
    }

    /// Removes the placeholder at the window's low-water mark, i.e. a message the peer reported
    ///  as no longer available, and moves the window past it. Returns the skipped id, or `None`
    ///  if there is no placeholder at the low-water mark.
    pub fn skip_lost(&mut self) -> Option<MessageId> {
        let head = self.inbound.first_entry()?;
        if *head.key() != self.window.recv_id_min() || head.get().is_known() {
            return None;
        }

        let (id, _) = head.remove_entry();
        self.window.advance();

        debug!("skipping message #{} which the peer reported as missing", id);
        Some(id)
    }

    /// Ids between the low-water mark and the highest buffered id that are not in the buffer.
    ///  Placeholders are not included: the peer already reported them as missing, so there is
    ///  no point in requesting them again.
    pub fn missing_ids(&self) -> Vec<MessageId> {
        let mut result = Vec::new();
        let mut expected = self.window.recv_id_min();
        for &id in self.inbound.keys() {
            result.extend(expected.to(id));
            expected = id.next();
        }
        result
    }

    /// Removes all history entries sent before `before_tick`, returning the number of removed
    ///  entries.
    pub fn expire_history(&mut self, before_tick: u64) -> usize {
        let mut num_expired = 0;
        while let Some(oldest) = self.history.front() {
            if oldest.tick >= before_tick {
                break;
            }
            debug!("message #{} from tick {} expired from the send history", oldest.id, oldest.tick);
            self.history.pop_front();
            num_expired += 1;
        }
        num_expired
    }

    /// Releases all buffered messages. Id counters and the window are retained, so a peer that
    ///  keeps talking is not confused by id reuse.
    pub fn clear(&mut self) {
        self.outbound.clear();
        self.history.clear();
        self.inbound.clear();
    }
}
