use crate::message_id::MessageId;

/// The payload of an inbound message. A message is 'unknown' if its id was learned indirectly
///  (e.g. through a MISSING notice from the peer) but its data has not arrived.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Payload {
    Known(Vec<u8>),
    Unknown,
}

impl Payload {
    pub fn is_known(&self) -> bool {
        matches!(self, Payload::Known(_))
    }
}

/// A message that was sent or is waiting to be sent, or a received message on its way to the
///  application (with a tick of zero).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Message {
    pub id: MessageId,
    /// the tick at which the message was (last) handed to the send path - this is what history
    ///  expiry is based on
    pub tick: u64,
    pub data: Vec<u8>,
}
