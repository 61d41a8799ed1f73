
/// Counters describing a session's activity since it was created. All counters only ever increase.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SessionStats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_delivered: u64,
    /// messages the peer reported as missing, which were skipped in delivery
    pub messages_lost: u64,

    /// re-send requests this side sent for gaps in the inbound sequence
    pub requests_sent: u64,
    /// re-send requests received from the peer
    pub requests_received: u64,
    pub messages_resent: u64,
    /// MISSING records sent in reply to requests for messages that are not in the history
    pub missing_sent: u64,
    pub missing_received: u64,

    pub messages_expired: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub corrupt_packets: u64,
}
