use anyhow::bail;
use crate::record::MAX_CONTROL_RECORD_LEN;

pub const DEFAULT_PACKET_CAPACITY: usize = 512;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RudpConfig {
    /// The number of ticks between two send cycles. Each send cycle produces at least one packet
    ///  (an IGNORE keep-alive if there is nothing else to send), so this is also the keep-alive
    ///  interval. Zero means that every call to `update` runs a send cycle.
    ///
    /// This is also the rate at which gaps are re-requested from the peer, so it should be in
    ///  the order of the round-trip time.
    pub send_interval: u64,

    /// The number of ticks a sent message is retained in the send history for answering
    ///  re-send requests. Messages are actually expired in a cycle with this period, so a message
    ///  can stay in the history for up to twice this time.
    ///
    /// Requests for messages that expired are answered with MISSING, which means they are lost
    ///  for good. This should therefore be significantly bigger than the time it takes the peer
    ///  to detect and report a gap.
    pub expire_interval: u64,

    /// The maximum size of an outgoing packet. This must fit into a single datagram of the
    ///  underlying transport. The only packets exceeding this are those carrying a single data
    ///  record that does not fit into a packet of this size on its own.
    pub packet_capacity: usize,
}

impl Default for RudpConfig {
    fn default() -> Self {
        RudpConfig {
            send_interval: 1,
            expire_interval: 100,
            packet_capacity: DEFAULT_PACKET_CAPACITY,
        }
    }
}

impl RudpConfig {
    pub fn new(send_interval: u64, expire_interval: u64) -> RudpConfig {
        RudpConfig {
            send_interval,
            expire_interval,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.packet_capacity < MAX_CONTROL_RECORD_LEN {
            bail!("packet capacity {} is too small - it must hold at least a single control record of {} bytes", self.packet_capacity, MAX_CONTROL_RECORD_LEN);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default(RudpConfig::default(), true)]
    #[case::new(RudpConfig::new(5, 50), true)]
    #[case::no_expiry_delay(RudpConfig::new(1, 0), true)]
    #[case::zero_send_interval(RudpConfig::new(0, 50), true)]
    #[case::empty_packet(RudpConfig { packet_capacity: 0, ..Default::default() }, false)]
    #[case::minimal_packet(RudpConfig { packet_capacity: 3, ..Default::default() }, true)]
    #[case::packet_too_small(RudpConfig { packet_capacity: 2, ..Default::default() }, false)]
    fn test_validate(#[case] config: RudpConfig, #[case] expected_valid: bool) {
        assert_eq!(config.validate().is_ok(), expected_valid);
    }

    #[test]
    fn test_new_uses_default_packet_capacity() {
        let config = RudpConfig::new(2, 20);
        assert_eq!(config.send_interval, 2);
        assert_eq!(config.expire_interval, 20);
        assert_eq!(config.packet_capacity, 512);
    }
}
