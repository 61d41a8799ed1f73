use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use anyhow::bail;
use tracing::{debug, trace, warn};
use crate::config::RudpConfig;
use crate::message::Payload;
use crate::message_id::MessageId;
use crate::message_store::MessageStore;
use crate::packet_buf::PacketBuf;
use crate::record::{Record, RecordReader, MAX_PAYLOAD_LEN};
use crate::recovery::run_send_cycle;
use crate::stats::SessionStats;
use crate::util::safe_converter::SafeCast;

/// Reported by [RudpSession::receive] after an incoming packet could not be parsed, or after the
///  peer signalled that it lost track of the stream. The rest of the offending packet was
///  discarded, so messages may be delayed (and re-requested) or lost.
///
/// This is also reported in place of a message that the peer can not re-send because it expired
///  from the peer's send history.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CorruptStream;

impl Display for CorruptStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "corrupt packet in the incoming stream")
    }
}

impl std::error::Error for CorruptStream {}

/// One end of a reliable connection, driven entirely by the application: the application
///  calls [RudpSession::update] with each packet it receives from the peer (or an empty slice
///  if there is none) and puts the returned packets on the wire. The session never does I/O
///  and has no notion of wall-clock time; time is measured in ticks that the application passes
///  to `update`.
pub struct RudpSession {
    config: RudpConfig,
    store: MessageStore,

    /// ids (in the send direction) that the peer asked to be re-sent since the last send cycle
    resend_requests: BTreeSet<MessageId>,
    corrupt: bool,

    current_tick: u64,
    last_send_tick: u64,
    last_expire_tick: u64,

    outgoing: Vec<PacketBuf>,
    stats: SessionStats,
}

impl RudpSession {
    /// Creates a session with the default packet capacity.
    pub fn new(send_interval: u64, expire_interval: u64) -> RudpSession {
        Self::create(RudpConfig::new(send_interval, expire_interval))
    }

    pub fn with_config(config: RudpConfig) -> anyhow::Result<RudpSession> {
        config.validate()?;
        Ok(Self::create(config))
    }

    fn create(config: RudpConfig) -> RudpSession {
        debug!("creating session: {:?}", config);
        RudpSession {
            config,
            store: MessageStore::new(),
            resend_requests: BTreeSet::new(),
            corrupt: false,
            current_tick: 0,
            last_send_tick: 0,
            last_expire_tick: 0,
            outgoing: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Registers a message for sending. It goes on the wire in the next send cycle.
    pub fn send(&mut self, payload: &[u8]) -> anyhow::Result<MessageId> {
        if payload.len() > MAX_PAYLOAD_LEN {
            bail!("message of {} bytes exceeds the maximum message size of {} bytes", payload.len(), MAX_PAYLOAD_LEN);
        }
        Ok(self.store.enqueue_outbound(payload.to_vec(), self.current_tick))
    }

    /// Returns the next message in send order if it was received, or `None` if there is none
    ///  (yet).
    ///
    /// If a corrupt packet was received since the previous call, this is reported once, and
    ///  the following call returns messages again. The same applies if the next message in
    ///  sequence was reported as missing by the peer: it is skipped, and the stream continues
    ///  with the message after it.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>, CorruptStream> {
        if std::mem::take(&mut self.corrupt) {
            return Err(CorruptStream);
        }

        if let Some(id) = self.store.skip_lost() {
            warn!("message #{} is not available from the peer any more - skipping it", id);
            self.stats.messages_lost += 1;
            return Err(CorruptStream);
        }

        Ok(self.store.next_deliverable()
            .map(|message| {
                self.stats.messages_delivered += 1;
                message.data
            }))
    }

    /// Advances the session's clock and processes a packet from the peer (which may be empty).
    ///
    /// Returns the packets to send to the peer if a send cycle was due, `None` otherwise. The
    ///  returned packets are only valid until the next call to `update`.
    pub fn update(&mut self, incoming_packet: &[u8], elapsed_ticks: u64) -> Option<&[PacketBuf]> {
        self.current_tick += elapsed_ticks;
        self.outgoing.clear();

        self.on_packet(incoming_packet);

        if self.current_tick - self.last_expire_tick >= self.config.expire_interval {
            let num_expired: u64 = self.store.expire_history(self.last_expire_tick).safe_cast();
            self.stats.messages_expired += num_expired;
            self.last_expire_tick = self.current_tick;
        }

        if self.current_tick - self.last_send_tick < self.config.send_interval {
            return None;
        }

        trace!("send cycle at tick {}", self.current_tick);
        self.outgoing = run_send_cycle(
            &mut self.store,
            &mut self.resend_requests,
            self.current_tick,
            self.config.packet_capacity,
            &mut self.stats,
        );
        self.last_send_tick = self.current_tick;
        Some(self.outgoing.as_slice())
    }

    /// Releases all buffered messages and pending packets.
    pub fn close(&mut self) {
        debug!("closing session at tick {}", self.current_tick);
        self.store.clear();
        self.resend_requests.clear();
        self.outgoing.clear();
    }

    fn on_packet(&mut self, packet: &[u8]) {
        if packet.is_empty() {
            return;
        }
        self.stats.packets_received += 1;

        for record in RecordReader::new(packet) {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("corrupt packet: {} - discarding the rest of the packet", e);
                    self.on_corrupt();
                    return;
                }
            };

            match record {
                Record::Ignore => {
                    trace!("received IGNORE");
                }
                Record::Corrupt => {
                    warn!("peer reported a corrupt stream - discarding the rest of the packet");
                    self.on_corrupt();
                    return;
                }
                Record::Request(wire_id) => {
                    self.stats.requests_received += 1;
                    match self.store.extend_send_id(wire_id) {
                        Some(id) => {
                            trace!("peer requested message #{}", id);
                            self.resend_requests.insert(id);
                        }
                        None => debug!("peer requested wire id {} which was never sent - ignoring", wire_id),
                    }
                }
                Record::Missing(wire_id) => {
                    self.stats.missing_received += 1;
                    match self.store.window().extend(wire_id) {
                        Some(id) => {
                            debug!("peer reported message #{} as missing", id);
                            self.store.mark_missing(id);
                        }
                        None => debug!("MISSING for wire id {} before the start of the stream - ignoring", wire_id),
                    }
                }
                Record::Data { id: wire_id, payload } => {
                    self.stats.messages_received += 1;
                    match self.store.window().extend(wire_id) {
                        Some(id) => self.store.insert_inbound(id, Payload::Known(payload.to_vec())),
                        None => debug!("data for wire id {} before the start of the stream - ignoring", wire_id),
                    }
                }
            }
        }
    }

    fn on_corrupt(&mut self) {
        self.corrupt = true;
        self.stats.corrupt_packets += 1;
    }
}
