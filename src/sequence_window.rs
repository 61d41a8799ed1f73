//! Mapping between 16-bit wire ids and extended [MessageId]s, and the receive window's
//!  watermarks.
//!
//! Only the low 16 bits of a message id are sent. The receiver reconstructs the high bits from a
//!  reference id it already knows, picking the candidate closest to the reference. This works as
//!  long as the sender never has more than 32768 messages in flight that the receiver has not
//!  seen, which is far beyond what the send interval and history expiry allow in practice.

use crate::message_id::MessageId;

const WIRE_ID_PERIOD: u64 = 0x1_0000;
const HALF_WIRE_ID_PERIOD: u64 = WIRE_ID_PERIOD / 2;

/// Returns the unique id in `[reference - 32768, reference + 32768)` whose low 16 bits are
///  `wire_id`, or `None` if that id would be negative, i.e. refer to a point before the start of
///  the stream.
pub fn extend_wire_id(reference: MessageId, wire_id: u16) -> Option<MessageId> {
    let reference = reference.to_raw();
    let candidate = (reference & !(WIRE_ID_PERIOD - 1)) | wire_id as u64;

    if candidate + HALF_WIRE_ID_PERIOD < reference {
        Some(MessageId::from_raw(candidate + WIRE_ID_PERIOD))
    }
    else if candidate >= reference + HALF_WIRE_ID_PERIOD {
        candidate.checked_sub(WIRE_ID_PERIOD).map(MessageId::from_raw)
    }
    else {
        Some(MessageId::from_raw(candidate))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct SequenceWindow {
    /// the id of the next message the application will consume. Every id below this was
    ///  delivered already.
    recv_id_min: MessageId,
    /// the highest id that was observed on the wire, or zero if nothing was observed yet
    recv_id_max: MessageId,
}

impl SequenceWindow {
    pub fn new() -> SequenceWindow {
        SequenceWindow::default()
    }

    pub fn recv_id_min(&self) -> MessageId {
        self.recv_id_min
    }

    pub fn recv_id_max(&self) -> MessageId {
        self.recv_id_max
    }

    /// extend a wire id that refers to the receive direction. This does not modify the window.
    pub fn extend(&self, wire_id: u16) -> Option<MessageId> {
        extend_wire_id(self.recv_id_max, wire_id)
    }

    pub fn is_below_window(&self, id: MessageId) -> bool {
        id < self.recv_id_min
    }

    /// raise the high-water mark if `id` is above it
    pub fn observe(&mut self, id: MessageId) {
        if id > self.recv_id_max {
            self.recv_id_max = id;
        }
    }

    /// called after the message at the low-water mark was handed to the application
    pub fn advance(&mut self) {
        self.recv_id_min = self.recv_id_min.next();
        debug_assert!(self.recv_id_min <= self.recv_id_max.next());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::initial(0, 0, Some(0))]
    #[case::initial_next(0, 1, Some(1))]
    #[case::initial_upper_edge(0, 0x7fff, Some(0x7fff))]
    #[case::initial_before_start(0, 0x8000, None)]
    #[case::initial_before_start_2(0, 0xffff, None)]
    #[case::same(1000, 1000, Some(1000))]
    #[case::slightly_behind(1000, 990, Some(990))]
    #[case::slightly_ahead(1000, 1010, Some(1010))]
    #[case::wrap_forward(0xfff0, 0x0005, Some(0x1_0005))]
    #[case::wrap_backward(0x1_0005, 0xfff0, Some(0xfff0))]
    #[case::lower_edge(0x2_8000, 0x0000, Some(0x2_0000))]
    #[case::upper_edge(0x2_8000, 0xffff, Some(0x2_ffff))]
    #[case::lower_edge_below(0x2_4000, 0xc000, Some(0x1_c000))]
    #[case::upper_edge_above(0x2_4000, 0xbfff, Some(0x2_bfff))]
    #[case::high_reference(0xabcd_1234_5678, 0x5677, Some(0xabcd_1234_5677))]
    fn test_extend_wire_id(#[case] reference: u64, #[case] wire_id: u16, #[case] expected: Option<u64>) {
        let actual = extend_wire_id(MessageId::from_raw(reference), wire_id);
        assert_eq!(actual, expected.map(MessageId::from_raw));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::small(17)]
    #[case::below_half_period(0x7fff)]
    #[case::half_period(0x8000)]
    #[case::period(0x1_0000)]
    #[case::odd(0x3_7a1c)]
    #[case::big(0x1234_5678_9abc)]
    fn test_extend_wire_id_is_nearest_representative(#[case] reference: u64) {
        let lower = reference.saturating_sub(HALF_WIRE_ID_PERIOD);
        let upper = reference + HALF_WIRE_ID_PERIOD;

        for wire_id in 0..=u16::MAX {
            match extend_wire_id(MessageId::from_raw(reference), wire_id) {
                Some(id) => {
                    let id = id.to_raw();
                    assert_eq!(id & 0xffff, wire_id as u64);
                    assert!(id >= lower && id < upper, "{} outside [{}, {})", id, lower, upper);
                }
                None => {
                    // only ids 'before zero' are unrepresentable
                    assert!(reference < HALF_WIRE_ID_PERIOD);
                    assert!((wire_id as u64) >= reference + HALF_WIRE_ID_PERIOD);
                }
            }
        }
    }

    #[test]
    fn test_window_watermarks() {
        let mut window = SequenceWindow::new();
        assert_eq!(window.recv_id_min(), MessageId::ZERO);
        assert_eq!(window.recv_id_max(), MessageId::ZERO);

        window.observe(MessageId::from_raw(5));
        window.observe(MessageId::from_raw(3));
        assert_eq!(window.recv_id_max(), MessageId::from_raw(5));

        window.advance();
        assert_eq!(window.recv_id_min(), MessageId::from_raw(1));
        assert!(window.is_below_window(MessageId::ZERO));
        assert!(!window.is_below_window(MessageId::from_raw(1)));

        // extension is relative to the high-water mark and does not touch the window
        assert_eq!(window.extend(4), Some(MessageId::from_raw(4)));
        assert_eq!(window.recv_id_max(), MessageId::from_raw(5));
    }
}
