use std::fmt::{Display, Formatter};

/// The engine-internal 'extended' message id. It is unbounded for all practical purposes and
///  increases monotonically per direction, while only its lowest 16 bits go on the wire (see
///  [crate::sequence_window] for the reverse mapping).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct MessageId(u64);

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl MessageId {
    pub const ZERO: MessageId = MessageId(0);

    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn to_raw(&self) -> u64 {
        self.0
    }

    /// the truncated representation that is sent on the wire
    pub fn to_wire(&self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    pub fn next(&self) -> MessageId {
        MessageId(
            self.0.checked_add(1)
                .expect("message id space is 64 bits wide and cannot realistically overflow")
        )
    }

    pub fn checked_minus(&self, other: u64) -> Option<MessageId> {
        self.0.checked_sub(other).map(MessageId)
    }

    /// iterate over all ids from `self` (inclusive) to `end` (exclusive)
    pub fn to(&self, end: MessageId) -> impl Iterator<Item = MessageId> {
        (self.0..end.0).map(MessageId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, 0)]
    #[case::small(5, 5)]
    #[case::max_u16(0xffff, 0xffff)]
    #[case::wrapped(0x10000, 0)]
    #[case::wrapped_plus(0x12345, 0x2345)]
    #[case::high_bits(0xabcd_0000_0007, 7)]
    fn test_to_wire(#[case] raw: u64, #[case] expected: u16) {
        assert_eq!(MessageId::from_raw(raw).to_wire(), expected);
    }

    #[rstest]
    #[case::empty(3, 3, vec![])]
    #[case::one(3, 4, vec![3])]
    #[case::several(3, 6, vec![3, 4, 5])]
    #[case::reversed(6, 3, vec![])]
    fn test_to(#[case] from: u64, #[case] to: u64, #[case] expected: Vec<u64>) {
        let actual = MessageId::from_raw(from)
            .to(MessageId::from_raw(to))
            .map(|id| id.to_raw())
            .collect::<Vec<_>>();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_next_and_minus() {
        let id = MessageId::from_raw(9);
        assert_eq!(id.next(), MessageId::from_raw(10));
        assert_eq!(id.checked_minus(9), Some(MessageId::ZERO));
        assert_eq!(id.checked_minus(10), None);
    }
}
