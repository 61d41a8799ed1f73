//! Owned packet buffers with an explicit capacity.
//!
//! Outgoing packets are assembled record by record into a buffer of the configured packet
//!  capacity. The buffer refuses to grow beyond that capacity, so a packing bug shows up as a
//!  panic in the codec rather than as an oversized datagram on the wire.
//!
//! The buffer implements `BufMut` to fit into the `bytes` ecosystem.

use std::borrow::Borrow;
use std::fmt::{Debug, Formatter};
use bytes::buf::UninitSlice;

#[derive(Eq, Clone)]
pub struct PacketBuf {
    buf: Vec<u8>,
    len: usize,
}
impl PacketBuf {
    /// create a new, empty buffer with the given capacity
    pub fn new(capacity: usize) -> PacketBuf {
        PacketBuf {
            buf: vec![0; capacity],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// the number of bytes that can still be written
    pub fn available(&self) -> usize {
        self.capacity() - self.len
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Convenience for test code: the buffer's capacity is derived from the data.
    #[cfg(test)]
    pub fn from_slice(data: &[u8]) -> PacketBuf {
        let mut result = PacketBuf::new(data.len());
        bytes::BufMut::put_slice(&mut result, data);
        result
    }
}

impl PartialEq for PacketBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref().eq(other.as_ref())
    }
}

impl Debug for PacketBuf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl Borrow<[u8]> for PacketBuf {
    fn borrow(&self) -> &[u8] {
        self.as_ref()
    }
}

impl AsRef<[u8]> for PacketBuf {
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

unsafe impl bytes::BufMut for PacketBuf {
    fn remaining_mut(&self) -> usize {
        self.buf.len() - self.len
    }

    unsafe fn advance_mut(&mut self, cnt: usize) {
        assert!(self.len + cnt <= self.capacity(), "packet buffer overflow");
        self.len += cnt;
    }

    fn chunk_mut(&mut self) -> &mut UninitSlice {
        UninitSlice::new(&mut self.buf[self.len..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn test_put() {
        let mut buf = PacketBuf::new(5);
        assert!(buf.is_empty());
        assert_eq!(buf.available(), 5);

        buf.put_u8(1);
        buf.put_u16(0x0203);
        assert_eq!(buf.as_ref(), &[1, 2, 3]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.available(), 2);

        buf.put_slice(&[4, 5]);
        assert_eq!(buf.as_ref(), &[1, 2, 3, 4, 5]);
        assert_eq!(buf.available(), 0);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 5);
    }

    #[test]
    #[should_panic]
    fn test_overflow() {
        let mut buf = PacketBuf::new(2);
        buf.put_slice(&[1, 2, 3]);
    }

    #[test]
    fn test_eq_ignores_capacity() {
        let mut a = PacketBuf::new(10);
        a.put_slice(&[7, 8]);
        assert_eq!(a, PacketBuf::from_slice(&[7, 8]));
    }
}
