//! The record format inside a packet.
//!
//! A packet is a sequence of records without any packet-level header. Each record starts with a
//!  'tag' which is either a control record's kind or, for data records, the payload length plus
//!  [DATA_TAG_BASE]. Tags up to 127 are encoded in a single byte, bigger tags in two bytes with
//!  the high bit of the first byte set:
//!
//! ```ascii
//! 0x00                                       IGNORE (keep-alive, no id)
//! 0x01                                       CORRUPT (sender lost sync, rest of packet is garbage)
//! 0x02  id_hi id_lo                          REQUEST: please re-send message 'id'
//! 0x03  id_hi id_lo                          MISSING: message 'id' is not available for re-sending
//! tag   id_hi id_lo  payload                 DATA with tag = len + 4 <= 127
//! 0x80|tag_hi  tag_lo  id_hi id_lo  payload  DATA with tag = len + 4 > 127
//! ```
//!
//! All numbers are big-endian, and ids are the lowest 16 bits of a message's extended id.

use anyhow::anyhow;
use bytes::BufMut;
use num_enum::TryFromPrimitive;
use crate::util::buf_ext::{checked_split, BufExt};
use crate::util::safe_converter::{PrecheckedCast, SafeCast};

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive)]
pub enum ControlKind {
    Ignore = 0,
    Corrupt = 1,
    Request = 2,
    Missing = 3,
}

pub const DATA_TAG_BASE: u16 = 4;
const MAX_SHORT_TAG: u16 = 0x7f;
const MAX_TAG: u16 = 0x7fff;
const LONG_TAG_FLAG: u8 = 0x80;

/// the biggest payload that can be encoded in a single data record
pub const MAX_PAYLOAD_LEN: usize = (MAX_TAG - DATA_TAG_BASE) as usize;

/// the biggest control record, i.e. the minimum packet size the protocol can operate with
pub const MAX_CONTROL_RECORD_LEN: usize = 1 + size_of::<u16>();

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Record<'a> {
    Ignore,
    Corrupt,
    Request(u16),
    Missing(u16),
    Data {
        id: u16,
        payload: &'a [u8],
    },
}

impl<'a> Record<'a> {
    fn tag(&self) -> u16 {
        match self {
            Record::Ignore => ControlKind::Ignore as u16,
            Record::Corrupt => ControlKind::Corrupt as u16,
            Record::Request(_) => ControlKind::Request as u16,
            Record::Missing(_) => ControlKind::Missing as u16,
            Record::Data { payload, .. } => {
                assert!(payload.len() <= MAX_PAYLOAD_LEN, "payload length should have been checked on send");
                let payload_len: u16 = payload.len().prechecked_cast();
                DATA_TAG_BASE + payload_len
            }
        }
    }

    fn tag_len(tag: u16) -> usize {
        if tag > MAX_SHORT_TAG { 2 } else { 1 }
    }

    pub fn serialized_len(&self) -> usize {
        let tag_len = Self::tag_len(self.tag());
        match self {
            Record::Ignore | Record::Corrupt => tag_len,
            Record::Request(_) | Record::Missing(_) => tag_len + size_of::<u16>(),
            Record::Data { payload, .. } => tag_len + size_of::<u16>() + payload.len(),
        }
    }

    pub fn ser(&self, buf: &mut impl BufMut) {
        let tag = self.tag();
        if Self::tag_len(tag) == 1 {
            buf.put_u8(tag.prechecked_cast());
        }
        else {
            let tag_hi: u8 = (tag >> 8).prechecked_cast();
            let tag_lo: u8 = (tag & 0xff).prechecked_cast();
            buf.put_u8(LONG_TAG_FLAG | tag_hi);
            buf.put_u8(tag_lo);
        }

        match self {
            Record::Ignore | Record::Corrupt => {}
            Record::Request(id) | Record::Missing(id) => {
                buf.put_u16(*id);
            }
            Record::Data { id, payload } => {
                buf.put_u16(*id);
                buf.put_slice(payload);
            }
        }
    }

    /// Parses the next record, advancing `buf` past it. Data records borrow their payload from
    ///  the buffer.
    pub fn try_deser(buf: &mut &'a [u8]) -> anyhow::Result<Record<'a>> {
        let first = buf.checked_get_u8()?;
        let tag = if first & LONG_TAG_FLAG != 0 {
            let second = buf.checked_get_u8()
                .map_err(|_| anyhow!("packet ends inside a two-byte record header"))?;
            (((first & !LONG_TAG_FLAG) as u16) << 8) | second as u16
        }
        else {
            first as u16
        };

        if tag < DATA_TAG_BASE {
            return match ControlKind::try_from_primitive(tag.prechecked_cast())? {
                ControlKind::Ignore => Ok(Record::Ignore),
                ControlKind::Corrupt => Ok(Record::Corrupt),
                ControlKind::Request => Ok(Record::Request(buf.checked_get_u16()?)),
                ControlKind::Missing => Ok(Record::Missing(buf.checked_get_u16()?)),
            };
        }

        let payload_len: usize = (tag - DATA_TAG_BASE).safe_cast();
        let id = buf.checked_get_u16()
            .map_err(|_| anyhow!("packet ends inside the id of a data record"))?;
        let payload = checked_split(buf, payload_len)
            .map_err(|_| anyhow!("data record #{} declares a payload of {} bytes, but only {} bytes remain in the packet", id, payload_len, buf.len()))?;

        Ok(Record::Data { id, payload })
    }
}

/// Iterates over the records in a packet. After the first malformed record, the iterator
///  yields the error and stops: there is no way to re-synchronize inside a packet.
pub struct RecordReader<'a> {
    buf: &'a [u8],
    failed: bool,
}

impl<'a> RecordReader<'a> {
    pub fn new(packet: &'a [u8]) -> RecordReader<'a> {
        RecordReader {
            buf: packet,
            failed: false,
        }
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = anyhow::Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }

        let result = Record::try_deser(&mut self.buf);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
