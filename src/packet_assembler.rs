use tracing::trace;
use crate::packet_buf::PacketBuf;
use crate::record::Record;

/// Packs records into a sequence of packets of fixed capacity. Records are never split across
///  packets: if a record does not fit into the current packet, the packet is sealed and a new
///  one is started.
///
/// A data record that does not even fit into an empty packet gets a packet of its own which is
///  exactly as big as the record. This is the only case where a packet exceeds the configured
///  capacity.
pub struct PacketAssembler {
    capacity: usize,
    current: PacketBuf,
    sealed: Vec<PacketBuf>,
    num_records: usize,
}

impl PacketAssembler {
    pub fn new(capacity: usize) -> PacketAssembler {
        PacketAssembler {
            capacity,
            current: PacketBuf::new(capacity),
            sealed: Vec::new(),
            num_records: 0,
        }
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn push(&mut self, record: &Record) {
        let record_len = record.serialized_len();
        self.num_records += 1;

        if record_len <= self.current.available() {
            record.ser(&mut self.current);
            return;
        }

        if record_len > self.capacity {
            trace!("record of {} bytes exceeds packet capacity {} - sending it in a packet of its own", record_len, self.capacity);
            self.seal_current();

            let mut oversized = PacketBuf::new(record_len);
            record.ser(&mut oversized);
            self.sealed.push(oversized);
            return;
        }

        self.seal_current();
        record.ser(&mut self.current);
    }

    fn seal_current(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let full = std::mem::replace(&mut self.current, PacketBuf::new(self.capacity));
        trace!("sealing packet #{} with {} bytes", self.sealed.len(), full.len());
        self.sealed.push(full);
    }

    /// Returns the assembled packets. If no record was pushed at all, the result is a single
    ///  packet with an IGNORE record, so that every send cycle produces a keep-alive.
    pub fn finish(mut self) -> Vec<PacketBuf> {
        if self.num_records == 0 {
            Record::Ignore.ser(&mut self.current);
        }
        self.seal_current();
        self.sealed
    }
}

/// Convenience for packing a complete list of records
pub fn encode_batch(records: &[Record], capacity: usize) -> Vec<PacketBuf> {
    let mut assembler = PacketAssembler::new(capacity);
    for record in records {
        assembler.push(record);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordReader;
    use rstest::rstest;

    fn packets_as_vecs(packets: &[PacketBuf]) -> Vec<Vec<u8>> {
        packets.iter()
            .map(|p| p.as_ref().to_vec())
            .collect()
    }

    #[rstest]
    #[case::empty(vec![], 10, vec![vec![0]])]
    #[case::single_request(vec![Record::Request(1)], 10, vec![vec![2, 0, 1]])]
    #[case::two_fit(vec![Record::Request(1), Record::Missing(2)], 6, vec![vec![2, 0, 1, 3, 0, 2]])]
    #[case::second_overflows(vec![Record::Request(1), Record::Missing(2)], 5, vec![vec![2, 0, 1], vec![3, 0, 2]])]
    #[case::data_fits_exactly(vec![Record::Request(1), Record::Data { id: 2, payload: &[7, 7] }], 8, vec![vec![2, 0, 1, 6, 0, 2, 7, 7]])]
    #[case::data_overflows(vec![Record::Request(1), Record::Data { id: 2, payload: &[7, 7] }], 7, vec![vec![2, 0, 1], vec![6, 0, 2, 7, 7]])]
    #[case::oversized_alone(vec![Record::Data { id: 2, payload: &[1, 2, 3, 4, 5] }], 6, vec![vec![9, 0, 2, 1, 2, 3, 4, 5]])]
    #[case::oversized_between(
        vec![Record::Request(1), Record::Data { id: 2, payload: &[1, 2, 3, 4, 5] }, Record::Missing(3)],
        6,
        vec![vec![2, 0, 1], vec![9, 0, 2, 1, 2, 3, 4, 5], vec![3, 0, 3]],
    )]
    #[case::two_oversized(
        vec![Record::Data { id: 1, payload: &[1, 2, 3] }, Record::Data { id: 2, payload: &[4, 5, 6] }],
        5,
        vec![vec![7, 0, 1, 1, 2, 3], vec![7, 0, 2, 4, 5, 6]],
    )]
    fn test_encode_batch(#[case] records: Vec<Record>, #[case] capacity: usize, #[case] expected: Vec<Vec<u8>>) {
        let packets = encode_batch(&records, capacity);
        assert_eq!(packets_as_vecs(&packets), expected);
    }

    #[test]
    fn test_packets_respect_capacity() {
        let payloads = (0..50u8)
            .map(|n| vec![n; (n as usize * 7) % 40])
            .collect::<Vec<_>>();
        let records = payloads.iter()
            .enumerate()
            .map(|(id, payload)| Record::Data { id: id as u16, payload })
            .collect::<Vec<_>>();

        let packets = encode_batch(&records, 48);
        assert!(packets.len() > 1);
        for packet in &packets {
            assert!(!packet.is_empty());
            assert!(packet.len() <= 48);
        }
    }

    #[test]
    fn test_round_trip() {
        let big = vec![5u8; 700];
        let records = vec![
            Record::Request(0xfffe),
            Record::Request(0xffff),
            Record::Missing(0),
            Record::Data { id: 1, payload: &[1, 2, 3] },
            Record::Data { id: 2, payload: &big },
            Record::Data { id: 3, payload: &[] },
            Record::Corrupt,
        ];

        let packets = encode_batch(&records, 64);

        let decoded = packets.iter()
            .flat_map(|p| RecordReader::new(p.as_ref()))
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(decoded, records);
    }
}
