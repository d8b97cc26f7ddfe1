//! RTP header and packet framing (RFC 3550 §5.1).
//!
//! Grounded on the teacher's `rust-mjpeg-rtp/src/rtp/packet.rs`, which
//! parses the same fixed 12-byte header for the transmit side; here we
//! parse the receive side off an RTSP interleaved TCP stream instead of
//! a UDP socket.

use bytes::{Bytes, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub csrc_count: u8,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    pub const LEN: usize = 12;

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let version = buf[0] >> 6;
        let padding = (buf[0] >> 5) & 0x1 != 0;
        let extension = (buf[0] >> 4) & 0x1 != 0;
        let csrc_count = buf[0] & 0x0F;
        let marker = (buf[1] >> 7) & 0x1 != 0;
        let payload_type = buf[1] & 0x7F;
        let sequence_number = u16::from_be_bytes([buf[2], buf[3]]);
        let timestamp = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let ssrc = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        Some(Self {
            version,
            padding,
            extension,
            csrc_count,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
        })
    }

    pub fn to_bytes(&self) -> BytesMut {
        let mut out = BytesMut::with_capacity(Self::LEN);
        out.extend_from_slice(&[
            (self.version << 6)
                | ((self.padding as u8) << 5)
                | ((self.extension as u8) << 4)
                | self.csrc_count,
            ((self.marker as u8) << 7) | self.payload_type,
        ]);
        out.extend_from_slice(&self.sequence_number.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.ssrc.to_be_bytes());
        out
    }
}

#[derive(Debug, Clone)]
pub struct RtpPacket {
    pub header: RtpHeader,
    pub payload: Bytes,
}

impl RtpPacket {
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        let header = RtpHeader::from_bytes(buf)?;
        let header_len = RtpHeader::LEN + header.csrc_count as usize * 4;
        if buf.len() < header_len {
            return None;
        }
        Some(Self {
            header,
            payload: Bytes::copy_from_slice(&buf[header_len..]),
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = self.header.to_bytes();
        out.extend_from_slice(&self.payload);
        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtp_header_roundtrip() {
        let header = RtpHeader {
            version: 2,
            padding: false,
            extension: false,
            csrc_count: 0,
            marker: true,
            payload_type: 96,
            sequence_number: 4242,
            timestamp: 90_000,
            ssrc: 0xdead_beef,
        };
        let bytes = header.to_bytes();
        let parsed = RtpHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header, parsed);
    }

    #[test]
    fn packet_roundtrip_with_payload() {
        let header = RtpHeader {
            version: 2,
            padding: false,
            extension: false,
            csrc_count: 0,
            marker: false,
            payload_type: 97,
            sequence_number: 1,
            timestamp: 0,
            ssrc: 1,
        };
        let packet = RtpPacket {
            header,
            payload: Bytes::from_static(b"hello"),
        };
        let bytes = packet.to_bytes();
        let parsed = RtpPacket::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.header, header);
        assert_eq!(&parsed.payload[..], b"hello");
    }
}
