//! H.264 NAL unit reassembly from RTP FU-A fragments (RFC 3984 §5.8).
//!
//! Pure function: no suspension, no shared state. A failure here is a
//! hard error surfaced to the owning stream.

use crate::error::NalError;
use bytes::{Bytes, BytesMut};

const START_CODE: [u8; 4] = [0, 0, 0, 1];
const FU_A_TYPE: u8 = 28;

/// Convert one RTP payload (already stripped of the RTP header) carrying
/// an H.264 NAL unit or FU-A fragment into the bytes that should be fed
/// to the decoder. Continuation fragments (FU-A with the start bit
/// clear) deliberately return a chunk with no start code; callers must
/// concatenate fragments of one access unit themselves.
pub fn reassemble_fragment(payload: &[u8]) -> Result<Bytes, NalError> {
    if payload.is_empty() {
        return Ok(Bytes::new());
    }
    let byte0 = payload[0];
    if byte0 & 0x80 != 0 {
        return Err(NalError::ForbiddenBit);
    }
    let nal_type = byte0 & 0x1F;
    if nal_type == FU_A_TYPE {
        if payload.len() < 2 {
            return Ok(Bytes::new());
        }
        let fu_header = payload[1];
        let start = fu_header & 0x80 != 0;
        if start {
            let synthesized = (byte0 & 0xE0) | (fu_header & 0x1F);
            let mut out = BytesMut::with_capacity(5 + payload.len() - 2);
            out.extend_from_slice(&START_CODE);
            out.extend_from_slice(&[synthesized]);
            out.extend_from_slice(&payload[2..]);
            Ok(out.freeze())
        } else {
            Ok(Bytes::copy_from_slice(&payload[2..]))
        }
    } else {
        let mut out = BytesMut::with_capacity(4 + payload.len());
        out.extend_from_slice(&START_CODE);
        out.extend_from_slice(payload);
        Ok(out.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_bit_is_rejected() {
        let payload = [0x80, 0x00];
        assert_matches::assert_matches!(reassemble_fragment(&payload), Err(NalError::ForbiddenBit));
    }

    #[test]
    fn non_fu_a_unit_gets_start_code() {
        let payload = [0x67, 0x01, 0x02];
        let out = reassemble_fragment(&payload).unwrap();
        assert_eq!(&out[..4], &START_CODE);
        assert_eq!(&out[4..], &payload);
    }

    #[test]
    fn fu_a_start_fragment_synthesizes_header() {
        // nal_type=28 (FU-A), nri bits 0x60, fu_header start=1 type=5 (IDR)
        let payload = [0x7C, 0x85, 0xAA, 0xBB];
        let out = reassemble_fragment(&payload).unwrap();
        assert_eq!(&out[..4], &START_CODE);
        assert_eq!(out[4], 0x65); // (0x60) | (0x05)
        assert_eq!(&out[5..], &[0xAA, 0xBB]);
    }

    #[test]
    fn fu_a_continuation_has_no_start_code() {
        let payload = [0x7C, 0x05, 0xCC, 0xDD];
        let out = reassemble_fragment(&payload).unwrap();
        assert_eq!(&out[..], &[0xCC, 0xDD]);
    }

    #[test]
    fn three_fragments_form_one_access_unit() {
        let start = reassemble_fragment(&[0x7C, 0x85, 0x01]).unwrap();
        let middle = reassemble_fragment(&[0x7C, 0x05, 0x02]).unwrap();
        let end = reassemble_fragment(&[0x7C, 0x45, 0x03]).unwrap();
        let mut assembled = BytesMut::new();
        assembled.extend_from_slice(&start);
        assembled.extend_from_slice(&middle);
        assembled.extend_from_slice(&end);
        assert_eq!(&assembled[..4], &START_CODE);
        assert_eq!(&assembled[4..], &[0x65, 0x01, 0x02, 0x03]);
        // exactly one start code across the whole access unit
        assert_eq!(assembled.windows(4).filter(|w| *w == START_CODE).count(), 1);
    }
}
