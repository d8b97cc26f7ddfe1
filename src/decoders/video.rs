//! Scene/eye video decoding: NAL-reassembled H.264 access units fed to an
//! `openh264` decoder context, paired with wallclock timestamps (§4.3).
//!
//! The timestamp paired with a decoded frame is the wallclock of the
//! *previous* RTP packet boundary, not the one that completed the
//! frame's access unit. This is a deliberate off-by-one carried over
//! from the reference implementation (see the Design Notes) — it is
//! not fixed here.

use crate::error::DecodeError;
use crate::nal;
use crate::sample::VideoFrame;
use bytes::BytesMut;
use openh264::decoder::Decoder;
use openh264::nal_units;

pub struct VideoDecoder {
    inner: Decoder,
    access_unit: BytesMut,
    /// Wallclock of the packet boundary preceding the one currently being
    /// assembled; paired with the *next* frame the decoder yields.
    pending_boundary_timestamp: Option<f64>,
    seen_first_boundary: bool,
}

impl VideoDecoder {
    pub fn new(parameter_sets: &[Vec<u8>]) -> Result<Self, DecodeError> {
        let inner = Decoder::new().map_err(|e| DecodeError::Codec(e.to_string()))?;
        let mut decoder = Self {
            inner,
            access_unit: BytesMut::new(),
            pending_boundary_timestamp: None,
            seen_first_boundary: false,
        };
        for set in parameter_sets {
            let reassembled = nal::reassemble_fragment(set)?;
            decoder.feed_init(&reassembled)?;
        }
        Ok(decoder)
    }

    fn feed_init(&mut self, nal_unit: &[u8]) -> Result<(), DecodeError> {
        let _ = self
            .inner
            .decode(nal_unit)
            .map_err(|e| DecodeError::Codec(e.to_string()))?;
        Ok(())
    }

    /// Feed one RTP payload fragment for the active access unit and the
    /// wallclock of the packet boundary that just completed (the
    /// previous packet's boundary, per the off-by-one above). Returns a
    /// decoded frame whenever the decoder reports a completed picture;
    /// the very first frame produced before any packet boundary has
    /// been observed is skipped (null timestamp).
    pub fn push_fragment(
        &mut self,
        payload: &[u8],
        packet_boundary_timestamp: f64,
    ) -> Result<Option<VideoFrame>, DecodeError> {
        let chunk = nal::reassemble_fragment(payload)?;
        self.access_unit.extend_from_slice(&chunk);

        let frame_timestamp = self.pending_boundary_timestamp;
        self.pending_boundary_timestamp = Some(packet_boundary_timestamp);
        let had_prior_boundary = self.seen_first_boundary;
        self.seen_first_boundary = true;

        let mut decoded = None;
        for unit in nal_units(&self.access_unit) {
            if let Some(yuv) = self
                .inner
                .decode(unit)
                .map_err(|e| DecodeError::Codec(e.to_string()))?
            {
                let (width, height) = yuv.dimensions();
                let mut buf =
                    BytesMut::with_capacity(width * height + (width / 2) * (height / 2) * 2);
                buf.extend_from_slice(yuv.y_with_stride().0);
                buf.extend_from_slice(yuv.u_with_stride().0);
                buf.extend_from_slice(yuv.v_with_stride().0);
                decoded = Some(VideoFrame {
                    width: width as u32,
                    height: height as u32,
                    yuv: buf.freeze(),
                    timestamp_unix_seconds: if had_prior_boundary {
                        frame_timestamp
                    } else {
                        None
                    },
                });
            }
        }
        self.access_unit.clear();
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_before_any_boundary_has_no_timestamp() {
        // Without a real H.264 bitstream the decoder never completes a
        // picture, so this only exercises the boundary bookkeeping: the
        // very first call must not claim a "previous boundary" exists.
        let mut decoder = VideoDecoder {
            inner: Decoder::new().unwrap(),
            access_unit: BytesMut::new(),
            pending_boundary_timestamp: None,
            seen_first_boundary: false,
        };
        assert!(!decoder.seen_first_boundary);
        let _ = decoder.push_fragment(&[0x67, 0x00], 1.0);
        assert!(decoder.seen_first_boundary);
        assert_eq!(decoder.pending_boundary_timestamp, Some(1.0));
    }
}
