//! Eye-event decoding: 4-byte big-endian type tag then a type-specific
//! big-endian struct (§4.3). Type 5 is a keep-alive and must be dropped.

use crate::error::DecodeError;
use crate::sample::{Blink, EyeEventSample, FixationOnset, FixationOrSaccade, Point2};

fn i32_be(buf: &[u8], o: usize) -> i32 {
    i32::from_be_bytes(buf[o..o + 4].try_into().unwrap())
}

fn i64_be(buf: &[u8], o: usize) -> i64 {
    i64::from_be_bytes(buf[o..o + 8].try_into().unwrap())
}

fn f32_be(buf: &[u8], o: usize) -> f32 {
    f32::from_be_bytes(buf[o..o + 4].try_into().unwrap())
}

fn require_len(payload: &[u8], need: usize) -> Result<(), DecodeError> {
    if payload.len() < need {
        Err(DecodeError::ShortEyeEventPayload {
            got: payload.len(),
            need,
        })
    } else {
        Ok(())
    }
}

/// Returns `Ok(None)` for the dropped keep-alive type.
pub fn decode(
    payload: &[u8],
    timestamp_unix_seconds: f64,
) -> Result<Option<EyeEventSample>, DecodeError> {
    require_len(payload, 4)?;
    let event_type = i32_be(payload, 0);
    match event_type {
        0 | 1 => {
            require_len(payload, 60)?;
            let start_time_ns = i64_be(payload, 4);
            let end_time_ns = i64_be(payload, 12);
            let start_gaze = Point2 {
                x: f32_be(payload, 20),
                y: f32_be(payload, 24),
            };
            let end_gaze = Point2 {
                x: f32_be(payload, 28),
                y: f32_be(payload, 32),
            };
            let mean_gaze = Point2 {
                x: f32_be(payload, 36),
                y: f32_be(payload, 40),
            };
            let amplitude_pixels = f32_be(payload, 44);
            let amplitude_angle_deg = f32_be(payload, 48);
            let mean_velocity = f32_be(payload, 52);
            let max_velocity = f32_be(payload, 56);
            Ok(Some(EyeEventSample::FixationOrSaccade(FixationOrSaccade {
                event_type,
                start_time_ns,
                end_time_ns,
                start_gaze,
                end_gaze,
                mean_gaze,
                amplitude_pixels,
                amplitude_angle_deg,
                mean_velocity,
                max_velocity,
                timestamp_unix_seconds,
            })))
        }
        2 | 3 => {
            require_len(payload, 12)?;
            let start_time_ns = i64_be(payload, 4);
            Ok(Some(EyeEventSample::FixationOnset(FixationOnset {
                event_type,
                start_time_ns,
                timestamp_unix_seconds,
            })))
        }
        4 => {
            require_len(payload, 20)?;
            let start_time_ns = i64_be(payload, 4);
            let end_time_ns = i64_be(payload, 12);
            Ok(Some(EyeEventSample::Blink(Blink {
                start_time_ns,
                end_time_ns,
                timestamp_unix_seconds,
            })))
        }
        5 => Ok(None),
        other => Err(DecodeError::UnknownEyeEventType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_keep_alive_is_dropped() {
        let mut payload = [0u8; 20];
        payload[0..4].copy_from_slice(&5i32.to_be_bytes());
        assert_eq!(decode(&payload, 0.0).unwrap(), None);
    }

    #[test]
    fn blink_decodes_start_and_end() {
        let mut payload = [0u8; 20];
        payload[0..4].copy_from_slice(&4i32.to_be_bytes());
        payload[4..12].copy_from_slice(&1000i64.to_be_bytes());
        payload[12..20].copy_from_slice(&2000i64.to_be_bytes());
        match decode(&payload, 0.0).unwrap().unwrap() {
            EyeEventSample::Blink(b) => {
                assert_eq!(b.start_time_ns, 1000);
                assert_eq!(b.end_time_ns, 2000);
            }
            _ => panic!("expected blink"),
        }
    }

    #[test]
    fn unknown_type_is_an_error() {
        let mut payload = [0u8; 12];
        payload[0..4].copy_from_slice(&9i32.to_be_bytes());
        assert_matches::assert_matches!(decode(&payload, 0.0), Err(DecodeError::UnknownEyeEventType(9)));
    }

    #[test]
    fn truncated_fixation_or_saccade_payload_is_an_error_not_a_panic() {
        // tagged type 0 but far short of the 60 bytes that type needs
        let mut payload = [0u8; 12];
        payload[0..4].copy_from_slice(&0i32.to_be_bytes());
        assert_matches::assert_matches!(
            decode(&payload, 0.0),
            Err(DecodeError::ShortEyeEventPayload { got: 12, need: 60 })
        );
    }

    #[test]
    fn truncated_blink_payload_is_an_error() {
        let mut payload = [0u8; 12];
        payload[0..4].copy_from_slice(&4i32.to_be_bytes());
        assert_matches::assert_matches!(
            decode(&payload, 0.0),
            Err(DecodeError::ShortEyeEventPayload { got: 12, need: 20 })
        );
    }

    #[test]
    fn payload_shorter_than_the_type_tag_is_an_error() {
        let payload = [0u8; 2];
        assert_matches::assert_matches!(
            decode(&payload, 0.0),
            Err(DecodeError::ShortEyeEventPayload { got: 2, need: 4 })
        );
    }
}
