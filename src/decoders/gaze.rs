//! Gaze payload decoding, dispatched by wire length (§4.3).

use crate::error::DecodeError;
use crate::sample::{
    DualMonocularGazeSample, EyeState, EyelidState, EyestateEyelidGazeSample, EyestateGazeSample,
    GazeDatum, GazeSample, Point2, Point3,
};

fn f32_be(buf: &[u8], offset: usize) -> f32 {
    f32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn worn_from_byte(b: u8) -> bool {
    b == 255
}

/// Decode a raw gaze RTP payload into the matching wire variant, stamping
/// it with the wallclock timestamp computed by the RTSP timekeeper.
pub fn decode(payload: &[u8], timestamp_unix_seconds: f64) -> Result<GazeDatum, DecodeError> {
    match payload.len() {
        9 => {
            let x = f32_be(payload, 0);
            let y = f32_be(payload, 4);
            let worn = worn_from_byte(payload[8]);
            Ok(GazeDatum::Gaze(GazeSample {
                x,
                y,
                worn,
                timestamp_unix_seconds,
            }))
        }
        17 => {
            let x = f32_be(payload, 0);
            let y = f32_be(payload, 4);
            let worn = worn_from_byte(payload[8]);
            let rx = f32_be(payload, 9);
            let ry = f32_be(payload, 13);
            let _ = (x, y);
            Ok(GazeDatum::DualMonocular(DualMonocularGazeSample {
                left: Point2 { x, y },
                right: Point2 { x: rx, y: ry },
                worn,
                timestamp_unix_seconds,
            }))
        }
        65 => {
            let x = f32_be(payload, 0);
            let y = f32_be(payload, 4);
            let worn = worn_from_byte(payload[8]);
            let mut o = 9;
            let left = read_eye_state(payload, &mut o);
            let right = read_eye_state(payload, &mut o);
            Ok(GazeDatum::Eyestate(EyestateGazeSample {
                x,
                y,
                worn,
                left,
                right,
                timestamp_unix_seconds,
            }))
        }
        89 => {
            let x = f32_be(payload, 0);
            let y = f32_be(payload, 4);
            let worn = worn_from_byte(payload[8]);
            let mut o = 9;
            let left = read_eye_state(payload, &mut o);
            let right = read_eye_state(payload, &mut o);
            let left_eyelid = read_eyelid_state(payload, &mut o);
            let right_eyelid = read_eyelid_state(payload, &mut o);
            Ok(GazeDatum::EyestateEyelid(EyestateEyelidGazeSample {
                x,
                y,
                worn,
                left,
                right,
                left_eyelid,
                right_eyelid,
                timestamp_unix_seconds,
            }))
        }
        other => Err(DecodeError::UnknownGazeLength(other)),
    }
}

fn read_eye_state(buf: &[u8], offset: &mut usize) -> EyeState {
    let pupil_diameter = f32_be(buf, *offset);
    let eyeball_center = Point3 {
        x: f32_be(buf, *offset + 4),
        y: f32_be(buf, *offset + 8),
        z: f32_be(buf, *offset + 12),
    };
    let optical_axis = Point3 {
        x: f32_be(buf, *offset + 16),
        y: f32_be(buf, *offset + 20),
        z: f32_be(buf, *offset + 24),
    };
    *offset += 28;
    EyeState {
        pupil_diameter,
        eyeball_center,
        optical_axis,
    }
}

fn read_eyelid_state(buf: &[u8], offset: &mut usize) -> EyelidState {
    let eyelid_angle_top = f32_be(buf, *offset);
    let eyelid_angle_bottom = f32_be(buf, *offset + 4);
    let eyelid_aperture = f32_be(buf, *offset + 8);
    *offset += 12;
    EyelidState {
        eyelid_angle_top,
        eyelid_angle_bottom,
        eyelid_aperture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_nine_byte_gaze_decode() {
        let payload: [u8; 9] = [0x3F, 0x80, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0xFF];
        let datum = decode(&payload, 1.700_000_000_5e9_f64 / 1e9).unwrap();
        match datum {
            GazeDatum::Gaze(g) => {
                assert_eq!(g.x, 1.0);
                assert_eq!(g.y, 2.0);
                assert!(g.worn);
            }
            _ => panic!("expected plain gaze sample"),
        }
    }

    #[rstest::rstest]
    #[case(255, true)]
    #[case(0, false)]
    #[case(42, false)]
    #[case(1, false)]
    fn worn_byte_dispatch(#[case] byte: u8, #[case] expected_worn: bool) {
        let mut payload = [0u8; 9];
        payload[8] = byte;
        match decode(&payload, 0.0).unwrap() {
            GazeDatum::Gaze(g) => assert_eq!(g.worn, expected_worn),
            _ => unreachable!(),
        }
    }

    #[test]
    fn unknown_length_is_an_error() {
        let payload = [0u8; 10];
        assert_matches::assert_matches!(decode(&payload, 0.0), Err(DecodeError::UnknownGazeLength(10)));
    }

    #[test]
    fn dual_monocular_decodes_both_eyes() {
        let mut payload = [0u8; 17];
        payload[0..4].copy_from_slice(&1.0f32.to_be_bytes());
        payload[4..8].copy_from_slice(&2.0f32.to_be_bytes());
        payload[8] = 255;
        payload[9..13].copy_from_slice(&3.0f32.to_be_bytes());
        payload[13..17].copy_from_slice(&4.0f32.to_be_bytes());
        match decode(&payload, 0.0).unwrap() {
            GazeDatum::DualMonocular(g) => {
                assert_eq!(g.left, Point2 { x: 1.0, y: 2.0 });
                assert_eq!(g.right, Point2 { x: 3.0, y: 4.0 });
                assert!(g.worn);
            }
            _ => unreachable!(),
        }
    }
}
