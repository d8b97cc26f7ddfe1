//! Sample types produced by the sensor decoders (C3) and the matching
//! core (C7). Every sample carries a wallclock timestamp derived from
//! RTCP Sender Reports (§4.2).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeState {
    pub pupil_diameter: f32,
    pub eyeball_center: Point3,
    pub optical_axis: Point3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyelidState {
    pub eyelid_angle_top: f32,
    pub eyelid_angle_bottom: f32,
    pub eyelid_aperture: f32,
}

/// A timestamped sample. All four gaze variants and video frames implement
/// this so the matching core can treat them uniformly.
pub trait Timestamped {
    fn timestamp_unix_seconds(&self) -> f64;
    fn timestamp_unix_ns(&self) -> i64 {
        (self.timestamp_unix_seconds() * 1e9) as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    pub x: f32,
    pub y: f32,
    pub worn: bool,
    pub timestamp_unix_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualMonocularGazeSample {
    pub left: Point2,
    pub right: Point2,
    pub worn: bool,
    pub timestamp_unix_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyestateGazeSample {
    pub x: f32,
    pub y: f32,
    pub worn: bool,
    pub left: EyeState,
    pub right: EyeState,
    pub timestamp_unix_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyestateEyelidGazeSample {
    pub x: f32,
    pub y: f32,
    pub worn: bool,
    pub left: EyeState,
    pub right: EyeState,
    pub left_eyelid: EyelidState,
    pub right_eyelid: EyelidState,
    pub timestamp_unix_seconds: f64,
}

/// Closed sum over the four gaze wire variants, dispatched on payload
/// length in `decoders::gaze`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeDatum {
    Gaze(GazeSample),
    DualMonocular(DualMonocularGazeSample),
    Eyestate(EyestateGazeSample),
    EyestateEyelid(EyestateEyelidGazeSample),
}

impl GazeDatum {
    pub fn timestamp_unix_seconds(&self) -> f64 {
        match self {
            GazeDatum::Gaze(g) => g.timestamp_unix_seconds,
            GazeDatum::DualMonocular(g) => g.timestamp_unix_seconds,
            GazeDatum::Eyestate(g) => g.timestamp_unix_seconds,
            GazeDatum::EyestateEyelid(g) => g.timestamp_unix_seconds,
        }
    }
}

impl Timestamped for GazeDatum {
    fn timestamp_unix_seconds(&self) -> f64 {
        GazeDatum::timestamp_unix_seconds(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    pub gyro: Point3,
    pub accel: Point3,
    pub quat: Quaternion,
    pub timestamp_unix_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Timestamped for ImuSample {
    fn timestamp_unix_seconds(&self) -> f64 {
        self.timestamp_unix_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationOrSaccade {
    /// 0 = saccade, 1 = fixation.
    pub event_type: i32,
    pub start_time_ns: i64,
    pub end_time_ns: i64,
    pub start_gaze: Point2,
    pub end_gaze: Point2,
    pub mean_gaze: Point2,
    pub amplitude_pixels: f32,
    pub amplitude_angle_deg: f32,
    pub mean_velocity: f32,
    pub max_velocity: f32,
    pub timestamp_unix_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationOnset {
    /// 2 = saccade-onset, 3 = fixation-onset.
    pub event_type: i32,
    pub start_time_ns: i64,
    pub timestamp_unix_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blink {
    pub start_time_ns: i64,
    pub end_time_ns: i64,
    pub timestamp_unix_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EyeEventSample {
    FixationOrSaccade(FixationOrSaccade),
    FixationOnset(FixationOnset),
    Blink(Blink),
}

impl EyeEventSample {
    pub fn timestamp_unix_seconds(&self) -> f64 {
        match self {
            EyeEventSample::FixationOrSaccade(e) => e.timestamp_unix_seconds,
            EyeEventSample::FixationOnset(e) => e.timestamp_unix_seconds,
            EyeEventSample::Blink(e) => e.timestamp_unix_seconds,
        }
    }
}

/// An implementation-defined decoded picture handle. This crate does not
/// prescribe a pixel format beyond BGR conversion; `openh264` owns the
/// actual decode buffer lifetime.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Planar I420 (Y, then U, then V) as produced by the H.264 decoder.
    pub yuv: bytes::Bytes,
    pub timestamp_unix_seconds: Option<f64>,
}

impl VideoFrame {
    /// Convert to an interleaved BGR buffer (naive BT.601 conversion).
    pub fn to_bgr(&self) -> Vec<u8> {
        let w = self.width as usize;
        let h = self.height as usize;
        let y_plane = &self.yuv[0..w * h];
        let u_plane = &self.yuv[w * h..w * h + (w / 2) * (h / 2)];
        let v_plane = &self.yuv[w * h + (w / 2) * (h / 2)..];
        let mut out = vec![0u8; w * h * 3];
        for row in 0..h {
            for col in 0..w {
                let y = y_plane[row * w + col] as f32;
                let u = u_plane[(row / 2) * (w / 2) + col / 2] as f32 - 128.0;
                let v = v_plane[(row / 2) * (w / 2) + col / 2] as f32 - 128.0;
                let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
                let g = (y - 0.344_136 * u - 0.714_136 * v).clamp(0.0, 255.0) as u8;
                let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
                let idx = (row * w + col) * 3;
                out[idx] = b;
                out[idx + 1] = g;
                out[idx + 2] = r;
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct MatchedGazeScene {
    pub scene: VideoFrame,
    pub gaze: GazeDatum,
}

#[derive(Debug, Clone)]
pub struct MatchedGazeEyesScene {
    pub scene: VideoFrame,
    pub eyes: VideoFrame,
    pub gaze: GazeDatum,
}
