//! Generated-style protobuf bindings for the IMU wire schema (§4.3).
//!
//! Checked in rather than produced by a `build.rs`/`prost-build` step,
//! mirroring the original repo's checked-in `imu_pb2.py`. Schema:
//!
//! ```proto
//! message AccelData { float x = 1; float y = 2; float z = 3; }
//! message GyroData { float x = 1; float y = 2; float z = 3; }
//! message RotVecData { float w = 1; float x = 2; float y = 3; float z = 4; }
//! message ImuPacket {
//!   uint64 tsNs = 1;
//!   AccelData accelData = 2;
//!   GyroData gyroData = 3;
//!   RotVecData rotVecData = 4;
//! }
//! ```

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct AccelData {
    #[prost(float, tag = "1")]
    pub x: f32,
    #[prost(float, tag = "2")]
    pub y: f32,
    #[prost(float, tag = "3")]
    pub z: f32,
}

#[derive(Clone, PartialEq, Message)]
pub struct GyroData {
    #[prost(float, tag = "1")]
    pub x: f32,
    #[prost(float, tag = "2")]
    pub y: f32,
    #[prost(float, tag = "3")]
    pub z: f32,
}

#[derive(Clone, PartialEq, Message)]
pub struct RotVecData {
    #[prost(float, tag = "1")]
    pub w: f32,
    #[prost(float, tag = "2")]
    pub x: f32,
    #[prost(float, tag = "3")]
    pub y: f32,
    #[prost(float, tag = "4")]
    pub z: f32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ImuPacket {
    #[prost(uint64, tag = "1")]
    pub ts_ns: u64,
    #[prost(message, optional, tag = "2")]
    pub accel_data: Option<AccelData>,
    #[prost(message, optional, tag = "3")]
    pub gyro_data: Option<GyroData>,
    #[prost(message, optional, tag = "4")]
    pub rot_vec_data: Option<RotVecData>,
}
