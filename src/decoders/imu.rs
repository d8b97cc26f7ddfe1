//! IMU decoding: one length-delimited `ImuPacket` protobuf per RTP
//! payload (§4.3). The wallclock timestamp from RTCP supersedes the
//! device's own `tsNs` field for downstream logic.

use super::imu_proto::ImuPacket;
use crate::error::DecodeError;
use crate::sample::{ImuSample, Point3, Quaternion};
use prost::Message;

pub fn decode(payload: &[u8], timestamp_unix_seconds: f64) -> Result<ImuSample, DecodeError> {
    let packet = ImuPacket::decode(payload)?;
    let accel = packet.accel_data.unwrap_or_default_point();
    let gyro = packet.gyro_data.unwrap_or_default_point();
    let quat = packet
        .rot_vec_data
        .map(|q| Quaternion {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        })
        .unwrap_or(Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        });
    Ok(ImuSample {
        gyro,
        accel,
        quat,
        timestamp_unix_seconds,
    })
}

trait IntoPoint3 {
    fn unwrap_or_default_point(self) -> Point3;
}

impl IntoPoint3 for Option<super::imu_proto::AccelData> {
    fn unwrap_or_default_point(self) -> Point3 {
        self.map(|a| Point3 {
            x: a.x,
            y: a.y,
            z: a.z,
        })
        .unwrap_or(Point3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        })
    }
}

impl IntoPoint3 for Option<super::imu_proto::GyroData> {
    fn unwrap_or_default_point(self) -> Point3 {
        self.map(|g| Point3 {
            x: g.x,
            y: g.y,
            z: g.z,
        })
        .unwrap_or(Point3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::imu_proto::{AccelData, GyroData, ImuPacket, RotVecData};
    use super::*;

    #[test]
    fn round_trip_preserves_components() {
        let packet = ImuPacket {
            ts_ns: 123_456_789,
            accel_data: Some(AccelData {
                x: 0.1,
                y: 0.2,
                z: 9.8,
            }),
            gyro_data: Some(GyroData {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            }),
            rot_vec_data: Some(RotVecData {
                w: 1.0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            }),
        };
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        let sample = decode(&buf, 42.0).unwrap();
        assert_eq!(sample.accel, Point3 { x: 0.1, y: 0.2, z: 9.8 });
        assert_eq!(sample.gyro, Point3 { x: 1.0, y: 2.0, z: 3.0 });
        assert_eq!(sample.timestamp_unix_seconds, 42.0);
        // RTP wallclock supersedes the device tsNs for downstream logic
        assert_ne!(sample.timestamp_unix_seconds, packet.ts_ns as f64);
    }
}
