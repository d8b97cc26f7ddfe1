//! Status/component model (C5), plus the supplemental entities from
//! §3 (`Event`, `NetworkDevice`, `DiscoveredDeviceInfo`, `Calibration`).
//!
//! Grounded on `models.py`'s `_model_class_map`/`parse_component`
//! dispatch and `Status.update`/`matching_sensors` methods; replaces
//! runtime reflection on the model name with a closed sum type plus a
//! string lookup table, per the Design Notes.

use crate::error::StatusError;
use serde::Deserialize;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatteryState {
    Ok,
    Low,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Phone {
    pub battery_level: i32,
    pub battery_state: BatteryState,
    pub device_id: String,
    pub device_name: String,
    pub ip: String,
    pub memory: i64,
    pub memory_state: String,
    #[serde(default)]
    pub time_echo_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hardware {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub glasses_serial: Option<String>,
    #[serde(default)]
    pub world_camera_serial: Option<String>,
    #[serde(default)]
    pub module_serial: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorName {
    Gaze,
    World,
    Eyes,
    Imu,
    EyeEvents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionType {
    Direct,
    Websocket,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sensor {
    pub sensor: SensorName,
    pub conn_type: ConnectionType,
    pub connected: bool,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub params: Option<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub stream_error: bool,
}

fn default_protocol() -> String {
    "rtsp".to_string()
}

impl Sensor {
    pub fn disconnected(sensor: SensorName) -> Self {
        Self {
            sensor,
            conn_type: ConnectionType::Direct,
            connected: false,
            ip: None,
            port: None,
            params: None,
            protocol: default_protocol(),
            stream_error: false,
        }
    }

    pub fn url(&self) -> Option<String> {
        let ip = self.ip.as_ref()?;
        let port = self.port?;
        match &self.params {
            Some(params) => Some(format!("{}://{}:{}/?{}", self.protocol, ip, port, params)),
            None => Some(format!("{}://{}:{}/", self.protocol, ip, port)),
        }
    }

    fn identity(&self) -> (SensorName, ConnectionType) {
        (self.sensor, self.conn_type)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recording {
    pub action: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub rec_duration_ns: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub recording_id: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkDevice {
    pub ip: String,
    pub device_name: String,
    pub connected: bool,
}

/// Closed sum replacing the original's dynamic dispatch on the `model`
/// string (see Design Notes).
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Phone(Phone),
    Hardware(Hardware),
    Sensor(Sensor),
    Recording(Recording),
    Event(Event),
    NetworkDevice(NetworkDevice),
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    model: String,
    data: serde_json::Value,
}

pub fn parse_component(value: serde_json::Value) -> Result<Option<Component>, StatusError> {
    let raw: RawComponent =
        serde_json::from_value(value).map_err(|e| StatusError::UnknownComponent(e.to_string()))?;
    let component = match raw.model.as_str() {
        "Phone" => Component::Phone(from_data(raw.data)?),
        "Hardware" => Component::Hardware(from_data(raw.data)?),
        "Sensor" => Component::Sensor(from_data(raw.data)?),
        "Recording" => Component::Recording(from_data(raw.data)?),
        "Event" => Component::Event(from_data(raw.data)?),
        "NetworkDevice" => Component::NetworkDevice(from_data(raw.data)?),
        other => {
            tracing::warn!(model = other, "dropping unknown status component");
            return Ok(None);
        }
    };
    Ok(Some(component))
}

fn from_data<T: for<'de> Deserialize<'de>>(data: serde_json::Value) -> Result<T, StatusError> {
    serde_json::from_value(data).map_err(|e| StatusError::UnknownComponent(e.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct Status {
    pub phone: Option<Phone>,
    pub hardware: Option<Hardware>,
    pub sensors: Vec<Sensor>,
    pub recording: Option<Recording>,
}

impl Status {
    pub fn from_components(components: Vec<Component>) -> Self {
        let mut status = Status::default();
        for c in components {
            status.update(c);
        }
        status
    }

    /// Applies one component update in place, per §4.5's dispatch rules.
    pub fn update(&mut self, component: Component) {
        match component {
            Component::Phone(p) => self.phone = Some(p),
            Component::Hardware(h) => self.hardware = Some(h),
            Component::Recording(r) => self.recording = Some(r),
            Component::Sensor(s) => {
                let identity = s.identity();
                if let Some(existing) = self
                    .sensors
                    .iter_mut()
                    .find(|existing| existing.identity() == identity)
                {
                    *existing = s;
                } else {
                    self.sensors.push(s);
                }
            }
            Component::NetworkDevice(_) => {}
            Component::Event(_) => {}
        }
    }

    /// Sensors ordered `(connected desc, conn_type asc, sensor_name asc)`.
    pub fn sensors_ordered(&self) -> Vec<&Sensor> {
        let mut sensors: Vec<&Sensor> = self.sensors.iter().collect();
        sensors.sort_by(|a, b| {
            b.connected
                .cmp(&a.connected)
                .then(a.conn_type.cmp(&b.conn_type))
                .then(a.sensor.cmp(&b.sensor))
        });
        sensors
    }

    fn direct_sensor(&self, name: SensorName) -> Sensor {
        self.sensors
            .iter()
            .find(|s| s.sensor == name && s.conn_type == ConnectionType::Direct)
            .cloned()
            .unwrap_or_else(|| Sensor::disconnected(name))
    }

    pub fn direct_world_sensor(&self) -> Sensor {
        self.direct_sensor(SensorName::World)
    }
    pub fn direct_gaze_sensor(&self) -> Sensor {
        self.direct_sensor(SensorName::Gaze)
    }
    pub fn direct_imu_sensor(&self) -> Sensor {
        self.direct_sensor(SensorName::Imu)
    }
    pub fn direct_eyes_sensor(&self) -> Sensor {
        self.direct_sensor(SensorName::Eyes)
    }
    pub fn direct_eye_events_sensor(&self) -> Sensor {
        self.direct_sensor(SensorName::EyeEvents)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredDeviceInfo {
    pub name: String,
    pub server: String,
    pub addresses: Vec<IpAddr>,
    pub port: u16,
}

pub type Calibration = Vec<u8>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(name: SensorName, connected: bool) -> Sensor {
        Sensor {
            sensor: name,
            conn_type: ConnectionType::Direct,
            connected,
            ip: Some("10.0.0.5".into()),
            port: Some(8086),
            params: Some("cam=1".into()),
            protocol: "rtsp".into(),
            stream_error: false,
        }
    }

    #[test]
    fn s3_status_merge_replaces_in_place() {
        let mut status = Status::default();
        status.update(Component::Sensor(sensor(SensorName::World, false)));
        assert_eq!(status.sensors.len(), 1);

        status.update(Component::Sensor(sensor(SensorName::World, true)));
        assert_eq!(status.sensors.len(), 1);
        assert!(status.sensors[0].connected);
    }

    #[test]
    fn update_is_idempotent_on_identity() {
        let mut a = Status::default();
        let mut b = Status::default();
        let update = Component::Sensor(sensor(SensorName::Gaze, true));
        a.update(update.clone());
        a.update(update.clone());
        b.update(update);
        assert_eq!(a.sensors, b.sensors);
    }

    #[test]
    fn network_device_does_not_mutate_status() {
        let mut status = Status::default();
        status.update(Component::NetworkDevice(NetworkDevice {
            ip: "10.0.0.1".into(),
            device_name: "router".into(),
            connected: true,
        }));
        assert!(status.sensors.is_empty());
        assert!(status.phone.is_none());
    }

    #[test]
    fn direct_sensor_accessor_synthesizes_disconnected() {
        let status = Status::default();
        let sensor = status.direct_gaze_sensor();
        assert!(!sensor.connected);
        assert_eq!(sensor.sensor, SensorName::Gaze);
    }

    #[test]
    fn sensors_ordered_puts_connected_first_then_by_name() {
        let mut status = Status::default();
        status.update(Component::Sensor(sensor(SensorName::World, false)));
        status.update(Component::Sensor(sensor(SensorName::Gaze, true)));
        let ordered = status.sensors_ordered();
        assert_eq!(ordered[0].sensor, SensorName::Gaze);
        assert!(ordered[0].connected);
    }

    #[test]
    fn unknown_model_is_dropped_not_errored() {
        let value = serde_json::json!({"model": "Bogus", "data": {}});
        let result = parse_component(value).unwrap();
        assert!(result.is_none());
    }
}
