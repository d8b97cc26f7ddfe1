//! The worker loop (C8): owns `Status`, the stream managers, and the
//! control-plane client; multiplexes status updates, control-action
//! requests, and lifecycle events on a single task set.

use crate::config::ClientConfig;
use crate::control::ControlClient;
use crate::device::events::{AsyncEventManager, EventKey};
use crate::device::shared::SharedHandle;
use crate::error::{ControlError, Error};
use crate::models::{Component, Phone, SensorName, Status};
use crate::stream_manager::StreamManager;
use crate::template::Template;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

pub enum Command {
    GetStatus(oneshot::Sender<Result<Status, Error>>),
    RecordingStart(oneshot::Sender<Result<String, Error>>),
    RecordingStopAndSave(oneshot::Sender<Result<(), Error>>),
    RecordingCancel(oneshot::Sender<Result<(), Error>>),
    SendEvent(String, Option<i64>, oneshot::Sender<Result<crate::models::Event, Error>>),
    GetTemplate(oneshot::Sender<Result<Template, Error>>),
    GetTemplateData(oneshot::Sender<Result<HashMap<String, Vec<String>>, Error>>),
    PostTemplateData(HashMap<String, Vec<String>>, oneshot::Sender<Result<(), Error>>),
    EstimateTimeOffset(
        usize,
        Option<std::time::Duration>,
        oneshot::Sender<Result<Option<crate::time_echo::Estimates>, Error>>,
    ),
    GetCalibration(oneshot::Sender<Result<Vec<u8>, Error>>),
}

pub struct Worker {
    pub status: Arc<parking_lot::Mutex<Status>>,
    pub shared: SharedHandle,
    pub events: Arc<AsyncEventManager>,
    control: ControlClient,
    stream_managers: HashMap<SensorName, StreamManager>,
}

impl Worker {
    pub fn new(
        ip: &str,
        port: u16,
        status: Status,
        shared: SharedHandle,
        config: &ClientConfig,
    ) -> (Self, Arc<AsyncEventManager>) {
        let events = Arc::new(AsyncEventManager::new([
            EventKey::ShouldWorkerClose,
            EventKey::ShouldStartGaze,
            EventKey::ShouldStopGaze,
            EventKey::ShouldStartWorld,
            EventKey::ShouldStopWorld,
            EventKey::ShouldStartEyes,
            EventKey::ShouldStopEyes,
            EventKey::ShouldStartImu,
            EventKey::ShouldStopImu,
            EventKey::ShouldStartEyeEvents,
            EventKey::ShouldStopEyeEvents,
        ]));
        let control = ControlClient::new(
            ip,
            port,
            std::time::Duration::from_millis(config.http_timeout_ms),
        );
        let mut stream_managers = HashMap::new();
        for name in [
            SensorName::Gaze,
            SensorName::World,
            SensorName::Eyes,
            SensorName::Imu,
            SensorName::EyeEvents,
        ] {
            stream_managers.insert(name, StreamManager::new(name, shared.clone()));
        }
        let worker = Self {
            status: Arc::new(parking_lot::Mutex::new(status)),
            shared,
            events: events.clone(),
            control,
            stream_managers,
        };
        (worker, events)
    }

    pub async fn run(mut self, mut commands: tokio::sync::mpsc::UnboundedReceiver<Command>) {
        let status_updates = self.control.status_updates();
        tokio::pin!(status_updates);
        loop {
            tokio::select! {
                key = self.events.wait_for_first_event() => {
                    if self.handle_event_key(key) {
                        break;
                    }
                }
                Some(component) = status_updates.next() => {
                    self.handle_status_component(component);
                }
                Some(command) = commands.recv() => {
                    self.handle_command(command).await;
                }
            }
        }
    }

    fn handle_event_key(&mut self, key: EventKey) -> bool {
        use EventKey::*;
        match key {
            ShouldWorkerClose => return true,
            ShouldStartGaze => self.set_streaming(SensorName::Gaze, true),
            ShouldStopGaze => self.set_streaming(SensorName::Gaze, false),
            ShouldStartWorld => self.set_streaming(SensorName::World, true),
            ShouldStopWorld => self.set_streaming(SensorName::World, false),
            ShouldStartEyes => self.set_streaming(SensorName::Eyes, true),
            ShouldStopEyes => self.set_streaming(SensorName::Eyes, false),
            ShouldStartImu => self.set_streaming(SensorName::Imu, true),
            ShouldStopImu => self.set_streaming(SensorName::Imu, false),
            ShouldStartEyeEvents => self.set_streaming(SensorName::EyeEvents, true),
            ShouldStopEyeEvents => self.set_streaming(SensorName::EyeEvents, false),
        }
        false
    }

    fn set_streaming(&mut self, name: SensorName, should_stream: bool) {
        if let Some(manager) = self.stream_managers.get_mut(&name) {
            manager.set_should_be_streaming(should_stream);
        }
    }

    fn handle_status_component(&mut self, component: Component) {
        if let Component::Recording(r) = &component {
            if r.action == "ERROR" {
                if let Some(message) = &r.message {
                    self.shared.errors.lock().push(message.clone());
                }
            }
        }
        if let Component::Sensor(s) = &component {
            if s.stream_error {
                self.shared
                    .errors
                    .lock()
                    .push(format!("{:?} sensor reported a stream error", s.sensor));
            }
            if let Some(manager) = self.stream_managers.get_mut(&s.sensor) {
                manager.handle_sensor_update(s.clone());
            }
        }
        self.status.lock().update(component);
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::GetStatus(reply) => {
                let _ = reply.send(self.control.get_status().await.map_err(Error::from));
            }
            Command::RecordingStart(reply) => {
                let _ = reply.send(self.control.recording_start().await.map_err(Error::from));
            }
            Command::RecordingStopAndSave(reply) => {
                let _ = reply.send(self.control.recording_stop_and_save().await.map_err(Error::from));
            }
            Command::RecordingCancel(reply) => {
                let _ = reply.send(self.control.recording_cancel().await.map_err(Error::from));
            }
            Command::SendEvent(name, timestamp, reply) => {
                let _ = reply.send(self.control.send_event(&name, timestamp).await.map_err(Error::from));
            }
            Command::GetTemplate(reply) => {
                let result = self.control.get_template_def().await.map_err(Error::from).and_then(|v| {
                    serde_json::from_value(v).map_err(|e| Error::Control(ControlError::Json(e)))
                });
                let _ = reply.send(result);
            }
            Command::GetTemplateData(reply) => {
                let _ = reply.send(self.control.get_template_data().await.map_err(Error::from));
            }
            Command::PostTemplateData(answers, reply) => {
                let _ = reply.send(self.control.post_template_data(&answers).await.map_err(Error::from));
            }
            Command::EstimateTimeOffset(n, sleep, reply) => {
                let phone = self.status.lock().phone.clone();
                let result = estimate_time_offset(phone, n, sleep).await;
                let _ = reply.send(result);
            }
            Command::GetCalibration(reply) => {
                let _ = reply.send(self.control.get_calibration().await.map_err(Error::from));
            }
        }
    }
}

async fn estimate_time_offset(
    phone: Option<Phone>,
    n: usize,
    sleep: Option<std::time::Duration>,
) -> Result<Option<crate::time_echo::Estimates>, Error> {
    let phone = match phone {
        Some(p) => p,
        None => return Err(Error::Control(ControlError::NoTimeEchoPort)),
    };
    let port = match phone.time_echo_port {
        Some(p) => p,
        None => {
            tracing::warn!("device did not advertise a time echo port");
            return Err(Error::Control(ControlError::NoTimeEchoPort));
        }
    };
    Ok(crate::time_echo::estimate(&phone.ip, port, n, sleep).await?)
}
