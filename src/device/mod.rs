//! The synchronous device orchestrator (C8, §4.8, §9 Design Notes).
//!
//! A single background OS thread hosts the async runtime; the caller
//! gets a synchronous, blocking-with-timeout API backed by single-slot
//! mailboxes and a thread-safe event manager. Control actions are
//! one-shot async tasks spun on the worker loop and awaited from the
//! caller via a `oneshot` reply channel.

pub mod events;
pub mod shared;
mod worker;

use crate::config::ClientConfig;
use crate::control::ControlClient;
use crate::error::Error;
use crate::models::{Event, SensorName, Status};
use crate::sample::{EyeEventSample, GazeDatum, ImuSample, MatchedGazeEyesScene, MatchedGazeScene, VideoFrame};
use crate::template::Template;
use events::EventKey;
use shared::SharedHandle;
use std::collections::HashMap;
use std::time::Duration;
use worker::{Command, Worker};

pub struct Device {
    shared: SharedHandle,
    status: std::sync::Arc<parking_lot::Mutex<Status>>,
    events: std::sync::Arc<events::AsyncEventManager>,
    commands: tokio::sync::mpsc::UnboundedSender<Command>,
    runtime_thread: Option<std::thread::JoinHandle<()>>,
}

impl Device {
    /// Perform one synchronous status GET, then spawn the worker thread
    /// that owns the event loop and the status-update notifier.
    pub fn connect(ip: &str, port: u16, config: ClientConfig) -> Result<Self, Error> {
        let bootstrap_runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Rtsp(crate::error::RtspError::Io(e)))?;
        let control = ControlClient::new(ip, port, Duration::from_millis(config.http_timeout_ms));
        let initial_status = bootstrap_runtime.block_on(control.get_status())?;

        let shared = shared::new_shared(config.match_cache_capacity);
        let (worker, events) = Worker::new(ip, port, initial_status, shared.clone(), &config);
        let status = worker.status.clone();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        let runtime_thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("worker tokio runtime builds");
            runtime.block_on(worker.run(rx));
        });

        Ok(Self {
            shared,
            status,
            events,
            commands: tx,
            runtime_thread: Some(runtime_thread),
        })
    }

    // -- status & errors ---------------------------------------------

    pub fn status(&self) -> Status {
        self.status.lock().clone()
    }

    /// Returns and clears the accumulated error log (Recording ERROR
    /// messages and Sensor `stream_error` flags).
    pub fn get_errors(&self) -> Vec<String> {
        std::mem::take(&mut self.shared.errors.lock())
    }

    // -- streaming control --------------------------------------------

    pub fn streaming_start(&self, name: Option<SensorName>) {
        self.dispatch_streaming_event(name, true);
    }

    pub fn streaming_stop(&self, name: Option<SensorName>) {
        self.dispatch_streaming_event(name, false);
    }

    fn dispatch_streaming_event(&self, name: Option<SensorName>, start: bool) {
        let keys: Vec<EventKey> = match name {
            Some(n) => vec![streaming_event_key(n, start)],
            None => [
                SensorName::Gaze,
                SensorName::World,
                SensorName::Eyes,
                SensorName::Imu,
                SensorName::EyeEvents,
            ]
            .into_iter()
            .map(|n| streaming_event_key(n, start))
            .collect(),
        };
        for key in keys {
            self.events.trigger_threadsafe(key);
        }
    }

    pub fn is_currently_streaming(&self, name: SensorName) -> bool {
        self.status
            .lock()
            .sensors
            .iter()
            .any(|s| s.sensor == name && s.connected)
    }

    fn start_stream_if_needed(&self, name: SensorName) {
        if !self.is_currently_streaming(name) {
            self.streaming_start(Some(name));
        }
    }

    // -- receive_* --------------------------------------------------

    pub fn receive_gaze_datum(&self, timeout: Option<Duration>) -> Option<GazeDatum> {
        self.start_stream_if_needed(SensorName::Gaze);
        self.shared.gaze.take_blocking(timeout)
    }

    pub fn receive_scene_video_frame(&self, timeout: Option<Duration>) -> Option<VideoFrame> {
        self.start_stream_if_needed(SensorName::World);
        self.shared.world.take_blocking(timeout)
    }

    pub fn receive_eyes_video_frame(&self, timeout: Option<Duration>) -> Option<VideoFrame> {
        self.start_stream_if_needed(SensorName::Eyes);
        self.shared.eyes.take_blocking(timeout)
    }

    pub fn receive_imu_datum(&self, timeout: Option<Duration>) -> Option<ImuSample> {
        self.start_stream_if_needed(SensorName::Imu);
        self.shared.imu.take_blocking(timeout)
    }

    pub fn receive_eye_events(&self, timeout: Option<Duration>) -> Option<EyeEventSample> {
        self.start_stream_if_needed(SensorName::EyeEvents);
        self.shared.eye_events.take_blocking(timeout)
    }

    pub fn receive_matched_scene_video_frame_and_gaze(
        &self,
        timeout: Option<Duration>,
    ) -> Option<MatchedGazeScene> {
        self.start_stream_if_needed(SensorName::World);
        self.start_stream_if_needed(SensorName::Gaze);
        self.shared.matched_scene.take_blocking(timeout)
    }

    pub fn receive_matched_scene_and_eyes_video_frames_and_gaze(
        &self,
        timeout: Option<Duration>,
    ) -> Option<MatchedGazeEyesScene> {
        self.start_stream_if_needed(SensorName::World);
        self.start_stream_if_needed(SensorName::Gaze);
        self.start_stream_if_needed(SensorName::Eyes);
        self.shared.matched_scene_eyes.take_blocking(timeout)
    }

    // -- one-shot control actions -------------------------------------

    fn call<T: Send + 'static>(
        &self,
        build: impl FnOnce(tokio::sync::oneshot::Sender<Result<T, Error>>) -> Command,
    ) -> Result<T, Error> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.commands.send(build(tx)).map_err(|_| Error::WorkerGone)?;
        rx.blocking_recv().map_err(|_| Error::WorkerGone)?
    }

    pub fn get_status(&self) -> Result<Status, Error> {
        self.call(Command::GetStatus)
    }

    pub fn recording_start(&self) -> Result<String, Error> {
        self.call(Command::RecordingStart)
    }

    pub fn recording_stop_and_save(&self) -> Result<(), Error> {
        self.call(Command::RecordingStopAndSave)
    }

    pub fn recording_cancel(&self) -> Result<(), Error> {
        self.call(Command::RecordingCancel)
    }

    pub fn send_event(&self, name: &str, timestamp_ns: Option<i64>) -> Result<Event, Error> {
        let name = name.to_string();
        self.call(|reply| Command::SendEvent(name, timestamp_ns, reply))
    }

    pub fn get_template(&self) -> Result<Template, Error> {
        self.call(Command::GetTemplate)
    }

    pub fn get_template_data(&self) -> Result<HashMap<String, Vec<String>>, Error> {
        self.call(Command::GetTemplateData)
    }

    pub fn post_template_data(&self, answers: HashMap<String, Vec<String>>) -> Result<(), Error> {
        self.call(|reply| Command::PostTemplateData(answers, reply))
    }

    pub fn estimate_time_offset(
        &self,
        n: usize,
        sleep: Option<Duration>,
    ) -> Result<Option<crate::time_echo::Estimates>, Error> {
        self.call(|reply| Command::EstimateTimeOffset(n, sleep, reply))
    }

    pub fn get_calibration(&self) -> Result<Vec<u8>, Error> {
        self.call(Command::GetCalibration)
    }

    pub fn close(&mut self) {
        self.events.trigger_threadsafe(EventKey::ShouldWorkerClose);
        if let Some(handle) = self.runtime_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.runtime_thread.is_some() {
            self.close();
        }
    }
}

fn streaming_event_key(name: SensorName, start: bool) -> EventKey {
    match (name, start) {
        (SensorName::Gaze, true) => EventKey::ShouldStartGaze,
        (SensorName::Gaze, false) => EventKey::ShouldStopGaze,
        (SensorName::World, true) => EventKey::ShouldStartWorld,
        (SensorName::World, false) => EventKey::ShouldStopWorld,
        (SensorName::Eyes, true) => EventKey::ShouldStartEyes,
        (SensorName::Eyes, false) => EventKey::ShouldStopEyes,
        (SensorName::Imu, true) => EventKey::ShouldStartImu,
        (SensorName::Imu, false) => EventKey::ShouldStopImu,
        (SensorName::EyeEvents, true) => EventKey::ShouldStartEyeEvents,
        (SensorName::EyeEvents, false) => EventKey::ShouldStopEyeEvents,
    }
}
