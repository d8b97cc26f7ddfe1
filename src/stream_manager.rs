//! Per-sensor stream lifecycle (C6, §4.6).
//!
//! Rules: any `handle_sensor_update` always cancels the running task
//! then maybe restarts it, and always stores the latest snapshot. The
//! `should_be_streaming` setter only acts when the value actually
//! changes.

use crate::decoders::{eye_events, gaze, imu, VideoDecoder};
use crate::device::shared::SharedHandle;
use crate::models::{Sensor, SensorName};
use crate::rtsp::RtspSession;
use tokio::task::JoinHandle;

pub struct StreamManager {
    sensor_name: SensorName,
    should_be_streaming: bool,
    recent_sensor: Option<Sensor>,
    task: Option<JoinHandle<()>>,
    shared: SharedHandle,
}

impl StreamManager {
    pub fn new(sensor_name: SensorName, shared: SharedHandle) -> Self {
        Self {
            sensor_name,
            should_be_streaming: false,
            recent_sensor: None,
            task: None,
            shared,
        }
    }

    pub fn should_be_streaming(&self) -> bool {
        self.should_be_streaming
    }

    pub fn set_should_be_streaming(&mut self, should_stream: bool) {
        if self.should_be_streaming == should_stream {
            return;
        }
        self.should_be_streaming = should_stream;
        if should_stream {
            if let Some(sensor) = self.recent_sensor.clone() {
                self.start_if_intended(&sensor);
            }
        } else {
            self.stop_if_running();
        }
    }

    pub fn handle_sensor_update(&mut self, sensor: Sensor) {
        self.stop_if_running();
        self.start_if_intended(&sensor);
        self.recent_sensor = Some(sensor);
    }

    fn start_if_intended(&mut self, sensor: &Sensor) {
        if sensor.connected && self.should_be_streaming {
            if let Some(url) = sensor.url() {
                tracing::info!(sensor = ?self.sensor_name, %url, "starting stream");
                let sensor_name = self.sensor_name;
                let shared = self.shared.clone();
                self.task = Some(tokio::spawn(async move {
                    run_stream_loop(sensor_name, url, shared).await;
                }));
            }
        }
    }

    fn stop_if_running(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::info!(sensor = ?self.sensor_name, "cancelling prior stream connection");
            task.abort();
        }
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.stop_if_running();
    }
}

/// The stream-read loop: opens RTSP with auto-reconnect, decodes per
/// §4.3, and writes samples into the shared mailboxes/matcher.
async fn run_stream_loop(sensor_name: SensorName, url: String, shared: SharedHandle) {
    if let Some(matcher) = shared.matcher.lock().as_mut() {
        matcher.clear();
    }

    loop {
        let mut session = match RtspSession::connect(&url).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(sensor = ?sensor_name, error = %e, "rtsp connect failed, retrying");
                tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
                continue;
            }
        };

        let mut video_decoder = if sensor_name == SensorName::World || sensor_name == SensorName::Eyes {
            match VideoDecoder::new(&session.media().sprop_parameter_sets) {
                Ok(d) => Some(d),
                Err(e) => {
                    tracing::error!(sensor = ?sensor_name, error = %e, "unknown codec, terminating stream");
                    return;
                }
            }
        } else {
            None
        };

        loop {
            match session.next_payload().await {
                Ok(Some((payload, ts))) => {
                    if let Err(terminate) =
                        dispatch_sample(sensor_name, &payload, ts, &mut video_decoder, &shared)
                    {
                        tracing::error!(sensor = ?sensor_name, error = %terminate, "fatal decode error, terminating stream");
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(sensor = ?sensor_name, error = %e, "rtsp transport error, reconnecting");
                    break;
                }
            }
        }
    }
}

fn dispatch_sample(
    sensor_name: SensorName,
    payload: &[u8],
    ts: f64,
    video_decoder: &mut Option<VideoDecoder>,
    shared: &SharedHandle,
) -> Result<(), crate::error::DecodeError> {
    match sensor_name {
        SensorName::Gaze => {
            let datum = gaze::decode(payload, ts)?;
            shared.gaze.put(datum);
            if let Some(matcher) = shared.matcher.lock().as_mut() {
                matcher.push_gaze(ts, datum);
            }
        }
        SensorName::World => {
            if let Some(decoder) = video_decoder {
                if let Some(frame) = decoder.push_fragment(payload, ts)? {
                    // The very first frame, produced before any packet
                    // boundary has been observed, carries a null
                    // timestamp and must be skipped entirely (§4.3).
                    if let Some(frame_ts) = frame.timestamp_unix_seconds {
                        shared.world.put(frame.clone());
                        let outcome = shared
                            .matcher
                            .lock()
                            .as_mut()
                            .map(|m| m.match_world_frame(frame, frame_ts));
                        if let Some(outcome) = outcome {
                            if let Some(m) = outcome.scene {
                                shared.matched_scene.put(m);
                            }
                            if let Some(m) = outcome.scene_eyes {
                                shared.matched_scene_eyes.put(m);
                            }
                        }
                    }
                }
            }
        }
        SensorName::Eyes => {
            if let Some(decoder) = video_decoder {
                if let Some(frame) = decoder.push_fragment(payload, ts)? {
                    if let Some(frame_ts) = frame.timestamp_unix_seconds {
                        shared.eyes.put(frame.clone());
                        if let Some(matcher) = shared.matcher.lock().as_mut() {
                            matcher.push_eyes(frame_ts, frame);
                        }
                    }
                }
            }
        }
        SensorName::Imu => {
            let sample = imu::decode(payload, ts)?;
            shared.imu.put(sample);
        }
        SensorName::EyeEvents => {
            if let Some(sample) = eye_events::decode(payload, ts)? {
                shared.eye_events.put(sample);
            }
        }
    }
    Ok(())
}
