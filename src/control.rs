//! Control-plane client (C9): HTTP (status/recording/event/template/
//! calibration) plus the reconnecting WebSocket status-update channel.
//!
//! Grounded on `device.py`'s async HTTP+WebSocket wrapper; adapted to
//! `reqwest` for HTTP and `tokio-tungstenite`'s client-side
//! `connect_async` for the notifier (the teacher's `rust/` crate uses
//! `tokio-tungstenite` only on the server/`accept_async` side — the
//! client direction is the same crate, opposite entry point).

use crate::error::ControlError;
use crate::models::{parse_component, Component, Event, Status};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    result: T,
    #[serde(default)]
    #[allow(dead_code)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: String,
}

pub struct ControlClient {
    http: reqwest::Client,
    base_url: String,
    ws_url: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ControlError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorEnvelope>()
            .await
            .map(|e| e.message)
            .unwrap_or_default();
        tracing::warn!(status, message = %message, "device control request returned a non-2xx response");
        Err(ControlError::Device { status, message })
    }
}

impl ControlClient {
    pub fn new(ip: &str, port: u16, http_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .expect("reqwest client configuration is valid");
        Self {
            http,
            base_url: format!("http://{ip}:{port}/api"),
            ws_url: format!("ws://{ip}:{port}/api/status"),
        }
    }

    pub async fn get_status(&self) -> Result<Status, ControlError> {
        let response = self.http.get(format!("{}/status", self.base_url)).send().await?;
        let response = check_status(response).await?;
        let envelope: ApiEnvelope<Vec<serde_json::Value>> = response.json().await?;
        let mut components = Vec::new();
        for raw in envelope.result {
            if let Some(component) = parse_component(raw).unwrap_or(None) {
                components.push(component);
            }
        }
        Ok(Status::from_components(components))
    }

    pub async fn recording_start(&self) -> Result<String, ControlError> {
        let response = self
            .http
            .post(format!("{}/recording:start", self.base_url))
            .send()
            .await?;
        let response = check_status(response).await?;
        #[derive(Deserialize)]
        struct Id {
            id: String,
        }
        let envelope: ApiEnvelope<Id> = response.json().await?;
        Ok(envelope.result.id)
    }

    pub async fn recording_stop_and_save(&self) -> Result<(), ControlError> {
        let response = self
            .http
            .post(format!("{}/recording:stop_and_save", self.base_url))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn recording_cancel(&self) -> Result<(), ControlError> {
        let response = self
            .http
            .post(format!("{}/recording:cancel", self.base_url))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn send_event(&self, name: &str, timestamp_ns: Option<i64>) -> Result<Event, ControlError> {
        let body = json!({ "name": name, "timestamp": timestamp_ns });
        let response = self.http.post(format!("{}/event", self.base_url)).json(&body).send().await?;
        let response = check_status(response).await?;
        let envelope: ApiEnvelope<Event> = response.json().await?;
        Ok(envelope.result)
    }

    pub async fn get_template_def(&self) -> Result<serde_json::Value, ControlError> {
        let response = self.http.get(format!("{}/template_def", self.base_url)).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn get_template_data(&self) -> Result<HashMap<String, Vec<String>>, ControlError> {
        let response = self.http.get(format!("{}/template_data", self.base_url)).send().await?;
        let response = check_status(response).await?;
        let envelope: ApiEnvelope<HashMap<String, Vec<String>>> = response.json().await?;
        Ok(envelope.result)
    }

    pub async fn post_template_data(
        &self,
        answers: &HashMap<String, Vec<String>>,
    ) -> Result<(), ControlError> {
        // an empty answer list is wire-represented as [""]
        let wire: HashMap<&String, Vec<String>> = answers
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    (k, vec![String::new()])
                } else {
                    (k, v.clone())
                }
            })
            .collect();
        let response = self
            .http
            .post(format!("{}/template_data", self.base_url))
            .json(&wire)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn get_calibration(&self) -> Result<Vec<u8>, ControlError> {
        let response = self
            .http
            .get(format!("{}/../calibration.bin", self.base_url))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// A reconnecting stream of status-update components. Transient
    /// closures reconnect transparently rather than surfacing an error.
    pub fn status_updates(&self) -> impl Stream<Item = Component> + '_ {
        async_stream::stream! {
            loop {
                match tokio_tungstenite::connect_async(&self.ws_url).await {
                    Ok((mut ws, _)) => {
                        while let Some(message) = ws.next().await {
                            match message {
                                Ok(tokio_tungstenite::tungstenite::Message::Text(text)) => {
                                    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                                        if let Ok(Some(component)) = parse_component(value) {
                                            yield component;
                                        }
                                    }
                                }
                                Ok(_) => continue,
                                Err(_) => break,
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "status websocket connect failed, retrying");
                    }
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
