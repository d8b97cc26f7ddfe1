//! Layered error taxonomy. Each component owns a narrow `thiserror` enum;
//! [`Error`] unifies them for the orchestrator's public, fallible methods.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NalError {
    #[error("forbidden_zero_bit set on NAL header")]
    ForbiddenBit,
}

#[derive(Debug, Error)]
pub enum RtspError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("SDP data not available: {0}")]
    Sdp(String),
    #[error("failed to connect: {0}")]
    Connect(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown gaze payload length: {0}")]
    UnknownGazeLength(usize),
    #[error("unknown eye event type: {0}")]
    UnknownEyeEventType(i32),
    #[error("eye event payload too short: got {got} bytes, need at least {need}")]
    ShortEyeEventPayload { got: usize, need: usize },
    #[error(transparent)]
    Protobuf(#[from] prost::DecodeError),
    #[error("codec error: {0}")]
    Codec(String),
    #[error(transparent)]
    Nal(#[from] NalError),
}

#[derive(Debug, Error)]
pub enum TimeEchoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("echo validation mismatch")]
    EchoMismatch,
    #[error("short read from device")]
    ShortRead,
}

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("unknown component model: {0}")]
    UnknownComponent(String),
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("device returned {status}: {message}")]
    Device { status: u16, message: String },
    #[error(transparent)]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("time echo port not advertised by device")]
    NoTimeEchoPort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFieldError {
    pub item_id: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Nal(#[from] NalError),
    #[error(transparent)]
    Rtsp(#[from] RtspError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    TimeEcho(#[from] TimeEchoError),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("template validation failed: {0:?}")]
    Template(Vec<TemplateFieldError>),
    #[error("operation timed out")]
    Timeout,
    #[error("worker thread is no longer running")]
    WorkerGone,
}

pub type Result<T> = std::result::Result<T, Error>;
