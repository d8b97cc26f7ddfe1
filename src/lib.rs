//! Client library for a wearable eye-tracker's on-device Realtime API.
//!
//! The core is a streaming and synchronization engine: an RTSP/RTCP
//! timekeeper that folds Sender Reports into wallclock timestamps, a
//! family of per-sensor wire decoders, a time-offset estimation
//! protocol, a typed status model, a concurrent stream manager, a
//! cross-stream timestamp matcher, and a synchronous device
//! orchestrator backed by a single async worker thread. See
//! [`device::Device`] for the main entry point.

pub mod config;
pub mod control;
pub mod decoders;
pub mod device;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod matching;
pub mod models;
pub mod nal;
pub mod rtp;
pub mod rtsp;
pub mod sample;
pub mod sdp;
pub mod stream_manager;
pub mod template;
pub mod time_echo;

pub use config::ClientConfig;
pub use device::Device;
pub use error::{Error, Result};
