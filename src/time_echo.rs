//! Time-echo clock-offset estimation protocol (C4, §4.4).

use crate::error::TimeEchoError;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    pub samples: Vec<f64>,
}

impl Estimate {
    fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let stddev = variance.sqrt();
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = if sorted.len() % 2 == 0 {
            let mid = sorted.len() / 2;
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[sorted.len() / 2]
        };
        Some(Self {
            mean,
            stddev,
            median,
            samples: samples.to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Estimates {
    pub roundtrip_ms: Estimate,
    pub offset_ms: Estimate,
}

fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

async fn measure_once(stream: &mut TcpStream) -> Result<(f64, f64), TimeEchoError> {
    let t1 = now_unix_millis();
    stream.write_all(&t1.to_be_bytes()).await?;

    let mut response = [0u8; 16];
    let n = stream.read(&mut response).await?;
    if n < 16 {
        return Err(TimeEchoError::ShortRead);
    }
    let t2 = now_unix_millis();

    let echoed_t1 = u64::from_be_bytes(response[0..8].try_into().unwrap());
    let device_time = u64::from_be_bytes(response[8..16].try_into().unwrap());
    if echoed_t1 != t1 {
        return Err(TimeEchoError::EchoMismatch);
    }

    let roundtrip = (t2 - t1) as f64;
    let offset = (((t1 + t2) as f64 / 2.0).round()) - device_time as f64;
    Ok((roundtrip, offset))
}

/// Collect `n` valid measurements (after discarding one warm-up round)
/// against `host:port` and summarize them. Per-measurement failures are
/// logged and skipped; too few valid samples yields `None`.
pub async fn estimate(
    host: &str,
    port: u16,
    n: usize,
    inter_measurement_sleep: Option<Duration>,
) -> Result<Option<Estimates>, TimeEchoError> {
    let mut stream = TcpStream::connect((host, port)).await?;

    // Warm-up round: its measurement is discarded regardless of success,
    // but unlike the per-iteration loop below a failure here is not
    // swallowed — it usually means the stream is desynced before a
    // single real measurement has been taken, so it is logged and
    // propagated rather than silently skipped.
    if let Err(e) = measure_once(&mut stream).await {
        tracing::warn!(error = %e, "time echo warm-up measurement failed");
        return Err(e);
    }

    let mut roundtrips = Vec::with_capacity(n);
    let mut offsets = Vec::with_capacity(n);
    for _ in 0..n {
        match measure_once(&mut stream).await {
            Ok((roundtrip, offset)) => {
                roundtrips.push(roundtrip);
                offsets.push(offset);
            }
            Err(e) => {
                tracing::warn!(error = %e, "time echo measurement skipped");
            }
        }
        if let Some(sleep) = inter_measurement_sleep {
            tokio::time::sleep(sleep).await;
        }
    }

    let roundtrip_ms = Estimate::from_samples(&roundtrips);
    let offset_ms = Estimate::from_samples(&offsets);
    Ok(match (roundtrip_ms, offset_ms) {
        (Some(roundtrip_ms), Some(offset_ms)) => Some(Estimates {
            roundtrip_ms,
            offset_ms,
        }),
        _ => None,
    })
}

/// Convert a client-side Unix-epoch instant (ms) to the device's clock.
pub fn client_to_device(client_ms: i64, offset_ms: f64) -> i64 {
    client_ms - offset_ms.round() as i64
}

/// Convert a device-side Unix-epoch instant (ms) to the client's clock.
pub fn device_to_client(device_ms: i64, offset_ms: f64) -> i64 {
    device_ms + offset_ms.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_time_echo_offset_and_roundtrip() {
        let t1 = 1_000u64;
        let t2 = 1_020u64;
        let device_time = 800u64;
        let roundtrip = (t2 - t1) as f64;
        let offset = (((t1 + t2) as f64 / 2.0).round()) - device_time as f64;
        assert_eq!(roundtrip, 20.0);
        assert_eq!(offset, 210.0);
    }

    #[test]
    fn conversion_round_trips_within_rounding() {
        let client = 1_700_000_000_000i64;
        let offset = 210.0;
        let device = client_to_device(client, offset);
        let back = device_to_client(device, offset);
        assert!((back - client).abs() <= 1);
    }

    #[test]
    fn estimate_computes_mean_stddev_median() {
        let est = Estimate::from_samples(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(est.mean, 20.0);
        assert_eq!(est.median, 20.0);
        assert!(est.stddev > 0.0);
    }

    #[test]
    fn empty_samples_yield_no_estimate() {
        assert!(Estimate::from_samples(&[]).is_none());
    }
}
