//! RTSP session negotiation and the RTP→wallclock timekeeper (C2).
//!
//! Implements RTSP interleaved transport (RFC 2326 §10.12): RTP and
//! RTCP share the TCP control connection, each packet prefixed by a
//! `$<channel><u16 length>` framing byte. Interleave channel numbers
//! are read from the server's `Transport` response rather than assumed
//! to be 0/1 (see Design Notes on the monkey-patch this replaces).

use crate::error::RtspError;
use crate::rtp::{parse_sender_reports, RtpPacket};
use crate::sdp::{parse_primary_media, MediaDescription};
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// One fully negotiated RTSP session, ready to iterate timestamped
/// payloads via [`RtspSession::next_payload`].
pub struct RtspSession {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    rtp_channel: u8,
    rtcp_channel: u8,
    media: MediaDescription,
    offset_seconds: Option<f64>,
}

struct RtspRequest {
    stream: TcpStream,
    cseq: u32,
}

impl RtspRequest {
    async fn connect(host: &str, port: u16) -> Result<Self, RtspError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| RtspError::Connect(e.to_string()))?;
        Ok(Self { stream, cseq: 0 })
    }

    async fn send(&mut self, method: &str, url: &str, extra_headers: &str) -> Result<String, RtspError> {
        self.cseq += 1;
        let request = format!(
            "{method} {url} RTSP/1.0\r\nCSeq: {cseq}\r\n{extra_headers}\r\n",
            method = method,
            url = url,
            cseq = self.cseq,
            extra_headers = extra_headers
        );
        self.stream.write_all(request.as_bytes()).await?;
        read_response(&mut self.stream).await
    }
}

async fn read_response(stream: &mut TcpStream) -> Result<String, RtspError> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(header_end) = find_double_crlf(&buf) {
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
            if let Some(len) = content_length(&headers) {
                while buf.len() < header_end + 4 + len {
                    let n = stream.read(&mut chunk).await?;
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(headers: &str) -> Option<usize> {
    headers
        .lines()
        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
        .and_then(|v| v.parse().ok())
}

fn header_value<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let prefix = format!("{name}:");
    response.lines().find_map(|l| {
        if l.to_ascii_lowercase().starts_with(&prefix.to_ascii_lowercase()) {
            Some(l[prefix.len()..].trim())
        } else {
            None
        }
    })
}

fn body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

fn parse_interleave_channels(transport: &str) -> (u8, u8) {
    for field in transport.split(';') {
        if let Some(spec) = field.trim().strip_prefix("interleaved=") {
            let mut parts = spec.split('-');
            let rtp = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            let rtcp = parts.next().and_then(|s| s.parse().ok()).unwrap_or(rtp + 1);
            return (rtp, rtcp);
        }
    }
    (0, 1)
}

impl RtspSession {
    /// Connect, negotiate DESCRIBE/SETUP/PLAY, and return a session
    /// positioned to stream interleaved RTP/RTCP data.
    pub async fn connect(rtsp_url: &str) -> Result<Self, RtspError> {
        let parsed = url::Url::parse(rtsp_url).map_err(|e| RtspError::Connect(e.to_string()))?;
        let host = parsed.host_str().ok_or_else(|| RtspError::Connect("missing host".into()))?;
        let port = parsed.port().unwrap_or(554);

        let mut req = RtspRequest::connect(host, port).await?;
        let describe = req
            .send("DESCRIBE", rtsp_url, "Accept: application/sdp\r\n")
            .await?;
        let sdp = body(&describe).to_string();
        let media = parse_primary_media(&sdp)?;

        let setup = req
            .send(
                "SETUP",
                rtsp_url,
                "Transport: RTP/AVP/TCP;unicast;interleaved=0-1\r\n",
            )
            .await?;
        let transport = header_value(&setup, "Transport").unwrap_or("interleaved=0-1");
        let (rtp_channel, rtcp_channel) = parse_interleave_channels(transport);
        let session_id = header_value(&setup, "Session").unwrap_or("").to_string();

        req.send(
            "PLAY",
            rtsp_url,
            &format!("Session: {session_id}\r\n"),
        )
        .await?;

        let (read_half, _write_half) = req.stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            rtp_channel,
            rtcp_channel,
            media,
            offset_seconds: None,
        })
    }

    pub fn media(&self) -> &MediaDescription {
        &self.media
    }

    /// Read interleaved frames until the next RTP payload is decoded, or
    /// return `Ok(None)` on clean stream end. RTCP Sender Reports update
    /// the cached offset as a side effect; RTP packets preceding the
    /// first Sender Report are dropped, per §4.2.
    pub async fn next_payload(&mut self) -> Result<Option<(Bytes, f64)>, RtspError> {
        loop {
            let mut magic = [0u8; 1];
            if self.reader.read_exact(&mut magic).await.is_err() {
                return Ok(None);
            }
            if magic[0] != b'$' {
                continue;
            }
            let mut header = [0u8; 3];
            self.reader.read_exact(&mut header).await?;
            let channel = header[0];
            let len = u16::from_be_bytes([header[1], header[2]]) as usize;
            let mut payload = vec![0u8; len];
            self.reader.read_exact(&mut payload).await?;

            if channel == self.rtcp_channel {
                if let Some(sr) = parse_sender_reports(&payload).into_iter().last() {
                    let offset =
                        sr.ntp_unix_seconds - sr.rtp_timestamp as f64 / self.media.clock_rate as f64;
                    tracing::debug!(
                        rtp_timestamp = sr.rtp_timestamp,
                        ntp_unix_seconds = sr.ntp_unix_seconds,
                        offset_seconds = offset,
                        "RTCP sender report received, wallclock offset updated"
                    );
                    self.offset_seconds = Some(offset);
                }
                continue;
            }
            if channel == self.rtp_channel {
                if let Some(offset) = self.offset_seconds {
                    if let Some(packet) = RtpPacket::from_bytes(&payload) {
                        let wallclock =
                            packet.header.timestamp as f64 / self.media.clock_rate as f64 + offset;
                        return Ok(Some((packet.payload, wallclock)));
                    }
                }
                // dropped silently: either unparseable or no SR yet
                continue;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_channels_default_to_zero_one() {
        assert_eq!(parse_interleave_channels("RTP/AVP/TCP;unicast"), (0, 1));
    }

    #[test]
    fn interleave_channels_honor_server_assignment() {
        assert_eq!(
            parse_interleave_channels("RTP/AVP/TCP;unicast;interleaved=4-5"),
            (4, 5)
        );
    }

    #[test]
    fn content_length_is_case_insensitive() {
        let headers = "RTSP/1.0 200 OK\r\nContent-Length: 42\r\n";
        assert_eq!(content_length(headers), Some(42));
    }
}
