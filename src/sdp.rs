//! Minimal SDP parsing (RFC 4566), just enough to find the primary
//! media's clock rate, encoding, and H.264 parameter sets (§4.2, §6).

use crate::error::RtspError;

#[derive(Debug, Clone, Default)]
pub struct MediaDescription {
    pub media_type: String,
    pub clock_rate: u32,
    pub encoding: String,
    pub sprop_parameter_sets: Vec<Vec<u8>>,
}

pub fn parse_primary_media(sdp: &str) -> Result<MediaDescription, RtspError> {
    let mut media_type = None;
    let mut clock_rate = None;
    let mut encoding = None;
    let mut sprop = Vec::new();
    let mut in_primary_media = false;

    for line in sdp.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("m=") {
            let kind = rest.split_whitespace().next().unwrap_or("");
            if !in_primary_media && (kind == "video" || kind == "application") {
                media_type = Some(kind.to_string());
                in_primary_media = true;
            } else {
                in_primary_media = false;
            }
            continue;
        }
        if !in_primary_media {
            continue;
        }
        if let Some(rest) = line.strip_prefix("a=rtpmap:") {
            // "<payload> <encoding>/<clock-rate>[/<channels>]"
            if let Some(spec) = rest.split_whitespace().nth(1) {
                let mut parts = spec.split('/');
                if let Some(enc) = parts.next() {
                    encoding = Some(enc.to_lowercase());
                }
                if let Some(rate) = parts.next() {
                    clock_rate = rate.parse::<u32>().ok();
                }
            }
        } else if let Some(rest) = line.strip_prefix("a=fmtp:") {
            if let Some(params) = rest.split_once(' ').map(|(_, p)| p) {
                for kv in params.split(';') {
                    let kv = kv.trim();
                    if let Some(b64) = kv.strip_prefix("sprop-parameter-sets=") {
                        for entry in b64.split(',') {
                            use base64::Engine;
                            if let Ok(bytes) =
                                base64::engine::general_purpose::STANDARD.decode(entry.trim())
                            {
                                sprop.push(bytes);
                            }
                        }
                    }
                }
            }
        }
    }

    let media_type = media_type.ok_or_else(|| RtspError::Sdp("SDP data not available".into()))?;
    let clock_rate = clock_rate.ok_or_else(|| RtspError::Sdp("SDP data not available".into()))?;
    let encoding = encoding.ok_or_else(|| RtspError::Sdp("SDP data not available".into()))?;

    Ok(MediaDescription {
        media_type,
        clock_rate,
        encoding,
        sprop_parameter_sets: sprop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_video_media_with_parameter_sets() {
        let sdp = "\
v=0\r
o=- 0 0 IN IP4 127.0.0.1\r
s=stream\r
t=0 0\r
m=video 0 RTP/AVP 96\r
a=rtpmap:96 H264/90000\r
a=fmtp:96 packetization-mode=1;sprop-parameter-sets=Z0IAH6kYFJ8=,aM4xSA==\r
";
        let media = parse_primary_media(sdp).unwrap();
        assert_eq!(media.media_type, "video");
        assert_eq!(media.clock_rate, 90_000);
        assert_eq!(media.encoding, "h264");
        assert_eq!(media.sprop_parameter_sets.len(), 2);
    }

    #[test]
    fn parses_application_media_for_gaze() {
        let sdp = "\
v=0\r
m=application 0 RTP/AVP 97\r
a=rtpmap:97 gaze/1000\r
";
        let media = parse_primary_media(sdp).unwrap();
        assert_eq!(media.media_type, "application");
        assert_eq!(media.clock_rate, 1000);
        assert_eq!(media.encoding, "gaze");
    }

    #[test]
    fn missing_rtpmap_is_an_sdp_error() {
        let sdp = "v=0\r\nm=video 0 RTP/AVP 96\r\n";
        assert!(parse_primary_media(sdp).is_err());
    }
}
