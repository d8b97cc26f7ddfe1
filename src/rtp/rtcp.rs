//! RTCP Sender Report parsing (RFC 3550 §6.4.1), used by the timekeeper
//! (C2) to fold RTP timestamps into wallclock seconds.

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch
/// (1970-01-01).
const NTP_UNIX_EPOCH_OFFSET_SECONDS: u64 = 2_208_988_800;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SenderReport {
    pub ssrc: u32,
    pub ntp_unix_seconds: f64,
    pub rtp_timestamp: u32,
    pub packet_count: u32,
    pub octet_count: u32,
}

/// Parse every RTCP Sender Report packet found in a compound RTCP
/// packet buffer. Non-SR packet types are skipped; malformed trailing
/// bytes stop the scan rather than erroring, since RTCP packets often
/// pad to a multiple of 4 bytes.
pub fn parse_sender_reports(buf: &[u8]) -> Vec<SenderReport> {
    let mut reports = Vec::new();
    let mut offset = 0usize;
    while offset + 4 <= buf.len() {
        let version = buf[offset] >> 6;
        if version != 2 {
            break;
        }
        let packet_type = buf[offset + 1];
        let length_words = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]) as usize;
        let packet_len = (length_words + 1) * 4;
        if offset + packet_len > buf.len() {
            break;
        }
        if packet_type == 200 && packet_len >= 28 {
            let p = &buf[offset..offset + packet_len];
            let ssrc = u32::from_be_bytes([p[4], p[5], p[6], p[7]]);
            let ntp_seconds = u32::from_be_bytes([p[8], p[9], p[10], p[11]]) as u64;
            let ntp_fraction = u32::from_be_bytes([p[12], p[13], p[14], p[15]]) as f64;
            let rtp_timestamp = u32::from_be_bytes([p[16], p[17], p[18], p[19]]);
            let packet_count = u32::from_be_bytes([p[20], p[21], p[22], p[23]]);
            let octet_count = u32::from_be_bytes([p[24], p[25], p[26], p[27]]);
            let ntp_unix_seconds = (ntp_seconds.saturating_sub(NTP_UNIX_EPOCH_OFFSET_SECONDS))
                as f64
                + ntp_fraction / 4_294_967_296.0;
            reports.push(SenderReport {
                ssrc,
                ntp_unix_seconds,
                rtp_timestamp,
                packet_count,
                octet_count,
            });
        }
        offset += packet_len;
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_sr(ntp_seconds: u32, ntp_fraction: u32, rtp_ts: u32) -> Vec<u8> {
        let mut p = vec![0u8; 28];
        p[0] = 0x80;
        p[1] = 200;
        p[2..4].copy_from_slice(&6u16.to_be_bytes());
        p[4..8].copy_from_slice(&0xaaaa_bbbbu32.to_be_bytes());
        p[8..12].copy_from_slice(&ntp_seconds.to_be_bytes());
        p[12..16].copy_from_slice(&ntp_fraction.to_be_bytes());
        p[16..20].copy_from_slice(&rtp_ts.to_be_bytes());
        p[20..24].copy_from_slice(&1u32.to_be_bytes());
        p[24..28].copy_from_slice(&100u32.to_be_bytes());
        p
    }

    #[test]
    fn parses_single_sender_report() {
        let buf = build_sr(2_208_988_800 + 1_700_000_000, 0, 45_000);
        let reports = parse_sender_reports(&buf);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].rtp_timestamp, 45_000);
        assert!((reports[0].ntp_unix_seconds - 1_700_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn stops_on_truncated_packet() {
        let mut buf = build_sr(2_208_988_800, 0, 0);
        buf.truncate(10);
        assert!(parse_sender_reports(&buf).is_empty());
    }
}
