pub mod packet;
pub mod rtcp;

pub use packet::{RtpHeader, RtpPacket};
pub use rtcp::{parse_sender_reports, SenderReport};
