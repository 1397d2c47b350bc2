//! Protocol family and version negotiation
//!
//! A registered phone speaks one of two families, SCCP for the classic
//! sets and SPCP for the small business sets, at a version both sides
//! support. Beyond picking payload layouts, the negotiated version
//! decides a bundle of server-side behaviors: which call info message to
//! send, whether display text goes out in fixed or variable width
//! messages, and the filler bytes in the registration ack. Each
//! [`ProtocolDescriptor`] row captures one such bundle.

use std::net::{IpAddr, SocketAddr};

use tracing::{debug, info};

use crate::codec::SkinnyCodec;
use crate::error::{Result, SccpError};
use crate::net;
use crate::packet::{
    CallInfo, CallInfoDynamic, DialedNumber, DisplayDynamicNotify, DisplayDynamicPriNotify,
    DisplayDynamicPromptStatus, DisplayNotify, DisplayPriNotify, DisplayPromptStatus, ForwardStat,
    OpenMultiMediaChannel, OpenReceiveChannel, OpenReceiveChannelAck, Payload, RegisterAck,
    SccpMessage, StartMediaTransmission, StartMultiMediaTransmission, VideoParameters,
};

/// Seconds of RTP silence before the phone tears a channel down
const RTP_TIMEOUT: u32 = 10;

/// Receive buffer hint carried by the v17 open receive channel layout
const RECEIVE_BUFFER_HINT: u32 = 0x0FA0;

/// DSCP dword sent with video transmissions
const VIDEO_DSCP: u32 = 136;

/// H.264 shaping defaults advertised to the phone
const VIDEO_PROFILE: u32 = 64;
const VIDEO_LEVEL: u32 = 50;
const VIDEO_MACROBLOCKS_PER_SEC: u32 = 40500;
const VIDEO_MACROBLOCKS_PER_FRAME: u32 = 1620;
const VIDEO_DEC_PIC_BUF: u32 = 8100;
const VIDEO_BR_AND_CPB: u32 = 10000;
const VIDEO_PICTURE_FORMAT: u32 = 4;
const VIDEO_PICTURE_MPI: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolFamily {
    Sccp,
    Spcp,
}

impl ProtocolFamily {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sccp => "SCCP",
            Self::Spcp => "SPCP",
        }
    }
}

/// Which call info message a generation sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallInfoStyle {
    /// Fixed-width CallInfo message
    Static,
    /// Variable-width CallInfoDynamic with 12 party fields
    Dynamic12,
    /// Variable-width CallInfoDynamic with 16 party fields
    Dynamic16,
}

/// Fixed or variable width display text messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisplayStyle {
    Static,
    Dynamic,
}

/// Media channel message generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaGeneration {
    V3,
    V17,
}

/// Everything RTP setup needs, shared by the media channel builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFlow {
    pub conference_id: u32,
    pub passthru_party_id: u32,
    pub codec: SkinnyCodec,
    pub ms_packet_size: u32,
    pub dtmf_payload: u32,
    pub vad: bool,
    pub silence_suppression: bool,
    /// Precedence dword, the session's ToS value
    pub precedence: u32,
    pub remote: SocketAddr,
}

/// Everything video channel setup needs, shared by the multimedia builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFlow {
    pub conference_id: u32,
    pub passthru_party_id: u32,
    pub codec: SkinnyCodec,
    /// RTP payload type negotiated for the stream
    pub payload_type: u32,
    pub bit_rate: u32,
    pub line_instance: u32,
    pub call_reference: u32,
    pub remote: SocketAddr,
}

/// Behavior bundle for one protocol version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    pub family: ProtocolFamily,
    pub version: u8,
    register_ack_filler: [u8; 3],
    call_info: CallInfoStyle,
    displays: DisplayStyle,
    media: MediaGeneration,
}

const FILLER_V3: [u8; 3] = [0x00, 0x00, 0x00];
const FILLER_V4: [u8; 3] = [0x20, 0x00, 0xFE];
const FILLER_V11: [u8; 3] = [0x20, 0xF1, 0xFF];

macro_rules! descriptor {
    ($family:ident, $version:expr, $filler:ident, $ci:ident, $disp:ident, $media:ident) => {
        ProtocolDescriptor {
            family: ProtocolFamily::$family,
            version: $version,
            register_ack_filler: $filler,
            call_info: CallInfoStyle::$ci,
            displays: DisplayStyle::$disp,
            media: MediaGeneration::$media,
        }
    };
}

static SCCP_DESCRIPTORS: &[ProtocolDescriptor] = &[
    descriptor!(Sccp, 3, FILLER_V3, Static, Static, V3),
    descriptor!(Sccp, 5, FILLER_V4, Static, Static, V3),
    descriptor!(Sccp, 9, FILLER_V4, Dynamic12, Dynamic, V3),
    descriptor!(Sccp, 10, FILLER_V4, Dynamic12, Dynamic, V3),
    descriptor!(Sccp, 11, FILLER_V11, Dynamic12, Dynamic, V3),
    descriptor!(Sccp, 15, FILLER_V11, Dynamic12, Dynamic, V3),
    descriptor!(Sccp, 16, FILLER_V11, Dynamic16, Dynamic, V3),
    descriptor!(Sccp, 17, FILLER_V11, Dynamic16, Dynamic, V17),
    descriptor!(Sccp, 19, FILLER_V11, Dynamic16, Dynamic, V17),
    descriptor!(Sccp, 20, FILLER_V11, Dynamic16, Dynamic, V17),
];

static SPCP_DESCRIPTORS: &[ProtocolDescriptor] = &[
    descriptor!(Spcp, 0, FILLER_V4, Static, Dynamic, V3),
    descriptor!(Spcp, 8, FILLER_V4, Static, Dynamic, V3),
];

fn family_descriptors(family: ProtocolFamily) -> &'static [ProtocolDescriptor] {
    match family {
        ProtocolFamily::Sccp => SCCP_DESCRIPTORS,
        ProtocolFamily::Spcp => SPCP_DESCRIPTORS,
    }
}

/// Highest protocol version this side implements for `family`
pub fn max_supported_version(family: ProtocolFamily) -> u8 {
    match family {
        ProtocolFamily::Sccp => 20,
        ProtocolFamily::Spcp => 8,
    }
}

/// Descriptor for an exact version, if that version has a row
pub fn descriptor(family: ProtocolFamily, version: u8) -> Option<&'static ProtocolDescriptor> {
    family_descriptors(family)
        .iter()
        .find(|d| d.version == version)
}

/// Whether an exact version has its own behavior bundle
pub fn is_supported(family: ProtocolFamily, version: u8) -> bool {
    descriptor(family, version).is_some()
}

/// Pick the behavior bundle for a phone that registered requesting
/// `requested`. The result is the highest row not above the request,
/// falling back to the family floor for versions older than any row.
pub fn negotiate(family: ProtocolFamily, requested: u8) -> &'static ProtocolDescriptor {
    let rows = family_descriptors(family);
    let chosen = rows
        .iter()
        .rev()
        .find(|d| requested >= d.version)
        .unwrap_or(&rows[0]);
    info!(
        family = family.name(),
        requested,
        negotiated = chosen.version,
        "negotiated protocol version"
    );
    chosen
}

impl ProtocolDescriptor {
    fn message(&self, payload: Payload) -> SccpMessage {
        SccpMessage::new(payload)
    }

    /// Registration ack for this generation. The ack both confirms the
    /// negotiated version and echoes it in the prologue's reserved dword.
    pub fn register_ack(
        &self,
        keepalive_interval: u32,
        date_template: &str,
        secondary_keepalive: u32,
    ) -> SccpMessage {
        let ack = RegisterAck {
            keepalive_interval,
            date_template: date_template.to_string(),
            secondary_keepalive,
            protocol_version: self.version,
            filler: self.register_ack_filler,
        };
        SccpMessage::with_version(Payload::RegisterAck(ack), self.version)
    }

    /// Call info in whichever shape this generation expects
    pub fn call_info(&self, info: &CallInfo) -> SccpMessage {
        let payload = match self.call_info {
            CallInfoStyle::Static => Payload::CallInfo(info.clone()),
            CallInfoStyle::Dynamic12 => {
                Payload::CallInfoDynamic(dynamic_call_info(info, dynamic_parties_12(info)))
            }
            CallInfoStyle::Dynamic16 => {
                Payload::CallInfoDynamic(dynamic_call_info(info, dynamic_parties_16(info)))
            }
        };
        debug!(style = ?self.call_info, call_reference = info.call_reference, "built call info");
        self.message(payload)
    }

    pub fn dialed_number(
        &self,
        called_party: &str,
        line_instance: u32,
        call_reference: u32,
    ) -> SccpMessage {
        self.message(Payload::DialedNumber(DialedNumber {
            called_party: called_party.to_string(),
            line_instance,
            call_reference,
        }))
    }

    pub fn forward_stat(&self, stat: ForwardStat) -> SccpMessage {
        self.message(Payload::ForwardStat(stat))
    }

    pub fn display_prompt_status(
        &self,
        timeout: u32,
        message: &str,
        line_instance: u32,
        call_reference: u32,
    ) -> SccpMessage {
        let payload = match self.displays {
            DisplayStyle::Static => Payload::DisplayPromptStatus(DisplayPromptStatus {
                timeout,
                message: message.to_string(),
                line_instance,
                call_reference,
            }),
            DisplayStyle::Dynamic => {
                Payload::DisplayDynamicPromptStatus(DisplayDynamicPromptStatus {
                    timeout,
                    line_instance,
                    call_reference,
                    message: message.to_string(),
                })
            }
        };
        self.message(payload)
    }

    pub fn display_notify(&self, timeout: u32, message: &str) -> SccpMessage {
        let payload = match self.displays {
            DisplayStyle::Static => Payload::DisplayNotify(DisplayNotify {
                timeout,
                message: message.to_string(),
            }),
            DisplayStyle::Dynamic => Payload::DisplayDynamicNotify(DisplayDynamicNotify {
                timeout,
                message: message.to_string(),
            }),
        };
        self.message(payload)
    }

    pub fn display_pri_notify(&self, timeout: u32, priority: u32, message: &str) -> SccpMessage {
        let payload = match self.displays {
            DisplayStyle::Static => Payload::DisplayPriNotify(DisplayPriNotify {
                timeout,
                priority,
                message: message.to_string(),
            }),
            DisplayStyle::Dynamic => Payload::DisplayDynamicPriNotify(DisplayDynamicPriNotify {
                timeout,
                priority,
                message: message.to_string(),
            }),
        };
        self.message(payload)
    }

    /// Ask the phone to open its receive path for `flow`
    pub fn open_receive_channel(&self, flow: &MediaFlow) -> Result<SccpMessage> {
        let payload = match self.media {
            MediaGeneration::V3 => OpenReceiveChannel::V3 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                ms_packet_size: flow.ms_packet_size,
                payload_type: flow.codec,
                vad: flow.vad as u32,
                g723_bitrate: 0,
                conference_id1: flow.conference_id,
                dtmf_payload: flow.dtmf_payload,
                rtp_timeout: RTP_TIMEOUT,
            },
            MediaGeneration::V17 => OpenReceiveChannel::V17 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                ms_packet_size: flow.ms_packet_size,
                payload_type: flow.codec,
                vad: flow.vad as u32,
                g723_bitrate: 0,
                conference_id1: flow.conference_id,
                dtmf_payload: flow.dtmf_payload,
                rtp_timeout: RTP_TIMEOUT,
                remote_ip: flow.remote.ip(),
                unknown: RECEIVE_BUFFER_HINT,
            },
        };
        Ok(self.message(Payload::OpenReceiveChannel(payload)))
    }

    /// Tell the phone where to send RTP for `flow`
    pub fn start_media_transmission(&self, flow: &MediaFlow) -> Result<SccpMessage> {
        let payload = match self.media {
            MediaGeneration::V3 => StartMediaTransmission::V3 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                remote_ip: self.require_v4(flow.remote.ip(), "StartMediaTransmission")?,
                remote_port: flow.remote.port() as u32,
                ms_packet_size: flow.ms_packet_size,
                payload_type: flow.codec,
                precedence: flow.precedence,
                silence_suppression: flow.silence_suppression as u32,
                max_frames_per_packet: 0,
                g723_bitrate: 0,
                conference_id1: flow.conference_id,
                dtmf_payload: flow.dtmf_payload,
                rtp_timeout: RTP_TIMEOUT,
            },
            MediaGeneration::V17 => StartMediaTransmission::V17 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                remote_ip: flow.remote.ip(),
                remote_port: flow.remote.port() as u32,
                ms_packet_size: flow.ms_packet_size,
                payload_type: flow.codec,
                precedence: flow.precedence,
                silence_suppression: flow.silence_suppression as u32,
                max_frames_per_packet: 0,
                g723_bitrate: 0,
                conference_id1: flow.conference_id,
                dtmf_payload: flow.dtmf_payload,
                rtp_timeout: RTP_TIMEOUT,
            },
        };
        Ok(self.message(Payload::StartMediaTransmission(payload)))
    }

    /// Ask the phone to open its video receive path for `flow`
    pub fn open_multi_media_channel(&self, flow: &VideoFlow) -> Result<SccpMessage> {
        let payload = match self.media {
            MediaGeneration::V3 => OpenMultiMediaChannel::V3 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                payload_capability: flow.codec,
                line_instance: flow.line_instance,
                call_reference: flow.call_reference,
                payload_type: flow.payload_type,
                video: video_parameters(flow),
            },
            MediaGeneration::V17 => OpenMultiMediaChannel::V17 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                payload_capability: flow.codec,
                line_instance: flow.line_instance,
                call_reference: flow.call_reference,
                payload_type: flow.payload_type,
                video: video_parameters(flow),
            },
        };
        Ok(self.message(Payload::OpenMultiMediaChannel(payload)))
    }

    /// Tell the phone where to send video RTP for `flow`
    pub fn start_multi_media_transmission(&self, flow: &VideoFlow) -> Result<SccpMessage> {
        let payload = match self.media {
            MediaGeneration::V3 => StartMultiMediaTransmission::V3 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                payload_capability: flow.codec,
                remote_ip: self.require_v4(flow.remote.ip(), "StartMultiMediaTransmission")?,
                remote_port: flow.remote.port() as u32,
                call_reference: flow.call_reference,
                payload_type: flow.payload_type,
                dscp: VIDEO_DSCP,
                video: video_parameters(flow),
            },
            MediaGeneration::V17 => StartMultiMediaTransmission::V17 {
                conference_id: flow.conference_id,
                passthru_party_id: flow.passthru_party_id,
                payload_capability: flow.codec,
                remote_ip: flow.remote.ip(),
                remote_port: flow.remote.port() as u32,
                call_reference: flow.call_reference,
                payload_type: flow.payload_type,
                dscp: VIDEO_DSCP,
                video: video_parameters(flow),
            },
        };
        Ok(self.message(Payload::StartMultiMediaTransmission(payload)))
    }

    /// Decode the phone's open receive channel answer in this
    /// generation's layout.
    pub fn parse_open_receive_channel_ack(&self, src: &[u8]) -> Result<OpenReceiveChannelAck> {
        match crate::packet::decode_message(src, self.version)?.payload {
            Payload::OpenReceiveChannelAck(ack) => Ok(ack),
            other => Err(SccpError::malformed(
                "OpenReceiveChannelAck",
                format!("phone answered with {}", other.message_id().name()),
            )),
        }
    }

    /// The v3 media layouts only carry an IPv4 address; a mapped v6
    /// address is unwrapped, a real v6 address cannot be expressed.
    fn require_v4(&self, addr: IpAddr, name: &'static str) -> Result<std::net::Ipv4Addr> {
        match addr {
            IpAddr::V4(v4) => Ok(v4),
            IpAddr::V6(_) => net::mapped_ipv4(&addr).ok_or(SccpError::UnsupportedVersion {
                name,
                version: self.version,
            }),
        }
    }
}

/// Shaping block for a video flow, filled with the H.264 defaults. The
/// conference service number mirrors the call reference.
fn video_parameters(flow: &VideoFlow) -> VideoParameters {
    VideoParameters {
        bit_rate: flow.bit_rate,
        picture_format_count: 1,
        picture_format: VIDEO_PICTURE_FORMAT,
        picture_mpi: VIDEO_PICTURE_MPI,
        conf_service_num: flow.call_reference,
        profile: VIDEO_PROFILE,
        level: VIDEO_LEVEL,
        macroblocks_per_sec: VIDEO_MACROBLOCKS_PER_SEC,
        macroblocks_per_frame: VIDEO_MACROBLOCKS_PER_FRAME,
        dec_pic_buf: VIDEO_DEC_PIC_BUF,
        br_and_cpb: VIDEO_BR_AND_CPB,
    }
}

fn dynamic_call_info(info: &CallInfo, parties: Vec<String>) -> CallInfoDynamic {
    CallInfoDynamic {
        line_id: info.line_id,
        call_reference: info.call_reference,
        call_type: info.call_type,
        original_cdpn_redirect_reason: info.original_cdpn_redirect_reason,
        last_redirecting_reason: info.last_redirecting_reason,
        call_instance: info.call_instance,
        call_security_status: info.call_security_status,
        party_pi_restriction_bits: info.party_pi_restriction_bits,
        parties,
    }
}

/// 12-field party blob: four numbers, four voice mailboxes, four names.
/// Mailboxes are not modeled and go out empty.
fn dynamic_parties_12(info: &CallInfo) -> Vec<String> {
    vec![
        info.calling_party.clone(),
        info.called_party.clone(),
        info.original_called_party.clone(),
        info.last_redirecting_party.clone(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        info.calling_party_name.clone(),
        info.called_party_name.clone(),
        info.original_called_party_name.clone(),
        info.last_redirecting_party_name.clone(),
    ]
}

/// 16-field party blob used from v16 on. Slot 1 is the original calling
/// number and slot 13 repeats the original called name; the trailing two
/// mailbox slots stay empty.
fn dynamic_parties_16(info: &CallInfo) -> Vec<String> {
    vec![
        info.calling_party.clone(),
        String::new(),
        info.called_party.clone(),
        info.original_called_party.clone(),
        info.last_redirecting_party.clone(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        info.calling_party_name.clone(),
        info.called_party_name.clone(),
        info.original_called_party_name.clone(),
        info.last_redirecting_party_name.clone(),
        info.original_called_party_name.clone(),
        String::new(),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{encode_message, MessageId};

    fn flow(remote: &str) -> MediaFlow {
        MediaFlow {
            conference_id: 100,
            passthru_party_id: 101,
            codec: SkinnyCodec::G711_ULAW_64K,
            ms_packet_size: 20,
            dtmf_payload: 101,
            vad: false,
            silence_suppression: false,
            precedence: 184,
            remote: remote.parse().unwrap(),
        }
    }

    #[test]
    fn test_negotiate_exact_and_between_rows() {
        assert_eq!(negotiate(ProtocolFamily::Sccp, 11).version, 11);
        assert_eq!(negotiate(ProtocolFamily::Sccp, 12).version, 11);
        assert_eq!(negotiate(ProtocolFamily::Sccp, 18).version, 17);
        assert_eq!(negotiate(ProtocolFamily::Sccp, 22).version, 20);
    }

    #[test]
    fn test_negotiate_floors() {
        assert_eq!(negotiate(ProtocolFamily::Sccp, 0).version, 3);
        assert_eq!(negotiate(ProtocolFamily::Sccp, 2).version, 3);
        assert_eq!(negotiate(ProtocolFamily::Spcp, 5).version, 0);
        assert_eq!(negotiate(ProtocolFamily::Spcp, 8).version, 8);
    }

    #[test]
    fn test_max_supported_version() {
        assert_eq!(max_supported_version(ProtocolFamily::Sccp), 20);
        assert_eq!(max_supported_version(ProtocolFamily::Spcp), 8);
    }

    #[test]
    fn test_descriptor_exact_lookup() {
        assert!(descriptor(ProtocolFamily::Sccp, 16).is_some());
        assert!(descriptor(ProtocolFamily::Sccp, 12).is_none());
        assert!(descriptor(ProtocolFamily::Spcp, 0).is_some());
    }

    #[test]
    fn test_is_supported_mirrors_descriptor_rows() {
        assert!(is_supported(ProtocolFamily::Sccp, 17));
        assert!(!is_supported(ProtocolFamily::Sccp, 12));
        assert!(is_supported(ProtocolFamily::Spcp, 8));
        assert!(!is_supported(ProtocolFamily::Spcp, 3));
    }

    #[test]
    fn test_register_ack_filler_per_generation() {
        let filler = |family, version: u8| {
            let proto = negotiate(family, version);
            let msg = proto.register_ack(30, "D/M/Y", 30);
            let Payload::RegisterAck(ack) = msg.payload else {
                panic!("wrong payload kind");
            };
            (ack.protocol_version, ack.filler)
        };
        assert_eq!(filler(ProtocolFamily::Sccp, 3), (3, [0x00, 0x00, 0x00]));
        assert_eq!(filler(ProtocolFamily::Sccp, 5), (5, [0x20, 0x00, 0xFE]));
        assert_eq!(filler(ProtocolFamily::Sccp, 17), (17, [0x20, 0xF1, 0xFF]));
        assert_eq!(filler(ProtocolFamily::Spcp, 8), (8, [0x20, 0x00, 0xFE]));
    }

    #[test]
    fn test_register_ack_carries_version_in_reserved() {
        let proto = negotiate(ProtocolFamily::Sccp, 19);
        let msg = proto.register_ack(30, "D/M/Y", 30);
        assert_eq!(msg.reserved, 19);
    }

    #[test]
    fn test_call_info_style_switches() {
        let info = CallInfo {
            calling_party: "1000".to_string(),
            calling_party_name: "Alice".to_string(),
            called_party: "2000".to_string(),
            call_reference: 7,
            ..Default::default()
        };

        let old = negotiate(ProtocolFamily::Sccp, 3).call_info(&info);
        assert_eq!(old.id(), MessageId::CallInfo);

        let mid = negotiate(ProtocolFamily::Sccp, 9).call_info(&info);
        assert_eq!(mid.id(), MessageId::CallInfoDynamic);
        let Payload::CallInfoDynamic(dynamic) = mid.payload else {
            panic!("wrong payload kind");
        };
        assert_eq!(dynamic.parties.len(), 12);
        assert_eq!(dynamic.parties[0], "1000");
        assert_eq!(dynamic.parties[8], "Alice");

        let new = negotiate(ProtocolFamily::Sccp, 16).call_info(&info);
        let Payload::CallInfoDynamic(dynamic) = new.payload else {
            panic!("wrong payload kind");
        };
        assert_eq!(dynamic.parties.len(), 16);
        assert_eq!(dynamic.parties[2], "2000");
        assert_eq!(dynamic.parties[9], "Alice");
    }

    #[test]
    fn test_spcp_uses_dynamic_displays_with_static_call_info() {
        let proto = negotiate(ProtocolFamily::Spcp, 8);
        let prompt = proto.display_prompt_status(10, "Ring out", 1, 2);
        assert_eq!(prompt.id(), MessageId::DisplayDynamicPromptStatus);
        let info = proto.call_info(&CallInfo::default());
        assert_eq!(info.id(), MessageId::CallInfo);
    }

    #[test]
    fn test_display_styles() {
        let old = negotiate(ProtocolFamily::Sccp, 5);
        assert_eq!(
            old.display_notify(0, "hello").id(),
            MessageId::DisplayNotify
        );
        assert_eq!(
            old.display_pri_notify(0, 1, "hello").id(),
            MessageId::DisplayPriNotify
        );

        let new = negotiate(ProtocolFamily::Sccp, 11);
        assert_eq!(
            new.display_notify(0, "hello").id(),
            MessageId::DisplayDynamicNotify
        );
    }

    #[test]
    fn test_media_generation_selection() {
        let old = negotiate(ProtocolFamily::Sccp, 11);
        let msg = old.start_media_transmission(&flow("10.0.0.9:16384")).unwrap();
        let Payload::StartMediaTransmission(StartMediaTransmission::V3 { remote_port, .. }) =
            msg.payload
        else {
            panic!("expected the v3 layout");
        };
        assert_eq!(remote_port, 16384);

        let new = negotiate(ProtocolFamily::Sccp, 17);
        let msg = new
            .start_media_transmission(&flow("[2001:db8::9]:16384"))
            .unwrap();
        assert!(matches!(
            msg.payload,
            Payload::StartMediaTransmission(StartMediaTransmission::V17 { .. })
        ));
        assert!(encode_message(&msg, new.version).is_ok());
    }

    #[test]
    fn test_v3_media_rejects_bare_ipv6_remote() {
        let old = negotiate(ProtocolFamily::Sccp, 11);
        let err = old
            .start_media_transmission(&flow("[2001:db8::9]:16384"))
            .unwrap_err();
        assert!(matches!(err, SccpError::UnsupportedVersion { .. }));

        // a mapped v4 address is fine
        let msg = old
            .start_media_transmission(&flow("[::ffff:10.0.0.9]:16384"))
            .unwrap();
        assert!(matches!(
            msg.payload,
            Payload::StartMediaTransmission(StartMediaTransmission::V3 { .. })
        ));
    }

    #[test]
    fn test_parse_ack_in_negotiated_layout() {
        let proto = negotiate(ProtocolFamily::Sccp, 17);
        let wire = encode_message(
            &SccpMessage::new(Payload::OpenReceiveChannelAck(OpenReceiveChannelAck::V17 {
                status: 0,
                ip: "10.2.2.2".parse().unwrap(),
                port: 24000,
                passthru_party_id: 9,
                call_reference: 8,
            })),
            proto.version,
        )
        .unwrap();
        let ack = proto.parse_open_receive_channel_ack(&wire).unwrap();
        assert_eq!(ack.media_addr(), ("10.2.2.2".parse().unwrap(), 24000));

        let wrong = encode_message(&SccpMessage::new(Payload::KeepAlive), proto.version).unwrap();
        assert!(proto.parse_open_receive_channel_ack(&wrong).is_err());
    }

    fn video_flow(remote: &str) -> VideoFlow {
        VideoFlow {
            conference_id: 200,
            passthru_party_id: 201,
            codec: SkinnyCodec::H264,
            payload_type: 99,
            bit_rate: 512,
            line_instance: 1,
            call_reference: 42,
            remote: remote.parse().unwrap(),
        }
    }

    #[test]
    fn test_video_channel_generation_selection() {
        let old = negotiate(ProtocolFamily::Sccp, 11);
        let msg = old.open_multi_media_channel(&video_flow("10.0.0.9:30000")).unwrap();
        assert_eq!(msg.id(), MessageId::OpenMultiMediaChannel);
        let Payload::OpenMultiMediaChannel(OpenMultiMediaChannel::V3 { video, .. }) = msg.payload
        else {
            panic!("expected the v3 layout");
        };
        assert_eq!(video.bit_rate, 512);
        assert_eq!(video.conf_service_num, 42);

        let new = negotiate(ProtocolFamily::Sccp, 20);
        let msg = new
            .start_multi_media_transmission(&video_flow("[2001:db8::9]:30000"))
            .unwrap();
        let Payload::StartMultiMediaTransmission(StartMultiMediaTransmission::V17 {
            remote_port,
            dscp,
            ..
        }) = msg.payload
        else {
            panic!("expected the v17 layout");
        };
        assert_eq!(remote_port, 30000);
        assert_eq!(dscp, VIDEO_DSCP);
        assert!(encode_message(&msg, new.version).is_ok());
    }

    #[test]
    fn test_v3_video_rejects_bare_ipv6_remote() {
        let old = negotiate(ProtocolFamily::Sccp, 11);
        let err = old
            .start_multi_media_transmission(&video_flow("[2001:db8::9]:30000"))
            .unwrap_err();
        assert!(matches!(
            err,
            SccpError::UnsupportedVersion {
                name: "StartMultiMediaTransmission",
                ..
            }
        ));
    }

    #[test]
    fn test_open_receive_channel_carries_buffer_hint() {
        let proto = negotiate(ProtocolFamily::Sccp, 20);
        let msg = proto.open_receive_channel(&flow("10.4.4.4:0")).unwrap();
        let Payload::OpenReceiveChannel(OpenReceiveChannel::V17 { unknown, .. }) = msg.payload
        else {
            panic!("expected the v17 layout");
        };
        assert_eq!(unknown, RECEIVE_BUFFER_HINT);
    }
}
