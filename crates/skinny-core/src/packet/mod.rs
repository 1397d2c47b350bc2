//! Station message framing and the top-level message codec
//!
//! Every message starts with a 12-byte prologue of three little-endian
//! dwords: a length that counts everything after the first eight bytes, a
//! reserved dword that carries the protocol version on version-bearing
//! messages, and the message id. The payload codec behind the id is picked
//! per negotiated protocol version by the dispatch table.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{Result, SccpError};

pub mod field;
pub mod payloads;
mod table;

pub use payloads::*;

/// Largest prologue length dword accepted from the wire. Nothing the
/// protocol defines comes close; anything bigger is a desynchronized or
/// hostile stream.
pub const MAX_PAYLOAD_SIZE: usize = 2040;

macro_rules! message_ids {
    ($($(#[$meta:meta])* $name:ident = $value:expr,)+) => {
        /// Station message identifiers
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum MessageId {
            $($(#[$meta])* $name = $value,)+
        }

        impl MessageId {
            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$name),)+
                    _ => None,
                }
            }

            pub fn as_u32(self) -> u32 {
                self as u32
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)+
                }
            }
        }
    };
}

message_ids! {
    KeepAlive = 0x0000,
    Register = 0x0001,
    IpPort = 0x0002,
    KeypadButton = 0x0003,
    EnblocCall = 0x0004,
    Stimulus = 0x0005,
    OffHook = 0x0006,
    OnHook = 0x0007,
    ForwardStatReq = 0x0009,
    SpeedDialStatReq = 0x000A,
    LineStatReq = 0x000B,
    TimeDateReq = 0x000D,
    ButtonTemplateReq = 0x000E,
    VersionReq = 0x000F,
    CapabilitiesRes = 0x0010,
    Alarm = 0x0020,
    OpenReceiveChannelAck = 0x0022,
    ConnectionStatisticsRes = 0x0023,
    SoftKeySetReq = 0x0025,
    SoftKeyEvent = 0x0026,
    Unregister = 0x0027,
    SoftKeyTemplateReq = 0x0028,
    HeadsetStatus = 0x002B,
    RegisterAck = 0x0081,
    StartTone = 0x0082,
    StopTone = 0x0083,
    SetRinger = 0x0085,
    SetLamp = 0x0086,
    SetSpeakerMode = 0x0088,
    StartMediaTransmission = 0x008A,
    StopMediaTransmission = 0x008B,
    CallInfo = 0x008F,
    ForwardStat = 0x0090,
    SpeedDialStat = 0x0091,
    LineStat = 0x0092,
    DefineTimeDate = 0x0094,
    ButtonTemplate = 0x0097,
    Version = 0x0098,
    CapabilitiesReq = 0x009B,
    RegisterReject = 0x009D,
    Reset = 0x009F,
    KeepAliveAck = 0x0100,
    OpenReceiveChannel = 0x0105,
    CloseReceiveChannel = 0x0106,
    ConnectionStatisticsReq = 0x0107,
    SelectSoftKeys = 0x0110,
    CallState = 0x0111,
    DisplayPromptStatus = 0x0112,
    ClearPromptStatus = 0x0113,
    DisplayNotify = 0x0114,
    ActivateCallPlane = 0x0116,
    UnregisterAck = 0x0118,
    DialedNumber = 0x011D,
    DisplayPriNotify = 0x0120,
    OpenMultiMediaChannel = 0x0131,
    StartMultiMediaTransmission = 0x0132,
    DisplayDynamicNotify = 0x0143,
    DisplayDynamicPriNotify = 0x0144,
    DisplayDynamicPromptStatus = 0x0145,
    CallInfoDynamic = 0x014A,
    StartMediaTransmissionAck = 0x0154,
}

/// Raw message prologue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Byte count of everything after the first eight bytes
    pub length: u32,
    /// Version dword on version-bearing messages, zero otherwise
    pub reserved: u32,
    pub message_id: u32,
}

impl MessageHeader {
    pub const SIZE: usize = 12;

    /// Parse and validate the prologue. Length errors here are fatal to
    /// the stream since framing can no longer be trusted.
    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < Self::SIZE {
            return Err(SccpError::BufferTooSmall {
                needed: Self::SIZE,
                actual: buf.remaining(),
            });
        }
        let length = buf.get_u32_le();
        if length < 4 {
            return Err(SccpError::FrameTooShort { length });
        }
        if length as usize > MAX_PAYLOAD_SIZE {
            return Err(SccpError::FrameTooLarge {
                length,
                max: MAX_PAYLOAD_SIZE as u32,
            });
        }
        let reserved = buf.get_u32_le();
        let message_id = buf.get_u32_le();
        Ok(Self {
            length,
            reserved,
            message_id,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.length);
        buf.put_u32_le(self.reserved);
        buf.put_u32_le(self.message_id);
    }

    /// Payload byte count behind this prologue
    pub fn payload_len(&self) -> usize {
        self.length as usize - 4
    }
}

/// Decoded payload, one variant per message kind.
///
/// Kinds with no payload bytes are unit variants; kinds whose whole
/// payload is a single field carry it inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    KeepAlive,
    Register(Register),
    IpPort(IpPort),
    KeypadButton(KeypadButton),
    EnblocCall(String),
    Stimulus(Stimulus),
    OffHook,
    OnHook,
    ForwardStatReq(u32),
    SpeedDialStatReq(u32),
    LineStatReq(u32),
    TimeDateReq,
    ButtonTemplateReq,
    VersionReq,
    CapabilitiesRes(CapabilitiesRes),
    Alarm(Alarm),
    OpenReceiveChannelAck(OpenReceiveChannelAck),
    ConnectionStatisticsRes(ConnectionStatisticsRes),
    SoftKeySetReq,
    SoftKeyEvent(SoftKeyEvent),
    Unregister,
    SoftKeyTemplateReq,
    HeadsetStatus(u32),
    RegisterAck(RegisterAck),
    StartTone(StartTone),
    StopTone(StopTone),
    SetRinger(SetRinger),
    SetLamp(SetLamp),
    SetSpeakerMode(u32),
    StartMediaTransmission(StartMediaTransmission),
    StopMediaTransmission(StopMediaTransmission),
    CallInfo(CallInfo),
    ForwardStat(ForwardStat),
    SpeedDialStat(SpeedDialStat),
    LineStat(LineStat),
    DefineTimeDate(DefineTimeDate),
    ButtonTemplate(ButtonTemplate),
    Version(String),
    CapabilitiesReq,
    RegisterReject(String),
    Reset(u32),
    KeepAliveAck,
    OpenReceiveChannel(OpenReceiveChannel),
    CloseReceiveChannel(CloseReceiveChannel),
    ConnectionStatisticsReq(ConnectionStatisticsReq),
    SelectSoftKeys(SelectSoftKeys),
    CallState(CallState),
    DisplayPromptStatus(DisplayPromptStatus),
    ClearPromptStatus(ClearPromptStatus),
    DisplayNotify(DisplayNotify),
    ActivateCallPlane(u32),
    UnregisterAck(u32),
    DialedNumber(DialedNumber),
    DisplayPriNotify(DisplayPriNotify),
    OpenMultiMediaChannel(OpenMultiMediaChannel),
    StartMultiMediaTransmission(StartMultiMediaTransmission),
    DisplayDynamicNotify(DisplayDynamicNotify),
    DisplayDynamicPriNotify(DisplayDynamicPriNotify),
    DisplayDynamicPromptStatus(DisplayDynamicPromptStatus),
    CallInfoDynamic(CallInfoDynamic),
    StartMediaTransmissionAck(StartMediaTransmissionAck),
}

impl Payload {
    /// Message id this payload is carried under
    pub fn message_id(&self) -> MessageId {
        match self {
            Self::KeepAlive => MessageId::KeepAlive,
            Self::Register(_) => MessageId::Register,
            Self::IpPort(_) => MessageId::IpPort,
            Self::KeypadButton(_) => MessageId::KeypadButton,
            Self::EnblocCall(_) => MessageId::EnblocCall,
            Self::Stimulus(_) => MessageId::Stimulus,
            Self::OffHook => MessageId::OffHook,
            Self::OnHook => MessageId::OnHook,
            Self::ForwardStatReq(_) => MessageId::ForwardStatReq,
            Self::SpeedDialStatReq(_) => MessageId::SpeedDialStatReq,
            Self::LineStatReq(_) => MessageId::LineStatReq,
            Self::TimeDateReq => MessageId::TimeDateReq,
            Self::ButtonTemplateReq => MessageId::ButtonTemplateReq,
            Self::VersionReq => MessageId::VersionReq,
            Self::CapabilitiesRes(_) => MessageId::CapabilitiesRes,
            Self::Alarm(_) => MessageId::Alarm,
            Self::OpenReceiveChannelAck(_) => MessageId::OpenReceiveChannelAck,
            Self::ConnectionStatisticsRes(_) => MessageId::ConnectionStatisticsRes,
            Self::SoftKeySetReq => MessageId::SoftKeySetReq,
            Self::SoftKeyEvent(_) => MessageId::SoftKeyEvent,
            Self::Unregister => MessageId::Unregister,
            Self::SoftKeyTemplateReq => MessageId::SoftKeyTemplateReq,
            Self::HeadsetStatus(_) => MessageId::HeadsetStatus,
            Self::RegisterAck(_) => MessageId::RegisterAck,
            Self::StartTone(_) => MessageId::StartTone,
            Self::StopTone(_) => MessageId::StopTone,
            Self::SetRinger(_) => MessageId::SetRinger,
            Self::SetLamp(_) => MessageId::SetLamp,
            Self::SetSpeakerMode(_) => MessageId::SetSpeakerMode,
            Self::StartMediaTransmission(_) => MessageId::StartMediaTransmission,
            Self::StopMediaTransmission(_) => MessageId::StopMediaTransmission,
            Self::CallInfo(_) => MessageId::CallInfo,
            Self::ForwardStat(_) => MessageId::ForwardStat,
            Self::SpeedDialStat(_) => MessageId::SpeedDialStat,
            Self::LineStat(_) => MessageId::LineStat,
            Self::DefineTimeDate(_) => MessageId::DefineTimeDate,
            Self::ButtonTemplate(_) => MessageId::ButtonTemplate,
            Self::Version(_) => MessageId::Version,
            Self::CapabilitiesReq => MessageId::CapabilitiesReq,
            Self::RegisterReject(_) => MessageId::RegisterReject,
            Self::Reset(_) => MessageId::Reset,
            Self::KeepAliveAck => MessageId::KeepAliveAck,
            Self::OpenReceiveChannel(_) => MessageId::OpenReceiveChannel,
            Self::CloseReceiveChannel(_) => MessageId::CloseReceiveChannel,
            Self::ConnectionStatisticsReq(_) => MessageId::ConnectionStatisticsReq,
            Self::SelectSoftKeys(_) => MessageId::SelectSoftKeys,
            Self::CallState(_) => MessageId::CallState,
            Self::DisplayPromptStatus(_) => MessageId::DisplayPromptStatus,
            Self::ClearPromptStatus(_) => MessageId::ClearPromptStatus,
            Self::DisplayNotify(_) => MessageId::DisplayNotify,
            Self::ActivateCallPlane(_) => MessageId::ActivateCallPlane,
            Self::UnregisterAck(_) => MessageId::UnregisterAck,
            Self::DialedNumber(_) => MessageId::DialedNumber,
            Self::DisplayPriNotify(_) => MessageId::DisplayPriNotify,
            Self::OpenMultiMediaChannel(_) => MessageId::OpenMultiMediaChannel,
            Self::StartMultiMediaTransmission(_) => MessageId::StartMultiMediaTransmission,
            Self::DisplayDynamicNotify(_) => MessageId::DisplayDynamicNotify,
            Self::DisplayDynamicPriNotify(_) => MessageId::DisplayDynamicPriNotify,
            Self::DisplayDynamicPromptStatus(_) => MessageId::DisplayDynamicPromptStatus,
            Self::CallInfoDynamic(_) => MessageId::CallInfoDynamic,
            Self::StartMediaTransmissionAck(_) => MessageId::StartMediaTransmissionAck,
        }
    }
}

/// A complete decoded message
#[derive(Debug, Clone, PartialEq)]
pub struct SccpMessage {
    /// The prologue's reserved dword, the protocol version on
    /// version-bearing messages
    pub reserved: u32,
    pub payload: Payload,
}

impl SccpMessage {
    pub fn new(payload: Payload) -> Self {
        Self {
            reserved: 0,
            payload,
        }
    }

    pub fn with_version(payload: Payload, version: u8) -> Self {
        Self {
            reserved: version as u32,
            payload,
        }
    }

    pub fn id(&self) -> MessageId {
        self.payload.message_id()
    }
}

/// Decode one complete message from `src` using the layouts negotiated for
/// `version`.
///
/// `src` must hold the whole frame; a short buffer is reported as
/// [`SccpError::BufferTooSmall`] with the byte count a retry needs. Bytes
/// past the frame are ignored.
pub fn decode_message(src: &[u8], version: u8) -> Result<SccpMessage> {
    let mut buf = src;
    let header = MessageHeader::parse(&mut buf)?;
    let total = MessageHeader::SIZE + header.payload_len();
    if src.len() < total {
        return Err(SccpError::BufferTooSmall {
            needed: total,
            actual: src.len(),
        });
    }
    let mut payload = Bytes::copy_from_slice(&buf[..header.payload_len()]);

    let id = MessageId::from_u32(header.message_id)
        .ok_or(SccpError::UnknownMessage {
            id: header.message_id,
        })?;
    trace!(id = id.name(), length = header.length, version, "decoding message");
    let payload = table::decode(id, version, &mut payload)?;
    Ok(SccpMessage {
        reserved: header.reserved,
        payload,
    })
}

/// Encode `msg` for a peer negotiated at `version`, prologue included.
pub fn encode_message(msg: &SccpMessage, version: u8) -> Result<BytesMut> {
    let mut body = BytesMut::new();
    table::encode(&msg.payload, version, &mut body)?;

    let mut out = BytesMut::with_capacity(MessageHeader::SIZE + body.len());
    let header = MessageHeader {
        length: body.len() as u32 + 4,
        reserved: msg.reserved,
        message_id: msg.id().as_u32(),
    };
    header.serialize(&mut out);
    out.extend_from_slice(&body);
    trace!(id = msg.id().name(), length = header.length, version, "encoded message");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(payload: Payload, version: u8) -> SccpMessage {
        let msg = SccpMessage::new(payload);
        let wire = encode_message(&msg, version).unwrap();
        decode_message(&wire, version).unwrap()
    }

    #[test]
    fn test_header_round_trip() {
        let header = MessageHeader {
            length: 24,
            reserved: 17,
            message_id: MessageId::RegisterAck.as_u32(),
        };
        let mut buf = BytesMut::new();
        header.serialize(&mut buf);
        assert_eq!(buf.len(), MessageHeader::SIZE);
        let mut rd = &buf[..];
        assert_eq!(MessageHeader::parse(&mut rd).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_bad_lengths() {
        let mut short = BytesMut::new();
        MessageHeader {
            length: 2,
            reserved: 0,
            message_id: 0,
        }
        .serialize(&mut short);
        assert!(matches!(
            MessageHeader::parse(&mut &short[..]),
            Err(SccpError::FrameTooShort { length: 2 })
        ));

        let mut huge = BytesMut::new();
        MessageHeader {
            length: 0x0001_0000,
            reserved: 0,
            message_id: 0,
        }
        .serialize(&mut huge);
        assert!(matches!(
            MessageHeader::parse(&mut &huge[..]),
            Err(SccpError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_empty_payload_round_trip() {
        let decoded = round_trip(Payload::KeepAlive, 3);
        assert_eq!(decoded.payload, Payload::KeepAlive);
        assert_eq!(decoded.id(), MessageId::KeepAlive);

        let wire = encode_message(&SccpMessage::new(Payload::KeepAlive), 3).unwrap();
        assert_eq!(wire.len(), MessageHeader::SIZE);
        assert_eq!(&wire[..4], &[4, 0, 0, 0]);
    }

    #[test]
    fn test_truncated_payload_is_recoverable() {
        // valid prologue, zero payload bytes behind an id whose layout
        // needs more; the stream itself is still in sync
        let mut wire = BytesMut::new();
        MessageHeader {
            length: 4,
            reserved: 0,
            message_id: MessageId::Register.as_u32(),
        }
        .serialize(&mut wire);
        let err = decode_message(&wire, 3).unwrap_err();
        assert!(matches!(err, SccpError::MalformedPayload { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_length_bound_matches_dissector_window() {
        let header = |length| {
            let mut buf = BytesMut::new();
            MessageHeader {
                length,
                reserved: 0,
                message_id: 0,
            }
            .serialize(&mut buf);
            buf
        };
        assert!(MessageHeader::parse(&mut &header(2040)[..]).is_ok());
        assert!(matches!(
            MessageHeader::parse(&mut &header(2041)[..]),
            Err(SccpError::FrameTooLarge { length: 2041, max: 2040 })
        ));
    }

    #[test]
    fn test_call_info_dynamic_trailing_empties_survive_wire() {
        let mut parties = vec![String::new(); CallInfoDynamic::PARTY_FIELDS_V16];
        parties[0] = "1000".to_string();
        parties[9] = "Alice".to_string();
        let info = CallInfoDynamic {
            call_reference: 11,
            parties,
            ..Default::default()
        };
        let decoded = round_trip(Payload::CallInfoDynamic(info.clone()), 20);
        assert_eq!(decoded.payload, Payload::CallInfoDynamic(info));
    }

    #[test]
    fn test_unknown_message_id_is_recoverable() {
        let mut buf = BytesMut::new();
        MessageHeader {
            length: 4,
            reserved: 0,
            message_id: 0x7777,
        }
        .serialize(&mut buf);
        let err = decode_message(&buf, 3).unwrap_err();
        assert!(matches!(err, SccpError::UnknownMessage { id: 0x7777 }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_version_selects_layout() {
        let stat = ForwardStat {
            status: 1,
            line_number: 2,
            ..Default::default()
        };
        let msg = SccpMessage::new(Payload::ForwardStat(stat.clone()));

        let wire_v3 = encode_message(&msg, 11).unwrap();
        assert_eq!(wire_v3.len(), MessageHeader::SIZE + ForwardStat::SIZE_V3);

        let wire_v19 = encode_message(&msg, 19).unwrap();
        assert_eq!(wire_v19.len(), MessageHeader::SIZE + ForwardStat::SIZE_V19);

        assert_eq!(decode_message(&wire_v19, 19).unwrap().payload, msg.payload);
    }

    #[test]
    fn test_generation_mismatch_fails_encode() {
        let orc = OpenReceiveChannel::V3 {
            conference_id: 1,
            passthru_party_id: 2,
            ms_packet_size: 20,
            payload_type: crate::codec::SkinnyCodec::G711_ULAW_64K,
            vad: 0,
            g723_bitrate: 0,
            conference_id1: 1,
            dtmf_payload: 101,
            rtp_timeout: 10,
        };
        let msg = SccpMessage::new(Payload::OpenReceiveChannel(orc));
        let err = encode_message(&msg, 17).unwrap_err();
        assert!(matches!(err, SccpError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_register_message_round_trip() {
        let reg = Register {
            device_name: "SEP001B54CA5678".to_string(),
            user_id: 0,
            instance: 1,
            ip: "10.0.0.5".parse().unwrap(),
            device_type: 404,
            max_streams: 5,
            protocol_version: 20,
        };
        let decoded = round_trip(Payload::Register(reg.clone()), 3);
        assert_eq!(decoded.payload, Payload::Register(reg));
    }

    #[test]
    fn test_reserved_dword_is_echoed() {
        let msg = SccpMessage::with_version(Payload::KeepAliveAck, 17);
        let wire = encode_message(&msg, 17).unwrap();
        let decoded = decode_message(&wire, 17).unwrap();
        assert_eq!(decoded.reserved, 17);
    }

    #[test]
    fn test_trailing_bytes_after_frame_ignored() {
        let mut wire = encode_message(&SccpMessage::new(Payload::OnHook), 3)
            .unwrap()
            .to_vec();
        wire.extend_from_slice(&[0xAA; 7]);
        assert_eq!(decode_message(&wire, 3).unwrap().payload, Payload::OnHook);
    }

    proptest! {
        #[test]
        fn test_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256), version in 0u8..25) {
            let _ = decode_message(&data, version);
        }

        #[test]
        fn test_decode_valid_header_never_panics(
            id in any::<u16>(),
            body in proptest::collection::vec(any::<u8>(), 0..200),
            version in 0u8..25,
        ) {
            let mut wire = BytesMut::new();
            MessageHeader {
                length: body.len() as u32 + 4,
                reserved: version as u32,
                message_id: id as u32,
            }
            .serialize(&mut wire);
            wire.extend_from_slice(&body);
            let _ = decode_message(&wire, version);
        }
    }
}
