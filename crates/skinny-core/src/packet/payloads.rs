//! Payload structures for the modeled station messages
//!
//! Layouts follow the station message formats: little-endian dwords, NUL
//! padded char arrays, and network-order remote media addresses. Kinds
//! whose byte layout changed across protocol generations carry one enum
//! variant per generation; kinds that merely grew a trailing field keep a
//! single struct and let the dispatch table pick the layout.

use std::net::{IpAddr, Ipv4Addr};

use bytes::{Buf, BufMut, BytesMut};

use super::field::{
    ensure, get_addr16, get_fixed_string, get_ipv4_be, get_string_blob, get_tagged_addr,
    put_addr16, put_fixed_string, put_ipv4_be, put_reserved, put_string_blob, put_tagged_addr,
    skip_reserved,
};
use crate::codec::{AudioCapabilities, SkinnyCodec};
use crate::error::{Result, SccpError};

/// Station field widths, in bytes
pub const DEVICE_NAME_LEN: usize = 16;
pub const DIRNUM_LEN: usize = 24;
pub const DIRNUM_V19_LEN: usize = 40;
pub const NAME_LEN: usize = 40;
pub const DISPLAY_TEXT_LEN: usize = 33;
pub const NOTIFY_LEN: usize = 32;
pub const DATE_TEMPLATE_LEN: usize = 6;
pub const VERSION_LEN: usize = 16;
pub const ALARM_TEXT_LEN: usize = 80;
pub const LINE_LABEL_LEN: usize = 44;
pub const BUTTON_TEMPLATE_MAX: usize = 42;

/// Phone registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub device_name: String,
    pub user_id: u32,
    pub instance: u32,
    pub ip: Ipv4Addr,
    pub device_type: u32,
    pub max_streams: u32,
    pub protocol_version: u8,
}

impl Register {
    pub const SIZE: usize = 56;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        let device_name = get_fixed_string(buf, DEVICE_NAME_LEN)?;
        ensure(buf, 8)?;
        let user_id = buf.get_u32_le();
        let instance = buf.get_u32_le();
        let ip = get_ipv4_be(buf)?;
        ensure(buf, 13)?;
        let device_type = buf.get_u32_le();
        let max_streams = buf.get_u32_le();
        buf.get_u32_le(); // active streams, unused
        let protocol_version = buf.get_u8();
        skip_reserved(buf, 15);
        Ok(Self {
            device_name,
            user_id,
            instance,
            ip,
            device_type,
            max_streams,
            protocol_version,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        put_fixed_string(buf, &self.device_name, DEVICE_NAME_LEN);
        buf.put_u32_le(self.user_id);
        buf.put_u32_le(self.instance);
        put_ipv4_be(buf, self.ip);
        buf.put_u32_le(self.device_type);
        buf.put_u32_le(self.max_streams);
        buf.put_u32_le(0);
        buf.put_u8(self.protocol_version);
        put_reserved(buf, 15);
        Ok(())
    }
}

/// Registration acknowledgement.
///
/// The three filler bytes after the protocol version changed value across
/// server generations; the protocol descriptor fills them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAck {
    pub keepalive_interval: u32,
    pub date_template: String,
    pub secondary_keepalive: u32,
    pub protocol_version: u8,
    pub filler: [u8; 3],
}

impl RegisterAck {
    pub const SIZE: usize = 20;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        let keepalive_interval = buf.get_u32_le();
        let date_template = get_fixed_string(buf, DATE_TEMPLATE_LEN)?;
        buf.advance(2);
        let secondary_keepalive = buf.get_u32_le();
        let protocol_version = buf.get_u8();
        let mut filler = [0u8; 3];
        buf.copy_to_slice(&mut filler);
        Ok(Self {
            keepalive_interval,
            date_template,
            secondary_keepalive,
            protocol_version,
            filler,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.keepalive_interval);
        put_fixed_string(buf, &self.date_template, DATE_TEMPLATE_LEN);
        put_reserved(buf, 2);
        buf.put_u32_le(self.secondary_keepalive);
        buf.put_u8(self.protocol_version);
        buf.put_slice(&self.filler);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpPort {
    pub rtp_port: u16,
}

impl IpPort {
    pub const SIZE: usize = 4;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        let rtp_port = buf.get_u16_le();
        buf.advance(2);
        Ok(Self { rtp_port })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u16_le(self.rtp_port);
        put_reserved(buf, 2);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypadButton {
    pub button: u32,
    pub line_instance: u32,
    pub call_reference: u32,
}

impl KeypadButton {
    pub const SIZE: usize = 12;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            button: buf.get_u32_le(),
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.button);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus {
    pub stimulus: u32,
    pub stimulus_instance: u32,
}

impl Stimulus {
    pub const SIZE: usize = 8;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            stimulus: buf.get_u32_le(),
            stimulus_instance: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.stimulus);
        buf.put_u32_le(self.stimulus_instance);
        Ok(())
    }
}

/// One advertised media capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityEntry {
    pub codec: SkinnyCodec,
    pub max_frames_per_packet: u32,
    /// Only meaningful for G.723
    pub g723_bitrate: u32,
}

/// Capability response: up to 18 slots on the wire, zero-filled past the
/// advertised count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitiesRes {
    pub capabilities: Vec<CapabilityEntry>,
}

impl CapabilitiesRes {
    pub const SLOTS: usize = 18;
    pub const SIZE: usize = 4 + Self::SLOTS * 16;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, 4)?;
        let count = buf.get_u32_le().min(Self::SLOTS as u32) as usize;
        let mut capabilities = Vec::with_capacity(count);
        for _ in 0..count {
            ensure(buf, 16)?;
            let codec = SkinnyCodec(buf.get_u32_le());
            let max_frames_per_packet = buf.get_u32_le();
            let g723_bitrate = buf.get_u32_le();
            buf.advance(4);
            capabilities.push(CapabilityEntry {
                codec,
                max_frames_per_packet,
                g723_bitrate,
            });
        }
        skip_reserved(buf, (Self::SLOTS - count) * 16);
        Ok(Self { capabilities })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        let count = self.capabilities.len();
        if count > Self::SLOTS {
            return Err(SccpError::CapacityExceeded {
                capacity: Self::SLOTS,
            });
        }
        buf.put_u32_le(count as u32);
        for cap in &self.capabilities {
            buf.put_u32_le(cap.codec.as_u32());
            buf.put_u32_le(cap.max_frames_per_packet);
            buf.put_u32_le(cap.g723_bitrate);
            put_reserved(buf, 4);
        }
        put_reserved(buf, (Self::SLOTS - count) * 16);
        Ok(())
    }

    /// Preference-ordered audio capability set from the advertised list
    pub fn audio_capabilities(&self) -> AudioCapabilities {
        self.capabilities.iter().map(|c| c.codec).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub severity: u32,
    pub text: String,
    pub parm1: u32,
    pub parm2: u32,
}

impl Alarm {
    pub const SIZE: usize = 4 + ALARM_TEXT_LEN + 8;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        let severity = buf.get_u32_le();
        let text = get_fixed_string(buf, ALARM_TEXT_LEN)?;
        let parm1 = buf.get_u32_le();
        let parm2 = buf.get_u32_le();
        Ok(Self {
            severity,
            text,
            parm1,
            parm2,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.severity);
        put_fixed_string(buf, &self.text, ALARM_TEXT_LEN);
        buf.put_u32_le(self.parm1);
        buf.put_u32_le(self.parm2);
        Ok(())
    }
}

/// Phone's answer to OpenReceiveChannel, carrying its RTP endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenReceiveChannelAck {
    V3 {
        status: u32,
        ip: Ipv4Addr,
        port: u32,
        passthru_party_id: u32,
        call_reference: u32,
    },
    V17 {
        status: u32,
        ip: IpAddr,
        port: u32,
        passthru_party_id: u32,
        call_reference: u32,
    },
}

impl OpenReceiveChannelAck {
    pub const SIZE_V3: usize = 20;
    pub const SIZE_V17: usize = 36;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        let status = buf.get_u32_le();
        let ip = get_ipv4_be(buf)?;
        Ok(Self::V3 {
            status,
            ip,
            port: buf.get_u32_le(),
            passthru_party_id: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V17)?;
        let status = buf.get_u32_le();
        let ip = get_tagged_addr(buf)?;
        Ok(Self::V17 {
            status,
            ip,
            port: buf.get_u32_le(),
            passthru_party_id: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        match *self {
            Self::V3 {
                status,
                ip,
                port,
                passthru_party_id,
                call_reference,
            } => {
                buf.put_u32_le(status);
                put_ipv4_be(buf, ip);
                buf.put_u32_le(port);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(call_reference);
            }
            Self::V17 {
                status,
                ip,
                port,
                passthru_party_id,
                call_reference,
            } => {
                buf.put_u32_le(status);
                put_tagged_addr(buf, ip);
                buf.put_u32_le(port);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(call_reference);
            }
        }
        Ok(())
    }

    /// RTP endpoint advertised by the phone
    pub fn media_addr(&self) -> (IpAddr, u16) {
        match *self {
            Self::V3 { ip, port, .. } => (IpAddr::V4(ip), port as u16),
            Self::V17 { ip, port, .. } => (ip, port as u16),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatisticsRes {
    pub directory_number: String,
    pub call_reference: u32,
    pub stats_processing: u32,
    pub packets_sent: u32,
    pub octets_sent: u32,
    pub packets_received: u32,
    pub octets_received: u32,
    pub packets_lost: u32,
    pub jitter: u32,
    pub latency: u32,
}

impl ConnectionStatisticsRes {
    pub const SIZE: usize = DIRNUM_LEN + 36;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            directory_number: get_fixed_string(buf, DIRNUM_LEN)?,
            call_reference: buf.get_u32_le(),
            stats_processing: buf.get_u32_le(),
            packets_sent: buf.get_u32_le(),
            octets_sent: buf.get_u32_le(),
            packets_received: buf.get_u32_le(),
            octets_received: buf.get_u32_le(),
            packets_lost: buf.get_u32_le(),
            jitter: buf.get_u32_le(),
            latency: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        put_fixed_string(buf, &self.directory_number, DIRNUM_LEN);
        buf.put_u32_le(self.call_reference);
        buf.put_u32_le(self.stats_processing);
        buf.put_u32_le(self.packets_sent);
        buf.put_u32_le(self.octets_sent);
        buf.put_u32_le(self.packets_received);
        buf.put_u32_le(self.octets_received);
        buf.put_u32_le(self.packets_lost);
        buf.put_u32_le(self.jitter);
        buf.put_u32_le(self.latency);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftKeyEvent {
    pub event: u32,
    pub line_instance: u32,
    pub call_reference: u32,
}

impl SoftKeyEvent {
    pub const SIZE: usize = 12;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            event: buf.get_u32_le(),
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.event);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTone {
    pub tone: u32,
    pub timeout: u32,
    pub line_instance: u32,
    pub call_reference: u32,
}

impl StartTone {
    pub const SIZE: usize = 16;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            tone: buf.get_u32_le(),
            timeout: buf.get_u32_le(),
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.tone);
        buf.put_u32_le(self.timeout);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }
}

/// StopTone grew an extra dword at v12; fields did not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTone {
    pub line_instance: u32,
    pub call_reference: u32,
}

impl StopTone {
    pub const SIZE_V3: usize = 8;
    pub const SIZE_V12: usize = 12;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        Ok(Self {
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn parse_v12(buf: &mut impl Buf) -> Result<Self> {
        let parsed = Self::parse_v3(buf)?;
        skip_reserved(buf, 4);
        Ok(parsed)
    }

    pub fn serialize_v3(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }

    pub fn serialize_v12(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize_v3(buf)?;
        put_reserved(buf, 4);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRinger {
    pub ring_mode: u32,
    pub ring_duration: u32,
    pub line_instance: u32,
    pub call_reference: u32,
}

impl SetRinger {
    pub const SIZE: usize = 16;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            ring_mode: buf.get_u32_le(),
            ring_duration: buf.get_u32_le(),
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.ring_mode);
        buf.put_u32_le(self.ring_duration);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLamp {
    pub stimulus: u32,
    pub stimulus_instance: u32,
    pub lamp_mode: u32,
}

impl SetLamp {
    pub const SIZE: usize = 12;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            stimulus: buf.get_u32_le(),
            stimulus_instance: buf.get_u32_le(),
            lamp_mode: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.stimulus);
        buf.put_u32_le(self.stimulus_instance);
        buf.put_u32_le(self.lamp_mode);
        Ok(())
    }
}

/// Tell the phone where to send its RTP stream.
///
/// V3 carries a bare network-order IPv4 address; v17 replaced it with a
/// family tag plus a 16-byte block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartMediaTransmission {
    V3 {
        conference_id: u32,
        passthru_party_id: u32,
        remote_ip: Ipv4Addr,
        remote_port: u32,
        ms_packet_size: u32,
        payload_type: SkinnyCodec,
        precedence: u32,
        silence_suppression: u32,
        max_frames_per_packet: u32,
        g723_bitrate: u32,
        conference_id1: u32,
        dtmf_payload: u32,
        rtp_timeout: u32,
    },
    V17 {
        conference_id: u32,
        passthru_party_id: u32,
        remote_ip: IpAddr,
        remote_port: u32,
        ms_packet_size: u32,
        payload_type: SkinnyCodec,
        precedence: u32,
        silence_suppression: u32,
        max_frames_per_packet: u32,
        g723_bitrate: u32,
        conference_id1: u32,
        dtmf_payload: u32,
        rtp_timeout: u32,
    },
}

impl StartMediaTransmission {
    pub const SIZE_V3: usize = 52;
    pub const SIZE_V17: usize = 68;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        let conference_id = buf.get_u32_le();
        let passthru_party_id = buf.get_u32_le();
        let remote_ip = get_ipv4_be(buf)?;
        Ok(Self::V3 {
            conference_id,
            passthru_party_id,
            remote_ip,
            remote_port: buf.get_u32_le(),
            ms_packet_size: buf.get_u32_le(),
            payload_type: SkinnyCodec(buf.get_u32_le()),
            precedence: buf.get_u32_le(),
            silence_suppression: buf.get_u32_le(),
            max_frames_per_packet: buf.get_u32_le(),
            g723_bitrate: buf.get_u32_le(),
            conference_id1: buf.get_u32_le(),
            dtmf_payload: buf.get_u32_le(),
            rtp_timeout: buf.get_u32_le(),
        })
    }

    pub fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V17)?;
        let conference_id = buf.get_u32_le();
        let passthru_party_id = buf.get_u32_le();
        let remote_ip = get_tagged_addr(buf)?;
        Ok(Self::V17 {
            conference_id,
            passthru_party_id,
            remote_ip,
            remote_port: buf.get_u32_le(),
            ms_packet_size: buf.get_u32_le(),
            payload_type: SkinnyCodec(buf.get_u32_le()),
            precedence: buf.get_u32_le(),
            silence_suppression: buf.get_u32_le(),
            max_frames_per_packet: buf.get_u32_le(),
            g723_bitrate: buf.get_u32_le(),
            conference_id1: buf.get_u32_le(),
            dtmf_payload: buf.get_u32_le(),
            rtp_timeout: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            Self::V3 {
                conference_id,
                passthru_party_id,
                remote_ip,
                remote_port,
                ms_packet_size,
                payload_type,
                precedence,
                silence_suppression,
                max_frames_per_packet,
                g723_bitrate,
                conference_id1,
                dtmf_payload,
                rtp_timeout,
            } => {
                buf.put_u32_le(*conference_id);
                buf.put_u32_le(*passthru_party_id);
                put_ipv4_be(buf, *remote_ip);
                buf.put_u32_le(*remote_port);
                buf.put_u32_le(*ms_packet_size);
                buf.put_u32_le(payload_type.as_u32());
                buf.put_u32_le(*precedence);
                buf.put_u32_le(*silence_suppression);
                buf.put_u32_le(*max_frames_per_packet);
                buf.put_u32_le(*g723_bitrate);
                buf.put_u32_le(*conference_id1);
                buf.put_u32_le(*dtmf_payload);
                buf.put_u32_le(*rtp_timeout);
            }
            Self::V17 {
                conference_id,
                passthru_party_id,
                remote_ip,
                remote_port,
                ms_packet_size,
                payload_type,
                precedence,
                silence_suppression,
                max_frames_per_packet,
                g723_bitrate,
                conference_id1,
                dtmf_payload,
                rtp_timeout,
            } => {
                buf.put_u32_le(*conference_id);
                buf.put_u32_le(*passthru_party_id);
                put_tagged_addr(buf, *remote_ip);
                buf.put_u32_le(*remote_port);
                buf.put_u32_le(*ms_packet_size);
                buf.put_u32_le(payload_type.as_u32());
                buf.put_u32_le(*precedence);
                buf.put_u32_le(*silence_suppression);
                buf.put_u32_le(*max_frames_per_packet);
                buf.put_u32_le(*g723_bitrate);
                buf.put_u32_le(*conference_id1);
                buf.put_u32_le(*dtmf_payload);
                buf.put_u32_le(*rtp_timeout);
            }
        }
        Ok(())
    }
}

/// Phone confirms the media path is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartMediaTransmissionAck {
    V3 {
        call_reference: u32,
        passthru_party_id: u32,
        call_reference1: u32,
        ip: Ipv4Addr,
        port: u32,
        status: u32,
    },
    V17 {
        call_reference: u32,
        passthru_party_id: u32,
        call_reference1: u32,
        ip: IpAddr,
        port: u32,
        status: u32,
    },
}

impl StartMediaTransmissionAck {
    pub const SIZE_V3: usize = 24;
    pub const SIZE_V17: usize = 40;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        let call_reference = buf.get_u32_le();
        let passthru_party_id = buf.get_u32_le();
        let call_reference1 = buf.get_u32_le();
        let ip = get_ipv4_be(buf)?;
        Ok(Self::V3 {
            call_reference,
            passthru_party_id,
            call_reference1,
            ip,
            port: buf.get_u32_le(),
            status: buf.get_u32_le(),
        })
    }

    pub fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V17)?;
        let call_reference = buf.get_u32_le();
        let passthru_party_id = buf.get_u32_le();
        let call_reference1 = buf.get_u32_le();
        let ip = get_tagged_addr(buf)?;
        Ok(Self::V17 {
            call_reference,
            passthru_party_id,
            call_reference1,
            ip,
            port: buf.get_u32_le(),
            status: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        match *self {
            Self::V3 {
                call_reference,
                passthru_party_id,
                call_reference1,
                ip,
                port,
                status,
            } => {
                buf.put_u32_le(call_reference);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(call_reference1);
                put_ipv4_be(buf, ip);
                buf.put_u32_le(port);
                buf.put_u32_le(status);
            }
            Self::V17 {
                call_reference,
                passthru_party_id,
                call_reference1,
                ip,
                port,
                status,
            } => {
                buf.put_u32_le(call_reference);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(call_reference1);
                put_tagged_addr(buf, ip);
                buf.put_u32_le(port);
                buf.put_u32_le(status);
            }
        }
        Ok(())
    }
}

/// StopMediaTransmission gained a trailing dword at v17; fields unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopMediaTransmission {
    pub conference_id: u32,
    pub passthru_party_id: u32,
    pub conference_id1: u32,
}

impl StopMediaTransmission {
    pub const SIZE_V3: usize = 12;
    pub const SIZE_V17: usize = 16;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        Ok(Self {
            conference_id: buf.get_u32_le(),
            passthru_party_id: buf.get_u32_le(),
            conference_id1: buf.get_u32_le(),
        })
    }

    pub fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        let parsed = Self::parse_v3(buf)?;
        skip_reserved(buf, 4);
        Ok(parsed)
    }

    pub fn serialize_v3(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.conference_id);
        buf.put_u32_le(self.passthru_party_id);
        buf.put_u32_le(self.conference_id1);
        Ok(())
    }

    pub fn serialize_v17(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize_v3(buf)?;
        put_reserved(buf, 4);
        Ok(())
    }
}

/// Video stream shaping block carried by the multimedia channel messages.
/// The v17 layout leads with the conference service number and appends
/// eight reserved dwords.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoParameters {
    pub bit_rate: u32,
    pub picture_format_count: u32,
    pub picture_format: u32,
    pub picture_mpi: u32,
    pub conf_service_num: u32,
    pub profile: u32,
    pub level: u32,
    pub macroblocks_per_sec: u32,
    pub macroblocks_per_frame: u32,
    pub dec_pic_buf: u32,
    pub br_and_cpb: u32,
}

impl VideoParameters {
    pub const SIZE_V3: usize = 44;
    pub const SIZE_V17: usize = 76;

    fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        Ok(Self {
            bit_rate: buf.get_u32_le(),
            picture_format_count: buf.get_u32_le(),
            picture_format: buf.get_u32_le(),
            picture_mpi: buf.get_u32_le(),
            conf_service_num: buf.get_u32_le(),
            profile: buf.get_u32_le(),
            level: buf.get_u32_le(),
            macroblocks_per_sec: buf.get_u32_le(),
            macroblocks_per_frame: buf.get_u32_le(),
            dec_pic_buf: buf.get_u32_le(),
            br_and_cpb: buf.get_u32_le(),
        })
    }

    fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V17)?;
        let conf_service_num = buf.get_u32_le();
        let bit_rate = buf.get_u32_le();
        let parsed = Self {
            bit_rate,
            picture_format_count: buf.get_u32_le(),
            picture_format: buf.get_u32_le(),
            picture_mpi: buf.get_u32_le(),
            conf_service_num,
            profile: buf.get_u32_le(),
            level: buf.get_u32_le(),
            macroblocks_per_sec: buf.get_u32_le(),
            macroblocks_per_frame: buf.get_u32_le(),
            dec_pic_buf: buf.get_u32_le(),
            br_and_cpb: buf.get_u32_le(),
        };
        skip_reserved(buf, 32);
        Ok(parsed)
    }

    fn serialize_v3(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.bit_rate);
        buf.put_u32_le(self.picture_format_count);
        buf.put_u32_le(self.picture_format);
        buf.put_u32_le(self.picture_mpi);
        buf.put_u32_le(self.conf_service_num);
        buf.put_u32_le(self.profile);
        buf.put_u32_le(self.level);
        buf.put_u32_le(self.macroblocks_per_sec);
        buf.put_u32_le(self.macroblocks_per_frame);
        buf.put_u32_le(self.dec_pic_buf);
        buf.put_u32_le(self.br_and_cpb);
    }

    fn serialize_v17(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.conf_service_num);
        buf.put_u32_le(self.bit_rate);
        buf.put_u32_le(self.picture_format_count);
        buf.put_u32_le(self.picture_format);
        buf.put_u32_le(self.picture_mpi);
        buf.put_u32_le(self.profile);
        buf.put_u32_le(self.level);
        buf.put_u32_le(self.macroblocks_per_sec);
        buf.put_u32_le(self.macroblocks_per_frame);
        buf.put_u32_le(self.dec_pic_buf);
        buf.put_u32_le(self.br_and_cpb);
        put_reserved(buf, 32);
    }
}

/// Ask the phone to open its video receive path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenMultiMediaChannel {
    V3 {
        conference_id: u32,
        passthru_party_id: u32,
        payload_capability: SkinnyCodec,
        line_instance: u32,
        call_reference: u32,
        payload_type: u32,
        video: VideoParameters,
    },
    V17 {
        conference_id: u32,
        passthru_party_id: u32,
        payload_capability: SkinnyCodec,
        line_instance: u32,
        call_reference: u32,
        payload_type: u32,
        video: VideoParameters,
    },
}

impl OpenMultiMediaChannel {
    pub const SIZE_V3: usize = 24 + VideoParameters::SIZE_V3;
    pub const SIZE_V17: usize = 24 + VideoParameters::SIZE_V17;

    fn parse_prefix(buf: &mut impl Buf) -> (u32, u32, SkinnyCodec, u32, u32, u32) {
        (
            buf.get_u32_le(),
            buf.get_u32_le(),
            SkinnyCodec(buf.get_u32_le()),
            buf.get_u32_le(),
            buf.get_u32_le(),
            buf.get_u32_le(),
        )
    }

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        let (conference_id, passthru_party_id, payload_capability, line_instance, call_reference, payload_type) =
            Self::parse_prefix(buf);
        Ok(Self::V3 {
            conference_id,
            passthru_party_id,
            payload_capability,
            line_instance,
            call_reference,
            payload_type,
            video: VideoParameters::parse_v3(buf)?,
        })
    }

    pub fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V17)?;
        let (conference_id, passthru_party_id, payload_capability, line_instance, call_reference, payload_type) =
            Self::parse_prefix(buf);
        Ok(Self::V17 {
            conference_id,
            passthru_party_id,
            payload_capability,
            line_instance,
            call_reference,
            payload_type,
            video: VideoParameters::parse_v17(buf)?,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        match *self {
            Self::V3 {
                conference_id,
                passthru_party_id,
                payload_capability,
                line_instance,
                call_reference,
                payload_type,
                video,
            } => {
                buf.put_u32_le(conference_id);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(payload_capability.as_u32());
                buf.put_u32_le(line_instance);
                buf.put_u32_le(call_reference);
                buf.put_u32_le(payload_type);
                video.serialize_v3(buf);
            }
            Self::V17 {
                conference_id,
                passthru_party_id,
                payload_capability,
                line_instance,
                call_reference,
                payload_type,
                video,
            } => {
                buf.put_u32_le(conference_id);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(payload_capability.as_u32());
                buf.put_u32_le(line_instance);
                buf.put_u32_le(call_reference);
                buf.put_u32_le(payload_type);
                video.serialize_v17(buf);
            }
        }
        Ok(())
    }
}

/// Tell the phone where to send its video RTP stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartMultiMediaTransmission {
    V3 {
        conference_id: u32,
        passthru_party_id: u32,
        payload_capability: SkinnyCodec,
        remote_ip: Ipv4Addr,
        remote_port: u32,
        call_reference: u32,
        payload_type: u32,
        dscp: u32,
        video: VideoParameters,
    },
    V17 {
        conference_id: u32,
        passthru_party_id: u32,
        payload_capability: SkinnyCodec,
        remote_ip: IpAddr,
        remote_port: u32,
        call_reference: u32,
        payload_type: u32,
        dscp: u32,
        video: VideoParameters,
    },
}

impl StartMultiMediaTransmission {
    pub const SIZE_V3: usize = 32 + VideoParameters::SIZE_V3;
    pub const SIZE_V17: usize = 48 + VideoParameters::SIZE_V17;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        let conference_id = buf.get_u32_le();
        let passthru_party_id = buf.get_u32_le();
        let payload_capability = SkinnyCodec(buf.get_u32_le());
        let remote_ip = get_ipv4_be(buf)?;
        Ok(Self::V3 {
            conference_id,
            passthru_party_id,
            payload_capability,
            remote_ip,
            remote_port: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
            payload_type: buf.get_u32_le(),
            dscp: buf.get_u32_le(),
            video: VideoParameters::parse_v3(buf)?,
        })
    }

    pub fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V17)?;
        let conference_id = buf.get_u32_le();
        let passthru_party_id = buf.get_u32_le();
        let payload_capability = SkinnyCodec(buf.get_u32_le());
        let remote_ip = get_tagged_addr(buf)?;
        Ok(Self::V17 {
            conference_id,
            passthru_party_id,
            payload_capability,
            remote_ip,
            remote_port: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
            payload_type: buf.get_u32_le(),
            dscp: buf.get_u32_le(),
            video: VideoParameters::parse_v17(buf)?,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        match *self {
            Self::V3 {
                conference_id,
                passthru_party_id,
                payload_capability,
                remote_ip,
                remote_port,
                call_reference,
                payload_type,
                dscp,
                video,
            } => {
                buf.put_u32_le(conference_id);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(payload_capability.as_u32());
                put_ipv4_be(buf, remote_ip);
                buf.put_u32_le(remote_port);
                buf.put_u32_le(call_reference);
                buf.put_u32_le(payload_type);
                buf.put_u32_le(dscp);
                video.serialize_v3(buf);
            }
            Self::V17 {
                conference_id,
                passthru_party_id,
                payload_capability,
                remote_ip,
                remote_port,
                call_reference,
                payload_type,
                dscp,
                video,
            } => {
                buf.put_u32_le(conference_id);
                buf.put_u32_le(passthru_party_id);
                buf.put_u32_le(payload_capability.as_u32());
                put_tagged_addr(buf, remote_ip);
                buf.put_u32_le(remote_port);
                buf.put_u32_le(call_reference);
                buf.put_u32_le(payload_type);
                buf.put_u32_le(dscp);
                video.serialize_v17(buf);
            }
        }
        Ok(())
    }
}

/// Ask the phone to open its receive path.
///
/// The layout carries large reserved regions; v17 appended an untagged
/// 16-byte remote address block and a buffer-size dword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenReceiveChannel {
    V3 {
        conference_id: u32,
        passthru_party_id: u32,
        ms_packet_size: u32,
        payload_type: SkinnyCodec,
        vad: u32,
        g723_bitrate: u32,
        conference_id1: u32,
        dtmf_payload: u32,
        rtp_timeout: u32,
    },
    V17 {
        conference_id: u32,
        passthru_party_id: u32,
        ms_packet_size: u32,
        payload_type: SkinnyCodec,
        vad: u32,
        g723_bitrate: u32,
        conference_id1: u32,
        dtmf_payload: u32,
        rtp_timeout: u32,
        remote_ip: IpAddr,
        /// Observed as 0x0FA0 on the wire
        unknown: u32,
    },
}

impl OpenReceiveChannel {
    pub const SIZE_V3: usize = 92;
    pub const SIZE_V17: usize = 128;

    fn parse_prefix(buf: &mut impl Buf) -> Result<(u32, u32, u32, SkinnyCodec, u32, u32, u32, u32, u32)> {
        ensure(buf, Self::SIZE_V3)?;
        let conference_id = buf.get_u32_le();
        let passthru_party_id = buf.get_u32_le();
        let ms_packet_size = buf.get_u32_le();
        let payload_type = SkinnyCodec(buf.get_u32_le());
        let vad = buf.get_u32_le();
        let g723_bitrate = buf.get_u32_le();
        let conference_id1 = buf.get_u32_le();
        skip_reserved(buf, 56);
        let dtmf_payload = buf.get_u32_le();
        let rtp_timeout = buf.get_u32_le();
        Ok((
            conference_id,
            passthru_party_id,
            ms_packet_size,
            payload_type,
            vad,
            g723_bitrate,
            conference_id1,
            dtmf_payload,
            rtp_timeout,
        ))
    }

    fn serialize_prefix(&self, buf: &mut BytesMut) {
        let (cid, ptid, ms, pt, vad, g723, cid1, dtmf, timeout) = match *self {
            Self::V3 {
                conference_id,
                passthru_party_id,
                ms_packet_size,
                payload_type,
                vad,
                g723_bitrate,
                conference_id1,
                dtmf_payload,
                rtp_timeout,
            }
            | Self::V17 {
                conference_id,
                passthru_party_id,
                ms_packet_size,
                payload_type,
                vad,
                g723_bitrate,
                conference_id1,
                dtmf_payload,
                rtp_timeout,
                ..
            } => (
                conference_id,
                passthru_party_id,
                ms_packet_size,
                payload_type,
                vad,
                g723_bitrate,
                conference_id1,
                dtmf_payload,
                rtp_timeout,
            ),
        };
        buf.put_u32_le(cid);
        buf.put_u32_le(ptid);
        buf.put_u32_le(ms);
        buf.put_u32_le(pt.as_u32());
        buf.put_u32_le(vad);
        buf.put_u32_le(g723);
        buf.put_u32_le(cid1);
        put_reserved(buf, 56);
        buf.put_u32_le(dtmf);
        buf.put_u32_le(timeout);
    }

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        let (
            conference_id,
            passthru_party_id,
            ms_packet_size,
            payload_type,
            vad,
            g723_bitrate,
            conference_id1,
            dtmf_payload,
            rtp_timeout,
        ) = Self::parse_prefix(buf)?;
        Ok(Self::V3 {
            conference_id,
            passthru_party_id,
            ms_packet_size,
            payload_type,
            vad,
            g723_bitrate,
            conference_id1,
            dtmf_payload,
            rtp_timeout,
        })
    }

    pub fn parse_v17(buf: &mut impl Buf) -> Result<Self> {
        let (
            conference_id,
            passthru_party_id,
            ms_packet_size,
            payload_type,
            vad,
            g723_bitrate,
            conference_id1,
            dtmf_payload,
            rtp_timeout,
        ) = Self::parse_prefix(buf)?;
        ensure(buf, 36)?;
        skip_reserved(buf, 12);
        let remote_ip = get_addr16(buf)?;
        let unknown = buf.get_u32_le();
        skip_reserved(buf, 4);
        Ok(Self::V17 {
            conference_id,
            passthru_party_id,
            ms_packet_size,
            payload_type,
            vad,
            g723_bitrate,
            conference_id1,
            dtmf_payload,
            rtp_timeout,
            remote_ip,
            unknown,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize_prefix(buf);
        if let Self::V17 {
            remote_ip, unknown, ..
        } = *self
        {
            put_reserved(buf, 12);
            put_addr16(buf, remote_ip);
            buf.put_u32_le(unknown);
            put_reserved(buf, 4);
        }
        Ok(())
    }
}

/// CloseReceiveChannel gained the conference id echo at v5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseReceiveChannel {
    pub conference_id: u32,
    pub passthru_party_id: u32,
    pub conference_id1: u32,
}

impl CloseReceiveChannel {
    pub const SIZE_V3: usize = 8;
    pub const SIZE_V5: usize = 12;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        let conference_id = buf.get_u32_le();
        Ok(Self {
            conference_id,
            passthru_party_id: buf.get_u32_le(),
            conference_id1: conference_id,
        })
    }

    pub fn parse_v5(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V5)?;
        Ok(Self {
            conference_id: buf.get_u32_le(),
            passthru_party_id: buf.get_u32_le(),
            conference_id1: buf.get_u32_le(),
        })
    }

    pub fn serialize_v3(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.conference_id);
        buf.put_u32_le(self.passthru_party_id);
        Ok(())
    }

    pub fn serialize_v5(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize_v3(buf)?;
        buf.put_u32_le(self.conference_id1);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatisticsReq {
    pub call_reference: u32,
    pub stats_processing: u32,
}

impl ConnectionStatisticsReq {
    pub const SIZE: usize = DIRNUM_LEN + 8;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        skip_reserved(buf, DIRNUM_LEN);
        Ok(Self {
            call_reference: buf.get_u32_le(),
            stats_processing: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        put_reserved(buf, DIRNUM_LEN);
        buf.put_u32_le(self.call_reference);
        buf.put_u32_le(self.stats_processing);
        Ok(())
    }
}

/// Static call information with fixed-width party fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallInfo {
    pub calling_party_name: String,
    pub calling_party: String,
    pub called_party_name: String,
    pub called_party: String,
    pub line_id: u32,
    pub call_reference: u32,
    pub call_type: u32,
    pub original_called_party_name: String,
    pub original_called_party: String,
    pub last_redirecting_party_name: String,
    pub last_redirecting_party: String,
    pub original_cdpn_redirect_reason: u32,
    pub last_redirecting_reason: u32,
    pub call_instance: u32,
    pub call_security_status: u32,
    pub party_pi_restriction_bits: u32,
}

impl CallInfo {
    pub const SIZE: usize = 2 * (NAME_LEN + DIRNUM_LEN) * 2 + 3 * 4 + 5 * 4;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            calling_party_name: get_fixed_string(buf, NAME_LEN)?,
            calling_party: get_fixed_string(buf, DIRNUM_LEN)?,
            called_party_name: get_fixed_string(buf, NAME_LEN)?,
            called_party: get_fixed_string(buf, DIRNUM_LEN)?,
            line_id: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
            call_type: buf.get_u32_le(),
            original_called_party_name: get_fixed_string(buf, NAME_LEN)?,
            original_called_party: get_fixed_string(buf, DIRNUM_LEN)?,
            last_redirecting_party_name: get_fixed_string(buf, NAME_LEN)?,
            last_redirecting_party: get_fixed_string(buf, DIRNUM_LEN)?,
            original_cdpn_redirect_reason: buf.get_u32_le(),
            last_redirecting_reason: buf.get_u32_le(),
            call_instance: buf.get_u32_le(),
            call_security_status: buf.get_u32_le(),
            party_pi_restriction_bits: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        put_fixed_string(buf, &self.calling_party_name, NAME_LEN);
        put_fixed_string(buf, &self.calling_party, DIRNUM_LEN);
        put_fixed_string(buf, &self.called_party_name, NAME_LEN);
        put_fixed_string(buf, &self.called_party, DIRNUM_LEN);
        buf.put_u32_le(self.line_id);
        buf.put_u32_le(self.call_reference);
        buf.put_u32_le(self.call_type);
        put_fixed_string(buf, &self.original_called_party_name, NAME_LEN);
        put_fixed_string(buf, &self.original_called_party, DIRNUM_LEN);
        put_fixed_string(buf, &self.last_redirecting_party_name, NAME_LEN);
        put_fixed_string(buf, &self.last_redirecting_party, DIRNUM_LEN);
        buf.put_u32_le(self.original_cdpn_redirect_reason);
        buf.put_u32_le(self.last_redirecting_reason);
        buf.put_u32_le(self.call_instance);
        buf.put_u32_le(self.call_security_status);
        buf.put_u32_le(self.party_pi_restriction_bits);
        Ok(())
    }
}

/// Dynamic call information: fixed numeric header followed by
/// NUL-separated party strings, dword padded. The field count per
/// generation (12 at v7, 16 at v16) is a builder concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallInfoDynamic {
    pub line_id: u32,
    pub call_reference: u32,
    pub call_type: u32,
    pub original_cdpn_redirect_reason: u32,
    pub last_redirecting_reason: u32,
    pub call_instance: u32,
    pub call_security_status: u32,
    pub party_pi_restriction_bits: u32,
    pub parties: Vec<String>,
}

impl CallInfoDynamic {
    pub const HEADER_SIZE: usize = 32;
    /// Party string fields per generation of the blob
    pub const PARTY_FIELDS_V7: usize = 12;
    pub const PARTY_FIELDS_V16: usize = 16;

    /// The blob cannot distinguish trailing empty fields from its dword
    /// padding, so the decoded party list is padded back up to the
    /// generation's fixed field count.
    fn parse_with_fields(buf: &mut impl Buf, fields: usize) -> Result<Self> {
        ensure(buf, Self::HEADER_SIZE)?;
        let mut msg = Self {
            line_id: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
            call_type: buf.get_u32_le(),
            original_cdpn_redirect_reason: buf.get_u32_le(),
            last_redirecting_reason: buf.get_u32_le(),
            call_instance: buf.get_u32_le(),
            call_security_status: buf.get_u32_le(),
            party_pi_restriction_bits: buf.get_u32_le(),
            parties: get_string_blob(buf),
        };
        msg.parties.resize(msg.parties.len().max(fields), String::new());
        Ok(msg)
    }

    pub fn parse_v7(buf: &mut impl Buf) -> Result<Self> {
        Self::parse_with_fields(buf, Self::PARTY_FIELDS_V7)
    }

    pub fn parse_v16(buf: &mut impl Buf) -> Result<Self> {
        Self::parse_with_fields(buf, Self::PARTY_FIELDS_V16)
    }

    pub fn serialize_v7(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize(buf)
    }

    pub fn serialize_v16(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize(buf)
    }

    fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.line_id);
        buf.put_u32_le(self.call_reference);
        buf.put_u32_le(self.call_type);
        buf.put_u32_le(self.original_cdpn_redirect_reason);
        buf.put_u32_le(self.last_redirecting_reason);
        buf.put_u32_le(self.call_instance);
        buf.put_u32_le(self.call_security_status);
        buf.put_u32_le(self.party_pi_restriction_bits);
        put_string_blob(buf, &self.parties);
        Ok(())
    }
}

/// Call forward status for a line. The v19 layout appends a marker dword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardStat {
    pub status: u32,
    pub line_number: u32,
    pub cfwd_all_status: u32,
    pub cfwd_all_number: String,
    pub cfwd_busy_status: u32,
    pub cfwd_busy_number: String,
    pub cfwd_noanswer_status: u32,
    pub cfwd_noanswer_number: String,
}

impl ForwardStat {
    pub const SIZE_V3: usize = 8 + 3 * (4 + DIRNUM_LEN);
    pub const SIZE_V19: usize = Self::SIZE_V3 + 4;
    /// Trailing marker the v19 layout carries
    pub const V19_MARKER: u32 = 0x0000_00FF;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE_V3)?;
        Ok(Self {
            status: buf.get_u32_le(),
            line_number: buf.get_u32_le(),
            cfwd_all_status: buf.get_u32_le(),
            cfwd_all_number: get_fixed_string(buf, DIRNUM_LEN)?,
            cfwd_busy_status: buf.get_u32_le(),
            cfwd_busy_number: get_fixed_string(buf, DIRNUM_LEN)?,
            cfwd_noanswer_status: buf.get_u32_le(),
            cfwd_noanswer_number: get_fixed_string(buf, DIRNUM_LEN)?,
        })
    }

    pub fn parse_v19(buf: &mut impl Buf) -> Result<Self> {
        let parsed = Self::parse_v3(buf)?;
        skip_reserved(buf, 4);
        Ok(parsed)
    }

    pub fn serialize_v3(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.status);
        buf.put_u32_le(self.line_number);
        buf.put_u32_le(self.cfwd_all_status);
        put_fixed_string(buf, &self.cfwd_all_number, DIRNUM_LEN);
        buf.put_u32_le(self.cfwd_busy_status);
        put_fixed_string(buf, &self.cfwd_busy_number, DIRNUM_LEN);
        buf.put_u32_le(self.cfwd_noanswer_status);
        put_fixed_string(buf, &self.cfwd_noanswer_number, DIRNUM_LEN);
        Ok(())
    }

    pub fn serialize_v19(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize_v3(buf)?;
        buf.put_u32_le(Self::V19_MARKER);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedDialStat {
    pub number: u32,
    pub directory_number: String,
    pub display_name: String,
}

impl SpeedDialStat {
    pub const SIZE: usize = 4 + DIRNUM_LEN + NAME_LEN;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            number: buf.get_u32_le(),
            directory_number: get_fixed_string(buf, DIRNUM_LEN)?,
            display_name: get_fixed_string(buf, NAME_LEN)?,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.number);
        put_fixed_string(buf, &self.directory_number, DIRNUM_LEN);
        put_fixed_string(buf, &self.display_name, NAME_LEN);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStat {
    pub line_number: u32,
    pub directory_number: String,
    pub fully_qualified_name: String,
    pub display_name: String,
}

impl LineStat {
    pub const SIZE: usize = 4 + DIRNUM_LEN + NAME_LEN + LINE_LABEL_LEN;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            line_number: buf.get_u32_le(),
            directory_number: get_fixed_string(buf, DIRNUM_LEN)?,
            fully_qualified_name: get_fixed_string(buf, NAME_LEN)?,
            display_name: get_fixed_string(buf, LINE_LABEL_LEN)?,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.line_number);
        put_fixed_string(buf, &self.directory_number, DIRNUM_LEN);
        put_fixed_string(buf, &self.fully_qualified_name, NAME_LEN);
        put_fixed_string(buf, &self.display_name, LINE_LABEL_LEN);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefineTimeDate {
    pub year: u32,
    pub month: u32,
    pub day_of_week: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub seconds: u32,
    pub milliseconds: u32,
    pub system_time: u32,
}

impl DefineTimeDate {
    pub const SIZE: usize = 36;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            year: buf.get_u32_le(),
            month: buf.get_u32_le(),
            day_of_week: buf.get_u32_le(),
            day: buf.get_u32_le(),
            hour: buf.get_u32_le(),
            minute: buf.get_u32_le(),
            seconds: buf.get_u32_le(),
            milliseconds: buf.get_u32_le(),
            system_time: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.year);
        buf.put_u32_le(self.month);
        buf.put_u32_le(self.day_of_week);
        buf.put_u32_le(self.day);
        buf.put_u32_le(self.hour);
        buf.put_u32_le(self.minute);
        buf.put_u32_le(self.seconds);
        buf.put_u32_le(self.milliseconds);
        buf.put_u32_le(self.system_time);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonDefinition {
    pub instance: u8,
    pub button: u8,
}

/// Button layout pushed to the phone; 42 slots on the wire, zero-filled
/// past the advertised count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonTemplate {
    pub offset: u32,
    pub total_count: u32,
    pub buttons: Vec<ButtonDefinition>,
}

impl ButtonTemplate {
    pub const SIZE: usize = 12 + BUTTON_TEMPLATE_MAX * 2;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        let offset = buf.get_u32_le();
        let count = buf.get_u32_le().min(BUTTON_TEMPLATE_MAX as u32) as usize;
        let total_count = buf.get_u32_le();
        let mut buttons = Vec::with_capacity(count);
        for _ in 0..count {
            buttons.push(ButtonDefinition {
                instance: buf.get_u8(),
                button: buf.get_u8(),
            });
        }
        skip_reserved(buf, (BUTTON_TEMPLATE_MAX - count) * 2);
        Ok(Self {
            offset,
            total_count,
            buttons,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        let count = self.buttons.len();
        if count > BUTTON_TEMPLATE_MAX {
            return Err(SccpError::CapacityExceeded {
                capacity: BUTTON_TEMPLATE_MAX,
            });
        }
        buf.put_u32_le(self.offset);
        buf.put_u32_le(count as u32);
        buf.put_u32_le(self.total_count);
        for b in &self.buttons {
            buf.put_u8(b.instance);
            buf.put_u8(b.button);
        }
        put_reserved(buf, (BUTTON_TEMPLATE_MAX - count) * 2);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallState {
    pub call_state: u32,
    pub line_instance: u32,
    pub call_reference: u32,
    pub visibility: u32,
    pub priority: u32,
}

impl CallState {
    pub const SIZE: usize = 24;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        let parsed = Self {
            call_state: buf.get_u32_le(),
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
            visibility: buf.get_u32_le(),
            priority: buf.get_u32_le(),
        };
        skip_reserved(buf, 4);
        Ok(parsed)
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.call_state);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        buf.put_u32_le(self.visibility);
        buf.put_u32_le(self.priority);
        put_reserved(buf, 4);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectSoftKeys {
    pub line_instance: u32,
    pub call_reference: u32,
    pub softkey_set_index: u32,
    pub valid_key_mask: u32,
}

impl SelectSoftKeys {
    pub const SIZE: usize = 16;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
            softkey_set_index: buf.get_u32_le(),
            valid_key_mask: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        buf.put_u32_le(self.softkey_set_index);
        buf.put_u32_le(self.valid_key_mask);
        Ok(())
    }
}

/// Prompt line above the softkeys. Static layout only; the dynamic
/// variant is a separate message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPromptStatus {
    pub timeout: u32,
    pub message: String,
    pub line_instance: u32,
    pub call_reference: u32,
}

impl DisplayPromptStatus {
    pub const SIZE: usize = 4 + NOTIFY_LEN + 8;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            timeout: buf.get_u32_le(),
            message: get_fixed_string(buf, NOTIFY_LEN)?,
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.timeout);
        put_fixed_string(buf, &self.message, NOTIFY_LEN);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDynamicPromptStatus {
    pub timeout: u32,
    pub line_instance: u32,
    pub call_reference: u32,
    pub message: String,
}

impl DisplayDynamicPromptStatus {
    pub const HEADER_SIZE: usize = 12;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::HEADER_SIZE)?;
        let timeout = buf.get_u32_le();
        let line_instance = buf.get_u32_le();
        let call_reference = buf.get_u32_le();
        let message = get_string_blob(buf).into_iter().next().unwrap_or_default();
        Ok(Self {
            timeout,
            line_instance,
            call_reference,
            message,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.timeout);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        put_string_blob(buf, std::slice::from_ref(&self.message));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearPromptStatus {
    pub line_instance: u32,
    pub call_reference: u32,
}

impl ClearPromptStatus {
    pub const SIZE: usize = 8;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNotify {
    pub timeout: u32,
    pub message: String,
}

impl DisplayNotify {
    pub const SIZE: usize = 4 + NOTIFY_LEN;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            timeout: buf.get_u32_le(),
            message: get_fixed_string(buf, NOTIFY_LEN)?,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.timeout);
        put_fixed_string(buf, &self.message, NOTIFY_LEN);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDynamicNotify {
    pub timeout: u32,
    pub message: String,
}

impl DisplayDynamicNotify {
    pub const HEADER_SIZE: usize = 4;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::HEADER_SIZE)?;
        let timeout = buf.get_u32_le();
        let message = get_string_blob(buf).into_iter().next().unwrap_or_default();
        Ok(Self { timeout, message })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.timeout);
        put_string_blob(buf, std::slice::from_ref(&self.message));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPriNotify {
    pub timeout: u32,
    pub priority: u32,
    pub message: String,
}

impl DisplayPriNotify {
    pub const SIZE: usize = 8 + NOTIFY_LEN;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::SIZE)?;
        Ok(Self {
            timeout: buf.get_u32_le(),
            priority: buf.get_u32_le(),
            message: get_fixed_string(buf, NOTIFY_LEN)?,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.timeout);
        buf.put_u32_le(self.priority);
        put_fixed_string(buf, &self.message, NOTIFY_LEN);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDynamicPriNotify {
    pub timeout: u32,
    pub priority: u32,
    pub message: String,
}

impl DisplayDynamicPriNotify {
    pub const HEADER_SIZE: usize = 8;

    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        ensure(buf, Self::HEADER_SIZE)?;
        let timeout = buf.get_u32_le();
        let priority = buf.get_u32_le();
        let message = get_string_blob(buf).into_iter().next().unwrap_or_default();
        Ok(Self {
            timeout,
            priority,
            message,
        })
    }

    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u32_le(self.timeout);
        buf.put_u32_le(self.priority);
        put_string_blob(buf, std::slice::from_ref(&self.message));
        Ok(())
    }
}

/// Dialed number echo. The number field widened at v19.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialedNumber {
    pub called_party: String,
    pub line_instance: u32,
    pub call_reference: u32,
}

impl DialedNumber {
    pub const SIZE_V3: usize = DIRNUM_LEN + 8;
    pub const SIZE_V19: usize = DIRNUM_V19_LEN + 8;

    pub fn parse_v3(buf: &mut impl Buf) -> Result<Self> {
        Self::parse_width(buf, DIRNUM_LEN)
    }

    pub fn parse_v19(buf: &mut impl Buf) -> Result<Self> {
        Self::parse_width(buf, DIRNUM_V19_LEN)
    }

    fn parse_width(buf: &mut impl Buf, width: usize) -> Result<Self> {
        let called_party = get_fixed_string(buf, width)?;
        ensure(buf, 8)?;
        Ok(Self {
            called_party,
            line_instance: buf.get_u32_le(),
            call_reference: buf.get_u32_le(),
        })
    }

    pub fn serialize_v3(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize_width(buf, DIRNUM_LEN)
    }

    pub fn serialize_v19(&self, buf: &mut BytesMut) -> Result<()> {
        self.serialize_width(buf, DIRNUM_V19_LEN)
    }

    fn serialize_width(&self, buf: &mut BytesMut, width: usize) -> Result<()> {
        put_fixed_string(buf, &self.called_party, width);
        buf.put_u32_le(self.line_instance);
        buf.put_u32_le(self.call_reference);
        Ok(())
    }
}
