//! Per-version payload dispatch table
//!
//! Every message id owns a slice of variant rows sorted descending by the
//! protocol version a layout first appeared at. Resolution picks the first
//! row whose minimum version the negotiated version reaches, so adding a
//! protocol generation means adding a row, not another code path.
//!
//! Encoding a generation-variant payload under a version whose layout
//! cannot carry it fails with [`SccpError::UnsupportedVersion`] rather
//! than silently writing the wrong bytes.

use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use once_cell::sync::Lazy;

use super::field::{ensure, get_fixed_string, put_fixed_string};
use super::payloads::*;
use super::{MessageId, Payload};
use crate::error::{Result, SccpError};

type DecodeFn = fn(&mut Bytes) -> Result<Payload>;
type EncodeFn = fn(&Payload, &mut BytesMut) -> Result<()>;

/// One byte layout and the version range it serves
struct VariantRow {
    min_version: u8,
    decode: DecodeFn,
    encode: EncodeFn,
}

const fn row(min_version: u8, decode: DecodeFn, encode: EncodeFn) -> VariantRow {
    VariantRow {
        min_version,
        decode,
        encode,
    }
}

fn wrong_kind(payload: &Payload) -> SccpError {
    SccpError::malformed(
        payload.message_id().name(),
        "payload does not match message id",
    )
}

/// Codec pair for a kind with no payload bytes
macro_rules! unit_codec {
    ($dec:ident, $enc:ident, $variant:ident) => {
        fn $dec(_buf: &mut Bytes) -> Result<Payload> {
            Ok(Payload::$variant)
        }
        fn $enc(payload: &Payload, _buf: &mut BytesMut) -> Result<()> {
            match payload {
                Payload::$variant => Ok(()),
                other => Err(wrong_kind(other)),
            }
        }
    };
}

/// Codec pair delegating to a payload struct's single layout
macro_rules! struct_codec {
    ($dec:ident, $enc:ident, $variant:ident, $ty:ty) => {
        fn $dec(buf: &mut Bytes) -> Result<Payload> {
            Ok(Payload::$variant(<$ty>::parse(buf)?))
        }
        fn $enc(payload: &Payload, buf: &mut BytesMut) -> Result<()> {
            match payload {
                Payload::$variant(m) => m.serialize(buf),
                other => Err(wrong_kind(other)),
            }
        }
    };
}

/// Codec pair for one layout of a struct that has several
macro_rules! layout_codec {
    ($dec:ident, $enc:ident, $variant:ident, $ty:ty, $parse:ident, $serialize:ident) => {
        fn $dec(buf: &mut Bytes) -> Result<Payload> {
            Ok(Payload::$variant(<$ty>::$parse(buf)?))
        }
        fn $enc(payload: &Payload, buf: &mut BytesMut) -> Result<()> {
            match payload {
                Payload::$variant(m) => m.$serialize(buf),
                other => Err(wrong_kind(other)),
            }
        }
    };
}

/// Codec pair for one generation of a per-generation payload enum.
/// Encode insists the supplied payload is of this row's generation.
macro_rules! generation_codec {
    ($dec:ident, $enc:ident, $variant:ident, $ty:ident, $parse:ident, $gen:ident, $min:expr) => {
        fn $dec(buf: &mut Bytes) -> Result<Payload> {
            Ok(Payload::$variant($ty::$parse(buf)?))
        }
        fn $enc(payload: &Payload, buf: &mut BytesMut) -> Result<()> {
            match payload {
                Payload::$variant(m @ $ty::$gen { .. }) => m.serialize(buf),
                Payload::$variant(_) => Err(SccpError::UnsupportedVersion {
                    name: stringify!($variant),
                    version: $min,
                }),
                other => Err(wrong_kind(other)),
            }
        }
    };
}

/// Codec pair for a kind whose payload is a single dword
macro_rules! dword_codec {
    ($dec:ident, $enc:ident, $variant:ident) => {
        fn $dec(buf: &mut Bytes) -> Result<Payload> {
            ensure(buf, 4).map_err(|_| {
                SccpError::malformed(stringify!($variant), "missing dword payload")
            })?;
            Ok(Payload::$variant(buf.get_u32_le()))
        }
        fn $enc(payload: &Payload, buf: &mut BytesMut) -> Result<()> {
            match payload {
                Payload::$variant(v) => {
                    buf.put_u32_le(*v);
                    Ok(())
                }
                other => Err(wrong_kind(other)),
            }
        }
    };
}

/// Codec pair for a kind whose payload is one fixed-width string
macro_rules! string_codec {
    ($dec:ident, $enc:ident, $variant:ident, $width:expr) => {
        fn $dec(buf: &mut Bytes) -> Result<Payload> {
            Ok(Payload::$variant(get_fixed_string(buf, $width)?))
        }
        fn $enc(payload: &Payload, buf: &mut BytesMut) -> Result<()> {
            match payload {
                Payload::$variant(s) => {
                    put_fixed_string(buf, s, $width);
                    Ok(())
                }
                other => Err(wrong_kind(other)),
            }
        }
    };
}

unit_codec!(dec_keep_alive, enc_keep_alive, KeepAlive);
unit_codec!(dec_off_hook, enc_off_hook, OffHook);
unit_codec!(dec_on_hook, enc_on_hook, OnHook);
unit_codec!(dec_time_date_req, enc_time_date_req, TimeDateReq);
unit_codec!(dec_button_template_req, enc_button_template_req, ButtonTemplateReq);
unit_codec!(dec_version_req, enc_version_req, VersionReq);
unit_codec!(dec_soft_key_set_req, enc_soft_key_set_req, SoftKeySetReq);
unit_codec!(dec_unregister, enc_unregister, Unregister);
unit_codec!(dec_soft_key_template_req, enc_soft_key_template_req, SoftKeyTemplateReq);
unit_codec!(dec_capabilities_req, enc_capabilities_req, CapabilitiesReq);
unit_codec!(dec_keep_alive_ack, enc_keep_alive_ack, KeepAliveAck);

struct_codec!(dec_register, enc_register, Register, Register);
struct_codec!(dec_ip_port, enc_ip_port, IpPort, IpPort);
struct_codec!(dec_keypad_button, enc_keypad_button, KeypadButton, KeypadButton);
struct_codec!(dec_stimulus, enc_stimulus, Stimulus, Stimulus);
struct_codec!(dec_capabilities_res, enc_capabilities_res, CapabilitiesRes, CapabilitiesRes);
struct_codec!(dec_alarm, enc_alarm, Alarm, Alarm);
struct_codec!(dec_conn_stats_res, enc_conn_stats_res, ConnectionStatisticsRes, ConnectionStatisticsRes);
struct_codec!(dec_soft_key_event, enc_soft_key_event, SoftKeyEvent, SoftKeyEvent);
struct_codec!(dec_register_ack, enc_register_ack, RegisterAck, RegisterAck);
struct_codec!(dec_start_tone, enc_start_tone, StartTone, StartTone);
struct_codec!(dec_set_ringer, enc_set_ringer, SetRinger, SetRinger);
struct_codec!(dec_set_lamp, enc_set_lamp, SetLamp, SetLamp);
struct_codec!(dec_call_info, enc_call_info, CallInfo, CallInfo);
struct_codec!(dec_speed_dial_stat, enc_speed_dial_stat, SpeedDialStat, SpeedDialStat);
struct_codec!(dec_line_stat, enc_line_stat, LineStat, LineStat);
struct_codec!(dec_define_time_date, enc_define_time_date, DefineTimeDate, DefineTimeDate);
struct_codec!(dec_button_template, enc_button_template, ButtonTemplate, ButtonTemplate);
struct_codec!(dec_conn_stats_req, enc_conn_stats_req, ConnectionStatisticsReq, ConnectionStatisticsReq);
struct_codec!(dec_select_soft_keys, enc_select_soft_keys, SelectSoftKeys, SelectSoftKeys);
struct_codec!(dec_call_state, enc_call_state, CallState, CallState);
struct_codec!(dec_display_prompt, enc_display_prompt, DisplayPromptStatus, DisplayPromptStatus);
struct_codec!(dec_clear_prompt, enc_clear_prompt, ClearPromptStatus, ClearPromptStatus);
struct_codec!(dec_display_notify, enc_display_notify, DisplayNotify, DisplayNotify);
struct_codec!(dec_display_pri_notify, enc_display_pri_notify, DisplayPriNotify, DisplayPriNotify);
struct_codec!(dec_dyn_notify, enc_dyn_notify, DisplayDynamicNotify, DisplayDynamicNotify);
struct_codec!(dec_dyn_pri_notify, enc_dyn_pri_notify, DisplayDynamicPriNotify, DisplayDynamicPriNotify);
struct_codec!(dec_dyn_prompt, enc_dyn_prompt, DisplayDynamicPromptStatus, DisplayDynamicPromptStatus);

dword_codec!(dec_forward_stat_req, enc_forward_stat_req, ForwardStatReq);
dword_codec!(dec_speed_dial_stat_req, enc_speed_dial_stat_req, SpeedDialStatReq);
dword_codec!(dec_line_stat_req, enc_line_stat_req, LineStatReq);
dword_codec!(dec_headset_status, enc_headset_status, HeadsetStatus);
dword_codec!(dec_set_speaker_mode, enc_set_speaker_mode, SetSpeakerMode);
dword_codec!(dec_reset, enc_reset, Reset);
dword_codec!(dec_activate_call_plane, enc_activate_call_plane, ActivateCallPlane);
dword_codec!(dec_unregister_ack, enc_unregister_ack, UnregisterAck);

string_codec!(dec_enbloc_call, enc_enbloc_call, EnblocCall, DIRNUM_LEN);
string_codec!(dec_version, enc_version, Version, VERSION_LEN);
string_codec!(dec_register_reject, enc_register_reject, RegisterReject, DISPLAY_TEXT_LEN);

layout_codec!(dec_stop_tone_v3, enc_stop_tone_v3, StopTone, StopTone, parse_v3, serialize_v3);
layout_codec!(dec_stop_tone_v12, enc_stop_tone_v12, StopTone, StopTone, parse_v12, serialize_v12);
layout_codec!(dec_stop_media_v3, enc_stop_media_v3, StopMediaTransmission, StopMediaTransmission, parse_v3, serialize_v3);
layout_codec!(dec_stop_media_v17, enc_stop_media_v17, StopMediaTransmission, StopMediaTransmission, parse_v17, serialize_v17);
layout_codec!(dec_close_channel_v3, enc_close_channel_v3, CloseReceiveChannel, CloseReceiveChannel, parse_v3, serialize_v3);
layout_codec!(dec_close_channel_v5, enc_close_channel_v5, CloseReceiveChannel, CloseReceiveChannel, parse_v5, serialize_v5);
layout_codec!(dec_dialed_number_v3, enc_dialed_number_v3, DialedNumber, DialedNumber, parse_v3, serialize_v3);
layout_codec!(dec_dialed_number_v19, enc_dialed_number_v19, DialedNumber, DialedNumber, parse_v19, serialize_v19);
layout_codec!(dec_forward_stat_v3, enc_forward_stat_v3, ForwardStat, ForwardStat, parse_v3, serialize_v3);
layout_codec!(dec_forward_stat_v19, enc_forward_stat_v19, ForwardStat, ForwardStat, parse_v19, serialize_v19);
layout_codec!(dec_call_info_dyn_v7, enc_call_info_dyn_v7, CallInfoDynamic, CallInfoDynamic, parse_v7, serialize_v7);
layout_codec!(dec_call_info_dyn_v16, enc_call_info_dyn_v16, CallInfoDynamic, CallInfoDynamic, parse_v16, serialize_v16);

generation_codec!(dec_orc_v3, enc_orc_v3, OpenReceiveChannel, OpenReceiveChannel, parse_v3, V3, 0);
generation_codec!(dec_orc_v17, enc_orc_v17, OpenReceiveChannel, OpenReceiveChannel, parse_v17, V17, 17);
generation_codec!(dec_orc_ack_v3, enc_orc_ack_v3, OpenReceiveChannelAck, OpenReceiveChannelAck, parse_v3, V3, 0);
generation_codec!(dec_orc_ack_v17, enc_orc_ack_v17, OpenReceiveChannelAck, OpenReceiveChannelAck, parse_v17, V17, 17);
generation_codec!(dec_smt_v3, enc_smt_v3, StartMediaTransmission, StartMediaTransmission, parse_v3, V3, 0);
generation_codec!(dec_smt_v17, enc_smt_v17, StartMediaTransmission, StartMediaTransmission, parse_v17, V17, 17);
generation_codec!(dec_smt_ack_v3, enc_smt_ack_v3, StartMediaTransmissionAck, StartMediaTransmissionAck, parse_v3, V3, 0);
generation_codec!(dec_smt_ack_v17, enc_smt_ack_v17, StartMediaTransmissionAck, StartMediaTransmissionAck, parse_v17, V17, 17);
generation_codec!(dec_ommc_v3, enc_ommc_v3, OpenMultiMediaChannel, OpenMultiMediaChannel, parse_v3, V3, 0);
generation_codec!(dec_ommc_v17, enc_ommc_v17, OpenMultiMediaChannel, OpenMultiMediaChannel, parse_v17, V17, 17);
generation_codec!(dec_smmt_v3, enc_smmt_v3, StartMultiMediaTransmission, StartMultiMediaTransmission, parse_v3, V3, 0);
generation_codec!(dec_smmt_v17, enc_smmt_v17, StartMultiMediaTransmission, StartMultiMediaTransmission, parse_v17, V17, 17);

/// The dispatch table. Multi-row entries are sorted newest layout first.
static DISPATCH: &[(MessageId, &[VariantRow])] = &[
    (MessageId::KeepAlive, &[row(0, dec_keep_alive, enc_keep_alive)]),
    (MessageId::Register, &[row(0, dec_register, enc_register)]),
    (MessageId::IpPort, &[row(0, dec_ip_port, enc_ip_port)]),
    (MessageId::KeypadButton, &[row(0, dec_keypad_button, enc_keypad_button)]),
    (MessageId::EnblocCall, &[row(0, dec_enbloc_call, enc_enbloc_call)]),
    (MessageId::Stimulus, &[row(0, dec_stimulus, enc_stimulus)]),
    (MessageId::OffHook, &[row(0, dec_off_hook, enc_off_hook)]),
    (MessageId::OnHook, &[row(0, dec_on_hook, enc_on_hook)]),
    (MessageId::ForwardStatReq, &[row(0, dec_forward_stat_req, enc_forward_stat_req)]),
    (MessageId::SpeedDialStatReq, &[row(0, dec_speed_dial_stat_req, enc_speed_dial_stat_req)]),
    (MessageId::LineStatReq, &[row(0, dec_line_stat_req, enc_line_stat_req)]),
    (MessageId::TimeDateReq, &[row(0, dec_time_date_req, enc_time_date_req)]),
    (MessageId::ButtonTemplateReq, &[row(0, dec_button_template_req, enc_button_template_req)]),
    (MessageId::VersionReq, &[row(0, dec_version_req, enc_version_req)]),
    (MessageId::CapabilitiesRes, &[row(0, dec_capabilities_res, enc_capabilities_res)]),
    (MessageId::Alarm, &[row(0, dec_alarm, enc_alarm)]),
    (
        MessageId::OpenReceiveChannelAck,
        &[row(17, dec_orc_ack_v17, enc_orc_ack_v17), row(0, dec_orc_ack_v3, enc_orc_ack_v3)],
    ),
    (MessageId::ConnectionStatisticsRes, &[row(0, dec_conn_stats_res, enc_conn_stats_res)]),
    (MessageId::SoftKeySetReq, &[row(0, dec_soft_key_set_req, enc_soft_key_set_req)]),
    (MessageId::SoftKeyEvent, &[row(0, dec_soft_key_event, enc_soft_key_event)]),
    (MessageId::Unregister, &[row(0, dec_unregister, enc_unregister)]),
    (MessageId::SoftKeyTemplateReq, &[row(0, dec_soft_key_template_req, enc_soft_key_template_req)]),
    (MessageId::HeadsetStatus, &[row(0, dec_headset_status, enc_headset_status)]),
    (MessageId::RegisterAck, &[row(0, dec_register_ack, enc_register_ack)]),
    (MessageId::StartTone, &[row(0, dec_start_tone, enc_start_tone)]),
    (
        MessageId::StopTone,
        &[row(12, dec_stop_tone_v12, enc_stop_tone_v12), row(0, dec_stop_tone_v3, enc_stop_tone_v3)],
    ),
    (MessageId::SetRinger, &[row(0, dec_set_ringer, enc_set_ringer)]),
    (MessageId::SetLamp, &[row(0, dec_set_lamp, enc_set_lamp)]),
    (MessageId::SetSpeakerMode, &[row(0, dec_set_speaker_mode, enc_set_speaker_mode)]),
    (
        MessageId::StartMediaTransmission,
        &[row(17, dec_smt_v17, enc_smt_v17), row(0, dec_smt_v3, enc_smt_v3)],
    ),
    (
        MessageId::StopMediaTransmission,
        &[row(17, dec_stop_media_v17, enc_stop_media_v17), row(0, dec_stop_media_v3, enc_stop_media_v3)],
    ),
    (MessageId::CallInfo, &[row(0, dec_call_info, enc_call_info)]),
    (
        MessageId::ForwardStat,
        &[row(19, dec_forward_stat_v19, enc_forward_stat_v19), row(0, dec_forward_stat_v3, enc_forward_stat_v3)],
    ),
    (MessageId::SpeedDialStat, &[row(0, dec_speed_dial_stat, enc_speed_dial_stat)]),
    (MessageId::LineStat, &[row(0, dec_line_stat, enc_line_stat)]),
    (MessageId::DefineTimeDate, &[row(0, dec_define_time_date, enc_define_time_date)]),
    (MessageId::ButtonTemplate, &[row(0, dec_button_template, enc_button_template)]),
    (MessageId::Version, &[row(0, dec_version, enc_version)]),
    (MessageId::CapabilitiesReq, &[row(0, dec_capabilities_req, enc_capabilities_req)]),
    (MessageId::RegisterReject, &[row(0, dec_register_reject, enc_register_reject)]),
    (MessageId::Reset, &[row(0, dec_reset, enc_reset)]),
    (MessageId::KeepAliveAck, &[row(0, dec_keep_alive_ack, enc_keep_alive_ack)]),
    (
        MessageId::OpenReceiveChannel,
        &[row(17, dec_orc_v17, enc_orc_v17), row(0, dec_orc_v3, enc_orc_v3)],
    ),
    (
        MessageId::CloseReceiveChannel,
        &[row(5, dec_close_channel_v5, enc_close_channel_v5), row(0, dec_close_channel_v3, enc_close_channel_v3)],
    ),
    (MessageId::ConnectionStatisticsReq, &[row(0, dec_conn_stats_req, enc_conn_stats_req)]),
    (MessageId::SelectSoftKeys, &[row(0, dec_select_soft_keys, enc_select_soft_keys)]),
    (MessageId::CallState, &[row(0, dec_call_state, enc_call_state)]),
    (MessageId::DisplayPromptStatus, &[row(0, dec_display_prompt, enc_display_prompt)]),
    (MessageId::ClearPromptStatus, &[row(0, dec_clear_prompt, enc_clear_prompt)]),
    (MessageId::DisplayNotify, &[row(0, dec_display_notify, enc_display_notify)]),
    (MessageId::ActivateCallPlane, &[row(0, dec_activate_call_plane, enc_activate_call_plane)]),
    (MessageId::UnregisterAck, &[row(0, dec_unregister_ack, enc_unregister_ack)]),
    (
        MessageId::DialedNumber,
        &[row(19, dec_dialed_number_v19, enc_dialed_number_v19), row(0, dec_dialed_number_v3, enc_dialed_number_v3)],
    ),
    (MessageId::DisplayPriNotify, &[row(0, dec_display_pri_notify, enc_display_pri_notify)]),
    (
        MessageId::OpenMultiMediaChannel,
        &[row(17, dec_ommc_v17, enc_ommc_v17), row(0, dec_ommc_v3, enc_ommc_v3)],
    ),
    (
        MessageId::StartMultiMediaTransmission,
        &[row(17, dec_smmt_v17, enc_smmt_v17), row(0, dec_smmt_v3, enc_smmt_v3)],
    ),
    (MessageId::DisplayDynamicNotify, &[row(0, dec_dyn_notify, enc_dyn_notify)]),
    (MessageId::DisplayDynamicPriNotify, &[row(0, dec_dyn_pri_notify, enc_dyn_pri_notify)]),
    (MessageId::DisplayDynamicPromptStatus, &[row(0, dec_dyn_prompt, enc_dyn_prompt)]),
    (
        MessageId::CallInfoDynamic,
        &[row(16, dec_call_info_dyn_v16, enc_call_info_dyn_v16), row(0, dec_call_info_dyn_v7, enc_call_info_dyn_v7)],
    ),
    (
        MessageId::StartMediaTransmissionAck,
        &[row(17, dec_smt_ack_v17, enc_smt_ack_v17), row(0, dec_smt_ack_v3, enc_smt_ack_v3)],
    ),
];

static INDEX: Lazy<HashMap<MessageId, &'static [VariantRow]>> =
    Lazy::new(|| DISPATCH.iter().map(|&(id, rows)| (id, rows)).collect());

fn select(id: MessageId, version: u8) -> Result<&'static VariantRow> {
    INDEX
        .get(&id)
        .and_then(|rows| rows.iter().find(|r| version >= r.min_version))
        .ok_or(SccpError::UnsupportedVersion {
            name: id.name(),
            version,
        })
}

/// Payload-level truncation is downgraded here: the prologue was valid,
/// so the stream stays in sync and only this message is lost.
pub(super) fn decode(id: MessageId, version: u8, buf: &mut Bytes) -> Result<Payload> {
    (select(id, version)?.decode)(buf).map_err(|err| match err {
        SccpError::BufferTooSmall { needed, actual } => SccpError::malformed(
            id.name(),
            format!("truncated payload: need {needed} bytes, got {actual}"),
        ),
        other => other,
    })
}

pub(super) fn encode(payload: &Payload, version: u8, buf: &mut BytesMut) -> Result<()> {
    (select(payload.message_id(), version)?.encode)(payload, buf)
}
