//! End-to-end exercise of a registration and media setup exchange,
//! running every message through the wire codec in both directions.

use std::sync::Once;

use skinny_core::codec::{find_best_joint, AudioCapabilities, SkinnyCodec, VideoCapabilities};
use skinny_core::packet::{
    decode_message, encode_message, MessageId, OpenReceiveChannelAck, Payload, Register,
    SccpMessage, StartMultiMediaTransmission,
};
use skinny_core::protocol::{negotiate, MediaFlow, ProtocolFamily, VideoFlow};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Encode on one side, decode on the other, both at the same version.
fn over_the_wire(msg: &SccpMessage, version: u8) -> SccpMessage {
    let wire = encode_message(msg, version).expect("encode");
    decode_message(&wire, version).expect("decode")
}

fn register_from_phone(requested_version: u8) -> SccpMessage {
    SccpMessage::new(Payload::Register(Register {
        device_name: "SEP0019305GM7X2".to_string(),
        user_id: 0,
        instance: 1,
        ip: "10.10.20.30".parse().unwrap(),
        device_type: 404,
        max_streams: 5,
        protocol_version: requested_version,
    }))
}

#[test]
fn registration_and_media_setup_v11() {
    init_tracing();

    // phone registers; at v11 it has not seen the ack yet, so the codec
    // runs at the floor version until negotiation completes
    let wire_register = over_the_wire(&register_from_phone(11), 3);
    let Payload::Register(register) = wire_register.payload else {
        panic!("expected a register payload");
    };
    let proto = negotiate(ProtocolFamily::Sccp, register.protocol_version);
    assert_eq!(proto.version, 11);

    // ack carries the negotiated version and its generation's filler
    let ack = over_the_wire(&proto.register_ack(30, "M/D/Y", 30), proto.version);
    let Payload::RegisterAck(ack) = ack.payload else {
        panic!("expected a register ack payload");
    };
    assert_eq!(ack.protocol_version, 11);
    assert_eq!(ack.filler, [0x20, 0xF1, 0xFF]);

    // media setup goes out in the old layouts at this version
    let flow = MediaFlow {
        conference_id: 77,
        passthru_party_id: 78,
        codec: SkinnyCodec::G711_ULAW_64K,
        ms_packet_size: 20,
        dtmf_payload: 101,
        vad: false,
        silence_suppression: false,
        precedence: 184,
        remote: "10.10.20.30:24576".parse().unwrap(),
    };
    let orc = proto.open_receive_channel(&flow).unwrap();
    let echoed = over_the_wire(&orc, proto.version);
    assert_eq!(echoed.payload, orc.payload);

    let smt = proto.start_media_transmission(&flow).unwrap();
    let echoed = over_the_wire(&smt, proto.version);
    assert_eq!(echoed.id(), MessageId::StartMediaTransmission);
    assert_eq!(echoed.payload, smt.payload);
}

#[test]
fn registration_and_media_setup_v20() {
    init_tracing();

    let proto = negotiate(ProtocolFamily::Sccp, 22);
    assert_eq!(proto.version, 20);

    let flow = MediaFlow {
        conference_id: 500,
        passthru_party_id: 501,
        codec: SkinnyCodec::G722_64K,
        ms_packet_size: 20,
        dtmf_payload: 101,
        vad: false,
        silence_suppression: false,
        precedence: 184,
        remote: "[2001:db8:12::7]:30002".parse().unwrap(),
    };

    // v17-era layouts carry the full address either family
    let orc = proto.open_receive_channel(&flow).unwrap();
    let echoed = over_the_wire(&orc, proto.version);
    assert_eq!(echoed.payload, orc.payload);

    // phone answers with its own RTP endpoint
    let phone_ack = SccpMessage::new(Payload::OpenReceiveChannelAck(
        OpenReceiveChannelAck::V17 {
            status: 0,
            ip: "2001:db8:12::9".parse().unwrap(),
            port: 18230,
            passthru_party_id: 501,
            call_reference: 500,
        },
    ));
    let echoed = over_the_wire(&phone_ack, proto.version);
    let Payload::OpenReceiveChannelAck(ack) = echoed.payload else {
        panic!("expected an open receive channel ack");
    };
    assert_eq!(ack.media_addr(), ("2001:db8:12::9".parse().unwrap(), 18230));
}

#[test]
fn codec_selection_from_advertised_capabilities() {
    init_tracing();

    // phone advertises wideband first, server prefers ulaw
    let phone: AudioCapabilities = [
        SkinnyCodec::G722_64K,
        SkinnyCodec::G711_ULAW_64K,
        SkinnyCodec::G711_ALAW_64K,
    ]
    .into_iter()
    .collect();
    let server: AudioCapabilities = [
        SkinnyCodec::G711_ULAW_64K,
        SkinnyCodec::G722_64K,
    ]
    .into_iter()
    .collect();

    assert_eq!(
        find_best_joint(&server, &phone, false),
        SkinnyCodec::G711_ULAW_64K
    );
    assert_eq!(
        find_best_joint(&phone, &server, false),
        SkinnyCodec::G722_64K
    );
}

#[test]
fn video_channel_setup_from_advertised_capabilities() {
    init_tracing();

    // phone and server agree on h264 out of the advertised video sets
    let phone: VideoCapabilities = [SkinnyCodec::H263, SkinnyCodec::H264].into_iter().collect();
    let server: VideoCapabilities = [SkinnyCodec::H264].into_iter().collect();
    let codec = find_best_joint(&server, &phone, false);
    assert_eq!(codec, SkinnyCodec::H264);

    let proto = negotiate(ProtocolFamily::Sccp, 20);
    let flow = VideoFlow {
        conference_id: 600,
        passthru_party_id: 601,
        codec,
        payload_type: codec.rtp_payload_type().unwrap_or(97) as u32,
        bit_rate: 512,
        line_instance: 1,
        call_reference: 600,
        remote: "10.10.20.30:30010".parse().unwrap(),
    };

    let ommc = proto.open_multi_media_channel(&flow).unwrap();
    let echoed = over_the_wire(&ommc, proto.version);
    assert_eq!(echoed.id(), MessageId::OpenMultiMediaChannel);
    assert_eq!(echoed.payload, ommc.payload);

    let smmt = proto.start_multi_media_transmission(&flow).unwrap();
    let echoed = over_the_wire(&smmt, proto.version);
    let Payload::StartMultiMediaTransmission(StartMultiMediaTransmission::V17 {
        payload_capability,
        remote_port,
        ..
    }) = echoed.payload
    else {
        panic!("expected the v17 layout");
    };
    assert_eq!(payload_capability, SkinnyCodec::H264);
    assert_eq!(remote_port, 30010);
}

#[test]
fn keepalive_cycle_is_minimal_frames() {
    init_tracing();

    let proto = negotiate(ProtocolFamily::Sccp, 17);
    let ka = over_the_wire(&SccpMessage::new(Payload::KeepAlive), proto.version);
    assert_eq!(ka.id(), MessageId::KeepAlive);

    let ack = over_the_wire(&SccpMessage::new(Payload::KeepAliveAck), proto.version);
    assert_eq!(ack.id(), MessageId::KeepAliveAck);
}
