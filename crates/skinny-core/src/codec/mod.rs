//! Skinny codec identifiers and the codec descriptor registry
//!
//! Codec ids live in an open numeric space: a phone may legally advertise a
//! codec this build does not know, so [`SkinnyCodec`] is a newtype over the
//! raw wire value rather than a closed enum. The registry maps known ids to
//! their descriptors and hands back a catch-all for everything else.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use tracing::warn;

pub mod caps;

pub use caps::{
    find_best_joint, AudioCapabilities, CapabilitySet, DataCapabilities, VideoCapabilities,
};

/// A Skinny codec identifier as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkinnyCodec(pub u32);

impl SkinnyCodec {
    pub const NONE: Self = Self(0x0000);
    pub const NONSTANDARD: Self = Self(0x0001);
    pub const G711_ALAW_64K: Self = Self(0x0002);
    pub const G711_ALAW_56K: Self = Self(0x0003);
    pub const G711_ULAW_64K: Self = Self(0x0004);
    pub const G711_ULAW_56K: Self = Self(0x0005);
    pub const G722_64K: Self = Self(0x0006);
    pub const G722_56K: Self = Self(0x0007);
    pub const G722_48K: Self = Self(0x0008);
    pub const G723_1: Self = Self(0x0009);
    pub const G728: Self = Self(0x000A);
    pub const G729: Self = Self(0x000B);
    pub const G729_A: Self = Self(0x000C);
    pub const IS11172: Self = Self(0x000D);
    pub const IS13818: Self = Self(0x000E);
    pub const G729_B: Self = Self(0x000F);
    pub const G729_AB: Self = Self(0x0010);
    pub const GSM_FULLRATE: Self = Self(0x0012);
    pub const GSM_HALFRATE: Self = Self(0x0013);
    pub const GSM_ENH_FULLRATE: Self = Self(0x0014);
    pub const WIDEBAND_256K: Self = Self(0x0019);
    pub const DATA_64K: Self = Self(0x0020);
    pub const DATA_56K: Self = Self(0x0021);
    pub const G722_1_32K: Self = Self(0x0028);
    pub const G722_1_24K: Self = Self(0x0029);
    pub const AAC: Self = Self(0x002A);
    pub const MP4A_LATM_128K: Self = Self(0x002B);
    pub const MP4A_LATM_64K: Self = Self(0x002C);
    pub const MP4A_LATM_56K: Self = Self(0x002D);
    pub const MP4A_LATM_48K: Self = Self(0x002E);
    pub const MP4A_LATM_32K: Self = Self(0x002F);
    pub const MP4A_LATM_24K: Self = Self(0x0030);
    pub const MP4A_LATM_NA: Self = Self(0x0031);
    pub const GSM: Self = Self(0x0050);
    pub const ACTIVEVOICE: Self = Self(0x0051);
    pub const G726_32K: Self = Self(0x0052);
    pub const G726_24K: Self = Self(0x0053);
    pub const G726_16K: Self = Self(0x0054);
    pub const G729_ANNEX_B: Self = Self(0x0055);
    pub const ILBC: Self = Self(0x0056);
    pub const ISAC: Self = Self(0x0059);
    pub const OPUS: Self = Self(0x005A);
    pub const AMR: Self = Self(0x0061);
    pub const AMR_WB: Self = Self(0x0062);
    pub const H261: Self = Self(0x0064);
    pub const H263: Self = Self(0x0065);
    pub const H263_PLUS: Self = Self(0x0066);
    pub const H264: Self = Self(0x0067);
    pub const H264_SVC: Self = Self(0x0068);
    pub const T120: Self = Self(0x0069);
    pub const H224: Self = Self(0x006A);
    pub const T38FAX: Self = Self(0x006B);
    pub const TOTE: Self = Self(0x006C);
    pub const H265: Self = Self(0x006D);
    pub const H264_UC: Self = Self(0x006E);
    pub const XV150_MR_711U: Self = Self(0x006F);
    pub const NSE_VBD_711U: Self = Self(0x0070);
    pub const XV150_MR_729A: Self = Self(0x0071);
    pub const NSE_VBD_729A: Self = Self(0x0072);
    pub const H264_FEC: Self = Self(0x0073);
    pub const CLEAR_CHAN: Self = Self(0x0078);
    pub const UNIVERSAL_XCODER: Self = Self(0x00DE);
    pub const DTMF_OOB_RFC2833: Self = Self(0x0101);
    pub const DTMF_PASSTHROUGH: Self = Self(0x0102);
    pub const DTMF_DYNAMIC: Self = Self(0x0103);
    pub const DTMF_OOB: Self = Self(0x0104);
    pub const DTMF_IB_RFC2833: Self = Self(0x0105);
    pub const CFB_TONES: Self = Self(0x0106);
    pub const DTMF_NOAUDIO: Self = Self(0x012B);
    pub const V150_LC_MODEM_RELAY: Self = Self(0x012C);
    pub const V150_LC_SPRT: Self = Self(0x012D);
    pub const V150_LC_SSE: Self = Self(0x012E);

    /// Raw wire value
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Descriptor for this codec, or the catch-all unknown descriptor.
    pub fn descriptor(self) -> &'static CodecDescriptor {
        descriptor(self)
    }

    /// Short name, e.g. `alaw/64k`
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Media class of this codec
    pub fn media_type(self) -> MediaType {
        self.descriptor().media_type
    }

    /// Static RTP payload type, `None` for dynamic codecs
    pub fn rtp_payload_type(self) -> Option<u8> {
        self.descriptor().rtp_payload_type
    }
}

impl fmt::Display for SkinnyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Media class a codec belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Unknown,
    Audio,
    Video,
    Text,
    Data,
    Mixed,
}

/// Static description of a codec id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescriptor {
    pub codec: SkinnyCodec,
    pub media_type: MediaType,
    /// Key used in allow/disallow configuration lists
    pub key: &'static str,
    /// Short name used in logs and capability dumps
    pub name: &'static str,
    /// Human-readable label
    pub text: &'static str,
    /// RTP MIME subtype where one is registered
    pub mime_subtype: Option<&'static str>,
    /// Sampling rate in Hz, 0 when not applicable
    pub sample_rate: u32,
    /// Relative voice quality, higher is better
    pub quality: u8,
    /// Static RTP payload type; `None` when dynamic or not applicable.
    /// PCMU's real static payload type is 0, so 0 cannot double as the
    /// unknown sentinel.
    pub rtp_payload_type: Option<u8>,
}

macro_rules! row {
    ($codec:ident, $mt:ident, $key:expr, $name:expr, $text:expr, $mime:expr, $rate:expr, $q:expr, $pt:expr) => {
        CodecDescriptor {
            codec: SkinnyCodec::$codec,
            media_type: MediaType::$mt,
            key: $key,
            name: $name,
            text: $text,
            mime_subtype: $mime,
            sample_rate: $rate,
            quality: $q,
            rtp_payload_type: $pt,
        }
    };
}

/// The codec registry. Order is irrelevant; lookups go through an index.
pub static CODECS: &[CodecDescriptor] = &[
    row!(NONE, Unknown, "", "none", "No codec", None, 0, 0, None),
    row!(NONSTANDARD, Unknown, "", "nonstandard", "Non-standard codec", None, 0, 0, None),
    row!(G711_ALAW_64K, Audio, "alaw", "alaw/64k", "G.711 A-law 64k", None, 8000, 2, Some(8)),
    row!(G711_ALAW_56K, Audio, "alaw", "alaw/56k", "G.711 A-law 56k", None, 8000, 1, Some(8)),
    row!(G711_ULAW_64K, Audio, "ulaw", "ulaw/64k", "G.711 u-law 64k", None, 8000, 2, Some(0)),
    row!(G711_ULAW_56K, Audio, "ulaw", "ulaw/56k", "G.711 u-law 56k", None, 8000, 1, Some(0)),
    row!(G722_64K, Audio, "g722", "g722/64k", "G.722 64k", None, 16000, 3, Some(9)),
    row!(G722_56K, Audio, "g722", "g722/56k", "G.722 56k", None, 16000, 3, Some(9)),
    row!(G722_48K, Audio, "g722", "g722/48k", "G.722 48k", None, 16000, 2, Some(9)),
    row!(G723_1, Audio, "g723", "g723", "G.723.1", None, 8000, 1, Some(4)),
    row!(G728, Audio, "g728", "g728", "G.728", None, 8000, 1, None),
    row!(G729, Audio, "g729", "g729", "G.729", None, 8000, 1, Some(18)),
    row!(G729_A, Audio, "g729", "g729a", "G.729 Annex A", None, 8000, 1, Some(18)),
    row!(IS11172, Audio, "is11172", "is11172", "IS11172 AudioCap", None, 8000, 1, None),
    row!(IS13818, Audio, "is13818", "is13818", "IS13818 AudioCap", None, 8000, 1, None),
    row!(G729_B, Audio, "g729", "g729b", "G.729 Annex B", None, 8000, 1, Some(18)),
    row!(G729_AB, Audio, "g729", "g729ab", "G.729 Annex A + B", None, 8000, 1, Some(18)),
    row!(GSM_FULLRATE, Audio, "gsm", "gsm/full", "GSM Full Rate", None, 8000, 1, Some(3)),
    row!(GSM_HALFRATE, Audio, "gsm", "gsm/half", "GSM Half Rate", None, 8000, 1, Some(3)),
    row!(GSM_ENH_FULLRATE, Audio, "gsm", "gsm/enh", "GSM Enhanced Full Rate", None, 8000, 1, Some(3)),
    row!(WIDEBAND_256K, Audio, "slin16", "slin16", "Wideband 256k", Some("L16"), 16000, 3, Some(118)),
    row!(DATA_64K, Data, "data", "data/64k", "Data 64k", None, 0, 0, None),
    row!(DATA_56K, Data, "data", "data/56k", "Data 56k", None, 0, 0, None),
    row!(G722_1_32K, Audio, "g722.1", "g722.1/32k", "G.722.1 32k", Some("G7221"), 16000, 3, None),
    row!(G722_1_24K, Audio, "g722.1", "g722.1/24k", "G.722.1 24k", Some("G7221"), 16000, 2, None),
    row!(AAC, Audio, "aac", "aac", "AAC", None, 48000, 4, None),
    row!(MP4A_LATM_128K, Audio, "mp4a", "mp4a/128k", "MP4A-LATM 128k", None, 48000, 4, None),
    row!(MP4A_LATM_64K, Audio, "mp4a", "mp4a/64k", "MP4A-LATM 64k", None, 48000, 3, None),
    row!(MP4A_LATM_56K, Audio, "mp4a", "mp4a/56k", "MP4A-LATM 56k", None, 48000, 3, None),
    row!(MP4A_LATM_48K, Audio, "mp4a", "mp4a/48k", "MP4A-LATM 48k", None, 48000, 3, None),
    row!(MP4A_LATM_32K, Audio, "mp4a", "mp4a/32k", "MP4A-LATM 32k", None, 48000, 2, None),
    row!(MP4A_LATM_24K, Audio, "mp4a", "mp4a/24k", "MP4A-LATM 24k", None, 48000, 2, None),
    row!(MP4A_LATM_NA, Audio, "mp4a", "mp4a/na", "MP4A-LATM n/a", None, 48000, 1, None),
    row!(GSM, Audio, "gsm", "gsm", "GSM", None, 8000, 1, Some(3)),
    row!(ACTIVEVOICE, Audio, "activevoice", "activevoice", "ActiveVoice", None, 8000, 1, None),
    row!(G726_32K, Audio, "g726", "g726/32k", "G.726 32k", None, 8000, 1, Some(112)),
    row!(G726_24K, Audio, "g726", "g726/24k", "G.726 24k", None, 8000, 1, None),
    row!(G726_16K, Audio, "g726", "g726/16k", "G.726 16k", None, 8000, 1, None),
    row!(G729_ANNEX_B, Audio, "g729", "g729/annex-b", "G.729 Annex B", None, 8000, 1, Some(18)),
    row!(ILBC, Audio, "ilbc", "ilbc", "iLBC", None, 8000, 1, Some(97)),
    row!(ISAC, Audio, "isac", "isac", "iSAC", None, 16000, 3, None),
    row!(OPUS, Audio, "opus", "opus", "Opus", None, 48000, 4, None),
    row!(AMR, Audio, "amr", "amr", "AMR", None, 8000, 2, None),
    row!(AMR_WB, Audio, "amr", "amr/wb", "AMR Wideband", None, 16000, 3, None),
    row!(H261, Video, "h261", "h261", "H.261", None, 90000, 1, Some(34)),
    row!(H263, Video, "h263", "h263", "H.263", Some("H263"), 90000, 1, Some(34)),
    row!(H263_PLUS, Video, "h263p", "h263+", "H.263+", Some("H263"), 90000, 2, Some(98)),
    row!(H264, Video, "h264", "h264", "H.264", Some("H264"), 90000, 3, Some(99)),
    row!(H264_SVC, Video, "h264", "h264/svc", "H.264 SVC", Some("H264"), 90000, 3, None),
    row!(T120, Text, "t120", "t120", "T.140", None, 0, 1, None),
    row!(H224, Data, "h224", "h224", "H.224", None, 0, 1, Some(31)),
    row!(T38FAX, Data, "t38fax", "t38fax", "T.38 Fax", None, 0, 1, None),
    row!(TOTE, Data, "tote", "tote", "TOTE", None, 0, 0, None),
    row!(H265, Video, "h265", "h265", "H.265", None, 90000, 4, None),
    row!(H264_UC, Video, "h264", "h264/uc", "H.264 UC", Some("H264"), 90000, 3, None),
    row!(XV150_MR_711U, Audio, "xv150", "xv150/mr711u", "XV150 MR 711U", None, 0, 0, None),
    row!(NSE_VBD_711U, Audio, "nse", "nse/vbd711u", "NSE VBD 711U", None, 0, 0, None),
    row!(XV150_MR_729A, Audio, "xv150", "xv150/mr729a", "XV150 MR 729A", None, 0, 0, None),
    row!(NSE_VBD_729A, Audio, "nse", "nse/vbd729a", "NSE VBD 729A", None, 0, 0, None),
    row!(H264_FEC, Video, "h264", "h264/fec", "H.264 FEC", Some("H264"), 90000, 3, None),
    row!(CLEAR_CHAN, Data, "clear", "clear-chan", "Clear Channel", None, 0, 0, None),
    row!(UNIVERSAL_XCODER, Audio, "xcoder", "xcoder", "Universal Transcoder", None, 0, 0, None),
    row!(DTMF_OOB_RFC2833, Audio, "rfc2833", "dtmf/oob-2833", "DTMF OOB RFC2833", None, 0, 0, None),
    row!(DTMF_PASSTHROUGH, Audio, "passthrough", "dtmf/passthrough", "DTMF Passthrough", None, 0, 0, None),
    row!(DTMF_DYNAMIC, Audio, "dynamic", "dtmf/dynamic", "DTMF Dynamic", None, 0, 0, None),
    row!(DTMF_OOB, Audio, "oob", "dtmf/oob", "DTMF OOB", None, 0, 0, None),
    row!(DTMF_IB_RFC2833, Audio, "rfc2833", "dtmf/ib-2833", "DTMF IB RFC2833", None, 0, 0, None),
    row!(CFB_TONES, Audio, "cfb", "cfb-tones", "CFB Tones", None, 0, 0, None),
    row!(DTMF_NOAUDIO, Audio, "noaudio", "dtmf/noaudio", "DTMF NoAudio", None, 0, 0, None),
    row!(V150_LC_MODEM_RELAY, Data, "v150", "v150/modem-relay", "V.150 LC Modem Relay", None, 0, 0, None),
    row!(V150_LC_SPRT, Data, "v150", "v150/sprt", "V.150 LC SPRT", None, 0, 0, None),
    row!(V150_LC_SSE, Data, "v150", "v150/sse", "V.150 LC SSE", None, 0, 0, None),
];

static UNKNOWN: CodecDescriptor = CodecDescriptor {
    codec: SkinnyCodec::NONE,
    media_type: MediaType::Unknown,
    key: "",
    name: "unknown",
    text: "Unknown codec",
    mime_subtype: None,
    sample_rate: 0,
    quality: 0,
    rtp_payload_type: None,
};

static INDEX: Lazy<HashMap<SkinnyCodec, &'static CodecDescriptor>> =
    Lazy::new(|| CODECS.iter().map(|d| (d.codec, d)).collect());

/// Look up the descriptor for a codec id.
///
/// Unlisted ids resolve to a catch-all unknown descriptor instead of an
/// error; the raw id itself stays valid for wire round-trips.
pub fn descriptor(codec: SkinnyCodec) -> &'static CodecDescriptor {
    INDEX.get(&codec).copied().unwrap_or(&UNKNOWN)
}

/// Static RTP payload type for a codec id.
///
/// Returns `None` for codecs that only have dynamic payload types and for
/// unknown ids. PCMU legitimately maps to `Some(0)`.
pub fn rtp_payload_type(codec: SkinnyCodec) -> Option<u8> {
    descriptor(codec).rtp_payload_type
}

/// Find all codecs matching a configuration key, case-insensitively.
pub fn from_config_key(key: &str) -> impl Iterator<Item = &'static CodecDescriptor> + '_ {
    CODECS
        .iter()
        .filter(move |d| !d.key.is_empty() && d.key.eq_ignore_ascii_case(key))
}

/// Join codec names for diagnostics, e.g. `alaw/64k, ulaw/64k`.
pub fn names(codecs: &[SkinnyCodec]) -> String {
    codecs
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Apply an allow/disallow configuration list to a preference set.
///
/// The list is comma or space separated. Each entry is a configuration key
/// (`alaw`, `g722`, ...), the pseudo-key `all`, and may carry a leading `!`
/// to flip its sense. `allowing` gives the default sense of un-prefixed
/// entries. Returns the number of entries applied; unknown keys are skipped
/// with a warning.
pub fn parse_allow_disallow<const CAP: usize>(
    prefs: &mut CapabilitySet<CAP>,
    list: &str,
    allowing: bool,
) -> usize {
    let mut applied = 0;
    for raw in list.split([',', ' ']) {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        let (key, allow) = match token.strip_prefix('!') {
            Some(rest) => (rest, !allowing),
            None => (token, allowing),
        };
        if key.eq_ignore_ascii_case("all") {
            if allow {
                for d in CODECS.iter().filter(|d| d.media_type == MediaType::Audio) {
                    prefs.push(d.codec);
                }
            } else {
                prefs.clear();
            }
            applied += 1;
            continue;
        }
        let mut matched = false;
        for d in from_config_key(key) {
            matched = true;
            if allow {
                prefs.push(d.codec);
            } else {
                prefs.remove(d.codec);
            }
        }
        if matched {
            applied += 1;
        } else {
            warn!(key, "ignoring unknown codec key in allow/disallow list");
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup() {
        let d = descriptor(SkinnyCodec::G711_ALAW_64K);
        assert_eq!(d.name, "alaw/64k");
        assert_eq!(d.rtp_payload_type, Some(8));
        assert_eq!(d.media_type, MediaType::Audio);

        let d = descriptor(SkinnyCodec::H264);
        assert_eq!(d.media_type, MediaType::Video);
        assert_eq!(d.mime_subtype, Some("H264"));
    }

    #[test]
    fn test_rtp_payload_type_distinguishes_pcmu_from_unknown() {
        // PCMU's static payload type is a real 0, not a missing value
        assert_eq!(rtp_payload_type(SkinnyCodec::G711_ULAW_64K), Some(0));
        assert_eq!(SkinnyCodec::G711_ULAW_64K.rtp_payload_type(), Some(0));

        // dynamic-only and unknown codecs have no static payload type
        assert_eq!(rtp_payload_type(SkinnyCodec::OPUS), None);
        assert_eq!(rtp_payload_type(SkinnyCodec(0xBEEF)), None);
    }

    #[test]
    fn test_unknown_codec_is_not_an_error() {
        let odd = SkinnyCodec(0xBEEF);
        let d = descriptor(odd);
        assert_eq!(d.name, "unknown");
        assert_eq!(odd.as_u32(), 0xBEEF);
    }

    #[test]
    fn test_from_config_key_case_insensitive() {
        let hits: Vec<_> = from_config_key("ALAW").collect();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|d| d.key == "alaw"));

        assert_eq!(from_config_key("").count(), 0);
    }

    #[test]
    fn test_display_uses_registry_name() {
        assert_eq!(SkinnyCodec::OPUS.to_string(), "opus");
        assert_eq!(SkinnyCodec(0x7777).to_string(), "unknown");
    }

    #[test]
    fn test_names_join() {
        let list = [SkinnyCodec::G711_ULAW_64K, SkinnyCodec::G722_64K];
        assert_eq!(names(&list), "ulaw/64k, g722/64k");
    }

    #[test]
    fn test_parse_allow() {
        let mut prefs = AudioCapabilities::new();
        let n = parse_allow_disallow(&mut prefs, "ulaw,alaw", true);
        assert_eq!(n, 2);
        assert!(prefs.contains(SkinnyCodec::G711_ULAW_64K));
        assert!(prefs.contains(SkinnyCodec::G711_ALAW_64K));
    }

    #[test]
    fn test_parse_disallow_and_negation() {
        let mut prefs = AudioCapabilities::new();
        parse_allow_disallow(&mut prefs, "ulaw, alaw, g722", true);
        parse_allow_disallow(&mut prefs, "g722", false);
        assert!(!prefs.contains(SkinnyCodec::G722_64K));

        // leading ! flips the sense
        parse_allow_disallow(&mut prefs, "!alaw", true);
        assert!(!prefs.contains(SkinnyCodec::G711_ALAW_64K));
    }

    #[test]
    fn test_parse_all_pseudo_key() {
        let mut prefs = AudioCapabilities::new();
        parse_allow_disallow(&mut prefs, "all", true);
        // capacity-bound, but the head of the table made it in
        assert!(prefs.contains(SkinnyCodec::G711_ALAW_64K));
        assert!(!prefs.is_empty());

        parse_allow_disallow(&mut prefs, "all", false);
        assert_eq!(prefs.len(), 0);
    }

    #[test]
    fn test_parse_unknown_key_skipped() {
        let mut prefs = AudioCapabilities::new();
        let n = parse_allow_disallow(&mut prefs, "ulaw,nosuchcodec", true);
        assert_eq!(n, 1);
        assert_eq!(prefs.len(), 1);
    }
}
