//! Capability sets and the joint-codec selection algebra
//!
//! A capability set is a small fixed-capacity vector of codec ids whose
//! order is the owner's preference order. The wire format terminates these
//! lists with [`SkinnyCodec::NONE`]; internally the set keeps an explicit
//! length and never stores the sentinel.

use std::fmt;

use tracing::warn;

use super::{names, SkinnyCodec};

/// Audio capability list, 18 slots on the wire
pub type AudioCapabilities = CapabilitySet<18>;
/// Video capability list, 10 slots on the wire
pub type VideoCapabilities = CapabilitySet<10>;
/// Data capability list, 5 slots on the wire
pub type DataCapabilities = CapabilitySet<5>;

/// Preference-ordered, fixed-capacity set of codec ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet<const CAP: usize> {
    slots: [SkinnyCodec; CAP],
    len: usize,
}

impl<const CAP: usize> CapabilitySet<CAP> {
    /// Empty set
    pub fn new() -> Self {
        Self {
            slots: [SkinnyCodec::NONE; CAP],
            len: 0,
        }
    }

    /// Build a set from a preference-ordered slice. Entries beyond capacity
    /// and sentinel entries are dropped.
    pub fn from_slice(codecs: &[SkinnyCodec]) -> Self {
        let mut set = Self::new();
        for &codec in codecs {
            set.push(codec);
        }
        set
    }

    /// Number of codecs held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of codecs this set can hold
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Most preferred codec, or the sentinel when empty
    pub fn first(&self) -> SkinnyCodec {
        if self.len > 0 {
            self.slots[0]
        } else {
            SkinnyCodec::NONE
        }
    }

    /// Codecs in preference order
    pub fn as_slice(&self) -> &[SkinnyCodec] {
        &self.slots[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = SkinnyCodec> + '_ {
        self.as_slice().iter().copied()
    }

    pub fn contains(&self, codec: SkinnyCodec) -> bool {
        self.as_slice().contains(&codec)
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append a codec as the new least-preferred entry.
    ///
    /// An existing occurrence is removed first, so re-pushing a codec moves
    /// it to the back rather than duplicating it. The sentinel is never
    /// stored. A full set drops the codec silently apart from a warning,
    /// mirroring how phones simply ignore capabilities past the wire limit.
    pub fn push(&mut self, codec: SkinnyCodec) {
        if codec == SkinnyCodec::NONE {
            return;
        }
        self.remove(codec);
        if self.len == CAP {
            warn!(codec = %codec, capacity = CAP, "capability set full, dropping codec");
            return;
        }
        self.slots[self.len] = codec;
        self.len += 1;
    }

    /// Remove a codec, shifting later entries left. Returns whether it was
    /// present.
    pub fn remove(&mut self, codec: SkinnyCodec) -> bool {
        let Some(pos) = self.as_slice().iter().position(|&c| c == codec) else {
            return false;
        };
        self.slots.copy_within(pos + 1..self.len, pos);
        self.len -= 1;
        self.slots[self.len] = SkinnyCodec::NONE;
        true
    }

    /// Intersection with `other`, keeping this set's preference order.
    pub fn reduce(&self, other: &Self) -> Self {
        let mut out = Self::new();
        for codec in self.iter() {
            if other.contains(codec) {
                out.push(codec);
            }
        }
        out
    }

    /// Union with `extra`: members of `extra` not already present are
    /// appended in `extra`'s order, capacity permitting.
    pub fn combine(&self, extra: &Self) -> Self {
        let mut out = *self;
        for codec in extra.iter() {
            if !out.contains(codec) {
                out.push(codec);
            }
        }
        out
    }
}

impl<const CAP: usize> Default for CapabilitySet<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> fmt::Display for CapabilitySet<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", names(self.as_slice()))
    }
}

impl<const CAP: usize> FromIterator<SkinnyCodec> for CapabilitySet<CAP> {
    fn from_iter<I: IntoIterator<Item = SkinnyCodec>>(iter: I) -> Self {
        let mut set = Self::new();
        for codec in iter {
            set.push(codec);
        }
        set
    }
}

/// Pick the codec both sides can use.
///
/// The result is the first entry of `local` that `remote` also supports,
/// so the local side's preference order decides. The selection is
/// directional on purpose: when both ends run this stack each end may pick
/// a different codec for its own receive path, and that asymmetry is part
/// of the protocol's observed behavior.
///
/// When the intersection is empty, `fallback` selects whether to gamble on
/// the local favorite anyway or to report no joint codec via the sentinel.
pub fn find_best_joint<const CAP: usize>(
    local: &CapabilitySet<CAP>,
    remote: &CapabilitySet<CAP>,
    fallback: bool,
) -> SkinnyCodec {
    let joint = local.reduce(remote);
    if !joint.is_empty() {
        return joint.first();
    }
    if fallback {
        return local.first();
    }
    SkinnyCodec::NONE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codecs: &[SkinnyCodec]) -> AudioCapabilities {
        AudioCapabilities::from_slice(codecs)
    }

    #[test]
    fn test_push_dedups_and_reorders() {
        let mut caps = AudioCapabilities::new();
        caps.push(SkinnyCodec::G711_ULAW_64K);
        caps.push(SkinnyCodec::G722_64K);
        caps.push(SkinnyCodec::G711_ULAW_64K);
        assert_eq!(
            caps.as_slice(),
            &[SkinnyCodec::G722_64K, SkinnyCodec::G711_ULAW_64K]
        );
    }

    #[test]
    fn test_push_ignores_sentinel_and_overflow() {
        let mut caps = DataCapabilities::new();
        caps.push(SkinnyCodec::NONE);
        assert!(caps.is_empty());

        for id in 1..=5 {
            caps.push(SkinnyCodec(0x0200 + id));
        }
        assert_eq!(caps.len(), 5);
        caps.push(SkinnyCodec(0x0300));
        assert_eq!(caps.len(), 5);
        assert!(!caps.contains(SkinnyCodec(0x0300)));
    }

    #[test]
    fn test_remove_shifts_left() {
        let mut caps = set(&[
            SkinnyCodec::G711_ULAW_64K,
            SkinnyCodec::G722_64K,
            SkinnyCodec::G729,
        ]);
        assert!(caps.remove(SkinnyCodec::G722_64K));
        assert_eq!(
            caps.as_slice(),
            &[SkinnyCodec::G711_ULAW_64K, SkinnyCodec::G729]
        );
        assert!(!caps.remove(SkinnyCodec::G722_64K));
    }

    #[test]
    fn test_reduce_keeps_base_order() {
        let base = set(&[
            SkinnyCodec::G729,
            SkinnyCodec::G711_ALAW_64K,
            SkinnyCodec::G711_ULAW_64K,
        ]);
        let other = set(&[SkinnyCodec::G711_ULAW_64K, SkinnyCodec::G711_ALAW_64K]);
        let joint = base.reduce(&other);
        assert_eq!(
            joint.as_slice(),
            &[SkinnyCodec::G711_ALAW_64K, SkinnyCodec::G711_ULAW_64K]
        );
    }

    #[test]
    fn test_reduce_is_subset_of_base() {
        let base = set(&[SkinnyCodec::G722_64K, SkinnyCodec::OPUS]);
        let other = set(&[SkinnyCodec::OPUS]);
        let joint = base.reduce(&other);
        for codec in joint.iter() {
            assert!(base.contains(codec));
            assert!(other.contains(codec));
        }
    }

    #[test]
    fn test_combine_appends_novel_entries() {
        let base = set(&[SkinnyCodec::G711_ULAW_64K, SkinnyCodec::G722_64K]);
        let extra = set(&[SkinnyCodec::G722_64K, SkinnyCodec::OPUS, SkinnyCodec::G729]);
        let all = base.combine(&extra);
        assert_eq!(
            all.as_slice(),
            &[
                SkinnyCodec::G711_ULAW_64K,
                SkinnyCodec::G722_64K,
                SkinnyCodec::OPUS,
                SkinnyCodec::G729,
            ]
        );
    }

    #[test]
    fn test_combine_with_self_is_identity() {
        let base = set(&[SkinnyCodec::G711_ALAW_64K, SkinnyCodec::G729]);
        assert_eq!(base.combine(&base), base);
        assert_eq!(base.reduce(&base), base);
    }

    #[test]
    fn test_find_best_joint_prefers_local_order() {
        let local = set(&[
            SkinnyCodec::G711_ULAW_64K,
            SkinnyCodec::G711_ALAW_64K,
            SkinnyCodec::G729,
        ]);
        let remote = set(&[
            SkinnyCodec::G711_ALAW_64K,
            SkinnyCodec::NONSTANDARD,
            SkinnyCodec::OPUS,
        ]);
        assert_eq!(
            find_best_joint(&local, &remote, false),
            SkinnyCodec::G711_ALAW_64K
        );
    }

    #[test]
    fn test_find_best_joint_empty_intersection() {
        let local = set(&[SkinnyCodec::G722_64K, SkinnyCodec::G729]);
        let remote = set(&[SkinnyCodec::OPUS]);

        assert_eq!(find_best_joint(&local, &remote, false), SkinnyCodec::NONE);
        assert_eq!(
            find_best_joint(&local, &remote, true),
            SkinnyCodec::G722_64K
        );
    }

    #[test]
    fn test_find_best_joint_is_directional() {
        let a = set(&[SkinnyCodec::G711_ULAW_64K, SkinnyCodec::G722_64K]);
        let b = set(&[SkinnyCodec::G722_64K, SkinnyCodec::G711_ULAW_64K]);
        assert_eq!(find_best_joint(&a, &b, false), SkinnyCodec::G711_ULAW_64K);
        assert_eq!(find_best_joint(&b, &a, false), SkinnyCodec::G722_64K);
    }

    #[test]
    fn test_display() {
        let caps = set(&[SkinnyCodec::G711_ALAW_64K, SkinnyCodec::G711_ULAW_64K]);
        assert_eq!(caps.to_string(), "[alaw/64k, ulaw/64k]");
        assert_eq!(AudioCapabilities::new().to_string(), "[]");
    }
}
