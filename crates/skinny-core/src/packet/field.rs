//! Field-level read/write helpers shared by the payload codecs
//!
//! Everything on the wire is little-endian unless a helper here says
//! otherwise; the `_be` helpers exist because remote media addresses are
//! carried in network byte order inside otherwise little-endian messages.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, SccpError};

/// Verify `buf` still holds at least `needed` bytes.
pub fn ensure(buf: &impl Buf, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(SccpError::BufferTooSmall {
            needed,
            actual: buf.remaining(),
        });
    }
    Ok(())
}

/// Read a fixed-width char-array field.
///
/// The field is NUL-padded but a completely full field carries no NUL at
/// all, so decoding truncates at the first NUL if any. Non-UTF-8 bytes are
/// replaced rather than rejected; phones ship all sorts of display bytes.
pub fn get_fixed_string(buf: &mut impl Buf, width: usize) -> Result<String> {
    ensure(buf, width)?;
    let mut raw = vec![0u8; width];
    buf.copy_to_slice(&mut raw);
    let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Write a fixed-width char-array field, NUL-padded, truncating over-long
/// input at a character boundary.
pub fn put_fixed_string(buf: &mut BytesMut, value: &str, width: usize) {
    let mut len = value.len().min(width);
    while !value.is_char_boundary(len) {
        len -= 1;
    }
    buf.put_slice(&value.as_bytes()[..len]);
    buf.put_bytes(0, width - len);
}

/// Read an IPv4 address carried as 4 bytes in network order.
pub fn get_ipv4_be(buf: &mut impl Buf) -> Result<Ipv4Addr> {
    ensure(buf, 4)?;
    let mut octets = [0u8; 4];
    buf.copy_to_slice(&mut octets);
    Ok(Ipv4Addr::from(octets))
}

pub fn put_ipv4_be(buf: &mut BytesMut, addr: Ipv4Addr) {
    buf.put_slice(&addr.octets());
}

/// Read a 16-byte address block. An IPv4 address occupies the first four
/// bytes with the rest zeroed; anything else is taken as IPv6.
pub fn get_addr16(buf: &mut impl Buf) -> Result<IpAddr> {
    ensure(buf, 16)?;
    let mut raw = [0u8; 16];
    buf.copy_to_slice(&mut raw);
    if raw[4..].iter().all(|&b| b == 0) {
        let mut v4 = [0u8; 4];
        v4.copy_from_slice(&raw[..4]);
        Ok(IpAddr::V4(Ipv4Addr::from(v4)))
    } else {
        Ok(IpAddr::V6(Ipv6Addr::from(raw)))
    }
}

pub fn put_addr16(buf: &mut BytesMut, addr: IpAddr) {
    match addr {
        IpAddr::V4(v4) => {
            buf.put_slice(&v4.octets());
            buf.put_bytes(0, 12);
        }
        IpAddr::V6(v6) => buf.put_slice(&v6.octets()),
    }
}

/// Address family tag used by v17-era layouts next to a 16-byte block
pub fn family_tag(addr: IpAddr) -> u32 {
    match addr {
        IpAddr::V4(_) => 0,
        IpAddr::V6(_) => 1,
    }
}

/// Read a tagged 16-byte address block (tag dword, then the block).
pub fn get_tagged_addr(buf: &mut impl Buf) -> Result<IpAddr> {
    ensure(buf, 20)?;
    let tag = buf.get_u32_le();
    let mut raw = [0u8; 16];
    buf.copy_to_slice(&mut raw);
    if tag == 0 {
        let mut v4 = [0u8; 4];
        v4.copy_from_slice(&raw[..4]);
        Ok(IpAddr::V4(Ipv4Addr::from(v4)))
    } else {
        Ok(IpAddr::V6(Ipv6Addr::from(raw)))
    }
}

pub fn put_tagged_addr(buf: &mut BytesMut, addr: IpAddr) {
    buf.put_u32_le(family_tag(addr));
    put_addr16(buf, addr);
}

/// Skip a reserved filler region on decode, tolerating a sender that
/// stopped short of it.
pub fn skip_reserved(buf: &mut impl Buf, len: usize) {
    let n = len.min(buf.remaining());
    buf.advance(n);
}

/// Write a reserved filler region as zeros.
pub fn put_reserved(buf: &mut BytesMut, len: usize) {
    buf.put_bytes(0, len);
}

/// Decode a blob of NUL-terminated strings appended back to back.
/// Trailing padding (and therefore trailing empty fields) is dropped.
pub fn get_string_blob(buf: &mut impl Buf) -> Vec<String> {
    let mut raw = vec![0u8; buf.remaining()];
    buf.copy_to_slice(&mut raw);
    let mut parts: Vec<String> = raw
        .split(|&b| b == 0)
        .map(|p| String::from_utf8_lossy(p).into_owned())
        .collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

/// Encode a blob of NUL-terminated strings, padded to a dword boundary.
pub fn put_string_blob(buf: &mut BytesMut, parts: &[String]) {
    let start = buf.len();
    for part in parts {
        buf.put_slice(part.as_bytes());
        buf.put_u8(0);
    }
    let used = buf.len() - start;
    buf.put_bytes(0, used.wrapping_neg() & 3);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_fixed_string_round_trip() {
        let mut buf = BytesMut::new();
        put_fixed_string(&mut buf, "SEP001122334455", 16);
        assert_eq!(buf.len(), 16);
        let mut rd = Bytes::from(buf.to_vec());
        assert_eq!(get_fixed_string(&mut rd, 16).unwrap(), "SEP001122334455");
    }

    #[test]
    fn test_fixed_string_full_width_no_nul() {
        let mut rd = Bytes::from(vec![b'A'; 16]);
        assert_eq!(get_fixed_string(&mut rd, 16).unwrap(), "A".repeat(16));
    }

    #[test]
    fn test_fixed_string_truncates_on_utf8_boundary() {
        let mut buf = BytesMut::new();
        put_fixed_string(&mut buf, "abcdé", 5); // é is 2 bytes, won't fit whole
        assert_eq!(buf.len(), 5);
        assert_eq!(&buf[..4], b"abcd");
        assert_eq!(buf[4], 0);
    }

    #[test]
    fn test_fixed_string_short_buffer() {
        let mut rd = Bytes::from(vec![0u8; 3]);
        assert!(get_fixed_string(&mut rd, 16).is_err());
    }

    #[test]
    fn test_addr16_v4_convention() {
        let mut buf = BytesMut::new();
        put_addr16(&mut buf, "192.168.9.44".parse().unwrap());
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[..4], &[192, 168, 9, 44]);
        let mut rd = Bytes::from(buf.to_vec());
        assert_eq!(
            get_addr16(&mut rd).unwrap(),
            "192.168.9.44".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_addr16_v6_round_trip() {
        let addr: IpAddr = "2001:db8::99".parse().unwrap();
        let mut buf = BytesMut::new();
        put_addr16(&mut buf, addr);
        let mut rd = Bytes::from(buf.to_vec());
        assert_eq!(get_addr16(&mut rd).unwrap(), addr);
    }

    #[test]
    fn test_tagged_addr_round_trip() {
        for addr in ["10.11.12.13", "2001:db8::1"] {
            let addr: IpAddr = addr.parse().unwrap();
            let mut buf = BytesMut::new();
            put_tagged_addr(&mut buf, addr);
            assert_eq!(buf.len(), 20);
            let mut rd = Bytes::from(buf.to_vec());
            assert_eq!(get_tagged_addr(&mut rd).unwrap(), addr);
        }
    }

    #[test]
    fn test_string_blob_round_trip() {
        let parts: Vec<String> = ["1000", "Alice", "", "2000"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut buf = BytesMut::new();
        put_string_blob(&mut buf, &parts);
        assert_eq!(buf.len() % 4, 0);
        let mut rd = Bytes::from(buf.to_vec());
        assert_eq!(get_string_blob(&mut rd), parts);
    }

    #[test]
    fn test_string_blob_padding_dropped() {
        // 3 bytes of content + terminator, already dword aligned
        let mut buf = BytesMut::new();
        put_string_blob(&mut buf, &["abc".to_string()]);
        assert_eq!(buf.len(), 4);
        let mut rd = Bytes::from(buf.to_vec());
        assert_eq!(get_string_blob(&mut rd), vec!["abc".to_string()]);
    }
}
