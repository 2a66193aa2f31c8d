//! Legacy V1 text-packet serialisation.
//!
//! Each packet is four lowercase hex digits giving the packet length
//! (including the header and trailing newline), then `key value\n`.

use super::{Caveat, Macaroon, MacaroonError};

const HEADER_LEN: usize = 4;

pub(super) fn looks_like_v1(bytes: &[u8]) -> bool {
    bytes
        .get(..HEADER_LEN)
        .is_some_and(|header| header.iter().all(u8::is_ascii_hexdigit))
}

fn packets(bytes: &[u8]) -> Result<Vec<(&[u8], &[u8])>, MacaroonError> {
    let mut packets = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let header = bytes
            .get(pos..pos + HEADER_LEN)
            .and_then(|header| std::str::from_utf8(header).ok())
            .ok_or(MacaroonError::Malformed("truncated packet header"))?;
        let len = usize::from_str_radix(header, 16)
            .map_err(|_hex| MacaroonError::Malformed("invalid packet header"))?;

        if len <= HEADER_LEN + 1 {
            return Err(MacaroonError::Malformed("packet too short"));
        }

        let body = bytes
            .get(pos + HEADER_LEN..pos + len)
            .ok_or(MacaroonError::Malformed("truncated packet"))?;
        let body = body
            .strip_suffix(b"\n")
            .ok_or(MacaroonError::Malformed("packet without newline"))?;
        let split = body
            .iter()
            .position(|b| *b == b' ')
            .ok_or(MacaroonError::Malformed("packet without key"))?;
        let (key, value) = body.split_at(split);

        packets.push((key, value.get(1..).unwrap_or_default()));
        pos += len;
    }

    Ok(packets)
}

fn utf8(value: &[u8]) -> Result<String, MacaroonError> {
    String::from_utf8(value.to_vec()).map_err(|_utf8| MacaroonError::Malformed("value not utf-8"))
}

pub(super) fn decode(bytes: &[u8]) -> Result<Macaroon, MacaroonError> {
    let mut location = None;
    let mut identifier = None;
    let mut signature = None;
    let mut caveats: Vec<Caveat> = Vec::new();

    for (key, value) in packets(bytes)? {
        match key {
            b"location" => location = Some(utf8(value)?),
            b"identifier" => identifier = Some(value.to_vec()),
            b"cid" => caveats.push(Caveat::first_party(value)),
            b"vid" => {
                caveats
                    .last_mut()
                    .ok_or(MacaroonError::Malformed("vid before cid"))?
                    .verification_id = Some(value.to_vec());
            }
            b"cl" => {
                caveats
                    .last_mut()
                    .ok_or(MacaroonError::Malformed("cl before cid"))?
                    .location = Some(utf8(value)?);
            }
            b"signature" => signature = Some(value.to_vec()),
            _ => return Err(MacaroonError::Malformed("unknown packet")),
        }
    }

    Ok(Macaroon {
        location,
        identifier: identifier.ok_or(MacaroonError::Malformed("missing identifier"))?,
        caveats,
        signature: signature.ok_or(MacaroonError::Malformed("missing signature"))?,
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn packet(key: &str, value: &[u8]) -> Vec<u8> {
        let len = HEADER_LEN + key.len() + 1 + value.len() + 1;
        let mut out = format!("{len:04x}{key} ").into_bytes();
        out.extend_from_slice(value);
        out.push(b'\n');
        out
    }

    #[test]
    fn decode_reads_all_packet_kinds() -> TestResult {
        let mut bytes = Vec::new();
        bytes.extend(packet("location", b"brave.com"));
        bytes.extend(packet("identifier", b"id"));
        bytes.extend(packet("cid", b"sku=vpn"));
        bytes.extend(packet("cid", b"price=9.99"));
        bytes.extend(packet("signature", &[1; 32]));

        assert!(looks_like_v1(&bytes));

        let macaroon = decode(&bytes)?;

        assert_eq!(macaroon.location(), Some("brave.com"));
        assert_eq!(macaroon.identifier(), b"id");
        assert_eq!(
            macaroon.caveats(),
            &[
                Caveat::first_party("sku=vpn"),
                Caveat::first_party("price=9.99")
            ]
        );
        assert_eq!(macaroon.signature(), &[1; 32]);

        Ok(())
    }

    #[test]
    fn decode_rejects_missing_signature() {
        let bytes = packet("identifier", b"id");

        let result = decode(&bytes);

        assert!(
            matches!(result, Err(MacaroonError::Malformed("missing signature"))),
            "expected missing signature, got {result:?}"
        );
    }
}
