//! Binary V2 serialisation.

use super::{Caveat, Macaroon, MacaroonError};

pub(super) const VERSION: u8 = 2;

const EOS: u64 = 0;
const LOCATION: u64 = 1;
const IDENTIFIER: u64 = 2;
const VERIFICATION_ID: u64 = 4;
const SIGNATURE: u64 = 6;

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn varint(&mut self) -> Result<u64, MacaroonError> {
        let mut value = 0_u64;

        for shift in (0..64).step_by(7) {
            let byte = *self
                .bytes
                .get(self.pos)
                .ok_or(MacaroonError::Malformed("truncated varint"))?;

            self.pos += 1;
            value |= u64::from(byte & 0x7f) << shift;

            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(MacaroonError::Malformed("varint overflow"))
    }

    fn field(&mut self) -> Result<(u64, &'a [u8]), MacaroonError> {
        let kind = self.varint()?;

        if kind == EOS {
            return Ok((EOS, &[]));
        }

        let len = usize::try_from(self.varint()?)
            .map_err(|_overflow| MacaroonError::Malformed("field too long"))?;
        let end = self
            .pos
            .checked_add(len)
            .ok_or(MacaroonError::Malformed("field too long"))?;
        let data = self
            .bytes
            .get(self.pos..end)
            .ok_or(MacaroonError::Malformed("truncated field"))?;

        self.pos = end;

        Ok((kind, data))
    }

    /// Reads fields up to the next end-of-section marker, enforcing
    /// ascending field order.
    fn section(&mut self) -> Result<Vec<(u64, &'a [u8])>, MacaroonError> {
        let mut fields: Vec<(u64, &'a [u8])> = Vec::new();

        loop {
            let (kind, data) = self.field()?;

            if kind == EOS {
                return Ok(fields);
            }

            if fields.last().is_some_and(|(last, _)| *last >= kind) {
                return Err(MacaroonError::Malformed("fields out of order"));
            }

            fields.push((kind, data));
        }
    }
}

fn take(fields: &[(u64, &[u8])], kind: u64) -> Option<Vec<u8>> {
    fields
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, data)| data.to_vec())
}

fn take_string(fields: &[(u64, &[u8])], kind: u64) -> Result<Option<String>, MacaroonError> {
    take(fields, kind)
        .map(|bytes| {
            String::from_utf8(bytes).map_err(|_utf8| MacaroonError::Malformed("location not utf-8"))
        })
        .transpose()
}

pub(super) fn decode(bytes: &[u8]) -> Result<Macaroon, MacaroonError> {
    let mut reader = Reader { bytes, pos: 1 };

    let header = reader.section()?;
    let location = take_string(&header, LOCATION)?;
    let identifier =
        take(&header, IDENTIFIER).ok_or(MacaroonError::Malformed("missing identifier"))?;

    let mut caveats = Vec::new();

    loop {
        let section = reader.section()?;

        if section.is_empty() {
            break;
        }

        caveats.push(Caveat {
            id: take(&section, IDENTIFIER).ok_or(MacaroonError::Malformed("caveat without id"))?,
            verification_id: take(&section, VERIFICATION_ID),
            location: take_string(&section, LOCATION)?,
        });
    }

    let (kind, signature) = reader.field()?;

    if kind != SIGNATURE {
        return Err(MacaroonError::Malformed("missing signature"));
    }

    Ok(Macaroon {
        location,
        identifier,
        caveats,
        signature: signature.to_vec(),
    })
}

fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }

    out.push(value as u8);
}

fn put_field(out: &mut Vec<u8>, kind: u64, data: &[u8]) {
    put_varint(out, kind);
    put_varint(out, data.len() as u64);
    out.extend_from_slice(data);
}

pub(super) fn encode(macaroon: &Macaroon) -> Vec<u8> {
    let mut out = vec![VERSION];

    if let Some(location) = &macaroon.location {
        put_field(&mut out, LOCATION, location.as_bytes());
    }

    put_field(&mut out, IDENTIFIER, &macaroon.identifier);
    put_varint(&mut out, EOS);

    for caveat in &macaroon.caveats {
        if let Some(location) = &caveat.location {
            put_field(&mut out, LOCATION, location.as_bytes());
        }

        put_field(&mut out, IDENTIFIER, &caveat.id);

        if let Some(vid) = &caveat.verification_id {
            put_field(&mut out, VERIFICATION_ID, vid);
        }

        put_varint(&mut out, EOS);
    }

    put_varint(&mut out, EOS);
    put_field(&mut out, SIGNATURE, &macaroon.signature);

    out
}
