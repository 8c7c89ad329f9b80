use byteorder::{ByteOrder, LittleEndian};

use crate::framing::types::{EncryptedFrameView, FrameError, FrameKind, FrameTrailer};

#[inline]
pub fn parse_trailer(raw: &[u8]) -> Result<FrameTrailer, FrameError> {
    if raw.len() != FrameTrailer::LEN {
        return Err(FrameError::LengthMismatch {
            expected: FrameTrailer::LEN,
            actual: raw.len(),
        });
    }

    let mut iv = [0u8; 12];
    iv.copy_from_slice(&raw[..12]);
    let key_index = raw[12];
    let frame_counter = LittleEndian::read_u64(&raw[13..21]);

    Ok(FrameTrailer { iv, key_index, frame_counter })
}

/// Split an encrypted frame into header, ciphertext+tag and trailer.
///
/// Frames shorter than `header + tag + trailer` are rejected before any
/// cryptography runs. Zero-copy: every region borrows from `wire`.
pub fn decode_encrypted_frame(kind: FrameKind, wire: &[u8]) -> Result<EncryptedFrameView<'_>, FrameError> {
    let min = kind.min_encrypted_len();
    if wire.len() < min {
        return Err(FrameError::TooShort {
            kind: kind.as_str(),
            min,
            actual: wire.len(),
        });
    }

    let header_len = kind.header_len();
    let trailer_start = wire.len() - FrameTrailer::LEN;

    let trailer = parse_trailer(&wire[trailer_start..])?;

    Ok(EncryptedFrameView {
        header: &wire[..header_len],
        ciphertext_and_tag: &wire[header_len..trailer_start],
        trailer,
    })
}
