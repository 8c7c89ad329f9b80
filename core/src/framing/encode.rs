use byteorder::{ByteOrder, LittleEndian};

use crate::framing::types::{FrameError, FrameTrailer};

/// Serialize the trailer into its fixed 21-byte layout.
///
/// ```text
/// [ iv (12) ]
/// [ key_index (1) ]
/// [ frame_counter (8, LE) ]
/// ```
#[inline]
pub fn encode_trailer(trailer: &FrameTrailer) -> [u8; FrameTrailer::LEN] {
    let mut out = [0u8; FrameTrailer::LEN];
    out[..12].copy_from_slice(&trailer.iv);
    out[12] = trailer.key_index;
    LittleEndian::write_u64(&mut out[13..21], trailer.frame_counter);
    out
}

/// Join the wire regions: `header || ciphertext_and_tag || trailer`.
pub fn encode_encrypted_frame(
    header: &[u8],
    ciphertext_and_tag: &[u8],
    trailer: &FrameTrailer,
) -> Result<Vec<u8>, FrameError> {
    let expected = header.len() + ciphertext_and_tag.len() + FrameTrailer::LEN;
    let mut out = Vec::with_capacity(expected);

    out.extend_from_slice(header);
    out.extend_from_slice(ciphertext_and_tag);
    out.extend_from_slice(&encode_trailer(trailer));

    if out.len() != expected {
        return Err(FrameError::LengthMismatch {
            expected,
            actual: out.len(),
        });
    }

    Ok(out)
}
