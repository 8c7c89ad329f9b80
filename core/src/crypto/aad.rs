use crate::framing::FrameKind;

/// Build the AEAD associated data for one frame.
///
/// AAD = unencrypted header bytes || key_index || frame_counter (LE).
/// Only values known before encryption go in, so encode and decode rebuild
/// byte-identical AAD from the header and trailer alone.
#[inline]
pub fn build_aad(header: &[u8], key_index: u8, frame_counter: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(max_aad_len());
    out.extend_from_slice(header);
    out.push(key_index);
    out.extend_from_slice(&frame_counter.to_le_bytes());
    out
}

/// Upper bound on AAD length for any frame kind.
pub const fn max_aad_len() -> usize {
    FrameKind::Key.header_len() + 1 + 8
}
