//! Incremental frame decoding for the Cardforge byte stream.
//!
//! The wire stream is a sequence of frames:
//!
//! ```text
//! ┌──────────────┬───────┬─────────────────────┐
//! │ len: u32 BE  │ flags │ payload (len bytes) │
//! └──────────────┴───────┴─────────────────────┘
//! ```
//!
//! `len` counts the payload only, not the 5-byte header. If bit 0 of
//! `flags` is set, the payload is lz4-compressed with the uncompressed
//! size prepended ([`lz4_flex::compress_prepend_size`]).
//!
//! The decoder consumes byte chunks of arbitrary size (whatever the
//! socket happened to deliver) and buffers across chunk boundaries.
//! A frame split at any offset, including mid-header, decodes to the
//! same payload as a single-chunk feed. No byte is dropped or read twice.

use crate::TransportError;

/// Hard cap on a single frame's payload. A peer announcing more than this
/// is either broken or hostile, and the stream is torn down.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

/// Size of the frame header: 4 length bytes + 1 flags byte.
const HEADER_LEN: usize = 5;

/// Flags bit 0: payload is lz4-compressed.
pub const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Frames smaller than this are never compressed; the lz4 size prefix
/// and block overhead would outweigh the savings.
pub const COMPRESS_THRESHOLD: usize = 512;

/// Encodes one payload into a wire frame.
///
/// When `compress` is set and the payload is large enough to benefit,
/// the payload is lz4-compressed and the compressed flag is set.
pub fn encode_frame(payload: &[u8], compress: bool) -> Vec<u8> {
    let (flags, body) = if compress && payload.len() >= COMPRESS_THRESHOLD {
        (FLAG_COMPRESSED, lz4_flex::compress_prepend_size(payload))
    } else {
        (0u8, payload.to_vec())
    };

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.push(flags);
    frame.extend_from_slice(&body);
    frame
}

/// Incremental decoder for the frame stream.
///
/// Feed it chunks with [`push`](Self::push), then drain complete frames
/// with [`next_frame`](Self::next_frame) until it returns `Ok(None)`.
/// Partial frames stay buffered until the missing bytes arrive.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of received bytes to the internal buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Returns the next complete frame payload, decompressed if needed.
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a full frame.
    ///
    /// # Errors
    /// - [`TransportError::FrameTooLarge`] if the header announces a
    ///   payload above [`MAX_FRAME_LEN`]. The buffer is poisoned at that
    ///   point; callers must close the connection.
    /// - [`TransportError::InvalidFrame`] if the compressed payload fails
    ///   to decompress. The frame's bytes have already been consumed, so
    ///   the stream itself stays usable.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let len = u32::from_be_bytes([
            self.buf[0],
            self.buf[1],
            self.buf[2],
            self.buf[3],
        ]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge {
                len,
                max: MAX_FRAME_LEN,
            });
        }

        let flags = self.buf[4];
        if self.buf.len() < HEADER_LEN + len {
            return Ok(None);
        }

        // Consume header + payload in one splice so leftover bytes of the
        // next frame stay at the front of the buffer.
        let body: Vec<u8> =
            self.buf.drain(..HEADER_LEN + len).skip(HEADER_LEN).collect();

        if flags & FLAG_COMPRESSED != 0 {
            let payload = lz4_flex::decompress_size_prepended(&body)
                .map_err(|e| TransportError::InvalidFrame(e.to_string()))?;
            Ok(Some(payload))
        } else {
            Ok(Some(body))
        }
    }

    /// Number of bytes currently buffered (partial frame remainder).
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_then_decode_single_chunk() {
        let payload = b"{\"type\":\"Ping\"}";
        let frame = encode_frame(payload, false);

        let mut dec = FrameDecoder::new();
        dec.push(&frame);

        let out = dec.next_frame().unwrap().expect("complete frame");
        assert_eq!(out, payload);
        assert!(dec.next_frame().unwrap().is_none());
        assert_eq!(dec.buffered(), 0);
    }

    #[test]
    fn test_decode_identical_for_every_split_offset() {
        // The property the whole parser hangs on: splitting the byte
        // stream at ANY offset (mid-header, mid-payload) must produce
        // the same decoded result as a single-chunk feed.
        let payload: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
        let frame = encode_frame(&payload, false);

        for split in 0..=frame.len() {
            let mut dec = FrameDecoder::new();
            dec.push(&frame[..split]);
            // Nothing complete can appear before the full frame is in,
            // unless split == frame.len().
            if split < frame.len() {
                assert!(
                    dec.next_frame().unwrap().is_none(),
                    "premature frame at split {split}"
                );
            }
            dec.push(&frame[split..]);
            let out = dec.next_frame().unwrap().expect("complete frame");
            assert_eq!(out, payload, "mismatch at split {split}");
        }
    }

    #[test]
    fn test_decode_two_frames_from_one_chunk() {
        let mut stream = encode_frame(b"first", false);
        stream.extend_from_slice(&encode_frame(b"second", false));

        let mut dec = FrameDecoder::new();
        dec.push(&stream);

        assert_eq!(dec.next_frame().unwrap().unwrap(), b"first");
        assert_eq!(dec.next_frame().unwrap().unwrap(), b"second");
        assert!(dec.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_decode_byte_at_a_time() {
        let payload = b"one byte at a time, like a very slow socket";
        let frame = encode_frame(payload, false);

        let mut dec = FrameDecoder::new();
        let mut got = None;
        for b in &frame {
            dec.push(std::slice::from_ref(b));
            if let Some(f) = dec.next_frame().unwrap() {
                got = Some(f);
            }
        }
        assert_eq!(got.as_deref(), Some(payload.as_slice()));
    }

    #[test]
    fn test_compressed_round_trip() {
        // Repetitive payload well above the threshold compresses.
        let payload = vec![b'z'; 4096];
        let frame = encode_frame(&payload, true);
        assert!(frame.len() < payload.len(), "should actually shrink");
        assert_eq!(frame[4] & FLAG_COMPRESSED, FLAG_COMPRESSED);

        let mut dec = FrameDecoder::new();
        dec.push(&frame);
        assert_eq!(dec.next_frame().unwrap().unwrap(), payload);
    }

    #[test]
    fn test_small_payload_not_compressed_even_when_negotiated() {
        let frame = encode_frame(b"tiny", true);
        assert_eq!(frame[4], 0, "below threshold stays uncompressed");
    }

    #[test]
    fn test_oversized_length_is_fatal() {
        let mut dec = FrameDecoder::new();
        let mut header = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes().to_vec();
        header.push(0);
        dec.push(&header);

        assert!(matches!(
            dec.next_frame(),
            Err(TransportError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_corrupt_compressed_payload_is_an_error() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&4u32.to_be_bytes());
        frame.push(FLAG_COMPRESSED);
        frame.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        let mut dec = FrameDecoder::new();
        dec.push(&frame);
        assert!(matches!(
            dec.next_frame(),
            Err(TransportError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_empty_payload_frame() {
        let frame = encode_frame(b"", false);
        let mut dec = FrameDecoder::new();
        dec.push(&frame);
        assert_eq!(dec.next_frame().unwrap().unwrap(), Vec::<u8>::new());
    }
}
