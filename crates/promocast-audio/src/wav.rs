use base64::{engine::general_purpose, Engine as _};
use promocast_core::WavError;

/// Speech output is always mono, 16-bit little-endian, 24 kHz.
pub const SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const HEADER_LEN: usize = 44;
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// The canonical 44-byte RIFF/WAVE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    pub fn for_data_size(data_size: u32) -> Self {
        let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
        Self {
            chunk_size: 36 + data_size,
            audio_format: PCM_FORMAT,
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            byte_rate: SAMPLE_RATE * block_align as u32,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Parse the fixed header layout written by [`to_bytes`](Self::to_bytes).
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < HEADER_LEN {
            return Err(WavError::MalformedHeader(format!(
                "expected at least {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        expect_tag(bytes, 0, b"RIFF")?;
        expect_tag(bytes, 8, b"WAVE")?;
        expect_tag(bytes, 12, b"fmt ")?;
        expect_tag(bytes, 36, b"data")?;

        let fmt_len = read_u32(bytes, 16);
        if fmt_len != FMT_CHUNK_LEN {
            return Err(WavError::MalformedHeader(format!(
                "unexpected fmt chunk size {fmt_len}"
            )));
        }

        Ok(Self {
            chunk_size: read_u32(bytes, 4),
            audio_format: read_u16(bytes, 20),
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_size: read_u32(bytes, 40),
        })
    }
}

fn expect_tag(bytes: &[u8], offset: usize, tag: &[u8; 4]) -> Result<(), WavError> {
    if &bytes[offset..offset + 4] == tag {
        Ok(())
    } else {
        Err(WavError::MalformedHeader(format!(
            "expected {:?} at offset {offset}",
            String::from_utf8_lossy(tag)
        )))
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Wrap raw PCM bytes in a WAV container. The payload is copied verbatim;
/// odd lengths are passed through untouched and an empty payload yields a
/// valid 44-byte file.
pub fn encode_pcm(pcm: &[u8]) -> Result<Vec<u8>, WavError> {
    let data_size = u32::try_from(pcm.len())
        .ok()
        .filter(|n| n.checked_add(36).is_some())
        .ok_or(WavError::PayloadTooLarge(pcm.len()))?;

    if pcm.len() % 2 != 0 {
        tracing::warn!(bytes = pcm.len(), "PCM payload has an odd byte count");
    }

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    out.extend_from_slice(&WavHeader::for_data_size(data_size).to_bytes());
    out.extend_from_slice(pcm);
    Ok(out)
}

pub fn decode_base64_pcm(encoded: &str) -> Result<Vec<u8>, WavError> {
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| WavError::InvalidBase64(e.to_string()))
}

/// Decode base64 PCM as returned by the speech API and wrap it in a WAV container.
pub fn encode_base64_pcm(encoded: &str) -> Result<Vec<u8>, WavError> {
    let pcm = decode_base64_pcm(encoded)?;
    encode_pcm(&pcm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_constants() {
        let header = WavHeader::for_data_size(100);
        assert_eq!(header.chunk_size, 136);
        assert_eq!(header.audio_format, 1);
        assert_eq!(header.channels, 1);
        assert_eq!(header.sample_rate, 24_000);
        assert_eq!(header.byte_rate, 48_000);
        assert_eq!(header.block_align, 2);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_size, 100);
    }

    #[test]
    fn test_header_byte_layout() {
        let bytes = WavHeader::for_data_size(4).to_bytes();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &40u32.to_le_bytes());
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[16..20], &[16, 0, 0, 0]);
        assert_eq!(&bytes[20..22], &[1, 0]);
        assert_eq!(&bytes[22..24], &[1, 0]);
        assert_eq!(&bytes[24..28], &[0xC0, 0x5D, 0x00, 0x00]);
        assert_eq!(&bytes[28..32], &[0x80, 0xBB, 0x00, 0x00]);
        assert_eq!(&bytes[32..34], &[2, 0]);
        assert_eq!(&bytes[34..36], &[16, 0]);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[40..44], &[4, 0, 0, 0]);
    }

    #[test]
    fn test_encode_four_bytes() {
        let wav = encode_pcm(&[0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[44..48], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_encode_empty_payload() {
        let wav = encode_pcm(&[]).unwrap();
        assert_eq!(wav.len(), HEADER_LEN);
        let header = WavHeader::parse(&wav).unwrap();
        assert_eq!(header.data_size, 0);
        assert_eq!(header.chunk_size, 36);
    }

    #[test]
    fn test_encode_odd_payload_passes_through() {
        let wav = encode_pcm(&[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(wav.len(), 47);
        assert_eq!(&wav[44..], &[0xAA, 0xBB, 0xCC]);
        assert_eq!(WavHeader::parse(&wav).unwrap().data_size, 3);
    }

    #[test]
    fn test_parse_recovers_header() {
        let header = WavHeader::for_data_size(960);
        assert_eq!(WavHeader::parse(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn test_parse_rejects_short_input() {
        match WavHeader::parse(&[0u8; 10]) {
            Err(WavError::MalformedHeader(msg)) => assert!(msg.contains("44")),
            other => panic!("expected MalformedHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_wrong_tag() {
        let mut bytes = WavHeader::for_data_size(0).to_bytes();
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(WavHeader::parse(&bytes).is_err());
    }

    #[test]
    fn test_encode_base64_pcm() {
        // [0x01, 0x02, 0x03, 0x04]
        let wav = encode_base64_pcm("AQIDBA==").unwrap();
        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[44..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_encode_base64_empty_string() {
        let wav = encode_base64_pcm("").unwrap();
        assert_eq!(wav.len(), HEADER_LEN);
    }

    #[test]
    fn test_decode_base64_rejects_garbage() {
        match decode_base64_pcm("not base64 !!") {
            Err(WavError::InvalidBase64(_)) => {}
            other => panic!("expected InvalidBase64, got {other:?}"),
        }
    }
}
