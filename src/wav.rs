//! Canonical PCM WAV codec.
//!
//! Reads and writes the fixed 44-byte RIFF/WAVE header followed directly by
//! the sample payload. Only 16-bit and 24-bit little-endian signed PCM is
//! handled; there is no chunk search, so `data` must start at offset 36.
//!
//! In memory, audio is planar. On disk the payload is frame-interleaved, so
//! the encoder interleaves and the decoder de-interleaves.

use crate::arena::ScratchArena;
use crate::audio_buffer::AudioBuffer;
use crate::error::{AudioError, Result};

/// Size of the canonical header in bytes.
pub const HEADER_LEN: usize = 44;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;

/// Supported PCM sample widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Sixteen,
    TwentyFour,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    /// Magnitude of the most negative code, `2^(B-1)`.
    fn negative_scale(self) -> f64 {
        match self {
            BitDepth::Sixteen => 32768.0,
            BitDepth::TwentyFour => 8_388_608.0,
        }
    }

    /// Most positive code, `2^(B-1) - 1`.
    fn positive_scale(self) -> f64 {
        self.negative_scale() - 1.0
    }

    /// Map a float to a signed integer code.
    ///
    /// Negative samples scale by `2^(B-1)` and non-negative ones by
    /// `2^(B-1) - 1`, truncating toward zero, so `-1.0` and `+1.0` land on
    /// the integer extremes. Out-of-range input saturates.
    pub fn quantize(self, sample: f32) -> i32 {
        let s = sample.clamp(-1.0, 1.0) as f64;
        if s < 0.0 {
            (s * self.negative_scale()) as i32
        } else {
            (s * self.positive_scale()) as i32
        }
    }

    /// Inverse of [`quantize`](Self::quantize).
    pub fn dequantize(self, code: i32) -> f32 {
        let code = code as f64;
        if code < 0.0 {
            (code / self.negative_scale()) as f32
        } else {
            (code / self.positive_scale()) as f32
        }
    }

    fn write_sample(self, code: i32, out: &mut [u8]) {
        let bytes = code.to_le_bytes();
        out.copy_from_slice(&bytes[..self.bytes()]);
    }

    fn read_sample(self, bytes: &[u8]) -> i32 {
        match self {
            BitDepth::Sixteen => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
            // Place the 24-bit value in the top three bytes, then shift back
            // down arithmetically to sign-extend from bit 23.
            BitDepth::TwentyFour => i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = AudioError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            other => Err(AudioError::UnsupportedBitDepth(other)),
        }
    }
}

/// The canonical 44-byte PCM header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: BitDepth,
    /// Payload size in bytes.
    pub data_size: u32,
}

impl WavHeader {
    /// Header describing `frames` frames of audio in the given format.
    pub fn new(frames: usize, channels: u16, sample_rate: u32, bit_depth: BitDepth) -> Result<Self> {
        let block_align = check_block_align(channels, bit_depth)?;
        if sample_rate.checked_mul(block_align as u32).is_none() {
            return Err(AudioError::TooLarge);
        }
        let data_size = frames
            .checked_mul(channels as usize)
            .and_then(|n| n.checked_mul(bit_depth.bytes()))
            .filter(|&n| n <= u32::MAX as usize - HEADER_LEN)
            .ok_or(AudioError::TooLarge)?;

        Ok(Self {
            channels,
            sample_rate,
            bit_depth,
            data_size: data_size as u32,
        })
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth.bytes() as u16
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.wrapping_mul(self.block_align() as u32)
    }

    /// Header plus payload size.
    pub fn total_len(&self) -> usize {
        HEADER_LEN + self.data_size as usize
    }

    /// Serialize into the first 44 bytes of `out`.
    pub fn write(&self, out: &mut [u8]) {
        let out = &mut out[..HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&(self.total_len() as u32 - 8).to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        out[34..36].copy_from_slice(&self.bit_depth.bits().to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
    }

    /// Parse and validate the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(AudioError::InvalidWav("shorter than the 44-byte header"));
        }
        if &bytes[0..4] != b"RIFF" {
            return Err(AudioError::InvalidWav("missing RIFF tag"));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(AudioError::InvalidWav("missing WAVE tag"));
        }
        if &bytes[12..16] != b"fmt " {
            return Err(AudioError::InvalidWav("missing fmt chunk"));
        }

        let audio_format = read_u16(bytes, 20);
        if audio_format != FORMAT_PCM {
            return Err(AudioError::UnsupportedAudioFormat(audio_format));
        }

        let channels = read_u16(bytes, 22);
        let sample_rate = read_u32(bytes, 24);
        let bit_depth = BitDepth::try_from(read_u16(bytes, 34))?;
        if channels == 0 {
            return Err(AudioError::InvalidWav("zero channels"));
        }
        check_block_align(channels, bit_depth)?;
        if sample_rate == 0 {
            return Err(AudioError::InvalidWav("zero sample rate"));
        }

        Ok(Self {
            channels,
            sample_rate,
            bit_depth,
            data_size: read_u32(bytes, 40),
        })
    }
}

fn check_block_align(channels: u16, bit_depth: BitDepth) -> Result<u16> {
    u16::try_from(channels as usize * bit_depth.bytes()).map_err(|_| AudioError::TooLarge)
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

/// Encode a planar buffer as a canonical WAV file in the arena.
///
/// Returns the complete file (header and payload).
pub fn encode<'a>(
    arena: &'a mut ScratchArena,
    buffer: &AudioBuffer<'_>,
    bit_depth: BitDepth,
) -> Result<&'a [u8]> {
    let header = WavHeader::new(
        buffer.frames(),
        buffer.channels(),
        buffer.sample_rate(),
        bit_depth,
    )?;
    let frames = buffer.frames();
    let channels = buffer.channels() as usize;
    let width = bit_depth.bytes();

    arena.write_bytes(header.total_len(), |out| {
        header.write(out);
        let payload = &mut out[HEADER_LEN..];
        for ch in 0..channels {
            let src = buffer.channel(ch);
            for (frame, &sample) in src.iter().enumerate() {
                let offset = (frame * channels + ch) * width;
                bit_depth.write_sample(bit_depth.quantize(sample), &mut payload[offset..offset + width]);
            }
        }
        log::trace!(
            "encoded {} frames x {} ch at {} bits",
            frames,
            channels,
            bit_depth.bits()
        );
    })
}

/// Decode a canonical WAV file into a planar float buffer in the arena.
///
/// The frame count is derived from the header's `data_size`, bounded by the
/// bytes actually supplied.
pub fn decode<'a>(arena: &'a mut ScratchArena, bytes: &[u8]) -> Result<AudioBuffer<'a>> {
    let header = WavHeader::parse(bytes)?;
    let payload = &bytes[HEADER_LEN..];
    let available = payload.len().min(header.data_size as usize);

    let block_align = header.block_align() as usize;
    let frames = available / block_align;
    let channels = header.channels as usize;
    let width = header.bit_depth.bytes();
    let count = frames.checked_mul(channels).ok_or(AudioError::TooLarge)?;

    let samples = arena.write_samples(count, |out| {
        for (frame, block) in payload[..frames * block_align]
            .chunks_exact(block_align)
            .enumerate()
        {
            for (ch, raw) in block.chunks_exact(width).enumerate() {
                let code = header.bit_depth.read_sample(raw);
                out[ch * frames + frame] = header.bit_depth.dequantize(code);
            }
        }
    })?;

    AudioBuffer::from_parts(samples, frames, header.channels, header.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    fn tolerance(bit_depth: BitDepth) -> f32 {
        2f32.powi(1 - bit_depth.bits() as i32)
    }

    fn payload_i16(bytes: &[u8]) -> Vec<i16> {
        bytes[HEADER_LEN..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn test_header_bytes_exact() {
        let mut arena = ScratchArena::new();
        let data = [0.0f32];
        let buf = AudioBuffer::new(&data, 1, 44100).unwrap();
        let wav = encode(&mut arena, &buf, BitDepth::Sixteen).unwrap();

        let expected: [u8; 44] = [
            0x52, 0x49, 0x46, 0x46, 0x26, 0x00, 0x00, 0x00, 0x57, 0x41, 0x56, 0x45, 0x66, 0x6D,
            0x74, 0x20, 0x10, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x44, 0xAC, 0x00, 0x00,
            0x88, 0x58, 0x01, 0x00, 0x02, 0x00, 0x10, 0x00, 0x64, 0x61, 0x74, 0x61, 0x02, 0x00,
            0x00, 0x00,
        ];
        assert_eq!(wav.len(), 46);
        assert_eq!(&wav[..HEADER_LEN], &expected);
        assert_eq!(arena.used_bytes(), 46);
    }

    #[test]
    fn test_endpoints_hit_integer_extremes() {
        let mut arena = ScratchArena::new();
        let data = [1.0f32, -1.0, 3.5, -7.0, 0.0];
        let buf = AudioBuffer::new(&data, 1, 8000).unwrap();

        let wav = encode(&mut arena, &buf, BitDepth::Sixteen).unwrap();
        assert_eq!(payload_i16(wav), vec![i16::MAX, i16::MIN, i16::MAX, i16::MIN, 0]);

        let wav = encode(&mut arena, &buf, BitDepth::TwentyFour).unwrap();
        let payload = &wav[HEADER_LEN..];
        assert_eq!(&payload[0..3], &[0xFF, 0xFF, 0x7F]);
        assert_eq!(&payload[3..6], &[0x00, 0x00, 0x80]);
        assert_eq!(&payload[6..9], &[0xFF, 0xFF, 0x7F]);
        assert_eq!(&payload[9..12], &[0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_quantize_truncates_toward_zero() {
        assert_eq!(BitDepth::Sixteen.quantize(0.5), 16383);
        assert_eq!(BitDepth::Sixteen.quantize(-0.5), -16384);
        assert_eq!(BitDepth::Sixteen.quantize(f32::NAN), 0);
        assert_eq!(BitDepth::TwentyFour.quantize(-1.0), -8_388_608);
        assert_eq!(BitDepth::TwentyFour.quantize(1.0), 8_388_607);
    }

    #[test]
    fn test_24_bit_sign_extension() {
        assert_eq!(BitDepth::TwentyFour.read_sample(&[0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(BitDepth::TwentyFour.read_sample(&[0x00, 0x00, 0x80]), -8_388_608);
        assert_eq!(BitDepth::TwentyFour.read_sample(&[0xFF, 0xFF, 0x7F]), 8_388_607);
        assert_eq!(BitDepth::TwentyFour.dequantize(-8_388_608), -1.0);
        assert_eq!(BitDepth::TwentyFour.dequantize(8_388_607), 1.0);
    }

    #[test]
    fn test_mono_round_trip_16_bit() {
        let input = [0.0f32, 0.5, -0.5, 1.0];
        let wav = {
            let mut arena = ScratchArena::new();
            let buf = AudioBuffer::new(&input, 1, 44100).unwrap();
            encode(&mut arena, &buf, BitDepth::Sixteen).unwrap().to_vec()
        };

        let mut arena = ScratchArena::new();
        let decoded = decode(&mut arena, &wav).unwrap();
        assert_eq!(decoded.frames(), 4);
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.sample_rate(), 44100);
        for (a, b) in input.iter().zip(decoded.samples()) {
            assert_abs_diff_eq!(*a, *b, epsilon = tolerance(BitDepth::Sixteen));
        }
        assert_eq!(arena.used_bytes(), 16);
    }

    #[test]
    fn test_round_trip_24_bit() {
        let input: Vec<f32> = (0..64).map(|i| ((i as f32) * 0.37).sin() * 0.9).collect();
        let wav = {
            let mut arena = ScratchArena::new();
            let buf = AudioBuffer::new(&input, 2, 96000).unwrap();
            encode(&mut arena, &buf, BitDepth::TwentyFour).unwrap().to_vec()
        };
        assert_eq!(wav.len(), HEADER_LEN + 64 * 3);

        let mut arena = ScratchArena::new();
        let decoded = decode(&mut arena, &wav).unwrap();
        assert_eq!(decoded.frames(), 32);
        for (a, b) in input.iter().zip(decoded.samples()) {
            assert_abs_diff_eq!(*a, *b, epsilon = tolerance(BitDepth::TwentyFour));
        }
    }

    #[test]
    fn test_round_trip_error_bound_across_full_range() {
        let input: Vec<f32> = (0..=20_000)
            .map(|i| (i as f64 * 1e-4 - 1.0) as f32)
            .collect();
        let buf = AudioBuffer::new(&input, 1, 48000).unwrap();

        for bit_depth in [BitDepth::Sixteen, BitDepth::TwentyFour] {
            let wav = {
                let mut arena = ScratchArena::new();
                encode(&mut arena, &buf, bit_depth).unwrap().to_vec()
            };
            let mut arena = ScratchArena::new();
            let decoded = decode(&mut arena, &wav).unwrap();
            assert_eq!(decoded.frames(), input.len());

            let epsilon = tolerance(bit_depth);
            for (a, b) in input.iter().zip(decoded.samples()) {
                assert_abs_diff_eq!(*a, *b, epsilon = epsilon);
            }
        }
    }

    #[test]
    fn test_stereo_payload_is_interleaved() {
        // Planar: left = [0.25, 0.5, 0.75], right = [-0.25, -0.5, -0.75]
        let input = [0.25f32, 0.5, 0.75, -0.25, -0.5, -0.75];
        let mut arena = ScratchArena::new();
        let buf = AudioBuffer::new(&input, 2, 48000).unwrap();
        let wav = encode(&mut arena, &buf, BitDepth::Sixteen).unwrap().to_vec();

        let codes = payload_i16(&wav);
        let expected: Vec<i16> = [0.25f32, -0.25, 0.5, -0.5, 0.75, -0.75]
            .iter()
            .map(|&s| BitDepth::Sixteen.quantize(s) as i16)
            .collect();
        assert_eq!(codes, expected);

        let decoded = decode(&mut arena, &wav).unwrap();
        assert_eq!(decoded.frames(), 3);
        for (a, b) in decoded.channel(0).iter().zip(&input[..3]) {
            assert_abs_diff_eq!(*a, *b, epsilon = tolerance(BitDepth::Sixteen));
        }
        for (a, b) in decoded.channel(1).iter().zip(&input[3..]) {
            assert_abs_diff_eq!(*a, *b, epsilon = tolerance(BitDepth::Sixteen));
        }
    }

    #[test]
    fn test_encoded_file_reads_back_with_hound() {
        let input = [0.1f32, 0.2, 0.3, 0.4, -0.1, -0.2, -0.3, -0.4];
        let mut arena = ScratchArena::new();
        let buf = AudioBuffer::new(&input, 2, 22050).unwrap();
        let wav = encode(&mut arena, &buf, BitDepth::TwentyFour).unwrap().to_vec();

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 24);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i32> = reader.samples::<i32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 8);
        // First frame holds left then right
        assert_eq!(samples[0], BitDepth::TwentyFour.quantize(0.1));
        assert_eq!(samples[1], BitDepth::TwentyFour.quantize(-0.1));
    }

    #[test]
    fn test_decode_reads_hound_written_file() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for code in [0i16, 16384, -16384, i16::MAX, i16::MIN] {
                writer.write_sample(code).unwrap();
            }
            writer.finalize().unwrap();
        }

        let mut arena = ScratchArena::new();
        let decoded = decode(&mut arena, cursor.get_ref()).unwrap();
        assert_eq!(decoded.frames(), 5);
        assert_eq!(decoded.sample_rate(), 16000);
        assert_abs_diff_eq!(decoded.samples()[1], 16384.0 / 32767.0);
        assert_eq!(decoded.samples()[2], -0.5);
        assert_eq!(decoded.samples()[3], 1.0);
        assert_eq!(decoded.samples()[4], -1.0);
    }

    #[test]
    fn test_decode_rejects_invalid_headers() {
        let mut arena = ScratchArena::new();
        let data = [0.0f32; 2];
        let buf = AudioBuffer::new(&data, 1, 8000).unwrap();
        let good = encode(&mut arena, &buf, BitDepth::Sixteen).unwrap().to_vec();

        assert!(matches!(
            decode(&mut arena, &good[..40]),
            Err(AudioError::InvalidWav(_))
        ));

        let mut bad = good.clone();
        bad[0] = b'X';
        assert!(matches!(decode(&mut arena, &bad), Err(AudioError::InvalidWav(_))));

        let mut bad = good.clone();
        bad[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(decode(&mut arena, &bad), Err(AudioError::InvalidWav(_))));

        let mut bad = good.clone();
        bad[12..16].copy_from_slice(b"LIST");
        assert!(matches!(decode(&mut arena, &bad), Err(AudioError::InvalidWav(_))));

        let mut bad = good.clone();
        bad[34..36].copy_from_slice(&8u16.to_le_bytes());
        assert_eq!(decode(&mut arena, &bad), Err(AudioError::UnsupportedBitDepth(8)));

        let mut bad = good.clone();
        bad[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(decode(&mut arena, &bad), Err(AudioError::UnsupportedAudioFormat(3)));

        let mut bad = good.clone();
        bad[22..24].copy_from_slice(&0u16.to_le_bytes());
        assert!(matches!(decode(&mut arena, &bad), Err(AudioError::InvalidWav(_))));
    }

    #[test]
    fn test_decode_bounds_payload_to_supplied_bytes() {
        let mut arena = ScratchArena::new();
        let data = [0.5f32; 4];
        let buf = AudioBuffer::new(&data, 1, 8000).unwrap();
        let mut wav = encode(&mut arena, &buf, BitDepth::Sixteen).unwrap().to_vec();

        // Header claims more data than is present
        wav[40..44].copy_from_slice(&1000u32.to_le_bytes());
        let decoded = decode(&mut arena, &wav).unwrap();
        assert_eq!(decoded.frames(), 4);

        // Trailing partial frame is dropped
        let mut truncated = wav.clone();
        truncated.truncate(HEADER_LEN + 3);
        let decoded = decode(&mut arena, &truncated).unwrap();
        assert_eq!(decoded.frames(), 1);
    }

    #[test]
    fn test_empty_buffer_encodes_header_only() {
        let mut arena = ScratchArena::new();
        let buf = AudioBuffer::new(&[], 2, 48000).unwrap();
        let wav = encode(&mut arena, &buf, BitDepth::Sixteen).unwrap().to_vec();
        assert_eq!(wav.len(), HEADER_LEN);

        let decoded = decode(&mut arena, &wav).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.channels(), 2);
    }

    #[test]
    fn test_bit_depth_conversion() {
        assert_eq!(BitDepth::try_from(16), Ok(BitDepth::Sixteen));
        assert_eq!(BitDepth::try_from(24), Ok(BitDepth::TwentyFour));
        assert_eq!(BitDepth::try_from(32), Err(AudioError::UnsupportedBitDepth(32)));
    }
}
