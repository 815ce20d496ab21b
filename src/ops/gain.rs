// In-place gain with hard clipping.

use crate::audio_buffer::AudioBufferMut;

/// Multiply every sample by `volume`, then clamp to `[-1, 1]`.
pub fn adjust_volume(buffer: &mut AudioBufferMut<'_>, volume: f32) {
    for sample in buffer.samples_mut() {
        *sample = (*sample * volume).clamp(-1.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gain_saturates() {
        let mut data = [0.3, -0.4];
        let mut buffer = AudioBufferMut::new(&mut data, 1, 44100).unwrap();
        adjust_volume(&mut buffer, 5.0);
        assert_eq!(data, [1.0, -1.0]);
    }

    #[test]
    fn test_large_gain_stays_in_range() {
        let mut data: Vec<f32> = (0..256).map(|i| ((i as f32) * 0.1).sin() * 0.8).collect();
        let mut buffer = AudioBufferMut::new(&mut data, 2, 48000).unwrap();
        adjust_volume(&mut buffer, 10.0);
        assert!(data.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_attenuation() {
        let mut data = [0.5, -0.25, 0.0, 1.0];
        let mut buffer = AudioBufferMut::new(&mut data, 2, 48000).unwrap();
        adjust_volume(&mut buffer, 0.5);
        assert_abs_diff_eq!(data[0], 0.25);
        assert_abs_diff_eq!(data[1], -0.125);
        assert_abs_diff_eq!(data[2], 0.0);
        assert_abs_diff_eq!(data[3], 0.5);
    }
}
