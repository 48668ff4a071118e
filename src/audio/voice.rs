use std::collections::HashMap;
use std::f32::consts::TAU;
use std::time::Duration;

use super::Waveform;

pub const VOICE_GAIN: f32 = 0.1;

/// One tone channel: an oscillator (or LFSR noise source) with an optional
/// sample budget after which it falls silent.
#[derive(Debug, Clone)]
pub struct Voice {
    frequency: f32,
    waveform: Waveform,
    phase: f32,
    remaining: Option<u64>,

    shift_register: u16,
    lowpass_alpha: f32,
    lowpass_out: f32,
}

impl Voice {
    pub fn new(sample_rate: f32, frequency: f32, waveform: Waveform, duration: Duration) -> Self {
        let remaining = if duration.is_zero() {
            None
        } else {
            Some((duration.as_secs_f64() * sample_rate as f64).round() as u64)
        };

        // One-pole low-pass at four times the requested frequency shapes the
        // noise into a drum-like hiss.
        let cutoff = frequency * 4.0;
        let rc = 1.0 / (TAU * cutoff);
        let dt = 1.0 / sample_rate;

        Voice {
            frequency,
            waveform,
            phase: 0.0,
            remaining,
            shift_register: 1,
            lowpass_alpha: dt / (rc + dt),
            lowpass_out: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == Some(0)
    }

    fn clock_noise(&mut self) -> f32 {
        let feedback = (self.shift_register & 0b1) ^ ((self.shift_register >> 1) & 0b1);
        self.shift_register >>= 1;
        self.shift_register |= feedback << 14;
        if self.shift_register & 0b1 == 1 { 1.0 } else { -1.0 }
    }

    /// Next raw sample in `-1.0..=1.0`, before gain.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return 0.0;
            }
            *remaining -= 1;
        }

        let value = match self.waveform {
            Waveform::Sine => (self.phase * TAU).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Triangle => 4.0 * (self.phase - 0.5).abs() - 1.0,
            Waveform::Noise => {
                let white = self.clock_noise();
                self.lowpass_out += self.lowpass_alpha * (white - self.lowpass_out);
                self.lowpass_out
            }
        };

        self.phase = (self.phase + self.frequency / sample_rate).fract();
        value
    }
}

/// Sums every active voice into a mono sample stream.
#[derive(Debug, Clone)]
pub struct Mixer {
    sample_rate: f32,
    voices: HashMap<usize, Voice>,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Mixer {
            sample_rate: sample_rate.max(1) as f32,
            voices: HashMap::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate as u32
    }

    /// Replaces whatever `channel` was playing. A frequency of zero (or
    /// below) just stops it.
    pub fn set(&mut self, channel: usize, frequency: f32, waveform: Waveform, duration: Duration) {
        if frequency <= 0.0 {
            self.voices.remove(&channel);
            return;
        }
        let voice = Voice::new(self.sample_rate, frequency, waveform, duration);
        self.voices.insert(channel, voice);
    }

    pub fn stop_all(&mut self) {
        self.voices.clear();
    }

    pub fn active_channels(&self) -> usize {
        self.voices.len()
    }

    pub fn next_sample(&mut self) -> f32 {
        let sample_rate = self.sample_rate;
        let mut mixed = 0.0;
        for voice in self.voices.values_mut() {
            mixed += voice.next_sample(sample_rate) * VOICE_GAIN;
        }
        self.voices.retain(|_, voice| !voice.is_finished());
        mixed.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_square_wave_alternates_each_half_period() {
        // 4 samples per period
        let mut voice = Voice::new(400.0, 100.0, Waveform::Square, Duration::ZERO);
        let samples: Vec<f32> = (0..4).map(|_| voice.next_sample(400.0)).collect();
        assert_eq!(samples, vec![1.0, 1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_duration_limits_sample_count() {
        let mut mixer = Mixer::new(1000);
        mixer.set(0, 250.0, Waveform::Square, Duration::from_millis(3));
        assert_eq!(mixer.active_channels(), 1);

        let samples: Vec<f32> = (0..5).map(|_| mixer.next_sample()).collect();
        assert_eq!(samples[0], VOICE_GAIN);
        assert_eq!(samples[3], 0.0);
        assert_eq!(samples[4], 0.0);
        assert_eq!(mixer.active_channels(), 0);
    }

    #[test]
    fn test_zero_frequency_stops_channel() {
        let mut mixer = Mixer::new(44_100);
        mixer.set(2, 440.0, Waveform::Sine, Duration::ZERO);
        mixer.set(3, 220.0, Waveform::Triangle, Duration::ZERO);
        mixer.set(2, 0.0, Waveform::Sine, Duration::ZERO);
        assert_eq!(mixer.active_channels(), 1);
    }

    #[test]
    fn test_stop_all_silences_sustained_voices() {
        let mut mixer = Mixer::new(8_000);
        mixer.set(0, 440.0, Waveform::Sine, Duration::ZERO);
        mixer.set(4, 110.0, Waveform::Noise, Duration::ZERO);
        mixer.stop_all();

        assert_eq!(mixer.active_channels(), 0);
        assert_eq!(mixer.next_sample(), 0.0);
    }

    #[test]
    fn test_noise_stays_in_range_and_varies() {
        let mut voice = Voice::new(44_100.0, 2_000.0, Waveform::Noise, Duration::ZERO);
        let samples: Vec<f32> = (0..512).map(|_| voice.next_sample(44_100.0)).collect();
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(samples.iter().any(|&s| s > 0.0));
        assert!(samples.iter().any(|&s| s < 0.0));
    }

    #[test]
    fn test_mixer_is_silent_without_voices() {
        let mut mixer = Mixer::new(48_000);
        assert_eq!(mixer.next_sample(), 0.0);
    }
}
