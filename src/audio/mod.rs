mod voice;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use crate::error::Error;

pub use voice::{Mixer, VOICE_GAIN, Voice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Noise,
}

/// Destination for tone-channel requests. The engine only forwards them.
pub trait ToneSink {
    /// Starts `waveform` at `frequency` Hz on `channel`, replacing what was
    /// playing there. Zero frequency stops the channel; a zero duration
    /// sustains until replaced.
    fn channel_set(&mut self, channel: usize, frequency: f32, waveform: Waveform, duration: Duration);

    /// Silences every channel, sustained ones included.
    fn stop_all(&mut self);
}

/// Discards every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl ToneSink for NullAudio {
    fn channel_set(&mut self, _channel: usize, _frequency: f32, _waveform: Waveform, _duration: Duration) {}

    fn stop_all(&mut self) {}
}

/// Plays tone channels on the default output device.
pub struct CpalAudio {
    mixer: Arc<Mutex<Mixer>>,
    _stream: cpal::Stream,
}

impl CpalAudio {
    pub fn new() -> Result<Self, Error> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".to_string()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| Error::Audio(e.to_string()))?;

        let config = supported.config();
        let mixer = Arc::new(Mutex::new(Mixer::new(config.sample_rate.0)));

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer.clone()),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer.clone()),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer.clone()),
            other => Err(Error::Audio(format!("unsupported sample format {other:?}"))),
        }?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        log::info!(
            "audio output at {} Hz, {} channel(s)",
            config.sample_rate.0,
            config.channels
        );

        Ok(CpalAudio {
            mixer,
            _stream: stream,
        })
    }
}

/// Opens the default device, falling back to silence when there is none.
pub fn open_default() -> Box<dyn ToneSink> {
    match CpalAudio::new() {
        Ok(audio) => Box::new(audio),
        Err(err) => {
            log::warn!("{err}; continuing without sound");
            Box::new(NullAudio)
        }
    }
}

impl ToneSink for CpalAudio {
    fn channel_set(&mut self, channel: usize, frequency: f32, waveform: Waveform, duration: Duration) {
        let mut mixer = self.mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        mixer.set(channel, frequency, waveform, duration);
    }

    fn stop_all(&mut self) {
        let mut mixer = self.mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        mixer.stop_all();
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
) -> Result<cpal::Stream, Error>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut mixer = mixer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(mixer.next_sample());
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))
}
