use std::f64::consts::{PI, TAU};
use std::time::Duration;

use crate::audio::{ToneSink, Waveform};
use crate::font::Font;
use crate::framebuffer::Framebuffer;

const ANIMATION_MS: f64 = 3000.0;
const FADE_MS: f64 = 800.0;

const PARTICLES: usize = 20;
const TEXT_CLEARANCE: f64 = 35.0;

const TITLE: [char; 6] = ['P', 'I', 'X', 'B', 'O', 'X'];
const TITLE_SPACING: f64 = 20.0;
const TITLE_COLORS: [u32; 6] = [0xFF0080, 0x00FF80, 0x8000FF, 0xFF8000, 0x00C0FF, 0xFFE000];
const SUBTITLE: &str = "GAME LIBRARY";

struct Note {
    at_ms: f64,
    channel: usize,
    frequency: f32,
    length: Duration,
}

// C major arpeggio, then a high C.
const CHIME: [Note; 4] = [
    Note { at_ms: 0.0, channel: 0, frequency: 523.0, length: Duration::from_millis(400) },
    Note { at_ms: 100.0, channel: 1, frequency: 659.0, length: Duration::from_millis(400) },
    Note { at_ms: 200.0, channel: 2, frequency: 784.0, length: Duration::from_millis(400) },
    Note { at_ms: 800.0, channel: 0, frequency: 1047.0, length: Duration::from_millis(600) },
];

/// HSL to packed `0xRRGGBB`. `hue` in degrees, `saturation` and
/// `lightness` in `0.0..=1.0`.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> u32 {
    let a = saturation * lightness.min(1.0 - lightness);
    let channel = |n: f64| {
        let k = (n + hue.rem_euclid(360.0) / 30.0) % 12.0;
        let v = lightness - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (v * 255.0).floor().clamp(0.0, 255.0) as u32
    };
    (channel(0.0) << 16) | (channel(8.0) << 8) | channel(4.0)
}

fn background_color(elapsed_ms: f64) -> u32 {
    let base = 16u32;
    let variation = ((elapsed_ms * 0.001).sin() * 8.0 + 8.0).floor() as u32;
    (base << 16) | ((base + variation) << 8) | (base * 3)
}

/// The boot splash: orbiting particles, a cascading title and a subtitle,
/// followed by a fade to black.
#[derive(Debug, Clone)]
pub struct Splash {
    active: bool,
    elapsed_ms: f64,
    fade_ms: Option<f64>,
    notes_played: usize,
}

impl Default for Splash {
    fn default() -> Self {
        Splash::new()
    }
}

impl Splash {
    pub fn new() -> Self {
        Splash {
            active: true,
            elapsed_ms: 0.0,
            fade_ms: None,
            notes_played: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_fading(&self) -> bool {
        self.fade_ms.is_some()
    }

    pub fn skip(&mut self) {
        self.active = false;
        self.fade_ms = None;
    }

    /// Advances by `delta` and draws the frame for the new time.
    pub fn render(
        &mut self,
        fb: &mut Framebuffer,
        font: &Font,
        delta: Duration,
        audio: &mut dyn ToneSink,
    ) {
        if !self.active {
            return;
        }
        let delta_ms = delta.as_secs_f64() * 1000.0;
        self.elapsed_ms += delta_ms;
        self.play_due_notes(audio);

        let t = self.elapsed_ms;
        let progress = t / ANIMATION_MS;

        fb.clear(background_color(t));
        draw_particles(fb, t);
        draw_title(fb, font, progress);

        if progress >= 1.0 && self.fade_ms.is_none() {
            self.fade_ms = Some(0.0);
        }

        if let Some(fade_ms) = self.fade_ms.as_mut() {
            *fade_ms += delta_ms;
            let fade_progress = *fade_ms / FADE_MS;
            if fade_progress >= 1.0 {
                self.skip();
            } else {
                // The scene above was drawn from scratch this frame, so the
                // factor applies once and the fade stays linear in time.
                fb.darken(1.0 - fade_progress);
            }
        }
    }

    fn play_due_notes(&mut self, audio: &mut dyn ToneSink) {
        while let Some(note) = CHIME.get(self.notes_played) {
            if note.at_ms > self.elapsed_ms {
                break;
            }
            audio.channel_set(note.channel, note.frequency, Waveform::Sine, note.length);
            self.notes_played += 1;
        }
    }
}

fn draw_particles(fb: &mut Framebuffer, t: f64) {
    let cx = fb.width() as f64 / 2.0;
    let cy = fb.height() as f64 / 2.0;

    for i in 0..PARTICLES {
        let fi = i as f64;
        let angle = (t * 0.002 + fi * 0.314) % TAU;
        let base_radius = if i % 2 == 0 { 80.0 } else { 25.0 };
        let radius = base_radius + (t * 0.003 + fi).sin() * 10.0;

        let x = cx + angle.cos() * radius;
        let y = cy + angle.sin() * radius;
        if (x - cx).hypot(y - cy) <= TEXT_CLEARANCE {
            continue;
        }

        let size = 2.0 + (t * 0.004 + fi).sin() * 1.5;
        let hue = (fi * 45.0 + t * 0.08) % 360.0;
        fb.draw_rect(
            x.floor() as i32,
            y.floor() as i32,
            size.floor() as i32,
            size.floor() as i32,
            hsl_to_rgb(hue, 0.7, 0.5),
        );
    }
}

fn draw_title(fb: &mut Framebuffer, font: &Font, progress: f64) {
    let text_progress = ((progress - 0.1) * 2.0).max(0.0);
    if text_progress <= 0.0 {
        return;
    }

    let cx = fb.width() as f64 / 2.0;
    let cy = fb.height() as f64 / 2.0;
    let start_x = cx - (TITLE.len() as f64 * TITLE_SPACING) / 2.0;

    for (index, (&letter, &color)) in TITLE.iter().zip(TITLE_COLORS.iter()).enumerate() {
        let letter_progress = (text_progress * 6.0 - index as f64 * 0.8).clamp(0.0, 1.0);
        if letter_progress <= 0.0 {
            continue;
        }

        let bounce = (letter_progress * PI).sin() * 15.0;
        let y = (cy - 20.0) - (1.0 - letter_progress) * 60.0 + bounce;
        let x = start_x + index as f64 * TITLE_SPACING;

        // Smear the glyph over a 1x1..2x2 block as it settles.
        let repeat = ((0.5 + letter_progress * 0.5) * 2.0).ceil() as i32;
        for sx in 0..repeat {
            for sy in 0..repeat {
                font.draw_char(
                    fb,
                    letter,
                    (x + sx as f64).floor() as i32,
                    (y + sy as f64).floor() as i32,
                    color,
                );
            }
        }
    }

    if text_progress > 0.7 {
        let subtitle_progress = ((text_progress - 0.7) / 0.3).min(1.0);
        let intensity = (subtitle_progress * 255.0).floor() as u32;
        let gray = (intensity << 16) | (intensity << 8) | intensity;
        font.draw_text(fb, SUBTITLE, cx as i32 - 44, cy as i32 + 20, gray);
    }
}
