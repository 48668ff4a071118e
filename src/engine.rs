use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::audio::{NullAudio, ToneSink, Waveform};
use crate::config::Config;
use crate::error::Error;
use crate::font::{ActiveFont, Font, FontError, FontSpec};
use crate::frame_loop::{FrameLoop, FrameTicket};
use crate::framebuffer::Framebuffer;
use crate::input::{Button, Buttons, HeldKeys, InputState, KeySet};
use crate::palette::Palette;
use crate::present::{Presenter, Surface};
use crate::sprite::{self, DEFAULT_SHEET, ImageInfo, RgbaImage, SpriteSheets, SpriteSource};
use crate::startup::Splash;

/// Per-frame game logic. Receives the engine, the current held-key view and
/// the time since the previous frame. It draws and calls `present` itself.
pub type UpdateFn<S> = Box<dyn FnMut(&mut Engine<S>, &dyn HeldKeys, Duration) -> Result<(), Error>>;

/// One presentation context: framebuffer, palette, font, sprite sheets,
/// input aggregation and the frame loop, bound to a host surface.
pub struct Engine<S: Surface> {
    config: Config,
    fb: Framebuffer,
    palette: Palette,
    font: ActiveFont,
    sheets: SpriteSheets,
    presenter: Presenter,
    surface: S,
    input: InputState,
    frames: FrameLoop,
    splash: Option<Splash>,
    audio: Box<dyn ToneSink>,
    update: Option<UpdateFn<S>>,
    container: Option<(u32, u32)>,
}

impl<S: Surface> Engine<S> {
    pub fn new(config: Config, surface: S) -> Result<Self, Error> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::InvalidSize {
                width: config.width,
                height: config.height,
            });
        }

        log::info!(
            "engine initialised at {}x{} ({:?})",
            config.width,
            config.height,
            config.mode
        );

        Ok(Engine {
            fb: Framebuffer::new(config.width, config.height, config.mode),
            splash: config.show_startup.then(Splash::new),
            config,
            palette: Palette::default(),
            font: ActiveFont::default(),
            sheets: SpriteSheets::new(),
            presenter: Presenter::new(),
            surface,
            input: InputState::new(),
            frames: FrameLoop::new(),
            audio: Box::new(NullAudio),
            update: None,
            container: None,
        })
    }

    /// Like `new`, but sizes expandable axes to the host container (in
    /// logical pixels) straight away.
    pub fn with_container(
        config: Config,
        surface: S,
        container: (u32, u32),
    ) -> Result<Self, Error> {
        let mut engine = Engine::new(config, surface)?;
        engine.container = Some(container);
        let (width, height) = engine.config.internal_resolution(container);
        engine.resize(width, height);
        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn get_screen_size(&self) -> (u32, u32) {
        self.fb.size()
    }

    // Drawing

    pub fn clear(&mut self, color: u32) {
        self.fb.clear(color);
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        self.fb.set_pixel(x, y, color);
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.fb.draw_rect(x, y, w, h, color);
    }

    /// Blits from `sheet`, or from the `"default"` sheet when `None`. An
    /// unregistered sheet draws nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn blit_sub(
        &mut self,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        dx: i32,
        dy: i32,
        sheet: Option<&str>,
    ) {
        let name = sheet.unwrap_or(DEFAULT_SHEET);
        let Some(source) = self.sheets.get(name) else {
            log::trace!("blit from unregistered sheet {name:?} ignored");
            return;
        };
        sprite::blit_sub(&mut self.fb, source.as_ref(), sx, sy, sw, sh, dx, dy);
    }

    pub fn draw_char(&mut self, ch: char, x: i32, y: i32, color: u32) {
        self.font.get().draw_char(&mut self.fb, ch, x, y, color);
    }

    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, color: u32) {
        self.font.get().draw_text(&mut self.fb, text, x, y, color);
    }

    pub fn font(&self) -> &Font {
        self.font.get()
    }

    /// Replaces the font. A malformed description is reported and the current
    /// font stays in place.
    pub fn set_font(&mut self, spec: FontSpec) -> Result<(), FontError> {
        match Font::try_from(spec) {
            Ok(font) => {
                log::debug!("font set: {}x{} spacing {}", font.width, font.height, font.spacing);
                self.font = ActiveFont::Custom(font);
                Ok(())
            }
            Err(err) => {
                log::warn!("rejected font: {err}");
                Err(err)
            }
        }
    }

    pub fn reset_font(&mut self) {
        self.font = ActiveFont::Default;
    }

    pub fn set_palette_entry(&mut self, index: usize, r: u8, g: u8, b: u8) -> Result<(), Error> {
        self.palette.set_entry(index, r, g, b).inspect_err(|err| {
            log::warn!("{err}");
        })
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Uploads the whole framebuffer and draws it.
    pub fn present(&mut self) -> Result<(), Error> {
        self.presenter
            .present(&self.fb, &self.palette, &mut self.surface)
    }

    // Sizing

    /// Reallocates the framebuffer (zeroed) when the size changes.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.fb.resize(width, height)
    }

    /// Host container changed: `container` is in logical pixels and picks
    /// the internal resolution, `physical` is forwarded to the surface.
    pub fn handle_container_resize(
        &mut self,
        container: (u32, u32),
        physical: (u32, u32),
    ) -> Result<(), Error> {
        self.container = Some(container);
        let (width, height) = self.config.internal_resolution(container);
        if self.resize(width, height) {
            log::info!("internal resolution now {width}x{height}");
        }
        self.surface.resize_viewport(physical.0, physical.1)
    }

    // Sprite sheets

    pub fn register_sheet(&mut self, name: impl Into<String>, source: Rc<dyn SpriteSource>) {
        self.sheets.register(name, source);
    }

    pub fn load_sheet<P: AsRef<Path>>(&mut self, name: impl Into<String>, path: P) -> Result<(), Error> {
        let image = RgbaImage::load_png(path)?;
        self.sheets.register(name, Rc::new(image));
        Ok(())
    }

    pub fn remove_sheet(&mut self, name: &str) -> bool {
        self.sheets.remove(name).is_some()
    }

    pub fn image_info(&self, name: &str) -> Option<ImageInfo> {
        let info = self.sheets.image_info(name);
        if info.is_none() {
            log::warn!("no sprite sheet named {name:?}");
        }
        info
    }

    // Input

    pub fn get_button_state(&self, player: usize, keys: &dyn HeldKeys) -> Buttons {
        self.input.button_state(player, keys)
    }

    pub fn set_simulated_button(&mut self, player: usize, button: Button, pressed: bool) {
        self.input.set_simulated_button(player, button, pressed);
    }

    pub fn set_key_mapping(&mut self, player: usize, button: Button, keys: impl Into<KeySet>) {
        self.input.set_key_mapping(player, button, keys);
    }

    // Audio

    pub fn set_audio(&mut self, audio: Box<dyn ToneSink>) {
        self.audio = audio;
    }

    pub fn channel_set(&mut self, channel: usize, frequency: f32, waveform: Waveform, duration: Duration) {
        self.audio.channel_set(channel, frequency, waveform, duration);
    }

    // Frame loop

    pub fn is_running(&self) -> bool {
        self.frames.is_running()
    }

    pub fn splash_active(&self) -> bool {
        self.splash.is_some()
    }

    /// Installs the update function and starts the loop if it is idle.
    pub fn set_update<F>(&mut self, update: F, now: Instant)
    where
        F: FnMut(&mut Engine<S>, &dyn HeldKeys, Duration) -> Result<(), Error> + 'static,
    {
        self.update = Some(Box::new(update));
        self.start(now);
    }

    pub fn start(&mut self, now: Instant) {
        if self.frames.start(now) {
            log::debug!("frame loop started (generation {})", self.frames.generation());
        }
    }

    pub fn stop(&mut self) {
        self.frames.stop();
    }

    /// Ticket for the next host refresh.
    pub fn schedule_frame(&self) -> FrameTicket {
        self.frames.schedule()
    }

    /// Runs one frame for `ticket`. Returns `false` when the ticket is stale
    /// or the loop is stopped; the host should then stop re-arming.
    ///
    /// While the startup splash is up it takes the whole frame; any button
    /// held by player 0 or 1 dismisses it. Afterwards the update function
    /// runs instead.
    pub fn frame(&mut self, ticket: FrameTicket, now: Instant, keys: &dyn HeldKeys) -> Result<bool, Error> {
        let Some(delta) = self.frames.tick(ticket, now) else {
            return Ok(false);
        };

        if let Some(splash) = self.splash.as_mut() {
            let held = self.input.button_state(0, keys) | self.input.button_state(1, keys);
            if held.is_empty() {
                splash.render(&mut self.fb, self.font.get(), delta, self.audio.as_mut());
            } else {
                log::debug!("startup splash skipped");
                splash.skip();
            }

            if splash.is_active() {
                self.present()?;
            } else {
                self.splash = None;
            }
            return Ok(true);
        }

        if let Some(mut update) = self.update.take() {
            let result = update(self, keys, delta);
            // The callback may have installed a replacement.
            if self.update.is_none() {
                self.update = Some(update);
            }
            result?;
        }
        Ok(true)
    }

    /// Stops the loop and orphans pending tickets. Every tone channel is
    /// silenced; sprite sheets, simulated input and the update function are
    /// dropped.
    pub fn teardown(&mut self) {
        self.frames.invalidate();
        self.audio.stop_all();
        self.sheets.clear();
        self.input.clear_simulated();
        self.splash = None;
        self.update = None;
        log::info!("engine torn down (generation {})", self.frames.generation());
    }

    /// Tears down and rebuilds the framebuffer for `config`, sized against
    /// the last known container. Palette and font go back to their defaults.
    /// The update function survives and the loop restarts if there was one.
    pub fn reinit(&mut self, config: Config, now: Instant) -> Result<(), Error> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::InvalidSize {
                width: config.width,
                height: config.height,
            });
        }

        let update = self.update.take();
        self.teardown();

        let (width, height) = match self.container {
            Some(container) => config.internal_resolution(container),
            None => config.min_size(),
        };
        self.fb = Framebuffer::new(width, height, config.mode);
        self.palette = Palette::default();
        self.font = ActiveFont::Default;
        self.splash = config.show_startup.then(Splash::new);
        self.config = config;
        self.update = update;
        if self.update.is_some() {
            self.start(now);
        }

        log::info!("engine reinitialised at {width}x{height}");
        Ok(())
    }
}
