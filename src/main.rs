#![deny(clippy::all)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use error_iter::ErrorIter as _;
use log::error;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::KeyCode;
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

use pixbox::audio::{self, Waveform};
use pixbox::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use pixbox::input::{Buttons, HeldKeys};
use pixbox::present::PixelsSurface;
use pixbox::sprite::DEFAULT_SHEET;
use pixbox::{ColorMode, Config, Engine, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Palette,
    Truecolor,
}

impl From<ModeArg> for ColorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Palette => ColorMode::Palette,
            ModeArg::Truecolor => ColorMode::Truecolor,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Retro framebuffer playground")]
struct Args {
    /// Minimum internal width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Minimum internal height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    #[arg(long, value_enum, default_value_t = ModeArg::Truecolor)]
    mode: ModeArg,

    /// Grow the internal width to fill the window
    #[arg(long)]
    expand_width: bool,

    /// Grow the internal height to fill the window
    #[arg(long)]
    expand_height: bool,

    /// Skip the startup splash
    #[arg(long)]
    no_startup: bool,

    /// Window pixels per framebuffer pixel
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=16))]
    scale: u32,

    /// Run without opening an audio device
    #[arg(long)]
    mute: bool,

    /// Register a PNG sprite sheet, e.g. --sheet default=sprites.png
    #[arg(long = "sheet", value_name = "NAME=PATH", value_parser = parse_sheet)]
    sheets: Vec<(String, PathBuf)>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            width: self.width,
            height: self.height,
            mode: self.mode.into(),
            expandable_width: self.expand_width,
            expandable_height: self.expand_height,
            show_startup: !self.no_startup,
        }
    }
}

fn parse_sheet(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got {arg:?}")),
    }
}

const SPEED: f32 = 90.0;
const SIZE: u32 = 16;

struct Colors {
    background: u32,
    player: u32,
    text: u32,
}

/// Moves a square (or the first 16x16 cell of the default sheet) around with
/// player 0's buttons.
struct Demo {
    x: f32,
    y: f32,
    colors: Colors,
    sprite: bool,
    beeping: bool,
}

impl Demo {
    fn new(engine: &mut Engine<PixelsSurface>) -> Result<Self, Error> {
        let colors = match engine.config().mode {
            ColorMode::Truecolor => Colors {
                background: 0x1D2B53,
                player: 0xFF004D,
                text: 0xFFF1E8,
            },
            ColorMode::Palette => {
                engine.set_palette_entry(1, 0x1D, 0x2B, 0x53)?;
                engine.set_palette_entry(2, 0xFF, 0x00, 0x4D)?;
                engine.set_palette_entry(3, 0xFF, 0xF1, 0xE8)?;
                Colors {
                    background: 1,
                    player: 2,
                    text: 3,
                }
            }
        };
        let (width, height) = engine.get_screen_size();
        Ok(Demo {
            x: (width / 2) as f32,
            y: (height / 2) as f32,
            colors,
            sprite: engine.image_info(DEFAULT_SHEET).is_some(),
            beeping: false,
        })
    }

    fn update(
        &mut self,
        engine: &mut Engine<PixelsSurface>,
        keys: &dyn HeldKeys,
        delta: Duration,
    ) -> Result<(), Error> {
        let buttons = engine.get_button_state(0, keys);
        let step = SPEED * delta.as_secs_f32();
        if buttons.contains(Buttons::LEFT) {
            self.x -= step;
        }
        if buttons.contains(Buttons::RIGHT) {
            self.x += step;
        }
        if buttons.contains(Buttons::UP) {
            self.y -= step;
        }
        if buttons.contains(Buttons::DOWN) {
            self.y += step;
        }

        let (width, height) = engine.get_screen_size();
        self.x = self.x.clamp(0.0, width.saturating_sub(SIZE) as f32);
        self.y = self.y.clamp(0.0, height.saturating_sub(SIZE) as f32);

        let beep = buttons.contains(Buttons::A);
        if beep && !self.beeping {
            engine.channel_set(0, 880.0, Waveform::Square, Duration::from_millis(80));
        }
        self.beeping = beep;

        let (x, y) = (self.x as i32, self.y as i32);
        engine.clear(self.colors.background);
        if self.sprite {
            engine.blit_sub(0, 0, SIZE as i32, SIZE as i32, x, y, None);
        } else {
            engine.draw_rect(x, y, SIZE as i32, SIZE as i32, self.colors.player);
        }
        engine.draw_text(
            &format!("BUTTONS {:08b}", buttons.bits()),
            4,
            4,
            self.colors.text,
        );
        engine.draw_text(
            "ARROWS MOVE\nZ BEEPS",
            4,
            height as i32 - 20,
            self.colors.text,
        );
        engine.present()
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config();

    let event_loop = EventLoop::new()?;
    let mut input = WinitInputHelper::new();
    let window = {
        let min = LogicalSize::new(config.width as f64, config.height as f64);
        let size = LogicalSize::new(
            config.width as f64 * args.scale as f64,
            config.height as f64 * args.scale as f64,
        );
        Arc::new(
            WindowBuilder::new()
                .with_title("pixbox")
                .with_inner_size(size)
                .with_min_inner_size(min)
                .build(&event_loop)?,
        )
    };

    let container = container_size(window.inner_size(), window.scale_factor(), args.scale);
    let (width, height) = config.internal_resolution(container);
    let surface = PixelsSurface::new(window.clone(), width, height)?;
    let mut engine = Engine::with_container(config, surface, container)?;
    if !args.mute {
        engine.set_audio(audio::open_default());
    }
    for (name, path) in &args.sheets {
        if let Err(err) = engine.load_sheet(name.as_str(), path) {
            log_error("load_sheet", err);
        }
    }

    let mut demo = Demo::new(&mut engine)?;
    engine.set_update(
        move |engine, keys, delta| demo.update(engine, keys, delta),
        Instant::now(),
    );
    let mut pending = Some(engine.schedule_frame());

    let res = event_loop.run(|event, elwt| {
        // Draw the current frame
        if let Event::WindowEvent {
            event: WindowEvent::RedrawRequested,
            ..
        } = event
        {
            if let Some(ticket) = pending.take() {
                match engine.frame(ticket, Instant::now(), &input) {
                    Ok(true) => pending = Some(engine.schedule_frame()),
                    Ok(false) => log::debug!("frame loop idle"),
                    Err(err) => {
                        log_error("engine.frame", err);
                        elwt.exit();
                        return;
                    }
                }
            }
        }

        // Handle input events
        if input.update(&event) {
            if input.key_pressed(KeyCode::Escape) || input.close_requested() {
                elwt.exit();
                return;
            }

            if let Some(size) = input.window_resized() {
                let container = container_size(size, window.scale_factor(), args.scale);
                if let Err(err) =
                    engine.handle_container_resize(container, (size.width, size.height))
                {
                    log_error("engine.handle_container_resize", err);
                    elwt.exit();
                    return;
                }
            }

            window.request_redraw();
        }
    });

    engine.teardown();
    res.map_err(Error::from)
}

/// Window size in framebuffer pixels at the chosen `--scale`.
fn container_size(size: PhysicalSize<u32>, scale_factor: f64, scale: u32) -> (u32, u32) {
    let logical = size.to_logical::<f64>(scale_factor);
    (
        (logical.width / scale as f64) as u32,
        (logical.height / scale as f64) as u32,
    )
}

fn log_error<E: std::error::Error + 'static>(method_name: &str, err: E) {
    error!("{method_name}() failed: {err}");
    for source in err.sources().skip(1) {
        error!("  Caused by: {source}");
    }
}
