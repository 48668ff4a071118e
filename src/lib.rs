pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod font;
pub mod frame_loop;
pub mod framebuffer;
pub mod input;
pub mod palette;
pub mod present;
pub mod sprite;
pub mod startup;

extern crate bitflags;

pub use config::{ColorMode, Config};
pub use engine::Engine;
pub use error::Error;
