// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! `hackymod` renders a Hacky Module (HM) tracker file into an interleaved stereo stream
//! of floating-point audio frames at a caller-chosen output rate.
//!
//! Given a module's bytes — pattern data, PCM/Ogg-Vorbis samples, and instrument/envelope
//! metadata — [`Context::create`] parses it once at load time; [`Context::render`] and
//! [`Context::mixdown`] then pull correctly pitched, enveloped, panned, and mixed audio
//! out synchronously, one frame or one buffer at a time. There is no internal queue, no
//! suspension point, and no allocation on the render path: everything is allocated while
//! loading the module.
//!
//! Ogg-Vorbis sample payloads are decoded through the `vorbis` feature (on by default),
//! backed by the pure-Rust `lewton` decoder; a build without it fails to load any sample
//! whose `ogg` flag is set.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod channel;
mod command;
mod context;
mod io;
mod module;
mod ramp;
mod sample;
mod trill;
mod vorbis;

pub mod error;

pub use context::Context;
pub use error::{Error, Result};

/// Per-semitone ratio step (≈ 2^(1/12) − 1) used by the repeated-multiply pitch model
/// (spec §4.6 step 3).
pub const FREQUENCY_MULTIPLIER: f32 = 0.05946;

/// Upper bound on a module's channel count; `Context::create` rejects modules declaring
/// more.
pub const MAX_CHANNELS: usize = 32;

/// Maximum length, including the terminating NUL, of a module's ASCII name.
pub const MODULE_NAME_LENGTH: usize = 32;
