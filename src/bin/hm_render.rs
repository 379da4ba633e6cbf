// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! A minimal companion binary, mirroring `symphonia-play`'s role for this crate: load an
//! `.hm` module from a path given on the command line, render a fixed duration through the
//! public API, and write the result out as a 16-bit PCM WAV file. This exists purely to
//! exercise `hackymod` end-to-end; it is not part of the crate's load-bearing API.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::env;
use std::fs;
use std::process::ExitCode;

use hackymod::Context;
use log::{error, info};

const OUTPUT_RATE: u32 = 44100;
const DEFAULT_SECONDS: f32 = 10.0;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("usage: hm_render <module.hm> <output.wav> [seconds]");
        return ExitCode::FAILURE;
    };
    let Some(output_path) = args.next() else {
        eprintln!("usage: hm_render <module.hm> <output.wav> [seconds]");
        return ExitCode::FAILURE;
    };
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SECONDS);

    let bytes = match fs::read(&input_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("failed to read \"{input_path}\": {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = match Context::create(&bytes, OUTPUT_RATE) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!("failed to load module \"{input_path}\": {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("rendering \"{}\" for {seconds}s at {OUTPUT_RATE}Hz", ctx.name());

    let frame_count = (seconds * OUTPUT_RATE as f32) as usize;
    let mut frames = vec![0.0_f32; frame_count * 2];
    ctx.render(&mut frames, frame_count);

    if let Err(err) = write_wav(&output_path, &frames) {
        error!("failed to write \"{output_path}\": {err}");
        return ExitCode::FAILURE;
    }

    info!("wrote {frame_count} frames to \"{output_path}\"");
    ExitCode::SUCCESS
}

/// Writes interleaved stereo `f32` frames in `[-1, 1]` out as a 16-bit PCM WAV file.
fn write_wav(path: &str, frames: &[f32]) -> hound::Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: OUTPUT_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in frames {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}
