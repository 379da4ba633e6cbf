// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! The playback context: owns the parsed module and every channel's runtime state, and
//! drives the tick scheduler and mixer (spec §3, §4.4, §4.9, §6).

use crate::channel::Channel;
use crate::command;
use crate::error::Result;
use crate::module::ParsedModule;
use crate::sample::Sample;
use crate::MAX_CHANNELS;

/// The playback state for one loaded module. Created with [`Context::create`], advanced
/// with [`Context::render`] or [`Context::mixdown`].
///
/// Dropping a `Context` releases the pattern buffer, the sample store, and every channel
/// in one pass — ordinary Rust ownership (spec §5's "destroy consumes the context" maps
/// directly onto `Drop`; there is no separate `destroy` entry point to misuse after the
/// fact, see DESIGN.md).
pub struct Context {
    name: String,
    rate: u32,
    length: u16,
    loop_position: u16,
    num_channels: u8,
    bpm: u8,
    subdivision: u8,
    tick_length: u32,
    tick_position: i64,
    samples_left_in_tick: u32,
    pattern: Vec<u8>,
    samples: Vec<Sample>,
    channels: Vec<Channel>,
}

impl Context {
    /// Parses `bytes` as an `.hm` module and prepares it for playback at `rate` Hz (spec
    /// §6).
    pub fn create(bytes: &[u8], rate: u32) -> Result<Context> {
        let parsed = ParsedModule::parse(bytes, rate, MAX_CHANNELS as u8)?;

        let mut channels = Vec::with_capacity(parsed.num_channels as usize);
        for _ in 0..parsed.num_channels {
            channels.push(Channel::default());
        }

        log::debug!(
            "loaded module \"{}\": {} channels, {} samples, {} ticks",
            parsed.name,
            parsed.num_channels,
            parsed.samples.len(),
            parsed.length
        );

        Ok(Context {
            name: parsed.name,
            rate,
            length: parsed.length,
            loop_position: parsed.loop_position,
            num_channels: parsed.num_channels,
            bpm: parsed.bpm,
            subdivision: parsed.subdivision,
            tick_length: parsed.tick_length,
            tick_position: -1,
            samples_left_in_tick: 0,
            pattern: parsed.pattern,
            samples: parsed.samples,
            channels,
        })
    }

    /// The module's display name, read from its header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The output sample rate this context was created with.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Renders `frame_count` stereo frames into `out`, which must hold at least
    /// `frame_count * 2` floats laid out as interleaved `[L, R, L, R, ...]` (spec §6).
    pub fn render(&mut self, out: &mut [f32], frame_count: usize) {
        assert!(out.len() >= frame_count * 2, "output buffer too small for frame_count");
        for i in 0..frame_count {
            let (l, r) = self.mixdown();
            out[i * 2] = l;
            out[i * 2 + 1] = r;
        }
    }

    /// Produces exactly one stereo frame, advancing the tick scheduler first if the
    /// current tick has been fully consumed (spec §4.9).
    pub fn mixdown(&mut self) -> (f32, f32) {
        if self.samples_left_in_tick == 0 {
            self.load_new_tick();
        }
        self.samples_left_in_tick -= 1;

        let mut left = 0.0_f32;
        let mut right = 0.0_f32;
        let rate = self.rate;
        let samples = &mut self.samples;
        for channel in &mut self.channels {
            if let Some(idx) = channel.sample_id {
                let (l, r) = channel.render(&mut samples[idx], rate);
                left += l;
                right += r;
            }
        }

        (left.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0))
    }

    /// Advances the tick index (looping at module end), dispatches each channel's cell for
    /// the new tick, and reloads `samples_left_in_tick` (spec §4.4).
    fn load_new_tick(&mut self) {
        self.tick_position += 1;
        if self.tick_position >= i64::from(self.length) {
            log::debug!("module \"{}\" looped to tick {}", self.name, self.loop_position);
            self.tick_position = i64::from(self.loop_position);
            for channel in &mut self.channels {
                for ramp in &mut channel.ramps {
                    ramp.disable();
                }
            }
        }

        let cells_offset = 4 * usize::from(self.num_channels) * self.tick_position as usize;
        for i in 0..usize::from(self.num_channels) {
            let cell_offset = cells_offset + i * 4;
            let Some(cell) = self.pattern.get(cell_offset..cell_offset + 4) else {
                continue;
            };
            let (note_byte, instrument_id, command_id, param) = (cell[0], cell[1], cell[2], cell[3]);

            if note_byte & 0x80 != 0 {
                let requested = note_byte & 0x7F;
                if requested != 0 {
                    let note = requested - 1;
                    self.bind_sample(i, instrument_id, note);
                    self.channels[i].note_on(note);
                } else {
                    self.channels[i].key_off();
                }
            }

            if command_id != 0 {
                let channel = &mut self.channels[i];
                channel.last_command = command_id;
                channel.last_param = param;
                command::dispatch(channel, command_id, param, self.tick_length, self.rate);
                // The source rescales `predelay` by `rate / 1000` on every nonzero
                // command byte, not only command 5 (spec SPEC_FULL §11) — preserved
                // here rather than special-cased to command 5 only.
                channel.predelay =
                    (channel.predelay as f32 * (self.rate as f32 / 1000.0)) as u32;
            }
        }

        self.samples_left_in_tick = self.tick_length;
    }

    /// Linearly scans the sample store for the first sample matching `instrument_id` and
    /// whose key range covers `note`, binding it to the channel. If nothing matches, the
    /// previously bound sample (if any) is retained (spec §4.5). Either way, the resolved
    /// sample's envelope timer is reset to 0, matching the source's unconditional reset
    /// after the scan (spec SPEC_FULL §11).
    fn bind_sample(&mut self, channel_idx: usize, instrument_id: u8, note: u8) {
        let found = self.samples.iter().position(|s| {
            s.instrument_id == instrument_id && s.key_range_start <= note && note <= s.key_range_end
        });

        if let Some(idx) = found {
            self.channels[channel_idx].sample_id = Some(idx);
        } else {
            log::warn!(
                "note-on for instrument {instrument_id} note {note} matched no sample; \
                 retaining previous binding"
            );
        }

        if let Some(idx) = self.channels[channel_idx].sample_id {
            self.samples[idx].envelope_timer = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_bytes(num_channels: u8, cells: &[[u8; 4]], length: u16, loop_position: u16) -> Vec<u8> {
        let mut b = vec![0u8; 14];
        b.extend_from_slice(b"t\0");
        b.push(num_channels);
        b.push(0); // num_samples
        b.push(120); // bpm
        b.push(4); // subdivision
        b.extend_from_slice(&length.to_be_bytes());
        b.extend_from_slice(&loop_position.to_be_bytes());
        for cell in cells {
            b.extend_from_slice(cell);
        }
        b
    }

    #[test]
    fn single_tick_silence_renders_zeros() {
        let bytes = module_bytes(1, &[[0x00, 0, 0, 0]], 1, 0);
        let mut ctx = Context::create(&bytes, 44100).unwrap();
        let mut out = vec![0.0_f32; 1000 * 2];
        ctx.render(&mut out, 1000);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn loop_wraps_tick_sequence() {
        let bytes = module_bytes(
            1,
            &[[0x00, 0, 0, 0], [0x00, 0, 0, 0], [0x00, 0, 0, 0], [0x00, 0, 0, 0]],
            4,
            2,
        );
        let mut ctx = Context::create(&bytes, 44100).unwrap();
        let mut seen = Vec::new();
        for _ in 0..6 {
            ctx.mixdown();
            seen.push(ctx.tick_position);
            // fast-forward to the next tick boundary
            ctx.samples_left_in_tick = 0;
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 2, 3]);
    }
}
