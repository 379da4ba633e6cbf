// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! The `sample` module decodes one sample record — metadata plus PCM/Ogg payload — into
//! normalized interleaved float frames with gain pre-applied (spec §3, §4.3).

use crate::error::{inconsistent_sample_error, Result};
use crate::io::Cursor;
use crate::vorbis;

/// One pitched-instrument recording, decoded to float frames at load time.
///
/// Invariants (spec §3): `frames.len() == frame_count as usize * channels as usize`;
/// `loop_start < frame_count` when `looped`; `predelay <= attack <= hold <= decay`
/// (all cumulative output-frame offsets from note-on).
pub struct Sample {
    pub instrument_id: u8,
    pub is_ogg: bool,
    pub frames: Vec<f32>,
    pub frame_count: u32,
    pub sample_rate: u32,
    pub channels: u8,
    pub looped: bool,
    pub loop_start: u32,
    pub pan: f32,
    pub relative_note: u8,
    pub key_range_start: u8,
    pub key_range_end: u8,
    pub envelope_enabled: bool,
    /// Cumulative output-frame offset at which predelay ends.
    pub predelay: u32,
    /// Cumulative output-frame offset at which attack ends.
    pub attack: u32,
    /// Cumulative output-frame offset at which hold ends.
    pub hold: u32,
    /// Cumulative output-frame offset at which decay ends (sustain begins).
    pub decay: u32,
    pub sustain: f32,
    pub fadeout: u32,
    /// Running envelope position, in output frames since the sample was last bound to a
    /// channel (spec §4.5: stored on the sample, making the envelope monophonic per
    /// sample — see DESIGN.md).
    pub envelope_timer: u64,
}

impl Sample {
    /// Parses one sample record from `cur` (metadata only) and decodes its payload, which
    /// is read from the front of `payload` — the cursor is left positioned after the
    /// fixed-size metadata fields, and the caller is responsible for skipping
    /// `data_length` bytes of payload afterwards (symmetric with `hm_load_samples`'s single
    /// moving index in the original implementation).
    pub fn parse(cur: &mut Cursor<'_>, output_rate: u32) -> Result<Sample> {
        let instrument_id = cur.read_u8()?;
        let is_ogg = cur.read_u8()? != 0;

        let data_length = cur.read_u32_be()?;
        let frame_count = cur.read_u32_be()?;
        let sample_rate = cur.read_u32_be()?;

        let sixteen_bit = cur.read_u8()? != 0;
        let channels = cur.read_u8()?;
        let looped = cur.read_u8()? != 0;

        let loop_start = cur.read_u32_be()?;

        let pan16 = cur.read_u16_be()?;
        let pan = (i32::from(pan16) - 32767) as f32 / 32767.0;
        let volume16 = cur.read_u16_be()?;
        let volume = f32::from(volume16) / 65535.0;

        let relative_note = cur.read_u8()?;
        let key_range_start = cur.read_u8()?;
        let key_range_end = cur.read_u8()?;
        let envelope_enabled = cur.read_u8()? != 0;

        let envelope_rate = output_rate as f32 / 1000.0;
        let predelay_ms = cur.read_u16_be()?;
        let attack_ms = cur.read_u16_be()?;
        let hold_ms = cur.read_u16_be()?;
        let decay_ms = cur.read_u16_be()?;
        let sustain16 = cur.read_u16_be()?;
        let fadeout_ms = cur.read_u16_be()?;

        let predelay = (f32::from(predelay_ms) * envelope_rate) as u32;
        let attack = predelay + (f32::from(attack_ms) * envelope_rate) as u32;
        let hold = attack + (f32::from(hold_ms) * envelope_rate) as u32;
        let decay = hold + (f32::from(decay_ms) * envelope_rate) as u32;
        let sustain = f32::from(sustain16) / 65535.0;
        let fadeout = (f32::from(fadeout_ms) * envelope_rate) as u32;

        let payload = cur.read_slice(data_length as usize)?;

        if looped && loop_start >= frame_count {
            return inconsistent_sample_error(instrument_id, "loop_start >= frame_count");
        }
        if !(predelay <= attack && attack <= hold && hold <= decay) {
            return inconsistent_sample_error(instrument_id, "envelope boundaries out of order");
        }

        let mut frames = decode_payload(payload, is_ogg, sixteen_bit, channels, frame_count)?;
        for f in frames.iter_mut() {
            *f *= volume;
        }

        Ok(Sample {
            instrument_id,
            is_ogg,
            frames,
            frame_count,
            sample_rate,
            channels,
            looped,
            loop_start,
            pan,
            relative_note,
            key_range_start,
            key_range_end,
            envelope_enabled,
            predelay,
            attack,
            hold,
            decay,
            sustain,
            fadeout,
            envelope_timer: 0,
        })
    }

    /// Reads frame `idx`, applies this sample's own pan (spec §4.6 step 5) and, when
    /// enabled, its volume envelope (spec §4.6 step 6), advancing `envelope_timer` by one
    /// — mirroring the source, which re-derives the envelope on every individual frame
    /// read rather than once per output frame, so a single output frame that blends two
    /// sample frames advances the timer twice.
    pub fn read_frame(&mut self, idx: u32) -> (f32, f32) {
        let channels = self.channels as usize;
        let base = idx as usize * channels;
        let (mut l, mut r) = if channels == 2 {
            (self.frames[base], self.frames[base + 1])
        } else {
            let v = self.frames[base];
            (v, v)
        };

        apply_pan(&mut l, &mut r, self.pan);

        if self.envelope_enabled {
            let mult = if self.envelope_timer < u64::from(self.predelay) {
                self.envelope_timer += 1;
                0.0
            } else if self.envelope_timer < u64::from(self.attack) {
                let m = self.envelope_timer as f32 / self.attack as f32;
                self.envelope_timer += 1;
                m
            } else if self.envelope_timer < u64::from(self.hold) {
                self.envelope_timer += 1;
                1.0
            } else if self.envelope_timer < u64::from(self.decay) {
                let m = 1.0 - (self.envelope_timer as f32 / self.decay as f32) * (1.0 - self.sustain);
                self.envelope_timer += 1;
                m
            } else {
                self.sustain
            };
            l *= mult;
            r *= mult;
        }

        (l, r)
    }
}

/// The asymmetric-linear pan law used for both sample pan and channel pan (spec §4.6 steps
/// 5 and 7, §9 — deliberately not an equal-power/cosine law).
pub(crate) fn apply_pan(l: &mut f32, r: &mut f32, pan: f32) {
    if pan < 0.0 {
        *r -= *r * -pan;
    } else if pan > 0.0 {
        *l -= *l * pan;
    }
}

fn decode_payload(
    payload: &[u8],
    is_ogg: bool,
    sixteen_bit: bool,
    channels: u8,
    frame_count: u32,
) -> Result<Vec<f32>> {
    if is_ogg {
        let mut frames = vorbis::decode(payload, channels)?;
        let wanted = frame_count as usize * channels as usize;
        frames.resize(wanted, 0.0);
        Ok(frames)
    } else if sixteen_bit {
        Ok(payload
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .map(|s| f32::from(s) / 32767.0)
            .collect())
    } else {
        Ok(payload.iter().map(|&b| (i32::from(b) - 128) as f32 / 128.0).collect())
    }
}
