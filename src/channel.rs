// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! One playback voice: per-channel state and the per-frame synthesis pipeline (spec §3,
//! §4.6).

use crate::ramp::Ramp;
use crate::sample::{apply_pan, Sample};
use crate::trill::{Trill, TrillKind};
use crate::FREQUENCY_MULTIPLIER;

/// One monophonic voice. A channel is always bound to at most one [`Sample`] at a time,
/// referenced by index into the context's sample store.
pub struct Channel {
    pub sample_id: Option<usize>,
    pub base_note: u8,
    pub key_off: bool,
    pub last_command: u8,
    pub last_param: u8,
    pub coarse_detune: i32,
    pub fine_detune: i32,
    pub pan: f32,
    pub volume: f32,
    /// Frames of silence remaining before this voice starts producing output this tick.
    pub predelay: u32,
    /// Current integer frame within the bound sample. `-1` means "silent" (dead voice).
    pub sample_frame: i64,
    /// Fractional position between `sample_frame` and `sample_frame + 1`, in `[0, 1)`.
    /// Kept in `f64` (matching `hm_channel.pos_between_samples`'s `double`) so the carried
    /// remainder doesn't lose the precision the rest of the pitch-step arithmetic is
    /// deliberately computed in.
    pub frac: f64,
    pub fadeout_timer: u32,
    /// Indexed {volume, pan, coarse, fine} per spec §4.6 step 1.
    pub ramps: [Ramp; 4],
    /// Indexed {pitch-coarse, pitch-fine} per spec §4.6 step 2.
    pub trills: [Trill; 2],
}

impl Default for Channel {
    fn default() -> Self {
        Channel {
            sample_id: None,
            base_note: 0,
            key_off: false,
            last_command: 0,
            last_param: 0,
            coarse_detune: 0,
            fine_detune: 0,
            pan: 0.0,
            volume: 1.0,
            predelay: 0,
            sample_frame: -1,
            frac: 0.0,
            fadeout_timer: 0,
            ramps: [Ramp::default(); 4],
            trills: [Trill::new(TrillKind::OneSided), Trill::new(TrillKind::Symmetric)],
        }
    }
}

impl Channel {
    /// Binds a freshly requested note: resets per-note ramps-unrelated state (spec §4.4
    /// step 3). The caller (the tick scheduler) is responsible for the sample-selection
    /// half of note-on (§4.5) before calling this.
    pub fn note_on(&mut self, base_note: u8) {
        self.base_note = base_note;
        self.key_off = false;
        self.coarse_detune = 0;
        self.fine_detune = 0;
        self.predelay = 0;
        self.fadeout_timer = 0;
        self.sample_frame = 0;
        self.frac = 0.0_f64;
        self.trills[0].enabled = false;
        self.trills[1].enabled = false;
    }

    /// Starts the key-off fadeout on the currently playing voice; a no-op on the voice's
    /// pitch/sample binding (spec §4.4 step 3, §4.6 step 9).
    pub fn key_off(&mut self) {
        self.key_off = true;
    }

    /// Advances ramps, trills, pitch, and envelope by one output frame and returns this
    /// channel's contribution to the stereo mix (spec §4.6). `sample` must be the sample
    /// currently bound by `self.sample_id`.
    pub fn render(&mut self, sample: &mut Sample, output_rate: u32) -> (f32, f32) {
        if self.sample_frame < 0 {
            return (0.0, 0.0);
        }
        if self.predelay > 0 {
            self.predelay -= 1;
            return (0.0, 0.0);
        }

        self.update_ramps();

        let trill0 = if self.trills[0].enabled { self.trills[0].step() } else { 0 };
        let trill1 = if self.trills[1].enabled { self.trills[1].step() } else { 0 };

        let dist = i32::from(sample.relative_note)
            - (i32::from(self.base_note) + self.coarse_detune + trill0);

        let mut step = 1.0_f64;
        if dist < 0 {
            for _ in 0..dist.unsigned_abs() {
                step *= 1.0 + f64::from(FREQUENCY_MULTIPLIER);
            }
        } else if dist > 0 {
            for _ in 0..dist {
                step *= 1.0 - f64::from(FREQUENCY_MULTIPLIER);
            }
        }
        step *= 1.0
            + f64::from(self.fine_detune + trill1) * (f64::from(FREQUENCY_MULTIPLIER) / 100.0);
        step *= f64::from(sample.sample_rate) / f64::from(output_rate);
        step += self.frac;

        let advance = step.trunc() as i64;
        self.sample_frame += advance;
        step -= advance as f64;
        self.frac = step;

        let frame_count = sample.frame_count as i64;
        let n = self.sample_frame;
        let (l1, r1, l2, r2) = if n < frame_count {
            fetch_pair(sample, n)
        } else if sample.looped {
            let wrapped = (n % frame_count) + i64::from(sample.loop_start);
            if wrapped >= frame_count {
                self.sample_frame = -1;
                return (0.0, 0.0);
            }
            self.sample_frame = wrapped;
            fetch_pair(sample, wrapped)
        } else {
            self.sample_frame = -1;
            return (0.0, 0.0);
        };

        let t = self.frac as f32;
        let mut l = l1 + t * (l2 - l1);
        let mut r = r1 + t * (r2 - r1);

        apply_pan(&mut l, &mut r, self.pan);
        l *= self.volume;
        r *= self.volume;

        if self.key_off {
            self.fadeout_timer += 1;
            if self.fadeout_timer > sample.fadeout {
                self.sample_frame = -1;
            } else {
                let w = self.fadeout_timer as f32 / sample.fadeout as f32;
                l += w * (0.0 - l);
                r += w * (0.0 - r);
            }
        }

        (l.clamp(-1.0, 1.0), r.clamp(-1.0, 1.0))
    }

    fn update_ramps(&mut self) {
        for i in 0..4 {
            if !self.ramps[i].enabled {
                continue;
            }
            let end = self.ramps[i].end;
            let (val, t) = self.ramps[i].step();
            match i {
                0 => self.volume = val as f32 / 255.0,
                1 => self.pan = val as f32 / 127.0,
                2 => {
                    self.coarse_detune = val;
                    let mut fine = (100.0 * t) as i32;
                    if end < 0 {
                        fine = -fine;
                    }
                    self.fine_detune = fine;
                }
                3 => self.fine_detune = val,
                _ => unreachable!(),
            }
        }
    }
}

/// Reads the frame at `n` and, per spec §4.8, either the frame at `n + 1` or the loop
/// start/silence fallback, individually applying each through [`Sample::read_frame`]
/// (sample pan + envelope) before the caller linearly interpolates between them.
fn fetch_pair(sample: &mut Sample, n: i64) -> (f32, f32, f32, f32) {
    let frame_count = sample.frame_count as i64;
    let (l1, r1) = sample.read_frame(n as u32);
    let (l2, r2) = if n + 1 < frame_count {
        sample.read_frame((n + 1) as u32)
    } else if sample.looped {
        sample.read_frame(sample.loop_start)
    } else {
        (0.0, 0.0)
    };
    (l1, r1, l2, r2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_sample(frame_count: u32, channels: u8) -> Sample {
        Sample {
            instrument_id: 1,
            is_ogg: false,
            frames: vec![0.0; frame_count as usize * channels as usize],
            frame_count,
            sample_rate: 44100,
            channels,
            looped: false,
            loop_start: 0,
            pan: 0.0,
            relative_note: 60,
            key_range_start: 0,
            key_range_end: 127,
            envelope_enabled: false,
            predelay: 0,
            attack: 0,
            hold: 0,
            decay: 0,
            sustain: 1.0,
            fadeout: 0,
            envelope_timer: 0,
        }
    }

    #[test]
    fn dead_voice_contributes_nothing() {
        let mut channel = Channel::default();
        let mut sample = silent_sample(10, 1);
        assert_eq!(channel.render(&mut sample, 44100), (0.0, 0.0));
    }

    #[test]
    fn predelay_holds_silence_then_starts() {
        let mut channel = Channel::default();
        channel.sample_id = Some(0);
        channel.note_on(60);
        channel.predelay = 2;
        let mut sample = silent_sample(10, 1);
        // Resampling always advances `sample_frame` before the first fetch of a note
        // (spec §4.6 step 3 runs before step 4), so the first audible frame of a unit-step
        // note is `frames[1]`, not `frames[0]` — see DESIGN.md.
        sample.frames[1] = 1.0;
        assert_eq!(channel.render(&mut sample, 44100), (0.0, 0.0));
        assert_eq!(channel.predelay, 1);
        assert_eq!(channel.render(&mut sample, 44100), (0.0, 0.0));
        assert_eq!(channel.predelay, 0);
        let (l, _r) = channel.render(&mut sample, 44100);
        assert!(l != 0.0);
    }

    #[test]
    fn unit_step_pitch_reads_consecutive_frames_bit_exact() {
        let mut channel = Channel::default();
        channel.sample_id = Some(0);
        channel.note_on(60);
        let mut sample = silent_sample(4, 1);
        sample.frames = vec![0.25, 0.5, 0.75, 1.0];
        // Unit pitch step advances sample_frame by exactly 1 before every fetch, so
        // successive calls walk frames[1], frames[2], frames[3]... (see DESIGN.md).
        let (l0, r0) = channel.render(&mut sample, 44100);
        assert_eq!((l0, r0), (0.5, 0.5));
        let (l1, _) = channel.render(&mut sample, 44100);
        assert_eq!(l1, 0.75);
    }
}
