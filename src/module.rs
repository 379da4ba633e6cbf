// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! Parses the on-disk `.hm` module header, instantiates the sample store, and retains the
//! raw pattern bytes for on-demand per-tick decoding (spec §4.2, §6).

use crate::error::{too_many_channels_error, truncated_error, Result};
use crate::io::Cursor;
use crate::sample::Sample;

use crate::MODULE_NAME_LENGTH;

/// Fixed magic/reserved prefix preceding the module name (spec §6).
const MAGIC_PREFIX_LEN: usize = 14;

/// The header and body of one parsed `.hm` module, before a [`crate::context::Context`]
/// wraps it with runtime channel state.
pub(crate) struct ParsedModule {
    pub name: String,
    pub num_channels: u8,
    pub bpm: u8,
    pub subdivision: u8,
    pub tick_length: u32,
    pub length: u16,
    pub loop_position: u16,
    pub samples: Vec<Sample>,
    pub pattern: Vec<u8>,
}

impl ParsedModule {
    pub fn parse(bytes: &[u8], output_rate: u32, max_channels: u8) -> Result<ParsedModule> {
        if bytes.len() < MAGIC_PREFIX_LEN {
            return truncated_error();
        }
        let mut cur = Cursor::at(bytes, MAGIC_PREFIX_LEN);

        let name = read_name(&mut cur)?;

        let num_channels = cur.read_u8()?;
        if num_channels > max_channels {
            return too_many_channels_error(num_channels);
        }
        let num_samples = cur.read_u8()?;
        let bpm = cur.read_u8()?;
        let subdivision = cur.read_u8()?;

        // Integer division, matching the source exactly (tick_length is computed in
        // integer arithmetic there, not float).
        let tick_length = (output_rate * 60 / u32::from(bpm)) / u32::from(subdivision);

        let length = cur.read_u16_be()?;
        let loop_position = cur.read_u16_be()?;

        let mut samples = Vec::with_capacity(num_samples as usize);
        for _ in 0..num_samples {
            samples.push(Sample::parse(&mut cur, output_rate)?);
        }

        let pattern = cur.remainder().to_vec();

        Ok(ParsedModule {
            name,
            num_channels,
            bpm,
            subdivision,
            tick_length,
            length,
            loop_position,
            samples,
            pattern,
        })
    }
}

/// Reads the zero-terminated ASCII name following the magic prefix. The source copies
/// bytes into a fixed 32-byte buffer with no bounds check (`while (info[i]) name[i-14] =
/// info[i]; i++`); this reads at most `MODULE_NAME_LENGTH - 1` bytes before requiring a
/// NUL terminator, failing with `Truncated` instead of overrunning a buffer on malformed
/// input (spec SPEC_FULL §11).
fn read_name(cur: &mut Cursor<'_>) -> Result<String> {
    let mut bytes = Vec::with_capacity(MODULE_NAME_LENGTH);
    loop {
        let b = cur.read_u8()?;
        if b == 0 {
            break;
        }
        if bytes.len() >= MODULE_NAME_LENGTH - 1 {
            return truncated_error();
        }
        bytes.push(b);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_module_bytes() -> Vec<u8> {
        let mut b = vec![0u8; MAGIC_PREFIX_LEN];
        b.extend_from_slice(b"test\0"); // name
        b.push(1); // num_channels
        b.push(0); // num_samples
        b.push(120); // bpm
        b.push(4); // subdivision
        b.extend_from_slice(&4u16.to_be_bytes()); // length
        b.extend_from_slice(&0u16.to_be_bytes()); // loop_position
        // no samples; remainder is pattern bytes for 1 channel * 4 ticks * 4 bytes
        b.extend_from_slice(&[0u8; 16]);
        b
    }

    #[test]
    fn parses_minimal_header() {
        let bytes = minimal_module_bytes();
        let module = ParsedModule::parse(&bytes, 44100, 32).unwrap();
        assert_eq!(module.name, "test");
        assert_eq!(module.num_channels, 1);
        assert_eq!(module.length, 4);
        assert_eq!(module.pattern.len(), 16);
    }

    #[test]
    fn rejects_too_many_channels() {
        let mut bytes = minimal_module_bytes();
        bytes[MAGIC_PREFIX_LEN + 5] = 33;
        assert!(ParsedModule::parse(&bytes, 44100, 32).is_err());
    }

    #[test]
    fn rejects_unterminated_name() {
        let mut bytes = vec![0u8; MAGIC_PREFIX_LEN];
        bytes.extend(std::iter::repeat(b'x').take(64));
        assert!(ParsedModule::parse(&bytes, 44100, 32).is_err());
    }
}
