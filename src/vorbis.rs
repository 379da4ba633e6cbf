// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! Ogg-Vorbis decoding is treated as an external collaborator (spec §1): given a byte
//! buffer and a channel count, produce interleaved float frames. This module is the one
//! narrow seam through which that collaborator is reached; everything above it only ever
//! sees plain `&[f32]` frames.

use crate::error::{ogg_error, Result};

/// Decodes a complete in-memory Ogg-Vorbis stream into interleaved `f32` samples in
/// `[-1, 1]`, one call producing the full decode (sample payloads are loaded once, at
/// module-load time, never streamed during playback — spec §5).
#[cfg(feature = "vorbis")]
pub fn decode(bytes: &[u8], channels: u8) -> Result<Vec<f32>> {
    use lewton::inside_ogg::OggStreamReader;
    use std::io::Cursor;

    let mut reader = OggStreamReader::new(Cursor::new(bytes))
        .map_err(|e| format!("failed to open ogg stream: {e}"))
        .or_else(|msg| ogg_error(msg))?;

    if usize::from(channels) != reader.ident_hdr.audio_channels as usize {
        return ogg_error(format!(
            "ogg stream has {} channels, sample header declares {}",
            reader.ident_hdr.audio_channels, channels
        ));
    }

    let mut out = Vec::new();
    loop {
        match reader.read_dec_packet_itl() {
            Ok(Some(packet)) => {
                out.extend(packet.into_iter().map(|s| f32::from(s) / 32768.0));
            }
            Ok(None) => break,
            Err(e) => return ogg_error(format!("ogg packet decode failed: {e}")),
        }
    }

    Ok(out)
}

#[cfg(not(feature = "vorbis"))]
pub fn decode(_bytes: &[u8], _channels: u8) -> Result<Vec<f32>> {
    crate::error::ogg_error("this build of hackymod was compiled without the `vorbis` feature")
}
