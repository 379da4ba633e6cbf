// hackymod
// Copyright (c) 2026 The hackymod Developers.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT> or
// the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>,
// at your option. This file may not be copied, modified, or distributed except according
// to those terms.

//! The `error` module defines the error type returned from module loading.
//!
//! The render path (`render`/`mixdown`) never fails: a malformed pattern cell produces
//! silence rather than propagating an error (spec §7). Only loading a module can fail.

use std::error::Error as StdError;
use std::fmt;

/// `Error` enumerates every way loading an `.hm` module can fail.
#[derive(Debug)]
pub enum Error {
    /// A binary-reader cursor ran past the end of the buffer.
    Truncated,
    /// The embedded Ogg-Vorbis decoder rejected a sample's payload.
    OggDecodeFailed(String),
    /// The module declares more channels than `MAX_CHANNELS`.
    TooManyChannels { found: u8 },
    /// A sample's metadata violates an invariant (loop point past the end of the data,
    /// envelope boundaries out of order, etc).
    InconsistentSample { instrument_id: u8, reason: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated => write!(f, "truncated module: cursor ran past end of buffer"),
            Error::OggDecodeFailed(msg) => write!(f, "ogg-vorbis decode failed: {msg}"),
            Error::TooManyChannels { found } => {
                write!(f, "module declares {found} channels, exceeding MAX_CHANNELS")
            }
            Error::InconsistentSample { instrument_id, reason } => {
                write!(f, "sample {instrument_id} is inconsistent: {reason}")
            }
        }
    }
}

impl StdError for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function to create a truncated-module error.
pub fn truncated_error<T>() -> Result<T> {
    Err(Error::Truncated)
}

/// Convenience function to create an ogg-decode error.
pub fn ogg_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::OggDecodeFailed(msg.into()))
}

/// Convenience function to create a too-many-channels error.
pub fn too_many_channels_error<T>(found: u8) -> Result<T> {
    Err(Error::TooManyChannels { found })
}

/// Convenience function to create an inconsistent-sample error.
pub fn inconsistent_sample_error<T>(instrument_id: u8, reason: &'static str) -> Result<T> {
    Err(Error::InconsistentSample { instrument_id, reason })
}
