// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors that can occur while loading schemas or running the codec.

use std::fmt;

/// The error type for schema loading, serialization and
/// deserialization.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A value could not be interpreted as the numeric type the schema
    /// calls for.
    NotNumeric,

    /// A value could not be interpreted as a string or byte-string.
    NotString,

    /// A fixed-width blob (`int128`, `int256` or `int512`) had the
    /// wrong length, and the base64 fallback did not rescue it.
    BadLength {
        /// The width the schema calls for, in bits.
        bits: u32,
        /// The length of the value that was provided, in bytes.
        got: usize,
    },

    /// A decoded string length carried the reserved `0xff` marker.
    LengthTooBig,

    /// The end of the buffer was reached earlier than anticipated,
    /// which implies there is not enough data to complete the
    /// deserialization.
    UnexpectedEof,

    /// A required parameter was missing and no default could be
    /// synthesized for it.
    MissingParam {
        /// The name of the missing parameter.
        name: String,
    },

    /// The schema calls for a vector but the value is not one.
    ArrayRequired {
        /// The name of the offending parameter.
        name: String,
    },

    /// The predicate of a value to serialize is not in the schema.
    BadPredicate {
        /// The unknown predicate name.
        name: String,
    },

    /// An incoming constructor identifier is not in the schema.
    UnknownConstructor {
        /// The unknown constructor identifier.
        id: u32,
    },

    /// A boxed vector began with something other than the `vector`
    /// constructor.
    InvalidVectorConstructor {
        /// The unexpected constructor identifier.
        id: u32,
    },

    /// A schema source could not be loaded.
    SchemaInvalid {
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A `random_bytes` value shorter than 15 bytes came in. This is
    /// security-sensitive and never demoted to a warning.
    InsecureRandom {
        /// The length that was received.
        len: usize,
    },

    /// A `gzip_packed` envelope failed to decompress.
    DecompressionFailed,

    /// A `dataJSON` payload or JSON schema source failed to parse.
    Json {
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A callback hook reported a failure of its own.
    Hook {
        /// Human-readable reason for the failure.
        reason: String,
    },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNumeric => write!(f, "value is not numeric"),
            Self::NotString => write!(f, "value is not a string"),
            Self::BadLength { bits, got } => {
                write!(f, "bad length for int{}: got {} bytes", bits, got)
            }
            Self::LengthTooBig => write!(f, "string length marker 0xff is reserved"),
            Self::UnexpectedEof => write!(f, "unexpected eof"),
            Self::MissingParam { name } => write!(f, "missing required parameter: {}", name),
            Self::ArrayRequired { name } => write!(f, "parameter {} requires a vector", name),
            Self::BadPredicate { name } => write!(f, "unknown predicate: {}", name),
            Self::UnknownConstructor { id } => write!(f, "unknown constructor: {:08x}", id),
            Self::InvalidVectorConstructor { id } => {
                write!(f, "invalid vector constructor: {:08x}", id)
            }
            Self::SchemaInvalid { reason } => write!(f, "invalid schema: {}", reason),
            Self::InsecureRandom { len } => {
                write!(f, "insecure random_bytes of length {} (need at least 15)", len)
            }
            Self::DecompressionFailed => write!(f, "failed to decompress gzip_packed data"),
            Self::Json { reason } => write!(f, "bad json: {}", reason),
            Self::Hook { reason } => write!(f, "hook failed: {}", reason),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            reason: error.to_string(),
        }
    }
}
