// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt, io, rc::Rc};

use deku::prelude::*;
use zip::result::ZipError;

pub mod diag;

pub use diag::{Diagnostics, NullDiagnostics, Severity, StderrDiagnostics};

/// Common error type making it easier to share `Result`s between RESFLAT
/// crates.
///
/// In general designed to avoid needing utilities like `map_err`.
#[derive(Debug, Clone)]
pub enum ResError {
    /// resflat-cli encountered an error while processing something specific
    /// to the command line implementation. For example, both `--dir` and
    /// explicit input files were passed at once.
    Cli(String),
    /// A resource path had fewer than two components. Inputs are expected to
    /// look like `type[-config]/name[.ext]`, with at least the type
    /// directory and the file name present.
    BadResourcePath(String),
    /// The qualifier segment after the first dash of a resource directory
    /// (eg. the `en-rUS` of `values-en-rUS`) did not parse as a
    /// configuration.
    InvalidConfiguration(String),
    /// The directory token of a resource path does not name a known
    /// resource type (eg. `res/bogus/foo.xml`).
    InvalidFilePath(String),
    /// An error occurred while opening, reading, or mapping an input file,
    /// or while flushing output to disk.
    FileIoError(Rc<io::Error>),
    /// Parsing failed while reading an XML input (a values document or a
    /// layout/drawable document). See [xml::reader::Error].
    XmlParsingFailed(xml::reader::Error),
    /// A values document was well-formed XML but violated the resource
    /// grammar (unknown element, missing `name` attribute, duplicate entry,
    /// bad positional arguments, ...). The message carries the detail and
    /// the line it was found on.
    ValuesParsingFailed(String),
    /// When the flattener was trying to serialise a binary XML chunk,
    /// something went wrong. See [DekuError].
    ByteSerialisationFailed(DekuError),
    /// The PNG byte stream was rejected before decoding: bad signature,
    /// truncated chunk framing, or a missing mandatory chunk.
    CorruptPng(String),
    /// The PNG decoder failed. See [png::DecodingError].
    PngDecodingFailed(Rc<png::DecodingError>),
    /// The PNG encoder failed while re-encoding a crunched image. See
    /// [png::EncodingError].
    PngEncodingFailed(Rc<png::EncodingError>),
    /// A `.9.png` input had an invalid 1-pixel border (bad corner pixel,
    /// stray color, or no stretch region).
    NinePatchFailed(String),
    /// An archive entry could not be started, written, or finished. Start
    /// and finish failures are distinct from write failures; the message
    /// says which one happened.
    ArchiveWritingFailed(String),
    /// The zip backend failed. See [ZipError].
    ZipWritingFailed(Rc<ZipError>)
}

/// Result type where the error is always [ResError].
pub type Result<T> = std::result::Result<T, ResError>;

impl fmt::Display for ResError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResError::Cli(msg) => write!(f, "{}", msg),
            ResError::BadResourcePath(path) => {
                write!(f, "bad resource path ({})", path)
            }
            ResError::InvalidConfiguration(config) => {
                write!(f, "invalid configuration '{}'", config)
            }
            ResError::InvalidFilePath(path) => {
                write!(f, "invalid file path '{}'", path)
            }
            ResError::FileIoError(err) => write!(f, "{}", err),
            ResError::XmlParsingFailed(err) => write!(f, "{}", err),
            ResError::ValuesParsingFailed(msg) => write!(f, "{}", msg),
            ResError::ByteSerialisationFailed(err) => write!(f, "{}", err),
            ResError::CorruptPng(msg) => write!(f, "corrupt png: {}", msg),
            ResError::PngDecodingFailed(err) => write!(f, "{}", err),
            ResError::PngEncodingFailed(err) => write!(f, "{}", err),
            ResError::NinePatchFailed(msg) => write!(f, "{}", msg),
            ResError::ArchiveWritingFailed(msg) => write!(f, "{}", msg),
            ResError::ZipWritingFailed(err) => write!(f, "{}", err)
        }
    }
}

// Automatic conversion from other types of error to ResError makes the rest
// of the code cleaner
impl From<io::Error> for ResError {
    fn from(value: io::Error) -> Self {
        ResError::FileIoError(value.into())
    }
}

impl From<xml::reader::Error> for ResError {
    fn from(value: xml::reader::Error) -> Self {
        ResError::XmlParsingFailed(value)
    }
}

impl From<DekuError> for ResError {
    fn from(value: DekuError) -> Self {
        ResError::ByteSerialisationFailed(value)
    }
}

impl From<png::DecodingError> for ResError {
    fn from(value: png::DecodingError) -> Self {
        ResError::PngDecodingFailed(value.into())
    }
}

impl From<png::EncodingError> for ResError {
    fn from(value: png::EncodingError) -> Self {
        ResError::PngEncodingFailed(value.into())
    }
}

impl From<ZipError> for ResError {
    fn from(value: ZipError) -> Self {
        ResError::ZipWritingFailed(value.into())
    }
}
