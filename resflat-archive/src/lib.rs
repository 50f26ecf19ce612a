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

//! Archive output for compiled resource artifacts.
//!
//! Each compiled input becomes one named entry, written either as a file in
//! an output directory or as a stored member of a zip archive. Entries are
//! strictly sequential: at most one entry is open at a time.

use resflat_common::{ResError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Destination for compiled entries.
///
/// The contract is `start_entry` / any number of `write_data` / `finish_entry`,
/// with `finish` sealing the whole archive at the end. Failing to finish an
/// entry is a distinct error from failing to write into it.
pub trait ArchiveWriter {
    fn start_entry(&mut self, name: &str) -> Result<()>;
    fn write_data(&mut self, data: &[u8]) -> Result<()>;
    fn finish_entry(&mut self) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// One file per entry, created under a root directory.
pub struct DirectoryArchiveWriter {
    root: PathBuf,
    open_entry: Option<File>
}

impl DirectoryArchiveWriter {
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(DirectoryArchiveWriter {
            root: root.to_path_buf(),
            open_entry: None
        })
    }
}

impl ArchiveWriter for DirectoryArchiveWriter {
    fn start_entry(&mut self, name: &str) -> Result<()> {
        if self.open_entry.is_some() {
            return Err(ResError::ArchiveWritingFailed(format!(
                "failed to open '{}': another entry is still open",
                name
            )));
        }
        self.open_entry = Some(File::create(self.root.join(name))?);
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        match &mut self.open_entry {
            Some(file) => Ok(file.write_all(data)?),
            None => Err(ResError::ArchiveWritingFailed(
                "write with no open entry".into()
            ))
        }
    }

    fn finish_entry(&mut self) -> Result<()> {
        match self.open_entry.take() {
            Some(mut file) => {
                file.flush().map_err(|err| {
                    ResError::ArchiveWritingFailed(format!("failed to finish entry: {}", err))
                })?;
                Ok(())
            }
            None => Err(ResError::ArchiveWritingFailed(
                "finish with no open entry".into()
            ))
        }
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One stored (uncompressed) member per entry.
///
/// Compiled artifacts are consumed entry-by-entry by the linker, so members
/// stay uncompressed and 4-byte aligned the way final packages expect.
pub struct ZipArchiveWriter {
    zip: Option<ZipWriter<File>>,
    entry_open: bool
}

impl ZipArchiveWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(ZipArchiveWriter {
            zip: Some(ZipWriter::new(file)),
            entry_open: false
        })
    }

    fn zip(&mut self) -> Result<&mut ZipWriter<File>> {
        self.zip.as_mut().ok_or_else(|| {
            ResError::ArchiveWritingFailed("archive already finished".into())
        })
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn start_entry(&mut self, name: &str) -> Result<()> {
        if self.entry_open {
            return Err(ResError::ArchiveWritingFailed(format!(
                "failed to open '{}': another entry is still open",
                name
            )));
        }
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .with_alignment(4);
        self.zip()?.start_file(name, options)?;
        self.entry_open = true;
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        if !self.entry_open {
            return Err(ResError::ArchiveWritingFailed(
                "write with no open entry".into()
            ));
        }
        self.zip()?.write_all(data)?;
        Ok(())
    }

    fn finish_entry(&mut self) -> Result<()> {
        if !self.entry_open {
            return Err(ResError::ArchiveWritingFailed(
                "finish with no open entry".into()
            ));
        }
        // The zip writer seals the member lazily on the next start_file or
        // on finish; there is nothing to flush per entry.
        self.entry_open = false;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(zip) = self.zip.take() {
            zip.finish()?;
        }
        Ok(())
    }
}

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "apk", "jar"];

/// Picks the writer from the output path: a recognized archive extension
/// means a zip file, anything else is treated as a directory.
pub fn create_archive_writer(output_path: &Path) -> Result<Box<dyn ArchiveWriter>> {
    let is_archive = output_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ARCHIVE_EXTENSIONS.contains(&ext))
        .unwrap_or(false);
    if is_archive {
        Ok(Box::new(ZipArchiveWriter::create(output_path)?))
    } else {
        Ok(Box::new(DirectoryArchiveWriter::create(output_path)?))
    }
}

/// Buffers everything written for one entry and hands it to the archive
/// writer in a single `commit` call.
///
/// The commit must happen before `finish_entry` so buffered bytes land
/// inside the entry; consuming `self` makes that ordering explicit on every
/// exit path.
pub struct EntrySink<'a> {
    writer: &'a mut dyn ArchiveWriter,
    buffer: Vec<u8>
}

impl<'a> EntrySink<'a> {
    pub fn new(writer: &'a mut dyn ArchiveWriter) -> Self {
        EntrySink {
            writer,
            buffer: vec![]
        }
    }

    pub fn commit(self) -> Result<()> {
        self.writer.write_data(&self.buffer)
    }
}

impl Write for EntrySink<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
