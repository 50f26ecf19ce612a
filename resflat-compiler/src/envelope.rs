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

//! The compiled envelope: a little-endian count of embedded files, then per
//! file a length-delimited descriptor record and a length-delimited payload.
//! The values path is the one exception; it writes a serialised resource
//! table directly as the entry body, which is what the legacy linker reads.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use prost::Message;
use resflat_archive::{ArchiveWriter, EntrySink};
use resflat_common::{Diagnostics, ResError, Result};

use crate::proto::pb;

/// Accumulates envelope records on any writer, latching the first failure
/// instead of failing fast. Callers check `had_error` once after all
/// writes.
pub struct CompiledFileOutput<W: Write> {
    out: W,
    had_error: bool
}

impl<W: Write> CompiledFileOutput<W> {
    pub fn new(out: W) -> Self {
        CompiledFileOutput {
            out,
            had_error: false
        }
    }

    pub fn write_little_endian32(&mut self, value: u32) {
        if self.out.write_u32::<LittleEndian>(value).is_err() {
            self.had_error = true;
        }
    }

    /// Descriptor records are u32-length-delimited protobuf messages.
    pub fn write_compiled_file(&mut self, file: &pb::CompiledFile) {
        let bytes = file.encode_to_vec();
        self.write_little_endian32(bytes.len() as u32);
        if self.out.write_all(&bytes).is_err() {
            self.had_error = true;
        }
    }

    /// Payloads are u64-length-delimited opaque bytes.
    pub fn write_data(&mut self, data: &[u8]) {
        if self.out.write_u64::<LittleEndian>(data.len() as u64).is_err() {
            self.had_error = true;
        }
        if self.out.write_all(data).is_err() {
            self.had_error = true;
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Writes one archive entry holding the given `(descriptor, payload)`
/// sequence under the standard count-prefixed envelope.
pub fn write_compiled_files_to_entry(
    writer: &mut dyn ArchiveWriter,
    entry_name: &str,
    files: &[(pb::CompiledFile, &[u8])],
    diag: &dyn Diagnostics
) -> Result<()> {
    if let Err(err) = writer.start_entry(entry_name) {
        diag.error(Some(entry_name), "failed to open file");
        return Err(err);
    }

    // The sink buffers everything and must be committed before
    // finish_entry so the bytes land inside the entry.
    let sink = EntrySink::new(writer);
    let mut out = CompiledFileOutput::new(sink);

    out.write_little_endian32(files.len() as u32);
    for (descriptor, payload) in files {
        out.write_compiled_file(descriptor);
        out.write_data(payload);
    }

    if out.had_error() {
        diag.error(Some(entry_name), "failed to write data");
        // Release the sink without committing, then close the entry so the
        // next input does not trip over it. A close failure is its own
        // error and gets reported alongside the write failure.
        drop(out);
        if writer.finish_entry().is_err() {
            diag.error(Some(entry_name), "failed to finish writing data");
        }
        return Err(ResError::ArchiveWritingFailed(format!(
            "failed to write data for '{}'",
            entry_name
        )));
    }
    out.into_inner().commit()?;

    if let Err(err) = writer.finish_entry() {
        diag.error(Some(entry_name), "failed to finish writing data");
        return Err(err);
    }
    Ok(())
}

/// Writes the values-table variant: the serialised table is the whole entry
/// body, with no count prefix.
pub fn write_table_to_entry(
    writer: &mut dyn ArchiveWriter,
    entry_name: &str,
    table: &pb::ResourceTable,
    diag: &dyn Diagnostics
) -> Result<()> {
    if let Err(err) = writer.start_entry(entry_name) {
        diag.error(Some(entry_name), "failed to open");
        return Err(err);
    }

    let mut sink = EntrySink::new(writer);
    let write_result = sink.write_all(&table.encode_to_vec());
    if write_result.is_err() {
        diag.error(Some(entry_name), "failed to write");
        drop(sink);
        if writer.finish_entry().is_err() {
            diag.error(Some(entry_name), "failed to finish entry");
        }
        return Err(ResError::ArchiveWritingFailed(format!(
            "failed to write '{}'",
            entry_name
        )));
    }
    sink.commit()?;

    if let Err(err) = writer.finish_entry() {
        diag.error(Some(entry_name), "failed to finish entry");
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use prost::Message;
    use std::io::{Cursor, Read};

    fn descriptor(name: &str) -> pb::CompiledFile {
        pb::CompiledFile {
            resource_name: name.into(),
            config: None,
            source_path: format!("res/{}.xml", name),
            exported_ids: vec![]
        }
    }

    /// Reads one envelope back: count, then (descriptor, payload) pairs.
    fn read_envelope(bytes: &[u8]) -> Vec<(pb::CompiledFile, Vec<u8>)> {
        let mut cursor = Cursor::new(bytes);
        let count = cursor.read_u32::<LittleEndian>().unwrap();
        let mut files = vec![];
        for _ in 0..count {
            let descriptor_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
            let mut descriptor_bytes = vec![0; descriptor_len];
            cursor.read_exact(&mut descriptor_bytes).unwrap();
            let descriptor = pb::CompiledFile::decode(descriptor_bytes.as_slice()).unwrap();
            let payload_len = cursor.read_u64::<LittleEndian>().unwrap() as usize;
            let mut payload = vec![0; payload_len];
            cursor.read_exact(&mut payload).unwrap();
            files.push((descriptor, payload));
        }
        assert_eq!(cursor.position() as usize, bytes.len());
        files
    }

    #[test]
    fn envelope_layout_round_trips() {
        let mut buffer = vec![];
        {
            let mut out = CompiledFileOutput::new(&mut buffer);
            out.write_little_endian32(2);
            out.write_compiled_file(&descriptor("layout/main"));
            out.write_data(b"primary");
            out.write_compiled_file(&descriptor("layout/main_1"));
            out.write_data(b"fragment");
            assert!(!out.had_error());
        }

        let files = read_envelope(&buffer);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0.resource_name, "layout/main");
        assert_eq!(files[0].1, b"primary");
        assert_eq!(files[1].0.resource_name, "layout/main_1");
        assert_eq!(files[1].1, b"fragment");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failures_latch_instead_of_panicking() {
        let mut out = CompiledFileOutput::new(FailingWriter);
        out.write_little_endian32(1);
        out.write_compiled_file(&descriptor("drawable/icon"));
        out.write_data(b"bytes");
        assert!(out.had_error());
    }
}
