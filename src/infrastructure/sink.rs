//! File-backed emission sinks
//!
//! `JsonLinesSink` appends one JSON record per line (menu-board pipeline);
//! `JsonDocumentSink` writes a single combined document (storefront
//! pipeline). Both enforce the at-most-once contract per parent key.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::application::sink::{RecordSink, SinkError, SinkResult};

/// Append-only JSON Lines writer with per-key duplicate rejection.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    emitted: HashSet<String>,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: &Path) -> SinkResult<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer,
            emitted: HashSet::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send, T: Serialize> RecordSink<T> for JsonLinesSink<W> {
    fn emit(&mut self, key: &str, record: &T) -> SinkResult<()> {
        if !self.emitted.insert(key.to_string()) {
            return Err(SinkError::DuplicateEmission { key: key.into() });
        }
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        info!(parent = key, "record emitted");
        Ok(())
    }
}

/// Writes exactly one combined document per run.
pub struct JsonDocumentSink<W: Write + Send> {
    writer: W,
    emitted_key: Option<String>,
}

impl JsonDocumentSink<BufWriter<File>> {
    pub fn create(path: &Path) -> SinkResult<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonDocumentSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer,
            emitted_key: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send, T: Serialize> RecordSink<T> for JsonDocumentSink<W> {
    fn emit(&mut self, key: &str, record: &T) -> SinkResult<()> {
        if let Some(existing) = &self.emitted_key {
            return Err(SinkError::DuplicateEmission {
                key: existing.clone(),
            });
        }
        serde_json::to_writer_pretty(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.emitted_key = Some(key.to_string());
        info!(store = key, "combined document emitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AssembledItem;

    fn item(parent: &str) -> AssembledItem {
        AssembledItem {
            parent_identifier: parent.to_string(),
            display_name: None,
            products: Vec::new(),
        }
    }

    #[test]
    fn json_lines_one_record_per_line() {
        let mut sink = JsonLinesSink::from_writer(Vec::new());
        sink.emit("burritos", &item("burritos")).unwrap();
        sink.emit("tacos", &item("tacos")).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["name"], "burritos");
    }

    #[test]
    fn json_lines_rejects_duplicate_parent() {
        let mut sink = JsonLinesSink::from_writer(Vec::new());
        sink.emit("burritos", &item("burritos")).unwrap();
        assert!(matches!(
            sink.emit("burritos", &item("burritos")).unwrap_err(),
            SinkError::DuplicateEmission { .. }
        ));
    }

    #[test]
    fn document_sink_is_single_shot() {
        let mut sink = JsonDocumentSink::from_writer(Vec::new());
        sink.emit("store", &item("store")).unwrap();
        assert!(matches!(
            sink.emit("other", &item("other")).unwrap_err(),
            SinkError::DuplicateEmission { .. }
        ));
    }

    #[test]
    fn create_writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jl");
        {
            let mut sink = JsonLinesSink::create(&path).unwrap();
            sink.emit("burritos", &item("burritos")).unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("burritos"));
    }
}
