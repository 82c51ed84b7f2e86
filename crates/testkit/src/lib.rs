#![warn(missing_docs)]
//! Deterministic testing surfaces: event recorders, scripted ray queries and
//! newline-delimited JSON traces.

mod recorder;
mod scripted;

use anyhow::{Context, Result};
use pointerkit_core::SimTick;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use recorder::*;
pub use scripted::*;

/// Primary event record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a, P: Serialize> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Structured payload.
    pub payload: &'a P,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    writer: BufWriter<File>,
    records: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create trace directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create trace {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    /// Append an event to the log.
    pub fn write<P: Serialize>(&mut self, event: &EventRecord<'_, P>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush buffered records to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            tracing::warn!(%err, "failed to flush trace");
        }
    }
}
