//! Where resolved mapping records end up.
//!
//! JSON lines is the only export format. Parquet files and database tables
//! are not written here: callers that need them load the JSONL output or
//! implement [`MappingSink`] themselves. Asking for `parquet` fails when the
//! config is read, with `LineageError::UnsupportedExportFormat`.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::config::{ExportFormat, LineageConfig};
use crate::tracer::MappingRecord;

pub trait MappingSink {
    fn write(&mut self, records: &[MappingRecord]) -> anyhow::Result<()>;
}

/// Appends one JSON object per record and line.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MappingSink for JsonlSink {
    fn write(&mut self, records: &[MappingRecord]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| anyhow!("Failed to open {}: {}", self.path.display(), err))?;
        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<MappingRecord>,
}

impl MappingSink for MemorySink {
    fn write(&mut self, records: &[MappingRecord]) -> anyhow::Result<()> {
        self.records.extend_from_slice(records);
        Ok(())
    }
}

/// File the configured sink writes to.
pub fn export_file(config: &LineageConfig, default_dir: &Path) -> PathBuf {
    config
        .export_path
        .as_deref()
        .unwrap_or(default_dir)
        .join(config.export_format.file_name())
}

pub fn sink_for(config: &LineageConfig, default_dir: &Path) -> Box<dyn MappingSink> {
    let path = export_file(config, default_dir);
    match config.export_format {
        ExportFormat::Jsonl => Box::new(JsonlSink::new(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, target: &str) -> MappingRecord {
        MappingRecord {
            source_model: "orders".to_owned(),
            target_model: "totals".to_owned(),
            source_trace_id: source.to_owned(),
            target_trace_id: target.to_owned(),
            compiled_sql: "select 1".to_owned(),
            executed_at: "2024-01-01T00:00:00.000000Z".to_owned(),
        }
    }

    #[test]
    fn jsonl_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lineage.jsonl");
        let mut sink = JsonlSink::new(&path);
        sink.write(&[record("s1", "t1")]).unwrap();
        sink.write(&[record("s2", "t1"), record("s3", "t2")]).unwrap();

        let lines = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<MappingRecord>(line).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![record("s1", "t1"), record("s2", "t1"), record("s3", "t2")]
        );
    }

    #[test]
    fn export_path_overrides_default_dir() {
        let config = LineageConfig {
            export_path: Some(PathBuf::from("/data/lineage")),
            ..Default::default()
        };
        assert_eq!(
            export_file(&config, Path::new("output/lineage")),
            PathBuf::from("/data/lineage/lineage.jsonl")
        );
        assert_eq!(
            export_file(&LineageConfig::default(), Path::new("output/lineage")),
            PathBuf::from("output/lineage/lineage.jsonl")
        );
    }

    #[test]
    fn memory_sink_collects() {
        let mut sink = MemorySink::default();
        sink.write(&[record("s1", "t1")]).unwrap();
        assert_eq!(sink.records.len(), 1);
    }

    #[test]
    fn jsonl_is_the_only_export_format() {
        assert_eq!(ExportFormat::parse("JSONL").unwrap(), ExportFormat::Jsonl);
        for format in ["parquet", "table"] {
            let err = ExportFormat::parse(format).unwrap_err();
            assert!(err.to_string().contains("supported: jsonl"), "{}", err);
        }
    }
}
