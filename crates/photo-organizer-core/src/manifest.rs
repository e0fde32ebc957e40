use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use csv::ByteRecord;

use crate::mover::MovedFileRecord;

/// Ledger columns, in file order.
pub const HEADERS: [&str; 12] = [
    "filename",
    "relative_path",
    "source_folder",
    "file_size_bytes",
    "file_size_mb",
    "file_modified",
    "capture_date",
    "camera_make",
    "camera_model",
    "file_hash",
    "extension",
    "organized_date",
];

/// Column holding the unique key.
const KEY_COLUMN: usize = 1;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CAPTURE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// One ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub filename: String,
    pub relative_path: String,
    pub source_folder: String,
    pub file_size_bytes: u64,
    pub file_modified: NaiveDateTime,
    pub capture_date: NaiveDateTime,
    /// Reserved, never populated
    pub camera_make: String,
    pub camera_model: String,
    pub file_hash: String,
    /// Lowercase, with leading dot
    pub extension: String,
    pub organized_date: NaiveDateTime,
}

impl ManifestEntry {
    pub fn from_record(record: &MovedFileRecord, organized_date: NaiveDateTime) -> Self {
        let filename = record
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = record
            .destination
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Self {
            filename,
            relative_path: record.relative_path.clone(),
            source_folder: record.source_folder.clone(),
            file_size_bytes: record.size,
            file_modified: record.modified,
            capture_date: record.capture_date,
            camera_make: String::new(),
            camera_model: String::new(),
            file_hash: record.hash.clone().unwrap_or_default(),
            extension,
            organized_date,
        }
    }

    pub fn file_size_mb(&self) -> String {
        format!("{:.2}", self.file_size_bytes as f64 / (1024.0 * 1024.0))
    }

    fn to_record(&self) -> ByteRecord {
        ByteRecord::from(vec![
            self.filename.clone(),
            self.relative_path.clone(),
            self.source_folder.clone(),
            self.file_size_bytes.to_string(),
            self.file_size_mb(),
            self.file_modified.format(TIMESTAMP_FORMAT).to_string(),
            self.capture_date.format(CAPTURE_FORMAT).to_string(),
            self.camera_make.clone(),
            self.camera_model.clone(),
            self.file_hash.clone(),
            self.extension.clone(),
            self.organized_date.format(TIMESTAMP_FORMAT).to_string(),
        ])
    }
}

/// The whole ledger, rows keyed (and therefore sorted) by relative path.
/// Existing rows are kept byte for byte, whatever columns or encoding they carry.
#[derive(Debug, Clone)]
pub struct Manifest {
    headers: ByteRecord,
    rows: BTreeMap<Vec<u8>, ByteRecord>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            headers: ByteRecord::from(HEADERS.to_vec()),
            rows: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Load the ledger at `path`. A missing or unreadable ledger is an empty one.
    /// Rows are never rejected for their content.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(manifest) => manifest,
            Err(e) => {
                if path.exists() {
                    log::warn!("Could not read manifest, starting fresh: {:#}", e);
                }
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        // Byte records: a row that is not valid UTF-8 must survive the rewrite
        let mut records = rdr.byte_records();
        let headers = match records.next() {
            Some(header) => header?,
            None => return Ok(Self::default()),
        };

        let mut rows = BTreeMap::new();
        for record in records {
            let record = record?;
            if let Some(key) = record.get(KEY_COLUMN) {
                rows.insert(key.to_vec(), record);
            }
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.rows.contains_key(relative_path.as_bytes())
    }

    pub fn get(&self, relative_path: &str) -> Option<&ByteRecord> {
        self.rows.get(relative_path.as_bytes())
    }

    /// Add an entry unless its key is already present. Returns whether it was added.
    pub fn insert(&mut self, entry: &ManifestEntry) -> bool {
        if self.contains(&entry.relative_path) {
            return false;
        }
        self.rows
            .insert(entry.relative_path.as_bytes().to_vec(), entry.to_record());
        true
    }

    /// Rewrite the ledger: header, then every row in key order.
    /// Written to a sibling temp file first, then renamed into place.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let temp_path = path.with_extension("csv.tmp");
        {
            let mut wtr = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&temp_path)
                .with_context(|| format!("Failed to create {}", temp_path.display()))?;
            wtr.write_byte_record(&self.headers)?;
            for row in self.rows.values() {
                wtr.write_byte_record(row)?;
            }
            wtr.flush()?;
        }

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// Merge newly moved files into the ledger at `path` and rewrite it.
/// Keys already in the ledger are left untouched. Returns the number of rows added.
pub fn merge(path: &Path, records: &[MovedFileRecord]) -> anyhow::Result<usize> {
    let mut manifest = Manifest::load(path);
    let organized_date = Local::now().naive_local();

    let mut added = 0;
    for record in records {
        if manifest.insert(&ManifestEntry::from_record(record, organized_date)) {
            added += 1;
        }
    }

    manifest.save(path)?;
    Ok(added)
}
