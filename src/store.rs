use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;
use crate::models::{Config, RawVideoInfo, SideFields, VideoRecord};
use crate::paths::AppPaths;

use anyhow::Result;
use fd_lock::RwLock;

const RECORDS_FILE: &str = "records.jsonl";
const SIDE_FIELDS_FILE: &str = "side_fields.json";
const INFO_SUFFIX: &str = ".info.json";

/// The normalized watch history. `side_fields[i]` belongs to `records[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
    pub records: Vec<VideoRecord>,
    pub side_fields: Vec<SideFields>,
}

/// Loads the cached snapshot if it is usable, otherwise rebuilds it from the
/// raw metadata files and writes a fresh snapshot.
///
/// The snapshot is read under a shared lock and rebuilt under an exclusive one.
pub fn load_or_build(paths: &AppPaths, refresh: bool) -> Result<RecordStore, AnalysisError> {
    let mut lock = open_lock(&paths.lock_file)?;

    if !refresh {
        let _guard = lock
            .read()
            .map_err(|e| AnalysisError::io(&paths.lock_file, e))?;

        match load_cached(&paths.cache_dir) {
            Ok(Some(store)) => {
                log::info!(
                    "Loaded {} records from cache {}",
                    store.records.len(),
                    paths.cache_dir.display()
                );
                return Ok(store);
            }
            Ok(None) => log::info!("No cache snapshot yet, building from raw files"),
            Err(e) => log::warn!("{e}; rebuilding from raw files"),
        }
    }

    let _guard = lock
        .write()
        .map_err(|e| AnalysisError::io(&paths.lock_file, e))?;

    let store = load_raw(&paths.raw_dir)?;
    save(&store, &paths.cache_dir)?;
    log::info!(
        "Built cache snapshot with {} records in {}",
        store.records.len(),
        paths.cache_dir.display()
    );

    Ok(store)
}

fn open_lock(path: &Path) -> Result<RwLock<File>, AnalysisError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| AnalysisError::io(path, e))?;
    Ok(RwLock::new(file))
}

/// Returns true if `raw_dir` holds at least one metadata file.
pub fn has_raw_data(raw_dir: &Path) -> bool {
    list_info_files(raw_dir).is_ok_and(|files| !files.is_empty())
}

/// Builds the store from every `*.info.json` file in `raw_dir`, in file name
/// order. Any file that fails to parse aborts the load.
pub fn load_raw(raw_dir: &Path) -> Result<RecordStore, AnalysisError> {
    let files = list_info_files(raw_dir)?;
    if files.is_empty() {
        return Err(AnalysisError::MissingData {
            dir: raw_dir.to_path_buf(),
        });
    }

    let mut records = Vec::with_capacity(files.len());
    let mut side_fields = Vec::with_capacity(files.len());

    for path in &files {
        let data = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let raw: RawVideoInfo =
            serde_json::from_str(&data).map_err(|e| AnalysisError::malformed(path, e))?;
        let (record, side) = raw
            .into_parts()
            .map_err(|e| AnalysisError::malformed(path, format!("invalid upload_date: {e}")))?;
        records.push(record);
        side_fields.push(side);
    }

    log::info!("Parsed {} metadata files from {}", records.len(), raw_dir.display());

    Ok(RecordStore {
        records,
        side_fields,
    })
}

fn list_info_files(raw_dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let entries = match fs::read_dir(raw_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AnalysisError::io(raw_dir, e)),
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !n.starts_with('.') && n.ends_with(INFO_SUFFIX))
        })
        .collect();

    // Autonumbered names are zero-padded, so name order is export order
    files.sort();
    Ok(files)
}

/// Reads the snapshot from `cache_dir`. Returns `Ok(None)` when either file
/// is missing and an error when the pair cannot be trusted.
pub fn load_cached(cache_dir: &Path) -> Result<Option<RecordStore>, AnalysisError> {
    let records_path = cache_dir.join(RECORDS_FILE);
    let side_path = cache_dir.join(SIDE_FIELDS_FILE);

    if !records_path.is_file() || !side_path.is_file() {
        return Ok(None);
    }

    let file = File::open(&records_path).map_err(|e| AnalysisError::io(&records_path, e))?;
    let mut records = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| AnalysisError::io(&records_path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: VideoRecord =
            serde_json::from_str(&line).map_err(|e| AnalysisError::CorruptCache {
                path: records_path.clone(),
                reason: format!("line {}: {e}", n + 1),
            })?;
        records.push(record);
    }

    let data = fs::read_to_string(&side_path).map_err(|e| AnalysisError::io(&side_path, e))?;
    let side_fields: Vec<SideFields> =
        serde_json::from_str(&data).map_err(|e| AnalysisError::CorruptCache {
            path: side_path.clone(),
            reason: e.to_string(),
        })?;

    if records.is_empty() {
        return Err(AnalysisError::CorruptCache {
            path: records_path,
            reason: "snapshot holds no records".to_string(),
        });
    }

    if records.len() != side_fields.len() {
        return Err(AnalysisError::CorruptCache {
            path: side_path,
            reason: format!(
                "{} records but {} side field entries",
                records.len(),
                side_fields.len()
            ),
        });
    }

    Ok(Some(RecordStore {
        records,
        side_fields,
    }))
}

/// Writes the snapshot to `cache_dir`, replacing each file atomically.
pub fn save(store: &RecordStore, cache_dir: &Path) -> Result<(), AnalysisError> {
    let mut rows = String::new();
    for record in &store.records {
        let line = serde_json::to_string(record)
            .map_err(|e| AnalysisError::io(cache_dir.join(RECORDS_FILE), io::Error::other(e)))?;
        rows.push_str(&line);
        rows.push('\n');
    }
    write_atomic(&cache_dir.join(RECORDS_FILE), rows.as_bytes())?;

    let side = serde_json::to_string(&store.side_fields).map_err(|e| {
        AnalysisError::io(cache_dir.join(SIDE_FIELDS_FILE), io::Error::other(e))
    })?;
    write_atomic(&cache_dir.join(SIDE_FIELDS_FILE), side.as_bytes())
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), AnalysisError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, data).map_err(|e| AnalysisError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| AnalysisError::io(path, e))
}

pub fn load_config(path: &Path) -> Config {
    if let Ok(data) = fs::read_to_string(path) {
        serde_json::from_str(&data).unwrap_or_default()
    } else {
        Config::default()
    }
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data)?;
    Ok(())
}
