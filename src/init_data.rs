//! Purpose: Populate the local data file from a remote source (`jsonsieve init`).
//! Exports: `InitConfig`, `InitResult`, `init`.
//! Role: Offline data refresh; runs before the server starts and never during requests.
//! Invariants: Existing files are never overwritten unless `force` is set.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use jsonsieve::api::{Error, ErrorKind, RemoteSource};

#[derive(Debug)]
pub struct InitConfig {
    pub url: String,
    pub out: PathBuf,
    pub timeout: Duration,
    pub force: bool,
}

#[derive(Debug)]
pub struct InitResult {
    pub path: String,
    pub records: usize,
    pub overwrote_existing: bool,
}

pub fn init(config: InitConfig) -> Result<InitResult, Error> {
    let source = RemoteSource::new(&config.url)?.with_timeout(config.timeout);
    let records = source.load()?;
    write_records(&config.out, &records, config.force)
}

fn write_records(path: &Path, records: &[Value], force: bool) -> Result<InitResult, Error> {
    let existed = path.exists();
    if existed && !force {
        return Err(Error::new(ErrorKind::AlreadyExists)
            .with_message("data file already exists")
            .with_path(path)
            .with_hint("Re-run with --force to overwrite, or choose a different --out path."));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to create data directory")
                    .with_path(parent)
                    .with_source(err)
            })?;
        }
    }

    let mut body = serde_json::to_string_pretty(records).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode records")
            .with_source(err)
    })?;
    body.push('\n');
    fs::write(path, body).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write data file")
            .with_path(path)
            .with_source(err)
    })?;

    Ok(InitResult {
        path: path.display().to_string(),
        records: records.len(),
        overwrote_existing: existed && force,
    })
}
