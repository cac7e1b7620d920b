//! CSV append-log storage
//!
//! Every assigned key is appended as a `key,url` record. Opening the store
//! replays the whole log into memory; reads never touch the file.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use super::{LinkStore, advance_last_key, keys_by_url};
use crate::errors::{LinkError, Result};
use crate::system::background::BackgroundRunner;

/// When appended records reach the file.
#[derive(Clone)]
pub enum Persistence {
    /// 先写文件再更新内存，写失败则整批无效
    Immediate,
    /// 先更新内存，由后台任务追加写入；写失败只记录日志
    Background(BackgroundRunner),
}

#[derive(Default)]
struct FileState {
    links: HashMap<String, String>,
    last_key: Option<String>,
}

pub struct FileLinkStore {
    path: PathBuf,
    state: RwLock<FileState>,
    persistence: Persistence,
    append_lock: Arc<Mutex<()>>,
}

impl FileLinkStore {
    /// Opens the log at `path`, replaying existing records.
    ///
    /// A missing file is an empty store; it is created on first write.
    pub fn open<P: AsRef<Path>>(path: P, persistence: Persistence) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = restore(&path)?;

        info!(
            "FileLinkStore loaded {} links from {}",
            state.links.len(),
            path.display()
        );

        Ok(Self {
            path,
            state: RwLock::new(state),
            persistence,
            append_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn len(&self) -> usize {
        self.state.read().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(&self, batch: &[(String, String)]) {
        let mut state = self.state.write();
        for (key, url) in batch {
            state.links.insert(key.clone(), url.clone());
            advance_last_key(&mut state.last_key, key);
        }
    }
}

fn restore(path: &Path) -> Result<FileState> {
    let mut state = FileState::default();

    if !path.exists() {
        debug!("Link log {} does not exist yet", path.display());
        return Ok(state);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != 2 {
            return Err(LinkError::store_failure(format!(
                "malformed record {} in {}: expected 2 fields, got {}",
                index + 1,
                path.display(),
                record.len()
            )));
        }

        let key = &record[0];
        state.links.insert(key.to_string(), record[1].to_string());
        advance_last_key(&mut state.last_key, key);
    }

    Ok(state)
}

fn append_records(path: &Path, batch: &[(String, String)]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    for (key, url) in batch {
        writer.write_record([key.as_str(), url.as_str()])?;
    }
    writer.flush()?;

    Ok(())
}

#[async_trait]
impl LinkStore for FileLinkStore {
    async fn store_many(&self, batch: &[(String, String)]) -> Result<HashMap<String, String>> {
        if batch.is_empty() {
            return Ok(HashMap::new());
        }

        match &self.persistence {
            Persistence::Immediate => {
                {
                    let _guard = self.append_lock.lock();
                    append_records(&self.path, batch)?;
                }
                self.apply(batch);
            }
            Persistence::Background(runner) => {
                self.apply(batch);

                let path = self.path.clone();
                let records = batch.to_vec();
                let append_lock = Arc::clone(&self.append_lock);
                runner.run_blocking(move || {
                    let _guard = append_lock.lock();
                    match append_records(&path, &records) {
                        Ok(()) => debug!("Persisted {} links in background", records.len()),
                        Err(e) => error!(
                            "Failed to persist {} links to {}: {}",
                            records.len(),
                            path.display(),
                            e
                        ),
                    }
                });
            }
        }

        Ok(keys_by_url(batch))
    }

    async fn get_one(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().links.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        let state = self.state.read();
        Ok(keys
            .iter()
            .filter_map(|key| state.links.get(key).map(|url| (key.clone(), url.clone())))
            .collect())
    }

    async fn last_assigned_key(&self) -> Result<Option<String>> {
        Ok(self.state.read().last_key.clone())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
