//! Token and usage storage.
//!
//! All state lives behind one mutex. With a data file configured, tokens are
//! kept in a JSON snapshot that is rewritten on every token mutation through a
//! synced temp file and a rename, so a crash leaves either the old or the new
//! snapshot on disk. Usage records go to a JSON-lines log next to it: one
//! appended line per call, compacted once it holds twice the capacity.

use crate::{
    config::StoreConfig,
    error::StoreError,
    models::{CreateTokenRequest, TokenRecord, UsageRecord, UsageStats},
};
use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    fs::{self, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const TOKEN_LENGTH: usize = 32;
const MAX_GENERATION_ATTEMPTS: usize = 5;
/// The usage log is compacted once it holds this many times the capacity
const USAGE_COMPACTION_FACTOR: usize = 2;

/// Generate a random alphanumeric bearer token from the OS CSPRNG
pub fn generate_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[derive(Default)]
struct StoreState {
    tokens: HashMap<String, TokenRecord>,
    usages: VecDeque<UsageRecord>,
    /// Lines currently in the usage log file, including evicted records
    usage_lines: usize,
}

#[derive(Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    tokens: Vec<TokenRecord>,
    /// Older snapshots embedded the usage log
    #[serde(default)]
    usages: Vec<UsageRecord>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    tokens: Vec<&'a TokenRecord>,
}

/// File locations of a persistent store
struct Files {
    tokens: PathBuf,
    usages: PathBuf,
}

/// Thread-safe store of bearer tokens and the usage log
pub struct TokenStore {
    state: Mutex<StoreState>,
    files: Option<Files>,
    usage_capacity: usize,
}

impl TokenStore {
    /// Memory-only store with default capacity
    pub fn in_memory() -> Self {
        Self::with_state(StoreState::default(), None, StoreConfig::default().usage_log_capacity)
    }

    /// Open the store described by `config`, loading any existing snapshot and
    /// usage log and inserting the bootstrap admin token if one is configured.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let capacity = config.usage_log_capacity.max(1);
        let files = config.data_file.as_ref().map(|path| Files {
            tokens: path.clone(),
            usages: usage_log_path(path),
        });

        let (state, legacy_usages) = match &files {
            Some(files) => {
                ensure_parent_dir(&files.tokens)?;
                load_state(files, capacity)?
            }
            None => (StoreState::default(), false),
        };
        let store = Self::with_state(state, files, capacity);

        {
            let mut state = store.lock();
            if legacy_usages || state.usage_lines > capacity {
                store.compact_usages(&mut state)?;
            }
            if legacy_usages {
                store.persist_tokens(&state)?;
            }
        }

        if let Some(token) = &config.bootstrap_admin_token {
            let record = TokenRecord::new(
                token.clone(),
                true,
                Some(config.bootstrap_admin_description.clone()),
            );
            let hint = record.hint();
            if store.insert_token(record)? {
                info!(token_hint = %hint, "Bootstrap admin token inserted");
            } else {
                debug!(token_hint = %hint, "Bootstrap admin token already present");
            }
        }

        info!(
            persistent = store.files.is_some(),
            tokens = store.lock().tokens.len(),
            "Token store opened"
        );
        Ok(store)
    }

    fn with_state(state: StoreState, files: Option<Files>, usage_capacity: usize) -> Self {
        Self {
            state: Mutex::new(state),
            files,
            usage_capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic while holding the lock cannot leave a record half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create and store a new token with a fresh random value
    pub fn create_token(&self, request: &CreateTokenRequest) -> Result<TokenRecord, StoreError> {
        let mut state = self.lock();

        let token = (0..MAX_GENERATION_ATTEMPTS)
            .map(|_| generate_token())
            .find(|candidate| !state.tokens.contains_key(candidate))
            .ok_or(StoreError::TokenSpaceExhausted(MAX_GENERATION_ATTEMPTS))?;

        let record = TokenRecord::new(token.clone(), request.is_admin, request.description.clone());
        state.tokens.insert(token.clone(), record.clone());

        if let Err(e) = self.persist_tokens(&state) {
            state.tokens.remove(&token);
            return Err(e);
        }
        Ok(record)
    }

    /// Insert a pre-built record. Returns `false` when the token already exists.
    pub fn insert_token(&self, record: TokenRecord) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if state.tokens.contains_key(&record.token) {
            return Ok(false);
        }

        let token = record.token.clone();
        state.tokens.insert(token.clone(), record);
        if let Err(e) = self.persist_tokens(&state) {
            state.tokens.remove(&token);
            return Err(e);
        }
        Ok(true)
    }

    /// Insert or overwrite a record. Used by the seed tool's `--force`.
    pub fn upsert_token(&self, record: TokenRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        let previous = state.tokens.insert(record.token.clone(), record.clone());
        if let Err(e) = self.persist_tokens(&state) {
            match previous {
                Some(old) => state.tokens.insert(old.token.clone(), old),
                None => state.tokens.remove(&record.token),
            };
            return Err(e);
        }
        Ok(())
    }
    /// Look up a token that exists and has not been revoked
    pub fn get_active(&self, token: &str) -> Option<TokenRecord> {
        self.lock()
            .tokens
            .get(token)
            .filter(|record| record.is_active)
            .cloned()
    }

    /// All active tokens, oldest first
    pub fn list_active(&self) -> Vec<TokenRecord> {
        let mut tokens: Vec<TokenRecord> = self
            .lock()
            .tokens
            .values()
            .filter(|record| record.is_active)
            .cloned()
            .collect();
        tokens.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.token.cmp(&b.token))
        });
        tokens
    }

    /// Soft-delete a token. Returns `true` only if an active token was revoked.
    pub fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        let mut state = self.lock();
        match state.tokens.get_mut(token) {
            Some(record) if record.is_active => record.is_active = false,
            _ => return Ok(false),
        }

        if let Err(e) = self.persist_tokens(&state) {
            if let Some(record) = state.tokens.get_mut(token) {
                record.is_active = true;
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Append a usage record, evicting the oldest past capacity.
    ///
    /// With a data file this appends one line to the usage log; the token
    /// snapshot is not touched. Callers on an async worker should run this
    /// through `web::block`.
    pub fn log_usage(&self, record: UsageRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(files) = &self.files {
            append_line(&files.usages, &record)?;
            state.usage_lines += 1;
        }

        state.usages.push_back(record);
        while state.usages.len() > self.usage_capacity {
            state.usages.pop_front();
        }

        if state.usage_lines > self.usage_capacity * USAGE_COMPACTION_FACTOR {
            self.compact_usages(&mut state)?;
        }
        Ok(())
    }

    /// Snapshot of the usage log, oldest first
    pub fn usage_records(&self) -> Vec<UsageRecord> {
        self.lock().usages.iter().cloned().collect()
    }

    pub fn usage_stats(&self) -> UsageStats {
        UsageStats::from_records(self.lock().usages.iter())
    }

    fn persist_tokens(&self, state: &StoreState) -> Result<(), StoreError> {
        let Some(files) = &self.files else {
            return Ok(());
        };

        let mut tokens: Vec<&TokenRecord> = state.tokens.values().collect();
        tokens.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.token.cmp(&b.token)));
        let bytes = serde_json::to_vec_pretty(&SnapshotRef { tokens })?;

        write_atomically(&files.tokens, &bytes).map_err(|source| StoreError::Write {
            path: files.tokens.clone(),
            source,
        })
    }

    /// Rewrite the usage log with only the retained records
    fn compact_usages(&self, state: &mut StoreState) -> Result<(), StoreError> {
        let Some(files) = &self.files else {
            return Ok(());
        };

        let mut bytes = Vec::new();
        for record in &state.usages {
            serde_json::to_writer(&mut bytes, record)?;
            bytes.push(b'\n');
        }
        write_atomically(&files.usages, &bytes).map_err(|source| StoreError::Write {
            path: files.usages.clone(),
            source,
        })?;

        debug!(
            dropped = state.usage_lines.saturating_sub(state.usages.len()),
            kept = state.usages.len(),
            "Usage log compacted"
        );
        state.usage_lines = state.usages.len();
        Ok(())
    }
}

/// `tokens.json` keeps its usage log in `tokens.usage.jsonl`
pub fn usage_log_path(data_file: &Path) -> PathBuf {
    data_file.with_extension("usage.jsonl")
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

/// Returns the loaded state and whether the snapshot still embedded usages
fn load_state(files: &Files, capacity: usize) -> Result<(StoreState, bool), StoreError> {
    let snapshot = load_snapshot(&files.tokens)?;
    let legacy_usages = !snapshot.usages.is_empty();

    let mut usages: VecDeque<UsageRecord> = snapshot.usages.into();
    let usage_lines = load_usage_log(&files.usages, &mut usages)?;
    while usages.len() > capacity {
        usages.pop_front();
    }

    let state = StoreState {
        tokens: snapshot
            .tokens
            .into_iter()
            .map(|record| (record.token.clone(), record))
            .collect(),
        usages,
        usage_lines,
    };
    Ok((state, legacy_usages))
}

fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Snapshot::default());
    }
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every usage line into `usages`, returning the number of lines on disk.
/// A line that does not parse (a torn final append) is skipped.
fn load_usage_log(path: &Path, usages: &mut VecDeque<UsageRecord>) -> Result<usize, StoreError> {
    let read_error = |source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(source) => return Err(read_error(source)),
    };

    let mut lines = 0;
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(read_error)?;
        if line.trim().is_empty() {
            continue;
        }
        lines += 1;
        match serde_json::from_str(&line) {
            Ok(record) => usages.push_back(record),
            Err(e) => warn!(line = number + 1, error = %e, "Skipping unreadable usage record"),
        }
    }
    Ok(lines)
}

fn append_line(path: &Path, record: &UsageRecord) -> Result<(), StoreError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(&line))
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Write through a uniquely named, synced temp file in the target directory,
/// then rename it over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn persistent_config(dir: &TempDir) -> StoreConfig {
        StoreConfig {
            data_file: Some(dir.path().join("store.json")),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_generated_tokens_are_alphanumeric() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_create_get_list_revoke() {
        let store = TokenStore::in_memory();
        let created = store
            .create_token(&CreateTokenRequest {
                is_admin: false,
                description: Some("mobile app".to_string()),
            })
            .unwrap();

        assert!(created.is_active);
        assert_eq!(store.get_active(&created.token), Some(created.clone()));
        assert_eq!(store.list_active(), vec![created.clone()]);

        assert!(store.revoke(&created.token).unwrap());
        assert_eq!(store.get_active(&created.token), None);
        assert!(store.list_active().is_empty());

        // Revoking twice reports nothing changed
        assert!(!store.revoke(&created.token).unwrap());
        assert!(!store.revoke("does-not-exist").unwrap());
    }

    #[test]
    fn test_insert_does_not_overwrite() {
        let store = TokenStore::in_memory();
        assert!(store
            .insert_token(TokenRecord::new("seed", true, None))
            .unwrap());
        assert!(!store
            .insert_token(TokenRecord::new("seed", false, Some("other".to_string())))
            .unwrap());
        assert!(store.get_active("seed").unwrap().is_admin);
    }

    #[test]
    fn test_upsert_reactivates() {
        let store = TokenStore::in_memory();
        store.insert_token(TokenRecord::new("seed", false, None)).unwrap();
        store.revoke("seed").unwrap();

        store.upsert_token(TokenRecord::new("seed", true, None)).unwrap();
        let record = store.get_active("seed").unwrap();
        assert!(record.is_admin);
    }

    #[test]
    fn test_usage_log_capacity() {
        let store = TokenStore::open(&StoreConfig {
            usage_log_capacity: 3,
            ..StoreConfig::default()
        })
        .unwrap();

        for i in 0..5 {
            store
                .log_usage(UsageRecord::new(&format!("t{i}"), "/moderate", "POST", 200))
                .unwrap();
        }
        let tokens: Vec<String> = store.usage_records().into_iter().map(|u| u.token).collect();
        assert_eq!(tokens, vec!["t2", "t3", "t4"]);
        assert_eq!(store.usage_stats().total_requests, 3);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = persistent_config(&dir);

        let (kept, revoked) = {
            let store = TokenStore::open(&config).unwrap();
            let kept = store.create_token(&CreateTokenRequest::default()).unwrap();
            let revoked = store.create_token(&CreateTokenRequest::default()).unwrap();
            store.revoke(&revoked.token).unwrap();
            store
                .log_usage(UsageRecord::new(&kept.token, "/moderate", "POST", 200))
                .unwrap();
            (kept, revoked)
        };

        let reopened = TokenStore::open(&config).unwrap();
        assert_eq!(reopened.get_active(&kept.token), Some(kept));
        assert_eq!(reopened.get_active(&revoked.token), None);
        assert_eq!(reopened.usage_records().len(), 1);

        // Only the snapshot and the usage log are left behind
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["store.json", "store.usage.jsonl"]);
    }

    #[test]
    fn test_usage_is_appended_without_rewriting_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = persistent_config(&dir);
        let store = TokenStore::open(&config).unwrap();
        store.insert_token(TokenRecord::new("seed", true, None)).unwrap();

        let snapshot_path = dir.path().join("store.json");
        let snapshot_before = fs::read(&snapshot_path).unwrap();
        for _ in 0..3 {
            store
                .log_usage(UsageRecord::new("seed", "/moderate", "POST", 200))
                .unwrap();
        }

        assert_eq!(fs::read(&snapshot_path).unwrap(), snapshot_before);
        let log = fs::read_to_string(dir.path().join("store.usage.jsonl")).unwrap();
        assert_eq!(log.lines().count(), 3);
        let first: UsageRecord = serde_json::from_str(log.lines().next().unwrap()).unwrap();
        assert_eq!(first.endpoint, "/moderate");
    }

    #[test]
    fn test_usage_log_is_compacted() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            usage_log_capacity: 2,
            ..persistent_config(&dir)
        };
        let log_path = dir.path().join("store.usage.jsonl");

        let store = TokenStore::open(&config).unwrap();
        for i in 0..4 {
            store
                .log_usage(UsageRecord::new(&format!("t{i}"), "/moderate", "POST", 200))
                .unwrap();
        }
        assert_eq!(fs::read_to_string(&log_path).unwrap().lines().count(), 4);

        // The fifth line crosses twice the capacity and triggers a rewrite
        store
            .log_usage(UsageRecord::new("t4", "/moderate", "POST", 200))
            .unwrap();
        assert_eq!(fs::read_to_string(&log_path).unwrap().lines().count(), 2);

        let tokens: Vec<String> = TokenStore::open(&config)
            .unwrap()
            .usage_records()
            .into_iter()
            .map(|u| u.token)
            .collect();
        assert_eq!(tokens, vec!["t3", "t4"]);
    }

    #[test]
    fn test_torn_usage_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = persistent_config(&dir);
        {
            let store = TokenStore::open(&config).unwrap();
            store
                .log_usage(UsageRecord::new("a", "/moderate", "POST", 200))
                .unwrap();
        }
        let log_path = dir.path().join("store.usage.jsonl");
        let mut log = fs::read_to_string(&log_path).unwrap();
        log.push_str("{\"token\": \"b\", \"endpo");
        fs::write(&log_path, log).unwrap();

        let reopened = TokenStore::open(&config).unwrap();
        assert_eq!(reopened.usage_records().len(), 1);
        assert_eq!(reopened.usage_records()[0].token, "a");
    }

    #[test]
    fn test_embedded_usages_move_to_the_log() {
        let dir = TempDir::new().unwrap();
        let config = persistent_config(&dir);
        let record = UsageRecord::new("seed", "/moderate", "POST", 200);
        let legacy = serde_json::json!({
            "tokens": [TokenRecord::new("seed", true, None)],
            "usages": [record],
        });
        fs::write(dir.path().join("store.json"), legacy.to_string()).unwrap();

        let store = TokenStore::open(&config).unwrap();
        assert!(store.get_active("seed").is_some());
        assert_eq!(store.usage_records().len(), 1);

        let snapshot: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("store.json")).unwrap()).unwrap();
        assert!(snapshot.get("usages").is_none());
        let log = fs::read_to_string(dir.path().join("store.usage.jsonl")).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    #[test]
    fn test_missing_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            data_file: Some(dir.path().join("nested/data/store.json")),
            ..StoreConfig::default()
        };
        let store = TokenStore::open(&config).unwrap();
        store
            .log_usage(UsageRecord::new("a", "/moderate", "POST", 200))
            .unwrap();
        assert!(dir.path().join("nested/data/store.usage.jsonl").exists());
    }

    #[test]
    fn test_bootstrap_token_inserted_once() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            bootstrap_admin_token: Some("admin-token-12345".to_string()),
            ..persistent_config(&dir)
        };

        let store = TokenStore::open(&config).unwrap();
        let admin = store.get_active("admin-token-12345").unwrap();
        assert!(admin.is_admin);
        assert_eq!(
            admin.description.as_deref(),
            Some("Initial admin token for setup")
        );
        drop(store);

        let reopened = TokenStore::open(&config).unwrap();
        assert_eq!(reopened.list_active().len(), 1);
        assert_eq!(reopened.get_active("admin-token-12345").unwrap(), admin);
    }

    #[test]
    fn test_revoked_bootstrap_token_stays_revoked() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            bootstrap_admin_token: Some("admin-token-12345".to_string()),
            ..persistent_config(&dir)
        };

        TokenStore::open(&config)
            .unwrap()
            .revoke("admin-token-12345")
            .unwrap();

        let reopened = TokenStore::open(&config).unwrap();
        assert_eq!(reopened.get_active("admin-token-12345"), None);
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = persistent_config(&dir);
        fs::write(dir.path().join("store.json"), b"{ not json").unwrap();

        assert!(matches!(
            TokenStore::open(&config),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
