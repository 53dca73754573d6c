use crate::core::config::CACHE_RELATIVE_PATH;
use crate::core::entry::Entry;
use crate::core::error::{Error, Result};
use crate::indexing::source::TaskSource;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Bumped whenever the layout of [`CacheRecord`] or [`Entry`] changes
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// What gets persisted: the entries plus everything needed to decide
/// whether they still describe the files on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    version: u32,
    glob_patterns: Vec<String>,
    cache_key: String,
    files: Vec<PathBuf>,
    entries: Vec<Entry>,
}

/// Why a cached index was not used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    Missing,
    Corrupt,
    VersionMismatch,
    PatternsChanged,
    SettingsChanged,
    FileSetChanged,
    FileModified,
}

/// Cached view over a [`TaskSource`]
///
/// The cache lives at `<root>/tmp/zen_apropos_index.cache`. It is fresh
/// while the source's patterns and settings are unchanged, the scan yields
/// the same files, and none of them is newer than the cache file itself.
/// Anything else triggers a full rebuild.
pub struct Index<S: TaskSource> {
    source: S,
    cache_path: PathBuf,
}

impl<S: TaskSource> Index<S> {
    pub fn new(source: S) -> Self {
        let cache_path = source.root().join(CACHE_RELATIVE_PATH);
        Self { source, cache_path }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// All entries, from the cache when fresh, otherwise rebuilt
    pub fn entries(&self) -> Result<Vec<Entry>> {
        match self.check_cache()? {
            Ok(entries) => {
                tracing::debug!(
                    "Index cache hit: {} entries from {}",
                    entries.len(),
                    self.cache_path.display()
                );
                Ok(entries)
            }
            Err(reason) => {
                tracing::debug!("Index cache stale ({:?}), rebuilding", reason);
                self.rebuild()
            }
        }
    }

    /// Whether the persisted cache can be used as-is
    pub fn is_fresh(&self) -> Result<bool> {
        Ok(self.check_cache()?.is_ok())
    }

    /// Recompute entries from the source and persist them
    pub fn rebuild(&self) -> Result<Vec<Entry>> {
        let files = self.source.scan()?;
        let entries = self.source.entries()?;

        let record = CacheRecord {
            version: CACHE_FORMAT_VERSION,
            glob_patterns: self.source.glob_patterns().to_vec(),
            cache_key: self.source.cache_key(),
            files,
            entries,
        };

        // Failing to write the cache is not fatal
        if let Err(e) = self.write_record(&record) {
            tracing::warn!("Failed to write index cache {}: {}", self.cache_path.display(), e);
        } else {
            tracing::info!(
                "Indexed {} tasks from {} files",
                record.entries.len(),
                record.files.len()
            );
        }

        Ok(record.entries)
    }

    /// Outer error: the source could not be scanned. Inner error: the
    /// cache is unusable and why.
    fn check_cache(&self) -> Result<std::result::Result<Vec<Entry>, StaleReason>> {
        let cache_mtime = match get_file_modified_time(&self.cache_path) {
            Ok(mtime) => mtime,
            Err(_) => return Ok(Err(StaleReason::Missing)),
        };

        let record = match self.read_record() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Ignoring unreadable index cache: {}", e);
                return Ok(Err(StaleReason::Corrupt));
            }
        };

        if record.version != CACHE_FORMAT_VERSION {
            return Ok(Err(StaleReason::VersionMismatch));
        }
        if record.glob_patterns.as_slice() != self.source.glob_patterns() {
            return Ok(Err(StaleReason::PatternsChanged));
        }
        if record.cache_key != self.source.cache_key() {
            return Ok(Err(StaleReason::SettingsChanged));
        }

        let files = self.source.scan()?;
        if files != record.files {
            return Ok(Err(StaleReason::FileSetChanged));
        }

        for file in &files {
            match get_file_modified_time(file) {
                Ok(mtime) if mtime <= cache_mtime => {}
                _ => return Ok(Err(StaleReason::FileModified)),
            }
        }

        Ok(Ok(record.entries))
    }

    fn read_record(&self) -> Result<CacheRecord> {
        let file = std::fs::File::open(&self.cache_path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Cache(format!("Failed to deserialize index cache: {}", e)))
    }

    /// Write to a temporary sibling, then rename over the cache path so
    /// readers never observe a partial record
    fn write_record(&self, record: &CacheRecord) -> Result<()> {
        let parent = self
            .cache_path
            .parent()
            .ok_or_else(|| Error::Cache("Cache path has no parent directory".to_string()))?;
        std::fs::create_dir_all(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, record)
                .map_err(|e| Error::Cache(format!("Failed to serialize index cache: {}", e)))?;
            writer.flush()?;
        }

        temp.persist(&self.cache_path)
            .map_err(|e| Error::Cache(format!("Failed to persist index cache: {}", e)))?;
        Ok(())
    }
}

/// Get file modification time
pub fn get_file_modified_time(path: &Path) -> Result<SystemTime> {
    let metadata = std::fs::metadata(path)?;
    Ok(metadata.modified()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::indexing::source::RakeSource;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const TASKS: &str = "\
namespace :indexer do
  # @zen team: search
  # @zen keywords: elasticsearch, reindex
  desc 'Reindex all employees'
  task employees: :environment do
    Employee.reindex
  end
end
";

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let tasks_dir = temp_dir.path().join("lib/tasks");
        fs::create_dir_all(&tasks_dir).unwrap();
        fs::write(tasks_dir.join("indexer.rake"), TASKS).unwrap();
        temp_dir
    }

    fn index_for(config: &Config) -> Index<RakeSource> {
        Index::new(RakeSource::new(config).unwrap())
    }

    fn set_mtime(path: &Path, mtime: SystemTime) {
        fs::OpenOptions::new()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_cold_cache_builds_and_persists() {
        let temp_dir = setup();
        let index = index_for(&Config::new(temp_dir.path()));

        assert!(!index.is_fresh().unwrap());
        let entries = index.entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert!(index.cache_path().exists());
        assert!(index.is_fresh().unwrap());
    }

    #[test]
    fn test_round_trip_matches_fresh_scan() {
        let temp_dir = setup();
        let config = Config::new(temp_dir.path());
        let index = index_for(&config);

        let built = index.entries().unwrap();
        let cached = index.entries().unwrap();
        let scanned = RakeSource::new(&config).unwrap().entries().unwrap();

        assert_eq!(cached, built);
        assert_eq!(cached, scanned);
    }

    #[test]
    fn test_fresh_cache_is_served_without_reparsing() {
        let temp_dir = setup();
        let index = index_for(&Config::new(temp_dir.path()));
        index.entries().unwrap();

        // Rewrite the file but keep it older than the cache
        let file = temp_dir.path().join("lib/tasks/indexer.rake");
        fs::write(&file, TASKS.replace("employees", "managers")).unwrap();
        set_mtime(&file, SystemTime::now() - Duration::from_secs(3600));

        let entries = index.entries().unwrap();
        assert_eq!(entries[0].name, "indexer:employees");
    }

    #[test]
    fn test_touched_file_triggers_rebuild() {
        let temp_dir = setup();
        let index = index_for(&Config::new(temp_dir.path()));
        index.entries().unwrap();

        let file = temp_dir.path().join("lib/tasks/indexer.rake");
        fs::write(&file, TASKS.replace("employees", "managers")).unwrap();
        set_mtime(&file, SystemTime::now() + Duration::from_secs(60));

        assert!(!index.is_fresh().unwrap());
        let entries = index.entries().unwrap();
        assert_eq!(entries[0].name, "indexer:managers");
    }

    #[test]
    fn test_changed_patterns_invalidate() {
        let temp_dir = setup();
        index_for(&Config::new(temp_dir.path())).entries().unwrap();

        let config = Config::new(temp_dir.path())
            .with_glob_patterns(vec!["lib/tasks/*.rake".to_string()]);
        let index = index_for(&config);

        assert_eq!(index.check_cache().unwrap().err(), Some(StaleReason::PatternsChanged));
        assert_eq!(index.entries().unwrap().len(), 1);
        assert!(index.is_fresh().unwrap());
    }

    #[test]
    fn test_changed_tag_invalidates() {
        let temp_dir = setup();
        index_for(&Config::new(temp_dir.path())).entries().unwrap();

        let index = index_for(&Config::new(temp_dir.path()).with_tag("other"));
        assert_eq!(index.check_cache().unwrap().err(), Some(StaleReason::SettingsChanged));
        assert_eq!(index.entries().unwrap()[0].team(), None);
    }

    #[test]
    fn test_removed_file_invalidates() {
        let temp_dir = setup();
        let extra = temp_dir.path().join("lib/tasks/extra.rake");
        fs::write(&extra, "task :extra do\nend\n").unwrap();

        let index = index_for(&Config::new(temp_dir.path()));
        assert_eq!(index.entries().unwrap().len(), 2);

        fs::remove_file(&extra).unwrap();
        assert_eq!(index.check_cache().unwrap().err(), Some(StaleReason::FileSetChanged));
        assert_eq!(index.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_cache_is_rebuilt() {
        let temp_dir = setup();
        let index = index_for(&Config::new(temp_dir.path()));
        fs::create_dir_all(index.cache_path().parent().unwrap()).unwrap();
        fs::write(index.cache_path(), b"\x04\x08not json").unwrap();

        assert_eq!(index.check_cache().unwrap().err(), Some(StaleReason::Corrupt));
        assert_eq!(index.entries().unwrap().len(), 1);
        assert!(index.is_fresh().unwrap());
    }

    #[test]
    fn test_version_mismatch_is_rebuilt() {
        let temp_dir = setup();
        let index = index_for(&Config::new(temp_dir.path()));
        index.entries().unwrap();

        let raw = fs::read_to_string(index.cache_path()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["version"] = serde_json::json!(CACHE_FORMAT_VERSION + 1);
        fs::write(index.cache_path(), value.to_string()).unwrap();

        assert_eq!(index.check_cache().unwrap().err(), Some(StaleReason::VersionMismatch));
    }

    #[test]
    fn test_missing_root_propagates() {
        let index = index_for(&Config::new("/nonexistent/root"));
        assert!(index.entries().is_err());
    }

    /// Wraps the rake source and contributes one extra entry
    struct ExtendedSource(RakeSource);

    impl TaskSource for ExtendedSource {
        fn root(&self) -> &Path {
            self.0.root()
        }

        fn glob_patterns(&self) -> &[String] {
            self.0.glob_patterns()
        }

        fn scan(&self) -> Result<Vec<PathBuf>> {
            self.0.scan()
        }

        fn parse(&self, path: &Path) -> Result<Vec<Entry>> {
            self.0.parse(path)
        }

        fn entries(&self) -> Result<Vec<Entry>> {
            let mut entries = self.0.entries()?;
            let mut synthetic = entries[0].clone();
            synthetic.name = "generated:task".to_string();
            entries.push(synthetic);
            Ok(entries)
        }
    }

    #[test]
    fn test_rebuild_uses_source_entries() {
        let temp_dir = setup();
        let source = ExtendedSource(RakeSource::new(&Config::new(temp_dir.path())).unwrap());
        let expected = source.entries().unwrap();
        let index = Index::new(source);

        let built = index.entries().unwrap();
        assert_eq!(built.len(), 2);
        assert_eq!(built, expected);

        // Served from the cache on the next call
        assert!(index.is_fresh().unwrap());
        assert_eq!(index.entries().unwrap(), expected);
    }
}
