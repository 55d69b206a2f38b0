// crates/xgeo-core/src/storage.rs

//! Key-value persistence for entries.
//!
//! The engine only ever asks three things of storage: give me everything,
//! save this key, forget these keys. [`MemoryStorage`] keeps it in a map;
//! [`FileStorage`] keeps one JSON document on disk (gzip-compressed when the
//! `compact` feature is enabled).

use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// The storage collaborator behind an [`EntryStore`](crate::store::EntryStore).
pub trait EntryStorage {
    /// Every stored `(key, value)` pair, including keys the engine does not own.
    fn load_all(&self) -> Result<Vec<(String, Value)>>;

    fn upsert(&mut self, key: &str, value: &Value) -> Result<()>;

    /// Missing keys are ignored.
    fn remove(&mut self, keys: &[String]) -> Result<()>;
}

/// In-memory storage, mostly for tests and short-lived sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, Value>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value directly, bypassing the engine.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.items.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.get(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl EntryStorage for MemoryStorage {
    fn load_all(&self) -> Result<Vec<(String, Value)>> {
        Ok(self
            .items
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn upsert(&mut self, key: &str, value: &Value) -> Result<()> {
        self.items.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.items.remove(key);
        }
        Ok(())
    }
}

#[cfg(feature = "json")]
pub use file::FileStorage;

#[cfg(feature = "json")]
mod file {
    use super::EntryStorage;
    use crate::error::{Result, XGeoError};
    use serde_json::{Map, Value};
    use std::fs::File;
    use std::io::{self, BufReader, BufWriter, Read, Write};
    use std::path::{Path, PathBuf};

    #[cfg(feature = "compact")]
    use flate2::{read::GzDecoder, write::GzEncoder, Compression};

    /// One JSON object on disk, keyed like the browser store (`geo:<id>`).
    ///
    /// Every write rewrites the whole document. A missing or empty file reads
    /// as an empty store.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn open_stream(&self) -> Result<Option<Box<dyn Read>>> {
            let file = match File::open(&self.path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(XGeoError::Io(e)),
            };
            if file.metadata()?.len() == 0 {
                return Ok(None);
            }
            let reader = BufReader::new(file);

            #[cfg(feature = "compact")]
            {
                Ok(Some(Box::new(GzDecoder::new(reader))))
            }

            #[cfg(not(feature = "compact"))]
            {
                Ok(Some(Box::new(reader)))
            }
        }

        fn read_document(&self) -> Result<Map<String, Value>> {
            let Some(stream) = self.open_stream()? else {
                return Ok(Map::new());
            };
            match serde_json::from_reader(stream)? {
                Value::Object(map) => Ok(map),
                _ => Err(XGeoError::Storage(format!(
                    "{} does not hold a JSON object",
                    self.path.display()
                ))),
            }
        }

        fn write_document(&self, doc: &Map<String, Value>) -> Result<()> {
            let writer = BufWriter::new(File::create(&self.path)?);

            #[cfg(feature = "compact")]
            {
                let mut encoder = GzEncoder::new(writer, Compression::default());
                serde_json::to_writer(&mut encoder, doc)?;
                encoder.finish()?.flush()?;
            }

            #[cfg(not(feature = "compact"))]
            {
                let mut writer = writer;
                serde_json::to_writer_pretty(&mut writer, doc)?;
                writer.flush()?;
            }

            Ok(())
        }
    }

    impl EntryStorage for FileStorage {
        fn load_all(&self) -> Result<Vec<(String, Value)>> {
            Ok(self.read_document()?.into_iter().collect())
        }

        fn upsert(&mut self, key: &str, value: &Value) -> Result<()> {
            let mut doc = self.read_document()?;
            doc.insert(key.to_string(), value.clone());
            self.write_document(&doc)
        }

        fn remove(&mut self, keys: &[String]) -> Result<()> {
            let mut doc = self.read_document()?;
            let before = doc.len();
            for key in keys {
                doc.remove(key);
            }
            if doc.len() != before {
                self.write_document(&doc)?;
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn missing_file_is_an_empty_store() {
            let dir = tempfile::tempdir().expect("tempdir");
            let storage = FileStorage::new(dir.path().join("absent.json"));
            assert!(storage.load_all().expect("load").is_empty());
        }

        #[test]
        fn writes_survive_a_reopen() {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("entries.json");

            let mut storage = FileStorage::new(&path);
            storage.upsert("geo:1", &json!({"subjectId": "1"})).expect("upsert");
            storage.upsert("other", &json!(true)).expect("upsert");
            storage.remove(&["other".to_string()]).expect("remove");

            let reopened = FileStorage::new(&path);
            let all = reopened.load_all().expect("load");
            assert_eq!(all, vec![("geo:1".to_string(), json!({"subjectId": "1"}))]);
        }

        #[test]
        fn empty_file_is_an_empty_store() {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("empty.json");
            File::create(&path).expect("create");
            assert!(FileStorage::new(&path).load_all().expect("load").is_empty());
        }
    }
}
