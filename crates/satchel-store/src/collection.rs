use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use satchel_types::models::UserId;

use crate::{Result, StoreError};

/// User id (as a decimal string) -> that user's records in insertion order.
pub type Document<T> = BTreeMap<String, Vec<T>>;

/// The file as stored: records stay undecoded until their owner asks for them.
type RawDocument = Document<Value>;

/// A whole-file JSON collection.
///
/// Every operation reads the full document and mutating operations write it
/// back in full. Only the records of the user being served are decoded, so
/// one bad record never costs anyone else their data. The mutex only
/// serializes access from this process.
pub struct JsonCollection<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the collection, writing an empty document if the file is absent.
    pub fn open(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            write_document(&path, &RawDocument::new())?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
            _records: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the whole document. Fails if any record does not decode.
    pub fn load(&self) -> Result<Document<T>> {
        let raw = self.with_lock(read_document)?;
        raw.into_iter()
            .map(|(user, records)| -> Result<(String, Vec<T>)> {
                Ok((user, decode_records(records)?))
            })
            .collect()
    }

    pub fn save(&self, doc: &Document<T>) -> Result<()> {
        self.with_lock(|path| write_document(path, doc))
    }

    /// Append a record for `user`. Returns the user's new record count.
    pub fn append(&self, user: UserId, record: T) -> Result<usize> {
        let record = serde_json::to_value(record)?;
        self.with_lock(|path| {
            let mut doc = read_document(path)?;
            let records = doc.entry(user.to_string()).or_default();
            records.push(record);
            let len = records.len();
            write_document(path, &doc)?;
            debug!("{}: user {} now has {} records", path.display(), user, len);
            Ok(len)
        })
    }

    pub fn list(&self, user: UserId) -> Result<Vec<T>> {
        let mut doc = self.with_lock(read_document)?;
        decode_records(doc.remove(&user.to_string()).unwrap_or_default())
    }

    /// Remove exactly the record at `index`, keeping the order of the rest.
    pub fn remove(&self, user: UserId, index: usize) -> Result<T> {
        self.with_lock(|path| {
            let mut doc = read_document(path)?;
            let records = doc.entry(user.to_string()).or_default();
            if index >= records.len() {
                return Err(StoreError::IndexOutOfRange {
                    index,
                    len: records.len(),
                });
            }
            let removed: T = serde_json::from_value(records.remove(index))?;
            write_document(path, &doc)?;
            Ok(removed)
        })
    }

    fn with_lock<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Path) -> Result<R>,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        f(&self.path)
    }
}

/// Missing files and text that is not JSON at all read as an empty document.
/// JSON of the wrong shape is an error, so the caller never overwrites it.
fn read_document(path: &Path) -> Result<RawDocument> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RawDocument::new()),
        Err(e) => return Err(e.into()),
    };

    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("{} is not valid JSON, treating as empty: {}", path.display(), e);
            return Ok(RawDocument::new());
        }
    };
    Ok(serde_json::from_value(value)?)
}

fn decode_records<T: DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(StoreError::from))
        .collect()
}

fn write_document<D: Serialize>(path: &Path, doc: &D) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    fs::write(path, buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_types::models::Flashcard;

    fn temp_collection() -> (PathBuf, JsonCollection<Flashcard>) {
        let dir = std::env::temp_dir().join(format!("satchel_collection_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let collection = JsonCollection::open(dir.join("cards.json")).unwrap();
        (dir, collection)
    }

    #[test]
    fn append_then_list_round_trips() {
        let (dir, cards) = temp_collection();
        let user = UserId(11);

        let card = Flashcard::new("hola", "hello");
        assert_eq!(cards.append(user, card.clone()).unwrap(), 1);
        assert_eq!(cards.list(user).unwrap(), vec![card]);
        assert!(cards.list(UserId(12)).unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let (dir, cards) = temp_collection();
        let user = UserId(1);
        for front in ["a", "b", "c", "d"] {
            cards.append(user, Flashcard::new(front, "x")).unwrap();
        }

        let removed = cards.remove(user, 1).unwrap();
        assert_eq!(removed.front, "b");

        let fronts: Vec<String> = cards.list(user).unwrap().into_iter().map(|c| c.front).collect();
        assert_eq!(fronts, ["a", "c", "d"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn remove_out_of_range_leaves_file_untouched() {
        let (dir, cards) = temp_collection();
        let user = UserId(1);
        cards.append(user, Flashcard::new("only", "one")).unwrap();
        let before = fs::read_to_string(cards.path()).unwrap();

        let err = cards.remove(user, 5).unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfRange { index: 5, len: 1 }));
        assert!(matches!(
            cards.remove(UserId(99), 0),
            Err(StoreError::IndexOutOfRange { index: 0, len: 0 })
        ));
        assert_eq!(fs::read_to_string(cards.path()).unwrap(), before);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let (dir, cards) = temp_collection();
        fs::write(cards.path(), "{not json").unwrap();

        assert!(cards.load().unwrap().is_empty());
        cards.append(UserId(3), Flashcard::new("q", "a")).unwrap();
        assert_eq!(cards.list(UserId(3)).unwrap().len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn bad_record_never_costs_other_users_their_data() {
        let (dir, cards) = temp_collection();
        fs::write(
            cards.path(),
            r#"{
                "1": [{"front": "q", "back": "a", "created_at": "2024-01-01 10:00:00.000000"}],
                "2": [{"front": "q", "back": "a", "created_at": "yesterday"}]
            }"#,
        )
        .unwrap();

        assert_eq!(cards.append(UserId(3), Flashcard::new("new", "card")).unwrap(), 1);

        assert_eq!(cards.list(UserId(1)).unwrap().len(), 1);
        assert_eq!(cards.list(UserId(3)).unwrap().len(), 1);
        assert!(matches!(cards.list(UserId(2)), Err(StoreError::Json(_))));
        assert!(fs::read_to_string(cards.path()).unwrap().contains("yesterday"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_of_the_wrong_shape_is_left_alone() {
        let (dir, cards) = temp_collection();
        fs::write(cards.path(), "[1, 2, 3]").unwrap();

        assert!(matches!(
            cards.append(UserId(1), Flashcard::new("q", "a")),
            Err(StoreError::Json(_))
        ));
        assert_eq!(fs::read_to_string(cards.path()).unwrap(), "[1, 2, 3]");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn saved_documents_use_four_space_indent() {
        let (dir, cards) = temp_collection();
        cards.append(UserId(5), Flashcard::new("q", "a")).unwrap();

        let raw = fs::read_to_string(cards.path()).unwrap();
        assert!(raw.starts_with("{\n    \"5\": [\n        {"));

        let _ = fs::remove_dir_all(&dir);
    }
}
