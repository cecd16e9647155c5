use super::attribute::AttrValue;
use super::issuer::ReceiverRecord;
use crate::bn::BigNumber;
use crate::errors::prelude::*;

use serde_json::Value;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One-time registration keys handed out to prospective holders.
pub trait RegistrationStore {
    fn insert(&self, key: &str) -> AnonCredsResult<()>;

    /// Removes `key` and reports whether it was present. Two callers never
    /// both see `true` for the same key.
    fn check_and_consume(&self, key: &str) -> AnonCredsResult<bool>;
}

pub trait ReceiverRecordStore {
    fn load(&self, nym: &BigNumber) -> AnonCredsResult<ReceiverRecord>;
    fn store(&self, nym: &BigNumber, record: ReceiverRecord) -> AnonCredsResult<()>;
}

pub trait SessionKeyStore {
    fn store(&self, key: &str) -> AnonCredsResult<()>;
    fn contains(&self, key: &str) -> AnonCredsResult<bool>;
}

/// Source of the reference values that revealed attributes are checked
/// against.
pub trait AttrDataFetcher {
    fn fetch(&self) -> AnonCredsResult<HashMap<String, AttrValue>>;
}

fn lock<T>(mutex: &Mutex<T>) -> AnonCredsResult<MutexGuard<T>> {
    mutex
        .lock()
        .map_err(|_| err_msg(AnonCredsErrorKind::InvalidState, "Store lock poisoned"))
}

#[derive(Debug, Default)]
pub struct MemoryRegistrationStore {
    keys: Mutex<HashSet<String>>,
}

impl MemoryRegistrationStore {
    pub fn new() -> MemoryRegistrationStore {
        MemoryRegistrationStore::default()
    }
}

impl RegistrationStore for MemoryRegistrationStore {
    fn insert(&self, key: &str) -> AnonCredsResult<()> {
        lock(&self.keys)?.insert(key.to_string());
        Ok(())
    }

    fn check_and_consume(&self, key: &str) -> AnonCredsResult<bool> {
        Ok(lock(&self.keys)?.remove(key))
    }
}

#[derive(Debug, Default)]
pub struct MemoryReceiverRecordStore {
    records: Mutex<BTreeMap<BigNumber, ReceiverRecord>>,
}

impl MemoryReceiverRecordStore {
    pub fn new() -> MemoryReceiverRecordStore {
        MemoryReceiverRecordStore::default()
    }
}

impl ReceiverRecordStore for MemoryReceiverRecordStore {
    fn load(&self, nym: &BigNumber) -> AnonCredsResult<ReceiverRecord> {
        lock(&self.records)?.get(nym).cloned().ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::Protocol,
                "No credential was issued to this pseudonym",
            )
        })
    }

    fn store(&self, nym: &BigNumber, record: ReceiverRecord) -> AnonCredsResult<()> {
        lock(&self.records)?.insert(nym.clone(), record);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionKeyStore {
    keys: Mutex<HashSet<String>>,
}

impl MemorySessionKeyStore {
    pub fn new() -> MemorySessionKeyStore {
        MemorySessionKeyStore::default()
    }
}

impl SessionKeyStore for MemorySessionKeyStore {
    fn store(&self, key: &str) -> AnonCredsResult<()> {
        lock(&self.keys)?.insert(key.to_string());
        Ok(())
    }

    fn contains(&self, key: &str) -> AnonCredsResult<bool> {
        Ok(lock(&self.keys)?.contains(key))
    }
}

/// Reference values kept in memory and set by the embedding program.
#[derive(Debug, Default)]
pub struct MemoryDataFetcher {
    data: Mutex<HashMap<String, AttrValue>>,
}

impl MemoryDataFetcher {
    pub fn new() -> MemoryDataFetcher {
        MemoryDataFetcher::default()
    }

    pub fn set<V: Into<AttrValue>>(&self, name: &str, value: V) -> AnonCredsResult<()> {
        lock(&self.data)?.insert(name.to_string(), value.into());
        Ok(())
    }
}

impl AttrDataFetcher for MemoryDataFetcher {
    fn fetch(&self) -> AnonCredsResult<HashMap<String, AttrValue>> {
        Ok(lock(&self.data)?.clone())
    }
}

/// Reads reference values from a JSON object on every fetch. Numbers must
/// fit into `i64`, strings are taken as text.
#[derive(Debug, Clone)]
pub struct JsonDataFetcher {
    path: PathBuf,
}

impl JsonDataFetcher {
    pub fn new<P: AsRef<Path>>(path: P) -> JsonDataFetcher {
        JsonDataFetcher {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse(data: &str) -> AnonCredsResult<HashMap<String, AttrValue>> {
        let values: HashMap<String, Value> = serde_json::from_str(data)?;
        values
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Number(ref n) => n.as_i64().map(AttrValue::Int),
                    Value::String(s) => Some(AttrValue::Text(s)),
                    _ => None,
                }
                .ok_or_else(|| {
                    err_msg(
                        AnonCredsErrorKind::Config,
                        format!("Reference value of '{}' is neither int64 nor string", name),
                    )
                })?;
                Ok((name, value))
            })
            .collect()
    }
}

impl AttrDataFetcher for JsonDataFetcher {
    fn fetch(&self) -> AnonCredsResult<HashMap<String, AttrValue>> {
        trace!("JsonDataFetcher::fetch: >>> path: {:?}", self.path);
        let data = fs::read_to_string(&self.path)?;
        JsonDataFetcher::parse(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    #[test]
    fn registration_key_is_consumed_once() {
        let store = MemoryRegistrationStore::new();
        store.insert("key").unwrap();
        assert!(!store.check_and_consume("other").unwrap());
        assert!(store.check_and_consume("key").unwrap());
        assert!(!store.check_and_consume("key").unwrap());
    }

    #[test]
    fn racing_consumers_get_one_key() {
        let store = Arc::new(MemoryRegistrationStore::new());
        store.insert("key").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.check_and_consume("key").unwrap())
            })
            .collect();
        let consumed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|c| *c)
            .count();
        assert_eq!(1, consumed);
    }

    #[test]
    fn receiver_records_are_keyed_by_nym() {
        let store = MemoryReceiverRecordStore::new();
        let nym = BigNumber::from_u32(5).unwrap();
        let record = ReceiverRecord {
            known_attrs: vec![BigNumber::from_u32(1).unwrap()],
            commitments_of_attrs: vec![],
            u: BigNumber::from_u32(2).unwrap(),
            nonce: BigNumber::from_u32(3).unwrap(),
        };

        let err = store.load(&nym).unwrap_err();
        assert_eq!(AnonCredsErrorKind::Protocol, err.kind());

        store.store(&nym, record.clone()).unwrap();
        assert_eq!(record, store.load(&nym).unwrap());
    }

    #[test]
    fn json_reference_values_parse() {
        let values =
            JsonDataFetcher::parse(r#"{"date_from": 1512643001, "name": "Jack"}"#).unwrap();
        assert_eq!(Some(&AttrValue::Int(1512643001)), values.get("date_from"));
        assert_eq!(Some(&AttrValue::Text("Jack".to_string())), values.get("name"));

        let err = JsonDataFetcher::parse(r#"{"weight": 72.5}"#).unwrap_err();
        assert_eq!(AnonCredsErrorKind::Config, err.kind());
    }

    #[test]
    fn missing_reference_file_fails() {
        let fetcher = JsonDataFetcher::new("/nonexistent/reference.json");
        assert_eq!(AnonCredsErrorKind::IOError, fetcher.fetch().unwrap_err().kind());
    }
}
