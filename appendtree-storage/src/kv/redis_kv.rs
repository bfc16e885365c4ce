//! Redis-backed key space.

use std::sync::Mutex;

use redis::{Commands, Connection, RedisResult};
use tracing::debug;

use super::KeyValueStore;
use crate::StorageError;

/// Keys fetched per `SCAN` round trip.
const SCAN_COUNT: usize = 100;

/// [`KeyValueStore`] on a single synchronous Redis connection.
///
/// Calls are serialized on the connection. Nothing is retried here; a
/// failed command surfaces as [`StorageError::Backend`].
pub struct RedisKv {
    conn: Mutex<Connection>,
}

impl RedisKv {
    /// Open a connection, e.g. `redis://localhost:6379/0`.
    pub fn connect(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)
            .map_err(|e| StorageError::Backend(format!("open redis client: {}", e)))?;
        let conn = client
            .get_connection()
            .map_err(|e| StorageError::Backend(format!("connect to redis: {}", e)))?;
        debug!(%url, "connected to redis");
        Ok(RedisKv {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        what: &str,
        f: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T, StorageError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::Backend("redis connection lock poisoned".into()))?;
        f(&mut conn).map_err(|e| StorageError::Backend(format!("redis {}: {}", what, e)))
    }
}

impl KeyValueStore for RedisKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.with_conn("GET", |conn| conn.get(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.with_conn("SET", |conn| conn.set(key, value))
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let pattern = format!("{}*", escape_glob(prefix));
        self.with_conn("SCAN", |conn| {
            let mut keys = Vec::new();
            let mut cursor = 0u64;
            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_COUNT)
                    .query(&mut *conn)?;
                keys.extend(batch);
                cursor = next;
                if cursor == 0 {
                    break;
                }
            }
            // SCAN may report a key more than once.
            keys.sort_unstable();
            keys.dedup();
            Ok(keys)
        })
    }
}

/// Escape Redis glob metacharacters so `prefix` matches literally.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
