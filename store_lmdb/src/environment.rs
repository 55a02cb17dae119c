//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Name of the single database holding envelope documents.
const STATE_DB_NAME: &str = "local-store";

/// Default map size: the envelope is one JSON document, 64 MiB is plenty.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// Wraps the LMDB environment and the state database handle.
#[derive(Clone)]
pub struct LmdbEnvironment {
    env: Env,
    state_db: Database<Str, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this
        // directory; nothing else maps the same file.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let state_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(STATE_DB_NAME))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env,
            state_db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw bytes stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let value = self.state_db.get(&rtxn, key)?.map(<[u8]>::to_vec);
        Ok(value)
    }

    /// Store `value` under `key` in a single committed transaction.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.state_db.put(&mut wtxn, key, value)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Remove `key`. Returns whether it existed.
    pub fn delete(&self, key: &str) -> Result<bool, LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        let existed = self.state_db.delete(&mut wtxn, key)?;
        wtxn.commit()?;
        Ok(existed)
    }
}
