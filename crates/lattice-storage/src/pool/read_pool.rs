//! Read-only connections for file-backed lattices.
//!
//! A read takes the first idle connection at or after the rotating cursor,
//! so one long audit query does not stall every other reader. When all
//! connections are busy it waits on the cursor's slot.

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use rusqlite::{Connection, OpenFlags};

use lattice_core::errors::{LatticeResult, StorageError};

use super::pragmas::apply_read_pragmas;
use crate::to_storage_err;

const MAX_READERS: usize = 8;

pub struct ReadPool {
    readers: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
    served: AtomicU64,
}

impl ReadPool {
    /// Open `size` readers (clamped to 1..=8) on an existing database.
    pub fn open(path: &Path, size: usize) -> LatticeResult<Self> {
        let size = size.clamp(1, MAX_READERS);
        let readers = (0..size)
            .map(|i| {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(|e| to_storage_err(format!("reader {i} on {}: {e}", path.display())))?;
                apply_read_pragmas(&conn)?;
                Ok(Mutex::new(conn))
            })
            .collect::<LatticeResult<Vec<_>>>()?;
        Ok(Self {
            readers,
            cursor: AtomicUsize::new(0),
            served: AtomicU64::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> LatticeResult<T>
    where
        F: FnOnce(&Connection) -> LatticeResult<T>,
    {
        let guard = self.acquire()?;
        self.served.fetch_add(1, Ordering::Relaxed);
        f(&guard)
    }

    fn acquire(&self) -> LatticeResult<MutexGuard<'_, Connection>> {
        let n = self.readers.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % n;
        for offset in 0..n {
            let slot = (start + offset) % n;
            match self.readers[slot].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(poisoned(slot)),
            }
        }
        self.readers[start].lock().map_err(|_| poisoned(start))
    }

    pub fn size(&self) -> usize {
        self.readers.len()
    }

    /// Reads handed out since open.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }
}

fn poisoned(slot: usize) -> lattice_core::errors::LatticeError {
    StorageError::LockPoisoned {
        details: format!("reader {slot}"),
    }
    .into()
}
