//! Extension traits to ignore lock poisoning.
//!
//! The cache map and directory snapshots hold plain values, so a panic in another thread
//! doesn't invalidate them. These traits replace `.unwrap_or_else(|e| e.into_inner())`
//! boilerplate with a readable call.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub trait IgnorePoison<T> {
    /// Locks the mutex, ignoring poison.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnorePoison<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub trait IgnoreRwPoison<T> {
    /// Acquires a shared read guard, ignoring poison.
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T>;

    /// Acquires an exclusive write guard, ignoring poison.
    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> IgnoreRwPoison<T> for RwLock<T> {
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(|e| e.into_inner())
    }
}
