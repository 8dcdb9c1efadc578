//! MaxMind 查询引擎
//!
//! 活动句柄存放在 `ArcSwapOption` 中：
//! - 查询路径只做一次无锁 load，不与其他查询或重载竞争
//! - 重载路径打开新句柄后原子 swap，旧句柄在最后一个读者结束后才真正释放
//! - 写者（reload / close）之间用一把互斥锁串行化，读者永远不碰这把锁

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::database::{DatabaseInfo, GeoDatabase};
use super::error::{CloseError, LookupError, OpenError, ReloadError};
use super::lookup::{CountryCode, CountryLookup};
use super::watcher::ReloadSupervisor;

/// The active-handle slot, shared between the engine and its supervisor.
pub(crate) struct ActiveDatabase {
    path: PathBuf,
    slot: ArcSwapOption<GeoDatabase>,
    writer: Mutex<()>,
    reloads: AtomicU64,
}

impl ActiveDatabase {
    pub(crate) fn new(path: PathBuf, db: GeoDatabase) -> Self {
        Self {
            path,
            slot: ArcSwapOption::from_pointee(db),
            writer: Mutex::new(()),
            reloads: AtomicU64::new(0),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn lookup(&self, ip: IpAddr) -> Result<CountryCode, LookupError> {
        let guard = self.slot.load();
        match &*guard {
            Some(db) => db.country(ip),
            None => Err(LookupError::Closed),
        }
    }

    /// Open a fresh handle from disk and swap it in.
    ///
    /// On failure the active handle is left untouched. The file is read under
    /// the writer lock, so concurrent reloads swap in handles in the order
    /// they read the file.
    pub(crate) fn reload(&self) -> Result<(), ReloadError> {
        let (info, previous) = {
            let _writer = self.writer.lock();
            if self.slot.load().is_none() {
                return Err(ReloadError::Closed);
            }
            let fresh = GeoDatabase::open(&self.path).map_err(ReloadError::Open)?;
            let info = fresh.info();
            (info, self.slot.swap(Some(Arc::new(fresh))))
        };
        // In-flight readers still hold their own Arc; the old reader is freed
        // when the last of them finishes.
        drop(previous);

        let count = self.reloads.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            path = %self.path.display(),
            database_type = %info.database_type,
            build_epoch = info.build_epoch,
            reloads = count,
            "mmdb database reloaded"
        );
        Ok(())
    }

    /// Take the active handle out of the slot.
    fn release(&self) -> Option<Arc<GeoDatabase>> {
        let _writer = self.writer.lock();
        self.slot.swap(None)
    }

    fn info(&self) -> Option<DatabaseInfo> {
        let guard = self.slot.load();
        (*guard).as_ref().map(|db| db.info())
    }
}

/// Country lookup engine backed by a hot-reloaded MaxMind database.
pub struct MmdbEngine {
    active: Arc<ActiveDatabase>,
    supervisor: Option<ReloadSupervisor>,
}

impl MmdbEngine {
    /// Open the database and start watching it for replacement.
    ///
    /// Failing to start the watcher is not fatal: the engine keeps serving
    /// the handle it opened, with hot-reload disabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        Self::open_with_reload(path, true)
    }

    /// Open the database without a watcher.
    pub fn open_static(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        Self::open_with_reload(path, false)
    }

    pub fn open_with_reload(path: impl AsRef<Path>, hot_reload: bool) -> Result<Self, OpenError> {
        let path = path.as_ref().to_path_buf();
        let db = GeoDatabase::open(&path)?;
        let info = db.info();
        info!(
            path = %path.display(),
            database_type = %info.database_type,
            build_epoch = info.build_epoch,
            "mmdb database opened"
        );

        let active = Arc::new(ActiveDatabase::new(path, db));

        let supervisor = if hot_reload {
            match ReloadSupervisor::start(Arc::clone(&active)) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!(
                        path = %active.path().display(),
                        error = %e,
                        "mmdb file watcher not started; hot-reload disabled"
                    );
                    None
                }
            }
        } else {
            debug!("mmdb hot-reload disabled by configuration");
            None
        };

        Ok(Self { active, supervisor })
    }

    /// Look up the ISO country code of `ip` in the currently active handle.
    pub fn lookup_country(&self, ip: IpAddr) -> Result<CountryCode, LookupError> {
        self.active.lookup(ip)
    }

    /// Stop the watcher, then release the active handle.
    ///
    /// Does not wait for in-flight lookups or reloads. A second call returns
    /// `CloseError::AlreadyClosed`.
    pub fn close(&self) -> Result<(), CloseError> {
        if let Some(supervisor) = &self.supervisor {
            supervisor.stop();
        }

        match self.active.release() {
            Some(db) => {
                info!(path = %db.path().display(), "mmdb reader closed");
                Ok(())
            }
            None => Err(CloseError::AlreadyClosed),
        }
    }

    /// Reload from disk now, outside of any file event.
    pub fn reload(&self) -> Result<(), ReloadError> {
        self.active.reload()
    }

    pub fn path(&self) -> &Path {
        self.active.path()
    }

    /// Whether the background watch loop is still running.
    pub fn is_watching(&self) -> bool {
        self.supervisor.as_ref().is_some_and(|s| s.is_running())
    }

    pub fn is_closed(&self) -> bool {
        self.active.slot.load().is_none()
    }

    /// Number of successful hot reloads since open.
    pub fn reload_count(&self) -> u64 {
        self.active.reloads.load(Ordering::Relaxed)
    }

    pub fn info(&self) -> Option<DatabaseInfo> {
        self.active.info()
    }
}

impl CountryLookup for MmdbEngine {
    fn lookup_country(&self, ip: IpAddr) -> Result<CountryCode, LookupError> {
        MmdbEngine::lookup_country(self, ip)
    }

    fn close(&self) -> Result<(), CloseError> {
        MmdbEngine::close(self)
    }
}

impl std::fmt::Debug for MmdbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmdbEngine")
            .field("path", &self.active.path)
            .field("closed", &self.is_closed())
            .field("reloads", &self.reload_count())
            .finish()
    }
}
