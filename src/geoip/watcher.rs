//! MMDB 文件热重载监督器
//!
//! 监听数据库文件所在的目录（而不是文件本身）：geoipupdate 和 Kubernetes
//! 卷更新都是通过 rename 或删除重建替换文件，直接监听文件句柄会在第一次
//! 替换后失效。
//!
//! 后台线程同时等待两个 channel：
//! - stop: 收到信号（或发送端被 drop）立即退出
//! - events: notify 推送的目录事件，只处理目标文件的 create / write

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, select};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info};

use super::engine::ActiveDatabase;
use super::error::ReloadError;

/// File change kinds that trigger a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    /// File created, or renamed into place
    Created,
    /// File content written
    Written,
}

impl FileChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileChange::Created => "create",
            FileChange::Written => "write",
        }
    }
}

/// Map a notify event kind to a reload trigger, ignoring everything else.
pub fn classify(kind: &EventKind) -> Option<FileChange> {
    match kind {
        EventKind::Create(_) => Some(FileChange::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both | RenameMode::Any)) => {
            Some(FileChange::Created)
        }
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => Some(FileChange::Written),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(FileChange::Written),
        _ => None,
    }
}

/// Return the change if `event` concerns `file_name` and is a reload trigger.
pub fn relevant_change(event: &Event, file_name: &OsStr) -> Option<FileChange> {
    let change = classify(&event.kind)?;

    // A paired rename carries [from, to]; only the destination matters.
    let targets = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            &event.paths[event.paths.len().saturating_sub(1)..]
        }
        _ => &event.paths[..],
    };

    targets
        .iter()
        .any(|p| p.file_name() == Some(file_name))
        .then_some(change)
}

/// Directory to watch for `path`.
pub fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

enum Signal {
    Stop,
    Event(Result<notify::Result<Event>, crossbeam_channel::RecvError>),
}

/// Background watcher that hot-swaps the engine's active handle.
pub struct ReloadSupervisor {
    stop_tx: Sender<()>,
    running: Arc<AtomicBool>,
    _thread: JoinHandle<()>,
}

impl ReloadSupervisor {
    pub(crate) fn start(active: Arc<ActiveDatabase>) -> Result<Self, ReloadError> {
        let path = active.path().to_path_buf();
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| ReloadError::InvalidPath(path.clone()))?;
        let dir = watch_dir(&path);

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = event_tx.send(res);
            },
            notify::Config::default(),
        )
        .map_err(ReloadError::Watch)?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(ReloadError::Watch)?;

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let running = Arc::new(AtomicBool::new(true));
        let running_flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("geofence-mmdb-watcher".to_string())
            .spawn(move || {
                let _running = RunningGuard(running_flag);
                watch_loop(watcher, active, file_name, event_rx, stop_rx);
            })
            .map_err(ReloadError::Spawn)?;

        info!(
            path = %path.display(),
            watching_dir = %dir.display(),
            "mmdb file watcher started"
        );

        Ok(Self {
            stop_tx,
            running,
            _thread: handle,
        })
    }

    /// Signal the watch loop to exit. Returns immediately.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for ReloadSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clears the running flag when the loop exits, however it exits.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn watch_loop(
    watcher: RecommendedWatcher,
    active: Arc<ActiveDatabase>,
    file_name: OsString,
    events: Receiver<notify::Result<Event>>,
    stop: Receiver<()>,
) {
    // Dropped when the loop returns, which removes the directory watch.
    let _watcher = watcher;

    loop {
        let signal = select! {
            recv(stop) -> _ => Signal::Stop,
            recv(events) -> msg => Signal::Event(msg),
        };

        match signal {
            Signal::Stop => {
                debug!("mmdb file watcher received stop signal");
                break;
            }
            Signal::Event(Ok(Ok(event))) => {
                let Some(change) = relevant_change(&event, &file_name) else {
                    continue;
                };
                info!(
                    event = change.as_str(),
                    path = ?event.paths,
                    "mmdb file change detected"
                );

                // Coalesce a burst (e.g. rename + close-write) into one reload.
                let drained = events.try_iter().count();
                if drained > 0 {
                    debug!("coalesced {} queued file events", drained);
                }

                if let Err(e) = active.reload() {
                    error!(error = %e, "mmdb hot-reload failed");
                }
            }
            Signal::Event(Ok(Err(e))) => {
                error!(error = %e, "mmdb file watcher error");
            }
            Signal::Event(Err(_)) => {
                error!("mmdb file watcher event channel closed");
                break;
            }
        }
    }

    info!("mmdb file watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut ev = Event::new(kind);
        for p in paths {
            ev = ev.add_path(PathBuf::from(p));
        }
        ev
    }

    #[test]
    fn test_classify_create_and_write() {
        assert_eq!(
            classify(&EventKind::Create(CreateKind::File)),
            Some(FileChange::Created)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(FileChange::Written)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(FileChange::Created)
        );
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Close(AccessMode::Write))),
            Some(FileChange::Written)
        );
    }

    #[test]
    fn test_classify_ignores_other_kinds() {
        assert_eq!(classify(&EventKind::Remove(RemoveKind::File)), None);
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            None
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            None
        );
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Close(AccessMode::Read))),
            None
        );
    }

    #[test]
    fn test_relevant_change_matches_base_name_only() {
        let name = OsStr::new("GeoLite2-Country.mmdb");

        let ours = event(
            EventKind::Create(CreateKind::File),
            &["/data/GeoLite2-Country.mmdb"],
        );
        assert_eq!(relevant_change(&ours, name), Some(FileChange::Created));

        let sibling = event(
            EventKind::Create(CreateKind::File),
            &["/data/GeoLite2-City.mmdb"],
        );
        assert_eq!(relevant_change(&sibling, name), None);

        let staging = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            &["/data/GeoLite2-Country.mmdb.tmp"],
        );
        assert_eq!(relevant_change(&staging, name), None);
    }

    #[test]
    fn test_relevant_change_rename_both_uses_destination() {
        let name = OsStr::new("db.mmdb");

        let into_place = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/data/db.mmdb.tmp", "/data/db.mmdb"],
        );
        assert_eq!(relevant_change(&into_place, name), Some(FileChange::Created));

        let away = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/data/db.mmdb", "/data/db.mmdb.bak"],
        );
        assert_eq!(relevant_change(&away, name), None);
    }

    fn start_supervisor(dir: &Path) -> (Arc<ActiveDatabase>, ReloadSupervisor) {
        use crate::geoip::GeoDatabase;
        use crate::geoip::test_mmdb::MmdbWriter;

        let path = dir.join("db.mmdb");
        let mut w = MmdbWriter::new("GeoIP2-Country-Test");
        w.insert_country("2.125.160.216/29", "GB");
        w.write_to(&path);

        let active = Arc::new(ActiveDatabase::new(
            path.clone(),
            GeoDatabase::open(&path).unwrap(),
        ));
        let supervisor = ReloadSupervisor::start(Arc::clone(&active)).unwrap();
        (active, supervisor)
    }

    fn wait_cleared(flag: &AtomicBool) -> bool {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while flag.load(Ordering::Acquire) {
            if std::time::Instant::now() >= deadline {
                return false;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        true
    }

    #[test]
    fn test_drop_ends_watch_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (active, supervisor) = start_supervisor(dir.path());
        let running = Arc::clone(&supervisor.running);
        assert!(running.load(Ordering::Acquire));

        drop(supervisor);

        assert!(wait_cleared(&running), "watch loop still running after drop");
        assert_eq!(Arc::strong_count(&active), 1);
    }

    #[test]
    fn test_stop_ends_watch_loop_while_supervisor_alive() {
        let dir = tempfile::tempdir().unwrap();
        let (_active, supervisor) = start_supervisor(dir.path());
        assert!(supervisor.is_running());

        supervisor.stop();
        assert!(wait_cleared(&supervisor.running), "watch loop ignored stop");

        // A second stop after exit is harmless
        supervisor.stop();
        assert!(!supervisor.is_running());
    }

    #[test]
    fn test_watch_dir() {
        assert_eq!(
            watch_dir(Path::new("/data/GeoLite2-Country.mmdb")),
            PathBuf::from("/data")
        );
        assert_eq!(watch_dir(Path::new("db.mmdb")), PathBuf::from("."));
        assert_eq!(watch_dir(Path::new("testdata/db.mmdb")), PathBuf::from("testdata"));
    }
}
