use std::cell::Cell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::host::{PlayerEntity, TeleportTarget, Vec3};
use crate::identifiers::PlayerId;
use crate::inventory::{EnderChest, PlayerInventory};
use crate::item::BasicItemStack;

static ENV_VAR_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static TEST_PATH_COUNTER: AtomicU64 = AtomicU64::new(0);
thread_local! {
    static ENV_VAR_LOCK_DEPTH: Cell<u32> = const { Cell::new(0) };
}

struct EnvVarScope {
    _guard: Option<MutexGuard<'static, ()>>,
}

impl EnvVarScope {
    fn enter() -> Self {
        let depth_before = ENV_VAR_LOCK_DEPTH.with(|depth| {
            let current = depth.get();
            depth.set(current.saturating_add(1));
            current
        });

        if depth_before > 0 {
            return Self { _guard: None };
        }

        let lock = ENV_VAR_LOCK.get_or_init(|| Mutex::new(()));
        let guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            _guard: Some(guard),
        }
    }
}

impl Drop for EnvVarScope {
    fn drop(&mut self) {
        ENV_VAR_LOCK_DEPTH.with(|depth| {
            let current = depth.get();
            depth.set(current.saturating_sub(1));
        });
    }
}

struct EnvVarRestore {
    key: String,
    original: Option<OsString>,
}

impl EnvVarRestore {
    fn new(key: &str, value: Option<&str>) -> Self {
        let original = std::env::var_os(key);
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }

        Self {
            key: key.to_owned(),
            original,
        }
    }
}

impl Drop for EnvVarRestore {
    fn drop(&mut self) {
        match self.original.take() {
            Some(original) => std::env::set_var(&self.key, original),
            None => std::env::remove_var(&self.key),
        }
    }
}

pub fn with_env_vars<R>(vars: &[(&str, Option<&str>)], run: impl FnOnce() -> R) -> R {
    let _scope = EnvVarScope::enter();
    let _restores: Vec<_> = vars
        .iter()
        .map(|(key, value)| EnvVarRestore::new(key, *value))
        .collect();
    run()
}

pub fn unique_test_db_path(tag: &str) -> PathBuf {
    let safe_tag: String = tag
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let now_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let counter = TEST_PATH_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "player-persistence-{safe_tag}-{}-{now_nanos}-{counter}.db",
        std::process::id(),
    ))
}

/// Temporary database file, removed with its WAL side files on drop.
pub struct TestDbPath {
    path: PathBuf,
}

impl TestDbPath {
    pub fn new(tag: &str) -> Self {
        Self {
            path: unique_test_db_path(tag),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TestDbPath {
    fn drop(&mut self) {
        let base = self.path.as_os_str().to_owned();
        let side_files = ["-wal", "-shm"].map(|suffix| {
            let mut name = base.clone();
            name.push(suffix);
            PathBuf::from(name)
        });

        for path in std::iter::once(self.path.clone()).chain(side_files) {
            if let Err(err) = std::fs::remove_file(&path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    eprintln!(
                        "warning: failed to remove temporary test database {}: {err}",
                        path.display()
                    );
                }
            }
        }
    }
}

/// In-memory stand-in for a host player entity.
#[derive(Debug, Clone)]
pub struct FakePlayer {
    pub id: PlayerId,
    pub inventory: PlayerInventory<BasicItemStack>,
    pub ender_chest: EnderChest<BasicItemStack>,
    pub world: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub relocations: Vec<TeleportTarget>,
}

impl FakePlayer {
    pub fn at(world: &str, position: Vec3) -> Self {
        Self::with_id(PlayerId::new(Uuid::new_v4()), world, position)
    }

    pub fn with_id(id: PlayerId, world: &str, position: Vec3) -> Self {
        Self {
            id,
            inventory: PlayerInventory::new(),
            ender_chest: EnderChest::new(),
            world: world.to_owned(),
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            relocations: Vec::new(),
        }
    }
}

impl PlayerEntity for FakePlayer {
    type Stack = BasicItemStack;

    fn player_id(&self) -> PlayerId {
        self.id
    }

    fn inventory(&self) -> &PlayerInventory<BasicItemStack> {
        &self.inventory
    }

    fn inventory_mut(&mut self) -> &mut PlayerInventory<BasicItemStack> {
        &mut self.inventory
    }

    fn ender_chest(&self) -> &EnderChest<BasicItemStack> {
        &self.ender_chest
    }

    fn ender_chest_mut(&mut self) -> &mut EnderChest<BasicItemStack> {
        &mut self.ender_chest
    }

    fn world_id(&self) -> String {
        self.world.clone()
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn relocate(&mut self, target: TeleportTarget) {
        self.world = target.world.clone();
        self.position = target.position;
        self.velocity = target.velocity;
        self.yaw = target.yaw;
        self.pitch = target.pitch;
        self.relocations.push(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENV_TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn unique_test_key(prefix: &str) -> String {
        let counter = ENV_TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}_{}_{}", std::process::id(), counter)
    }

    #[test]
    fn with_env_vars_restores_original_values() {
        let key = unique_test_key("PLAYER_PERSISTENCE_TEST_ENV");

        with_env_vars(&[(key.as_str(), Some("before"))], || {
            with_env_vars(&[(key.as_str(), Some("during"))], || {
                assert_eq!(std::env::var(&key).expect("value during closure"), "during");
            });
            assert_eq!(std::env::var(&key).expect("restored value"), "before");
        });

        assert!(std::env::var(&key).is_err(), "expected helper to clean up key");
    }

    #[test]
    fn test_db_path_removes_wal_side_files() {
        let db = TestDbPath::new("side-files");
        let wal = PathBuf::from(format!("{}-wal", db.path().display()));
        std::fs::write(db.path(), b"").expect("create db file");
        std::fs::write(&wal, b"").expect("create wal file");

        let path = db.path().to_path_buf();
        drop(db);

        assert!(!path.exists());
        assert!(!wal.exists());
    }
}
