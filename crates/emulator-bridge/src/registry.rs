//! Running-Emulator Registry
//!
//! The single source of truth for which AVDs currently have a live
//! emulator process. Keyed by AVD name, safe for concurrent use from any
//! number of tasks, and self-healing: entries whose process has exited
//! are pruned whenever they are observed.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::process::Child;

/// Lightweight view of a registered emulator process.
///
/// The registry keeps sole ownership of the underlying `Child`; liveness
/// queries go back through the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorHandle {
    pub name: String,
    pub pid: Option<u32>,
}

/// In-memory map from AVD name to its live emulator process.
#[derive(Debug, Default)]
pub struct AvdRegistry {
    inner: Mutex<HashMap<String, Child>>,
}

impl AvdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly spawned emulator process. Last write wins for a
    /// given name.
    pub fn register(&self, name: &str, child: Child) -> EmulatorHandle {
        let handle = EmulatorHandle {
            name: name.to_string(),
            pid: child.id(),
        };
        self.inner.lock().insert(name.to_string(), child);
        handle
    }

    /// Remove an entry, yielding ownership of the process so the caller
    /// can kill it outside the lock.
    pub fn unregister(&self, name: &str) -> Option<Child> {
        self.inner.lock().remove(name)
    }

    /// Get the handle for a running AVD, pruning the entry if its process
    /// has exited.
    pub fn get(&self, name: &str) -> Option<EmulatorHandle> {
        let mut map = self.inner.lock();
        let child = map.get_mut(name)?;
        if process_exited(child) {
            map.remove(name);
            return None;
        }
        Some(EmulatorHandle {
            name: name.to_string(),
            pid: child.id(),
        })
    }

    /// True when the AVD has a live registered process.
    pub fn is_running(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All live entries, with dead ones pruned.
    pub fn all_running(&self) -> Vec<EmulatorHandle> {
        let mut map = self.inner.lock();
        map.retain(|_, child| !process_exited(child));
        map.iter()
            .map(|(name, child)| EmulatorHandle {
                name: name.clone(),
                pid: child.id(),
            })
            .collect()
    }

    /// Snapshot of registered AVD names.
    pub fn names(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }
}

/// Non-blocking liveness probe. Treats a wait error as exited, so a
/// broken handle cannot pin a registry entry forever.
fn process_exited(child: &mut Child) -> bool {
    !matches!(child.try_wait(), Ok(None))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::process::Command;

    fn spawn_sleeper() -> Child {
        Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .expect("spawn sleep")
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let registry = AvdRegistry::new();
        let handle = registry.register("x", spawn_sleeper());

        assert!(handle.pid.is_some());
        assert!(registry.is_running("x"));

        let child = registry.unregister("x");
        assert!(child.is_some());
        assert!(!registry.is_running("x"));
        assert!(registry.get("x").is_none());
    }

    #[tokio::test]
    async fn test_all_running_prunes_dead_entries() {
        let registry = AvdRegistry::new();

        let mut dead = Command::new("true").spawn().expect("spawn true");
        dead.wait().await.expect("wait");
        registry.register("dead", dead);
        registry.register("alive", spawn_sleeper());

        let running = registry.all_running();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].name, "alive");

        // The dead entry is gone for good, not just filtered.
        assert!(registry.names() == vec!["alive".to_string()]);
    }

    #[tokio::test]
    async fn test_last_write_wins_per_name() {
        let registry = AvdRegistry::new();
        let first = registry.register("x", spawn_sleeper());
        let second = registry.register("x", spawn_sleeper());

        assert_ne!(first.pid, second.pid);
        assert_eq!(registry.get("x").and_then(|h| h.pid), second.pid);
    }
}
