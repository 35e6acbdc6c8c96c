use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::task::JoinHandle;
use tracing::warn;

const EMAIL_PATH_ENV: &str = "DIGEST_EMAIL_PATH";
const DEFAULT_EMAIL_PATH: &str = ".digest_email";
const SAVED_RESET: Duration = Duration::from_secs(3);

/// Single-slot persistent string store. May be unavailable; callers degrade
/// to in-memory state.
pub trait KvStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, value: &str) -> bool;
    fn clear(&self) -> bool;
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn from_env() -> Self {
        let path = std::env::var(EMAIL_PATH_ENV).unwrap_or_else(|_| DEFAULT_EMAIL_PATH.to_string());
        Self { path: PathBuf::from(path) }
    }
}

impl KvStore for FileStore {
    fn get(&self) -> Option<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn set(&self, value: &str) -> bool {
        std::fs::write(&self.path, value).is_ok()
    }

    fn clear(&self) -> bool {
        match std::fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::NotFound => true,
            Err(_) => false,
        }
    }
}

#[derive(Default)]
pub struct MemStore {
    slot: Mutex<Option<String>>,
}

impl KvStore for MemStore {
    fn get(&self) -> Option<String> {
        self.slot.lock().unwrap().clone()
    }

    fn set(&self, value: &str) -> bool {
        *self.slot.lock().unwrap() = Some(value.to_string());
        true
    }

    fn clear(&self) -> bool {
        *self.slot.lock().unwrap() = None;
        true
    }
}

/// Shape check only: non-empty local part, `@`, dot-bearing domain. Not RFC
/// 5322.
pub fn is_valid_email(candidate: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
    re.is_match(candidate)
}

/// Holds the configured recipient address. Loaded once at construction,
/// mutated only by validated saves, cleared only explicitly.
pub struct EmailConfigStore {
    store: Box<dyn KvStore>,
    current: Mutex<Option<String>>,
    saved: Arc<AtomicBool>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl EmailConfigStore {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        let current = store.get();
        Self {
            store,
            current: Mutex::new(current),
            saved: Arc::new(AtomicBool::new(false)),
            reset_task: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }

    /// Confirmation flag: set by a successful save, cleared 3 s later by a
    /// timer that a newer save (or drop) cancels.
    pub fn just_saved(&self) -> bool {
        self.saved.load(Ordering::SeqCst)
    }

    pub fn save(&self, candidate: &str) -> bool {
        if !is_valid_email(candidate) {
            return false;
        }
        if !self.store.set(candidate) {
            warn!("recipient store unavailable; keeping address in memory only");
        }
        *self.current.lock().unwrap() = Some(candidate.to_string());
        self.saved.store(true, Ordering::SeqCst);
        self.arm_reset();
        true
    }

    pub fn clear(&self) -> bool {
        if !self.store.clear() {
            return false;
        }
        *self.current.lock().unwrap() = None;
        true
    }

    fn arm_reset(&self) {
        let saved = Arc::clone(&self.saved);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(SAVED_RESET).await;
            saved.store(false, Ordering::SeqCst);
        });
        if let Some(prev) = self.reset_task.lock().unwrap().replace(handle) {
            prev.abort();
        }
    }
}

impl Drop for EmailConfigStore {
    fn drop(&mut self) {
        if let Some(handle) = self.reset_task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_plain_address() {
        assert!(is_valid_email("a@b.co"));
    }

    #[test]
    fn validate_rejects_non_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b@c.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn save_rejects_invalid_without_touching_state() {
        let cfg = EmailConfigStore::new(Box::new(MemStore::default()));
        assert!(!cfg.save("nope"));
        assert!(cfg.current().is_none());
        assert!(!cfg.just_saved());
    }

    #[tokio::test]
    async fn save_persists_and_reloads() {
        let store = MemStore::default();
        store.set("seed@example.com");
        let cfg = EmailConfigStore::new(Box::new(store));
        assert_eq!(cfg.current().as_deref(), Some("seed@example.com"));

        assert!(cfg.save("reader@example.com"));
        assert_eq!(cfg.current().as_deref(), Some("reader@example.com"));
        assert!(cfg.just_saved());
    }

    #[tokio::test]
    async fn clear_is_explicit_only() {
        let cfg = EmailConfigStore::new(Box::new(MemStore::default()));
        assert!(cfg.save("reader@example.com"));
        assert!(cfg.clear());
        assert!(cfg.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn saved_flag_auto_clears_after_delay() {
        let cfg = EmailConfigStore::new(Box::new(MemStore::default()));
        assert!(cfg.save("reader@example.com"));
        assert!(cfg.just_saved());

        tokio::time::sleep(SAVED_RESET + Duration::from_millis(100)).await;
        assert!(!cfg.just_saved());
        // the address itself is never auto-cleared
        assert_eq!(cfg.current().as_deref(), Some("reader@example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn resave_rearms_the_reset_timer() {
        let cfg = EmailConfigStore::new(Box::new(MemStore::default()));
        assert!(cfg.save("first@example.com"));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(cfg.save("second@example.com"));
        // two seconds after the re-save the first timer would have fired
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(cfg.just_saved());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!cfg.just_saved());
    }
}
