use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::time::interval;

use super::session::Session;
use crate::result::{Error, Result};

struct Entry {
    session: Session,
    last_active: Instant,
}

/// Sessions of every open page, keyed by session id.
///
/// Each session is only driven by its own page, the lock guards the map
/// and is never held across an await point.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        match self.sessions.lock() {
            Ok(l) => l,
            Err(e) => e.into_inner(),
        }
    }

    pub fn create(&self) -> String {
        let id = scru128::new_string();
        let entry = Entry {
            session: Session::new(&id),
            last_active: Instant::now(),
        };
        self.lock().insert(id.clone(), entry);
        log::info!("Created session {}", &id);
        id
    }

    /// Runs `f` against a session and marks it active.
    pub fn with_session<R, F>(&self, session_id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Session) -> Result<R>,
    {
        let mut sessions = self.lock();
        let Some(entry) = sessions.get_mut(session_id) else {
            return Err(Error::SessionNotFound(String::from(session_id)));
        };
        entry.last_active = Instant::now();
        f(&mut entry.session)
    }

    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.lock().remove(session_id).is_some();
        if removed {
            log::info!("Closed session {}", session_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions idle for longer than `max_idle`, returns how many went.
    pub fn sweep_expired(&self, max_idle: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.last_active.elapsed() <= max_idle;
            if !keep {
                log::info!(
                    "Removing expired session {} ({} annotations unsaved)",
                    id,
                    entry.session.annotated_count()
                );
            }
            keep
        });
        before - sessions.len()
    }
}

/// Periodically sweeps idle sessions until `recv` fires.
pub async fn clean_expired_sessions(
    mut recv: tokio::sync::oneshot::Receiver<()>,
    store: Arc<SessionStore>,
    period: Duration,
    max_idle: Duration,
) {
    let mut interval = interval(period);
    loop {
        tokio::select! {
          _ = interval.tick() => {
          }
          _ = &mut recv => {
            break;
          }
        }
        let n = store.sweep_expired(max_idle);
        if n > 0 {
            log::info!("Cleaned {} expired sessions", n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_session_is_an_error() {
        let store = SessionStore::new();
        let r = store.with_session("missing", |s| Ok(s.annotated_count()));
        assert!(matches!(r, Err(Error::SessionNotFound(_))));
    }

    #[test]
    fn sessions_are_independent() {
        let store = SessionStore::new();
        let roster = vec![String::from("ka"), String::from("matt")];
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        store
            .with_session(&a, |s| s.select_annotator("ka", &roster))
            .unwrap();
        let other = store
            .with_session(&b, |s| Ok(s.annotator().map(String::from)))
            .unwrap();
        assert_eq!(other, None);
        assert!(store.remove(&a));
        assert!(!store.remove(&a));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sweep_keeps_recent_sessions() {
        let store = SessionStore::new();
        store.create();
        assert_eq!(store.sweep_expired(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.sweep_expired(Duration::from_millis(5)), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn cleaner_stops_on_signal() {
        let store = Arc::new(SessionStore::new());
        store.create();
        let (sender, recv) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(clean_expired_sessions(
            recv,
            store.clone(),
            Duration::from_millis(10),
            Duration::from_millis(1),
        ));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.is_empty());
        sender.send(()).unwrap();
        task.await.unwrap();
    }
}
