use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;
use crate::db::DocumentStore;

pub struct Session {
    pub id: Uuid,
    pub host: String,
    pub port: u16,
    pub connection: Arc<dyn DocumentStore>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(host: String, port: u16, connection: Arc<dyn DocumentStore>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            host,
            port,
            connection,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn is_idle(&self, idle_timeout: Option<Duration>, now: DateTime<Utc>) -> bool {
        match idle_timeout {
            Some(timeout) => now - self.last_activity > timeout,
            None => false,
        }
    }
}

/// Maps session ids to the connection each session owns.
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub async fn put(&self, session: Session) -> Uuid {
        let id = session.id;
        info!("Opened session {} for {}:{}", id, session.host, session.port);
        self.sessions.write().await.insert(id, session);
        id
    }

    /// Looks up a live session and refreshes its activity timestamp.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<dyn DocumentStore>> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let idle = sessions.get(id)?.is_idle(self.idle_timeout, now);
        if idle {
            if let Some(session) = sessions.remove(id) {
                drop(sessions);
                info!("Session {} expired after inactivity", id);
                session.connection.close().await;
            }
            return None;
        }

        let session = sessions.get_mut(id)?;
        session.last_activity = now;
        Some(session.connection.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Session> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            info!("Closed session {}", id);
        }
        removed
    }

    /// Drops every session that has been idle past the timeout.
    pub async fn evict_idle(&self) -> Vec<Uuid> {
        let now = Utc::now();
        let expired: Vec<Session> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .values()
                .filter(|s| s.is_idle(self.idle_timeout, now))
                .map(|s| s.id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        let mut evicted = Vec::with_capacity(expired.len());
        for session in expired {
            info!("Evicted idle session {}", session.id);
            session.connection.close().await;
            evicted.push(session.id);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    #[cfg(test)]
    async fn backdate(&self, id: &Uuid, by: Duration) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.last_activity = session.last_activity - by;
        }
    }
}
