// In-memory store implementation for development and testing

use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{Notification, ResearchLog, User};
use crate::store::LabStore;
use crate::Result;

/// In-memory implementation of [`LabStore`]
///
/// Thread-safe via reader-writer locks; data is lost on restart. This is the
/// reference implementation used by the test suite and by local development
/// runs of the server.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    logs: RwLock<HashMap<String, ResearchLog>>,
    notifications: RwLock<HashMap<String, Notification>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LabStore for InMemoryStore {
    async fn create_user(&self, user: User) -> Result<User> {
        // .unwrap() on lock guards: poisoning only happens if a writer
        // panicked, at which point this process is already going down
        let mut users = self.users.write().unwrap();
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.read().unwrap();
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_students_of(&self, supervisor_id: &str) -> Result<Vec<User>> {
        let users = self.users.read().unwrap();
        let mut students: Vec<User> = users
            .values()
            .filter(|u| u.supervisor_id.as_deref() == Some(supervisor_id))
            .cloned()
            .collect();
        students.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(students)
    }

    async fn create_log(&self, log: ResearchLog) -> Result<ResearchLog> {
        let mut logs = self.logs.write().unwrap();
        logs.insert(log.id.clone(), log.clone());
        Ok(log)
    }

    async fn get_log(&self, id: &str) -> Result<Option<ResearchLog>> {
        let logs = self.logs.read().unwrap();
        Ok(logs.get(id).cloned())
    }

    async fn update_log(&self, log: ResearchLog) -> Result<ResearchLog> {
        let mut logs = self.logs.write().unwrap();
        logs.insert(log.id.clone(), log.clone());
        Ok(log)
    }

    async fn delete_log(&self, id: &str) -> Result<bool> {
        let mut logs = self.logs.write().unwrap();
        Ok(logs.remove(id).is_some())
    }

    async fn list_logs(&self) -> Result<Vec<ResearchLog>> {
        let logs = self.logs.read().unwrap();
        let mut all: Vec<ResearchLog> = logs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_logs_by_student(&self, student_id: &str) -> Result<Vec<ResearchLog>> {
        let logs = self.logs.read().unwrap();
        let mut matching: Vec<ResearchLog> = logs
            .values()
            .filter(|log| log.student_id.as_deref() == Some(student_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn list_logs_by_students(&self, student_ids: &[String]) -> Result<Vec<ResearchLog>> {
        let logs = self.logs.read().unwrap();
        let mut matching: Vec<ResearchLog> = logs
            .values()
            .filter(|log| {
                log.student_id
                    .as_ref()
                    .map_or(false, |sid| student_ids.contains(sid))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn list_logs_by_author(&self, author_id: &str) -> Result<Vec<ResearchLog>> {
        let logs = self.logs.read().unwrap();
        let mut matching: Vec<ResearchLog> = logs
            .values()
            .filter(|log| log.author_id == author_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn create_notification(&self, notification: Notification) -> Result<Notification> {
        let mut notifications = self.notifications.write().unwrap();
        notifications.insert(notification.id.clone(), notification.clone());
        Ok(notification)
    }

    async fn list_notifications_for(&self, user_id: &str) -> Result<Vec<Notification>> {
        let notifications = self.notifications.read().unwrap();
        let mut matching: Vec<Notification> = notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        // unread first, then newest first
        matching.sort_by(|a, b| a.read.cmp(&b.read).then(b.created_at.cmp(&a.created_at)));
        Ok(matching)
    }

    async fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<bool> {
        let mut notifications = self.notifications.write().unwrap();
        match notifications.get_mut(id) {
            Some(n) if n.user_id == user_id => {
                n.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
