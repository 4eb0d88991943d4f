//! Supervision Directory
//!
//! Keeps track of who supervises whom and which resources (images, videos,
//! audio) supervisors have handed out. Supervisors only ever see the users
//! assigned to them, which is what the role-based dashboards list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::emotion::{Role, UserId, UserProfile};

/// Kind of media a supervisor can assign
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Video,
    Audio,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Image => write!(f, "image"),
            ResourceKind::Video => write!(f, "video"),
            ResourceKind::Audio => write!(f, "audio"),
        }
    }
}

/// A media resource assigned by a supervisor to a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: Uuid,
    pub kind: ResourceKind,
    /// Public URL of the uploaded file
    pub url: String,
    pub title: String,
    pub assigned_by: UserId,
    pub assigned_to: UserId,
    pub assigned_at: DateTime<Utc>,
}

/// Errors raised by the supervision directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisionError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("User {0} cannot supervise others")]
    NotASupervisor(UserId),

    #[error("User {0} cannot supervise themselves")]
    SelfAssignment(UserId),

    #[error("User {user} is not assigned to {supervisor}")]
    NotAssigned { supervisor: UserId, user: UserId },

    #[error("Resource URL must not be empty")]
    EmptyUrl,
}

#[derive(Default)]
struct DirectoryState {
    profiles: HashMap<UserId, UserProfile>,
    /// Supervisor → assigned users
    assignments: HashMap<UserId, BTreeSet<UserId>>,
    resources: Vec<Resource>,
}

/// In-memory directory of users, supervision links and resources
#[derive(Default)]
pub struct SupervisionDirectory {
    state: RwLock<DirectoryState>,
}

impl SupervisionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user profile
    ///
    /// Replacing a supervisor with a role that cannot supervise drops the
    /// users assigned to them.
    pub async fn register(&self, profile: UserProfile) {
        tracing::debug!(user = %profile.id, role = %profile.role, "Registered user");
        let mut state = self.state.write().await;
        if !profile.role.can_supervise() {
            if let Some(users) = state.assignments.remove(&profile.id) {
                tracing::info!(
                    supervisor = %profile.id,
                    dropped = users.len(),
                    "Supervision links removed after role change"
                );
            }
        }
        state.profiles.insert(profile.id.clone(), profile);
    }

    pub async fn profile(&self, id: &UserId) -> Option<UserProfile> {
        self.state.read().await.profiles.get(id).cloned()
    }

    /// Link `user` to `supervisor`; assigning twice is a no-op
    pub async fn assign_user(
        &self,
        supervisor: &UserId,
        user: &UserId,
    ) -> Result<(), SupervisionError> {
        if supervisor == user {
            return Err(SupervisionError::SelfAssignment(user.clone()));
        }

        let mut state = self.state.write().await;
        let supervisor_role = state
            .profiles
            .get(supervisor)
            .map(|p| p.role)
            .ok_or_else(|| SupervisionError::UserNotFound(supervisor.clone()))?;
        if !supervisor_role.can_supervise() {
            return Err(SupervisionError::NotASupervisor(supervisor.clone()));
        }
        if !state.profiles.contains_key(user) {
            return Err(SupervisionError::UserNotFound(user.clone()));
        }

        let added = state
            .assignments
            .entry(supervisor.clone())
            .or_default()
            .insert(user.clone());
        if added {
            tracing::info!(supervisor = %supervisor, user = %user, "User assigned to supervisor");
        }
        Ok(())
    }

    /// Remove a supervision link, returning whether it existed
    pub async fn unassign_user(&self, supervisor: &UserId, user: &UserId) -> bool {
        let mut state = self.state.write().await;
        let removed = state
            .assignments
            .get_mut(supervisor)
            .map(|users| users.remove(user))
            .unwrap_or(false);
        if state.assignments.get(supervisor).is_some_and(|u| u.is_empty()) {
            state.assignments.remove(supervisor);
        }
        removed
    }

    /// Profiles of the users assigned to `supervisor`, ordered by id
    pub async fn assigned_users(&self, supervisor: &UserId) -> Vec<UserProfile> {
        let state = self.state.read().await;
        state
            .assignments
            .get(supervisor)
            .map(|users| {
                users
                    .iter()
                    .filter_map(|id| state.profiles.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Supervisors `user` is assigned to
    pub async fn supervisors_of(&self, user: &UserId) -> Vec<UserId> {
        let state = self.state.read().await;
        let mut supervisors: Vec<UserId> = state
            .assignments
            .iter()
            .filter(|(_, users)| users.contains(user))
            .map(|(s, _)| s.clone())
            .collect();
        supervisors.sort();
        supervisors
    }

    pub async fn is_assigned(&self, supervisor: &UserId, user: &UserId) -> bool {
        self.state
            .read()
            .await
            .assignments
            .get(supervisor)
            .is_some_and(|users| users.contains(user))
    }

    /// Hand a resource to one of the supervisor's users
    pub async fn assign_resource(
        &self,
        supervisor: &UserId,
        user: &UserId,
        kind: ResourceKind,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Resource, SupervisionError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(SupervisionError::EmptyUrl);
        }

        // Role and link are checked under the same guard the resource is pushed with
        let mut state = self.state.write().await;
        let role = state
            .profiles
            .get(supervisor)
            .map(|p| p.role)
            .ok_or_else(|| SupervisionError::UserNotFound(supervisor.clone()))?;
        if !role.can_supervise() {
            return Err(SupervisionError::NotASupervisor(supervisor.clone()));
        }
        let assigned = state
            .assignments
            .get(supervisor)
            .is_some_and(|users| users.contains(user));
        if !assigned {
            return Err(SupervisionError::NotAssigned {
                supervisor: supervisor.clone(),
                user: user.clone(),
            });
        }

        let resource = Resource {
            id: Uuid::new_v4(),
            kind,
            url,
            title: title.into(),
            assigned_by: supervisor.clone(),
            assigned_to: user.clone(),
            assigned_at: Utc::now(),
        };

        tracing::info!(
            supervisor = %supervisor,
            user = %user,
            kind = %kind,
            resource_id = %resource.id,
            "Resource assigned"
        );

        state.resources.push(resource.clone());
        Ok(resource)
    }

    /// Resources assigned to `user`, newest first
    pub async fn resources_for(&self, user: &UserId) -> Vec<Resource> {
        let state = self.state.read().await;
        let mut resources: Vec<Resource> = state
            .resources
            .iter()
            .filter(|r| &r.assigned_to == user)
            .cloned()
            .collect();
        // Insertion order breaks ties between equal timestamps: reverse first, then stable sort
        resources.reverse();
        resources.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        resources
    }

    /// Users registered with the given role
    pub async fn users_with_role(&self, role: Role) -> Vec<UserProfile> {
        let state = self.state.read().await;
        let mut users: Vec<UserProfile> = state
            .profiles
            .values()
            .filter(|p| p.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn directory() -> SupervisionDirectory {
        let dir = SupervisionDirectory::new();
        dir.register(UserProfile::new("prof", "Ms. Rivera", Role::Professor)).await;
        dir.register(UserProfile::new("mom", "Ana", Role::Family)).await;
        dir.register(UserProfile::new("kid-a", "Leo", Role::User)).await;
        dir.register(UserProfile::new("kid-b", "Mia", Role::User)).await;
        dir
    }

    fn id(s: &str) -> UserId {
        UserId::from(s)
    }

    #[tokio::test]
    async fn test_assign_and_list() {
        let dir = directory().await;

        dir.assign_user(&id("prof"), &id("kid-b")).await.unwrap();
        dir.assign_user(&id("prof"), &id("kid-a")).await.unwrap();
        dir.assign_user(&id("prof"), &id("kid-a")).await.unwrap();
        dir.assign_user(&id("mom"), &id("kid-a")).await.unwrap();

        let users = dir.assigned_users(&id("prof")).await;
        let names: Vec<&str> = users.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Leo", "Mia"]);

        assert_eq!(dir.supervisors_of(&id("kid-a")).await, vec![id("mom"), id("prof")]);
        assert!(dir.assigned_users(&id("mom")).await.len() == 1);
    }

    #[tokio::test]
    async fn test_assignment_rules() {
        let dir = directory().await;

        assert_eq!(
            dir.assign_user(&id("kid-a"), &id("kid-b")).await,
            Err(SupervisionError::NotASupervisor(id("kid-a")))
        );
        assert_eq!(
            dir.assign_user(&id("prof"), &id("prof")).await,
            Err(SupervisionError::SelfAssignment(id("prof")))
        );
        assert_eq!(
            dir.assign_user(&id("ghost"), &id("kid-a")).await,
            Err(SupervisionError::UserNotFound(id("ghost")))
        );
        assert_eq!(
            dir.assign_user(&id("prof"), &id("ghost")).await,
            Err(SupervisionError::UserNotFound(id("ghost")))
        );
    }

    #[tokio::test]
    async fn test_unassign() {
        let dir = directory().await;
        dir.assign_user(&id("prof"), &id("kid-a")).await.unwrap();

        assert!(dir.unassign_user(&id("prof"), &id("kid-a")).await);
        assert!(!dir.unassign_user(&id("prof"), &id("kid-a")).await);
        assert!(dir.assigned_users(&id("prof")).await.is_empty());
        assert!(dir.supervisors_of(&id("kid-a")).await.is_empty());
    }

    #[tokio::test]
    async fn test_resource_assignment() {
        let dir = directory().await;
        dir.assign_user(&id("prof"), &id("kid-a")).await.unwrap();

        let first = dir
            .assign_resource(&id("prof"), &id("kid-a"), ResourceKind::Audio, "https://cdn.example/calm.mp3", "Breathing")
            .await
            .unwrap();
        let second = dir
            .assign_resource(&id("prof"), &id("kid-a"), ResourceKind::Image, "https://cdn.example/sun.png", "Sunshine")
            .await
            .unwrap();

        let resources = dir.resources_for(&id("kid-a")).await;
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].id, second.id);
        assert_eq!(resources[1].id, first.id);
        assert_eq!(resources[1].assigned_by, id("prof"));
        assert!(dir.resources_for(&id("kid-b")).await.is_empty());
    }

    #[tokio::test]
    async fn test_resource_requires_assignment() {
        let dir = directory().await;

        let err = dir
            .assign_resource(&id("prof"), &id("kid-b"), ResourceKind::Video, "https://cdn.example/v.mp4", "Story")
            .await
            .unwrap_err();
        assert!(matches!(err, SupervisionError::NotAssigned { .. }));

        dir.assign_user(&id("prof"), &id("kid-b")).await.unwrap();
        let err = dir
            .assign_resource(&id("prof"), &id("kid-b"), ResourceKind::Video, "  ", "Story")
            .await
            .unwrap_err();
        assert_eq!(err, SupervisionError::EmptyUrl);
    }

    #[tokio::test]
    async fn test_role_downgrade_revokes_supervision() {
        let dir = directory().await;
        dir.assign_user(&id("prof"), &id("kid-a")).await.unwrap();

        dir.register(UserProfile::new("prof", "Ms. Rivera", Role::User)).await;

        assert!(!dir.is_assigned(&id("prof"), &id("kid-a")).await);
        assert!(dir.supervisors_of(&id("kid-a")).await.is_empty());
        assert_eq!(
            dir.assign_resource(&id("prof"), &id("kid-a"), ResourceKind::Image, "https://cdn.example/a.png", "Art")
                .await,
            Err(SupervisionError::NotASupervisor(id("prof")))
        );
        assert!(dir.resources_for(&id("kid-a")).await.is_empty());
    }

    #[tokio::test]
    async fn test_reregistering_supervisor_keeps_links() {
        let dir = directory().await;
        dir.assign_user(&id("mom"), &id("kid-a")).await.unwrap();

        dir.register(UserProfile::new("mom", "Ana", Role::Supervisor)).await;
        assert!(dir.is_assigned(&id("mom"), &id("kid-a")).await);
    }

    #[tokio::test]
    async fn test_users_with_role() {
        let dir = directory().await;
        let kids = dir.users_with_role(Role::User).await;
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].id, id("kid-a"));
        assert_eq!(dir.profile(&id("mom")).await.unwrap().role, Role::Family);
    }
}
