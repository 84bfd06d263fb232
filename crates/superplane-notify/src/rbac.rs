use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use superplane_core::OrganizationId;

use crate::error::NotifyError;

/// Group/role membership lookup.
/// Implemented by the host process; this crate only depends on the trait.
#[async_trait]
pub trait RbacLookup: Send + Sync {
  async fn group_member_ids(&self, org: OrganizationId, group: &str) -> Result<Vec<String>, NotifyError>;
  async fn role_assignee_ids(&self, org: OrganizationId, role: &str) -> Result<Vec<String>, NotifyError>;
}

/// Resolves a user id to the email address notifications should go to.
/// Separate from `RbacLookup` because group/role membership and user
/// identity are different collaborators in the host process.
#[async_trait]
pub trait UserDirectory: Send + Sync {
  async fn active_email(&self, org: OrganizationId, user_id: &str) -> Result<Option<String>, NotifyError>;
}

/// In-memory double of `RbacLookup` for tests. Missing groups/roles resolve
/// to an empty member list rather than an error.
#[derive(Debug, Default)]
pub struct InMemoryRbac {
  groups: RwLock<HashMap<(OrganizationId, String), Vec<String>>>,
  roles: RwLock<HashMap<(OrganizationId, String), Vec<String>>>,
}

impl InMemoryRbac {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_group(&self, org: OrganizationId, group: impl Into<String>, user_ids: Vec<String>) {
    self.groups.write().unwrap().insert((org, group.into()), user_ids);
  }

  pub fn set_role(&self, org: OrganizationId, role: impl Into<String>, user_ids: Vec<String>) {
    self.roles.write().unwrap().insert((org, role.into()), user_ids);
  }
}

#[async_trait]
impl RbacLookup for InMemoryRbac {
  async fn group_member_ids(&self, org: OrganizationId, group: &str) -> Result<Vec<String>, NotifyError> {
    Ok(self.groups.read().unwrap().get(&(org, group.to_string())).cloned().unwrap_or_default())
  }

  async fn role_assignee_ids(&self, org: OrganizationId, role: &str) -> Result<Vec<String>, NotifyError> {
    Ok(self.roles.read().unwrap().get(&(org, role.to_string())).cloned().unwrap_or_default())
  }
}

/// In-memory double of `UserDirectory` for tests. Users not registered (or
/// registered as inactive) resolve to `None`, matching "look up active user
/// rows" silently dropping unknown/inactive members.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
  emails: RwLock<HashMap<(OrganizationId, String), String>>,
}

impl InMemoryUserDirectory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_active(&self, org: OrganizationId, user_id: impl Into<String>, email: impl Into<String>) {
    self.emails.write().unwrap().insert((org, user_id.into()), email.into());
  }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
  async fn active_email(&self, org: OrganizationId, user_id: &str) -> Result<Option<String>, NotifyError> {
    Ok(self.emails.read().unwrap().get(&(org, user_id.to_string())).cloned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn unregistered_group_resolves_empty_not_error() {
    let rbac = InMemoryRbac::new();
    let org = OrganizationId::new();
    assert_eq!(rbac.group_member_ids(org, "eng").await.unwrap(), Vec::<String>::new());
  }

  #[tokio::test]
  async fn inactive_or_unknown_user_resolves_none() {
    let directory = InMemoryUserDirectory::new();
    let org = OrganizationId::new();
    assert_eq!(directory.active_email(org, "u1").await.unwrap(), None);
  }

  #[tokio::test]
  async fn registered_membership_round_trips() {
    let rbac = InMemoryRbac::new();
    let org = OrganizationId::new();
    rbac.set_group(org, "eng", vec!["u1".into(), "u2".into()]);
    assert_eq!(rbac.group_member_ids(org, "eng").await.unwrap(), vec!["u1", "u2"]);
  }
}
