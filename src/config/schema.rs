//! Policy schema definitions.
//!
//! This module defines the trust policy loaded from the operator-maintained
//! configuration file. Every type denies unknown fields so that a typo in the
//! file fails the whole load instead of silently weakening the policy.

use serde::{Deserialize, Deserializer, Serialize};

/// One fully parsed configuration: the trusted users and their routes.
///
/// A snapshot is immutable once published by the store. Changes are made by
/// building a new snapshot and swapping it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySnapshot {
    /// Trusted users, in file order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<User>,
}

impl PolicySnapshot {
    /// Look up a user by name.
    ///
    /// Duplicate usernames are not rejected at load time; the first entry wins.
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Total number of routes across all users.
    pub fn route_count(&self) -> usize {
        self.users.iter().map(|u| u.proxies.len()).sum()
    }
}

/// A user allowed to log in to the tunnel server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    /// Login name, matched against the `user` field sent by the client.
    pub username: String,

    /// Shared secret, matched against the client's `token` meta.
    pub password: String,

    /// Routes this user may register.
    #[serde(default, deserialize_with = "null_as_default")]
    pub proxies: Vec<Route>,
}

impl User {
    /// Look up one of this user's routes by name.
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.proxies.iter().find(|p| p.name == name)
    }
}

/// A pre-approved tunnel registration template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    /// Route name, unique within the owning user.
    pub name: String,

    /// Domains the tunnel is exposed on.
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_domains: Vec<String>,

    /// Basic-auth user enforced on the tunnel's traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_user: Option<String>,

    /// Basic-auth password enforced on the tunnel's traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_password: Option<String>,
}

/// Go-style encoders write empty maps and slices as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
