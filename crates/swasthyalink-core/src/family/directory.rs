//! Display-name resolution.

use std::collections::HashMap;

use tracing::warn;

use crate::db::Database;

/// Best-effort lookup of a display name by email.
pub trait NameResolver {
    fn resolve_name(&self, email: &str) -> Option<String>;
}

/// Fixed email → name table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    names: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            names: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameResolver for StaticDirectory {
    fn resolve_name(&self, email: &str) -> Option<String> {
        self.names.get(email).cloned()
    }
}

/// Looks names up in the `users` table. Lookup failures count as "unknown".
impl NameResolver for Database {
    fn resolve_name(&self, email: &str) -> Option<String> {
        match self.find_user_by_email(email) {
            Ok(user) => user.map(|u| u.name),
            Err(e) => {
                warn!(email, error = %e, "User directory lookup failed");
                None
            }
        }
    }
}

/// Tries each resolver in order.
pub struct ChainedResolver<'a> {
    resolvers: Vec<&'a dyn NameResolver>,
}

impl<'a> ChainedResolver<'a> {
    pub fn new(resolvers: Vec<&'a dyn NameResolver>) -> Self {
        Self { resolvers }
    }
}

impl NameResolver for ChainedResolver<'_> {
    fn resolve_name(&self, email: &str) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.resolve_name(email))
    }
}
