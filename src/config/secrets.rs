//! Secret lookup.
//!
//! Secrets are read at the moment they are needed rather than cached in
//! [`GatewayConfig`](crate::config::GatewayConfig), so an operator can rotate
//! them without a restart and a missing secret fails only the requests that
//! need it. Values are never logged.

use std::collections::HashMap;

/// Read-only source of named secrets.
pub trait SecretSource: Send + Sync {
    /// Return the trimmed value of `name`, or `None` when unset or blank.
    fn get(&self, name: &str) -> Option<String>;
}

/// Secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().and_then(non_blank)
    }
}

/// Fixed in-memory secrets, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Return a copy with `name` set to `value`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Return a copy with `name` removed.
    pub fn without(mut self, name: &str) -> Self {
        self.values.remove(name);
        self
    }
}

impl SecretSource for StaticSecrets {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned().and_then(non_blank)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_absent() {
        let secrets = StaticSecrets::new([("A", "  "), ("B", " value ")]);
        assert_eq!(secrets.get("A"), None);
        assert_eq!(secrets.get("B").as_deref(), Some("value"));
        assert_eq!(secrets.get("C"), None);
    }

    #[test]
    fn test_with_and_without() {
        let secrets = StaticSecrets::default().with("A", "1").with("B", "2").without("A");
        assert_eq!(secrets.get("A"), None);
        assert_eq!(secrets.get("B").as_deref(), Some("2"));
    }
}
