use crate::store::StoreKey;

/// Separator between the prefix and the logical key.
pub const SEPARATOR: char = '#';

/// Derives store keys from logical rate-limit identifiers.
///
/// The string part is `prefix#key`. Logical keys containing `#` can collide
/// with keys under a different prefix; callers choosing prefixes must avoid that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    namespace: String,
    set: String,
    prefix: String,
}

impl KeyBuilder {
    pub fn new(namespace: impl Into<String>, set: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            prefix: prefix.into(),
        }
    }

    pub fn build(&self, key: &str) -> StoreKey {
        StoreKey::new(
            self.namespace.as_str(),
            self.set.as_str(),
            format!("{}{}{}", self.prefix, SEPARATOR, key),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key() {
        let builder = KeyBuilder::new("test", "limits", "RATE_LIMIT");
        let key = builder.build("10.0.0.1");

        assert_eq!(key.namespace, "test");
        assert_eq!(key.set, "limits");
        assert_eq!(key.key, "RATE_LIMIT#10.0.0.1");
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = KeyBuilder::new("test", "limits", "api");
        assert_eq!(builder.build("user-1"), builder.build("user-1"));
    }

    #[test]
    fn test_distinct_keys_do_not_collide() {
        let builder = KeyBuilder::new("test", "limits", "api");
        assert_ne!(builder.build("user-1"), builder.build("user-2"));
    }

    #[test]
    fn test_prefix_scopes_keys() {
        let a = KeyBuilder::new("test", "limits", "login");
        let b = KeyBuilder::new("test", "limits", "search");
        assert_ne!(a.build("10.0.0.1"), b.build("10.0.0.1"));
    }
}
