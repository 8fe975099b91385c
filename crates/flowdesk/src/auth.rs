//! Bearer credential source.
//!
//! Token acquisition lives outside this crate; callers hand in whatever
//! opaque bearer token their auth layer produced. A missing token disables
//! sending but not read-only stream observation.

use std::sync::Arc;

/// Source of the current bearer token.
pub trait TokenSource: Send + Sync {
    /// Return the current bearer token, if one is available.
    fn token(&self) -> Option<String>;
}

/// A fixed token handed in at startup (or none at all).
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Shared handle to a token source.
pub type SharedTokenSource = Arc<dyn TokenSource>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token() {
        let source = StaticToken::new(Some("abc".to_string()));
        assert_eq!(source.token(), Some("abc".to_string()));
        assert_eq!(StaticToken::new(None).token(), None);
    }
}
