use std::sync::Arc;

/// Yields the current bearer token, if any. Called fresh on every request and
/// every stream connect so rotated tokens are picked up without invalidation.
pub type TokenAccessor = Arc<dyn Fn() -> Option<String> + Send + Sync>;

pub fn token_accessor<F>(accessor: F) -> TokenAccessor
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    Arc::new(accessor)
}

pub fn static_token(token: impl Into<String>) -> TokenAccessor {
    let token = token.into();
    Arc::new(move || Some(token.clone()))
}

/// Accessor for unauthenticated callers.
pub fn anonymous() -> TokenAccessor {
    Arc::new(|| None)
}

/// Blank tokens are treated as absent.
pub(crate) fn current_token(accessor: &TokenAccessor) -> Option<String> {
    accessor()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn current_token_reads_accessor_on_every_call() {
        let slot = Arc::new(Mutex::new(Some("first".to_string())));
        let reader = Arc::clone(&slot);
        let accessor = token_accessor(move || reader.lock().unwrap().clone());

        assert_eq!(current_token(&accessor).as_deref(), Some("first"));
        *slot.lock().unwrap() = Some("rotated".to_string());
        assert_eq!(current_token(&accessor).as_deref(), Some("rotated"));
    }

    #[test]
    fn blank_token_counts_as_absent() {
        assert_eq!(current_token(&static_token("  ")), None);
        assert_eq!(current_token(&anonymous()), None);
    }
}
