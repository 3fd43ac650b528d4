//! Call-scoped deserialization context.

use std::sync::Arc;

use crate::engine::deserializer::ValidatingDeserializer;
use crate::engine::EngineError;
use crate::schema::ValidatedMarker;

/// Access to resolved deserializers, for cascading into nested types.
///
/// Abstracts registry lookup so engine components do not depend on the
/// registry module.
pub trait RegistryAccess: Send + Sync {
    /// Gets the resolved deserializer for a type name.
    fn deserializer(&self, type_name: &str) -> Option<Arc<ValidatingDeserializer>>;
}

/// Context threaded through one deserialization call.
///
/// Carries registry access, recursion depth tracking, and the stack of
/// in-effect validation markers. The marker stack is what lets a cascade
/// field adopt the innermost enclosing type's validation settings without
/// any global state: entering a validated type pushes its marker, and the
/// clone-per-descent discipline pops it automatically when resolution of
/// that type completes.
#[derive(Clone)]
pub struct DeserializationContext {
    registry: Arc<dyn RegistryAccess>,
    depth: usize,
    max_depth: usize,
    markers: Vec<ValidatedMarker>,
}

impl DeserializationContext {
    /// Creates a root context for one top-level call.
    pub fn new(registry: Arc<dyn RegistryAccess>, max_depth: usize) -> Self {
        Self {
            registry,
            depth: 0,
            max_depth,
            markers: Vec::new(),
        }
    }

    /// Returns a context one level deeper, or fails when the nesting limit
    /// is exceeded.
    pub fn descend(&self) -> Result<Self, EngineError> {
        if self.depth >= self.max_depth {
            return Err(EngineError::MaxDepthExceeded(self.max_depth));
        }
        let mut next = self.clone();
        next.depth += 1;
        Ok(next)
    }

    /// Returns a context with the given marker pushed onto the in-effect
    /// stack. A `None` marker leaves the stack untouched.
    pub fn entered(&self, marker: Option<ValidatedMarker>) -> Self {
        let mut next = self.clone();
        if let Some(marker) = marker {
            next.markers.push(marker);
        }
        next
    }

    /// The innermost in-effect validation marker, if any.
    pub fn innermost_marker(&self) -> Option<&ValidatedMarker> {
        self.markers.last()
    }

    /// Current recursion depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Registry access for nested type lookups.
    pub fn registry(&self) -> &dyn RegistryAccess {
        &*self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoRegistry;

    impl RegistryAccess for NoRegistry {
        fn deserializer(&self, _: &str) -> Option<Arc<ValidatingDeserializer>> {
            None
        }
    }

    fn root() -> DeserializationContext {
        DeserializationContext::new(Arc::new(NoRegistry), 3)
    }

    #[test]
    fn test_descend_tracks_depth() {
        let ctx = root();
        assert_eq!(ctx.depth(), 0);
        let deeper = ctx.descend().unwrap();
        assert_eq!(deeper.depth(), 1);
        // the original is untouched
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_descend_fails_past_limit() {
        let mut ctx = root();
        for _ in 0..3 {
            ctx = ctx.descend().unwrap();
        }
        assert!(matches!(
            ctx.descend(),
            Err(EngineError::MaxDepthExceeded(3))
        ));
    }

    #[test]
    fn test_marker_stack_is_call_scoped() {
        let ctx = root();
        assert!(ctx.innermost_marker().is_none());

        let outer = ctx.entered(Some(
            ValidatedMarker::new().required_message("outer required"),
        ));
        assert_eq!(
            outer.innermost_marker().unwrap().required_message.as_deref(),
            Some("outer required")
        );

        let inner = outer.entered(Some(
            ValidatedMarker::new().required_message("inner required"),
        ));
        assert_eq!(
            inner.innermost_marker().unwrap().required_message.as_deref(),
            Some("inner required")
        );

        // leaving the inner scope is just dropping its clone
        assert_eq!(
            outer.innermost_marker().unwrap().required_message.as_deref(),
            Some("outer required")
        );
    }

    #[test]
    fn test_entered_without_marker_keeps_stack() {
        let ctx = root().entered(Some(ValidatedMarker::new()));
        let same = ctx.entered(None);
        assert!(same.innermost_marker().is_some());
    }
}
