use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Separator between a namespace prefix and the id it decorates. A fixed
/// separator keeps prefixing injective: distinct ids never collapse.
const PREFIX_SEPARATOR: char = '-';

/// Build the namespaced form of a literal component id.
pub(crate) fn prefixed_id(prefix: &str, id: &str) -> String {
    format!("{}{}{}", prefix, PREFIX_SEPARATOR, id)
}

#[derive(Debug)]
struct HandleInner {
    base_id: OnceLock<String>,
    prefix: OnceLock<String>,
}

/// Opaque handle to a component instance that has not been rendered yet.
///
/// The generated id is created on first read (blueprint collection time) and
/// never changes afterwards. Namespacing is applied at most once, so the id
/// the render layer reads is the id dependency specs were compared with.
#[derive(Clone, Debug)]
pub struct ComponentHandle {
    inner: Arc<HandleInner>,
}

impl ComponentHandle {
    pub fn new() -> Self {
        ComponentHandle {
            inner: Arc::new(HandleInner {
                base_id: OnceLock::new(),
                prefix: OnceLock::new(),
            }),
        }
    }

    /// Handle whose instance was created with an explicit id.
    pub fn with_id<T: Into<String>>(id: T) -> Self {
        let handle = ComponentHandle::new();
        let _ = handle.inner.base_id.set(id.into());
        handle
    }

    /// Read the instance id, generating one on first access.
    pub fn ensure_id(&self) -> String {
        self.inner
            .base_id
            .get_or_init(|| format!("c-{}", Uuid::new_v4().simple()))
            .clone()
    }

    /// Namespace this instance's id. Only the first application takes effect;
    /// repeated resolution passes must not stack prefixes.
    pub fn apply_prefix(&self, prefix: &str) {
        self.ensure_id();
        let _ = self.inner.prefix.set(prefix.to_string());
    }

    /// The id the render layer will emit for this instance.
    pub fn rendered_id(&self) -> String {
        let base = self.ensure_id();
        match self.inner.prefix.get() {
            Some(prefix) => prefixed_id(prefix, &base),
            None => base,
        }
    }
}

impl Default for ComponentHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Component a transform requires the host to mount alongside the layout.
/// Nothing user-visible reads these; they exist to carry synthetic bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HiddenComponent {
    pub id: String,
    pub property: String,
}

impl HiddenComponent {
    pub fn new<I: Into<String>, P: Into<String>>(id: I, property: P) -> Self {
        HiddenComponent {
            id: id.into(),
            property: property.into(),
        }
    }
}
