//! Type-based denial of live host object instances.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Registry of types whose instances must never reach script scope, even if
/// their class name passes [`ClassAccessPolicy`](super::ClassAccessPolicy).
///
/// Checked by runtime type test on the instance, not by name string: an
/// object can be obtained through APIs that never go through name-based
/// resolution (e.g. return values of whitelisted methods). Anything not in
/// the registry is visible; the filter is a secondary backstop over the
/// name-based default-deny, not the primary gate.
///
/// Write-once at startup, then shared read-only behind an `Arc`.
#[derive(Debug, Default)]
pub struct RuntimeObjectFilter {
    protected: HashMap<TypeId, &'static str>,
}

impl RuntimeObjectFilter {
    /// An empty filter: every instance is visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter protecting the standard dangerous types: filesystem handles
    /// and paths, process primitives, network sockets, and the sandbox's own
    /// configuration surface (scripts must not reconfigure their sandbox).
    pub fn with_defaults() -> Self {
        let mut filter = Self::new();
        filter.register::<std::fs::File>();
        filter.register::<std::fs::OpenOptions>();
        filter.register::<std::path::PathBuf>();
        filter.register::<std::process::Command>();
        filter.register::<std::process::Child>();
        filter.register::<std::net::TcpStream>();
        filter.register::<std::net::TcpListener>();
        filter.register::<std::net::UdpSocket>();
        filter.register::<crate::config::SandboxConfig>();
        filter.register::<crate::guard::CancellationSignal>();
        filter.register::<super::ClassAccessPolicy>();
        filter
    }

    /// Mark instances of `T` as invisible to scripts.
    pub fn register<T: Any>(&mut self) {
        self.protected
            .insert(TypeId::of::<T>(), std::any::type_name::<T>());
    }

    /// Whether this instance may be handed to script code.
    pub fn is_visible(&self, instance: &dyn Any) -> bool {
        !self.protected.contains_key(&instance.type_id())
    }

    /// Diagnostic name of the protected type, if this instance is protected.
    pub fn protected_name(&self, instance: &dyn Any) -> Option<&'static str> {
        self.protected.get(&instance.type_id()).copied()
    }

    pub fn len(&self) -> usize {
        self.protected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protected.is_empty()
    }
}
