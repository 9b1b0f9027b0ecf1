//! Host class registry and the object-exposure gate.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rquickjs::{Ctx, Value};

use crate::audit::{report, AuditLogger, SecurityEvent};
use crate::policy::RuntimeObjectFilter;

/// A named host class constructible into script scope.
///
/// Implementations build the script-facing value, usually an object of
/// functions. Any live host instance handed out must go through
/// [`HostGate::expose`].
pub trait HostClass: Send + Sync {
    fn construct<'js>(&self, gate: &HostGate, ctx: Ctx<'js>) -> rquickjs::Result<Value<'js>>;
}

impl<F> HostClass for F
where
    F: for<'js> Fn(&HostGate, Ctx<'js>) -> rquickjs::Result<Value<'js>> + Send + Sync,
{
    fn construct<'js>(&self, gate: &HostGate, ctx: Ctx<'js>) -> rquickjs::Result<Value<'js>> {
        self(gate, ctx)
    }
}

pub(crate) struct HostEntry {
    class: Arc<dyn HostClass>,
    protected_members: HashSet<String>,
}

impl HostEntry {
    pub(crate) fn class(&self) -> &dyn HostClass {
        &*self.class
    }

    pub(crate) fn protected_members(&self) -> &HashSet<String> {
        &self.protected_members
    }
}

/// Dotted-name registry of host classes.
///
/// Populated by the embedding application before any evaluator is built and
/// frozen afterwards (shared behind `Arc`); no runtime mutation surface
/// exists, so a script cannot widen its own sandbox.
#[derive(Default)]
pub struct HostRegistry {
    entries: HashMap<String, HostEntry>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, class: impl HostClass + 'static) {
        self.entries.insert(
            name.into(),
            HostEntry {
                class: Arc::new(class),
                protected_members: HashSet::new(),
            },
        );
    }

    /// Register a class whose listed members are hidden from scripts: the
    /// imported facade simply lacks those properties.
    pub fn register_with_protected_members<I, S>(
        &mut self,
        name: impl Into<String>,
        class: impl HostClass + 'static,
        members: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            name.into(),
            HostEntry {
                class: Arc::new(class),
                protected_members: members.into_iter().map(Into::into).collect(),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&HostEntry> {
        self.entries.get(name)
    }
}

/// Decision point for handing live host instances to script code.
#[derive(Clone)]
pub struct HostGate {
    filter: Arc<RuntimeObjectFilter>,
    audit: Arc<dyn AuditLogger>,
}

impl HostGate {
    pub(crate) fn new(filter: Arc<RuntimeObjectFilter>, audit: Arc<dyn AuditLogger>) -> Self {
        Self { filter, audit }
    }

    /// Wrap `instance` for script scope, denying protected types.
    ///
    /// Runs before any name-based consideration: the instance may have been
    /// obtained through an API that never resolved a class name.
    pub fn expose<'js, T, W>(
        &self,
        ctx: &Ctx<'js>,
        instance: T,
        wrap: W,
    ) -> rquickjs::Result<Value<'js>>
    where
        T: Any,
        W: FnOnce(Ctx<'js>, T) -> rquickjs::Result<Value<'js>>,
    {
        if !self.filter.is_visible(&instance) {
            let type_name = self
                .filter
                .protected_name(&instance)
                .unwrap_or_else(|| std::any::type_name::<T>());
            report(&*self.audit, SecurityEvent::object_denied(type_name));
            return Err(super::throw_tagged(
                ctx,
                super::ACCESS_DENIED_ERROR,
                &format!("host object of type '{type_name}' is not visible to scripts"),
                Some(type_name),
            ));
        }
        wrap(ctx.clone(), instance)
    }

    /// Plain visibility query for embedders that wrap values themselves.
    pub fn is_visible(&self, instance: &dyn Any) -> bool {
        self.filter.is_visible(instance)
    }
}
