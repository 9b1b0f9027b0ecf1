//! Default-deny class visibility.

use std::fmt;
use std::sync::Arc;

use crate::audit::{report, AuditLogger, DenialReason, SecurityEvent, TracingAuditLogger};
use crate::config::SandboxConfig;

use super::PrefixMatcher;

/// Whitelist/blacklist decision engine over dotted host class names.
///
/// The blacklist always wins: a name matching both lists is denied, so a
/// broad whitelist prefix cannot accidentally expose a dangerous nested
/// namespace the blacklist carves out. Names matching neither list are
/// denied.
///
/// One instance per sandbox process, immutable after construction; the
/// decision is a pure function of the configured prefixes and the input
/// string, safe to call concurrently from multiple script threads.
pub struct ClassAccessPolicy {
    blacklist: PrefixMatcher,
    whitelist: PrefixMatcher,
    audit: Arc<dyn AuditLogger>,
}

impl ClassAccessPolicy {
    pub fn new<I, J, S, T>(whitelist: I, blacklist: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            blacklist: PrefixMatcher::new(blacklist),
            whitelist: PrefixMatcher::new(whitelist),
            audit: Arc::new(TracingAuditLogger),
        }
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(
            config.whitelist_prefixes.iter().cloned(),
            config.blacklist_prefixes.iter().cloned(),
        )
    }

    /// Replace the audit sink for denial events.
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit = logger;
        self
    }

    /// Whether scripts may resolve `full_name`.
    ///
    /// Strict order: blacklist deny, whitelist allow, default deny. Denials
    /// are logged at warn level naming the offending class; a failing logger
    /// backend never affects the decision.
    pub fn is_visible(&self, full_name: &str) -> bool {
        if self.blacklist.matches(full_name) {
            self.deny(full_name, DenialReason::Blacklisted);
            return false;
        }
        if self.whitelist.matches(full_name) {
            return true;
        }
        self.deny(full_name, DenialReason::NotWhitelisted);
        false
    }

    pub fn whitelist(&self) -> &PrefixMatcher {
        &self.whitelist
    }

    pub fn blacklist(&self) -> &PrefixMatcher {
        &self.blacklist
    }

    pub(crate) fn audit_handle(&self) -> Arc<dyn AuditLogger> {
        Arc::clone(&self.audit)
    }

    fn deny(&self, class: &str, reason: DenialReason) {
        report(&*self.audit, SecurityEvent::class_denied(class, reason));
    }
}

impl fmt::Debug for ClassAccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassAccessPolicy")
            .field("whitelist", &self.whitelist)
            .field("blacklist", &self.blacklist)
            .finish_non_exhaustive()
    }
}
