//! Property tests for the name-based access policy.

use proptest::prelude::*;

use scriptbox::{ClassAccessPolicy, PrefixMatcher};

// Representative configuration in the shape a JS extraction-rule host uses.
const WHITELIST: &[&str] = &[
    "java.lang.String",
    "java.lang.Integer",
    "java.lang.Math",
    "java.lang.StringBuilder",
    "java.util.ArrayList",
    "java.util.HashMap",
    "java.util.regex",
    "java.text.SimpleDateFormat",
    "java.net.URLEncoder",
    "org.jsoup",
    "io.legado.app",
];

const BLACKLIST: &[&str] = &[
    "java.lang.Runtime",
    "java.lang.ProcessBuilder",
    "java.lang.reflect",
    "java.lang.invoke",
    "java.io.File",
    "java.net.URLClassLoader",
    "io.legado.app.data.AppDatabase",
    "io.legado.app.data.dao",
];

const UNKNOWN: &[&str] = &[
    "com.example.unknown",
    "net.custom.library",
    "org.apache.commons",
    "kotlin.collections",
    "android.app",
    "javax.crypto",
];

fn policy() -> ClassAccessPolicy {
    ClassAccessPolicy::new(WHITELIST.iter().copied(), BLACKLIST.iter().copied())
}

proptest! {
    /// Any descendant of a blacklist prefix is denied, whitelist or not.
    #[test]
    fn blacklisted_descendants_always_denied(
        prefix in prop::sample::select(BLACKLIST.to_vec()),
        suffix in "[A-Za-z][A-Za-z0-9]{0,16}",
    ) {
        let name = format!("{prefix}.{suffix}");
        prop_assert!(!policy().is_visible(&name));
    }

    /// Blacklist prefixes themselves are denied exactly.
    #[test]
    fn blacklisted_exact_names_denied(prefix in prop::sample::select(BLACKLIST.to_vec())) {
        prop_assert!(!policy().is_visible(prefix));
    }

    /// Descendants of whitelist prefixes are visible unless the blacklist
    /// also claims them.
    #[test]
    fn whitelisted_descendants_visible(
        prefix in prop::sample::select(WHITELIST.to_vec()),
        suffix in "[A-Za-z][A-Za-z0-9]{0,16}",
    ) {
        let name = format!("{prefix}.{suffix}");
        let blacklist = PrefixMatcher::new(BLACKLIST.iter().copied());
        prop_assume!(!blacklist.matches(&name));
        prop_assert!(policy().is_visible(&name));
    }

    /// Names under none of the prefixes are denied by default.
    #[test]
    fn unknown_names_denied(
        prefix in prop::sample::select(UNKNOWN.to_vec()),
        suffix in "[A-Za-z][A-Za-z0-9]{0,16}",
    ) {
        let name = format!("{prefix}.{suffix}");
        prop_assert!(!policy().is_visible(&name));
    }

    /// The decision is total: any string in, a boolean out, no panic.
    #[test]
    fn decision_is_total(name in "\\PC*") {
        let _ = policy().is_visible(&name);
    }

    /// Appending non-dot characters to a prefix never matches: sibling
    /// classes sharing a stem stay invisible.
    #[test]
    fn no_dot_boundary_bypass(suffix in "[A-Za-z0-9_$]{1,12}") {
        let matcher = PrefixMatcher::new(["java.lang.String"]);
        let candidate = format!("java.lang.String{}", suffix);
        prop_assert!(!matcher.matches(&candidate));
    }

    /// Deterministic: the same input always yields the same decision.
    #[test]
    fn decision_is_deterministic(name in "[a-z]{1,8}(\\.[a-zA-Z0-9]{1,8}){0,4}") {
        let policy = policy();
        let first = policy.is_visible(&name);
        for _ in 0..3 {
            prop_assert_eq!(policy.is_visible(&name), first);
        }
    }
}
