//! Condition kinds: how each one is checked and validated.
//!
//! The registry maps a kind name (`boolean`, `path matches`, ...) to a
//! [`ConditionCheck`]. Lookups of unregistered kinds never fail during
//! evaluation; they just do not match.
//!
//! `True`/`False` values are spelled exactly that way for every kind that
//! takes them; settings booleans are normalised to this spelling on load.

use crate::condition::{
    AFTER_DATE, ANONYMOUS, BEFORE_DATE, BOOLEAN, FALSE, PARAMETER, PATH_MATCHES, TRUE, USER,
};
use crate::context::EvaluationContext;
use crate::error::{FlagError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A kind of condition.
pub trait ConditionCheck: Send + Sync {
    /// Whether `value` holds for the request. Malformed values are false.
    fn check(&self, value: &str, ctx: &EvaluationContext) -> bool;

    /// Reject values this kind can never interpret.
    fn validate(&self, value: &str) -> std::result::Result<(), String>;
}

/// `boolean`: on when the value is exactly `True`.
pub struct BooleanCondition;

impl ConditionCheck for BooleanCondition {
    fn check(&self, value: &str, _ctx: &EvaluationContext) -> bool {
        value == TRUE
    }

    fn validate(&self, value: &str) -> std::result::Result<(), String> {
        if value == TRUE || value == FALSE {
            Ok(())
        } else {
            Err(format!("Enter {} or {}", TRUE, FALSE))
        }
    }
}

/// `user`: the request's username equals the value.
pub struct UserCondition;

impl ConditionCheck for UserCondition {
    fn check(&self, value: &str, ctx: &EvaluationContext) -> bool {
        ctx.username() == Some(value)
    }

    fn validate(&self, value: &str) -> std::result::Result<(), String> {
        if value.trim().is_empty() {
            Err("Enter a username".to_string())
        } else {
            Ok(())
        }
    }
}

/// `anonymous`: the request's anonymity equals the value.
pub struct AnonymousCondition;

impl ConditionCheck for AnonymousCondition {
    fn check(&self, value: &str, ctx: &EvaluationContext) -> bool {
        match parse_bool(value) {
            Some(expected) => ctx.is_anonymous() == expected,
            None => false,
        }
    }

    fn validate(&self, value: &str) -> std::result::Result<(), String> {
        parse_bool(value)
            .map(|_| ())
            .ok_or_else(|| format!("Enter {} or {}", TRUE, FALSE))
    }
}

/// `parameter`: `name` is present in the query, or `name=value` is.
pub struct ParameterCondition;

impl ConditionCheck for ParameterCondition {
    fn check(&self, value: &str, ctx: &EvaluationContext) -> bool {
        match value.split_once('=') {
            Some((name, expected)) => ctx.param_values(name).any(|v| v == expected),
            None => ctx.param_values(value).next().is_some(),
        }
    }

    fn validate(&self, value: &str) -> std::result::Result<(), String> {
        let name = value.split_once('=').map_or(value, |(name, _)| name);
        if name.trim().is_empty() {
            Err("Enter a parameter name, optionally followed by =value".to_string())
        } else {
            Ok(())
        }
    }
}

/// `path matches`: the value is a regex searched for in the request path.
///
/// Compiled patterns are cached per value; invalid ones are cached as `None`.
#[derive(Default)]
pub struct PathMatchesCondition {
    compiled: RwLock<HashMap<String, Option<Regex>>>,
}

impl PathMatchesCondition {
    pub fn new() -> Self {
        Self::default()
    }

    fn pattern(&self, value: &str) -> Option<Regex> {
        if let Some(cached) = self.compiled.read().get(value) {
            return cached.clone();
        }
        let compiled = Regex::new(value).ok();
        self.compiled
            .write()
            .insert(value.to_string(), compiled.clone());
        compiled
    }

    /// Number of distinct patterns seen so far.
    pub fn cached(&self) -> usize {
        self.compiled.read().len()
    }
}

impl ConditionCheck for PathMatchesCondition {
    fn check(&self, value: &str, ctx: &EvaluationContext) -> bool {
        let Some(path) = ctx.path() else {
            return false;
        };
        self.pattern(value).is_some_and(|re| re.is_match(path))
    }

    fn validate(&self, value: &str) -> std::result::Result<(), String> {
        if value.is_empty() {
            return Err("Enter a path pattern".to_string());
        }
        Regex::new(value)
            .map(|_| ())
            .map_err(|e| format!("Enter a valid regular expression: {}", e))
    }
}

/// `after date` / `before date`.
pub struct DateCondition {
    after: bool,
}

impl DateCondition {
    pub fn after() -> Self {
        Self { after: true }
    }

    pub fn before() -> Self {
        Self { after: false }
    }
}

impl ConditionCheck for DateCondition {
    fn check(&self, value: &str, ctx: &EvaluationContext) -> bool {
        match parse_date(value) {
            Some(moment) if self.after => ctx.now() > moment,
            Some(moment) => ctx.now() < moment,
            None => false,
        }
    }

    fn validate(&self, value: &str) -> std::result::Result<(), String> {
        parse_date(value)
            .map(|_| ())
            .ok_or_else(|| "Enter a date (YYYY-MM-DD) or an RFC 3339 timestamp".to_string())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        TRUE => Some(true),
        FALSE => Some(false),
        _ => None,
    }
}

/// RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (UTC) or a bare date (UTC midnight).
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(moment) = DateTime::parse_from_rfc3339(value) {
        return Some(moment.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Registered condition kinds
#[derive(Clone)]
pub struct ConditionRegistry {
    checks: BTreeMap<String, Arc<dyn ConditionCheck>>,
}

impl ConditionRegistry {
    /// An empty registry; every condition is unknown.
    pub fn empty() -> Self {
        Self {
            checks: BTreeMap::new(),
        }
    }

    /// The built-in kinds.
    pub fn new() -> Self {
        Self::empty()
            .with(BOOLEAN, BooleanCondition)
            .with(USER, UserCondition)
            .with(ANONYMOUS, AnonymousCondition)
            .with(PARAMETER, ParameterCondition)
            .with(PATH_MATCHES, PathMatchesCondition::new())
            .with(AFTER_DATE, DateCondition::after())
            .with(BEFORE_DATE, DateCondition::before())
    }

    /// Register (or replace) a kind.
    pub fn with(mut self, name: impl Into<String>, check: impl ConditionCheck + 'static) -> Self {
        self.register(name, check);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, check: impl ConditionCheck + 'static) {
        self.checks.insert(name.into(), Arc::new(check));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }

    /// Check a condition; unknown kinds are false.
    pub fn check(&self, kind: &str, value: &str, ctx: &EvaluationContext) -> bool {
        self.checks
            .get(kind)
            .is_some_and(|check| check.check(value, ctx))
    }

    /// Validate a value for a kind, as the admin forms do before saving.
    pub fn validate(&self, kind: &str, value: &str) -> Result<()> {
        let check = self
            .checks
            .get(kind)
            .ok_or_else(|| FlagError::UnknownCondition(kind.to_string()))?;

        check
            .validate(value)
            .map_err(|message| FlagError::InvalidValue {
                condition: kind.to_string(),
                message,
            })
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("kinds", &self.checks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn registry() -> ConditionRegistry {
        ConditionRegistry::new()
    }

    #[test]
    fn test_boolean_is_literal() {
        let ctx = EvaluationContext::new();
        assert!(registry().check(BOOLEAN, "True", &ctx));
        assert!(!registry().check(BOOLEAN, "False", &ctx));
        assert!(!registry().check(BOOLEAN, "true", &ctx));
        assert!(!registry().check(BOOLEAN, "yes", &ctx));
    }

    #[test]
    fn test_user() {
        let ctx = EvaluationContext::new().with_user("liberty");
        assert!(registry().check(USER, "liberty", &ctx));
        assert!(!registry().check(USER, "justice", &ctx));
        assert!(!registry().check(USER, "liberty", &EvaluationContext::new()));
    }

    #[test]
    fn test_anonymous() {
        let anon = EvaluationContext::new();
        let known = EvaluationContext::new().with_user("liberty");

        assert!(registry().check(ANONYMOUS, "True", &anon));
        assert!(!registry().check(ANONYMOUS, "True", &known));
        assert!(registry().check(ANONYMOUS, "False", &known));
        assert!(!registry().check(ANONYMOUS, "perhaps", &anon));
    }

    #[test]
    fn test_true_false_spelling_is_shared() {
        let anon = EvaluationContext::new();

        for value in ["true", "TRUE", "false"] {
            assert!(!registry().check(ANONYMOUS, value, &anon));
            assert!(!registry().check(BOOLEAN, value, &anon));
            assert!(registry().validate(ANONYMOUS, value).is_err());
            assert!(registry().validate(BOOLEAN, value).is_err());
        }
        assert!(registry().validate(ANONYMOUS, "False").is_ok());
    }

    #[test]
    fn test_parameter() {
        let ctx = EvaluationContext::new()
            .with_param("beta", "")
            .with_param("theme", "dark");

        assert!(registry().check(PARAMETER, "beta", &ctx));
        assert!(registry().check(PARAMETER, "theme=dark", &ctx));
        assert!(!registry().check(PARAMETER, "theme=light", &ctx));
        assert!(!registry().check(PARAMETER, "missing", &ctx));
    }

    #[test]
    fn test_path_matches_searches() {
        let ctx = EvaluationContext::new().with_path("/db_path/child");

        assert!(registry().check(PATH_MATCHES, "/db_path", &ctx));
        assert!(registry().check(PATH_MATCHES, "child$", &ctx));
        assert!(!registry().check(PATH_MATCHES, "^/other", &ctx));
        assert!(!registry().check(PATH_MATCHES, "([unclosed", &ctx));
        assert!(!registry().check(PATH_MATCHES, "/db_path", &EvaluationContext::new()));
    }

    #[test]
    fn test_path_patterns_are_compiled_once() {
        let condition = PathMatchesCondition::new();
        let ctx = EvaluationContext::new().with_path("/beta/page");

        assert!(condition.check("^/beta", &ctx));
        assert!(condition.check("^/beta", &ctx));
        assert!(!condition.check("([", &ctx));
        assert!(!condition.check("([", &ctx));

        assert_eq!(condition.cached(), 2);
    }

    #[test]
    fn test_dates() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let ctx = EvaluationContext::new().at(now);

        assert!(registry().check(AFTER_DATE, "2024-05-31", &ctx));
        assert!(!registry().check(AFTER_DATE, "2024-06-02", &ctx));
        assert!(registry().check(BEFORE_DATE, "2024-06-01T13:00:00Z", &ctx));
        assert!(!registry().check(BEFORE_DATE, "2024-06-01 11:00", &ctx));
        assert!(!registry().check(AFTER_DATE, "last tuesday", &ctx));
    }

    #[test]
    fn test_unknown_kind_is_false() {
        let ctx = EvaluationContext::new();
        assert!(!registry().check("moon phase", "full", &ctx));
        assert!(!ConditionRegistry::empty().check(BOOLEAN, "True", &ctx));
    }

    #[test]
    fn test_validation() {
        let registry = registry();

        assert!(registry.validate(BOOLEAN, "True").is_ok());
        assert!(matches!(
            registry.validate(BOOLEAN, "on"),
            Err(FlagError::InvalidValue { .. })
        ));
        assert!(registry.validate(PATH_MATCHES, "^/db_path").is_ok());
        assert!(registry.validate(PATH_MATCHES, "([").is_err());
        assert!(registry.validate(USER, "  ").is_err());
        assert!(registry.validate(PARAMETER, "=x").is_err());
        assert!(registry.validate(AFTER_DATE, "2024-01-01").is_ok());
        assert_eq!(
            registry.validate("moon phase", "full"),
            Err(FlagError::UnknownCondition("moon phase".to_string()))
        );
    }

    #[test]
    fn test_custom_kind() {
        struct Header;

        impl ConditionCheck for Header {
            fn check(&self, value: &str, ctx: &EvaluationContext) -> bool {
                ctx.param_values("x-header").any(|v| v == value)
            }

            fn validate(&self, _value: &str) -> std::result::Result<(), String> {
                Ok(())
            }
        }

        let registry = ConditionRegistry::new().with("header", Header);
        let ctx = EvaluationContext::new().with_param("x-header", "on");

        assert!(registry.contains("header"));
        assert!(registry.check("header", "on", &ctx));
        assert_eq!(registry.kinds().count(), 8);
    }
}
