//! Request data conditions are checked against.

use chrono::{DateTime, Utc};

/// What a condition can see of the current request.
///
/// Everything is optional: code evaluating flags outside a request (a
/// background job, a CLI) passes an empty context and request-bound
/// conditions simply do not match.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    username: Option<String>,
    path: Option<String>,
    params: Vec<(String, String)>,
    now: DateTime<Utc>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self {
            username: None,
            path: None,
            params: Vec::new(),
            now: Utc::now(),
        }
    }
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticated user's username.
    pub fn with_user(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a query parameter. Repeated names are kept in order.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Pin the clock, for date conditions.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Every value given for a parameter name.
    pub fn param_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.params
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
