//! Request/response types and URL resolution for the admin boundary
//!
//! The admin is transport-agnostic: a host framework converts its request
//! into an [`AdminRequest`], calls [`crate::FlagAdmin::handle`], and writes
//! the [`AdminResponse`] back.

use crate::forms::CREATE_SEGMENT;
use flagpole_features::EvaluationContext;
use serde::{Deserialize, Serialize};

/// HTTP method as far as the admin cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    /// Served like `Get` but never mutates.
    Head,
    Post,
    Other,
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            _ => Self::Other,
        }
    }
}

/// An incoming admin request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRequest {
    pub method: Method,
    /// Full path including the admin base path
    pub path: String,
    /// Raw query string without `?`
    pub query: String,
    /// Urlencoded form body
    pub body: String,
    /// Authenticated user, if any
    pub user: Option<String>,
}

impl AdminRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: String::new(),
            body: String::new(),
            user: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::Head, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Encode `fields` as the form body.
    pub fn with_form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = serde_urlencoded::to_string(fields).unwrap_or_default();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        decode_pairs(&self.query)
    }

    pub fn form_pairs(&self) -> Vec<(String, String)> {
        decode_pairs(&self.body)
    }

    /// Whether the query carries `key`, with or without a value.
    pub fn has_query_key(&self, key: &str) -> bool {
        self.query_pairs().iter().any(|(k, _)| k == key)
    }

    /// Context for evaluating flags against this request.
    pub fn evaluation_context(&self) -> EvaluationContext {
        let mut ctx = EvaluationContext::new().with_path(&self.path);
        if let Some(user) = &self.user {
            ctx = ctx.with_user(user);
        }
        for (key, value) in self.query_pairs() {
            ctx = ctx.with_param(key, value);
        }
        ctx
    }
}

fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(encoded).unwrap_or_default()
}

/// An outgoing admin response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl AdminResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, body).header("Content-Type", "text/html; charset=utf-8")
    }

    /// 302 Found
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(302, "").header("Location", location)
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed")
    }

    pub fn server_error() -> Self {
        Self::new(500, "Internal Server Error")
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn location(&self) -> Option<&str> {
        self.header_value("Location")
    }

    pub fn is_redirect(&self) -> bool {
        self.status == 302
    }
}

/// Admin pages, resolved from a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    CreateFlag,
    Flag(String),
    CreateCondition(String),
    Condition(String, i64),
    DeleteCondition(String, i64),
}

impl Route {
    /// Resolve `path` relative to `base_path`.
    ///
    /// A flag literally named `create` would be shadowed by the create page;
    /// the new-flag form refuses that name.
    pub fn resolve(base_path: &str, path: &str) -> Option<Self> {
        let rest = path.strip_prefix(base_path)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let trimmed = rest.trim_matches('/');
        let segments: Vec<String> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('/')
                .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).ok())
                .collect::<Option<Vec<_>>>()?
        };

        let route = match segments.as_slice() {
            [] => Self::Index,
            [create] if create == CREATE_SEGMENT => Self::CreateFlag,
            [name] => Self::Flag(name.clone()),
            [name, create] if create == CREATE_SEGMENT => Self::CreateCondition(name.clone()),
            [name, id] => Self::Condition(name.clone(), id.parse().ok()?),
            [name, id, delete] if delete == "delete" => {
                Self::DeleteCondition(name.clone(), id.parse().ok()?)
            }
            _ => return None,
        };
        Some(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/admin/flags";

    #[test]
    fn test_resolve_routes() {
        assert_eq!(Route::resolve(BASE, "/admin/flags/"), Some(Route::Index));
        assert_eq!(Route::resolve(BASE, "/admin/flags"), Some(Route::Index));
        assert_eq!(Route::resolve(BASE, "/admin/flags/create/"), Some(Route::CreateFlag));
        assert_eq!(
            Route::resolve(BASE, "/admin/flags/FLAG_ENABLED/"),
            Some(Route::Flag("FLAG_ENABLED".to_string()))
        );
        assert_eq!(
            Route::resolve(BASE, "/admin/flags/F/create/"),
            Some(Route::CreateCondition("F".to_string()))
        );
        assert_eq!(
            Route::resolve(BASE, "/admin/flags/F/12/"),
            Some(Route::Condition("F".to_string(), 12))
        );
        assert_eq!(
            Route::resolve(BASE, "/admin/flags/F/12/delete/"),
            Some(Route::DeleteCondition("F".to_string(), 12))
        );
    }

    #[test]
    fn test_resolve_rejects() {
        assert_eq!(Route::resolve(BASE, "/other/"), None);
        assert_eq!(Route::resolve(BASE, "/admin/flagsX/"), None);
        assert_eq!(Route::resolve(BASE, "/admin/flags/F/abc/"), None);
        assert_eq!(Route::resolve(BASE, "/admin/flags/F/1/edit/"), None);
        assert_eq!(Route::resolve(BASE, "/admin/flags/a/b/c/d/"), None);
    }

    #[test]
    fn test_resolve_decodes_names() {
        assert_eq!(
            Route::resolve(BASE, "/admin/flags/MY%20FLAG/"),
            Some(Route::Flag("MY FLAG".to_string()))
        );
    }

    #[test]
    fn test_request_query_and_form() {
        let req = AdminRequest::post("/admin/flags/create/")
            .with_query("enable")
            .with_form(&[("name", "NEW FLAG")]);

        assert!(req.has_query_key("enable"));
        assert!(!req.has_query_key("disable"));
        assert_eq!(req.form_pairs(), vec![("name".to_string(), "NEW FLAG".to_string())]);
    }

    #[test]
    fn test_evaluation_context() {
        let ctx = AdminRequest::get("/admin/flags/")
            .with_query("preview=on")
            .with_user("liberty")
            .evaluation_context();

        assert_eq!(ctx.path(), Some("/admin/flags/"));
        assert_eq!(ctx.username(), Some("liberty"));
        assert_eq!(ctx.param_values("preview").collect::<Vec<_>>(), vec!["on"]);
    }

    #[test]
    fn test_responses() {
        let redirect = AdminResponse::redirect("/admin/flags/#F");
        assert!(redirect.is_redirect());
        assert_eq!(redirect.location(), Some("/admin/flags/#F"));

        assert_eq!(AdminResponse::not_found().status, 404);
        assert_eq!(AdminResponse::method_not_allowed().status, 405);
        assert_eq!(
            AdminResponse::html("<p>").header_value("content-type"),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("HEAD"), Method::Head);
        assert_eq!(Method::parse("POST"), Method::Post);
        assert_eq!(Method::parse("DELETE"), Method::Other);
    }
}
