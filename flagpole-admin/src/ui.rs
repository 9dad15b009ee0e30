//! HTML rendering for the flag admin

use crate::{
    forms::FormErrors,
    views::{ConditionFormView, ConditionRow, CreateFlagView, DeleteView, FlagView, IndexView},
};
use flagpole_features::condition::TRUE;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Breadcrumb item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Label
    pub label: String,
    /// URL (None for current page)
    pub url: Option<String>,
}

impl Breadcrumb {
    /// Create a breadcrumb
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
        }
    }

    /// With URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

const STYLESHEET: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; }
.admin-header { padding: 1rem 2rem; border-bottom: 1px solid #e5e7eb; }
.admin-content { padding: 1rem 2rem; }
.admin-breadcrumbs a { color: #4f46e5; }
.admin-flag { margin-bottom: 1.5rem; }
.admin-conditions li { margin: 0.25rem 0; }
.admin-btn { display: inline-block; padding: 0.4rem 0.9rem; border-radius: 0.375rem; background: #4f46e5; color: white; text-decoration: none; border: none; }
.admin-btn-danger { background: #ef4444; }
.errorlist { color: #ef4444; }
"#;

/// HTML escape a string
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Human description of one condition.
///
/// Boolean conditions read "enabled/disabled for all requests"; everything
/// else reads "enabled when KIND is VALUE".
pub fn describe(row: &ConditionRow) -> String {
    let mut out = if row.is_boolean() {
        let state = if row.value == TRUE { "enabled" } else { "disabled" };
        format!("<b>{}</b> for all requests", state)
    } else {
        format!(
            "<b>enabled</b> when {} is <code>{}</code>",
            html_escape(&row.condition),
            html_escape(&row.value)
        )
    };
    if row.required {
        out.push_str(" <i>(required)</i>");
    }
    out
}

fn layout(title: &str, breadcrumbs: &[Breadcrumb], body: &str) -> String {
    let mut crumbs = String::new();
    for (i, crumb) in breadcrumbs.iter().enumerate() {
        if i > 0 {
            crumbs.push_str(" / ");
        }
        match &crumb.url {
            Some(url) => {
                let _ = write!(crumbs, r#"<a href="{}">{}</a>"#, html_escape(url), html_escape(&crumb.label));
            }
            None => crumbs.push_str(&html_escape(&crumb.label)),
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<header class="admin-header"><nav class="admin-breadcrumbs">{crumbs}</nav><h1>{title}</h1></header>
<main class="admin-content">
{body}
</main>
</body>
</html>
"#,
        title = html_escape(title),
        css = STYLESHEET,
        crumbs = crumbs,
        body = body,
    )
}

fn condition_list(rows: &[ConditionRow], with_actions: bool) -> String {
    if rows.is_empty() {
        return "<p><i>No conditions</i></p>\n".to_string();
    }

    let mut out = String::from("<ul class=\"admin-conditions\">\n");
    for row in rows {
        out.push_str("<li>");
        out.push_str(&describe(row));
        if with_actions {
            if let Some(url) = &row.edit_url {
                let _ = write!(out, r#" <a href="{}">Edit</a>"#, html_escape(url));
            }
            if let Some(url) = &row.delete_url {
                let _ = write!(out, r#" <a href="{}">Delete</a>"#, html_escape(url));
            }
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
    out
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: Vec<String> = errors
        .iter()
        .map(|e| format!("<li>{}</li>", html_escape(e)))
        .collect();
    format!("<ul class=\"errorlist\">{}</ul>", items.join(""))
}

pub fn render_index(view: &IndexView) -> String {
    let mut body = format!(
        r#"<p><a class="admin-btn" href="{}">Add a flag</a></p>
"#,
        html_escape(&view.create_url)
    );

    for flag in &view.flags {
        let _ = write!(
            body,
            r#"<section class="admin-flag">
<h2 id="{id}"><a href="{url}">{name}</a></h2>
{conditions}</section>
"#,
            id = html_escape(&flag.name),
            url = html_escape(&flag.url),
            name = html_escape(&flag.name),
            conditions = condition_list(&flag.conditions, false),
        );
    }

    layout(&view.title, &view.breadcrumbs, &body)
}

pub fn render_flag(view: &FlagView) -> String {
    let body = format!(
        r#"<p><a class="admin-btn" href="{toggle_url}">{toggle_label}</a></p>
<h2>Conditions from settings</h2>
{static_conditions}<h2>Conditions</h2>
{stored_conditions}<p><a class="admin-btn" href="{create_url}">Add a condition</a></p>
"#,
        toggle_url = html_escape(&view.toggle_url),
        toggle_label = html_escape(&view.toggle_label),
        static_conditions = condition_list(&view.static_conditions, false),
        stored_conditions = condition_list(&view.stored_conditions, true),
        create_url = html_escape(&view.create_condition_url),
    );

    layout(&view.title, &view.breadcrumbs, &body)
}

fn non_field_errors(errors: &FormErrors, fields: &[&str]) -> Vec<String> {
    let mut rest = Vec::new();
    for message in errors.messages() {
        let owned = fields
            .iter()
            .any(|f| errors.field(f).iter().any(|m| m == message));
        if !owned {
            rest.push(message.to_string());
        }
    }
    rest
}

pub fn render_create_flag(view: &CreateFlagView) -> String {
    let body = format!(
        r#"{errors}<form method="post" action="{action}">
<label for="id_name">Name</label>
{name_errors}<input id="id_name" name="name" type="text" maxlength="64" value="{name}">
<button class="admin-btn" type="submit">Create</button>
<a href="{cancel}">Cancel</a>
</form>
"#,
        errors = error_list(&non_field_errors(&view.errors, &["name"])),
        action = html_escape(&view.submit_url),
        name_errors = error_list(view.errors.field("name")),
        name = html_escape(&view.name),
        cancel = html_escape(&view.cancel_url),
    );

    layout(&view.title, &view.breadcrumbs, &body)
}

pub fn render_condition_form(view: &ConditionFormView) -> String {
    let mut options = String::new();
    for kind in &view.kinds {
        let selected = if *kind == view.form.condition { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{k}"{selected}>{k}</option>"#,
            k = html_escape(kind),
            selected = selected,
        );
    }

    let body = format!(
        r#"{errors}<form method="post" action="{action}">
<label for="id_condition">Condition</label>
{condition_errors}<select id="id_condition" name="condition">{options}</select>
<label for="id_value">Value</label>
{value_errors}<input id="id_value" name="value" type="text" maxlength="127" value="{value}">
<label><input name="required" type="checkbox"{checked}> Required</label>
<button class="admin-btn" type="submit">Save</button>
<a href="{cancel}">Cancel</a>
</form>
"#,
        errors = error_list(&non_field_errors(&view.errors, &["condition", "value"])),
        action = html_escape(&view.submit_url),
        condition_errors = error_list(view.errors.field("condition")),
        options = options,
        value_errors = error_list(view.errors.field("value")),
        value = html_escape(&view.form.value),
        checked = if view.form.required { " checked" } else { "" },
        cancel = html_escape(&view.cancel_url),
    );

    layout(&view.title, &view.breadcrumbs, &body)
}

pub fn render_delete(view: &DeleteView) -> String {
    let body = format!(
        r#"<p>Delete this condition from {flag}?</p>
<p>{condition}</p>
<form method="post" action="{action}">
<button class="admin-btn admin-btn-danger" type="submit">Delete</button>
<a href="{cancel}">Cancel</a>
</form>
"#,
        flag = html_escape(&view.flag),
        condition = describe(&view.condition),
        action = html_escape(&view.submit_url),
        cancel = html_escape(&view.cancel_url),
    );

    layout(&view.title, &view.breadcrumbs, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use flagpole_features::{Condition, Flag, Origin};

    fn row(condition: Condition) -> ConditionRow {
        ConditionRow::new(&AdminConfig::default(), "F", &condition)
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&row(Condition::boolean(true))), "<b>enabled</b> for all requests");
        assert_eq!(describe(&row(Condition::boolean(false))), "<b>disabled</b> for all requests");
        assert_eq!(
            describe(&row(Condition::new("path matches", "/disabled"))),
            "<b>enabled</b> when path matches is <code>/disabled</code>"
        );
        assert!(describe(&row(Condition::new("user", "liberty").required())).ends_with("(required)</i>"));
    }

    #[test]
    fn test_describe_escapes_values() {
        let html = describe(&row(Condition::new("parameter", "<script>")));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_index_has_anchors() {
        let config = AdminConfig::default();
        let view = IndexView::new(&config, &[Flag::new("FLAG_ENABLED").with_condition(Condition::boolean(true))]);
        let html = render_index(&view);

        assert!(html.contains(r#"<h2 id="FLAG_ENABLED">"#));
        assert!(html.contains("<b>enabled</b> for all requests"));
    }

    #[test]
    fn test_render_flag_only_stored_rows_have_actions() {
        let config = AdminConfig::default();
        let flag = Flag::new("F")
            .with_condition(Condition::boolean(true))
            .with_condition(Condition::new("user", "liberty").with_origin(Origin::Stored { id: 2 }));
        let html = render_flag(&FlagView::new(&config, &flag, true));

        assert!(html.contains("Disable F"));
        assert_eq!(html.matches(">Edit</a>").count(), 1);
        assert!(html.contains(r#"href="/admin/flags/F/2/delete/""#));
    }

    #[test]
    fn test_render_form_errors() {
        let config = AdminConfig::default();
        let mut errors = FormErrors::new();
        errors.add("name", "Flag named X already exists");
        let html = render_create_flag(&CreateFlagView::new(&config).with_errors("X", errors));

        assert!(html.contains("Flag named X already exists"));
        assert!(html.contains(r#"value="X""#));
    }
}
