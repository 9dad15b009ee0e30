//! View structures for admin pages

use crate::{
    config::AdminConfig,
    forms::{ConditionForm, FormErrors},
    ui::Breadcrumb,
};
use flagpole_features::{Condition, Flag, FlagState};
use serde::{Deserialize, Serialize};

/// One condition as listed on a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionRow {
    /// Condition kind
    pub condition: String,
    /// Raw value
    pub value: String,
    /// Must hold for the flag to be on
    pub required: bool,
    /// Row id, `None` for conditions from settings
    pub id: Option<i64>,
    /// Edit URL (stored rows only)
    pub edit_url: Option<String>,
    /// Delete URL (stored rows only)
    pub delete_url: Option<String>,
}

impl ConditionRow {
    pub fn new(config: &AdminConfig, flag: &str, condition: &Condition) -> Self {
        let id = condition.stored_id();
        Self {
            condition: condition.condition.clone(),
            value: condition.value.clone(),
            required: condition.required,
            id,
            edit_url: id.map(|id| config.condition_url(flag, id)),
            delete_url: id.map(|id| config.delete_condition_url(flag, id)),
        }
    }

    pub fn from_state(config: &AdminConfig, row: &FlagState) -> Self {
        Self::new(config, &row.name, &row.to_condition())
    }

    pub fn is_boolean(&self) -> bool {
        self.condition == flagpole_features::condition::BOOLEAN
    }
}

/// A flag on the index page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagSummary {
    pub name: String,
    pub url: String,
    pub conditions: Vec<ConditionRow>,
}

/// Every flag with its conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexView {
    /// Page title
    pub title: String,
    /// Breadcrumbs
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Flags sorted by name
    pub flags: Vec<FlagSummary>,
    /// New flag URL
    pub create_url: String,
}

impl IndexView {
    pub fn new(config: &AdminConfig, flags: &[Flag]) -> Self {
        let flags = flags
            .iter()
            .map(|flag| FlagSummary {
                name: flag.name.clone(),
                url: config.flag_url(&flag.name),
                conditions: flag
                    .conditions
                    .iter()
                    .map(|c| ConditionRow::new(config, &flag.name, c))
                    .collect(),
            })
            .collect();

        Self {
            title: config.title.clone(),
            breadcrumbs: vec![Breadcrumb::new(&config.title)],
            flags,
            create_url: config.create_flag_url(),
        }
    }
}

/// A single flag's page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagView {
    /// Page title
    pub title: String,
    /// Breadcrumbs
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Flag name
    pub name: String,
    /// State from boolean conditions alone
    pub enabled: bool,
    /// "Enable NAME" or "Disable NAME"
    pub toggle_label: String,
    /// Link that flips the boolean state
    pub toggle_url: String,
    /// Conditions from settings (read only)
    pub static_conditions: Vec<ConditionRow>,
    /// Stored conditions (editable)
    pub stored_conditions: Vec<ConditionRow>,
    /// New condition URL
    pub create_condition_url: String,
    /// Back to the index
    pub index_url: String,
}

impl FlagView {
    pub fn new(config: &AdminConfig, flag: &Flag, enabled: bool) -> Self {
        let url = config.flag_url(&flag.name);
        let (toggle_label, toggle_url) = if enabled {
            (format!("Disable {}", flag.name), format!("{}?disable", url))
        } else {
            (format!("Enable {}", flag.name), format!("{}?enable", url))
        };

        Self {
            title: flag.name.clone(),
            breadcrumbs: vec![
                Breadcrumb::new(&config.title).url(config.index_url()),
                Breadcrumb::new(&flag.name),
            ],
            name: flag.name.clone(),
            enabled,
            toggle_label,
            toggle_url,
            static_conditions: flag
                .static_conditions()
                .map(|c| ConditionRow::new(config, &flag.name, c))
                .collect(),
            stored_conditions: flag
                .stored_conditions()
                .map(|c| ConditionRow::new(config, &flag.name, c))
                .collect(),
            create_condition_url: config.create_condition_url(&flag.name),
            index_url: config.index_url(),
        }
    }
}

/// New flag form page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlagView {
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Submitted name, echoed back on error
    pub name: String,
    pub errors: FormErrors,
    pub submit_url: String,
    pub cancel_url: String,
}

impl CreateFlagView {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            title: "Create flag".to_string(),
            breadcrumbs: vec![
                Breadcrumb::new(&config.title).url(config.index_url()),
                Breadcrumb::new("Create"),
            ],
            name: String::new(),
            errors: FormErrors::new(),
            submit_url: config.create_flag_url(),
            cancel_url: config.index_url(),
        }
    }

    pub fn with_errors(mut self, name: impl Into<String>, errors: FormErrors) -> Self {
        self.name = name.into();
        self.errors = errors;
        self
    }
}

/// Condition create/edit form page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionFormView {
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Owning flag
    pub flag: String,
    /// Row being edited, `None` when creating
    pub id: Option<i64>,
    /// Current field values
    pub form: ConditionForm,
    /// Selectable condition kinds
    pub kinds: Vec<String>,
    pub errors: FormErrors,
    pub submit_url: String,
    pub cancel_url: String,
}

impl ConditionFormView {
    /// Empty form for a new condition.
    pub fn create(config: &AdminConfig, flag: &str, kinds: Vec<String>) -> Self {
        Self {
            title: format!("Add condition to {}", flag),
            breadcrumbs: Self::crumbs(config, flag, "Add condition"),
            flag: flag.to_string(),
            id: None,
            form: ConditionForm::default(),
            kinds,
            errors: FormErrors::new(),
            submit_url: config.create_condition_url(flag),
            cancel_url: config.flag_url(flag),
        }
    }

    /// Form prefilled from a stored row.
    pub fn edit(config: &AdminConfig, row: &FlagState, kinds: Vec<String>) -> Self {
        Self {
            title: format!("Edit condition on {}", row.name),
            breadcrumbs: Self::crumbs(config, &row.name, "Edit condition"),
            flag: row.name.clone(),
            id: Some(row.id),
            form: ConditionForm::new(&row.condition, &row.value).required(row.required),
            kinds,
            errors: FormErrors::new(),
            submit_url: config.condition_url(&row.name, row.id),
            cancel_url: config.flag_url(&row.name),
        }
    }

    pub fn with_errors(mut self, form: ConditionForm, errors: FormErrors) -> Self {
        self.form = form;
        self.errors = errors;
        self
    }

    fn crumbs(config: &AdminConfig, flag: &str, label: &str) -> Vec<Breadcrumb> {
        vec![
            Breadcrumb::new(&config.title).url(config.index_url()),
            Breadcrumb::new(flag).url(config.flag_url(flag)),
            Breadcrumb::new(label),
        ]
    }
}

/// Delete confirmation page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteView {
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub flag: String,
    pub condition: ConditionRow,
    pub submit_url: String,
    pub cancel_url: String,
}

impl DeleteView {
    pub fn new(config: &AdminConfig, row: &FlagState) -> Self {
        Self {
            title: format!("Delete condition on {}", row.name),
            breadcrumbs: vec![
                Breadcrumb::new(&config.title).url(config.index_url()),
                Breadcrumb::new(&row.name).url(config.flag_url(&row.name)),
                Breadcrumb::new("Delete condition"),
            ],
            flag: row.name.clone(),
            condition: ConditionRow::from_state(config, row),
            submit_url: config.delete_condition_url(&row.name, row.id),
            cancel_url: config.flag_url(&row.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagpole_features::Origin;

    fn row(id: i64, name: &str, condition: &str, value: &str) -> FlagState {
        FlagState {
            id,
            name: name.to_string(),
            condition: condition.to_string(),
            value: value.to_string(),
            required: false,
        }
    }

    #[test]
    fn test_static_rows_have_no_links() {
        let config = AdminConfig::default();
        let static_row = ConditionRow::new(&config, "F", &Condition::boolean(true));
        assert!(static_row.id.is_none());
        assert!(static_row.edit_url.is_none());

        let stored = ConditionRow::new(
            &config,
            "F",
            &Condition::new("user", "liberty").with_origin(Origin::Stored { id: 4 }),
        );
        assert_eq!(stored.edit_url.as_deref(), Some("/admin/flags/F/4/"));
        assert_eq!(stored.delete_url.as_deref(), Some("/admin/flags/F/4/delete/"));
    }

    #[test]
    fn test_flag_view_toggle() {
        let config = AdminConfig::default();
        let flag = Flag::new("FLAG_ENABLED").with_condition(Condition::boolean(true));

        let on = FlagView::new(&config, &flag, true);
        assert_eq!(on.toggle_label, "Disable FLAG_ENABLED");
        assert_eq!(on.toggle_url, "/admin/flags/FLAG_ENABLED/?disable");

        let off = FlagView::new(&config, &flag, false);
        assert_eq!(off.toggle_label, "Enable FLAG_ENABLED");
        assert_eq!(off.static_conditions.len(), 1);
        assert!(off.stored_conditions.is_empty());
    }

    #[test]
    fn test_index_view_lists_flags() {
        let config = AdminConfig::default();
        let flags = vec![
            Flag::new("A").with_condition(Condition::boolean(false)),
            Flag::new("B"),
        ];
        let view = IndexView::new(&config, &flags);

        assert_eq!(view.flags.len(), 2);
        assert_eq!(view.flags[0].url, "/admin/flags/A/");
        assert_eq!(view.create_url, "/admin/flags/create/");
    }

    #[test]
    fn test_condition_form_views() {
        let config = AdminConfig::default();
        let create = ConditionFormView::create(&config, "F", vec!["user".to_string()]);
        assert_eq!(create.submit_url, "/admin/flags/F/create/");
        assert!(create.id.is_none());

        let edit = ConditionFormView::edit(&config, &row(2, "F", "user", "liberty"), vec![]);
        assert_eq!(edit.id, Some(2));
        assert_eq!(edit.form.value, "liberty");
        assert_eq!(edit.submit_url, "/admin/flags/F/2/");
    }

    #[test]
    fn test_delete_view_serializes() {
        let config = AdminConfig::default();
        let view = DeleteView::new(&config, &row(7, "F", "user", "liberty"));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["submit_url"], "/admin/flags/F/7/delete/");
        assert_eq!(json["condition"]["value"], "liberty");
    }
}
