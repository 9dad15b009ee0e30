//! Admin pages for Flagpole feature flags
//!
//! Lists every flag with its conditions, creates flags, switches them on and
//! off, and edits their stored conditions. Conditions from settings are
//! shown but never editable.
//!
//! ## Overview
//!
//! ```text
//! GET       {base}/                       index
//! GET/POST  {base}/create/                new flag
//! GET       {base}/NAME/[?enable|?disable] flag page / toggle
//! GET/POST  {base}/NAME/create/           new condition
//! GET/POST  {base}/NAME/ID/               edit condition
//! GET/POST  {base}/NAME/ID/delete/        delete condition
//! ```
//!
//! After a change the admin redirects to the flag page, or to the flag's
//! anchor on the index when the big-list flag is on for the request.
//!
//! ## Quick Start
//!
//! ```
//! use flagpole_admin::{AdminRequest, FlagAdmin};
//! use flagpole_config::{ConditionEntry, FlagSettings};
//! use flagpole_features::MemoryFlagStore;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let settings = FlagSettings::new()
//!     .with_condition("FLAG_ENABLED", ConditionEntry::new("boolean", "True"));
//! let admin = FlagAdmin::new(settings, Arc::new(MemoryFlagStore::new()));
//!
//! let response = admin.handle(&AdminRequest::get("/admin/flags/")).await;
//! assert_eq!(response.status, 200);
//! assert!(response.body.contains("FLAG_ENABLED"));
//!
//! let response = admin
//!     .handle(&AdminRequest::post("/admin/flags/create/").with_form(&[("name", "NEW_FLAG")]))
//!     .await;
//! assert_eq!(response.location(), Some("/admin/flags/NEW_FLAG/"));
//! # });
//! ```

pub mod config;
pub mod error;
pub mod forms;
pub mod routes;
pub mod ui;
pub mod views;

pub use config::AdminConfig;
pub use error::{AdminError, AdminResult};
pub use forms::{ConditionForm, FormErrors, NewFlagForm};
pub use routes::{AdminRequest, AdminResponse, Method, Route};
pub use ui::Breadcrumb;
pub use views::*;

use flagpole_config::{ConfigService, FlagSettings};
use flagpole_features::{
    EvaluationContext, FlagError, FlagEvaluator, FlagState, FlagStateStore, NewFlagState,
    set_boolean,
};
use flagpole_log::{error, info};
use std::sync::Arc;

/// The flag admin service
#[derive(Clone)]
pub struct FlagAdmin {
    evaluator: FlagEvaluator,
    store: Arc<dyn FlagStateStore>,
    config: AdminConfig,
}

impl FlagAdmin {
    /// Settings plus a store, mounted at the default base path.
    pub fn new(settings: FlagSettings, store: Arc<dyn FlagStateStore>) -> Self {
        Self {
            evaluator: FlagEvaluator::new(settings, store.clone()),
            store,
            config: AdminConfig::default(),
        }
    }

    /// The evaluator must read from `store` for edits to show up.
    pub fn from_parts(
        evaluator: FlagEvaluator,
        store: Arc<dyn FlagStateStore>,
        config: AdminConfig,
    ) -> Self {
        Self {
            evaluator,
            store,
            config,
        }
    }

    /// Flags and admin settings from loaded configuration.
    pub fn from_service(
        service: &ConfigService,
        store: Arc<dyn FlagStateStore>,
    ) -> flagpole_config::Result<Self> {
        let config = AdminConfig::from_settings(&service.admin()?);
        Ok(Self::new(service.flags()?, store).with_config(config))
    }

    pub fn with_config(mut self, config: AdminConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &FlagEvaluator {
        &self.evaluator
    }

    pub fn store(&self) -> &Arc<dyn FlagStateStore> {
        &self.store
    }

    pub async fn index(&self) -> IndexView {
        IndexView::new(&self.config, &self.evaluator.flags().await)
    }

    pub async fn flag_view(&self, name: &str) -> AdminResult<FlagView> {
        let flag = self
            .evaluator
            .flag(name)
            .await
            .ok_or_else(|| AdminError::FlagNotFound(name.to_string()))?;
        let enabled = flag.boolean_state(self.evaluator.registry());
        Ok(FlagView::new(&self.config, &flag, enabled))
    }

    /// Create a flag with a single boolean row set to off.
    pub async fn create_flag(&self, form: &NewFlagForm) -> AdminResult<FlagState> {
        form.check().map_err(AdminError::Form)?;

        if self.evaluator.exists(&form.name).await {
            let mut errors = FormErrors::new();
            errors.add("name", format!("Flag named {} already exists", form.name));
            return Err(AdminError::Form(errors));
        }

        let row = self.store.create(NewFlagState::initial(&form.name)).await?;
        info!("flag created"; flag = row.name, id = row.id);
        Ok(row)
    }

    /// Turn a flag on or off through its stored boolean row.
    pub async fn set_flag(&self, name: &str, enabled: bool) -> AdminResult<FlagState> {
        self.require_flag(name).await?;
        let row = set_boolean(self.store.as_ref(), name, enabled).await?;
        info!("flag switched"; flag = name, enabled = enabled, id = row.id);
        Ok(row)
    }

    pub async fn create_condition(&self, name: &str, form: ConditionForm) -> AdminResult<FlagState> {
        self.require_flag(name).await?;
        form.check(self.evaluator.registry()).map_err(AdminError::Form)?;

        let row = self.store.create(form.into_row(name)).await?;
        info!("condition created"; flag = name, id = row.id, condition = row.condition);
        Ok(row)
    }

    /// A stored condition row that belongs to `name`.
    pub async fn condition(&self, name: &str, id: i64) -> AdminResult<FlagState> {
        let not_found = || AdminError::ConditionNotFound {
            flag: name.to_string(),
            id,
        };
        match self.store.get(id).await {
            Ok(row) if row.name == name => Ok(row),
            Ok(_) | Err(FlagError::NotFound(_)) => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_condition(
        &self,
        name: &str,
        id: i64,
        form: ConditionForm,
    ) -> AdminResult<FlagState> {
        self.condition(name, id).await?;
        form.check(self.evaluator.registry()).map_err(AdminError::Form)?;

        let row = self.store.update(id, form.into_row(name)).await?;
        info!("condition updated"; flag = name, id = id, condition = row.condition);
        Ok(row)
    }

    pub async fn delete_condition(&self, name: &str, id: i64) -> AdminResult<FlagState> {
        self.condition(name, id).await?;
        let row = self.store.delete(id).await?;
        info!("condition deleted"; flag = name, id = id);
        Ok(row)
    }

    /// Where to send the browser after changing `name`.
    pub async fn redirect_target(&self, name: &str, ctx: &EvaluationContext) -> String {
        if self.evaluator.is_enabled(&self.config.big_list_flag, ctx).await {
            self.config.anchor_url(name)
        } else {
            self.config.flag_url(name)
        }
    }

    fn condition_kinds(&self) -> Vec<String> {
        self.evaluator.registry().kinds().map(str::to_string).collect()
    }

    async fn require_flag(&self, name: &str) -> AdminResult<()> {
        if self.evaluator.exists(name).await {
            Ok(())
        } else {
            Err(AdminError::FlagNotFound(name.to_string()))
        }
    }

    /// Serve one admin request.
    pub async fn handle(&self, req: &AdminRequest) -> AdminResponse {
        let Some(route) = Route::resolve(&self.config.base_path, &req.path) else {
            return AdminResponse::not_found();
        };

        match self.dispatch(route, req).await {
            Ok(response) if req.method == Method::Head => AdminResponse {
                body: String::new(),
                ..response
            },
            Ok(response) => response,
            Err(e) if e.status() == 404 => AdminResponse::not_found(),
            Err(e) => {
                error!("admin request failed"; path = req.path, error = e);
                AdminResponse::server_error()
            }
        }
    }

    async fn dispatch(&self, route: Route, req: &AdminRequest) -> AdminResult<AdminResponse> {
        let ctx = req.evaluation_context();

        match (route, req.method) {
            (Route::Index, Method::Get | Method::Head) => {
                Ok(AdminResponse::html(ui::render_index(&self.index().await)))
            }

            (Route::CreateFlag, Method::Get | Method::Head) => {
                Ok(AdminResponse::html(ui::render_create_flag(&CreateFlagView::new(&self.config))))
            }
            (Route::CreateFlag, Method::Post) => {
                let form = NewFlagForm::from_pairs(&req.form_pairs());
                match self.create_flag(&form).await {
                    Ok(row) => Ok(AdminResponse::redirect(self.redirect_target(&row.name, &ctx).await)),
                    Err(AdminError::Form(errors)) => {
                        let view = CreateFlagView::new(&self.config).with_errors(&form.name, errors);
                        Ok(AdminResponse::html(ui::render_create_flag(&view)))
                    }
                    Err(e) => Err(e),
                }
            }

            (Route::Flag(name), method @ (Method::Get | Method::Head)) => {
                let toggle = if method == Method::Head {
                    None
                } else if req.has_query_key("enable") {
                    Some(true)
                } else if req.has_query_key("disable") {
                    Some(false)
                } else {
                    None
                };

                match toggle {
                    Some(enabled) => {
                        self.set_flag(&name, enabled).await?;
                        Ok(AdminResponse::redirect(self.redirect_target(&name, &ctx).await))
                    }
                    None => Ok(AdminResponse::html(ui::render_flag(&self.flag_view(&name).await?))),
                }
            }

            (Route::CreateCondition(name), Method::Get | Method::Head) => {
                self.require_flag(&name).await?;
                let view = ConditionFormView::create(&self.config, &name, self.condition_kinds());
                Ok(AdminResponse::html(ui::render_condition_form(&view)))
            }
            (Route::CreateCondition(name), Method::Post) => {
                let form = ConditionForm::from_pairs(&req.form_pairs());
                match self.create_condition(&name, form.clone()).await {
                    Ok(_) => Ok(AdminResponse::redirect(self.redirect_target(&name, &ctx).await)),
                    Err(AdminError::Form(errors)) => {
                        let view = ConditionFormView::create(&self.config, &name, self.condition_kinds())
                            .with_errors(form, errors);
                        Ok(AdminResponse::html(ui::render_condition_form(&view)))
                    }
                    Err(e) => Err(e),
                }
            }

            (Route::Condition(name, id), Method::Get | Method::Head) => {
                let row = self.condition(&name, id).await?;
                let view = ConditionFormView::edit(&self.config, &row, self.condition_kinds());
                Ok(AdminResponse::html(ui::render_condition_form(&view)))
            }
            (Route::Condition(name, id), Method::Post) => {
                let row = self.condition(&name, id).await?;
                let form = ConditionForm::from_pairs(&req.form_pairs());
                match self.update_condition(&name, id, form.clone()).await {
                    Ok(_) => Ok(AdminResponse::redirect(self.redirect_target(&name, &ctx).await)),
                    Err(AdminError::Form(errors)) => {
                        let view = ConditionFormView::edit(&self.config, &row, self.condition_kinds())
                            .with_errors(form, errors);
                        Ok(AdminResponse::html(ui::render_condition_form(&view)))
                    }
                    Err(e) => Err(e),
                }
            }

            (Route::DeleteCondition(name, id), Method::Get | Method::Head) => {
                let row = self.condition(&name, id).await?;
                Ok(AdminResponse::html(ui::render_delete(&DeleteView::new(&self.config, &row))))
            }
            (Route::DeleteCondition(name, id), Method::Post) => {
                self.delete_condition(&name, id).await?;
                Ok(AdminResponse::redirect(self.redirect_target(&name, &ctx).await))
            }

            _ => Ok(AdminResponse::method_not_allowed()),
        }
    }
}
