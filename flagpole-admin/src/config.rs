//! Admin configuration and URL layout

use flagpole_config::AdminSettings;
use serde::{Deserialize, Serialize};

/// Flag admin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Page title prefix
    pub title: String,
    /// Mount point, without trailing slash (e.g. "/admin/flags")
    pub base_path: String,
    /// Flag that turns on big-list redirects
    pub big_list_flag: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self::from_settings(&AdminSettings::default())
    }
}

impl AdminConfig {
    pub fn from_settings(settings: &AdminSettings) -> Self {
        Self {
            title: "Flags".to_string(),
            base_path: settings.base_path().to_string(),
            big_list_flag: settings.big_list_flag.clone(),
        }
    }

    pub fn index_url(&self) -> String {
        format!("{}/", self.base_path)
    }

    pub fn create_flag_url(&self) -> String {
        format!("{}/create/", self.base_path)
    }

    pub fn flag_url(&self, name: &str) -> String {
        format!("{}/{}/", self.base_path, urlencoding::encode(name))
    }

    /// Index page scrolled to the flag
    pub fn anchor_url(&self, name: &str) -> String {
        format!("{}/#{}", self.base_path, urlencoding::encode(name))
    }

    pub fn create_condition_url(&self, name: &str) -> String {
        format!("{}create/", self.flag_url(name))
    }

    pub fn condition_url(&self, name: &str, id: i64) -> String {
        format!("{}{}/", self.flag_url(name), id)
    }

    pub fn delete_condition_url(&self, name: &str, id: i64) -> String {
        format!("{}delete/", self.condition_url(name, id))
    }
}
