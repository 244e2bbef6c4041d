#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::{Arc, OnceLock};

use postgrest::Postgrest;
use state::InitCell;

/// Supabase credentials loaded from the environment, if available.
#[derive(Clone)]
struct SupabaseEnv {
    /// Fully qualified PostgREST endpoint.
    rest_endpoint: String,
    /// API key used for PostgREST requests.
    api_key:       String,
}

impl SupabaseEnv {
    /// Builds a Supabase credential bundle from environment-provided values.
    fn new(url: String, key: String) -> Self {
        let rest_endpoint = format!("{}/rest/v1", url.trim_end_matches('/'));
        Self {
            rest_endpoint,
            api_key: key,
        }
    }
}

/// Runtime configuration shared across the crate.
pub struct ConfigState {
    /// Supabase credentials, if configured.
    supabase:         Option<SupabaseEnv>,
    /// Lazily constructed Supabase PostgREST client.
    postgrest:        InitCell<Postgrest>,
    /// Backing table holding subsection-level grade rows.
    subsection_table: String,
    /// Backing table holding course-level grade rows.
    course_table:     String,
}

impl ConfigState {
    /// Construct a new configuration instance by reading the environment.
    fn new() -> Self {
        let supabase =
            match (std::env::var("SUPABASE_URL").ok(), std::env::var("SUPABASE_ANON_KEY").ok()) {
                (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                    Some(SupabaseEnv::new(url, key))
                }
                _ => None,
            };

        let subsection_table = std::env::var("GRADECTL_SUBSECTION_TABLE")
            .unwrap_or_else(|_| "subsection_grades".to_string());
        let course_table = std::env::var("GRADECTL_COURSE_TABLE")
            .unwrap_or_else(|_| "course_grades".to_string());

        Self {
            supabase,
            postgrest: InitCell::new(),
            subsection_table,
            course_table,
        }
    }

    /// Returns the configured PostgREST client if credentials are available.
    pub fn postgrest(&self) -> Option<Postgrest> {
        if let Some(client) = self.postgrest.try_get() {
            return Some(client.clone());
        }

        let creds = self.supabase.as_ref()?;
        let client = Postgrest::new(creds.rest_endpoint.clone())
            .insert_header("apiKey", creds.api_key.clone());
        self.postgrest.set(client);
        Some(self.postgrest.get().clone())
    }

    /// Returns the backing table name for subsection-level grades.
    pub fn subsection_table(&self) -> &str {
        &self.subsection_table
    }

    /// Returns the backing table name for course-level grades.
    pub fn course_table(&self) -> &str {
        &self.course_table
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Arc<ConfigState>> = OnceLock::new();

/// Returns the active configuration, initializing it on demand.
pub fn get() -> ConfigHandle {
    ConfigHandle(Arc::clone(
        CONFIG_SLOT.get_or_init(|| Arc::new(ConfigState::new())),
    ))
}

/// Returns the configured PostgREST client, if Supabase has been configured.
pub fn postgrest_client() -> Option<Postgrest> {
    get().postgrest()
}

/// Returns the backing table name for subsection-level grades.
pub fn subsection_table() -> String {
    get().subsection_table().to_string()
}

/// Returns the backing table name for course-level grades.
pub fn course_table() -> String {
    get().course_table().to_string()
}
