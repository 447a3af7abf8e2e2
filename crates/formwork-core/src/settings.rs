//! Settings for formwork.
//!
//! [`Settings`] holds process-wide configuration with sensible defaults.
//! A single instance can be installed with [`configure`] and read back with
//! [`settings`]; code that never configures anything sees the defaults.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Environment variable holding the path of the settings file.
pub const SETTINGS_ENVIRONMENT_VARIABLE: &str = "FORMWORK_SETTINGS";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// The complete set of formwork settings.
///
/// # Examples
///
/// ```
/// use formwork_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The log filter directive (e.g. "info", "formwork_forms=debug").
    pub log_level: String,
    /// Subscriber output format used outside debug mode.
    pub log_format: LogFormat,
    /// Extra formats accepted by every date field.
    pub date_input_formats: Vec<String>,
    /// Extra formats accepted by every date-time field.
    pub datetime_input_formats: Vec<String>,
    /// Extra formats accepted by every time field.
    pub time_input_formats: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            date_input_formats: Vec::new(),
            datetime_input_formats: Vec::new(),
            time_input_formats: Vec::new(),
        }
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Installs the process-wide settings.
///
/// Returns `false` if settings were already installed (the first call wins).
pub fn configure(settings: Settings) -> bool {
    SETTINGS.set(settings).is_ok()
}

/// Returns the process-wide settings, falling back to the defaults.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(Settings::default)
}
