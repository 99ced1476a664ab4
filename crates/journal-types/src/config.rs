use serde::{Deserialize, Serialize};
use crate::locale::Locale;

/// Top-level configuration shared by the widget and the proxy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub widget: WidgetConfig,
    pub export: ExportConfig,
    pub storage: StorageConfig,
}

/// Server-side settings for the remote assistant platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub assistant_id: String,
    pub api_key: String,
    pub api_base: String,
    /// Delay between two run status checks
    pub poll_interval_ms: u64,
    /// Upper bound on run status checks per request
    pub max_poll_attempts: u32,
    /// Upper bound on cumulative waiting per request
    pub max_duration_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            assistant_id: String::new(),
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            poll_interval_ms: 5_000,
            max_poll_attempts: 10,
            max_duration_ms: 50_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Path of the assistant proxy endpoint
    pub endpoint: String,
    pub locale: Locale,
    /// Language passed to the OCR engine
    pub ocr_language: String,
    pub ocr_timeout_ms: u32,
    /// Where the terms-of-use link next to the consent checkbox points
    pub terms_url: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/newAI".to_string(),
            locale: Locale::Sv,
            ocr_language: "eng".to_string(),
            ocr_timeout_ms: 60_000,
            terms_url: "/villkor".to_string(),
        }
    }
}

/// Page geometry and typography for the exported document.
/// Lengths are millimetres, font sizes are points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub title_size_pt: f32,
    pub text_size_pt: f32,
    pub line_spacing: f32,
    pub list_indent_mm: f32,
    pub watermark: WatermarkConfig,
    pub page_numbers: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "Journalkollen_AI_Svar.pdf".to_string(),
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 20.0,
            title_size_pt: 16.0,
            text_size_pt: 12.0,
            line_spacing: 1.5,
            list_indent_mm: 5.0,
            watermark: WatermarkConfig::default(),
            page_numbers: true,
        }
    }
}

/// Watermark box, anchored to the bottom-right corner of every page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub width_mm: f32,
    pub height_mm: f32,
    pub right_offset_mm: f32,
    pub bottom_offset_mm: f32,
    /// Text drawn when no image is supplied
    pub label: String,
    /// Path the app fetches the watermark PNG from
    pub image_url: Option<String>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            width_mm: 70.0,
            height_mm: 30.0,
            right_offset_mm: 20.0,
            bottom_offset_mm: 20.0,
            label: "Journalkollen".to_string(),
            image_url: Some("LogoGray.png".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// sessionStorage when available, memory otherwise
    Auto,
    Memory,
    /// Lives as long as the browser tab
    SessionStorage,
    /// Survives reloads; opt-in only
    LocalStorage,
}
