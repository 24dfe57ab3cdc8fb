// Application settings
// Loaded from ~/.config/budgetgrid/settings.json

use budgetgrid_engine::filter::DEFAULT_PAGE_SIZE;
use budgetgrid_engine::report::{ExportOptions, Orientation, PageFormat};
use budgetgrid_engine::session::SheetRoles;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid
    #[serde(rename = "grid.pageSize")]
    pub page_size: usize,

    // Sheet roles
    #[serde(rename = "sheets.master")]
    pub master_sheet: String,

    #[serde(rename = "sheets.materials")]
    pub materials_sheet: String,

    #[serde(rename = "sheets.labor")]
    pub labor_sheet: String,

    // Source
    #[serde(rename = "source.location")]
    pub source_location: String,

    // Export
    #[serde(rename = "export.fileName")]
    pub export_file_name: String,

    #[serde(rename = "export.directory")]
    pub export_directory: Option<String>, // None = current directory

    #[serde(rename = "export.margin")]
    pub export_margin: f64,

    #[serde(rename = "export.imageQuality")]
    pub export_image_quality: f64,

    #[serde(rename = "export.scale")]
    pub export_scale: f64,

    #[serde(rename = "export.pageFormat")]
    pub export_page_format: PageFormat,

    #[serde(rename = "export.orientation")]
    pub export_orientation: Orientation,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: String,

    // Theme
    #[serde(rename = "theme.path")]
    pub theme_path: Option<String>, // None = built-in light theme
}

impl Default for Settings {
    fn default() -> Self {
        let roles = SheetRoles::default();
        let export = ExportOptions::default();
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            master_sheet: roles.master,
            materials_sheet: roles.materials,
            labor_sheet: roles.labor,
            source_location: "mi_presupuesto.xlsx".to_string(),
            export_file_name: export.file_name,
            export_directory: None,
            export_margin: export.margin,
            export_image_quality: export.image_quality,
            export_scale: export.scale,
            export_page_format: export.page_format,
            export_orientation: export.orientation,
            log_level: "warn".to_string(),
            theme_path: None,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Rows per page in every grid
    "grid.pageSize": 5,

    // Sheet names for the master grid and the two detail grids
    "sheets.master": "Presupuesto_General",
    "sheets.materials": "Asignación_Materiales",
    "sheets.labor": "Asignación_ManoObra",

    // Workbook loaded at startup: a file path or an http(s) URL
    "source.location": "mi_presupuesto.xlsx",

    // Report export (margin in inches; pageFormat "a4" or "letter")
    "export.fileName": "Presupuesto_General_Proyecto.xlsx",
    "export.directory": null,
    "export.margin": 0.5,
    "export.imageQuality": 0.98,
    "export.scale": 2.0,
    "export.pageFormat": "a4",
    "export.orientation": "portrait",

    // Log level: "off", "error", "warn", "info", "debug", "trace"
    "log.level": "warn",

    // Custom theme JSON file (null = built-in light theme)
    "theme.path": null
}
"#;

impl Settings {
    /// Directory holding settings.json and the viewer log
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("budgetgrid")
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file is created with commented
    /// defaults; unreadable or invalid files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            Self::create_default_file(path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", path.display(), e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines that start with `//`
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Create default settings file with comments
    fn create_default_file(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating config directory: {}", e);
                return;
            }
        }
        if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
            eprintln!("Error writing default settings.json: {}", e);
        }
    }

    pub fn sheet_roles(&self) -> SheetRoles {
        SheetRoles {
            master: self.master_sheet.clone(),
            materials: self.materials_sheet.clone(),
            labor: self.labor_sheet.clone(),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            margin: self.export_margin,
            file_name: self.export_file_name.clone(),
            image_quality: self.export_image_quality,
            scale: self.export_scale,
            page_format: self.export_page_format,
            orientation: self.export_orientation,
        }
    }

    /// Export directory, defaulting to the current directory
    pub fn export_dir(&self) -> PathBuf {
        self.export_directory
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn theme_file(&self) -> Option<PathBuf> {
        self.theme_path.as_deref().map(PathBuf::from)
    }
}
