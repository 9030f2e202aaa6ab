use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::pdf::{CanvasOptions, PageGeometry};
use crate::template::SchemaVersion;

/// Fixed page furniture: the header drawn at the top of every page and the
/// address strip drawn at the bottom.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Letterhead {
    pub title: String,
    pub subtitle: String,
    pub footer_lines: Vec<String>,
    /// PNG or JPEG, drawn 25mm wide at the top left of every page.
    pub logo: PathBuf,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            title: "AGENT TO AGENT AGREEMENT".to_string(),
            subtitle: "As per the Real Estate Brokers By-Law No. (85) of 2006".to_string(),
            footer_lines: vec![
                "203 Al Sharafi Building | Bur Dubai, Dubai UAE | P.O Box 118163".to_string(),
                "Phone: +971 4 3519995 | Fax: +971 43515611 | www.indus-re.com".to_string(),
            ],
            logo: PathBuf::from("uploads/indus.png"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgreementConfig {
    pub schema: SchemaVersion,
    /// Directory that receives generated agreements.
    pub output_dir: PathBuf,
    /// JSON-lines record store; records are not persisted when unset.
    pub store_path: Option<PathBuf>,
    pub letterhead: Letterhead,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            schema: SchemaVersion::V1,
            output_dir: PathBuf::from("pdf_output"),
            store_path: None,
            letterhead: Letterhead::default(),
        }
    }
}

pub const LOGO_ENV: &str = "AGREEMENT_LOGO";
pub const OUTPUT_DIR_ENV: &str = "AGREEMENT_OUTPUT_DIR";

impl AgreementConfig {
    /// Read a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text).map_err(|reason| Error::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Apply `AGREEMENT_LOGO` and `AGREEMENT_OUTPUT_DIR` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(logo) = lookup(LOGO_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!("config: logo overridden by {LOGO_ENV}={logo}");
            self.letterhead.logo = PathBuf::from(logo);
        }
        if let Some(dir) = lookup(OUTPUT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!("config: output dir overridden by {OUTPUT_DIR_ENV}={dir}");
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn canvas_options(&self) -> CanvasOptions {
        CanvasOptions {
            geometry: PageGeometry::a4(),
            letterhead: Some(self.letterhead.clone()),
        }
    }
}
