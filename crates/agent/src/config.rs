//! Agent configuration.
//!
//! Mirrors the widget's option object: every field is optional in JSON
//! (camelCase keys) and falls back to the widget defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use fileagent_record::{
    AcceptPattern, DEFAULT_THUMBNAIL_SIZE, ValidationOptions, format_size, parse_size,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;

/// Sorting mode: `false`, `true` (immediate), `"hold"` or `"handle"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FlagOr", into = "FlagOr")]
pub enum Sortable {
    #[default]
    Off,
    Immediate,
    Hold,
    Handle,
}

/// Element receiving drag events: `false`, `true` (the widget root) or a
/// selector for a custom element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FlagOr", into = "FlagOr")]
pub enum Draggable {
    Off,
    #[default]
    Root,
    Element(String),
}

/// Wire form shared by the boolean-or-string options.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FlagOr {
    Flag(bool),
    Text(String),
}

impl TryFrom<FlagOr> for Sortable {
    type Error = String;

    fn try_from(value: FlagOr) -> Result<Self, Self::Error> {
        match value {
            FlagOr::Flag(false) => Ok(Sortable::Off),
            FlagOr::Flag(true) => Ok(Sortable::Immediate),
            FlagOr::Text(s) if s == "hold" => Ok(Sortable::Hold),
            FlagOr::Text(s) if s == "handle" => Ok(Sortable::Handle),
            FlagOr::Text(s) => Err(format!("unknown sortable mode: {s}")),
        }
    }
}

impl From<Sortable> for FlagOr {
    fn from(value: Sortable) -> Self {
        match value {
            Sortable::Off => FlagOr::Flag(false),
            Sortable::Immediate => FlagOr::Flag(true),
            Sortable::Hold => FlagOr::Text("hold".into()),
            Sortable::Handle => FlagOr::Text("handle".into()),
        }
    }
}

impl TryFrom<FlagOr> for Draggable {
    type Error = String;

    fn try_from(value: FlagOr) -> Result<Self, Self::Error> {
        match value {
            FlagOr::Flag(false) => Ok(Draggable::Off),
            FlagOr::Flag(true) => Ok(Draggable::Root),
            FlagOr::Text(s) if s.trim().is_empty() => Err("empty draggable selector".into()),
            FlagOr::Text(s) => Ok(Draggable::Element(s)),
        }
    }
}

impl From<Draggable> for FlagOr {
    fn from(value: Draggable) -> Self {
        match value {
            Draggable::Off => FlagOr::Flag(false),
            Draggable::Root => FlagOr::Flag(true),
            Draggable::Element(s) => FlagOr::Text(s),
        }
    }
}

/// Visual theme; selects the wrapper class and transition class prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    List,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::List => "list",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size ceiling as written in the config: a byte count or a string like `"10MB"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxSize {
    Bytes(u64),
    Text(String),
}

impl MaxSize {
    pub fn bytes(&self) -> Result<u64, AgentError> {
        match self {
            MaxSize::Bytes(n) => Ok(*n),
            MaxSize::Text(s) => {
                parse_size(s).map_err(|e| AgentError::Config(format!("maxSize: {e}")))
            }
        }
    }
}

impl fmt::Display for MaxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxSize::Bytes(n) => f.write_str(&format_size(*n)),
            MaxSize::Text(s) => f.write_str(s),
        }
    }
}

/// Full option set of a file agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub multiple: bool,
    pub max_files: Option<usize>,
    pub max_size: Option<MaxSize>,
    /// Comma separated `.ext`, `type/*` or MIME entries.
    pub accept: Option<String>,
    pub sortable: Sortable,
    pub draggable: Draggable,
    pub disabled: bool,
    pub readonly: bool,
    pub compact: bool,
    /// Show file metadata (size, dimensions) in previews.
    pub meta: bool,
    pub theme: Theme,
    pub help_text: Option<String>,
    pub thumbnail_size: u32,
    pub average_color: bool,
    pub upload_url: Option<String>,
    pub upload_headers: BTreeMap<String, String>,
    /// Unset leaves the caller's request configurator alone.
    pub upload_with_credentials: Option<bool>,
    /// Forwarded to the uploader as upload data on auto delete/update.
    pub upload_config: Option<Value>,
    /// Upload, delete and update automatically when `upload_url` is set.
    pub auto: bool,
    /// `capture` attribute of the file input (`"user"`, `"environment"`).
    pub capture: Option<String>,
    pub deletable: bool,
    pub editable: bool,
    pub linkable: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            multiple: false,
            max_files: None,
            max_size: None,
            accept: None,
            sortable: Sortable::Off,
            draggable: Draggable::Root,
            disabled: false,
            readonly: false,
            compact: false,
            meta: true,
            theme: Theme::Default,
            help_text: None,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            average_color: true,
            upload_url: None,
            upload_headers: BTreeMap::new(),
            upload_with_credentials: None,
            upload_config: None,
            auto: true,
            capture: None,
            deletable: false,
            editable: false,
            linkable: false,
        }
    }
}

impl AgentConfig {
    /// Reads a JSON config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: AgentConfig = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded agent config");
        Ok(config)
    }

    /// Rejects values that only fail once used (size strings, thumbnail size).
    pub fn validate(&self) -> Result<(), AgentError> {
        if let Some(max_size) = &self.max_size {
            max_size.bytes()?;
        }
        if self.thumbnail_size == 0 {
            return Err(AgentError::Config("thumbnailSize must be positive".into()));
        }
        Ok(())
    }

    pub fn has_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable != Sortable::Off
    }

    /// Neither disabled nor readonly.
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.readonly
    }

    pub fn help_text(&self) -> String {
        if let Some(text) = self.help_text.as_deref()
            && !text.is_empty()
        {
            return text.to_string();
        }
        let noun = if self.has_multiple() { "files" } else { "file" };
        format!("Choose {noun} or drag & drop here")
    }

    /// Effective file cap; `maxFiles: 0` means no cap.
    pub fn file_cap(&self) -> Option<usize> {
        self.max_files.filter(|max| *max > 0)
    }

    /// Whether a collection of `count` records can take another file.
    pub fn can_add_more(&self, count: usize) -> bool {
        if !self.has_multiple() {
            return count == 0;
        }
        match self.file_cap() {
            Some(max) => count < max,
            None => true,
        }
    }

    /// Drops are accepted: active, and single mode or room left.
    pub fn accepts_drop(&self, count: usize) -> bool {
        self.is_active() && !(self.has_multiple() && !self.can_add_more(count))
    }

    /// Auto lifecycle target, when enabled.
    pub fn auto_upload_url(&self) -> Option<&str> {
        if !self.auto {
            return None;
        }
        self.upload_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn validation_options(&self) -> Result<ValidationOptions, AgentError> {
        let max_size = match &self.max_size {
            Some(max_size) => Some(max_size.bytes()?),
            None => None,
        };
        Ok(ValidationOptions {
            max_size,
            accept: AcceptPattern::parse(self.accept.as_deref().unwrap_or_default()),
            thumbnail_size: self.thumbnail_size,
            read_dimensions: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_json() {
        let config: AgentConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AgentConfig::default());
        assert!(config.meta);
        assert!(config.auto);
        assert!(config.average_color);
        assert_eq!(config.thumbnail_size, 360);
        assert_eq!(config.draggable, Draggable::Root);
    }

    #[test]
    fn camel_case_options() {
        let config: AgentConfig = serde_json::from_str(
            r##"{
                "multiple": true,
                "maxFiles": 3,
                "maxSize": "10MB",
                "accept": "image/*,.pdf",
                "sortable": "hold",
                "draggable": "#drop-zone",
                "theme": "list",
                "uploadUrl": "https://up.example/files",
                "uploadHeaders": { "X-Token": "t" },
                "uploadWithCredentials": false
            }"##,
        )
        .unwrap();
        assert_eq!(config.max_files, Some(3));
        assert_eq!(config.sortable, Sortable::Hold);
        assert_eq!(config.draggable, Draggable::Element("#drop-zone".into()));
        assert_eq!(config.theme, Theme::List);
        assert_eq!(config.upload_with_credentials, Some(false));
        assert_eq!(config.upload_headers["X-Token"], "t");

        let opts = config.validation_options().unwrap();
        assert_eq!(opts.max_size, Some(10 * 1024 * 1024));
        assert!(opts.accept.accepts("a.pdf", "application/pdf"));
    }

    #[test]
    fn sortable_flags() {
        let on: AgentConfig = serde_json::from_str(r#"{"sortable": true}"#).unwrap();
        assert_eq!(on.sortable, Sortable::Immediate);
        assert!(on.is_sortable());
        let off: AgentConfig = serde_json::from_str(r#"{"sortable": false}"#).unwrap();
        assert!(!off.is_sortable());
        assert!(serde_json::from_str::<AgentConfig>(r#"{"sortable": "wiggle"}"#).is_err());
    }

    #[test]
    fn sortable_serializes_back() {
        let config = AgentConfig {
            sortable: Sortable::Handle,
            draggable: Draggable::Off,
            ..AgentConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["sortable"], "handle");
        assert_eq!(json["draggable"], false);
    }

    #[test]
    fn byte_count_max_size() {
        let config: AgentConfig = serde_json::from_str(r#"{"maxSize": 2048}"#).unwrap();
        assert_eq!(config.validation_options().unwrap().max_size, Some(2048));
        assert_eq!(config.max_size.unwrap().to_string(), "2 KB");
    }

    #[test]
    fn bad_max_size_is_config_error() {
        let config: AgentConfig = serde_json::from_str(r#"{"maxSize": "lots"}"#).unwrap();
        assert!(matches!(config.validate(), Err(AgentError::Config(_))));
    }

    #[test]
    fn capacity() {
        let single = AgentConfig::default();
        assert!(single.can_add_more(0));
        assert!(!single.can_add_more(1));
        assert!(single.accepts_drop(1));

        let capped = AgentConfig {
            multiple: true,
            max_files: Some(2),
            ..AgentConfig::default()
        };
        assert!(capped.can_add_more(1));
        assert!(!capped.can_add_more(2));
        assert!(!capped.accepts_drop(2));

        let disabled = AgentConfig {
            disabled: true,
            ..AgentConfig::default()
        };
        assert!(!disabled.accepts_drop(0));
    }

    #[test]
    fn zero_max_files_means_no_cap() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"multiple": true, "maxFiles": 0}"#).unwrap();
        config.validate().unwrap();
        assert_eq!(config.file_cap(), None);
        assert!(config.can_add_more(50));
        assert!(config.accepts_drop(50));
    }

    #[test]
    fn help_text_defaults() {
        assert_eq!(
            AgentConfig::default().help_text(),
            "Choose file or drag & drop here"
        );
        let multi = AgentConfig {
            multiple: true,
            ..AgentConfig::default()
        };
        assert_eq!(multi.help_text(), "Choose files or drag & drop here");
        let custom = AgentConfig {
            help_text: Some("Drop it".into()),
            ..AgentConfig::default()
        };
        assert_eq!(custom.help_text(), "Drop it");
    }

    #[test]
    fn auto_url_requires_auto() {
        let mut config = AgentConfig {
            upload_url: Some("https://up".into()),
            ..AgentConfig::default()
        };
        assert_eq!(config.auto_upload_url(), Some("https://up"));
        config.auto = false;
        assert_eq!(config.auto_upload_url(), None);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(&path, r#"{"multiple": true, "theme": "list"}"#).unwrap();
        let config = AgentConfig::load(&path).unwrap();
        assert!(config.multiple);
        assert_eq!(config.theme, Theme::List);

        assert!(matches!(
            AgentConfig::load(dir.path().join("missing.json")),
            Err(AgentError::Io(_))
        ));
    }
}
