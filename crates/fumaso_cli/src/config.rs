//! Timeline document handling
//!
//! A timeline document is a TOML file with a `[timeline]` table of playback
//! options and one `[[path]]` table per animated property.

use anyhow::{Context, Result};
use fumaso_animation::{Keyframe, TimelineOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level timeline document
#[derive(Debug, Deserialize, Serialize)]
pub struct TimelineDocument {
    #[serde(default)]
    pub timeline: TimelineOptions,
    #[serde(default, rename = "path")]
    pub paths: Vec<PathDocument>,
}

/// One animated property
#[derive(Debug, Deserialize, Serialize)]
pub struct PathDocument {
    pub name: String,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl TimelineDocument {
    /// Load a document from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("No timeline document found at {}", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse a document from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let document: TimelineDocument = toml::from_str(content)?;
        Ok(document)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize timeline document")
    }
}
