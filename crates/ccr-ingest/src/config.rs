//! Loader configuration
//!
//! A [`CcrConfig`] describes one CCR release: which files to read, how lines
//! are delimited, which key the records are stored under, and which record
//! schema to emit. Several configurations can coexist in one process.

use ccr_common::{CcrError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// Release Constants
// ============================================================================

/// Autosome file of the v2 release.
pub const AUTOSOMES_FILE: &str = "ccrs.autosomes.v2.20180420.bed";

/// Line count of [`AUTOSOMES_FILE`].
pub const AUTOSOMES_LINES: u64 = 8_188_410;

/// X chromosome file of the v2 release.
pub const XCHROM_FILE: &str = "ccrs.xchrom.v2.20180420.bed";

/// Line count of [`XCHROM_FILE`].
pub const XCHROM_LINES: u64 = 171_987;

pub const DEFAULT_RELEASE: &str = "v2.20180420";
pub const DEFAULT_SOURCE_KEY: &str = "ccr";
pub const DEFAULT_DELIMITER: char = '\t';

/// Record layout emitted under the source key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// Score fields inlined next to chrom/start/end, `varflag` is a boolean
    Flat,
    /// Score fields wrapped in a one-element `scores` list, `varflag` is a
    /// list of booleans
    #[default]
    Nested,
}

impl SchemaVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVariant::Flat => "flat",
            SchemaVariant::Nested => "nested",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVariant {
    type Err = CcrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(SchemaVariant::Flat),
            "nested" => Ok(SchemaVariant::Nested),
            other => Err(CcrError::Config(format!("Unknown schema variant: {other}"))),
        }
    }
}

/// One input file and the number of lines it is expected to contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_name: String,

    /// Only used for progress percentages and time estimates
    pub expected_line_count: u64,
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>, expected_line_count: u64) -> Self {
        Self {
            file_name: file_name.into(),
            expected_line_count,
        }
    }

    pub fn autosomes() -> Self {
        Self::new(AUTOSOMES_FILE, AUTOSOMES_LINES)
    }

    pub fn xchrom() -> Self {
        Self::new(XCHROM_FILE, XCHROM_LINES)
    }
}

/// Configuration for one CCR release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcrConfig {
    /// Files processed in this order
    pub files: Vec<SourceFile>,

    pub delimiter: char,

    /// Key the record is stored under in every output document
    pub source_key: String,

    pub schema: SchemaVariant,

    /// Release label reported by the version accessor
    pub release: String,

    /// Lines between two progress events
    pub progress_interval: u64,

    /// Log every skipped raw line once a file is finished
    pub echo_skipped_lines: bool,
}

impl Default for CcrConfig {
    fn default() -> Self {
        Self {
            files: vec![SourceFile::autosomes(), SourceFile::xchrom()],
            delimiter: DEFAULT_DELIMITER,
            source_key: DEFAULT_SOURCE_KEY.to_string(),
            schema: SchemaVariant::Nested,
            release: DEFAULT_RELEASE.to_string(),
            progress_interval: 1,
            echo_skipped_lines: true,
        }
    }
}

impl CcrConfig {
    pub fn builder() -> CcrConfigBuilder {
        CcrConfigBuilder::default()
    }

    /// Flat single-file layout over the autosome file
    pub fn autosomes() -> Self {
        Self {
            files: vec![SourceFile::autosomes()],
            schema: SchemaVariant::Flat,
            ..Self::default()
        }
    }

    /// Flat single-file layout over the X chromosome file
    pub fn xchrom() -> Self {
        Self {
            files: vec![SourceFile::xchrom()],
            schema: SchemaVariant::Flat,
            ..Self::default()
        }
    }

    /// Read a release manifest in TOML; missing keys keep their defaults.
    ///
    /// ```toml
    /// schema = "nested"
    /// source_key = "ccr"
    ///
    /// [[files]]
    /// file_name = "ccrs.autosomes.v2.20180420.bed"
    /// expected_line_count = 8188410
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CcrError::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Apply `CCR_*` environment overrides on top of `self`.
    ///
    /// Recognised: `CCR_SOURCE_KEY`, `CCR_DELIMITER`, `CCR_SCHEMA`,
    /// `CCR_RELEASE`, `CCR_PROGRESS_INTERVAL`, `CCR_ECHO_SKIPPED`.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(key) = env_var("CCR_SOURCE_KEY") {
            self.source_key = key;
        }
        if let Some(delimiter) = env_var("CCR_DELIMITER") {
            self.delimiter = parse_delimiter(&delimiter)?;
        }
        if let Some(schema) = env_var("CCR_SCHEMA") {
            self.schema = schema.parse()?;
        }
        if let Some(release) = env_var("CCR_RELEASE") {
            self.release = release;
        }
        if let Some(interval) = env_var("CCR_PROGRESS_INTERVAL") {
            self.progress_interval = interval.trim().parse().map_err(|_| {
                CcrError::Config(format!("CCR_PROGRESS_INTERVAL is not a number: {interval}"))
            })?;
        }
        if let Some(echo) = env_var("CCR_ECHO_SKIPPED") {
            self.echo_skipped_lines = echo.trim().parse().map_err(|_| {
                CcrError::Config(format!("CCR_ECHO_SKIPPED is not a boolean: {echo}"))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(CcrError::Config("At least one input file must be configured".into()));
        }
        if let Some(file) = self.files.iter().find(|f| f.file_name.trim().is_empty()) {
            return Err(CcrError::Config(format!(
                "File name cannot be empty (expected_line_count = {})",
                file.expected_line_count
            )));
        }
        if self.source_key.trim().is_empty() {
            return Err(CcrError::Config("Source key cannot be empty".into()));
        }
        if self.progress_interval == 0 {
            return Err(CcrError::Config("Progress interval must be greater than 0".into()));
        }
        // Comma separates multi-value fields, newline separates records.
        if matches!(self.delimiter, ',' | '\n' | '\r') {
            return Err(CcrError::Config(format!(
                "Delimiter {:?} collides with the record format",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// Provenance string, e.g. `v2.20180420/nested`
    pub fn version(&self) -> String {
        format!("{}/{}", self.release, self.schema)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Accepts a single character or the escapes `\t` and `tab`.
pub fn parse_delimiter(value: &str) -> Result<char> {
    if matches!(value, "\\t" | "tab") {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CcrError::Config(format!(
            "Delimiter must be a single character, got {value:?}"
        ))),
    }
}

/// Builder for [`CcrConfig`]
#[derive(Debug, Default)]
pub struct CcrConfigBuilder {
    config: CcrConfig,
}

impl CcrConfigBuilder {
    pub fn files(mut self, files: Vec<SourceFile>) -> Self {
        self.config.files = files;
        self
    }

    /// Read this one file only
    pub fn file(mut self, file_name: impl Into<String>, expected_line_count: u64) -> Self {
        self.config.files = vec![SourceFile::new(file_name, expected_line_count)];
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn source_key(mut self, key: impl Into<String>) -> Self {
        self.config.source_key = key.into();
        self
    }

    pub fn schema(mut self, schema: SchemaVariant) -> Self {
        self.config.schema = schema;
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.config.release = release.into();
        self
    }

    pub fn progress_interval(mut self, interval: u64) -> Self {
        self.config.progress_interval = interval;
        self
    }

    pub fn echo_skipped_lines(mut self, echo: bool) -> Self {
        self.config.echo_skipped_lines = echo;
        self
    }

    pub fn build(self) -> Result<CcrConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
