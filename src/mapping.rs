//! JAR mapping configuration
//!
//! Two JSON files under `<root>/debian/` drive a run:
//! - `jar-mapping.json`: object keyed by the bundled-JAR reference as it
//!   appears in `.properties` files, value gives the system path (and the
//!   Debian package that ships it).
//! - `extra-classpath.json`: array of entries that never appear in the
//!   properties files but must still land on CLASSPATH.
//!
//! The JSON object's own order is the substitution and reporting order,
//! hence IndexMap rather than HashMap.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const JAR_MAPPING_FILE: &str = "jar-mapping.json";
pub const EXTRA_CLASSPATH_FILE: &str = "extra-classpath.json";

/// One replacement record: the system JAR path, and optionally the
/// Debian package that provides it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JarEntry {
    pub jar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

/// Bundled-JAR reference token -> replacement, in file order.
pub type JarMapping = IndexMap<String, JarEntry>;

/// Both configuration files, loaded once and immutable for the run.
#[derive(Debug, Clone)]
pub struct DebianConfig {
    pub mapping: JarMapping,
    pub extra_classpath: Vec<JarEntry>,
}

impl DebianConfig {
    /// Load both JSON files from `<root>/debian/`. A missing or malformed
    /// file is fatal before any rewriting starts.
    pub fn load(root: &Path) -> Result<Self> {
        let debian_dir = root.join("debian");

        let mapping_path = debian_dir.join(JAR_MAPPING_FILE);
        let mapping_text = fs::read_to_string(&mapping_path)
            .with_context(|| format!("reading {}", mapping_path.display()))?;
        let mapping: JarMapping = serde_json::from_str(&mapping_text)
            .with_context(|| format!("parsing {}", mapping_path.display()))?;

        let extra_path = debian_dir.join(EXTRA_CLASSPATH_FILE);
        let extra_text = fs::read_to_string(&extra_path)
            .with_context(|| format!("reading {}", extra_path.display()))?;
        let extra_classpath: Vec<JarEntry> = serde_json::from_str(&extra_text)
            .with_context(|| format!("parsing {}", extra_path.display()))?;

        Ok(Self {
            mapping,
            extra_classpath,
        })
    }

    /// `package` fields across both files: mapping entries first (object
    /// order), then extra-classpath entries (array order). Entries without
    /// a package are skipped; duplicates are kept.
    pub fn required_packages(&self) -> Vec<&str> {
        self.mapping
            .values()
            .chain(self.extra_classpath.iter())
            .filter_map(|entry| entry.package.as_deref())
            .collect()
    }

    /// The `sudo apt-get install ...` line printed after a run.
    pub fn apt_install_line(&self) -> String {
        format!("sudo apt-get install {}", self.required_packages().join(" "))
    }

    /// The `export CLASSPATH=...` line: extra-classpath jars only,
    /// colon-joined in array order.
    pub fn classpath_export_line(&self) -> String {
        let jars: Vec<&str> = self
            .extra_classpath
            .iter()
            .map(|entry| entry.jar.as_str())
            .collect();
        format!("export CLASSPATH={}", jars.join(":"))
    }
}
