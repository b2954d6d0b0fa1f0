//! Advisory database module
//!
//! Loads a JSON advisory file and serves it through the [`UpstreamClient`]
//! contract. This is the bundled default backend; real deployments can swap
//! in any other implementation of the trait.

use crate::error::{Result, ServerError};
use crate::upstream::{UpstreamClient, UpstreamError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Advisory severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Range of affected versions
///
/// `introduced` of `None` means affected from the first release;
/// `fixed` of `None` means no fix has shipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introduced: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
}

/// One security advisory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub id: String,
    pub package: String,
    pub summary: String,
    pub severity: Severity,
    #[serde(default)]
    pub affected: Vec<VersionRange>,
    #[serde(default)]
    pub references: Vec<String>,
}

impl Advisory {
    /// Whether the given version falls into any affected range
    pub fn affects(&self, version: &str) -> bool {
        self.affected.iter().any(|range| {
            let after_introduced = match &range.introduced {
                Some(intro) => compare_versions(version, intro) != Ordering::Less,
                None => true,
            };
            let before_fixed = match &range.fixed {
                Some(fixed) => compare_versions(version, fixed) == Ordering::Less,
                None => true,
            };
            after_introduced && before_fixed
        })
    }
}

/// On-disk advisory file shape
#[derive(Debug, Deserialize)]
struct AdvisoryFile {
    #[serde(default)]
    #[allow(dead_code)]
    version: Option<String>,
    advisories: Vec<Advisory>,
}

/// Advisory database indexed by id and by package
#[derive(Debug)]
pub struct AdvisoryDb {
    advisories: Vec<Advisory>,
    by_id: HashMap<String, usize>,
    by_package: HashMap<String, Vec<usize>>,
}

impl AdvisoryDb {
    /// Load the advisory database from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServerError::Internal(format!(
                "failed to read advisory database {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: AdvisoryFile = serde_json::from_str(&content).map_err(|e| {
            ServerError::Internal(format!(
                "failed to parse advisory database {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::from_advisories(file.advisories))
    }

    /// Build a database from an in-memory advisory list
    pub fn from_advisories(advisories: Vec<Advisory>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_package: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, advisory) in advisories.iter().enumerate() {
            by_id.insert(advisory.id.clone(), idx);
            by_package
                .entry(advisory.package.clone())
                .or_default()
                .push(idx);
        }

        Self {
            advisories,
            by_id,
            by_package,
        }
    }

    /// Number of advisories loaded
    pub fn len(&self) -> usize {
        self.advisories.len()
    }

    /// Whether the database is empty
    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }

    /// Get an advisory by id
    pub fn get(&self, id: &str) -> Option<&Advisory> {
        self.by_id.get(id).map(|&idx| &self.advisories[idx])
    }

    /// All advisories affecting a package, optionally at or above a severity
    pub fn for_package(&self, package: &str, min_severity: Option<Severity>) -> Vec<&Advisory> {
        let Some(indices) = self.by_package.get(package) else {
            return Vec::new();
        };

        indices
            .iter()
            .map(|&idx| &self.advisories[idx])
            .filter(|a| min_severity.map_or(true, |min| a.severity >= min))
            .collect()
    }

    /// Advisories affecting a specific version of a package
    pub fn affecting_version(&self, package: &str, version: &str) -> Vec<&Advisory> {
        self.for_package(package, None)
            .into_iter()
            .filter(|a| a.affects(version))
            .collect()
    }
}

/// Compare two dotted version strings.
///
/// Components are compared numerically when both parse as integers,
/// lexicographically otherwise. Missing components count as zero, so
/// "1.2" == "1.2.0".
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts_a: Vec<&str> = a.split('.').collect();
    let parts_b: Vec<&str> = b.split('.').collect();

    for i in 0..parts_a.len().max(parts_b.len()) {
        let pa = parts_a.get(i).copied().unwrap_or("0");
        let pb = parts_b.get(i).copied().unwrap_or("0");

        let ord = match (pa.parse::<u64>(), pb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => na.cmp(&nb),
            _ => pa.cmp(pb),
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

fn parse_severity(raw: &str) -> Result<Severity> {
    serde_json::from_value(Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| ServerError::InvalidParams(format!("unknown severity: {}", raw)))
}

#[async_trait]
impl UpstreamClient for AdvisoryDb {
    async fn query(&self, tool: &str, params: &Value) -> std::result::Result<Value, UpstreamError> {
        match tool {
            "vuln_lookup" => {
                let id = params["id"]
                    .as_str()
                    .ok_or_else(|| UpstreamError::Malformed("missing 'id'".to_string()))?;

                let advisory = self
                    .get(id)
                    .ok_or_else(|| UpstreamError::NotFound(id.to_string()))?;

                Ok(json!(advisory))
            }
            "package_advisories" => {
                let package = params["package"]
                    .as_str()
                    .ok_or_else(|| UpstreamError::Malformed("missing 'package'".to_string()))?;

                let min_severity = match params["severity"].as_str() {
                    Some(raw) => Some(
                        parse_severity(raw)
                            .map_err(|e| UpstreamError::Malformed(e.to_string()))?,
                    ),
                    None => None,
                };

                let advisories = self.for_package(package, min_severity);
                let count = advisories.len();
                Ok(json!({
                    "package": package,
                    "advisories": advisories,
                    "count": count
                }))
            }
            "version_check" => {
                let package = params["package"]
                    .as_str()
                    .ok_or_else(|| UpstreamError::Malformed("missing 'package'".to_string()))?;
                let version = params["version"]
                    .as_str()
                    .ok_or_else(|| UpstreamError::Malformed("missing 'version'".to_string()))?;

                let affecting = self.affecting_version(package, version);
                Ok(json!({
                    "package": package,
                    "version": version,
                    "affected": !affecting.is_empty(),
                    "advisories": affecting.iter().map(|a| a.id.clone()).collect::<Vec<_>>()
                }))
            }
            other => Err(UpstreamError::Malformed(format!(
                "advisory backend has no answer for tool '{}'",
                other
            ))),
        }
    }
}
