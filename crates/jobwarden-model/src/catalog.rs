//! Top-level catalog: the root of the YAML configuration file.

use crate::error::ModelError;
use crate::job::{JobConfig, JobConfigRaw};
use serde::{Deserialize, Serialize};

/// Mirrors the catalog's on-disk shape in both directions: [`CatalogRaw::parse`]
/// deserializes it from YAML, and the crontab importer (in the `jobwarden`
/// binary's `parse` subcommand) serializes a freshly built one back to YAML.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct CatalogRaw {
    pub jobs: Vec<JobConfigRaw>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webserver_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webserver_port: Option<u16>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub webserver_metrics: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webserver_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webserver_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_args: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub jobs: Vec<JobConfig>,
    pub webserver_address: Option<String>,
    pub webserver_port: Option<u16>,
    pub webserver_metrics: bool,
    pub webserver_username: Option<String>,
    pub webserver_password: Option<String>,
    pub shell: Option<String>,
    pub shell_args: Option<String>,
}

impl CatalogRaw {
    /// Parses a YAML document. Unknown keys at any level are rejected.
    pub fn parse(yaml: &str) -> Result<Self, ModelError> {
        serde_yaml::from_str(yaml).map_err(|e| ModelError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<Catalog, ModelError> {
        let jobs = self
            .jobs
            .iter()
            .map(JobConfigRaw::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Catalog {
            jobs,
            webserver_address: self.webserver_address.clone(),
            webserver_port: self.webserver_port,
            webserver_metrics: self.webserver_metrics,
            webserver_username: self.webserver_username.clone(),
            webserver_password: self.webserver_password.clone(),
            shell: self.shell.clone(),
            shell_args: self.shell_args.clone(),
        })
    }
}

impl Catalog {
    pub fn load(yaml: &str) -> Result<Self, ModelError> {
        CatalogRaw::parse(yaml)?.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_catalog_parses_and_validates() {
        let yaml = r#"
jobs:
  - name: hello
    concurrency: 1
    events:
      - on_init: true
    tasks:
      - command: "echo hi"
"#;
        let catalog = Catalog::load(yaml).unwrap();
        assert_eq!(catalog.jobs.len(), 1);
        assert_eq!(catalog.jobs[0].name, "hello");
        assert_eq!(catalog.jobs[0].concurrency, 1);
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let yaml = "jobs: []\nnot_a_real_key: true\n";
        assert!(Catalog::load(yaml).is_err());
    }

    #[test]
    fn unknown_job_keys_are_rejected() {
        let yaml = r#"
jobs:
  - name: hello
    bogus_field: 1
"#;
        assert!(Catalog::load(yaml).is_err());
    }
}
