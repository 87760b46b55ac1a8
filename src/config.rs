//! Runtime configuration
//!
//! Loaded from an optional YAML file; every field has a default so an empty
//! or missing file is valid. CLI flags override individual fields.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChecklistError, ChecklistResult};
use crate::excel::ExportOptions;
use crate::types::{NewUser, Role};

/// Account created by `init` when its username is free
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSeed {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    pub role: Role,
}

impl AccountSeed {
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            password: self.password.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite database file
    pub database: PathBuf,
    /// Export base workbook
    pub template: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub export_prefix: String,
    pub default_accounts: Vec<AccountSeed>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("checklist.db"),
            template: None,
            export_dir: PathBuf::from("exports"),
            export_prefix: "CR_Checklist".to_string(),
            default_accounts: vec![
                AccountSeed {
                    username: "admin".to_string(),
                    password: "admin123".to_string(),
                    name: "Administrator".to_string(),
                    email: "admin@example.com".to_string(),
                    department: "Admin".to_string(),
                    role: Role::Admin,
                },
                AccountSeed {
                    username: "user".to_string(),
                    password: "user123".to_string(),
                    name: "Regular User".to_string(),
                    email: "user@example.com".to_string(),
                    department: "Operations".to_string(),
                    role: Role::User,
                },
            ],
        }
    }
}

impl AppConfig {
    /// Parse a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> ChecklistResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ChecklistError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ChecklistResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// `load` when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> ChecklistResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            template: self.template.clone(),
            output_dir: self.export_dir.clone(),
            file_prefix: self.export_prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database, PathBuf::from("checklist.db"));
        assert_eq!(config.template, None);
        assert_eq!(config.default_accounts.len(), 2);
        assert_eq!(config.default_accounts[0].role, Role::Admin);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            "database: /var/lib/checklist/data.db\ntemplate: templates/base.xlsx\n",
        )
        .unwrap();
        assert_eq!(config.database, PathBuf::from("/var/lib/checklist/data.db"));
        assert_eq!(config.template, Some(PathBuf::from("templates/base.xlsx")));
        assert_eq!(config.export_prefix, "CR_Checklist");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = AppConfig::from_yaml("databse: typo.db\n");
        assert!(matches!(result, Err(ChecklistError::Yaml(_))));
    }

    #[test]
    fn test_accounts_from_yaml() {
        let yaml = r#"
default_accounts:
  - username: lead
    password: changeme
    name: Shift Lead
    email: lead@example.com
    department: Operations
    role: admin
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.default_accounts.len(), 1);
        assert_eq!(config.default_accounts[0].role, Role::Admin);
        assert_eq!(config.default_accounts[0].to_new_user().username, "lead");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "export_dir: out").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.export_options().output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load("/nonexistent/checklist.yaml");
        assert!(matches!(result, Err(ChecklistError::Config(_))));
    }
}
