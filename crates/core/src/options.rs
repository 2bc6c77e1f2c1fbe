//! Import configuration - strategy, report mode and attribution

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::CoreError;

/// How an import treats the records it receives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStrategy {
    /// Every record is created
    #[serde(alias = "NEW")]
    Create,
    /// Every record updates an existing one
    #[serde(alias = "UPDATES")]
    Update,
    /// Every record is deleted
    #[serde(alias = "DELETES")]
    Delete,
    /// Records are created or updated depending on whether they exist
    #[serde(alias = "NEW_AND_UPDATES")]
    CreateAndUpdate,
    /// Same routing as `CreateAndUpdate`
    Sync,
    /// No recognised strategy; the import does nothing
    Unspecified,
}

impl Default for ImportStrategy {
    fn default() -> Self {
        Self::CreateAndUpdate
    }
}

impl std::fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportStrategy::Create => write!(f, "CREATE"),
            ImportStrategy::Update => write!(f, "UPDATE"),
            ImportStrategy::Delete => write!(f, "DELETE"),
            ImportStrategy::CreateAndUpdate => write!(f, "CREATE_AND_UPDATE"),
            ImportStrategy::Sync => write!(f, "SYNC"),
            ImportStrategy::Unspecified => write!(f, "UNSPECIFIED"),
        }
    }
}

impl FromStr for ImportStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "CREATE" | "NEW" => Ok(Self::Create),
            "UPDATE" | "UPDATES" => Ok(Self::Update),
            "DELETE" | "DELETES" => Ok(Self::Delete),
            "CREATE_AND_UPDATE" | "NEW_AND_UPDATES" => Ok(Self::CreateAndUpdate),
            "SYNC" => Ok(Self::Sync),
            "UNSPECIFIED" => Ok(Self::Unspecified),
            _ => Err(CoreError::InvalidValue {
                field: "importStrategy",
                value: s.to_string(),
            }),
        }
    }
}

/// Which summaries end up in the final report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportMode {
    /// Every summary
    Full,
    /// Only summaries carrying at least one conflict
    #[serde(alias = "ERRORS")]
    ErrorsOnly,
}

impl Default for ReportMode {
    fn default() -> Self {
        Self::Full
    }
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportMode::Full => write!(f, "FULL"),
            ReportMode::ErrorsOnly => write!(f, "ERRORS_ONLY"),
        }
    }
}

impl FromStr for ReportMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "FULL" => Ok(Self::Full),
            "ERRORS" | "ERRORS_ONLY" => Ok(Self::ErrorsOnly),
            _ => Err(CoreError::InvalidValue {
                field: "reportMode",
                value: s.to_string(),
            }),
        }
    }
}

/// Identity an import is attributed to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            uid: None,
            username: username.into(),
        }
    }

    /// Builder: set uid
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }
}

/// Options for a single import call
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Attribution; filled from the session when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default)]
    pub import_strategy: ImportStrategy,

    #[serde(default)]
    pub report_mode: ReportMode,

    /// Validate and report without persisting anything
    #[serde(default)]
    pub dry_run: bool,
}

impl ImportOptions {
    pub fn new(import_strategy: ImportStrategy) -> Self {
        Self {
            import_strategy,
            ..Self::default()
        }
    }

    /// Builder: set user
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Builder: set report mode
    pub fn with_report_mode(mut self, report_mode: ReportMode) -> Self {
        self.report_mode = report_mode;
        self
    }

    /// Builder: enable dry run
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Username for attribution, if any
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ImportOptions::default();
        assert_eq!(options.import_strategy, ImportStrategy::CreateAndUpdate);
        assert_eq!(options.report_mode, ReportMode::Full);
        assert!(options.user.is_none());
        assert!(!options.dry_run);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("create".parse::<ImportStrategy>().unwrap(), ImportStrategy::Create);
        assert_eq!("NEW_AND_UPDATES".parse::<ImportStrategy>().unwrap(), ImportStrategy::CreateAndUpdate);
        assert_eq!("create-and-update".parse::<ImportStrategy>().unwrap(), ImportStrategy::CreateAndUpdate);
        assert_eq!("DELETES".parse::<ImportStrategy>().unwrap(), ImportStrategy::Delete);
        assert!("MERGE".parse::<ImportStrategy>().is_err());
    }

    #[test]
    fn test_report_mode_parsing() {
        assert_eq!("errors".parse::<ReportMode>().unwrap(), ReportMode::ErrorsOnly);
        assert_eq!("FULL".parse::<ReportMode>().unwrap(), ReportMode::Full);
        assert!("DEBUG".parse::<ReportMode>().is_err());
    }

    #[test]
    fn test_strategy_serde_aliases() {
        let strategy: ImportStrategy = serde_json::from_str("\"NEW\"").unwrap();
        assert_eq!(strategy, ImportStrategy::Create);
        assert_eq!(
            serde_json::to_string(&ImportStrategy::CreateAndUpdate).unwrap(),
            "\"CREATE_AND_UPDATE\""
        );
    }

    #[test]
    fn test_options_builder() {
        let options = ImportOptions::new(ImportStrategy::Delete)
            .with_user(User::new("admin"))
            .with_report_mode(ReportMode::ErrorsOnly)
            .dry_run();

        assert_eq!(options.username(), Some("admin"));
        assert_eq!(options.report_mode, ReportMode::ErrorsOnly);
        assert!(options.dry_run);
    }
}
