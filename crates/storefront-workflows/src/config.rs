use std::path::Path;

use serde::Deserialize;
use storefront_core::ReturnStatus;

use crate::error::{Result, WorkflowError};

pub const DEFAULT_REFUND_EVENT: &str = "return.refund_processed";

/// Settings for the refund workflow, read from the `[refund]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefundConfig {
    /// Statuses a return must be in before it can be refunded.
    pub refundable_statuses: Vec<ReturnStatus>,
    /// Used when the caller does not say whether to restock.
    pub restore_inventory_by_default: bool,
    pub event_name: String,
}

impl Default for RefundConfig {
    fn default() -> Self {
        Self {
            refundable_statuses: vec![ReturnStatus::Received, ReturnStatus::Approved],
            restore_inventory_by_default: true,
            event_name: DEFAULT_REFUND_EVENT.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    refund: RefundConfig,
}

impl RefundConfig {
    /// # Errors
    ///
    /// Returns `WorkflowError::ConfigRead` if the file cannot be read and
    /// `WorkflowError::ConfigParse` if it is not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| WorkflowError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    ///
    /// Returns `WorkflowError::ConfigParse` if the document is not valid
    /// configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(WorkflowError::ConfigParse)?;
        Ok(file.refund)
    }

    #[must_use]
    pub fn is_refundable(&self, status: ReturnStatus) -> bool {
        self.refundable_statuses.contains(&status)
    }

    /// Human-readable list of refundable statuses, e.g. `received or approved`.
    #[must_use]
    pub fn refundable_statuses_display(&self) -> String {
        let names: Vec<String> = self
            .refundable_statuses
            .iter()
            .map(ToString::to_string)
            .collect();
        match names.split_last() {
            None => "in a refundable status".to_string(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn defaults_accept_received_and_approved() {
        let config = RefundConfig::default();

        assert!(config.is_refundable(ReturnStatus::Received));
        assert!(config.is_refundable(ReturnStatus::Approved));
        assert!(!config.is_refundable(ReturnStatus::Refunded));
        assert!(config.restore_inventory_by_default);
        assert_eq!(config.event_name, "return.refund_processed");
    }

    #[test]
    fn empty_document_yields_defaults() -> anyhow::Result<()> {
        let config = RefundConfig::from_toml_str("")?;

        assert_eq!(config, RefundConfig::default());
        Ok(())
    }

    #[test]
    fn partial_table_overrides_only_given_fields() -> anyhow::Result<()> {
        let config = RefundConfig::from_toml_str(
            r#"
            [refund]
            refundable_statuses = ["received"]
            event_name = "refund.done"
            "#,
        )?;

        assert_eq!(config.refundable_statuses, vec![ReturnStatus::Received]);
        assert_eq!(config.event_name, "refund.done");
        assert!(config.restore_inventory_by_default);
        Ok(())
    }

    #[test]
    fn unknown_status_is_a_configuration_error() {
        let err = RefundConfig::from_toml_str(
            r#"
            [refund]
            refundable_statuses = ["shipped"]
            "#,
        )
        .expect_err("unknown status");

        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = RefundConfig::from_toml_str(
            r"
            [refund]
            restock = false
            ",
        )
        .expect_err("unknown field");

        assert!(matches!(err, WorkflowError::ConfigParse(_)));
    }

    #[test]
    fn statuses_display_joins_with_or() {
        assert_eq!(
            RefundConfig::default().refundable_statuses_display(),
            "received or approved"
        );

        let single = RefundConfig {
            refundable_statuses: vec![ReturnStatus::Received],
            ..RefundConfig::default()
        };
        assert_eq!(single.refundable_statuses_display(), "received");
    }
}
