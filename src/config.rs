//! Ledger configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_principal, StrictOperationValidator};

/// Which callers may perform which operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMode {
    /// Any caller may mint or move any account's funds
    #[default]
    Permissive,
    /// Operations are bound to the caller; minting needs a configured minter
    Strict,
}

/// Ledger configuration, usually loaded from TOML
///
/// ```toml
/// authorization = "strict"
/// minters = ["treasury"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub authorization: AuthorizationMode,
    pub minters: Vec<Principal>,
}

impl LedgerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> LedgerResult<Self> {
        let config: LedgerConfig =
            toml::from_str(content).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        for minter in &self.minters {
            validate_principal(minter.as_str())
                .map_err(|e| LedgerError::Config(format!("minter '{}': {}", minter, e)))?;
        }

        if self.authorization == AuthorizationMode::Strict && self.minters.is_empty() {
            tracing::warn!("strict authorization configured without minters; mint is disabled");
        }

        Ok(())
    }

    /// Build the validator this configuration describes
    pub fn validator(&self) -> Box<dyn OperationValidator> {
        match self.authorization {
            AuthorizationMode::Permissive => Box::new(DefaultOperationValidator),
            AuthorizationMode::Strict => {
                Box::new(StrictOperationValidator::new(self.minters.iter().cloned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_permissive() {
        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config.authorization, AuthorizationMode::Permissive);
        assert!(config.minters.is_empty());
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_strict_config() {
        let config = LedgerConfig::from_toml_str(
            r#"
            authorization = "strict"
            minters = ["treasury", "faucet"]
            "#,
        )
        .unwrap();
        assert_eq!(config.authorization, AuthorizationMode::Strict);
        assert_eq!(
            config.minters,
            vec![Principal::from("treasury"), Principal::from("faucet")]
        );

        let validator = config.validator();
        let mint = Operation::Mint {
            owner: "alice".into(),
            amount: 1,
        };
        assert!(validator.authorize(&mint, Some(&"faucet".into())).is_ok());
        assert!(validator.authorize(&mint, Some(&"alice".into())).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let unknown_mode = LedgerConfig::from_toml_str(r#"authorization = "open""#).unwrap_err();
        assert_eq!(unknown_mode.code(), "CONFIG");

        let unknown_key = LedgerConfig::from_toml_str("fees = 1").unwrap_err();
        assert_eq!(unknown_key.code(), "CONFIG");

        let bad_minter = LedgerConfig::from_toml_str(r#"minters = [""]"#).unwrap_err();
        assert_eq!(bad_minter.code(), "CONFIG");
    }

    #[test]
    fn test_missing_file() {
        let err = LedgerConfig::from_file("/nonexistent/ledger.toml").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
