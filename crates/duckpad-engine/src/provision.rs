//! Extension provisioning.
//!
//! Resolves a named extension through a fixed, ordered fallback protocol
//! and stops at the first tier whose `LOAD` succeeds:
//!
//! | Tier | Statements |
//! |---|---|
//! | `AlreadyAvailable` | `LOAD name` |
//! | `Core` | `INSTALL name FROM '<core>'`, `LOAD name` |
//! | `Community` | `INSTALL name FROM '<community>'`, `LOAD name` |
//! | `Fallback` | `INSTALL name`, `LOAD name` |
//!
//! An `INSTALL` failure never ends a tier: "already installed" cannot be
//! told apart from a real failure here, so the tier still tries its `LOAD`.
//!
//! # Stability
//!
//! **Stable** -- Breaking changes only in major versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{Result, WorkbenchError};
use crate::session::SessionHandle;
use crate::statements;

/// Default core extension repository.
pub const CORE_REPOSITORY_URL: &str = "https://extensions.duckdb.org";

/// Default community extension repository.
pub const COMMUNITY_REPOSITORY_URL: &str = "https://community-extensions.duckdb.org";

/// Extension required for reading `http(s)://` sources.
pub const NETWORK_EXTENSION: &str = "httpfs";

/// Known extension repositories, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repository {
    /// Official core extensions.
    Core,
    /// Community-maintained extensions.
    Community,
}

impl Repository {
    /// Repositories in the order the protocol tries them.
    pub const ORDERED: [Repository; 2] = [Repository::Core, Repository::Community];

    /// Built-in base URL.
    pub fn default_url(&self) -> &'static str {
        match self {
            Repository::Core => CORE_REPOSITORY_URL,
            Repository::Community => COMMUNITY_REPOSITORY_URL,
        }
    }
}

/// Repository URLs and the network extension name.
///
/// # Defaults
///
/// | Field | Default |
/// |---|---|
/// | `core_repository` | `https://extensions.duckdb.org` |
/// | `community_repository` | `https://community-extensions.duckdb.org` |
/// | `network_extension` | `httpfs` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionerConfig {
    /// Base URL of the core repository.
    pub core_repository: String,
    /// Base URL of the community repository.
    pub community_repository: String,
    /// Extension loaded before reading remote sources.
    pub network_extension: String,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            core_repository: Repository::Core.default_url().to_string(),
            community_repository: Repository::Community.default_url().to_string(),
            network_extension: NETWORK_EXTENSION.to_string(),
        }
    }
}

impl ProvisionerConfig {
    /// URL configured for `repository`.
    pub fn repository_url(&self, repository: Repository) -> &str {
        match repository {
            Repository::Core => &self.core_repository,
            Repository::Community => &self.community_repository,
        }
    }

    /// Reject blank URLs and an invalid network extension name.
    pub fn validate(&self) -> Result<()> {
        for repository in Repository::ORDERED {
            if self.repository_url(repository).trim().is_empty() {
                return Err(WorkbenchError::Config(format!(
                    "{:?} repository URL must not be empty",
                    repository
                )));
            }
        }
        crate::source::ExtensionRequest::new(&self.network_extension)
            .map_err(|e| WorkbenchError::Config(format!("network_extension: {}", e)))?;
        Ok(())
    }
}

/// One step of the fallback protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Built-in or previously installed; plain `LOAD`.
    AlreadyAvailable,
    /// Installed from the core repository.
    Core,
    /// Installed from the community repository.
    Community,
    /// Installed with the engine's default repository resolution.
    Fallback,
}

impl Tier {
    /// Tiers in protocol order.
    pub const ORDERED: [Tier; 4] = [
        Tier::AlreadyAvailable,
        Tier::Core,
        Tier::Community,
        Tier::Fallback,
    ];

    /// The `INSTALL` statement this tier runs before its `LOAD`, if any.
    pub fn install_statement(&self, extension: &str, config: &ProvisionerConfig) -> Option<String> {
        match self {
            Tier::AlreadyAvailable => None,
            Tier::Core => Some(statements::install_from(
                extension,
                config.repository_url(Repository::Core),
            )),
            Tier::Community => Some(statements::install_from(
                extension,
                config.repository_url(Repository::Community),
            )),
            Tier::Fallback => Some(statements::install(extension)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::AlreadyAvailable => "already available",
            Tier::Core => "core",
            Tier::Community => "community",
            Tier::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// What happened within one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAttempt {
    /// Tier attempted.
    pub tier: Tier,
    /// Swallowed `INSTALL` error, if the tier installs and it failed.
    pub install_error: Option<String>,
    /// `LOAD` error; `None` means the tier won.
    pub load_error: Option<String>,
}

impl TierAttempt {
    /// Returns `true` if this tier loaded the extension.
    pub fn succeeded(&self) -> bool {
        self.load_error.is_none()
    }
}

/// Result of running the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// A tier loaded the extension.
    Loaded {
        /// Winning tier.
        via: Tier,
        /// Every tier attempted, winner last.
        attempts: Vec<TierAttempt>,
    },
    /// All tiers failed.
    Failed {
        /// Error observed last.
        last_error: String,
        /// Every tier attempted.
        attempts: Vec<TierAttempt>,
    },
}

impl ProvisionOutcome {
    /// Winning tier, if any.
    pub fn via(&self) -> Option<Tier> {
        match self {
            ProvisionOutcome::Loaded { via, .. } => Some(*via),
            ProvisionOutcome::Failed { .. } => None,
        }
    }

    /// Per-tier log.
    pub fn attempts(&self) -> &[TierAttempt] {
        match self {
            ProvisionOutcome::Loaded { attempts, .. } | ProvisionOutcome::Failed { attempts, .. } => {
                attempts
            }
        }
    }

    /// Convert into a `Result`, mapping `Failed` to `ProvisioningFailed`.
    pub fn into_result(self, name: &str) -> Result<Self> {
        match self {
            ProvisionOutcome::Failed { last_error, .. } => Err(WorkbenchError::ProvisioningFailed {
                name: name.to_string(),
                last_error,
            }),
            loaded => Ok(loaded),
        }
    }
}

/// Runs the fallback protocol on an open session.
#[derive(Debug, Clone, Default)]
pub struct ExtensionProvisioner {
    config: ProvisionerConfig,
}

impl ExtensionProvisioner {
    /// Create a provisioner with the given repositories.
    pub fn new(config: ProvisionerConfig) -> Self {
        Self { config }
    }

    /// Repositories and network extension in use.
    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Resolve and load `extension`.
    ///
    /// The name is expected to be validated already (see
    /// [`crate::source::ExtensionRequest`]).
    pub async fn provision(&self, session: &SessionHandle, extension: &str) -> ProvisionOutcome {
        let load = statements::load(extension);
        let mut attempts = Vec::with_capacity(Tier::ORDERED.len());
        let mut last_error = String::new();

        for tier in Tier::ORDERED {
            let mut attempt = TierAttempt {
                tier,
                install_error: None,
                load_error: None,
            };

            if let Some(install) = tier.install_statement(extension, &self.config) {
                debug!(extension = %extension, tier = %tier, "Trying {}", install);
                if let Err(e) = session.query(&install).await {
                    debug!(extension = %extension, tier = %tier, error = %e, "INSTALL failed, trying LOAD anyway");
                    last_error = e.to_string();
                    attempt.install_error = Some(last_error.clone());
                }
            }

            match session.query(&load).await {
                Ok(_) => {
                    attempts.push(attempt);
                    info!(extension = %extension, tier = %tier, "Extension loaded");
                    return ProvisionOutcome::Loaded { via: tier, attempts };
                }
                Err(e) => {
                    debug!(extension = %extension, tier = %tier, error = %e, "LOAD failed");
                    last_error = e.to_string();
                    attempt.load_error = Some(last_error.clone());
                    attempts.push(attempt);
                }
            }
        }

        warn!(extension = %extension, error = %last_error, "All attempts failed to install/load extension");
        ProvisionOutcome::Failed {
            last_error,
            attempts,
        }
    }

    /// Make the network filesystem extension available for remote reads.
    ///
    /// Installs from the community repository (failure tolerated) and then
    /// loads it. Only the load failure is reported.
    pub async fn load_network_extension(&self, session: &SessionHandle) -> Result<()> {
        let extension = &self.config.network_extension;
        let install = statements::install_from(
            extension,
            self.config.repository_url(Repository::Community),
        );
        if let Err(e) = session.query(&install).await {
            debug!(extension = %extension, error = %e, "Network extension install may have failed or already installed");
        }

        session
            .query(&statements::load(extension))
            .await
            .map(|_| {
                info!(extension = %extension, "Network extension loaded for remote reads");
            })
            .map_err(|e| WorkbenchError::NetworkExtensionUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::scoped;
    use crate::testing::ScriptedEngine;

    async fn run(engine: &ScriptedEngine, name: &str) -> ProvisionOutcome {
        let provisioner = ExtensionProvisioner::default();
        let name = name.to_string();
        scoped(engine, |session| async move {
            Ok(provisioner.provision(&session, &name).await)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_already_available_issues_no_install() {
        let engine = ScriptedEngine::new();
        let outcome = run(&engine, "json").await;

        assert_eq!(outcome.via(), Some(Tier::AlreadyAvailable));
        assert_eq!(engine.statements(), vec!["LOAD json"]);
        assert!(!engine.statements().iter().any(|s| s.starts_with("INSTALL")));
    }

    #[tokio::test]
    async fn test_core_tier() {
        let engine = ScriptedEngine::new().fail_times("LOAD spatial", 1);
        let outcome = run(&engine, "spatial").await;

        assert_eq!(outcome.via(), Some(Tier::Core));
        assert_eq!(
            engine.statements(),
            vec![
                "LOAD spatial",
                "INSTALL spatial FROM 'https://extensions.duckdb.org'",
                "LOAD spatial",
            ]
        );
    }

    #[tokio::test]
    async fn test_community_tier() {
        let engine = ScriptedEngine::new()
            .fail_on("INSTALL h3 FROM 'https://extensions.duckdb.org'")
            .fail_times("LOAD h3", 2);
        let outcome = run(&engine, "h3").await;

        assert_eq!(outcome.via(), Some(Tier::Community));
        let attempts = outcome.attempts();
        assert_eq!(attempts.len(), 3);
        assert!(attempts[1].install_error.is_some());
        assert!(attempts[2].succeeded());
    }

    #[tokio::test]
    async fn test_fallback_tier_loads_exactly_once() {
        let engine = ScriptedEngine::new().fail_times("LOAD spatial", 3);
        let outcome = run(&engine, "spatial").await;

        assert_eq!(outcome.via(), Some(Tier::Fallback));
        assert_eq!(
            engine.statements(),
            vec![
                "LOAD spatial",
                "INSTALL spatial FROM 'https://extensions.duckdb.org'",
                "LOAD spatial",
                "INSTALL spatial FROM 'https://community-extensions.duckdb.org'",
                "LOAD spatial",
                "INSTALL spatial",
                "LOAD spatial",
            ]
        );
        let successful_loads = engine
            .executed()
            .iter()
            .filter(|s| s.sql.starts_with("LOAD") && s.succeeded)
            .count();
        assert_eq!(successful_loads, 1);
    }

    #[tokio::test]
    async fn test_install_failure_still_attempts_load() {
        // Every INSTALL fails, yet the core tier's LOAD succeeds.
        let engine = ScriptedEngine::new()
            .fail_on("INSTALL")
            .fail_times("LOAD icu", 1);
        let outcome = run(&engine, "icu").await;

        assert_eq!(outcome.via(), Some(Tier::Core));
        assert!(outcome.attempts()[1].install_error.is_some());
    }

    #[tokio::test]
    async fn test_all_tiers_fail() {
        let engine = ScriptedEngine::new().fail_on("LOAD nope").fail_on("INSTALL nope");
        let outcome = run(&engine, "nope").await;

        match &outcome {
            ProvisionOutcome::Failed { last_error, attempts } => {
                assert!(last_error.contains("LOAD nope"));
                assert_eq!(attempts.len(), 4);
                assert!(attempts.iter().all(|a| !a.succeeded()));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert!(engine.tables().is_empty());
        assert!(matches!(
            outcome.into_result("nope"),
            Err(WorkbenchError::ProvisioningFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_custom_repositories() {
        let engine = ScriptedEngine::new().fail_times("LOAD vss", 1);
        let provisioner = ExtensionProvisioner::new(ProvisionerConfig {
            core_repository: "http://mirror.local/core".into(),
            ..Default::default()
        });
        scoped(&engine, |session| async move {
            Ok(provisioner.provision(&session, "vss").await)
        })
        .await
        .unwrap();

        assert_eq!(engine.statements()[1], "INSTALL vss FROM 'http://mirror.local/core'");
    }

    #[tokio::test]
    async fn test_network_extension_install_failure_tolerated() {
        let engine = ScriptedEngine::new().fail_on("INSTALL httpfs");
        let provisioner = ExtensionProvisioner::default();
        let result = scoped(&engine, |session| async move {
            provisioner.load_network_extension(&session).await
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(
            engine.statements(),
            vec![
                "INSTALL httpfs FROM 'https://community-extensions.duckdb.org'",
                "LOAD httpfs",
            ]
        );
    }

    #[tokio::test]
    async fn test_network_extension_load_failure_reported() {
        let engine = ScriptedEngine::new().fail_on("LOAD httpfs");
        let provisioner = ExtensionProvisioner::default();
        let err = scoped(&engine, |session| async move {
            provisioner.load_network_extension(&session).await
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WorkbenchError::NetworkExtensionUnavailable(_)));
    }

    #[test]
    fn test_config_validation() {
        assert!(ProvisionerConfig::default().validate().is_ok());
        let blank = ProvisionerConfig {
            community_repository: " ".into(),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
        let bad_ext = ProvisionerConfig {
            network_extension: "http fs".into(),
            ..Default::default()
        };
        assert!(bad_ext.validate().is_err());
    }
}
