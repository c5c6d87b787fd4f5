//! Declarative router configuration.
//!
//! One document configures provider settings, failover precedence, and
//! load-balanced groups per capability kind. The whole document is
//! validated before anything is applied; an invalid document mutates
//! nothing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use switchyard_core::CapabilityKind;

use crate::balance::{LoadBalancer, Member, Strategy};
use crate::error::{RouterError, RouterResult};

/// A provider group entry: a bare name, or a name with a weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberSpec {
    Name(String),
    Weighted { name: String, weight: f64 },
}

impl MemberSpec {
    pub fn into_member(self) -> Member {
        match self {
            MemberSpec::Name(name) => Member::plain(name),
            MemberSpec::Weighted { name, weight } => Member::weighted(name, weight),
        }
    }
}

/// Load-balancing section for one capability kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancerSection {
    pub strategy: Strategy,
    pub providers: Vec<MemberSpec>,
}

/// The full configuration document.
///
/// `providers` carries opaque per-backend settings (API endpoints, model
/// names, credentials references). The router validates its shape and hands
/// the entries back to the application; constructing backend adapters from
/// them is the application's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub providers: HashMap<CapabilityKind, HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub failover: HashMap<CapabilityKind, Vec<String>>,
    #[serde(default)]
    pub load_balancing: HashMap<CapabilityKind, BalancerSection>,
}

impl RouterConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> RouterResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| RouterError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> RouterResult<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| RouterError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the whole document. Called by the loaders and again before the
    /// router applies a document, so a hand-built config gets the same
    /// treatment as a parsed one.
    pub fn validate(&self) -> RouterResult<()> {
        if self.providers.is_empty() {
            return Err(RouterError::InvalidConfig(
                "configuration must declare a non-empty 'providers' map".into(),
            ));
        }
        for (kind, entries) in &self.providers {
            if entries.is_empty() {
                return Err(RouterError::InvalidConfig(format!(
                    "providers for {kind} must not be empty"
                )));
            }
        }
        for (kind, order) in &self.failover {
            if order.is_empty() {
                return Err(RouterError::InvalidConfig(format!(
                    "failover order for {kind} must not be empty"
                )));
            }
        }
        for (kind, section) in &self.load_balancing {
            // Dry-run construction performs the per-strategy checks
            // (weighted groups need positive weights on every member).
            let members = section
                .providers
                .iter()
                .cloned()
                .map(MemberSpec::into_member)
                .collect();
            LoadBalancer::new(*kind, section.strategy, members)?;
        }
        Ok(())
    }
}
