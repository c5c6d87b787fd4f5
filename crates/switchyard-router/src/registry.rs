//! Typed provider registry: one per capability kind.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use switchyard_core::{Capability, Provider};

use crate::balance::{LoadBalancer, Member, Strategy};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::circuit_breaker::state::BreakerSnapshot;
use crate::error::{RouterError, RouterResult};
use crate::events::{EventSink, RouterEvent};
use crate::failover::{run_chain, Candidate, ExecutionReport, ProviderRuntime};
use crate::retry::RetryConfig;
use crate::stats::ProviderStats;

/// Process-wide router settings, fixed when the router is built.
#[derive(Debug, Clone, Default)]
pub struct RouterSettings {
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

/// Options for [`ProviderRegistry::register_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    /// Allow an existing registration under the same name to be superseded.
    pub replace: bool,
}

/// Result of probing one provider's health.
///
/// A probe failure is data, not an error: it becomes `healthy: false` with
/// the failure message attached.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub latency: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Entry<C: Capability> {
    name: String,
    provider: Arc<dyn Provider<C>>,
}

/// Registry of interchangeable providers for one capability kind, with
/// failover and load-balanced execution over them.
///
/// The handle table keeps registration order; that order is the failover
/// precedence whenever no explicit order has been configured. Per-provider
/// runtime state (statistics, circuit breaker) lives in a concurrent map so
/// hot-path reads never contend with the table lock.
pub struct ProviderRegistry<C: Capability> {
    table: RwLock<Vec<Entry<C>>>,
    runtimes: DashMap<String, Arc<ProviderRuntime>>,
    failover_order: RwLock<Option<Vec<String>>>,
    balancer: RwLock<Option<LoadBalancer>>,
    settings: Arc<RouterSettings>,
    events: EventSink,
}

impl<C: Capability> ProviderRegistry<C> {
    pub(crate) fn new(settings: Arc<RouterSettings>, events: EventSink) -> Self {
        Self {
            table: RwLock::new(Vec::new()),
            runtimes: DashMap::new(),
            failover_order: RwLock::new(None),
            balancer: RwLock::new(None),
            settings,
            events,
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a provider. Fails if the name is already taken.
    pub fn register(&self, provider: Arc<dyn Provider<C>>) -> RouterResult<()> {
        self.register_with(provider, RegisterOptions::default())
    }

    /// Register a provider, optionally replacing an existing registration.
    ///
    /// Replacing resets the name's statistics and circuit breaker: the new
    /// handle is a different backend instance and inherits no history.
    pub fn register_with(
        &self,
        provider: Arc<dyn Provider<C>>,
        options: RegisterOptions,
    ) -> RouterResult<()> {
        let name = provider.name().to_string();
        let runtime = Arc::new(ProviderRuntime::new(CircuitBreaker::new(
            self.settings.breaker.clone(),
        )));
        let replaced = {
            let mut table = self.table.write();
            match table.iter_mut().find(|entry| entry.name == name) {
                Some(entry) => {
                    if !options.replace {
                        return Err(RouterError::AlreadyRegistered {
                            kind: C::KIND,
                            name,
                        });
                    }
                    entry.provider = provider;
                    self.runtimes.insert(name.clone(), runtime);
                    true
                }
                None => {
                    table.push(Entry {
                        name: name.clone(),
                        provider,
                    });
                    self.runtimes.insert(name.clone(), runtime);
                    false
                }
            }
        };
        info!(kind = %C::KIND, provider = %name, replaced, "registered provider");
        self.events.emit(RouterEvent::ProviderRegistered {
            kind: C::KIND,
            provider: name,
            replaced,
        });
        Ok(())
    }

    /// Remove a registered provider along with its statistics and breaker.
    pub fn remove(&self, name: &str) -> RouterResult<()> {
        {
            let mut table = self.table.write();
            let before = table.len();
            table.retain(|entry| entry.name != name);
            if table.len() == before {
                return Err(RouterError::UnknownProvider {
                    kind: C::KIND,
                    name: name.to_string(),
                });
            }
            self.runtimes.remove(name);
        }
        info!(kind = %C::KIND, provider = %name, "removed provider");
        self.events.emit(RouterEvent::ProviderRemoved {
            kind: C::KIND,
            provider: name.to_string(),
        });
        Ok(())
    }

    /// Look up a provider handle by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider<C>>> {
        self.table
            .read()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.provider))
    }

    /// All registered handles, in registration order. Empty when none are
    /// registered; never an error.
    pub fn providers(&self) -> Vec<Arc<dyn Provider<C>>> {
        self.table
            .read()
            .iter()
            .map(|entry| Arc::clone(&entry.provider))
            .collect()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.table.read().iter().map(|e| e.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Drop every provider, runtime, and configuration. Intended for tests.
    pub fn clear(&self) {
        self.table.write().clear();
        self.runtimes.clear();
        *self.failover_order.write() = None;
        *self.balancer.write() = None;
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Replace the failover precedence for this capability.
    ///
    /// Names that are not registered at execution time are skipped, so the
    /// order may be configured before its backends finish registering.
    pub fn configure_failover(&self, order: Vec<String>) -> RouterResult<()> {
        if order.is_empty() {
            return Err(RouterError::InvalidConfig(format!(
                "failover order for {} is empty",
                C::KIND
            )));
        }
        *self.failover_order.write() = Some(order.clone());
        info!(kind = %C::KIND, ?order, "configured failover order");
        self.events.emit(RouterEvent::FailoverConfigured {
            kind: C::KIND,
            order,
        });
        Ok(())
    }

    /// Replace the load-balanced group for this capability. Weighted groups
    /// are validated here; an invalid group leaves the previous one in place.
    pub fn configure_load_balancing(
        &self,
        strategy: Strategy,
        members: Vec<Member>,
    ) -> RouterResult<()> {
        let balancer = LoadBalancer::new(C::KIND, strategy, members)?;
        let names: Vec<String> = balancer.members().iter().map(|m| m.name.clone()).collect();
        *self.balancer.write() = Some(balancer);
        info!(kind = %C::KIND, %strategy, providers = ?names, "configured load balancing");
        self.events.emit(RouterEvent::LoadBalancingConfigured {
            kind: C::KIND,
            strategy,
            providers: names,
        });
        Ok(())
    }

    // ========================================================================
    // Observability
    // ========================================================================

    /// Statistics snapshot for a name. Never-seen names get a zeroed
    /// snapshot, not an error.
    pub fn stats(&self, name: &str) -> ProviderStats {
        self.runtimes
            .get(name)
            .map(|runtime| runtime.stats.snapshot())
            .unwrap_or_default()
    }

    /// Circuit breaker snapshot for a registered name.
    pub fn breaker_state(&self, name: &str) -> Option<BreakerSnapshot> {
        self.runtimes
            .get(name)
            .map(|runtime| runtime.breaker.snapshot())
    }

    /// Probe one provider's health, timing the probe. A probe failure is
    /// reported as unhealthy rather than propagated.
    pub async fn check_health(&self, name: &str) -> RouterResult<HealthReport> {
        let provider = self.get(name).ok_or_else(|| RouterError::UnknownProvider {
            kind: C::KIND,
            name: name.to_string(),
        })?;
        Ok(probe(provider).await)
    }

    /// Probe every registered provider concurrently.
    pub async fn check_health_all(&self) -> Vec<(String, HealthReport)> {
        let handles: Vec<(String, Arc<dyn Provider<C>>)> = {
            let table = self.table.read();
            table
                .iter()
                .map(|e| (e.name.clone(), Arc::clone(&e.provider)))
                .collect()
        };
        let reports = join_all(handles.iter().map(|(_, p)| probe(Arc::clone(p)))).await;
        handles
            .into_iter()
            .map(|(name, _)| name)
            .zip(reports)
            .collect()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Try providers in the configured failover order (registration order
    /// when none is configured) until one succeeds.
    pub async fn execute_with_failover(
        &self,
        request: C::Request,
    ) -> RouterResult<ExecutionReport<C::Response>> {
        let candidates = self.failover_candidates()?;
        run_chain(C::KIND, &candidates, &request, &self.settings.retry, &self.events).await
    }

    /// Select one provider via the configured load balancer and run a
    /// single gated, retry-governed attempt chain against it. No
    /// fallthrough to other providers.
    pub async fn execute_with_load_balancing(
        &self,
        request: C::Request,
    ) -> RouterResult<ExecutionReport<C::Response>> {
        let selected = {
            let balancer = self.balancer.read();
            let balancer = balancer
                .as_ref()
                .ok_or(RouterError::LoadBalancingNotConfigured { kind: C::KIND })?;
            balancer.pick(|name| self.stats(name)).name.clone()
        };
        debug!(kind = %C::KIND, provider = %selected, "load balancer selected provider");
        let candidate = {
            let table = self.table.read();
            table
                .iter()
                .find(|entry| entry.name == selected)
                .and_then(|entry| self.candidate_for(entry))
                .ok_or(RouterError::UnknownProvider {
                    kind: C::KIND,
                    name: selected,
                })?
        };
        run_chain(
            C::KIND,
            std::slice::from_ref(&candidate),
            &request,
            &self.settings.retry,
            &self.events,
        )
        .await
    }

    // Snapshot the candidate chain under the read lock, releasing it before
    // any provider call.
    fn failover_candidates(&self) -> RouterResult<Vec<Candidate<C>>> {
        let table = self.table.read();
        if table.is_empty() {
            return Err(RouterError::NoProviders { kind: C::KIND });
        }
        let order = self.failover_order.read();
        let candidates: Vec<Candidate<C>> = match order.as_ref() {
            Some(names) => names
                .iter()
                .filter_map(|name| table.iter().find(|entry| &entry.name == name))
                .filter_map(|entry| self.candidate_for(entry))
                .collect(),
            None => table
                .iter()
                .filter_map(|entry| self.candidate_for(entry))
                .collect(),
        };
        if candidates.is_empty() {
            // A configured order that matches nothing registered.
            return Err(RouterError::NoProviders { kind: C::KIND });
        }
        Ok(candidates)
    }

    // Every table entry has a runtime; registration inserts both under the
    // table write lock.
    fn candidate_for(&self, entry: &Entry<C>) -> Option<Candidate<C>> {
        self.runtimes.get(&entry.name).map(|runtime| Candidate {
            name: entry.name.clone(),
            provider: Arc::clone(&entry.provider),
            runtime: Arc::clone(runtime.value()),
        })
    }
}

async fn probe<C: Capability>(provider: Arc<dyn Provider<C>>) -> HealthReport {
    let started = Instant::now();
    match provider.probe().await {
        Ok(()) => HealthReport {
            healthy: true,
            latency: started.elapsed(),
            error: None,
        },
        Err(error) => HealthReport {
            healthy: false,
            latency: started.elapsed(),
            error: Some(error.to_string()),
        },
    }
}
