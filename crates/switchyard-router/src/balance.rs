//! Load-balancing strategies over a configured provider group.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{RouterError, RouterResult};
use crate::stats::ProviderStats;
use switchyard_core::CapabilityKind;

/// Selection strategy for a load-balanced provider group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    RoundRobin,
    Weighted,
    LeastLatency,
    LeastErrors,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::RoundRobin => f.write_str("round-robin"),
            Strategy::Weighted => f.write_str("weighted"),
            Strategy::LeastLatency => f.write_str("least-latency"),
            Strategy::LeastErrors => f.write_str("least-errors"),
        }
    }
}

/// One member of a balanced group. Weight is only meaningful (and only
/// required) under [`Strategy::Weighted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Member {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: None,
        }
    }

    pub fn weighted(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight: Some(weight),
        }
    }
}

/// A configured load balancer for one capability kind.
///
/// Selection never fails once construction succeeded: every strategy
/// degrades to configuration order on ties or missing statistics.
#[derive(Debug)]
pub struct LoadBalancer {
    strategy: Strategy,
    members: Vec<Member>,
    cursor: AtomicUsize,
}

impl LoadBalancer {
    /// Validates the group for the chosen strategy. Weighted groups must
    /// give every member a positive weight; this is rejected here, at
    /// configuration time, not at selection time.
    pub fn new(
        kind: CapabilityKind,
        strategy: Strategy,
        members: Vec<Member>,
    ) -> RouterResult<Self> {
        if members.is_empty() {
            return Err(RouterError::InvalidConfig(format!(
                "load balancing for {kind} configured with an empty provider list"
            )));
        }
        if strategy == Strategy::Weighted {
            for member in &members {
                match member.weight {
                    Some(w) if w > 0.0 => {}
                    Some(w) => {
                        return Err(RouterError::InvalidConfig(format!(
                            "weighted load balancing for {kind}: provider '{}' has non-positive weight {w}",
                            member.name
                        )));
                    }
                    None => {
                        return Err(RouterError::InvalidConfig(format!(
                            "weighted load balancing for {kind}: provider '{}' has no weight",
                            member.name
                        )));
                    }
                }
            }
        }
        Ok(Self {
            strategy,
            members,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Select one member, consulting `stats` for the statistics-driven
    /// strategies. Stale snapshots are acceptable.
    pub fn pick(&self, stats: impl Fn(&str) -> ProviderStats) -> &Member {
        match self.strategy {
            Strategy::RoundRobin => {
                let slot = self.cursor.fetch_add(1, Ordering::Relaxed);
                &self.members[slot % self.members.len()]
            }
            Strategy::Weighted => {
                let total: f64 = self.members.iter().filter_map(|m| m.weight).sum();
                let mut draw = rand::thread_rng().gen_range(0.0..total);
                // Floating-point slack can walk past the final span, so the
                // last member is the fallback.
                let mut selected = &self.members[self.members.len() - 1];
                for member in &self.members {
                    let weight = member.weight.unwrap_or(0.0);
                    if draw < weight {
                        selected = member;
                        break;
                    }
                    draw -= weight;
                }
                selected
            }
            Strategy::LeastLatency => self.min_by_metric(|s| s.avg_latency_ms, stats),
            Strategy::LeastErrors => self.min_by_metric(|s| s.failure_ratio(), stats),
        }
    }

    // Strict < keeps the earliest configured member on ties.
    fn min_by_metric(
        &self,
        metric: impl Fn(&ProviderStats) -> f64,
        stats: impl Fn(&str) -> ProviderStats,
    ) -> &Member {
        let mut best = &self.members[0];
        let mut best_value = metric(&stats(&best.name));
        for member in &self.members[1..] {
            let value = metric(&stats(&member.name));
            if value < best_value {
                best = member;
                best_value = value;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed(_: &str) -> ProviderStats {
        ProviderStats::default()
    }

    #[test]
    fn round_robin_cycles_in_order() {
        let lb = LoadBalancer::new(
            CapabilityKind::TextGeneration,
            Strategy::RoundRobin,
            vec![Member::plain("a"), Member::plain("b")],
        )
        .unwrap();
        let picks: Vec<_> = (0..6).map(|_| lb.pick(zeroed).name.clone()).collect();
        assert_eq!(picks, ["a", "b", "a", "b", "a", "b"]);
    }

    #[test]
    fn weighted_distribution_approximates_configured_ratio() {
        let lb = LoadBalancer::new(
            CapabilityKind::TextGeneration,
            Strategy::Weighted,
            vec![Member::weighted("a", 3.0), Member::weighted("b", 1.0)],
        )
        .unwrap();
        let trials = 8_000;
        let hits_a = (0..trials)
            .filter(|_| lb.pick(zeroed).name == "a")
            .count();
        // Expected 6000; 5 sigma of Binomial(8000, 0.75) is about 194.
        assert!(
            (5_750..=6_250).contains(&hits_a),
            "a selected {hits_a} times out of {trials}"
        );
    }

    #[test]
    fn weighted_rejects_unweighted_members() {
        let err = LoadBalancer::new(
            CapabilityKind::TextGeneration,
            Strategy::Weighted,
            vec![Member::weighted("a", 3.0), Member::plain("b")],
        )
        .unwrap_err();
        assert!(err.to_string().contains("no weight"));
    }

    #[test]
    fn weighted_rejects_non_positive_weights() {
        let err = LoadBalancer::new(
            CapabilityKind::TextGeneration,
            Strategy::Weighted,
            vec![Member::weighted("a", 0.0)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("non-positive"));
    }

    #[test]
    fn empty_group_is_rejected() {
        assert!(
            LoadBalancer::new(CapabilityKind::Embedding, Strategy::RoundRobin, vec![]).is_err()
        );
    }

    #[test]
    fn least_latency_picks_lowest_average() {
        let lb = LoadBalancer::new(
            CapabilityKind::TextGeneration,
            Strategy::LeastLatency,
            vec![Member::plain("slow"), Member::plain("fast")],
        )
        .unwrap();
        let pick = lb.pick(|name| ProviderStats {
            avg_latency_ms: if name == "fast" { 20.0 } else { 250.0 },
            ..Default::default()
        });
        assert_eq!(pick.name, "fast");
    }

    #[test]
    fn least_latency_tie_breaks_in_configuration_order() {
        let lb = LoadBalancer::new(
            CapabilityKind::TextGeneration,
            Strategy::LeastLatency,
            vec![Member::plain("first"), Member::plain("second")],
        )
        .unwrap();
        assert_eq!(lb.pick(zeroed).name, "first");
    }

    #[test]
    fn least_errors_picks_lowest_failure_ratio() {
        let lb = LoadBalancer::new(
            CapabilityKind::TextGeneration,
            Strategy::LeastErrors,
            vec![Member::plain("flaky"), Member::plain("solid")],
        )
        .unwrap();
        let pick = lb.pick(|name| {
            if name == "flaky" {
                ProviderStats {
                    requests: 10,
                    failures: 5,
                    ..Default::default()
                }
            } else {
                ProviderStats {
                    requests: 10,
                    failures: 1,
                    ..Default::default()
                }
            }
        });
        assert_eq!(pick.name, "solid");
    }
}
