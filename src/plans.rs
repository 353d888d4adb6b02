//! Subscription plans.
//!
//! Built-in defaults can be overridden from the `plans` table. The catalog is
//! resolved once at startup and passed to whoever needs it; a failed fetch
//! keeps the defaults.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::{StorageConfig, REQUEST_TIMEOUT},
    error::{Result, StudioError},
    storage::supabase::auth_headers,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub monthly_credits: u32,
    pub price_cents: u32,
}

/// Partial row from the remote table; absent fields keep the default.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanOverride {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub monthly_credits: Option<u32>,
    #[serde(default)]
    pub price_cents: Option<u32>,
}

#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn fetch_overrides(&self) -> Result<Vec<PlanOverride>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let plan = |id: &str, name: &str, monthly_credits, price_cents| Plan {
            id: id.to_string(),
            name: name.to_string(),
            monthly_credits,
            price_cents,
        };
        Self {
            plans: vec![
                plan("free", "Free", 5, 0),
                plan("starter", "Starter", 50, 1900),
                plan("pro", "Pro", 200, 4900),
                plan("business", "Business", 1000, 14900),
            ],
        }
    }
}

impl PlanCatalog {
    pub fn defaults() -> Self {
        Self::default()
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn get(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.id == id)
    }

    /// Overrides replace fields of existing plans by id; unknown ids are added
    /// only when fully specified.
    pub fn apply(mut self, overrides: Vec<PlanOverride>) -> Self {
        for row in overrides {
            if let Some(plan) = self.plans.iter_mut().find(|plan| plan.id == row.id) {
                if let Some(name) = row.name {
                    plan.name = name;
                }
                if let Some(credits) = row.monthly_credits {
                    plan.monthly_credits = credits;
                }
                if let Some(price) = row.price_cents {
                    plan.price_cents = price;
                }
            } else if let (Some(name), Some(monthly_credits), Some(price_cents)) =
                (row.name, row.monthly_credits, row.price_cents)
            {
                self.plans.push(Plan {
                    id: row.id,
                    name,
                    monthly_credits,
                    price_cents,
                });
            } else {
                log::warn!("Ignoring incomplete override for unknown plan '{}'", row.id);
            }
        }
        self
    }

    /// Defaults merged with remote overrides, or plain defaults if the fetch fails.
    pub async fn resolve(source: &dyn PlanSource) -> Self {
        match source.fetch_overrides().await {
            Ok(overrides) => {
                log::info!("Loaded {} plan overrides", overrides.len());
                Self::defaults().apply(overrides)
            }
            Err(e) => {
                log::warn!("Plan overrides unavailable, using defaults: {}", e);
                Self::defaults()
            }
        }
    }
}

/// Reads overrides from `{SUPABASE_URL}/rest/v1/plans`.
pub struct SupabasePlanSource {
    client: Client,
    rest_url: String,
    config: StorageConfig,
}

impl SupabasePlanSource {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let rest_url = format!("{}/rest/v1", config.base_url()?);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StudioError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            rest_url,
            config,
        })
    }
}

#[async_trait]
impl PlanSource for SupabasePlanSource {
    async fn fetch_overrides(&self) -> Result<Vec<PlanOverride>> {
        let response = self
            .client
            .get(format!("{}/plans", self.rest_url))
            .query(&[("select", "*")])
            .headers(auth_headers(self.config.key()?)?)
            .send()
            .await
            .map_err(|e| StudioError::Request(format!("plans request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StudioError::Response(e.to_string()))?;
        if !status.is_success() {
            return Err(StudioError::Response(format!(
                "{} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(std::result::Result<Vec<PlanOverride>, &'static str>);

    #[async_trait]
    impl PlanSource for StaticSource {
        async fn fetch_overrides(&self) -> Result<Vec<PlanOverride>> {
            self.0
                .clone()
                .map_err(|e| StudioError::Request(e.to_string()))
        }
    }

    fn row(id: &str, credits: Option<u32>) -> PlanOverride {
        PlanOverride {
            id: id.to_string(),
            name: None,
            monthly_credits: credits,
            price_cents: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_defaults() {
        let catalog = PlanCatalog::resolve(&StaticSource(Err("offline"))).await;
        assert_eq!(catalog, PlanCatalog::defaults());
    }

    #[tokio::test]
    async fn test_overrides_replace_by_id() {
        let catalog = PlanCatalog::resolve(&StaticSource(Ok(vec![row("pro", Some(250))]))).await;
        let pro = catalog.get("pro").unwrap();
        assert_eq!(pro.monthly_credits, 250);
        assert_eq!(pro.price_cents, 4900);
        assert_eq!(catalog.get("free").unwrap().monthly_credits, 5);
    }

    #[test]
    fn test_incomplete_unknown_plan_is_ignored() {
        let catalog = PlanCatalog::defaults().apply(vec![row("enterprise", Some(10))]);
        assert!(catalog.get("enterprise").is_none());
        assert_eq!(catalog.plans().len(), 4);
    }
}
