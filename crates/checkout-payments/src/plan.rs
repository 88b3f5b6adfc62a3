//! Plan Catalog
//!
//! Maps the subscription tiers offered on the landing page to the
//! provider-side price identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PaymentError, Result};

/// Price used for the starter tier when none is configured.
pub const DEFAULT_STARTER_PRICE: &str = "price_1RQwvgQ7aI0fg0NlJQLVMok9";

/// Price used for the pro tier when none is configured.
pub const DEFAULT_PRO_PRICE: &str = "price_1RQwwfQ7aI0fg0NlHxqF0ZDy";

/// Subscription plan tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Pro,
}

impl Plan {
    pub const ALL: [Self; 2] = [Self::Starter, Self::Pro];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "pro",
        }
    }

    /// Name shown to customers
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Starter => "Starter",
            Self::Pro => "Pro",
        }
    }

    pub const fn tagline(self) -> &'static str {
        match self {
            Self::Starter => "Everything you need to get going.",
            Self::Pro => "For teams that need more room to grow.",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "starter" => Ok(Self::Starter),
            "pro" => Ok(Self::Pro),
            _ => Err(PaymentError::InvalidPlan(s.to_string())),
        }
    }
}

/// One row of the landing page
#[derive(Clone, Debug, Serialize)]
pub struct PlanListing {
    pub id: Plan,
    pub name: &'static str,
    pub tagline: &'static str,
}

/// Immutable plan to price mapping, built once at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanCatalog {
    starter_price: String,
    pro_price: String,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_STARTER_PRICE, DEFAULT_PRO_PRICE)
    }
}

impl PlanCatalog {
    pub fn new(starter_price: impl Into<String>, pro_price: impl Into<String>) -> Self {
        Self {
            starter_price: starter_price.into(),
            pro_price: pro_price.into(),
        }
    }

    pub fn price_id(&self, plan: Plan) -> &str {
        match plan {
            Plan::Starter => &self.starter_price,
            Plan::Pro => &self.pro_price,
        }
    }

    /// Resolve a plan name from the request to its price.
    pub fn resolve(&self, name: &str) -> Result<(Plan, &str)> {
        let plan: Plan = name.parse()?;
        Ok((plan, self.price_id(plan)))
    }

    pub fn listings(&self) -> Vec<PlanListing> {
        Plan::ALL
            .into_iter()
            .map(|plan| PlanListing {
                id: plan,
                name: plan.display_name(),
                tagline: plan.tagline(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parsing() {
        assert_eq!("starter".parse::<Plan>().unwrap(), Plan::Starter);
        assert_eq!(" PRO ".parse::<Plan>().unwrap(), Plan::Pro);
        assert!(matches!(
            "enterprise".parse::<Plan>(),
            Err(PaymentError::InvalidPlan(name)) if name == "enterprise"
        ));
        assert!("".parse::<Plan>().is_err());
    }

    #[test]
    fn test_default_catalog() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.price_id(Plan::Starter), DEFAULT_STARTER_PRICE);
        assert_eq!(catalog.price_id(Plan::Pro), DEFAULT_PRO_PRICE);
    }

    #[test]
    fn test_resolve() {
        let catalog = PlanCatalog::new("price_a", "price_b");
        assert_eq!(catalog.resolve("Pro").unwrap(), (Plan::Pro, "price_b"));
        assert!(catalog.resolve("free").is_err());
    }

    #[test]
    fn test_listings_cover_every_plan() {
        let listings = PlanCatalog::default().listings();
        assert_eq!(listings.len(), Plan::ALL.len());
        assert_eq!(listings[0].id, Plan::Starter);
    }
}
