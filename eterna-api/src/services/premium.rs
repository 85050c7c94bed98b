use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use eterna_shared::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Serialize, Clone, Copy)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price_cents: u32,
    pub currency: &'static str,
    pub duration_days: i64,
    pub popular: bool,
    pub features: &'static [&'static str],
}

pub const PLANS: [Plan; 3] = [
    Plan {
        id: "free",
        name: "Free",
        description: "Basic features to get you started",
        price_cents: 0,
        currency: "USD",
        duration_days: 0,
        popular: false,
        features: &[
            "Create profile",
            "Swipe through profiles",
            "Send 5 likes per day",
            "Basic matching",
            "Limited chat features",
        ],
    },
    Plan {
        id: "premium-monthly",
        name: "Premium Monthly",
        description: "Unlock all features with monthly subscription",
        price_cents: 999,
        currency: "USD",
        duration_days: 30,
        popular: true,
        features: &[
            "Unlimited likes and swipes",
            "Advanced filters",
            "Priority matching",
            "Read receipts",
            "Photo verification badge",
            "Boost your profile",
            "See who liked you",
            "Advanced analytics",
        ],
    },
    Plan {
        id: "premium-yearly",
        name: "Premium Yearly",
        description: "Best value with annual subscription",
        price_cents: 7999,
        currency: "USD",
        duration_days: 365,
        popular: false,
        features: &[
            "All monthly features",
            "Save 30% annually",
            "Premium customer support",
            "Early access to new features",
            "Profile analytics",
            "Advanced matching algorithm",
        ],
    },
];

/// A paid plan by id. The free plan cannot be subscribed to.
pub fn paid_plan(id: &str) -> AppResult<&'static Plan> {
    let plan = PLANS
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound, format!("unknown plan: {id}")))?;
    if plan.duration_days == 0 {
        return Err(AppError::new(ErrorCode::InvalidAction, "the free plan needs no subscription"));
    }
    Ok(plan)
}

/// New expiry after buying `plan`: time still left on an active
/// subscription is kept.
pub fn extend_premium(current: Option<DateTime<Utc>>, plan: &Plan, now: DateTime<Utc>) -> DateTime<Utc> {
    let start = current.filter(|until| *until > now).unwrap_or(now);
    start + Duration::days(plan.duration_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_pricing() {
        let monthly = paid_plan("premium-monthly").unwrap();
        assert_eq!(monthly.price_cents, 999);
        assert_eq!(monthly.duration_days, 30);
        assert_eq!(paid_plan("premium-yearly").unwrap().duration_days, 365);
    }

    #[test]
    fn free_and_unknown_plans_are_rejected() {
        assert_eq!(paid_plan("free").unwrap_err().code(), ErrorCode::InvalidAction);
        assert_eq!(paid_plan("gold").unwrap_err().code(), ErrorCode::PlanNotFound);
    }

    #[test]
    fn extension_starts_now_when_lapsed() {
        let now = Utc::now();
        let plan = paid_plan("premium-monthly").unwrap();
        assert_eq!(extend_premium(None, plan, now), now + Duration::days(30));
        assert_eq!(
            extend_premium(Some(now - Duration::days(3)), plan, now),
            now + Duration::days(30)
        );
    }

    #[test]
    fn extension_stacks_on_active_subscription() {
        let now = Utc::now();
        let plan = paid_plan("premium-yearly").unwrap();
        let active = now + Duration::days(10);
        assert_eq!(extend_premium(Some(active), plan, now), active + Duration::days(365));
    }
}
