//! Daily profit and drawdown analytics for the account dashboard
//!
//! Both figures are measured against the balance recorded at the daily
//! reference time (the `balanceat5am` setting):
//! daily_profit = balance − reference, drawdown_used = reference − balance.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

pub const BALANCE_REFERENCE_KEY: &str = "balanceat5am";
pub const MIN_BALANCE_KEY: &str = "minbalance";
pub const DRAWDOWN_LIMIT_KEY: &str = "drawdown";
pub const DAILY_PROFIT_TARGET_KEY: &str = "dailyprofittarget";

/// Thresholds read from the general settings bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskLimits {
    pub balance_at_reference: Decimal,
    pub min_balance: Decimal,
    pub drawdown_limit: Decimal,
    pub daily_profit_target: Decimal,
}

impl RiskLimits {
    /// Missing or unparsable settings count as zero
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Self {
        Self {
            balance_at_reference: setting_amount(settings, BALANCE_REFERENCE_KEY),
            min_balance: setting_amount(settings, MIN_BALANCE_KEY),
            drawdown_limit: setting_amount(settings, DRAWDOWN_LIMIT_KEY),
            daily_profit_target: setting_amount(settings, DAILY_PROFIT_TARGET_KEY),
        }
    }
}

fn setting_amount(settings: &BTreeMap<String, String>, key: &str) -> Decimal {
    let Some(raw) = settings.get(key) else {
        return Decimal::ZERO;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Decimal::ZERO;
    }
    match Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, value = raw, error = %e, "Setting is not a number, using 0");
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Reached,
    Remaining(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawdownStatus {
    Exceeded,
    Remaining(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceFloor {
    Below,
    Safe,
}

/// Derived dashboard figures for one account snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAnalysis {
    pub daily_profit: Decimal,
    pub drawdown_used: Decimal,
    pub target: TargetStatus,
    pub drawdown: DrawdownStatus,
    pub floor: BalanceFloor,
}

/// Compare the current balance against the configured limits
pub fn analyze(balance: Decimal, limits: &RiskLimits) -> RiskAnalysis {
    let daily_profit = balance - limits.balance_at_reference;
    let drawdown_used = limits.balance_at_reference - balance;

    let target = if daily_profit >= limits.daily_profit_target {
        TargetStatus::Reached
    } else {
        TargetStatus::Remaining(limits.daily_profit_target - daily_profit)
    };

    let drawdown = if drawdown_used >= limits.drawdown_limit {
        DrawdownStatus::Exceeded
    } else {
        DrawdownStatus::Remaining(limits.drawdown_limit - drawdown_used)
    };

    let floor = if balance < limits.min_balance {
        BalanceFloor::Below
    } else {
        BalanceFloor::Safe
    };

    RiskAnalysis {
        daily_profit,
        drawdown_used,
        target,
        drawdown,
        floor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limits() -> RiskLimits {
        RiskLimits {
            balance_at_reference: dec!(10000),
            min_balance: dec!(9000),
            drawdown_limit: dec!(500),
            daily_profit_target: dec!(200),
        }
    }

    #[test]
    fn test_limits_from_settings() {
        let settings: BTreeMap<String, String> = [
            ("balanceat5am", "10000"),
            ("minbalance", " 9000.50 "),
            ("drawdown", "not-a-number"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let parsed = RiskLimits::from_settings(&settings);
        assert_eq!(parsed.balance_at_reference, dec!(10000));
        assert_eq!(parsed.min_balance, dec!(9000.50));
        assert_eq!(parsed.drawdown_limit, Decimal::ZERO);
        assert_eq!(parsed.daily_profit_target, Decimal::ZERO);
    }

    #[test]
    fn test_profit_day() {
        let a = analyze(dec!(10250), &limits());
        assert_eq!(a.daily_profit, dec!(250));
        assert_eq!(a.drawdown_used, dec!(-250));
        assert_eq!(a.target, TargetStatus::Reached);
        assert_eq!(a.drawdown, DrawdownStatus::Remaining(dec!(750)));
        assert_eq!(a.floor, BalanceFloor::Safe);
    }

    #[test]
    fn test_target_remaining() {
        let a = analyze(dec!(10050.25), &limits());
        assert_eq!(a.target, TargetStatus::Remaining(dec!(149.75)));
    }

    #[test]
    fn test_target_hit_exactly() {
        let a = analyze(dec!(10200), &limits());
        assert_eq!(a.target, TargetStatus::Reached);
    }

    #[test]
    fn test_drawdown_exceeded_and_below_floor() {
        let a = analyze(dec!(8900), &limits());
        assert_eq!(a.daily_profit, dec!(-1100));
        assert_eq!(a.drawdown_used, dec!(1100));
        assert_eq!(a.drawdown, DrawdownStatus::Exceeded);
        assert_eq!(a.floor, BalanceFloor::Below);
    }

    #[test]
    fn test_unconfigured_limits() {
        // Nothing configured: every threshold is zero
        let a = analyze(dec!(100), &RiskLimits::default());
        assert_eq!(a.target, TargetStatus::Reached);
        assert_eq!(a.drawdown, DrawdownStatus::Remaining(dec!(100)));
        assert_eq!(a.floor, BalanceFloor::Safe);
    }
}
