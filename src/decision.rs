//! Turning a [`CombinedFlagInfo`] into an on/off decision for a user.
use crate::{
    models::{CombinedFlagInfo, Rule, RuleError},
    sharder::{bucket, bucket_key},
};

/// Why [`evaluate_details`] reached its decision.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionReason {
    /// The flag is globally disabled.
    FlagDisabled,
    /// The flag is enabled and there is no targeting rule, or the rule is disabled.
    NoActiveRule,
    /// The user's bucket is below the rollout threshold.
    InRollout { bucket: u32, threshold: f64 },
    /// The user's bucket is at or above the rollout threshold.
    OutOfRollout { bucket: u32, threshold: f64 },
    /// The targeting rule cannot be evaluated. The decision fails closed.
    InvalidRule(RuleError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub enabled: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn new(enabled: bool, reason: DecisionReason) -> Decision {
        Decision { enabled, reason }
    }
}

/// Decide whether the flag is enabled for `user_id`.
pub fn evaluate(info: &CombinedFlagInfo, user_id: &str) -> bool {
    evaluate_details(info, user_id).enabled
}

/// Same as [`evaluate`] but also returns the reason for the decision.
pub fn evaluate_details(info: &CombinedFlagInfo, user_id: &str) -> Decision {
    let flag = &info.flag;

    // Kill switch goes first, the rule is not even looked at.
    if !flag.is_enabled {
        return Decision::new(false, DecisionReason::FlagDisabled);
    }

    let rule = match &info.rule {
        Some(rule) if rule.is_enabled => rule,
        _ => return Decision::new(true, DecisionReason::NoActiveRule),
    };

    match rule.rules.parse() {
        Ok(Rule::Percentage { threshold }) => {
            let bucket = bucket(&bucket_key(user_id, &flag.name));
            if f64::from(bucket) < threshold {
                Decision::new(true, DecisionReason::InRollout { bucket, threshold })
            } else {
                Decision::new(false, DecisionReason::OutOfRollout { bucket, threshold })
            }
        }
        Err(err) => {
            log::warn!(target: "toggle",
                       flag_name:display = flag.name;
                       "targeting rule cannot be evaluated: {}", err);
            Decision::new(false, DecisionReason::InvalidRule(err))
        }
    }
}
