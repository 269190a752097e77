//! Flag and targeting rule definitions as served by upstream services and stored in the cache.
use serde::{Deserialize, Deserializer, Serialize};

/// Rule type of a percentage rollout. The only rule type supported at the moment.
pub const PERCENTAGE_RULE: &str = "PERCENTAGE";

/// A named boolean feature switch. Response format of the flag service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    /// Global state of the flag. When `false`, the feature is off for everybody regardless of
    /// targeting.
    #[serde(alias = "isEnabled")]
    pub is_enabled: bool,
}

/// Optional per-flag targeting configuration. Response format of the targeting service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingRule {
    #[serde(alias = "isEnabled")]
    pub is_enabled: bool,
    /// A missing or `null` body decodes as an empty [`RuleBody`], which fails to parse, so an
    /// enabled rule with a broken body fails closed instead of being dropped.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: RuleBody,
}

/// Rule body as it travels on the wire.
///
/// `value` is kept untyped so that rule kinds this crate does not know about survive a trip
/// through the cache unchanged. Use [`RuleBody::parse`] to get a typed [`Rule`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBody {
    #[serde(rename = "type", default)]
    pub rule_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A parsed targeting rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Enable the feature for users whose bucket is strictly below `threshold`.
    Percentage { threshold: f64 },
}

/// Targeting rule configuration that cannot be evaluated.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// Rule type is unknown to this version of the crate.
    #[error("unsupported rule type: {0}")]
    UnsupportedType(String),

    /// Rule value does not have the shape required by its type.
    #[error("invalid rule value: {0}")]
    InvalidValue(serde_json::Value),
}

impl RuleBody {
    /// Build a percentage rollout rule body.
    pub fn percentage(threshold: impl Into<serde_json::Value>) -> RuleBody {
        RuleBody {
            rule_type: PERCENTAGE_RULE.to_owned(),
            value: threshold.into(),
        }
    }

    /// Parse the untyped wire representation into a [`Rule`].
    pub fn parse(&self) -> Result<Rule, RuleError> {
        match self.rule_type.as_str() {
            PERCENTAGE_RULE => self
                .value
                .as_f64()
                .map(|threshold| Rule::Percentage { threshold })
                .ok_or_else(|| RuleError::InvalidValue(self.value.clone())),
            other => Err(RuleError::UnsupportedType(other.to_owned())),
        }
    }
}

/// Flag definition combined with its targeting rule. This is the unit stored in the cache.
///
/// A missing `rule` is serialized as `null` and stays distinguishable from a rule that is present
/// but disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedFlagInfo {
    pub flag: Flag,
    #[serde(default)]
    pub rule: Option<TargetingRule>,
}
