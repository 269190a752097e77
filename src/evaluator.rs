use crate::{
    decision::{evaluate_details, Decision},
    resolver::CombinedInfoResolver,
    Result,
};

/// Evaluator answers whether a flag is enabled for a user.
///
/// In order to create an evaluator talking to the upstream services over HTTP, use
/// [`EvaluatorConfig::to_evaluator`](crate::EvaluatorConfig::to_evaluator).
pub struct Evaluator {
    resolver: CombinedInfoResolver,
}

impl Evaluator {
    pub fn new(resolver: CombinedInfoResolver) -> Evaluator {
        Evaluator { resolver }
    }

    /// Decide whether `flag_name` is enabled for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the flag definition cannot be resolved. Every other failure
    /// degrades to a boolean result.
    pub async fn decide(&self, user_id: &str, flag_name: &str) -> Result<bool> {
        Ok(self.decide_details(user_id, flag_name).await?.enabled)
    }

    /// Same as [`Evaluator::decide`] but also returns the reason for the decision.
    pub async fn decide_details(&self, user_id: &str, flag_name: &str) -> Result<Decision> {
        let info = self
            .resolver
            .get_combined_info(flag_name)
            .await
            .inspect_err(|err| {
                log::warn!(target: "toggle", flag_name, user_id; "unable to resolve flag: {}", err);
            })?;

        let decision = evaluate_details(&info, user_id);

        log::trace!(target: "toggle",
                    flag_name,
                    user_id,
                    enabled = decision.enabled;
                    "evaluated a flag");

        Ok(decision)
    }
}
