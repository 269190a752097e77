use std::sync::Arc;

use toggle_evaluation::{cache::InMemoryCacheStore, EvaluatorConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure env_logger to see evaluation logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("toggle=debug")).init();

    let evaluator = EvaluatorConfig::from_env()?.to_evaluator(Arc::new(InMemoryCacheStore::new()))?;

    let mut args = std::env::args().skip(1);
    let user_id = args.next().unwrap_or_else(|| "test-user".to_owned());
    let flag_name = args.next().unwrap_or_else(|| "new-ui".to_owned());

    let decision = evaluator.decide_details(&user_id, &flag_name).await?;
    println!("{flag_name} for {user_id}: {} ({:?})", decision.enabled, decision.reason);

    // The second call is served from the cache.
    let enabled = evaluator.decide(&user_id, &flag_name).await?;
    println!("{flag_name} for {user_id} (cached): {enabled}");

    Ok(())
}
