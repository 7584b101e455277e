//! `trendpost validate <topic>`

use trendpost_config::AppConfig;
use trendpost_trends::RelevanceValidator;

use super::CommandResult;

pub fn run(config: &AppConfig, topic: &str, audience: Option<&str>) -> CommandResult {
    if topic.trim().is_empty() {
        return Err("Topic must not be empty".into());
    }
    let score = RelevanceValidator::from_settings(&config.agent).score(topic, audience);
    println!("{}", serde_json::to_string_pretty(&score)?);
    Ok(())
}
