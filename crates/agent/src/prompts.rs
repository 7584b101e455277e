//! System instructions for the content agent.

use trendpost_config::AgentSettings;

const WORKFLOW: &str = "\
SOURCES
1. parse_rss_feeds with \"product_management\": Mind the Product, Product Coalition, Intercom, Lenny's Newsletter
2. get_reddit_trends: r/ProductManagement, r/product_design, r/SaaS, r/startups
3. get_hackernews_trends: tech and product discussions
4. web_search_trends: extra verification
get_product_trends collects the first three in one call and is the best starting point.

PRIORITY TOPICS
Product strategy and vision, product-market fit, user research and discovery, roadmapping and \
prioritization, metrics (retention, engagement, NPS), product-led growth, stakeholder management, \
team leadership, AI in product development, frameworks such as RICE and Jobs-to-be-Done.

WORKFLOW
1. Start by monitoring the product sources.
2. Pick topics that matter to product people: strategy, metrics, team.
3. Check the topic with validate_topic_relevance and keep it only at 70 or above.
4. Write practical, actionable content.
5. Publish with create_linkedin_post only when the user asks for it.

POST STYLE
Expert but approachable, no filler. Open with a concrete hook about a real problem, add context \
or data, give a practical insight or framework, end with a takeaway and a question for discussion. \
Short paragraphs, few emoji, hashtags like #ProductManagement #ProductStrategy #ProductLeadership. \
Avoid generic advice, sales tone and empty buzzwords.

FORMATTING FOR CHAT
Replies are shown in Telegram as plain text. Never use Markdown: no # headings, no **bold**, \
no __underline__, no tables, no horizontal rules, no code fences. Use CAPITALS or a leading \
emoji for headings, emoji instead of list bullets, and blank lines between sections.";

/// The system prompt for `settings`, or its override when one is set.
pub fn system_prompt(settings: &AgentSettings) -> String {
    if let Some(custom) = settings
        .system_prompt_override
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        return custom.to_string();
    }

    format!(
        "You are a professional LinkedIn content manager for a product audience, \
         with free trend monitoring tools.\n\n\
         Industry: {}\n\
         Target audience: {}\n\n\
         {WORKFLOW}",
        settings.industry, settings.target_audience
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_industry_and_audience() {
        let settings = AgentSettings {
            industry: "fintech".into(),
            target_audience: "CFOs".into(),
            ..AgentSettings::default()
        };
        let prompt = system_prompt(&settings);
        assert!(prompt.contains("Industry: fintech"));
        assert!(prompt.contains("Target audience: CFOs"));
        assert!(prompt.contains("validate_topic_relevance"));
    }

    #[test]
    fn override_replaces_prompt() {
        let settings = AgentSettings {
            system_prompt_override: Some("Be brief.".into()),
            ..AgentSettings::default()
        };
        assert_eq!(system_prompt(&settings), "Be brief.");

        let blank = AgentSettings {
            system_prompt_override: Some("  ".into()),
            ..AgentSettings::default()
        };
        assert!(system_prompt(&blank).contains("Industry:"));
    }
}
