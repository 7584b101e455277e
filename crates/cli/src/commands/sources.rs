//! `trendpost sources`

use trendpost_channels::commands::sources_text;
use trendpost_config::AppConfig;

pub fn run(config: &AppConfig) {
    println!("{}", sources_text(&config.sources));
    println!();
    println!("Feeds:");
    for (category, feeds) in &config.sources.feeds {
        println!("  [{category}]");
        for url in feeds {
            println!("    {url}");
        }
    }
}
