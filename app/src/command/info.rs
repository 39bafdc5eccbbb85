use banter_config::Config;

/// Strategy for displaying the resolved configuration with API keys masked.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== banter Configuration ===\n");

        println!("API Keys:");
        println!("  OpenAI: {}", mask_key(&config.providers.openai.api_key));
        println!("  Tavily: {}", mask_key(&config.providers.tavily.api_key));
        println!();

        println!("Generation:");
        println!("  Base URL: {}", config.providers.openai.base_url);
        println!("  Model: {}", config.providers.openai.model);
        println!();

        println!("Server:");
        println!("  Port: {}", config.server.port);
        println!("  Max Workers: {}", config.server.max_workers);
        println!();

        println!("Conversation:");
        println!("  Memory Window: {} pairs", config.memory.window_pairs);
        println!("  Web Search: {}", config.conversation.web_search);
        println!("  Search Results: {}", config.conversation.search_results);
        match &config.conversation.system_prompt {
            Some(prompt) => println!("  System Prompt: {}", truncate(prompt, 60)),
            None => println!("  System Prompt: (built-in)"),
        }

        Ok(())
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
