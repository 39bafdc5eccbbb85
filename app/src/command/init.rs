use banter_config::Config;

/// Strategy for writing the template configuration to `~/banter/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::create_config()?;

        println!("✅ Created config file at: {}", path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your OpenAI and Tavily API keys");
        println!("   2. Run 'banter serve' to start the server");
        println!("   3. Run 'banter chat' in another terminal to talk to it");
        println!();
        println!("🔧 Every setting can be overridden by an environment variable,");
        println!("   e.g. OPENAI_API_KEY, TAVILY_API_KEY, BANTER_PORT, BANTER_WEB_SEARCH.");
        println!();
        Ok(())
    }
}
