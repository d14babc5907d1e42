use anyhow::Result;
use appforge_infrastructure::{ConfigService, SecretService};

pub fn set_key(api_key: &str) -> Result<()> {
    SecretService::new().store_api_key(api_key)?;
    println!("✅ API key stored");
    Ok(())
}

pub fn show() -> Result<()> {
    let config = ConfigService::new().get_config();
    let has_key = SecretService::new().api_key().is_some();
    println!("base_url:        {}", config.base_url);
    println!("default_model:   {}", config.default_model);
    println!("free_turn_limit: {}", config.free_turn_limit);
    println!("credential:      {}", if has_key { "stored" } else { "none" });
    Ok(())
}
