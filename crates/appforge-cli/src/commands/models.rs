use anyhow::Result;
use appforge_interaction::{SUPPORTED_MODELS, default_model};

pub fn list() -> Result<()> {
    let default = default_model();
    for model in SUPPORTED_MODELS {
        let marker = if model.value == default.value { "*" } else { " " };
        let vision = if model.is_vision_enabled { "vision" } else { "" };
        println!("{} {:<40} {}", marker, model.value, vision);
    }
    println!("\n(* default)");
    Ok(())
}
