//! Generate command handler

use anyhow::{Context, Result};

use relayctl::infrastructure::generate_family_key;
use relayctl::presentation::cli::GenerateArgs;

use super::{load_config, GlobalArgs};

/// Execute the generate command
pub fn cmd_generate(globals: &GlobalArgs<'_>, args: &GenerateArgs) -> Result<()> {
    let config = load_config(globals)?;
    let generated = generate_family_key(&config.keygen.tor, &args.output_dir, &args.name)
        .with_context(|| format!("Failed to generate family key '{}'", args.name))?;

    let family_id = generated.family_id.as_ref().map(|id| id.to_string());
    if globals.json {
        let output = serde_json::json!({
            "event": "generated",
            "secret": generated.secret,
            "public": generated.public,
            "family_id": family_id,
        });
        println!("{}", output);
        return Ok(());
    }

    println!("Secret key: {}", generated.secret.display());
    println!("Public id:  {}", generated.public.display());
    match family_id {
        Some(id) => println!("FamilyId:   {}", id),
        None => println!("FamilyId:   (not found in {})", generated.public.display()),
    }
    println!();
    println!("Keep the secret key offline; deploy it with:");
    println!(
        "  relayctl deploy --key {}",
        shell_words::quote(&generated.secret.display().to_string())
    );
    Ok(())
}
