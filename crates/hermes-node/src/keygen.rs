//! hermes-keygen: generate a Dilithium2 keyfile.
//!
//! Prints the account id, the public key, and the hub address this key
//! would get as a hub operator.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use hermes_crypto::{hub_address, KeyPair};

#[derive(Parser, Debug)]
#[command(name = "hermes-keygen", version, about = "Generate a Hermes keyfile")]
struct Args {
    /// Where to write the keyfile (JSON).
    #[arg(long, default_value = "~/.hermes/key.json")]
    keyfile: PathBuf,

    /// Print the keypair JSON to stdout instead of writing a file.
    #[arg(long)]
    stdout: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let kp = KeyPair::generate();
    let json = serde_json::to_string_pretty(&kp)?;

    if args.stdout {
        println!("{json}");
        return Ok(());
    }

    let keyfile = expand_tilde(&args.keyfile);
    if keyfile.exists() {
        bail!(
            "Keyfile {} already exists. Delete it first to generate a new key.",
            keyfile.display()
        );
    }
    if let Some(parent) = keyfile.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&keyfile, &json)
        .with_context(|| format!("writing keyfile to {}", keyfile.display()))?;

    println!("Account ID:  {}", kp.account_id.to_b58());
    println!("Hub address: {}", hub_address(&kp.account_id).to_b58());
    println!("Public key:  {}", hex::encode(&kp.public_key.0));
    println!("Keyfile:     {}", keyfile.display());
    Ok(())
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
