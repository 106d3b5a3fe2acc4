//! `errwire schemas` — list the kinds a catalogue declares.

use std::path::Path;

use anyhow::{Context, Result};
use errwire_core::schema::load_catalogue_file;

pub fn run(file: &Path) -> Result<()> {
    let definitions = load_catalogue_file(file)
        .with_context(|| format!("loading catalogue {}", file.display()))?;

    println!("{} kind(s) in {}", definitions.len(), file.display());
    for def in &definitions {
        match def.parent() {
            Some(parent) => println!("\n  {}  (derives {})", def.kind(), parent.kind()),
            None => println!("\n  {}", def.kind()),
        }
        for (key, default) in def.fields() {
            let marker = if key.is_sensitive() { "  [sensitive]" } else { "" };
            println!("    {:<16} {:<24} default {:?}{marker}", key.name(), key.type_name(), default);
        }
    }
    Ok(())
}
