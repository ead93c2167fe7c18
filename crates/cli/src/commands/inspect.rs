//! The `inspect` subcommand: dump a module fixture's symbols, reference
//! tables, and (optionally) its decoded hidden strings.

use clap::Args;
use std::error::Error;
use std::fs;
use umbra_core::model::Module;
use umbra_transform::strings::decode_hidden;

/// Arguments for the `inspect` subcommand.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Module fixture file (JSON).
    pub module: String,
    /// Decode and list the module's hidden strings.
    #[arg(long)]
    strings: bool,
}

impl super::Command for InspectArgs {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        let text = fs::read_to_string(&self.module)?;
        let module: Module = serde_json::from_str(&text)?;

        println!("module {}", module.name);
        println!(
            "  {} types, {} resources, {} type refs ({} unresolved), {} member refs ({} unresolved)",
            module.types.len(),
            module.resources.len(),
            module.type_refs.len(),
            module.unresolved_type_refs.len(),
            module.member_refs.len(),
            module.unresolved_member_refs.len(),
        );

        for ty in &module.types {
            let fullname = if ty.namespace.is_empty() {
                ty.name.clone()
            } else {
                format!("{}.{}", ty.namespace, ty.name)
            };
            println!(
                "  type {fullname}: {} fields, {} methods, {} properties, {} events",
                ty.fields.len(),
                ty.methods.len(),
                ty.properties.len(),
                ty.events.len()
            );
        }

        if self.strings {
            match &module.hidden_strings {
                Some(hidden) => {
                    println!(
                        "  hidden strings: {} entries, blob {} bytes ({}…)",
                        hidden.entries.len(),
                        hidden.blob.len(),
                        hex::encode(&hidden.blob[..hidden.blob.len().min(16)])
                    );
                    for entry in &hidden.entries {
                        let value = decode_hidden(&hidden.blob, entry.offset, entry.len)?;
                        println!("    [{}] {}+{} {:?}", entry.index, entry.offset, entry.len, value);
                    }
                }
                None => println!("  no hidden strings"),
            }
        }
        Ok(())
    }
}
