use clap::Subcommand;
use std::error::Error;

mod inspect;
mod obfuscate;

/// Common behavior for all subcommands.
pub trait Command {
    fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Run the full rename and string-hiding pipeline over a project.
    Obfuscate(obfuscate::ObfuscateArgs),
    /// Dump the symbols, references, and hidden strings of a module fixture.
    Inspect(inspect::InspectArgs),
}

impl Cmd {
    pub fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Self::Obfuscate(args) => args.execute(),
            Self::Inspect(args) => args.execute(),
        }
    }
}
