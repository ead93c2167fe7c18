//! The `obfuscate` subcommand: load a project, run the pipeline, save the
//! rewritten modules and the mapping report, and print a short summary.

use clap::Args;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use umbra_analysis::collect_metrics;
use umbra_core::project::Project;
use umbra_transform::{report, Obfuscator};

/// Arguments for the `obfuscate` subcommand.
#[derive(Debug, Args)]
pub struct ObfuscateArgs {
    /// Project description file (JSON).
    pub project: String,
    /// Print the mapping to stdout instead of writing any files.
    #[arg(long)]
    dry_run: bool,
}

impl super::Command for ObfuscateArgs {
    fn execute(self) -> Result<(), Box<dyn Error>> {
        let project = Project::from_file(Path::new(&self.project))?;
        let mut obfuscator = Obfuscator::from_project(project)?;
        obfuscator.run();

        let metrics = collect_metrics(obfuscator.map(), &obfuscator.set);

        if self.dry_run {
            let mut out = Vec::new();
            report::write_text_map(obfuscator.map(), &mut out)?;
            print!("{}", String::from_utf8_lossy(&out));
        } else {
            save_modules(&obfuscator)?;
            save_mapping(&obfuscator)?;
        }

        println!("✅ Obfuscation complete");
        println!(
            "📦 {} modules: {} types, {} methods, {} fields renamed",
            metrics.modules, metrics.types_renamed, metrics.methods_renamed, metrics.fields_renamed
        );
        if metrics.hidden_strings > 0 {
            println!("🔒 {} strings hidden", metrics.hidden_strings);
        }
        Ok(())
    }
}

/// Writes every transformed module back out under the project's out path.
fn save_modules(obfuscator: &Obfuscator) -> Result<(), Box<dyn Error>> {
    let out_path = PathBuf::from(&obfuscator.project.settings.out_path);
    fs::create_dir_all(&out_path)?;
    for module in &obfuscator.set.modules {
        if module.external {
            continue;
        }
        let file_name = obfuscator
            .project
            .modules
            .iter()
            .find(|spec| spec.name == module.name)
            .filter(|spec| !spec.file.is_empty())
            .map_or_else(
                || format!("{}.json", module.name),
                |spec| {
                    Path::new(&spec.file)
                        .file_name()
                        .map_or_else(|| format!("{}.json", module.name), |f| {
                            f.to_string_lossy().into_owned()
                        })
                },
            );
        let target = out_path.join(file_name);
        fs::write(&target, serde_json::to_string_pretty(module)?)?;
        tracing::info!("saved {}", target.display());
    }
    Ok(())
}

/// Writes the mapping report, honoring the log-file override and the
/// structured-format toggle.
fn save_mapping(obfuscator: &Obfuscator) -> Result<(), Box<dyn Error>> {
    let settings = &obfuscator.project.settings;
    let file_name = if settings.json_mapping {
        "Mapping.json"
    } else {
        "Mapping.txt"
    };
    let target = if settings.log_file.is_empty() {
        PathBuf::from(&settings.out_path).join(file_name)
    } else {
        PathBuf::from(&settings.log_file)
    };
    if let Some(dir) = target.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    if settings.json_mapping {
        let value = report::json_map(obfuscator.map());
        fs::write(&target, serde_json::to_string_pretty(&value)?)?;
    } else {
        let mut out = Vec::new();
        report::write_text_map(obfuscator.map(), &mut out)?;
        fs::write(&target, out)?;
    }
    tracing::info!("saved {}", target.display());
    Ok(())
}
