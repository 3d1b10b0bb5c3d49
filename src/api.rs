use crate::{
    blueprint::lamp_stack,
    check::{self, CheckReport, Drift},
    config::{self, Settings},
    materialize::{self, Materialized, Options, ScaffoldError, WriteStatus},
    preview::preview_as_tree,
};
use colored::Colorize;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LampgenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scaffold(#[from] materialize::ScaffoldError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Check(#[from] check::CheckError),
}

/// Writes the LAMP scaffold into `settings.base_dir`, printing one line per file.
///
/// # Errors
///
/// Returns a [`LampgenError`] if:
///
/// - A directory cannot be created or a file cannot be written. Unless `settings.atomic` is set,
///   files written before the failure stay on disk and are printed before returning.
pub fn generate(settings: &Settings) -> Result<Materialized, LampgenError> {
    let manifest = lamp_stack();

    log::debug!("generating scaffold in {}", settings.base_dir.display());

    let result = materialize::materialize_with(
        &settings.base_dir,
        &manifest,
        Options {
            atomic: settings.atomic,
        },
    );

    if let Err(ScaffoldError::Io { written, .. }) = &result {
        for path in written {
            println!("{:>10} {}", "written".green(), path.display());
        }
    }

    let materialized = result?;

    for file in &materialized.files {
        let status = match file.status {
            WriteStatus::Created => "create".green(),
            WriteStatus::Overwritten => "overwrite".yellow(),
        };

        println!("{:>10} {}", status, file.path.display());
    }

    println!(
        "\n{} {} file(s) into {}",
        "Done:".bold().bright_green(),
        materialized.files.len(),
        settings.base_dir.display()
    );

    Ok(materialized)
}

/// Shows the tree [`generate`] would produce without touching the disk.
pub fn preview(settings: &Settings) {
    preview_as_tree(&lamp_stack(), &settings.base_dir);
}

/// Prints every path of the scaffold in write order, with its size in bytes.
pub fn list_files() {
    for spec in lamp_stack().iter() {
        println!("{:>6} {}", spec.content.len(), spec.path);
    }
}

/// Compares `settings.base_dir` with the scaffold and prints one line per path.
///
/// # Errors
///
/// Returns a [`LampgenError`] if:
///
/// - A scaffold file exists but cannot be read.
/// - Any scaffold file is missing or differs from the built-in content.
pub fn check(settings: &Settings) -> Result<CheckReport, LampgenError> {
    let report = check::check(&settings.base_dir, &lamp_stack())?;

    for (path, drift) in &report.entries {
        let label = match drift {
            Drift::Unchanged => drift.label().green(),
            Drift::Modified => drift.label().yellow(),
            Drift::Missing => drift.label().red(),
            Drift::Extra => drift.label().dimmed(),
        };

        println!("{:>10} {}", label, path.display());
    }

    Ok(report.into_result()?)
}
