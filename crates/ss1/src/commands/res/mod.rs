use miette::{Context, IntoDiagnostic, Result};
use std::{fs::File, path::Path};

pub mod extract;
pub mod list;
pub mod merge;

#[derive(clap::Subcommand)]
pub enum ResCommands {
    /// Extract the blocks of a resource file into a directory
    Extract(extract::ExtractArgs),
    /// List the resources of a resource file
    List(list::ListArgs),
    /// Layer several resource files into a new one
    Merge(merge::MergeArgs),
}

impl ResCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            ResCommands::Extract(extract) => extract.handle(),
            ResCommands::List(list) => list.handle(),
            ResCommands::Merge(merge) => merge.handle(),
        }
    }
}

/// Creates the output file, refusing to replace an existing one unless asked to
fn create_output(path: &Path, overwrite: bool) -> Result<File> {
    if overwrite {
        File::create(path)
    } else {
        File::create_new(path)
    }
    .into_diagnostic()
    .context(format!("creating {}", path.display()))
}
