use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use ss1_res::{write::write, LayeredProvider, Provider, ResourceReader};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
};
use tracing::info;

use super::create_output;

#[derive(Args)]
pub struct MergeArgs {
    /// The resource files to layer, lowest first. Blocks of later files replace those of earlier
    /// ones unless they start with a zero byte.
    #[arg(value_name = "FILE", required = true)]
    archives: Vec<PathBuf>,

    /// A target resource file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl MergeArgs {
    pub fn handle(&self) -> Result<()> {
        let mut layered = LayeredProvider::new();
        for path in &self.archives {
            info!("layering {}", path.display());
            let f = File::open(path)
                .into_diagnostic()
                .context(format!("path: {}", path.display()))?;
            layered.push_layer(
                ResourceReader::new(BufReader::new(f))
                    .context(format!("reading {}", path.display()))?,
            );
        }

        info!(
            "creating {} with {} resources",
            &self.output.display(),
            layered.ids().len()
        );
        let out = create_output(&self.output, self.overwrite)?;

        write(BufWriter::new(out), &mut layered).context("finalizing resource file")?;

        Ok(())
    }
}
