use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use ss1_res::ResourceReader;
use std::{fs::File, io::BufReader, path::PathBuf};
use tracing::info;

use super::create_output;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input resource file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory. Every resource gets a subdirectory named by its identifier, holding one
    /// file per block.
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let mut res = ResourceReader::new(BufReader::new(f))?;

        for id in res.ids() {
            let resource = res
                .resource(id)
                .context(format!("decoding resource {}", id))?;

            let dir = self.directory.join(format!("{:04X}", id.0));
            std::fs::create_dir_all(&dir)
                .into_diagnostic()
                .context(format!("creating {}", dir.display()))?;

            for index in 0..resource.block_count() {
                let p = dir.join(format!("{}.bin", index));
                info!("writing {}", p.display());

                let mut out = create_output(&p, self.overwrite)?;
                std::io::copy(&mut resource.block(index)?, &mut out).into_diagnostic()?;
            }
        }
        Ok(())
    }
}
