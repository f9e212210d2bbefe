use clap::Args;
use itertools::Itertools;
use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use ss1_res::ResourceReader;
use std::{fs::File, io::BufReader, path::PathBuf};

#[derive(Args)]
pub struct ListArgs {
    /// An input resource file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let mut res = ResourceReader::new(BufReader::new(f))?;

        println!("{} resources", res.len().bold());
        for id in res.ids() {
            let Some(entry) = res.entry(id).copied() else {
                continue;
            };
            let resource = res
                .resource(id)
                .context(format!("decoding resource {}", id))?;

            let flags = [
                resource.compound.then_some("compound"),
                resource.compressed.then_some("compressed"),
            ]
            .into_iter()
            .flatten()
            .join(", ");

            println!(
                "{} type {} {:>8} bytes ({:>8} stored) {:>4} blocks {}",
                id.cyan(),
                resource.content_type,
                entry.unpacked_length,
                entry.packed_length,
                resource.block_count(),
                flags.dimmed()
            );
        }

        Ok(())
    }
}
