use std::fs;

use anyhow::{Context, Result};
use clap_markdown::help_markdown;
use regex::Regex;
use twbulk::cli::Cli;

const README: &str = "README.md";

fn main() -> Result<()> {
    let md = help_markdown::<Cli>();

    let readme = fs::read_to_string(README).context("README.md missing")?;
    let markers = Regex::new(r"(?s)(<!-- CLI-DOCS-START -->).*?(<!-- CLI-DOCS-END -->)")?;
    let new_readme = markers.replace(&readme, format!("$1\n\n{md}\n\n$2").as_str());

    fs::write(README, new_readme.as_ref()).context("Failed to write README.md")?;
    Ok(())
}
