// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use prism_core::AppConfig;

use crate::features::InputSource;
use crate::services::app_services::Destination;

#[derive(Debug, Parser)]
#[command(name = "prism")]
#[command(version)]
#[command(about = "Merge, split, reorder and compress PDFs on this device", long_about = None)]
pub struct Cli {
    /// Data directory holding the workspace and settings
    #[arg(long, global = true, env = "PRISM_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Combine whole files, in the order given
    Merge {
        /// Input PDFs (a path, or ws:<id> for a workspace file)
        #[arg(value_name = "INPUT", num_args = 2.., required = true)]
        inputs: Vec<InputSource>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Copy selected pages into a new document
    Extract {
        #[arg(value_name = "INPUT")]
        input: InputSource,

        /// Pages to keep, e.g. "1,3,7" or "2-4"
        #[arg(long, value_name = "PAGES")]
        pages: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Put every page in its own file, packed into one ZIP
    SplitAll {
        #[arg(value_name = "INPUT")]
        input: InputSource,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rearrange, drop, duplicate and rotate pages
    Reorder {
        #[arg(value_name = "INPUT")]
        input: InputSource,

        /// Further documents whose pages are appended
        #[arg(long = "add", value_name = "INPUT")]
        additional: Vec<InputSource>,

        /// New order of the first document's pages, e.g. "3,1,2,2"
        #[arg(long, value_name = "PAGES")]
        order: Option<String>,

        /// Turn the page at this position (after reordering) a quarter turn
        #[arg(long = "rotate", value_name = "POSITION")]
        rotate: Vec<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rewrite a document as small as possible
    Compress {
        #[arg(value_name = "INPUT")]
        input: InputSource,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show how many pages a document has
    Pages {
        #[arg(value_name = "INPUT")]
        input: InputSource,
    },

    /// Render one page as a PNG
    Preview {
        #[arg(value_name = "INPUT")]
        input: InputSource,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// 1.0 renders at 72 dpi
        #[arg(long, default_value_t = 1.0)]
        scale: f32,

        /// PNG file to write (default: page-<N>.png)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Manage stored files
    #[command(subcommand)]
    Workspace(WorkspaceCommand),

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceCommand {
    /// List stored files, newest first
    List,
    /// Store a file from disk
    Import {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Write a stored file to disk
    Export {
        #[arg(value_name = "ID")]
        id: String,
        /// Target file or directory
        #[arg(short, long, value_name = "PATH", default_value = ".")]
        output: PathBuf,
    },
    /// Remove a stored file
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the current settings as JSON
    Show,
    /// Print the settings file location
    Path,
    /// Restore the defaults
    Reset,
    /// Change one setting
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

/// Where a command's result goes.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Write the result to this file or directory
    #[arg(short, long, value_name = "PATH", conflicts_with = "save")]
    pub output: Option<PathBuf>,

    /// Save the result to the workspace instead
    #[arg(long)]
    pub save: bool,
}

impl OutputArgs {
    /// Without either flag the result lands in the current directory.
    pub fn destination(&self) -> Destination {
        match (&self.output, self.save) {
            (_, true) => Destination::Workspace,
            (Some(path), false) => Destination::Download(path.clone()),
            (None, false) => Destination::Download(PathBuf::from(".")),
        }
    }
}

/// Parse a page list such as `"1,3,7"`, `"2-4"` or `"3,1,2,2"` into 1-based
/// numbers, keeping the given order and repeats.
pub fn parse_page_list(text: &str) -> anyhow::Result<Vec<usize>> {
    let mut pages = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_page_number(start)?;
                let end = parse_page_number(end)?;
                if start > end {
                    bail!("page range {part} runs backwards");
                }
                pages.extend(start..=end);
            }
            None => pages.push(parse_page_number(part)?),
        }
    }
    if pages.is_empty() {
        bail!("no pages given");
    }
    Ok(pages)
}

fn parse_page_number(text: &str) -> anyhow::Result<usize> {
    let number: usize = text
        .trim()
        .parse()
        .with_context(|| format!("{text:?} is not a page number"))?;
    if number == 0 {
        bail!("page numbers start at 1");
    }
    Ok(number)
}

/// Change one setting by its command-line name.
pub fn apply_setting(config: &mut AppConfig, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "split-thumbnail-scale" => config.split_thumbnail_scale = parse_scale(value)?,
        "reorder-thumbnail-scale" => config.reorder_thumbnail_scale = parse_scale(value)?,
        "output-pdf-version" => config.output_pdf_version = value.to_string(),
        "compress-outputs" => {
            config.compress_outputs = value
                .parse()
                .with_context(|| format!("{value:?} is not true or false"))?
        }
        "merged-name" => config.names.merged = value.to_string(),
        "extracted-name" => config.names.extracted = value.to_string(),
        "organized-name" => config.names.organized = value.to_string(),
        "split-archive-name" => config.names.split_archive = value.to_string(),
        "optimized-prefix" => config.names.optimized_prefix = value.to_string(),
        other => bail!("unknown setting {other:?}"),
    }
    Ok(())
}

fn parse_scale(value: &str) -> anyhow::Result<f32> {
    let scale: f32 = value
        .parse()
        .with_context(|| format!("{value:?} is not a number"))?;
    if !(scale.is_finite() && scale > 0.0) {
        bail!("scale must be greater than zero");
    }
    Ok(scale)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn data_dir_flag_is_global() {
        let cli = Cli::try_parse_from(["prism", "pages", "a.pdf", "--data-dir", "/tmp/prism-data"]).expect("parse");
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/prism-data")));
    }

    #[test]
    fn page_lists_keep_order_and_repeats() {
        assert_eq!(parse_page_list("3,1,2,2").expect("list"), vec![3, 1, 2, 2]);
        assert_eq!(parse_page_list("1, 4-6").expect("range"), vec![1, 4, 5, 6]);
    }

    #[test]
    fn bad_page_lists_are_rejected() {
        assert!(parse_page_list("").is_err());
        assert!(parse_page_list("0").is_err());
        assert!(parse_page_list("5-2").is_err());
        assert!(parse_page_list("two").is_err());
    }

    #[test]
    fn merge_takes_workspace_inputs() {
        let cli = Cli::try_parse_from([
            "prism",
            "merge",
            "a.pdf",
            "ws:67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--save",
        ])
        .expect("parse");
        let Command::Merge { inputs, output } = cli.command else {
            panic!("expected merge");
        };
        assert!(matches!(inputs[1], InputSource::Workspace(_)));
        assert_eq!(output.destination(), Destination::Workspace);
    }

    #[test]
    fn merge_needs_two_inputs() {
        assert!(Cli::try_parse_from(["prism", "merge", "a.pdf"]).is_err());
    }

    #[test]
    fn output_and_save_conflict() {
        assert!(Cli::try_parse_from(["prism", "compress", "a.pdf", "-o", "x.pdf", "--save"]).is_err());
    }

    #[test]
    fn settings_are_validated() {
        let mut config = AppConfig::default();
        apply_setting(&mut config, "compress-outputs", "true").expect("bool");
        apply_setting(&mut config, "reorder-thumbnail-scale", "0.25").expect("scale");
        assert!(config.compress_outputs);
        assert_eq!(config.reorder_thumbnail_scale, 0.25);

        assert!(apply_setting(&mut config, "split-thumbnail-scale", "-1").is_err());
        assert!(apply_setting(&mut config, "colour", "blue").is_err());
    }
}
