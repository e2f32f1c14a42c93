// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Prism — on-device PDF merge, split, reorder and workspace storage
//
// Entry point. Initialises logging and backend services, then runs one
// command.

mod cli;
mod features;
mod services;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use prism_core::error::PrismError;
use prism_core::notice_for;
use prism_core::types::FileId;
use prism_document::render::encode_png;
use prism_document::{PageRasterizer, default_rasterizer};

use cli::{Cli, Command, ConfigCommand, WorkspaceCommand, apply_setting, parse_page_list};
use features::compress::CompressSession;
use features::merge::MergeSession;
use features::reorder::ReorderSession;
use features::split::SplitSession;
use features::{load_input, workspace};
use services::app_services::{AppServices, Delivered, run_blocking};
use services::data_dir::data_dir;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Prism starting");

    let dir = data_dir(cli.data_dir.as_deref()).await;
    let services = match AppServices::init(dir.clone()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "persistent storage failed, using in-memory fallback");
            AppServices::fallback(dir).await
        }
    };

    match run(cli.command, services).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print an error the way the notification area would show it.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<PrismError>() {
        Some(prism) => {
            let notice = notice_for(prism);
            eprintln!("{}", notice.message);
            eprintln!("{}", notice.suggestion);
            tracing::debug!(error = %format!("{err:#}"), "command failed");
        }
        None => eprintln!("error: {err:#}"),
    }
}

fn print_delivered(delivered: &Delivered) {
    println!("{}", delivered.notice().message);
}

async fn run(command: Command, services: AppServices) -> anyhow::Result<()> {
    match command {
        Command::Merge { inputs, output } => {
            let mut session = MergeSession::new(services);
            for input in &inputs {
                session.add(input).await?;
            }
            print_delivered(&session.merge(&output.destination()).await?);
        }

        Command::Extract { input, pages, output } => {
            let wanted = parse_page_list(&pages)?;
            let mut session = SplitSession::new(services);
            let page_count = session.load(&input).await?;

            let mut indices: Vec<usize> = wanted.iter().map(|n| n - 1).collect();
            indices.sort_unstable();
            indices.dedup();
            if let Some(&last) = indices.last().filter(|&&i| i >= page_count) {
                return Err(PrismError::PageIndex {
                    index: last,
                    page_count,
                }
                .into());
            }
            for index in indices {
                session.toggle(index);
            }
            print_delivered(&session.extract_selected(&output.destination()).await?);
        }

        Command::SplitAll { input, output } => {
            let mut session = SplitSession::new(services);
            session.load(&input).await?;
            print_delivered(&session.split_all(&output.destination()).await?);
        }

        Command::Reorder {
            input,
            additional,
            order,
            rotate,
            output,
        } => {
            let mut session = ReorderSession::new(services);
            session.load(&input).await?;
            for extra in &additional {
                session.add_source(extra).await?;
            }
            if let Some(order) = order {
                session.apply_order(&parse_page_list(&order)?)?;
            }
            for position in rotate {
                let id = position
                    .checked_sub(1)
                    .and_then(|i| session.pages().as_slice().get(i))
                    .map(|page| page.id)
                    .with_context(|| format!("no page at position {position}"))?;
                session.rotate(id);
            }
            print_delivered(&session.save(&output.destination()).await?);
        }

        Command::Compress { input, output } => {
            let session = CompressSession::new(services);
            let (delivered, report) = session.compress(&input, &output.destination()).await?;
            print_delivered(&delivered);
            println!(
                "{} -> {} bytes ({}% smaller)",
                report.original_size, report.optimized_size, report.reduction_percent
            );
        }

        Command::Pages { input } => {
            let file = load_input(&services, &input).await?;
            println!("{}: {} pages", file.name, file.page_count);
        }

        Command::Preview {
            input,
            page,
            scale,
            output,
        } => {
            let rasterizer: Arc<dyn PageRasterizer> = default_rasterizer()
                .map(Arc::from)
                .ok_or(PrismError::RenderUnavailable)?;
            let file = load_input(&services, &input).await?;
            if page == 0 || page > file.page_count {
                return Err(PrismError::PageIndex {
                    index: page.saturating_sub(1),
                    page_count: file.page_count,
                }
                .into());
            }

            let bytes = Arc::clone(&file.bytes);
            let png = run_blocking(move || encode_png(&rasterizer.rasterize(&bytes, page, scale)?)).await?;
            let target = output.unwrap_or_else(|| format!("page-{page}.png").into());
            tokio::fs::write(&target, png)
                .await
                .with_context(|| format!("writing {}", target.display()))?;
            println!("Saved {}", target.display());
        }

        Command::Workspace(command) => run_workspace(command, &services).await?,

        Command::Config(command) => run_config(command, &services).await?,
    }
    Ok(())
}

async fn run_workspace(command: WorkspaceCommand, services: &AppServices) -> anyhow::Result<()> {
    match command {
        WorkspaceCommand::List => {
            let files = workspace::list(services).await?;
            if files.is_empty() {
                println!("The workspace is empty.");
            }
            for meta in files {
                let saved = meta.created_at.with_timezone(&chrono::Local);
                println!(
                    "{}  {:>10}  {}  {}",
                    meta.id,
                    meta.size,
                    saved.format("%Y-%m-%d %H:%M"),
                    meta.name
                );
            }
        }
        WorkspaceCommand::Import { path } => {
            let meta = workspace::import(services, &path).await?;
            println!("Stored {} as {}", meta.name, meta.id);
        }
        WorkspaceCommand::Export { id, output } => {
            let id = FileId::parse(&id)?;
            print_delivered(&workspace::export(services, id, &output).await?);
        }
        WorkspaceCommand::Delete { id } => {
            let id = FileId::parse(&id)?;
            workspace::delete(services, id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn run_config(command: ConfigCommand, services: &AppServices) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&services.config())?);
        }
        ConfigCommand::Path => println!("{}", services.config_path().display()),
        ConfigCommand::Reset => {
            services.save_config(&Default::default()).await?;
            println!("Settings restored to defaults");
        }
        ConfigCommand::Set { key, value } => {
            let mut config = services.config();
            apply_setting(&mut config, &key, &value)?;
            services
                .save_config(&config)
                .await
                .with_context(|| format!("saving {}", services.config_path().display()))?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}
