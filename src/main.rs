use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncReadExt;

use reelscribe::batch::{self, ProfileTranscriber, RunOptions};
use reelscribe::cli::{render_preview, Cli, Commands, Palette};
use reelscribe::config::Config;
use reelscribe::media::supported_platforms;
use reelscribe::request::{handle_request, TranscriptionRequest, TranscriptionResponse};
use reelscribe::selection::SelectionOptions;
use reelscribe::utils::{self, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the JSON response in handle mode
    if matches!(cli.command, Commands::Handle { .. }) {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let quiet = cli.quiet;
    let palette = Palette::detect(quiet);

    let config = Config::load(cli.config.as_deref()).await?;

    // Check for required external tools (non-fatal)
    if cli.command.uses_media_tools() {
        let missing_deps = utils::check_dependencies(&config.required_tools()).await;
        if !missing_deps.is_empty() {
            eprintln!("{}", palette.warning.apply_to("⚠️  Dependency check warnings:"));
            for dep in missing_deps {
                eprintln!("   • {}", dep);
            }
            eprintln!("   (Continuing anyway - tools may be available)");
        }
    }

    match cli.command {
        Commands::Transcribe {
            csv_file,
            top,
            sort,
            profile,
            output,
            no_filter_pinned,
            preview,
        } => {
            let selection = SelectionOptions {
                top_count: top.unwrap_or(config.app.default_top_count),
                sort_by: sort,
                filter_pinned: !no_filter_pinned,
            };

            if preview {
                let posts = batch::preview(&csv_file, &selection);
                if posts.is_empty() {
                    println!("{}", palette.warning.apply_to("No video posts found"));
                } else {
                    print!("{}", render_preview(&posts, sort, &palette));
                }
                return Ok(());
            }

            let output_dir = output.unwrap_or_else(|| config.app.output_dir.clone());
            let transcriber = ProfileTranscriber::new(&config, &output_dir, !quiet)?;

            let options = RunOptions {
                csv_file,
                selection,
                profile_name: profile,
                quick: false,
            };

            match transcriber.process_csv_file(&options).await? {
                Some(path) => println!(
                    "{} {}",
                    palette.success.apply_to("Report saved to:"),
                    path.display()
                ),
                None => println!(
                    "{}",
                    palette.warning.apply_to("No transcriptions were created")
                ),
            }
        }
        Commands::Quick { url, profile } => {
            tracing::info!("Quick transcription for URL: {}", url);

            let transcriber =
                ProfileTranscriber::new(&config, &config.app.request_output_dir, !quiet)?;

            match transcriber.transcribe_single(&url, &profile).await? {
                Some(path) => println!(
                    "{} {}",
                    palette.success.apply_to("Transcription saved to:"),
                    path.display()
                ),
                None => anyhow::bail!("No transcriptions were created for {}", url),
            }
        }
        Commands::Handle { input } => {
            let body = match input {
                Some(path) => fs_err::read_to_string(&path)?,
                None => {
                    let mut body = String::new();
                    tokio::io::stdin().read_to_string(&mut body).await?;
                    body
                }
            };

            let response = match TranscriptionRequest::from_json(&body) {
                Ok(request) => {
                    handle_request(&request, || {
                        ProfileTranscriber::new(&config, &config.app.request_output_dir, false)
                    })
                    .await
                }
                Err(e) => TranscriptionResponse::failure(format!("{:#}", e)),
            };

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                println!("Configuration file: {}", path.display());
                println!("Run with --show to print the current settings");
            }
        }
        Commands::Platforms => {
            println!("{}", palette.heading.apply_to("Supported platforms:"));
            for platform in supported_platforms() {
                println!("  • {}", platform);
            }
        }
    }

    Ok(())
}
