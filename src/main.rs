// src/main.rs
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use smartdeck::catalog::{DESIGN_THEMES, default_styles};
use smartdeck::flow::collector::PROMPT_SUGGESTIONS;
use smartdeck::flow::{FlowEvent, ProgressPhase, Step};
use smartdeck::services::{HttpBackend, PresentationBackend};
use smartdeck::{Config, FlowController, InputMode, UploadedFile};

/// Turn documents or a prompt into a presentation.
#[derive(Parser)]
#[command(name = "smartdeck", version, about = "SmartDeck presentation client")]
struct Cli {
    /// Backend base URL (overrides SMARTDECK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory to save the presentation in (overrides SMARTDECK_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze documents, then generate a presentation from them
    Files {
        /// Documents to upload, in order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Style id; defaults to the analysis default
        #[arg(long)]
        style: Option<String>,
        /// Theme id
        #[arg(long)]
        theme: Option<String>,
        /// Agree to send the documents to the backend
        #[arg(long)]
        consent: bool,
    },

    /// Generate a presentation from a free-text prompt
    Prompt {
        /// Prompt text (10 to 5000 characters)
        text: String,
        /// Quick-start topics appended on their own lines
        #[arg(long = "topic", value_parser = PROMPT_SUGGESTIONS)]
        topics: Vec<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        theme: Option<String>,
        /// Agree to send the prompt to the backend
        #[arg(long)]
        consent: bool,
    },

    /// List the built-in presentation styles
    Styles,

    /// List the design themes
    Themes,

    /// Show backend health
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Styles => {
            for style in default_styles() {
                println!("{:<10} {:<22} {}", style.id, style.name, style.description);
            }
            Ok(())
        }
        Commands::Themes => {
            for theme in DESIGN_THEMES {
                println!(
                    "{:<19} {:<15} {:<20} {}",
                    theme.id,
                    theme.name,
                    theme.description,
                    theme.colors.join(" ")
                );
            }
            Ok(())
        }
        Commands::Status => {
            let backend = HttpBackend::from_config(&config)?;
            let status = backend.status().await?;
            println!(
                "{} {} (AI {})",
                status.status,
                status.version.as_deref().unwrap_or("unknown version"),
                if status.gemini_enabled { "enabled" } else { "in mock mode" }
            );
            if let Some(message) = status.message {
                println!("{}", message);
            }
            Ok(())
        }
        Commands::Files {
            paths,
            style,
            theme,
            consent,
        } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                let file = UploadedFile::from_path(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                if !file.matches_advisory_filter() {
                    warn!("{} is not a usual document type; sending anyway", file.name);
                }
                files.push(file);
            }

            run_session(&config, |controller| {
                Box::pin(async move {
                    controller.choose_mode(InputMode::File)?;
                    controller.add_files(files)?;
                    controller.set_consent(consent)?;
                    controller.analyze().await?;

                    if let (Some(session), Some(selection)) =
                        (controller.session(), controller.selection())
                    {
                        println!("\n{}\n", session.summary);
                        let recommended = selection.catalog().recommended();
                        for suggestion in selection.catalog().styles() {
                            let marker = match recommended {
                                Some(r) if r.id == suggestion.id => "*",
                                _ => " ",
                            };
                            let score = suggestion
                                .match_score
                                .map(|s| format!("{s:>4}"))
                                .unwrap_or_default();
                            println!(
                                "{marker} {:<10} {score} {}",
                                suggestion.id,
                                suggestion.reason.as_deref().unwrap_or(&suggestion.description)
                            );
                        }
                        if let Some(style) = recommended {
                            println!("\nRecommended: {} (--style {})", style.name, style.id);
                        }
                    }

                    apply_selection(controller, style.as_deref(), theme.as_deref())?;
                    controller.generate().await?;
                    Ok::<(), smartdeck::FlowError>(())
                })
            })
            .await
        }
        Commands::Prompt {
            text,
            topics,
            style,
            theme,
            consent,
        } => {
            run_session(&config, |controller| {
                Box::pin(async move {
                    controller.choose_mode(InputMode::Prompt)?;
                    controller.set_prompt(&text)?;
                    for topic in &topics {
                        controller.append_prompt_suggestion(topic)?;
                    }
                    controller.set_consent(consent)?;
                    apply_selection(controller, style.as_deref(), theme.as_deref())?;
                    controller.generate().await?;
                    Ok::<(), smartdeck::FlowError>(())
                })
            })
            .await
        }
    }
}

fn apply_selection(
    controller: &mut FlowController,
    style: Option<&str>,
    theme: Option<&str>,
) -> Result<(), smartdeck::FlowError> {
    if let Some(style) = style {
        controller.select_style(style)?;
    }
    if let Some(theme) = theme {
        controller.select_theme(theme)?;
    }
    Ok(())
}

type SessionFuture<'a> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), smartdeck::FlowError>> + 'a>>;

/// Runs one session against the configured backend, prints progress, and
/// saves the artifact when the flow reaches `done`.
async fn run_session<F>(config: &Config, drive: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a mut FlowController) -> SessionFuture<'a>,
{
    let backend: Arc<dyn PresentationBackend> = Arc::new(HttpBackend::from_config(config)?);
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx));

    let mut controller = FlowController::new(backend).with_events(tx);
    let outcome = drive(&mut controller).await;

    let saved = match (&outcome, controller.artifact()) {
        (Ok(()), Some((_, artifact))) => {
            let fallback = controller
                .mode()
                .unwrap_or(InputMode::File)
                .default_filename();
            Some(artifact.save_to(&config.output_dir, fallback).await?)
        }
        _ => None,
    };

    controller.reset();
    drop(controller);
    let _ = printer.await;

    match outcome {
        Err(err) if shown_as_notice(&err) => std::process::exit(1),
        other => other?,
    }
    if let Some(path) = saved {
        info!("Saved presentation to {}", path.display());
        println!("{}", path.display());
    }
    Ok(())
}

/// Whether `print_events` has already shown this failure.
fn shown_as_notice(err: &smartdeck::FlowError) -> bool {
    matches!(err, smartdeck::FlowError::Failed(_))
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<FlowEvent>) {
    let mut last_phase: Option<ProgressPhase> = None;
    let mut mode = InputMode::File;

    while let Some(event) = rx.recv().await {
        match event {
            FlowEvent::StepChanged(Step::Upload) => mode = InputMode::File,
            FlowEvent::StepChanged(Step::PromptInput) => mode = InputMode::Prompt,
            FlowEvent::StepChanged(Step::Analyzing) => {
                eprintln!("{}", smartdeck::flow::progress::waiting_message(mode, true));
            }
            FlowEvent::StepChanged(Step::Processing) => {
                last_phase = None;
                eprintln!("{}", smartdeck::flow::progress::waiting_message(mode, false));
            }
            FlowEvent::StepChanged(_) => {}
            FlowEvent::Progress { phase, .. } => {
                if last_phase != Some(phase) {
                    last_phase = Some(phase);
                    eprintln!("[{:>3}%] {}", phase.bar_width(), phase.label(mode));
                }
            }
            FlowEvent::Notice(notice) => eprintln!("error: {}", notice),
        }
    }
}
