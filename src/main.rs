use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use terms_lens::clipboard::ClipboardManager;
use terms_lens::config::{self, Config};
use terms_lens::extract::ExtractResponse;
use terms_lens::handoff::HandoffSlot;
use terms_lens::llm::LlmClient;
use terms_lens::presenter::{self, Filter};
use terms_lens::session::Session;
use terms_lens::{logger, markdown, pipeline, report};

#[derive(Parser, Debug)]
#[command(name = "terms_lens", version, about = "Summarize Terms & Conditions and flag risky clauses")]
struct Cli {
    /// Log to the terminal as well as the log file
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Terms & Conditions text found in a page or PDF
    Extract {
        /// URL or local file
        source: String,
        #[arg(long)]
        json: bool,
        /// Load the page in headless Chrome first
        #[arg(long)]
        render: bool,
    },
    /// Extract, analyse and print the summary and concerning clauses
    Analyze {
        source: String,
        /// all, a severity (high, medium, low) or a category
        #[arg(long, default_value = "all")]
        filter: Filter,
        #[arg(long)]
        json: bool,
        /// Write the plain-text report to this file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Copy the plain-text report to the clipboard
        #[arg(long)]
        copy: bool,
        /// Leave the result for `view`
        #[arg(long)]
        handoff: bool,
        #[arg(long)]
        render: bool,
    },
    /// Open the pending analysis as an HTML report
    View {
        #[arg(long)]
        no_open: bool,
    },
    /// Write a default config file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        log::error!("[Main] {:#}", e);
        eprintln!("[!] {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::try_load()?;
    config::ensure_directories(&config)?;
    logger::init(&config.data_dir(), cli.debug || config.general.debug)?;

    log::info!("[Main] terms_lens v{} started", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Extract {
            source,
            json,
            render,
        } => extract(&config, &source, json, render || config.extraction.render).await,
        Command::Analyze {
            source,
            filter,
            json,
            export,
            copy,
            handoff,
            render,
        } => {
            let opts = AnalyzeOptions {
                filter,
                json,
                export,
                copy,
                handoff,
                render: render || config.extraction.render,
            };
            analyze(&config, &source, opts).await
        }
        Command::View { no_open } => view(&config, no_open),
        Command::InitConfig { force } => init_config(force),
    }
}

async fn extract(config: &Config, source: &str, json: bool, render: bool) -> Result<()> {
    let client = LlmClient::http_client(config)?;
    let result = pipeline::extract(source, config, &client, render).await;

    if json {
        let response = ExtractResponse::from_result(result.map(|doc| doc.text));
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let doc = result?;
    match (&doc.text, doc.strategy) {
        (Some(text), strategy) => {
            if let Some(strategy) = strategy {
                eprintln!("[*] Found text via {}", strategy);
            }
            println!("{}", text);
            Ok(())
        }
        (None, _) => anyhow::bail!("{}", doc.kind.insufficient_text_message()),
    }
}

struct AnalyzeOptions {
    filter: Filter,
    json: bool,
    export: Option<PathBuf>,
    copy: bool,
    handoff: bool,
    render: bool,
}

async fn analyze(config: &Config, source: &str, opts: AnalyzeOptions) -> Result<()> {
    let client = LlmClient::http_client(config)?;

    eprintln!("[*] Analysing {}...", source);
    let result = pipeline::analyze(source, config, &client, opts.render).await?;

    let mut session = Session::new();
    session.replace(source, result);
    let current = session.current().context("No analysis available")?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&current.result)?);
    } else {
        println!("SUMMARY\n");
        println!("{}\n", markdown::to_plain_text(&current.result.summary));
        if let Some(mut view) = session.presenter() {
            view.set_filter(opts.filter);
            print!("{}", view.render_terminal());
        }
    }

    if opts.export.is_some() || opts.copy {
        let document =
            presenter::export_document(&current.result, Some(&current.source), Local::now());

        if let Some(path) = &opts.export {
            fs::write(path, &document)
                .with_context(|| format!("Failed to write export to {:?}", path))?;
            eprintln!("[*] Exported to {}", path.display());
        }

        if opts.copy {
            match ClipboardManager::write(&document) {
                Ok(()) => eprintln!("[*] Copied to clipboard"),
                Err(e) => {
                    log::warn!("[Main] Clipboard copy failed: {}", e);
                    eprintln!("[!] {}", e);
                }
            }
        }
    }

    if opts.handoff {
        let slot = HandoffSlot::new(&config.data_dir());
        let record = slot.send(&current.source, &current.result)?;
        eprintln!("[*] Stored for viewing ({}). Run `terms_lens view`.", record.id);
    }

    Ok(())
}

fn view(config: &Config, no_open: bool) -> Result<()> {
    let data_dir = config.data_dir();
    let slot = HandoffSlot::new(&data_dir);

    let record = match slot.peek()? {
        Some(record) => record,
        None => anyhow::bail!("No pending analysis. Run `terms_lens analyze <SOURCE> --handoff` first."),
    };

    let path = report::write_report(&data_dir, &record)?;
    eprintln!("[*] Report written to {}", path.display());

    if !no_open {
        open::that(&path).context("Failed to open report")?;
    }

    slot.clear()?;
    log::info!("[Main] Delivered record {}", record.id);
    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = config::get_config_path();
    if path.exists() && !force {
        anyhow::bail!("Config already exists at {:?} (use --force to overwrite)", path);
    }

    // Defaults only; an env-supplied key stays out of the file.
    Config::default().save()?;

    eprintln!("[*] Wrote {}", path.display());
    Ok(())
}
