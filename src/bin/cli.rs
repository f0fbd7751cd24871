//! form-autofill command line
//!
//! Works on saved HTML files (`extract`, `fields`, `request`, `inject`) or
//! drives a Chrome instance end to end (`fill`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use form_autofill::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use form_autofill::dom::{extract_fields, ExtractOptions};
use form_autofill::inject::inject_into;
use form_autofill::mapping::{
    parse_mapping_response, CannedMapper, FieldMapper, MapperConfig, MappingRequest, MarkdownJsonSanitizer,
    OpenAiMapper,
};
use form_autofill::page::{ExtractionSession, Page};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "form-autofill")]
#[command(version)]
#[command(about = "Extract web forms and fill them from natural-language instructions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the structural snapshot of an HTML file
    Extract {
        /// HTML file to read
        file: PathBuf,

        /// URL to report in the snapshot (default: file:// URL of the input)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Maximum nesting depth below <body>
        #[arg(long, default_value_t = form_autofill::dom::MAX_DEPTH)]
        max_depth: usize,

        /// Omit rawOuterHTML from the records
        #[arg(long)]
        no_raw_html: bool,
    },

    /// Print the flat field listing of an HTML file
    Fields {
        file: PathBuf,
    },

    /// Print the mapping request that would be sent to the model
    Request {
        file: PathBuf,

        /// What to fill in, in plain words
        #[arg(long, short = 'i')]
        instructions: String,

        /// Send the flat field listing instead of the element tree
        #[arg(long)]
        flat: bool,
    },

    /// Apply a saved mapping response to an HTML file
    Inject {
        file: PathBuf,

        /// JSON file holding the mapping response or a bare field array
        #[arg(long, value_name = "FILE")]
        fields: PathBuf,

        /// Write the filled page here
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Open a URL in Chrome, map the instructions onto its form and fill it
    Fill {
        #[arg(long)]
        url: String,

        #[arg(long, short = 'i')]
        instructions: String,

        /// Launch browser in headed mode (default: headless)
        #[arg(long, short = 'H')]
        headed: bool,

        /// Attach to a running browser instead of launching one
        #[arg(long, value_name = "URL")]
        ws_endpoint: Option<String>,

        /// Path to custom browser executable
        #[arg(long, value_name = "PATH")]
        executable_path: Option<PathBuf>,

        /// Replay a saved model answer instead of calling the endpoint
        #[arg(long, value_name = "FILE")]
        response_file: Option<PathBuf>,

        /// OpenAI-compatible endpoint (default: $OPENAI_BASE_URL or api.openai.com)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Model name (default: $FORM_AUTOFILL_MODEL or gpt-4o-mini)
        #[arg(long)]
        model: Option<String>,
    },
}

async fn load_page(file: &Path, url: Option<String>) -> Result<Page> {
    let html = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let url = url.unwrap_or_else(|| format!("file://{}", file.display()));
    Ok(Page::from_html(url, &html))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file,
            url,
            max_depth,
            no_raw_html,
        } => {
            let page = load_page(&file, url).await?;
            let options = ExtractOptions::default()
                .max_depth(max_depth)
                .include_raw_html(!no_raw_html);
            let mut session = ExtractionSession::with_options(options);
            print_json(&session.run(&page))?;
        }
        Command::Fields { file } => {
            let html = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            print_json(&extract_fields(&html))?;
        }
        Command::Request {
            file,
            instructions,
            flat,
        } => {
            let page = load_page(&file, None).await?;
            let request = if flat {
                MappingRequest::from_fields(form_autofill::dom::extract_fields_from(page.document()), instructions)?
            } else {
                let snapshot = ExtractionSession::new().extract(&page)?;
                MappingRequest::from_snapshot(&snapshot, instructions)?
            };
            println!("{}", request.to_prompt()?);
        }
        Command::Inject { file, fields, output } => {
            let mut page = load_page(&file, None).await?;
            let raw = tokio::fs::read_to_string(&fields)
                .await
                .with_context(|| format!("Failed to read {}", fields.display()))?;
            let response = parse_mapping_response(&raw, &MarkdownJsonSanitizer)?;

            let outcome = inject_into(Some(&mut page), &response.fields)?;
            eprintln!("{}", outcome.summary());
            print_json(&outcome)?;

            if let Some(output) = output {
                tokio::fs::write(&output, page.to_html())
                    .await
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                eprintln!("Filled page written to {}", output.display());
            }
        }
        Command::Fill {
            url,
            instructions,
            headed,
            ws_endpoint,
            executable_path,
            response_file,
            base_url,
            model,
        } => {
            let browser = match ws_endpoint {
                Some(ws_url) => BrowserSession::connect(ConnectionOptions::new(ws_url))?,
                None => {
                    let mut options = LaunchOptions::new().headless(!headed);
                    if let Some(path) = executable_path {
                        options = options.chrome_path(path);
                    }
                    BrowserSession::launch(options)?
                }
            };
            browser.navigate(&url)?;
            let mut page = browser.capture_page()?;

            let snapshot = ExtractionSession::new().extract(&page)?;
            let request = MappingRequest::from_snapshot(&snapshot, instructions)?;

            let mapper: Box<dyn FieldMapper> = match response_file {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    Box::new(CannedMapper::new(raw))
                }
                None => Box::new(OpenAiMapper::new(MapperConfig {
                    base_url,
                    model,
                    ..Default::default()
                })?),
            };
            let response = mapper.map_fields(&request).await?;

            let outcome = inject_into(Some(&mut page), &response.fields)?;
            let mutations = page.document_mut().take_mutations();
            let applied = browser.apply_mutations(page.document(), &mutations)?;

            eprintln!("{}", outcome.summary());
            eprintln!("Applied {} of {} changes to the live page", applied, mutations.len());
            for field in response.waiting() {
                eprintln!("Waiting for user input: {}", field.identifier());
            }
            print_json(&outcome)?;
        }
    }

    Ok(())
}
