//! CLI for remixviz - remix an image with a text prompt.

use clap::{Args, Parser, Subcommand, ValueEnum};
use remixviz::image::AspectRatio;
use remixviz::input::{ClipboardItem, ImageFile, InputCoordinator, StalePolicy};
use remixviz::session::Session;
use remixviz::{GenerationTrigger, HttpImageGenerator, ImageGenerator, TriggerOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "remixviz")]
#[command(about = "Remix an image with a text prompt via a hosted image-generation API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Generation endpoint (defaults to $REMIXVIZ_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Fetch URL inputs and send them inline instead of passing the URL
    #[arg(long, global = true)]
    inline_urls: bool,

    /// Aspect ratio of the generated image
    #[arg(long, global = true, value_enum)]
    aspect_ratio: Option<AspectRatioArg>,

    /// Ignore file reads that finish after a newer input
    #[arg(long, global = true)]
    reject_stale: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate once from a single input and prompt
    Generate(GenerateArgs),

    /// Interactive session reading commands from stdin
    Session,

    /// Check that the generation endpoint is reachable and accepts the key
    Check,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the change
    prompt: String,

    #[command(flatten)]
    input: InputArgs,

    /// Download the generated image to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Pick an image file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Drop an image file (must have an image extension)
    #[arg(long)]
    drop: Option<PathBuf>,

    /// Type an image URL
    #[arg(short, long)]
    url: Option<String>,

    /// Paste clipboard text
    #[arg(long)]
    paste_text: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    StandardPortrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env("REMIXVIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = HttpImageGenerator::builder();
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    let generator = Arc::new(builder.build()?);

    let inputs = InputCoordinator::builder()
        .stale_policy(if cli.reject_stale {
            StalePolicy::RejectStale
        } else {
            StalePolicy::LastCompletionWins
        })
        .build();

    let mut trigger = GenerationTrigger::new(generator.clone(), inputs);
    if let Some(ar) = cli.aspect_ratio {
        trigger = trigger.with_aspect_ratio(ar.into());
    }
    if cli.inline_urls {
        trigger = trigger.with_url_inlining(generator.client().clone());
    }

    match cli.command {
        Commands::Generate(args) => {
            generate(&trigger, &generator, args, cli.json).await?;
        }
        Commands::Session => {
            run_session(trigger).await?;
        }
        Commands::Check => {
            check(&generator, cli.json).await?;
        }
    }

    Ok(())
}

async fn generate(
    trigger: &GenerationTrigger,
    generator: &HttpImageGenerator,
    args: GenerateArgs,
    json_output: bool,
) -> anyhow::Result<()> {
    let inputs = trigger.inputs();
    let InputArgs {
        file,
        drop,
        url,
        paste_text,
    } = args.input;

    if let Some(path) = file {
        inputs.set_from_file(Some(ImageFile::from_path(path))).await;
    } else if let Some(path) = drop {
        inputs.set_from_drop(vec![ImageFile::from_path(path)]).await;
    } else if let Some(url) = url {
        inputs.set_from_url(&url);
    } else if let Some(text) = paste_text {
        inputs
            .set_from_paste(Vec::<ClipboardItem>::new(), Some(text))
            .await;
    }

    let url = match trigger.trigger(&args.prompt).await {
        TriggerOutcome::Generated { url } => url,
        TriggerOutcome::HardFailure(e) => {
            anyhow::bail!("{}: {}", remixviz::Notice::GenerationError, e)
        }
        outcome => anyhow::bail!(
            "{}",
            outcome.notice().map(|n| n.message()).unwrap_or("busy")
        ),
    };

    let mut saved = None;
    if let Some(ref output) = args.output {
        let data = generator.download(&url).await?;
        std::fs::write(output, &data)?;
        saved = Some((output.display().to_string(), data.len()));
    }

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "url": url,
            "output": saved.as_ref().map(|(path, _)| path),
            "size_bytes": saved.as_ref().map(|(_, size)| size),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Generated image: {}", url);
        if let Some((path, size)) = saved {
            println!("Saved to {} ({} bytes)", path, size);
        }
    }

    Ok(())
}

async fn check(generator: &HttpImageGenerator, json_output: bool) -> anyhow::Result<()> {
    let result = generator.health_check().await;

    if json_output {
        let status = serde_json::json!({
            "endpoint": generator.endpoint(),
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        match &result {
            Ok(()) => println!("{}: ok", generator.endpoint()),
            Err(e) => println!("{}: {}", generator.endpoint(), e),
        }
    }

    result.map_err(Into::into)
}

async fn run_session(trigger: GenerationTrigger) -> anyhow::Result<()> {
    eprintln!("[remixviz] session started, type `help` for commands");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    Session::new(trigger).run(stdin, tokio::io::stdout()).await?;
    Ok(())
}
