use clap::Parser;
use ogcard_rs::walker::{normalize_template, InlineConverter, LeafNormalizer, ProxyRewriter};
use ogcard_rs::{RewriteConfig, Template};

/// ogcard: A utility for normalizing image references in card templates
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to input template JSON file
    #[clap(short, long)]
    pub input_template_file: String,

    /// Path to output template JSON file to be created
    #[clap(short, long)]
    pub output_template_file: String,

    /// Normalization context. One of proxy, inline
    #[clap(short, long, default_value = "proxy")]
    pub mode: String,

    /// Origin of the conversion endpoint used when rewriting remote references
    /// (falls back to $OGCARD_PUBLIC_URL)
    #[clap(short, long)]
    pub base_url: Option<String>,

    /// Pretty-print JSON in output file
    #[clap(short, long)]
    pub pretty: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args: Args = Args::parse();

    // Read input file
    let template_str = match std::fs::read_to_string(&args.input_template_file) {
        Ok(template_str) => template_str,
        Err(err) => {
            eprintln!(
                "Failed to read input file: {}\n{}",
                args.input_template_file, err
            );
            std::process::exit(1);
        }
    };

    // Parse input as a template
    let template = match serde_json::from_str::<Template>(&template_str) {
        Ok(template) => template,
        Err(err) => {
            eprintln!("Failed to parse input file as a template: {}", err);
            std::process::exit(1);
        }
    };

    if !template.canvas.is_valid() {
        eprintln!("Invalid template: canvas dimensions must be positive");
        std::process::exit(1);
    }

    // Select the leaf normalizer for the requested context
    let normalizer: Box<dyn LeafNormalizer> = match args.mode.as_str() {
        "proxy" => {
            let config = match args.base_url {
                Some(base_url) => RewriteConfig::new(Some(base_url)),
                None => RewriteConfig::from_env(),
            };
            Box::new(ProxyRewriter::new(config))
        }
        "inline" => Box::new(InlineConverter),
        other => {
            eprintln!("Invalid or unsupported mode: {}", other);
            std::process::exit(1);
        }
    };

    // Perform normalization
    let normalized = match normalize_template(&template, normalizer.as_ref()).await {
        Ok(normalized) => normalized,
        Err(err) => {
            eprintln!("Template normalization failed: {}", err);
            std::process::exit(1);
        }
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&normalized)
    } else {
        serde_json::to_string(&normalized)
    };
    let output = match output {
        Ok(output) => output,
        Err(err) => {
            eprintln!("Failed to serialize normalized template: {}", err);
            std::process::exit(1);
        }
    };

    // Write result
    if let Err(err) = std::fs::write(&args.output_template_file, output) {
        eprintln!(
            "Failed to write normalized template to {}\n{}",
            args.output_template_file, err
        );
        std::process::exit(1);
    }
}
