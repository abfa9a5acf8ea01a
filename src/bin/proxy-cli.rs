use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use clap::{Parser, Subcommand};
use url::Url;

use rewrite_proxy::config::{load_config, ProxyConfig};
use rewrite_proxy::http::HEALTH_PATH;
use rewrite_proxy::pipeline::{HttpFetcher, LinkRewriter, Pipeline, TargetParams};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Tools for the rewriting proxy", long_about = None)]
struct Cli {
    /// Configuration file shared with the server.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline in-process and print the relay envelope as JSON
    Fetch {
        url: String,
        #[arg(long)]
        user_agent: Option<String>,
        #[arg(long)]
        accept: Option<String>,
    },
    /// Rewrite links in an HTML file (or stdin) against a base URL
    Rewrite {
        #[arg(short, long)]
        base: String,
        file: Option<PathBuf>,
    },
    /// Check a running proxy's health endpoint
    Health {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    match cli.command {
        Commands::Fetch { url, user_agent, accept } => {
            let fetcher = HttpFetcher::new(&config.upstream)?;
            let pipeline = Pipeline::from_config(&config, Arc::new(fetcher));

            let mut headers = HeaderMap::new();
            if let Some(ua) = user_agent {
                headers.insert(header::USER_AGENT, HeaderValue::from_str(&ua)?);
            }
            if let Some(accept) = accept {
                headers.insert(header::ACCEPT, HeaderValue::from_str(&accept)?);
            }

            let params = TargetParams { url: Some(url), target: None };
            match pipeline.execute(&params, &headers).await {
                Ok(relay) => println!("{}", serde_json::to_string_pretty(&relay)?),
                Err(e) => {
                    eprintln!("Error: {} ({})", e, e.status());
                    println!("{}", serde_json::to_string_pretty(&e.body())?);
                }
            }
        }
        Commands::Rewrite { base, file } => {
            let base = Url::parse(&base)?;
            let html = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let rewriter = LinkRewriter::new(config.rewrite.proxy_path.clone());
            print!("{}", rewriter.rewrite(&html, &base));
        }
        Commands::Health { url } => {
            let res = reqwest::get(format!("{}{}", url.trim_end_matches('/'), HEALTH_PATH)).await?;
            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                println!("{}", text);
            } else {
                eprintln!("Error: proxy returned status {}", status);
                eprintln!("Response: {}", text);
            }
        }
    }

    Ok(())
}
