use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Method, Url};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "modelmap-cli")]
#[command(about = "Client for a modelmap server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8008")]
    url: String,

    /// Session cookie to send, as `name=value`
    #[arg(long)]
    cookie: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a resource (GET)
    Get(Target),
    /// Create a resource (POST)
    Create(WithBody),
    /// Update a resource (PUT)
    Update(WithBody),
    /// Delete a resource (DELETE)
    Delete(Target),
}

#[derive(Args)]
struct Target {
    /// URL segment of the resource, e.g. `echos`
    resource: String,

    #[arg(long)]
    id: Option<String>,

    #[arg(long, requires = "id")]
    property: Option<String>,

    /// Explicit filter expression, e.g. `age,gt,30;name,eq,bob`
    #[arg(short, long)]
    filter: Option<String>,
}

#[derive(Args)]
struct WithBody {
    #[command(flatten)]
    target: Target,

    /// JSON request body
    #[arg(short, long, default_value = "{}")]
    body: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = Url::parse(&cli.url)?;

    let (method, target, body) = match cli.command {
        Commands::Get(target) => (Method::GET, target, None),
        Commands::Delete(target) => (Method::DELETE, target, None),
        Commands::Create(args) => (Method::POST, args.target, Some(args.body)),
        Commands::Update(args) => (Method::PUT, args.target, Some(args.body)),
    };

    let url = resource_url(&base, &target)?;
    let client = reqwest::Client::new();
    let mut request = client.request(method, url);
    if let Some(cookie) = &cli.cookie {
        request = request.header(COOKIE, HeaderValue::from_str(cookie)?);
    }
    if let Some(body) = body {
        // Validate locally so typos fail before the round trip.
        let _: Value = serde_json::from_str(&body)?;
        request = request.header(CONTENT_TYPE, "application/json").body(body);
    }

    let res = request.send().await?;
    print_response(res).await
}

fn resource_url(base: &Url, target: &Target) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| "base URL cannot carry a path")?;
        segments.pop_if_empty().push(&target.resource);
        if let Some(id) = &target.id {
            segments.push(id);
        }
        if let Some(property) = &target.property {
            segments.push(property);
        }
        if target.id.is_none() {
            segments.push("");
        }
    }
    if let Some(filter) = &target.filter {
        url.query_pairs_mut().append_pair("filter", filter);
    }
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(cookie) = res.headers().get(SET_COOKIE) {
        eprintln!("Set-Cookie: {}", cookie.to_str().unwrap_or("<binary>"));
    }

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("{}", text);
            }
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
