use clap::Parser;
use quizbook::{
    db::{Db, ATTEMPT_MAX_AGE},
    gateway::{ChatGateway, DEFAULT_GATEWAY_URL},
    services::{
        auth::{normalize_email, AuthService},
        extraction::ExtractionService,
    },
    AppState,
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// libSQL server address, or `file:<path>` for a local database.
    #[clap(env)]
    url: String,

    /// libSQL authentication token.
    #[clap(long, env)]
    auth_token: Option<String>,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// OpenAI-compatible chat completions endpoint used for page extraction.
    #[arg(long, env, default_value = DEFAULT_GATEWAY_URL)]
    ai_gateway_url: String,

    /// Extraction is disabled without a key.
    #[arg(long, env)]
    ai_api_key: Option<String>,

    #[arg(long, env, default_value = "google/gemini-2.5-pro")]
    quiz_model: String,

    #[arg(long, env, default_value = "google/gemini-2.5-flash")]
    book_model: String,

    /// Accounts with these emails are administrators.
    #[arg(long, env, value_delimiter = ',')]
    admin_emails: Vec<String>,

    /// Mark cookies `Secure`; turn off for plain-http development.
    #[arg(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    secure_cookies: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,quizbook=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(args.url, args.auth_token).await?;

    let admin_emails: Vec<String> = args
        .admin_emails
        .iter()
        .map(|e| normalize_email(e))
        .filter(|e| !e.is_empty())
        .collect();
    db.promote_admins(&admin_emails).await?;
    db.seed_quizzes().await?;
    db.prune_attempts(ATTEMPT_MAX_AGE).await?;

    let gateway = ChatGateway::new(args.ai_gateway_url, args.ai_api_key);
    if !gateway.is_enabled() {
        tracing::warn!("no AI API key configured, image extraction is disabled");
    }

    let state = AppState {
        auth: AuthService::new(db.clone(), admin_emails),
        extraction: ExtractionService::new(gateway, args.quiz_model, args.book_model),
        db,
        secure_cookies: args.secure_cookies,
    };

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, quizbook::router(state)).await?;

    Ok(())
}
