use dotenvy::dotenv;
use itemdex::bot::handlers::{self, Command};
use itemdex::bot::{access, SessionStore};
use itemdex::catalog::Catalog;
use itemdex::config::Settings;
use itemdex::images::ImageClient;
use itemdex::{http, webhook};
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting the bot token from logs
struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    token_prefixed: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token_url
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token_bare
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // We return the original buffer length to satisfy the contract,
        // even if the redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    // Setup logging with token redaction
    init_logging(patterns);

    info!("Starting Itemdex bot...");

    // Load settings
    let settings = init_settings();

    // One shared HTTP client for the catalog fetch and image downloads
    let http_client = http::create_http_client();

    // Load the catalog once; it is read-only from here on
    let catalog = init_catalog(&http_client, &settings).await;

    let images = Arc::new(ImageClient::new(
        http_client,
        settings.image_base_url.clone(),
    ));

    let sessions = init_session_store(&settings);

    // Initialize Bot
    let bot = Bot::new(settings.telegram_token.clone());
    register_commands(&bot).await;

    let mut dispatcher = Dispatcher::builder(bot.clone(), setup_handler())
        .dependencies(dptree::deps![settings.clone(), catalog, sessions, images])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    match settings.webhook_addr.clone() {
        Some(addr) => {
            let (listener, router) = webhook::update_listener_and_router();
            let tcp = tokio::net::TcpListener::bind(addr.as_str()).await?;
            info!("Webhook server listening on {addr}");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(tcp, router).await {
                    error!("Webhook server error: {e}");
                }
            });

            info!("Bot is running (webhook mode)...");
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => {
            // Clear any stale webhook so long polling works.
            bot.delete_webhook().send().await?;

            info!("Bot is running (polling mode)...");
            dispatcher.dispatch().await;
        }
    }

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn init_catalog(client: &reqwest::Client, settings: &Settings) -> Arc<Catalog> {
    match Catalog::load(client, &settings.catalog_url).await {
        Ok(catalog) => {
            info!("Catalog loaded: {} items.", catalog.len());
            Arc::new(catalog)
        }
        Err(e) => {
            warn!("Failed to load catalog: {e}. All searches will return no matches.");
            Arc::new(Catalog::empty())
        }
    }
}

fn init_session_store(settings: &Settings) -> Arc<SessionStore> {
    info!(
        "Initializing SessionStore (ttl: {}s, max entries: {})",
        settings.session_ttl_secs, settings.session_max_entries
    );

    Arc::new(SessionStore::new(
        settings.session_ttl_secs,
        settings.session_max_entries,
    ))
}

async fn register_commands(bot: &Bot) {
    // Register slash commands for autocomplete in Telegram clients.
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {e}");
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .filter(|q: CallbackQuery, settings: Arc<Settings>| {
                    access::callback_allowed(&q, settings.allowed_user)
                })
                .endpoint(handle_callback),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message, settings: Arc<Settings>| {
                    access::message_allowed(&msg, settings.allowed_user)
                })
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            // Commands issued as channel posts carry no sender but are
            // still allowed by the access rule.
            Update::filter_channel_post()
                .filter(|msg: Message, settings: Arc<Settings>| {
                    access::message_allowed(&msg, settings.allowed_user)
                })
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    catalog: Arc<Catalog>,
    sessions: Arc<SessionStore>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::Id(query) => handlers::id_command(bot, msg, query, sessions).await,
        Command::Healthcheck => handlers::healthcheck(bot, msg).await,
        Command::Stats => handlers::stats(bot, msg, catalog, sessions).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    catalog: Arc<Catalog>,
    sessions: Arc<SessionStore>,
    images: Arc<ImageClient>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_callback(bot, q, catalog, sessions, images).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
