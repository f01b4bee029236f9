mod collector;
mod config;
mod wizard;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use collector::{Collector, SheetsCollector, SqliteCollector};
use config::Config;
use wizard::{TelegramTransport, WizardEngine};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
enum Command {
    #[command(description = "add a new budget record.")]
    Add,
    #[command(description = "same as /add.")]
    Start,
    #[command(description = "cancel the current entry.")]
    Cancel,
    #[command(description = "show usage help.")]
    Help,
}

const HELP_TEXT: &str = "This bot is for personal financial accounting.\n\n\
    Add an expense or income with /add. The bot will ask for budget type, \
    category, date, amount, currency and comment.\n\n\
    For the date use DD.MM format (the year is the current year), \
    or just type \"today\" or \"yesterday\".\n\
    Comments are optional - press \"finish\" to skip.\n\n\
    You can cancel at any point with /cancel or by typing \"cancel\".";

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "budgetik.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("budgetik.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting budgetik...");
    info!("Loaded config from {config_path}");

    let mut collectors: Vec<Arc<dyn Collector>> = Vec::new();
    if config.sqlite {
        let db_path = config.data_dir.join("records.db");
        collectors.push(Arc::new(SqliteCollector::with_path(&db_path)));
        info!("SQLite collector enabled ({:?})", db_path);
    }
    if let Some(ref sheets) = config.sheets {
        collectors.push(Arc::new(SheetsCollector::new(
            sheets.spreadsheet_id.clone(),
            sheets.api_token.clone(),
        )));
        info!("Sheets collector enabled (spreadsheet {})", sheets.spreadsheet_id);
    }
    info!("{} collector(s) registered", collectors.len());

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let engine = Arc::new(WizardEngine::new(transport, collectors));

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_text))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    engine: Arc<WizardEngine>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    match cmd {
        Command::Add | Command::Start => {
            info!("📨 /add in chat {chat_id}");
            if let Err(e) = engine.start(chat_id).await {
                warn!("Failed to start wizard in chat {chat_id}: {e}");
            }
        }
        Command::Cancel => {
            if let Err(e) = engine.cancel(chat_id).await {
                warn!("Failed to cancel wizard in chat {chat_id}: {e}");
            }
        }
        Command::Help => {
            bot.send_message(msg.chat.id, HELP_TEXT).await?;
        }
    }

    Ok(())
}

async fn handle_text(msg: Message, engine: Arc<WizardEngine>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Err(e) = engine.handle_text(msg.chat.id.0, text).await {
        warn!("Wizard error in chat {}: {e}", msg.chat.id);
    }

    Ok(())
}

async fn handle_callback(q: CallbackQuery, engine: Arc<WizardEngine>) -> ResponseResult<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id.0;

    if let Err(e) = engine.handle_selection(chat_id, &q.id.0, data).await {
        warn!("Wizard error in chat {chat_id}: {e}");
    }

    Ok(())
}
