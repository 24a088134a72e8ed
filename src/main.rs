use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use jukebot::commands::create_room::create_music_room;
use jukebot::{CommandResult, Context, Data, Error, config::Config, events, health, rooms};
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jukebot=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;

    // Liveness endpoint runs beside the bot, independent of the core.
    health::spawn(config.health_addr);

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // Music room management
        create_music_room(),
    ];

    let sweep_interval = config.sweep_interval;
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                rooms::spawn_sweeper(ctx.clone(), sweep_interval);
                Ok(Data {})
            })
        });

    let mut client = ClientBuilder::new(config.token, intents)
        .framework(framework.build())
        .event_handler(events::Handler)
        .register_songbird()
        .await?;

    client.start().await.map_err(Into::into)
}
