use std::io::Write as _;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use cadence_voice::chat::ChatClient;
use cadence_voice::sink::{AudioSink, PlayerSink, RelaySink};
use cadence_voice::{Config, ConversationContext, SpeechBridge, SynthesisClient};

/// Cadence - talk to a language model and hear the answers
#[derive(Parser)]
#[command(name = "cadence", version, about)]
struct Cli {
    /// Relay audio to the configured downstream server instead of playing locally
    #[arg(long, env = "CADENCE_RELAY")]
    relay: bool,

    /// Voice identifier (overrides `ELEVENLABS_VOICE_ID`)
    #[arg(long)]
    voice: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Speak a single line of text and exit
    Say {
        /// Text to speak
        text: String,
    },
    /// Verify the local audio player is available
    CheckPlayer,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,cadence_voice=info",
        1 => "info,cadence_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(mut cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env();

    match cli.command.take() {
        Some(Command::CheckPlayer) => {
            let mut sink = player_sink(&config)?;
            sink.close().await?;
            println!("player ok");
            Ok(())
        }
        Some(Command::Say { text }) => {
            let voice_id = resolve_voice(&cli, &config)?;
            let synthesis = SynthesisClient::from_config(&config)?;

            let tokens = futures::stream::iter([Ok(text)]);
            let mut sink = make_sink(&cli, &config).await?;
            let mut bridge = SpeechBridge::new(synthesis);
            let summary = bridge
                .run(tokens, &voice_id, &config.voice.settings, sink.as_mut())
                .await?;
            tracing::info!(
                chunks = summary.chunks_sent,
                frames = summary.frames_received,
                "utterance complete"
            );
            Ok(())
        }
        None => {
            let voice_id = resolve_voice(&cli, &config)?;
            let synthesis = SynthesisClient::from_config(&config)?;
            chat_loop(&cli, &config, &synthesis, &voice_id).await
        }
    }
}

/// Voice identifier from the CLI override or the environment
fn resolve_voice(cli: &Cli, config: &Config) -> anyhow::Result<String> {
    match cli.voice.clone() {
        Some(voice) => Ok(voice),
        None => Ok(config.voice_id()?),
    }
}

/// Interactive conversation loop: read a line, speak the streamed reply
async fn chat_loop(
    cli: &Cli,
    config: &Config,
    synthesis: &SynthesisClient,
    voice_id: &str,
) -> anyhow::Result<()> {
    let chat = ChatClient::new(&config.chat, config.openai_key()?);
    let mut context = ConversationContext::new(config.chat.system_prompt.clone());

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            println!("Goodbye!");
            break;
        }

        context.push_user(query);
        let tokens = chat.stream_completion(&context).await?;

        // collect the reply while it streams through the bridge
        let reply = Arc::new(Mutex::new(String::new()));
        let tokens = {
            let reply = Arc::clone(&reply);
            tokens.inspect(move |fragment| {
                if let Ok(text) = fragment {
                    reply.lock().unwrap().push_str(text);
                }
            })
        };

        let mut sink = make_sink(cli, config).await?;
        let mut bridge = SpeechBridge::new(synthesis.clone());
        match bridge
            .run(tokens, voice_id, &config.voice.settings, sink.as_mut())
            .await
        {
            Ok(summary) => tracing::debug!(
                chunks = summary.chunks_sent,
                frames = summary.frames_received,
                truncated = summary.truncated,
                "utterance complete"
            ),
            Err(e) => tracing::error!(error = %e, "utterance failed"),
        }

        let reply = std::mem::take(&mut *reply.lock().unwrap());
        if !reply.is_empty() {
            context.push_assistant(reply);
        }
        context.trim(config.chat.history_window);
    }

    Ok(())
}

/// Build the sink selected by the CLI: local player or downstream relay
async fn make_sink(cli: &Cli, config: &Config) -> anyhow::Result<Box<dyn AudioSink>> {
    if cli.relay {
        Ok(Box::new(RelaySink::connect(&config.relay.url).await?))
    } else {
        Ok(player_sink(config)?)
    }
}

/// Spawn the configured player, or the default one
fn player_sink(config: &Config) -> anyhow::Result<Box<dyn AudioSink>> {
    let sink = match config.player.as_deref() {
        Some(player) => PlayerSink::with_player(player, &[])?,
        None => PlayerSink::spawn()?,
    };
    Ok(Box::new(sink))
}
