use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicebot::commands::{SlashCommand, get_help_text, parse_slash_command};
use voicebot::prompts::{self, SUGGESTED_QUESTIONS};
use voicebot::storage::TranscriptStore;
use voicebot::{
    CompletionProvider, Config, LlmClient, LoggingProvider, Role, Session, SessionError, Transcript,
};

#[derive(Parser)]
#[command(name = "voicebot")]
#[command(version)]
#[command(about = "Ask an AI persona questions from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ~/.voicebot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation (default)
    Chat {
        /// Continue from a saved transcript
        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List the suggested questions
    Questions,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "voicebot=debug" } else { "voicebot=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn build_session(config: &Config, transcript: Transcript) -> Result<Session> {
    let session_config = config.session_config()?;
    let client = LlmClient::new(config, session_config.provider_credentials.clone())?;
    let provider: Arc<dyn CompletionProvider> = Arc::new(LoggingProvider::new(Arc::new(client)));
    let session = Session::with_transcript(session_config, provider, transcript)?;
    Ok(session)
}

fn print_questions() {
    println!("💡 Suggested questions:\n");
    for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        println!("  {}. {}", i + 1, question);
    }
    println!();
}

fn print_history(transcript: &Transcript) {
    if transcript.is_empty() {
        println!("📭 No messages yet.");
        return;
    }
    for turn in transcript {
        match turn.role() {
            Role::User => println!("You: {}", turn.content()),
            Role::Assistant => println!("Bot: {}\n", turn.content()),
        }
    }
}

/// Submit one turn and print the outcome. Failures are reported, never fatal.
async fn ask(session: &mut Session, text: &str) {
    match session.submit_user_turn(text).await {
        Ok(turn) => println!("Bot: {}\n", turn.content()),
        Err(SessionError::EmptyInput) => {}
        Err(SessionError::CompletionFailed { detail }) => {
            println!("❌ Error getting response: {detail}");
            println!("   Send the question again to retry.\n");
        }
    }
}

async fn chat(config: &Config, resume: Option<PathBuf>) -> Result<()> {
    let store = TranscriptStore::new()?;
    let transcript = match resume {
        Some(path) => store.load(&path)?.turns,
        None => Transcript::new(),
    };
    let mut session = build_session(config, transcript)?;

    println!("🤖 AI Agent Voice Bot");
    println!("{}", "=".repeat(50));
    println!("Model: {} ({})", session.model_id(), config.provider.display_name());
    println!("Type a question, /questions for ideas, or /help for commands.\n");
    if !session.transcript().is_empty() {
        print_history(session.transcript());
    }

    let stdin = io::stdin();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line).context("Failed to read input")? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\r', '\n']);

        if let Some(parsed) = parse_slash_command(input) {
            match parsed.command {
                SlashCommand::Clear => {
                    session.clear();
                    println!("🔄 Conversation cleared.\n");
                }
                SlashCommand::Questions => print_questions(),
                SlashCommand::Ask => {
                    match parsed.question_number().and_then(prompts::suggested_question) {
                        Some(question) => {
                            println!("You: {question}");
                            ask(&mut session, question).await;
                        }
                        None => println!("Usage: /ask <1-{}>", SUGGESTED_QUESTIONS.len()),
                    }
                }
                SlashCommand::History => print_history(session.transcript()),
                SlashCommand::Save => {
                    let path = parsed.argument().map(PathBuf::from);
                    match store.save(path.as_deref(), session.transcript(), session.model_id()) {
                        Ok(written) => println!("💾 Saved to {}\n", written.display()),
                        Err(e) => println!("❌ {e:#}\n"),
                    }
                }
                SlashCommand::Help => println!("{}\n", get_help_text()),
                SlashCommand::Bye => break,
            }
            continue;
        }

        if input.trim_start().starts_with('/') {
            println!("Unknown command. Type /help to see what's available.\n");
            continue;
        }

        ask(&mut session, input).await;
    }

    println!("👋 Bye!");
    Ok(())
}

async fn ask_once(config: &Config, question: &str) -> Result<ExitCode> {
    let mut session = build_session(config, Transcript::new())?;
    match session.submit_user_turn(question).await {
        Ok(turn) => {
            println!("{}", turn.content());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("❌ {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command.unwrap_or(Commands::Chat { resume: None }) {
        Commands::Questions => {
            print_questions();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Chat { resume } => {
            let config = Config::load(cli.config.as_deref())?;
            chat(&config, resume).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ask { question } => {
            let config = Config::load(cli.config.as_deref())?;
            ask_once(&config, &question.join(" ")).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}
