//! ROMA CLI: 响应解码、模式识别与交互式诊断会话的命令行工具
//!
//! Usage:
//!   roma-cli decode <file> [--unlock]        Decode a saved backend reply to JSON
//!   roma-cli classify <text> [--first]       Print the conversation mode of a message
//!   roma-cli chat [--config <yaml>] [--model <robot>] [--user <id>] [--name <name>]
//!   roma-cli schema                          Print the JSON schema of the result record

use anyhow::{bail, Context};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use roma_protocol::classifier::{classify, ModeClassifier, TurnSignals};
use roma_protocol::protocol::UNLOCK_PHRASE;
use roma_protocol::types::ImageAttachment;
use roma_protocol::{
    decode, ConversationMode, DiagnosticResult, RomaClient, RomaConfig, TurnRequest, UserIdentity,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "decode" => cmd_decode(&args[2..]),
        "classify" => cmd_classify(&args[2..]),
        "chat" => cmd_chat(&args[2..]),
        "schema" => cmd_schema(),
        "version" | "--version" | "-V" => {
            println!("roma-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"roma-cli: ROMA 诊断协议命令行工具

USAGE:
    roma-cli <COMMAND> [OPTIONS]

COMMANDS:
    decode <file> [--unlock]    Decode a saved backend reply and print the record as JSON
    classify <text> [--first]   Print the conversation mode the text would run in
    chat [OPTIONS]              Interactive diagnostic session against Gemini
        --config <yaml>         Configuration file
        --model <robot>         Robot model tag sent with every turn
        --user <identity>       Identity used for persistent memory
        --name <display name>   Name shown to the assistant (defaults to the identity)
    schema                      Print the JSON schema of the decoded record
    version                     Show version information
    help                        Show this help message

CHAT COMMANDS:
    /unlock                     Send the unlock phrase
    /image <path>               Attach an image to the next message
    /reset                      Start a new session
    /quit                       Leave

ENVIRONMENT:
    GEMINI_API_KEY, API_KEY     Backend API key (the keyring entry roma/gemini wins)
    ROMA_MODEL, ROMA_BASE_URL, ROMA_TEMPERATURE, ROMA_HTTP_TIMEOUT_SECS,
    ROMA_MAX_RETRIES, ROMA_RETRY_BASE_DELAY_MS, ROMA_MEMORY_DIR
    RUST_LOG                    Log filter (e.g. roma_protocol=debug)"#
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn cmd_decode(args: &[String]) -> anyhow::Result<()> {
    let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
        bail!("decode needs a file");
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let mode = if has_flag(args, "--unlock") {
        ConversationMode::Unlock
    } else {
        ConversationMode::Diagnostic
    };
    println!("{}", decode(&raw, mode).to_json()?);
    Ok(())
}

fn cmd_classify(args: &[String]) -> anyhow::Result<()> {
    let text: Vec<&str> = args
        .iter()
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .collect();
    if text.is_empty() {
        bail!("classify needs a message");
    }
    let text = text.join(" ");
    let mode = if let Some(model) = flag_value(args, "--model") {
        ModeClassifier::new().classify(
            &text,
            has_flag(args, "--first"),
            TurnSignals {
                has_image: false,
                has_robot_model: !model.trim().is_empty(),
            },
        )
    } else {
        classify(&text, has_flag(args, "--first"))
    };
    println!("{mode}");
    Ok(())
}

fn cmd_schema() -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&DiagnosticResult::json_schema())?
    );
    Ok(())
}

fn load_config(args: &[String]) -> anyhow::Result<RomaConfig> {
    let config = match flag_value(args, "--config") {
        Some(path) => RomaConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => RomaConfig::default(),
    };
    Ok(config.apply_env()?)
}

fn cmd_chat(args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let robot_model = flag_value(args, "--model").map(str::to_string);
    let user = flag_value(args, "--user").map(|identity| {
        let name = flag_value(args, "--name").unwrap_or(identity);
        UserIdentity::new(name, identity)
    });

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(chat_loop(config, robot_model, user))
}

async fn chat_loop(
    config: RomaConfig,
    robot_model: Option<String>,
    user: Option<UserIdentity>,
) -> anyhow::Result<()> {
    let mut client = RomaClient::from_config(&config)?;

    match client.greet().await {
        Ok(greeting) => render(&greeting),
        Err(e) => println!("!! {}", e.user_message()),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_image: Option<ImageAttachment> = None;

    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let text = match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            ("/quit", _) => break,
            ("/reset", _) => {
                client.reset();
                println!("-- new session --");
                continue;
            }
            ("/image", path) if !path.is_empty() => {
                match ImageAttachment::from_file(PathBuf::from(path), &config.image_media_type) {
                    Ok(image) => {
                        pending_image = Some(image);
                        println!("-- image attached to the next message --");
                    }
                    Err(e) => println!("!! {e}"),
                }
                continue;
            }
            ("/unlock", _) => UNLOCK_PHRASE.to_string(),
            _ => line.to_string(),
        };

        let mut request = TurnRequest::new(text);
        if let Some(image) = pending_image.take() {
            request = request.with_image(image);
        }
        if let Some(model) = &robot_model {
            request = request.with_robot_model(model.clone());
        }
        if let Some(user) = &user {
            request = request.with_user(user.clone());
        }

        match client.submit_turn(request).await {
            Ok(result) => render(&result),
            Err(e) => {
                tracing::debug!(error = %e, "Turn failed");
                println!("!! {}", e.user_message());
            }
        }
    }
    Ok(())
}

fn render(result: &DiagnosticResult) {
    if result.is_greeting() {
        println!("{}", result.sections.root_cause);
        return;
    }
    if result.is_code_only() {
        println!("{}", result.sections.recovery_code);
        println!("{}", result.sections.system_status);
        return;
    }
    let Some(risk) = result.metadata.risk_level else {
        println!("{}", result.sections.root_cause);
        return;
    };

    println!("RISK: {}  CONFIDENCE: {:.0}%", risk, result.metadata.confidence * 100.0);
    let s = &result.sections;
    for (title, body) in [
        ("ROOT CAUSE", &s.root_cause),
        ("FIX STEPS", &s.fix_steps),
        ("SAFETY CHECKLIST", &s.safety_checklist),
        ("RECOVERY CODE", &s.recovery_code),
        ("PREVENTION", &s.prevention_strategy),
        ("POST VALIDATION", &s.post_validation),
        ("AUDIT LOG", &s.audit_log),
    ] {
        if !body.is_empty() {
            println!("\n## {title}\n{body}");
        }
    }
    if result.is_code_blocked() {
        println!("\nType /unlock once every safety check is confirmed.");
    }
    println!("\n{}", s.system_status);
}
