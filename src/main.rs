use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use nutriscan::chat::{ReplyChunk, ReplyPrinter, Role};
use nutriscan::scan::{DeviceCapture, ImageSource, LabelAnalyzer, ProductVerifier};
use nutriscan::voice::{
    AudioPlayback, MicCapture, MicRecognizer, Speaker, SpeechToText, TextToSpeech,
    VoiceInputBridge, VoiceInputEvent, VoiceOutputBridge, VoiceProfile, select_voice,
};
use nutriscan::{
    AnalysisOrchestrator, Config, ConversationSession, GeminiClient, Preferences,
    ReferenceCatalog,
};

/// NutriScan - nutrition label scanning and meal-chat assistant
#[derive(Parser)]
#[command(name = "nutriscan", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a food label image
    Scan {
        /// Path to the label image
        image: std::path::PathBuf,
    },
    /// Chat with the Luvable assistant
    Chat {
        /// Accept spoken input (type /voice to toggle listening)
        #[arg(long, env = "NUTRISCAN_VOICE")]
        voice: bool,

        /// Read replies aloud
        #[arg(long, env = "NUTRISCAN_SPEAK")]
        speak: bool,
    },
    /// Show or set the hydration reminder opt-in
    Reminder {
        /// New state; omit to show the current one
        state: Option<ReminderState>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReminderState {
    On,
    Off,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,nutriscan=info",
        1 => "info,nutriscan=debug",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;

    match cli.command {
        Command::Scan { image } => scan(&config, image).await,
        Command::Chat { voice, speak } => chat(&config, voice, speak).await,
        Command::Reminder { state } => reminder(&config, state),
        Command::TestMic { duration } => test_mic(duration).await,
        Command::TestSpeaker => test_speaker().await,
    }
}

async fn scan(config: &Config, image: std::path::PathBuf) -> anyhow::Result<()> {
    let gemini =
        GeminiClient::new(config.api_keys.gemini.clone())?.with_model(config.model.clone());
    let catalog = Arc::new(ReferenceCatalog::bundled());

    let mut orchestrator = AnalysisOrchestrator::new(
        DeviceCapture::file_only(),
        LabelAnalyzer::new(Box::new(gemini)),
        ProductVerifier::new(catalog),
    );

    println!("Analyzing with Luvable... 💖");
    let result = orchestrator.analyze(ImageSource::File(image)).await?;

    println!("\n{}", result.product_name);
    if result.verified {
        println!("  ✓ verified against the reference catalog");
    }
    for nutrient in &result.nutrients {
        println!(
            "  {:<20} {:>8}  DV {:>5}  [{:?}]",
            nutrient.name, nutrient.value, nutrient.dv, nutrient.score
        );
    }
    if !result.allergens.is_empty() {
        println!("  Allergens: {}", result.allergens.join(", "));
    }
    let counts = result.score_counts();
    println!(
        "  Balance: {} good / {} moderate / {} high",
        counts.good, counts.moderate, counts.high
    );
    println!("\n{}", result.summary);
    Ok(())
}

/// Default voice inventory offered to the ranking function
fn voice_inventory() -> Vec<VoiceProfile> {
    ["nova", "alloy", "shimmer"]
        .into_iter()
        .map(|name| VoiceProfile {
            name: name.to_string(),
            language: "en-US".to_string(),
            network: true,
        })
        .collect()
}

#[allow(clippy::too_many_lines)]
async fn chat(config: &Config, voice: bool, speak: bool) -> anyhow::Result<()> {
    let gemini = Arc::new(
        GeminiClient::new(config.api_keys.gemini.clone())?.with_model(config.model.clone()),
    );
    let mut session = ConversationSession::new(gemini);

    // Incremental printer: follows snapshots, printing only what is new in
    // the trailing assistant turn.
    let mut snapshots = session.subscribe();
    tokio::spawn(async move {
        let mut printer = ReplyPrinter::new();
        while snapshots.changed().await.is_ok() {
            let turns = snapshots.borrow_and_update().clone();
            let Some(last) = turns.last() else { continue };
            if last.role != Role::Assistant {
                continue;
            }
            use std::io::Write;
            match printer.advance(turns.len() - 1, &last.text) {
                Some(ReplyChunk::Append(text)) => {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
                Some(ReplyChunk::Replace(text)) => {
                    println!();
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
                None => {}
            }
        }
    });

    let (voice_tx, mut voice_rx) = mpsc::channel::<VoiceInputEvent>(4);
    let mut input_bridge = if voice {
        let stt = SpeechToText::new(config.api_keys.openai.clone(), config.voice.stt_model.clone())?
            .with_language(
                config
                    .voice
                    .language
                    .split('-')
                    .next()
                    .unwrap_or("en")
                    .to_string(),
            );
        Some(VoiceInputBridge::new(
            Arc::new(MicRecognizer::new(stt)),
            voice_tx,
        ))
    } else {
        None
    };

    let mut output_bridge = if speak {
        let inventory = voice_inventory();
        let selected = select_voice(&inventory, &config.voice.language)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| "nova".to_string());
        let tts = TextToSpeech::new(
            config.api_keys.openai.clone(),
            selected,
            config.voice.tts_speed,
        )?;
        Some(VoiceOutputBridge::new(Arc::new(Speaker::new(
            tts,
            AudioPlayback::new()?,
        ))))
    } else {
        None
    };

    println!("{}", nutriscan::persona::GREETING);
    if voice {
        println!("(type /voice to toggle listening, /quit to leave)");
    } else {
        println!("(type /quit to leave)");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\n> ");
        {
            use std::io::Write;
            let _ = std::io::stdout().flush();
        }

        let message = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim().to_string();
                match line.as_str() {
                    "" => continue,
                    "/quit" | "/exit" => break,
                    "/voice" => {
                        if let Some(bridge) = input_bridge.as_mut() {
                            match bridge.toggle() {
                                Ok(()) if bridge.is_listening() => {
                                    println!("Listening... 🎤");
                                }
                                Ok(()) => println!("Stopped listening."),
                                Err(e) => println!("{e}"),
                            }
                        } else {
                            println!("Voice input is off; restart with --voice.");
                        }
                        continue;
                    }
                    _ => line,
                }
            }
            Some(event) = voice_rx.recv() => {
                match event {
                    VoiceInputEvent::Utterance(text) => {
                        println!("You said: {text}");
                        text
                    }
                    VoiceInputEvent::Error(e) => {
                        println!("Voice input error: {e}");
                        continue;
                    }
                }
            }
        };

        session.send(&message).await?;
        println!();

        if let Some(bridge) = output_bridge.as_mut() {
            bridge.speak_reply(&session.turns(), session.is_sending());
        }
    }

    if let Some(bridge) = input_bridge.as_mut() {
        bridge.stop();
    }
    if let Some(bridge) = output_bridge.as_mut() {
        bridge.cancel();
    }
    Ok(())
}

fn reminder(config: &Config, state: Option<ReminderState>) -> anyhow::Result<()> {
    let mut prefs = Preferences::load(&config.data_dir)?;
    match state {
        Some(ReminderState::On) => {
            prefs.reminder_enabled = true;
            prefs.save(&config.data_dir)?;
            println!("Hydration reminders on. Stay sparkly! 💧");
        }
        Some(ReminderState::Off) => {
            prefs.reminder_enabled = false;
            prefs.save(&config.data_dir)?;
            println!("Hydration reminders off.");
        }
        None => {
            let state = if prefs.reminder_enabled { "on" } else { "off" };
            println!("Hydration reminders are {state}.");
        }
    }
    Ok(())
}

async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Recording for {duration}s...");
    let samples = tokio::task::spawn_blocking(move || -> nutriscan::Result<Vec<f32>> {
        let mut mic = MicCapture::new()?;
        mic.start()?;
        std::thread::sleep(std::time::Duration::from_secs(duration));
        mic.stop();
        Ok(mic.take_buffer())
    })
    .await??;

    #[allow(clippy::cast_precision_loss)]
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    println!("Captured {} samples, peak amplitude {peak:.3}", samples.len());
    Ok(())
}

async fn test_speaker() -> anyhow::Result<()> {
    println!("Playing test tone...");
    let playback = AudioPlayback::new()?;
    let samples: Vec<f32> = (0..24000)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / 24000.0;
            0.2 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();
    let cancelled = std::sync::atomic::AtomicBool::new(false);
    tokio::task::spawn_blocking(move || playback.play_samples(samples, &cancelled)).await??;
    println!("Done.");
    Ok(())
}
