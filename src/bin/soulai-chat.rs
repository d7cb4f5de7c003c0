//! Interactive chat application for conversing with the soul.
//!
//! This binary provides a REPL that shows each faculty's answer as soon as it
//! arrives, followed by the synthesized answer or a request for trainer
//! guidance.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on localhost:8000 (or $SOULAI_URL)
//! soulai-chat
//!
//! # Talk to another backend
//! soulai-chat --url http://soul.local:8000
//!
//! # Disable colors (useful for piping output)
//! soulai-chat --no-color
//! ```
//!
//! Set `SOULAI_LOG=debug` to see dropped frames and request timings on stderr.
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/habits [category]` - List habits
//! - `/pending` - List questions awaiting guidance
//! - `/respond <id> <guidance> [| <note>]` - Answer a pending question
//! - `/teach <situation> | <keywords> | <guidance> [| <note>]` - Teach unprompted
//! - `/threshold <0.0-1.0>` - Set when the soul asks for guidance
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use soulai::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use soulai::{ConfigUpdate, GuidanceRequest, Learning, LearningCreate, SoulClient};

/// Main entry point for the soulai-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env("SOULAI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("soulai-chat [OPTIONS]");
    let config = ChatConfig::from_args_and_env(args);
    let use_color = config.use_color;

    let client = SoulClient::new(Some(config.base_url.clone()))?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    if !client.health().await {
        renderer.print_error(&format!(
            "Backend at {} is not responding; turns will fail until it is up.",
            client.base_url()
        ));
    }
    let mut session = ChatSession::new(client, &config);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during turns
    let interrupted = Arc::new(AtomicBool::new(false));

    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Soul AI ({})", session.source().base_url());
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Namaste.");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::ShowConfig => match session.source().config().await {
                            Ok(config) => {
                                println!("    Current Configuration:");
                                println!("      Model: {}", config.claude_model);
                                println!("      Temperature: {:.2}", config.temperature);
                                println!("      Max tokens: {}", config.max_tokens);
                                println!(
                                    "      Learning mode: {}",
                                    on_off(config.learning_mode_enabled)
                                );
                                println!(
                                    "      Confidence threshold: {:.2}",
                                    config.confidence_threshold
                                );
                                println!("      Streaming: {}", on_off(session.is_streaming()));
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Weights => match session.source().config().await {
                            Ok(config) => {
                                let weights = config.weights();
                                println!("    Faculty weights:");
                                println!("      manas (mind):        {:.0}%", weights.mind * 100.0);
                                println!(
                                    "      buddhi (intellect):  {:.0}%",
                                    weights.intellect * 100.0
                                );
                                println!(
                                    "      sanskaras (habits):  {:.0}%",
                                    weights.habits * 100.0
                                );
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Habits(category) => {
                            match session.source().habits(category.as_deref(), None).await {
                                Ok(habits) if habits.is_empty() => {
                                    renderer.print_info("No habits yet.")
                                }
                                Ok(habits) => {
                                    for habit in habits {
                                        println!(
                                            "    [{}] {} (w:{:.1}, rep:{})",
                                            habit.category,
                                            habit.name,
                                            habit.effective_weight,
                                            habit.repetition_count
                                        );
                                    }
                                }
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Pending => match session.source().pending_learnings().await
                        {
                            Ok(learnings) if learnings.is_empty() => {
                                renderer.print_info("Nothing awaits your guidance.")
                            }
                            Ok(learnings) => print_learnings(&learnings),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Learnings => match session.source().learnings().await {
                            Ok(learnings) if learnings.is_empty() => {
                                renderer.print_info("No active learnings.")
                            }
                            Ok(learnings) => print_learnings(&learnings),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Reinforce(habit_id) => {
                            match session.source().reinforce_habit(habit_id).await {
                                Ok(habit) => renderer.print_info(&format!(
                                    "{} reinforced (w:{:.1}, rep:{}).",
                                    habit.name, habit.effective_weight, habit.repetition_count
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Respond {
                            learning_id,
                            guidance,
                            application_note,
                        } => {
                            let request = GuidanceRequest::new(guidance, application_note);
                            match session
                                .source()
                                .respond_to_learning(learning_id, &request)
                                .await
                            {
                                Ok(learning) => renderer.print_info(&format!(
                                    "Learning #{} is now {}.",
                                    learning.id, learning.status
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Teach {
                            trigger_summary,
                            keywords,
                            guidance,
                            application_note,
                        } => {
                            let learning = LearningCreate::new(
                                trigger_summary,
                                keywords,
                                guidance,
                                application_note,
                            );
                            match session.source().create_learning(&learning).await {
                                Ok(learning) => renderer.print_info(&format!(
                                    "Learning #{} recorded.",
                                    learning.id
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Forget(learning_id) => {
                            match session.source().supersede_learning(learning_id).await {
                                Ok(learning) => renderer.print_info(&format!(
                                    "Learning #{} is now {}.",
                                    learning.id, learning.status
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Threshold(threshold) => {
                            let update = ConfigUpdate::new().with_confidence_threshold(threshold);
                            match session.source().update_config(&update).await {
                                Ok(config) => renderer.print_info(&format!(
                                    "Confidence threshold set to {:.2}.",
                                    config.confidence_threshold
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::LearningMode(enabled) => {
                            let update = ConfigUpdate::new().with_learning_mode(enabled);
                            match session.source().update_config(&update).await {
                                Ok(config) => renderer.print_info(&format!(
                                    "Learning mode {}.",
                                    on_off(config.learning_mode_enabled)
                                )),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Stream(streaming) => {
                            session.set_streaming(streaming);
                            renderer.print_info(&format!("Streaming {}.", on_off(streaming)));
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                if let Err(e) = session
                    .send(line, &mut renderer, interrupted.clone())
                    .await
                {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nNamaste.");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_learnings(learnings: &[Learning]) {
    for learning in learnings {
        println!(
            "    #{} [{}] {}",
            learning.id, learning.status, learning.trigger_summary
        );
        if !learning.guidance.is_empty() {
            println!("        guidance: {}", learning.guidance);
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
