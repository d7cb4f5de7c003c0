//! Output rendering for the chat application.
//!
//! Renderers never see protocol events.  They are driven by
//! [`render_progress`], which compares consecutive snapshots of a turn and
//! reports whatever became visible in between.

use std::io::{self, Stdout, Write};

use crate::types::{
    Faculty, FacultyOutput, FacultyStatus, SoulMessage, SynthesisOutput, TrainerEscalation,
};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for gray text (used for details and separators).
const ANSI_GRAY: &str = "\x1b[90m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for magenta text (used for the mind).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code for cyan text (used for the intellect).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the habits).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for the synthesis and confidence).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for blue text (used for informational messages).
const ANSI_BLUE: &str = "\x1b[34m";

const SEPARATOR_WIDTH: usize = 40;

/// Trait for rendering a soul's answer as it forms.
pub trait Renderer: Send {
    /// Called when a turn begins.
    fn start_turn(&mut self) {}

    /// Print a faculty's answer.
    fn print_faculty(&mut self, output: &FacultyOutput);

    /// Report that a faculty failed before answering.
    fn print_faculty_failed(&mut self, faculty: Faculty);

    /// Report that the faculties are being synthesized.
    fn print_synthesizing(&mut self) {}

    /// Print the synthesized answer.
    fn print_synthesis(&mut self, synthesis: &SynthesisOutput);

    /// Report that the soul asked its trainer for guidance.
    fn print_trainer_needed(&mut self, escalation: &TrainerEscalation);

    /// Called once when a turn stops streaming.
    fn finish_turn(&mut self, message: &SoulMessage);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the turn is interrupted by the user.
    fn print_interrupted(&mut self);
}

/// Report to `renderer` everything that became visible between two snapshots.
pub fn render_progress(renderer: &mut dyn Renderer, previous: &SoulMessage, current: &SoulMessage) {
    for faculty in Faculty::ALL {
        let before = previous.status(faculty);
        let after = current.status(faculty);
        if before == after {
            continue;
        }
        match after {
            FacultyStatus::Done => {
                if let Some(output) = current.faculty_output(faculty) {
                    renderer.print_faculty(&output);
                }
            }
            FacultyStatus::Error => renderer.print_faculty_failed(faculty),
            FacultyStatus::Waiting | FacultyStatus::Loading => {}
        }
    }

    if previous.synthesis_status != current.synthesis_status {
        match current.synthesis_status {
            FacultyStatus::Loading => renderer.print_synthesizing(),
            FacultyStatus::Done => match (&current.trainer, &current.synthesis) {
                (Some(escalation), _) => renderer.print_trainer_needed(escalation),
                (None, Some(synthesis)) => renderer.print_synthesis(synthesis),
                (None, None) => {}
            },
            FacultyStatus::Waiting | FacultyStatus::Error => {}
        }
    }

    if previous.streaming && !current.streaming {
        renderer.finish_turn(current);
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// Output goes to stdout unless another writer is supplied.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            out: io::stdout(),
            use_color,
        }
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Consumes the renderer, returning its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn separator(&self) -> String {
        self.paint(ANSI_GRAY, &"━".repeat(SEPARATOR_WIDTH))
    }

    fn faculty_style(faculty: Faculty) -> &'static str {
        match faculty {
            Faculty::Mind => ANSI_MAGENTA,
            Faculty::Intellect => ANSI_CYAN,
            Faculty::Habits => ANSI_GREEN,
        }
    }

    fn header(&self, faculty: Faculty) -> String {
        let title = format!("[{}]", faculty.label());
        self.paint(&format!("{ANSI_BOLD}{}", Self::faculty_style(faculty)), &title)
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn start_turn(&mut self) {
        let separator = self.separator();
        let title = self.paint(ANSI_BOLD, "  Soul AI Response");
        self.line("");
        self.line(&separator);
        self.line(&title);
        self.line(&separator);
    }

    fn print_faculty(&mut self, output: &FacultyOutput) {
        let faculty = output.faculty();
        let confidence = self.paint(ANSI_YELLOW, &format!("{:.2}", output.confidence()));
        let mut header = format!("{}  confidence: {confidence}", self.header(faculty));
        if let FacultyOutput::Mind(mind) = output {
            let valence = if mind.valence >= 0.0 {
                self.paint(ANSI_GREEN, &format!("+{:.2}", mind.valence))
            } else {
                self.paint(ANSI_RED, &format!("{:.2}", mind.valence))
            };
            header.push_str(&format!("  valence: {valence}"));
        }
        self.line("");
        self.line(&header);

        if let FacultyOutput::Habits(habits) = output {
            if !habits.activated_habits.is_empty() {
                let activated = habits
                    .activated_habits
                    .iter()
                    .map(|h| format!("{} (w:{:.1})", h.name, h.weight))
                    .collect::<Vec<_>>()
                    .join(", ");
                let activated = self.paint(ANSI_GRAY, &format!("  Activated: {activated}"));
                self.line(&activated);
            }
        }

        let response = self.paint(Self::faculty_style(faculty), output.response());
        self.line(&response);

        if let FacultyOutput::Intellect(intellect) = output {
            if !intellect.reasoning_chain.is_empty() {
                let chain = intellect.reasoning_chain.join(" → ");
                let chain = self.paint(ANSI_GRAY, &format!("  Reasoning: {chain}"));
                self.line(&chain);
            }
        }
    }

    fn print_faculty_failed(&mut self, faculty: Faculty) {
        let failed = format!("{}  {}", self.header(faculty), self.paint(ANSI_RED, "failed"));
        self.line("");
        self.line(&failed);
    }

    fn print_synthesizing(&mut self) {
        let text = self.paint(ANSI_GRAY, "Synthesizing...");
        self.line("");
        self.line(&text);
    }

    fn print_synthesis(&mut self, synthesis: &SynthesisOutput) {
        let weights = synthesis
            .weights
            .iter()
            .map(|(name, weight)| format!("{name}={:.0}%", weight * 100.0))
            .collect::<Vec<_>>()
            .join(" ");
        let title = self.paint(
            &format!("{ANSI_BOLD}{ANSI_YELLOW}"),
            "[Soul (Synthesized)]",
        );
        let header = format!("{title}  weights: {}", self.paint(ANSI_GRAY, &weights));
        let response = self.paint(ANSI_BOLD, &synthesis.response);
        self.line("");
        self.line(&header);
        self.line(&response);
    }

    fn print_trainer_needed(&mut self, escalation: &TrainerEscalation) {
        let title = self.paint(&format!("{ANSI_BOLD}{ANSI_YELLOW}"), "[Trainer Needed]");
        let question = self.paint(ANSI_BOLD, &escalation.trigger_summary);
        let hint = self.paint(
            ANSI_GRAY,
            &format!(
                "  Answer with /respond {} <guidance> [| <application note>]",
                escalation.learning_id
            ),
        );
        self.line("");
        self.line(&format!("{title}  learning #{}", escalation.learning_id));
        self.line(&question);
        if !escalation.question_context.is_empty() {
            let context = self.paint(
                ANSI_GRAY,
                &format!("  Context: {}", escalation.question_context),
            );
            self.line(&context);
        }
        self.line(&hint);
    }

    fn finish_turn(&mut self, message: &SoulMessage) {
        if let Some(error) = &message.error {
            let error = self.paint(ANSI_RED, &format!("Error: {error}"));
            self.line("");
            self.line(&error);
        } else if message.is_incomplete() {
            let missing = Faculty::ALL
                .iter()
                .filter(|f| !message.status(**f).is_terminal())
                .map(|f| short_name(*f))
                .chain((!message.synthesis_status.is_terminal()).then_some("synthesis"))
                .collect::<Vec<_>>()
                .join(", ");
            let note = self.paint(ANSI_YELLOW, &format!("[incomplete: no {missing}]"));
            self.line("");
            self.line(&note);
        }

        let mut footer = String::from(" ");
        if let Some(elapsed_ms) = message.elapsed_ms {
            footer.push_str(&format!("{elapsed_ms}ms "));
        }
        if let Some(usage) = &message.token_usage {
            footer.push_str(&format!(
                "{}/{} tokens ",
                usage.input_tokens, usage.output_tokens
            ));
        }
        let footer = format!(
            "{}{}{}",
            self.separator(),
            self.paint(ANSI_GRAY, &footer),
            self.separator()
        );
        self.line("");
        self.line(&footer);
        self.line("");
    }

    fn print_error(&mut self, error: &str) {
        let error = self.paint(ANSI_RED, &format!("Error: {error}"));
        self.line("");
        self.line(&error);
    }

    fn print_info(&mut self, info: &str) {
        let info = self.paint(ANSI_BLUE, info);
        self.line(&info);
    }

    fn print_interrupted(&mut self) {
        self.line("");
        self.line("[interrupted]");
    }
}

fn short_name(faculty: Faculty) -> &'static str {
    match faculty {
        Faculty::Mind => "mind",
        Faculty::Intellect => "intellect",
        Faculty::Habits => "habits",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ActivatedHabit, ChatResponse, HabitsOutput, IntellectOutput, MindOutput, TokenUsage,
    };
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
    }

    impl Renderer for Recording {
        fn print_faculty(&mut self, output: &FacultyOutput) {
            self.calls
                .push(format!("faculty {}", output.faculty().wire_name()));
        }

        fn print_faculty_failed(&mut self, faculty: Faculty) {
            self.calls.push(format!("failed {}", faculty.wire_name()));
        }

        fn print_synthesizing(&mut self) {
            self.calls.push("synthesizing".to_string());
        }

        fn print_synthesis(&mut self, synthesis: &SynthesisOutput) {
            self.calls.push(format!("synthesis {}", synthesis.response));
        }

        fn print_trainer_needed(&mut self, escalation: &TrainerEscalation) {
            self.calls.push(format!("trainer {}", escalation.learning_id));
        }

        fn finish_turn(&mut self, _: &SoulMessage) {
            self.calls.push("finish".to_string());
        }

        fn print_error(&mut self, _: &str) {}

        fn print_info(&mut self, _: &str) {}

        fn print_interrupted(&mut self) {}
    }

    fn settled() -> SoulMessage {
        SoulMessage::from_response(
            "msg-2",
            ChatResponse {
                manas: MindOutput::new("I feel warm", 0.8, -0.25),
                buddhi: IntellectOutput::new(
                    "A greeting",
                    0.7,
                    vec!["greeting".to_string(), "reply".to_string()],
                ),
                sanskaras: HabitsOutput::new(
                    "Greet back",
                    0.6,
                    vec![ActivatedHabit::new("warmth", 1.2)],
                ),
                synthesis: SynthesisOutput::new(
                    "Hi there",
                    BTreeMap::from([("buddhi".to_string(), 0.4), ("manas".to_string(), 0.35)]),
                ),
                elapsed_ms: 1200,
                mode: None,
                trainer_needed: None,
            },
        )
    }

    #[test]
    fn progress_reports_each_change_once() {
        let mut renderer = Recording::default();
        let initial = SoulMessage::new("msg-2");
        let mut partial = initial.clone();
        partial.mind = settled().mind;
        partial.mind_status = FacultyStatus::Done;
        partial.synthesis_status = FacultyStatus::Loading;
        render_progress(&mut renderer, &initial, &partial);
        render_progress(&mut renderer, &partial, &partial);
        render_progress(&mut renderer, &partial, &settled());
        assert_eq!(
            renderer.calls,
            vec![
                "faculty manas",
                "synthesizing",
                "faculty buddhi",
                "faculty sanskaras",
                "synthesis Hi there",
                "finish",
            ]
        );
    }

    #[test]
    fn progress_reports_trainer_instead_of_placeholder() {
        let mut renderer = Recording::default();
        let initial = SoulMessage::new("msg-2");
        let mut escalated = initial.clone();
        escalated.trainer = Some(TrainerEscalation::new(42, "How?", ""));
        escalated.synthesis = Some(SynthesisOutput::new("placeholder", BTreeMap::new()));
        escalated.synthesis_status = FacultyStatus::Done;
        render_progress(&mut renderer, &initial, &escalated);
        assert_eq!(renderer.calls, vec!["trainer 42"]);
    }

    #[test]
    fn progress_reports_failures() {
        let mut renderer = Recording::default();
        let initial = SoulMessage::new("msg-2");
        let mut failed = initial.clone();
        failed.intellect_status = FacultyStatus::Error;
        failed.streaming = false;
        render_progress(&mut renderer, &initial, &failed);
        assert_eq!(renderer.calls, vec!["failed buddhi", "finish"]);
    }

    #[test]
    fn plain_text_output() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let message = settled();
        render_progress(&mut renderer, &SoulMessage::new("msg-2"), &message);
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("[Mind (Manas)]  confidence: 0.80  valence: -0.25"));
        assert!(text.contains("[Intellect (Buddhi)]  confidence: 0.70"));
        assert!(text.contains("  Reasoning: greeting → reply"));
        assert!(text.contains("  Activated: warmth (w:1.2)"));
        assert!(text.contains("[Soul (Synthesized)]  weights: buddhi=40% manas=35%"));
        assert!(text.contains("Hi there"));
        assert!(text.contains(" 1200ms "));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn plain_text_incomplete_footer() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let mut message = SoulMessage::new("msg-2");
        message.mind_status = FacultyStatus::Done;
        message.streaming = false;
        message.token_usage = Some(TokenUsage::new(10, 5));
        renderer.finish_turn(&message);
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("[incomplete: no intellect, habits, synthesis]"));
        assert!(text.contains("10/5 tokens"));
    }

    #[test]
    fn colored_output_uses_ansi() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        renderer.print_error("boom");
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains(ANSI_RED));
        assert!(text.contains("Error: boom"));
    }
}
