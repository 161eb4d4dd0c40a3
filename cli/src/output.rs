//! Console output for scenario reports

use crate::scenario::{RecordedEvent, RunReport};
use colored::Colorize;
use stagegate_application::QuorumStatus;
use stagegate_domain::TransitionState;

/// Formats run reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete report
    pub fn format(report: &RunReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Session {}", report.session)));
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n",
            "Mode:".cyan().bold(),
            if report.concurrent { "concurrent" } else { "sequential" }
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Final version:".cyan().bold(),
            report.version
        ));

        output.push_str(&Self::section_header("Steps"));
        for step in &report.steps {
            let who = step.participant.as_deref().unwrap_or("-");
            let line = format!("{:>3}. {:<8} {:<10}", step.index, step.action, who);
            match &step.error {
                None => output.push_str(&format!(
                    "{} {}\n",
                    line,
                    format!(
                        "@{} v{}",
                        step.stage.as_ref().map(|s| s.as_str()).unwrap_or("-"),
                        step.version.unwrap_or_default()
                    )
                    .dimmed()
                )),
                Some(error) => {
                    output.push_str(&format!("{} {}\n", line.red(), error.red()));
                }
            }
        }

        output.push_str(&Self::section_header("Events"));
        for event in &report.events {
            output.push_str(&format!("  {}\n", Self::event_line(event)));
        }

        output.push_str(&Self::section_header("Stages"));
        for stage in &report.stages {
            let state = match stage.transition {
                TransitionState::Fired => "fired".green().bold(),
                TransitionState::Pending => "pending".yellow(),
            };
            output.push_str(&format!(
                "  {:<12} {} {}\n",
                stage.stage.as_str(),
                state,
                stage.readiness.as_deref().unwrap_or("")
            ));
        }

        output.push_str(&Self::section_header("Participants"));
        for participant in &report.participants {
            output.push_str(&format!(
                "  {:<10} {:<16} now on {}\n",
                participant.id.as_str().bold(),
                participant.name,
                participant.current_stage.as_str().cyan()
            ));
        }

        if !report.views.is_empty() {
            output.push_str(&Self::section_header("Chat views"));
            for view in &report.views {
                let quorum = match &view.quorum {
                    QuorumStatus::Reached => "quorum reached".green().to_string(),
                    QuorumStatus::Waiting { pending } => format!(
                        "waiting for {}",
                        pending
                            .iter()
                            .map(|p| p.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                    .yellow()
                    .to_string(),
                    QuorumStatus::Incomplete { missing } => {
                        format!("{} has no state", missing).red().to_string()
                    }
                };
                output.push_str(&format!(
                    "  {:<10} {} messages, ready={}, silent={}, {}\n",
                    view.participant.as_str().bold(),
                    view.messages.len(),
                    view.ready_to_end_stage,
                    view.is_silent,
                    quorum
                ));
                if let Some(pair) = &view.current_discussion_pair {
                    output.push_str(&format!("  {:<10} discussing {}\n", "", pair));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(report: &RunReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn event_line(event: &RecordedEvent) -> String {
        let name = match event.event_type.as_str() {
            "quorum_reached" | "stage_transition" => event.event_type.green().bold(),
            "readiness_changed" => event.event_type.yellow(),
            _ => event.event_type.normal(),
        };
        let mut detail = event.payload.clone();
        if let Some(map) = detail.as_object_mut() {
            map.remove("session");
        }
        format!("{:<22} {}", name, detail.to_string().dimmed())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
