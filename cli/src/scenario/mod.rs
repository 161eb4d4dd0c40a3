//! Scenario files
//!
//! A scenario describes one session and the steps its participants take:
//!
//! ```toml
//! session = "demo"
//! stages = ["chat", "survey"]
//!
//! [[participants]]
//! id = "alice"
//! name = "Alice"
//!
//! [[pairs]]
//! first = "rope"
//! second = "torch"
//!
//! [[steps]]
//! action = "send"
//! participant = "alice"
//! text = "Rope is more useful"
//!
//! [[steps]]
//! action = "ready"
//! participant = "alice"
//! ```

mod recorder;
mod runner;

pub use recorder::RecordedEvent;
pub use runner::{RunReport, ScenarioRunner};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use stagegate_domain::{Item, ItemPair, Profile};
use std::collections::BTreeSet;
use std::path::Path;

/// A participant joining the scenario session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioParticipant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
    /// Join without state for the first stage
    #[serde(default)]
    pub uninitialized: bool,
}

impl ScenarioParticipant {
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            avatar_url: self.avatar_url.clone(),
            pronouns: self.pronouns.clone(),
        }
    }
}

/// Two items to compare
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioPair {
    pub first: String,
    pub second: String,
}

impl ScenarioPair {
    pub fn to_item_pair(&self) -> ItemPair {
        ItemPair::new(
            Item::new(self.first.to_lowercase(), self.first.clone()),
            Item::new(self.second.to_lowercase(), self.second.clone()),
        )
    }
}

/// One scripted action
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// The participant sends a chat message
    Send { participant: String, text: String },
    /// The participant marks itself ready to end its current stage
    Ready { participant: String },
    /// The participant withdraws readiness
    Unready { participant: String },
    /// The mediator posts into the participant's log
    Mediator { participant: String, text: String },
    /// The seeding process appends a pair for every participant with state
    /// on `stage` (the first stage when omitted)
    Seed {
        first: String,
        second: String,
        #[serde(default)]
        stage: Option<String>,
    },
}

impl Step {
    /// The participant this step acts for, if any
    pub fn participant(&self) -> Option<&str> {
        match self {
            Step::Send { participant, .. }
            | Step::Ready { participant }
            | Step::Unready { participant }
            | Step::Mediator { participant, .. } => Some(participant),
            Step::Seed { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Send { .. } => "send",
            Step::Ready { .. } => "ready",
            Step::Unready { .. } => "unready",
            Step::Mediator { .. } => "mediator",
            Step::Seed { .. } => "seed",
        }
    }
}

/// A parsed scenario file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    pub session: String,
    pub stages: Vec<String>,
    #[serde(default)]
    pub participants: Vec<ScenarioParticipant>,
    /// Pairs seeded for every initialised participant before the steps run
    #[serde(default)]
    pub pairs: Vec<ScenarioPair>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Structural checks that do not need a running session
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            bail!("Scenario needs at least one stage");
        }

        let mut stages = BTreeSet::new();
        for stage in &self.stages {
            if !stages.insert(stage.as_str()) {
                bail!("Stage '{}' is listed twice", stage);
            }
        }

        let mut ids = BTreeSet::new();
        for participant in &self.participants {
            if !ids.insert(participant.id.as_str()) {
                bail!("Participant '{}' is listed twice", participant.id);
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(participant) = step.participant()
                && !ids.contains(participant)
            {
                bail!(
                    "Step {} ({}) refers to unknown participant '{}'",
                    index + 1,
                    step.label(),
                    participant
                );
            }
            if let Step::Seed {
                stage: Some(stage), ..
            } = step
                && !stages.contains(stage.as_str())
            {
                bail!("Step {} seeds unknown stage '{}'", index + 1, stage);
            }
        }
        Ok(())
    }

    pub fn first_stage(&self) -> &str {
        self.stages.first().map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"
session = "demo"
stages = ["chat", "survey"]

[[participants]]
id = "alice"
name = "Alice"
pronouns = "she/her"

[[participants]]
id = "bob"

[[pairs]]
first = "Rope"
second = "Torch"

[[steps]]
action = "send"
participant = "alice"
text = "hi"

[[steps]]
action = "seed"
first = "Map"
second = "Knife"

[[steps]]
action = "ready"
participant = "bob"
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(DEMO).unwrap();
        assert_eq!(scenario.session, "demo");
        assert_eq!(scenario.first_stage(), "chat");
        assert_eq!(scenario.participants.len(), 2);
        assert_eq!(scenario.participants[1].profile().name, "bob");
        assert_eq!(
            scenario.participants[0].profile().pronouns.as_deref(),
            Some("she/her")
        );
        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(scenario.steps[0].participant(), Some("alice"));
        assert_eq!(scenario.steps[1].participant(), None);

        let pair = scenario.pairs[0].to_item_pair();
        assert_eq!(pair.first().id, "rope");
        assert_eq!(pair.second().name, "Torch");
    }

    #[test]
    fn test_unknown_participant_rejected() {
        let text = r#"
session = "s"
stages = ["chat"]

[[steps]]
action = "ready"
participant = "ghost"
"#;
        let err = Scenario::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_empty_stages_rejected() {
        let text = "session = \"s\"\nstages = []\n";
        assert!(Scenario::from_toml_str(text).is_err());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let text = r#"
session = "s"
stages = ["chat"]

[[steps]]
action = "shout"
participant = "alice"
"#;
        assert!(Scenario::from_toml_str(text).is_err());
    }
}
