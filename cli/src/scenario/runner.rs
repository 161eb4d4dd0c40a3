//! Executes a scenario against an in-memory session

use super::recorder::{RecordedEvent, RecordingTranscript};
use super::{Scenario, Step};
use anyhow::{Context, Result};
use serde::Serialize;
use stagegate_application::{
    ChatStageUseCase, ChatStageView, ChatStageViews, CoordinationConfig, FixedIdentity,
    MediatorUseCase, SharedDocumentStore, StageTransitionController, TranscriptLogger,
    TranscriptObserver,
};
use stagegate_domain::{
    Participant, ParticipantId, ReadinessTally, SessionId, StageName, StageState, TransitionKey,
    TransitionState,
};
use stagegate_infrastructure::SessionStageProgression;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const MEDIATOR_ID: &str = "mediator";

/// Result of one scripted step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// 1-based position in the scenario
    pub index: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Transition state of one stage at the end of the run
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: StageName,
    pub transition: TransitionState,
    /// Readiness of whoever is still on the stage, e.g. `[●○]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<String>,
}

/// Where a participant ended up
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantReport {
    pub id: ParticipantId,
    pub name: String,
    pub current_stage: StageName,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session: SessionId,
    pub concurrent: bool,
    pub version: u64,
    pub steps: Vec<StepOutcome>,
    pub events: Vec<RecordedEvent>,
    pub stages: Vec<StageReport>,
    pub participants: Vec<ParticipantReport>,
    /// Last published first-stage view per initialised participant
    pub views: Vec<ChatStageView>,
}

impl RunReport {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.succeeded()).count()
    }
}

/// Wires a store, transition controller, views and transcript for a scenario
pub struct ScenarioRunner {
    config: CoordinationConfig,
    sink: Option<Arc<dyn TranscriptLogger>>,
}

impl ScenarioRunner {
    pub fn new(config: CoordinationConfig) -> Self {
        Self { config, sink: None }
    }

    /// Also write every transcript event to `sink`
    pub fn with_transcript_sink(mut self, sink: Arc<dyn TranscriptLogger>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn run(&self, scenario: &Scenario, concurrent: bool) -> Result<RunReport> {
        let recorder = Arc::new(RecordingTranscript::new(self.sink.clone()));
        let transcript: Arc<dyn TranscriptLogger> = recorder.clone();

        let session = SessionId::new(scenario.session.clone());
        let stages: Vec<StageName> = scenario.stages.iter().map(|s| StageName::new(s.clone())).collect();
        let first = stages.first().cloned().context("Scenario has no stages")?;

        // === Dependency Injection ===
        let store = Arc::new(SharedDocumentStore::new(session.clone(), stages.clone()));
        store.subscribe(Arc::new(TranscriptObserver::new(Arc::clone(&transcript))))?;
        let controller = Arc::new(
            StageTransitionController::new(
                Arc::new(SessionStageProgression::new(&store)),
                &self.config,
            )
            .with_store(&store)
            .with_transcript(Arc::clone(&transcript)),
        );
        store.subscribe(controller.clone())?;

        for participant in &scenario.participants {
            let id = ParticipantId::new(participant.id.clone());
            store.join(Participant::new(id.clone(), participant.profile(), first.clone()))?;
            if !participant.uninitialized {
                store.init_stage(&id, &first, StageState::silent())?;
            }
        }

        let mediator = MediatorUseCase::new(Arc::clone(&store), MEDIATOR_ID)
            .with_transcript(Arc::clone(&transcript));
        for pair in &scenario.pairs {
            mediator.seed_pair_for_stage(&first, &pair.to_item_pair())?;
        }

        let views = scenario
            .participants
            .iter()
            .filter(|p| !p.uninitialized)
            .map(|p| ChatStageViews::attach(&store, ParticipantId::new(p.id.clone()), first.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            session = %session,
            participants = scenario.participants.len(),
            steps = scenario.steps.len(),
            concurrent,
            "Running scenario"
        );

        let context = Arc::new(StepContext {
            store: Arc::clone(&store),
            mediator,
            config: self.config.clone(),
            transcript,
            first,
        });
        let steps = if concurrent {
            run_concurrent(context, &scenario.steps).await?
        } else {
            scenario
                .steps
                .iter()
                .enumerate()
                .map(|(index, step)| context.execute(index, step))
                .collect()
        };

        let snapshot = store.read()?;
        let stage_reports = stages
            .iter()
            .map(|stage| -> Result<StageReport> {
                let key = TransitionKey::new(session.clone(), stage.clone());
                let readiness = snapshot
                    .participants()
                    .find(|p| p.is_on_stage(stage))
                    .and_then(|p| ReadinessTally::evaluate(&snapshot, stage, p.id()).ok())
                    .map(|tally| tally.summary());
                Ok(StageReport {
                    stage: stage.clone(),
                    transition: controller.state(&key)?,
                    readiness,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RunReport {
            session,
            concurrent,
            version: snapshot.version(),
            steps,
            events: recorder.events(),
            stages: stage_reports,
            participants: snapshot
                .participants()
                .map(|p| ParticipantReport {
                    id: p.id().clone(),
                    name: p.profile().name.clone(),
                    current_stage: p.current_stage_name().clone(),
                })
                .collect(),
            views: views.iter().map(|v| v.current()).collect(),
        })
    }
}

/// Shared by every task executing steps
struct StepContext {
    store: Arc<SharedDocumentStore>,
    mediator: MediatorUseCase,
    config: CoordinationConfig,
    transcript: Arc<dyn TranscriptLogger>,
    first: StageName,
}

impl StepContext {
    fn execute(&self, index: usize, step: &Step) -> StepOutcome {
        let mut outcome = StepOutcome {
            index: index + 1,
            action: step.label(),
            participant: step.participant().map(str::to_string),
            stage: None,
            version: None,
            error: None,
        };

        match self.apply(step) {
            Ok((stage, version)) => {
                debug!(step = outcome.index, action = outcome.action, version, "Step applied");
                outcome.stage = Some(stage);
                outcome.version = Some(version);
            }
            Err(e) => {
                warn!(step = outcome.index, action = outcome.action, error = %e, "Step failed");
                outcome.error = Some(format!("{:#}", e));
            }
        }
        outcome
    }

    fn apply(&self, step: &Step) -> Result<(StageName, u64)> {
        match step {
            Step::Send { participant, text } => {
                let chat = self.chat_for(participant)?;
                let snapshot = chat.send_message(text)?;
                Ok((chat.stage().clone(), snapshot.version()))
            }
            Step::Ready { participant } | Step::Unready { participant } => {
                let chat = self.chat_for(participant)?;
                let snapshot = chat.toggle_readiness(matches!(step, Step::Ready { .. }))?;
                Ok((chat.stage().clone(), snapshot.version()))
            }
            Step::Mediator { participant, text } => {
                let id = ParticipantId::new(participant.clone());
                let stage = self.current_stage(&id)?;
                let snapshot = self.mediator.post_message(&id, &stage, text)?;
                Ok((stage, snapshot.version()))
            }
            Step::Seed {
                first,
                second,
                stage,
            } => {
                let stage = stage
                    .as_ref()
                    .map(|s| StageName::new(s.clone()))
                    .unwrap_or_else(|| self.first.clone());
                let pair = super::ScenarioPair {
                    first: first.clone(),
                    second: second.clone(),
                }
                .to_item_pair();
                self.mediator.seed_pair_for_stage(&stage, &pair)?;
                Ok((stage, self.store.read()?.version()))
            }
        }
    }

    /// The chat use case for a participant on the stage it is on right now
    fn chat_for(&self, participant: &str) -> Result<ChatStageUseCase> {
        let id = ParticipantId::new(participant);
        let stage = self.current_stage(&id)?;
        Ok(ChatStageUseCase::new(
            Arc::clone(&self.store),
            &FixedIdentity::new(id, stage),
            &self.config,
        )
        .with_transcript(Arc::clone(&self.transcript)))
    }

    fn current_stage(&self, id: &ParticipantId) -> Result<StageName> {
        Ok(self
            .store
            .read()?
            .participant(id)?
            .current_stage_name()
            .clone())
    }
}

/// Each participant's steps run in order on one blocking task; seeding runs
/// on its own task. Outcomes come back in scenario order.
async fn run_concurrent(context: Arc<StepContext>, steps: &[Step]) -> Result<Vec<StepOutcome>> {
    let mut groups: BTreeMap<Option<String>, Vec<(usize, Step)>> = BTreeMap::new();
    for (index, step) in steps.iter().enumerate() {
        groups
            .entry(step.participant().map(str::to_string))
            .or_default()
            .push((index, step.clone()));
    }

    let mut set = JoinSet::new();
    for (_, group) in groups {
        let context = Arc::clone(&context);
        set.spawn_blocking(move || {
            group
                .iter()
                .map(|(index, step)| context.execute(*index, step))
                .collect::<Vec<_>>()
        });
    }

    let mut outcomes = Vec::with_capacity(steps.len());
    while let Some(joined) = set.join_next().await {
        outcomes.extend(joined?);
    }
    outcomes.sort_by_key(|o| o.index);
    Ok(outcomes)
}
