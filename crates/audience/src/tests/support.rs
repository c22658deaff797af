//! Recording doubles shared by the coordinator, drive loop and session tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use meeting::{HandSignalSource, MeetingLink, SignalSourceConnector};
use robot::{Actuator, ActuatorConnector};
use shared::{
    domain::ActuatorCommand,
    error::{ActuatorError, SourceError},
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Command(ActuatorCommand),
    SourceReleased,
    ActuatorReleased,
}

/// Ordered log of everything the doubles were asked to do.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub async fn push(&self, event: Event) {
        self.0.lock().await.push(event);
    }

    pub async fn events(&self) -> Vec<Event> {
        self.0.lock().await.clone()
    }

    /// Successful actuator commands only.
    pub async fn commands(&self) -> Vec<ActuatorCommand> {
        self.events()
            .await
            .into_iter()
            .filter_map(|event| match event {
                Event::Command(command) => Some(command),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingActuator {
    journal: Journal,
    // Remaining failures per command; u32::MAX fails forever.
    failures: Mutex<HashMap<ActuatorCommand, u32>>,
    attempts: AtomicU32,
}

impl RecordingActuator {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            failures: Mutex::new(HashMap::new()),
            attempts: AtomicU32::new(0),
        })
    }

    pub async fn fail(&self, command: ActuatorCommand, times: u32) {
        self.failures.lock().await.insert(command, times);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn execute(&self, command: ActuatorCommand) -> Result<(), ActuatorError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        {
            let mut failures = self.failures.lock().await;
            if let Some(remaining) = failures.get_mut(&command) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(ActuatorError::command(command, "servo stalled"));
                }
            }
        }
        self.journal.push(Event::Command(command)).await;
        Ok(())
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn raise(&self) -> Result<(), ActuatorError> {
        self.execute(ActuatorCommand::Raise).await
    }

    async fn lower(&self) -> Result<(), ActuatorError> {
        self.execute(ActuatorCommand::Lower).await
    }

    async fn wiggle(&self) -> Result<(), ActuatorError> {
        self.execute(ActuatorCommand::Wiggle).await
    }

    async fn release(&self) -> Result<(), ActuatorError> {
        self.journal.push(Event::ActuatorReleased).await;
        Ok(())
    }
}

/// Replays queued poll results; once drained, repeats the last one.
pub struct ScriptedSource {
    journal: Journal,
    replies: Mutex<VecDeque<Result<i64, SourceError>>>,
    last: Mutex<Result<i64, SourceError>>,
    latency: Duration,
    polls: AtomicU32,
}

impl ScriptedSource {
    pub fn new(journal: Journal, replies: Vec<Result<i64, SourceError>>) -> Arc<Self> {
        Self::with_latency(journal, replies, Duration::ZERO)
    }

    pub fn with_latency(
        journal: Journal,
        replies: Vec<Result<i64, SourceError>>,
        latency: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            journal,
            replies: Mutex::new(replies.into()),
            last: Mutex::new(Ok(0)),
            latency,
            polls: AtomicU32::new(0),
        })
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HandSignalSource for ScriptedSource {
    async fn current_raised_hand_count(&self) -> Result<i64, SourceError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.replies.lock().await.pop_front();
        let mut last = self.last.lock().await;
        if let Some(reply) = next {
            *last = reply;
        }
        last.clone()
    }

    async fn release(&self) -> Result<(), SourceError> {
        self.journal.push(Event::SourceReleased).await;
        Ok(())
    }
}

pub struct FixedSourceConnector(pub Arc<ScriptedSource>);

#[async_trait]
impl SignalSourceConnector for FixedSourceConnector {
    async fn join(&self, _link: &MeetingLink) -> Result<Arc<dyn HandSignalSource>, SourceError> {
        Ok(self.0.clone())
    }
}

/// Admits the bot only after `delay`, like a bridge that is slow to join.
pub struct SlowSourceConnector {
    pub source: Arc<ScriptedSource>,
    pub delay: Duration,
}

#[async_trait]
impl SignalSourceConnector for SlowSourceConnector {
    async fn join(&self, _link: &MeetingLink) -> Result<Arc<dyn HandSignalSource>, SourceError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.source.clone())
    }
}

pub struct StalledSourceConnector;

#[async_trait]
impl SignalSourceConnector for StalledSourceConnector {
    async fn join(&self, _link: &MeetingLink) -> Result<Arc<dyn HandSignalSource>, SourceError> {
        std::future::pending().await
    }
}

pub enum ActuatorConnectorReply {
    Connected(Arc<RecordingActuator>),
    Unreachable,
}

#[async_trait]
impl ActuatorConnector for ActuatorConnectorReply {
    async fn connect(&self) -> Result<Arc<dyn Actuator>, ActuatorError> {
        match self {
            Self::Connected(actuator) => Ok(actuator.clone()),
            Self::Unreachable => Err(ActuatorError::Connect("robot offline".into())),
        }
    }
}
