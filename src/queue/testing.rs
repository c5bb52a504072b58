//! Scripted queue source for consumer tests

use super::error::{ConnectError, ReceiveError};
use super::message::{RawMessage, ReceiveOutcome};
use super::traits::{QueueSession, QueueSource};
use crate::consumer::ConsumerState;
use crate::core::shutdown::ShutdownCoordinator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// What one `receive` call does
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Return a message immediately
    Message(&'static str),
    /// Return a message whose acknowledgement or rejection fails
    Unsettled(&'static str),
    /// Wait the full timeout, then report `Empty`
    Empty,
    /// Report `TransientEmpty` immediately
    TransientEmpty,
    /// Report a broker error immediately
    Fail(&'static str),
    /// Block for the given time, then report `Empty`
    Stall(Duration),
    /// Request shutdown, then perform the inner step
    ShutdownThen(Box<Step>),
    Panic,
}

/// What one `open` call does
#[derive(Debug, Clone)]
pub(crate) enum Connect {
    Refuse,
    Open(Vec<Step>),
    Panic,
}

/// Everything the scripted source observed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    ConnectAttempt,
    Opened(usize),
    Receive {
        session: usize,
        state: Option<ConsumerState>,
    },
    Acknowledged(usize),
    Rejected(usize),
    Closed(usize),
}

#[derive(Clone)]
pub(crate) struct ScriptedSource {
    connects: Arc<Mutex<VecDeque<Connect>>>,
    events: Arc<Mutex<Vec<Event>>>,
    shutdown: ShutdownCoordinator,
    state_probe: Arc<Mutex<Option<watch::Receiver<ConsumerState>>>>,
}

impl ScriptedSource {
    /// Once `connects` runs out every further connect attempt is refused
    pub(crate) fn new(connects: Vec<Connect>, shutdown: &ShutdownCoordinator) -> Self {
        Self {
            connects: Arc::new(Mutex::new(connects.into())),
            events: Arc::new(Mutex::new(Vec::new())),
            shutdown: shutdown.clone(),
            state_probe: Arc::new(Mutex::new(None)),
        }
    }

    /// Record the consumer state seen at every receive
    pub(crate) fn probe_state(&self, state: watch::Receiver<ConsumerState>) {
        *self.state_probe.lock().unwrap() = Some(state);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, matcher: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matcher(e)).count()
    }

    pub(crate) fn closes_of(&self, session: usize) -> usize {
        self.count(|e| *e == Event::Closed(session))
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl QueueSource for ScriptedSource {
    fn endpoint(&self) -> String {
        "SCRIPTED@localhost(0)".to_string()
    }

    async fn open(&self) -> Result<Box<dyn QueueSession>, ConnectError> {
        self.record(Event::ConnectAttempt);
        let next = self.connects.lock().unwrap().pop_front();
        match next {
            Some(Connect::Open(steps)) => {
                let id = self.count(|e| matches!(e, Event::Opened(_))) + 1;
                self.record(Event::Opened(id));
                Ok(Box::new(ScriptedSession {
                    id,
                    steps: steps.into(),
                    source: self.clone(),
                    open: true,
                    fail_settle: false,
                }))
            }
            Some(Connect::Panic) => panic!("scripted connect panic"),
            Some(Connect::Refuse) | None => Err(ConnectError::Transport {
                endpoint: self.endpoint(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

struct ScriptedSession {
    id: usize,
    steps: VecDeque<Step>,
    source: ScriptedSource,
    open: bool,
    fail_settle: bool,
}

impl ScriptedSession {
    async fn perform(&mut self, mut step: Step, timeout: Duration) -> ReceiveOutcome {
        while let Step::ShutdownThen(inner) = step {
            self.source.shutdown.trigger_shutdown();
            step = *inner;
        }
        match step {
            Step::Message(body) => {
                ReceiveOutcome::Message(RawMessage::new(body.as_bytes(), "orders.in"))
            }
            Step::Unsettled(body) => {
                self.fail_settle = true;
                ReceiveOutcome::Message(RawMessage::new(body.as_bytes(), "orders.in"))
            }
            Step::Empty => {
                tokio::time::sleep(timeout).await;
                ReceiveOutcome::Empty
            }
            Step::TransientEmpty => ReceiveOutcome::TransientEmpty,
            Step::Fail(message) => ReceiveOutcome::Error(ReceiveError::Broker {
                message: message.to_string(),
            }),
            Step::Stall(duration) => {
                tokio::time::sleep(duration).await;
                ReceiveOutcome::Empty
            }
            Step::Panic => panic!("scripted receive panic"),
            Step::ShutdownThen(_) => unreachable!("nested steps are unwrapped above"),
        }
    }
}

impl ScriptedSession {
    fn settle(&mut self) -> Result<(), ReceiveError> {
        if std::mem::take(&mut self.fail_settle) {
            return Err(ReceiveError::Settle {
                message: "broker dropped the delivery".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QueueSession for ScriptedSession {
    async fn receive(&mut self, timeout: Duration) -> ReceiveOutcome {
        let state = self
            .source
            .state_probe
            .lock()
            .unwrap()
            .as_ref()
            .map(|rx| *rx.borrow());
        self.source.record(Event::Receive {
            session: self.id,
            state,
        });
        if !self.open {
            return ReceiveOutcome::Error(ReceiveError::SessionClosed);
        }
        match self.steps.pop_front() {
            Some(step) => self.perform(step, timeout).await,
            None => ReceiveOutcome::Error(ReceiveError::Broker {
                message: "script exhausted".to_string(),
            }),
        }
    }

    async fn acknowledge(&mut self) -> Result<(), ReceiveError> {
        self.settle()?;
        self.source.record(Event::Acknowledged(self.id));
        Ok(())
    }

    async fn reject(&mut self) -> Result<(), ReceiveError> {
        self.settle()?;
        self.source.record(Event::Rejected(self.id));
        Ok(())
    }

    async fn close(&mut self) {
        self.open = false;
        self.source.record(Event::Closed(self.id));
    }
}
