//! Interview session — owns the conversation state and drives it.
//!
//! All mutations happen on one driver task. Submissions from the input surface
//! and timer expirations from the [`TurnScheduler`] are sent to it over a
//! channel, fed through [`reduce`], and the resulting effects are executed
//! there. Renderers observe a `watch` channel of [`Snapshot`]s published after
//! every accepted event.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::InterviewConfig;

use super::machine::{reduce, Effect, Event, Outcome, Rejection};
use super::scheduler::{TimerKind, TurnScheduler};
use super::script::PromptScript;
use super::state::{ConversationState, Phase, Snapshot};

enum Command {
    Dispatch {
        event: Event,
        reply: Option<oneshot::Sender<Outcome>>,
    },
    Shutdown,
}

/// A live interview. Dropping it tears it down.
pub struct InterviewSession {
    id: Uuid,
    script: Arc<PromptScript>,
    tx: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    scheduler: Arc<TurnScheduler>,
    driver: JoinHandle<()>,
}

impl InterviewSession {
    /// Start a session on the current tokio runtime.
    ///
    /// The script was validated when it was built, so starting cannot fail.
    pub fn start(script: Arc<PromptScript>, config: &InterviewConfig) -> Self {
        let id = Uuid::new_v4();
        let state = ConversationState::new(&script, Utc::now());
        let (snapshot_tx, snapshots) = watch::channel(state.snapshot(id));
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(TurnScheduler::new(id));

        let driver = Driver {
            id,
            script: Arc::clone(&script),
            state,
            scheduler: Arc::clone(&scheduler),
            commands: tx.clone(),
            snapshots: snapshot_tx,
            thinking_delay: config.thinking_delay,
            offer_reveal_delay: config.offer_reveal_delay,
        };
        let driver = tokio::spawn(driver.run(rx));

        info!(session_id = %id, prompts = script.len(), "Interview session started");

        Self {
            id,
            script,
            tx,
            snapshots,
            scheduler,
            driver,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn script(&self) -> &Arc<PromptScript> {
        &self.script
    }

    /// Submit a response. The outcome may be ignored; rejected submissions
    /// change nothing.
    pub async fn submit(&self, text: impl Into<String>) -> Outcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = Command::Dispatch {
            event: Event::submit(text),
            reply: Some(reply_tx),
        };
        if self.tx.send(command).is_err() {
            return Outcome::Rejected(Rejection::SessionClosed);
        }
        reply_rx
            .await
            .unwrap_or(Outcome::Rejected(Rejection::SessionClosed))
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receive a snapshot after every accepted event.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`.
    ///
    /// Returns `None` if the session closes first.
    pub async fn wait_for(&self, predicate: impl FnMut(&Snapshot) -> bool) -> Option<Snapshot> {
        let mut rx = self.subscribe();
        let snapshot = rx.wait_for(predicate).await.ok()?;
        Some(snapshot.clone())
    }

    pub fn is_live(&self) -> bool {
        self.scheduler.is_live() && !self.driver.is_finished()
    }

    /// Cancel pending timers and stop the driver. Idempotent.
    pub fn teardown(&self) {
        if !self.scheduler.is_live() {
            return;
        }
        self.scheduler.cancel_all();
        let _ = self.tx.send(Command::Shutdown);
        info!(session_id = %self.id, "Interview session torn down");
    }
}

impl Drop for InterviewSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// The single logical thread that mutates a session's state.
struct Driver {
    id: Uuid,
    script: Arc<PromptScript>,
    state: ConversationState,
    scheduler: Arc<TurnScheduler>,
    /// Handed to timers so they can report back.
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Sender<Snapshot>,
    thinking_delay: Duration,
    offer_reveal_delay: Duration,
}

impl Driver {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Shutdown => break,
                Command::Dispatch { event, reply } => {
                    let outcome = self.handle(event);
                    if let Some(reply) = reply {
                        let _ = reply.send(outcome);
                    }
                }
            }
        }
        self.scheduler.cancel_all();
        debug!(session_id = %self.id, "Session driver stopped");
    }

    fn handle(&mut self, event: Event) -> Outcome {
        let name = event.name();
        if !self.scheduler.is_live() {
            debug!(session_id = %self.id, event = name, "Event after teardown ignored");
            return Outcome::Rejected(Rejection::SessionClosed);
        }

        let transition = reduce(&self.state, &self.script, event);
        if let Outcome::Rejected(reason) = transition.outcome {
            debug!(session_id = %self.id, event = name, %reason, "Event rejected");
            return transition.outcome;
        }

        let from = self.state.phase();
        self.state = transition.state;
        let to = self.state.phase();
        debug!(
            session_id = %self.id,
            event = name,
            %from,
            %to,
            index = self.state.current_prompt_index(),
            "Session advanced"
        );
        match to {
            Phase::Complete if from != Phase::Complete => {
                info!(session_id = %self.id, entries = self.state.transcript().len(), "Interview complete");
            }
            Phase::OfferRevealed => info!(session_id = %self.id, "Offer revealed"),
            _ => {}
        }

        self.snapshots.send_replace(self.state.snapshot(self.id));

        for effect in transition.effects {
            self.apply(effect);
        }
        Outcome::Accepted
    }

    fn apply(&self, effect: Effect) {
        match effect {
            Effect::ScheduleThinking => {
                self.schedule(TimerKind::Thinking, self.thinking_delay, Event::thinking_elapsed)
            }
            Effect::ScheduleOfferReveal => {
                self.schedule(TimerKind::OfferReveal, self.offer_reveal_delay, || {
                    Event::RevealOffer
                })
            }
            Effect::SectionStarted { section_id } => {
                let title = self
                    .script
                    .section(&section_id)
                    .map(|s| s.title.as_str())
                    .unwrap_or_default();
                info!(session_id = %self.id, section = %section_id, title, "Section started");
            }
        }
    }

    fn schedule(&self, kind: TimerKind, delay: Duration, make_event: fn() -> Event) {
        let commands = self.commands.clone();
        self.scheduler.schedule(kind, delay, move || async move {
            // Nobody is listening once the driver has stopped.
            let _ = commands.send(Command::Dispatch {
                event: make_event(),
                reply: None,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;
    use crate::interview::state::Speaker;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_config() -> InterviewConfig {
        InterviewConfig {
            thinking_delay: Duration::from_millis(10),
            offer_reveal_delay: Duration::from_millis(20),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn starts_with_first_prompt_showing() {
        let session = InterviewSession::start(Arc::new(PromptScript::career_intake()), &fast_config());
        let snap = session.snapshot();

        assert_eq!(snap.session_id, session.id());
        assert_eq!(snap.phase, Phase::AwaitingInput);
        assert_eq!(snap.transcript.len(), 1);
        assert_eq!(snap.transcript[0].speaker, Speaker::Prompter);
        assert!(session.is_live());
    }

    #[tokio::test]
    async fn submit_then_prompt_after_delay() {
        timeout(TEST_TIMEOUT, async {
            let session =
                InterviewSession::start(Arc::new(PromptScript::career_intake()), &fast_config());

            assert_eq!(session.submit("Product manager at Acme").await, Outcome::Accepted);
            let snap = session.snapshot();
            assert!(snap.is_awaiting_response);
            assert!(!snap.accepts_input());

            let snap = session
                .wait_for(|s| s.phase == Phase::AwaitingInput)
                .await
                .unwrap();
            assert_eq!(snap.transcript.len(), 3);
            assert_eq!(snap.transcript[2].text, session.script().prompt(1).unwrap().text);
        })
        .await
        .expect("test timed out");
    }

    #[tokio::test]
    async fn busy_session_rejects_second_submit() {
        timeout(TEST_TIMEOUT, async {
            let session =
                InterviewSession::start(Arc::new(PromptScript::career_intake()), &fast_config());

            assert!(session.submit("one").await.is_accepted());
            assert_eq!(
                session.submit("two").await,
                Outcome::Rejected(Rejection::WrongPhase(Phase::Thinking))
            );
            assert_eq!(session.snapshot().count(Speaker::Respondent), 1);
        })
        .await
        .expect("test timed out");
    }

    #[tokio::test]
    async fn submit_after_teardown_is_rejected() {
        timeout(TEST_TIMEOUT, async {
            let session =
                InterviewSession::start(Arc::new(PromptScript::career_intake()), &fast_config());
            session.teardown();
            session.teardown();

            assert_eq!(
                session.submit("hello").await,
                Outcome::Rejected(Rejection::SessionClosed)
            );
            assert!(!session.is_live());
            assert_eq!(session.snapshot().transcript.len(), 1);
        })
        .await
        .expect("test timed out");
    }

    #[tokio::test]
    async fn timer_event_after_cancel_is_ignored() {
        timeout(TEST_TIMEOUT, async {
            let config = InterviewConfig {
                thinking_delay: Duration::from_millis(500),
                ..fast_config()
            };
            let session = InterviewSession::start(Arc::new(PromptScript::career_intake()), &config);
            assert!(session.submit("one").await.is_accepted());
            assert_eq!(session.snapshot().phase, Phase::Thinking);

            // The driver is still running; only the scheduler is dead.
            session.scheduler.cancel_all();
            let (reply, outcome) = oneshot::channel();
            let sent = session.tx.send(Command::Dispatch {
                event: Event::thinking_elapsed(),
                reply: Some(reply),
            });
            assert!(sent.is_ok(), "driver stopped early");

            assert_eq!(outcome.await.unwrap(), Outcome::Rejected(Rejection::SessionClosed));
            let snap = session.snapshot();
            assert_eq!(snap.transcript.len(), 2);
            assert_eq!(snap.transcript[1].speaker, Speaker::Respondent);
            assert_eq!(snap.phase, Phase::Thinking);
        })
        .await
        .expect("test timed out");
    }
}
