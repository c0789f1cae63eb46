//! User-facing console session.
//!
//! `ConsoleSession` owns one realtime connection, the fallback task client,
//! and the conversation timeline. Outbound commands and inbound frames are
//! folded into the timeline in the order they are processed.

use tokio::sync::watch;
use tracing::warn;

use crate::session::client::{ConnectionState, SessionClient, SessionConnection};
use crate::session::proto::{CommandFrame, EventFrame, PROBLEM_STATEMENT_SENDER};
use crate::task_api::TaskApiClient;
use crate::timeline::{Entry, Timeline};

/// Sender label for the user's own commands.
pub const USER_SENDER: &str = "user";
/// Sender label for fallback task responses.
pub const AGENT_SENDER: &str = "agent";
/// Sender label for client-side failure notices.
pub const SYSTEM_SENDER: &str = "system";

/// Timeline text appended when a fallback request fails.
pub const FALLBACK_FAILURE_TEXT: &str = "Failed to send message. Please try again.";

/// Prefix shown before user commands after the first one.
const COMMAND_PROMPT: &str = "$ ";

/// How an accepted command left the session, if at all.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendOutcome {
    /// Empty after trimming; nothing was appended or transmitted.
    Ignored,
    /// Written to the realtime channel.
    Realtime,
    /// Routed through the fallback request channel.
    Fallback,
}

/// Single conversation session against the console service.
///
/// The session holds exactly one realtime connection for its lifetime; the
/// timeline it owns is reset only by dropping the session, never by
/// reconnection.
#[derive(Debug)]
pub struct ConsoleSession {
    connection: SessionConnection,
    task_api: TaskApiClient,
    timeline: Timeline,
    sent_initial: bool,
}

impl ConsoleSession {
    /// Connects a new session with an empty timeline.
    pub fn connect(client: &SessionClient, task_api: TaskApiClient) -> Self {
        Self::from_connection(client.connect(), task_api)
    }

    /// Creates a session from an existing low-level connection.
    pub fn from_connection(connection: SessionConnection, task_api: TaskApiClient) -> Self {
        Self {
            connection,
            task_api,
            timeline: Timeline::new(),
            sent_initial: false,
        }
    }

    /// Returns a handle to the conversation timeline.
    pub fn timeline(&self) -> Timeline {
        self.timeline.clone()
    }

    /// Current lifecycle state of the realtime channel.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Returns a watch receiver observing lifecycle changes.
    ///
    /// A UI "connecting" indicator only needs
    /// [`ConnectionState::is_open`] on the watched value.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.connection.state_changes()
    }

    /// Submits a user command.
    ///
    /// The input is trimmed and ignored when empty. The session's first
    /// command is recorded under the problem-statement label with the
    /// literal input; later commands are recorded under the user label with
    /// a shell-style prompt. The caller-visible entry is appended before any
    /// transmission starts. Commands travel over the realtime channel while
    /// it is open and through the fallback request otherwise.
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        let entry = outbound_entry(self.sent_initial, text);
        self.sent_initial = true;
        self.timeline.append(entry);

        if self.connection.state().is_open()
            && self
                .connection
                .sender()
                .send(CommandFrame::new(text))
                .is_ok()
        {
            return SendOutcome::Realtime;
        }

        self.send_fallback(text).await;
        SendOutcome::Fallback
    }

    /// Runs a command through the fallback request channel.
    ///
    /// A successful reply is appended under the agent label. Any failure is
    /// reported as a single system entry and not retried.
    pub async fn send_fallback(&mut self, text: &str) {
        match self.task_api.run_task(text).await {
            Ok(reply) => {
                self.timeline.append(Entry::new(AGENT_SENDER, reply.response));
            }
            Err(err) => {
                warn!(event = "fallback_request_failed", error = %err);
                self.timeline
                    .append(Entry::new(SYSTEM_SENDER, FALLBACK_FAILURE_TEXT));
            }
        }
    }

    /// Receives the next inbound frame and folds it into the timeline.
    ///
    /// Frames without display text are dropped and the wait continues.
    /// Returns `None` once the transport worker is gone.
    pub async fn recv(&mut self) -> Option<Entry> {
        loop {
            let frame = self.connection.recv().await?;
            if let Some(entry) = entry_from_frame(frame) {
                self.timeline.append(entry.clone());
                return Some(entry);
            }
        }
    }

    /// Releases the realtime channel.
    ///
    /// In-flight fallback requests are not cancelled; their completions
    /// append through the shared timeline handle.
    pub fn close(self) {}
}

fn outbound_entry(sent_initial: bool, text: &str) -> Entry {
    if sent_initial {
        Entry::new(USER_SENDER, format!("{COMMAND_PROMPT}{text}"))
    } else {
        Entry::new(PROBLEM_STATEMENT_SENDER, text)
    }
}

fn entry_from_frame(frame: EventFrame) -> Option<Entry> {
    let text = frame.text?;
    let sender = frame
        .sender
        .unwrap_or_else(|| PROBLEM_STATEMENT_SENDER.to_string());
    Some(Entry::new(sender, text))
}

#[cfg(test)]
mod tests {
    use super::{entry_from_frame, outbound_entry, USER_SENDER};
    use crate::session::proto::{EventFrame, PROBLEM_STATEMENT_SENDER};

    #[test]
    fn first_command_is_recorded_as_problem_statement() {
        let entry = outbound_entry(false, "disk pressure on node-3");
        assert_eq!(entry.sender, PROBLEM_STATEMENT_SENDER);
        assert_eq!(entry.text, "disk pressure on node-3");
    }

    #[test]
    fn later_commands_get_the_shell_prompt() {
        let entry = outbound_entry(true, "kubectl get pods");
        assert_eq!(entry.sender, USER_SENDER);
        assert_eq!(entry.text, "$ kubectl get pods");
    }

    #[test]
    fn frames_without_text_are_dropped() {
        let frame = EventFrame {
            sender: Some("agent".to_string()),
            text: None,
        };
        assert!(entry_from_frame(frame).is_none());
    }

    #[test]
    fn frames_without_sender_default_to_problem_statement() {
        let frame = EventFrame {
            sender: None,
            text: Some("hello".to_string()),
        };
        let entry = entry_from_frame(frame).expect("frame carries text");
        assert_eq!(entry.sender, PROBLEM_STATEMENT_SENDER);
        assert_eq!(entry.text, "hello");
    }

    #[test]
    fn service_sender_labels_are_kept_verbatim() {
        let frame = EventFrame {
            sender: Some("ERROR".to_string()),
            text: Some("Error processing alert".to_string()),
        };
        let entry = entry_from_frame(frame).expect("frame carries text");
        assert_eq!(entry.sender, "ERROR");
    }
}
