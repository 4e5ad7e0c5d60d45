//! Conversation state and the single-flight busy flag.
//!
//! The state lives behind a short-lived mutex that is never held across an await. The busy
//! flag is taken in [`StateCell::admit`] and handed back by [`BusyGuard`], which releases it on
//! every exit path of a turn (return, error, panic, or the turn task being dropped).

use agent_core::{InvokeInput, PendingToolResults, Trigger};
use prompt::ChatMessage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, info};

/// An input that arrived while a turn was running, or the input that starts one.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInput {
    pub trigger: Trigger,
    pub input: InvokeInput,
}

impl PendingInput {
    /// The context message for this input, if it carries anything.
    ///
    /// User input becomes a user message (with image parts when attached); scheduled input
    /// becomes a system note.
    pub fn into_message(self) -> Option<ChatMessage> {
        let text = self.input.text.clone().unwrap_or_default();
        match self.trigger {
            Trigger::UserMessage => {
                let images = self.input.image_urls();
                if images.is_empty() {
                    (!text.trim().is_empty()).then(|| ChatMessage::user(text))
                } else {
                    Some(ChatMessage::user_with_images(text, images))
                }
            }
            Trigger::Scheduled => {
                if !self.input.attachments.is_empty() {
                    debug!(
                        count = self.input.attachments.len(),
                        "attachments on scheduled input ignored"
                    );
                }
                (!text.trim().is_empty()).then(|| ChatMessage::system(text))
            }
        }
    }
}

/// The record of one conversation.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) pending_inbound: VecDeque<PendingInput>,
    pub(crate) pending_tool_results: PendingToolResults,
    pub(crate) token_usage: u32,
    pub(crate) busy: bool,
    pub(crate) shut_down: bool,
}

impl ConversationState {
    /// A fresh context holding only the system prompt.
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
            pending_inbound: VecDeque::new(),
            pending_tool_results: PendingToolResults::new(),
            token_usage: 0,
            busy: false,
            shut_down: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn token_usage(&self) -> u32 {
        self.token_usage
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn pending_len(&self) -> usize {
        self.pending_inbound.len()
    }

    fn finish_turn(&mut self) {
        self.busy = false;
        self.pending_tool_results.clear();
    }
}

/// Outcome of offering an input to the conversation.
pub(crate) enum Admission {
    /// The caller now owns the turn.
    Started(BusyGuard),
    /// A turn is running; the input joins its next drain.
    Queued,
    /// Nothing to do.
    Ignored,
    ShutDown,
}

pub(crate) struct StateCell {
    state: Mutex<ConversationState>,
    idle: Notify,
}

impl StateCell {
    pub fn new(state: ConversationState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            idle: Notify::new(),
        })
    }

    pub fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `input` when busy; otherwise takes the busy flag and queues it for the new turn.
    ///
    /// A user trigger without input starts a turn only when earlier inputs are still pending.
    /// A scheduled trigger always starts one when idle.
    pub fn admit(self: &Arc<Self>, trigger: Trigger, input: Option<InvokeInput>) -> Admission {
        let mut st = self.lock();
        if st.shut_down {
            return Admission::ShutDown;
        }
        let input = input.filter(|i| !i.is_empty());

        if st.busy {
            return match input {
                Some(input) => {
                    st.pending_inbound.push_back(PendingInput { trigger, input });
                    info!(pending = st.pending_inbound.len(), "step: busy, input queued");
                    Admission::Queued
                }
                None => Admission::Ignored,
            };
        }

        match input {
            Some(input) => st.pending_inbound.push_back(PendingInput { trigger, input }),
            None if trigger == Trigger::UserMessage && st.pending_inbound.is_empty() => {
                return Admission::Ignored;
            }
            None => {}
        }
        st.busy = true;
        Admission::Started(BusyGuard {
            cell: Arc::clone(self),
            released: false,
        })
    }

    /// Takes every pending input in arrival order.
    pub fn drain_pending(&self) -> Vec<PendingInput> {
        self.lock().pending_inbound.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().pending_inbound.is_empty()
    }

    /// Rejects further input, then waits for the running turn (if any) to end.
    pub async fn shut_down(&self) {
        self.lock().shut_down = true;
        loop {
            let notified = self.idle.notified();
            if !self.lock().busy {
                return;
            }
            notified.await;
        }
    }
}

/// Ownership of the busy flag for one turn.
pub(crate) struct BusyGuard {
    cell: Arc<StateCell>,
    released: bool,
}

impl BusyGuard {
    /// Ends the turn unless inputs are pending, checked under the same lock.
    pub fn release_if_idle(&mut self) -> bool {
        let mut st = self.cell.lock();
        if !st.pending_inbound.is_empty() {
            return false;
        }
        st.finish_turn();
        drop(st);
        self.released = true;
        self.cell.idle.notify_waiters();
        true
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.cell.lock().finish_turn();
        self.cell.idle.notify_waiters();
        debug!("busy flag released on early exit");
    }
}
