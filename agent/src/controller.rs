//! # Conversation controller
//!
//! [`Agent`] runs one turn at a time. A call to [`Agent::invoke`] while a turn is running
//! queues its input and returns an empty stream; the running turn drains the queue before it
//! ends, so queued inputs are answered in arrival order.
//!
//! One turn:
//!
//! 1. drain pending inputs into the context
//! 2. recall memories for the newest user text and append them as a system note
//! 3. call the model, streaming its text to the caller
//! 4. while the model requests tools (up to `max_tool_rounds`), dispatch them, append the
//!    results and call the model again
//! 5. if inputs arrived meanwhile, go back to 1
//! 6. compact the context when the reported usage is over the token limit
//! 7. release the busy flag and clear the turn's tool results
//!
//! The turn runs on its own task, so a caller that stops reading the stream does not stop the
//! bookkeeping.

use agent_core::{AgentError, InvokeInput, OutputChunk, Result, Tool, ToolError, Trigger};
use chrono::Local;
use futures::{Stream, StreamExt};
use llm_client::{ChatModel, CompletionEvent, CompletionRequest};
use memory::{format_recalled, Clock, RecallSession};
use prompt::{ChatMessage, MessageRole, ToolCall};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, instrument, warn};

use crate::budget::{over_budget, DEFAULT_TOKEN_LIMIT};
use crate::dispatcher::{dedup_calls, merge_results, ToolDispatcher};
use crate::memorizer::Memorizer;
use crate::state::{Admission, BusyGuard, ConversationState, StateCell};
use crate::summarizer::{compacted_context, Summarizer, SUMMARY_TEMPERATURE};

pub type AgentStream = Pin<Box<dyn Stream<Item = Result<OutputChunk>> + Send>>;

type ChunkSender = mpsc::UnboundedSender<Result<OutputChunk>>;

/// Controller tunables.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// First message of every fresh or compacted context.
    pub system_prompt: String,
    /// Compaction runs when the last reported total usage is above this.
    pub token_limit: u32,
    /// Tool dispatch rounds allowed per model answer before tools are withdrawn.
    pub max_tool_rounds: usize,
    /// Automatic recall: at most this many memories per drained user input. 0 disables it.
    pub recall_k: usize,
    pub recall_threshold: f64,
    /// Append a transient `<current_time>` note to each model call.
    pub can_see_datetime: bool,
    /// Extract long-term memories from the context before compacting it.
    pub memorize_on_compaction: bool,
    pub summary_temperature: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: prompt::DEFAULT_SYSTEM_MESSAGE.to_string(),
            token_limit: DEFAULT_TOKEN_LIMIT,
            max_tool_rounds: 8,
            recall_k: 2,
            recall_threshold: 0.8,
            can_see_datetime: false,
            memorize_on_compaction: true,
            summary_temperature: SUMMARY_TEMPERATURE,
        }
    }
}

/// Binds the collaborators of an [`Agent`].
#[derive(Default)]
pub struct AgentBuilder {
    model: Option<Arc<dyn ChatModel>>,
    recall: Option<Arc<RecallSession>>,
    tools: ToolDispatcher,
    settings: AgentSettings,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Enables automatic recall, and memory extraction on compaction.
    pub fn recall(mut self, session: Arc<RecallSession>) -> Self {
        self.recall = Some(session);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.tools.register(tool);
        }
        self
    }

    pub fn settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Agent {
        let state = ConversationState::new(&self.settings.system_prompt);
        Agent {
            inner: Arc::new(Inner {
                model: self.model,
                recall: self.recall,
                tools: self.tools,
                settings: self.settings,
                cell: StateCell::new(state),
                turn_seq: AtomicU64::new(0),
            }),
        }
    }
}

/// One conversation with the model.
pub struct Agent {
    inner: Arc<Inner>,
}

struct Inner {
    model: Option<Arc<dyn ChatModel>>,
    recall: Option<Arc<RecallSession>>,
    tools: ToolDispatcher,
    settings: AgentSettings,
    cell: Arc<StateCell>,
    turn_seq: AtomicU64,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Offers input to the conversation.
    ///
    /// Starts a turn and returns its output when idle. While a turn runs, the input is queued
    /// for it and the returned stream is empty. A failing turn yields one error item and ends.
    ///
    /// Must be called within a tokio runtime.
    pub fn invoke(&self, trigger: Trigger, input: Option<InvokeInput>) -> Result<AgentStream> {
        let Some(model) = self.inner.model.clone() else {
            return Err(AgentError::NotInitialized("no chat model bound".into()));
        };
        match self.inner.cell.admit(trigger, input) {
            Admission::ShutDown => Err(AgentError::ShutDown),
            Admission::Queued | Admission::Ignored => Ok(Box::pin(futures::stream::empty())),
            Admission::Started(guard) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let inner = Arc::clone(&self.inner);
                let turn = inner.turn_seq.fetch_add(1, Ordering::Relaxed) + 1;
                tokio::spawn(async move {
                    if let Err(e) = inner.run_turn(turn, model, guard, &tx).await {
                        error!(turn, error = %e, "step: turn failed");
                        let _ = tx.send(Err(e));
                    }
                });
                Ok(Box::pin(UnboundedReceiverStream::new(rx)))
            }
        }
    }

    /// Snapshot of the context messages.
    pub fn context(&self) -> Vec<ChatMessage> {
        self.inner.cell.lock().messages().to_vec()
    }

    /// Last reported total token usage of the context.
    pub fn token_usage(&self) -> u32 {
        self.inner.cell.lock().token_usage()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.cell.lock().is_busy()
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.inner.settings
    }

    pub fn tool_names(&self) -> &[String] {
        self.inner.tools.names()
    }

    /// Waits for the running turn, then rejects further input with [`AgentError::ShutDown`].
    pub async fn shutdown(&self) {
        self.inner.cell.shut_down().await;
        info!("step: agent shut down");
    }
}

impl Inner {
    #[instrument(skip(self, model, guard, tx))]
    async fn run_turn(
        &self,
        turn: u64,
        model: Arc<dyn ChatModel>,
        mut guard: BusyGuard,
        tx: &ChunkSender,
    ) -> Result<()> {
        info!(turn, "step: turn started");
        loop {
            let drained = self.cell.drain_pending();
            let query = drained
                .iter()
                .rev()
                .filter(|p| p.trigger == Trigger::UserMessage)
                .find_map(|p| p.input.text.clone().filter(|t| !t.trim().is_empty()));
            let new_messages: Vec<ChatMessage> =
                drained.into_iter().filter_map(|p| p.into_message()).collect();
            info!(turn, drained = new_messages.len(), "step: pending inputs drained");
            self.cell.lock().messages.extend(new_messages);

            if let Some(query) = query {
                self.recall_into_context(&query).await?;
            }

            self.generate(&model, tx).await?;

            if self.cell.has_pending() {
                info!(turn, "step: inputs arrived during turn, continuing");
                continue;
            }

            let usage = self.cell.lock().token_usage();
            if over_budget(usage, self.settings.token_limit) {
                self.compact(&model).await?;
            }

            if guard.release_if_idle() {
                break;
            }
        }
        info!(turn, "step: turn finished");
        Ok(())
    }

    async fn recall_into_context(&self, query: &str) -> Result<()> {
        let Some(recall) = &self.recall else {
            return Ok(());
        };
        if self.settings.recall_k == 0 {
            return Ok(());
        }
        let memories = recall
            .retrieve(query, self.settings.recall_k, self.settings.recall_threshold, None)
            .await?;
        let now = recall.store().clock().now_secs();
        if let Some(block) = format_recalled(&memories, now) {
            info!(count = memories.len(), "step: recalled memories added to context");
            self.cell.lock().messages.push(ChatMessage::system(block));
        }
        Ok(())
    }

    /// Calls the model until it answers without tool calls.
    async fn generate(&self, model: &Arc<dyn ChatModel>, tx: &ChunkSender) -> Result<()> {
        let mut rounds = 0usize;
        loop {
            let calls = self.call_model(model, !self.tools.is_empty(), tx).await?;
            if calls.is_empty() {
                return Ok(());
            }

            if rounds >= self.settings.max_tool_rounds {
                warn!(
                    rounds,
                    outstanding = calls.len(),
                    "step: tool round limit reached, asking for a final answer"
                );
                let feedback = ToolError::Execution(format!(
                    "tool round limit ({}) reached, answer without further tools",
                    self.settings.max_tool_rounds
                ))
                .to_string();
                {
                    let mut st = self.cell.lock();
                    for call in &calls {
                        st.messages.push(ChatMessage::tool(call.id.clone(), feedback.clone()));
                    }
                }
                self.call_model(model, false, tx).await?;
                return Ok(());
            }

            rounds += 1;
            info!(round = rounds, count = calls.len(), "step: dispatching tool calls");
            for done in self.tools.dispatch(calls).await {
                let fresh = {
                    let mut st = self.cell.lock();
                    st.messages
                        .push(ChatMessage::tool(done.call_id.clone(), done.feedback));
                    merge_results(&mut st.pending_tool_results, done.results)
                };
                for result in fresh {
                    let _ = tx.send(Ok(OutputChunk::Tool(result)));
                }
            }
        }
    }

    /// One model call over the current context. Streams text to `tx`, records the assistant
    /// message and the reported usage, and returns the requested tool calls.
    async fn call_model(
        &self,
        model: &Arc<dyn ChatModel>,
        with_tools: bool,
        tx: &ChunkSender,
    ) -> Result<Vec<ToolCall>> {
        let mut messages = self.cell.lock().messages().to_vec();
        if self.settings.can_see_datetime {
            messages.push(ChatMessage::system(prompt::current_time_note(Local::now())));
        }
        let mut request = CompletionRequest::new(messages);
        if with_tools {
            request = request.with_tools(self.tools.specs());
        }
        debug!(
            message_count = request.messages.len(),
            tool_count = request.tools.len(),
            "step: calling model"
        );

        let mut stream = model.complete(request).await.map_err(AgentError::backend)?;
        let mut content = String::new();
        let mut calls = Vec::new();
        let mut usage = None;
        while let Some(event) = stream.next().await {
            match event.map_err(AgentError::backend)? {
                CompletionEvent::ContentDelta(delta) => {
                    content.push_str(&delta);
                    let _ = tx.send(Ok(OutputChunk::Text(delta)));
                }
                CompletionEvent::ToolCalls(requested) => calls.extend(requested),
                CompletionEvent::Usage(u) => usage = Some(u),
            }
        }
        if !with_tools && !calls.is_empty() {
            warn!(count = calls.len(), "step: tool calls ignored, tools withdrawn");
            calls.clear();
        }
        let calls = dedup_calls(calls);

        let mut st = self.cell.lock();
        match usage {
            Some(u) => {
                info!(
                    prompt_tokens = u.prompt_tokens,
                    completion_tokens = u.completion_tokens,
                    total_tokens = u.total_tokens,
                    "step: usage reported"
                );
                st.token_usage = u.total_tokens;
            }
            None => debug!("step: no usage reported, keeping previous value"),
        }
        if !calls.is_empty() {
            st.messages
                .push(ChatMessage::assistant_with_tool_calls(content, calls.clone()));
        } else if !content.is_empty() {
            st.messages.push(ChatMessage::assistant(content));
        }
        Ok(calls)
    }

    /// Replaces the context with the system prompt and a summary, and starts a new episode.
    #[instrument(skip_all)]
    async fn compact(&self, model: &Arc<dyn ChatModel>) -> Result<()> {
        let (messages, usage) = {
            let st = self.cell.lock();
            (st.messages().to_vec(), st.token_usage())
        };
        info!(
            usage,
            limit = self.settings.token_limit,
            message_count = messages.len(),
            "step: over token budget, compacting context"
        );

        let summary = Summarizer::new(Arc::clone(model))
            .with_temperature(self.settings.summary_temperature)
            .summarize(&messages)
            .await
            .map_err(AgentError::backend)?;

        if self.settings.memorize_on_compaction {
            if let Some(recall) = &self.recall {
                let memorizer = Memorizer::new(Arc::clone(model), Arc::clone(recall.store()));
                if let Err(e) = memorizer.memorize(&messages).await {
                    warn!(error = %e, "step: memory extraction failed, continuing");
                }
            }
        }

        {
            let mut st = self.cell.lock();
            st.messages = compacted_context(&self.settings.system_prompt, &summary.text, Local::now());
            st.token_usage = summary.tokens_consumed;
        }
        if let Some(recall) = &self.recall {
            recall.clear_recalled_ids().await;
        }
        info!(
            token_usage = summary.tokens_consumed,
            "step: context compacted"
        );
        Ok(())
    }
}

/// Renders the context for display, one `[role] content` line per message.
pub fn render_context(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| match m.role {
            MessageRole::Assistant if m.has_tool_calls() && m.content.is_empty() => {
                let names: Vec<&str> = m.tool_calls.iter().map(|c| c.name.as_str()).collect();
                format!("[assistant] (tool calls: {})", names.join(", "))
            }
            role => format!("[{}] {}", role.as_str(), m.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let s = AgentSettings::default();
        assert_eq!(s.token_limit, 16_000);
        assert_eq!(s.max_tool_rounds, 8);
        assert_eq!(s.recall_k, 2);
        assert_eq!(s.recall_threshold, 0.8);
        assert_eq!(s.system_prompt, prompt::DEFAULT_SYSTEM_MESSAGE);
    }

    #[test]
    fn invoke_without_model_is_not_initialized() {
        let agent = Agent::builder().build();
        assert!(matches!(
            agent.invoke(Trigger::UserMessage, Some("hi".into())),
            Err(AgentError::NotInitialized(_))
        ));
        assert_eq!(agent.context().len(), 1);
    }

    #[test]
    fn render_context_lines() {
        let text = render_context(&[
            ChatMessage::system("sys"),
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall {
                    id: "c1".into(),
                    name: "play_sound".into(),
                    arguments: "{}".into(),
                }],
            ),
            ChatMessage::tool("c1", "Playing sound: ding.wav"),
        ]);
        assert_eq!(
            text,
            "[system] sys\n[assistant] (tool calls: play_sound)\n[tool] Playing sound: ding.wav"
        );
    }
}
