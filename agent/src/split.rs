//! Re-chunks streamed reply text on delimiters so a messenger can send one message per part.

use agent_core::{OutputChunk, Result};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

pub const DEFAULT_DELIMITER: &str = "\n";

/// Buffers text deltas and yields the parts between delimiters.
///
/// Delimiters are tried in list order; the first one present in the buffer splits it. Parts
/// are trimmed and empty parts dropped.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    delimiters: Vec<String>,
    buffer: String,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new([DEFAULT_DELIMITER])
    }
}

impl TextSplitter {
    /// Empty delimiters are ignored; with none left, the newline default applies.
    pub fn new<I, S>(delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut delimiters: Vec<String> = delimiters
            .into_iter()
            .map(Into::into)
            .filter(|d: &String| !d.is_empty())
            .collect();
        if delimiters.is_empty() {
            delimiters.push(DEFAULT_DELIMITER.to_string());
        }
        Self {
            delimiters,
            buffer: String::new(),
        }
    }

    pub fn push(&mut self, delta: &str) -> Vec<String> {
        self.buffer.push_str(delta);
        let mut parts = Vec::new();
        loop {
            let found = self
                .delimiters
                .iter()
                .find_map(|d| self.buffer.find(d.as_str()).map(|pos| (pos, d.len())));
            let Some((pos, len)) = found else {
                break;
            };
            let part = self.buffer[..pos].trim().to_string();
            self.buffer.drain(..pos + len);
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts
    }

    /// The held-back remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

struct SplitState<S> {
    inner: S,
    splitter: TextSplitter,
    ready: VecDeque<Result<OutputChunk>>,
    finished: bool,
}

/// Applies a [`TextSplitter`] to the text chunks of an agent output stream.
///
/// Tool results pass through in place. The remainder is flushed at stream end and before an
/// error item.
pub fn split_stream<S>(stream: S, splitter: TextSplitter) -> impl Stream<Item = Result<OutputChunk>>
where
    S: Stream<Item = Result<OutputChunk>> + Unpin,
{
    let state = SplitState {
        inner: stream,
        splitter,
        ready: VecDeque::new(),
        finished: false,
    };
    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(OutputChunk::Text(delta))) => {
                    st.ready
                        .extend(st.splitter.push(&delta).into_iter().map(|p| Ok(OutputChunk::Text(p))));
                }
                Some(Ok(tool @ OutputChunk::Tool(_))) => st.ready.push_back(Ok(tool)),
                Some(Err(e)) => {
                    if let Some(rest) = st.splitter.finish() {
                        st.ready.push_back(Ok(OutputChunk::Text(rest)));
                    }
                    st.ready.push_back(Err(e));
                }
                None => {
                    st.finished = true;
                    if let Some(rest) = st.splitter.finish() {
                        st.ready.push_back(Ok(OutputChunk::Text(rest)));
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AgentError, ToolPayload, ToolResult};
    use futures::stream;

    #[test]
    fn splits_on_first_listed_delimiter() {
        let mut s = TextSplitter::new(["\n", "。"]);
        assert!(s.push("Hello").is_empty());
        assert_eq!(s.push(" there\nHow are you。Fine"), vec!["Hello there", "How are you"]);
        assert_eq!(s.finish().as_deref(), Some("Fine"));
        assert_eq!(s.finish(), None);

        let mut s = TextSplitter::new(["。", "\n"]);
        assert_eq!(s.push("a\nb。c"), vec!["a\nb"]);
    }

    #[test]
    fn drops_blank_parts() {
        let mut s = TextSplitter::default();
        assert_eq!(s.push("\n\n  \na\n"), vec!["a"]);
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn empty_delimiters_fall_back_to_newline() {
        let mut s = TextSplitter::new([""]);
        assert_eq!(s.push("x\ny"), vec!["x"]);
    }

    #[tokio::test]
    async fn stream_passes_tools_through_and_flushes() {
        let tool = ToolResult::new("play_sound", "call_1", ToolPayload::Text("ding".into()));
        let input = stream::iter(vec![
            Ok(OutputChunk::Text("one\ntw".into())),
            Ok(OutputChunk::Tool(tool.clone())),
            Ok(OutputChunk::Text("o".into())),
        ]);
        let out: Vec<_> = split_stream(input, TextSplitter::default()).collect().await;
        assert_eq!(
            out,
            vec![
                Ok(OutputChunk::Text("one".into())),
                Ok(OutputChunk::Tool(tool)),
                Ok(OutputChunk::Text("two".into())),
            ]
        );
    }

    #[tokio::test]
    async fn stream_flushes_before_error() {
        let input = stream::iter(vec![
            Ok(OutputChunk::Text("partial".into())),
            Err(AgentError::BackendUnavailable("down".into())),
        ]);
        let out: Vec<_> = split_stream(input, TextSplitter::default()).collect().await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Ok(OutputChunk::Text("partial".into())));
        assert!(out[1].is_err());
    }
}
