//! Pairs tool invocations with their results.
//!
//! A [`Correlator`] owns two pieces of state: a bounded window of the most
//! recent messages, and a table of invocations still waiting for a result.
//! Events must be fed in delivery order. One instance per logical stream;
//! nothing here is shared between instances.

use std::collections::{HashMap, VecDeque};

use crate::reward::reward;
use crate::row::{ContextMessage, DatasetRow, ToolResultEntry, ToolUseEntry, TraceEntry};
use crate::types::{MessageEvent, NormalizedEvent, ToolResultEvent, ToolUseEvent};

pub const DEFAULT_WINDOW_SIZE: usize = 50;

/// A tool invocation waiting for its result.
#[derive(Debug, Clone)]
struct PendingInvocation {
    tool_use: ToolUseEvent,
    messages: Vec<ContextMessage>,
    trace: Vec<TraceEntry>,
}

#[derive(Debug, Clone)]
pub struct Correlator {
    window: VecDeque<MessageEvent>,
    window_size: usize,
    include_messages_in_trace: bool,
    pending: HashMap<String, PendingInvocation>,
    /// Bumped for every tool use; feeds synthesized keys.
    tool_use_counter: u64,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE, true)
    }
}

impl Correlator {
    pub fn new(window_size: usize, include_messages_in_trace: bool) -> Self {
        Self {
            window: VecDeque::with_capacity(window_size.min(1024)),
            window_size,
            include_messages_in_trace,
            pending: HashMap::new(),
            tool_use_counter: 0,
        }
    }

    /// Number of invocations still waiting for a result.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Feed one event. Returns a row when it resolves a pending invocation.
    pub fn push(&mut self, event: NormalizedEvent) -> Option<DatasetRow> {
        match event {
            NormalizedEvent::Message(message) => {
                self.on_message(message);
                None
            }
            NormalizedEvent::ToolUse(tool_use) => {
                self.on_tool_use(tool_use);
                None
            }
            NormalizedEvent::ToolResult(result) => self.on_tool_result(result),
        }
    }

    /// Drop whatever is still pending and return how many were dropped.
    /// Unresolved invocations never produce rows.
    pub fn finish(self) -> usize {
        self.pending.len()
    }

    fn on_message(&mut self, message: MessageEvent) {
        if self.include_messages_in_trace && !self.pending.is_empty() {
            let entry = TraceEntry::Message(ContextMessage::from(&message));
            for pending in self.pending.values_mut() {
                pending.trace.push(entry.clone());
            }
        }

        self.window.push_back(message);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }
    }

    fn on_tool_use(&mut self, tool_use: ToolUseEvent) {
        self.tool_use_counter += 1;
        let key = self.correlation_key(&tool_use);

        let pending = PendingInvocation {
            messages: self.window.iter().map(ContextMessage::from).collect(),
            trace: vec![TraceEntry::ToolUse(ToolUseEntry::from(&tool_use))],
            tool_use,
        };
        self.pending.insert(key, pending);
    }

    /// The real invocation id when present. Otherwise a key no result can
    /// reference, since results only ever carry the original id.
    fn correlation_key(&self, tool_use: &ToolUseEvent) -> String {
        match tool_use.tool_use_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!(
                "anon:{}:{}",
                tool_use.uuid.as_deref().unwrap_or("no-uuid"),
                self.tool_use_counter
            ),
        }
    }

    fn on_tool_result(&mut self, result: ToolResultEvent) -> Option<DatasetRow> {
        let id = result.tool_use_id.as_deref().filter(|id| !id.is_empty())?;
        let PendingInvocation {
            tool_use,
            messages,
            mut trace,
        } = self.pending.remove(id)?;

        let result_entry = TraceEntry::ToolResult(ToolResultEntry::from(&result));
        trace.push(result_entry.clone());

        Some(DatasetRow {
            session_id: tool_use.session_id.unwrap_or_default(),
            t: tool_use.timestamp.or_else(|| result.timestamp.clone()),
            messages,
            tool_name: tool_use.tool_name,
            tool_input: tool_use.tool_input,
            tool_result: result_entry,
            trace,
            reward: reward(&result),
        })
    }
}

/// Iterator adapter turning an ordered event stream into dataset rows.
pub struct Rows<I> {
    events: I,
    correlator: Correlator,
}

impl<I> Rows<I> {
    pub fn new(events: I, correlator: Correlator) -> Self {
        Self { events, correlator }
    }

    pub fn events(&self) -> &I {
        &self.events
    }
}

impl<I: Iterator<Item = NormalizedEvent>> Iterator for Rows<I> {
    type Item = DatasetRow;

    fn next(&mut self) -> Option<Self::Item> {
        for event in self.events.by_ref() {
            if let Some(row) = self.correlator.push(event) {
                return Some(row);
            }
        }
        None
    }
}

/// Correlate an ordered event stream into rows with a fresh engine.
pub fn process<I>(
    events: I,
    window_size: usize,
    include_messages_in_trace: bool,
) -> Rows<I::IntoIter>
where
    I: IntoIterator<Item = NormalizedEvent>,
{
    Rows::new(
        events.into_iter(),
        Correlator::new(window_size, include_messages_in_trace),
    )
}
