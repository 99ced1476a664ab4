//! Assistant proxy: the server-side question → reply pipeline.
//!
//! Per request:
//! 1. Fetch the configured assistant definition
//! 2. Create a thread and post the question on it
//! 3. Start a run and poll its status until it completes
//! 4. Take the newest assistant message and rewrite it as a markup fragment
//!
//! Nothing survives between requests; every call creates its own thread.

use std::rc::Rc;
use journal_types::{
    JournalError, Result,
    config::AssistantConfig,
    run::{AssistantRun, RunStatus},
};
use crate::ports::{AssistantPlatformPort, SleepPort, ThreadRole};

pub const NO_RESPONSE: &str = "No response received";
pub const MISSING_QUESTION: &str = "Question is missing in the request body";
const LINE_BREAK: &str = "<br />";

/// Where a request is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyPhase {
    Created,
    ThreadCreated,
    MessagePosted,
    RunStarted,
    Polling { attempt: u32 },
    Completed,
    Extracted,
    Returned,
    Failed,
}

pub struct AssistantProxy {
    platform: Rc<dyn AssistantPlatformPort>,
    sleeper: Rc<dyn SleepPort>,
    config: AssistantConfig,
}

impl AssistantProxy {
    pub fn new(
        platform: Rc<dyn AssistantPlatformPort>,
        sleeper: Rc<dyn SleepPort>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            platform,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Answer one question. Empty input is a `Validation` error; every
    /// other failure comes back as `Upstream`, `Network` or `TimedOut`.
    pub async fn answer(&self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(JournalError::Validation(MISSING_QUESTION.to_string()));
        }

        let mut phase = ProxyPhase::Created;
        match self.run_pipeline(question, &mut phase).await {
            Ok(reply) => {
                advance(&mut phase, ProxyPhase::Returned);
                Ok(reply)
            }
            Err(e) => {
                log::warn!("Assistant pipeline failed in phase {:?}: {}", phase, e);
                advance(&mut phase, ProxyPhase::Failed);
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, question: &str, phase: &mut ProxyPhase) -> Result<String> {
        let assistant = self
            .platform
            .retrieve_assistant(&self.config.assistant_id)
            .await?;

        let thread_id = self.platform.create_thread().await?;
        advance(phase, ProxyPhase::ThreadCreated);

        self.platform.add_user_message(&thread_id, question).await?;
        advance(phase, ProxyPhase::MessagePosted);

        let run = self.platform.create_run(&thread_id, &assistant.id).await?;
        advance(phase, ProxyPhase::RunStarted);

        self.wait_for_completion(&run, phase).await?;
        advance(phase, ProxyPhase::Completed);

        let messages = self.platform.list_messages(&thread_id).await?;
        let reply = messages
            .iter()
            .find(|m| m.role == ThreadRole::Assistant)
            .filter(|m| !m.text_parts.is_empty())
            .map(|m| {
                m.text_parts
                    .iter()
                    .map(|part| format_reply(part))
                    .collect::<Vec<_>>()
                    .join(LINE_BREAK)
            })
            .unwrap_or_else(|| NO_RESPONSE.to_string());
        advance(phase, ProxyPhase::Extracted);

        Ok(reply)
    }

    /// Poll the run until it completes. Bounded by both the attempt count
    /// and the cumulative waiting budget.
    async fn wait_for_completion(&self, run: &AssistantRun, phase: &mut ProxyPhase) -> Result<()> {
        let interval = self.config.poll_interval_ms;
        let mut waited_ms = 0u64;

        for attempt in 1..=self.config.max_poll_attempts {
            advance(phase, ProxyPhase::Polling { attempt });
            let current = self
                .platform
                .retrieve_run(&run.thread_id, &run.run_id)
                .await?;

            match current.status {
                RunStatus::Completed => return Ok(()),
                status if status.is_terminal() => {
                    return Err(JournalError::Upstream(format!(
                        "run {} ended with status {}",
                        current.run_id,
                        status.as_str()
                    )));
                }
                _ => {}
            }

            let out_of_budget = waited_ms + interval > self.config.max_duration_ms;
            if attempt == self.config.max_poll_attempts || out_of_budget {
                return Err(JournalError::TimedOut { attempts: attempt, waited_ms });
            }

            self.sleeper.sleep(interval).await;
            waited_ms += interval;
        }

        Err(JournalError::TimedOut { attempts: 0, waited_ms })
    }
}

fn advance(phase: &mut ProxyPhase, next: ProxyPhase) {
    log::debug!("Assistant pipeline: {:?} -> {:?}", phase, next);
    *phase = next;
}

// ─── Reply formatting ────────────────────────────────────────

/// Rewrite a raw assistant reply into the widget's markup: a run of three
/// `#` opens an `<h3>` and four or more an `<h4>` that lasts to the end of
/// the line; line breaks become `<br />`.
pub fn format_reply(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(format_line)
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

fn format_line(line: &str) -> String {
    match find_heading_marker(line) {
        None => line.to_string(),
        Some((start, len)) => {
            let level = if len >= 4 { 4 } else { 3 };
            let heading = strip_heading_markers(line[start + len..].trim());
            format!("{}<h{level}>{}</h{level}>", &line[..start], heading.trim())
        }
    }
}

/// Byte offset and length of the first run of at least three `#`.
fn find_heading_marker(line: &str) -> Option<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' {
            let start = i;
            while i < bytes.len() && bytes[i] == b'#' {
                i += 1;
            }
            if i - start >= 3 {
                return Some((start, i - start));
            }
        } else {
            i += 1;
        }
    }
    None
}

fn strip_heading_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == '#' {
            run += 1;
            continue;
        }
        if run > 0 && run < 3 {
            out.extend(std::iter::repeat('#').take(run));
        }
        run = 0;
        out.push(ch);
    }
    if run > 0 && run < 3 {
        out.extend(std::iter::repeat('#').take(run));
    }
    out
}
