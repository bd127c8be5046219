use super::json;
use super::pipeline::ExtractionPipeline;
use super::prompt;
use super::types::RecipeResult;
use crate::bundle::ExtractionContext;
use crate::error::Result;
use crate::providers::GenerationRequest;
use futures_util::StreamExt;

/// Marker prefix for a thinking-note line in the model's streamed output.
pub const NOTE_MARKER: &str = ">> ";

const FENCE_OPEN: &str = "```json";
const FENCE: &str = "```";

/// Progressive-disclosure phases surfaced to the consuming UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingPhase {
    Idle,
    /// Video is the primary evidence.
    Watching,
    /// The caption is authoritative.
    Reading,
    /// The final JSON payload has started arriving.
    Building,
    Done,
}

/// Ordered progress events, delivered synchronously on the consuming task
/// between chunk awaits — never concurrently with each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase(ThinkingPhase),
    Note(String),
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// What the scanner recognized in one batch of complete lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Note(String),
    /// The ```json fence opened; emitted at most once per stream.
    PayloadStarted,
}

/// Line-oriented protocol scanner over an incremental chunk stream.
///
/// Separates `>> ` thinking notes from the fenced JSON payload while keeping
/// the complete raw text for final parsing. Lines are emitted exactly once,
/// in completion order, regardless of how chunk boundaries split them.
#[derive(Debug, Default)]
pub struct StreamScanner {
    full_text: String,
    line_buffer: String,
    in_json_block: bool,
    payload_seen: bool,
}

impl StreamScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the events for every line the chunk completed.
    pub fn push(&mut self, chunk: &str) -> Vec<ScanEvent> {
        self.full_text.push_str(chunk);
        self.line_buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=newline).collect();
            self.scan_line(line.trim(), &mut events);
        }
        events
    }

    /// Flush the unterminated tail after the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.line_buffer);
        let tail = tail.trim();
        if self.in_json_block {
            return None;
        }
        let note = tail.strip_prefix(NOTE_MARKER)?.trim();
        (!note.is_empty()).then(|| note.to_string())
    }

    /// All text seen so far, exactly as received.
    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    fn scan_line(&mut self, line: &str, events: &mut Vec<ScanEvent>) {
        if !self.in_json_block && line.starts_with(FENCE_OPEN) {
            self.in_json_block = true;
            if !self.payload_seen {
                self.payload_seen = true;
                events.push(ScanEvent::PayloadStarted);
            }
        } else if self.in_json_block && line.starts_with(FENCE) {
            self.in_json_block = false;
        } else if !self.in_json_block
            && let Some(rest) = line.strip_prefix(NOTE_MARKER)
        {
            let note = rest.trim();
            if !note.is_empty() {
                events.push(ScanEvent::Note(note.to_string()));
            }
        }
        // Everything else is neither a note nor protocol framing; dropped.
    }
}

/// Streaming extraction: the same contract as the batch pipeline, with
/// progress events layered on top.
///
/// Any failure after streaming starts triggers a full, independent batch
/// call on the same context ("restart, don't resume"); notes already
/// delivered are cosmetic and are not retracted.
pub struct StreamingExtractor {
    pipeline: ExtractionPipeline,
}

impl StreamingExtractor {
    pub fn new(pipeline: ExtractionPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn extract_streaming(
        &self,
        context: &ExtractionContext,
        sink: &dyn ProgressSink,
    ) -> Result<Option<RecipeResult>> {
        let initial = if context.caption_is_authoritative {
            ThinkingPhase::Reading
        } else {
            ThinkingPhase::Watching
        };
        sink.on_event(ProgressEvent::Phase(initial));

        match self.run_stream(context, sink).await {
            Ok(result) => {
                sink.on_event(ProgressEvent::Phase(ThinkingPhase::Done));
                Ok(result)
            }
            Err(error) => {
                tracing::warn!(%error, "Streaming extraction failed, restarting with batch call");
                // Best-effort phase bump so the UI does not appear stuck
                // while the batch call runs.
                sink.on_event(ProgressEvent::Phase(ThinkingPhase::Building));
                let result = self.pipeline.extract(context).await?;
                sink.on_event(ProgressEvent::Phase(ThinkingPhase::Done));
                Ok(result)
            }
        }
    }

    async fn run_stream(
        &self,
        context: &ExtractionContext,
        sink: &dyn ProgressSink,
    ) -> anyhow::Result<Option<RecipeResult>> {
        let request = GenerationRequest::with_media(
            prompt::streaming_prompt(context),
            context.media_parts.clone(),
        );
        let mut stream = self.pipeline.client().open_stream(&request).await?;
        let mut scanner = StreamScanner::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in scanner.push(&chunk) {
                match event {
                    ScanEvent::Note(note) => sink.on_event(ProgressEvent::Note(note)),
                    ScanEvent::PayloadStarted => {
                        sink.on_event(ProgressEvent::Phase(ThinkingPhase::Building));
                    }
                }
            }
        }

        if let Some(note) = scanner.finish() {
            sink.on_event(ProgressEvent::Note(note));
        }

        Ok(json::parse_response::<RecipeResult>(scanner.full_text())?)
    }
}
