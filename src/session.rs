//! Try-on session: the upload → describe → result flow around an editor.
//!
//! A session owns the user's inputs, the latest result and a bounded
//! history of past edits. The editor itself never sees the history.

use crate::error::{Result, TryOnError};
use crate::image::{DataUri, EditRequest, ImageEditor, ImageLocator};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of past edits kept per session.
pub const HISTORY_CAPACITY: usize = 20;

const MISSING_INPUT_MESSAGE: &str = "Please provide a photo and a description.";

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Waiting for a portrait.
    Upload,
    /// Waiting for an outfit description.
    Describe,
    /// Showing the edited image.
    Result,
}

/// One completed edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    /// Unique within the session.
    pub id: String,
    /// Portrait the edit was made from.
    pub source_url: String,
    /// Edited image locator.
    pub result_url: String,
    /// Outfit description used.
    pub prompt: String,
    /// Completion time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A labelled outfit suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StylePreset {
    /// Short display label.
    pub label: &'static str,
    /// Prompt text applied when chosen.
    pub prompt: &'static str,
}

/// Built-in outfit suggestions.
pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        label: "Vintage Chanel",
        prompt: "A vintage Chanel tweed suit in pastel pink.",
    },
    StylePreset {
        label: "Dark Academia",
        prompt: "Dark academia aesthetic with a charcoal wool blazer and turtleneck.",
    },
    StylePreset {
        label: "Streetwear",
        prompt: "High-end streetwear: oversized hoodie, techwear pants, and sleek sneakers.",
    },
    StylePreset {
        label: "Bohemian",
        prompt: "A bohemian floral maxi dress with layered accessories.",
    },
    StylePreset {
        label: "Cyberpunk",
        prompt: "Cyberpunk style with neon-accented techwear and utility straps.",
    },
    StylePreset {
        label: "Quiet Luxury",
        prompt: "Quiet luxury style: neutral-toned cashmere sweater and tailored trousers.",
    },
];

/// Finds a preset by label, ignoring case.
pub fn find_preset(label: &str) -> Option<&'static StylePreset> {
    STYLE_PRESETS
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(label.trim()))
}

/// State for one user's try-on flow.
pub struct TryOnSession<E> {
    editor: E,
    step: Step,
    source_image: Option<DataUri>,
    reference_image: Option<DataUri>,
    prompt: String,
    current_result: Option<ImageLocator>,
    error: Option<String>,
    history: VecDeque<GenerationRecord>,
    next_seq: u64,
}

impl<E: ImageEditor> TryOnSession<E> {
    /// Starts a session at the upload step.
    pub fn new(editor: E) -> Self {
        Self {
            editor,
            step: Step::Upload,
            source_image: None,
            reference_image: None,
            prompt: String::new(),
            current_result: None,
            error: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            next_seq: 0,
        }
    }

    /// Returns the editor this session calls.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Current wizard step.
    pub fn step(&self) -> Step {
        self.step
    }

    /// Portrait to edit.
    pub fn source_image(&self) -> Option<&DataUri> {
        self.source_image.as_ref()
    }

    /// Optional garment exemplar.
    pub fn reference_image(&self) -> Option<&DataUri> {
        self.reference_image.as_ref()
    }

    /// Outfit description.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Latest edited image, if any.
    pub fn current_result(&self) -> Option<&ImageLocator> {
        self.current_result.as_ref()
    }

    /// Message from the last failed generation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Past edits, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &GenerationRecord> {
        self.history.iter()
    }

    /// Sets the portrait to edit.
    pub fn set_source_image(&mut self, image: DataUri) {
        self.source_image = Some(image);
    }

    /// Sets the garment exemplar.
    pub fn set_reference_image(&mut self, image: DataUri) {
        self.reference_image = Some(image);
    }

    /// Drops the garment exemplar.
    pub fn clear_reference_image(&mut self) {
        self.reference_image = None;
    }

    /// Sets the outfit description.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Replaces the prompt with a preset's text.
    pub fn apply_preset(&mut self, preset: &StylePreset) {
        self.prompt = preset.prompt.to_string();
    }

    /// True when both a portrait and a description are present.
    pub fn can_generate(&self) -> bool {
        self.source_image.is_some() && !self.prompt.trim().is_empty()
    }

    /// Advances one step if the current step's input is present.
    pub fn next_step(&mut self) -> Step {
        self.step = match self.step {
            Step::Upload if self.source_image.is_some() => Step::Describe,
            Step::Describe if !self.prompt.trim().is_empty() => Step::Result,
            other => other,
        };
        self.step
    }

    /// Goes back one step.
    pub fn prev_step(&mut self) -> Step {
        self.step = match self.step {
            Step::Result => Step::Describe,
            Step::Describe | Step::Upload => Step::Upload,
        };
        self.step
    }

    /// Runs one edit with the current inputs.
    ///
    /// On success the result is recorded at the front of the history. On
    /// failure the error message is kept for display and the session goes
    /// back to [`Step::Describe`] so the same inputs can be retried.
    /// Session state only changes once the edit resolves, so dropping the
    /// returned future leaves the session as it was.
    pub async fn generate(&mut self) -> Result<ImageLocator> {
        let source = match (&self.source_image, self.prompt.trim().is_empty()) {
            (Some(source), false) => source.clone(),
            _ => {
                self.error = Some(MISSING_INPUT_MESSAGE.to_string());
                return Err(TryOnError::InvalidRequest(MISSING_INPUT_MESSAGE.into()));
            }
        };

        let mut request = EditRequest::new(source, self.prompt.clone());
        if let Some(ref reference) = self.reference_image {
            request = request.with_reference(reference.clone());
        }

        let outcome = self.editor.edit(&request).await;

        match outcome {
            Ok(locator) => {
                self.record(&request, &locator);
                self.current_result = Some(locator.clone());
                self.error = None;
                self.step = Step::Result;
                Ok(locator)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.step = Step::Describe;
                Err(e)
            }
        }
    }

    /// Restores a past edit's portrait, prompt and result.
    pub fn select_history(&mut self, id: &str) -> Result<()> {
        let record = self
            .history
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| TryOnError::InvalidRequest(format!("no history entry {id}")))?;

        let source = DataUri::parse(record.source_url.clone())?;
        let result = match DataUri::parse(record.result_url.clone()) {
            Ok(uri) => ImageLocator::DataUri(uri),
            Err(_) => ImageLocator::Remote(record.result_url.clone()),
        };
        self.prompt = record.prompt.clone();
        self.source_image = Some(source);
        self.current_result = Some(result);
        Ok(())
    }

    /// Clears the inputs and result and returns to the upload step. History is kept.
    pub fn reset(&mut self) {
        self.source_image = None;
        self.reference_image = None;
        self.current_result = None;
        self.prompt.clear();
        self.error = None;
        self.step = Step::Upload;
    }

    fn record(&mut self, request: &EditRequest, locator: &ImageLocator) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.next_seq += 1;

        self.history.push_front(GenerationRecord {
            id: format!("{timestamp}-{}", self.next_seq),
            source_url: request.source_image.to_string(),
            result_url: locator.to_string(),
            prompt: request.prompt.clone(),
            timestamp,
        });
        self.history.truncate(HISTORY_CAPACITY);
    }
}
