//! Extraction dispatch: pick one extractor per attachment, or fall back
//! to the raw message text.

use pipeline_core::{last_user_content, ContentExtractor, Extraction};
use tracing::{debug, warn};

use crate::state::{Stage, TurnState};

/// Attachment categories the dispatcher knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
    Audio,
    Unknown,
}

impl AttachmentKind {
    /// Classify an attachment from its declared content type and
    /// filename extension, checked in that order, case-insensitive.
    pub fn detect(content_type: &str, filename: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.starts_with("image/") {
            return AttachmentKind::Image;
        }
        if content_type == "application/pdf" {
            return AttachmentKind::Pdf;
        }
        if content_type.starts_with("audio/") {
            return AttachmentKind::Audio;
        }

        let filename = filename.to_ascii_lowercase();
        if has_extension(&filename, &["png", "jpg", "jpeg"]) {
            return AttachmentKind::Image;
        }
        if has_extension(&filename, &["pdf"]) {
            return AttachmentKind::Pdf;
        }
        if has_extension(&filename, &["mp3", "wav", "m4a"]) {
            return AttachmentKind::Audio;
        }

        AttachmentKind::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Unknown => "unknown",
        }
    }
}

fn has_extension(filename: &str, extensions: &[&str]) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| extensions.contains(&ext))
        .unwrap_or(false)
}

/// Run the extraction stage over the turn state.
///
/// Takes the attachment out of the state so extraction is at-most-once,
/// sets `extracted_text`, and records what happened in the trace. Never
/// fails the turn: extractor errors degrade to the message text.
pub async fn run(state: &mut TurnState, extractor: &dyn ContentExtractor) {
    let fallback = last_user_content(&state.messages).to_string();

    let Some(attachment) = state.attachment.take() else {
        state.trace(Stage::Extract, "no attachment; using message text");
        state.extracted_text = fallback;
        return;
    };

    let kind = AttachmentKind::detect(&attachment.content_type, &attachment.filename);
    if kind == AttachmentKind::Unknown {
        debug!(
            filename = %attachment.filename,
            content_type = %attachment.content_type,
            "unrecognized attachment type"
        );
        state.trace(
            Stage::Extract,
            format!(
                "unrecognized attachment type ({}); using message text",
                attachment.content_type
            ),
        );
        state.extracted_text = fallback;
        return;
    }

    let result = match kind {
        AttachmentKind::Image => extractor.image(&attachment.data).await,
        AttachmentKind::Pdf => extractor.pdf(&attachment.data).await,
        AttachmentKind::Audio => extractor.audio(&attachment.data, &attachment.filename).await,
        AttachmentKind::Unknown => unreachable!("handled above"),
    };

    match result {
        // A successful extraction with no text (blank image, silent
        // audio) degrades the same way a failed one does.
        Ok(extraction) if extraction.text.trim().is_empty() => {
            state.trace(
                Stage::Extract,
                format!("{} extraction returned no text; using message text", kind.as_str()),
            );
            state.extracted_text = fallback;
        }
        Ok(extraction) => {
            state.trace(Stage::Extract, describe(kind, &extraction));
            state.extracted_text = extraction.text;
        }
        Err(e) => {
            warn!(kind = kind.as_str(), error = %e, "extraction failed");
            state.trace(
                Stage::Extract,
                format!("{} extraction failed: {}; using message text", kind.as_str(), e),
            );
            state.extracted_text = fallback;
        }
    }
}

fn describe(kind: AttachmentKind, extraction: &Extraction) -> String {
    match extraction.confidence {
        Some(confidence) => format!(
            "extracted {} chars from {} (confidence {:.2})",
            extraction.text.len(),
            kind.as_str(),
            confidence
        ),
        None => format!(
            "extracted {} chars from {}",
            extraction.text.len(),
            kind.as_str()
        ),
    }
}
