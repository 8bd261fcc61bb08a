//! Turns save notifications into formatter runs.
//!
//! Every accepted save spawns its own task. There is no queue, no
//! deduplication and no cancellation: two quick saves of the same file run the
//! formatter twice, concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::invoker::{FormatInvoker, FormatRequest, FormatResult};
use crate::binary::CacheStore;
use crate::config::SettingsProvider;
use crate::error::ShaderFmtError;
use crate::notice::NoticeSender;

/// Language ids handled by the formatter. Also matched as file name suffixes.
pub const SUPPORTED_LANGUAGES: &[&str] = &["hlsl", "fx", "fxh", "glsl"];

/// The document handle a host delivers with a save notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub language_id: String,
    pub file_name: String,
    pub is_untitled: bool,
    /// Absolute path on disk; `None` for untitled documents.
    pub path: Option<PathBuf>,
}

impl SavedDocument {
    /// A saved file, with the language id taken from its extension when it is
    /// a supported one and `plaintext` otherwise.
    pub fn from_path(path: &Path) -> Self {
        let language_id = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| SUPPORTED_LANGUAGES.contains(&ext.as_str()))
            .unwrap_or_else(|| "plaintext".to_string());

        Self {
            language_id,
            file_name: path.to_string_lossy().into_owned(),
            is_untitled: false,
            path: Some(path.to_path_buf()),
        }
    }
}

/// Whether a document should be formatted.
///
/// The suffix fallback is a plain string match, not an extension check:
/// `"myglsl"` is accepted just like `"shader.glsl"`.
pub fn is_supported(doc: &SavedDocument) -> bool {
    if doc.is_untitled {
        return false;
    }

    SUPPORTED_LANGUAGES.contains(&doc.language_id.as_str())
        || SUPPORTED_LANGUAGES
            .iter()
            .any(|suffix| doc.file_name.ends_with(suffix))
}

/// What a single save event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Not a shader document, or nothing on disk to format.
    Ignored(&'static str),
    /// No override and nothing cached; reported to the user.
    MissingBinary,
    Formatted(FormatResult),
}

/// Filters save events and hands accepted ones to the invoker.
pub struct SaveEventRouter {
    settings: Arc<dyn SettingsProvider>,
    store: Arc<dyn CacheStore>,
    invoker: FormatInvoker,
    notices: NoticeSender,
}

impl SaveEventRouter {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        store: Arc<dyn CacheStore>,
        notices: NoticeSender,
    ) -> Self {
        Self {
            settings,
            store,
            invoker: FormatInvoker::new(notices.clone()),
            notices,
        }
    }

    /// Handles a save notification on its own task.
    ///
    /// Returns `None` when the document is filtered out, so rejected saves
    /// never spawn anything.
    pub fn on_save(self: &Arc<Self>, doc: SavedDocument) -> Option<JoinHandle<SaveOutcome>> {
        if !is_supported(&doc) || doc.path.is_none() {
            debug!(file = %doc.file_name, language = %doc.language_id, "Save ignored");
            return None;
        }

        let router = Arc::clone(self);
        Some(tokio::spawn(async move { router.handle_save(doc).await }))
    }

    /// Filters, resolves the binary and runs the formatter once.
    pub async fn handle_save(&self, doc: SavedDocument) -> SaveOutcome {
        if doc.is_untitled {
            return SaveOutcome::Ignored("untitled document");
        }
        if !is_supported(&doc) {
            return SaveOutcome::Ignored("unsupported language");
        }
        let Some(file_path) = doc.path else {
            return SaveOutcome::Ignored("no file path");
        };

        let binary_path = match self.resolve_binary().await {
            Ok(path) => path,
            Err(e) => {
                warn!(file = %file_path.display(), "No shader-formatter binary available");
                self.notices.error(e.to_string());
                return SaveOutcome::MissingBinary;
            }
        };

        let request = FormatRequest {
            file_path,
            binary_path,
        };
        SaveOutcome::Formatted(self.invoker.run(&request).await)
    }

    /// The settings override when set, else the first cached binary.
    async fn resolve_binary(&self) -> Result<PathBuf, ShaderFmtError> {
        if let Some(path) = self.settings.current().executable_override() {
            return Ok(path);
        }

        self.store
            .list_cached()
            .await
            .into_iter()
            .next()
            .map(|entry| entry.path)
            .ok_or(ShaderFmtError::Configuration)
    }
}
