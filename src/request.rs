//! Outgoing OCR request assembly.

use reqwest::multipart::{Form, Part};
use url::Url;

use crate::document::LoadedFile;
use crate::error::OcrError;
use crate::selection::SelectionStore;

/// Prompt used when none (or only whitespace) is given.
pub const DEFAULT_PROMPT: &str = "Read all the text in this image.";
pub const DEFAULT_MAX_TOKENS: &str = "4096";
pub const DEFAULT_TEMPERATURE: &str = "0.0";

pub const STREAM_PATH: &str = "/api/ocr/stream";
pub const RECOGNIZE_PATH: &str = "/api/ocr";
pub const HEALTH_PATH: &str = "/api/health";

/// Generation parameters, passed through to the service as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParams {
    pub prompt: String,
    pub max_tokens: String,
    pub temperature: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS.to_string(),
            temperature: DEFAULT_TEMPERATURE.to_string(),
        }
    }
}

/// A fully assembled request, ready to send.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub file_name: String,
    pub mime_type: String,
    pub file_bytes: Vec<u8>,
    pub prompt: String,
    pub max_tokens: String,
    pub temperature: String,
    /// Serialized page selection; `None` means every page.
    pub pages: Option<String>,
}

impl OcrRequest {
    /// Assemble a request from the file, parameters and current selection.
    pub fn build(
        file: &LoadedFile,
        prompt: &str,
        max_tokens: &str,
        temperature: &str,
        selection: &SelectionStore,
    ) -> Self {
        let prompt = match prompt.trim() {
            "" => DEFAULT_PROMPT.to_string(),
            _ => prompt.to_string(),
        };
        let pages = (selection.size() > 0).then(|| selection.serialize());

        Self {
            file_name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            file_bytes: file.bytes.clone(),
            prompt,
            max_tokens: max_tokens.to_string(),
            temperature: temperature.to_string(),
            pages,
        }
    }

    pub fn with_params(file: &LoadedFile, params: &GenerationParams, selection: &SelectionStore) -> Self {
        Self::build(
            file,
            &params.prompt,
            &params.max_tokens,
            &params.temperature,
            selection,
        )
    }

    /// Streaming endpoint URL, with the `pages` query when a selection exists.
    pub fn stream_url(&self, base: &Url) -> Url {
        let mut url = endpoint(base, STREAM_PATH);
        if let Some(pages) = &self.pages {
            // Commas go out literally, not as %2C.
            url.set_query(Some(&format!("pages={}", pages)));
        }
        url
    }

    /// Multipart body: `file`, `prompt`, `max_tokens`, `temperature`.
    pub fn form(&self) -> Result<Form, OcrError> {
        let file = Part::bytes(self.file_bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime_type)?;

        Ok(Form::new()
            .part("file", file)
            .text("prompt", self.prompt.clone())
            .text("max_tokens", self.max_tokens.clone())
            .text("temperature", self.temperature.clone()))
    }
}

/// Resolve an API path against the server base URL, keeping any base path.
pub fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}{}", prefix, path));
    url.set_query(None);
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_file() -> LoadedFile {
        let bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        LoadedFile::from_bytes("scan.png".into(), "scan.png".into(), bytes).unwrap()
    }

    fn base() -> Url {
        Url::parse("http://localhost:8000").unwrap()
    }

    #[test]
    fn empty_selection_has_no_pages_param() {
        let request = OcrRequest::with_params(
            &png_file(),
            &GenerationParams::default(),
            &SelectionStore::new(5),
        );
        assert_eq!(request.pages, None);
        let url = request.stream_url(&base());
        assert_eq!(url.as_str(), "http://localhost:8000/api/ocr/stream");
        assert!(url.query().is_none());
    }

    #[test]
    fn selection_serialized_ascending() {
        let mut selection = SelectionStore::new(5);
        for page in [3, 1, 2] {
            selection.add(page);
        }
        let request =
            OcrRequest::with_params(&png_file(), &GenerationParams::default(), &selection);
        let url = request.stream_url(&base());
        assert_eq!(url.query(), Some("pages=1,2,3"));
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/ocr/stream?pages=1,2,3"
        );
    }

    #[test]
    fn blank_prompt_uses_default() {
        let request = OcrRequest::build(&png_file(), "   ", "100", "0.7", &SelectionStore::default());
        assert_eq!(request.prompt, DEFAULT_PROMPT);
        assert_eq!(request.max_tokens, "100");
        assert_eq!(request.temperature, "0.7");
    }

    #[test]
    fn parameters_are_not_validated() {
        let request = OcrRequest::build(
            &png_file(),
            "Transcribe",
            "lots",
            "-3",
            &SelectionStore::default(),
        );
        assert_eq!(request.prompt, "Transcribe");
        assert_eq!(request.max_tokens, "lots");
        assert_eq!(request.temperature, "-3");
        assert!(request.form().is_ok());
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let base = Url::parse("https://example.com/ocr/").unwrap();
        assert_eq!(
            endpoint(&base, HEALTH_PATH).as_str(),
            "https://example.com/ocr/api/health"
        );
        let base = Url::parse("https://example.com?x=1").unwrap();
        assert_eq!(
            endpoint(&base, RECOGNIZE_PATH).as_str(),
            "https://example.com/api/ocr"
        );
    }

    #[test]
    fn file_metadata_is_carried() {
        let request =
            OcrRequest::with_params(&png_file(), &GenerationParams::default(), &SelectionStore::default());
        assert_eq!(request.file_name, "scan.png");
        assert_eq!(request.mime_type, "image/png");
        assert_eq!(request.file_bytes.len(), 12);
    }
}
