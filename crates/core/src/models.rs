use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub document_title: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// One page of extracted text. Immutable once created; page numbers are
/// 1-based positions in the source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageUnit {
    pub document_id: String,
    pub document_title: String,
    pub page_number: u32,
    pub text: String,
}

/// An uploaded PDF as the presentation layer hands it over: a file name
/// and the raw bytes.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub unit: PageUnit,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChatMode {
    AskAnything,
    ChatWithPdfs,
    ComparePdfs,
}

impl ChatMode {
    pub fn label(&self) -> &'static str {
        match self {
            ChatMode::AskAnything => "Ask Anything",
            ChatMode::ChatWithPdfs => "Chat With PDFs",
            ChatMode::ComparePdfs => "Compare PDFs",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub query: String,
    pub response: String,
    pub asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    pub top_k: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub max_new_tokens: usize,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.7,
        }
    }
}
