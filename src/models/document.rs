use serde::{Deserialize, Serialize};

/// Projection of a document awaiting an embedding.
///
/// Only the identifier and the embedding input text are loaded; vectors and
/// any other columns stay in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDocument {
    /// Opaque identifier, stable for the lifetime of the record.
    pub id: String,
    /// Embedding input. May be empty; empty texts are still embedded.
    pub text: String,
}

impl PendingDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_valid() {
        let doc = PendingDocument::new("doc-1", "");
        assert_eq!(doc.id, "doc-1");
        assert!(doc.text.is_empty());
    }
}
