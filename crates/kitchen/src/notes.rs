use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured order notes.
///
/// `extra` keeps fields this version does not know about, so a newer client
/// can round-trip them through an older server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNotes {
    #[serde(default = "OrderNotes::current_version")]
    pub version: u32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl OrderNotes {
    pub const VERSION: u32 = 1;

    fn current_version() -> u32 {
        Self::VERSION
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty)
            && self.modifications.is_empty()
            && self.extra.is_empty()
    }
}

impl Default for OrderNotes {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            text: None,
            modifications: Vec::new(),
            extra: Map::new(),
        }
    }
}
