use serde::{Deserialize, Serialize};

use crate::text_diff::{CharDiff, TextDiffer, WordDiff};

/// Unit of the text diff inside changed text nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Char,
    /// Words and the whitespace runs between them.
    Word,
}

impl Granularity {
    pub(crate) fn differ(self) -> Box<dyn TextDiffer> {
        match self {
            Granularity::Char => Box::new(CharDiff),
            Granularity::Word => Box::new(WordDiff),
        }
    }
}

/// Options for [`crate::diff`].
///
/// ```
/// use redraft::{DiffOptions, Granularity};
///
/// let options: DiffOptions = serde_json::from_str(r#"{"granularity": "word"}"#).unwrap();
/// assert!(options.structural_steps);
/// assert_eq!(options.granularity, Granularity::Word);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffOptions {
    /// Diff content with marks stripped, then reconcile marks in a
    /// separate pass. When off, one diff runs over the full documents and
    /// mark changes surface as replace steps.
    pub structural_steps: bool,
    pub granularity: Granularity,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            structural_steps: true,
            granularity: Granularity::Char,
        }
    }
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structural_steps(mut self, on: bool) -> Self {
        self.structural_steps = on;
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}
