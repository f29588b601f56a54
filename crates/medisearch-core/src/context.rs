//! Length-bounded prompt context assembly.

use tracing::info;

use crate::types::Evidence;

const DEFAULT_MAX_WORDS: usize = 2048;
const TITLE_CHARS: usize = 80;

/// Context packed from ranked evidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    /// Labeled source blocks joined by blank lines
    pub text: String,

    /// Whitespace-token count across included blocks
    pub word_count: usize,

    /// Number of evidence items included, always a rank-order prefix
    pub sources_used: usize,
}

/// Packs evidence into a word-budgeted context, whole blocks only.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_words: usize,
}

impl ContextAssembler {
    pub fn new(max_words: usize) -> Self {
        Self { max_words }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Format blocks in rank order until the next one would exceed the budget.
    pub fn assemble(&self, evidence: &[Evidence]) -> AssembledContext {
        let mut blocks = Vec::new();
        let mut word_count = 0usize;

        for (idx, item) in evidence.iter().enumerate() {
            let block = format_block(idx + 1, item);
            let words = block.split_whitespace().count();

            if word_count + words > self.max_words {
                break;
            }

            blocks.push(block);
            word_count += words;
        }

        info!(words = word_count, sources = blocks.len(), "Built context");

        AssembledContext {
            sources_used: blocks.len(),
            text: blocks.join("\n"),
            word_count,
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORDS)
    }
}

fn format_block(index: usize, evidence: &Evidence) -> String {
    let title: String = evidence.title.chars().take(TITLE_CHARS).collect();
    format!("[Source {} - {}]\n{}\n", index, title, evidence.excerpt)
}
