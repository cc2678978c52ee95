// src/flow/progress.rs
//! Maps download progress onto coarse display phases.
//!
//! The phases are a presentation heuristic: the backend knows nothing about
//! them, and the thresholds only shape what the user sees while bytes arrive.

use std::fmt;

use crate::models::InputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressPhase {
    Extraction,
    Design,
    Construction,
    Finalization,
}

/// Whole percentage of `loaded` over `total`, clamped to 100. A missing or
/// zero total is treated as 100 bytes.
pub fn percent(loaded: u64, total: Option<u64>) -> u8 {
    let total = total.filter(|&t| t > 0).unwrap_or(100);
    let pct = (loaded as f64 * 100.0 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

impl ProgressPhase {
    pub fn for_percent(percent: u8, mode: InputMode) -> Self {
        match mode {
            InputMode::File => match percent {
                0..=24 => ProgressPhase::Extraction,
                25..=49 => ProgressPhase::Design,
                50..=74 => ProgressPhase::Construction,
                _ => ProgressPhase::Finalization,
            },
            // Prompt generation has nothing to extract.
            InputMode::Prompt => match percent {
                0..=29 => ProgressPhase::Design,
                30..=59 => ProgressPhase::Construction,
                _ => ProgressPhase::Finalization,
            },
        }
    }

    pub fn label(self, mode: InputMode) -> &'static str {
        match (mode, self) {
            (_, ProgressPhase::Extraction) => "Extracting key insights...",
            (InputMode::File, ProgressPhase::Design) => "AI designing the narrative...",
            (InputMode::Prompt, ProgressPhase::Design) => "AI drafting professional content...",
            (InputMode::File, ProgressPhase::Construction) => "Building executive slides...",
            (InputMode::Prompt, ProgressPhase::Construction) => {
                "Structuring slides in your style..."
            }
            (InputMode::File, ProgressPhase::Finalization) => "Finalizing presentation...",
            (InputMode::Prompt, ProgressPhase::Finalization) => "Finalizing PPTX presentation...",
        }
    }

    /// Width of the progress bar, in percent.
    pub fn bar_width(self) -> u8 {
        match self {
            ProgressPhase::Extraction => 20,
            ProgressPhase::Design => 45,
            ProgressPhase::Construction => 70,
            ProgressPhase::Finalization => 95,
        }
    }
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgressPhase::Extraction => "extraction",
            ProgressPhase::Design => "design",
            ProgressPhase::Construction => "construction",
            ProgressPhase::Finalization => "finalization",
        };
        f.write_str(name)
    }
}

/// Status line shown while a request is outstanding, before any bytes arrive.
pub fn waiting_message(mode: InputMode, analyzing: bool) -> &'static str {
    match (mode, analyzing) {
        (_, true) => "Analyzing content...",
        (InputMode::File, false) => "Generating presentation...",
        (InputMode::Prompt, false) => "AI generating content from your prompt...",
    }
}
