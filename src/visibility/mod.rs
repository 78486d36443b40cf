mod access_window;
mod classifier;

#[cfg(test)]
mod tests;

pub use access_window::{AccessWindow, ParsedWindows};
pub use classifier::{
    ConstellationSummary, PairVisibility, VisibilityClassifier, VisibilityRecord, VisibilitySummary,
};
