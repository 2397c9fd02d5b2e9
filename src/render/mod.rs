mod summary;

pub use summary::{highlight_tags, normalize_summary, render_summary, HighlightTag};
