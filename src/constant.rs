/// Application name and metadata constants
pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "RedlineLoc";
pub const APP_NAME: &str = "redline-loc";

/// Marker characters inserted by language filters around comment spans.
/// They never appear in visible output.
pub const COMMENT_START: char = '\u{2}';
pub const COMMENT_END: char = '\u{3}';

/// Line separator used for all internal text after canonicalization
pub const LINE_ENDING: char = '\n';

/// Analysis related Magic Numbers
pub const DEFAULT_TAB_WIDTH: usize = 8;
pub const MAX_TAB_WIDTH: usize = 20;
pub const BINARY_SNIFF_LEN: usize = 8000;
