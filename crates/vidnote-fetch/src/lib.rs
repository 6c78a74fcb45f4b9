//! yt-dlp adapter for the vidnote [`MediaFetcher`](vidnote_core::MediaFetcher) port.
//!
//! - `tools`: locate `yt-dlp` and `ffmpeg`
//! - `protocol`: parse the machine-readable lines yt-dlp prints
//! - `ytdlp`: run the child process and turn its output into a fetch outcome

pub mod protocol;
pub mod tools;
pub mod ytdlp;

pub use protocol::{FetchEvent, ProtocolError, ResultLine, parse_line};
pub use tools::{DiscoveredTools, Tool, ToolLocator};
pub use ytdlp::{YtDlpFetcher, resolve_format, resolve_output_dir};
