//! Discovery of the external executables the fetcher relies on.
//!
//! Lookup order per tool:
//! 1. an explicitly configured path, if it exists
//! 2. next to the running executable (bundled sidecar layout)
//! 3. the bundled resource directory, if configured
//! 4. `PATH`

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

/// External executables used during a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    YtDlp,
    Ffmpeg,
}

impl Tool {
    /// Name of the executable without platform suffix.
    pub const fn name(self) -> &'static str {
        match self {
            Self::YtDlp => "yt-dlp",
            Self::Ffmpeg => "ffmpeg",
        }
    }

    fn file_name(self) -> String {
        format!("{}{EXE_SUFFIX}", self.name())
    }
}

/// Resolves tool locations. Absence is reported as `None`, never as an error.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    yt_dlp: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
    resource_dir: Option<PathBuf>,
    search_path: bool,
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolLocator {
    /// Locator rooted at the directory of the running executable.
    pub fn new() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        Self {
            yt_dlp: None,
            ffmpeg: None,
            exe_dir,
            resource_dir: None,
            search_path: true,
        }
    }

    /// Prefer `path` for `tool` when it exists.
    #[must_use]
    pub fn with_explicit(mut self, tool: Tool, path: Option<PathBuf>) -> Self {
        match tool {
            Tool::YtDlp => self.yt_dlp = path,
            Tool::Ffmpeg => self.ffmpeg = path,
        }
        self
    }

    #[must_use]
    pub fn with_resource_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.resource_dir = dir;
        self
    }

    #[must_use]
    pub fn with_exe_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.exe_dir = dir;
        self
    }

    /// Disable the `PATH` fallback.
    #[must_use]
    pub const fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    /// Find `tool`, or `None` if no candidate exists.
    pub fn locate(&self, tool: Tool) -> Option<PathBuf> {
        let explicit = match tool {
            Tool::YtDlp => self.yt_dlp.as_deref(),
            Tool::Ffmpeg => self.ffmpeg.as_deref(),
        };

        if let Some(path) = explicit {
            if path.is_file() {
                return Some(path.to_path_buf());
            }
            tracing::warn!(
                tool = tool.name(),
                path = %path.display(),
                "Configured tool path does not exist, searching elsewhere"
            );
        }

        let file_name = tool.file_name();
        let bundled = [self.exe_dir.as_deref(), self.resource_dir.as_deref()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file());
        if bundled.is_some() {
            return bundled;
        }

        if self.search_path {
            return which::which(tool.name()).ok();
        }

        None
    }

    /// Locate every tool and log what was found.
    pub fn discover(&self) -> DiscoveredTools {
        let found = DiscoveredTools {
            yt_dlp: self.locate(Tool::YtDlp),
            ffmpeg: self.locate(Tool::Ffmpeg),
        };

        for (tool, path) in [(Tool::YtDlp, &found.yt_dlp), (Tool::Ffmpeg, &found.ffmpeg)] {
            match path {
                Some(path) => {
                    tracing::info!(tool = tool.name(), path = %path.display(), "Found tool");
                }
                None => tracing::warn!(tool = tool.name(), "Tool not found"),
            }
        }

        found
    }
}

/// Result of [`ToolLocator::discover`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredTools {
    pub yt_dlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}
