//! Page timing windows.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Timing record for one externally rendered page clip, in document
/// order. `start_time`/`end_time` already include any visibility
/// buffer the renderer applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStatistics {
    pub page_name: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub clip_path: PathBuf,
}

/// A page's slot on the final timeline, numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageWindow {
    pub index: usize,
    pub page_name: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub clip_path: PathBuf,
}

impl PageWindow {
    /// Build windows from page statistics, copying timing through
    /// unchanged.
    pub fn from_statistics(stats: &[PageStatistics]) -> Vec<PageWindow> {
        stats
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let window = PageWindow {
                    index: idx + 1,
                    page_name: s.page_name.clone(),
                    start_time: s.start_time,
                    end_time: s.end_time,
                    duration: s.duration,
                    clip_path: s.clip_path.clone(),
                };
                tracing::debug!(
                    index = window.index,
                    page = %window.page_name,
                    start = window.start_time,
                    end = window.end_time,
                    "page window"
                );
                window
            })
            .collect()
    }
}
