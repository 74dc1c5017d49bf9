//! Timeline compositor for tab page videos.
//!
//! Takes the per-page timing statistics produced by an external page
//! renderer and stitches the already-rendered clips into one
//! continuous, audio-synchronized video: gaps between pages are
//! filled, overlaps trim the previous segment, and the tail is padded
//! out to the audio's full duration. The actual video work runs
//! through an external tool (ffmpeg) behind a process-execution seam.
//!
//! ```no_run
//! use std::path::Path;
//! use compositor::{Compositor, CompositorConfig, PageStatistics, SystemRunner};
//!
//! let pages = vec![PageStatistics {
//!     page_name: "page 1".into(),
//!     start_time: 0.5,
//!     end_time: 5.5,
//!     duration: 5.0,
//!     clip_path: "renders/page_1.mov".into(),
//! }];
//!
//! let compositor = Compositor::new(CompositorConfig::default(), SystemRunner);
//! compositor
//!     .compose(&pages, 13.0, Path::new("out/full_tab.mov"), None)
//!     .unwrap();
//! ```

pub mod compose;
pub mod exec;
pub mod ffmpeg;
pub mod plan;
pub mod window;

pub use compose::{Compositor, CompositorConfig, CompositorError, FillerStyle};
pub use exec::{ExecError, ProcessRunner, RecordingRunner, SystemRunner, ToolCommand, ToolOutput};
pub use plan::{build_plan, Segment};
pub use window::{PageStatistics, PageWindow};
