//! Services module - the merge itself.
//!
//! [`MergeService`] is framework-agnostic: it knows nothing about Slint or the file
//! list, only about an ordered list of input paths, an output path and the
//! [`AutomationProvider`](crate::automation::AutomationProvider) it drives.
//!
//! # Usage Example
//!
//! ```ignore
//! use hwp_merge::automation::{KeepFlags, hwp::HwpProvider};
//! use hwp_merge::services::{MergeRequest, MergeService};
//!
//! let provider = HwpProvider::new("HWPFrame.HwpObject", "FilePathCheckerModule", false);
//! let outcome = MergeService::new().merge(
//!     &provider,
//!     &MergeRequest {
//!         output_path: "merged.hwp".into(),
//!         inputs: vec!["a.hwp".into(), "b.hwpx".into()],
//!         keep: KeepFlags::ALL,
//!         export_pdf: true,
//!     },
//! )?;
//! ```

pub mod merge;

pub use merge::{MergeError, MergeOutcome, MergeRequest, MergeService, MergeStep, pdf_path_for};
