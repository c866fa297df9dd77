//! CLI output formatting.
//!
//! Human-readable lines for progress and summaries. The JSON payloads the
//! `process`, `manifest` and `metadata` commands print on stdout are plain
//! `serde_json` and don't go through here.
//!
//! # Output Format
//!
//! ## Process (with `--progress`)
//!
//! ```text
//! birdhouse (3 images)
//!     001 IMG_0001.jpg
//!         thumb: encoded
//!         medium: encoded
//!         large: copied
//!         xlarge: copied
//!         Archived: originals/IMG_0001.jpg
//!     002 IMG_0002.jpg (already processed)
//!     003 broken.jpg
//!         Error: Failed to decode JPEG: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! birdhouse: 1 processed, 1 skipped, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and, where the CLI needs it, a `print_*` wrapper. Progress goes to stderr so
//! stdout stays machine-readable.

use crate::manifest::Manifest;
use crate::metadata::{MetadataValue, ProjectMetadata};
use crate::process::{ProcessEvent, ProcessingResult, ProjectOutcome, RenditionStatus};
use std::collections::BTreeMap;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

fn status_label(status: RenditionStatus) -> &'static str {
    match status {
        RenditionStatus::Existing => "existing",
        RenditionStatus::Copied => "copied",
        RenditionStatus::Encoded => "encoded",
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ProjectStarted {
            project,
            image_count,
        } => vec![format!(
            "{} ({})",
            project,
            plural(*image_count, "image", "images")
        )],
        ProcessEvent::ImageProcessed {
            index,
            filename,
            renditions,
            moved_original,
        } => {
            let mut lines = vec![format!("    {} {}", format_index(*index), filename)];
            for r in renditions {
                lines.push(format!("        {}: {}", r.name, status_label(r.status)));
            }
            if *moved_original {
                lines.push(format!(
                    "        Archived: {}/{}",
                    crate::scan::ORIGINALS_DIR,
                    filename
                ));
            } else {
                lines.push("        Source left in place".to_string());
            }
            lines
        }
        ProcessEvent::ImageSkipped { index, filename } => vec![format!(
            "    {} {} (already processed)",
            format_index(*index),
            filename
        )],
        ProcessEvent::ImageFailed {
            index,
            filename,
            error,
        } => vec![
            format!("    {} {}", format_index(*index), filename),
            format!("        Error: {}", error),
        ],
        ProcessEvent::Deferred { project, count } => vec![format!(
            "{}: time budget exhausted, {} deferred",
            project,
            plural(*count, "file", "files")
        )],
    }
}

/// One summary line for a finished project. Zero counts are left out.
pub fn format_processing_summary(project: &str, result: &ProcessingResult) -> String {
    let counts = [
        (result.processed.len(), "processed"),
        (result.skipped.len(), "skipped"),
        (result.errors.len(), "failed"),
        (result.deferred.len(), "deferred"),
    ];
    let parts: Vec<String> = counts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{} {}", n, label))
        .collect();
    if parts.is_empty() {
        format!("{}: no images", project)
    } else {
        format!("{}: {}", project, parts.join(", "))
    }
}

/// Summary lines for a whole-root run, one per project.
pub fn format_all_summary(outcomes: &BTreeMap<String, ProjectOutcome>) -> Vec<String> {
    outcomes
        .iter()
        .map(|(project, outcome)| match outcome {
            ProjectOutcome::Processed(result) => format_processing_summary(project, result),
            ProjectOutcome::Failed { error } => format!("{}: error: {}", project, error),
        })
        .collect()
}

/// Print progress lines for one event to stderr.
pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Manifest and metadata output
// ============================================================================

/// Overview of a manifest: each project with its file count and files.
pub fn format_manifest_overview(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();
    for (project, entries) in manifest {
        lines.push(format!(
            "{} ({})",
            project,
            plural(entries.len(), "image", "images")
        ));
        for (i, entry) in entries.iter().enumerate() {
            let sizes = entry.srcset.split(", ").count();
            lines.push(format!(
                "    {} {} ({})",
                format_index(i + 1),
                entry.filename,
                plural(sizes, "size", "sizes")
            ));
        }
    }
    lines
}

/// `key: value` lines for a sidecar; list items indented under their key.
pub fn format_metadata(metadata: &ProjectMetadata) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, value) in &metadata.fields {
        match value {
            MetadataValue::Text(text) => lines.push(format!("{}: {}", key, text)),
            MetadataValue::List(items) => {
                lines.push(format!("{}:", key));
                for item in items {
                    lines.push(format!("    - {}", item));
                }
            }
        }
    }
    lines
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestEntry;
    use crate::process::{FileError, RenditionInfo};

    fn info(name: &str, status: RenditionStatus) -> RenditionInfo {
        RenditionInfo {
            name: name.to_string(),
            status,
        }
    }

    #[test]
    fn format_index_padding() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    // =========================================================================
    // Process event formatting
    // =========================================================================

    #[test]
    fn project_started() {
        let event = ProcessEvent::ProjectStarted {
            project: "birdhouse".to_string(),
            image_count: 3,
        };
        assert_eq!(format_process_event(&event), vec!["birdhouse (3 images)"]);

        let single = ProcessEvent::ProjectStarted {
            project: "stool".to_string(),
            image_count: 1,
        };
        assert_eq!(format_process_event(&single), vec!["stool (1 image)"]);
    }

    #[test]
    fn image_processed_lists_renditions_and_archive() {
        let event = ProcessEvent::ImageProcessed {
            index: 1,
            filename: "IMG_0001.jpg".to_string(),
            renditions: vec![
                info("thumb", RenditionStatus::Encoded),
                info("medium", RenditionStatus::Existing),
                info("large", RenditionStatus::Copied),
            ],
            moved_original: true,
        };
        assert_eq!(
            format_process_event(&event),
            vec![
                "    001 IMG_0001.jpg",
                "        thumb: encoded",
                "        medium: existing",
                "        large: copied",
                "        Archived: originals/IMG_0001.jpg",
            ]
        );
    }

    #[test]
    fn image_processed_without_archive() {
        let event = ProcessEvent::ImageProcessed {
            index: 12,
            filename: "a.png".to_string(),
            renditions: vec![],
            moved_original: false,
        };
        assert_eq!(
            format_process_event(&event),
            vec!["    012 a.png", "        Source left in place"]
        );
    }

    #[test]
    fn image_skipped_and_failed() {
        let skipped = ProcessEvent::ImageSkipped {
            index: 2,
            filename: "b.jpg".to_string(),
        };
        assert_eq!(
            format_process_event(&skipped),
            vec!["    002 b.jpg (already processed)"]
        );

        let failed = ProcessEvent::ImageFailed {
            index: 3,
            filename: "c.jpg".to_string(),
            error: "bad data".to_string(),
        };
        assert_eq!(
            format_process_event(&failed),
            vec!["    003 c.jpg", "        Error: bad data"]
        );
    }

    #[test]
    fn deferred() {
        let event = ProcessEvent::Deferred {
            project: "p".to_string(),
            count: 4,
        };
        assert_eq!(
            format_process_event(&event),
            vec!["p: time budget exhausted, 4 files deferred"]
        );
    }

    // =========================================================================
    // Summaries
    // =========================================================================

    #[test]
    fn summary_omits_zero_counts() {
        let result = ProcessingResult {
            processed: vec!["a.jpg".into(), "b.jpg".into()],
            moved_to_originals: vec!["a.jpg".into()],
            skipped: vec![],
            deferred: vec![],
            errors: vec![FileError {
                filename: "c.jpg".into(),
                error: "x".into(),
            }],
        };
        assert_eq!(
            format_processing_summary("bench", &result),
            "bench: 2 processed, 1 failed"
        );
    }

    #[test]
    fn summary_for_empty_project() {
        assert_eq!(
            format_processing_summary("empty", &ProcessingResult::default()),
            "empty: no images"
        );
    }

    #[test]
    fn all_summary_includes_failures() {
        let mut outcomes = BTreeMap::new();
        outcomes.insert(
            "a".to_string(),
            ProjectOutcome::Processed(ProcessingResult {
                skipped: vec!["x.jpg".into()],
                ..Default::default()
            }),
        );
        outcomes.insert(
            "b".to_string(),
            ProjectOutcome::Failed {
                error: "Permission denied".to_string(),
            },
        );
        assert_eq!(
            format_all_summary(&outcomes),
            vec!["a: 1 skipped", "b: error: Permission denied"]
        );
    }

    // =========================================================================
    // Manifest and metadata
    // =========================================================================

    #[test]
    fn manifest_overview() {
        let mut manifest = Manifest::new();
        manifest.insert(
            "bench".to_string(),
            vec![ManifestEntry {
                filename: "a.jpg".to_string(),
                srcset: "/w/bench/sizes/thumb/a.jpg 400w, /w/bench/sizes/large/a.jpg 1200w"
                    .to_string(),
                sizes: "100vw".to_string(),
            }],
        );
        assert_eq!(
            format_manifest_overview(&manifest),
            vec!["bench (1 image)", "    001 a.jpg (2 sizes)"]
        );
    }

    #[test]
    fn metadata_lines() {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), MetadataValue::Text("Bench".to_string()));
        fields.insert(
            "tools".to_string(),
            MetadataValue::List(vec!["saw".to_string(), "plane".to_string()]),
        );
        let meta = ProjectMetadata { fields };
        assert_eq!(
            format_metadata(&meta),
            vec!["title: Bench", "tools:", "    - saw", "    - plane"]
        );
    }
}
