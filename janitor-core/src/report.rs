//! Report structures and output formatting - plaintext and JSON.

use std::path::PathBuf;

use serde::Serialize;

use crate::entity::{Attribution, EntityError};
use crate::needle::Needle;
use crate::scan::SkippedFile;

/// How an entity's score reads against the caller's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageVerdict {
    /// Occurrences exist and the score is above the threshold
    Used,
    /// No occurrences, whatever the threshold
    Unused,
    /// Occurrences exist but their weights leave the score at or below
    /// the threshold
    Doubtful,
    /// Analysis failed; the score means nothing
    Incomplete,
}

impl UsageVerdict {
    /// An entity with no occurrences is never `Used`, even when a negative
    /// threshold sits below its zero score.
    pub fn classify(usage: i64, occurrences: usize, failed: bool, threshold: i64) -> Self {
        if failed {
            Self::Incomplete
        } else if occurrences == 0 {
            Self::Unused
        } else if usage > threshold {
            Self::Used
        } else {
            Self::Doubtful
        }
    }
}

impl std::fmt::Display for UsageVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Used => write!(f, "used"),
            Self::Unused => write!(f, "unused"),
            Self::Doubtful => write!(f, "doubtful"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// Serialized form of one analyzed entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub kind: String,
    pub root: PathBuf,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<PathBuf>,
    pub usage: i64,
    /// Cached matrix; empty if the entity was reported before its matrix
    /// was computed
    pub usage_matrix: Vec<Needle>,
    /// Combined pattern of the cached matrix, empty under the same
    /// condition
    pub usage_pattern: String,
    pub occurrences: Vec<String>,
    pub attributions: Vec<Attribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EntityError>,
    pub verdict: UsageVerdict,
}

/// Counts over one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportStats {
    pub total_entities: usize,
    pub used: usize,
    pub unused: usize,
    pub doubtful: usize,
    pub incomplete: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

/// Result of analyzing one entity type.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub kind: String,
    pub root: PathBuf,
    /// RFC 3339 timestamp of report creation
    pub generated_at: String,
    pub threshold: i64,
    pub entities: Vec<EntityReport>,
    pub skipped_files: Vec<SkippedFile>,
    pub stats: ReportStats,
}

impl AnalysisReport {
    pub fn new(
        kind: impl Into<String>,
        root: PathBuf,
        threshold: i64,
        entities: Vec<EntityReport>,
        files_scanned: usize,
        skipped_files: Vec<SkippedFile>,
    ) -> Self {
        let count = |v: UsageVerdict| entities.iter().filter(|e| e.verdict == v).count();
        let stats = ReportStats {
            total_entities: entities.len(),
            used: count(UsageVerdict::Used),
            unused: count(UsageVerdict::Unused),
            doubtful: count(UsageVerdict::Doubtful),
            incomplete: count(UsageVerdict::Incomplete),
            files_scanned,
            files_skipped: skipped_files.len(),
        };

        Self {
            kind: kind.into(),
            root,
            generated_at: chrono::Utc::now().to_rfc3339(),
            threshold,
            entities,
            skipped_files,
            stats,
        }
    }

    pub fn with_verdict(&self, verdict: UsageVerdict) -> impl Iterator<Item = &EntityReport> {
        self.entities.iter().filter(move |e| e.verdict == verdict)
    }

    /// Check if any entity was found unused.
    pub fn has_unused(&self) -> bool {
        self.stats.unused > 0
    }

    pub fn entity(&self, name: &str) -> Option<&EntityReport> {
        self.entities.iter().find(|e| e.name == name)
    }
}

/// Prints a report in plain text format.
///
/// With `unused_only`, used entities are left out of the listing.
pub fn print_plain(report: &AnalysisReport, unused_only: bool) {
    println!("=== {} usage analysis ===\n", report.kind);
    println!("Root:       {}", report.root.display());
    println!("Entities:   {}", report.stats.total_entities);
    println!("Used:       {}", report.stats.used);
    println!("Unused:     {}", report.stats.unused);
    println!("Doubtful:   {}", report.stats.doubtful);
    println!("Incomplete: {}", report.stats.incomplete);
    println!(
        "Files:      {} scanned, {} skipped",
        report.stats.files_scanned, report.stats.files_skipped
    );

    let sections = [
        (UsageVerdict::Unused, "UNUSED"),
        (UsageVerdict::Doubtful, "DOUBTFUL"),
        (UsageVerdict::Incomplete, "INCOMPLETE"),
        (UsageVerdict::Used, "USED"),
    ];
    for (verdict, title) in sections {
        if unused_only && verdict == UsageVerdict::Used {
            continue;
        }
        let entries: Vec<&EntityReport> = report.with_verdict(verdict).collect();
        if entries.is_empty() {
            continue;
        }

        println!("\n{} ({}):", title, entries.len());
        for entity in entries {
            match &entity.error {
                Some(err) => println!("- {} [{}] {}", entity.name, err.kind, err.message),
                None => println!(
                    "- {} (usage {}, {} file(s))",
                    entity.name,
                    entity.usage,
                    entity.occurrences.len()
                ),
            }
        }
    }

    if !report.skipped_files.is_empty() {
        println!("\nSKIPPED FILES ({}):", report.skipped_files.len());
        for skipped in &report.skipped_files {
            println!("- {} ({})", skipped.path.display(), skipped.reason);
        }
    }
}

/// Prints a report in JSON format.
///
/// Falls back to a minimal summary if serialization fails.
pub fn print_json(report: &AnalysisReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!(error = %e, "JSON serialization failed");
            println!(
                "{{\"kind\": {:?}, \"unused\": {}}}",
                report.kind, report.stats.unused
            );
        }
    }
}
