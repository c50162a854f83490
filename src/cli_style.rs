/*!
 * s3pull CLI Style System
 *
 * Styled messages, byte and duration formatting, and the tables printed by
 * the listing commands.
 */

use crate::core::BulkDownloadReport;
use crate::protocol::{BucketList, ObjectListing};
use chrono::{DateTime, Utc};
use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::{style, StyledObject};

// ============================================================================
// THEME COLORS
// ============================================================================

/// Brand colors for consistent styling
pub struct Theme;

impl Theme {
    /// Primary accent color (cyan/blue)
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    /// Warning color (yellow)
    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    /// Error color (red)
    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    /// Muted/secondary text (dim)
    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    /// Header style (bold cyan)
    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

// ============================================================================
// ICONS
// ============================================================================

/// Unicode icons for visual feedback
pub struct Icons;

impl Icons {
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const BUCKET: &'static str = "🪣";
    pub const ARROW_RIGHT: &'static str = "→";
}

/// Draw a section header with a line
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

// ============================================================================
// TABLES
// ============================================================================

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a minimal table (no outer borders)
pub fn create_minimal_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a key-value table for stats
pub fn stats_table(items: &[(&str, String)]) -> Table {
    let mut table = create_minimal_table();

    for (key, value) in items {
        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(value)
                .fg(Color::White)
                .add_attribute(Attribute::Bold),
        ]);
    }

    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Buckets with their creation dates
pub fn bucket_table(list: &BucketList) -> Table {
    let mut table = create_table();
    table.set_header(vec![header_cell("Bucket Name"), header_cell("Created")]);

    for bucket in &list.buckets {
        table.add_row(vec![
            Cell::new(&bucket.name),
            Cell::new(bucket.created.map(format_timestamp).unwrap_or_default()),
        ]);
    }

    table
}

/// Bucket, search term, object count and total size of a listing
pub fn listing_summary_table(listing: &ObjectListing) -> Table {
    let mut items = vec![("Bucket", listing.bucket.clone())];
    if let Some(prefix) = &listing.prefix {
        items.push(("Term", prefix.clone()));
    }
    items.push(("Count", listing.len().to_string()));
    items.push(("Total size", format_bytes(listing.total_size())));
    stats_table(&items)
}

/// One row per object
pub fn listing_table(listing: &ObjectListing) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Owner"),
        header_cell("Last Modified"),
        header_cell("Size"),
        header_cell("Bytes"),
        header_cell("Class"),
    ]);

    for entry in &listing.entries {
        table.add_row(vec![
            Cell::new(&entry.key),
            Cell::new(entry.owner.as_deref().unwrap_or("")),
            Cell::new(format_timestamp(entry.last_modified)),
            Cell::new(format_bytes(entry.size)).set_alignment(CellAlignment::Right),
            Cell::new(entry.size).set_alignment(CellAlignment::Right),
            Cell::new(
                entry
                    .storage_class
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }

    table
}

/// Totals of a finished bulk download
pub fn bulk_summary_table(report: &BulkDownloadReport) -> Table {
    let mut items = vec![
        ("Bucket", report.bucket.clone()),
        ("Downloaded", format!("{} files", report.files_downloaded)),
        ("Transferred", format_bytes(report.bytes)),
        ("Unchanged", report.skipped_unchanged.to_string()),
        ("Folder markers", report.skipped_markers.to_string()),
    ];
    if report.skipped_unsafe > 0 {
        items.push(("Unsafe keys", report.skipped_unsafe.to_string()));
    }
    if !report.is_success() {
        items.push(("Failed", report.files_failed().to_string()));
    }
    items.push(("Elapsed", format_duration(report.elapsed.as_secs_f64())));
    stats_table(&items)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Timestamp as shown in tables
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let base = 1024.0_f64;
    let exp = (bytes_f.ln() / base.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f / base.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.2} {}", value, UNITS[exp])
    }
}

/// Format duration into human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor();
        let mins = ((secs % 3600.0) / 60.0).floor();
        format!("{}h {}m", hours, mins)
    }
}

/// Print a styled error message with optional suggestion
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
    eprintln!();
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}

/// Print a styled info message
pub fn print_info(message: &str) {
    println!("{} {}", Theme::primary(Icons::INFO.to_string()), message);
}

/// Print the interactive shell banner
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");

    println!();
    println!(
        "  {} {}  {}",
        Icons::BUCKET,
        Theme::header("s3pull"),
        Theme::muted(format!("v{}", version))
    );
    println!("  {}", Theme::muted("S3 bucket listing and incremental download"));
    println!();
}

// ============================================================================
// TESTS
// ============================================================================
