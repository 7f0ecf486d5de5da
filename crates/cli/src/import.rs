//! `estimate parse` / `estimate convert`: upload, preview, import.

use std::io::Write;
use std::path::{Path, PathBuf};

use estimate_core::money::format_cents;
use estimate_ingest::{parse_bytes_sheet, ExcelParseResult, ImportError, PipelineConfig, UploadSession};

use crate::exit_codes::{import_exit_code, import_hint, EXIT_IO, EXIT_ROW_ERRORS, EXIT_USAGE};
use crate::CliError;

impl From<ImportError> for CliError {
    fn from(err: ImportError) -> Self {
        Self {
            code: import_exit_code(&err),
            message: err.to_string(),
            hint: import_hint(&err).map(str::to_string),
        }
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("cannot read {}: {e}", path.display()),
        hint: None,
    })
}

fn write_output(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("cannot write {}: {e}", path.display()),
        hint: None,
    })?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })
}

// ============================================================================
// parse
// ============================================================================

pub fn cmd_parse(
    config: &PipelineConfig,
    file: PathBuf,
    sheet: Option<String>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let bytes = read_input(&file)?;
    let result = parse_bytes_sheet(&bytes, config, sheet.as_deref())?;

    if let Some(ref path) = output {
        write_output(path, to_json(&result)?.as_bytes())?;
    }

    if json {
        println!("{}", to_json(&result)?);
        print_summary_line(&result);
    } else {
        print_preview(&result).map_err(|e| CliError {
            code: EXIT_IO,
            message: e.to_string(),
            hint: None,
        })?;
    }

    if result.has_errors() {
        let count = result.errors().count();
        return Err(CliError {
            code: EXIT_ROW_ERRORS,
            message: format!("{count} row error(s); import is blocked"),
            hint: Some("fix the file, or drop the rows with `estimate convert --drop-row N`".into()),
        });
    }
    Ok(())
}

/// One-line summary on stderr, for `--json` runs.
fn print_summary_line(result: &ExcelParseResult) {
    let s = result.summary();
    eprintln!(
        "{}: {} item(s), computed {}, {} error(s), {} warning(s)",
        result.sheet_name(),
        s.item_count,
        format_cents(s.computed_grand_total_cents),
        result.errors().count(),
        result.warnings().count(),
    );
}

fn column_letter(mut col: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn opt_cents(cents: Option<i64>) -> String {
    cents.map(format_cents).unwrap_or_default()
}

/// Human preview: mapping, items, totals, diagnostics. Row numbers are 1-based.
fn print_preview(result: &ExcelParseResult) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mapping = result.column_mapping();
    writeln!(
        out,
        "sheet: {} ({})  header row {}",
        result.sheet_name(),
        result.meta().source_format,
        mapping.header_row + 1
    )?;
    let columns: Vec<String> = mapping
        .iter()
        .map(|(role, col)| format!("{role}={}", column_letter(col)))
        .collect();
    writeln!(out, "columns: {}", columns.join(", "))?;
    writeln!(out)?;

    writeln!(
        out,
        "{:>5}  {:<18} {:<36} {:>9} {:<5} {:>12} {:>14}",
        "row", "category", "description", "qty", "unit", "unit price", "total"
    )?;
    for item in result.line_items() {
        writeln!(
            out,
            "{:>5}  {:<18} {:<36} {:>9} {:<5} {:>12} {:>14}",
            item.row_index + 1,
            truncate(&item.canonical_category, 18),
            truncate(&item.description, 36),
            item.quantity.map(|q| format!("{q:.2}")).unwrap_or_default(),
            truncate(item.unit.as_deref().unwrap_or(""), 5),
            opt_cents(item.unit_price_cents),
            format_cents(item.line_total_cents),
        )?;
    }
    writeln!(out)?;

    let s = result.summary();
    writeln!(out, "items:          {}", s.item_count)?;
    writeln!(out, "subtotal:       {}", format_cents(s.computed_subtotal_cents))?;
    if s.computed_tax_cents != 0 {
        writeln!(out, "tax:            {}", format_cents(s.computed_tax_cents))?;
    }
    if s.computed_overhead_profit_cents != 0 {
        writeln!(out, "O&P:            {}", format_cents(s.computed_overhead_profit_cents))?;
    }
    writeln!(out, "computed total: {}", format_cents(s.computed_grand_total_cents))?;
    match (s.declared_grand_total_cents, s.declared_total_row) {
        (Some(declared), Some(row)) => {
            writeln!(out, "declared total: {} (row {})", format_cents(declared), row + 1)?;
            let verdict = if s.reconciles() { "within tolerance" } else { "does not reconcile" };
            writeln!(out, "difference:     {} ({verdict})", opt_cents(s.discrepancy_cents))?;
            let others: Vec<String> = result
                .declared_totals()
                .iter()
                .filter(|t| t.row_index != row)
                .map(|t| format!("{} {} (row {})", t.label, format_cents(t.amount_cents), t.row_index + 1))
                .collect();
            if !others.is_empty() {
                writeln!(out, "also declared:  {}", others.join("; "))?;
            }
        }
        _ => writeln!(out, "declared total: none found")?,
    }
    writeln!(out, "categories:     {}", result.categories().join(", "))?;

    if !result.diagnostics().is_empty() {
        writeln!(out)?;
        for d in result.diagnostics() {
            writeln!(out, "{d}")?;
        }
    }
    Ok(())
}

// ============================================================================
// convert
// ============================================================================

/// `--category ROW=NAME`
fn parse_category_arg(arg: &str) -> Result<(usize, String), CliError> {
    let usage = || CliError {
        code: EXIT_USAGE,
        message: format!("invalid --category '{arg}'"),
        hint: Some("expected ROW=NAME, e.g. --category 7=Roofing".into()),
    };
    let (row, name) = arg.split_once('=').ok_or_else(usage)?;
    let row: usize = row.trim().parse().map_err(|_| usage())?;
    if row == 0 || name.trim().is_empty() {
        return Err(usage());
    }
    Ok((row - 1, name.trim().to_string()))
}

pub fn cmd_convert(
    config: &PipelineConfig,
    file: PathBuf,
    sheet: Option<String>,
    drop_rows: Vec<usize>,
    categories: Vec<String>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    if drop_rows.contains(&0) {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "--drop-row takes sheet row numbers starting at 1".into(),
            hint: None,
        });
    }
    let recategorize = categories
        .iter()
        .map(|arg| parse_category_arg(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let mut session = UploadSession::new();
    let ticket = session.begin();
    let bytes = read_input(&file)?;
    let result = parse_bytes_sheet(&bytes, config, sheet.as_deref())?;
    session.complete(ticket, result);

    if !drop_rows.is_empty() {
        let rows: Vec<usize> = drop_rows.iter().map(|r| r - 1).collect();
        session.apply(|r| r.without_rows(&rows))?;
    }
    for (row, name) in &recategorize {
        session.apply(|r| r.with_category(*row, name))?;
    }

    let estimate = match session.import() {
        Ok(estimate) => estimate,
        Err(err) => {
            if let Some(preview) = session.preview() {
                for d in preview.errors() {
                    eprintln!("{d}");
                }
            }
            return Err(err.into());
        }
    };

    let json = to_json(&estimate)?;
    match output {
        Some(ref path) => write_output(path, json.as_bytes())?,
        None => println!("{json}"),
    }
    eprintln!(
        "{} item(s) in {} categor(ies), total {}",
        estimate.item_count(),
        estimate.categories.len(),
        format_cents(estimate.total_cents())
    );
    Ok(())
}
