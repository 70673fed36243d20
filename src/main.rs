use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use datasheet_recon::datasheet::{MappingSurvey, SheetOutcome};
use datasheet_recon::excel::{self, cell_reference};
use datasheet_recon::{populate_files, survey, LayoutConfig, Mapping, PopulateReport, ReconcileOptions};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "datasheet-recon",
    version,
    about = "Populate a master equipment datasheet from a SysCAD streamtable export."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List, per equipment sheet, the parameters that can be mapped and the streamtable tags on offer.
    Survey {
        /// Master datasheet workbook.
        master: PathBuf,

        /// Streamtable workbook.
        streamtable: PathBuf,

        /// JSON file overriding the default sheet layout.
        #[arg(long, value_name = "PATH")]
        layout: Option<PathBuf>,

        /// Write a mapping skeleton (every parameter set to null) to this file.
        #[arg(long, value_name = "PATH")]
        template: Option<PathBuf>,

        /// Existing mapping whose choices are carried into the skeleton.
        #[arg(long, value_name = "PATH", requires = "template")]
        mapping: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Copy mapped streamtable values and units into the master datasheet.
    Populate {
        /// Master datasheet workbook.
        master: PathBuf,

        /// Streamtable workbook.
        streamtable: PathBuf,

        /// Mapping file: {"<equipment>": {"<parameter>": "<tag>"}}.
        #[arg(long, value_name = "PATH")]
        mapping: PathBuf,

        /// Output workbook (default: a timestamped file next to the master).
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        /// JSON file overriding the default sheet layout.
        #[arg(long, value_name = "PATH")]
        layout: Option<PathBuf>,

        /// Append streamtable unit tags missing from the master header row.
        #[arg(long)]
        append_missing_unit_tags: bool,

        /// Copy the master aside first when the output would overwrite it.
        #[arg(long)]
        backup: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Survey {
            master,
            streamtable,
            layout,
            template,
            mapping,
            format,
        } => run_survey(
            &master,
            &streamtable,
            layout.as_deref(),
            template.as_deref(),
            mapping.as_deref(),
            format,
        ),
        Command::Populate {
            master,
            streamtable,
            mapping,
            output,
            layout,
            append_missing_unit_tags,
            backup,
            format,
        } => {
            let options = ReconcileOptions {
                append_missing_unit_tags,
            };
            run_populate(
                &master,
                &streamtable,
                &mapping,
                output,
                layout.as_deref(),
                options,
                backup,
                format,
            )
        }
    }
}

fn load_layout(path: Option<&Path>) -> Result<LayoutConfig> {
    match path {
        Some(path) => LayoutConfig::load(path).with_context(|| format!("loading layout {}", path.display())),
        None => Ok(LayoutConfig::default()),
    }
}

fn run_survey(
    master: &Path,
    streamtable: &Path,
    layout: Option<&Path>,
    template: Option<&Path>,
    mapping: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let layout = load_layout(layout)?;
    let master_book =
        excel::load_workbook(master).with_context(|| format!("reading master {}", master.display()))?;
    let stream_book = excel::load_workbook(streamtable)
        .with_context(|| format!("reading streamtable {}", streamtable.display()))?;

    let result = survey(&master_book, &stream_book, &layout);

    if let Some(template_path) = template {
        let existing = mapping
            .map(|path| Mapping::load(path).with_context(|| format!("loading mapping {}", path.display())))
            .transpose()?;
        let skeleton = result.template(existing.as_ref());
        let json = serde_json::to_string_pretty(&skeleton)?;
        std::fs::write(template_path, json)
            .with_context(|| format!("writing template {}", template_path.display()))?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_survey(&result, &layout),
    }
    Ok(())
}

fn print_survey(result: &MappingSurvey, layout: &LayoutConfig) {
    if !result.missing.is_empty() {
        println!(
            "Equipment sheets in the master but missing from the streamtable: {}",
            result.missing.join(", ")
        );
    }
    for skip in &result.skipped {
        println!("{}", skip.message(&layout.target_category));
    }
    for sheet in &result.sheets {
        println!();
        println!("{} ({} tags available)", sheet.equipment, sheet.tags.len());
        for parameter in &sheet.parameters {
            println!("  {}", parameter);
        }
        for duplicate in &sheet.duplicate_parameters {
            println!(
                "  ! '{}' defined again at row {}, using row {}",
                duplicate.name, duplicate.dropped_row, duplicate.kept_row
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_populate(
    master: &Path,
    streamtable: &Path,
    mapping: &Path,
    output: Option<PathBuf>,
    layout: Option<&Path>,
    options: ReconcileOptions,
    backup: bool,
    format: OutputFormat,
) -> Result<()> {
    let layout = load_layout(layout)?;
    let mapping = Mapping::load(mapping).with_context(|| format!("loading mapping {}", mapping.display()))?;
    if mapping.is_empty() {
        bail!("no mappings selected, nothing to populate");
    }

    let output = output.unwrap_or_else(|| {
        let name = excel::default_output_name(chrono::Local::now().naive_local());
        master.parent().unwrap_or_else(|| Path::new(".")).join(name)
    });

    if backup && same_file(master, &output) {
        let copy = excel::create_backup(master)?;
        eprintln!("Backed up {} to {}", master.display(), copy.display());
    }

    let summary = populate_files(master, streamtable, &mapping, &output, &layout, options)
        .with_context(|| format!("populating {}", master.display()))?;

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "output": summary.output_path,
                "checksum": summary.checksum,
                "report": summary.report,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            print_report(&summary.report, &layout);
            println!();
            println!("Wrote {} (sha256 {})", summary.output_path.display(), summary.checksum);
        }
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn print_report(report: &PopulateReport, layout: &LayoutConfig) {
    if !report.missing.is_empty() {
        println!("Streamtable missing for: {}", report.missing.join(", "));
    }
    for skip in &report.skipped {
        println!("Skipped {}: {}", skip.equipment, skip.reason.as_str());
    }
    for sheet in &report.sheets {
        print_sheet(sheet, layout.master.unit_col);
    }
    println!(
        "{} value(s) written across {} sheet(s)",
        report.values_written(),
        report.sheets.len()
    );
}

fn print_sheet(sheet: &SheetOutcome, unit_col: u32) {
    println!(
        "{}: {} value(s) written, {} unmatched pair(s)",
        sheet.equipment, sheet.values_written, sheet.unmatched_pairs
    );
    for change in &sheet.unit_changes {
        println!(
            "  unit {} '{}': {} -> {}",
            cell_reference(change.row, unit_col),
            change.parameter,
            change.previous.as_deref().unwrap_or("(empty)"),
            change.unit
        );
    }
    if !sheet.master_only_columns.is_empty() {
        println!(
            "  columns not in streamtable: {}",
            sheet.master_only_columns.join(", ")
        );
    }
    if !sheet.appended_unit_tags.is_empty() {
        println!("  unit tags appended: {}", sheet.appended_unit_tags.join(", "));
    }
    if !sheet.blocked_unit_tags.is_empty() {
        println!(
            "  unit tags not appended, header cell occupied: {}",
            sheet.blocked_unit_tags.join(", ")
        );
    }
    for duplicate in &sheet.duplicate_parameters {
        println!(
            "  parameter '{}' defined again at row {}, using row {}",
            duplicate.name, duplicate.dropped_row, duplicate.kept_row
        );
    }
    for duplicate in &sheet.duplicate_tags {
        println!(
            "  tag '{}' repeated at row {}, using row {}",
            duplicate.name, duplicate.dropped_row, duplicate.kept_row
        );
    }
}
