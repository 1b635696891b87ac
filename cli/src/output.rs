use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use common::{FieldKind, ScheduleRecord, Snapshot};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Split a line into its timing fields and command for display.
/// Lines that are not schedules (e.g. `MAILTO=...`) go whole into the command.
fn columns(line: &str) -> (String, String) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() >= 5 && ScheduleRecord::decode(line).is_ok() {
        (tokens[..5].join(" "), tokens[5..].join(" "))
    } else {
        ("-".to_string(), line.to_string())
    }
}

pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &Snapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "Schedule", "Command"]);
            for (id, line) in snapshot {
                let (schedule, command) = columns(line);
                table.add_row(vec![id.to_string(), schedule, command]);
            }
            writeln!(out, "{}", table)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record(["id", "line"])?;
            for (id, line) in snapshot {
                wtr.write_record([id.0.as_str(), line.as_str()])?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, snapshot)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn write_record<W: Write>(out: &mut W, record: &ScheduleRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Field", "Values"]);
            for kind in FieldKind::ALL {
                table.add_row(vec![kind.name().to_string(), record.field(kind).to_string()]);
            }
            table.add_row(vec!["command".to_string(), record.command.clone()]);
            writeln!(out, "{}", table)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.serialize(record)?;
            wtr.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, record)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
