use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::model::Snapshot;

/// Output format of the final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Serialize)]
struct JsonChannel<'a> {
    source: String,
    x: &'a [String],
    y: &'a [String],
    cursor: u64,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    source: &'a str,
    x: &'a str,
    y: &'a str,
}

/// Write every snapshot to `out` in the requested format.
pub fn write_report<W: Write>(format: ReportFormat, snapshots: &[Snapshot], mut out: W) -> Result<()> {
    match format {
        ReportFormat::Text => {
            for snap in snapshots {
                writeln!(out, "{} ({} samples)", snap.source.display(), snap.len())?;
                for (x, y) in snap.x_values.iter().zip(&snap.y_values) {
                    writeln!(out, "{x}\t{y}")?;
                }
            }
        }
        ReportFormat::Json => {
            let channels: Vec<JsonChannel> = snapshots
                .iter()
                .map(|snap| JsonChannel {
                    source: snap.source.display().to_string(),
                    x: &snap.x_values,
                    y: &snap.y_values,
                    cursor: snap.cursor,
                })
                .collect();
            serde_json::to_writer_pretty(&mut out, &channels).context("writing JSON report")?;
            writeln!(out)?;
        }
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut out);
            for snap in snapshots {
                let source = snap.source.display().to_string();
                for (x, y) in snap.x_values.iter().zip(&snap.y_values) {
                    writer
                        .serialize(CsvRow { source: &source, x, y })
                        .context("writing CSV row")?;
                }
            }
            writer.flush().context("flushing CSV report")?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, SampleSeries};

    fn snapshot(name: &str, pairs: &[(&str, &str)]) -> Snapshot {
        let mut series = SampleSeries::new(name);
        let records = pairs
            .iter()
            .map(|(x, y)| Record {
                x: x.to_string(),
                y: y.to_string(),
            })
            .collect();
        series.commit(0, records, 8);
        series.snapshot()
    }

    fn render(format: ReportFormat, snaps: &[Snapshot]) -> String {
        let mut buf = Vec::new();
        write_report(format, snaps, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_lists_each_channel() {
        let snaps = [snapshot("a.txt", &[("1", "5"), ("2", "6")]), snapshot("b.txt", &[])];
        assert_eq!(
            render(ReportFormat::Text, &snaps),
            "a.txt (2 samples)\n1\t5\n2\t6\nb.txt (0 samples)\n"
        );
    }

    #[test]
    fn json_keeps_fields_as_strings() {
        let out = render(ReportFormat::Json, &[snapshot("a.txt", &[("1", "5")])]);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["source"], "a.txt");
        assert_eq!(value[0]["x"][0], "1");
        assert_eq!(value[0]["y"][0], "5");
        assert_eq!(value[0]["cursor"], 8);
    }

    #[test]
    fn csv_has_one_row_per_sample() {
        let snaps = [snapshot("a.txt", &[("1", "5")]), snapshot("b.txt", &[("3", "7")])];
        assert_eq!(
            render(ReportFormat::Csv, &snaps),
            "source,x,y\na.txt,1,5\nb.txt,3,7\n"
        );
    }
}
