// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Publish side: split one parquet file into loadable parts

use anyhow::{Context, Result, bail};
use arrow::datatypes::SchemaRef;
use diagnostics::*;
use loader::config::MAX_PARTS;
use loader::part_file_name;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One written part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPart {
    pub path: PathBuf,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub input_rows: u64,
    pub parts: Vec<WrittenPart>,
}

/// Rows per part: an even share each, the last part taking the remainder.
fn quotas(total_rows: u64, parts: usize) -> Vec<u64> {
    let n = parts as u64;
    let share = total_rows / n;
    (0..n)
        .map(|i| if i + 1 == n { total_rows - share * (n - 1) } else { share })
        .collect()
}

struct PartWriter<'a> {
    out_dir: &'a Path,
    prefix: &'a str,
    schema: SchemaRef,
    props: WriterProperties,
    written: Vec<WrittenPart>,
}

impl PartWriter<'_> {
    fn open(&self, index: usize) -> Result<(PathBuf, ArrowWriter<File>)> {
        let path = self.out_dir.join(part_file_name(self.prefix, index));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create part file: {}", path.display()))?;
        let writer = ArrowWriter::try_new(file, self.schema.clone(), Some(self.props.clone()))?;
        Ok((path, writer))
    }

    fn finish(&mut self, path: PathBuf, writer: ArrowWriter<File>, rows: u64) -> Result<()> {
        _ = writer
            .close()
            .with_context(|| format!("Failed to finish part file: {}", path.display()))?;
        let file = path.display().to_string();
        debug!("Wrote {file} ({rows} rows)");
        self.written.push(WrittenPart { path, rows });
        Ok(())
    }
}

fn parquet_rows(path: &Path) -> Result<u64> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open parquet file: {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?;
    Ok(u64::try_from(builder.metadata().file_metadata().num_rows())?)
}

/// Split `input` into `parts` files named `<prefix><NN>.parquet` in
/// `out_dir`, preserving row order, then check that the parts hold every
/// input row. Parts are zstd-compressed.
pub fn split_parquet(input: &Path, out_dir: &Path, prefix: &str, parts: usize) -> Result<SplitSummary> {
    if parts == 0 || parts > MAX_PARTS {
        bail!("part count must be between 1 and {MAX_PARTS}, got {parts}");
    }
    if prefix.is_empty() || partstore::validate_name(&part_file_name(prefix, 0)).is_err() {
        bail!("invalid part prefix {prefix:?}");
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let file = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet file: {}", input.display()))?;
    let input_rows = u64::try_from(builder.metadata().file_metadata().num_rows())?;
    let quotas = quotas(input_rows, parts);

    let mut parts_out = PartWriter {
        out_dir,
        prefix,
        schema: builder.schema().clone(),
        props: WriterProperties::builder()
            .set_compression(Compression::ZSTD(ZstdLevel::default()))
            .build(),
        written: Vec::with_capacity(parts),
    };

    let mut index = 0;
    let (mut path, mut writer) = parts_out.open(index)?;
    let mut in_part = 0u64;

    for batch in builder.build()? {
        let batch = batch?;
        let mut offset = 0;
        while offset < batch.num_rows() {
            if in_part == quotas[index] && index + 1 < parts {
                parts_out.finish(path, writer, in_part)?;
                index += 1;
                (path, writer) = parts_out.open(index)?;
                in_part = 0;
                continue;
            }
            let room = usize::try_from(quotas[index] - in_part).unwrap_or(usize::MAX);
            let take = room.min(batch.num_rows() - offset);
            if take == 0 {
                bail!("{} holds more rows than its metadata declares", input.display());
            }
            writer.write(&batch.slice(offset, take))?;
            offset += take;
            in_part += take as u64;
        }
    }
    parts_out.finish(path, writer, in_part)?;

    // Trailing parts with nothing left to hold
    for index in index + 1..parts {
        let (path, writer) = parts_out.open(index)?;
        parts_out.finish(path, writer, 0)?;
    }

    let mut written_rows = 0;
    for part in &parts_out.written {
        let rows = parquet_rows(&part.path)?;
        if rows != part.rows {
            bail!("{} holds {rows} rows, expected {}", part.path.display(), part.rows);
        }
        written_rows += rows;
    }
    if written_rows != input_rows {
        bail!("parts hold {written_rows} rows but the input has {input_rows}");
    }

    info!("Split {input_rows} rows into {parts} parts");
    Ok(SplitSummary {
        input_rows,
        parts: parts_out.written,
    })
}

pub fn split_command<W: Write>(
    input: &Path,
    out_dir: &Path,
    prefix: &str,
    parts: usize,
    out: &mut W,
) -> Result<()> {
    let summary = split_parquet(input, out_dir, prefix, parts)?;
    for part in &summary.parts {
        writeln!(out, "{} ({} rows)", part.path.display(), part.rows)?;
    }
    writeln!(
        out,
        "Split {} rows into {} parts",
        summary.input_rows,
        summary.parts.len()
    )?;
    Ok(())
}
