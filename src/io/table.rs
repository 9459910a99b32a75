/// Junction and normalized table files
///
/// Junction table (tab-separated, one header line):
/// `Gene Type Chrom Start End NTimesSeen NSamplesSeen <sample_1> ... <sample_n>`
///
/// Normalized table appends, after the raw sample counts:
/// `Tag SeenInTranscriptsList <sample_1>_normed ... <sample_n>_normed`
use crate::error::Error;
use crate::junction::{
    AnnotationTag, GeneLabel, JunctionRow, JunctionRows, JunctionTable, NormalizedRow,
    SpliceJunction,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Leading columns shared by every table
pub const FIXED_COLUMNS: [&str; 7] = [
    "Gene",
    "Type",
    "Chrom",
    "Start",
    "End",
    "NTimesSeen",
    "NSamplesSeen",
];

const TAG_COLUMN: &str = "Tag";
const SEEN_COLUMN: &str = "SeenInTranscriptsList";

/// Header line of a junction table, without newline
pub fn junction_header(samples: &[String]) -> String {
    let mut fields: Vec<&str> = FIXED_COLUMNS.to_vec();
    fields.extend(samples.iter().map(String::as_str));
    fields.join("\t")
}

fn fixed_fields(row: &JunctionRow) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        row.label.gene,
        row.label.gene_type,
        row.junction.chrom,
        row.junction.start,
        row.junction.end,
        row.ntimes,
        row.nsamples
    )
}

fn count_fields(row: &JunctionRow) -> String {
    row.counts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("\t")
}

/// Write a junction table (header + rows sorted by junction key)
///
/// Returns the number of junction rows written.
pub fn write_junction_table<W: Write>(writer: &mut W, table: &JunctionTable) -> std::io::Result<usize> {
    let samples = table.samples();
    writeln!(writer, "{}", junction_header(&samples))?;

    let rows = table.rows();
    for row in &rows {
        if samples.is_empty() {
            writeln!(writer, "{}", fixed_fields(row))?;
        } else {
            writeln!(writer, "{}\t{}", fixed_fields(row), count_fields(row))?;
        }
    }

    Ok(rows.len())
}

/// Write a junction table to a file
pub fn write_junction_file(path: &Path, table: &JunctionTable) -> Result<usize, Error> {
    let file = File::create(path).map_err(|e| Error::io(e, path))?;
    let mut writer = BufWriter::new(file);

    let n = write_junction_table(&mut writer, table).map_err(|e| Error::io(e, path))?;
    writer.flush().map_err(|e| Error::io(e, path))?;

    Ok(n)
}

/// Sample ids from a junction table header.
///
/// Fails if the header is shorter than the fixed columns, does not start
/// with `Gene`, or names a sample twice.
pub fn parse_junction_header(path: &Path, header: &str) -> Result<Vec<String>, Error> {
    let fields: Vec<&str> = header.trim_end_matches(['\n', '\r']).split('\t').collect();

    if fields.len() < FIXED_COLUMNS.len() || fields[0].trim() != FIXED_COLUMNS[0] {
        return Err(Error::shape(
            path,
            format!(
                "header must start with the {} columns {}",
                FIXED_COLUMNS.len(),
                FIXED_COLUMNS.join(",")
            ),
        ));
    }

    let samples: Vec<String> = fields[FIXED_COLUMNS.len()..]
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let mut seen = std::collections::HashSet::new();
    for sample in &samples {
        if sample.is_empty() {
            return Err(Error::shape(path, "empty sample column name"));
        }
        if !seen.insert(sample.as_str()) {
            return Err(Error::shape(path, format!("sample '{}' appears twice", sample)));
        }
    }

    Ok(samples)
}

/// Read a junction table file row by row, in file order.
///
/// Rows are not merged: a junction reported under several regions stays
/// one row per region. Every row must carry exactly one count per header
/// sample; any mismatch is a `MissingSampleColumn` error, since misaligned
/// columns would corrupt counts.
pub fn read_junction_rows(path: &Path) -> Result<JunctionRows, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| Error::io(e, path))?,
        None => return Err(Error::shape(path, "file is empty, header missing")),
    };
    let samples = parse_junction_header(path, &header)?;
    let n_fields = FIXED_COLUMNS.len() + samples.len();

    let mut rows = JunctionRows::new(samples);

    for (idx, line) in lines.enumerate() {
        let line = line.map_err(|e| Error::io(e, path))?;
        let line_num = idx + 2;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() != n_fields {
            return Err(Error::shape(
                path,
                format!(
                    "line {} has {} fields, header defines {}",
                    line_num,
                    fields.len(),
                    n_fields
                ),
            ));
        }

        let number = |idx: usize| {
            fields[idx].trim().parse::<u64>().map_err(|e| {
                Error::shape(
                    path,
                    format!("line {} column {}: '{}': {}", line_num, idx + 1, fields[idx], e),
                )
            })
        };

        let counts = (FIXED_COLUMNS.len()..n_fields)
            .map(&number)
            .collect::<Result<Vec<u64>, Error>>()?;

        rows.rows.push(JunctionRow {
            junction: SpliceJunction::new(fields[2].trim(), number(3)?, number(4)?),
            label: GeneLabel::new(fields[0].trim(), fields[1].trim()),
            ntimes: number(5)?,
            nsamples: number(6)? as usize,
            counts,
        });
    }

    Ok(rows)
}

/// Read a junction table and fold its rows into a `JunctionTable`.
///
/// Rows sharing a junction are summed per sample, as in re-aggregation.
pub fn read_junction_table(path: &Path) -> Result<JunctionTable, Error> {
    let rows = read_junction_rows(path)?;
    let mut table = JunctionTable::with_samples(rows.samples.iter().cloned());

    for row in &rows.rows {
        for (sample, &count) in rows.samples.iter().zip(&row.counts) {
            table.add_count(row.junction.clone(), &row.label, sample, count);
        }
    }

    Ok(table)
}

/// Header line of a normalized table, without newline
pub fn normalized_header(samples: &[String]) -> String {
    let mut fields: Vec<String> = FIXED_COLUMNS.iter().map(|s| s.to_string()).collect();
    fields.extend(samples.iter().cloned());
    fields.push(TAG_COLUMN.to_string());
    fields.push(SEEN_COLUMN.to_string());
    fields.extend(samples.iter().map(|s| format!("{}_normed", s)));
    fields.join("\t")
}

/// Write normalized rows; "Neither annotated" rows get empty normalized cells
pub fn write_normalized_table<W: Write>(
    writer: &mut W,
    samples: &[String],
    rows: &[NormalizedRow],
) -> std::io::Result<()> {
    writeln!(writer, "{}", normalized_header(samples))?;

    for row in rows {
        let mut fields = vec![fixed_fields(&row.row)];
        fields.extend(row.row.counts.iter().map(|c| c.to_string()));
        fields.push(row.tag.to_string());
        fields.push(if row.seen_before { "1" } else { "0" }.to_string());

        if row.tag == AnnotationTag::Neither {
            fields.extend(samples.iter().map(|_| String::new()));
        } else {
            fields.extend(row.values.iter().map(|v| v.to_string()));
        }

        writeln!(writer, "{}", fields.join("\t"))?;
    }

    Ok(())
}

/// Write normalized rows to a file
pub fn write_normalized_file(
    path: &Path,
    samples: &[String],
    rows: &[NormalizedRow],
) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| Error::io(e, path))?;
    let mut writer = BufWriter::new(file);

    write_normalized_table(&mut writer, samples, rows).map_err(|e| Error::io(e, path))?;
    writer.flush().map_err(|e| Error::io(e, path))
}

/// One line of a normalized table, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine {
    pub line: String,
    pub tag: AnnotationTag,
    pub seen_before: bool,
}

/// A normalized table read back for filtering
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub header: String,
    pub rows: Vec<NormalizedLine>,
}

/// Read a normalized table, locating `Tag` and `SeenInTranscriptsList` by name
pub fn read_normalized_table(path: &Path) -> Result<NormalizedTable, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| Error::io(e, path))?,
        None => return Err(Error::shape(path, "file is empty, header missing")),
    };

    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let find = |name: &str| {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| Error::shape(path, format!("no '{}' column in header", name)))
    };
    let tag_col = find(TAG_COLUMN)?;
    let seen_col = find(SEEN_COLUMN)?;

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        let line = line.map_err(|e| Error::io(e, path))?;
        let line_num = idx + 2;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let field = |col: usize| {
            fields.get(col).map(|f| f.trim()).ok_or_else(|| {
                Error::shape(path, format!("line {} has only {} fields", line_num, fields.len()))
            })
        };

        let tag = field(tag_col)?
            .parse::<AnnotationTag>()
            .map_err(|e| Error::shape(path, format!("line {}: {}", line_num, e)))?;
        let seen_before = match field(seen_col)? {
            "1" => true,
            "0" => false,
            other => {
                return Err(Error::shape(
                    path,
                    format!("line {}: {} must be 0 or 1, got '{}'", line_num, SEEN_COLUMN, other),
                ));
            }
        };

        rows.push(NormalizedLine {
            line: line.trim_end_matches('\r').to_string(),
            tag,
            seen_before,
        });
    }

    Ok(NormalizedTable { header, rows })
}
