/// Alignment records as handed over by the retrieval collaborator
use crate::align::cigar::Cigar;
use crate::error::Error;

/// SAM column holding the reference sequence name (0-based)
pub const SAM_CHROM_COL_INDEX: usize = 2;
/// SAM column holding the 1-based leftmost mapping position
pub const SAM_POS_COL_INDEX: usize = 3;
/// SAM column holding the CIGAR string
pub const SAM_CIGAR_COL_INDEX: usize = 5;

/// One aligned read: where it starts and how it walks the reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub chrom: String,
    /// 1-based leftmost reference base consumed
    pub position: u64,
    pub cigar: Cigar,
}

impl AlignmentRecord {
    /// Parse a tab-delimited SAM body line.
    ///
    /// Missing columns or a non-numeric position give `MalformedRecord`;
    /// an unparseable CIGAR gives `MalformedEncoding`.
    pub fn from_sam_line(line: &str) -> Result<Self, Error> {
        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() <= SAM_CIGAR_COL_INDEX {
            return Err(Error::MalformedRecord(format!(
                "record has {} fields, expected at least {}",
                fields.len(),
                SAM_CIGAR_COL_INDEX + 1
            )));
        }

        let position = fields[SAM_POS_COL_INDEX].trim().parse::<u64>().map_err(|e| {
            Error::MalformedRecord(format!(
                "invalid position '{}': {}",
                fields[SAM_POS_COL_INDEX], e
            ))
        })?;
        let cigar = fields[SAM_CIGAR_COL_INDEX].trim().parse::<Cigar>()?;

        Ok(Self {
            chrom: fields[SAM_CHROM_COL_INDEX].to_string(),
            position,
            cigar,
        })
    }
}
