/// CIGAR operation runs parsed from the SAM CIGAR column
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// CIGAR operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    /// M: match/mismatch (default mode)
    Match(u32),
    /// =: exact match (optional)
    Equal(u32),
    /// X: mismatch (optional)
    Diff(u32),
    /// I: insertion to reference
    Ins(u32),
    /// D: deletion from reference
    Del(u32),
    /// N: splice junction (skipped reference region)
    RefSkip(u32),
    /// S: soft clip (clipped sequence present in read)
    SoftClip(u32),
    /// H: hard clip (clipped sequence not present)
    HardClip(u32),
    /// P: padding (silent deletion from padded reference)
    Pad(u32),
}

impl CigarOp {
    /// Build an operation from its length and SAM operation character
    pub fn from_parts(len: u32, op: char) -> Option<Self> {
        let op = match op {
            'M' => CigarOp::Match(len),
            '=' => CigarOp::Equal(len),
            'X' => CigarOp::Diff(len),
            'I' => CigarOp::Ins(len),
            'D' => CigarOp::Del(len),
            'N' => CigarOp::RefSkip(len),
            'S' => CigarOp::SoftClip(len),
            'H' => CigarOp::HardClip(len),
            'P' => CigarOp::Pad(len),
            _ => return None,
        };
        Some(op)
    }

    /// Get the operation character
    pub fn op_char(&self) -> char {
        match self {
            CigarOp::Match(_) => 'M',
            CigarOp::Equal(_) => '=',
            CigarOp::Diff(_) => 'X',
            CigarOp::Ins(_) => 'I',
            CigarOp::Del(_) => 'D',
            CigarOp::RefSkip(_) => 'N',
            CigarOp::SoftClip(_) => 'S',
            CigarOp::HardClip(_) => 'H',
            CigarOp::Pad(_) => 'P',
        }
    }

    /// Get the operation length
    pub fn len(&self) -> u32 {
        match self {
            CigarOp::Match(n)
            | CigarOp::Equal(n)
            | CigarOp::Diff(n)
            | CigarOp::Ins(n)
            | CigarOp::Del(n)
            | CigarOp::RefSkip(n)
            | CigarOp::SoftClip(n)
            | CigarOp::HardClip(n)
            | CigarOp::Pad(n) => *n,
        }
    }

    /// Check if operation is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if operation consumes query bases
    pub fn consumes_query(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_)
                | CigarOp::Equal(_)
                | CigarOp::Diff(_)
                | CigarOp::Ins(_)
                | CigarOp::SoftClip(_)
        )
    }

    /// Check if operation consumes reference bases
    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarOp::Match(_)
                | CigarOp::Equal(_)
                | CigarOp::Diff(_)
                | CigarOp::Del(_)
                | CigarOp::RefSkip(_)
        )
    }

    /// Check if operation moves the aligned reference position forward
    /// without being an intron (M, =, X, D).
    ///
    /// These are the only runs that shift where a following intron begins.
    pub fn shifts_intron_start(&self) -> bool {
        self.consumes_reference() && !self.is_ref_skip()
    }

    /// Check if operation is an intron skip (N)
    pub fn is_ref_skip(&self) -> bool {
        matches!(self, CigarOp::RefSkip(_))
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len(), self.op_char())
    }
}

/// An ordered, non-empty sequence of CIGAR operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cigar(Vec<CigarOp>);

impl Cigar {
    pub fn ops(&self) -> &[CigarOp] {
        &self.0
    }

    /// Number of intron skip (N) runs
    pub fn n_skips(&self) -> usize {
        self.0.iter().filter(|op| op.is_ref_skip()).count()
    }

    pub fn has_skip(&self) -> bool {
        self.0.iter().any(CigarOp::is_ref_skip)
    }

    /// Calculate reference length from CIGAR
    pub fn reference_length(&self) -> u64 {
        self.0
            .iter()
            .filter(|op| op.consumes_reference())
            .map(|op| op.len() as u64)
            .sum()
    }

    /// Calculate read length from CIGAR
    pub fn read_length(&self) -> u64 {
        self.0
            .iter()
            .filter(|op| op.consumes_query())
            .map(|op| op.len() as u64)
            .sum()
    }
}

impl FromStr for Cigar {
    type Err = Error;

    /// Parse `<len><op>` tokens, e.g. `13M221400N34M2658N29M`.
    ///
    /// Lengths must be positive; an empty string, a missing length, a
    /// trailing length without an operation or an unknown operation
    /// character is a `MalformedEncoding` error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::encoding(s, "empty CIGAR"));
        }

        let mut ops = Vec::new();
        let mut len: Option<u32> = None;

        for c in s.chars() {
            if let Some(digit) = c.to_digit(10) {
                let current = len.unwrap_or(0);
                let next = current
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(|| Error::encoding(s, "operation length overflows u32"))?;
                len = Some(next);
                continue;
            }

            let n = len
                .take()
                .ok_or_else(|| Error::encoding(s, format!("operation '{c}' has no length")))?;
            if n == 0 {
                return Err(Error::encoding(s, format!("operation '{c}' has zero length")));
            }

            let op = CigarOp::from_parts(n, c)
                .ok_or_else(|| Error::encoding(s, format!("unknown operation '{c}'")))?;
            ops.push(op);
        }

        if len.is_some() {
            return Err(Error::encoding(s, "trailing length without an operation"));
        }

        Ok(Cigar(ops))
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.0 {
            write!(f, "{op}")?;
        }
        Ok(())
    }
}
