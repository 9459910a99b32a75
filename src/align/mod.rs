pub mod cigar;
pub mod record;

// Re-export commonly used types
pub use cigar::{Cigar, CigarOp};
pub use record::AlignmentRecord;
