//! Entity normalisation.
//!
//! - `GeneRoster`: gene symbols/aliases → canonical symbols, plus mention
//!   finding in free text
//! - `hgvs`: protein-change notations → short one-letter form

pub mod hgvs;
pub mod roster;

pub use hgvs::{canonical_protein_change, same_protein_change};
pub use roster::{GeneMention, GeneRoster};
