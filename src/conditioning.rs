//! Conditioning stream construction.
//!
//! Everything between the raw annotation files and the fused per-frame
//! conditioning tensor:
//!
//! - [`vocab`] — corpus-wide categorical vocabularies (value ↔ index)
//! - [`label`] — HTS-style annotation grammar → typed segment records
//! - [`linguistic`] — duration-driven expansion of segments onto the 5 ms frame grid
//! - [`acoustic`] — binary parameter streams, gap interpolation, voicing flag
//! - [`fuser`] — mode-selected assembly of the final conditioning tensor
//! - [`speaker`] — fixed speaker vectors from the embedding store

pub mod acoustic;
pub mod fuser;
pub mod label;
pub mod linguistic;
pub mod speaker;
pub mod vocab;
