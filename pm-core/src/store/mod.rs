//! Mapping store: the persisted label-to-device file

mod codec;
mod entry;
mod persistence;

pub use codec::{decode, encode, encode_entry, label_is_encodable, DecodedMapping};
pub use entry::MappingEntry;
pub use persistence::{write_atomic, MappingStore};
