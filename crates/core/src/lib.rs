//! `newsmerge-core`: merge engine for analyst news sheets.
//!
//! Pure engine crate: receives decoded rows, returns merged entries, tags and
//! search results. No file IO or CLI dependencies.

pub mod config;
pub mod dedup;
pub mod error;
pub mod model;
pub mod normalize;
pub mod search;
pub mod session;
pub mod tags;
pub mod view;

pub use config::{BatchConfig, FieldAliases, LabelRule};
pub use dedup::{deduplicate, identity_key};
pub use error::{DecodeError, DecodeFailure, MergeError, SchemaWarning};
pub use model::{Entry, MergedEntry, RawRow};
pub use search::{search, SearchOptions};
pub use session::{BatchReport, BatchTicket, DecodedFile, FileOutcome, Session};
pub use tags::{EmptyTagPolicy, TagIndex};
pub use view::{Composition, ViewState};
