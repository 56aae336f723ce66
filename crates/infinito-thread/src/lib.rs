//! Generation thread engine.
//!
//! A thread is one root answer plus a flat list of bounded expansions. This
//! crate streams the root answer, splits it for progressive disclosure,
//! appends expansions (persisted in the background), and collapses the whole
//! thread into a single edited record.

pub mod coordinator;
pub mod error;
pub mod expansion;
pub mod pending;
pub mod root_cell;
pub mod session;
pub mod splitter;
pub mod view;

pub use coordinator::{CommitOutcome, EditCoordinator};
pub use error::{Result, ThreadError};
pub use expansion::{
    expansion_prompt, Expansion, ExpansionConfig, ExpansionService, PendingPersist, PersistReport,
};
pub use pending::{PendingWrites, WritePermit};
pub use root_cell::RootCell;
pub use session::{Answer, ThreadSession};
pub use splitter::{
    contains_media_marker, media_markers, paragraphs, sentences, split, topic_from, Disclosure,
    MediaKind, MediaMarker,
};
pub use view::ThreadView;
