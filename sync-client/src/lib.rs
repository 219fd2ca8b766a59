//! # sync-client
//!
//! Editor-side client for Monto: shows the products published by an
//! analysis process and keeps selections in sync between a source document
//! and its product documents.
//!
//! ## Features
//!
//! - **Virtual documents**: Products are served read-only under their own scheme
//! - **Bidirectional sync**: Source selections map forward, product selections map backward
//! - **Echo suppression**: Views refreshed by a publish do not bounce selections
//! - **Collaborator traits**: Pluggable editor and notification channel (framed, mock)
//! - **Pure State Machine**: Uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sync_client::{FramedChannel, Session, SessionConfig, ShowAll};
//!
//! let config = SessionConfig::default();
//! let mut session = Session::new(Arc::new(editor), &config, Arc::new(ShowAll))?;
//!
//! // Read notifications from the analysis process
//! session.attach(Arc::new(FramedChannel::new(child_stdout)));
//!
//! // The editor integration posts selection events through the handle
//! let handle = session.handle();
//! session.run().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod editor;
pub mod policy;
pub mod protocol;
pub mod provider;
pub mod session;
pub mod synchronizer;

pub use channel::{
    encode_frame, Channel, ChannelError, FramedChannel, MockChannel, MAX_MESSAGE_SIZE,
};
pub use config::{ConfigError, SessionConfig};
pub use editor::{
    AppliedSelection, Editor, EditorError, MockEditor, Reveal, ViewHandle, ViewPlacement,
};
pub use policy::{Display, DisplayPolicy, ShowAll, ShowNone};
pub use protocol::{NotificationProtocol, ProtocolError, Published};
pub use provider::{lock_store, ContentChange, SharedStore, VirtualDocumentProvider};
pub use session::{Flow, Session, SessionError, SessionEvent, SessionHandle};
pub use synchronizer::{ApplyOutcome, PendingSelection, SelectionSynchronizer};
