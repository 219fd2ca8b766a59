//! The session event loop.
//!
//! Every mutation of the product store and of the synchronizer happens on the
//! task running [`Session::run`], one event at a time:
//!
//! ```text
//! channel reader ──Notification──┐
//! editor ──SelectionChanged──────┤
//!        ──ManualSync────────────┼──> mpsc ──> Session::process
//! open tasks ──ViewOpened────────┘
//! ```
//!
//! Opening a view is the only asynchronous editor operation. It runs on its
//! own task and reports back with `ViewOpened`, carrying the selection that
//! should be applied once the view exists. Selection events the editor
//! reports for a document before its open finishes are absorbed.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use monto_sync_core::{ProductStore, TextRange};
use monto_sync_types::MontoError;

use crate::channel::Channel;
use crate::config::SessionConfig;
use crate::editor::{Editor, EditorError, ViewHandle, ViewPlacement};
use crate::policy::{Display, DisplayPolicy};
use crate::protocol::{NotificationProtocol, ProtocolError};
use crate::provider::{SharedStore, VirtualDocumentProvider};
use crate::synchronizer::{ApplyOutcome, PendingSelection, SelectionSynchronizer};

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A notification was rejected.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An editor operation failed.
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// The configuration cannot produce a working session.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[source] MontoError),

    /// The session is no longer running.
    #[error("session closed")]
    Closed,
}

/// Events processed by the session, in arrival order.
#[derive(Debug)]
pub enum SessionEvent {
    /// A raw notification body from the analysis process.
    Notification(Vec<u8>),
    /// An attached channel stopped delivering.
    ChannelClosed,
    /// The selections of a view changed.
    SelectionChanged {
        /// Document shown in the view.
        uri: Url,
        /// The view.
        view: ViewHandle,
        /// Its selections after the change.
        selections: Vec<TextRange>,
    },
    /// The user asked to push the source view's selections to product views.
    ManualSync {
        /// Source document.
        uri: Url,
        /// The source view.
        view: ViewHandle,
    },
    /// An open requested by the session finished.
    ViewOpened {
        /// Document that was opened.
        uri: Url,
        /// The new view, or why it could not be opened.
        result: Result<ViewHandle, EditorError>,
        /// Selection to apply now that the view exists.
        pending: Option<PendingSelection>,
    },
    /// A view was closed by the user.
    ViewClosed {
        /// Document that was shown.
        uri: Url,
    },
    /// Stop the loop.
    Shutdown,
}

/// What the loop does after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep processing.
    Continue,
    /// Stop the loop.
    Stop,
}

/// Cloneable handle for posting events to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Post a raw event.
    pub async fn send(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.tx.send(event).await.map_err(|_| SessionError::Closed)
    }

    /// Report new selections of `view`.
    pub async fn selection_changed(
        &self,
        uri: Url,
        view: ViewHandle,
        selections: Vec<TextRange>,
    ) -> Result<(), SessionError> {
        self.send(SessionEvent::SelectionChanged {
            uri,
            view,
            selections,
        })
        .await
    }

    /// Trigger a manual sync from the source view `view`.
    pub async fn manual_sync(&self, uri: Url, view: ViewHandle) -> Result<(), SessionError> {
        self.send(SessionEvent::ManualSync { uri, view }).await
    }

    /// Report that the view of `uri` was closed.
    pub async fn view_closed(&self, uri: Url) -> Result<(), SessionError> {
        self.send(SessionEvent::ViewClosed { uri }).await
    }

    /// Deliver a notification body.
    pub async fn notify(&self, body: Vec<u8>) -> Result<(), SessionError> {
        self.send(SessionEvent::Notification(body)).await
    }

    /// Stop the session.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionEvent::Shutdown).await
    }
}

/// One editing session: a product store and everything driven by it.
pub struct Session<E: Editor> {
    editor: Arc<E>,
    store: SharedStore,
    provider: VirtualDocumentProvider,
    protocol: NotificationProtocol,
    synchronizer: SelectionSynchronizer,
    events: mpsc::Receiver<SessionEvent>,
    handle: SessionHandle,
    pending_opens: usize,
    readers: usize,
}

impl<E: Editor> Session<E> {
    /// Create a session for `editor`.
    pub fn new(
        editor: Arc<E>,
        config: &SessionConfig,
        policy: Arc<dyn DisplayPolicy>,
    ) -> Result<Self, SessionError> {
        let codec = config.codec().map_err(SessionError::InvalidConfig)?;
        let store: SharedStore = Arc::new(Mutex::new(ProductStore::new(codec)));
        let provider = VirtualDocumentProvider::new(
            store.clone(),
            &config.documents.unknown_content,
            config.session.change_capacity,
        );
        let protocol = NotificationProtocol::new(store.clone(), policy);
        let synchronizer = SelectionSynchronizer::new(store.clone(), config);
        let (tx, events) = mpsc::channel(config.session.event_capacity.max(1));

        Ok(Self {
            editor,
            store,
            provider,
            protocol,
            synchronizer,
            events,
            handle: SessionHandle { tx },
            pending_opens: 0,
            readers: 0,
        })
    }

    /// Handle for posting events.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Content provider for product documents.
    pub fn provider(&self) -> &VirtualDocumentProvider {
        &self.provider
    }

    /// The session's product store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The selection synchronizer.
    pub fn synchronizer(&self) -> &SelectionSynchronizer {
        &self.synchronizer
    }

    /// The editor this session drives.
    pub fn editor(&self) -> &Arc<E> {
        &self.editor
    }

    /// Forward every message from `channel` into the session.
    pub fn attach<C>(&mut self, channel: Arc<C>) -> JoinHandle<()>
    where
        C: Channel + ?Sized + 'static,
    {
        self.readers += 1;
        let tx = self.handle.tx.clone();
        tokio::spawn(async move {
            loop {
                match channel.recv().await {
                    Ok(Some(body)) => {
                        if tx.send(SessionEvent::Notification(body)).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("notification stream ended");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "notification channel failed");
                        break;
                    }
                }
            }
            let _ = tx.send(SessionEvent::ChannelClosed).await;
        })
    }

    /// Process events until [`SessionEvent::Shutdown`].
    ///
    /// Per-event errors are logged and do not stop the loop.
    pub async fn run(&mut self) {
        while let Some(event) = self.events.recv().await {
            if self.process_logged(event).await == Flow::Stop {
                break;
            }
        }
        tracing::info!("session stopped");
    }

    /// Process events until nothing is queued, no open is outstanding and
    /// every attached channel has ended.
    ///
    /// Returns `Flow::Stop` if a shutdown was processed.
    pub async fn run_until_idle(&mut self) -> Flow {
        loop {
            let event = if self.pending_opens > 0 || self.readers > 0 {
                self.events.recv().await
            } else {
                self.events.try_recv().ok()
            };
            let Some(event) = event else {
                return Flow::Continue;
            };
            if self.process_logged(event).await == Flow::Stop {
                return Flow::Stop;
            }
        }
    }

    async fn process_logged(&mut self, event: SessionEvent) -> Flow {
        match self.process(event).await {
            Ok(flow) => flow,
            Err(e) => {
                tracing::warn!(error = %e, "event failed");
                Flow::Continue
            }
        }
    }

    /// Process a single event.
    pub async fn process(&mut self, event: SessionEvent) -> Result<Flow, SessionError> {
        match event {
            SessionEvent::Notification(body) => self.on_notification(&body)?,
            SessionEvent::ChannelClosed => {
                self.readers = self.readers.saturating_sub(1);
            }
            SessionEvent::SelectionChanged {
                uri,
                view,
                selections,
            } => {
                let pending = self
                    .synchronizer
                    .on_selection_changed(&uri, view, &selections);
                self.open_all(pending);
            }
            SessionEvent::ManualSync { uri, view } => {
                let selections = self.editor.selections(view)?;
                tracing::debug!(%uri, count = selections.len(), "manual sync");
                let pending = self.synchronizer.manual_sync(&uri, &selections);
                self.open_all(pending);
            }
            SessionEvent::ViewOpened {
                uri,
                result,
                pending,
            } => {
                self.pending_opens = self.pending_opens.saturating_sub(1);
                self.on_view_opened(uri, result, pending)?;
            }
            SessionEvent::ViewClosed { uri } => {
                self.synchronizer.forget_view(&uri);
            }
            SessionEvent::Shutdown => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    fn on_notification(&mut self, body: &[u8]) -> Result<(), SessionError> {
        let Some(published) = self.protocol.receive(body)? else {
            return Ok(());
        };
        tracing::info!(
            uri = %published.target,
            generation = published.generation.value(),
            display = ?published.display,
            "product published"
        );

        self.synchronizer.content_replaced(&published.target);
        let uri = published.target.as_url();
        if published.display == Display::Show
            && !self.synchronizer.is_open(uri)
            && !self.synchronizer.is_opening(uri)
        {
            let placement = self.synchronizer.target_placement();
            self.request_open(uri.clone(), placement, None);
        }
        Ok(())
    }

    fn on_view_opened(
        &mut self,
        uri: Url,
        result: Result<ViewHandle, EditorError>,
        pending: Option<PendingSelection>,
    ) -> Result<(), SessionError> {
        self.synchronizer.open_finished(&uri);
        let view = result?;
        self.synchronizer.register_view(uri, view);

        if let Some(pending) = pending {
            let document = pending.document.clone();
            match self.synchronizer.apply(&*self.editor, view, pending)? {
                ApplyOutcome::Applied => tracing::debug!(uri = %document, "selections applied"),
                ApplyOutcome::Stale => {}
            }
        }
        Ok(())
    }

    fn open_all(&mut self, pending: Vec<PendingSelection>) {
        for p in pending {
            self.request_open(p.document.clone(), p.placement, Some(p));
        }
    }

    fn request_open(&mut self, uri: Url, placement: ViewPlacement, pending: Option<PendingSelection>) {
        self.pending_opens += 1;
        self.synchronizer.expect_open(uri.clone());
        let editor = self.editor.clone();
        let tx = self.handle.tx.clone();
        tokio::spawn(async move {
            let result = editor.open(&uri, placement).await;
            let _ = tx
                .send(SessionEvent::ViewOpened {
                    uri,
                    result,
                    pending,
                })
                .await;
        });
    }
}

impl<E: Editor> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pending_opens", &self.pending_opens)
            .field("readers", &self.readers)
            .finish_non_exhaustive()
    }
}
