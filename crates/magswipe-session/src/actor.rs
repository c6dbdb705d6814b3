//! Serialized access to a [`DeviceSession`].
//!
//! The session is owned by a single task that takes inputs one at a time
//! from three sources:
//!
//! ```text
//! ┌──────────────┐
//! │ Application  │──commands──►┐
//! └──────────────┘             │
//! ┌──────────────┐             ▼
//! │ Reader driver│──────────►┌──────────────┐
//! └──────────────┘           │ SessionActor │──► EventSink
//! ┌──────────────┐           └──────────────┘
//! │ Plug detector│──────────►▲
//! └──────────────┘
//! ```
//!
//! Each command carries a one-shot reply channel. Dropping every
//! [`SessionHandle`] or sending [`shutdown`](SessionHandle::shutdown)
//! deactivates the session and ends the task.

use crate::error::{Result, SessionError};
use crate::session::{DeviceSession, LoggingStatus, SessionStatus};
use magswipe_core::ReaderKind;
use magswipe_hardware::{DriverFactory, NotificationReceiver, PlugEventReceiver};
use magswipe_storage::ProfileStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Request sent to the session task.
#[derive(Debug)]
pub enum SessionCommand {
    Activate {
        reply: oneshot::Sender<Result<()>>,
    },
    Deactivate {
        reply: oneshot::Sender<()>,
    },
    RequestSwipe {
        reply: oneshot::Sender<Result<()>>,
    },
    SetLogging {
        enabled: bool,
        reply: oneshot::Sender<LoggingStatus>,
    },
    SetReaderKind {
        kind: String,
        reply: oneshot::Sender<Result<ReaderKind>>,
    },
    RequestAutoConfig {
        reply: oneshot::Sender<Result<()>>,
    },
    Suspend {
        reply: oneshot::Sender<()>,
    },
    Resume {
        reply: oneshot::Sender<Result<()>>,
    },
    Status {
        reply: oneshot::Sender<SessionStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Task owning a [`DeviceSession`].
pub struct SessionActor<F: DriverFactory, S: ProfileStore> {
    session: DeviceSession<F, S>,
    commands: mpsc::Receiver<SessionCommand>,
    notifications: NotificationReceiver,
    plug_events: PlugEventReceiver,
}

impl<F, S> SessionActor<F, S>
where
    F: DriverFactory + 'static,
    S: ProfileStore + 'static,
{
    /// Move `session` onto a new task.
    ///
    /// `notifications` and `plug_events` must be the receiving ends of the
    /// channels the session's driver factory and plug detector report on.
    pub fn spawn(
        session: DeviceSession<F, S>,
        notifications: NotificationReceiver,
        plug_events: PlugEventReceiver,
        capacity: usize,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(capacity.max(1));

        let actor = Self {
            session,
            commands,
            notifications,
            plug_events,
        };
        let task = tokio::spawn(actor.run());

        (SessionHandle { tx }, task)
    }

    async fn run(mut self) {
        info!("Session task started");

        loop {
            // Inputs already queued are handled before the next command.
            tokio::select! {
                biased;

                Some(envelope) = self.notifications.recv() => {
                    self.session.handle_driver_notification(envelope).await;
                }
                Some(event) = self.plug_events.recv() => {
                    self.session.handle_plug_event(event);
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("All session handles dropped");
                        self.session.deactivate();
                        break;
                    };
                    if !self.handle_command(command) {
                        break;
                    }
                }
            }
        }

        info!("Session task stopped");
    }

    /// Returns `false` once the task should stop. A dropped reply only means
    /// the caller stopped waiting.
    fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Activate { reply } => {
                let _ = reply.send(self.session.activate());
            }
            SessionCommand::Deactivate { reply } => {
                self.session.deactivate();
                let _ = reply.send(());
            }
            SessionCommand::RequestSwipe { reply } => {
                let _ = reply.send(self.session.request_swipe());
            }
            SessionCommand::SetLogging { enabled, reply } => {
                let _ = reply.send(self.session.set_logging(enabled));
            }
            SessionCommand::SetReaderKind { kind, reply } => {
                let _ = reply.send(self.session.set_reader_kind(&kind));
            }
            SessionCommand::RequestAutoConfig { reply } => {
                let _ = reply.send(self.session.request_auto_config());
            }
            SessionCommand::Suspend { reply } => {
                self.session.suspend();
                let _ = reply.send(());
            }
            SessionCommand::Resume { reply } => {
                let _ = reply.send(self.session.resume());
            }
            SessionCommand::Status { reply } => {
                let _ = reply.send(self.session.status());
            }
            SessionCommand::Shutdown { reply } => {
                self.session.deactivate();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }
}

/// Cloneable handle for talking to a running session.
///
/// Every method fails with [`SessionError::SessionClosed`] once the task has
/// ended.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn activate(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Activate { reply }).await?
    }

    pub async fn deactivate(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Deactivate { reply }).await
    }

    pub async fn request_swipe(&self) -> Result<()> {
        self.request(|reply| SessionCommand::RequestSwipe { reply })
            .await?
    }

    pub async fn set_logging(&self, enabled: bool) -> Result<LoggingStatus> {
        self.request(|reply| SessionCommand::SetLogging { enabled, reply })
            .await
    }

    pub async fn set_reader_kind(&self, kind: impl Into<String>) -> Result<ReaderKind> {
        let kind = kind.into();
        self.request(|reply| SessionCommand::SetReaderKind { kind, reply })
            .await?
    }

    pub async fn request_auto_config(&self) -> Result<()> {
        self.request(|reply| SessionCommand::RequestAutoConfig { reply })
            .await?
    }

    pub async fn suspend(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Suspend { reply }).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Resume { reply }).await?
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        self.request(|reply| SessionCommand::Status { reply }).await
    }

    /// Deactivate the session and stop its task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Shutdown { reply }).await
    }

    /// Whether the session task has ended.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }
}
