//! Host dialog abstraction.
//!
//! The authorization page runs in a modal dialog owned by the host
//! application. The host reports back through a channel that resolves at
//! most once: either with a callback message or with the dialog closing.

use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;
use url::Url;

use crate::config::DialogSize;
use crate::error::{PublishError, Result};

/// Something the dialog reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    /// The page inside the dialog posted a message.
    Message(String),
    /// The dialog was closed without a message.
    Closed,
}

/// An open dialog awaiting its callback.
pub struct DialogHandle {
    events: Receiver<DialogEvent>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl DialogHandle {
    /// Wrap the receiving end of a dialog channel. `on_close` runs once when
    /// the handle closes the dialog.
    pub fn new(events: Receiver<DialogEvent>, on_close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            events,
            on_close: Some(Box::new(on_close)),
        }
    }

    /// Create a connected sender/handle pair.
    pub fn channel(on_close: impl FnOnce() + Send + 'static) -> (Sender<DialogEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx, on_close))
    }

    /// Wait for the first event and close the dialog before returning.
    ///
    /// A dropped sender counts as the dialog being closed.
    pub fn receive(mut self) -> Result<String> {
        let event = self.events.recv();
        self.close();
        match event {
            Ok(DialogEvent::Message(message)) => Ok(message),
            Ok(DialogEvent::Closed) | Err(_) => Err(PublishError::DialogClosed),
        }
    }

    fn close(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            debug!("Closing authorization dialog");
            on_close();
        }
    }
}

impl Drop for DialogHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// The application hosting the authorization dialog.
pub trait DialogHost {
    /// Whether we are running inside the host. Login is refused otherwise.
    fn in_host(&self) -> bool;

    /// Open a modal dialog at `url`.
    fn open(&self, url: &Url, size: DialogSize) -> Result<DialogHandle>;
}

impl<H: DialogHost + ?Sized> DialogHost for &H {
    fn in_host(&self) -> bool {
        (**self).in_host()
    }

    fn open(&self, url: &Url, size: DialogSize) -> Result<DialogHandle> {
        (**self).open(url, size)
    }
}

impl<H: DialogHost + ?Sized> DialogHost for Box<H> {
    fn in_host(&self) -> bool {
        (**self).in_host()
    }

    fn open(&self, url: &Url, size: DialogSize) -> Result<DialogHandle> {
        (**self).open(url, size)
    }
}
