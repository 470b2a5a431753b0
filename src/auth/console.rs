//! Terminal stand-in for the host dialog.
//!
//! Prints the authorization URL, tries to open it in a browser, and reads
//! the callback payload (the JSON the redirect page shows) from stdin.

use std::io::BufRead;
use std::thread;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{DialogEvent, DialogHandle, DialogHost};
use crate::config::DialogSize;
use crate::error::Result;

/// Dialog host for command-line use.
#[derive(Debug, Clone)]
pub struct ConsoleDialog {
    open_browser: bool,
}

impl Default for ConsoleDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleDialog {
    pub fn new() -> Self {
        Self { open_browser: true }
    }

    /// Only print the URL; do not launch a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

impl DialogHost for ConsoleDialog {
    fn in_host(&self) -> bool {
        true
    }

    fn open(&self, url: &Url, size: DialogSize) -> Result<DialogHandle> {
        debug!(height = size.height, width = size.width, "Opening console dialog");
        eprintln!("Authorize this application at:\n\n    {}\n", url);
        if self.open_browser {
            if let Err(e) = open::that(url.as_str()) {
                warn!(error = %e, "Could not launch a browser");
            }
        }
        eprintln!("Then paste the JSON shown by the redirect page and press Enter:");

        let (tx, handle) = DialogHandle::channel(|| debug!("Console dialog closed"));
        thread::spawn(move || {
            let mut line = String::new();
            let event = match std::io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => DialogEvent::Closed,
                Ok(_) => DialogEvent::Message(line.trim().to_string()),
            };
            // The receiver may already be gone; nothing to report then.
            let _ = tx.send(event);
        });
        Ok(handle)
    }
}
