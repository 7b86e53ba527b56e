//! Registry of in-flight transfers and their dedicated connections.
//!
//! Every negotiated transfer is keyed by its server-issued reference
//! number. Events from the transfer connections mutate the matching
//! [`TransferInfo`]; terminal events always discard the connection
//! handle. The server banner travels through its own slot and never
//! appears in the general transfer list.

use std::path::PathBuf;

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use hotwire_net::transfer::{TransferEvent, TransferLink};
use hotwire_shared::types::TransferInfo;

/// Completion channel for a finished transfer, matching its kind.
#[derive(Debug)]
pub enum TransferCompletion {
    /// Resolves with the stored-file location of a finished download.
    Download(oneshot::Sender<(TransferInfo, PathBuf)>),
    /// Resolves with the in-memory payload of a finished preview.
    Preview(oneshot::Sender<(TransferInfo, Bytes)>),
}

/// Banner activity the controller must act on after an event.
#[derive(Debug)]
pub enum BannerUpdate {
    Data(Bytes),
    Failed(String),
}

#[derive(Debug)]
struct TransferEntry {
    info: TransferInfo,
    /// Whether this entry shows up in the observable transfer list.
    /// Unlisted previews still route events and fire their completion.
    listed: bool,
    link: Option<TransferLink>,
    completion: Option<TransferCompletion>,
}

#[derive(Debug, Default)]
pub struct TransferRegistry {
    entries: Vec<TransferEntry>,
    banner: Option<TransferLink>,
}

impl TransferRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            banner: None,
        }
    }

    /// Track a freshly negotiated transfer. At most one entry may exist
    /// per reference number; a stale duplicate is cancelled first.
    pub fn register(
        &mut self,
        info: TransferInfo,
        listed: bool,
        completion: Option<TransferCompletion>,
        link: TransferLink,
    ) {
        if self.entry_index(info.reference).is_some() {
            warn!(reference = info.reference, "Duplicate transfer reference, replacing");
            self.cancel(info.reference, true);
        }
        self.entries.push(TransferEntry {
            info,
            listed,
            link: Some(link),
            completion,
        });
    }

    /// Install the banner connection, replacing any previous one.
    pub fn set_banner(&mut self, link: TransferLink) {
        self.cancel_banner();
        self.banner = Some(link);
    }

    pub fn banner_reference(&self) -> Option<u32> {
        self.banner.as_ref().map(|b| b.reference())
    }

    /// Cancel and clear the banner connection, if any.
    pub fn cancel_banner(&mut self) {
        if let Some(banner) = self.banner.take() {
            banner.cancel(false);
        }
    }

    /// Transfers visible to the presentation layer, in registration order.
    pub fn visible(&self) -> impl Iterator<Item = &TransferInfo> {
        self.entries.iter().filter(|e| e.listed).map(|e| &e.info)
    }

    pub fn get(&self, reference: u32) -> Option<&TransferInfo> {
        self.entry_index(reference)
            .map(|i| &self.entries[i].info)
    }

    /// True when no transfer of any kind (banner included) remains.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.banner.is_none()
    }

    /// Apply one transfer-connection event.
    ///
    /// Events for the banner reference are folded into a [`BannerUpdate`]
    /// for the controller; everything else mutates the matching entry.
    /// Events for unknown references (e.g. raced with a cancel) are
    /// dropped.
    pub fn handle_event(&mut self, reference: u32, event: TransferEvent) -> Option<BannerUpdate> {
        if self.banner_reference() == Some(reference) {
            return self.handle_banner_event(event);
        }

        let Some(index) = self.entry_index(reference) else {
            debug!(reference, "Event for unknown transfer reference, dropping");
            return None;
        };

        match event {
            TransferEvent::Connecting | TransferEvent::Connected => {}
            TransferEvent::Progress {
                fraction,
                time_remaining,
            } => {
                let info = &mut self.entries[index].info;
                info.progress = fraction;
                info.time_remaining = time_remaining;
            }
            TransferEvent::Metadata { name } => {
                self.entries[index].info.title = name;
            }
            TransferEvent::Failed(reason) => {
                warn!(reference, reason = %reason, "Transfer failed");
                let entry = &mut self.entries[index];
                entry.info.failed = true;
                entry.info.time_remaining = std::time::Duration::ZERO;
                // The connection is gone; the info stays observable
                // until the caller prunes it.
                entry.link = None;
                entry.completion = None;
            }
            TransferEvent::CompletedData(data) => {
                let mut entry = self.entries.remove(index);
                entry.info.completed = true;
                entry.info.progress = 1.0;
                entry.info.time_remaining = std::time::Duration::ZERO;
                match entry.completion.take() {
                    Some(TransferCompletion::Preview(tx)) => {
                        let _ = tx.send((entry.info, data));
                    }
                    Some(TransferCompletion::Download(_)) => {
                        warn!(reference, "In-memory payload for a to-storage transfer");
                    }
                    None => {}
                }
            }
            TransferEvent::CompletedFile(path) => {
                let mut entry = self.entries.remove(index);
                entry.info.completed = true;
                entry.info.progress = 1.0;
                entry.info.time_remaining = std::time::Duration::ZERO;
                entry.info.file_path = Some(path.clone());
                match entry.completion.take() {
                    Some(TransferCompletion::Download(tx)) => {
                        let _ = tx.send((entry.info, path));
                    }
                    Some(TransferCompletion::Preview(_)) => {
                        warn!(reference, "Stored file for an in-memory transfer");
                    }
                    None => {}
                }
            }
        }
        None
    }

    fn handle_banner_event(&mut self, event: TransferEvent) -> Option<BannerUpdate> {
        match event {
            TransferEvent::CompletedData(data) => {
                // The connection finished on its own; just discard it.
                self.banner = None;
                Some(BannerUpdate::Data(data))
            }
            TransferEvent::Failed(reason) => {
                self.banner = None;
                Some(BannerUpdate::Failed(reason))
            }
            TransferEvent::CompletedFile(path) => {
                warn!(path = %path.display(), "Banner transfer completed to storage, ignoring");
                self.banner = None;
                None
            }
            _ => None,
        }
    }

    /// Remove and cancel one transfer (or the banner). Returns whether
    /// anything matched. After this returns, no further event for the
    /// reference will be observed.
    pub fn cancel(&mut self, reference: u32, delete_partial: bool) -> bool {
        if self.banner_reference() == Some(reference) {
            self.cancel_banner();
            return true;
        }

        let Some(index) = self.entry_index(reference) else {
            return false;
        };
        let entry = self.entries.remove(index);
        if let Some(link) = entry.link {
            link.cancel(delete_partial);
        }
        true
    }

    /// Cancel everything, banner included. Used only by session reset.
    pub fn cancel_all(&mut self) {
        for entry in self.entries.drain(..) {
            if let Some(link) = entry.link {
                link.cancel(true);
            }
        }
        self.cancel_banner();
    }

    fn entry_index(&self, reference: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.info.reference == reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    use hotwire_net::transfer::TransferCommand;

    fn link(reference: u32) -> (TransferLink, mpsc::UnboundedReceiver<TransferCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TransferLink::new(reference, tx), rx)
    }

    fn registry_with(reference: u32) -> (TransferRegistry, mpsc::UnboundedReceiver<TransferCommand>) {
        let mut registry = TransferRegistry::new();
        let (l, rx) = link(reference);
        registry.register(TransferInfo::new(reference, "file.bin", 100), true, None, l);
        (registry, rx)
    }

    #[test]
    fn progress_updates_the_info() {
        let (mut registry, _rx) = registry_with(1);
        registry.handle_event(
            1,
            TransferEvent::Progress {
                fraction: 0.5,
                time_remaining: Duration::from_secs(10),
            },
        );
        let info = registry.get(1).unwrap();
        assert_eq!(info.progress, 0.5);
        assert_eq!(info.time_remaining, Duration::from_secs(10));
    }

    #[test]
    fn metadata_retitles_without_touching_lifecycle() {
        let (mut registry, _rx) = registry_with(1);
        registry.handle_event(
            1,
            TransferEvent::Progress {
                fraction: 0.25,
                time_remaining: Duration::from_secs(3),
            },
        );
        registry.handle_event(1, TransferEvent::Metadata { name: "Real Name.sit".into() });

        let info = registry.get(1).unwrap();
        assert_eq!(info.title, "Real Name.sit");
        assert_eq!(info.progress, 0.25);
        assert!(!info.failed);
        assert!(!info.completed);
    }

    #[test]
    fn failure_keeps_the_info_but_drops_the_link() {
        let (mut registry, _rx) = registry_with(1);
        registry.handle_event(1, TransferEvent::Failed("connection reset".into()));

        let info = registry.get(1).unwrap();
        assert!(info.failed);
        assert_eq!(info.time_remaining, Duration::ZERO);
    }

    #[tokio::test]
    async fn preview_completion_delivers_data_and_removes_the_info() {
        let mut registry = TransferRegistry::new();
        let (l, _rx) = link(7);
        let (tx, done) = oneshot::channel();
        registry.register(
            TransferInfo::new(7, "pic.png", 4),
            true,
            Some(TransferCompletion::Preview(tx)),
            l,
        );

        registry.handle_event(7, TransferEvent::CompletedData(Bytes::from_static(b"data")));
        let (info, data) = done.await.unwrap();
        assert!(info.completed);
        assert_eq!(data, Bytes::from_static(b"data"));
        assert!(registry.get(7).is_none());
    }

    #[tokio::test]
    async fn download_completion_delivers_the_location() {
        let mut registry = TransferRegistry::new();
        let (l, _rx) = link(8);
        let (tx, done) = oneshot::channel();
        registry.register(
            TransferInfo::new(8, "report.txt", 9),
            true,
            Some(TransferCompletion::Download(tx)),
            l,
        );

        registry.handle_event(8, TransferEvent::CompletedFile(PathBuf::from("/tmp/report.txt")));
        let (info, path) = done.await.unwrap();
        assert_eq!(info.file_path.as_deref(), Some(path.as_path()));
        assert!(registry.get(8).is_none());
    }

    #[tokio::test]
    async fn cancel_removes_the_info_and_signals_the_connection() {
        let (mut registry, mut rx) = registry_with(1);

        assert!(registry.cancel(1, true));
        assert!(registry.get(1).is_none());
        assert!(matches!(
            rx.recv().await,
            Some(TransferCommand::Cancel { delete_partial: true })
        ));

        // Late events for the cancelled reference are dropped.
        registry.handle_event(
            1,
            TransferEvent::Progress {
                fraction: 0.9,
                time_remaining: Duration::ZERO,
            },
        );
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn banner_events_never_touch_the_transfer_list() {
        let mut registry = TransferRegistry::new();
        let (l, _rx) = link(99);
        registry.set_banner(l);

        let update = registry.handle_event(99, TransferEvent::CompletedData(Bytes::from_static(b"img")));
        assert!(matches!(update, Some(BannerUpdate::Data(_))));
        assert!(registry.banner_reference().is_none());
        assert_eq!(registry.visible().count(), 0);
    }

    #[tokio::test]
    async fn cancel_all_empties_the_registry() {
        let mut registry = TransferRegistry::new();
        let (l1, mut rx1) = link(1);
        let (l2, _rx2) = link(2);
        let (banner, _rxb) = link(3);
        registry.register(TransferInfo::new(1, "a", 1), true, None, l1);
        registry.register(TransferInfo::new(2, "b", 2), false, None, l2);
        registry.set_banner(banner);

        registry.cancel_all();
        assert!(registry.is_empty());
        assert!(matches!(
            rx1.recv().await,
            Some(TransferCommand::Cancel { delete_partial: true })
        ));
    }

    #[test]
    fn unlisted_transfers_stay_out_of_the_visible_list() {
        let mut registry = TransferRegistry::new();
        let (l, _rx) = link(5);
        registry.register(TransferInfo::new(5, "peek.png", 10), false, None, l);
        assert_eq!(registry.visible().count(), 0);
        assert!(registry.get(5).is_some());
    }
}
