//! Session controller.
//!
//! [`Session`] owns the control-connection handle and all
//! session-scoped state: roster, chat log, message board, file and news
//! trees, the transfer registry, and the cached banner image. Single
//! ownership of `&mut Session` is the serialization context: awaited
//! exchanges resolve through per-request completion channels answered
//! by the link task, while pushes and transfer events queue up on the
//! session event channel until the owner pumps them through
//! [`Session::handle_event`].

use std::path::PathBuf;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use hotwire_net::control::{ControlEvent, ControlHandle};
use hotwire_net::events::SessionEvent;
use hotwire_net::tracker::TrackerHandle;
use hotwire_net::transfer::{TransferConnector, TransferMode};
use hotwire_shared::constants::{DEFAULT_ICON_ID, TRANSFER_PORT_OFFSET};
use hotwire_shared::protocol::DownloadReply;
use hotwire_shared::types::{
    AccessFlags, ChatMessage, ChatMessageKind, ConnectionStatus, FileEntry, NewsEntry, NewsKind,
    Server, TransferInfo, User, UserOptions,
};

use crate::roster::{RosterNotice, UserRoster};
use crate::transfers::{BannerUpdate, TransferCompletion, TransferRegistry};
use crate::tree::ListingTree;

pub struct Session<C: TransferConnector> {
    control: ControlHandle,
    tracker: TrackerHandle,
    connector: C,
    /// Cloned into every transfer connection so their events land on
    /// the same queue as control pushes.
    event_tx: mpsc::Sender<SessionEvent>,

    status: ConnectionStatus,
    server: Option<Server>,
    server_name: Option<String>,
    server_version: Option<u16>,
    username: String,
    icon_id: u16,
    access: Option<AccessFlags>,
    agreed: bool,

    roster: UserRoster,
    chat: Vec<ChatMessage>,
    message_board: Vec<String>,
    message_board_loaded: bool,
    files: ListingTree<FileEntry>,
    news: ListingTree<NewsEntry>,
    transfers: TransferRegistry,
    banner_image: Option<image::DynamicImage>,
    last_server_error: Option<String>,
}

impl<C: TransferConnector> Session<C> {
    pub fn new(
        control: ControlHandle,
        tracker: TrackerHandle,
        connector: C,
        event_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            control,
            tracker,
            connector,
            event_tx,
            status: ConnectionStatus::Disconnected,
            server: None,
            server_name: None,
            server_version: None,
            username: "guest".to_string(),
            icon_id: DEFAULT_ICON_ID,
            access: None,
            agreed: false,
            roster: UserRoster::new(),
            chat: Vec::new(),
            message_board: Vec::new(),
            message_board_loaded: false,
            files: ListingTree::new(),
            news: ListingTree::new(),
            transfers: TransferRegistry::new(),
            banner_image: None,
            last_server_error: None,
        }
    }

    // -----------------------------------------------------------------
    // Tracker
    // -----------------------------------------------------------------

    /// Fetch the server directory from a tracker, dropping entries the
    /// tracker listed without a name.
    pub async fn fetch_servers(&mut self, address: &str, port: u16) -> Vec<Server> {
        match self.tracker.fetch_servers(address.to_string(), port).await {
            Ok(listed) => listed
                .into_iter()
                .filter_map(|s| {
                    s.name.map(|name| Server {
                        name,
                        description: s.description,
                        address: s.address,
                        port: s.port,
                        users: s.users,
                    })
                })
                .collect(),
            Err(e) => {
                debug!(tracker = address, error = %e, "Tracker fetch failed");
                Vec::new()
            }
        }
    }

    pub async fn disconnect_tracker(&mut self) {
        self.tracker.disconnect().await;
    }

    // -----------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------

    /// Open the control connection and perform the login handshake.
    ///
    /// Resolves once the server accepted or rejected the handshake; an
    /// accepted reply may carry the server's advertised name and
    /// protocol version, which override the locally-known values.
    pub async fn login(
        &mut self,
        server: Server,
        login: &str,
        password: &str,
        username: &str,
        icon_id: u16,
    ) -> bool {
        if self.status != ConnectionStatus::Disconnected {
            warn!(status = ?self.status, "Login attempted while a session is active");
            return false;
        }

        self.status = ConnectionStatus::Connecting;
        self.server_name = Some(server.name.clone()).filter(|n| !n.is_empty());
        self.server = Some(server.clone());
        self.username = username.to_string();
        self.icon_id = icon_id;

        match self
            .control
            .login(
                server.address.clone(),
                server.port,
                login.to_string(),
                password.to_string(),
                username.to_string(),
                icon_id,
            )
            .await
        {
            Ok(reply) => {
                self.server_version = reply.server_version;
                if reply.server_name.is_some() {
                    self.server_name = reply.server_name;
                }
                self.status = ConnectionStatus::Connected;
                info!(server = %server.address, title = %self.server_title(), "Logged in");
                true
            }
            Err(e) => {
                warn!(server = %server.address, error = %e, "Login failed");
                self.reset_session();
                false
            }
        }
    }

    /// Close the control connection and tear the session down.
    pub async fn disconnect(&mut self) {
        if self.status == ConnectionStatus::Disconnected {
            return;
        }
        self.control.disconnect().await;
        self.reset_session();
    }

    /// Clear every piece of session-scoped state. Runs exactly once per
    /// transition into the disconnected status, whatever the cause.
    fn reset_session(&mut self) {
        info!("Resetting session state");
        self.server = None;
        self.server_name = None;
        self.server_version = None;
        self.access = None;
        self.agreed = false;
        self.roster.clear();
        self.chat.clear();
        self.message_board.clear();
        self.message_board_loaded = false;
        self.files.clear();
        self.news.clear();
        self.banner_image = None;
        self.last_server_error = None;
        self.transfers.cancel_all();
        self.status = ConnectionStatus::Disconnected;
    }

    // -----------------------------------------------------------------
    // Identity, chat, message board
    // -----------------------------------------------------------------

    /// Update the local identity and push it to the server.
    pub async fn send_user_info(
        &mut self,
        username: &str,
        icon_id: u16,
        options: UserOptions,
        autoresponse: Option<String>,
    ) -> bool {
        self.username = username.to_string();
        self.icon_id = icon_id;
        self.control
            .set_user_info(username.to_string(), icon_id, options, autoresponse)
            .await
            .is_ok()
    }

    /// Ask the server to push a fresh roster snapshot.
    pub async fn refresh_user_list(&mut self) -> bool {
        self.control.get_user_list().await.is_ok()
    }

    /// Acknowledge the usage agreement. Fire-and-forget.
    pub async fn send_agreement(&mut self) {
        self.agreed = true;
        self.control
            .agree(self.username.clone(), self.icon_id, UserOptions::default())
            .await;
    }

    /// Broadcast a chat line. Fire-and-forget; the echoed line arrives
    /// back as a push.
    pub async fn send_chat(&mut self, text: &str) {
        self.control.chat(text.to_string()).await;
    }

    /// Fetch the message board, replacing the cached copy wholesale.
    pub async fn fetch_message_board(&mut self) -> Vec<String> {
        match self.control.get_message_board().await {
            Ok(messages) => {
                self.message_board = messages.clone();
                self.message_board_loaded = true;
                messages
            }
            Err(e) => {
                debug!(error = %e, "Message board fetch failed");
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------
    // File and news browsing
    // -----------------------------------------------------------------

    /// Fetch the listing at `path` (the root when empty) and replace the
    /// addressed node's children wholesale. Failure returns an empty
    /// listing and leaves the tree untouched.
    pub async fn fetch_file_list(&mut self, path: &[String]) -> Vec<FileEntry> {
        match self.control.get_file_list(path.to_vec()).await {
            Ok(entries) => {
                self.files.replace_children(path, entries.clone());
                entries
            }
            Err(e) => {
                debug!(?path, error = %e, "File listing fetch failed");
                Vec::new()
            }
        }
    }

    /// Fetch the news listing at `path`.
    ///
    /// An unknown node or a bundle/category is asked for
    /// sub-categories; anything else is asked for articles. Same
    /// replace-wholesale semantics as file listings.
    pub async fn fetch_news_list(&mut self, path: &[String]) -> Vec<NewsEntry> {
        let request_categories = match self.news.find(path) {
            None => true,
            Some(id) => matches!(
                self.news.value(id).kind,
                NewsKind::Bundle | NewsKind::Category
            ),
        };

        let result = if request_categories {
            self.control.get_news_categories(path.to_vec()).await
        } else {
            self.control.get_news_articles(path.to_vec()).await
        };

        match result {
            Ok(entries) => {
                self.news.replace_children(path, entries.clone());
                entries
            }
            Err(e) => {
                debug!(?path, error = %e, "News listing fetch failed");
                Vec::new()
            }
        }
    }

    /// Fetch one article's raw content. Never mutates the news tree.
    pub async fn fetch_news_article(
        &mut self,
        id: u32,
        path: &[String],
        flavor: &str,
    ) -> Option<String> {
        self.control
            .get_news_article(id, path.to_vec(), flavor.to_string())
            .await
            .ok()
    }

    // -----------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------

    /// Negotiate a download of `name` and start its transfer connection
    /// in to-storage mode. The returned channel resolves with the
    /// stored-file location once the transfer completes.
    pub async fn begin_download(
        &mut self,
        name: &str,
        path: &[String],
    ) -> Option<oneshot::Receiver<(TransferInfo, PathBuf)>> {
        let reply = self.negotiate(name, path, false).await?;
        let (tx, rx) = oneshot::channel();
        self.start_transfer(
            name,
            reply,
            TransferMode::ToFile,
            true,
            TransferCompletion::Download(tx),
        )?;
        Some(rx)
    }

    /// Negotiate a preview of `name` and start its transfer connection
    /// in in-memory mode. The returned channel resolves with the raw
    /// bytes. `add_to_transfers` controls whether the transfer shows up
    /// in the observable transfer list.
    pub async fn begin_preview(
        &mut self,
        name: &str,
        path: &[String],
        add_to_transfers: bool,
    ) -> Option<oneshot::Receiver<(TransferInfo, Bytes)>> {
        let reply = self.negotiate(name, path, true).await?;
        let (tx, rx) = oneshot::channel();
        self.start_transfer(
            name,
            reply,
            TransferMode::ToMemory,
            add_to_transfers,
            TransferCompletion::Preview(tx),
        )?;
        Some(rx)
    }

    /// Fetch the server banner unless a cached image already exists.
    ///
    /// Returns whether a banner is cached or on its way; the decoded
    /// image lands in [`Session::banner_image`] when the transfer
    /// completes. The banner never joins the transfer list.
    pub async fn begin_banner_fetch(&mut self, force_reload: bool) -> bool {
        if force_reload {
            self.banner_image = None;
        }
        if self.banner_image.is_some() {
            return true;
        }

        // Restart any banner fetch already in flight.
        self.transfers.cancel_banner();

        let Some(server) = self.server.clone() else {
            return false;
        };
        match self.control.download_banner().await {
            Ok(reply) => {
                let link = self.connector.connect(
                    &server.address,
                    server.port + TRANSFER_PORT_OFFSET,
                    reply.reference,
                    reply.transfer_size,
                    TransferMode::ToMemory,
                    self.event_tx.clone(),
                );
                self.transfers.set_banner(link);
                true
            }
            Err(e) => {
                debug!(error = %e, "Banner negotiation failed");
                false
            }
        }
    }

    /// Cancel one transfer (or the pending banner fetch), deleting any
    /// partially-written file.
    pub fn cancel_transfer(&mut self, reference: u32) {
        self.transfers.cancel(reference, true);
    }

    pub fn cancel_all_transfers(&mut self) {
        self.transfers.cancel_all();
    }

    /// One control exchange negotiating a transfer. The trailing path
    /// segment is the file name itself; the request addresses the
    /// containing folder.
    async fn negotiate(&mut self, name: &str, path: &[String], preview: bool) -> Option<DownloadReply> {
        self.server.as_ref()?;

        let folder = containing_folder(path);
        match self
            .control
            .download_file(name.to_string(), folder, preview)
            .await
        {
            Ok(reply) => {
                if let Some(waiting) = reply.waiting_count {
                    info!(reference = reply.reference, waiting, "Transfer queued behind other clients");
                }
                Some(reply)
            }
            Err(e) => {
                debug!(name, error = %e, "Transfer negotiation failed");
                None
            }
        }
    }

    fn start_transfer(
        &mut self,
        title: &str,
        reply: DownloadReply,
        mode: TransferMode,
        listed: bool,
        completion: TransferCompletion,
    ) -> Option<()> {
        let server = self.server.as_ref()?;
        // Transfer connections listen one port above the control port.
        let link = self.connector.connect(
            &server.address,
            server.port + TRANSFER_PORT_OFFSET,
            reply.reference,
            reply.transfer_size,
            mode,
            self.event_tx.clone(),
        );
        let info = TransferInfo::new(reply.reference, title, reply.transfer_size);
        self.transfers.register(info, listed, Some(completion), link);
        Some(())
    }

    // -----------------------------------------------------------------
    // Event pump
    // -----------------------------------------------------------------

    /// Apply one event from the session queue. The owner drains the
    /// queue between operations; nothing else mutates session state.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Control(event) => self.handle_control_event(event),
            SessionEvent::Transfer { reference, event } => {
                match self.transfers.handle_event(reference, event) {
                    Some(BannerUpdate::Data(data)) => self.cache_banner(&data),
                    Some(BannerUpdate::Failed(reason)) => {
                        warn!(reason = %reason, "Banner transfer failed");
                    }
                    None => {}
                }
            }
        }
    }

    fn handle_control_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::StatusChanged(status) => {
                info!(?status, "Control connection status changed");
                if status == ConnectionStatus::Disconnected {
                    // An async drop and an explicit disconnect may race;
                    // the reset still runs exactly once.
                    if self.status != ConnectionStatus::Disconnected {
                        self.reset_session();
                    }
                } else {
                    self.status = status;
                }
            }
            ControlEvent::UserList(users) => {
                self.roster.apply_snapshot(users);
            }
            ControlEvent::UserChanged(user) => {
                let notice = self.roster.apply_user_changed(user);
                self.push_roster_notice(notice);
            }
            ControlEvent::UserDisconnected(id) => {
                let notice = self.roster.apply_user_disconnected(id);
                self.push_roster_notice(notice);
            }
            ControlEvent::ChatReceived(text) => {
                self.chat.push(ChatMessage::new(text, ChatMessageKind::Message));
            }
            ControlEvent::ServerMessage(message) => {
                debug!(message = %message, "Server broadcast");
            }
            ControlEvent::Agreement(text) => {
                self.chat.push(ChatMessage::new(text, ChatMessageKind::Agreement));
            }
            ControlEvent::AccessChanged(access) => {
                self.access = Some(access);
            }
            ControlEvent::ErrorNotice(message) => {
                warn!(message = %message, "Server error notice");
                self.last_server_error = Some(message);
            }
        }
    }

    fn push_roster_notice(&mut self, notice: Option<RosterNotice>) {
        let text = match notice {
            Some(RosterNotice::Joined(name)) => format!("{name} joined"),
            Some(RosterNotice::Left(name)) => format!("{name} left"),
            None => return,
        };
        self.chat.push(ChatMessage::new(text, ChatMessageKind::Status));
    }

    fn cache_banner(&mut self, data: &[u8]) {
        match image::load_from_memory(data) {
            Ok(img) => {
                debug!(len = data.len(), "Banner image cached");
                self.banner_image = Some(img);
            }
            Err(e) => warn!(error = %e, "Banner image failed to decode"),
        }
    }

    // -----------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn server(&self) -> Option<&Server> {
        self.server.as_ref()
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    pub fn server_version(&self) -> Option<u16> {
        self.server_version
    }

    /// Display title: the advertised server name, else the configured
    /// one, else the address.
    pub fn server_title(&self) -> String {
        self.server_name
            .clone()
            .or_else(|| {
                self.server
                    .as_ref()
                    .map(|s| s.name.clone())
                    .filter(|n| !n.is_empty())
            })
            .or_else(|| self.server.as_ref().map(|s| s.address.clone()))
            .unwrap_or_else(|| "Server".to_string())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn icon_id(&self) -> u16 {
        self.icon_id
    }

    pub fn access(&self) -> Option<AccessFlags> {
        self.access
    }

    pub fn agreed(&self) -> bool {
        self.agreed
    }

    pub fn users(&self) -> &[User] {
        self.roster.users()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn message_board(&self) -> &[String] {
        &self.message_board
    }

    pub fn message_board_loaded(&self) -> bool {
        self.message_board_loaded
    }

    pub fn files(&self) -> &ListingTree<FileEntry> {
        &self.files
    }

    pub fn news(&self) -> &ListingTree<NewsEntry> {
        &self.news
    }

    pub fn transfers(&self) -> Vec<&TransferInfo> {
        self.transfers.visible().collect()
    }

    pub fn transfer(&self, reference: u32) -> Option<&TransferInfo> {
        self.transfers.get(reference)
    }

    pub fn has_pending_transfers(&self) -> bool {
        !self.transfers.is_empty()
    }

    pub fn banner_image(&self) -> Option<&image::DynamicImage> {
        self.banner_image.as_ref()
    }

    pub fn last_server_error(&self) -> Option<&str> {
        self.last_server_error.as_deref()
    }
}

/// Strip the trailing segment (the file name) off a file path, leaving
/// the containing folder.
fn containing_folder(path: &[String]) -> Vec<String> {
    if path.len() > 1 {
        path[..path.len() - 1].to_vec()
    } else {
        Vec::new()
    }
}
