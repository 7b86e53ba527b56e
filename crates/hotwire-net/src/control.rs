//! Control-connection contract with tokio mpsc request / oneshot reply pattern.
//!
//! The control connection runs in its own task. Each awaited exchange is a
//! request object carrying a completion channel: the link task writes either
//! a transmission failure or the decoded server reply into the slot, and the
//! caller awaits whichever terminal write arrives first. Unsolicited pushes
//! travel separately as [`ControlEvent`]s through the session event queue.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use hotwire_shared::error::ExchangeError;
use hotwire_shared::protocol::{DownloadReply, LoginReply};
use hotwire_shared::types::{
    AccessFlags, ConnectionStatus, FileEntry, NewsEntry, User, UserId, UserOptions,
};

/// Completion channel for one exchange.
pub type ReplySlot<T> = oneshot::Sender<Result<T, ExchangeError>>;

/// Requests sent *into* the control-connection task.
#[derive(Debug)]
pub enum ControlRequest {
    /// Open the connection and perform the login handshake.
    Login {
        address: String,
        port: u16,
        login: String,
        password: String,
        username: String,
        icon_id: u16,
        reply: ReplySlot<LoginReply>,
    },
    /// Push the local identity to the server.
    SetUserInfo {
        username: String,
        icon_id: u16,
        options: UserOptions,
        autoresponse: Option<String>,
        reply: ReplySlot<()>,
    },
    /// Acknowledge the usage agreement. Fire-and-forget.
    Agree {
        username: String,
        icon_id: u16,
        options: UserOptions,
    },
    /// Broadcast a chat line. Fire-and-forget.
    Chat { text: String },
    /// Ask the server to re-send the full roster (arrives as a
    /// [`ControlEvent::UserList`] push).
    GetUserList { reply: ReplySlot<()> },
    GetMessageBoard { reply: ReplySlot<Vec<String>> },
    GetFileList {
        path: Vec<String>,
        reply: ReplySlot<Vec<FileEntry>>,
    },
    GetNewsCategories {
        path: Vec<String>,
        reply: ReplySlot<Vec<NewsEntry>>,
    },
    GetNewsArticles {
        path: Vec<String>,
        reply: ReplySlot<Vec<NewsEntry>>,
    },
    GetNewsArticle {
        id: u32,
        path: Vec<String>,
        flavor: String,
        reply: ReplySlot<String>,
    },
    /// Negotiate a file download or preview transfer. `path` addresses
    /// the containing folder, not the file itself.
    DownloadFile {
        name: String,
        path: Vec<String>,
        preview: bool,
        reply: ReplySlot<DownloadReply>,
    },
    /// Negotiate the server banner transfer.
    DownloadBanner { reply: ReplySlot<DownloadReply> },
    /// Close the control connection.
    Disconnect,
}

/// Unsolicited pushes sent *from* the control-connection task.
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// Connection lifecycle change, including asynchronous drops.
    StatusChanged(ConnectionStatus),
    /// Full roster snapshot.
    UserList(Vec<User>),
    /// A single user joined or changed name/icon/flags.
    UserChanged(User),
    UserDisconnected(UserId),
    /// A public chat line.
    ChatReceived(String),
    /// A broadcast notice from the server operator.
    ServerMessage(String),
    /// The server's usage agreement text.
    Agreement(String),
    /// The capability set granted to this session.
    AccessChanged(AccessFlags),
    /// A generic error notice. Never promoted to a typed failure of an
    /// in-flight exchange.
    ErrorNotice(String),
}

/// Handle to the control-connection task.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<ControlRequest>,
}

impl ControlHandle {
    pub fn new(tx: mpsc::Sender<ControlRequest>) -> Self {
        Self { tx }
    }

    /// Create a handle plus the receiving end a link task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ControlRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Run one awaited exchange: build the request around a fresh reply
    /// slot, hand it to the link, await the first terminal write.
    async fn exchange<T>(
        &self,
        build: impl FnOnce(ReplySlot<T>) -> ControlRequest,
    ) -> Result<T, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| ExchangeError::LinkClosed)?;
        // A dropped slot means the link died mid-exchange.
        rx.await.unwrap_or(Err(ExchangeError::LinkClosed))
    }

    /// Hand off a fire-and-forget request. Transmission failures are
    /// logged and swallowed; there is no caller to resume.
    async fn fire(&self, request: ControlRequest) {
        if self.tx.send(request).await.is_err() {
            debug!("control link closed, fire-and-forget request dropped");
        }
    }

    pub async fn login(
        &self,
        address: String,
        port: u16,
        login: String,
        password: String,
        username: String,
        icon_id: u16,
    ) -> Result<LoginReply, ExchangeError> {
        self.exchange(|reply| ControlRequest::Login {
            address,
            port,
            login,
            password,
            username,
            icon_id,
            reply,
        })
        .await
    }

    pub async fn set_user_info(
        &self,
        username: String,
        icon_id: u16,
        options: UserOptions,
        autoresponse: Option<String>,
    ) -> Result<(), ExchangeError> {
        self.exchange(|reply| ControlRequest::SetUserInfo {
            username,
            icon_id,
            options,
            autoresponse,
            reply,
        })
        .await
    }

    pub async fn agree(&self, username: String, icon_id: u16, options: UserOptions) {
        self.fire(ControlRequest::Agree {
            username,
            icon_id,
            options,
        })
        .await;
    }

    pub async fn chat(&self, text: String) {
        self.fire(ControlRequest::Chat { text }).await;
    }

    pub async fn get_user_list(&self) -> Result<(), ExchangeError> {
        self.exchange(|reply| ControlRequest::GetUserList { reply })
            .await
    }

    pub async fn get_message_board(&self) -> Result<Vec<String>, ExchangeError> {
        self.exchange(|reply| ControlRequest::GetMessageBoard { reply })
            .await
    }

    pub async fn get_file_list(&self, path: Vec<String>) -> Result<Vec<FileEntry>, ExchangeError> {
        self.exchange(|reply| ControlRequest::GetFileList { path, reply })
            .await
    }

    pub async fn get_news_categories(
        &self,
        path: Vec<String>,
    ) -> Result<Vec<NewsEntry>, ExchangeError> {
        self.exchange(|reply| ControlRequest::GetNewsCategories { path, reply })
            .await
    }

    pub async fn get_news_articles(
        &self,
        path: Vec<String>,
    ) -> Result<Vec<NewsEntry>, ExchangeError> {
        self.exchange(|reply| ControlRequest::GetNewsArticles { path, reply })
            .await
    }

    pub async fn get_news_article(
        &self,
        id: u32,
        path: Vec<String>,
        flavor: String,
    ) -> Result<String, ExchangeError> {
        self.exchange(|reply| ControlRequest::GetNewsArticle {
            id,
            path,
            flavor,
            reply,
        })
        .await
    }

    pub async fn download_file(
        &self,
        name: String,
        path: Vec<String>,
        preview: bool,
    ) -> Result<DownloadReply, ExchangeError> {
        self.exchange(|reply| ControlRequest::DownloadFile {
            name,
            path,
            preview,
            reply,
        })
        .await
    }

    pub async fn download_banner(&self) -> Result<DownloadReply, ExchangeError> {
        self.exchange(|reply| ControlRequest::DownloadBanner { reply })
            .await
    }

    pub async fn disconnect(&self) {
        self.fire(ControlRequest::Disconnect).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exchange_resolves_with_link_reply() {
        let (handle, mut rx) = ControlHandle::channel(8);

        tokio::spawn(async move {
            if let Some(ControlRequest::GetMessageBoard { reply }) = rx.recv().await {
                let _ = reply.send(Ok(vec!["hello".to_string()]));
            }
        });

        let board = handle.get_message_board().await.unwrap();
        assert_eq!(board, vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn exchange_surfaces_transmission_failure() {
        let (handle, mut rx) = ControlHandle::channel(8);

        tokio::spawn(async move {
            if let Some(ControlRequest::GetUserList { reply }) = rx.recv().await {
                let _ = reply.send(Err(ExchangeError::SendFailed));
            }
        });

        assert_eq!(
            handle.get_user_list().await,
            Err(ExchangeError::SendFailed)
        );
    }

    #[tokio::test]
    async fn dropped_reply_slot_reads_as_link_closed() {
        let (handle, mut rx) = ControlHandle::channel(8);

        tokio::spawn(async move {
            // Drop the request without answering.
            let _ = rx.recv().await;
        });

        assert_eq!(
            handle.get_user_list().await,
            Err(ExchangeError::LinkClosed)
        );
    }

    #[tokio::test]
    async fn closed_link_reads_as_link_closed() {
        let (handle, rx) = ControlHandle::channel(8);
        drop(rx);

        assert_eq!(
            handle.get_message_board().await,
            Err(ExchangeError::LinkClosed)
        );
    }
}
