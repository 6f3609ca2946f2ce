use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The status page was fetched but the status heading is not in it.
    #[error("status heading not found on {url}")]
    HeadingNotFound { url: String },

    /// The mail API answered, but not with a 2xx.
    #[error("mail API rejected the send ({status}): {body}")]
    MailRejected { status: u16, body: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}
