//! Minimal STOMP session client.
//!
//! A session opens one stream, sends CONNECT, then either SUBSCRIBEs and
//! prints what arrives or SENDs a message a fixed number of times, and
//! finishes with DISCONNECT. Only that subset of STOMP is spoken: no
//! heartbeats, transactions, acknowledgements, TLS or reconnects.
//!
//! ```no_run
//! use mq_stomp::{Destination, Domain, Mode, Session, SessionConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new(Destination::new(Domain::Queue, "orders")?);
//! let session = Session::open(config).await?;
//! let mode = Mode::send("hello", 3)?;
//! session
//!     .run(&mode, &CancellationToken::new(), |reply| println!("{}", reply))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod reply;
pub mod session;

pub use codec::{StompCodec, encode_frame};
pub use config::{ConfigError, Destination, Domain, Mode, SessionConfig};
pub use error::SessionError;
pub use frame::Frame;
pub use reply::{Reply, check_status};
pub use session::{Outcome, ReceiveEnd, ReceiveSummary, SendReport, Session, SessionState};
