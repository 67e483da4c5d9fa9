//! # Kirha client
//!
//! HTTP client for the Kirha tool provider API. Implements
//! [`kirha_core::ToolProvider`] so the gateway can list and execute remote
//! tools.
//!
//! ```rust,no_run
//! use kirha_client::{ClientConfig, KirhaClient};
//! use kirha_core::ToolProvider;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig {
//!     api_key: "sk-your-api-key".to_string(),
//!     vertical_id: "crypto".to_string(),
//!     base_url: "https://api.kirha.ai".parse()?,
//!     timeout: Duration::from_secs(120),
//! };
//! let client = KirhaClient::new(config)?;
//!
//! let tools = client.list_tools(&CancellationToken::new()).await?;
//! println!("Found {} tools", tools.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod types;

pub use client::KirhaClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
