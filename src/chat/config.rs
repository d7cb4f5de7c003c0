//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use arrrg_derive::CommandLine;

use crate::client::{BASE_URL_ENV, DEFAULT_BASE_URL};

/// Command-line arguments for the soulai-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the soul backend.
    #[arrrg(optional, "Backend URL (default: $SOULAI_URL or http://localhost:8000)", "URL")]
    pub url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Wait for complete answers instead of streaming them.
    #[arrrg(flag, "Use one-shot requests instead of streaming")]
    pub no_stream: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the soul backend.
    pub base_url: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether turns are streamed as the faculties answer.
    pub streaming: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Backend: http://localhost:8000
    /// - Color: enabled
    /// - Streaming: enabled
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            use_color: true,
            streaming: true,
        }
    }

    /// Sets the backend URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets whether turns are streamed.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Resolve arguments, consulting `SOULAI_URL` when no URL was given.
    pub fn from_args_and_env(args: ChatArgs) -> Self {
        Self::resolve(args, std::env::var(BASE_URL_ENV).ok())
    }

    fn resolve(args: ChatArgs, env_url: Option<String>) -> Self {
        let base_url = args
            .url
            .or(env_url)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        ChatConfig {
            base_url,
            use_color: !args.no_color,
            streaming: !args.no_stream,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self::resolve(args, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.use_color);
        assert!(config.streaming);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            url: Some("http://soul.local:9000".to_string()),
            no_color: true,
            no_stream: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.base_url, "http://soul.local:9000");
        assert!(!config.use_color);
        assert!(!config.streaming);
    }

    #[test]
    fn url_precedence() {
        let env = Some("http://from-env:8000".to_string());
        let config = ChatConfig::resolve(ChatArgs::default(), env.clone());
        assert_eq!(config.base_url, "http://from-env:8000");
        let args = ChatArgs {
            url: Some("http://from-args:8000".to_string()),
            ..ChatArgs::default()
        };
        assert_eq!(
            ChatConfig::resolve(args, env).base_url,
            "http://from-args:8000"
        );
        let config = ChatConfig::resolve(ChatArgs::default(), Some("  ".to_string()));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://elsewhere:1234")
            .without_color()
            .with_streaming(false);
        assert_eq!(config.base_url, "http://elsewhere:1234");
        assert!(!config.use_color);
        assert!(!config.streaming);
    }
}
