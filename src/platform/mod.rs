// ABOUTME: Chat platform implementations for tagall
// ABOUTME: Each platform feeds IncomingMessage to the core and implements ChatSender

#[cfg(feature = "telegram")]
pub mod telegram;

#[cfg(feature = "telegram")]
pub use telegram::{TelegramPlatform, TelegramSender};
