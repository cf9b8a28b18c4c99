// ABOUTME: Platform-agnostic core of the tag-everyone bot
// ABOUTME: Authorization gate, participant directory, and staggered broadcast scheduling

pub mod commands;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod gate;
pub mod handler;
pub mod mention;
pub mod metrics;
pub mod partition;
pub mod paths;
pub mod roles;
pub mod scheduler;
pub mod texts;
pub mod timer;
pub mod traits;

pub use dispatch::{DispatchError, Dispatcher, GrantKind};
pub use gate::{Action, AuthorizationGate, RoleError};
pub use handler::MessageHandler;
pub use scheduler::{BroadcastReceipt, BroadcastScheduler};
pub use timer::{ScheduleError, Timer, TokioTimer};

// Re-export core traits and data types for convenient access
pub use traits::{
    ChatId, ChatKind, ChatSender, ChatUser, IncomingMessage, MessageContent, MessageId,
    ParticipantDirectory, Participants, ReplyTarget, UserId,
};
