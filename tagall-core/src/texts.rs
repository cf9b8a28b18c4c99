// ABOUTME: User-facing reply texts
// ABOUTME: All plain text; names are interpolated by the message handler

pub const START_TEXT: &str = "Hi! I can mention everyone in a group for you.\n\n\
Reply to a message with !tag or @everyone and I will mention every member of the chat \
in small batches. Send !help to see all commands.";

pub const HELP_TEXT: &str = "Commands (use them as a reply inside a group):\n\n\
!tag, !everyone, @tag, @everyone - mention all members under the replied message\n\
!grant - give the replied user tag power in this chat\n\
!revoke - take tag power away from the replied user in this chat\n\
!grant_su - give the replied user superuser power\n\
!revoke_su - take superuser power away from the replied user\n\n\
Tag power is granted by superusers and owners, superuser power by owners only.";

pub const GROUP_ONLY_TEXT: &str = "This command only works in groups.";

pub const NOT_ALLOWED_TEXT: &str = "You are not allowed to use this command here.";

pub const REPLY_TO_TAG_TEXT: &str = "Please reply to a message to tag all users of the chat.";

pub const REPLY_TO_GRANT_TEXT: &str = "Please reply to a user to grant power.";

pub const REPLY_TO_REVOKE_TEXT: &str = "Please reply to a user to revoke power.";

pub const NO_TARGET_USER_TEXT: &str = "The replied message has no user to change powers for.";

pub const SCHEDULE_FAILED_TEXT: &str = "I'm too busy to tag everyone right now, please try again later.";

pub const ROLE_STORE_FAILED_TEXT: &str = "Couldn't save the change, please try again later.";

/// Power names used in grant/revoke replies
pub fn power_name(sudo: bool) -> &'static str {
    if sudo {
        "superuser"
    } else {
        "tag"
    }
}

pub fn granted(power: &str, name: &str) -> String {
    format!("Granted {} power to {}", power, name)
}

pub fn grant_failed(power: &str, name: &str) -> String {
    format!("Couldn't grant {} power to {}", power, name)
}

pub fn revoked(power: &str, name: &str) -> String {
    format!("Revoked {} power from {}", power, name)
}

pub fn revoke_failed(power: &str, name: &str) -> String {
    format!("Couldn't revoke {} power from {}", power, name)
}
