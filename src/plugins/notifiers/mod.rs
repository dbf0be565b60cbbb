// Notifier plugin implementations
pub mod github;
pub mod console;

pub use github::GitHubNotifier;
pub use console::{CONSOLE_NOTIFIER_TYPE, ConsoleNotifier};
