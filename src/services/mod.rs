mod catalog;
mod notifier;
mod passwords;
mod stoplist;

pub use catalog::*;
pub use notifier::TelegramNotifier;
pub use passwords::{hash_password, verify_password};
pub use stoplist::*;
