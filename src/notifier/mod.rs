// Notifier module: delivery of rendered report sections.

pub mod telegram;

pub use telegram::TelegramNotifier;
