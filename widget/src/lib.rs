// Chat widget client: a toggleable panel, an in-memory message log and a
// single-flight request gate, rendered to the terminal.

pub mod message;
pub mod options;
pub mod output;
pub mod transport;
pub mod widget;

pub use message::{Message, Sender};
pub use options::{Position, Theme, WidgetOptions};
pub use transport::{ChatFailure, ChatTransport, HttpTransport};
pub use widget::{ChatWidget, KeyCode, KeyEvent, PendingRequest};
