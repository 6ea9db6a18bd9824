use crate::message::Message;
use crate::options::WidgetOptions;
use crate::transport::{ChatFailure, ChatTransport};
use gemini_ipc::chat_request::ChatErrorKind;
use log::{debug, warn};

/// Shown when the request failed for a reason the server did not explain
pub const GENERIC_FAILURE_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// Shown for configuration and generation errors that carry no message
pub const CONFIG_FAILURE_TEXT: &str = "API key error: Please check server configuration.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
}

/// A key press on the input control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(code: KeyCode) -> Self {
        Self { code, shift: false }
    }

    pub fn with_shift(code: KeyCode) -> Self {
        Self { code, shift: true }
    }
}

/// The request a successful `submit` asks the caller to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub message: String,
}

/// One visible row of the message area
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEntry<'a> {
    Welcome(&'a str),
    Message(&'a Message),
    /// Transient bot placeholder while a request is in flight
    Typing,
}

/// The chat widget state.
///
/// At most one request is in flight: `submit` returns a `PendingRequest`
/// and sets the busy flag, `complete` records the outcome and clears it.
/// Submissions while busy are dropped, not queued.
#[derive(Debug)]
pub struct ChatWidget {
    options: WidgetOptions,
    open: bool,
    messages: Vec<Message>,
    input: String,
    busy: bool,
    scroll_anchor: Option<usize>,
}

impl ChatWidget {
    pub fn new(options: WidgetOptions) -> Self {
        Self {
            options,
            open: false,
            messages: Vec::new(),
            input: String::new(),
            busy: false,
            scroll_anchor: None,
        }
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Index of the message the view is scrolled to
    pub fn scroll_anchor(&self) -> Option<usize> {
        self.scroll_anchor
    }

    pub fn input_enabled(&self) -> bool {
        !self.busy
    }

    pub fn send_enabled(&self) -> bool {
        !self.busy && !self.input.trim().is_empty()
    }

    /// Icon for the toggle button in its current state
    pub fn toggle_icon(&self) -> &str {
        if self.open {
            &self.options.close_icon
        } else {
            &self.options.button_icon
        }
    }

    /// Flips panel visibility. Never touches the network.
    pub fn toggle(&mut self) {
        self.open = !self.open;
        debug!("Chat panel {}", if self.open { "opened" } else { "closed" });
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        if self.busy {
            return;
        }
        self.input = text.into();
    }

    /// Applies a key press to the input control.
    ///
    /// Enter submits; Shift+Enter inserts a line break. Returns the request
    /// to send when the key triggered a submission.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PendingRequest> {
        if !self.open || self.busy {
            return None;
        }

        match key.code {
            KeyCode::Enter if key.shift => {
                self.input.push('\n');
                None
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Char(c) => {
                self.input.push(c);
                None
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
        }
    }

    /// Submits the current input.
    pub fn submit_input(&mut self) -> Option<PendingRequest> {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Records a user message and marks the widget busy.
    ///
    /// Returns `None` without any change when `text` is blank or a request
    /// is already in flight.
    pub fn submit(&mut self, text: &str) -> Option<PendingRequest> {
        if self.busy {
            debug!("Dropping submission: a request is already in flight");
            return None;
        }
        if text.trim().is_empty() {
            return None;
        }

        self.push_message(Message::user(text));
        self.input.clear();
        self.busy = true;

        Some(PendingRequest {
            message: text.to_string(),
        })
    }

    /// Records the outcome of the in-flight request and clears the busy flag.
    pub fn complete(&mut self, outcome: Result<String, ChatFailure>) {
        if !self.busy {
            warn!("Ignoring a chat outcome with no request in flight");
            return;
        }

        let text = match outcome {
            Ok(response) => response,
            Err(failure) => {
                warn!("Chat error: {}", failure);
                failure_text(&failure)
            }
        };

        self.push_message(Message::bot(text));
        self.busy = false;
    }

    /// Submits `text`, waits for the transport and records the outcome.
    ///
    /// Returns whether a request was actually sent.
    pub async fn send(&mut self, text: &str, transport: &dyn ChatTransport) -> bool {
        let Some(pending) = self.submit(text) else {
            return false;
        };
        let outcome = transport.send(&pending.message).await;
        self.complete(outcome);
        true
    }

    /// Rows of the message area in display order
    pub fn entries(&self) -> Vec<PanelEntry<'_>> {
        let mut entries = Vec::with_capacity(self.messages.len() + 1);
        if self.messages.is_empty() {
            entries.push(PanelEntry::Welcome(&self.options.welcome_message));
        }
        entries.extend(self.messages.iter().map(PanelEntry::Message));
        if self.busy {
            entries.push(PanelEntry::Typing);
        }
        entries
    }

    fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.scroll_anchor = Some(self.messages.len() - 1);
    }
}

/// Text shown to the user for a failed round trip.
///
/// Configuration and generation failures prefer the server's own message.
pub fn failure_text(failure: &ChatFailure) -> String {
    match failure {
        ChatFailure::Server {
            kind: ChatErrorKind::Unconfigured | ChatErrorKind::GenerationFailed,
            message,
            ..
        } => message
            .clone()
            .unwrap_or_else(|| CONFIG_FAILURE_TEXT.to_string()),
        _ => GENERIC_FAILURE_TEXT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Sender;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubTransport {
        outcome: Result<String, ChatFailure>,
        calls: AtomicUsize,
    }

    impl StubTransport {
        fn new(outcome: Result<String, ChatFailure>) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for StubTransport {
        async fn send(&self, _message: &str) -> Result<String, ChatFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn open_widget() -> ChatWidget {
        let mut widget = ChatWidget::new(WidgetOptions::default());
        widget.toggle();
        widget
    }

    fn type_text(widget: &mut ChatWidget, text: &str) {
        for c in text.chars() {
            widget.handle_key(KeyEvent::new(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_toggle_flips_visibility_and_icon() {
        let mut widget = ChatWidget::new(WidgetOptions::default());
        assert!(!widget.is_open());
        assert_eq!(widget.toggle_icon(), "💬");
        widget.toggle();
        assert!(widget.is_open());
        assert_eq!(widget.toggle_icon(), "✕");
        widget.toggle();
        assert!(!widget.is_open());
        assert!(widget.messages().is_empty());
    }

    #[test]
    fn test_blank_submission_is_ignored() {
        let mut widget = open_widget();
        assert_eq!(widget.submit(""), None);
        assert_eq!(widget.submit("   \n\t"), None);
        assert!(widget.messages().is_empty());
        assert!(!widget.is_busy());
    }

    #[test]
    fn test_submit_appends_user_message_immediately() {
        let mut widget = open_widget();
        widget.set_input("Hello there");

        let pending = widget.submit_input().unwrap();

        assert_eq!(pending.message, "Hello there");
        assert_eq!(widget.messages().len(), 1);
        assert_eq!(widget.messages()[0].sender(), Sender::User);
        assert_eq!(widget.messages()[0].text(), "Hello there");
        assert_eq!(widget.input(), "");
        assert!(widget.is_busy());
        assert!(!widget.input_enabled());
        assert!(!widget.send_enabled());
    }

    #[test]
    fn test_submit_while_busy_is_dropped() {
        let mut widget = open_widget();
        widget.submit("first").unwrap();

        assert_eq!(widget.submit("second"), None);
        assert_eq!(widget.handle_key(KeyEvent::new(KeyCode::Enter)), None);
        widget.set_input("typed while busy");

        assert_eq!(widget.messages().len(), 1);
        assert_eq!(widget.input(), "");
    }

    #[test]
    fn test_typing_placeholder_is_transient() {
        let mut widget = open_widget();
        assert_eq!(widget.entries(), vec![PanelEntry::Welcome(&widget.options().welcome_message)]);

        widget.submit("question").unwrap();
        let entries = widget.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], PanelEntry::Typing);

        widget.complete(Ok("answer".to_string()));
        let entries = widget.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| matches!(e, PanelEntry::Message(_))));
        assert_eq!(widget.messages().len(), 2);
    }

    #[test]
    fn test_enter_submits_and_shift_enter_breaks_line() {
        let mut widget = open_widget();
        type_text(&mut widget, "line one");
        assert_eq!(
            widget.handle_key(KeyEvent::with_shift(KeyCode::Enter)),
            None
        );
        type_text(&mut widget, "line two");
        assert_eq!(widget.input(), "line one\nline two");

        widget.handle_key(KeyEvent::new(KeyCode::Backspace));
        let pending = widget.handle_key(KeyEvent::new(KeyCode::Enter)).unwrap();
        assert_eq!(pending.message, "line one\nline tw");
    }

    #[test]
    fn test_keys_ignored_while_closed() {
        let mut widget = ChatWidget::new(WidgetOptions::default());
        type_text(&mut widget, "hi");
        assert_eq!(widget.handle_key(KeyEvent::new(KeyCode::Enter)), None);
        assert_eq!(widget.input(), "");
    }

    #[test]
    fn test_scroll_follows_latest_message() {
        let mut widget = open_widget();
        assert_eq!(widget.scroll_anchor(), None);
        widget.submit("one").unwrap();
        assert_eq!(widget.scroll_anchor(), Some(0));
        widget.complete(Ok("two".to_string()));
        assert_eq!(widget.scroll_anchor(), Some(1));
    }

    #[test]
    fn test_complete_without_request_is_ignored() {
        let mut widget = open_widget();
        widget.complete(Ok("stray".to_string()));
        assert!(widget.messages().is_empty());
    }

    #[test]
    fn test_failure_text_mapping() {
        let unconfigured = ChatFailure::Server {
            status: 500,
            kind: ChatErrorKind::Unconfigured,
            message: Some("Please set a valid Gemini API key".to_string()),
            details: None,
        };
        assert_eq!(failure_text(&unconfigured), "Please set a valid Gemini API key");

        let generation = ChatFailure::Server {
            status: 500,
            kind: ChatErrorKind::GenerationFailed,
            message: None,
            details: Some("quota".to_string()),
        };
        assert_eq!(failure_text(&generation), CONFIG_FAILURE_TEXT);

        let bad_request = ChatFailure::Server {
            status: 400,
            kind: ChatErrorKind::BadRequest,
            message: Some("ignored".to_string()),
            details: None,
        };
        assert_eq!(failure_text(&bad_request), GENERIC_FAILURE_TEXT);

        let offline = ChatFailure::Transport("connection refused".to_string());
        assert_eq!(failure_text(&offline), GENERIC_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn test_round_trip_adds_exactly_two_messages() {
        let mut widget = open_widget();
        let transport = StubTransport::new(Ok("We offer Consulting and Support.".to_string()));

        assert!(widget.send("What are your services?", &transport).await);

        assert_eq!(widget.messages().len(), 2);
        assert_eq!(widget.messages()[1].sender(), Sender::Bot);
        assert_eq!(widget.messages()[1].text(), "We offer Consulting and Support.");
        assert!(!widget.is_busy());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_round_trip_clears_busy() {
        let mut widget = open_widget();
        let transport = StubTransport::new(Err(ChatFailure::Transport("offline".to_string())));

        assert!(widget.send("Hello", &transport).await);

        assert_eq!(widget.messages().len(), 2);
        assert_eq!(widget.messages()[1].text(), GENERIC_FAILURE_TEXT);
        assert!(!widget.is_busy());
    }

    #[tokio::test]
    async fn test_send_while_busy_makes_no_call() {
        let mut widget = open_widget();
        let transport = StubTransport::new(Ok("unused".to_string()));
        widget.submit("in flight").unwrap();

        assert!(!widget.send("again", &transport).await);

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(widget.messages().len(), 1);
    }
}
