/// Default auto-dismiss delay handed to the toast widget.
pub const DEFAULT_TOAST_DURATION_MS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Error,
    Success,
}

/// What the toast viewport needs to render one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub toast_type: ToastType,
    pub open: bool,
    pub duration: Option<u32>, // milliseconds, None for no auto-dismiss
}

impl Toast {
    /// A closed toast with no message.
    pub fn closed(toast_type: ToastType) -> Self {
        Self {
            message: String::new(),
            toast_type,
            open: false,
            duration: Some(DEFAULT_TOAST_DURATION_MS),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::closed(ToastType::Error).show(message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::closed(ToastType::Success).show(message)
    }

    pub fn show(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self.open = true;
        self
    }

    /// Close the toast, keeping its last message for exit animations.
    pub fn dismiss(&mut self) {
        self.open = false;
    }
}
