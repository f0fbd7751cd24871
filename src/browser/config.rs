use std::path::PathBuf;

/// Options for launching a new browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window (default: true)
    pub headless: bool,

    pub window_width: u32,

    pub window_height: u32,

    /// Chrome/Chromium binary; found on the system when unset
    pub chrome_path: Option<PathBuf>,

    /// Profile directory; a temporary one when unset
    pub user_data_dir: Option<PathBuf>,

    /// Chrome sandbox (default: true)
    pub sandbox: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 900,
            chrome_path: None,
            user_data_dir: None,
            sandbox: true,
        }
    }
}

impl LaunchOptions {
    /// Create launch options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set Chrome binary path
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Builder method: set user data directory
    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Builder method: set sandbox mode
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

/// Options for attaching to a running browser over its DevTools WebSocket
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub ws_url: String,

    /// Milliseconds
    pub timeout: u64,
}

impl ConnectionOptions {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            timeout: 30_000,
        }
    }

    /// Builder method: set timeout in milliseconds
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}
