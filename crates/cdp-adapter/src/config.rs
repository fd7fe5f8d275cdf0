use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};
use which::which;

/// Configuration for launching and tuning the browser driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    /// Explicit browser binary; detected on `PATH` and in OS locations when unset.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    /// Upper bound for navigation and load waits.
    pub navigation_timeout_ms: u64,
    /// Extra wait after load so late scripts can render.
    pub settle_ms: u64,
    pub viewport: Viewport,
    /// Maximum number of pages open at once through a [`crate::DriverPool`].
    pub max_pages: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: resolve_headless_default(),
            navigation_timeout_ms: 30_000,
            settle_ms: 500,
            viewport: Viewport::default(),
            max_pages: 2,
        }
    }
}

impl CdpConfig {
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn with_navigation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    pub fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Configured executable, else the first browser found on this machine.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        self.executable
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(detect_chrome_executable)
    }
}

fn resolve_headless_default() -> bool {
    // "0", "false", "no" and "off" mean headful
    match env::var("UITESTGEN_HEADLESS") {
        Ok(value) => {
            let lower = value.to_ascii_lowercase();
            !matches!(lower.as_str(), "0" | "false" | "no" | "off")
        }
        Err(_) => true,
    }
}

pub(crate) fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("UITESTGEN_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for var in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(root) = env::var(var) {
                let root = PathBuf::from(root);
                paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                paths.push(root.join("Microsoft/Edge/Application/msedge.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let cfg = CdpConfig::default()
            .with_headless(false)
            .with_navigation_timeout_ms(5_000)
            .with_viewport(800, 600)
            .with_max_pages(0);

        assert!(!cfg.headless);
        assert_eq!(cfg.navigation_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.viewport, Viewport { width: 800, height: 600 });
        assert_eq!(cfg.max_pages, 1);
    }

    #[test]
    fn explicit_executable_wins_over_detection() {
        let cfg = CdpConfig::default().with_executable("/opt/custom/chrome");
        assert_eq!(cfg.resolve_executable(), Some(PathBuf::from("/opt/custom/chrome")));
    }
}
