//! Concrete delivery transports. External programs are always invoked with
//! argument vectors, never through a shell, so message content cannot be
//! interpreted as command syntax; the one place text is embedded in source
//! code (AppleScript) is escaped explicitly.

use crate::models::NotifyMethod;
use crate::notify::{DeliveryError, Message, Transport};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::warn;

const DEFAULT_SOUND: &str = "Glass";
const DEFAULT_GROUP: &str = "memora";

fn on_path(binary: &str) -> bool {
    Command::new("which")
        .arg(binary)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn run(command: &mut Command) -> Result<(), DeliveryError> {
    let status = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| DeliveryError::Failed(e.to_string()))?;
    if status.success() {
        Ok(())
    } else {
        Err(DeliveryError::Failed(format!("exit status {status}")))
    }
}

/// Escape text for inclusion inside an AppleScript string literal.
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Rich interactive notifier (`terminal-notifier`): supports subtitles,
/// grouping and click actions.
pub struct NativeNotifier;

impl NativeNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for NativeNotifier {
    fn method(&self) -> NotifyMethod {
        NotifyMethod::Native
    }

    fn probe(&self) -> bool {
        on_path("terminal-notifier")
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let mut command = Command::new("terminal-notifier");
        command
            .arg("-title")
            .arg(&message.title)
            .arg("-message")
            .arg(&message.body)
            .arg("-sound")
            .arg(message.sound.as_deref().unwrap_or(DEFAULT_SOUND))
            .arg("-group")
            .arg(message.group.as_deref().unwrap_or(DEFAULT_GROUP));
        if let Some(subtitle) = &message.subtitle {
            command.arg("-subtitle").arg(subtitle);
        }
        if let Some(url) = &message.action_url {
            command.arg("-open").arg(url);
        }
        run(&mut command)
    }
}

/// OS-level notification call: `osascript` on macOS, `notify-send` on
/// desktops that speak the freedesktop notification protocol.
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }

    fn binary() -> &'static str {
        if cfg!(target_os = "macos") {
            "osascript"
        } else {
            "notify-send"
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for DesktopNotifier {
    fn method(&self) -> NotifyMethod {
        NotifyMethod::Desktop
    }

    fn probe(&self) -> bool {
        on_path(Self::binary())
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        if cfg!(target_os = "macos") {
            let mut script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_applescript(&message.body),
                escape_applescript(&message.title),
            );
            if let Some(subtitle) = &message.subtitle {
                script.push_str(&format!(
                    " subtitle \"{}\"",
                    escape_applescript(subtitle)
                ));
            }
            script.push_str(&format!(
                " sound name \"{}\"",
                escape_applescript(message.sound.as_deref().unwrap_or(DEFAULT_SOUND))
            ));
            run(Command::new("osascript").arg("-e").arg(script))
        } else {
            let mut command = Command::new("notify-send");
            command.arg("--app-name").arg("memora");
            // "--" keeps a title starting with "-" from reading as a flag
            command.arg("--").arg(&message.title).arg(&message.body);
            run(&mut command)
        }
    }
}

/// Colored banner on stderr when a terminal is attached.
pub struct TerminalBanner;

impl TerminalBanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalBanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TerminalBanner {
    fn method(&self) -> NotifyMethod {
        NotifyMethod::Terminal
    }

    fn probe(&self) -> bool {
        std::io::stderr().is_terminal()
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        if !std::io::stderr().is_terminal() {
            return Err(DeliveryError::Unavailable);
        }

        let mut err = std::io::stderr().lock();
        let mut banner = String::new();
        banner.push_str("\x07\n");
        banner.push_str("\x1b[1;33m╔═══════════════════════════════════════════════════╗\x1b[0m\n");
        banner.push_str(&format!("\x1b[1;33m║ 🔔 {}\x1b[0m\n", message.title));
        if let Some(subtitle) = &message.subtitle {
            banner.push_str(&format!("\x1b[1;33m║    {}\x1b[0m\n", subtitle));
        }
        banner.push_str(&format!("\x1b[33m║ {}\x1b[0m\n", message.body));
        banner.push_str("\x1b[1;33m╚═══════════════════════════════════════════════════╝\x1b[0m\n");
        err.write_all(banner.as_bytes())
            .map_err(|e| DeliveryError::Failed(e.to_string()))
    }
}

/// Audible-only cue for when nothing visual is reachable.
pub struct SoundCue;

impl SoundCue {
    pub fn new() -> Self {
        Self
    }

    fn player() -> &'static str {
        if cfg!(target_os = "macos") {
            "afplay"
        } else {
            "paplay"
        }
    }
}

impl Default for SoundCue {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SoundCue {
    fn method(&self) -> NotifyMethod {
        NotifyMethod::Sound
    }

    fn probe(&self) -> bool {
        on_path(Self::player())
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        if cfg!(target_os = "macos") {
            let sound = message.sound.as_deref().unwrap_or(DEFAULT_SOUND);
            run(Command::new("afplay")
                .arg(format!("/System/Library/Sounds/{sound}.aiff")))
        } else {
            run(Command::new("paplay")
                .arg("/usr/share/sounds/freedesktop/stereo/complete.oga"))
        }
    }
}

/// Append-only log record: the last resort that cannot fail, so total
/// delivery failure is impossible for a full chain.
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("memora")
            .join("notifications.log")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl Transport for LogFile {
    fn method(&self) -> NotifyMethod {
        NotifyMethod::Log
    }

    fn probe(&self) -> bool {
        true
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = match &message.subtitle {
            Some(subtitle) => format!(
                "[{timestamp}] {} - {}: {}\n",
                message.title, subtitle, message.body
            ),
            None => format!("[{timestamp}] {}: {}\n", message.title, message.body),
        };

        if let Err(e) = self.append(&line) {
            warn!(path = %self.path.display(), error = %e, "notification log write failed");
        }
        if std::io::stderr().is_terminal() {
            eprintln!("[MEMORA REMINDER] {}: {}", message.title, message.body);
        }
        Ok(())
    }
}
