use std::io::{BufRead, Write};

use adminui::api::{Confirm, Navigator};

/// 在终端里询问 y/n；`assume_yes` 时直接确认
pub struct TerminalConfirm {
    pub assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{message} [y/N] ");
        if std::io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        // 同时接受土耳其语的 e(vet)
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "e" | "evet")
    }
}

pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn reload(&self) {
        tracing::info!("页面需要刷新");
    }

    fn assign(&self, url: &str) {
        tracing::info!("页面跳转到 {}", url);
    }
}
