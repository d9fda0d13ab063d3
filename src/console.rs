use colored::*;

use crate::models::{CheckDefinition, CheckResult};

pub const SEPARATOR: &str = "--------------------------------------------------------------------------------------------------------------------------";

/// Prints one result as it arrives: group separator, verbose body, then the status line.
pub fn print_result(check: &CheckDefinition, result: &CheckResult) {
    for line in render(check, result) {
        println!("{}", line);
    }
}

pub fn render(check: &CheckDefinition, result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if check.starts_group() {
        lines.push(SEPARATOR.blue().bold().to_string());
    }
    if let Some(body) = &result.body {
        lines.push(format!("{} URL : {}\nBody : {}", result.id, result.target, body));
    }
    let summary = result.summary();
    lines.push(if result.reachable() {
        summary.cyan().bold().to_string()
    } else {
        summary.red().bold().to_string()
    });
    lines
}

/// Enables ANSI escapes and UTF-8 output on Windows consoles.
#[cfg(windows)]
pub fn setup_console() {
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleMode, SetConsoleOutputCP,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_OUTPUT_HANDLE,
    };
    unsafe {
        SetConsoleOutputCP(65001);
        let handle = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0;
        if GetConsoleMode(handle, &mut mode) != 0 {
            SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
    }
}

#[cfg(not(windows))]
pub fn setup_console() {}
