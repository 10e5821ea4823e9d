use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use vms_console::{ApiClient, Banner, Confirm, ConsoleConfig, ConsoleError, VmsApi};

pub fn api(config: &ConsoleConfig) -> Result<Arc<dyn VmsApi>> {
    let client = ApiClient::new(config).context("Failed to create API client")?;
    Ok(Arc::new(client))
}

/// Prints the banner of a successful action, or turns a failure into an error whose
/// context is the banner text.
pub fn report<T>(result: Result<T, ConsoleError>, banner: Option<&Banner>) -> Result<T> {
    match result {
        Ok(value) => {
            match banner {
                Some(banner) if banner.is_error() => eprintln!("{}", banner.message),
                Some(banner) => println!("{}", banner.message),
                None => {}
            }
            Ok(value)
        }
        Err(e) => {
            let context = banner
                .map(|b| b.message.clone())
                .unwrap_or_else(|| "Command failed".to_string());
            Err(anyhow::Error::new(e).context(context))
        }
    }
}

fn stdin_confirm(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn accept_all(_message: &str) -> bool {
    true
}

/// `--yes` skips the prompt.
pub fn confirmer(yes: bool) -> &'static dyn Confirm {
    if yes {
        &accept_all
    } else {
        &stdin_confirm
    }
}

/// Parses a `key=value` argument.
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => anyhow::bail!("Expected KEY=VALUE, found '{}'", pair),
    }
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    println!("{}", line(headers.to_vec()));
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}
