//! Doctor command - verify API keys, the MCP server command and the database.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{open_store, StoreLocation};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("Trellis Doctor");
    println!();
    println!("Checking API keys, tools and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_checks = vec![
        check_openai_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref()),
        check_tavily_api_key(settings.tavily.api_key.as_deref()),
    ];
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    println!("{}", style("MCP Server").bold());
    let mcp_check = check_mcp_command(&settings.mcp.command);
    mcp_check.print();
    checks.push(mcp_check);

    println!();

    println!("{}", style("Database").bold());
    let db_check = check_database(&settings.database.url).await;
    db_check.print();
    checks.push(db_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_path = config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    let config_check = check_config_file(&config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Trellis.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Trellis is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 && key.is_ascii() => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some("") => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// The docs agent can't search without Tavily; everything else still works.
fn check_tavily_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if !key.is_empty() => CheckResult::ok("TAVILY_API_KEY", "configured"),
        _ => CheckResult::warning(
            "TAVILY_API_KEY",
            "not set (docs agent disabled)",
            "Set with: export TAVILY_API_KEY='tvly-...'",
        ),
    }
}

fn check_mcp_command(command: &str) -> CheckResult {
    match Command::new(command).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok(command, &version)
        }
        Ok(_) => CheckResult::warning(
            command,
            "installed but not working",
            "The browser agent will fail until this command runs",
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::warning(
            command,
            "not found (browser agent disabled)",
            install_hint_node(),
        ),
        Err(e) => CheckResult::warning(command, &format!("error: {}", e), install_hint_node()),
    }
}

async fn check_database(url: &str) -> CheckResult {
    let location = match StoreLocation::parse(url) {
        Ok(location) => location,
        Err(e) => {
            return CheckResult::error(
                "Database",
                &e.to_string(),
                "Use sqlite:///./test.db, sqlite::memory: or memory",
            )
        }
    };

    if let StoreLocation::SqliteFile(path) = &location {
        if !path.exists() {
            return CheckResult::warning(
                "Database",
                &format!("{} (not created yet)", path.display()),
                "The database is created when the server starts",
            );
        }
    }

    match open_store(url) {
        Ok(store) => match store.count().await {
            Ok(count) => CheckResult::ok("Database", &format!("{} ({} items)", url, count)),
            Err(e) => CheckResult::error("Database", &e.to_string(), "Check the database file"),
        },
        Err(e) => CheckResult::error("Database", &e.to_string(), "Check DATABASE_URL"),
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: trellis config init",
        )
    }
}

/// Platform-specific install hint for Node.js (npx).
fn install_hint_node() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install Node.js with: brew install node"
    } else if cfg!(target_os = "linux") {
        "Install Node.js with your package manager (e.g. sudo apt install nodejs npm)"
    } else {
        "Install Node.js from: https://nodejs.org/"
    }
}
