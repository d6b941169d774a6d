//! Output formatting for CLI
//!
//! Tables for people, JSON/YAML for scripts. Status lines go through the
//! `print_*` helpers so every command looks the same.

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        }
    }
}

/// Print data in the specified format (table, JSON, or YAML)
pub fn print_output<T: Tabled + Serialize>(data: Vec<T>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(data),
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Yaml => print_yaml(&data)?,
    }
    Ok(())
}

/// Print a single item as JSON or YAML
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Yaml => print_yaml(data),
        OutputFormat::Table | OutputFormat::Json => print_json(data),
    }
}

pub fn print_table<T: Tabled>(data: Vec<T>) {
    if data.is_empty() {
        println!("{}", "No results found".yellow());
        return;
    }

    let table = Table::new(data);
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

pub fn print_yaml<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    print!("{}", yaml);
    Ok(())
}

/// Print a success message with green checkmark
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a success message for resource creation
pub fn print_created(resource_type: &str, name: &str, location: &str) {
    println!(
        "{} {} '{}' created ({})",
        "✓".green().bold(),
        resource_type.green(),
        name.green().bold(),
        location.dimmed()
    );
}

/// Print a success message for resource deletion
pub fn print_deleted(resource_type: &str, name: &str) {
    println!(
        "{} {} '{}' deleted",
        "✓".green().bold(),
        resource_type.green(),
        name.green().bold()
    );
}

/// Print an error message with red X
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message with blue i
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message with yellow triangle
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_name() {
        assert_eq!(OutputFormat::from_name("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_name("YAML"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_name("yml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_name("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from_name("anything"), OutputFormat::Table);
    }
}
