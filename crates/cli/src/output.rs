//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use testdeck_common::{Feature, GeneratedInstructions, Project};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for Project {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "DESCRIPTION"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), self.description.clone()]
    }
}

impl TableDisplay for Feature {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "DESCRIPTION", "PROJECT"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.description.clone(),
            self.project.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
        ]
    }
}

/// Stored detail of a feature together with its resolved image URL
#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub strategy: String,
}

impl TableDisplay for DetailView {
    fn headers() -> Vec<&'static str> {
        vec!["IMAGE", "STRATEGY"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.image_url.clone().unwrap_or_else(|| "-".to_string()),
            self.strategy.clone(),
        ]
    }
}

fn table<T: TableDisplay>(items: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table
}

fn plain<T: TableDisplay>(item: &T) -> String {
    T::headers()
        .iter()
        .zip(item.row())
        .map(|(header, value)| format!("{}: {}\n", header, value))
        .collect()
}

/// Render a single item
pub fn render_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => table(std::slice::from_ref(item)).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(item).unwrap_or_default(),
        OutputFormat::Plain => plain(item),
    }
}

/// Render a list of items
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> String {
    if items.is_empty() && format != OutputFormat::Json {
        return "No items found.".to_string();
    }

    match format {
        OutputFormat::Table => table(items).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(items).unwrap_or_default(),
        OutputFormat::Plain => items.iter().map(plain).collect::<Vec<_>>().join("---\n"),
    }
}

/// Render instructions as one card per feature, or as JSON
pub fn render_instructions(instructions: &GeneratedInstructions, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(instructions).unwrap_or_default(),
        OutputFormat::Plain => instructions
            .cards()
            .map(|card| card.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Table => {
            let mut out = String::new();
            for (i, feature) in instructions.features.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(&format!("{}\n", feature.description.bold()));
                out.push_str(&format!("{} {}\n", "Pre-conditions:".italic(), feature.pre_conditions));
                out.push_str(&format!("{}\n", numbered("STEPS", &feature.steps)));
                out.push_str(&format!("{}\n", numbered("EXPECTED RESULTS", &feature.expected_results)));
            }
            out
        }
    }
}

/// One-column table numbering its entries from 1
fn numbered(header: &str, entries: &[String]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", header]);
    for (n, entry) in entries.iter().enumerate() {
        table.add_row(vec![(n + 1).to_string(), entry.clone()]);
    }
    table
}

pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    println!("{}", render_item(item, format));
}

pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    println!("{}", render_list(items, format));
}

pub fn print_instructions(instructions: &GeneratedInstructions, format: OutputFormat) {
    println!("{}", render_instructions(instructions, format));
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{}  {}", "⚠️".yellow(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use testdeck_common::{InstructionFeature, ProjectId};

    fn projects() -> Vec<Project> {
        vec![
            Project { id: ProjectId(1), name: "Shop".into(), description: "Storefront".into() },
            Project { id: ProjectId(2), name: "Blog".into(), description: String::new() },
        ]
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(render_list::<Project>(&[], OutputFormat::Table), "No items found.");
        assert_eq!(render_list::<Project>(&[], OutputFormat::Json), "[]");
    }

    #[test]
    fn test_plain_list() {
        let out = render_list(&projects(), OutputFormat::Plain);
        assert_eq!(
            out,
            "ID: 1\nNAME: Shop\nDESCRIPTION: Storefront\n---\nID: 2\nNAME: Blog\nDESCRIPTION: \n"
        );
    }

    #[test]
    fn test_table_contains_rows() {
        let out = render_list(&projects(), OutputFormat::Table);
        assert!(out.contains("Shop"));
        assert!(out.contains("Storefront"));
        assert!(out.contains("DESCRIPTION"));
    }

    #[test]
    fn test_instructions_plain_cards() {
        let instructions = GeneratedInstructions {
            features: vec![
                InstructionFeature { description: "First".into(), ..Default::default() },
                InstructionFeature { description: "Second".into(), ..Default::default() },
            ],
        };
        let out = render_instructions(&instructions, OutputFormat::Plain);
        let first = out.find("## First").unwrap();
        let second = out.find("## Second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_instructions_table_lists_are_independent() {
        colored::control::set_override(false);
        let instructions = GeneratedInstructions {
            features: vec![InstructionFeature {
                description: "Checkout".into(),
                pre_conditions: "Cart holds one item".into(),
                steps: vec!["Open cart".into(), "Press pay".into(), "Confirm".into()],
                expected_results: vec!["Order confirmed".into()],
            }],
        };
        let out = render_instructions(&instructions, OutputFormat::Table);

        assert!(out.contains("Pre-conditions: Cart holds one item"));
        let steps = out.find("STEPS").unwrap();
        let results = out.find("EXPECTED RESULTS").unwrap();
        let confirmed = out.find("Order confirmed").unwrap();
        assert!(steps < results);
        assert!(out.find("Confirm ").unwrap() < results);
        assert!(results < confirmed);
        assert!(!out.lines().any(|line| line.contains("Open cart") && line.contains("Order confirmed")));
    }

    #[test]
    fn test_detail_view_defaults() {
        let view = DetailView { image: None, image_url: None, strategy: String::new() };
        assert_eq!(view.row(), vec!["-".to_string(), String::new()]);
    }
}
