//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::SecretBundle;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a bundle's variables as a two-column table.
pub fn print_bundle_table(bundle: &SecretBundle) {
    if bundle.is_empty() {
        info(&format!("'{}' has no variables.", bundle.app));
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Value"]);

    for (key, value) in &bundle.vars {
        table.add_row(vec![key.as_str(), value.as_str()]);
    }

    println!("{table}");
}

/// Print one name per line, or `empty_msg` if there are none.
pub fn print_names(names: &[String], empty_msg: &str) {
    if names.is_empty() {
        info(empty_msg);
        return;
    }
    for name in names {
        println!("{name}");
    }
}
