//! README generation from the analyzed repository
//!
//! Pure string templating over a `RepositoryContext`; no fetching.

use crate::repo::RepositoryContext;
use crate::util::group_digits;
use std::collections::BTreeSet;

/// Build a starter README for the repository.
pub fn generate_readme(ctx: &RepositoryContext) -> String {
    let meta = ctx.metadata();
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", meta.name));
    match meta.description.as_deref() {
        Some(description) => out.push_str(&format!("{}\n\n", description)),
        None => out.push_str("_No description provided._\n\n"),
    }
    out.push_str(&format!(
        "**Stars:** {} · **Forks:** {} · **License:** {}\n\n",
        group_digits(meta.star_count),
        group_digits(meta.fork_count),
        meta.license.as_deref().unwrap_or("N/A")
    ));

    out.push_str("## Languages\n\n");
    let breakdown = ctx.language_breakdown();
    if breakdown.is_empty() {
        out.push_str("_No language data available._\n");
    } else {
        for share in &breakdown {
            out.push_str(&format!("- {}: {:.1}%\n", share.name, share.percent));
        }
    }
    out.push('\n');

    out.push_str("## Project Structure\n\n```text\n");
    for entry in top_level_entries(ctx) {
        out.push_str(&entry);
        out.push('\n');
    }
    out.push_str("```\n\n");

    out.push_str("## Installation\n\n```bash\n");
    out.push_str(&format!(
        "git clone https://github.com/{}/{}.git\ncd {}\n",
        meta.owner.login, meta.name, meta.name
    ));
    if let Some(command) = install_command(ctx) {
        out.push_str(command);
        out.push('\n');
    }
    out.push_str("```\n\n");

    out.push_str("## License\n\n");
    match meta.license.as_deref() {
        Some(license) => out.push_str(&format!("This project is licensed under the {}.\n", license)),
        None => out.push_str("No license specified.\n"),
    }
    out
}

/// Top-level directories (with a trailing `/`) then files, each sorted
fn top_level_entries(ctx: &RepositoryContext) -> Vec<String> {
    let mut dirs = BTreeSet::new();
    let mut files = BTreeSet::new();
    for entry in ctx.files() {
        match entry.path.split_once('/') {
            Some((dir, _)) => {
                dirs.insert(format!("{}/", dir));
            }
            None => {
                files.insert(entry.path.clone());
            }
        }
    }
    dirs.into_iter().chain(files).collect()
}

fn install_command(ctx: &RepositoryContext) -> Option<&'static str> {
    let has = |name: &str| ctx.files().iter().any(|f| f.path == name);
    if has("package.json") {
        Some("npm install")
    } else if has("Cargo.toml") {
        Some("cargo build --release")
    } else {
        None
    }
}
