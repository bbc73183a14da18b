//! Response handlers, one per intent
//!
//! Every handler resolves to a displayable `Reply`. Lookup misses, fetch
//! failures and unreadable manifests are turned into text here and never
//! escape to the conversation driver.

use super::intent::{Intent, IntentMatch};
use super::{Reply, ViewFileAction};
use crate::locator;
use crate::manifest::{self, Dependency, MANIFEST_FILES};
use crate::repo::{FileEntry, RepositoryContext};
use crate::session::Session;
use regex::Regex;
use tracing::{debug, warn};

/// Lines shown when explaining a declaration, starting at the declaration
pub const SNIPPET_LINES: usize = 15;

/// Extensions searched by `explain_code`
const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx"];

/// Run the handler for a classified message.
pub async fn handle(session: &Session, matched: &IntentMatch, message: &str) -> Reply {
    let ctx = session.context();
    let argument = matched.argument.as_deref().unwrap_or_default();
    match matched.intent {
        Intent::Greet => greet(ctx),
        Intent::About => about(ctx),
        Intent::FindFile => find_file(ctx, argument),
        Intent::ListDependencies => list_dependencies(session).await,
        Intent::ExplainCode => explain_code(session, argument).await,
        Intent::GetMetadata => get_metadata(ctx, message),
        Intent::Help => help(),
    }
}

fn greet(ctx: &RepositoryContext) -> Reply {
    Reply::text(format!(
        "Hello! I'm ready to answer questions about **{}**. Type `help` to see what I can do.",
        ctx.metadata().name
    ))
}

fn about(ctx: &RepositoryContext) -> Reply {
    let meta = ctx.metadata();
    let description = meta
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("No description provided.");
    Reply::text(format!("**{}**: {}", meta.name, description))
}

fn find_file(ctx: &RepositoryContext, name: &str) -> Reply {
    match locator::find(ctx.files(), name) {
        Some(entry) => Reply::text(format!("Found it: `{}`", entry.path))
            .with_action(ViewFileAction::for_entry(entry)),
        None => Reply::text(format!(
            "I couldn't find a file named `{}` in this repository.",
            name
        )),
    }
}

async fn list_dependencies(session: &Session) -> Reply {
    let ctx = session.context();
    let found = MANIFEST_FILES
        .iter()
        .find_map(|(name, kind)| locator::find(ctx.files(), name).map(|entry| (entry, *kind)));
    let Some((entry, kind)) = found else {
        return Reply::text(
            "I couldn't find a dependency manifest (`package.json` or `Cargo.toml`) in this repository.",
        );
    };

    let body = match session.cache().get(&entry.locator).await {
        Ok(body) => body,
        Err(err) => {
            warn!(path = %entry.path, error = %err, "failed to fetch manifest");
            return Reply::text(format!(
                "I had trouble fetching `{}`. Please try again.",
                entry.path
            ));
        }
    };

    match manifest::parse(kind, &body) {
        Ok(deps) if deps.is_empty() => Reply::text(format!(
            "`{}` doesn't declare any dependencies.",
            entry.path
        )),
        Ok(deps) => Reply::text(format_dependencies(&entry.path, &deps)),
        Err(err) => {
            debug!(path = %entry.path, error = %err, "manifest unreadable");
            Reply::text(format!(
                "I found `{}` but couldn't read it as a valid manifest.",
                entry.path
            ))
        }
    }
}

fn format_dependencies(path: &str, deps: &[Dependency]) -> String {
    let mut out = format!("**Dependencies** in `{}` ({}):\n", path, deps.len());
    for dep in deps {
        out.push_str(&format!("\n- `{}`: {}", dep.name, dep.version));
    }
    out
}

async fn explain_code(session: &Session, name: &str) -> Reply {
    let not_found = || {
        Reply::text(format!(
            "I couldn't find a function named `{}` in the JavaScript/TypeScript files of this repository.",
            name
        ))
    };
    let Some(declaration) = declaration_pattern(name) else {
        return not_found();
    };

    let scripts = session.context().files().iter().filter(|f| is_script(f));
    for entry in scripts {
        let body = match session.cache().get(&entry.locator).await {
            Ok(body) => body,
            Err(err) => {
                warn!(path = %entry.path, error = %err, "failed to fetch script");
                return Reply::text(format!(
                    "I had trouble reading `{}` while looking for `{}`. Please try again.",
                    entry.path, name
                ));
            }
        };

        let lines: Vec<&str> = body.lines().collect();
        if let Some(start) = lines.iter().position(|line| declaration.is_match(line)) {
            debug!(path = %entry.path, line = start + 1, "declaration found");
            let end = (start + SNIPPET_LINES).min(lines.len());
            let snippet = lines[start..end].join("\n");
            return Reply::text(format!(
                "Here's `{}` from `{}` (line {}):\n\n```{}\n{}\n```",
                name,
                entry.path,
                start + 1,
                fence_language(entry),
                snippet
            ))
            .with_action(ViewFileAction::for_entry(entry));
        }
    }

    not_found()
}

/// `function name(`, or `const|let name = (...) =>` / `name = arg =>`
fn declaration_pattern(name: &str) -> Option<Regex> {
    let name = regex::escape(name);
    Regex::new(&format!(
        r"\bfunction\b\s*\*?\s*{name}\s*\(|\b(?:const|let)\s+{name}\s*=\s*(?:async\s*)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
        name = name
    ))
    .ok()
}

fn is_script(entry: &FileEntry) -> bool {
    entry
        .extension()
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext.as_str()))
}

fn fence_language(entry: &FileEntry) -> &'static str {
    match entry.extension().as_deref() {
        Some("ts") | Some("tsx") => "typescript",
        _ => "javascript",
    }
}

fn get_metadata(ctx: &RepositoryContext, message: &str) -> Reply {
    let meta = ctx.metadata();
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |keyword: &str| words.contains(&keyword);

    let text = if has("owner") || has("author") {
        format!(
            "**{}** is owned by **{}** ({}).",
            meta.name, meta.owner.login, meta.owner.profile_url
        )
    } else if has("stars") {
        format!("**{}** has {} stars.", meta.name, meta.star_count)
    } else if has("forks") {
        format!("**{}** has {} forks.", meta.name, meta.fork_count)
    } else {
        format!(
            "**{}** license: {}",
            meta.name,
            meta.license.as_deref().unwrap_or("N/A")
        )
    };
    Reply::text(text)
}

fn help() -> Reply {
    Reply::text(
        "Here's what I can do:\n\n\
         - **About**: \"what is this?\", \"describe\"\n\
         - **Find files**: \"find package.json\", \"where is README.md\"\n\
         - **Dependencies**: \"what are the dependencies?\"\n\
         - **Explain code**: \"explain the `init` function\"\n\
         - **Repository info**: \"who is the owner?\", \"stars\", \"forks\", \"license\"",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_pattern_function_keyword() {
        let re = declaration_pattern("foo").unwrap();
        assert!(re.is_match("function foo(a, b) {"));
        assert!(re.is_match("export async function foo() {"));
        assert!(re.is_match("function* foo() {"));
        assert!(!re.is_match("function foobar() {"));
        assert!(!re.is_match("foo();"));
    }

    #[test]
    fn test_declaration_pattern_arrow_assignment() {
        let re = declaration_pattern("foo").unwrap();
        assert!(re.is_match("const foo = () => 1;"));
        assert!(re.is_match("let foo = async (x, y) => {"));
        assert!(re.is_match("const foo = x => x * 2;"));
        assert!(!re.is_match("const foo = 42;"));
        assert!(!re.is_match("var foo = () => 1;"));
    }

    #[test]
    fn test_declaration_pattern_escapes_name() {
        let re = declaration_pattern("$init").unwrap();
        assert!(re.is_match("const $init = () => {}"));
        assert!(!re.is_match("const xinit = () => {}"));
    }

    #[test]
    fn test_is_script() {
        assert!(is_script(&FileEntry::new("src/app.js", "x")));
        assert!(is_script(&FileEntry::new("src/App.TSX", "x")));
        assert!(!is_script(&FileEntry::new("src/lib.rs", "x")));
        assert!(!is_script(&FileEntry::new("package.json", "x")));
    }
}
