//! Command bodies for the demo tree.
//!
//! Every handler has the same shape: typed values come from the
//! [`ParsedInvocation`], output goes through the [`CommandContext`]. Handlers
//! return errors instead of printing them; the dispatcher reports them and
//! picks the exit code.

use anyhow::{anyhow, Context};
use chrono::Local;
use cmdtree::styles::names;
use cmdtree::{
    CliError, CommandContext, OutputFormat, ParsedInvocation, RenderRequest, Result, ValueType,
};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;

const DEFAULT_ITEMS: &[&str] = &["item1", "item2", "item3"];

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn success(ctx: &mut CommandContext<'_>, message: &str) -> Result<()> {
    let line = ctx.styled(names::SUCCESS, &format!("✓ {}", message));
    ctx.println(line)
}

// =============================================================================
// Top-level commands
// =============================================================================

pub fn hello(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let count = inv.int("count")?;
    let (greeting, name) = if inv.flag("shout") {
        (
            inv.str("greeting")?.to_uppercase(),
            inv.str("name")?.to_uppercase(),
        )
    } else {
        (inv.str("greeting")?.to_string(), inv.str("name")?.to_string())
    };

    for i in 1..=count {
        ctx.println(format!("{}, {}!", greeting, name))?;
        if count > 1 {
            let progress = ctx.styled(names::MUTED, &format!("({}/{})", i, count));
            ctx.println(format!("  {}", progress))?;
        }
    }
    Ok(())
}

pub fn create_user(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let age = inv
        .opt_int("age")
        .map(|a| a.to_string())
        .unwrap_or_else(|| "Not provided".to_string());
    let active = if inv.flag("active") { "Yes" } else { "No" };

    ctx.println("Creating user...")?;
    let details = RenderRequest::pairs(
        [
            ("Username", inv.str("username")?.to_string()),
            ("Email", inv.opt_str("email").unwrap_or("Not provided").to_string()),
            ("Age", age),
            ("Active", active.to_string()),
            ("Created", timestamp()),
        ],
        OutputFormat::Table,
    )
    .with_title("User Information");
    ctx.render(&details)?;
    success(ctx, "User created successfully!")
}

pub fn deploy(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let env = inv.str("env")?;
    let settings = RenderRequest::pairs(
        [
            ("Environment", env.to_string()),
            ("Force", inv.flag("force").to_string()),
            ("Dry Run", inv.flag("dry_run").to_string()),
            ("Config", inv.opt_str("config").unwrap_or("Default").to_string()),
        ],
        OutputFormat::Table,
    )
    .with_title("Deployment Configuration");
    ctx.render(&settings)?;

    if inv.flag("dry_run") {
        ctx.println(format!("[DRY RUN] Would deploy to {}", env))
    } else {
        ctx.println(format!("Deploying to {}...", env))?;
        success(ctx, "Deployment completed successfully!")
    }
}

pub fn process_items(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let items: Vec<&str> = match inv.list("item") {
        [] => DEFAULT_ITEMS.to_vec(),
        given => given.iter().map(String::as_str).collect(),
    };
    let verbose = inv.flag("verbose");

    ctx.println(format!("Processing {} items...", items.len()))?;
    for (i, item) in items.iter().enumerate() {
        if verbose {
            let detail = ctx.styled(names::MUTED, &format!("Processing: {}", item));
            ctx.println(format!("  {}", detail))?;
        }
        ctx.println(format!("  [{}/{}] Completed: {}", i + 1, items.len(), item))?;
    }
    success(ctx, "All items processed!")
}

pub fn show_info(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let format = match inv.opt_str("format") {
        Some(name) => name.parse::<OutputFormat>()?,
        None => ctx.default_format(),
    };
    let info = RenderRequest::pairs(
        [
            ("Library", "cmdtree".to_string()),
            ("Version", env!("CARGO_PKG_VERSION").to_string()),
            ("Language", "Rust".to_string()),
            ("Timestamp", timestamp()),
        ],
        format,
    )
    .with_title("System Information");
    ctx.render(&info)
}

pub fn interactive(ctx: &mut CommandContext<'_>, _inv: &ParsedInvocation) -> Result<()> {
    let title = ctx.styled(names::TITLE, "Interactive Demo");
    ctx.println(title)?;

    let mut prompt = ctx.prompt();
    let name = prompt.prompt_text("What's your name?")?;
    let age = prompt.prompt_typed("What's your age?", ValueType::Integer)?;
    let _password = prompt.prompt_masked("Enter password")?;
    let proceed = prompt.prompt_confirm("Are you sure you want to continue?", false)?;

    if !proceed {
        ctx.println("Operation cancelled.")?;
        return Err(CliError::UserAbort);
    }
    ctx.println(format!("Hello {}! You are {} years old.", name, age))?;
    success(ctx, "Password confirmed")
}

pub fn validate_email(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let email = inv.str("email")?;
    if !looks_like_email(email) {
        return Err(anyhow!("invalid email address: {}", email).into());
    }
    success(ctx, &format!("Valid email: {}", email))
}

/// `local@domain.tld` with a purely alphabetic tld of at least two letters.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    local_ok && host_ok && tld_ok
}

pub fn dangerous(ctx: &mut CommandContext<'_>, _inv: &ParsedInvocation) -> Result<()> {
    ctx.println("Performing dangerous operation...")?;
    success(ctx, "Operation completed safely!")
}

// =============================================================================
// files
// =============================================================================

pub fn create_file(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let filename = inv.str("filename")?;
    let content = inv.str("content")?;
    fs::write(filename, content).with_context(|| format!("could not create {}", filename))?;
    success(ctx, &format!("File created: {}", filename))?;
    ctx.println(format!("Content: {}", content))
}

pub fn read_file(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let filename = inv.str("filename")?;
    let content =
        fs::read_to_string(filename).with_context(|| format!("could not read {}", filename))?;
    ctx.println(format!("File: {}", filename))?;
    ctx.println(format!("Content: {}", content))
}

pub fn append_to_file(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let filename = inv.str("filename")?;
    let content = inv.str("content")?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(filename)
        .with_context(|| format!("could not open {}", filename))?;
    write!(file, "\n{}", content).with_context(|| format!("could not append to {}", filename))?;
    success(ctx, &format!("Content appended to {}", filename))?;
    ctx.println(format!("Added: {}", content))
}

// =============================================================================
// calc
// =============================================================================

fn operands(inv: &ParsedInvocation) -> Result<(f64, f64)> {
    Ok((inv.float("a")?, inv.float("b")?))
}

pub fn add(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let (a, b) = operands(inv)?;
    ctx.println(format!("{} + {} = {}", a, b, a + b))
}

pub fn subtract(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let (a, b) = operands(inv)?;
    ctx.println(format!("{} - {} = {}", a, b, a - b))
}

pub fn multiply(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let (a, b) = operands(inv)?;
    ctx.println(format!("{} × {} = {}", a, b, a * b))
}

pub fn divide(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let (a, b) = operands(inv)?;
    if b == 0.0 {
        return Err(anyhow!("division by zero").into());
    }
    ctx.println(format!("{} ÷ {} = {}", a, b, a / b))
}

// =============================================================================
// text
// =============================================================================

fn transform(
    ctx: &mut CommandContext<'_>,
    inv: &ParsedInvocation,
    label: &str,
    f: impl Fn(&str) -> String,
) -> Result<()> {
    let text = inv.str("text")?;
    ctx.println(format!("Original: {}", text))?;
    ctx.println(format!("{}: {}", label, f(text)))
}

pub fn upper(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    transform(ctx, inv, "Upper", str::to_uppercase)
}

pub fn lower(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    transform(ctx, inv, "Lower", str::to_lowercase)
}

pub fn reverse(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    transform(ctx, inv, "Reversed", |t| t.chars().rev().collect())
}

pub fn count_words(ctx: &mut CommandContext<'_>, inv: &ParsedInvocation) -> Result<()> {
    let text = inv.str("text")?;
    ctx.println(format!("Text: {}", text))?;
    ctx.println(format!("Word count: {}", text.split_whitespace().count()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("user@example.com"));
        assert!(looks_like_email("first.last+tag@mail.example.org"));
        assert!(!looks_like_email("user@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("user@example.c0m"));
        assert!(!looks_like_email("not an email"));
    }
}
