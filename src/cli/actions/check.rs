use crate::config::Config;
use anyhow::Result;
use std::fmt::Write;

#[derive(Debug)]
pub struct Args {
    pub config: Config,
}

/// Print the validated configuration. Reaching this point means validation passed.
/// # Errors
/// Never fails once the configuration has loaded.
pub fn execute(args: &Args) -> Result<()> {
    println!("{}", render(&args.config));
    Ok(())
}

fn render(config: &Config) -> String {
    let entries = config.summary();
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    let mut out = String::from("Environment OK");
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ = write!(out, "\n  {key}:{padding} {value}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn render_aligns_and_redacts() {
        let out = render(&test_config());
        assert!(out.starts_with("Environment OK\n"));
        assert!(out.contains("  app_url:"));
        assert!(out.contains("https://fineprint.test"));
        assert!(!out.contains("sk_test"));
    }
}
