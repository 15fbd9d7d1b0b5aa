use crate::{
    cli::{
        actions::{check, server, Action},
        commands::{ARG_ENV_FILE, ARG_PORT, CMD_CHECK},
    },
    config::Config,
};
use anyhow::{Context, Result};
use std::path::Path;

/// Dotenv files tried, in order, when no `--env-file` is given.
pub const DEFAULT_ENV_FILES: [&str; 2] = [".env.local", ".env"];

/// Load dotenv variables. Variables already present in the process are never overridden.
///
/// # Errors
/// Returns an error if an explicit env file is missing or malformed.
pub fn load_env_files(env_file: Option<&str>) -> Result<()> {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path))
            .with_context(|| format!("Failed to load env file: {path}"))?;
        return Ok(());
    }

    for path in DEFAULT_ENV_FILES {
        // best-effort, a missing local file is normal
        let _ = dotenvy::from_filename(path);
    }

    Ok(())
}

/// # Errors
/// Returns an error if an env file cannot be loaded or the environment is invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    load_env_files(matches.get_one::<String>(ARG_ENV_FILE).map(String::as_str))?;

    let config = Config::load()?;

    if matches.subcommand_name() == Some(CMD_CHECK) {
        return Ok(Action::Check(check::Args { config }));
    }

    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(3000);

    Ok(Action::Server(server::Args { port, config }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use crate::config::env::EnvError;
    use std::io::Write;

    const VARS: [(&str, Option<&str>); 12] = [
        ("NEXT_PUBLIC_APP_URL", Some("https://fineprint.test")),
        ("OPENAI_API_KEY", Some("sk-test-openai")),
        ("NEXT_PUBLIC_SUPABASE_URL", Some("https://db.supabase.test")),
        ("NEXT_PUBLIC_SUPABASE_ANON_KEY", Some("anon-key")),
        ("SUPABASE_SERVICE_ROLE_KEY", Some("service-role-key")),
        (
            "NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY",
            Some("pk_test_Y2xlcmsuZmluZXByaW50LnRlc3Qk"),
        ),
        ("CLERK_SECRET_KEY", Some("sk_test_clerk")),
        ("STRIPE_SECRET_KEY", Some("sk_test_stripe")),
        ("NEXT_PUBLIC_STRIPE_PUBLISHABLE_KEY", Some("pk_test_stripe")),
        ("NEXTAUTH_SECRET", Some("0123456789abcdef0123456789abcdef")),
        ("ENCRYPTION_KEY", Some("fedcba9876543210fedcba9876543210")),
        ("JWT_SECRET", Some("jwt-secret")),
    ];

    #[test]
    fn server_action_by_default() {
        temp_env::with_vars(VARS, || {
            let matches = commands::new().get_matches_from(vec!["fineprint", "-p", "8081"]);
            let action = handler(&matches).expect("action");
            match action {
                Action::Server(args) => {
                    assert_eq!(args.port, 8081);
                    assert_eq!(args.config.app.url, "https://fineprint.test");
                }
                Action::Check(_) => panic!("expected server action"),
            }
        });
    }

    #[test]
    fn check_subcommand_dispatches_check() {
        temp_env::with_vars(VARS, || {
            let matches = commands::new().get_matches_from(vec!["fineprint", "check"]);
            let action = handler(&matches).expect("action");
            assert!(matches!(action, Action::Check(_)));
        });
    }

    #[test]
    fn invalid_environment_is_reported() {
        temp_env::with_vars(
            [
                ("NEXT_PUBLIC_APP_URL", Some("not a url")),
                ("OPENAI_API_KEY", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["fineprint", "check"]);
                let err = handler(&matches).expect_err("invalid env");
                let env_err = err.downcast_ref::<EnvError>().expect("env error");
                assert!(env_err.contains("NEXT_PUBLIC_APP_URL"));
                assert!(env_err.contains("OPENAI_API_KEY"));
            },
        );
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let err = load_env_files(Some("/nonexistent/fineprint.env")).expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/fineprint.env"));
    }

    #[test]
    fn env_file_does_not_override_process() {
        let path = std::env::temp_dir().join(format!("fineprint-{}.env", ulid::Ulid::new()));
        let mut file = std::fs::File::create(&path).expect("create env file");
        writeln!(file, "FINEPRINT_TEST_FROM_FILE=file").expect("write");
        writeln!(file, "FINEPRINT_TEST_PRESET=file").expect("write");
        drop(file);

        temp_env::with_vars(
            [
                ("FINEPRINT_TEST_FROM_FILE", None),
                ("FINEPRINT_TEST_PRESET", Some("process")),
            ],
            || {
                load_env_files(path.to_str()).expect("load");
                assert_eq!(
                    std::env::var("FINEPRINT_TEST_FROM_FILE").ok().as_deref(),
                    Some("file")
                );
                assert_eq!(
                    std::env::var("FINEPRINT_TEST_PRESET").ok().as_deref(),
                    Some("process")
                );
            },
        );

        let _ = std::fs::remove_file(path);
    }
}
