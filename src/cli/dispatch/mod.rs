//! Maps validated CLI arguments to an [`Action`], resolving the shared
//! configuration into [`GlobalArgs`] on the way.

use crate::api::Segment;
use crate::campaign::CampaignRequest;
use crate::cli::actions::{account, campaign, open, report, upload, Action};
use crate::cli::commands::{
    self,
    auth::{ARG_CODE, ARG_EMAIL, ARG_NAME, ARG_PASSWORD},
    data,
};
use crate::cli::globals::{GlobalArgs, PLACEHOLDER_ANON_KEY, PLACEHOLDER_AUTH_URL};
use crate::routes::Location;
use anyhow::{Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::warn;

/// Resolve the shared configuration. A missing auth URL or key falls back to
/// a placeholder with a warning, so offline commands still run.
///
/// # Errors
/// Returns an error if an argument with a default is missing.
pub fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let api_url = string(matches, commands::ARG_API_URL)?;
    let site_url = string(matches, commands::ARG_SITE_URL)?;
    let session_file = matches
        .get_one::<PathBuf>(commands::ARG_SESSION_FILE)
        .cloned()
        .context("missing required argument: --session-file")?;

    let mut globals = GlobalArgs::new(api_url, site_url, session_file);

    let auth_url = match matches.get_one::<String>(commands::ARG_AUTH_URL) {
        Some(url) => url.clone(),
        None => {
            placeholder_notice("CRMDASH_AUTH_URL", "--auth-url");
            PLACEHOLDER_AUTH_URL.to_string()
        }
    };
    let anon_key = match matches.get_one::<String>(commands::ARG_ANON_KEY) {
        Some(key) => key.clone(),
        None => {
            placeholder_notice("CRMDASH_AUTH_ANON_KEY", "--anon-key");
            PLACEHOLDER_ANON_KEY.to_string()
        }
    };
    globals.set_auth(auth_url, SecretString::from(anon_key));

    Ok(globals)
}

fn placeholder_hint(var: &str, flag: &str) -> String {
    format!("warning: {var} is not set (or pass {flag}); using a placeholder, sign-in will fail")
}

/// Logged, and also printed since the default log level hides warnings.
fn placeholder_notice(var: &str, flag: &str) {
    warn!(variable = var, "auth setting missing, using a placeholder");
    eprintln!("{}", placeholder_hint(var, flag));
}

fn string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    string(matches, id).map(SecretString::from)
}

fn account(matches: &ArgMatches, name: &str) -> Result<account::Command> {
    let email = || string(matches, ARG_EMAIL);

    Ok(match name {
        "signup" => account::Command::SignUp {
            email: email()?,
            password: secret(matches, ARG_PASSWORD)?,
            full_name: string(matches, ARG_NAME)?,
        },
        "verify" => account::Command::Verify {
            email: matches.get_one::<String>(ARG_EMAIL).cloned(),
            code: matches.get_one::<String>(ARG_CODE).cloned(),
        },
        "resend" => account::Command::Resend { email: email()? },
        "login" => account::Command::Login {
            email: email()?,
            password: secret(matches, ARG_PASSWORD)?,
        },
        "google" => account::Command::Google,
        "callback" => account::Command::Callback {
            code: string(matches, ARG_CODE)?,
        },
        "logout" => account::Command::Logout,
        "reset-password" => account::Command::ResetPassword { email: email()? },
        "update-password" => account::Command::UpdatePassword {
            password: secret(matches, ARG_PASSWORD)?,
        },
        "refresh" => account::Command::Refresh,
        "session" => account::Command::Session,
        other => anyhow::bail!("unknown subcommand: {other}"),
    })
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the subcommand is
/// unknown.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;
    let (name, sub) = matches.subcommand().context("missing subcommand")?;

    let file = || {
        sub.get_one::<PathBuf>(data::ARG_FILE)
            .cloned()
            .context("missing required argument: <file>")
    };

    let action = match name {
        "open" => Action::Open(open::Args {
            globals,
            location: Location::parse(&string(sub, data::ARG_PATH)?),
            recheck: sub.get_flag(data::ARG_RECHECK),
        }),
        "validate" | "upload" => Action::Upload(upload::Args {
            globals,
            file: file()?,
            save: name == "upload",
        }),
        "dashboard" => Action::Report(report::Args {
            globals,
            command: report::Command::Dashboard,
        }),
        "history" => Action::Report(report::Args {
            globals,
            command: report::Command::History,
        }),
        "campaigns" => Action::Report(report::Args {
            globals,
            command: report::Command::Campaigns {
                id: sub.get_one::<String>(data::ARG_ID).cloned(),
                limit: sub.get_one::<u32>(data::ARG_LIMIT).copied().unwrap_or(10),
            },
        }),
        "products" => Action::Report(report::Args {
            globals,
            command: report::Command::Products {
                segment: sub
                    .get_one::<Segment>(data::ARG_SEGMENT)
                    .copied()
                    .context("missing required argument: --segment")?,
            },
        }),
        "campaign" => Action::Campaign(campaign::Args {
            globals,
            request: CampaignRequest {
                campaign_name: string(sub, data::ARG_NAME)?,
                segment: sub.get_one::<Segment>(data::ARG_SEGMENT).copied(),
                product_name: sub.get_one::<String>(data::ARG_PRODUCT).cloned(),
            },
        }),
        other => Action::Account(account::Args {
            globals,
            command: account(sub, other)?,
        }),
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn clean_env(run: impl FnOnce()) {
        temp_env::with_vars(
            [
                ("CRMDASH_AUTH_URL", None::<&str>),
                ("CRMDASH_AUTH_ANON_KEY", None),
                ("CRMDASH_API_URL", None),
                ("CRMDASH_SITE_URL", None),
                ("CRMDASH_SESSION_FILE", None),
                ("CRMDASH_PASSWORD", None),
            ],
            run,
        );
    }

    fn action(args: &[&str]) -> Result<Action> {
        let matches = commands::new().try_get_matches_from(args)?;
        handler(&matches)
    }

    #[test]
    fn missing_auth_config_uses_placeholders() {
        clean_env(|| {
            let matches = commands::new().get_matches_from(vec!["crmdash", "session"]);
            let globals = globals(&matches);
            assert!(globals.is_ok());
            if let Ok(globals) = globals {
                assert_eq!(globals.auth_url, PLACEHOLDER_AUTH_URL);
                assert_eq!(globals.anon_key.expose_secret(), PLACEHOLDER_ANON_KEY);
                assert!(globals.uses_placeholder());
            }
        });
    }

    #[test]
    fn placeholder_hint_names_variable_and_flag() {
        let hint = placeholder_hint("CRMDASH_AUTH_URL", "--auth-url");
        assert!(hint.starts_with("warning: CRMDASH_AUTH_URL is not set"));
        assert!(hint.contains("--auth-url"));
    }

    #[test]
    fn history_is_a_report() {
        clean_env(|| {
            let Ok(Action::Report(args)) = action(&["crmdash", "history"]) else {
                panic!("expected a report action");
            };
            assert!(matches!(args.command, report::Command::History));
        });
    }

    #[test]
    fn auth_config_from_env() {
        clean_env(|| {
            temp_env::with_vars(
                [
                    ("CRMDASH_AUTH_URL", Some("https://abc.supabase.co")),
                    ("CRMDASH_AUTH_ANON_KEY", Some("anon")),
                ],
                || {
                    let matches = commands::new().get_matches_from(vec!["crmdash", "logout"]);
                    let globals = globals(&matches);
                    assert!(globals.is_ok_and(|globals| {
                        globals.auth_url == "https://abc.supabase.co"
                            && globals.anon_key.expose_secret() == "anon"
                    }));
                },
            );
        });
    }

    #[test]
    fn signup_maps_to_account_action() {
        clean_env(|| {
            let action = action(&[
                "crmdash", "signup", "-e", "ana@example.com", "-p", "secret", "-n", "Ana",
            ]);
            let Ok(Action::Account(args)) = action else {
                panic!("expected an account action");
            };
            let account::Command::SignUp {
                email,
                password,
                full_name,
            } = args.command
            else {
                panic!("expected sign-up");
            };
            assert_eq!(email, "ana@example.com");
            assert_eq!(password.expose_secret(), "secret");
            assert_eq!(full_name, "Ana");
        });
    }

    #[test]
    fn validate_and_upload_share_an_action() {
        clean_env(|| {
            let Ok(Action::Upload(validate)) = action(&["crmdash", "validate", "customers.csv"])
            else {
                panic!("expected an upload action");
            };
            assert!(!validate.save);

            let Ok(Action::Upload(upload)) = action(&["crmdash", "upload", "customers.csv"]) else {
                panic!("expected an upload action");
            };
            assert!(upload.save);
            assert_eq!(upload.file, PathBuf::from("customers.csv"));
        });
    }

    #[test]
    fn campaign_form_is_passed_through_unvalidated() {
        clean_env(|| {
            let Ok(Action::Campaign(args)) = action(&["crmdash", "campaign", "--product", "Gold"])
            else {
                panic!("expected a campaign action");
            };
            assert_eq!(args.request.segment, None);
            assert_eq!(args.request.product_name.as_deref(), Some("Gold"));
            assert_eq!(args.request.campaign_name, "");
        });
    }

    #[test]
    fn open_parses_location() {
        clean_env(|| {
            let Ok(Action::Open(args)) = action(&["crmdash", "open", "pages/history?page=2"]) else {
                panic!("expected an open action");
            };
            assert_eq!(args.location, Location::parse("/pages/history?page=2"));
            assert!(!args.recheck);
        });
    }
}
