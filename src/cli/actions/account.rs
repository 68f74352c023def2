use crate::auth::{utils::OTP_LENGTH, AuthContext, AuthErrorKind, GoTrueApi, SignUpOutcome};
use crate::cli::actions::{auth_failure, mount};
use crate::cli::globals::GlobalArgs;
use crate::guard::return_destination;
use crate::otp::{VerificationEntry, VerificationFlow};
use crate::routes::{NavigationState, Route};
use crate::session::Session;
use anyhow::{bail, Result};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Debug)]
pub enum Command {
    SignUp {
        email: String,
        password: SecretString,
        full_name: String,
    },
    Verify {
        email: Option<String>,
        code: Option<String>,
    },
    Resend {
        email: String,
    },
    Login {
        email: String,
        password: SecretString,
    },
    Google,
    Callback {
        code: String,
    },
    Logout,
    ResetPassword {
        email: String,
    },
    UpdatePassword {
        password: SecretString,
    },
    Refresh,
    Session,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute an account action.
/// # Errors
/// Returns an error carrying the user-facing message if the operation fails.
pub async fn execute(args: Args) -> Result<()> {
    let context = mount(&args.globals).await?;

    match args.command {
        Command::SignUp {
            email,
            password,
            full_name,
        } => sign_up(&context, &email, &password, &full_name).await,
        Command::Verify { email, code } => {
            let state = email.map(NavigationState::with_email).unwrap_or_default();
            verify(&context, &state, code.as_deref()).await
        }
        Command::Resend { email } => {
            context
                .resend_confirmation(&email)
                .await
                .map_err(auth_failure)?;
            println!("A new verification code has been sent to {email}");
            Ok(())
        }
        Command::Login { email, password } => {
            let session = context
                .sign_in(&email, password.expose_secret())
                .await
                .map_err(auth_failure)?;
            print_session(&session);
            println!("Continue at {}", return_destination(&NavigationState::default()));
            Ok(())
        }
        Command::Google => {
            let redirect = context.sign_in_with_google().map_err(auth_failure)?;
            println!("Open this URL to continue with Google:\n{}", redirect.url);
            println!("Then run `crmdash callback --code <code>` with the code from the redirect.");
            Ok(())
        }
        Command::Callback { code } => {
            let session = context.exchange_code(&code).await.map_err(auth_failure)?;
            print_session(&session);
            Ok(())
        }
        Command::Logout => {
            context.sign_out().await.map_err(auth_failure)?;
            println!("Signed out.");
            Ok(())
        }
        Command::ResetPassword { email } => {
            context.reset_password(&email).await.map_err(auth_failure)?;
            println!("Password reset link sent to {email}");
            Ok(())
        }
        Command::UpdatePassword { password } => {
            context
                .update_password(password.expose_secret())
                .await
                .map_err(auth_failure)?;
            println!("Password updated.");
            Ok(())
        }
        Command::Refresh => {
            let session = context.refresh_session().await.map_err(auth_failure)?;
            print_session(&session);
            Ok(())
        }
        Command::Session => {
            match context.store().session() {
                Some(session) => print_session(&session),
                None => println!("Not signed in."),
            }
            Ok(())
        }
    }
}

async fn sign_up(
    context: &AuthContext<GoTrueApi>,
    email: &str,
    password: &SecretString,
    full_name: &str,
) -> Result<()> {
    let outcome = context
        .sign_up(email, password.expose_secret(), full_name)
        .await
        .map_err(auth_failure)?;

    match outcome {
        SignUpOutcome::SignedIn(session) => {
            print_session(&session);
            println!("Continue at {}", Route::Dashboard);
        }
        SignUpOutcome::PendingVerification(pending) => {
            println!(
                "Account created. Check your email for a verification code, then run:\n  crmdash verify --email {}",
                pending.email
            );
        }
    }
    Ok(())
}

/// Types `code` into the six fields the way a user would, one digit per
/// field starting at the focused one. More than six digits leaves the fields
/// empty so the submit fails locally.
fn type_code(flow: &mut VerificationFlow, code: &str) {
    flow.input_mut().clear();
    let digits: Vec<char> = code.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > OTP_LENGTH {
        debug!(typed = digits.len(), "too many digits for the code fields");
        return;
    }
    for digit in digits {
        let index = flow.input().focus();
        flow.input_mut().input(index, &digit.to_string());
    }
}

async fn verify(
    context: &AuthContext<GoTrueApi>,
    state: &NavigationState,
    code: Option<&str>,
) -> Result<()> {
    let mut flow = match VerificationFlow::enter(state) {
        VerificationEntry::Ready(flow) => flow,
        VerificationEntry::Redirect(route) => {
            bail!("No email to verify. Sign up first ({route}) or pass --email.")
        }
    };

    if let Some(code) = code {
        type_code(&mut flow, code);
        let session = flow.submit(context).await.map_err(auth_failure)?;
        return verified(&session);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let left = flow.pending().cooldown_remaining(Utc::now());
        flow.cooldown_mut()
            .catch_up(u32::try_from(left).unwrap_or(u32::MAX));
        eprintln!(
            "Enter the 6-digit code sent to {} (empty line: {}):",
            flow.email(),
            flow.cooldown().label()
        );

        let Some(line) = lines.next_line().await? else {
            bail!("No code entered.");
        };

        if line.trim().is_empty() {
            if flow.resend(context, Utc::now()).await.is_ok() {
                if let Some(notice) = flow.notice() {
                    eprintln!("{notice}");
                }
            } else if let Some(error) = flow.error() {
                eprintln!("{error}");
            }
            continue;
        }

        type_code(&mut flow, &line);
        match flow.submit(context).await {
            Ok(session) => return verified(&session),
            Err(err) if retryable(err.kind) => {
                debug!(kind = err.kind.as_str(), "verification attempt rejected");
                if let Some(error) = flow.error() {
                    eprintln!("{error}");
                }
            }
            Err(err) => return Err(auth_failure(err)),
        }
    }
}

/// Failures the user can fix by typing another code.
const fn retryable(kind: AuthErrorKind) -> bool {
    matches!(
        kind,
        AuthErrorKind::Validation | AuthErrorKind::OtpInvalid | AuthErrorKind::OtpExpired
    )
}

fn verified(session: &Session) -> Result<()> {
    info!("email verified");
    print_session(session);
    println!("Continue at {}", Route::Dashboard);
    Ok(())
}

fn print_session(session: &Session) {
    let name = session
        .identity
        .full_name
        .as_deref()
        .unwrap_or(session.email());
    println!("Signed in as {name} <{}>", session.email());
    if !session.is_verified() {
        println!("Email not verified yet.");
    }
    println!("Session expires at {}", session.expires_at.to_rfc3339());
}
