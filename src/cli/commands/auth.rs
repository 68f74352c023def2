//! Account subcommands: everything the sign-up, sign-in, verification and
//! password pages can do.

use clap::{Arg, Command};

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_NAME: &str = "name";
pub const ARG_CODE: &str = "code";

fn email(required: bool) -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Account email address")
        .required(required)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long("password")
        .help("Account password")
        .env("CRMDASH_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn subcommands() -> Vec<Command> {
    vec![
        Command::new("signup")
            .about("Create an account; a 6-digit code is emailed for verification")
            .arg(email(true))
            .arg(password())
            .arg(
                Arg::new(ARG_NAME)
                    .short('n')
                    .long("name")
                    .help("Full name")
                    .required(true),
            ),
        Command::new("verify")
            .about("Confirm a sign-up with the emailed 6-digit code")
            .long_about(
                "Confirm a sign-up with the emailed 6-digit code. Without --code the code is read \
                 from stdin; an empty line requests a new code.",
            )
            .arg(email(false))
            .arg(
                Arg::new(ARG_CODE)
                    .short('c')
                    .long("code")
                    .help("The 6-digit code"),
            ),
        Command::new("resend")
            .about("Send a new verification code")
            .arg(email(true)),
        Command::new("login")
            .about("Sign in with email and password")
            .arg(email(true))
            .arg(password()),
        Command::new("google").about("Print the Google sign-in URL"),
        Command::new("callback")
            .about("Complete a Google sign-in with the code from the redirect")
            .arg(
                Arg::new(ARG_CODE)
                    .short('c')
                    .long("code")
                    .help("Authorization code from the callback URL")
                    .required(true),
            ),
        Command::new("logout").about("Sign out and forget the stored session"),
        Command::new("reset-password")
            .about("Email a password reset link")
            .arg(email(true)),
        Command::new("update-password")
            .about("Set a new password for the signed-in account")
            .arg(password()),
        Command::new("refresh").about("Refresh the stored session"),
        Command::new("session").about("Show the stored session"),
    ]
}
