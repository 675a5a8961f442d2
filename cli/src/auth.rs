//! Interactive sign-in / sign-up driven by the auth wizard.

use studio_client::state::username::UsernameVerdict;
use studio_client::state::wizard::{Step, Wizard, WizardError};

use crate::CliError;
use crate::prompt::{self, Input};

/// Run the wizard until the user is signed in or quits.
pub async fn run(mut wizard: Wizard) -> Result<(), CliError> {
    loop {
        let outcome = match wizard.step() {
            Step::Done => break,
            Step::Email => email_step(&mut wizard).await?,
            Step::Login => login_step(&mut wizard).await?,
            Step::Signup => signup_step(&mut wizard).await?,
            Step::Verification => verification_step(&mut wizard).await?,
        };
        let Some(outcome) = outcome else {
            return Err(CliError::Cancelled);
        };
        report(&wizard, outcome)?;
    }
    Ok(())
}

/// Print the wizard's notice or error; illegal transitions are bugs here.
fn report(wizard: &Wizard, outcome: Result<Step, WizardError>) -> Result<(), CliError> {
    let state = wizard.state();
    match outcome {
        Ok(_) => {
            if let Some(notice) = state.notice {
                println!("{notice}");
            }
            Ok(())
        }
        Err(WizardError::Client(e)) => {
            eprintln!("{}", state.error.unwrap_or_else(|| e.user_message()));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

type StepOutcome = Option<Result<Step, WizardError>>;

async fn email_step(wizard: &mut Wizard) -> Result<StepOutcome, CliError> {
    match prompt::ask("email").await? {
        Input::Value(email) => {
            wizard.set_email(&email);
            Ok(Some(wizard.submit_email().await))
        }
        Input::Quit => Ok(None),
        _ => {
            eprintln!("enter an email address, or :quit");
            Ok(Some(Ok(wizard.step())))
        }
    }
}

async fn login_step(wizard: &mut Wizard) -> Result<StepOutcome, CliError> {
    let outcome = match prompt::ask("password (:code for an emailed code, :forgot, :back)").await? {
        Input::Value(password) => {
            wizard.set_password(&password);
            wizard.submit_password().await
        }
        Input::Code => wizard.request_login_code().await,
        Input::Forgot => wizard.forgot_password().await,
        Input::Back => wizard.back(),
        Input::Resend => {
            eprintln!(":resend only applies to a code");
            Ok(wizard.step())
        }
        Input::Quit => return Ok(None),
    };
    Ok(Some(outcome))
}

async fn signup_step(wizard: &mut Wizard) -> Result<StepOutcome, CliError> {
    println!("No account for {} yet. Let's create one (:back to change email).", wizard.state().email);
    loop {
        match prompt::ask("username").await? {
            Input::Value(username) => wizard.set_username(&username),
            Input::Back => return Ok(Some(wizard.back())),
            Input::Quit => return Ok(None),
            _ => continue,
        }
        match wizard.username_checker().settled().await {
            UsernameVerdict::Available { username } => {
                println!("{username} is available");
                break;
            }
            UsernameVerdict::Taken { username } => eprintln!("{username} is already taken"),
            UsernameVerdict::Invalid(e) => eprintln!("{e}"),
            UsernameVerdict::Failed { message, .. } => eprintln!("{message}"),
            other => eprintln!("username check did not finish: {other:?}"),
        }
    }
    wizard.set_full_name(&prompt::ask_value("full name").await?);
    wizard.set_dob(&prompt::ask_value("date of birth (YYYY-MM-DD)").await?);
    wizard.set_password(&prompt::ask_value("password").await?);
    wizard.set_confirm_password(&prompt::ask_value("confirm password").await?);
    if !wizard.state().passwords_match {
        eprintln!("Passwords do not match");
    }
    wizard.set_newsletter_opt_in(prompt::confirm("send me product news").await?);
    Ok(Some(wizard.submit_signup().await))
}

async fn verification_step(wizard: &mut Wizard) -> Result<StepOutcome, CliError> {
    let label = format!("code sent to {} (:resend, :back)", wizard.state().email);
    let outcome = match prompt::ask(&label).await? {
        Input::Value(code) => {
            wizard.set_otp(&code);
            wizard.submit_otp().await
        }
        Input::Resend => wizard.resend_code().await,
        Input::Back => wizard.back(),
        Input::Quit => return Ok(None),
        Input::Code | Input::Forgot => {
            eprintln!("enter the code, or :resend for a new one");
            Ok(wizard.step())
        }
    };
    Ok(Some(outcome))
}
