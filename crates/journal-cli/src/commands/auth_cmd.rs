use journal_core::Error;

use crate::commands::common::AppContext;
use crate::error::CliError;

pub async fn run_signup(
    email: &str,
    password: &str,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = AppContext::load(global_profile)?;
    let session = context.session()?;

    match session.sign_up(email, password).await {
        Ok(identity) => {
            println!(
                "Account created. Profile '{}' is signed in as {}",
                context.profile_name,
                identity.display_name()
            );
            Ok(())
        }
        Err(Error::ConfirmationRequired) => {
            println!(
                "Account created for {}. Confirm your email, then run `journal signin`.",
                email.trim()
            );
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

pub async fn run_signin(
    email: &str,
    password: &str,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = AppContext::load(global_profile)?;
    let session = context.session()?;

    let identity = session.sign_in(email, password).await?;
    println!(
        "Signed in profile '{}' as {}",
        context.profile_name,
        identity.display_name()
    );
    Ok(())
}

pub async fn run_signout(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = AppContext::load(global_profile)?;
    let session = context.session()?;

    session.sign_out().await;
    println!("Signed out profile '{}'", context.profile_name);
    Ok(())
}
