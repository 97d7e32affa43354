use std::env;
use std::path::Path;

use journal_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config_profiles::{default_config_path, CliProfile, CliProfilesConfig, ENV_PROFILE};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            no_activate,
        } => {
            let path = default_config_path().map_err(CliError::Config)?;
            run_config_init(
                &path,
                profile.as_deref().or(global_profile),
                supabase_url,
                supabase_anon_key,
                no_activate,
            )
        }
    }
}

pub fn run_config_init(
    path: &Path,
    profile_name: Option<&str>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load_from_path(path).map_err(CliError::Config)?;
    let profile_name = init_profile(
        &mut config,
        profile_name,
        supabase_url,
        supabase_anon_key,
        no_activate,
        |key| env::var(key).ok(),
    )?;
    config.save_to_path(path).map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let missing = config
        .profile(&profile_name)
        .map(missing_fields)
        .unwrap_or_default();
    if missing.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `journal signin --email <email> --password <password>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing.join(", ")
        );
    }

    Ok(())
}

/// Merge explicit values, then the environment, then what the profile already had.
pub fn init_profile(
    config: &mut CliProfilesConfig,
    profile_name: Option<&str>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    no_activate: bool,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, CliError> {
    let profile_name =
        config.resolve_profile_name_with(profile_name, lookup(ENV_PROFILE).as_deref());
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = CliProfile {
        supabase_url: normalize_text_option(supabase_url)
            .or_else(|| normalize_text_option(lookup("SUPABASE_URL")))
            .or_else(|| existing.supabase_url()),
        supabase_anon_key: normalize_text_option(supabase_anon_key)
            .or_else(|| normalize_text_option(lookup("SUPABASE_ANON_KEY")))
            .or_else(|| existing.supabase_anon_key()),
    };
    validate_profile_urls(&merged)?;

    *config.profile_mut_or_default(&profile_name) = merged;
    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}

pub fn missing_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.supabase_url().is_none() {
        missing.push("supabase_url");
    }
    if profile.supabase_anon_key().is_none() {
        missing.push("supabase_anon_key");
    }
    missing
}

fn validate_profile_urls(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.supabase_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}
