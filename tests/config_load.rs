// tests/config_load.rs
use market_digest::config::{self, DigestConfig, WebhookMode, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use std::path::{Path, PathBuf};
use std::{env, fs};

const SECRET_VARS: [&str; 6] = [
    "OPENAI_API_KEY",
    "STORE_URL",
    "DISCORD_WEBHOOK_URL",
    "EMAIL_PASSWORD",
    "TO_EMAILS",
    "TELEGRAM_BOT_TOKEN",
];

fn set_all_secrets() {
    env::set_var("OPENAI_API_KEY", "sk-env");
    env::set_var("STORE_URL", "sqlite://reports.db?mode=rwc");
    env::set_var("DISCORD_WEBHOOK_URL", "https://discord.test/api/webhooks/1/x");
    env::set_var("EMAIL_PASSWORD", "app-pass");
    env::set_var("TO_EMAILS", "a@example.com, b@example.com");
    env::set_var("TELEGRAM_BOT_TOKEN", "123:abc");
}

fn clear_all_secrets() {
    for v in SECRET_VARS {
        env::remove_var(v);
    }
}

fn profile(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join(name)
}

#[serial_test::serial]
#[test]
fn env_markers_resolve_from_environment() {
    set_all_secrets();
    let cfg = DigestConfig::load_from(&profile("tw-markets.toml")).unwrap();
    clear_all_secrets();

    assert_eq!(cfg.llm.api_key, "sk-env");
    let store = cfg.delivery.store.as_ref().unwrap();
    assert_eq!(store.url, "sqlite://reports.db?mode=rwc");
    assert_eq!(store.table, "tw_market_news");
    let email = cfg.delivery.email.as_ref().unwrap();
    assert_eq!(email.password, "app-pass");
    assert_eq!(email.recipient_list(), vec!["a@example.com", "b@example.com"]);
    assert_eq!(cfg.delivery.telegram.as_ref().unwrap().bot_token, "123:abc");
    assert_eq!(cfg.delivery.webhook.as_ref().unwrap().mode, WebhookMode::Auto);
}

#[serial_test::serial]
#[test]
fn missing_env_secret_is_a_config_error() {
    clear_all_secrets();
    let err = DigestConfig::from_toml_str(
        r#"
[llm]
api_key = "ENV"
"#,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("Missing OPENAI_API_KEY env var"));
}

#[serial_test::serial]
#[test]
fn shipped_profiles_select_different_sources() {
    set_all_secrets();
    let tw = DigestConfig::load_from(&profile("tw-markets.toml")).unwrap();
    let global = DigestConfig::load_from(&profile("global-markets.toml")).unwrap();
    let default = DigestConfig::load_from(&profile("digest.toml")).unwrap();
    clear_all_secrets();

    let names = |c: &DigestConfig| -> Vec<String> {
        c.sources.enabled().map(|s| s.name.clone()).collect()
    };
    assert_eq!(
        names(&tw),
        vec!["Yahoo Market TW", "Yahoo Expert TW", "Yahoo Research TW"]
    );
    assert_eq!(
        names(&global),
        vec!["BBC Business", "Yahoo Market Global", "Yahoo Global finance News"]
    );
    assert_ne!(tw.run.title, global.run.title);
    assert!(tw.llm.prompt_template.as_deref().unwrap().contains("{corpus}"));
    assert!(global.llm.prompt_template.is_none());
    assert_eq!(global.delivery.webhook.as_ref().unwrap().mode, WebhookMode::Attachment);
    assert!(default.delivery.email.is_none());
}

#[serial_test::serial]
#[test]
fn default_path_uses_env_then_fallback() {
    env::remove_var(ENV_CONFIG_PATH);
    assert_eq!(config::default_path().unwrap(), PathBuf::from(DEFAULT_CONFIG_PATH));

    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("profile.toml");
    fs::write(
        &p,
        r#"
[run]
title = "From Env"

[llm]
api_key = "sk-literal"
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, p.display().to_string());
    assert_eq!(config::default_path().unwrap(), p);
    let cfg = DigestConfig::load_default().unwrap();
    assert_eq!(cfg.run.title, "From Env");

    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(config::default_path().is_err());
    env::remove_var(ENV_CONFIG_PATH);
}

#[test]
fn unreadable_file_names_the_path() {
    let err = DigestConfig::load_from(Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.toml"));
}

#[test]
fn template_without_corpus_placeholder_fails_validation() {
    let r = DigestConfig::from_toml_str(
        r#"
[llm]
api_key = "sk"
prompt_template = "Just {date}"
"#,
    );
    assert!(r.is_err());
}
