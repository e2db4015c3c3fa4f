use super::*;

fn defaults() -> Settings {
    Settings::from_raw(RawSettings::default()).expect("defaults are valid")
}

#[test]
fn default_settings_resolve() {
    let settings = defaults();
    assert_eq!(settings.server.addr.port(), 4000);
    assert_eq!(settings.database.max_connections.get(), 10);
    assert_eq!(settings.cache.ttl, Duration::from_secs(60));
    assert_eq!(settings.cache.sweep_interval, Duration::from_secs(120));
    assert_eq!(settings.contact_rate_limit.max_requests.get(), 5);
    assert_eq!(settings.contact_rate_limit.window_seconds.get(), 60);
    assert!(settings.mail.sendgrid_api_key.is_none());
    assert!(settings.recaptcha.secret_key.is_none());
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid { key: "server.port", .. })
    ));
}

#[test]
fn zero_cache_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_database_url_collapses_to_none() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid");
    assert!(settings.database.url.is_none());
}

#[test]
fn blank_mail_key_disables_mail() {
    let mut raw = RawSettings::default();
    raw.mail.sendgrid_api_key = Some("".to_string());
    let settings = Settings::from_raw(raw).expect("valid");
    assert!(settings.mail.sendgrid_api_key.is_none());
}

#[test]
fn serve_overrides_take_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(8080);
    raw.apply_serve_overrides(&ServeOverrides {
        server_port: Some(9090),
        cache_ttl_seconds: Some(5),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid");
    assert_eq!(settings.server.addr.port(), 9090);
    assert_eq!(settings.cache.ttl, Duration::from_secs(5));
}

#[test]
fn hostname_is_rejected_as_listener_host() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("not-an-ip".to_string());
    assert!(Settings::from_raw(raw).is_err());
}
