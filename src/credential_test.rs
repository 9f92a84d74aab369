use super::*;

fn temp_cookie_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("libris-test-{}", uuid::Uuid::new_v4()))
        .join("cookies")
}

// =============================================================
// build_auth_cookie / live_token
// =============================================================

#[test]
fn auth_cookie_has_expected_attributes() {
    let now = OffsetDateTime::now_utc();
    let cookie = build_auth_cookie("tok", CookiePolicy::default(), now);
    assert_eq!(cookie.name(), AUTH_COOKIE_NAME);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(false));
    assert_eq!(cookie.secure(), Some(false));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.max_age(), Some(Duration::hours(24)));
    assert_eq!(cookie.expires_datetime(), Some(now + Duration::hours(24)));
}

#[test]
fn secure_policy_sets_secure_flag() {
    let policy = CookiePolicy { secure: true, ..CookiePolicy::default() };
    let cookie = build_auth_cookie("tok", policy, OffsetDateTime::now_utc());
    assert_eq!(cookie.secure(), Some(true));
}

#[test]
fn live_token_before_expiry() {
    let now = OffsetDateTime::now_utc();
    let cookie = build_auth_cookie("tok", CookiePolicy::default(), now);
    assert_eq!(live_token(&cookie, now + Duration::hours(23)), Some("tok".to_owned()));
}

#[test]
fn live_token_after_expiry_is_none() {
    let now = OffsetDateTime::now_utc();
    let cookie = build_auth_cookie("tok", CookiePolicy::default(), now);
    assert_eq!(live_token(&cookie, now + Duration::hours(24)), None);
}

#[test]
fn live_token_ignores_other_cookies_and_empty_values() {
    let now = OffsetDateTime::now_utc();
    assert_eq!(live_token(&Cookie::new("theme", "dark"), now), None);
    assert_eq!(live_token(&Cookie::new(AUTH_COOKIE_NAME, ""), now), None);
}

#[test]
fn session_cookie_without_expiry_is_live() {
    let cookie = Cookie::new(AUTH_COOKIE_NAME, "tok");
    assert_eq!(live_token(&cookie, OffsetDateTime::now_utc()), Some("tok".to_owned()));
}

// =============================================================
// MemoryCookieJar
// =============================================================

#[test]
fn memory_jar_starts_empty() {
    let jar = MemoryCookieJar::default();
    assert_eq!(jar.load().unwrap(), None);
}

#[test]
fn memory_jar_save_then_load() {
    let jar = MemoryCookieJar::new(CookiePolicy::default());
    jar.save("tok").unwrap();
    assert_eq!(jar.load().unwrap(), Some("tok".to_owned()));
    assert_eq!(jar.raw().unwrap().same_site(), Some(SameSite::Lax));
}

#[test]
fn memory_jar_clear_removes_token() {
    let jar = MemoryCookieJar::new(CookiePolicy::default());
    jar.save("tok").unwrap();
    jar.clear().unwrap();
    assert_eq!(jar.load().unwrap(), None);
    assert!(jar.raw().is_none());
}

#[test]
fn memory_jar_drops_expired_cookie_on_load() {
    let yesterday = OffsetDateTime::now_utc() - Duration::hours(25);
    let jar = MemoryCookieJar::with_cookie(build_auth_cookie("old", CookiePolicy::default(), yesterday));
    assert_eq!(jar.load().unwrap(), None);
    assert!(jar.raw().is_none());
}

// =============================================================
// FileCookieJar
// =============================================================

#[test]
fn file_jar_missing_file_is_empty() {
    let jar = FileCookieJar::new(temp_cookie_path(), CookiePolicy::default());
    assert_eq!(jar.load().unwrap(), None);
}

#[test]
fn file_jar_persists_across_instances() {
    let path = temp_cookie_path();
    FileCookieJar::new(&path, CookiePolicy::default()).save("tok-123").unwrap();

    let reopened = FileCookieJar::new(&path, CookiePolicy::default());
    assert_eq!(reopened.load().unwrap(), Some("tok-123".to_owned()));

    let line = std::fs::read_to_string(&path).unwrap();
    assert!(line.starts_with("auth-token=tok-123"));
    assert!(line.contains("SameSite=Lax"));
    assert!(!line.contains("HttpOnly"));

    reopened.clear().unwrap();
}

#[test]
fn file_jar_clear_is_idempotent() {
    let jar = FileCookieJar::new(temp_cookie_path(), CookiePolicy::default());
    jar.save("tok").unwrap();
    jar.clear().unwrap();
    jar.clear().unwrap();
    assert_eq!(jar.load().unwrap(), None);
}

#[test]
fn file_jar_expired_cookie_is_absent() {
    let path = temp_cookie_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let stale = build_auth_cookie("old", CookiePolicy::default(), OffsetDateTime::now_utc() - Duration::days(2));
    std::fs::write(&path, stale.to_string()).unwrap();

    let jar = FileCookieJar::new(&path, CookiePolicy::default());
    assert_eq!(jar.load().unwrap(), None);
    jar.clear().unwrap();
}

#[test]
fn file_jar_malformed_contents_error() {
    let path = temp_cookie_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "garbage").unwrap();

    let jar = FileCookieJar::new(&path, CookiePolicy::default());
    assert!(matches!(jar.load(), Err(CookieJarError::Parse(_))));
    jar.clear().unwrap();
}
