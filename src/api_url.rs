use std::env;

const API_URL_ENV: &str = "DASHBOARD_API_URL";
const DOMAIN_ENV: &str = "DASHBOARD_DOMAIN";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";
const LOCAL_DOMAIN_PREFIXES: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

fn is_local_domain(value: &str) -> bool {
    let lower = value.to_lowercase();
    LOCAL_DOMAIN_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Accepts a bare host with an optional port; anything that smells like a
/// path, query or scheme is rejected so a mangled env var cannot produce a
/// half-formed request URL.
pub fn normalize_domain(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains("://") || trimmed.contains('/') || trimmed.contains('?') || trimmed.contains('#') {
        return None;
    }
    let (host, port) = match trimmed.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (trimmed, None),
    };
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return None;
    }
    if let Some(port) = port {
        if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    Some(trimmed.to_string())
}

/// Resolution order: explicit CLI value, full-URL env override, domain env
/// var, then the local development default.
pub fn resolve_api_base_url(cli_value: Option<&str>) -> String {
    if let Some(value) = cli_value.map(str::trim).filter(|value| !value.is_empty()) {
        return value.trim_end_matches('/').to_string();
    }
    if let Ok(env_value) = env::var(API_URL_ENV) {
        let trimmed = env_value.trim();
        if !trimmed.is_empty() {
            return trimmed.trim_end_matches('/').to_string();
        }
    }
    if let Ok(domain_value) = env::var(DOMAIN_ENV) {
        if let Some(domain) = normalize_domain(Some(&domain_value)) {
            let scheme = if is_local_domain(&domain) {
                "http"
            } else {
                "https"
            };
            return format!("{}://{}/api", scheme, domain);
        }
    }
    DEFAULT_API_BASE_URL.to_string()
}
