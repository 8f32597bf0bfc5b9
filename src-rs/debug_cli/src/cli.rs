use std::env;

use crate::models::CLIConfig;

const DEFAULT_URL: &str = "http://localhost:8000";
const DEFAULT_BACKEND: &str = "hybrid";
const DEFAULT_LANG: &str = "ch";

pub fn parse_config() -> CLIConfig {
    let mut cfg = CLIConfig {
        base_url: env_or("DOCGATE_URL", DEFAULT_URL.to_string()),
        token: env_opt("DOCGATE_TOKEN"),
        backend: env_or("DOCGATE_BACKEND", DEFAULT_BACKEND.to_string()),
        lang: env_or("DOCGATE_LANG", DEFAULT_LANG.to_string()),
        parse_method: "auto".to_string(),
        max_pages: env_opt("DOCGATE_MAX_PAGES").and_then(|raw| raw.parse::<u32>().ok()),
        table_enable: env_bool("DOCGATE_TABLES", true),
        formula_enable: env_bool("DOCGATE_FORMULAS", true),
    };

    let args: Vec<String> = env::args().collect();
    let mut idx = 1;
    while idx < args.len() {
        let value = args.get(idx + 1);
        match (args[idx].as_str(), value) {
            ("--base", Some(value)) => {
                cfg.base_url = value.clone();
                idx += 1;
            }
            ("--token", Some(value)) => {
                cfg.token = Some(value.clone());
                idx += 1;
            }
            ("--backend", Some(value)) => {
                cfg.backend = value.clone();
                idx += 1;
            }
            ("--lang", Some(value)) => {
                cfg.lang = value.clone();
                idx += 1;
            }
            ("--method", Some(value)) => {
                cfg.parse_method = value.clone();
                idx += 1;
            }
            ("--pages", Some(value)) => {
                if let Ok(parsed) = value.parse::<u32>() {
                    cfg.max_pages = Some(parsed);
                }
                idx += 1;
            }
            _ => {}
        }
        idx += 1;
    }

    cfg
}

fn env_or(key: &str, fallback: String) -> String {
    env_opt(key).unwrap_or(fallback)
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn env_bool(key: &str, fallback: bool) -> bool {
    match env::var(key) {
        Ok(value) => value.parse::<bool>().unwrap_or(fallback),
        Err(_) => fallback,
    }
}
