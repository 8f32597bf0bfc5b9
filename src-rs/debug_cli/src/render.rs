use std::io::{self, Write};

use serde_json::Value;

use crate::models::{CLIConfig, ParseResponse, TaskInfo};

const MARKDOWN_PREVIEW_CHARS: usize = 1500;

pub fn banner(cfg: &CLIConfig) {
    println!("docgate debug CLI");
    println!("API: {}", cfg.base_url);
    println!(
        "Backend: {}  Lang: {}  Method: {}",
        cfg.backend, cfg.lang, cfg.parse_method
    );
    println!("Type a file path to parse it, or /help for commands.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  <path>                 Parse a local file synchronously");
    println!("  /url <url>             Parse a remote document");
    println!("  /submit <path>         Submit an async parse job");
    println!("  /task [id]             Show a task (default: last submitted)");
    println!("  /wait [id]             Poll a task until it finishes");
    println!("  /tasks [limit]         List recent tasks");
    println!("  /health                Show service health");
    println!("  /version               Show service version");
    println!("  /backend <name>        Set backend");
    println!("  /lang <code>           Set language hint");
    println!("  /method <auto|txt|ocr> Set parse method");
    println!("  /pages <n|all>         Limit pages");
    println!("  /tables [on|off]       Toggle table recognition");
    println!("  /formulas [on|off]     Toggle formula recognition");
    println!("  /config                Show current config");
    println!("  /base <url>            Update base URL");
    println!("  /token [token]         Set or clear bearer token");
    println!("  /exit | /quit          Exit");
}

pub fn parse(resp: &ParseResponse) {
    println!(
        "{}: {} pages via {} (parser {}) in {} ms",
        resp.status, resp.page_count, resp.backend, resp.version, resp.elapsed_ms
    );
    match &resp.markdown {
        Some(md) if md.chars().count() > MARKDOWN_PREVIEW_CHARS => {
            let preview: String = md.chars().take(MARKDOWN_PREVIEW_CHARS).collect();
            println!("{}\n... ({} chars total)", preview, md.chars().count());
        }
        Some(md) => println!("{}", md),
        None => println!("(no markdown)"),
    }
}

pub fn task(task: &TaskInfo) {
    println!(
        "[{}] {} progress={:.0}% created={} updated={}",
        task.status,
        task.task_id,
        task.progress * 100.0,
        task.created_at,
        task.updated_at
    );
    if let Some(err) = &task.error {
        println!("error: {}", err);
    }
    if let Some(result) = &task.result {
        parse(result);
    }
}

pub fn progress(task: &TaskInfo) {
    println!("[{}] {:.0}%", task.status, task.progress * 100.0);
}

pub fn tasks(tasks: &[TaskInfo]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in tasks {
        println!("[{}] {} {}", task.status, task.task_id, task.created_at);
    }
}

pub fn json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  token: {}", if cfg.token.is_some() { "set" } else { "none" });
    println!("  backend: {}", cfg.backend);
    println!("  lang: {}", cfg.lang);
    println!("  method: {}", cfg.parse_method);
    match cfg.max_pages {
        Some(pages) => println!("  pages: {}", pages),
        None => println!("  pages: all"),
    }
    println!("  tables: {}", cfg.table_enable);
    println!("  formulas: {}", cfg.formula_enable);
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
